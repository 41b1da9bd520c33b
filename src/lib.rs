// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! MolViewSpec scene compilation and viewer lifecycle management for
//! embedded protein viewers.
//!
//! Molmount turns a list of display intents (which protein, how to color
//! it, which domains to outline, how to superpose it) into a MolViewSpec
//! scene tree, and keeps at most one rendering viewer alive per host
//! container so that remounts reuse expensive engine state.
//!
//! # Key entry points
//!
//! - [`compiler::compile`] - display intents to a [`mvs::MvsData`] document
//! - [`manager::ViewerManager`] - ref-counted viewer registry with idle
//!   collection
//! - [`mount::Mount`] - one container showing one scene
//! - [`options::Options`] - TOML-backed presentation and lifecycle options
//!
//! # Architecture
//!
//! The rendering engine is abstracted behind [`engine::Engine`] and
//! [`engine::EngineViewer`]. The manager deduplicates concurrent
//! construction per container, counts references, and a background task
//! disposes viewers that stay unreferenced past a grace period.

pub mod color;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod manager;
pub mod mount;
pub mod mvs;
pub mod options;
pub mod protein;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use color::ColorHex;
pub use compiler::{compile, ModelSourceUrls, ObjectUrlProvider};
pub use engine::{CameraAnimation, Engine, EngineError, EngineViewer, UiMode};
pub use error::{MolmountError, Result};
pub use manager::{ManagerCell, ViewerId, ViewerManager};
pub use mount::{Mount, SceneSource, ViewerConfig};
pub use mvs::MvsData;
pub use options::Options;
pub use protein::{ChoppingRange, DomainEntry, Protein, UploadedFile};
pub use viewer::ViewerInstance;
