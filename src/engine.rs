//! Capabilities consumed from the molecular viewer engine.
//!
//! The engine itself (rendering, structure parsing, camera math) lives
//! outside this crate. It is reached through three traits:
//!
//! - [`Container`]: the host element a viewer is mounted into.
//! - [`Engine`]: constructs viewers bound to containers.
//! - [`EngineViewer`]: one live viewer.
//!
//! Viewer methods take `&self`; implementations use interior mutability
//! so a viewer can be shared between mounts through an `Arc`.

use std::future::Future;
use std::hash::Hash;

use glam::DMat4;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::ColorHex;
use crate::mvs::MvsData;
use crate::protein::UploadedFile;

/// Rock animation sweep, in degrees.
pub const ROCK_ANGLE: f64 = 10.0;

/// Failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    /// Wrap an engine message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Amount of viewer chrome shown around the canvas.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    /// Bare canvas, no orientation helpers.
    Minimal,
    /// Default controls.
    #[default]
    Standard,
    /// All panels expanded.
    Expanded,
}

impl UiMode {
    /// Whether the camera orientation axes are drawn.
    #[must_use]
    pub fn shows_orientation_helpers(self) -> bool {
        !matches!(self, Self::Minimal)
    }
}

/// Continuous camera motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraAnimation {
    /// Camera stays put.
    Off,
    /// Full turns around the scene.
    Spin {
        /// Turn speed.
        speed: f64,
    },
    /// Back-and-forth sweep.
    Rock {
        /// Sweep speed.
        speed: f64,
        /// Sweep amplitude in degrees.
        angle: f64,
    },
}

impl CameraAnimation {
    /// Spin at `speed`.
    #[must_use]
    pub fn spin(speed: f64) -> Self {
        Self::Spin { speed }
    }

    /// Rock at `speed` over [`ROCK_ANGLE`] degrees.
    #[must_use]
    pub fn rock(speed: f64) -> Self {
        Self::Rock {
            speed,
            angle: ROCK_ANGLE,
        }
    }
}

/// Host element a viewer renders into.
pub trait Container: Clone + Eq + Hash + Send + Sync + 'static {
    /// Whether `other` lies strictly inside this container's subtree.
    fn contains(&self, other: &Self) -> bool;

    /// Whether the container still holds the markup of an earlier mount.
    fn has_mount_marker(&self) -> bool;

    /// Remove all rendered content.
    fn clear(&self);
}

/// A live viewer instance.
pub trait EngineViewer: Send + Sync + 'static {
    /// Replace the current content with `scene`, encoded as `format`
    /// (always [`MVS_FORMAT`](crate::mvs::MVS_FORMAT) from this crate).
    fn load_scene(
        &self,
        scene: &MvsData,
        format: &str,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Remove all content, keeping the viewer alive.
    fn clear(&self);

    /// Release every resource the viewer holds.
    fn dispose(&self);

    /// Canvas background.
    fn set_background_color(&self, color: &ColorHex);

    /// Camera motion.
    fn set_animation(&self, animation: CameraAnimation);

    /// Frame residues `start..=end` of the first loaded structure. No-op
    /// when nothing is loaded or the range selects nothing.
    fn focus_residue_range(&self, start: i32, end: i32);

    /// Default framing.
    fn reset_camera(&self);

    /// Move structure `index` (load order) in place. No-op when out of
    /// range.
    fn update_structure_transform(&self, index: usize, matrix: DMat4);

    /// Temporary URL serving `file`'s bytes.
    ///
    /// # Errors
    ///
    /// The engine could not register the blob.
    fn create_object_url(
        &self,
        file: &UploadedFile,
    ) -> Result<String, EngineError>;

    /// Invalidate a URL from [`EngineViewer::create_object_url`].
    ///
    /// # Errors
    ///
    /// The URL was unknown or already revoked.
    fn revoke_object_url(&self, url: &str) -> Result<(), EngineError>;
}

/// Viewer factory.
pub trait Engine: Send + Sync + 'static {
    /// Host element type.
    type Container: Container;
    /// Viewer type.
    type Viewer: EngineViewer;

    /// Build a viewer mounted into `container`.
    fn create_viewer(
        &self,
        container: &Self::Container,
        ui: UiMode,
    ) -> impl Future<Output = Result<Self::Viewer, EngineError>> + Send;
}
