//! Crate-level error types.

use thiserror::Error;

use crate::engine::EngineError;
use crate::manager::ViewerId;

/// Rejected hex color input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorFormatError {
    /// Only 3 or 6 hex digits (after the optional `#`) are accepted.
    #[error("only 3 or 6 digit hex colors are supported, got {0:?}")]
    WrongLength(String),
    /// A character outside `[0-9A-Fa-f]`.
    #[error("invalid hex color value {0:?}")]
    InvalidDigit(String),
}

/// Errors produced by the molmount crate.
#[derive(Debug, Error)]
pub enum MolmountError {
    /// Malformed color string.
    #[error("color format error: {0}")]
    ColorFormat(#[from] ColorFormatError),
    /// Contradictory or missing inputs.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A scene node was attached under a parent that cannot hold it.
    #[error("invalid scene: `{child}` cannot be a child of `{parent}`")]
    InvalidScene {
        /// Kind of the parent node.
        parent: &'static str,
        /// Kind of the rejected child node.
        child: &'static str,
    },
    /// A scene document could not be read or written.
    #[error("scene document error: {0}")]
    SceneDocument(#[from] serde_json::Error),
    /// A viewer that the manager does not track was released.
    #[error("viewer {0} is not managed")]
    UnmanagedResource(ViewerId),
    /// The engine failed to construct a viewer.
    #[error("viewer initialization failed: {0}")]
    Initialization(String),
    /// A call into an already constructed viewer failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    /// TOML options parsing/serialization failure.
    #[error("options parse error: {0}")]
    OptionsParse(String),
    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MolmountError {
    /// Build a [`MolmountError::Configuration`] from any message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error stems from caller input rather than the engine.
    ///
    /// Color format errors are configuration errors with a dedicated
    /// variant so callers can report the offending value.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ColorFormat(_))
    }
}

/// Crate-wide result alias.
pub type Result<T, E = MolmountError> = std::result::Result<T, E>;
