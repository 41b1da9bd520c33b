//! MolViewSpec scene documents.
//!
//! A document is a single tree of [`Node`]s plus descriptive
//! [`Metadata`]. The engine loads it in one call, replacing whatever the
//! viewer showed before.

pub mod node;
pub mod params;
pub mod selector;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub use node::{Node, NodeKind};
pub use params::{
    AnnotationSchema, ColorFromSourceParams, ColorParams, ComponentParams,
    DiscretePalette, DownloadParams, OpacityParams, PaletteKind, PaletteMode,
    ParseFormat, ParseParams, RepresentationParams, StructureParams,
    StructureType, TextParams, TooltipFromSourceParams, TransformParams,
};
pub use selector::{ComponentExpression, ComponentSelector, StaticSelector};

use crate::error::MolmountError;

/// Format tag the engine uses to recognize these documents.
pub const MVS_FORMAT: &str = "mvsj";

/// Document schema version written into [`Metadata::version`].
pub const MVS_VERSION: &str = "1.4";

/// Document layout. Only single-snapshot documents are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// One scene, no animation frames.
    #[default]
    Single,
}

/// Descriptive header of a scene document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Schema version.
    pub version: String,
    /// Creation time, RFC 3339 with millisecond precision.
    pub timestamp: String,
    /// Short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Metadata {
    /// Metadata stamped with the current UTC time.
    #[must_use]
    pub fn now(title: Option<String>, description: Option<String>) -> Self {
        Self {
            version: MVS_VERSION.to_owned(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            title,
            description,
        }
    }
}

/// A complete scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvsData {
    /// Document layout.
    pub kind: DocumentKind,
    /// Scene tree; its node is always [`NodeKind::Root`].
    pub root: Node,
    /// Header.
    pub metadata: Metadata,
}

impl MvsData {
    /// Wrap a scene tree.
    ///
    /// # Errors
    ///
    /// [`MolmountError::InvalidScene`] if `root` is not a root node or its
    /// subtree breaks the grammar.
    pub fn new(root: Node, metadata: Metadata) -> Result<Self, MolmountError> {
        let data = Self {
            kind: DocumentKind::Single,
            root,
            metadata,
        };
        data.validate()?;
        Ok(data)
    }

    /// Check that the tree starts at a root and obeys the grammar.
    ///
    /// # Errors
    ///
    /// The first grammar violation found.
    pub fn validate(&self) -> Result<(), MolmountError> {
        if !matches!(self.root.kind(), NodeKind::Root) {
            return Err(MolmountError::InvalidScene {
                parent: "document",
                child: self.root.name(),
            });
        }
        self.root.validate()
    }

    /// Number of structures the document loads (one per `download`).
    #[must_use]
    pub fn structure_count(&self) -> usize {
        self.root.children().len()
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_json(&self) -> Result<String, MolmountError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, as written to `.mvsj` files.
    ///
    /// # Errors
    ///
    /// Serialization failure.
    pub fn to_json_pretty(&self) -> Result<String, MolmountError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a document.
    ///
    /// # Errors
    ///
    /// Malformed JSON or a tree that breaks the grammar.
    pub fn from_json(json: &str) -> Result<Self, MolmountError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        log::debug!(
            "Read scene document with {} structure(s)",
            data.structure_count()
        );
        Ok(data)
    }
}
