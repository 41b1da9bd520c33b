//! Scene tree nodes and the parent/child grammar they obey.
//!
//! ```text
//! root
//! └─ download
//!    └─ parse
//!       └─ structure
//!          ├─ transform
//!          ├─ tooltip_from_source
//!          └─ component
//!             ├─ label
//!             ├─ tooltip
//!             └─ representation
//!                ├─ color
//!                ├─ color_from_source
//!                └─ opacity
//! ```
//!
//! [`Node::push`] refuses children the grammar does not allow, so a tree
//! built through this API is always well-formed. Trees read from JSON are
//! checked with [`Node::validate`].

use serde::{Deserialize, Serialize};

use super::params::{
    ColorFromSourceParams, ColorParams, ComponentParams, DownloadParams,
    OpacityParams, ParseParams, RepresentationParams, StructureParams,
    TextParams, TooltipFromSourceParams, TransformParams,
};
use crate::error::MolmountError;

/// A node's kind together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum NodeKind {
    /// Tree root.
    Root,
    /// Fetch a resource.
    Download(DownloadParams),
    /// Parse downloaded data.
    Parse(ParseParams),
    /// Build a structure.
    Structure(StructureParams),
    /// Place the structure.
    Transform(TransformParams),
    /// Select part of the structure.
    Component(ComponentParams),
    /// Draw a component.
    Representation(RepresentationParams),
    /// Flat color.
    Color(ColorParams),
    /// Color by a source field.
    ColorFromSource(ColorFromSourceParams),
    /// Transparency.
    Opacity(OpacityParams),
    /// Text label anchored on the component.
    Label(TextParams),
    /// Hover text on the component.
    Tooltip(TextParams),
    /// Hover text from a source field.
    TooltipFromSource(TooltipFromSourceParams),
}

impl NodeKind {
    /// Kind name as it appears in scene documents.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Download(_) => "download",
            Self::Parse(_) => "parse",
            Self::Structure(_) => "structure",
            Self::Transform(_) => "transform",
            Self::Component(_) => "component",
            Self::Representation(_) => "representation",
            Self::Color(_) => "color",
            Self::ColorFromSource(_) => "color_from_source",
            Self::Opacity(_) => "opacity",
            Self::Label(_) => "label",
            Self::Tooltip(_) => "tooltip",
            Self::TooltipFromSource(_) => "tooltip_from_source",
        }
    }

    /// Whether `child` may sit directly under a node of this kind.
    #[must_use]
    pub fn allows_child(&self, child: &Self) -> bool {
        match self {
            Self::Root => matches!(child, Self::Download(_)),
            Self::Download(_) => matches!(child, Self::Parse(_)),
            Self::Parse(_) => matches!(child, Self::Structure(_)),
            Self::Structure(_) => matches!(
                child,
                Self::Transform(_)
                    | Self::Component(_)
                    | Self::TooltipFromSource(_)
            ),
            Self::Component(_) => matches!(
                child,
                Self::Representation(_) | Self::Label(_) | Self::Tooltip(_)
            ),
            Self::Representation(_) => matches!(
                child,
                Self::Color(_) | Self::ColorFromSource(_) | Self::Opacity(_)
            ),
            Self::Transform(_)
            | Self::Color(_)
            | Self::ColorFromSource(_)
            | Self::Opacity(_)
            | Self::Label(_)
            | Self::Tooltip(_)
            | Self::TooltipFromSource(_) => false,
        }
    }
}

/// A scene tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
}

impl Node {
    /// A childless node.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// An empty root.
    #[must_use]
    pub fn root() -> Self {
        Self::new(NodeKind::Root)
    }

    /// Kind and parameters.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Shorthand for `self.kind().name()`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Direct children, in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Append a child and return it for further building.
    ///
    /// # Errors
    ///
    /// [`MolmountError::InvalidScene`] if the grammar forbids the child here.
    pub fn push(&mut self, child: Node) -> Result<&mut Node, MolmountError> {
        if !self.kind.allows_child(&child.kind) {
            return Err(MolmountError::InvalidScene {
                parent: self.name(),
                child: child.name(),
            });
        }
        let index = self.children.len();
        self.children.push(child);
        Ok(&mut self.children[index])
    }

    /// Builder-style [`Node::push`].
    ///
    /// # Errors
    ///
    /// Same as [`Node::push`].
    pub fn with_child(mut self, child: Node) -> Result<Self, MolmountError> {
        let _ = self.push(child)?;
        Ok(self)
    }

    /// Check the grammar over the whole subtree.
    ///
    /// # Errors
    ///
    /// The first violation found, depth first.
    pub fn validate(&self) -> Result<(), MolmountError> {
        for child in &self.children {
            if !self.kind.allows_child(&child.kind) {
                return Err(MolmountError::InvalidScene {
                    parent: self.name(),
                    child: child.name(),
                });
            }
            child.validate()?;
        }
        Ok(())
    }

    /// This node and all descendants, depth first, parents before children.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// All nodes in the subtree with the given kind name.
    #[must_use]
    pub fn find_all(&self, name: &str) -> Vec<&Node> {
        self.descendants()
            .into_iter()
            .filter(|n| n.name() == name)
            .collect()
    }

    /// First direct child with the given kind name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|n| n.name() == name)
    }
}
