//! Parameter sets of the scene node kinds.

use serde::{Deserialize, Serialize};

use super::selector::ComponentSelector;
use crate::color::ColorHex;
use crate::protein::Representation;

/// `download` node: fetch a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadParams {
    /// Resource location (remote URL or object URL).
    pub url: String,
}

/// Structure file formats the engine can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseFormat {
    /// mmCIF text.
    Mmcif,
    /// Legacy PDB text.
    Pdb,
}

/// `parse` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseParams {
    /// Format of the downloaded data.
    pub format: ParseFormat,
}

/// How a structure is built from parsed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    /// Asymmetric unit of one model.
    #[default]
    Model,
}

/// `structure` node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StructureParams {
    /// Structure kind.
    #[serde(rename = "type")]
    pub kind: StructureType,
    /// Data block to read; first block when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u32>,
    /// Model to read; first model when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_index: Option<u32>,
    /// Data block by header name. `Some(None)` is written as an explicit
    /// `null`, meaning "select by index".
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub block_header: Option<Option<String>>,
}

/// Keeps a present-but-null field distinct from an absent one.
fn present_or_null<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}

impl StructureParams {
    /// Pin the first block and model explicitly (uploaded files).
    #[must_use]
    pub fn first_model() -> Self {
        Self {
            kind: StructureType::Model,
            block_index: Some(0),
            model_index: Some(0),
            block_header: Some(None),
        }
    }
}

/// `transform` node: rigid-body placement of a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Rotation, column-major flattened.
    pub rotation: [f64; 9],
    /// Translation.
    pub translation: [f64; 3],
    /// Point the rotation is applied around.
    #[serde(default)]
    pub rotation_center: [f64; 3],
}

/// `component` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentParams {
    /// Atoms covered by the component.
    pub selector: ComponentSelector,
}

/// `representation` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationParams {
    /// Visual style.
    #[serde(rename = "type")]
    pub kind: Representation,
    /// Scale applied to the geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_factor: Option<f64>,
    /// Draw helices as tubes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tubular_helices: Option<bool>,
}

impl RepresentationParams {
    /// Representation with engine defaults.
    #[must_use]
    pub fn new(kind: Representation) -> Self {
        Self {
            kind,
            size_factor: None,
            tubular_helices: None,
        }
    }
}

/// `color` node: flat color, optionally restricted to a sub-selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorParams {
    /// The color.
    pub color: ColorHex,
    /// Part of the representation to color; all of it when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<ComponentSelector>,
}

/// Annotation schema used to map per-atom fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationSchema {
    /// One row per atom.
    #[default]
    AllAtomic,
}

/// Palette kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteKind {
    /// Step function over value thresholds.
    #[default]
    Discrete,
}

/// How palette thresholds are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMode {
    /// Thresholds are raw field values.
    #[default]
    Absolute,
}

/// Discrete palette: each color applies from its threshold upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscretePalette {
    /// Palette kind.
    pub kind: PaletteKind,
    /// Threshold interpretation.
    pub mode: PaletteMode,
    /// `(color, lower threshold)` pairs, ascending.
    pub colors: Vec<(ColorHex, f64)>,
}

/// `color_from_source` node: color by a field of the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFromSourceParams {
    /// Annotation granularity.
    pub schema: AnnotationSchema,
    /// mmCIF category.
    pub category_name: String,
    /// mmCIF field.
    pub field_name: String,
    /// Value → color mapping.
    pub palette: DiscretePalette,
}

/// `opacity` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacityParams {
    /// 0 (invisible) to 1 (opaque).
    pub opacity: f64,
}

/// `label` and `tooltip` nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextParams {
    /// Displayed text.
    pub text: String,
}

/// `tooltip_from_source` node: show a field of the source file on hover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipFromSourceParams {
    /// Annotation granularity.
    pub schema: AnnotationSchema,
    /// mmCIF category.
    pub category_name: String,
    /// mmCIF field.
    pub field_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_block_header_survives_reading_back() {
        let pinned = StructureParams::first_model();
        let json = serde_json::to_value(&pinned).unwrap();
        assert!(json["block_header"].is_null());
        assert!(json.as_object().unwrap().contains_key("block_header"));
        let back: StructureParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, pinned);

        let plain = serde_json::to_value(StructureParams::default()).unwrap();
        assert!(!plain.as_object().unwrap().contains_key("block_header"));
        let back: StructureParams = serde_json::from_value(plain).unwrap();
        assert_eq!(back.block_header, None);
    }
}
