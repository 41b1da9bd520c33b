//! Protein display intents: what to show, and how.

mod chopping;

use std::fmt;

use glam::{DAffine3, DMat3, DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::MolmountError;

pub use chopping::{normalize_chopping, ChoppingRange, DomainEntry};

/// Row-major 3×3 rotation.
pub type Matrix3 = [[f64; 3]; 3];
/// Cartesian translation.
pub type Vector3 = [f64; 3];

/// Identity rotation.
pub const DEFAULT_ROTATION: Matrix3 =
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// Zero translation.
pub const DEFAULT_TRANSLATION: Vector3 = [0.0, 0.0, 0.0];

/// A structure file supplied by the user instead of a database identifier.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Original file name; its extension decides the parse format.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Wrap file contents with their name.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Whether the file name marks it as mmCIF.
    #[must_use]
    pub fn is_mmcif(&self) -> bool {
        self.name.ends_with(".cif") || self.name.ends_with(".mmcif")
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Where a protein's coordinates come from. Exactly one source per protein.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProteinSource {
    /// UniProt accession, resolved against a model database.
    UniProtId(String),
    /// User-supplied structure file.
    File(UploadedFile),
}

/// Representation style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// Secondary-structure cartoon.
    #[default]
    Cartoon,
    /// Atoms as spheres joined by sticks.
    BallAndStick,
    /// Van der Waals spheres.
    Spacefill,
    /// Bonds as lines.
    Line,
    /// Molecular surface.
    Surface,
    /// Trace through the backbone.
    Backbone,
}

impl Representation {
    /// Name used in scene documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cartoon => "cartoon",
            Self::BallAndStick => "ball_and_stick",
            Self::Spacefill => "spacefill",
            Self::Line => "line",
            Self::Surface => "surface",
            Self::Backbone => "backbone",
        }
    }

    /// Cartoon and backbone traces can carry per-residue confidence colors.
    #[must_use]
    pub fn is_cartoon_like(self) -> bool {
        matches!(self, Self::Cartoon | Self::Backbone)
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rigid-body placement applied to a structure before display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Superposition {
    /// Row-major rotation.
    pub rotation: Matrix3,
    /// Translation applied after rotation.
    pub translation: Vector3,
}

impl Default for Superposition {
    fn default() -> Self {
        Self {
            rotation: DEFAULT_ROTATION,
            translation: DEFAULT_TRANSLATION,
        }
    }
}

impl Superposition {
    /// The rotation as a glam matrix (rows of `rotation` become rows).
    #[must_use]
    pub fn rotation_matrix(&self) -> DMat3 {
        rotation_matrix(&self.rotation)
    }

    /// Rotation flattened column by column, the layout scene documents
    /// expect.
    #[must_use]
    pub fn rotation_column_major(&self) -> [f64; 9] {
        self.rotation_matrix().to_cols_array()
    }

    /// Full 4×4 homogeneous transform.
    #[must_use]
    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from(DAffine3::from_mat3_translation(
            self.rotation_matrix(),
            DVec3::from_array(self.translation),
        ))
    }
}

/// Row-major array → glam matrix. glam stores columns, so the rows are
/// read in as columns and transposed.
pub(crate) fn rotation_matrix(rows: &Matrix3) -> DMat3 {
    DMat3::from_cols_array_2d(rows).transpose()
}

/// One entry of the list of proteins to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProtein")]
pub struct Protein {
    /// Identifier or uploaded file.
    #[serde(flatten)]
    pub source: ProteinSource,
    /// Restrict the selection to one chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    /// Placement relative to the other proteins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superposition: Option<Superposition>,
    /// Domains to highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chopping: Option<Vec<DomainEntry>>,
    /// Representation style, cartoon unless set.
    #[serde(default)]
    pub representation: Representation,
}

/// Wire form of [`Protein`] with both source keys optional, so that
/// input naming both is rejected instead of one being dropped.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProtein {
    uni_prot_id: Option<String>,
    file: Option<UploadedFile>,
    #[serde(default)]
    chain: Option<String>,
    #[serde(default)]
    superposition: Option<Superposition>,
    #[serde(default)]
    chopping: Option<Vec<DomainEntry>>,
    #[serde(default)]
    representation: Representation,
}

impl TryFrom<RawProtein> for Protein {
    type Error = MolmountError;

    fn try_from(raw: RawProtein) -> Result<Self, Self::Error> {
        let source = match (raw.uni_prot_id, raw.file) {
            (Some(id), None) => ProteinSource::UniProtId(id),
            (None, Some(file)) => ProteinSource::File(file),
            (Some(_), Some(_)) => {
                return Err(MolmountError::configuration(
                    "a protein needs either uniProtId or file, not both",
                ))
            }
            (None, None) => {
                return Err(MolmountError::configuration(
                    "a protein needs a uniProtId or a file",
                ))
            }
        };
        Ok(Self {
            source,
            chain: raw.chain,
            superposition: raw.superposition,
            chopping: raw.chopping,
            representation: raw.representation,
        })
    }
}

impl Protein {
    /// A protein identified by UniProt accession.
    #[must_use]
    pub fn uniprot(id: impl Into<String>) -> Self {
        Self::from_source(ProteinSource::UniProtId(id.into()))
    }

    /// A protein from an uploaded structure file.
    #[must_use]
    pub fn file(file: UploadedFile) -> Self {
        Self::from_source(ProteinSource::File(file))
    }

    fn from_source(source: ProteinSource) -> Self {
        Self {
            source,
            chain: None,
            superposition: None,
            chopping: None,
            representation: Representation::default(),
        }
    }

    /// Restrict to a chain.
    #[must_use]
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = Some(chain.into());
        self
    }

    /// Set the superposition transform.
    #[must_use]
    pub fn with_superposition(mut self, superposition: Superposition) -> Self {
        self.superposition = Some(superposition);
        self
    }

    /// Set the domain chopping.
    #[must_use]
    pub fn with_chopping(mut self, chopping: Vec<DomainEntry>) -> Self {
        self.chopping = Some(chopping);
        self
    }

    /// Set the representation style.
    #[must_use]
    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    /// Whether the coordinates come from an uploaded file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self.source, ProteinSource::File(_))
    }

    /// The superposition, or identity when none was given.
    #[must_use]
    pub fn superposition_or_default(&self) -> Superposition {
        self.superposition.unwrap_or_default()
    }

    /// First domain entry named `label`, as given (not normalized).
    #[must_use]
    pub fn domain(&self, label: &str) -> Option<&DomainEntry> {
        self.chopping
            .as_deref()?
            .iter()
            .find(|entry| entry.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_transposed_when_flattened() {
        let s = Superposition {
            rotation: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            translation: DEFAULT_TRANSLATION,
        };
        assert_eq!(
            s.rotation_column_major(),
            [1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0]
        );
    }

    #[test]
    fn mat4_carries_rotation_rows_and_translation() {
        let s = Superposition {
            rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [10.0, 0.0, -2.0],
        };
        let m = s.to_mat4();
        // Row 0, column 1 of the rotation.
        assert_eq!(m.col(1).x, -1.0);
        assert_eq!(m.col(0).y, 1.0);
        assert_eq!(m.w_axis.x, 10.0);
        assert_eq!(m.w_axis.z, -2.0);
        assert_eq!(m.w_axis.w, 1.0);
    }

    #[test]
    fn deserializes_from_camel_case_json() {
        let json = r#"{
            "uniProtId": "P69905",
            "chain": "A",
            "chopping": [
                {"label": "d1", "showLabel": true,
                 "ranges": [{"start": 1, "end": 40}]}
            ],
            "representation": "ball_and_stick"
        }"#;
        let p: Protein = serde_json::from_str(json).unwrap();
        assert_eq!(p.source, ProteinSource::UniProtId("P69905".to_owned()));
        assert_eq!(p.chain.as_deref(), Some("A"));
        assert_eq!(p.representation, Representation::BallAndStick);
        assert!(p.domain("d1").unwrap().show_label);
        assert!(p.superposition.is_none());
    }

    #[test]
    fn representation_defaults_to_cartoon() {
        let p: Protein = serde_json::from_str(r#"{"uniProtId": "Q1"}"#).unwrap();
        assert_eq!(p.representation, Representation::Cartoon);
        assert!(p.representation.is_cartoon_like());
        assert!(Representation::Backbone.is_cartoon_like());
        assert!(!Representation::Surface.is_cartoon_like());
    }

    #[test]
    fn exactly_one_source_is_accepted() {
        let both = r#"{"uniProtId": "P69905",
                       "file": {"name": "a.pdb", "bytes": [1]},
                       "chain": "A"}"#;
        let err = serde_json::from_str::<Protein>(both).unwrap_err();
        assert!(err.to_string().contains("not both"));
        assert!(serde_json::from_str::<Protein>(r#"{"chain": "A"}"#).is_err());

        let file: Protein = serde_json::from_str(
            r#"{"file": {"name": "a.pdb", "bytes": [1]}}"#,
        )
        .unwrap();
        assert!(file.is_file());
    }

    #[test]
    fn serialized_protein_reads_back() {
        let p = Protein::file(UploadedFile::new("a.pdb", vec![7]))
            .with_chain("B");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(serde_json::from_str::<Protein>(&json).unwrap(), p);
    }

    #[test]
    fn file_extension_decides_mmcif() {
        assert!(UploadedFile::new("model.cif", Vec::new()).is_mmcif());
        assert!(UploadedFile::new("model.mmcif", Vec::new()).is_mmcif());
        assert!(!UploadedFile::new("model.pdb", Vec::new()).is_mmcif());
    }
}
