//! Protein list → MolViewSpec scene compiler.
//!
//! [`compile`] turns a list of [`Protein`] display intents into a single
//! [`MvsData`] document. Each protein becomes one branch of the tree:
//!
//! ```text
//! download → parse → structure ─┬─ transform
//!                               ├─ component → representation → color…
//!                               └─ …
//! ```
//!
//! What hangs under the structure depends on how many proteins are shown
//! and on the protein's domain chopping; see [`crate::color::policy`].
//! Compilation is all-or-nothing: any error aborts the whole call.

mod rendering;

use std::fmt;
use std::sync::Arc;

use rendering::ProteinContext;

use crate::color::policy::infer_colors;
use crate::error::MolmountError;
use crate::mvs::{
    DownloadParams, Metadata, MvsData, Node, NodeKind, ParseFormat,
    ParseParams, StructureParams, TransformParams,
};
use crate::protein::{normalize_chopping, Protein, ProteinSource, UploadedFile};

/// Default model location for UniProt accessions. `{id}` is replaced by
/// the percent-encoded accession.
pub const DEFAULT_UNIPROT_URL_TEMPLATE: &str =
    "https://alphafold.ebi.ac.uk/files/AF-{id}-F1-model_v6.cif";

/// Proteins at or above this count are drawn as a plain overlay and their
/// chopping is ignored.
pub const OVERLAY_THRESHOLD: usize = 3;

/// Turns uploaded files into URLs the engine can download from.
///
/// URLs handed out stay valid until the provider revokes them.
pub trait ObjectUrlProvider {
    /// Register `file` and return a URL for it.
    ///
    /// # Errors
    ///
    /// Whatever the engine reports when the URL cannot be created.
    fn create_object_url(
        &self,
        file: &UploadedFile,
    ) -> Result<String, MolmountError>;
}

/// Builds a download URL from a UniProt accession.
pub type UrlBuilder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// How database identifiers are resolved to download URLs.
#[derive(Clone)]
pub struct ModelSourceUrls {
    uniprot: Option<UrlBuilder>,
    template: String,
}

impl Default for ModelSourceUrls {
    fn default() -> Self {
        Self::from_template(DEFAULT_UNIPROT_URL_TEMPLATE)
    }
}

impl fmt::Debug for ModelSourceUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSourceUrls")
            .field("uniprot", &self.uniprot.as_ref().map(|_| "<fn>"))
            .field("template", &self.template)
            .finish()
    }
}

impl ModelSourceUrls {
    /// Resolve accessions through a `{id}` template.
    #[must_use]
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            uniprot: None,
            template: template.into(),
        }
    }

    /// Resolve accessions with a custom function. Takes precedence over
    /// the template.
    #[must_use]
    pub fn with_uniprot_builder<F>(mut self, builder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.uniprot = Some(Arc::new(builder));
        self
    }

    /// Download URL for a UniProt accession.
    #[must_use]
    pub fn uniprot_url(&self, id: &str) -> String {
        self.uniprot.as_ref().map_or_else(
            || self.template.replace("{id}", &urlencoding::encode(id)),
            |build| build(id),
        )
    }
}

/// Where the engine downloads this protein from.
fn resolve_source_url(
    protein: &Protein,
    urls: &ModelSourceUrls,
    files: Option<&dyn ObjectUrlProvider>,
) -> Result<String, MolmountError> {
    match &protein.source {
        ProteinSource::File(file) => {
            let provider = files.ok_or_else(|| {
                MolmountError::configuration(format!(
                    "uploaded file {:?} needs a viewer instance to create \
                     its object URL",
                    file.name
                ))
            })?;
            provider.create_object_url(file)
        }
        ProteinSource::UniProtId(id) => Ok(urls.uniprot_url(id)),
    }
}

/// Database models are always mmCIF; uploads go by file extension.
fn parse_format(protein: &Protein) -> ParseFormat {
    match &protein.source {
        ProteinSource::File(file) if !file.is_mmcif() => ParseFormat::Pdb,
        _ => ParseFormat::Mmcif,
    }
}

fn compile_protein(
    root: &mut Node,
    ctx: &ProteinContext<'_>,
    urls: &ModelSourceUrls,
    files: Option<&dyn ObjectUrlProvider>,
) -> Result<(), MolmountError> {
    let protein = ctx.protein;
    let url = resolve_source_url(protein, urls, files)?;
    log::debug!("Protein {} of {}: {url}", ctx.index + 1, ctx.total);

    let download =
        root.push(Node::new(NodeKind::Download(DownloadParams { url })))?;
    let parse = download.push(Node::new(NodeKind::Parse(ParseParams {
        format: parse_format(protein),
    })))?;
    let structure_params = if protein.is_file() {
        StructureParams::first_model()
    } else {
        StructureParams::default()
    };
    let structure =
        parse.push(Node::new(NodeKind::Structure(structure_params)))?;

    let superposition = protein.superposition_or_default();
    let _ = structure.push(Node::new(NodeKind::Transform(TransformParams {
        rotation: superposition.rotation_column_major(),
        translation: superposition.translation,
        rotation_center: [0.0; 3],
    })))?;

    let chopping = if ctx.total >= OVERLAY_THRESHOLD {
        Vec::new()
    } else {
        normalize_chopping(protein.chopping.as_deref())
    };

    if chopping.is_empty() {
        rendering::without_chopping(structure, ctx)
    } else {
        rendering::with_chopping(structure, ctx, &chopping)
    }
}

/// Compile `proteins` into a scene document.
///
/// `files` creates object URLs for uploaded structures; it is only
/// required when at least one protein is an upload.
///
/// # Errors
///
/// - [`MolmountError::Configuration`] when an uploaded file is present
///   but `files` is `None`.
/// - Any error from `files` while creating an object URL.
pub fn compile(
    proteins: &[Protein],
    urls: &ModelSourceUrls,
    files: Option<&dyn ObjectUrlProvider>,
) -> Result<MvsData, MolmountError> {
    let total = proteins.len();
    let colors = infer_colors(total);

    let mut root = Node::root();
    for (index, protein) in proteins.iter().enumerate() {
        let ctx = ProteinContext {
            protein,
            index,
            total,
            colors: &colors,
        };
        compile_protein(&mut root, &ctx, urls, files)?;
    }

    let title = if total > 1 {
        "Protein Comparison"
    } else {
        "Protein Visualization"
    };
    let metadata = Metadata::now(
        Some(title.to_owned()),
        Some(format!("Visualization of {total} protein(s)")),
    );
    log::debug!("Compiled scene for {total} protein(s)");
    MvsData::new(root, metadata)
}
