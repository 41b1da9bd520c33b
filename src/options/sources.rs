use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::compiler::{ModelSourceUrls, DEFAULT_UNIPROT_URL_TEMPLATE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[schemars(title = "Sources", inline)]
#[serde(default)]
/// Where database identifiers are downloaded from.
pub struct SourcesOptions {
    /// UniProt model URL; `{id}` is replaced by the accession.
    #[schemars(title = "UniProt URL Template")]
    pub uniprot_url_template: String,
}

impl Default for SourcesOptions {
    fn default() -> Self {
        Self {
            uniprot_url_template: DEFAULT_UNIPROT_URL_TEMPLATE.to_owned(),
        }
    }
}

impl SourcesOptions {
    /// URL resolution for the compiler.
    #[must_use]
    pub fn model_source_urls(&self) -> ModelSourceUrls {
        ModelSourceUrls::from_template(self.uniprot_url_template.clone())
    }
}
