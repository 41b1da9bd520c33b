//! Component selectors: which atoms a component covers.

use serde::{Deserialize, Serialize};

use crate::protein::{ChoppingRange, Protein};

/// Selector keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticSelector {
    /// Every atom of the structure.
    All,
}

/// Conjunction of atom properties. Unset fields do not constrain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComponentExpression {
    /// Chain by label (mmCIF `label_asym_id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_asym_id: Option<String>,
    /// Chain by author label (`auth_asym_id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_asym_id: Option<String>,
    /// First author residue number (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beg_auth_seq_id: Option<i32>,
    /// Last author residue number (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_auth_seq_id: Option<i32>,
}

/// A component selector: keyword, one expression, or a union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentSelector {
    /// A keyword such as `"all"`.
    Static(StaticSelector),
    /// A single expression.
    Expression(ComponentExpression),
    /// Atoms matching any of the expressions.
    Union(Vec<ComponentExpression>),
}

impl ComponentSelector {
    /// Every atom.
    #[must_use]
    pub fn all() -> Self {
        Self::Static(StaticSelector::All)
    }
}

/// Chain constraint for a protein. Uploaded files are keyed by
/// `label_asym_id`, database models by `auth_asym_id`.
fn chain_expression(protein: &Protein) -> Option<ComponentExpression> {
    let chain = protein.chain.clone()?;
    Some(if protein.is_file() {
        ComponentExpression {
            label_asym_id: Some(chain),
            ..ComponentExpression::default()
        }
    } else {
        ComponentExpression {
            auth_asym_id: Some(chain),
            ..ComponentExpression::default()
        }
    })
}

/// The protein's chain, or everything when no chain is set.
#[must_use]
pub fn chain_selector(protein: &Protein) -> ComponentSelector {
    chain_expression(protein)
        .map_or_else(ComponentSelector::all, ComponentSelector::Expression)
}

/// One residue range, constrained to the protein's chain if it has one.
#[must_use]
pub fn range_expression(
    protein: &Protein,
    range: &ChoppingRange,
) -> ComponentExpression {
    let (beg, end) = range.residue_bounds();
    ComponentExpression {
        beg_auth_seq_id: Some(beg),
        end_auth_seq_id: Some(end),
        ..chain_expression(protein).unwrap_or_default()
    }
}

/// Selector for a residue range of the protein.
#[must_use]
pub fn domain_selector(
    protein: &Protein,
    range: &ChoppingRange,
) -> ComponentSelector {
    ComponentSelector::Expression(range_expression(protein, range))
}

/// Selector covering every range of a domain: the bare expression for a
/// single range, a union otherwise. `None` for no ranges.
#[must_use]
pub fn domain_union_selector(
    protein: &Protein,
    ranges: &[ChoppingRange],
) -> Option<ComponentSelector> {
    match ranges {
        [] => None,
        [single] => Some(domain_selector(protein, single)),
        many => Some(ComponentSelector::Union(
            many.iter().map(|r| range_expression(protein, r)).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protein::UploadedFile;

    #[test]
    fn no_chain_selects_all() {
        let p = Protein::uniprot("P1");
        assert_eq!(
            serde_json::to_value(chain_selector(&p)).unwrap(),
            json!("all")
        );
    }

    #[test]
    fn chain_key_depends_on_source() {
        let db = Protein::uniprot("P1").with_chain("B");
        let file = Protein::file(UploadedFile::new("x.pdb", Vec::new()))
            .with_chain("B");
        assert_eq!(
            serde_json::to_value(chain_selector(&db)).unwrap(),
            json!({"auth_asym_id": "B"})
        );
        assert_eq!(
            serde_json::to_value(chain_selector(&file)).unwrap(),
            json!({"label_asym_id": "B"})
        );
    }

    #[test]
    fn range_without_chain_is_bare() {
        let p = Protein::uniprot("P1");
        let sel = domain_selector(&p, &ChoppingRange::new(5, 10));
        assert_eq!(
            serde_json::to_value(sel).unwrap(),
            json!({"beg_auth_seq_id": 5, "end_auth_seq_id": 10})
        );
    }

    #[test]
    fn multiple_ranges_become_a_union() {
        let p = Protein::uniprot("P1").with_chain("A");
        let ranges = [ChoppingRange::new(1, 10), ChoppingRange::new(30, 40)];
        let sel = domain_union_selector(&p, &ranges).unwrap();
        assert_eq!(
            serde_json::to_value(sel).unwrap(),
            json!([
                {"auth_asym_id": "A", "beg_auth_seq_id": 1, "end_auth_seq_id": 10},
                {"auth_asym_id": "A", "beg_auth_seq_id": 30, "end_auth_seq_id": 40}
            ])
        );
        assert!(domain_union_selector(&p, &[]).is_none());
    }

    #[test]
    fn selectors_read_back() {
        let all: ComponentSelector = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(all, ComponentSelector::all());
        let union: ComponentSelector =
            serde_json::from_value(json!([{"auth_asym_id": "A"}])).unwrap();
        assert!(matches!(union, ComponentSelector::Union(v) if v.len() == 1));
    }
}
