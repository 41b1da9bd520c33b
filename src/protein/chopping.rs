//! Domain "chopping": named residue ranges within a chain.

use serde::{Deserialize, Serialize};

/// One residue range of a domain, in author residue numbering.
///
/// Bounds are floats so that input straight from JSON or a UI can be
/// validated; [`normalize_chopping`] drops ranges with non-finite bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoppingRange {
    /// First residue (inclusive).
    pub start: f64,
    /// Last residue (inclusive).
    pub end: f64,
}

impl ChoppingRange {
    /// Range between two residue numbers, in either order.
    #[must_use]
    pub fn new(start: impl Into<f64>, end: impl Into<f64>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Integer residue bounds `(begin, end)`.
    #[must_use]
    pub fn residue_bounds(&self) -> (i32, i32) {
        (self.start as i32, self.end as i32)
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    fn ordered(self) -> Self {
        Self {
            start: self.start.min(self.end),
            end: self.start.max(self.end),
        }
    }
}

/// A named domain, possibly split over several disjoint ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEntry {
    /// Domain name, used for labels and [`crate::mount::Mount::highlight`].
    pub label: String,
    /// Attach a text label to the domain in the scene.
    #[serde(default)]
    pub show_label: bool,
    /// Residue ranges making up the domain.
    pub ranges: Vec<ChoppingRange>,
}

impl DomainEntry {
    /// A domain with a single range.
    #[must_use]
    pub fn new(label: impl Into<String>, ranges: Vec<ChoppingRange>) -> Self {
        Self {
            label: label.into(),
            show_label: false,
            ranges,
        }
    }

    /// Builder-style toggle for [`DomainEntry::show_label`].
    #[must_use]
    pub fn with_label_shown(mut self, show: bool) -> Self {
        self.show_label = show;
        self
    }

    /// The range a label is anchored to: the middle entry of the range
    /// list by position, taking the upper of the two middles for even
    /// lengths (`ranges[len / 2]`).
    #[must_use]
    pub fn label_anchor(&self) -> Option<&ChoppingRange> {
        self.ranges.get(self.ranges.len() / 2)
    }
}

/// Order range bounds, drop non-finite ranges, then drop empty entries.
///
/// Idempotent: normalizing normalized data returns it unchanged.
#[must_use]
pub fn normalize_chopping(chopping: Option<&[DomainEntry]>) -> Vec<DomainEntry> {
    let Some(entries) = chopping else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| DomainEntry {
            label: entry.label.clone(),
            show_label: entry.show_label,
            ranges: entry
                .ranges
                .iter()
                .filter(|r| r.is_finite())
                .map(|r| r.ordered())
                .collect(),
        })
        .filter(|entry| !entry.ranges.is_empty())
        .collect()
}
