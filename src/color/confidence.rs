//! Per-residue prediction confidence (pLDDT) → color mapping.
//!
//! Predicted models store pLDDT in the B-factor column
//! (`atom_site.B_iso_or_equiv`). Four discrete bands are used, each
//! starting at a fixed lower bound:
//!
//! | band      | pLDDT   | color     |
//! |-----------|---------|-----------|
//! | very low  | < 50    | `#FF7D45` |
//! | low       | 50–70   | `#FFDB13` |
//! | confident | 70–90   | `#65CBF3` |
//! | very high | ≥ 90    | `#0053D6` |

use super::ColorHex;

/// Lower bound of the "low" band.
const LOW_THRESHOLD: f64 = 50.0;
/// Lower bound of the "confident" band.
const CONFIDENT_THRESHOLD: f64 = 70.0;
/// Lower bound of the "very high" band.
const VERY_HIGH_THRESHOLD: f64 = 90.0;

/// mmCIF category holding the confidence score.
pub const CONFIDENCE_CATEGORY: &str = "atom_site";
/// mmCIF field holding the confidence score.
pub const CONFIDENCE_FIELD: &str = "B_iso_or_equiv";
/// Tooltip prefix shown before the numeric score.
pub const CONFIDENCE_TOOLTIP: &str = "pLDDT:";

/// A pLDDT confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// pLDDT < 50.
    VeryLow,
    /// 50 ≤ pLDDT < 70.
    Low,
    /// 70 ≤ pLDDT < 90.
    Confident,
    /// pLDDT ≥ 90.
    VeryHigh,
}

impl ConfidenceBand {
    /// All bands, lowest first.
    pub const ALL: [Self; 4] =
        [Self::VeryLow, Self::Low, Self::Confident, Self::VeryHigh];

    /// Classify a per-residue score.
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score >= VERY_HIGH_THRESHOLD {
            Self::VeryHigh
        } else if score >= CONFIDENT_THRESHOLD {
            Self::Confident
        } else if score >= LOW_THRESHOLD {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    /// Score at which this band starts.
    #[must_use]
    pub fn lower_bound(self) -> f64 {
        match self {
            Self::VeryLow => 0.0,
            Self::Low => LOW_THRESHOLD,
            Self::Confident => CONFIDENT_THRESHOLD,
            Self::VeryHigh => VERY_HIGH_THRESHOLD,
        }
    }

    /// Display color of this band.
    #[must_use]
    pub fn color(self) -> ColorHex {
        match self {
            Self::VeryLow => ColorHex::from_normalized("#FF7D45"),
            Self::Low => ColorHex::from_normalized("#FFDB13"),
            Self::Confident => ColorHex::from_normalized("#65CBF3"),
            Self::VeryHigh => ColorHex::from_normalized("#0053D6"),
        }
    }
}

/// `(color, lower bound)` stops for a discrete absolute palette.
#[must_use]
pub fn confidence_stops() -> Vec<(ColorHex, f64)> {
    ConfidenceBand::ALL
        .iter()
        .map(|band| (band.color(), band.lower_bound()))
        .collect()
}

/// Per-residue colors for a slice of pLDDT scores.
#[must_use]
pub fn per_residue_confidence_colors(scores: &[f64]) -> Vec<ColorHex> {
    scores
        .iter()
        .map(|&s| ConfidenceBand::for_score(s).color())
        .collect()
}
