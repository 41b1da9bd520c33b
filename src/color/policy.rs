//! Palette and opacity decision tables.
//!
//! The scene compiler asks three questions here: which base color a protein
//! gets, how transparent it is in a multi-protein overlay, and how its
//! domains are colored when chopping data is present. Answers depend only
//! on the protein count, the protein's index and its domain count.

use super::ColorHex;
use crate::error::MolmountError;

/// Accent used for single proteins and the first of a pair.
pub const BASE_COLOR_BLUE: ColorHex = ColorHex::from_normalized("#0D6EFD");
/// Accent used for the second of a pair and the lead of an overlay.
pub const BASE_COLOR_YELLOW: ColorHex = ColorHex::from_normalized("#FD9D0D");
/// Fill for overlay members and informational backgrounds.
pub const BASE_COLOR_GREY: ColorHex = ColorHex::from_normalized("#F0F0F0");

/// Categorical palette for the domains of a single protein.
pub const MULTI_DOMAIN_COLORS: [ColorHex; 10] = [
    ColorHex::from_normalized("#4E79A7"),
    ColorHex::from_normalized("#F28E2C"),
    ColorHex::from_normalized("#E15759"),
    ColorHex::from_normalized("#76B7B2"),
    ColorHex::from_normalized("#59A14F"),
    ColorHex::from_normalized("#EDC949"),
    ColorHex::from_normalized("#AF7AA1"),
    ColorHex::from_normalized("#FF9DA7"),
    ColorHex::from_normalized("#9C755F"),
    ColorHex::from_normalized("#BAB0AC"),
];

/// Fixed palette returned by [`infer_domain_colors`].
pub const DOMAIN_INFERENCE_COLORS: [ColorHex; 4] = [
    ColorHex::from_normalized("#FF999C"),
    ColorHex::from_normalized("#C8EAFF"),
    ColorHex::from_normalized("#8D272B"),
    ColorHex::from_normalized("#86AEC6"),
];

/// Opacity of overlay member 1.
pub const MULTI_PROTEIN_OPACITY_MAX: f64 = 0.5;
/// Opacity of the last overlay member.
pub const MULTI_PROTEIN_OPACITY_MIN: f64 = 0.1;
/// Opacity of the chain background behind highlighted domains.
pub const REST_OPACITY: f64 = 0.15;

/// Base palette for `count` proteins.
///
/// One protein gets blue, a pair gets blue and yellow, and larger overlays
/// get a yellow lead followed by grey.
#[must_use]
pub fn infer_colors(count: usize) -> Vec<ColorHex> {
    match count {
        0 => Vec::new(),
        1 => vec![BASE_COLOR_BLUE],
        2 => vec![BASE_COLOR_BLUE, BASE_COLOR_YELLOW],
        n => std::iter::once(BASE_COLOR_YELLOW)
            .chain(std::iter::repeat(BASE_COLOR_GREY).take(n - 1))
            .collect(),
    }
}

/// Palette for coloring `domains` domains across `count` proteins.
///
/// # Errors
///
/// [`MolmountError::Configuration`] if fewer than two domains are given
/// for a non-empty protein list.
pub fn infer_domain_colors(
    count: usize,
    domains: usize,
) -> Result<Vec<ColorHex>, MolmountError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if domains <= 1 {
        return Err(MolmountError::configuration(
            "at least two domains are required to infer domain colors",
        ));
    }
    Ok(DOMAIN_INFERENCE_COLORS.to_vec())
}

/// `colors[index]`, or grey past the end of the palette.
#[must_use]
pub fn base_color(colors: &[ColorHex], index: usize) -> ColorHex {
    colors.get(index).cloned().unwrap_or(BASE_COLOR_GREY)
}

/// Overlay opacity for protein `index` of `total`.
///
/// `None` for fewer than three proteins and for the lead protein. Members
/// 1..N-1 fade linearly from [`MULTI_PROTEIN_OPACITY_MAX`] at member 1 down
/// to exactly [`MULTI_PROTEIN_OPACITY_MIN`] at the last member.
#[must_use]
pub fn opacity_for_protein(index: usize, total: usize) -> Option<f64> {
    if total < 3 || index == 0 {
        return None;
    }

    let range = MULTI_PROTEIN_OPACITY_MAX - MULTI_PROTEIN_OPACITY_MIN;
    let step = range / (total - 2) as f64;
    Some(
        (MULTI_PROTEIN_OPACITY_MAX - (index - 1) as f64 * step)
            .max(MULTI_PROTEIN_OPACITY_MIN),
    )
}

/// How a chopped protein's background and domains are colored.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainColoring {
    /// Color of the whole-chain background representation.
    pub background: ColorHex,
    /// Opacity of the background representation.
    pub background_opacity: f64,
    /// One color per domain entry, in entry order.
    pub palette: Vec<ColorHex>,
    /// Color domains with selectors on the background representation
    /// instead of separate components.
    pub inline: bool,
}

/// Decide background and domain colors for one chopped protein.
///
/// `domain_count` is the number of normalized, non-empty domain entries.
#[must_use]
pub fn domain_coloring(
    protein_index: usize,
    total: usize,
    domain_count: usize,
    colors: &[ColorHex],
) -> DomainColoring {
    let single_multi_domain = total == 1 && domain_count >= 2;

    let (background, background_opacity) = if single_multi_domain {
        (BASE_COLOR_GREY, 1.0)
    } else {
        (base_color(colors, protein_index), REST_OPACITY)
    };

    let palette = if single_multi_domain {
        MULTI_DOMAIN_COLORS
            .iter()
            .cycle()
            .take(domain_count)
            .cloned()
            .collect()
    } else if total == 2 && domain_count >= 2 {
        let accent = if protein_index == 0 {
            BASE_COLOR_BLUE
        } else {
            BASE_COLOR_YELLOW
        };
        vec![accent; domain_count]
    } else if total == 2 && domain_count == 1 {
        vec![background.clone()]
    } else {
        vec![BASE_COLOR_BLUE; domain_count]
    };

    DomainColoring {
        background,
        background_opacity,
        palette,
        inline: single_multi_domain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_colors_lengths() {
        assert!(infer_colors(0).is_empty());
        assert_eq!(infer_colors(1).len(), 1);

        let pair = infer_colors(2);
        assert_eq!(pair.len(), 2);
        assert_ne!(pair[0], pair[1]);

        let five = infer_colors(5);
        assert_eq!(five.len(), 5);
        assert!(five[1..].iter().all(|c| *c == BASE_COLOR_GREY));
        assert_ne!(five[0], five[1]);
    }

    #[test]
    fn domain_inference_needs_two_domains() {
        assert!(infer_domain_colors(0, 0).unwrap().is_empty());
        assert!(infer_domain_colors(1, 1).is_err());
        assert_eq!(infer_domain_colors(1, 3).unwrap().len(), 4);
    }

    #[test]
    fn base_color_falls_back_to_grey() {
        let colors = infer_colors(1);
        assert_eq!(base_color(&colors, 0), BASE_COLOR_BLUE);
        assert_eq!(base_color(&colors, 7), BASE_COLOR_GREY);
    }

    #[test]
    fn opacity_fades_across_overlay_members() {
        assert_eq!(opacity_for_protein(0, 5), None);
        let values: Vec<f64> = (1..5)
            .map(|i| opacity_for_protein(i, 5).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(values[0], MULTI_PROTEIN_OPACITY_MAX);
        assert!((values[3] - MULTI_PROTEIN_OPACITY_MIN).abs() < 1e-12);
    }

    #[test]
    fn three_proteins_span_the_whole_range() {
        assert_eq!(opacity_for_protein(1, 3), Some(MULTI_PROTEIN_OPACITY_MAX));
        assert_eq!(opacity_for_protein(2, 3), Some(MULTI_PROTEIN_OPACITY_MIN));
    }

    #[test]
    fn opacity_absent_below_three_proteins() {
        assert_eq!(opacity_for_protein(1, 2), None);
        assert_eq!(opacity_for_protein(0, 1), None);
    }

    #[test]
    fn single_protein_many_domains_is_inline_categorical() {
        let coloring = domain_coloring(0, 1, 12, &infer_colors(1));
        assert!(coloring.inline);
        assert_eq!(coloring.background, BASE_COLOR_GREY);
        assert_eq!(coloring.background_opacity, 1.0);
        assert_eq!(coloring.palette.len(), 12);
        assert_eq!(coloring.palette[10], MULTI_DOMAIN_COLORS[0]);
    }

    #[test]
    fn pair_with_many_domains_uses_protein_accent() {
        let colors = infer_colors(2);
        let first = domain_coloring(0, 2, 3, &colors);
        let second = domain_coloring(1, 2, 2, &colors);
        assert!(!first.inline);
        assert!(first.palette.iter().all(|c| *c == BASE_COLOR_BLUE));
        assert!(second.palette.iter().all(|c| *c == BASE_COLOR_YELLOW));
        assert_eq!(first.background_opacity, REST_OPACITY);
    }

    #[test]
    fn pair_with_one_domain_reuses_background() {
        let colors = infer_colors(2);
        let coloring = domain_coloring(1, 2, 1, &colors);
        assert_eq!(coloring.palette, vec![coloring.background.clone()]);
        assert_eq!(coloring.background, BASE_COLOR_YELLOW);
    }

    #[test]
    fn single_protein_one_domain_falls_through_to_blue() {
        let coloring = domain_coloring(0, 1, 1, &infer_colors(1));
        assert!(!coloring.inline);
        assert_eq!(coloring.background, BASE_COLOR_BLUE);
        assert_eq!(coloring.background_opacity, REST_OPACITY);
        assert_eq!(coloring.palette, vec![BASE_COLOR_BLUE]);
    }
}
