//! Component/representation subtrees hung under each structure.

use crate::color::confidence::{
    confidence_stops, CONFIDENCE_CATEGORY, CONFIDENCE_FIELD,
    CONFIDENCE_TOOLTIP,
};
use crate::color::policy::{base_color, domain_coloring, opacity_for_protein};
use crate::color::ColorHex;
use crate::error::MolmountError;
use crate::mvs::selector::{chain_selector, domain_selector, domain_union_selector};
use crate::mvs::{
    AnnotationSchema, ColorFromSourceParams, ColorParams, ComponentParams,
    ComponentSelector, DiscretePalette, Node, NodeKind, OpacityParams,
    PaletteKind, PaletteMode, RepresentationParams, TextParams,
    TooltipFromSourceParams,
};
use crate::protein::{DomainEntry, Protein};

/// One protein and its place in the list being compiled.
pub(super) struct ProteinContext<'a> {
    pub(super) protein: &'a Protein,
    pub(super) index: usize,
    pub(super) total: usize,
    pub(super) colors: &'a [ColorHex],
}

fn component(selector: ComponentSelector) -> Node {
    Node::new(NodeKind::Component(ComponentParams { selector }))
}

/// Representation in the protein's style. Uploaded files pin the geometry
/// scale and flat helices so they match database models.
fn representation(protein: &Protein) -> Node {
    let mut params = RepresentationParams::new(protein.representation);
    if protein.is_file() {
        params.size_factor = Some(1.0);
        params.tubular_helices = Some(false);
    }
    Node::new(NodeKind::Representation(params))
}

fn color(color: ColorHex, selector: Option<ComponentSelector>) -> Node {
    Node::new(NodeKind::Color(ColorParams { color, selector }))
}

fn opacity(opacity: f64) -> Node {
    Node::new(NodeKind::Opacity(OpacityParams { opacity }))
}

/// Color the representation by pLDDT and show the score on hover.
///
/// Consumes the finished representation and component so the three
/// affected nodes can be attached in order.
fn push_confidence_colored(
    structure: &mut Node,
    mut component: Node,
    mut repr: Node,
) -> Result<(), MolmountError> {
    let _ = repr.push(Node::new(NodeKind::ColorFromSource(
        ColorFromSourceParams {
            schema: AnnotationSchema::AllAtomic,
            category_name: CONFIDENCE_CATEGORY.to_owned(),
            field_name: CONFIDENCE_FIELD.to_owned(),
            palette: DiscretePalette {
                kind: PaletteKind::Discrete,
                mode: PaletteMode::Absolute,
                colors: confidence_stops(),
            },
        },
    )))?;
    let _ = component.push(repr)?;
    let _ = component.push(Node::new(NodeKind::Tooltip(TextParams {
        text: CONFIDENCE_TOOLTIP.to_owned(),
    })))?;
    let _ = structure.push(component)?;
    let _ = structure.push(Node::new(NodeKind::TooltipFromSource(
        TooltipFromSourceParams {
            schema: AnnotationSchema::AllAtomic,
            category_name: CONFIDENCE_CATEGORY.to_owned(),
            field_name: CONFIDENCE_FIELD.to_owned(),
        },
    )))?;
    Ok(())
}

/// Whole chain, one representation.
pub(super) fn without_chopping(
    structure: &mut Node,
    ctx: &ProteinContext<'_>,
) -> Result<(), MolmountError> {
    let protein = ctx.protein;
    let component = component(chain_selector(protein));
    let mut repr = representation(protein);

    let emphasized = ctx.total == 1 || (ctx.total >= 3 && ctx.index == 0);
    if emphasized && protein.representation.is_cartoon_like() {
        return push_confidence_colored(structure, component, repr);
    }

    if ctx.total > 1 {
        let _ = repr.push(color(base_color(ctx.colors, ctx.index), None))?;
        // Only overlays of three or more produce a value; pairs never do.
        if let Some(value) = opacity_for_protein(ctx.index, ctx.total)
            .filter(|value| *value < 1.0)
        {
            let _ = repr.push(opacity(value))?;
        }
    }

    let mut component = component;
    let _ = component.push(repr)?;
    let _ = structure.push(component)?;
    Ok(())
}

/// Dimmed (or neutral) chain background plus highlighted domains.
pub(super) fn with_chopping(
    structure: &mut Node,
    ctx: &ProteinContext<'_>,
    entries: &[DomainEntry],
) -> Result<(), MolmountError> {
    let protein = ctx.protein;
    let coloring =
        domain_coloring(ctx.index, ctx.total, entries.len(), ctx.colors);
    log::debug!(
        "Protein {}: {} domain(s), inline coloring {}",
        ctx.index + 1,
        entries.len(),
        coloring.inline
    );

    let mut background = representation(protein);
    let _ = background.push(color(coloring.background.clone(), None))?;
    let _ = background.push(opacity(coloring.background_opacity))?;

    if coloring.inline {
        for (entry, domain_color) in entries.iter().zip(&coloring.palette) {
            if let Some(selector) =
                domain_union_selector(protein, &entry.ranges)
            {
                let _ = background
                    .push(color(domain_color.clone(), Some(selector)))?;
            }
        }
    }

    let mut base = component(chain_selector(protein));
    let _ = base.push(background)?;
    let _ = structure.push(base)?;

    if coloring.inline {
        for entry in entries {
            push_label(structure, protein, entry)?;
        }
        return Ok(());
    }

    for (entry, domain_color) in entries.iter().zip(&coloring.palette) {
        for range in &entry.ranges {
            let mut repr = representation(protein);
            let _ = repr.push(color(domain_color.clone(), None))?;
            let mut part = component(domain_selector(protein, range));
            let _ = part.push(repr)?;
            let _ = structure.push(part)?;
        }
        push_label(structure, protein, entry)?;
    }
    Ok(())
}

/// Label component on the entry's middle range, when requested.
fn push_label(
    structure: &mut Node,
    protein: &Protein,
    entry: &DomainEntry,
) -> Result<(), MolmountError> {
    if !entry.show_label {
        return Ok(());
    }
    let Some(anchor) = entry.label_anchor() else {
        return Ok(());
    };
    let mut label = component(domain_selector(protein, anchor));
    let _ = label.push(Node::new(NodeKind::Label(TextParams {
        text: entry.label.clone(),
    })))?;
    let _ = structure.push(label)?;
    Ok(())
}
