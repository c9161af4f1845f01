use std::ops::Range;

use recipenow_core::{Ingredient, OcrLine, Span, field};

use crate::classify::{LineClass, StepMarker, is_subheading};
use crate::quantity::split_quantity;
use crate::vocabulary::Vocabulary;

/// Ingredients pulled from the resolved ingredient range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientExtraction {
    pub ingredients: Vec<Ingredient>,
    pub spans: Vec<Span>,
    /// Whether the strict pass came up empty and the relaxed pass was used.
    pub relaxed: bool,
}

/// Extract ingredients from `range`.
///
/// The strict pass keeps only ingredient-like lines. If it finds nothing in
/// a non-empty range, the same range is re-read with the ingredient-like
/// filter turned off, which recovers unit-less lines such as
/// "salt and pepper to taste".
///
/// When the range sits under an explicit ingredient header (`explicit`), a
/// bulleted line is an item even if its text has no ingredient shape, so
/// "• Salt" is kept. Numbered and verb-led lines are rejected either way.
pub fn extract_ingredients(
    lines: &[OcrLine],
    classes: &[LineClass],
    range: Option<Range<usize>>,
    explicit: bool,
    vocab: &Vocabulary,
    asset_id: &str,
) -> IngredientExtraction {
    let Some(range) = range else {
        return IngredientExtraction::default();
    };

    let strict = collect(lines, classes, range.clone(), explicit, vocab, asset_id, true);
    if !strict.ingredients.is_empty() || range.is_empty() {
        return strict;
    }

    tracing::debug!(?range, "strict ingredient pass empty, retrying with relaxed filter");
    let mut relaxed = collect(lines, classes, range, explicit, vocab, asset_id, false);
    relaxed.relaxed = !relaxed.ingredients.is_empty();
    relaxed
}

fn collect(
    lines: &[OcrLine],
    classes: &[LineClass],
    range: Range<usize>,
    explicit: bool,
    vocab: &Vocabulary,
    asset_id: &str,
    strict: bool,
) -> IngredientExtraction {
    let mut out = IngredientExtraction::default();

    for idx in range {
        let (line, class) = (&lines[idx], &classes[idx]);
        if class.is_blank
            || class.is_header()
            || class.is_noise
            || class.is_time_annotation
            || is_subheading(&line.text)
        {
            continue;
        }
        let bullet_item = explicit && class.step_marker == Some(StepMarker::Bullet);
        if class.is_step_start() && !bullet_item {
            tracing::trace!(line = idx, "rejecting step-like line from ingredients");
            continue;
        }
        if strict && !class.is_ingredient_like && !bullet_item {
            continue;
        }

        let split = split_quantity(&line.text, vocab);
        let mut ingredient = Ingredient::new(line.text.clone());
        ingredient.quantity = split.quantity;
        ingredient.unit = split.unit;
        ingredient.optional = line.text.to_lowercase().contains("optional");

        let path = field::ingredient(out.ingredients.len());
        out.spans
            .push(Span::from_line(path, asset_id, line, line.text.clone()));
        out.ingredients.push(ingredient);
    }

    out
}
