use std::collections::HashMap;

use recipenow_core::{FieldStatus, OcrLine, ParseOutput, RecipeDraft, field};

use crate::classify::{LineClass, classify};
use crate::config::ParsingConfig;
use crate::fallback::{MergeReport, VisionExtraction, merge_vision_fallback};
use crate::ingredients::extract_ingredients;
use crate::normalize::normalize_ingredients;
use crate::section::{Sections, segment};
use crate::servings::extract_servings;
use crate::steps::extract_steps;
use crate::times::extract_times;
use crate::title::extract_title;
use crate::vocabulary::Vocabulary;

/// Deterministic recipe parser.
///
/// Holds a [`ParsingConfig`] and the [`Vocabulary`] resolved from it. Parsing
/// borrows both immutably, so one parser can be shared across threads.
#[derive(Debug, Clone)]
pub struct RecipeParser {
    config: ParsingConfig,
    vocab: Vocabulary,
}

impl Default for RecipeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeParser {
    /// Create a parser with the built-in English vocabulary.
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        let vocab = Vocabulary::from_config(&config);
        Self { config, vocab }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Classify every line in order.
    pub fn classify_lines(&self, lines: &[OcrLine]) -> Vec<LineClass> {
        lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let class = classify(&line.text, &self.vocab);
                tracing::trace!(line = i, text = %line.text, ?class, "classified");
                class
            })
            .collect()
    }

    /// Locate the ingredient and step sections of `lines`.
    pub fn segment(&self, lines: &[OcrLine]) -> Sections {
        segment(&self.classify_lines(lines), self.config.ingredient_gap_tolerance)
    }

    /// Parse OCR lines into a recipe draft with spans and field statuses.
    ///
    /// Runs segmentation, then title, ingredients (with the relaxed retry and
    /// name normalization), steps, servings and times. Never fails: anything not found is reported
    /// through a `missing` status. `lines` must already be in reading order.
    pub fn parse(&self, lines: &[OcrLine], asset_id: &str) -> ParseOutput {
        tracing::info!(asset_id, lines = lines.len(), "parsing recipe");

        if lines.is_empty() {
            tracing::warn!(asset_id, "no OCR lines to parse");
            return ParseOutput {
                recipe: RecipeDraft::default(),
                spans: Vec::new(),
                field_statuses: vec![
                    FieldStatus::missing(field::TITLE, "no OCR lines"),
                    FieldStatus::missing(field::INGREDIENTS, "no OCR lines"),
                    FieldStatus::missing(field::STEPS, "no OCR lines"),
                    FieldStatus::missing(field::SERVINGS, "no OCR lines"),
                ],
            };
        }

        let classes = self.classify_lines(lines);
        let sections = segment(&classes, self.config.ingredient_gap_tolerance);

        let mut recipe = RecipeDraft::default();
        let mut spans = Vec::new();
        let mut statuses = Vec::with_capacity(field::TRACKED.len());

        match extract_title(lines, &classes, &sections, &self.config, asset_id) {
            Some((title, span)) => {
                recipe.title = Some(title);
                spans.push(span);
                statuses.push(FieldStatus::extracted(field::TITLE));
            }
            None => statuses.push(FieldStatus::missing(field::TITLE, "could not detect title")),
        }

        let ingredients = extract_ingredients(
            lines,
            &classes,
            sections.ingredients.clone(),
            sections.ingredients_explicit,
            &self.vocab,
            asset_id,
        );
        if ingredients.ingredients.is_empty() {
            let note = if sections.ingredients.is_some() {
                "ingredient section found but no ingredient lines"
            } else {
                "could not detect ingredients"
            };
            statuses.push(FieldStatus::missing(field::INGREDIENTS, note));
        } else {
            let mut status = FieldStatus::extracted(field::INGREDIENTS);
            if ingredients.relaxed {
                status = status.with_notes("extracted with relaxed ingredient filter");
            }
            statuses.push(status);
        }
        recipe.ingredients = ingredients.ingredients;
        normalize_ingredients(&mut recipe.ingredients, &self.vocab);
        spans.extend(ingredients.spans);

        let (steps, step_spans) = extract_steps(lines, &classes, sections.steps_start, asset_id);
        statuses.push(if steps.is_empty() {
            FieldStatus::missing(field::STEPS, "could not detect steps")
        } else {
            FieldStatus::extracted(field::STEPS)
        });
        recipe.steps = steps;
        spans.extend(step_spans);

        match extract_servings(lines, &self.vocab, asset_id) {
            Some((servings, span)) => {
                recipe.servings = Some(servings);
                spans.push(span);
                statuses.push(FieldStatus::extracted(field::SERVINGS));
            }
            None => statuses.push(FieldStatus::missing(field::SERVINGS, "servings not found")),
        }

        let (times, time_spans) = extract_times(lines, &classes, sections.steps_start, asset_id);
        recipe.times = times;
        spans.extend(time_spans);

        tracing::info!(
            asset_id,
            title = recipe.title.is_some(),
            ingredients = recipe.ingredients.len(),
            steps = recipe.steps.len(),
            servings = ?recipe.servings,
            spans = spans.len(),
            "parsed recipe"
        );

        ParseOutput {
            recipe,
            spans,
            field_statuses: statuses,
        }
    }

    /// Merge a vision extraction into the missing fields of `output`.
    ///
    /// `lines` are the same OCR lines the parse ran on; their IDs resolve
    /// the vision evidence. Filled ingredients get normalized names too.
    pub fn merge_vision_fallback(
        &self,
        output: &mut ParseOutput,
        vision: &VisionExtraction,
        lines: &[OcrLine],
        asset_id: &str,
    ) -> MergeReport {
        let table: HashMap<String, OcrLine> = crate::evidence::line_table(lines);
        let report = merge_vision_fallback(output, vision, &table, asset_id);
        normalize_ingredients(&mut output.recipe.ingredients, &self.vocab);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;
    use recipenow_core::{BBox, ExtractionStatus};

    fn lines(texts: &[&str]) -> Vec<OcrLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                OcrLine::new(0, *t, BBox::new(10.0, i as f64 * 30.0, 300.0, 25.0), 0.9)
                    .with_id(format!("l{i}"))
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let out = RecipeParser::new().parse(&[], "a");
        assert!(out.recipe.title.is_none());
        assert!(out.spans.is_empty());
        assert_eq!(out.field_statuses.len(), 4);
        assert!(out.field_statuses.iter().all(FieldStatus::is_missing));
    }

    #[test]
    fn test_full_recipe() {
        let ls = lines(&[
            "Classic Pancakes",
            "Serves 4",
            "Prep time: 10 minutes",
            "Ingredients",
            "1 1/2 cups flour",
            "2 eggs",
            "salt and pepper",
            "Instructions",
            "1. Whisk the flour and eggs.",
            "2. Fry in a hot pan",
            "until golden.",
        ]);
        let out = RecipeParser::new().parse(&ls, "asset-9");

        assert_eq!(out.recipe.title.as_deref(), Some("Classic Pancakes"));
        assert_eq!(out.recipe.servings, Some(4));
        assert_eq!(out.recipe.times.prep_min, Some(10));
        assert_eq!(out.recipe.ingredients.len(), 2);
        assert_eq!(out.recipe.ingredients[0].quantity, Some(1.5));
        assert_eq!(out.recipe.steps.len(), 2);
        assert_eq!(out.recipe.steps[1].text, "2. Fry in a hot pan until golden.");

        let paths: Vec<&str> = out.field_statuses.iter().map(|s| s.field_path.as_str()).collect();
        assert_eq!(paths, field::TRACKED);
        assert!(
            out.field_statuses
                .iter()
                .all(|s| s.status == ExtractionStatus::Extracted)
        );
        assert!(out.spans.iter().all(|s| s.asset_id == "asset-9"));
    }

    #[test]
    fn test_ingredient_names_normalized() {
        let ls = lines(&[
            "Tomato Salad",
            "Ingredients",
            "4 ripe tomatoes, sliced",
            "2 tbsp olive oil",
            "Method",
            "1. Dress the tomatoes.",
        ]);
        let out = RecipeParser::new().parse(&ls, "a");
        let first = &out.recipe.ingredients[0];
        assert_eq!(first.original_text(), "4 ripe tomatoes, sliced");
        assert_eq!(first.name_norm.as_deref(), Some("tomato"));
        assert_eq!(first.quantity, Some(4.0));
        assert_eq!(out.recipe.ingredients[1].name_norm.as_deref(), Some("olive oil"));
        assert_eq!(
            out.spans_for("ingredients[0].original_text").next().unwrap().extracted_text,
            "4 ripe tomatoes, sliced"
        );
    }

    #[test]
    fn test_relaxed_note() {
        let ls = lines(&["Ingredients", "salt and pepper", "Method", "Season well."]);
        let out = RecipeParser::new().parse(&ls, "a");
        assert_eq!(out.recipe.ingredients.len(), 1);
        let status = out.status(field::INGREDIENTS).unwrap();
        assert_eq!(status.status, ExtractionStatus::Extracted);
        assert!(status.notes.as_deref().unwrap().contains("relaxed"));
    }

    #[test]
    fn test_bulleted_ingredients_under_header() {
        let ls = lines(&[
            "Green Salad",
            "Ingredients",
            "• Salt",
            "• Pepper",
            "Instructions",
            "1. Toss",
        ]);
        let out = RecipeParser::new().parse(&ls, "a");
        let texts: Vec<&str> = out.recipe.ingredients.iter().map(|i| i.original_text()).collect();
        assert_eq!(texts, vec!["• Salt", "• Pepper"]);
        assert_eq!(out.recipe.steps.len(), 1);
        assert_eq!(out.recipe.title.as_deref(), Some("Green Salad"));
        let status = out.status(field::INGREDIENTS).unwrap();
        assert!(status.notes.is_none());
    }

    #[test]
    fn test_custom_vocabulary() {
        let config = ParsingConfigBuilder::new()
            .add_ingredient_header("zutaten".into())
            .build()
            .unwrap();
        let parser = RecipeParser::with_config(config);
        let ls = lines(&["Zutaten", "200 g Mehl", "Method", "Mix it all."]);
        let out = parser.parse(&ls, "a");
        assert_eq!(out.recipe.ingredients.len(), 1);
        assert_eq!(out.recipe.ingredients[0].unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_merge_through_parser() {
        let parser = RecipeParser::new();
        let ls = lines(&["Serves 2", "a blurry mess"]);
        let mut out = parser.parse(&ls, "a");
        assert!(out.is_missing(field::STEPS));

        let vision: VisionExtraction = serde_json::from_str(
            r#"{"steps": [{"text": "Tidy up.", "evidence_ocr_line_ids": ["l1"]}]}"#,
        )
        .unwrap();
        let report = parser.merge_vision_fallback(&mut out, &vision, &ls, "a");
        assert_eq!(report.filled, vec!["steps"]);
        assert_eq!(out.recipe.steps[0].text, "Tidy up.");
        assert_eq!(out.spans_for(field::STEPS).next().unwrap().bbox, ls[1].bbox);
    }
}
