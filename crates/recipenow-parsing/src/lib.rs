use once_cell::sync::Lazy;
use thiserror::Error;

pub mod classify;
pub mod config;
pub mod evidence;
pub mod extractor;
pub mod fallback;
pub mod ingredients;
pub mod normalize;
pub mod quantity;
pub mod section;
pub mod servings;
pub mod steps;
pub mod times;
pub mod title;
pub mod vocabulary;

pub use classify::{HeaderKind, LineClass, StepMarker};
pub use config::{ListOverride, ParsingConfig, ParsingConfigBuilder};
pub use evidence::{build_span_from_evidence, line_table};
pub use extractor::RecipeParser;
pub use fallback::{MergeReport, VisionExtraction, merge_vision_fallback, missing_critical_fields};
pub use normalize::{normalize_ingredients, normalize_name};
pub use quantity::parse_quantity;
pub use section::Sections;
pub use times::parse_duration_minutes;
pub use vocabulary::Vocabulary;
// Re-export domain types from core (canonical definitions live there)
pub use recipenow_core::{
    BBox, Evidence, ExtractionStatus, FieldStatus, Ingredient, OcrLine, ParseOutput, RecipeDraft,
    ServingsEstimate, SourceMethod, Span, Step, Times,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

static DEFAULT_PARSER: Lazy<RecipeParser> = Lazy::new(RecipeParser::new);

/// Parse OCR lines with the built-in vocabulary.
///
/// Pipeline:
/// 1. Classify each line (header, noise, step start, ingredient-like)
/// 2. Locate the ingredient and step sections
/// 3. Extract title, ingredients (relaxed retry if the strict pass is empty), steps
/// 4. Normalize ingredient names
/// 5. Scan the whole document for servings and times
/// 6. Record one status per tracked field
pub fn parse(lines: &[OcrLine], asset_id: &str) -> ParseOutput {
    DEFAULT_PARSER.parse(lines, asset_id)
}
