use once_cell::sync::Lazy;
use regex::Regex;

use crate::quantity::{BULLET_RE, has_leading_quantity, strip_bullet};
use crate::times::parse_duration_minutes;
use crate::vocabulary::Vocabulary;

/// "For the sauce:" style sub-headings inside an ingredient list.
static SUBHEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*for\s+(?:the\s+)?[\w\s'&,\-]+:?\s*$").unwrap());

/// Which section a header line opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Title,
    Ingredients,
    Steps,
}

/// Why a line was judged to start a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepMarker {
    /// `1.`, `2)`, `Step 3:`, `b.`
    Numbered,
    /// First word is an imperative cooking verb.
    Verb,
    /// Bullet glyph in front of text that does not look like an ingredient.
    Bullet,
}

/// Classification flags for one OCR line.
///
/// The flags are independent except that a header line carries no other
/// flag, and a step-start line is never ingredient-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineClass {
    pub header: Option<HeaderKind>,
    pub is_blank: bool,
    pub is_noise: bool,
    pub step_marker: Option<StepMarker>,
    pub is_ingredient_like: bool,
    /// Contains a time keyword and a duration ("Prep time: 10 min").
    pub is_time_annotation: bool,
    /// Matches the servings pattern ("Serves 4").
    pub is_servings: bool,
}

impl LineClass {
    pub fn is_header(&self) -> bool {
        self.header.is_some()
    }

    pub fn is_step_start(&self) -> bool {
        self.step_marker.is_some()
    }
}

/// Classify a single line of text.
pub fn classify(text: &str, vocab: &Vocabulary) -> LineClass {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return LineClass {
            is_blank: true,
            ..Default::default()
        };
    }

    if let Some(kind) = header_kind(trimmed, vocab) {
        return LineClass {
            header: Some(kind),
            ..Default::default()
        };
    }

    let lower = trimmed.to_lowercase();
    let is_noise = is_noise(&lower, vocab);
    let step_marker = step_marker(trimmed, vocab);
    let bulleted = BULLET_RE.is_match(trimmed);
    let is_ingredient_like =
        step_marker.is_none() && (bulleted || has_ingredient_shape(trimmed, vocab));

    LineClass {
        header: None,
        is_blank: false,
        is_noise,
        step_marker,
        is_ingredient_like,
        is_time_annotation: is_time_annotation(trimmed, vocab),
        is_servings: vocab.servings_re.is_match(trimmed),
    }
}

/// Decide whether a line is a section header, and which one.
///
/// The line is lower-cased and its trailing colon dropped. An exact match
/// against any keyword list is a header regardless of length. Otherwise
/// ingredient and step keywords count only on short lines (token and
/// character budgets) that carry no digits or time words; title keywords
/// never count this way.
pub fn header_kind(text: &str, vocab: &Vocabulary) -> Option<HeaderKind> {
    let norm = text
        .trim()
        .to_lowercase()
        .trim_end_matches(':')
        .trim()
        .to_string();
    if norm.is_empty() {
        return None;
    }

    if vocab.ingredient_headers.contains(&norm) {
        return Some(HeaderKind::Ingredients);
    }
    if vocab.step_headers.contains(&norm) {
        return Some(HeaderKind::Steps);
    }
    if vocab.title_headers.contains(&norm) {
        return Some(HeaderKind::Title);
    }

    let tokens: Vec<&str> = norm
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty()
        || tokens.len() > vocab.header_max_tokens
        || norm.chars().count() > vocab.header_max_chars
        || norm.chars().any(|c| c.is_ascii_digit())
        || tokens.iter().any(|t| *t == "time" || *t == "times")
    {
        return None;
    }

    let mentions = |keywords: &std::collections::HashSet<String>| {
        keywords.iter().any(|k| {
            if k.contains(' ') {
                norm.contains(k.as_str())
            } else {
                tokens.iter().any(|t| t == k)
            }
        })
    };

    if mentions(&vocab.ingredient_headers) {
        Some(HeaderKind::Ingredients)
    } else if mentions(&vocab.step_headers) {
        Some(HeaderKind::Steps)
    } else {
        None
    }
}

/// Substring match against the noise phrase list. `lower` must be lower-cased.
fn is_noise(lower: &str, vocab: &Vocabulary) -> bool {
    vocab.noise_phrases.iter().any(|p| lower.contains(p.as_str()))
}

fn step_marker(text: &str, vocab: &Vocabulary) -> Option<StepMarker> {
    let body = strip_bullet(text);
    if vocab.step_prefix_re.is_match(text) || vocab.step_prefix_re.is_match(body) {
        return Some(StepMarker::Numbered);
    }
    let first = body.split_whitespace().next().unwrap_or("");
    if vocab.is_imperative_verb(first) {
        return Some(StepMarker::Verb);
    }
    if BULLET_RE.is_match(text) && !has_ingredient_shape(text, vocab) {
        return Some(StepMarker::Bullet);
    }
    None
}

/// Leading quantity, or a unit word anywhere in the line (`200g` counts as `g`).
fn has_ingredient_shape(text: &str, vocab: &Vocabulary) -> bool {
    has_leading_quantity(text) || text.split_whitespace().any(|w| is_unit_token(w, vocab))
}

fn is_unit_token(word: &str, vocab: &Vocabulary) -> bool {
    let w = word.trim_matches(|c: char| !c.is_alphanumeric());
    let w = w.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '/');
    vocab.is_unit(w)
}

/// A line carrying a duration and a time keyword, e.g. a misplaced "Cook time: 20 min".
///
/// The duration must be a number followed by an hour or minute unit, so
/// "1 tsp baking soda" is not a time line even though "baking" is a keyword.
pub fn is_time_annotation(text: &str, vocab: &Vocabulary) -> bool {
    parse_duration_minutes(text).is_some()
        && text.split_whitespace().any(|w| {
            let w = w.trim_matches(|c: char| !c.is_alphanumeric());
            let w = w.trim_start_matches(|c: char| c.is_ascii_digit());
            vocab.is_time_keyword(w)
        })
}

/// "For the X:" sub-heading, or any line ending in a colon.
pub fn is_subheading(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.ends_with(':') || SUBHEADING_RE.is_match(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(text: &str) -> LineClass {
        classify(text, &Vocabulary::default())
    }

    #[test]
    fn test_exact_headers() {
        let vocab = Vocabulary::default();
        assert_eq!(header_kind("Ingredients", &vocab), Some(HeaderKind::Ingredients));
        assert_eq!(header_kind("INSTRUCTIONS:", &vocab), Some(HeaderKind::Steps));
        assert_eq!(header_kind("Method", &vocab), Some(HeaderKind::Steps));
        assert_eq!(header_kind("Recipe", &vocab), Some(HeaderKind::Title));
        assert_eq!(header_kind("You will need:", &vocab), Some(HeaderKind::Ingredients));
    }

    #[test]
    fn test_short_headers_within_budget() {
        let vocab = Vocabulary::default();
        assert_eq!(header_kind("Cake Ingredients", &vocab), Some(HeaderKind::Ingredients));
        assert_eq!(header_kind("Cooking Directions:", &vocab), Some(HeaderKind::Steps));
    }

    #[test]
    fn test_long_lines_are_not_headers() {
        let vocab = Vocabulary::default();
        assert_eq!(
            header_kind("Combine the dry ingredients in a large bowl", &vocab),
            None
        );
        assert_eq!(header_kind("Preparation time", &vocab), None);
        assert_eq!(header_kind("Method 2", &vocab), None);
    }

    #[test]
    fn test_title_keywords_need_exact_match() {
        let vocab = Vocabulary::default();
        assert_eq!(header_kind("Chocolate Cake Recipe", &vocab), None);
    }

    #[test]
    fn test_header_excludes_other_flags() {
        let c = class("Ingredients");
        assert!(c.is_header());
        assert!(!c.is_ingredient_like);
        assert!(!c.is_step_start());
        assert!(!c.is_noise);
    }

    #[test]
    fn test_noise() {
        assert!(class("Nutrition Facts").is_noise);
        assert!(class("Calories: 250").is_noise);
        assert!(class("https://example.com/recipe").is_noise);
        assert!(class("© 2024 Some Magazine").is_noise);
        assert!(!class("2 cups flour").is_noise);
    }

    #[test]
    fn test_step_starts() {
        assert_eq!(class("1. Mix everything").step_marker, Some(StepMarker::Numbered));
        assert_eq!(class("Step 2: Bake").step_marker, Some(StepMarker::Numbered));
        assert_eq!(class("Stir in the cheese.").step_marker, Some(StepMarker::Verb));
        assert_eq!(class("• Preheat the oven").step_marker, Some(StepMarker::Verb));
        assert_eq!(class("• Keep warm until needed").step_marker, Some(StepMarker::Bullet));
        assert_eq!(class("and add pasta.").step_marker, None);
    }

    #[test]
    fn test_ingredient_like() {
        assert!(class("2 cups flour").is_ingredient_like);
        assert!(class("• 1 onion, diced").is_ingredient_like);
        assert!(class("Butter, 200g").is_ingredient_like);
        assert!(class("Olive oil, 2 tbsp").is_ingredient_like);
        assert!(!class("salt and pepper to taste").is_ingredient_like);
        assert!(!class("Grandma's Apple Pie").is_ingredient_like);
    }

    #[test]
    fn test_step_start_is_never_ingredient_like() {
        let c = class("1. Add 2 cups flour");
        assert!(c.is_step_start());
        assert!(!c.is_ingredient_like);
        let c = class("Add 2 cups flour");
        assert!(c.is_step_start());
        assert!(!c.is_ingredient_like);
    }

    #[test]
    fn test_time_annotation() {
        let vocab = Vocabulary::default();
        assert!(is_time_annotation("Prep time: 15 minutes", &vocab));
        assert!(is_time_annotation("Cook 20min", &vocab));
        assert!(!is_time_annotation("Prep ahead", &vocab));
        assert!(!is_time_annotation("2 cups flour", &vocab));
        assert!(is_time_annotation("Baking time: 1 hr", &vocab));
    }

    #[test]
    fn test_baking_ingredients_are_not_time_lines() {
        let vocab = Vocabulary::default();
        assert!(!is_time_annotation("1 tsp baking soda", &vocab));
        assert!(!is_time_annotation("2 tsp baking powder", &vocab));
        assert!(!is_time_annotation("1 cup cooking oil", &vocab));
        let c = class("1 tsp baking soda");
        assert!(c.is_ingredient_like);
        assert!(!c.is_time_annotation);
    }

    #[test]
    fn test_servings_flag() {
        assert!(class("Serves 4 people").is_servings);
        assert!(!class("2 cups flour").is_servings);
    }

    #[test]
    fn test_subheadings() {
        assert!(is_subheading("For the sauce:"));
        assert!(is_subheading("For the topping"));
        assert!(is_subheading("Dough:"));
        assert!(!is_subheading("2 cups flour"));
        assert!(!is_subheading("fresh basil, for serving"));
    }

    #[test]
    fn test_blank() {
        let c = class("   ");
        assert!(c.is_blank);
        assert!(!c.is_header());
    }
}
