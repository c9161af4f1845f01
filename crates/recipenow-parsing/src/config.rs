use regex::Regex;

use crate::ParsingError;
use crate::vocabulary::defaults;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    /// Append one value, keeping an earlier `Replace` intact.
    fn push(&mut self, value: T) {
        match self {
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

impl ListOverride<String> {
    /// Resolve against a static default table, lower-casing every entry.
    pub(crate) fn resolve_words(&self, defaults: &[&str]) -> Vec<String> {
        let owned: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
        self.resolve(&owned)
            .into_iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Configuration for the recipe parsing pipeline.
///
/// Vocabulary lists default to the built-in English tables; regex fields are
/// `Option<Regex>` where `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── classify.rs ──
    pub(crate) ingredient_headers: ListOverride<String>,
    pub(crate) step_headers: ListOverride<String>,
    pub(crate) title_headers: ListOverride<String>,
    pub(crate) noise_phrases: ListOverride<String>,
    pub(crate) unit_words: ListOverride<String>,
    pub(crate) imperative_verbs: ListOverride<String>,
    pub(crate) time_keywords: ListOverride<String>,
    /// Regex recognising a numbered/lettered step prefix (`1.`, `Step 2:`, `b)`).
    pub(crate) step_prefix_re: Option<Regex>,
    /// A line with more tokens than this is never a header unless it is an exact keyword.
    pub(crate) header_max_tokens: usize,
    /// A line longer than this is never a header unless it is an exact keyword.
    pub(crate) header_max_chars: usize,

    // ── servings.rs ──
    pub(crate) servings_keywords: ListOverride<String>,
    /// Regex capturing the servings integer; the first participating group is used.
    pub(crate) servings_re: Option<Regex>,

    // ── section.rs ──
    /// Consecutive blank/noise lines tolerated inside a header-less ingredient block.
    pub(crate) ingredient_gap_tolerance: usize,

    // ── title.rs ──
    pub(crate) title_scan_lines: usize,
    pub(crate) title_rescan_lines: usize,
    pub(crate) title_max_chars: usize,
    pub(crate) title_rescan_max_words: usize,
    pub(crate) title_rescan_max_chars: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            ingredient_headers: ListOverride::Default,
            step_headers: ListOverride::Default,
            title_headers: ListOverride::Default,
            noise_phrases: ListOverride::Default,
            unit_words: ListOverride::Default,
            imperative_verbs: ListOverride::Default,
            time_keywords: ListOverride::Default,
            step_prefix_re: None,
            header_max_tokens: 3,
            header_max_chars: 50,
            servings_keywords: ListOverride::Default,
            servings_re: None,
            ingredient_gap_tolerance: 2,
            title_scan_lines: 5,
            title_rescan_lines: 8,
            title_max_chars: 120,
            title_rescan_max_words: 8,
            title_rescan_max_chars: 80,
        }
    }
}

impl ParsingConfig {
    pub fn ingredient_gap_tolerance(&self) -> usize {
        self.ingredient_gap_tolerance
    }

    pub fn header_max_tokens(&self) -> usize {
        self.header_max_tokens
    }

    pub fn title_scan_lines(&self) -> usize {
        self.title_scan_lines
    }

    pub fn title_max_chars(&self) -> usize {
        self.title_max_chars
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with [`ParsingError`] if any pattern is invalid or a setting is out of range.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    ingredient_headers: ListOverride<String>,
    step_headers: ListOverride<String>,
    title_headers: ListOverride<String>,
    noise_phrases: ListOverride<String>,
    unit_words: ListOverride<String>,
    imperative_verbs: ListOverride<String>,
    time_keywords: ListOverride<String>,
    servings_keywords: ListOverride<String>,
    step_prefix_re: Option<String>,
    servings_re: Option<String>,
    header_max_tokens: Option<usize>,
    header_max_chars: Option<usize>,
    ingredient_gap_tolerance: Option<usize>,
    title_scan_lines: Option<usize>,
    title_rescan_lines: Option<usize>,
    title_max_chars: Option<usize>,
    title_rescan_max_words: Option<usize>,
    title_rescan_max_chars: Option<usize>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Section header keywords ──

    pub fn set_ingredient_headers(mut self, words: Vec<String>) -> Self {
        self.ingredient_headers = ListOverride::Replace(words);
        self
    }

    pub fn add_ingredient_header(mut self, word: String) -> Self {
        self.ingredient_headers.push(word);
        self
    }

    pub fn set_step_headers(mut self, words: Vec<String>) -> Self {
        self.step_headers = ListOverride::Replace(words);
        self
    }

    pub fn add_step_header(mut self, word: String) -> Self {
        self.step_headers.push(word);
        self
    }

    pub fn set_title_headers(mut self, words: Vec<String>) -> Self {
        self.title_headers = ListOverride::Replace(words);
        self
    }

    pub fn add_title_header(mut self, word: String) -> Self {
        self.title_headers.push(word);
        self
    }

    // ── Noise phrases ──

    pub fn set_noise_phrases(mut self, phrases: Vec<String>) -> Self {
        self.noise_phrases = ListOverride::Replace(phrases);
        self
    }

    pub fn add_noise_phrase(mut self, phrase: String) -> Self {
        self.noise_phrases.push(phrase);
        self
    }

    // ── Units and verbs ──

    pub fn set_unit_words(mut self, words: Vec<String>) -> Self {
        self.unit_words = ListOverride::Replace(words);
        self
    }

    pub fn add_unit_word(mut self, word: String) -> Self {
        self.unit_words.push(word);
        self
    }

    pub fn set_imperative_verbs(mut self, words: Vec<String>) -> Self {
        self.imperative_verbs = ListOverride::Replace(words);
        self
    }

    pub fn add_imperative_verb(mut self, word: String) -> Self {
        self.imperative_verbs.push(word);
        self
    }

    // ── Servings / time keywords ──

    pub fn set_servings_keywords(mut self, words: Vec<String>) -> Self {
        self.servings_keywords = ListOverride::Replace(words);
        self
    }

    pub fn add_servings_keyword(mut self, word: String) -> Self {
        self.servings_keywords.push(word);
        self
    }

    pub fn set_time_keywords(mut self, words: Vec<String>) -> Self {
        self.time_keywords = ListOverride::Replace(words);
        self
    }

    pub fn add_time_keyword(mut self, word: String) -> Self {
        self.time_keywords.push(word);
        self
    }

    // ── Regex overrides ──

    pub fn step_prefix_regex(mut self, pattern: &str) -> Self {
        self.step_prefix_re = Some(pattern.to_string());
        self
    }

    pub fn servings_regex(mut self, pattern: &str) -> Self {
        self.servings_re = Some(pattern.to_string());
        self
    }

    // ── Scalars ──

    pub fn header_max_tokens(mut self, n: usize) -> Self {
        self.header_max_tokens = Some(n);
        self
    }

    pub fn header_max_chars(mut self, n: usize) -> Self {
        self.header_max_chars = Some(n);
        self
    }

    pub fn ingredient_gap_tolerance(mut self, n: usize) -> Self {
        self.ingredient_gap_tolerance = Some(n);
        self
    }

    pub fn title_scan_lines(mut self, n: usize) -> Self {
        self.title_scan_lines = Some(n);
        self
    }

    pub fn title_rescan_lines(mut self, n: usize) -> Self {
        self.title_rescan_lines = Some(n);
        self
    }

    /// A first candidate longer than this is treated as a descriptive sentence.
    pub fn title_max_chars(mut self, n: usize) -> Self {
        self.title_max_chars = Some(n);
        self
    }

    pub fn title_rescan_max_words(mut self, n: usize) -> Self {
        self.title_rescan_max_words = Some(n);
        self
    }

    pub fn title_rescan_max_chars(mut self, n: usize) -> Self {
        self.title_rescan_max_chars = Some(n);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, ParsingError> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let defaults = ParsingConfig::default();
        let header_max_tokens = self.header_max_tokens.unwrap_or(defaults.header_max_tokens);
        let header_max_chars = self.header_max_chars.unwrap_or(defaults.header_max_chars);
        if header_max_tokens == 0 || header_max_chars == 0 {
            return Err(ParsingError::InvalidConfig(
                "header token and character budgets must be at least 1".into(),
            ));
        }
        if self.unit_words.resolve_words(defaults::UNIT_WORDS).is_empty() {
            return Err(ParsingError::InvalidConfig(
                "unit vocabulary must not be empty".into(),
            ));
        }

        Ok(ParsingConfig {
            ingredient_headers: self.ingredient_headers,
            step_headers: self.step_headers,
            title_headers: self.title_headers,
            noise_phrases: self.noise_phrases,
            unit_words: self.unit_words,
            imperative_verbs: self.imperative_verbs,
            time_keywords: self.time_keywords,
            step_prefix_re: compile(self.step_prefix_re)?,
            header_max_tokens,
            header_max_chars,
            servings_keywords: self.servings_keywords,
            servings_re: compile(self.servings_re)?,
            ingredient_gap_tolerance: self
                .ingredient_gap_tolerance
                .unwrap_or(defaults.ingredient_gap_tolerance),
            title_scan_lines: self.title_scan_lines.unwrap_or(defaults.title_scan_lines),
            title_rescan_lines: self
                .title_rescan_lines
                .unwrap_or(defaults.title_rescan_lines),
            title_max_chars: self.title_max_chars.unwrap_or(defaults.title_max_chars),
            title_rescan_max_words: self
                .title_rescan_max_words
                .unwrap_or(defaults.title_rescan_max_words),
            title_rescan_max_chars: self
                .title_rescan_max_chars
                .unwrap_or(defaults.title_rescan_max_chars),
        })
    }
}
