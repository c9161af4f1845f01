use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

/// Built-in English tables. Every entry is lower-case.
pub mod defaults {
    /// Whole-line or short-line markers opening the ingredient list.
    pub const INGREDIENT_HEADERS: &[&str] = &[
        "ingredients",
        "ingredient",
        "ingredient list",
        "what you need",
        "what you'll need",
        "you will need",
        "you'll need",
        "shopping list",
        "components",
        "supplies",
    ];

    /// Markers opening the method.
    pub const STEP_HEADERS: &[&str] = &[
        "instructions",
        "instruction",
        "directions",
        "direction",
        "method",
        "steps",
        "preparation",
        "procedure",
        "how to make",
        "how to make it",
    ];

    /// Title markers are weak: they only count as an exact whole-line match.
    pub const TITLE_HEADERS: &[&str] = &["recipe", "title", "name", "recipe name", "recipe title"];

    pub const NOISE_PHRASES: &[&str] = &[
        "nutrition facts",
        "nutrition information",
        "nutritional information",
        "nutrition per serving",
        "calories",
        "kcal",
        "total fat",
        "saturated fat",
        "trans fat",
        "cholesterol",
        "carbohydrates",
        "dietary fiber",
        "% daily value",
        "daily values",
        "share this",
        "share on",
        "pin it",
        "print recipe",
        "save recipe",
        "jump to recipe",
        "rate this recipe",
        "follow us",
        "subscribe",
        "advertisement",
        "sponsored",
        "facebook",
        "instagram",
        "pinterest",
        "twitter",
        "tiktok",
        "http://",
        "https://",
        "www.",
        ".com",
        "©",
        "copyright",
        "all rights reserved",
    ];

    pub const UNIT_WORDS: &[&str] = &[
        // volume
        "tsp", "tsps", "teaspoon", "teaspoons", "tbsp", "tbsps", "tbs", "tbl", "tablespoon",
        "tablespoons", "cup", "cups", "ml", "millilitre", "millilitres", "milliliter",
        "milliliters", "cl", "dl", "l", "litre", "litres", "liter", "liters", "pint", "pints",
        "pt", "quart", "quarts", "qt", "gallon", "gallons", "gal", "floz",
        // mass
        "g", "gr", "gram", "grams", "kg", "kilogram", "kilograms", "mg", "oz", "ounce",
        "ounces", "lb", "lbs", "pound", "pounds",
        // count
        "pinch", "pinches", "dash", "dashes", "clove", "cloves", "can", "cans", "package",
        "packages", "pkg", "packet", "packets", "jar", "jars", "bottle", "bottles", "slice",
        "slices", "stick", "sticks", "bunch", "bunches", "head", "heads", "sprig", "sprigs",
        "piece", "pieces", "handful", "handfuls", "drop", "drops", "knob", "sheet", "sheets",
    ];

    /// First words that mark an instruction line.
    pub const IMPERATIVE_VERBS: &[&str] = &[
        "add", "arrange", "bake", "baste", "beat", "blend", "boil", "braise", "bring", "broil",
        "chill", "chop", "coat", "combine", "cook", "cool", "cover", "crush", "cut", "dice",
        "discard", "divide", "drain", "drizzle", "dust", "fill", "flip", "fold", "fry",
        "garnish", "grate", "grease", "grill", "heat", "knead", "layer", "let", "line",
        "marinate", "mash", "measure", "melt", "microwave", "mince", "mix", "peel", "place",
        "pour", "preheat", "press", "puree", "purée", "reduce", "refrigerate", "remove",
        "repeat", "rest", "return", "rinse", "roast", "roll", "rub", "saute", "sauté",
        "scoop", "season", "serve", "set", "shape", "shred", "sift", "simmer", "slice",
        "soak", "spoon", "spread", "sprinkle", "squeeze", "steam", "stir", "strain", "stuff",
        "taste", "thread", "toast", "toss", "transfer", "trim", "turn", "wash", "whip",
        "whisk", "wrap",
    ];

    pub const SERVINGS_KEYWORDS: &[&str] =
        &["serve", "serving", "yield", "portion", "people", "persons"];

    pub const TIME_KEYWORDS: &[&str] = &[
        "prep",
        "preparation",
        "cook",
        "cooking",
        "bake",
        "baking",
        "total",
        "time",
        "minutes",
        "minute",
        "mins",
        "min",
        "hours",
        "hour",
        "hrs",
        "hr",
    ];
}

static DEFAULT_STEP_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:step\s*\d+\s*[:.)\-]?|\(?\d{1,2}\s*[.)](?:\s|$)|[a-z][.)]\s)").unwrap()
});

static DEFAULT_SERVINGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:serves?|servings?|yields?|portions?)\b\s*[:\-]?\s*(?:about\s+|approx\.?\s+|of\s+|up\s+to\s+)?(\d+)|(\d+)\s*(?:servings?|portions?|people|persons)\b",
    )
    .unwrap()
});

/// Resolved, immutable lookup tables shared by the classifier and every extractor.
///
/// Built once per [`ParsingConfig`]; parsing never mutates it, so one instance
/// can serve any number of concurrent parses.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub(crate) ingredient_headers: HashSet<String>,
    pub(crate) step_headers: HashSet<String>,
    pub(crate) title_headers: HashSet<String>,
    pub(crate) noise_phrases: Vec<String>,
    pub(crate) unit_words: HashSet<String>,
    pub(crate) imperative_verbs: HashSet<String>,
    pub(crate) servings_keywords: Vec<String>,
    pub(crate) time_keywords: HashSet<String>,
    pub(crate) step_prefix_re: Regex,
    pub(crate) servings_re: Regex,
    pub(crate) header_max_tokens: usize,
    pub(crate) header_max_chars: usize,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::from_config(&ParsingConfig::default())
    }
}

impl Vocabulary {
    pub fn from_config(config: &ParsingConfig) -> Self {
        let set = |list: Vec<String>| list.into_iter().collect::<HashSet<_>>();
        Self {
            ingredient_headers: set(config
                .ingredient_headers
                .resolve_words(defaults::INGREDIENT_HEADERS)),
            step_headers: set(config.step_headers.resolve_words(defaults::STEP_HEADERS)),
            title_headers: set(config.title_headers.resolve_words(defaults::TITLE_HEADERS)),
            noise_phrases: config.noise_phrases.resolve_words(defaults::NOISE_PHRASES),
            unit_words: set(config.unit_words.resolve_words(defaults::UNIT_WORDS)),
            imperative_verbs: set(config
                .imperative_verbs
                .resolve_words(defaults::IMPERATIVE_VERBS)),
            servings_keywords: config
                .servings_keywords
                .resolve_words(defaults::SERVINGS_KEYWORDS),
            time_keywords: set(config.time_keywords.resolve_words(defaults::TIME_KEYWORDS)),
            step_prefix_re: config
                .step_prefix_re
                .clone()
                .unwrap_or_else(|| DEFAULT_STEP_PREFIX_RE.clone()),
            servings_re: config
                .servings_re
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVINGS_RE.clone()),
            header_max_tokens: config.header_max_tokens,
            header_max_chars: config.header_max_chars,
        }
    }

    /// Whether `word` (any case, surrounding punctuation ignored) is a unit.
    pub fn is_unit(&self, word: &str) -> bool {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        !w.is_empty() && self.unit_words.contains(&w)
    }

    pub fn is_imperative_verb(&self, word: &str) -> bool {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        self.imperative_verbs.contains(&w)
    }

    pub fn is_time_keyword(&self, word: &str) -> bool {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        self.time_keywords.contains(&w)
    }
}
