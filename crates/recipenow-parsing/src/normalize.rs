//! Ingredient name normalization.
//!
//! A separate stage after extraction: it reads `original_text` and fills in
//! `name_norm`, never the other way round.

use once_cell::sync::Lazy;
use regex::Regex;

use recipenow_core::Ingredient;

use crate::quantity::split_quantity;
use crate::vocabulary::Vocabulary;

static PARENTHETICAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)?").unwrap());

static DESCRIPTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:optional|to taste|if desired|as needed)\b").unwrap());

/// Preparation and size words dropped from the front of a name.
const QUALIFIERS: &[&str] = &[
    "fresh", "freshly", "dried", "ground", "powdered", "minced", "chopped", "diced", "sliced",
    "grated", "shredded", "melted", "softened", "cooked", "raw", "roasted", "ripe", "large",
    "medium", "small", "finely", "roughly", "thinly",
];

/// Reduce an ingredient line to a lower-cased name.
///
/// Drops the quantity and unit, parentheticals, anything after the first
/// comma, "optional"/"to taste" style descriptors, and leading articles,
/// unit words and qualifiers. The last word is singularized. Returns `None`
/// when nothing is left ("3 large eggs" gives "egg").
pub fn normalize_name(text: &str, vocab: &Vocabulary) -> Option<String> {
    let split = split_quantity(text, vocab);
    let lower = split.remainder.to_lowercase();
    let unbracketed = PARENTHETICAL_RE.replace_all(&lower, " ");
    let head = unbracketed.split(',').next().unwrap_or("");
    let head = DESCRIPTOR_RE.replace_all(head, " ");

    let mut words: Vec<&str> = head
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();

    while words.len() > 1 {
        let first = words[0];
        if matches!(first, "a" | "an" | "of") || vocab.is_unit(first) || QUALIFIERS.contains(&first)
        {
            words.remove(0);
        } else {
            break;
        }
    }

    let last = words.pop()?;
    let mut name = words.join(" ");
    if !name.is_empty() {
        name.push(' ');
    }
    name.push_str(&singularize(last));
    Some(name)
}

fn singularize(word: &str) -> String {
    if word.chars().count() <= 3
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
        || !word.ends_with('s')
    {
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}o");
    }
    word[..word.len() - 1].to_string()
}

/// Fill `name_norm` on every ingredient that does not have one yet.
pub fn normalize_ingredients(ingredients: &mut [Ingredient], vocab: &Vocabulary) {
    for ingredient in ingredients.iter_mut().filter(|i| i.name_norm.is_none()) {
        if let Some(name) = normalize_name(ingredient.original_text(), vocab) {
            ingredient.set_name_norm(name);
        }
    }
}
