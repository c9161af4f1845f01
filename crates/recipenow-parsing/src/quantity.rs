use once_cell::sync::Lazy;
use regex::Regex;

use crate::vocabulary::Vocabulary;

/// Leading numeric run: digits, vulgar fractions, spaces and `./-` punctuation.
static LEADING_QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9½⅓⅔¼¾⅕⅖⅗⅘⅙⅚⅐⅛⅜⅝⅞⅑⅒][0-9½⅓⅔¼¾⅕⅖⅗⅘⅙⅚⅐⅛⅜⅝⅞⅑⅒\s./\-]*)(.*)$")
        .unwrap()
});

/// Bullet glyph (or ASCII dash/asterisk followed by a space) at the start of a line.
pub(crate) static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[•·▪●◦‣∙○■□►▸✓✔]|[*\-–—](?:\s|$))\s*").unwrap());

const VULGAR_FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅕', "1/5"),
    ('⅖', "2/5"),
    ('⅗', "3/5"),
    ('⅘', "4/5"),
    ('⅙', "1/6"),
    ('⅚', "5/6"),
    ('⅐', "1/7"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
    ('⅑', "1/9"),
    ('⅒', "1/10"),
];

/// Result of splitting an ingredient line into quantity, unit, and name.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySplit {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    /// Ingredient name; the whole (bullet-stripped) line when no quantity parsed.
    pub remainder: String,
}

/// Strip a leading bullet glyph, returning the rest of the line.
pub fn strip_bullet(text: &str) -> &str {
    match BULLET_RE.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Whether the line opens with a numeric run followed by some text.
///
/// This is the shape test used by the line classifier; it says nothing
/// about whether the number itself parses.
pub fn has_leading_quantity(text: &str) -> bool {
    LEADING_QUANTITY_RE
        .captures(strip_bullet(text))
        .and_then(|c| c.get(2))
        .is_some_and(|rest| rest.as_str().chars().any(char::is_alphabetic))
}

/// Split an ingredient line into `(quantity, unit, remainder)`.
///
/// A unit is only reported alongside a parsed quantity, and only when the
/// word after the number is in the unit vocabulary. Anything that fails to
/// parse leaves both empty and the whole line as the remainder.
pub fn split_quantity(text: &str, vocab: &Vocabulary) -> QuantitySplit {
    let body = strip_bullet(text).trim();
    let unparsed = || QuantitySplit {
        quantity: None,
        unit: None,
        remainder: body.to_string(),
    };

    let Some(caps) = LEADING_QUANTITY_RE.captures(body) else {
        return unparsed();
    };
    let token = caps[1].trim().trim_end_matches(['-', '.']).trim();
    let rest = caps[2].trim();
    let Some(quantity) = parse_quantity(token) else {
        return unparsed();
    };

    let mut words = rest.splitn(2, char::is_whitespace);
    let first = words.next().unwrap_or("");
    if vocab.is_unit(first) {
        let unit = first
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        QuantitySplit {
            quantity: Some(quantity),
            unit: Some(unit),
            remainder: words.next().unwrap_or("").trim().to_string(),
        }
    } else {
        QuantitySplit {
            quantity: Some(quantity),
            unit: None,
            remainder: rest.to_string(),
        }
    }
}

/// Parse a quantity token.
///
/// Recognised forms, tried in order: a plain number (`2`, `1.5`), a simple
/// fraction (`1/2`), and a mixed number (`2 1/3`). Unicode vulgar fractions
/// are rewritten into those forms first (`1½` → `1 1/2`). A zero denominator
/// yields `None`.
pub fn parse_quantity(token: &str) -> Option<f64> {
    let token = expand_vulgar_fractions(token);
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(v) = token.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    if !token.contains('/') {
        return None;
    }

    let parts: Vec<&str> = token.split_whitespace().collect();
    match parts.as_slice() {
        [frac] => parse_fraction(frac),
        [whole, frac] => {
            let whole: f64 = whole.parse().ok()?;
            Some(whole + parse_fraction(frac)?)
        }
        _ => None,
    }
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (num, denom) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let denom: f64 = denom.trim().parse().ok()?;
    if denom == 0.0 {
        return None;
    }
    let v = num / denom;
    v.is_finite().then_some(v)
}

fn expand_vulgar_fractions(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 4);
    let mut prev_digit = false;
    for c in token.chars() {
        if let Some((_, ascii)) = VULGAR_FRACTIONS.iter().find(|(g, _)| *g == c) {
            if prev_digit {
                out.push(' ');
            }
            out.push_str(ascii);
            prev_digit = false;
        } else {
            out.push(c);
            prev_digit = c.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_parse_quantity_forms() {
        assert!(close(parse_quantity("2"), 2.0));
        assert!(close(parse_quantity("1.5"), 1.5));
        assert!(close(parse_quantity("1/2"), 0.5));
        assert!(close(parse_quantity("2 1/3"), 2.0 + 1.0 / 3.0));
    }

    #[test]
    fn test_parse_quantity_zero_denominator() {
        assert_eq!(parse_quantity("1/0"), None);
        assert_eq!(parse_quantity("3 1/0"), None);
    }

    #[test]
    fn test_parse_quantity_unrecognised() {
        assert_eq!(parse_quantity("2-3"), None);
        assert_eq!(parse_quantity("1 2 3/4"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_parse_quantity_vulgar() {
        assert!(close(parse_quantity("½"), 0.5));
        assert!(close(parse_quantity("1½"), 1.5));
        assert!(close(parse_quantity("2 ¾"), 2.75));
    }

    #[test]
    fn test_split_with_unit() {
        let vocab = Vocabulary::default();
        let split = split_quantity("2 cups all-purpose flour", &vocab);
        assert_eq!(split.quantity, Some(2.0));
        assert_eq!(split.unit.as_deref(), Some("cups"));
        assert_eq!(split.remainder, "all-purpose flour");
    }

    #[test]
    fn test_split_without_unit() {
        let vocab = Vocabulary::default();
        let split = split_quantity("3 large eggs", &vocab);
        assert_eq!(split.quantity, Some(3.0));
        assert_eq!(split.unit, None);
        assert_eq!(split.remainder, "large eggs");
    }

    #[test]
    fn test_split_unit_with_period() {
        let vocab = Vocabulary::default();
        let split = split_quantity("1 1/2 Tbsp. olive oil", &vocab);
        assert_eq!(split.quantity, Some(1.5));
        assert_eq!(split.unit.as_deref(), Some("tbsp"));
        assert_eq!(split.remainder, "olive oil");
    }

    #[test]
    fn test_split_glued_unit() {
        let vocab = Vocabulary::default();
        let split = split_quantity("200g butter", &vocab);
        assert_eq!(split.quantity, Some(200.0));
        assert_eq!(split.unit.as_deref(), Some("g"));
        assert_eq!(split.remainder, "butter");
    }

    #[test]
    fn test_split_zero_denominator_keeps_text() {
        let vocab = Vocabulary::default();
        let split = split_quantity("1/0 cup sugar", &vocab);
        assert_eq!(split.quantity, None);
        assert_eq!(split.unit, None);
        assert_eq!(split.remainder, "1/0 cup sugar");
    }

    #[test]
    fn test_split_no_number() {
        let vocab = Vocabulary::default();
        let split = split_quantity("salt and pepper to taste", &vocab);
        assert_eq!(split.quantity, None);
        assert_eq!(split.remainder, "salt and pepper to taste");
    }

    #[test]
    fn test_split_strips_bullet() {
        let vocab = Vocabulary::default();
        let split = split_quantity("• ½ tsp salt", &vocab);
        assert_eq!(split.quantity, Some(0.5));
        assert_eq!(split.unit.as_deref(), Some("tsp"));
        assert_eq!(split.remainder, "salt");
    }

    #[test]
    fn test_has_leading_quantity() {
        assert!(has_leading_quantity("2 cups flour"));
        assert!(has_leading_quantity("- 1 onion"));
        assert!(!has_leading_quantity("12"));
        assert!(!has_leading_quantity("flour"));
    }
}
