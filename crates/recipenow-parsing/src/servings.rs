use recipenow_core::{OcrLine, Span, field};

use crate::vocabulary::Vocabulary;

/// Find the servings count anywhere in the document.
///
/// Only lines mentioning a servings keyword are tried against the servings
/// pattern. The first line yielding a positive integer wins.
pub fn extract_servings(
    lines: &[OcrLine],
    vocab: &Vocabulary,
    asset_id: &str,
) -> Option<(u32, Span)> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let lower = line.text.to_lowercase();
        if !vocab
            .servings_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()))
        {
            return None;
        }
        let value = servings_value(&line.text, vocab)?;
        tracing::trace!(line = idx, value, "servings matched");
        let span = Span::from_line(field::SERVINGS, asset_id, line, line.text.trim());
        Some((value, span))
    })
}

/// Integer from the first participating capture group of the servings pattern.
pub fn servings_value(text: &str, vocab: &Vocabulary) -> Option<u32> {
    let caps = vocab.servings_re.captures(text)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|&n| n > 0)
}
