use recipenow_core::{OcrLine, Span, field};

use crate::classify::LineClass;
use crate::config::ParsingConfig;
use crate::section::Sections;

/// Extract the recipe title.
///
/// Prefers the line right after an explicit title header. Otherwise takes the
/// first line in the scan window with more than three characters and at
/// least two words. A candidate that reads like a descriptive sentence is
/// replaced by the first short line in the wider rescan window; if none
/// qualifies the title is missing.
pub fn extract_title(
    lines: &[OcrLine],
    classes: &[LineClass],
    sections: &Sections,
    config: &ParsingConfig,
    asset_id: &str,
) -> Option<(String, Span)> {
    let candidate = after_title_header(classes, sections).or_else(|| {
        (0..lines.len().min(config.title_scan_lines)).find(|&i| {
            let text = lines[i].text.trim();
            is_eligible(i, classes, sections)
                && text.chars().count() > 3
                && text.split_whitespace().count() >= 2
        })
    })?;

    let index = if is_descriptive(lines[candidate].text.trim(), config) {
        tracing::debug!(line = candidate, "title candidate reads like a sentence, rescanning");
        (0..lines.len().min(config.title_rescan_lines)).find(|&i| {
            let text = lines[i].text.trim();
            is_eligible(i, classes, sections)
                && text.chars().count() > 3
                && text.split_whitespace().count() <= config.title_rescan_max_words
                && text.chars().count() <= config.title_rescan_max_chars
        })?
    } else {
        candidate
    };

    let line = &lines[index];
    let title = line.text.trim().to_string();
    let span = Span::from_line(field::TITLE, asset_id, line, title.clone());
    Some((title, span))
}

fn after_title_header(classes: &[LineClass], sections: &Sections) -> Option<usize> {
    let header = *sections.title_headers.first()?;
    let next = header + 1;
    let class = classes.get(next)?;
    (!class.is_blank && !class.is_noise && !class.is_header()).then_some(next)
}

/// Lines that could plausibly be a title: not blank, noise, a header, part of
/// the ingredient or step sections, or a servings/time annotation.
///
/// Unit words and cooking verbs are not disqualifying on their own outside
/// the sections: "Pound Cake" and "Roast Chicken" are titles.
fn is_eligible(index: usize, classes: &[LineClass], sections: &Sections) -> bool {
    let c = &classes[index];
    !c.is_blank
        && !c.is_noise
        && !c.is_header()
        && !c.is_servings
        && !c.is_time_annotation
        && !sections.is_body_line(index)
}

fn is_descriptive(text: &str, config: &ParsingConfig) -> bool {
    text.chars().count() > config.title_max_chars
        || (text.contains(". ") && text.split_whitespace().count() > 8)
}
