use std::io::Write;

use owo_colors::OwoColorize;
use recipenow_core::OcrLine;
use recipenow_parsing::{HeaderKind, LineClass, Sections};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn label(class: &LineClass) -> &'static str {
    match class.header {
        Some(HeaderKind::Title) => "TITLE-HDR",
        Some(HeaderKind::Ingredients) => "INGR-HDR",
        Some(HeaderKind::Steps) => "STEP-HDR",
        None if class.is_blank => "blank",
        None if class.is_noise => "noise",
        None if class.is_step_start() => "step",
        None if class.is_ingredient_like => "ingr",
        None if class.is_servings => "serves",
        None if class.is_time_annotation => "time",
        None => "-",
    }
}

/// Print one row per line with its classification and section membership.
pub fn print_classification(
    w: &mut dyn Write,
    lines: &[OcrLine],
    classes: &[LineClass],
    sections: &Sections,
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, (line, class)) in lines.iter().zip(classes).enumerate() {
        let section = if sections.ingredients.as_ref().is_some_and(|r| r.contains(&i)) {
            'I'
        } else if sections.steps_start.is_some_and(|s| i >= s) {
            'S'
        } else {
            ' '
        };
        let mut tag = format!("{:<9}", label(class));
        if color.enabled() {
            tag = if class.is_header() {
                tag.bold().cyan().to_string()
            } else if class.is_noise {
                tag.dimmed().to_string()
            } else if class.is_step_start() {
                tag.yellow().to_string()
            } else if class.is_ingredient_like {
                tag.green().to_string()
            } else {
                tag
            };
        }
        writeln!(w, "{:>4} {} {} {}", i, section, tag, line.text)?;
    }
    Ok(())
}
