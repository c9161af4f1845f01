use recipenow_core::{OcrLine, Span, Step, field};

use crate::classify::LineClass;

/// Extract method steps starting at `start`.
///
/// A step-start line opens a new step with its own span. Any other line is a
/// continuation of the previous step: its text is appended to the step and
/// to the span's `extracted_text`, but the span keeps the first line's bbox.
/// A header ends the method once a step has been seen.
pub fn extract_steps(
    lines: &[OcrLine],
    classes: &[LineClass],
    start: Option<usize>,
    asset_id: &str,
) -> (Vec<Step>, Vec<Span>) {
    let mut steps: Vec<Step> = Vec::new();
    let mut spans: Vec<Span> = Vec::new();

    let Some(start) = start else {
        return (steps, spans);
    };

    for idx in start..lines.len() {
        let (line, class) = (&lines[idx], &classes[idx]);
        if class.is_blank {
            continue;
        }
        if class.is_header() {
            if steps.is_empty() {
                continue;
            }
            break;
        }
        if class.is_noise {
            continue;
        }

        let text = line.text.trim();
        match (steps.last_mut(), spans.last_mut()) {
            (Some(step), Some(span)) if !class.is_step_start() => {
                step.text.push(' ');
                step.text.push_str(text);
                span.extracted_text.push(' ');
                span.extracted_text.push_str(text);
            }
            _ => {
                spans.push(Span::from_line(field::step(steps.len()), asset_id, line, text));
                steps.push(Step {
                    text: text.to_string(),
                });
            }
        }
    }

    (steps, spans)
}
