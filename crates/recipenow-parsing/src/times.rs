use once_cell::sync::Lazy;
use regex::Regex;

use recipenow_core::{OcrLine, Span, Times, field};

use crate::classify::LineClass;

/// A labeled duration: "Prep time: 15 minutes", "Cook 1 hr 10 mins", "Total: 1h 30m".
static LABELED_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(prep(?:aration)?|cook(?:ing)?|bak(?:e|ing)|total|ready\s+in)(\s+time)?\s*([:\-])?\s*((?:\d[\d.]*\s*[a-z]+\s*(?:and\s+)?)+)",
    )
    .unwrap()
});

/// One number followed by the word right after it.
static DURATION_PART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([a-z]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeKind {
    Prep,
    Cook,
    Total,
}

impl TimeKind {
    fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.starts_with("prep") {
            TimeKind::Prep
        } else if label.starts_with("cook") || label.starts_with("bak") {
            TimeKind::Cook
        } else {
            TimeKind::Total
        }
    }

    fn field_path(self) -> &'static str {
        match self {
            TimeKind::Prep => field::PREP_MIN,
            TimeKind::Cook => field::COOK_MIN,
            TimeKind::Total => field::TOTAL_MIN,
        }
    }

    fn slot(self, times: &mut Times) -> &mut Option<u32> {
        match self {
            TimeKind::Prep => &mut times.prep_min,
            TimeKind::Cook => &mut times.cook_min,
            TimeKind::Total => &mut times.total_min,
        }
    }

    /// Whether the bare label could also open an instruction ("Cook 10 minutes").
    fn is_verb_label(label: &str) -> bool {
        let label = label.to_lowercase();
        label == "cook" || label == "bake" || label == "prep"
    }
}

/// Convert a free-form duration ("1 hour 30 min", "1h30m", "45 mins") to minutes.
///
/// Returns `None` when nothing recognisable adds up to more than zero.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let mut total = 0.0_f64;
    for caps in DURATION_PART_RE.captures_iter(text) {
        let Ok(n) = caps[1].parse::<f64>() else {
            continue;
        };
        match caps[2].to_lowercase().as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => total += n * 60.0,
            "m" | "min" | "mins" | "minute" | "minutes" => total += n,
            _ => {}
        }
    }
    let minutes = total.round();
    (minutes > 0.0 && minutes <= u32::MAX as f64).then_some(minutes as u32)
}

/// Extract prep, cook and total times.
///
/// Every line is scanned, but a bare verb label ("Cook 20 minutes") inside
/// the method is an instruction, not a time annotation, and is ignored.
/// "Bake" counts as cook time. The first value found for each slot wins.
pub fn extract_times(
    lines: &[OcrLine],
    classes: &[LineClass],
    steps_start: Option<usize>,
    asset_id: &str,
) -> (Times, Vec<Span>) {
    let mut times = Times::default();
    let mut spans = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if classes[idx].is_blank || classes[idx].is_noise {
            continue;
        }
        let in_method = steps_start.is_some_and(|s| idx >= s);

        for caps in LABELED_TIME_RE.captures_iter(&line.text) {
            let label = &caps[1];
            let explicit = caps.get(2).is_some() || caps.get(3).is_some();
            if in_method && !explicit && TimeKind::is_verb_label(label) {
                continue;
            }

            let kind = TimeKind::from_label(label);
            let slot = kind.slot(&mut times);
            if slot.is_some() {
                continue;
            }
            let Some(minutes) = parse_duration_minutes(&caps[4]) else {
                continue;
            };
            *slot = Some(minutes);
            tracing::trace!(line = idx, path = kind.field_path(), minutes, "time matched");
            spans.push(Span::from_line(kind.field_path(), asset_id, line, caps[0].trim()));
        }
    }

    (times, spans)
}
