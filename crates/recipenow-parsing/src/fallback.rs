//! Vision-fallback payload and the merge into a deterministic parse.
//!
//! The vision extractor runs outside this crate. Its JSON output is
//! deserialized into [`VisionExtraction`] and merged only into fields the
//! deterministic parse reported as missing.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use recipenow_core::{
    ExtractionStatus, FieldStatus, Ingredient, OcrLine, ParseOutput, ServingsEstimate, Step,
    field,
};

use crate::evidence::build_span_from_evidence;
use crate::times::parse_duration_minutes;

/// Top-level vision extractor output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionExtraction {
    #[serde(default)]
    pub title: Option<VisionText>,
    #[serde(default)]
    pub ingredients: Vec<VisionText>,
    #[serde(default)]
    pub steps: Vec<VisionText>,
    #[serde(default)]
    pub servings: Option<VisionServings>,
    #[serde(default)]
    pub servings_estimate: Option<VisionServingsEstimate>,
    #[serde(default)]
    pub times: VisionTimes,
}

/// A text value with the OCR lines cited for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionText {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "de_line_ids")]
    pub evidence_ocr_line_ids: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionServings {
    #[serde(default)]
    pub value: Option<u32>,
    #[serde(default, deserialize_with = "de_line_ids")]
    pub evidence_ocr_line_ids: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// The value was inferred (e.g. from pan size) rather than read off the page.
    #[serde(default)]
    pub is_estimate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionServingsEstimate {
    #[serde(default)]
    pub value: Option<u32>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub basis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionTimes {
    #[serde(default)]
    pub prep_min: Option<VisionDuration>,
    #[serde(default)]
    pub cook_min: Option<VisionDuration>,
    #[serde(default)]
    pub total_min: Option<VisionDuration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionDuration {
    #[serde(default)]
    pub value: Option<DurationValue>,
    #[serde(default, deserialize_with = "de_line_ids")]
    pub evidence_ocr_line_ids: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Minutes as a number, or a free-form string such as "1 hour 15 min".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Minutes(u32),
    Text(String),
}

impl DurationValue {
    pub fn minutes(&self) -> Option<u32> {
        match self {
            DurationValue::Minutes(0) => None,
            DurationValue::Minutes(m) => Some(*m),
            DurationValue::Text(s) => parse_duration_minutes(s),
        }
    }
}

/// Line IDs arrive as strings or bare integers depending on the extractor.
fn de_line_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LineId {
        Str(String),
        Int(i64),
    }

    let ids: Option<Vec<LineId>> = Option::deserialize(deserializer)?;
    Ok(ids
        .unwrap_or_default()
        .into_iter()
        .map(|id| match id {
            LineId::Str(s) => s,
            LineId::Int(n) => n.to_string(),
        })
        .collect())
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Field paths (tracked or `times.*`) that received a vision value.
    pub filled: Vec<String>,
    /// Field paths whose vision value was kept without a span because no
    /// cited OCR line resolved.
    pub unprovenanced: Vec<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.filled.is_empty()
    }
}

/// Critical fields (title, ingredients, steps) that came back missing.
///
/// A non-empty result is the trigger for calling the vision extractor.
pub fn missing_critical_fields(statuses: &[FieldStatus]) -> Vec<&'static str> {
    field::CRITICAL
        .into_iter()
        .filter(|path| {
            statuses
                .iter()
                .find(|s| s.field_path == *path)
                .is_none_or(FieldStatus::is_missing)
        })
        .collect()
}

const FILLED_NOTE: &str = "filled by vision fallback";
const UNPROVENANCED_NOTE: &str = "filled by vision fallback; cited OCR lines not found";

/// Merge a vision extraction into `output`, touching only missing fields.
///
/// Each filled value gets a vision-api span built from its cited OCR lines.
/// A value whose citations all fail to resolve is still kept, with no span
/// and a status note saying so. Servings flagged as an estimate go to
/// `servings_estimate` and leave the servings status missing.
pub fn merge_vision_fallback(
    output: &mut ParseOutput,
    vision: &VisionExtraction,
    table: &HashMap<String, OcrLine>,
    asset_id: &str,
) -> MergeReport {
    let mut report = MergeReport::default();

    if output.is_missing(field::TITLE)
        && let Some(title) = vision.title.as_ref().filter(|t| !t.text.trim().is_empty())
    {
        let text = title.text.trim().to_string();
        let span = build_span_from_evidence(
            field::TITLE,
            &text,
            &title.evidence_ocr_line_ids,
            table,
            asset_id,
        );
        let provenanced = span.is_some();
        output.spans.extend(span);
        output.recipe.title = Some(text);
        mark_filled(output, &mut report, field::TITLE, provenanced);
    }

    if output.is_missing(field::INGREDIENTS) {
        let items: Vec<&VisionText> = vision
            .ingredients
            .iter()
            .filter(|i| !i.text.trim().is_empty())
            .collect();
        if !items.is_empty() {
            let mut all_provenanced = true;
            for (n, item) in items.into_iter().enumerate() {
                let path = field::ingredient(n);
                let span = build_span_from_evidence(
                    &path,
                    &item.text,
                    &item.evidence_ocr_line_ids,
                    table,
                    asset_id,
                );
                if span.is_none() {
                    all_provenanced = false;
                    report.unprovenanced.push(path);
                }
                output.spans.extend(span);
                let mut ingredient = Ingredient::new(item.text.clone());
                ingredient.optional = item.text.to_lowercase().contains("optional");
                output.recipe.ingredients.push(ingredient);
            }
            mark_filled(output, &mut report, field::INGREDIENTS, all_provenanced);
        }
    }

    if output.is_missing(field::STEPS) {
        let items: Vec<&VisionText> = vision
            .steps
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();
        if !items.is_empty() {
            let mut all_provenanced = true;
            for (n, item) in items.into_iter().enumerate() {
                let path = field::step(n);
                let text = item.text.trim().to_string();
                let span = build_span_from_evidence(
                    &path,
                    &text,
                    &item.evidence_ocr_line_ids,
                    table,
                    asset_id,
                );
                if span.is_none() {
                    all_provenanced = false;
                    report.unprovenanced.push(path);
                }
                output.spans.extend(span);
                output.recipe.steps.push(Step { text });
            }
            mark_filled(output, &mut report, field::STEPS, all_provenanced);
        }
    }

    if output.is_missing(field::SERVINGS)
        && let Some(servings) = &vision.servings
        && let Some(value) = servings.value.filter(|&v| v > 0)
    {
        if servings.is_estimate {
            if output.recipe.servings_estimate.is_none() {
                output.recipe.servings_estimate = Some(ServingsEstimate {
                    value,
                    confidence: servings.confidence.unwrap_or(0.0),
                    basis: None,
                    is_estimate: true,
                });
                if let Some(status) = output.status_mut(field::SERVINGS) {
                    status.notes = Some(format!("estimated by vision fallback: {value}"));
                }
            }
        } else {
            let span = build_span_from_evidence(
                field::SERVINGS,
                &value.to_string(),
                &servings.evidence_ocr_line_ids,
                table,
                asset_id,
            );
            let provenanced = span.is_some();
            output.spans.extend(span);
            output.recipe.servings = Some(value);
            mark_filled(output, &mut report, field::SERVINGS, provenanced);
        }
    }

    if output.recipe.servings_estimate.is_none()
        && output.recipe.servings.is_none()
        && let Some(estimate) = &vision.servings_estimate
        && let Some(value) = estimate.value.filter(|&v| v > 0)
    {
        output.recipe.servings_estimate = Some(ServingsEstimate {
            value,
            confidence: estimate.confidence.unwrap_or(0.0),
            basis: estimate.basis.clone(),
            is_estimate: true,
        });
    }

    let times = [
        (field::PREP_MIN, &vision.times.prep_min),
        (field::COOK_MIN, &vision.times.cook_min),
        (field::TOTAL_MIN, &vision.times.total_min),
    ];
    for (path, entry) in times {
        let Some(entry) = entry else { continue };
        let Some(minutes) = entry.value.as_ref().and_then(DurationValue::minutes) else {
            continue;
        };
        let slot = match path {
            field::PREP_MIN => &mut output.recipe.times.prep_min,
            field::COOK_MIN => &mut output.recipe.times.cook_min,
            _ => &mut output.recipe.times.total_min,
        };
        if slot.is_some() {
            continue;
        }
        *slot = Some(minutes);
        let span = build_span_from_evidence(
            path,
            &minutes.to_string(),
            &entry.evidence_ocr_line_ids,
            table,
            asset_id,
        );
        if span.is_none() {
            report.unprovenanced.push(path.to_string());
        }
        output.spans.extend(span);
        report.filled.push(path.to_string());
    }

    tracing::debug!(
        asset_id,
        filled = ?report.filled,
        unprovenanced = ?report.unprovenanced,
        "merged vision fallback"
    );
    report
}

fn mark_filled(output: &mut ParseOutput, report: &mut MergeReport, path: &str, provenanced: bool) {
    let note = if provenanced {
        FILLED_NOTE
    } else {
        UNPROVENANCED_NOTE
    };
    match output.status_mut(path) {
        Some(status) => {
            status.status = ExtractionStatus::Extracted;
            status.notes = Some(note.to_string());
        }
        None => output
            .field_statuses
            .push(FieldStatus::extracted(path).with_notes(note)),
    }
    report.filled.push(path.to_string());
    // Ingredients and steps record unprovenanced items per index.
    if !provenanced && (path == field::TITLE || path == field::SERVINGS) {
        report.unprovenanced.push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::line_table;
    use recipenow_core::{BBox, SourceMethod};

    fn missing_output() -> ParseOutput {
        ParseOutput {
            field_statuses: field::TRACKED
                .iter()
                .map(|p| FieldStatus::missing(*p, "not found"))
                .collect(),
            ..Default::default()
        }
    }

    fn ocr() -> Vec<OcrLine> {
        vec![
            OcrLine::new(0, "Lemon Tart", BBox::new(0.0, 0.0, 100.0, 20.0), 0.9).with_id("1"),
            OcrLine::new(0, "2 lemons", BBox::new(0.0, 30.0, 60.0, 10.0), 0.8).with_id("2"),
            OcrLine::new(0, "Zest them.", BBox::new(0.0, 50.0, 70.0, 10.0), 0.6).with_id("3"),
        ]
    }

    #[test]
    fn test_deserialize_payload() {
        let json = r#"{
            "title": {"text": "Lemon Tart", "evidence_ocr_line_ids": [1]},
            "ingredients": [{"text": "2 lemons", "evidence_ocr_line_ids": ["2"], "confidence": 0.7}],
            "steps": [{"text": "Zest them.", "evidence_ocr_line_ids": null}],
            "servings": {"value": 6, "evidence_ocr_line_ids": [], "confidence": 0.4, "is_estimate": true},
            "times": {"cook_min": {"value": "1 hour", "evidence_ocr_line_ids": []}}
        }"#;
        let v: VisionExtraction = serde_json::from_str(json).unwrap();
        assert_eq!(v.title.unwrap().evidence_ocr_line_ids, vec!["1".to_string()]);
        assert_eq!(v.ingredients[0].confidence, Some(0.7));
        assert!(v.steps[0].evidence_ocr_line_ids.is_empty());
        assert!(v.servings.unwrap().is_estimate);
        assert_eq!(
            v.times.cook_min.unwrap().value.unwrap().minutes(),
            Some(60)
        );
    }

    #[test]
    fn test_missing_critical_fields() {
        let mut statuses = missing_output().field_statuses;
        assert_eq!(missing_critical_fields(&statuses), vec!["title", "ingredients", "steps"]);
        statuses[0] = FieldStatus::extracted(field::TITLE);
        assert_eq!(missing_critical_fields(&statuses), vec!["ingredients", "steps"]);
        assert_eq!(missing_critical_fields(&[]), vec!["title", "ingredients", "steps"]);
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        let lines = ocr();
        let table = line_table(&lines);
        let vision = VisionExtraction {
            title: Some(VisionText {
                text: "Lemon Tart".into(),
                evidence_ocr_line_ids: vec!["1".into()],
                confidence: None,
            }),
            ingredients: vec![VisionText {
                text: "2 lemons".into(),
                evidence_ocr_line_ids: vec!["2".into()],
                confidence: None,
            }],
            steps: vec![VisionText {
                text: "Zest them.".into(),
                evidence_ocr_line_ids: vec!["3".into(), "2".into()],
                confidence: None,
            }],
            ..Default::default()
        };

        let mut output = missing_output();
        let report = merge_vision_fallback(&mut output, &vision, &table, "asset");

        assert_eq!(output.recipe.title.as_deref(), Some("Lemon Tart"));
        assert_eq!(output.recipe.ingredients.len(), 1);
        assert_eq!(output.recipe.steps.len(), 1);
        assert_eq!(report.filled, vec!["title", "ingredients", "steps"]);
        assert!(report.unprovenanced.is_empty());
        assert!(!output.is_missing(field::TITLE));
        assert!(output.is_missing(field::SERVINGS));

        let step_span = output.spans_for(field::STEPS).next().unwrap();
        assert_eq!(step_span.source_method, SourceMethod::VisionApi);
        assert_eq!(step_span.bbox, BBox::new(0.0, 30.0, 70.0, 30.0));
        assert!((step_span.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_merge_never_overwrites_extracted() {
        let table = line_table(&ocr());
        let mut output = missing_output();
        output.recipe.title = Some("Deterministic Title".into());
        *output.status_mut(field::TITLE).unwrap() = FieldStatus::extracted(field::TITLE);

        let vision = VisionExtraction {
            title: Some(VisionText {
                text: "Vision Title".into(),
                evidence_ocr_line_ids: vec!["1".into()],
                confidence: None,
            }),
            ..Default::default()
        };
        let report = merge_vision_fallback(&mut output, &vision, &table, "asset");
        assert!(report.is_empty());
        assert_eq!(output.recipe.title.as_deref(), Some("Deterministic Title"));
        assert!(output.spans.is_empty());
    }

    #[test]
    fn test_unresolved_evidence_keeps_value() {
        let table = line_table(&ocr());
        let vision = VisionExtraction {
            title: Some(VisionText {
                text: "Lemon Tart".into(),
                evidence_ocr_line_ids: vec!["999".into()],
                confidence: None,
            }),
            ..Default::default()
        };
        let mut output = missing_output();
        let report = merge_vision_fallback(&mut output, &vision, &table, "asset");
        assert_eq!(output.recipe.title.as_deref(), Some("Lemon Tart"));
        assert!(output.spans.is_empty());
        assert_eq!(report.unprovenanced, vec!["title"]);
        let status = output.status(field::TITLE).unwrap();
        assert_eq!(status.status, ExtractionStatus::Extracted);
        assert_eq!(status.notes.as_deref(), Some(UNPROVENANCED_NOTE));
    }

    #[test]
    fn test_estimated_servings() {
        let table = line_table(&ocr());
        let vision = VisionExtraction {
            servings: Some(VisionServings {
                value: Some(8),
                confidence: Some(0.3),
                is_estimate: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut output = missing_output();
        merge_vision_fallback(&mut output, &vision, &table, "asset");
        assert_eq!(output.recipe.servings, None);
        let estimate = output.recipe.servings_estimate.as_ref().unwrap();
        assert_eq!(estimate.value, 8);
        assert!(estimate.is_estimate);
        assert!(output.is_missing(field::SERVINGS));
    }

    #[test]
    fn test_times_fill_absent_only() {
        let table = line_table(&ocr());
        let mut output = missing_output();
        output.recipe.times.prep_min = Some(10);
        let vision = VisionExtraction {
            times: VisionTimes {
                prep_min: Some(VisionDuration {
                    value: Some(DurationValue::Minutes(99)),
                    ..Default::default()
                }),
                total_min: Some(VisionDuration {
                    value: Some(DurationValue::Text("1h 15m".into())),
                    evidence_ocr_line_ids: vec!["3".into()],
                    confidence: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = merge_vision_fallback(&mut output, &vision, &table, "asset");
        assert_eq!(output.recipe.times.prep_min, Some(10));
        assert_eq!(output.recipe.times.total_min, Some(75));
        assert_eq!(report.filled, vec!["times.total_min"]);
        assert_eq!(output.spans[0].field_path, "times.total_min");
    }
}
