use std::collections::HashMap;

use recipenow_core::{BBox, Evidence, OcrLine, SourceMethod, Span};

/// ID → line lookup for the evidence builder. Lines without an `id` are left out;
/// on duplicate IDs the first line wins.
pub fn line_table(lines: &[OcrLine]) -> HashMap<String, OcrLine> {
    let mut table = HashMap::with_capacity(lines.len());
    for line in lines {
        if let Some(id) = &line.id {
            table.entry(id.clone()).or_insert_with(|| line.clone());
        }
    }
    table
}

/// Build a vision-api span from the OCR lines cited as evidence.
///
/// The bbox is the union of the resolved lines' boxes, confidence their mean,
/// and page the first resolved line's page. IDs missing from `table` are
/// dropped; if none resolve there is no span.
pub fn build_span_from_evidence(
    field_path: &str,
    extracted_text: &str,
    evidence_ids: &[String],
    table: &HashMap<String, OcrLine>,
    asset_id: &str,
) -> Option<Span> {
    let (resolved, dropped): (Vec<&String>, Vec<&String>) =
        evidence_ids.iter().partition(|id| table.contains_key(id.as_str()));
    if !dropped.is_empty() {
        tracing::warn!(field_path, ?dropped, "evidence cites unknown OCR lines");
    }

    let lines: Vec<&OcrLine> = resolved.iter().map(|id| &table[id.as_str()]).collect();
    let first = lines.first()?;
    let bbox = BBox::union(lines.iter().map(|l| &l.bbox))?;
    let confidence = lines.iter().map(|l| l.confidence).sum::<f64>() / lines.len() as f64;

    Some(Span {
        field_path: field_path.to_string(),
        asset_id: asset_id.to_string(),
        page: first.page,
        bbox,
        confidence,
        extracted_text: extracted_text.to_string(),
        source_method: SourceMethod::VisionApi,
        evidence: Some(Evidence {
            ocr_line_ids: resolved.into_iter().cloned().collect(),
        }),
    })
}
