use serde::{Deserialize, Serialize};

pub mod config_file;

pub use config_file::{ConfigFile, ConfigFileError};

/// Axis-aligned bounding box in source-image pixel space.
///
/// Serialized as the `[x, y, w, h]` array the OCR collaborator emits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Smallest box covering every box in `boxes`, or `None` when empty.
    pub fn union<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        let (mut x0, mut y0) = (first.x, first.y);
        let (mut x1, mut y1) = (first.right(), first.bottom());
        for b in iter {
            x0 = x0.min(b.x);
            y0 = y0.min(b.y);
            x1 = x1.max(b.right());
            y1 = y1.max(b.bottom());
        }
        Some(BBox::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &BBox) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.w, b.h]
    }
}

/// One line of text returned by the OCR collaborator.
///
/// The slice of lines handed to the parser is assumed to be in reading
/// order; the parser never re-sorts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    /// Identifier assigned by the OCR store; cited by vision-fallback evidence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub page: u32,
    pub text: String,
    pub bbox: BBox,
    pub confidence: f64,
}

impl OcrLine {
    pub fn new(page: u32, text: impl Into<String>, bbox: BBox, confidence: f64) -> Self {
        Self {
            id: None,
            page,
            text: text.into(),
            bbox,
            confidence,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// How a span's value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceMethod {
    #[serde(rename = "ocr")]
    Ocr,
    #[serde(rename = "vision-api")]
    VisionApi,
    #[serde(rename = "user")]
    User,
}

/// OCR line identifiers cited as support for a value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evidence {
    pub ocr_line_ids: Vec<String>,
}

/// Provenance record tying one extracted value to its source image region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub field_path: String,
    pub asset_id: String,
    pub page: u32,
    pub bbox: BBox,
    pub confidence: f64,
    pub extracted_text: String,
    pub source_method: SourceMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl Span {
    /// Span for a value read directly off a single OCR line.
    pub fn from_line(
        field_path: impl Into<String>,
        asset_id: &str,
        line: &OcrLine,
        extracted_text: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            asset_id: asset_id.to_string(),
            page: line.page,
            bbox: line.bbox,
            confidence: line.confidence,
            extracted_text: extracted_text.into(),
            source_method: SourceMethod::Ocr,
            evidence: line.id.as_ref().map(|id| Evidence {
                ocr_line_ids: vec![id.clone()],
            }),
        }
    }
}

/// Section-level outcome of extracting one tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Missing,
    Extracted,
    UserEntered,
    Verified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStatus {
    pub field_path: String,
    pub status: ExtractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FieldStatus {
    pub fn extracted(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            status: ExtractionStatus::Extracted,
            notes: None,
        }
    }

    pub fn missing(field_path: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            status: ExtractionStatus::Missing,
            notes: Some(notes.into()),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_missing(&self) -> bool {
        self.status == ExtractionStatus::Missing
    }
}

/// Field paths used in spans and statuses.
pub mod field {
    pub const TITLE: &str = "title";
    pub const INGREDIENTS: &str = "ingredients";
    pub const STEPS: &str = "steps";
    pub const SERVINGS: &str = "servings";
    pub const PREP_MIN: &str = "times.prep_min";
    pub const COOK_MIN: &str = "times.cook_min";
    pub const TOTAL_MIN: &str = "times.total_min";

    /// The four section-level paths that always receive exactly one status.
    pub const TRACKED: [&str; 4] = [TITLE, INGREDIENTS, STEPS, SERVINGS];

    /// Title, ingredients and steps: the fields whose absence triggers the vision fallback.
    pub const CRITICAL: [&str; 3] = [TITLE, INGREDIENTS, STEPS];

    pub fn ingredient(index: usize) -> String {
        format!("ingredients[{index}].original_text")
    }

    pub fn step(index: usize) -> String {
        format!("steps[{index}].text")
    }
}

/// An extracted ingredient.
///
/// `original_text` is fixed at construction and only readable afterwards;
/// normalization stages add `name_norm` next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    original_text: String,
    #[serde(default)]
    pub name_norm: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl Ingredient {
    pub fn new(original_text: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            name_norm: None,
            quantity: None,
            unit: None,
            optional: false,
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn set_name_norm(&mut self, name: impl Into<String>) {
        self.name_norm = Some(name.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Times {
    pub prep_min: Option<u32>,
    pub cook_min: Option<u32>,
    pub total_min: Option<u32>,
}

impl Times {
    pub fn is_empty(&self) -> bool {
        self.prep_min.is_none() && self.cook_min.is_none() && self.total_min.is_none()
    }
}

/// A servings figure that was inferred rather than printed on the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingsEstimate {
    pub value: u32,
    pub confidence: f64,
    pub basis: Option<String>,
    pub is_estimate: bool,
}

/// Recipe assembled from one parse call. The caller owns persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub title: Option<String>,
    pub servings: Option<u32>,
    #[serde(default)]
    pub servings_estimate: Option<ServingsEstimate>,
    #[serde(default)]
    pub times: Times,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Everything one parse produces: the draft, its spans, and one status per tracked field.
///
/// Spans are created fresh for every parse; a re-parse replaces the previous
/// set wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseOutput {
    pub recipe: RecipeDraft,
    pub spans: Vec<Span>,
    pub field_statuses: Vec<FieldStatus>,
}

impl ParseOutput {
    pub fn status(&self, field_path: &str) -> Option<&FieldStatus> {
        self.field_statuses
            .iter()
            .find(|s| s.field_path == field_path)
    }

    pub fn status_mut(&mut self, field_path: &str) -> Option<&mut FieldStatus> {
        self.field_statuses
            .iter_mut()
            .find(|s| s.field_path == field_path)
    }

    pub fn is_missing(&self, field_path: &str) -> bool {
        self.status(field_path).is_none_or(FieldStatus::is_missing)
    }

    /// Spans whose field path is `field_path` or one of its indexed children.
    pub fn spans_for<'a>(&'a self, field_path: &'a str) -> impl Iterator<Item = &'a Span> + 'a {
        self.spans.iter().filter(move |s| {
            s.field_path == field_path
                || s.field_path
                    .strip_prefix(field_path)
                    .is_some_and(|rest| rest.starts_with('[') || rest.starts_with('.'))
        })
    }
}
