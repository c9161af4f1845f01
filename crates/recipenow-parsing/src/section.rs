use std::ops::Range;

use crate::classify::{HeaderKind, LineClass};

/// Where the recipe sections sit within the ordered line sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    /// Indices of every title header line, in order.
    pub title_headers: Vec<usize>,
    /// Indices of every ingredient header line, in order.
    pub ingredient_headers: Vec<usize>,
    /// Indices of every step header line, in order.
    pub step_headers: Vec<usize>,
    /// Line range holding the ingredient list. May be empty when a header is
    /// immediately followed by the steps header.
    pub ingredients: Option<Range<usize>>,
    /// Whether `ingredients` came from an explicit header rather than content shape.
    pub ingredients_explicit: bool,
    /// First line of the method.
    pub steps_start: Option<usize>,
}

impl Sections {
    /// Whether `index` falls inside the ingredient range or at/after the steps start.
    pub fn is_body_line(&self, index: usize) -> bool {
        self.ingredients.as_ref().is_some_and(|r| r.contains(&index))
            || self.steps_start.is_some_and(|s| index >= s)
    }
}

/// Locate the ingredient and step sections.
///
/// Explicit headers are trusted unconditionally. Without an ingredient
/// header, the first ingredient-like line opens the list and it extends
/// while lines stay ingredient-like, skipping runs of at most
/// `gap_tolerance` blank or noise lines. Without a steps header, the method
/// starts at the first step-like line after the ingredient list.
pub fn segment(classes: &[LineClass], gap_tolerance: usize) -> Sections {
    let mut sections = Sections::default();

    for (i, class) in classes.iter().enumerate() {
        match class.header {
            Some(HeaderKind::Title) => sections.title_headers.push(i),
            Some(HeaderKind::Ingredients) => sections.ingredient_headers.push(i),
            Some(HeaderKind::Steps) => sections.step_headers.push(i),
            None => {}
        }
    }

    let n = classes.len();

    if let Some(&h) = sections.ingredient_headers.first() {
        let end = sections
            .step_headers
            .iter()
            .copied()
            .find(|&s| s > h)
            .unwrap_or(n);
        sections.ingredients = Some(h + 1..end);
        sections.ingredients_explicit = true;
    } else {
        let limit = sections.step_headers.first().copied().unwrap_or(n);
        sections.ingredients = find_ingredient_block(&classes[..limit], gap_tolerance);
    }

    sections.steps_start = match step_header_for(&sections) {
        Some(h) if h + 1 < n => Some(h + 1),
        Some(_) => None,
        None => {
            let from = sections.ingredients.as_ref().map_or(0, |r| r.end);
            (from..n).find(|&i| {
                let c = &classes[i];
                c.is_step_start() && !c.is_header() && !c.is_noise
            })
        }
    };

    tracing::debug!(
        ingredients = ?sections.ingredients,
        explicit = sections.ingredients_explicit,
        steps_start = ?sections.steps_start,
        "segmented recipe sections"
    );

    sections
}

/// The steps header to use: the first one after the ingredient header if the
/// ingredient header came first, otherwise the first one overall.
fn step_header_for(sections: &Sections) -> Option<usize> {
    let first = sections.step_headers.first().copied()?;
    match sections.ingredient_headers.first() {
        Some(&ih) if ih < first => Some(first),
        Some(&ih) => sections
            .step_headers
            .iter()
            .copied()
            .find(|&s| s > ih)
            .or(Some(first)),
        None => Some(first),
    }
}

fn find_ingredient_block(classes: &[LineClass], gap_tolerance: usize) -> Option<Range<usize>> {
    let start = classes
        .iter()
        .position(|c| !c.is_header() && !c.is_noise && c.is_ingredient_like)?;

    let mut end = start + 1;
    let mut gap = 0;
    for (j, c) in classes.iter().enumerate().skip(start + 1) {
        if c.is_ingredient_like && !c.is_noise {
            end = j + 1;
            gap = 0;
        } else if c.is_blank || c.is_noise {
            gap += 1;
            if gap > gap_tolerance {
                break;
            }
        } else {
            break;
        }
    }
    Some(start..end)
}
