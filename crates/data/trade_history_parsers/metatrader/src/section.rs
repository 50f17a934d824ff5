use scraper::{ElementRef, Html};

use crate::error::StatementError;

/// The located closed-trades block: the row holding the marker and the table around it.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub anchor: ElementRef<'a>,
    pub table: ElementRef<'a>,
}

pub fn locate_section<'a>(document: &'a Html, marker: &str) -> Result<Section<'a>, StatementError> {
    let anchor = find_anchor_row(document, marker).ok_or_else(|| StatementError::SectionNotFound {
        marker: marker.to_string(),
    })?;

    let table = enclosing(anchor, "table").ok_or_else(|| {
        StatementError::TableNotFound(format!("no table encloses the '{}' row", marker))
    })?;

    Ok(Section { anchor, table })
}

/// First row, in document order, whose text contains `marker`.
///
/// A matching text node outside any row is ignored and the search goes on.
fn find_anchor_row<'a>(document: &'a Html, marker: &str) -> Option<ElementRef<'a>> {
    document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().as_text().is_some_and(|t| t.contains(marker)))
        .find_map(|node| {
            node.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "tr")
        })
}

/// Nearest ancestor element with the given tag name.
pub fn enclosing<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == tag)
}

/// True when any single text node under `el` contains `needle`.
pub fn contains_text(el: ElementRef<'_>, needle: &str) -> bool {
    el.text().any(|t| t.contains(needle))
}

/// Where the closed-trades block ends: the anchor itself or the first following
/// sibling that mentions one of the terminator markers ("Open Trades:", ...).
pub fn find_section_boundary<'a>(
    anchor: ElementRef<'a>,
    terminators: &[String],
) -> Option<ElementRef<'a>> {
    std::iter::once(anchor)
        .chain(anchor.next_siblings().filter_map(ElementRef::wrap))
        .find(|row| terminators.iter().any(|t| !t.is_empty() && contains_text(*row, t)))
}
