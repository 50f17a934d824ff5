use scraper::ElementRef;

use crate::fields::{cell_text, parse_ticket};

/// Every `<tr>` under the table, nested tables included, in document order.
pub fn table_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
        .collect()
}

/// Direct `<td>`/`<th>` children of a row.
pub fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    HeaderRow,
    TooFewCells(usize),
    AfterSection,
    NotNumeric,
}

/// Decides which rows of the located table are closed-trade data rows.
pub struct RowFilter<'a> {
    header: ElementRef<'a>,
    boundary: Option<ElementRef<'a>>,
    boundary_idx: Option<usize>,
    min_cells: usize,
}

impl<'a> RowFilter<'a> {
    pub fn new(
        rows: &[ElementRef<'a>],
        header: ElementRef<'a>,
        boundary: Option<ElementRef<'a>>,
        min_cells: usize,
    ) -> Self {
        let boundary_idx =
            boundary.and_then(|b| rows.iter().position(|row| row.id() == b.id()));
        Self {
            header,
            boundary,
            boundary_idx,
            min_cells,
        }
    }

    /// `idx` is the row's position in the slice the filter was built from.
    pub fn check(&self, idx: usize, row: ElementRef<'a>, cells: &[ElementRef<'a>]) -> Result<(), Rejection> {
        if row.id() == self.header.id() {
            return Err(Rejection::HeaderRow);
        }
        if cells.len() < self.min_cells {
            return Err(Rejection::TooFewCells(cells.len()));
        }
        if self.is_after_boundary(idx, row) {
            return Err(Rejection::AfterSection);
        }
        // Only a "looks like data" probe; the ticket itself comes from the mapped column.
        match cells.first() {
            Some(first) if parse_ticket(&cell_text(*first)).is_some() => Ok(()),
            _ => Err(Rejection::NotNumeric),
        }
    }

    fn is_after_boundary(&self, idx: usize, row: ElementRef<'a>) -> bool {
        let Some(boundary) = self.boundary else {
            return false;
        };

        match self.boundary_idx {
            // Rows are in document order, so a later row sharing the parent is a following sibling.
            Some(b_idx) => {
                idx > b_idx && row.parent().map(|p| p.id()) == boundary.parent().map(|p| p.id())
            }
            None => boundary.next_siblings().any(|n| n.id() == row.id()),
        }
    }
}
