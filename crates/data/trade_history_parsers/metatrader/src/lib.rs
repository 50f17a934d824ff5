//! Closed-trade extraction for MetaTrader HTML statements.
//!
//! bytes → decoded markup → section locator → header classifier →
//! per-row filter → field extractor → records.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, info};

pub mod assemble;
pub mod decode;
pub mod error;
pub mod fields;
pub mod header;
pub mod rows;
pub mod section;

pub use error::{RowError, StatementError};
pub use models::{ParserSettings, TradeRecord};

use assemble::assemble_records;
use decode::decode_document;
use header::{classify_header, find_header_row, header_labels};
use rows::{table_rows, RowFilter};
use section::{find_section_boundary, locate_section};

pub const PARSER_NAME: &str = "metatrader";

/// Statement parser. Holds only its settings, so one value can serve many
/// threads parsing independent documents.
#[derive(Debug, Clone, Default)]
pub struct MetaTraderHtmlParser {
    settings: ParserSettings,
}

impl MetaTraderHtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_section_marker(mut self, marker: impl Into<String>) -> Self {
        self.settings.section_marker = marker.into();
        self
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Extracts every closed trade from a statement, in table order.
    pub fn parse_bytes(&self, content: &[u8]) -> std::result::Result<Vec<TradeRecord>, StatementError> {
        let text = decode_document(content, &self.settings.fallback_encoding)?;
        let document = Html::parse_document(&text);
        self.extract(&document)
    }

    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Vec<TradeRecord>> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(self.parse_bytes(&buf)?)
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<TradeRecord>> {
        let path = path.as_ref();
        let content =
            std::fs::read(path).with_context(|| format!("Cannot open {}", path.display()))?;
        self.parse_bytes(&content)
            .with_context(|| format!("Cannot extract trades from {}", path.display()))
    }

    /// Cheap pre-check for uploads: decodes, has a table, mentions the section marker.
    pub fn validate(&self, content: &[u8]) -> bool {
        let Ok(text) = decode_document(content, &self.settings.fallback_encoding) else {
            return false;
        };
        if !text.contains(&self.settings.section_marker) {
            return false;
        }
        let document = Html::parse_document(&text);
        document
            .root_element()
            .descendants()
            .filter_map(scraper::ElementRef::wrap)
            .any(|el| el.value().name() == "table")
    }

    fn extract(&self, document: &Html) -> std::result::Result<Vec<TradeRecord>, StatementError> {
        let settings = &self.settings;

        let section = locate_section(document, &settings.section_marker)?;
        info!("Found '{}' section", settings.section_marker);

        let rows = table_rows(section.table);
        if rows.len() < 2 {
            return Err(StatementError::TableNotFound(format!(
                "table has too few rows ({})",
                rows.len()
            )));
        }
        info!(rows = rows.len(), "Found trade table in HTML");

        let header = find_header_row(&rows, &settings.header_background).unwrap_or(rows[0]);
        let mapping = classify_header(&header_labels(header));
        debug!(mapping = %mapping.describe(), "Column mapping");

        let boundary = find_section_boundary(section.anchor, &settings.section_terminators);
        let filter = RowFilter::new(&rows, header, boundary, settings.min_row_cells);

        let records = assemble_records(&rows, &filter, &mapping, settings);
        if records.is_empty() {
            return Err(StatementError::EmptyResult);
        }

        info!(count = records.len(), "Extracted trade records");
        Ok(records)
    }
}

/// [`MetaTraderHtmlParser::parse_bytes`] with the default MT4 settings.
pub fn parse_html_to_trade_records(content: &[u8]) -> std::result::Result<Vec<TradeRecord>, StatementError> {
    MetaTraderHtmlParser::new().parse_bytes(content)
}
