use thiserror::Error;

/// Failures that abort a whole statement.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("failed to parse HTML: {0}")]
    DocumentParse(String),

    #[error("'{marker}' section not found in HTML")]
    SectionNotFound { marker: String },

    #[error("trade table not found after section marker: {0}")]
    TableNotFound(String),

    #[error("no valid trade records found in table")]
    EmptyResult,
}

/// Why a single data row was dropped. Never surfaces to callers; the row is logged and skipped.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("invalid ticket number: '{0}'")]
    InvalidTicket(String),

    #[error("invalid {field} text (too long): '{text}'")]
    LabelTooLong { field: &'static str, text: String },
}
