/// Error types for the varsom library
use crate::codebook::{Field, Vocabulary};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while locating a forecast region for a date or coordinate.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The date precedes the first region epoch
    #[error("No region epoch covers {0}")]
    NoEpoch(NaiveDate),

    /// The polygon dataset for an epoch was never loaded
    #[error("Polygon dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// A row in a polygon dataset could not be understood
    #[error("Invalid polygon in dataset {dataset}: {message}")]
    PolygonParse { dataset: String, message: String },

    /// Failed to read polygon CSV
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to open a polygon dataset
    #[error("Failed to read polygon dataset: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the schema mappers.
///
/// `MissingField` is the malformed-record case: a required field is absent
/// and nothing is fabricated in its place.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A field required by the record's schema is absent
    #[error("Malformed record: missing field '{0}'")]
    MissingField(&'static str),

    /// A coded field carries an id its vocabulary does not know
    #[error("Unknown code {id} for {field} in {vocabulary} vocabulary")]
    UnknownCode {
        vocabulary: Vocabulary,
        field: Field,
        id: i32,
    },

    /// A numeric field is outside its allowed range
    #[error("Value {value} out of range for field '{field}'")]
    OutOfRange { field: &'static str, value: i64 },

    /// A date field could not be parsed
    #[error("Invalid date in field '{field}': {value}")]
    InvalidDate { field: &'static str, value: String },

    /// Region resolution failed fatally
    #[error(transparent)]
    Region(#[from] RegionError),
}

/// Errors raised while loading a codebook.
#[derive(Error, Debug)]
pub enum CodebookError {
    /// Failed to read codebook CSV
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Unrecognised vocabulary column value
    #[error("Unknown vocabulary: {0}")]
    UnknownVocabulary(String),

    /// Unrecognised field column value
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Non-numeric id column value
    #[error("Invalid code id: {0}")]
    InvalidId(String),

    /// Same (vocabulary, field, id) listed twice
    #[error("Duplicate code {id} for {field} in {vocabulary} vocabulary")]
    Duplicate {
        vocabulary: Vocabulary,
        field: Field,
        id: i32,
    },
}
