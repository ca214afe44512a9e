//! Decoder error types.

use thiserror::Error;

/// Fatal errors raised while opening or reading an extract.
///
/// Structural problems abort the run before any catalog write happens.
/// Truncated trailing records and unparsable field values are not errors:
/// see [`crate::reader::ReadStats`] and [`FieldDecodeError`].
#[derive(Debug, Error)]
pub enum DbfError {
    /// Malformed header or field-descriptor block.
    #[error("Malformed extract: {0}")]
    Format(String),

    /// A column required by the column mapping is absent from the extract.
    #[error("Extract has no column named '{0}'")]
    MissingColumn(String),

    /// Underlying I/O failure (other than a short trailing read).
    #[error("I/O error reading extract: {0}")]
    Io(#[from] std::io::Error),
}

/// A single field value that could not be decoded.
///
/// Never propagated: the value becomes null and the record is still yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecodeError {
    pub field: String,
    pub raw: String,
}

impl std::fmt::Display for FieldDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "field {} has unparsable value '{}'", self.field, self.raw)
    }
}
