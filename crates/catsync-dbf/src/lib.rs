//! # catsync-dbf
//!
//! Decoder for the fixed-record binary extracts produced by the point-of-sale
//! system (FoxPro/dBASE layout), plus the projection of decoded rows into
//! typed catalog records and the merge of a primary and supplementary extract.
//!
//! ```text
//! bytes ──DbfReader──▶ RawRecord ──SourceLayout──▶ SourceRecord ──merge_sources──▶ merged
//! ```
//!
//! Only the header, the field-descriptor table and fixed-width records are
//! understood. Memo files, index files and multi-byte code pages are not.

pub mod error;
pub mod header;
pub mod layout;
pub mod merge;
pub mod reader;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod builder;

pub use error::{DbfError, FieldDecodeError};
pub use header::{DbfHeader, FieldDescriptor, FieldType};
pub use layout::{ColumnMapping, SourceLayout, SourceRecord};
pub use merge::merge_sources;
pub use reader::{DbfReader, RawRecord, ReadStats, Records};
pub use value::FieldValue;
