//! Streaming record reader.
//!
//! [`DbfReader`] validates the header and descriptor table up front, then
//! hands out [`Records`] iterators that decode one record at a time. Each call
//! to [`DbfReader::records`] seeks back to the first record, so a pass can be
//! replayed without reopening the file.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DbfError, FieldDecodeError};
use crate::header::{DbfHeader, FieldDescriptor, HEADER_BYTES, parse_descriptors};
use crate::value::{FieldValue, decode_field, decode_latin1};

/// Deletion-flag value marking a soft-deleted record.
pub const DELETED_FLAG: u8 = b'*';

/// One decoded record. Values are in descriptor order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub values: Vec<FieldValue>,
    #[serde(skip)]
    pub decode_errors: Vec<FieldDecodeError>,
}

impl RawRecord {
    /// Value at a descriptor index; `Null` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> &FieldValue {
        self.values.get(index).unwrap_or(&FieldValue::Null)
    }
}

/// Counters accumulated by one pass over the records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    /// Live records handed to the caller.
    pub yielded: u64,
    /// Soft-deleted records skipped.
    pub deleted: u64,
    /// Field values that could not be decoded and were stored as null.
    pub field_errors: u64,
    /// The file ended before the declared record count was reached.
    pub truncated: bool,
}

pub struct DbfReader<R> {
    inner: R,
    header: DbfHeader,
    fields: Vec<FieldDescriptor>,
}

impl DbfReader<BufReader<File>> {
    /// Open an extract on disk and validate its header.
    ///
    /// # Errors
    ///
    /// Returns `DbfError::Io` if the file cannot be opened, or
    /// `DbfError::Format` if the header or descriptor table is malformed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbfError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> DbfReader<R> {
    /// Read and validate the header and descriptor table from any seekable source.
    ///
    /// # Errors
    ///
    /// Returns `DbfError::Format` for a short header, an unterminated or
    /// truncated descriptor table, or field lengths that disagree with the
    /// declared record length.
    pub fn from_reader(mut inner: R) -> Result<Self, DbfError> {
        inner.seek(SeekFrom::Start(0))?;

        let mut head = [0_u8; HEADER_BYTES];
        let read = read_full(&mut inner, &mut head)?;
        let header = DbfHeader::decode(&head[..read])?;

        let mut block = vec![0_u8; header.descriptor_block_len()];
        let read = read_full(&mut inner, &mut block)?;
        if read < block.len() {
            return Err(DbfError::Format(format!(
                "descriptor table cut short: header declares {} bytes, file has {read}",
                block.len()
            )));
        }
        let fields = parse_descriptors(&block, header.record_length)?;

        debug!(
            records = header.record_count,
            fields = fields.len(),
            record_length = header.record_length,
            "Opened extract"
        );

        Ok(Self {
            inner,
            header,
            fields,
        })
    }

    #[must_use]
    pub const fn header(&self) -> &DbfHeader {
        &self.header
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of a column by name, ignoring ASCII case.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Start a pass over the records from the first one.
    ///
    /// # Errors
    ///
    /// Returns `DbfError::Io` if the source cannot seek to the first record.
    pub fn records(&mut self) -> Result<Records<'_, R>, DbfError> {
        self.inner
            .seek(SeekFrom::Start(u64::from(self.header.header_length)))?;
        Ok(Records {
            buf: vec![0_u8; usize::from(self.header.record_length)],
            remaining: self.header.record_count,
            stats: ReadStats::default(),
            done: false,
            reader: self,
        })
    }

    fn decode_record(&self, buf: &[u8]) -> RawRecord {
        let mut values = Vec::with_capacity(self.fields.len());
        let mut decode_errors = Vec::new();
        let mut offset = 1;

        for field in &self.fields {
            let raw = &buf[offset..offset + usize::from(field.length)];
            offset += usize::from(field.length);

            if let Some(value) = decode_field(field, raw) {
                values.push(value);
            } else {
                let error = FieldDecodeError {
                    field: field.name.clone(),
                    raw: decode_latin1(raw).trim().to_string(),
                };
                debug!(%error, "Field decoded as null");
                decode_errors.push(error);
                values.push(FieldValue::Null);
            }
        }

        RawRecord {
            values,
            decode_errors,
        }
    }
}

/// Lazy iterator over the live records of an extract.
///
/// Ends early, without an error, when the file is shorter than the declared
/// record count. Check [`Records::stats`] afterwards to tell the cases apart.
pub struct Records<'a, R> {
    reader: &'a mut DbfReader<R>,
    buf: Vec<u8>,
    remaining: u32,
    stats: ReadStats,
    done: bool,
}

impl<R> Records<'_, R> {
    #[must_use]
    pub const fn stats(&self) -> ReadStats {
        self.stats
    }

    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.stats.truncated
    }
}

impl<R: Read + Seek> Iterator for Records<'_, R> {
    type Item = Result<RawRecord, DbfError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.remaining > 0 {
            self.remaining -= 1;

            match read_full(&mut self.reader.inner, &mut self.buf) {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                Ok(read) if read < self.buf.len() => {
                    self.done = true;
                    self.stats.truncated = true;
                    warn!(
                        read,
                        expected = self.buf.len(),
                        missing = self.remaining + 1,
                        "Extract ends mid-record; stopping early"
                    );
                    return None;
                }
                Ok(_) => {}
            }

            if self.buf[0] == DELETED_FLAG {
                self.stats.deleted += 1;
                continue;
            }

            let record = self.reader.decode_record(&self.buf);
            self.stats.yielded += 1;
            self.stats.field_errors += record.decode_errors.len() as u64;
            return Some(Ok(record));
        }
        None
    }
}

/// Fill `buf` as far as the source allows. Returns the number of bytes read,
/// which is short only at end of file.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::DbfBuilder;

    fn catalog_extract() -> DbfBuilder {
        DbfBuilder::new()
            .field("MERKEY", 'C', 10, 0)
            .field("MEDESC", 'C', 30, 0)
            .field("MERETP", 'N', 10, 2)
            .field("USRDAT", 'D', 8, 0)
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn reads_live_records_and_skips_deleted() {
        let bytes = catalog_extract()
            .record(&["1000016", "WHITE BREAD 350G", "45.50", "20261001"])
            .deleted_record(&["1000017", "GONE", "1.00", "20261001"])
            .record(&["1000018", "RYE LOAF", "60.00", ""])
            .build();

        let mut reader = DbfReader::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.header().record_count, 3);
        assert_eq!(reader.field_index("medesc"), Some(1));

        let mut records = reader.records().unwrap();
        let rows: Vec<RawRecord> = records.by_ref().map(Result::unwrap).collect();
        let stats = records.stats();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[0], text("1000016"));
        assert_eq!(rows[0].values[2], FieldValue::Float(45.5));
        assert_eq!(rows[1].values[1], text("RYE LOAF"));
        assert_eq!(rows[1].values[3], FieldValue::Null);
        assert_eq!(
            stats,
            ReadStats {
                yielded: 2,
                deleted: 1,
                field_errors: 0,
                truncated: false,
            }
        );
    }

    #[test]
    fn truncated_final_record_stops_without_error() {
        let mut bytes = catalog_extract()
            .record(&["1", "A", "1.00", ""])
            .record(&["2", "B", "2.00", ""])
            .build();
        bytes.truncate(bytes.len() - 5);

        let mut reader = DbfReader::from_reader(Cursor::new(bytes)).unwrap();
        let mut records = reader.records().unwrap();
        let rows: Vec<_> = records.by_ref().collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 1);
        assert!(records.truncated());
    }

    #[test]
    fn unparsable_field_becomes_null_and_is_reported() {
        let bytes = catalog_extract()
            .record(&["1", "A", "**.**", "2026XX01"])
            .build();

        let mut reader = DbfReader::from_reader(Cursor::new(bytes)).unwrap();
        let mut records = reader.records().unwrap();
        let row = records.next().unwrap().unwrap();

        assert_eq!(row.values[2], FieldValue::Null);
        assert_eq!(row.values[3], FieldValue::Null);
        assert_eq!(row.decode_errors.len(), 2);
        assert_eq!(row.decode_errors[0].field, "MERETP");
        assert_eq!(row.decode_errors[0].raw, "**.**");
    }

    #[test]
    fn records_can_be_replayed() {
        let bytes = catalog_extract()
            .record(&["1", "A", "1.00", ""])
            .record(&["2", "B", "2.00", ""])
            .build();
        let mut reader = DbfReader::from_reader(Cursor::new(bytes)).unwrap();

        let first = reader.records().unwrap().count();
        let second = reader.records().unwrap().count();
        assert_eq!((first, second), (2, 2));
    }

    #[test]
    fn short_header_is_format_error() {
        let err = DbfReader::from_reader(Cursor::new(vec![0_u8; 20])).err().unwrap();
        assert!(matches!(err, DbfError::Format(_)), "got {err:?}");
    }

    #[test]
    fn cut_descriptor_table_is_format_error() {
        let bytes = catalog_extract().build();
        let err = DbfReader::from_reader(Cursor::new(bytes[..50].to_vec()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("cut short"), "got {err}");
    }
}
