//! In-memory extract builder for tests.
//!
//! Produces byte-exact files in the same layout the point-of-sale system
//! writes: 32-byte header, one 32-byte descriptor per field, the `0x0D`
//! terminator, then fixed-width records. Character values are Latin-1 encoded
//! and left-aligned, numeric values right-aligned, all space padded.

use std::io;
use std::path::Path;

use crate::header::{DESCRIPTOR_BYTES, DESCRIPTOR_TERMINATOR, HEADER_BYTES};
use crate::reader::DELETED_FLAG;

#[derive(Debug, Clone)]
struct BuilderField {
    name: String,
    code: char,
    length: u8,
    decimals: u8,
}

#[derive(Debug, Clone, Default)]
pub struct DbfBuilder {
    fields: Vec<BuilderField>,
    records: Vec<(bool, Vec<String>)>,
}

impl DbfBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &str, code: char, length: u8, decimals: u8) -> Self {
        self.fields.push(BuilderField {
            name: name.to_string(),
            code,
            length,
            decimals,
        });
        self
    }

    /// Append a live record. Values are given in field order; missing
    /// trailing values are blank.
    #[must_use]
    pub fn record(mut self, values: &[&str]) -> Self {
        self.records
            .push((false, values.iter().map(|v| (*v).to_string()).collect()));
        self
    }

    #[must_use]
    pub fn deleted_record(mut self, values: &[&str]) -> Self {
        self.records
            .push((true, values.iter().map(|v| (*v).to_string()).collect()));
        self
    }

    #[must_use]
    pub fn record_length(&self) -> u16 {
        let data: usize = self.fields.iter().map(|f| usize::from(f.length)).sum();
        u16::try_from(data + 1).unwrap_or(u16::MAX)
    }

    #[must_use]
    pub fn header_length(&self) -> u16 {
        u16::try_from(HEADER_BYTES + DESCRIPTOR_BYTES * self.fields.len() + 1).unwrap_or(u16::MAX)
    }

    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0_u8; HEADER_BYTES];
        out[0] = 0x30;
        out[1..4].copy_from_slice(&[126, 10, 19]);
        let count = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
        out[4..8].copy_from_slice(&count.to_le_bytes());
        out[8..10].copy_from_slice(&self.header_length().to_le_bytes());
        out[10..12].copy_from_slice(&self.record_length().to_le_bytes());

        for field in &self.fields {
            let mut descriptor = [0_u8; DESCRIPTOR_BYTES];
            let name = encode_latin1(&field.name);
            let len = name.len().min(10);
            descriptor[..len].copy_from_slice(&name[..len]);
            descriptor[11] = u8::try_from(field.code).unwrap_or(b'C');
            descriptor[16] = field.length;
            descriptor[17] = field.decimals;
            out.extend_from_slice(&descriptor);
        }
        out.push(DESCRIPTOR_TERMINATOR);

        for (deleted, values) in &self.records {
            out.push(if *deleted { DELETED_FLAG } else { b' ' });
            for (index, field) in self.fields.iter().enumerate() {
                let value = values.get(index).map_or("", String::as_str);
                out.extend_from_slice(&pad(field, value));
            }
        }
        out
    }

    /// Write the built extract to `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.build())
    }
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn pad(field: &BuilderField, value: &str) -> Vec<u8> {
    let width = usize::from(field.length);
    let mut bytes = encode_latin1(value);
    bytes.truncate(width);
    let fill = width - bytes.len();

    if field.code == 'N' || field.code == 'F' {
        let mut out = vec![b' '; fill];
        out.extend_from_slice(&bytes);
        out
    } else {
        bytes.resize(width, b' ');
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{DbfHeader, parse_descriptors};

    #[test]
    fn built_layout_satisfies_record_length_invariant() {
        let builder = DbfBuilder::new()
            .field("MERKEY", 'C', 10, 0)
            .field("MERETP", 'N', 12, 2)
            .record(&["1", "45.50"]);
        let bytes = builder.build();

        let header = DbfHeader::decode(&bytes).unwrap();
        assert_eq!(header.record_count, 1);
        assert_eq!(header.header_length, 97);
        assert_eq!(header.record_length, 23);

        let block = &bytes[HEADER_BYTES..usize::from(header.header_length)];
        let fields = parse_descriptors(block, header.record_length).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(bytes.len(), 97 + 23);
        assert_eq!(&bytes[97 + 11..97 + 23], b"       45.50");
    }
}
