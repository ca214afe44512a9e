//! File header and field-descriptor table.
//!
//! Layout (all integers little-endian):
//!
//! | Offset | Size | Meaning |
//! |---|---|---|
//! | 4 | 4 | record count |
//! | 8 | 2 | header length (first record offset) |
//! | 10 | 2 | record length, including the deletion flag |
//! | 32.. | 32 each | field descriptors, terminated by `0x0D` |
//!
//! Descriptor: name `[0..11]` (NUL/space padded), type `[11]`,
//! length `[16]`, decimal count `[17]`.

use serde::Serialize;

use crate::error::DbfError;

/// Size of the fixed file header.
pub const HEADER_BYTES: usize = 32;
/// Size of one field descriptor.
pub const DESCRIPTOR_BYTES: usize = 32;
/// Terminates the descriptor table.
pub const DESCRIPTOR_TERMINATOR: u8 = 0x0D;

const NAME_BYTES: usize = 11;
const TYPE_OFFSET: usize = 11;
const LENGTH_OFFSET: usize = 16;
const DECIMALS_OFFSET: usize = 17;

/// Decoded fixed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DbfHeader {
    pub record_count: u32,
    pub header_length: u16,
    pub record_length: u16,
}

impl DbfHeader {
    /// Decode the fixed 32-byte header.
    ///
    /// # Errors
    ///
    /// Returns `DbfError::Format` if fewer than 32 bytes are available or the
    /// declared lengths cannot describe a valid file.
    pub fn decode(bytes: &[u8]) -> Result<Self, DbfError> {
        if bytes.len() < HEADER_BYTES {
            return Err(DbfError::Format(format!(
                "header too short: expected {HEADER_BYTES} bytes, got {}",
                bytes.len()
            )));
        }

        let header = Self {
            record_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            header_length: u16::from_le_bytes([bytes[8], bytes[9]]),
            record_length: u16::from_le_bytes([bytes[10], bytes[11]]),
        };

        if usize::from(header.header_length) <= HEADER_BYTES {
            return Err(DbfError::Format(format!(
                "header length {} leaves no room for a field descriptor table",
                header.header_length
            )));
        }
        if header.record_length == 0 {
            return Err(DbfError::Format("record length is zero".into()));
        }

        Ok(header)
    }

    /// Number of bytes between the fixed header and the first record.
    #[must_use]
    pub fn descriptor_block_len(&self) -> usize {
        usize::from(self.header_length) - HEADER_BYTES
    }
}

/// Field type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    Character,
    Numeric,
    Date,
    Other(char),
}

impl FieldType {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            b'C' => Self::Character,
            // Float columns carry the same decimal text as numeric ones.
            b'N' | b'F' => Self::Numeric,
            b'D' => Self::Date,
            other => Self::Other(other as char),
        }
    }

    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Character => 'C',
            Self::Numeric => 'N',
            Self::Date => 'D',
            Self::Other(code) => code,
        }
    }
}

/// One column of the extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimals: u8,
}

impl FieldDescriptor {
    fn decode(bytes: &[u8]) -> Self {
        let name_bytes = &bytes[..NAME_BYTES];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
        let name: String = name_bytes[..name_end].iter().map(|&b| char::from(b)).collect();

        Self {
            name: name.trim().to_string(),
            field_type: FieldType::from_code(bytes[TYPE_OFFSET]),
            length: bytes[LENGTH_OFFSET],
            decimals: bytes[DECIMALS_OFFSET],
        }
    }
}

/// Parse the descriptor table that follows the fixed header.
///
/// `block` holds the bytes from offset 32 up to the header length. The sum of
/// field lengths plus the deletion flag must equal `record_length`.
///
/// # Errors
///
/// Returns `DbfError::Format` if the table is unterminated, a descriptor is cut
/// short, or the field lengths disagree with the declared record length.
pub fn parse_descriptors(block: &[u8], record_length: u16) -> Result<Vec<FieldDescriptor>, DbfError> {
    let mut fields = Vec::new();
    let mut offset = 0;

    loop {
        match block.get(offset) {
            Some(&DESCRIPTOR_TERMINATOR) => break,
            Some(_) if offset + DESCRIPTOR_BYTES <= block.len() => {
                fields.push(FieldDescriptor::decode(&block[offset..offset + DESCRIPTOR_BYTES]));
                offset += DESCRIPTOR_BYTES;
            }
            Some(_) => {
                return Err(DbfError::Format(format!(
                    "field descriptor {} is truncated ({} of {DESCRIPTOR_BYTES} bytes)",
                    fields.len() + 1,
                    block.len() - offset
                )));
            }
            None => {
                return Err(DbfError::Format(format!(
                    "field descriptor table not terminated by 0x{DESCRIPTOR_TERMINATOR:02X} after {} fields",
                    fields.len()
                )));
            }
        }
    }

    let declared = usize::from(record_length);
    let computed = fields.iter().map(|f| usize::from(f.length)).sum::<usize>() + 1;
    if computed != declared {
        return Err(DbfError::Format(format!(
            "field lengths sum to {computed} bytes (with deletion flag) but record length is {declared}"
        )));
    }

    Ok(fields)
}
