//! Typed projection of decoded rows.
//!
//! Column names are looked up once per extract, producing a [`SourceLayout`]
//! of descriptor indices. Every record is then projected through it into a
//! [`SourceRecord`] without further name lookups.

use serde::Serialize;

use crate::error::DbfError;
use crate::header::FieldDescriptor;
use crate::reader::RawRecord;

/// Column names for each catalog attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub key: String,
    pub description: String,
    pub price: String,
    pub stamp: String,
    /// Barcode columns in priority order.
    pub barcodes: Vec<String>,
    pub case_price: Option<String>,
    pub pack_price: Option<String>,
    pub cost: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            key: "MERKEY".into(),
            description: "MEDESC".into(),
            price: "MERETP".into(),
            stamp: "USRDAT".into(),
            barcodes: vec![
                "MEAN13".into(),
                "BARCD1".into(),
                "BARCD2".into(),
                "BARCD3".into(),
            ],
            case_price: Some("MEWHOP".into()),
            pack_price: Some("MERET2".into()),
            cost: Some("MECOS0".into()),
        }
    }
}

/// A [`ColumnMapping`] resolved against one extract's descriptor table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    key: usize,
    description: usize,
    price: usize,
    stamp: Option<usize>,
    barcodes: Vec<usize>,
    case_price: Option<usize>,
    pack_price: Option<usize>,
    cost: Option<usize>,
}

impl SourceLayout {
    /// Resolve column names to descriptor indices.
    ///
    /// Key, description and price columns are required. A missing stamp column
    /// makes every stamp empty; missing barcode and companion price columns
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DbfError::MissingColumn` naming the first required column that
    /// is not in the extract.
    pub fn resolve(fields: &[FieldDescriptor], mapping: &ColumnMapping) -> Result<Self, DbfError> {
        let find = |name: &str| fields.iter().position(|f| f.name.eq_ignore_ascii_case(name));
        let require = |name: &str| find(name).ok_or_else(|| DbfError::MissingColumn(name.to_string()));
        let optional = |name: Option<&str>| name.filter(|n| !n.is_empty()).and_then(|n| find(n));

        Ok(Self {
            key: require(&mapping.key)?,
            description: require(&mapping.description)?,
            price: require(&mapping.price)?,
            stamp: find(&mapping.stamp),
            barcodes: mapping.barcodes.iter().filter_map(|name| find(name)).collect(),
            case_price: optional(mapping.case_price.as_deref()),
            pack_price: optional(mapping.pack_price.as_deref()),
            cost: optional(mapping.cost.as_deref()),
        })
    }

    /// Project one decoded row.
    #[must_use]
    pub fn project(&self, raw: &RawRecord) -> SourceRecord {
        let text = |index: usize| raw.get(index).to_text().unwrap_or_default();
        let number = |index: Option<usize>| index.and_then(|i| raw.get(i).as_f64());

        let mut barcodes: Vec<String> = Vec::with_capacity(self.barcodes.len());
        for &index in &self.barcodes {
            let code = text(index);
            if !code.is_empty() && !barcodes.contains(&code) {
                barcodes.push(code);
            }
        }

        SourceRecord {
            key: text(self.key).trim().to_string(),
            description: raw.get(self.description).to_text(),
            price: raw.get(self.price).as_f64(),
            price_case: number(self.case_price),
            price_pack: number(self.pack_price),
            cost: number(self.cost),
            stamp: self.stamp.map(text).unwrap_or_default(),
            barcodes,
            decode_errors: raw.decode_errors.len(),
        }
    }
}

/// A source row in catalog terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    pub key: String,
    /// Trimmed description; `None` when blank.
    pub description: Option<String>,
    /// Retail price; `None` when blank or unparsable.
    pub price: Option<f64>,
    pub price_case: Option<f64>,
    pub price_pack: Option<f64>,
    pub cost: Option<f64>,
    /// Last-updated stamp as text (`YYYYMMDD` for date columns), empty when absent.
    pub stamp: String,
    /// Distinct non-empty barcodes in column priority order.
    pub barcodes: Vec<String>,
    /// Number of fields in the source row that decoded as null.
    pub decode_errors: usize,
}

impl SourceRecord {
    /// Retail price with missing treated as zero.
    #[must_use]
    pub fn price_or_zero(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::header::FieldType;
    use crate::value::FieldValue;

    fn descriptor(name: &str, field_type: FieldType, length: u8, decimals: u8) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            field_type,
            length,
            decimals,
        }
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            descriptor("merkey", FieldType::Character, 10, 0),
            descriptor("MEDESC", FieldType::Character, 30, 0),
            descriptor("MERETP", FieldType::Numeric, 10, 2),
            descriptor("USRDAT", FieldType::Date, 8, 0),
            descriptor("MEAN13", FieldType::Numeric, 13, 0),
            descriptor("BARCD1", FieldType::Character, 13, 0),
            descriptor("MEWHOP", FieldType::Numeric, 10, 2),
        ]
    }

    #[test]
    fn resolves_case_insensitively_and_skips_absent_optionals() {
        let layout = SourceLayout::resolve(&fields(), &ColumnMapping::default()).unwrap();
        assert_eq!(layout.key, 0);
        assert_eq!(layout.stamp, Some(3));
        assert_eq!(layout.barcodes, vec![4, 5]);
        assert_eq!(layout.case_price, Some(6));
        assert_eq!(layout.pack_price, None);
        assert_eq!(layout.cost, None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let mapping = ColumnMapping {
            price: "PRICE2".into(),
            ..ColumnMapping::default()
        };
        let err = SourceLayout::resolve(&fields(), &mapping).unwrap_err();
        assert!(matches!(err, DbfError::MissingColumn(ref name) if name == "PRICE2"), "got {err:?}");
    }

    #[test]
    fn projects_typed_record() {
        let layout = SourceLayout::resolve(&fields(), &ColumnMapping::default()).unwrap();
        let raw = RawRecord {
            values: vec![
                FieldValue::Text("1000016".into()),
                FieldValue::Text("WHITE BREAD 350G".into()),
                FieldValue::Float(45.5),
                FieldValue::Date(chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()),
                FieldValue::Integer(4_800_016_000_123),
                FieldValue::Text("4800016000123".into()),
                FieldValue::Float(520.0),
            ],
            decode_errors: Vec::new(),
        };

        let record = layout.project(&raw);
        assert_eq!(
            record,
            SourceRecord {
                key: "1000016".into(),
                description: Some("WHITE BREAD 350G".into()),
                price: Some(45.5),
                price_case: Some(520.0),
                price_pack: None,
                cost: None,
                stamp: "20261001".into(),
                barcodes: vec!["4800016000123".into()],
                decode_errors: 0,
            }
        );
    }

    #[test]
    fn null_values_project_to_empty() {
        let layout = SourceLayout::resolve(&fields(), &ColumnMapping::default()).unwrap();
        let raw = RawRecord {
            values: vec![FieldValue::Null; 7],
            decode_errors: Vec::new(),
        };

        let record = layout.project(&raw);
        assert_eq!(record.key, "");
        assert_eq!(record.description, None);
        assert_eq!(record.price_or_zero(), 0.0);
        assert_eq!(record.stamp, "");
        assert!(record.barcodes.is_empty());
    }
}
