//! Source extract locations and column mapping.
//!
//! Column names are resolved once against the field-descriptor table of each
//! extract. Companion price columns are optional: leave them empty to skip.

use serde::{Deserialize, Serialize};

fn default_key_field() -> String {
    "MERKEY".to_string()
}

fn default_description_field() -> String {
    "MEDESC".to_string()
}

fn default_price_field() -> String {
    "MERETP".to_string()
}

fn default_stamp_field() -> String {
    "USRDAT".to_string()
}

fn default_barcode_fields() -> Vec<String> {
    ["MEAN13", "BARCD1", "BARCD2", "BARCD3"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_case_price_field() -> String {
    "MEWHOP".to_string()
}

fn default_pack_price_field() -> String {
    "MERET2".to_string()
}

fn default_cost_field() -> String {
    "MECOS0".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Default primary extract, used when the CLI is given no path.
    #[serde(default)]
    pub primary: String,

    /// Default supplementary extract.
    #[serde(default)]
    pub supplementary: String,

    #[serde(default = "default_key_field")]
    pub key_field: String,

    #[serde(default = "default_description_field")]
    pub description_field: String,

    /// Retail price column; the only price that drives change detection.
    #[serde(default = "default_price_field")]
    pub price_field: String,

    /// Last-updated stamp used to pick between primary and supplementary.
    #[serde(default = "default_stamp_field")]
    pub stamp_field: String,

    /// Barcode columns in priority order.
    #[serde(default = "default_barcode_fields")]
    pub barcode_fields: Vec<String>,

    #[serde(default = "default_case_price_field")]
    pub case_price_field: String,

    #[serde(default = "default_pack_price_field")]
    pub pack_price_field: String,

    #[serde(default = "default_cost_field")]
    pub cost_field: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary: String::new(),
            supplementary: String::new(),
            key_field: default_key_field(),
            description_field: default_description_field(),
            price_field: default_price_field(),
            stamp_field: default_stamp_field(),
            barcode_fields: default_barcode_fields(),
            case_price_field: default_case_price_field(),
            pack_price_field: default_pack_price_field(),
            cost_field: default_cost_field(),
        }
    }
}

impl SourceConfig {
    /// Default primary extract path, if configured.
    #[must_use]
    pub fn primary_path(&self) -> Option<&str> {
        Some(self.primary.as_str()).filter(|p| !p.is_empty())
    }

    /// Default supplementary extract path, if configured.
    #[must_use]
    pub fn supplementary_path(&self) -> Option<&str> {
        Some(self.supplementary.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_point_of_sale_extract() {
        let config = SourceConfig::default();
        assert_eq!(config.key_field, "MERKEY");
        assert_eq!(config.price_field, "MERETP");
        assert_eq!(config.barcode_fields, ["MEAN13", "BARCD1", "BARCD2", "BARCD3"]);
        assert!(config.primary_path().is_none());
        assert!(config.supplementary_path().is_none());
    }
}
