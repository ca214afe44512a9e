use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};

use catsync_dbf::{DbfHeader, DbfReader, FieldDescriptor};

use crate::cli::root_commands::InspectArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

#[derive(Debug, Serialize)]
struct InspectResponse {
    path: String,
    header: DbfHeader,
    fields: Vec<FieldDescriptor>,
    records: Vec<Map<String, Value>>,
    field_errors: usize,
}

/// Handle `catsync inspect`. Never touches the catalog.
pub fn handle(args: &InspectArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = inspect(&args.file, args.limit)?;

    if flags.format == OutputFormat::Table {
        output(&response.header, flags.format)?;
        println!();
        output(&response.fields, flags.format)?;
        println!();
        return output(&response.records, flags.format);
    }
    output(&response, flags.format)
}

fn inspect(path: &str, limit: usize) -> anyhow::Result<InspectResponse> {
    let mut reader =
        DbfReader::open(path).with_context(|| format!("failed to open extract {path}"))?;
    let header = *reader.header();
    let fields = reader.fields().to_vec();

    let mut records = Vec::with_capacity(limit);
    let mut field_errors = 0;
    for raw in reader.records()?.take(limit) {
        let raw = raw.with_context(|| format!("failed to read {path}"))?;
        field_errors += raw.decode_errors.len();
        let row = fields
            .iter()
            .zip(raw.values)
            .map(|(field, value)| Ok((field.name.clone(), serde_json::to_value(value)?)))
            .collect::<anyhow::Result<Map<String, Value>>>()?;
        records.push(row);
    }

    Ok(InspectResponse {
        path: path.to_string(),
        header,
        fields,
        records,
        field_errors,
    })
}

#[cfg(test)]
mod tests {
    use catsync_dbf::builder::DbfBuilder;
    use pretty_assertions::assert_eq;

    use super::inspect;

    #[test]
    fn samples_live_records_by_field_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MP_MER.FPB");
        DbfBuilder::new()
            .field("MERKEY", 'C', 10, 0)
            .field("MERETP", 'N', 10, 2)
            .record(&["1000016", "45.50"])
            .deleted_record(&["1000017", "1.00"])
            .record(&["1000018", "12.00"])
            .record(&["1000019", "9.00"])
            .write_to(&path)
            .unwrap();

        let response = inspect(path.to_str().unwrap(), 2).unwrap();

        assert_eq!(response.header.record_count, 4);
        assert_eq!(response.fields.len(), 2);
        assert_eq!(response.records.len(), 2);
        assert_eq!(response.records[0]["MERKEY"], "1000016");
        assert_eq!(response.records[1]["MERKEY"], "1000018");
        assert_eq!(response.records[0]["MERETP"], 45.5);
    }

    #[test]
    fn unreadable_path_is_reported() {
        let err = inspect("/nonexistent/MP_MER.FPB", 1).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/MP_MER.FPB"));
    }
}
