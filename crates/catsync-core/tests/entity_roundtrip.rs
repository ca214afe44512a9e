//! Serde roundtrip and JsonSchema validation tests for all entity types.

use chrono::{NaiveDate, Utc};
use schemars::schema_for;
use catsync_core::changes::ChangeEvent;
use catsync_core::entities::*;
use catsync_core::enums::*;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

roundtrip_and_validate!(
    product_roundtrip,
    ProductSnapshot,
    ProductSnapshot {
        product_key: "1000016".into(),
        description: "WHITE BREAD 350G".into(),
        active: true,
        data_quality: DataQuality::NeedsDescription,
        needs_enrichment: true,
        enrichment_notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    price_roundtrip,
    PriceRecord,
    PriceRecord {
        id: 7,
        product_key: "1000016".into(),
        price_retail: 45.5,
        price_case: Some(520.0),
        price_pack: None,
        cost: Some(38.25),
        effective_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        is_current: true,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    barcode_roundtrip,
    BarcodeRecord,
    BarcodeRecord {
        product_key: "1000016".into(),
        barcode: "4800016000123".into(),
        is_primary: true,
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    sync_run_roundtrip,
    SyncRun,
    SyncRun {
        id: 3,
        sync_type: "CATALOG_SYNC".into(),
        source_file: "MP_MER.FPB".into(),
        status: SyncStatus::Failed,
        counters: SyncCounters {
            processed: 12,
            added: 1,
            updated: 2,
            skipped: 3,
            activated: 0,
            deactivated: 4,
        },
        error_message: Some("Interrupted by crash before completion".into()),
        started_at: Utc::now(),
        completed_at: Some(Utc::now()),
    }
);

roundtrip_and_validate!(
    description_change_roundtrip,
    ChangeEvent,
    ChangeEvent::DescriptionChange {
        product_key: "1000016".into(),
        old_description: "WHITE BREAD 350G".into(),
        new_description: "WHITE BREAD 400G".into(),
    }
);

roundtrip_and_validate!(
    price_change_roundtrip,
    ChangeEvent,
    ChangeEvent::PriceChange {
        product_key: "1000016".into(),
        description: "WHITE BREAD 350G".into(),
        old_price: 45.5,
        new_price: 48.0,
    }
);

roundtrip_and_validate!(
    fingerprint_roundtrip,
    SourceFingerprint,
    SourceFingerprint {
        sync_type: "CATALOG_SYNC".into(),
        source_path: "/data/MP_MER.FPB".into(),
        size_bytes: 7_340_032,
        modified_at: Utc::now(),
        recorded_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    catalog_stats_roundtrip,
    CatalogStats,
    CatalogStats {
        products: 70_000,
        active_products: 65_000,
        needs_enrichment: 1_200,
        current_prices: 70_000,
        barcodes: 81_000,
    }
);
