//! Tests for profile module

use super::*;
use crate::types::{SemanticType, WriteDisposition};
use arrow::datatypes::DataType;
use pretty_assertions::assert_eq;

const MINIMAL: &str = r#"
name: minimal
kind: backfill
target_table: test.sales
date_field: tgl
collision_check_enabled: true
default_write_policy: append
header_map:
  - { header: " tgl ", field: tgl }
  - { header: "Kode Outlet", field: kode_outlet }
fields:
  - { name: tgl, type: date }
  - { name: kode_outlet, type: text }
"#;

// ============================================================================
// Built-in Profile Tests
// ============================================================================

#[test]
fn test_builtin_profiles_load() {
    for name in list_builtin() {
        let profile = load_profile(name).unwrap();
        assert_eq!(profile.name, name);
    }
}

#[test]
fn test_builtin_alias() {
    assert!(is_builtin("history"));
    let profile = load_profile("history").unwrap();
    assert_eq!(profile.kind, ProfileKind::Backfill);
}

#[test]
fn test_daily_profile_policy() {
    let profile = load_profile("daily").unwrap();
    assert_eq!(profile.kind, ProfileKind::Daily);
    assert_eq!(profile.target_table, "pma.berjalan");
    assert!(profile.date_filter_enabled);
    assert!(!profile.collision_check_enabled);
    assert_eq!(profile.default_write_policy, WriteDisposition::Replace);
    assert_eq!(profile.date_field.as_deref(), Some("tgl"));
    assert_eq!(profile.fields.len(), 21);
}

#[test]
fn test_daily_profile_types() {
    let profile = load_profile("daily").unwrap();

    assert_eq!(profile.field("tgl").unwrap().semantic_type, SemanticType::Date);
    for numeric in ["qty", "value", "value_nett"] {
        assert_eq!(
            profile.field(numeric).unwrap().semantic_type,
            SemanticType::Number
        );
    }
    // Code-like columns stay text even when they look numeric
    for text in ["fc", "bln", "div", "mark", "kode_barang"] {
        assert_eq!(profile.field(text).unwrap().semantic_type, SemanticType::Text);
    }
    assert!(profile.field("pma").unwrap().categorical);
    assert!(profile.field("channel").unwrap().categorical);
    assert!(!profile.field("nama_outlet").unwrap().categorical);
}

#[test]
fn test_backfill_profile_policy() {
    let profile = load_profile("backfill").unwrap();
    assert_eq!(profile.default_write_policy, WriteDisposition::Append);
    assert!(profile.collision_check_enabled);
    assert!(!profile.date_filter_enabled);
    assert_eq!(profile.field_for_header("TANGGAL"), Some("tgl"));
}

#[test]
fn test_master_profile_has_no_date_policy() {
    let profile = load_profile("master").unwrap();
    assert_eq!(profile.kind, ProfileKind::MasterReference);
    assert!(profile.date_field.is_none());
    assert!(profile.date_field_def().is_none());
    assert_eq!(profile.field_for_header("KD OUTLET"), Some("kode_outlet"));
}

#[test]
fn test_unknown_profile_lists_builtins() {
    let err = load_profile("nonexistent").unwrap_err().to_string();
    assert!(err.contains("daily"));
    assert!(err.contains("backfill"));
}

// ============================================================================
// Parsing Tests
// ============================================================================

#[test]
fn test_headers_are_normalized_on_load() {
    let profile = load_profile_from_str(MINIMAL).unwrap();
    assert_eq!(profile.field_for_header("TGL"), Some("tgl"));
    assert_eq!(profile.field_for_header("KODE OUTLET"), Some("kode_outlet"));
    assert_eq!(profile.field_for_header("Kode Outlet"), None);
}

#[test]
fn test_profile_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, MINIMAL).unwrap();

    let profile = load_profile(&path).unwrap();
    assert_eq!(profile.name, "minimal");
    assert!(!profile.day_first);
}

#[test]
fn test_arrow_schema_is_fixed() {
    let profile = load_profile_from_str(MINIMAL).unwrap();
    let schema = profile.arrow_schema();

    assert_eq!(schema.fields().len(), 2);
    assert_eq!(schema.field(0).name(), "tgl");
    assert_eq!(schema.field(0).data_type(), &DataType::Date32);
    assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
    assert!(schema.fields().iter().all(|f| f.is_nullable()));
}

#[test]
fn test_field_index_follows_declaration_order() {
    let profile = load_profile("daily").unwrap();
    assert_eq!(profile.field_index("tgl"), Some(0));
    assert_eq!(profile.field_index("div"), Some(20));
    assert_eq!(profile.field_index("notes"), None);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_duplicate_field_names_rejected() {
    let yaml = MINIMAL.replace("{ name: kode_outlet, type: text }", "{ name: tgl, type: text }");
    let err = load_profile_from_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate field names"));
}

#[test]
fn test_mapping_to_undeclared_field_rejected() {
    let yaml = MINIMAL.replace("field: kode_outlet", "field: outlet");
    let err = load_profile_from_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("undeclared field 'outlet'"));
}

#[test]
fn test_duplicate_normalized_header_rejected() {
    let yaml = MINIMAL.replace("\"Kode Outlet\"", "\"TGL\"");
    let err = load_profile_from_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn test_date_field_must_be_date_typed() {
    let yaml = MINIMAL.replace("date_field: tgl", "date_field: kode_outlet");
    let err = load_profile_from_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("must have type date"));
}

#[test]
fn test_date_policy_requires_date_field() {
    let yaml = MINIMAL.replace("date_field: tgl\n", "");
    let err = load_profile_from_str(&yaml).unwrap_err();
    assert!(err.to_string().contains("no date_field"));
}

#[test]
fn test_empty_fields_rejected() {
    let profile = SchemaProfile {
        fields: vec![],
        header_map: vec![],
        ..load_profile_from_str(MINIMAL).unwrap()
    };
    assert!(validate_profile(&profile).is_err());
}

#[test]
fn test_field_def_builder() {
    let field = FieldDef::new("pma", SemanticType::Text).categorical();
    assert!(field.categorical);
    assert_eq!(field.arrow_field().data_type(), &DataType::Utf8);
}

#[test]
fn test_normalize_header() {
    assert_eq!(normalize_header("  Kode Outlet "), "KODE OUTLET");
    assert_eq!(normalize_header("value nett"), "VALUE NETT");
}
