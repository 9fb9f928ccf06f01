//! Tests for the `#[derive(Entity)]` macro output.
//!
//! These tests verify that the derive macro produces:
//! - the table name (snake_case default or `#[entity(table = "...")]`)
//! - columns in declaration order, with embedded entities flattened in place
//! - primary key flags and renamed columns
//! - a field accessor returning bindable values

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{Audit, EventLog, OrderLine, Staff};
use sqlsynth_core::entity::{describe, EntityMetadataCache};
use sqlsynth_core::{Entity, SqlValue};

fn columns<E: Entity>() -> Vec<&'static str> {
    describe::<E>().columns().iter().map(|c| c.column).collect()
}

// =============================================================================
// Test: Table names
// =============================================================================

#[test]
fn test_default_table_name_is_snake_case() {
    assert_eq!(Staff::descriptor().table(), "staff");
    assert_eq!(EventLog::descriptor().table(), "event_log");
}

#[test]
fn test_custom_table_name() {
    assert_eq!(OrderLine::descriptor().table(), "order_lines");
}

// =============================================================================
// Test: Columns and keys
// =============================================================================

#[test]
fn test_columns_in_declaration_order() {
    assert_eq!(columns::<Staff>(), ["staff_id", "staff_name", "position"]);

    let desc = Staff::descriptor();
    let keys: Vec<_> = desc.primary_keys().map(|c| c.field).collect();
    assert_eq!(keys, ["staff_id"]);
}

#[test]
fn test_composite_key_and_renamed_column() {
    let desc = OrderLine::descriptor();
    let keys: Vec<_> = desc.primary_keys().map(|c| (c.field, c.column)).collect();
    assert_eq!(keys, [("order_id", "order_id"), ("line", "line_no")]);
}

#[test]
fn test_flattened_fields_keep_position_and_are_shadowed() {
    assert_eq!(
        columns::<OrderLine>(),
        ["order_id", "line_no", "quantity", "created_by", "created_on", "remark"]
    );
}

#[test]
fn test_skipped_field_is_not_mapped() {
    assert!(OrderLine::descriptor().find_field("dirty").is_none());
}

#[test]
fn test_entity_without_key() {
    let desc = EventLog::descriptor();
    assert_eq!(desc.primary_keys().count(), 0);
    assert!(desc.require_primary_key("update").is_err());
    assert!(desc.require_columns("insert").is_ok());
}

// =============================================================================
// Test: Field values
// =============================================================================

#[test]
fn test_field_values() {
    let line = OrderLine {
        order_id: 7,
        line: 2,
        quantity: None,
        audit: Audit {
            created_by: Some("ops".into()),
            created_on: NaiveDate::from_ymd_opt(2024, 3, 1),
            note: Some("embedded".into()),
        },
        note: Some("own".into()),
        dirty: true,
    };

    assert_eq!(line.field_value("order_id"), Some(SqlValue::Int(7)));
    assert_eq!(line.field_value("line"), Some(SqlValue::Int(2)));
    assert_eq!(line.field_value("quantity"), Some(SqlValue::Null));
    assert_eq!(line.field_value("created_by"), Some(SqlValue::Text("ops".into())));
    assert_eq!(
        line.field_value("created_on"),
        NaiveDate::from_ymd_opt(2024, 3, 1).map(SqlValue::Date)
    );
    assert_eq!(line.field_value("note"), Some(SqlValue::Text("own".into())));
    assert_eq!(line.field_value("dirty"), None);
    assert_eq!(line.field_value("missing"), None);
}

// =============================================================================
// Test: Descriptor cache
// =============================================================================

#[test]
fn test_describe_is_cached() {
    let first = describe::<Staff>();
    let second = EntityMetadataCache::global().describe::<Staff>();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, Staff::descriptor());
}

#[test]
fn test_staff_values() {
    let staff = Staff::new("1", None, Some("Eng"));
    assert_eq!(staff.field_value("staff_id"), Some(SqlValue::Text("1".into())));
    assert_eq!(staff.field_value("staff_name"), Some(SqlValue::Null));
}
