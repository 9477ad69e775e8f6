//! Unit tests for the clause builder

use pretty_assertions::assert_eq;
use rust_sqlddl::compat::ObjectKind;
use rust_sqlddl::property::{PropertyBag, Value};
use rust_sqlddl::{
    ClauseBuilder, ClauseValue, DdlError, ScriptMode, ScriptingContext, SqlServerVersion,
    Termination,
};

fn index_bag() -> PropertyBag {
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.load("FillFactor", 80_i64);
    bag.load("PadIndex", true);
    bag.set("IsOptimizedForSequentialKey", true);
    bag
}

fn fill_factor(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) if *n > 0 => Some(n.to_string()),
        _ => None,
    }
}

#[test]
fn test_fragments_keep_call_order_and_separator() {
    let ctx = ScriptingContext::new(SqlServerVersion::Sql160);
    let bag = index_bag();
    let mut clause = ClauseBuilder::new(&ctx);
    clause
        .try_emit(&bag, "FillFactor", "FILLFACTOR", ClauseValue::Formatted(&fill_factor), true, None)
        .unwrap();
    clause.try_emit_on_off(&bag, "PadIndex", "PAD_INDEX").unwrap();
    clause.push_option("MAXDOP", 4);

    assert_eq!(clause.len(), 3);
    assert_eq!(
        clause.finish("WITH (", ")").as_deref(),
        Some("WITH (FILLFACTOR = 80, PAD_INDEX = ON, MAXDOP = 4)")
    );
}

#[test]
fn test_gated_property_is_skipped_silently() {
    let ctx = ScriptingContext::new(SqlServerVersion::Sql140);
    let bag = index_bag();
    let mut clause = ClauseBuilder::new(&ctx);
    let emitted = clause
        .try_emit_on_off(&bag, "IsOptimizedForSequentialKey", "OPTIMIZE_FOR_SEQUENTIAL_KEY")
        .unwrap();

    assert!(!emitted);
    assert!(clause.is_empty());
}

#[test]
fn test_direct_execution_sends_only_changes() {
    let ctx = ScriptingContext::new(SqlServerVersion::Sql160).with_mode(ScriptMode::ForDirectExecution);
    let bag = index_bag();
    let mut clause = ClauseBuilder::new(&ctx);
    clause.try_emit_on_off(&bag, "PadIndex", "PAD_INDEX").unwrap();
    clause
        .try_emit_on_off(&bag, "IsOptimizedForSequentialKey", "OPTIMIZE_FOR_SEQUENTIAL_KEY")
        .unwrap();

    assert_eq!(
        clause.into_fragments(),
        vec!["OPTIMIZE_FOR_SEQUENTIAL_KEY = ON".to_string()]
    );
}

#[test]
fn test_formatter_returning_none_suppresses_fragment() {
    let ctx = ScriptingContext::default();
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.set("FillFactor", 0_i64);
    let mut clause = ClauseBuilder::new(&ctx);
    let emitted = clause
        .try_emit(&bag, "FillFactor", "FILLFACTOR", ClauseValue::Formatted(&fill_factor), true, None)
        .unwrap();

    assert!(!emitted);
    assert_eq!(clause.finish("WITH (", ")"), None);
}

#[test]
fn test_switch_on_non_boolean_is_an_error() {
    let ctx = ScriptingContext::default();
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.set("PadIndex", 1_i64);
    let mut clause = ClauseBuilder::new(&ctx);

    assert!(matches!(
        clause.try_emit_on_off(&bag, "PadIndex", "PAD_INDEX"),
        Err(DdlError::WrongPropertyValue { .. })
    ));
}

#[test]
fn test_keyword_without_equals_and_termination() {
    let ctx = ScriptingContext::default();
    let mut bag = PropertyBag::new(ObjectKind::Database);
    bag.set("IsReadCommittedSnapshotOn", true);
    let mut clause = ClauseBuilder::new(&ctx);
    let termination = Termination::rollback_after(10).unwrap();
    clause
        .try_emit(
            &bag,
            "IsReadCommittedSnapshotOn",
            "READ_COMMITTED_SNAPSHOT",
            ClauseValue::ON_OFF,
            false,
            Some(&termination),
        )
        .unwrap();

    assert_eq!(
        clause.body().as_deref(),
        Some("READ_COMMITTED_SNAPSHOT ON WITH ROLLBACK AFTER 10 SECONDS")
    );
}

#[test]
fn test_custom_separator_and_extend() {
    let ctx = ScriptingContext::default();
    let mut grids = ClauseBuilder::with_separator(&ctx, ",");
    grids.push_option("LEVEL_1", "LOW");
    grids.push_option("LEVEL_2", "HIGH");

    let mut outer = ClauseBuilder::new(&ctx);
    outer.push_raw("BOUNDING_BOX = (0, 0, 1, 1)");
    assert_eq!(grids.body().as_deref(), Some("LEVEL_1 = LOW,LEVEL_2 = HIGH"));
    outer.extend(grids);
    assert_eq!(outer.len(), 3);
}

#[test]
fn test_termination_rendering() {
    assert_eq!(Termination::NoWait.to_string(), "WITH NO_WAIT");
    assert_eq!(
        Termination::RollbackImmediate.to_string(),
        "WITH ROLLBACK IMMEDIATE"
    );
}
