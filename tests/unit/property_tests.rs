//! Unit tests for the property model and object lifecycle

use rust_sqlddl::compat::ObjectKind;
use rust_sqlddl::model::{
    names, DataFile, Database, FileGroup, Index, IndexType, IndexedColumn, RecoveryModel,
};
use rust_sqlddl::property::{LifecycleState, Property, PropertyBag, Value};
use rust_sqlddl::{DdlError, ScriptingContext, SqlServerVersion};

// ============================================================================
// Two-slot properties
// ============================================================================

#[test]
fn test_pending_value_shadows_committed() {
    let mut property = Property::new("FillFactor");
    property.load(Some(80_i64));
    property.set(90);

    assert_eq!(property.value(), Some(&90));
    assert_eq!(property.committed(), Some(&80));
    assert!(property.is_dirty());
    assert!(property.is_retrieved());
}

#[test]
fn test_discard_restores_committed_value() {
    let mut property = Property::new("PadIndex");
    property.load(Some(false));
    property.set(true);
    property.discard();

    assert_eq!(property.value(), Some(&false));
    assert!(!property.is_dirty());
}

#[test]
fn test_unset_property_is_null() {
    let property: Property<bool> = Property::new("IsUnique");
    assert!(property.is_null());
    assert!(!property.is_dirty());
    assert!(!property.is_retrieved());
}

// ============================================================================
// Gated bag reads
// ============================================================================

#[test]
fn test_bag_typed_reads() {
    let mut bag = PropertyBag::new(ObjectKind::Database);
    bag.set("RecoveryModel", RecoveryModel::Simple);
    bag.set("TargetRecoveryTime", 60_i64);
    let ctx = ScriptingContext::new(SqlServerVersion::Sql160);

    assert_eq!(
        bag.get::<RecoveryModel>("RecoveryModel", &ctx).unwrap(),
        Some(RecoveryModel::Simple)
    );
    assert_eq!(bag.get::<i64>("TargetRecoveryTime", &ctx).unwrap(), Some(60));
    assert_eq!(
        bag.get::<Value>("RecoveryModel", &ctx).unwrap(),
        Some(Value::Text("SIMPLE".to_string()))
    );
}

#[test]
fn test_unsupported_read_fails_instead_of_defaulting() {
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.set(names::BUCKET_COUNT, 1024_i64);
    let ctx = ScriptingContext::new(SqlServerVersion::Sql110);

    let err = bag.get::<i64>(names::BUCKET_COUNT, &ctx).unwrap_err();
    match err {
        DdlError::UnsupportedVersion { target, required, .. } => {
            assert_eq!(target, "Sql110");
            assert_eq!(required, "Sql120");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(bag.get_or(names::BUCKET_COUNT, &ctx, 0_i64).unwrap(), 0);
}

#[test]
fn test_wrong_value_type_is_reported() {
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.set(names::FILL_FACTOR, true);
    let ctx = ScriptingContext::default();

    assert!(matches!(
        bag.get::<i64>(names::FILL_FACTOR, &ctx),
        Err(DdlError::WrongPropertyValue { .. })
    ));
}

#[test]
fn test_commit_and_discard_over_the_bag() {
    let mut bag = PropertyBag::new(ObjectKind::Index);
    bag.load(names::IS_UNIQUE, false);
    bag.set(names::IS_UNIQUE, true);
    bag.set(names::FILL_FACTOR, 70_i64);
    assert!(bag.any_dirty());

    let mut discarded = bag.clone();
    discarded.discard();
    assert!(!discarded.any_dirty());
    let ctx = ScriptingContext::default();
    assert_eq!(discarded.get::<bool>(names::IS_UNIQUE, &ctx).unwrap(), Some(false));

    bag.commit();
    assert!(!bag.any_dirty());
    assert_eq!(bag.get_committed::<i64>(names::FILL_FACTOR, &ctx).unwrap(), Some(70));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_index_lifecycle_transitions() {
    let index = Index::new("IX");
    assert_eq!(index.state(), LifecycleState::Pending);

    let mut index = index
        .with(names::INDEX_TYPE, IndexType::NonClustered)
        .with_column(IndexedColumn::asc("A"));
    assert_eq!(index.state(), LifecycleState::Creating);

    index.mark_created().unwrap();
    assert_eq!(index.state(), LifecycleState::Existing);
    assert!(!index.properties().any_dirty());

    assert!(matches!(
        index.mark_created(),
        Err(DdlError::InvalidOperation { .. })
    ));

    index.mark_for_drop();
    assert_eq!(index.state(), LifecycleState::ToBeDropped);
    index.mark_dropped().unwrap();
    assert_eq!(index.state(), LifecycleState::Dropped);
}

#[test]
fn test_new_object_cannot_be_altered() {
    let mut index = Index::new("IX").with(names::IS_UNIQUE, true);
    assert!(matches!(
        index.mark_altered(),
        Err(DdlError::InvalidOperation { .. })
    ));
}

#[test]
fn test_database_mark_created_settles_children() {
    let mut database = Database::new("Sales")
        .with_filegroup(FileGroup::new("PRIMARY").with_file(DataFile::new("Sales")));
    database.mark_created().unwrap();

    assert_eq!(database.state(), LifecycleState::Existing);
    assert_eq!(database.filegroups[0].state(), LifecycleState::Existing);
    assert_eq!(database.filegroups[0].files[0].state(), LifecycleState::Existing);
}
