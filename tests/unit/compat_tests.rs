//! Unit tests for the compatibility gate

use rust_sqlddl::compat::{self, ObjectKind};
use rust_sqlddl::{EngineEdition, EngineType, ScriptingContext, SqlServerVersion};

fn ctx(version: SqlServerVersion, engine: EngineType) -> ScriptingContext {
    ScriptingContext::new(version).with_engine_type(engine)
}

#[test]
fn test_index_properties_follow_release_history() {
    let cases = [
        ("FilterDefinition", SqlServerVersion::Sql100),
        ("IndexedXmlPathName", SqlServerVersion::Sql110),
        ("BucketCount", SqlServerVersion::Sql120),
        ("CompressionDelay", SqlServerVersion::Sql130),
        ("IsOptimizedForSequentialKey", SqlServerVersion::Sql150),
        ("HasXmlCompressedPartitions", SqlServerVersion::Sql160),
    ];
    for (property, introduced) in cases {
        assert_eq!(compat::min_version(ObjectKind::Index, property), Some(introduced));
        let older = SqlServerVersion::from_ordinal(introduced.ordinal() - 10).unwrap();
        assert!(
            !compat::is_supported(ObjectKind::Index, property, &ScriptingContext::new(older)),
            "{} should be gated out on {}",
            property,
            older
        );
        assert!(compat::is_supported(
            ObjectKind::Index,
            property,
            &ScriptingContext::new(introduced)
        ));
    }
}

#[test]
fn test_storage_objects_are_on_premises_only() {
    for kind in [ObjectKind::FileGroup, ObjectKind::DataFile, ObjectKind::LogFile] {
        assert!(compat::is_object_supported(
            kind,
            &ctx(SqlServerVersion::Sql160, EngineType::Standalone)
        ));
        assert!(compat::is_object_supported(
            kind,
            &ctx(SqlServerVersion::Sql160, EngineType::ManagedInstance)
        ));
        assert!(!compat::is_object_supported(
            kind,
            &ctx(SqlServerVersion::Sql160, EngineType::CloudDatabase)
        ));
    }
    assert!(compat::is_object_supported(
        ObjectKind::Index,
        &ctx(SqlServerVersion::Sql160, EngineType::CloudDataWarehouse)
    ));
}

#[test]
fn test_database_options_by_engine_type() {
    let standalone = ctx(SqlServerVersion::Sql160, EngineType::Standalone);
    let managed = ctx(SqlServerVersion::Sql160, EngineType::ManagedInstance);
    let cloud = ctx(SqlServerVersion::Sql160, EngineType::CloudDatabase);

    assert!(compat::is_supported(ObjectKind::Database, "AcceleratedRecoveryEnabled", &standalone));
    assert!(!compat::is_supported(ObjectKind::Database, "AcceleratedRecoveryEnabled", &managed));
    assert!(compat::is_supported(ObjectKind::Database, "IsReadCommittedSnapshotOn", &cloud));
    assert!(!compat::is_supported(ObjectKind::Database, "PageVerify", &cloud));
    assert!(!compat::is_supported(ObjectKind::Database, "AzureEdition", &standalone));
}

#[test]
fn test_edition_does_not_matter_for_ungated_entries() {
    let express = ScriptingContext::new(SqlServerVersion::Sql160).with_edition(EngineEdition::Express);
    assert!(compat::is_supported(ObjectKind::Index, "FillFactor", &express));
    assert_eq!(compat::entry(ObjectKind::Index, "FillFactor"), None);
}
