//! Unit tests for snapshot documents

use rust_sqlddl::model::{
    file_names, names, TableRef, DataFile, Database, FileGroup, Index, IndexType, IndexedColumn,
    RecoveryModel, SelectivePath, XmlNamespace,
};
use rust_sqlddl::property::LifecycleState;
use rust_sqlddl::snapshot::{parse_snapshot, write_snapshot_to_string};
use rust_sqlddl::{
    read_snapshot, save_snapshot, script_table_indexes, DatabaseScripter, DdlError, Snapshot,
    SqlServerVersion, TableSnapshot,
};
use tempfile::TempDir;

use crate::common::{orders, single_line};

fn changed_database() -> Database {
    let mut file = DataFile::existing("Sales");
    file.load(file_names::FILE_NAME, r"C:\d\Sales.mdf".to_string());
    file.load(file_names::SIZE, 8192.0_f64);
    file.set(file_names::SIZE, 16384.0_f64);
    let mut database =
        Database::existing("Sales").with_filegroup(FileGroup::existing("PRIMARY").with_file(file));
    database.load("RecoveryModel", RecoveryModel::Full);
    database.set("RecoveryModel", RecoveryModel::Simple);
    database
}

fn table_with_changes() -> TableSnapshot {
    let mut old = Index::existing("IX_Old").with_column(IndexedColumn::asc("Id"));
    old.mark_for_drop();

    let mut selective = Index::new("SXI")
        .with(names::INDEX_TYPE, IndexType::SelectiveXml)
        .with_column(IndexedColumn::new("Doc"));
    selective.xml_namespaces.push(XmlNamespace::new("ns", "http://x"));
    selective
        .selective_paths
        .push(SelectivePath::xquery("pathab", "/a/b").typed("xs:string", Some(20)).singleton());
    selective.selective_paths.push(SelectivePath::sql("total", "/a/t", "int"));

    TableSnapshot::new(orders())
        .with_index(old)
        .with_index(Index::new("IX_New").with_column(IndexedColumn::desc("Id")))
        .with_index(selective)
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_database_survives_a_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sales.xml");
    let original = changed_database();

    save_snapshot(&path, &Snapshot::Database(original.clone())).unwrap();
    let restored = read_snapshot(&path).unwrap().into_database().unwrap();

    let ctx = single_line(SqlServerVersion::Sql160);
    let expected = DatabaseScripter::new(&original, &ctx).script_alter(None).unwrap();
    assert_eq!(expected.len(), 3);
    assert_eq!(
        DatabaseScripter::new(&restored, &ctx).script_alter(None).unwrap(),
        expected
    );
}

#[test]
fn test_table_survives_a_string_round_trip() {
    let original = table_with_changes();
    let text = write_snapshot_to_string(&Snapshot::Table(original.clone())).unwrap();
    let restored = parse_snapshot(&text).unwrap().into_table().unwrap();

    assert_eq!(restored.table.full_name(), "[dbo].[Orders]");
    assert_eq!(restored.indexes.len(), 3);
    assert_eq!(restored.indexes[0].state(), LifecycleState::ToBeDropped);

    let ctx = single_line(SqlServerVersion::Sql160);
    assert_eq!(
        script_table_indexes(&restored, &ctx).unwrap(),
        script_table_indexes(&original, &ctx).unwrap()
    );
}

#[test]
fn test_pending_values_are_written_beside_committed_ones() {
    let text = write_snapshot_to_string(&Snapshot::Database(changed_database())).unwrap();

    assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(text.contains(r#"<Property Name="RecoveryModel" Value="FULL" Pending="SIMPLE"/>"#));
    assert!(text.contains(r#"<FileGroup Name="PRIMARY" State="Existing">"#));
}

#[test]
fn test_untouched_objects_keep_their_pending_state() {
    let mut database = Database::existing("Sales");
    database.filegroups.push(FileGroup::new("FG2"));
    let text = write_snapshot_to_string(&Snapshot::Database(database)).unwrap();
    let restored = parse_snapshot(&text).unwrap().into_database().unwrap();
    assert_eq!(restored.state(), LifecycleState::Existing);
    assert_eq!(restored.filegroups[0].state(), LifecycleState::Pending);

    let table = TableSnapshot::new(orders()).with_index(Index::new("IX_P"));
    let text = write_snapshot_to_string(&Snapshot::Table(table)).unwrap();
    let restored = parse_snapshot(&text).unwrap().into_table().unwrap();
    assert_eq!(restored.index("IX_P").unwrap().state(), LifecycleState::Pending);
}

#[test]
fn test_dropped_children_are_left_out() {
    let mut gone = Index::existing("IX_Gone").with_column(IndexedColumn::asc("Id"));
    gone.mark_for_drop();
    gone.mark_dropped().unwrap();
    let table = TableSnapshot::new(orders())
        .with_index(gone)
        .with_index(Index::existing("IX_Kept").with_column(IndexedColumn::asc("Id")));

    let text = write_snapshot_to_string(&Snapshot::Table(table)).unwrap();
    assert!(!text.contains("IX_Gone"));

    let restored = parse_snapshot(&text).unwrap().into_table().unwrap();
    assert_eq!(restored.indexes.len(), 1);
    assert!(restored.index("IX_Gone").is_none());
    assert_eq!(restored.indexes[0].state(), LifecycleState::Existing);
}

#[test]
fn test_dropped_root_is_not_written() {
    let table = TableSnapshot::new(
        TableRef::table("dbo", "T").with_state(LifecycleState::Dropped),
    );
    assert!(write_snapshot_to_string(&Snapshot::Table(table)).is_err());
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_reads_table_attributes_and_columns() {
    let snapshot = parse_snapshot(
        r#"<Table Schema="dbo" Name="People" Graph="Node" MemoryOptimized="true">
             <Column Name="graph_id_1" Type="bigint" GraphType="GraphId"/>
             <Column Name="Total" Type="money" Computed="true"/>
             <Index Name="IX" State="Creating">
               <Property Name="IndexType" Pending="NonClusteredHash"/>
               <IndexedColumn Name="Total" Descending="false"/>
             </Index>
           </Table>"#,
    )
    .unwrap();
    let table = snapshot.into_table().unwrap();

    assert!(table.table.is_node);
    assert!(table.table.memory_optimized);
    assert!(table.table.column("Total").unwrap().is_computed);
    let index = table.index("IX").unwrap();
    assert_eq!(index.state(), LifecycleState::Creating);
    assert!(index.properties().is_dirty(names::INDEX_TYPE));
    assert_eq!(index.columns[0].descending, Some(false));
}

#[test]
fn test_dropped_objects_are_rejected() {
    let err = parse_snapshot(r#"<Database Name="Sales" State="Dropped"/>"#).unwrap_err();
    assert!(matches!(err, DdlError::InvalidSnapshot { .. }));
}

#[test]
fn test_missing_name_is_rejected() {
    let err = parse_snapshot(r#"<Database><FileGroup State="Existing"/></Database>"#).unwrap_err();
    match err {
        DdlError::InvalidSnapshot { message } => assert!(message.contains("Name")),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_bad_attribute_value_is_rejected() {
    let err = parse_snapshot(r#"<Table Schema="dbo" Name="T" Distribution="Sideways"/>"#).unwrap_err();
    assert!(matches!(err, DdlError::InvalidSnapshot { .. }));
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let err = read_snapshot(&dir.path().join("absent.xml")).unwrap_err();
    assert!(matches!(err, DdlError::SnapshotRead { .. }));
}
