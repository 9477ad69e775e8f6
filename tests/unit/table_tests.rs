//! Unit tests for ordering the index statements of one table

use pretty_assertions::assert_eq;
use rust_sqlddl::model::{names, Index, IndexType, IndexedColumn, SecondaryXmlIndexType};
use rust_sqlddl::{script_table_indexes, DdlError, SqlServerVersion, TableSnapshot};

use crate::common::{orders, single_line, table_t};

fn to_drop(name: &str, clustered: bool) -> Index {
    let mut index = Index::existing(name).with_column(IndexedColumn::asc("Id"));
    index.load(names::IS_CLUSTERED, clustered);
    index.mark_for_drop();
    index
}

fn snapshot() -> TableSnapshot {
    let mut altered = Index::existing("IX_Alter").with_column(IndexedColumn::asc("Id"));
    altered.load(names::DISALLOW_PAGE_LOCKS, false);
    altered.set(names::DISALLOW_PAGE_LOCKS, true);

    let mut gone = to_drop("IX_Gone", false);
    gone.mark_dropped().unwrap();

    TableSnapshot::new(orders())
        .with_index(altered)
        .with_index(
            Index::new("SXML")
                .with_column(IndexedColumn::new("Doc"))
                .with(names::PARENT_XML_INDEX, "PXML".to_string())
                .with(names::SECONDARY_XML_INDEX_TYPE, SecondaryXmlIndexType::Value),
        )
        .with_index(Index::new("PXML").with_column(IndexedColumn::new("Doc")))
        .with_index(Index::new("IX_New").with_column(IndexedColumn::asc("Id")))
        .with_index(to_drop("CIX_Old", true))
        .with_index(
            Index::new("CIX")
                .with(names::IS_CLUSTERED, true)
                .with_column(IndexedColumn::asc("Id")),
        )
        .with_index(to_drop("IX_Old", false))
        .with_index(gone)
}

#[test]
fn test_drops_then_creates_by_rank_then_alters() {
    let statements = script_table_indexes(&snapshot(), &single_line(SqlServerVersion::Sql160)).unwrap();

    assert_eq!(statements.len(), 21);
    assert_eq!(statements[0], "DROP INDEX [IX_Old] ON [dbo].[Orders]");
    assert_eq!(statements[1], "DROP INDEX [CIX_Old] ON [dbo].[Orders]");
    assert_eq!(statements[2], "CREATE CLUSTERED INDEX [CIX] ON [dbo].[Orders] ([Id] ASC)");
    assert_eq!(statements[3], "CREATE NONCLUSTERED INDEX [IX_New] ON [dbo].[Orders] ([Id] ASC)");
    assert_eq!(statements[4], "SET ARITHABORT ON");
    assert_eq!(statements[11], "CREATE PRIMARY XML INDEX [PXML] ON [dbo].[Orders] ([Doc])");
    assert_eq!(
        statements[19],
        "CREATE XML INDEX [SXML] ON [dbo].[Orders] ([Doc]) USING XML INDEX [PXML] FOR VALUE"
    );
    assert_eq!(
        statements[20],
        "ALTER INDEX [IX_Alter] ON [dbo].[Orders] SET (ALLOW_PAGE_LOCKS = OFF)"
    );
}

#[test]
fn test_unchanged_table_scripts_nothing() {
    let snapshot = TableSnapshot::new(table_t())
        .with_index(Index::existing("IX1").with_column(IndexedColumn::asc("Col1")));
    let statements = script_table_indexes(&snapshot, &single_line(SqlServerVersion::Sql160)).unwrap();
    assert!(statements.is_empty());
}

#[test]
fn test_first_failure_aborts_the_table() {
    let snapshot = TableSnapshot::new(table_t())
        .with_index(Index::new("IX1").with_column(IndexedColumn::asc("Col1")))
        .with_index(
            Index::new("IX_H")
                .with(names::INDEX_TYPE, IndexType::NonClusteredHash)
                .with_column(IndexedColumn::new("Id")),
        );
    assert!(matches!(
        script_table_indexes(&snapshot, &single_line(SqlServerVersion::Sql160)),
        Err(DdlError::ConflictingProperties { .. })
    ));
}

#[test]
fn test_snapshot_lookup_by_name() {
    let snapshot = snapshot();
    assert!(snapshot.index("PXML").is_some());
    assert!(snapshot.index("Nope").is_none());
}
