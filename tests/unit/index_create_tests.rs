//! Unit tests for index create and inline scripting

use pretty_assertions::assert_eq;
use rust_sqlddl::model::{
    names, Column, Index, IndexKeyType, IndexType, IndexedColumn, SecondaryXmlIndexType,
    SelectivePath, SpatialIndexType, TableRef, XmlNamespace,
};
use rust_sqlddl::{DdlError, IndexScripter, IndexVariant, ScriptingContext, SqlServerVersion};

use crate::common::{guarded, hot_table, orders, people, single_line, table_t};

fn create(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Vec<String> {
    IndexScripter::new(index, parent, ctx).script_create().unwrap()
}

fn create_err(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> DdlError {
    IndexScripter::new(index, parent, ctx).script_create().unwrap_err()
}

// ============================================================================
// Regular indexes
// ============================================================================

#[test]
fn test_unique_nonclustered_index() {
    let index = Index::new("IX1")
        .with(names::IS_UNIQUE, true)
        .with_column(IndexedColumn::asc("Col1"));
    let ctx = single_line(SqlServerVersion::Sql130);

    assert_eq!(
        create(&index, &table_t(), &ctx),
        vec!["CREATE UNIQUE NONCLUSTERED INDEX [IX1] ON [dbo].[T] ([Col1] ASC)".to_string()]
    );
}

#[test]
fn test_multi_line_layout() {
    let index = Index::new("IX1")
        .with(names::IS_UNIQUE, true)
        .with_column(IndexedColumn::asc("Col1"));
    let ctx = ScriptingContext::new(SqlServerVersion::Sql130);

    assert_eq!(
        create(&index, &table_t(), &ctx),
        vec!["CREATE UNIQUE NONCLUSTERED INDEX [IX1] ON [dbo].[T]\n(\n\t[Col1] ASC\n)".to_string()]
    );
}

#[test]
fn test_included_columns_filter_options_and_filegroup() {
    let index = Index::new("IX2")
        .with_column(IndexedColumn::asc("Col1"))
        .with_column(IndexedColumn::included("Col2"))
        .with(names::FILTER_DEFINITION, "([Col1] > 0)".to_string())
        .with(names::FILL_FACTOR, 80_i64)
        .with(names::PAD_INDEX, true)
        .with(names::FILE_GROUP, "FG1".to_string());
    let ctx = single_line(SqlServerVersion::Sql130);

    assert_eq!(
        create(&index, &table_t(), &ctx),
        vec![
            "CREATE NONCLUSTERED INDEX [IX2] ON [dbo].[T] ([Col1] ASC) INCLUDE([Col2]) \
             WHERE ([Col1] > 0) WITH (PAD_INDEX = ON, FILLFACTOR = 80) ON [FG1]"
                .to_string()
        ]
    );
}

#[test]
fn test_filter_on_clustered_index_is_rejected() {
    let index = Index::new("CIX")
        .with(names::IS_CLUSTERED, true)
        .with_column(IndexedColumn::asc("Col1"))
        .with(names::FILTER_DEFINITION, "([Col1] > 0)".to_string());
    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSupported { .. }));
}

#[test]
fn test_newer_option_is_dropped_for_older_targets() {
    let index = Index::new("IX")
        .with_column(IndexedColumn::asc("Col1"))
        .with(names::OPTIMIZE_FOR_SEQUENTIAL_KEY, true);

    assert_eq!(
        create(&index, &table_t(), &single_line(SqlServerVersion::Sql140)),
        vec!["CREATE NONCLUSTERED INDEX [IX] ON [dbo].[T] ([Col1] ASC)".to_string()]
    );
    assert_eq!(
        create(&index, &table_t(), &single_line(SqlServerVersion::Sql150)),
        vec![
            "CREATE NONCLUSTERED INDEX [IX] ON [dbo].[T] ([Col1] ASC) \
             WITH (OPTIMIZE_FOR_SEQUENTIAL_KEY = ON)"
                .to_string()
        ]
    );
}

#[test]
fn test_disabled_index_is_disabled_after_create() {
    let index = Index::new("IX1")
        .with_column(IndexedColumn::asc("Col1"))
        .with(names::IS_DISABLED, true);
    let script = create(&index, &table_t(), &single_line(SqlServerVersion::Sql130));

    assert_eq!(script.len(), 2);
    assert_eq!(script[1], "ALTER INDEX [IX1] ON [dbo].[T] DISABLE");
}

#[test]
fn test_existence_guard_on_create() {
    let index = Index::new("IX1").with_column(IndexedColumn::asc("Col1"));
    let script = create(&index, &table_t(), &guarded(SqlServerVersion::Sql130));

    assert_eq!(
        script,
        vec![
            "IF NOT EXISTS (SELECT * FROM sys.indexes WHERE object_id = OBJECT_ID(N'[dbo].[T]') \
             AND name = N'IX1') CREATE NONCLUSTERED INDEX [IX1] ON [dbo].[T] ([Col1] ASC)"
                .to_string()
        ]
    );
}

#[test]
fn test_session_options_precede_index_on_computed_column() {
    let index = Index::new("IX_Total").with_column(IndexedColumn::asc("Total"));
    let script = create(&index, &orders(), &single_line(SqlServerVersion::Sql130));

    assert_eq!(script.len(), 8);
    assert_eq!(script[0], "SET ARITHABORT ON");
    assert_eq!(script[6], "SET NUMERIC_ROUNDABORT OFF");
    assert!(script[7].starts_with("CREATE NONCLUSTERED INDEX [IX_Total]"));
}

#[test]
fn test_ansi_padding_column_gets_single_set() {
    let index = Index::new("IX_Code").with_column(IndexedColumn::asc("Code"));
    let script = create(&index, &orders(), &single_line(SqlServerVersion::Sql130));

    assert_eq!(script.len(), 2);
    assert_eq!(script[0], "SET ANSI_PADDING ON");
}

#[test]
fn test_graph_pseudo_column() {
    let index = Index::new("IX_Node")
        .with_column(IndexedColumn::asc("graph_id_1"))
        .with_column(IndexedColumn::asc("$node_id_1"));

    assert_eq!(
        create(&index, &people(), &single_line(SqlServerVersion::Sql150)),
        vec!["CREATE NONCLUSTERED INDEX [IX_Node] ON [dbo].[People] ($node_id)".to_string()]
    );
}

#[test]
fn test_graph_pseudo_column_followed_by_plain_column() {
    let index = Index::new("IX_Node")
        .with_column(IndexedColumn::asc("graph_id_1"))
        .with_column(IndexedColumn::asc("$node_id_1"))
        .with_column(IndexedColumn::asc("Name"));

    assert_eq!(
        create(&index, &people(), &single_line(SqlServerVersion::Sql150)),
        vec!["CREATE NONCLUSTERED INDEX [IX_Node] ON [dbo].[People] ($node_id, [Name] ASC)".to_string()]
    );
}

#[test]
fn test_graph_column_last_in_list_misses_companion() {
    let index = Index::new("IX_Node")
        .with_column(IndexedColumn::asc("Name"))
        .with_column(IndexedColumn::asc("graph_id_1"));
    let err = create_err(&index, &people(), &single_line(SqlServerVersion::Sql150));

    match err {
        DdlError::ExpectedGraphColumnNotFound { column, .. } => assert_eq!(column, "graph_id_1"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_graph_column_followed_by_wrong_companion() {
    let index = Index::new("IX_Node")
        .with_column(IndexedColumn::asc("graph_id_1"))
        .with_column(IndexedColumn::asc("Name"));
    assert!(matches!(
        create_err(&index, &people(), &single_line(SqlServerVersion::Sql150)),
        DdlError::ExpectedGraphColumnNotFound { .. }
    ));
}

#[test]
fn test_graph_column_without_companion() {
    let index = Index::new("IX_Node").with_column(IndexedColumn::asc("graph_id_1"));
    let err = create_err(&index, &people(), &single_line(SqlServerVersion::Sql150));

    match err {
        DdlError::ExpectedGraphColumnNotFound { column, .. } => assert_eq!(column, "graph_id_1"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_index_without_columns_is_reported() {
    let index = Index::new("IX").with(names::INDEX_TYPE, IndexType::NonClustered);
    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSet { .. }));
}

// ============================================================================
// Constraints
// ============================================================================

fn primary_key(name: &str) -> Index {
    Index::new(name)
        .with(names::INDEX_KEY_TYPE, IndexKeyType::PrimaryKey)
        .with_column(IndexedColumn::asc("Id"))
}

#[test]
fn test_primary_key_constraint() {
    let ctx = single_line(SqlServerVersion::Sql130);
    assert_eq!(
        create(&primary_key("PK_T"), &table_t(), &ctx),
        vec!["ALTER TABLE [dbo].[T] ADD CONSTRAINT [PK_T] PRIMARY KEY ([Id] ASC)".to_string()]
    );

    let clustered = primary_key("PK_T").with(names::IS_CLUSTERED, true);
    assert_eq!(
        create(&clustered, &table_t(), &ctx),
        vec![
            "ALTER TABLE [dbo].[T] ADD CONSTRAINT [PK_T] PRIMARY KEY CLUSTERED ([Id] ASC)"
                .to_string()
        ]
    );
}

#[test]
fn test_system_named_constraint_omits_name() {
    let index = primary_key("PK__T__3214EC07A1B2C3D4").with(names::IS_CLUSTERED, true);
    assert_eq!(
        create(&index, &table_t(), &single_line(SqlServerVersion::Sql130)),
        vec!["ALTER TABLE [dbo].[T] ADD PRIMARY KEY CLUSTERED ([Id] ASC)".to_string()]
    );
}

#[test]
fn test_inline_constraint() {
    let index = primary_key("PK_T").with(names::IS_CLUSTERED, true);
    let table = table_t();
    let scripter = IndexScripter::new(&index, &table, &single_line(SqlServerVersion::Sql130));

    assert_eq!(scripter.variant().unwrap(), IndexVariant::Constraint);
    assert_eq!(
        scripter.script_inline().unwrap(),
        "CONSTRAINT [PK_T] PRIMARY KEY CLUSTERED ([Id] ASC)"
    );
}

#[test]
fn test_plain_index_cannot_claim_system_name() {
    let index = Index::new("IX")
        .with(names::INDEX_TYPE, IndexType::NonClustered)
        .with(names::IS_SYSTEM_NAMED, true)
        .with_column(IndexedColumn::asc("Col1"));
    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSet { .. }));
}

// ============================================================================
// Columnstore
// ============================================================================

#[test]
fn test_clustered_columnstore_needs_sql120() {
    let index = Index::new("CCI").with(names::INDEX_TYPE, IndexType::ClusteredColumnstore);

    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql100));
    assert!(matches!(err, DdlError::UnsupportedVersion { .. }));

    assert_eq!(
        create(&index, &table_t(), &single_line(SqlServerVersion::Sql120)),
        vec!["CREATE CLUSTERED COLUMNSTORE INDEX [CCI] ON [dbo].[T]".to_string()]
    );
}

#[test]
fn test_columnstore_rejects_fill_factor() {
    let index = Index::new("NCCI")
        .with(names::INDEX_TYPE, IndexType::NonClusteredColumnstore)
        .with_column(IndexedColumn::new("Col1"))
        .with(names::FILL_FACTOR, 80_i64);
    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSupported { .. }));
}

// ============================================================================
// XML and spatial
// ============================================================================

#[test]
fn test_primary_and_secondary_xml() {
    let ctx = single_line(SqlServerVersion::Sql130);
    let primary = Index::new("PXML_Doc").with_column(IndexedColumn::new("Doc"));
    let script = create(&primary, &orders(), &ctx);
    assert_eq!(script.len(), 8);
    assert_eq!(script[7], "CREATE PRIMARY XML INDEX [PXML_Doc] ON [dbo].[Orders] ([Doc])");

    let secondary = Index::new("SXML")
        .with_column(IndexedColumn::new("Doc"))
        .with(names::PARENT_XML_INDEX, "PXML_Doc".to_string())
        .with(names::SECONDARY_XML_INDEX_TYPE, SecondaryXmlIndexType::Path);
    let script = create(&secondary, &orders(), &ctx);
    assert_eq!(
        script.last().map(String::as_str),
        Some("CREATE XML INDEX [SXML] ON [dbo].[Orders] ([Doc]) USING XML INDEX [PXML_Doc] FOR PATH")
    );
}

#[test]
fn test_secondary_xml_needs_a_kind() {
    let index = Index::new("SXML")
        .with_column(IndexedColumn::new("Doc"))
        .with(names::PARENT_XML_INDEX, "PXML_Doc".to_string());
    let err = create_err(&index, &orders(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::WrongPropertyValue { .. }));
}

fn spatial_on_shape() -> Index {
    Index::new("SIX")
        .with_column(IndexedColumn::new("Shape"))
        .with(names::SPATIAL_INDEX_TYPE, SpatialIndexType::GeometryGrid)
}

#[test]
fn test_geometry_grid_with_bounding_box() {
    let index = spatial_on_shape()
        .with(names::BOUNDING_BOX_X_MIN, 0.0_f64)
        .with(names::BOUNDING_BOX_Y_MIN, 0.0_f64)
        .with(names::BOUNDING_BOX_X_MAX, 100.0_f64)
        .with(names::BOUNDING_BOX_Y_MAX, 100.0_f64);
    let script = create(&index, &orders(), &single_line(SqlServerVersion::Sql130));

    assert_eq!(
        script.last().map(String::as_str),
        Some(
            "CREATE SPATIAL INDEX [SIX] ON [dbo].[Orders] ([Shape]) USING GEOMETRY_GRID \
             WITH (BOUNDING_BOX = (0, 0, 100, 100))"
        )
    );
}

#[test]
fn test_geometry_grid_requires_bounding_box() {
    let err = create_err(&spatial_on_shape(), &orders(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSet { .. }));
}

#[test]
fn test_selective_xml_index() {
    let mut index = Index::new("SXI")
        .with(names::INDEX_TYPE, IndexType::SelectiveXml)
        .with_column(IndexedColumn::new("Doc"));
    index.xml_namespaces.push(XmlNamespace::new("ns", "http://x"));
    index
        .selective_paths
        .push(SelectivePath::xquery("pathab", "/a/b").typed("xs:string", Some(20)).singleton());
    let script = create(&index, &orders(), &single_line(SqlServerVersion::Sql130));

    assert_eq!(
        script.last().map(String::as_str),
        Some(
            "CREATE SELECTIVE XML INDEX [SXI] ON [dbo].[Orders] ([Doc]) \
             WITH XMLNAMESPACES ('http://x' as ns) \
             FOR ([pathab] = '/a/b' as XQUERY 'xs:string' MAXLENGTH(20) SINGLETON)"
        )
    );
}

// ============================================================================
// Memory-optimized and table types
// ============================================================================

fn hash_index() -> Index {
    Index::new("IX_H")
        .with(names::INDEX_TYPE, IndexType::NonClusteredHash)
        .with_column(IndexedColumn::new("Id"))
}

#[test]
fn test_hash_index_on_memory_optimized_table() {
    let index = hash_index().with(names::BUCKET_COUNT, 1024_i64);
    assert_eq!(
        create(&index, &hot_table(), &single_line(SqlServerVersion::Sql130)),
        vec!["ALTER TABLE [dbo].[Hot] ADD INDEX [IX_H] HASH ([Id]) WITH (BUCKET_COUNT = 1024)".to_string()]
    );
}

#[test]
fn test_hash_index_requires_bucket_count() {
    let err = create_err(&hash_index(), &hot_table(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::PropertyNotSet { .. }));
}

#[test]
fn test_hash_index_on_disk_table() {
    let index = hash_index().with(names::BUCKET_COUNT, 1024_i64);
    let err = create_err(&index, &table_t(), &single_line(SqlServerVersion::Sql130));
    assert!(matches!(err, DdlError::ConflictingProperties { .. }));
}

#[test]
fn test_table_type_index_inline() {
    let parent = TableRef::table_type("dbo", "TT").with_column(Column::new("Id", "int"));
    let index = Index::new("IX_TT").with_column(IndexedColumn::asc("Id"));

    let scripter = IndexScripter::new(&index, &parent, &single_line(SqlServerVersion::Sql130));
    assert_eq!(scripter.script_inline().unwrap(), "INDEX [IX_TT] NONCLUSTERED ([Id] ASC)");

    let older = IndexScripter::new(&index, &parent, &single_line(SqlServerVersion::Sql120));
    assert!(matches!(
        older.script_inline(),
        Err(DdlError::UnsupportedVersion { .. })
    ));
}

#[test]
fn test_inline_form_missing_for_xml() {
    let index = Index::new("PXML_Doc").with_column(IndexedColumn::new("Doc"));
    let table = orders();
    let scripter = IndexScripter::new(&index, &table, &single_line(SqlServerVersion::Sql130));
    assert!(matches!(
        scripter.script_inline(),
        Err(DdlError::InvalidOperation { .. })
    ));
}
