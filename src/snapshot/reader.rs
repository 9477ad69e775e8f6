//! Snapshot parsing with roxmltree

use std::str::FromStr;

use roxmltree::{Document, Node};

use super::{Snapshot, TableSnapshot};
use crate::error::{DdlError, Result};
use crate::model::{
    Column, DataFile, Database, DwDistribution, FileGroup, GraphType, Index, IndexedColumn,
    LogFile, ParentKind, PhysicalPartition, SelectivePath, TableRef, XmlNamespace, XmlPathType,
};
use crate::property::{parse_value, LifecycleState, PropertyBag};

fn invalid(message: impl Into<String>) -> DdlError {
    DdlError::InvalidSnapshot {
        message: message.into(),
    }
}

/// Parse a snapshot document.
pub fn parse_snapshot(content: &str) -> Result<Snapshot> {
    let doc = Document::parse(content).map_err(|e| DdlError::SnapshotParse { source: e })?;
    let root = doc.root_element();
    match root.tag_name().name() {
        "Database" => Ok(Snapshot::Database(read_database(&root)?)),
        "Table" => Ok(Snapshot::Table(read_table(&root)?)),
        other => Err(invalid(format!("unexpected root element <{}>", other))),
    }
}

fn elements<'a, 'input>(
    node: &Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn required<'a>(node: &Node<'a, '_>, attribute: &str) -> Result<&'a str> {
    node.attribute(attribute).ok_or_else(|| {
        invalid(format!(
            "<{}> is missing the {} attribute",
            node.tag_name().name(),
            attribute
        ))
    })
}

fn parsed<T>(node: &Node, attribute: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    node.attribute(attribute)
        .map(|text| {
            text.parse::<T>().map_err(|e| {
                invalid(format!(
                    "bad {} on <{}>: {}",
                    attribute,
                    node.tag_name().name(),
                    e
                ))
            })
        })
        .transpose()
}

fn flag(node: &Node, attribute: &str) -> bool {
    node.attribute(attribute)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// `State` attribute; a snapshot describes existing objects by default.
fn state(node: &Node) -> Result<LifecycleState> {
    let state = parsed::<LifecycleState>(node, "State")?.unwrap_or(LifecycleState::Existing);
    if state == LifecycleState::Dropped {
        return Err(invalid(format!(
            "<{}> cannot describe a dropped object",
            node.tag_name().name()
        )));
    }
    Ok(state)
}

/// Load `<Property>` children into a bag.
fn read_properties(node: &Node, bag: &mut PropertyBag) -> Result<()> {
    for property in elements(node, "Property") {
        let name = required(&property, "Name")?;
        if let Some(value) = property.attribute("Value") {
            bag.load_value(name, parse_value(value));
        }
        if let Some(pending) = property.attribute("Pending") {
            bag.set(name, parse_value(pending));
        }
    }
    Ok(())
}

/// Build a tracked object and the state the document gives it.
///
/// Reading properties and attaching children moves a pending object
/// forward, so callers restore the recorded state once the object is
/// complete.
macro_rules! tracked {
    ($ty:ident, $node:expr) => {{
        let name = required($node, "Name")?;
        let state = state($node)?;
        let mut object = if state.is_new() {
            $ty::new(name)
        } else {
            $ty::existing(name)
        };
        read_properties($node, object.properties_mut())?;
        (object, state)
    }};
}

fn read_database(node: &Node) -> Result<Database> {
    let (mut database, database_state) = tracked!(Database, node);
    for fg_node in elements(node, "FileGroup") {
        let (mut filegroup, filegroup_state) = tracked!(FileGroup, &fg_node);
        for file_node in elements(&fg_node, "File") {
            let (file, file_state) = tracked!(DataFile, &file_node);
            filegroup = filegroup.with_file(file);
            if let Some(file) = filegroup.files.last_mut() {
                file.object_mut().restore(file_state);
            }
        }
        database = database.with_filegroup(filegroup);
        if let Some(filegroup) = database.filegroups.last_mut() {
            filegroup.object_mut().restore(filegroup_state);
        }
    }
    for log_node in elements(node, "LogFile") {
        let (log_file, log_state) = tracked!(LogFile, &log_node);
        database = database.with_log_file(log_file);
        if let Some(log_file) = database.log_files.last_mut() {
            log_file.object_mut().restore(log_state);
        }
    }
    database.object_mut().restore(database_state);
    Ok(database)
}

fn parent_kind(node: &Node) -> Result<ParentKind> {
    match node.attribute("Kind").unwrap_or("Table") {
        k if k.eq_ignore_ascii_case("table") => Ok(ParentKind::Table),
        k if k.eq_ignore_ascii_case("view") => Ok(ParentKind::View),
        k if k.eq_ignore_ascii_case("tabletype") => Ok(ParentKind::UserDefinedTableType),
        other => Err(invalid(format!("unknown parent kind: {}", other))),
    }
}

fn read_table(node: &Node) -> Result<TableSnapshot> {
    let mut table = TableRef::table(node.attribute("Schema").unwrap_or(""), required(node, "Name")?);
    table.kind = parent_kind(node)?;
    table.state = state(node)?;
    table.memory_optimized = flag(node, "MemoryOptimized");
    table.dw_distribution = parsed::<DwDistribution>(node, "Distribution")?;
    match node.attribute("Graph") {
        Some(g) if g.eq_ignore_ascii_case("node") => table.is_node = true,
        Some(g) if g.eq_ignore_ascii_case("edge") => table.is_edge = true,
        Some(other) => return Err(invalid(format!("unknown graph kind: {}", other))),
        None => {}
    }

    for column_node in elements(node, "Column") {
        let mut column = Column::new(
            required(&column_node, "Name")?,
            column_node.attribute("Type").unwrap_or(""),
        );
        column.graph_type = parsed::<GraphType>(&column_node, "GraphType")?.unwrap_or(GraphType::None);
        column.is_computed = flag(&column_node, "Computed");
        column.ansi_padding = flag(&column_node, "AnsiPadding");
        table = table.with_column(column);
    }

    let mut snapshot = TableSnapshot::new(table);
    for index_node in elements(node, "Index") {
        snapshot.indexes.push(read_index(&index_node)?);
    }
    Ok(snapshot)
}

fn read_index(node: &Node) -> Result<Index> {
    let (mut index, index_state) = tracked!(Index, node);

    for column_node in elements(node, "IndexedColumn") {
        index = index.with_column(IndexedColumn {
            name: required(&column_node, "Name")?.to_string(),
            descending: parsed::<bool>(&column_node, "Descending")?,
            is_included: flag(&column_node, "Included"),
            columnstore_order: parsed::<u32>(&column_node, "ColumnstoreOrder")?,
        });
    }

    for partition_node in elements(node, "Partition") {
        let number = parsed::<u32>(&partition_node, "Number")?
            .ok_or_else(|| invalid("<Partition> is missing the Number attribute"))?;
        let mut partition = PhysicalPartition::new(number);
        partition.data_compression.load(parsed(&partition_node, "Compression")?);
        partition.xml_compression.load(parsed::<bool>(&partition_node, "XmlCompression")?);
        index.partitions.push(partition);
    }

    for parameter in elements(node, "PartitionSchemeParameter") {
        index
            .partition_scheme_parameters
            .push(required(&parameter, "Name")?.to_string());
    }

    for ns_node in elements(node, "XmlNamespace") {
        let mut namespace = XmlNamespace::new(
            ns_node.attribute("Prefix").unwrap_or(""),
            required(&ns_node, "Uri")?,
        );
        namespace.is_default = flag(&ns_node, "Default");
        namespace.state = state(&ns_node)?;
        index.xml_namespaces.push(namespace);
    }

    for path_node in elements(node, "SelectivePath") {
        let name = required(&path_node, "Name")?;
        let path = required(&path_node, "Path")?;
        let path_type = parsed::<XmlPathType>(&path_node, "Type")?.unwrap_or(XmlPathType::XQuery);
        let mut selective = match path_type {
            XmlPathType::XQuery => SelectivePath::xquery(name, path),
            XmlPathType::Sql => {
                SelectivePath::sql(name, path, required(&path_node, "SqlType")?)
            }
        };
        selective.xquery_type = path_node.attribute("XQueryType").map(str::to_string);
        selective.max_length = parsed::<u32>(&path_node, "MaxLength")?;
        selective.is_node = flag(&path_node, "Node");
        selective.is_singleton = flag(&path_node, "Singleton");
        selective.state = state(&path_node)?;
        index.selective_paths.push(selective);
    }

    index.object_mut().restore(index_state);
    Ok(index)
}
