//! Snapshot writing with quick-xml

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use super::{Snapshot, TableSnapshot};
use crate::model::{Database, Index, ParentKind, TableRef, XmlPathType};
use crate::property::{LifecycleState, PropertyBag};

type Attributes<'a> = Vec<(&'a str, String)>;

fn start(name: &str, attributes: &Attributes<'_>) -> BytesStart<'static> {
    BytesStart::new(name.to_string())
        .with_attributes(attributes.iter().map(|(k, v)| (*k, v.as_str())))
}

/// Write `<name ...>children</name>`, or `<name .../>` when there are none.
fn write_element<W, F>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &Attributes<'_>,
    has_children: bool,
    children: F,
) -> anyhow::Result<()>
where
    W: Write,
    F: FnOnce(&mut Writer<W>) -> anyhow::Result<()>,
{
    if !has_children {
        writer.write_event(Event::Empty(start(name, attributes)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start(name, attributes)))?;
    children(writer)?;
    writer.write_event(Event::End(BytesEnd::new(name.to_string())))?;
    Ok(())
}

fn named(name: &str, state: LifecycleState) -> Attributes<'static> {
    vec![("Name", name.to_string()), ("State", state.to_string())]
}

/// Dropped objects no longer exist anywhere and are left out.
fn is_live(state: LifecycleState) -> bool {
    state != LifecycleState::Dropped
}

fn has_properties(bag: &PropertyBag) -> bool {
    bag.iter().any(|p| !p.is_null())
}

/// `<Property Name=".." Value=".." Pending=".."/>` for every set value.
fn write_properties<W: Write>(writer: &mut Writer<W>, bag: &PropertyBag) -> anyhow::Result<()> {
    for property in bag.iter() {
        let mut attributes: Attributes<'_> = vec![("Name", property.name().to_string())];
        if let Some(committed) = property.committed() {
            attributes.push(("Value", committed.to_string()));
        }
        if property.is_dirty() {
            if let Some(pending) = property.value() {
                attributes.push(("Pending", pending.to_string()));
            }
        }
        if attributes.len() > 1 {
            writer.write_event(Event::Empty(start("Property", &attributes)))?;
        }
    }
    Ok(())
}

fn write_database<W: Write>(writer: &mut Writer<W>, database: &Database) -> anyhow::Result<()> {
    let attributes = named(database.name(), database.state());
    let has_children = has_properties(database.properties())
        || !database.filegroups.is_empty()
        || !database.log_files.is_empty();
    write_element(writer, "Database", &attributes, has_children, |w| {
        write_properties(w, database.properties())?;
        for filegroup in database.filegroups.iter().filter(|fg| is_live(fg.state())) {
            let fg_attributes = named(filegroup.name(), filegroup.state());
            let fg_children = has_properties(filegroup.properties()) || !filegroup.files.is_empty();
            write_element(w, "FileGroup", &fg_attributes, fg_children, |w| {
                write_properties(w, filegroup.properties())?;
                for file in filegroup.files.iter().filter(|f| is_live(f.state())) {
                    let file_attributes = named(file.name(), file.state());
                    write_element(
                        w,
                        "File",
                        &file_attributes,
                        has_properties(file.properties()),
                        |w| write_properties(w, file.properties()),
                    )?;
                }
                Ok(())
            })?;
        }
        for log_file in database.log_files.iter().filter(|f| is_live(f.state())) {
            let log_attributes = named(log_file.name(), log_file.state());
            write_element(
                w,
                "LogFile",
                &log_attributes,
                has_properties(log_file.properties()),
                |w| write_properties(w, log_file.properties()),
            )?;
        }
        Ok(())
    })
}

fn table_attributes(table: &TableRef) -> Attributes<'static> {
    let kind = match table.kind {
        ParentKind::Table => "Table",
        ParentKind::View => "View",
        ParentKind::UserDefinedTableType => "TableType",
    };
    let mut attributes = vec![
        ("Schema", table.schema.clone()),
        ("Name", table.name.clone()),
        ("Kind", kind.to_string()),
        ("State", table.state.to_string()),
    ];
    if table.memory_optimized {
        attributes.push(("MemoryOptimized", "true".to_string()));
    }
    if let Some(distribution) = table.dw_distribution {
        attributes.push(("Distribution", distribution.to_string()));
    }
    if table.is_node {
        attributes.push(("Graph", "Node".to_string()));
    } else if table.is_edge {
        attributes.push(("Graph", "Edge".to_string()));
    }
    attributes
}

fn write_index<W: Write>(writer: &mut Writer<W>, index: &Index) -> anyhow::Result<()> {
    let attributes = named(index.name(), index.state());
    write_element(writer, "Index", &attributes, true, |w| {
        write_properties(w, index.properties())?;

        for column in &index.columns {
            let mut column_attributes: Attributes<'_> = vec![("Name", column.name.clone())];
            if let Some(descending) = column.descending {
                column_attributes.push(("Descending", descending.to_string()));
            }
            if column.is_included {
                column_attributes.push(("Included", "true".to_string()));
            }
            if let Some(order) = column.columnstore_order {
                column_attributes.push(("ColumnstoreOrder", order.to_string()));
            }
            w.write_event(Event::Empty(start("IndexedColumn", &column_attributes)))?;
        }

        for partition in &index.partitions {
            let mut partition_attributes: Attributes<'_> =
                vec![("Number", partition.number.to_string())];
            if let Some(compression) = partition.data_compression.value() {
                partition_attributes.push(("Compression", compression.to_string()));
            }
            if let Some(xml) = partition.xml_compression.value() {
                partition_attributes.push(("XmlCompression", xml.to_string()));
            }
            w.write_event(Event::Empty(start("Partition", &partition_attributes)))?;
        }

        for parameter in &index.partition_scheme_parameters {
            let parameter_attributes: Attributes<'_> = vec![("Name", parameter.clone())];
            w.write_event(Event::Empty(start(
                "PartitionSchemeParameter",
                &parameter_attributes,
            )))?;
        }

        for namespace in index.xml_namespaces.iter().filter(|n| is_live(n.state)) {
            let mut ns_attributes: Attributes<'_> = vec![
                ("Prefix", namespace.prefix.clone()),
                ("Uri", namespace.uri.clone()),
                ("State", namespace.state.to_string()),
            ];
            if namespace.is_default {
                ns_attributes.push(("Default", "true".to_string()));
            }
            w.write_event(Event::Empty(start("XmlNamespace", &ns_attributes)))?;
        }

        for path in index.selective_paths.iter().filter(|p| is_live(p.state)) {
            let mut path_attributes: Attributes<'_> = vec![
                ("Name", path.name.clone()),
                ("Path", path.path.clone()),
                ("Type", path.path_type.to_string()),
                ("State", path.state.to_string()),
            ];
            if path.path_type == XmlPathType::Sql {
                if let Some(sql_type) = &path.sql_type {
                    path_attributes.push(("SqlType", sql_type.clone()));
                }
            }
            if let Some(xquery_type) = &path.xquery_type {
                path_attributes.push(("XQueryType", xquery_type.clone()));
            }
            if let Some(max_length) = path.max_length {
                path_attributes.push(("MaxLength", max_length.to_string()));
            }
            if path.is_node {
                path_attributes.push(("Node", "true".to_string()));
            }
            if path.is_singleton {
                path_attributes.push(("Singleton", "true".to_string()));
            }
            w.write_event(Event::Empty(start("SelectivePath", &path_attributes)))?;
        }
        Ok(())
    })
}

fn write_table<W: Write>(writer: &mut Writer<W>, snapshot: &TableSnapshot) -> anyhow::Result<()> {
    let attributes = table_attributes(&snapshot.table);
    let has_children = !snapshot.table.columns.is_empty() || !snapshot.indexes.is_empty();
    write_element(writer, "Table", &attributes, has_children, |w| {
        for column in &snapshot.table.columns {
            let mut column_attributes: Attributes<'_> = vec![
                ("Name", column.name.clone()),
                ("Type", column.data_type.clone()),
            ];
            if column.graph_type != crate::model::GraphType::None {
                column_attributes.push(("GraphType", column.graph_type.to_string()));
            }
            if column.is_computed {
                column_attributes.push(("Computed", "true".to_string()));
            }
            if column.ansi_padding {
                column_attributes.push(("AnsiPadding", "true".to_string()));
            }
            w.write_event(Event::Empty(start("Column", &column_attributes)))?;
        }
        for index in snapshot.indexes.iter().filter(|i| is_live(i.state())) {
            write_index(w, index)?;
        }
        Ok(())
    })
}

/// Write a snapshot document to `writer`.
pub fn write_snapshot<W: Write>(writer: W, snapshot: &Snapshot) -> anyhow::Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);
    let root_state = match snapshot {
        Snapshot::Database(database) => database.state(),
        Snapshot::Table(table) => table.table.state,
    };
    if !is_live(root_state) {
        anyhow::bail!("a dropped object cannot be written to a snapshot");
    }
    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    match snapshot {
        Snapshot::Database(database) => write_database(&mut xml_writer, database)?,
        Snapshot::Table(table) => write_table(&mut xml_writer, table)?,
    }
    Ok(())
}

/// Render a snapshot document as a string.
pub fn write_snapshot_to_string(snapshot: &Snapshot) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    write_snapshot(&mut buffer, snapshot)?;
    Ok(String::from_utf8(buffer)?)
}
