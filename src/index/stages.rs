//! Per-variant stage tables
//!
//! Every variant fills the same statement skeleton:
//!
//! ```text
//! header  columns  details...  WITH (options)  storage...
//! ```
//!
//! A variant is a table of the stage functions it uses, so adding one
//! means adding a table, not threading a new case through every stage.

use crate::clause::{ClauseBuilder, ClauseValue};
use crate::error::Result;
use crate::model::{names, IndexKeyType, SecondaryXmlIndexType, SpatialIndexType, XmlPathType};
use crate::property::{LifecycleState, Value};
use crate::util::quote_ident;

use super::columns::{self, ColumnList};
use super::options::{self, OptionScope};
use super::validate::is_system_named;
use super::{IndexVariant, Strategy};

pub(super) type HeaderFn = fn(&Strategy<'_>) -> Result<String>;
pub(super) type ColumnsFn = fn(&Strategy<'_>) -> Result<Option<ColumnList>>;
pub(super) type DetailsFn = fn(&Strategy<'_>, Option<&ColumnList>) -> Result<Vec<String>>;
pub(super) type OptionsFn = fn(&Strategy<'_>, &mut ClauseBuilder<'_>, OptionScope) -> Result<()>;
pub(super) type StorageFn = fn(&Strategy<'_>) -> Result<Vec<String>>;

pub(super) struct Stages {
    pub header: HeaderFn,
    /// Form used inside a CREATE TABLE / CREATE TYPE body
    pub inline_header: Option<HeaderFn>,
    pub columns: ColumnsFn,
    pub details: DetailsFn,
    pub options: OptionsFn,
    /// `None` when the variant takes no rebuild options
    pub rebuild_options: Option<OptionsFn>,
    pub storage: StorageFn,
    /// Whether the create statement takes an existence guard
    pub guarded: bool,
}

impl IndexVariant {
    pub(super) fn stages(&self) -> &'static Stages {
        match self {
            IndexVariant::Constraint => &CONSTRAINT,
            IndexVariant::ClusteredRegular | IndexVariant::NonClusteredRegular => &REGULAR,
            IndexVariant::PrimaryXml | IndexVariant::SecondaryXml => &XML,
            IndexVariant::Spatial => &SPATIAL,
            IndexVariant::ClusteredColumnstore => &CLUSTERED_COLUMNSTORE,
            IndexVariant::NonClusteredColumnstore => &NONCLUSTERED_COLUMNSTORE,
            IndexVariant::Hash => &HASH,
            IndexVariant::Range => &RANGE,
            IndexVariant::SelectiveXml => &SELECTIVE_XML,
            IndexVariant::SecondarySelectiveXml => &SECONDARY_SELECTIVE_XML,
            IndexVariant::UserDefinedTableType => &TABLE_TYPE,
        }
    }
}

const REGULAR: Stages = Stages {
    header: regular_header,
    inline_header: Some(regular_inline_header),
    columns: ordered_columns,
    details: regular_details,
    options: regular_options,
    rebuild_options: Some(rebuild_options),
    storage: storage,
    guarded: true,
};

const CONSTRAINT: Stages = Stages {
    header: constraint_header,
    inline_header: Some(constraint_inline_header),
    columns: ordered_columns,
    details: constraint_details,
    options: options::constraint,
    rebuild_options: Some(rebuild_options),
    storage: storage,
    guarded: true,
};

const XML: Stages = Stages {
    header: xml_header,
    inline_header: None,
    columns: plain_columns,
    details: xml_details,
    options: options::general,
    rebuild_options: Some(rebuild_options),
    storage: no_storage,
    guarded: true,
};

const SPATIAL: Stages = Stages {
    header: spatial_header,
    inline_header: None,
    columns: plain_columns,
    details: spatial_details,
    options: options::spatial,
    rebuild_options: Some(rebuild_options),
    storage: filegroup_storage,
    guarded: true,
};

const CLUSTERED_COLUMNSTORE: Stages = Stages {
    header: clustered_columnstore_header,
    inline_header: Some(clustered_columnstore_inline_header),
    columns: no_columns,
    details: columnstore_details,
    options: options::columnstore,
    rebuild_options: Some(options::columnstore),
    storage: storage,
    guarded: true,
};

const NONCLUSTERED_COLUMNSTORE: Stages = Stages {
    header: nonclustered_columnstore_header,
    inline_header: None,
    columns: plain_columns,
    details: columnstore_details,
    options: options::columnstore,
    rebuild_options: Some(options::columnstore),
    storage: storage,
    guarded: true,
};

const HASH: Stages = Stages {
    header: hash_header,
    inline_header: Some(hash_inline_header),
    columns: plain_columns,
    details: no_details,
    options: hash_options,
    rebuild_options: None,
    storage: no_storage,
    guarded: true,
};

const RANGE: Stages = Stages {
    header: range_header,
    inline_header: Some(range_inline_header),
    columns: ordered_columns,
    details: no_details,
    options: no_options,
    rebuild_options: None,
    storage: no_storage,
    guarded: true,
};

const SELECTIVE_XML: Stages = Stages {
    header: selective_xml_header,
    inline_header: None,
    columns: plain_columns,
    details: selective_xml_details,
    options: options::general,
    rebuild_options: Some(rebuild_options),
    storage: no_storage,
    guarded: true,
};

const SECONDARY_SELECTIVE_XML: Stages = Stages {
    header: secondary_selective_xml_header,
    inline_header: None,
    columns: plain_columns,
    details: secondary_selective_xml_details,
    options: options::general,
    rebuild_options: Some(rebuild_options),
    storage: no_storage,
    guarded: true,
};

const TABLE_TYPE: Stages = Stages {
    header: table_type_header,
    inline_header: Some(table_type_header),
    columns: ordered_columns,
    details: no_details,
    options: table_type_options,
    rebuild_options: None,
    storage: no_storage,
    guarded: false,
};

// columns

fn ordered_columns(s: &Strategy<'_>) -> Result<Option<ColumnList>> {
    columns::collect(s, true).map(Some)
}

fn plain_columns(s: &Strategy<'_>) -> Result<Option<ColumnList>> {
    columns::collect(s, false).map(Some)
}

fn no_columns(_: &Strategy<'_>) -> Result<Option<ColumnList>> {
    Ok(None)
}

// headers

fn unique_keyword(s: &Strategy<'_>) -> Result<&'static str> {
    Ok(if s.flag(names::IS_UNIQUE)? { "UNIQUE " } else { "" })
}

fn clustering_keyword(s: &Strategy<'_>) -> &'static str {
    if s.variant == IndexVariant::ClusteredRegular {
        "CLUSTERED "
    } else {
        "NONCLUSTERED "
    }
}

fn regular_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!(
        "CREATE {}{}INDEX {} ON {}",
        unique_keyword(s)?,
        clustering_keyword(s),
        s.index_name(),
        s.table_name()
    ))
}

fn regular_inline_header(s: &Strategy<'_>) -> Result<String> {
    if s.is_analytical() && s.variant == IndexVariant::ClusteredRegular {
        return Ok("CLUSTERED INDEX".to_string());
    }
    Ok(format!(
        "INDEX {} {}{}",
        s.index_name(),
        unique_keyword(s)?,
        clustering_keyword(s).trim_end()
    ))
}

/// `[CONSTRAINT [n] ]PRIMARY KEY [CLUSTERED|NONCLUSTERED]`
fn constraint_body(s: &Strategy<'_>, extra: &str) -> Result<String> {
    let mut body = String::new();
    if !s.parent.is_table_type() && !is_system_named(s)? {
        body.push_str(&format!("CONSTRAINT {} ", s.index_name()));
    }
    let key_type = s
        .get::<IndexKeyType>(names::INDEX_KEY_TYPE)?
        .unwrap_or(IndexKeyType::PrimaryKey);
    body.push_str(match key_type {
        IndexKeyType::Unique => "UNIQUE",
        _ => "PRIMARY KEY",
    });
    match s.clustering()? {
        Some(true) => body.push_str(" CLUSTERED"),
        Some(false) => body.push_str(" NONCLUSTERED"),
        None => {}
    }
    body.push_str(extra);
    Ok(body)
}

fn constraint_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!("ALTER TABLE {} ADD {}", s.table_name(), constraint_body(s, "")?))
}

fn constraint_inline_header(s: &Strategy<'_>) -> Result<String> {
    constraint_body(s, "")
}

fn xml_header(s: &Strategy<'_>) -> Result<String> {
    let primary = if s.variant == IndexVariant::PrimaryXml {
        "PRIMARY "
    } else {
        ""
    };
    Ok(format!(
        "CREATE {}XML INDEX {} ON {}",
        primary,
        s.index_name(),
        s.table_name()
    ))
}

fn spatial_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!("CREATE SPATIAL INDEX {} ON {}", s.index_name(), s.table_name()))
}

fn clustered_columnstore_header(s: &Strategy<'_>) -> Result<String> {
    if s.is_memory_optimized() {
        return Ok(format!(
            "ALTER TABLE {} ADD INDEX {} CLUSTERED COLUMNSTORE",
            s.table_name(),
            s.index_name()
        ));
    }
    Ok(format!(
        "CREATE CLUSTERED COLUMNSTORE INDEX {} ON {}",
        s.index_name(),
        s.table_name()
    ))
}

fn clustered_columnstore_inline_header(s: &Strategy<'_>) -> Result<String> {
    if s.is_analytical() {
        return Ok("CLUSTERED COLUMNSTORE INDEX".to_string());
    }
    Ok(format!("INDEX {} CLUSTERED COLUMNSTORE", s.index_name()))
}

fn nonclustered_columnstore_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!(
        "CREATE NONCLUSTERED COLUMNSTORE INDEX {} ON {}",
        s.index_name(),
        s.table_name()
    ))
}

/// Shared by hash and range: `INDEX [n] [UNIQUE ]KIND` or the constraint form.
fn memory_optimized_body(s: &Strategy<'_>, kind: &str) -> Result<String> {
    let key_type = s.get::<IndexKeyType>(names::INDEX_KEY_TYPE)?.unwrap_or(IndexKeyType::None);
    if key_type.is_constraint() {
        let constraint = if key_type == IndexKeyType::Unique {
            "UNIQUE"
        } else {
            "PRIMARY KEY"
        };
        let mut body = String::new();
        if !is_system_named(s)? {
            body.push_str(&format!("CONSTRAINT {} ", s.index_name()));
        }
        body.push_str(&format!("{} NONCLUSTERED", constraint));
        if kind == "HASH" {
            body.push_str(" HASH");
        }
        return Ok(body);
    }
    Ok(format!("INDEX {} {}{}", s.index_name(), unique_keyword(s)?, kind))
}

fn hash_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!("ALTER TABLE {} ADD {}", s.table_name(), memory_optimized_body(s, "HASH")?))
}

fn hash_inline_header(s: &Strategy<'_>) -> Result<String> {
    memory_optimized_body(s, "HASH")
}

fn range_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!(
        "ALTER TABLE {} ADD {}",
        s.table_name(),
        memory_optimized_body(s, "NONCLUSTERED")?
    ))
}

fn range_inline_header(s: &Strategy<'_>) -> Result<String> {
    memory_optimized_body(s, "NONCLUSTERED")
}

fn selective_xml_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!(
        "CREATE SELECTIVE XML INDEX {} ON {}",
        s.index_name(),
        s.table_name()
    ))
}

fn secondary_selective_xml_header(s: &Strategy<'_>) -> Result<String> {
    Ok(format!("CREATE XML INDEX {} ON {}", s.index_name(), s.table_name()))
}

fn table_type_header(s: &Strategy<'_>) -> Result<String> {
    let clustered = s.clustering()?.unwrap_or(false);
    Ok(format!(
        "INDEX {} {}{}",
        s.index_name(),
        unique_keyword(s)?,
        if clustered { "CLUSTERED" } else { "NONCLUSTERED" }
    ))
}

// details

fn no_details(_: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    Ok(Vec::new())
}

fn filter(s: &Strategy<'_>) -> Result<Option<String>> {
    Ok(s.text(names::FILTER_DEFINITION)?.map(|f| format!("WHERE {}", f)))
}

fn regular_details(s: &Strategy<'_>, columns: Option<&ColumnList>) -> Result<Vec<String>> {
    let mut details = Vec::new();
    details.extend(columns.and_then(ColumnList::render_included));
    details.extend(filter(s)?);
    Ok(details)
}

fn constraint_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    if s.is_analytical() {
        return Ok(vec!["NOT ENFORCED".to_string()]);
    }
    Ok(Vec::new())
}

fn xml_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    if s.variant == IndexVariant::PrimaryXml {
        return Ok(Vec::new());
    }
    let parent = s.text(names::PARENT_XML_INDEX)?.unwrap_or_default();
    let kind = match s.get::<SecondaryXmlIndexType>(names::SECONDARY_XML_INDEX_TYPE)? {
        Some(SecondaryXmlIndexType::Path) => "PATH",
        Some(SecondaryXmlIndexType::Value) => "VALUE",
        Some(SecondaryXmlIndexType::Property) => "PROPERTY",
        _ => "",
    };
    Ok(vec![format!("USING XML INDEX {} FOR {}", quote_ident(&parent), kind)])
}

fn spatial_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    let grid = match s.get::<SpatialIndexType>(names::SPATIAL_INDEX_TYPE)? {
        Some(SpatialIndexType::GeometryGrid) => "GEOMETRY_GRID",
        Some(SpatialIndexType::GeographyGrid) => "GEOGRAPHY_GRID",
        Some(SpatialIndexType::GeometryAutoGrid) => "GEOMETRY_AUTO_GRID",
        Some(SpatialIndexType::GeographyAutoGrid) => "GEOGRAPHY_AUTO_GRID",
        Some(SpatialIndexType::None) | None => return Ok(Vec::new()),
    };
    Ok(vec![format!("USING {}", grid)])
}

fn columnstore_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    let mut details = Vec::new();
    details.extend(columns::columnstore_order(s));
    if s.variant == IndexVariant::NonClusteredColumnstore {
        details.extend(filter(s)?);
    }
    Ok(details)
}

fn sql_literal(text: &str) -> String {
    format!("'{}'", crate::util::escape_string(text))
}

/// `'uri' as p` or `DEFAULT 'uri'`.
pub(super) fn namespace_declarations(s: &Strategy<'_>, only_new: bool) -> Option<String> {
    let declarations: Vec<String> = s
        .index
        .xml_namespaces
        .iter()
        .filter(|ns| !only_new || ns.state.is_new())
        .map(|ns| {
            if ns.is_default {
                format!("DEFAULT {}", sql_literal(&ns.uri))
            } else {
                format!("{} as {}", sql_literal(&ns.uri), ns.prefix)
            }
        })
        .collect();
    if declarations.is_empty() {
        None
    } else {
        Some(format!("WITH XMLNAMESPACES ({})", declarations.join(", ")))
    }
}

/// One promoted path: `[name] = 'path' as XQUERY 'xs:string' MAXLENGTH(20) SINGLETON`.
pub(super) fn path_definition(path: &crate::model::SelectivePath) -> String {
    let mut text = format!("{} = {}", quote_ident(&path.name), sql_literal(&path.path));
    match path.path_type {
        XmlPathType::XQuery => {
            if path.is_node {
                text.push_str(" as XQUERY 'node()'");
            } else if let Some(xquery_type) = &path.xquery_type {
                text.push_str(&format!(" as XQUERY {}", sql_literal(xquery_type)));
                if let Some(length) = path.max_length {
                    text.push_str(&format!(" MAXLENGTH({})", length));
                }
            }
        }
        XmlPathType::Sql => {
            if let Some(sql_type) = &path.sql_type {
                text.push_str(&format!(" as SQL {}", sql_type));
            }
        }
    }
    if path.is_singleton && !path.is_node {
        text.push_str(" SINGLETON");
    }
    text
}

fn selective_xml_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    let mut details = Vec::new();
    details.extend(namespace_declarations(s, false));
    let paths: Vec<String> = s
        .index
        .selective_paths
        .iter()
        .filter(|p| p.state != LifecycleState::ToBeDropped)
        .map(path_definition)
        .collect();
    details.push(format!("FOR ({})", paths.join(", ")));
    Ok(details)
}

fn secondary_selective_xml_details(s: &Strategy<'_>, _: Option<&ColumnList>) -> Result<Vec<String>> {
    let parent = s.text(names::PARENT_XML_INDEX)?.unwrap_or_default();
    let path = s.text(names::INDEXED_XML_PATH_NAME)?.unwrap_or_default();
    Ok(vec![format!(
        "USING XML INDEX {} FOR ({})",
        quote_ident(&parent),
        quote_ident(&path)
    )])
}

// options

fn no_options(_: &Strategy<'_>, _: &mut ClauseBuilder<'_>, _: OptionScope) -> Result<()> {
    Ok(())
}

fn regular_options(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    options::general(s, clause, scope)?;
    options::compression(s, clause)
}

fn rebuild_options(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    options::general(s, clause, scope)?;
    match scope.partition {
        Some(number) => options::partition_compression(s, clause, number),
        None => options::compression(s, clause),
    }
}

fn hash_options(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, _: OptionScope) -> Result<()> {
    let bucket_count = |value: &Value| match value {
        Value::Int(n) => Some(n.to_string()),
        _ => None,
    };
    clause.try_emit(
        s.bag(),
        names::BUCKET_COUNT,
        "BUCKET_COUNT",
        ClauseValue::Formatted(&bucket_count),
        true,
        None,
    )?;
    Ok(())
}

fn table_type_options(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, _: OptionScope) -> Result<()> {
    let only_on = |value: &Value| match value {
        Value::Bool(true) => Some("ON".to_string()),
        _ => None,
    };
    clause.try_emit(
        s.bag(),
        names::IGNORE_DUPLICATE_KEYS,
        "IGNORE_DUP_KEY",
        ClauseValue::Formatted(&only_on),
        true,
        None,
    )?;
    Ok(())
}

// storage

fn no_storage(_: &Strategy<'_>) -> Result<Vec<String>> {
    Ok(Vec::new())
}

fn data_space(s: &Strategy<'_>) -> Result<Option<String>> {
    if let Some(scheme) = s.text(names::PARTITION_SCHEME)? {
        let parameters: Vec<String> = s
            .index
            .partition_scheme_parameters
            .iter()
            .map(|p| quote_ident(p))
            .collect();
        return Ok(Some(format!("ON {}({})", quote_ident(&scheme), parameters.join(", "))));
    }
    Ok(s.text(names::FILE_GROUP)?
        .map(|fg| format!("ON {}", quote_ident(&fg))))
}

/// Data space, plus FILESTREAM placement for clustered structures.
fn storage(s: &Strategy<'_>) -> Result<Vec<String>> {
    if s.is_memory_optimized() || s.parent.is_table_type() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    parts.extend(data_space(s)?);
    if s.clustering()?.unwrap_or(false) {
        let filestream = match s.text(names::FILESTREAM_PARTITION_SCHEME)? {
            Some(scheme) => Some(scheme),
            None => s.text(names::FILESTREAM_FILE_GROUP)?,
        };
        if let Some(space) = filestream {
            parts.push(format!("FILESTREAM_ON {}", quote_ident(&space)));
        }
    }
    Ok(parts)
}

fn filegroup_storage(s: &Strategy<'_>) -> Result<Vec<String>> {
    Ok(s.text(names::FILE_GROUP)?
        .map(|fg| format!("ON {}", quote_ident(&fg)))
        .into_iter()
        .collect())
}
