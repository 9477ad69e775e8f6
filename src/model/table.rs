//! Parent objects of indexes
//!
//! Only what is needed to classify and script an index is modelled: the
//! parent's name, kind, storage flags, and its column types.

use super::enums::{DwDistribution, GraphType};
use crate::context::Formatting;
use crate::property::LifecycleState;
use crate::util::qualified_name;

/// Storage-relevant family of a column's data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Xml,
    Geometry,
    Geography,
    Other,
}

impl ColumnType {
    pub fn from_type_name(type_name: &str) -> Self {
        // strip any length or schema collection suffix: xml(CONTENT dbo.Schema)
        let base = type_name
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .trim_matches(|c| c == '[' || c == ']');
        match base.to_lowercase().as_str() {
            "xml" => ColumnType::Xml,
            "geometry" => ColumnType::Geometry,
            "geography" => ColumnType::Geography,
            _ => ColumnType::Other,
        }
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, ColumnType::Geometry | ColumnType::Geography)
    }
}

/// Column of an index parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub graph_type: GraphType,
    pub is_computed: bool,
    /// Column was created with ANSI_PADDING ON
    pub ansi_padding: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            graph_type: GraphType::None,
            is_computed: false,
            ansi_padding: false,
        }
    }

    pub fn graph(mut self, graph_type: GraphType) -> Self {
        self.graph_type = graph_type;
        self
    }

    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    pub fn with_ansi_padding(mut self) -> Self {
        self.ansi_padding = true;
        self
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_type_name(&self.data_type)
    }
}

/// What kind of object owns an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParentKind {
    #[default]
    Table,
    View,
    UserDefinedTableType,
}

/// Minimal description of the object an index belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
    pub kind: ParentKind,
    pub state: LifecycleState,
    pub memory_optimized: bool,
    pub dw_distribution: Option<DwDistribution>,
    pub is_node: bool,
    pub is_edge: bool,
    pub columns: Vec<Column>,
}

impl TableRef {
    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind: ParentKind::Table,
            state: LifecycleState::Existing,
            memory_optimized: false,
            dw_distribution: None,
            is_node: false,
            is_edge: false,
            columns: Vec::new(),
        }
    }

    pub fn view(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ParentKind::View,
            ..Self::table(schema, name)
        }
    }

    pub fn table_type(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ParentKind::UserDefinedTableType,
            ..Self::table(schema, name)
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }

    pub fn memory_optimized(mut self) -> Self {
        self.memory_optimized = true;
        self
    }

    pub fn distributed(mut self, distribution: DwDistribution) -> Self {
        self.dw_distribution = Some(distribution);
        self
    }

    pub fn node(mut self) -> Self {
        self.is_node = true;
        self
    }

    pub fn edge(mut self) -> Self {
        self.is_edge = true;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_view(&self) -> bool {
        self.kind == ParentKind::View
    }

    pub fn is_table_type(&self) -> bool {
        self.kind == ParentKind::UserDefinedTableType
    }

    /// Distributed analytical table.
    pub fn is_distributed(&self) -> bool {
        self.dw_distribution.is_some()
    }

    /// Name as scripted in DDL, qualified per the formatting flags.
    pub fn script_name(&self, formatting: &Formatting) -> String {
        qualified_name(&self.schema, &self.name, formatting.schema_qualify)
    }

    /// Always fully qualified, for `OBJECT_ID` lookups and ALTER INDEX.
    pub fn full_name(&self) -> String {
        qualified_name(&self.schema, &self.name, true)
    }
}
