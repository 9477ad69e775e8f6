//! Index column lists
//!
//! Graph tables expose their internal id columns through pseudo-columns.
//! An index on `$node_id` is stored as the hidden graph id column followed
//! by its computed companion; the pair scripts as the single pseudo-column
//! and the companion is verified, never assumed.

use crate::error::{DdlError, Result};
use crate::model::{is_pseudo_column, GraphType};
use crate::util::quote_ident;

use super::Strategy;

/// Rendered column references of one index.
#[derive(Debug, Default, Clone, PartialEq)]
pub(super) struct ColumnList {
    pub keys: Vec<String>,
    /// Ordered, without duplicates
    pub included: Vec<String>,
    /// Some referenced column is computed
    pub on_computed: bool,
    /// Some referenced column was created with ANSI_PADDING ON
    pub on_ansi_padding: bool,
}

impl ColumnList {
    /// `(a, b)` on one line, or one column per indented line.
    pub fn render_keys(&self, s: &Strategy<'_>) -> String {
        let formatting = &s.ctx.formatting;
        if formatting.newline {
            let lb = formatting.line_break();
            let items: Vec<String> = self
                .keys
                .iter()
                .map(|k| format!("{}{}", formatting.indent(), k))
                .collect();
            format!("{lb}({lb}{}{lb})", items.join(&format!(",{lb}")))
        } else {
            format!(" ({})", self.keys.join(", "))
        }
    }

    pub fn render_included(&self) -> Option<String> {
        if self.included.is_empty() {
            None
        } else {
            Some(format!("INCLUDE({})", self.included.join(",")))
        }
    }
}

fn companion_of(graph_type: GraphType) -> Option<GraphType> {
    match graph_type {
        GraphType::GraphId => Some(GraphType::GraphIdComputed),
        GraphType::GraphFromObjId => Some(GraphType::GraphFromId),
        GraphType::GraphToObjId => Some(GraphType::GraphToId),
        _ => None,
    }
}

fn reference(name: &str, graph_type: GraphType) -> String {
    if graph_type.is_computed() || is_pseudo_column(name) {
        name.to_string()
    } else {
        quote_ident(name)
    }
}

/// Collect key and included column references.
///
/// `with_order` appends `ASC`/`DESC` where a direction is known. When an
/// index has only included columns they become its key columns.
pub(super) fn collect(s: &Strategy<'_>, with_order: bool) -> Result<ColumnList> {
    let mut list = ColumnList::default();
    let mut expected: Option<(GraphType, &str)> = None;

    for column in &s.index.columns {
        let table_column = s.parent.column(&column.name);
        if let Some(tc) = table_column {
            list.on_computed |= tc.is_computed;
            list.on_ansi_padding |= tc.ansi_padding;
        }

        if let Some((companion, after)) = expected.take() {
            if table_column.map(|tc| tc.graph_type) != Some(companion) {
                return Err(DdlError::ExpectedGraphColumnNotFound {
                    object: s.object_name(),
                    column: after.to_string(),
                });
            }
            continue;
        }

        let graph_type = table_column.map_or(GraphType::None, |tc| tc.graph_type);
        if column.is_included {
            let name = graph_type
                .pseudo_column(s.parent.is_node)
                .map_or_else(|| reference(&column.name, graph_type), str::to_string);
            if !list.included.contains(&name) {
                list.included.push(name);
            }
            continue;
        }

        if let (Some(pseudo), Some(companion)) =
            (graph_type.pseudo_column(s.parent.is_node), companion_of(graph_type))
        {
            list.keys.push(pseudo.to_string());
            expected = Some((companion, column.name.as_str()));
            continue;
        }

        let mut key = reference(&column.name, graph_type);
        if with_order {
            match column.descending {
                Some(true) => key.push_str(" DESC"),
                Some(false) => key.push_str(" ASC"),
                None => {}
            }
        }
        list.keys.push(key);
    }

    if let Some((_, after)) = expected {
        return Err(DdlError::ExpectedGraphColumnNotFound {
            object: s.object_name(),
            column: after.to_string(),
        });
    }

    if list.keys.is_empty() {
        if list.included.is_empty() {
            return Err(DdlError::not_set(s.object_name(), "IndexedColumns"));
        }
        list.keys = std::mem::take(&mut list.included);
    }
    Ok(list)
}

/// Columnstore sort order: `ORDER ([a],[b])` by ordinal.
pub(super) fn columnstore_order(s: &Strategy<'_>) -> Option<String> {
    let mut ordered: Vec<(u32, &str)> = s
        .index
        .columns
        .iter()
        .filter_map(|c| c.columnstore_order.map(|n| (n, c.name.as_str())))
        .filter(|(n, _)| *n > 0)
        .collect();
    if ordered.is_empty() {
        return None;
    }
    ordered.sort_by_key(|(n, _)| *n);
    let names: Vec<String> = ordered.iter().map(|(_, name)| quote_ident(name)).collect();
    Some(format!("ORDER ({})", names.join(",")))
}
