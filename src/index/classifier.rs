//! Variant classification
//!
//! Decides which script strategy applies to an index. The rules run in a
//! fixed order and the first one that matches wins:
//!
//! 1. memory-optimized parents classify strictly by kind
//! 2. distributed analytical parents classify strictly by kind
//! 3. objects still being defined, or whose clustering flag moved on its
//!    own, classify by their key column types and flags
//! 4. everything else classifies by the explicit kind
//!
//! Drop scripting has its own rule that reads committed values only.

use std::fmt;

use tracing::debug;

use crate::context::ScriptingContext;
use crate::error::{DdlError, Result};
use crate::model::{names, ColumnType, Index, IndexKeyType, IndexType, TableRef};

/// The closed family of index script strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexVariant {
    /// Primary key or unique constraint
    Constraint,
    ClusteredRegular,
    NonClusteredRegular,
    PrimaryXml,
    SecondaryXml,
    Spatial,
    ClusteredColumnstore,
    NonClusteredColumnstore,
    /// Memory-optimized hash index
    Hash,
    /// Memory-optimized range (non-clustered) index
    Range,
    SelectiveXml,
    SecondarySelectiveXml,
    /// Index declared inside a user-defined table type
    UserDefinedTableType,
}

impl IndexVariant {
    pub fn is_regular(&self) -> bool {
        matches!(
            self,
            IndexVariant::ClusteredRegular | IndexVariant::NonClusteredRegular
        )
    }

    pub fn is_columnstore(&self) -> bool {
        matches!(
            self,
            IndexVariant::ClusteredColumnstore | IndexVariant::NonClusteredColumnstore
        )
    }

    pub fn is_xml(&self) -> bool {
        matches!(
            self,
            IndexVariant::PrimaryXml
                | IndexVariant::SecondaryXml
                | IndexVariant::SelectiveXml
                | IndexVariant::SecondarySelectiveXml
        )
    }
}

impl fmt::Display for IndexVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn object_name(index: &Index) -> String {
    format!("Index {}", index.name())
}

fn is_analytical(parent: &TableRef, ctx: &ScriptingContext) -> bool {
    parent.is_distributed() || ctx.is_data_warehouse()
}

/// What an index says about its own kind, read from one value slot.
struct KindEvidence {
    kind: Option<IndexType>,
    key_type: IndexKeyType,
    clustered: Option<bool>,
    has_parent_xml: bool,
}

impl KindEvidence {
    fn current(index: &Index, ctx: &ScriptingContext) -> Result<Self> {
        let bag = index.properties();
        Ok(Self {
            kind: bag.get_if_supported(names::INDEX_TYPE, ctx)?,
            key_type: bag.get_or(names::INDEX_KEY_TYPE, ctx, IndexKeyType::None)?,
            clustered: bag.get_if_supported(names::IS_CLUSTERED, ctx)?,
            has_parent_xml: has_text(index, names::PARENT_XML_INDEX, ctx)?,
        })
    }

    /// Values as they exist on the target; objects never materialized
    /// only have current values.
    fn committed(index: &Index, ctx: &ScriptingContext) -> Result<Self> {
        if index.state().is_new() {
            return Self::current(index, ctx);
        }
        let bag = index.properties();
        Ok(Self {
            kind: bag.get_committed(names::INDEX_TYPE, ctx)?,
            key_type: bag
                .get_committed(names::INDEX_KEY_TYPE, ctx)?
                .unwrap_or(IndexKeyType::None),
            clustered: bag.get_committed(names::IS_CLUSTERED, ctx)?,
            has_parent_xml: bag
                .get_committed::<String>(names::PARENT_XML_INDEX, ctx)?
                .is_some_and(|s| !s.is_empty()),
        })
    }

    fn infer(&self, index: &Index, parent: &TableRef) -> IndexType {
        if let Some(kind) = self.kind {
            return kind;
        }
        let clustered = self
            .clustered
            .unwrap_or(self.key_type == IndexKeyType::PrimaryKey);
        if clustered {
            return IndexType::Clustered;
        }
        for column in index.key_columns() {
            match parent.column(&column.name).map(|c| c.column_type()) {
                Some(ColumnType::Xml) if self.has_parent_xml => return IndexType::SecondaryXml,
                Some(ColumnType::Xml) => return IndexType::PrimaryXml,
                Some(t) if t.is_spatial() => return IndexType::Spatial,
                _ => {}
            }
        }
        IndexType::NonClustered
    }
}

/// Kind of an index, inferred from its columns and flags when not set.
///
/// A primary key with no clustering flag is clustered. Otherwise the first
/// XML or spatial key column decides, and anything left is non-clustered.
pub fn infer_kind(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Result<IndexType> {
    Ok(KindEvidence::current(index, ctx)?.infer(index, parent))
}

/// Effective clustering of an index.
///
/// The kind decides when it is set and either the flag was left alone or
/// the kind changed too; otherwise the flag decides.
pub fn resolve_clustered(index: &Index, ctx: &ScriptingContext) -> Result<Option<bool>> {
    let bag = index.properties();
    let kind = bag.get_if_supported::<IndexType>(names::INDEX_TYPE, ctx)?;
    if let Some(kind) = kind {
        if !bag.is_dirty(names::IS_CLUSTERED) || bag.is_dirty(names::INDEX_TYPE) {
            return Ok(Some(kind == IndexType::Clustered));
        }
    }
    bag.get_if_supported(names::IS_CLUSTERED, ctx)
}

/// Both the kind and the clustering flag were changed, and they disagree.
pub fn check_clustering_conflict(index: &Index, ctx: &ScriptingContext) -> Result<()> {
    let bag = index.properties();
    if !(bag.is_dirty(names::INDEX_TYPE) && bag.is_dirty(names::IS_CLUSTERED)) {
        return Ok(());
    }
    let kind = bag.get_if_supported::<IndexType>(names::INDEX_TYPE, ctx)?;
    let clustered = bag.get_if_supported::<bool>(names::IS_CLUSTERED, ctx)?;
    if let (Some(kind), Some(clustered)) = (kind, clustered) {
        if (kind == IndexType::Clustered) != clustered {
            return Err(DdlError::conflicting(
                object_name(index),
                format!("IndexType is {} but IsClustered is {}", kind, clustered),
            ));
        }
    }
    Ok(())
}

fn has_text(index: &Index, name: &str, ctx: &ScriptingContext) -> Result<bool> {
    Ok(index
        .properties()
        .get_if_supported::<String>(name, ctx)?
        .is_some_and(|s| !s.is_empty()))
}

fn memory_optimized_variant(index: &Index, kind: IndexType) -> Result<IndexVariant> {
    match kind {
        IndexType::NonClustered => Ok(IndexVariant::Range),
        IndexType::NonClusteredHash => Ok(IndexVariant::Hash),
        IndexType::ClusteredColumnstore => Ok(IndexVariant::ClusteredColumnstore),
        other => Err(DdlError::conflicting(
            object_name(index),
            format!("{} indexes are not supported on memory-optimized tables", other),
        )),
    }
}

fn analytical_variant(index: &Index, key_type: IndexKeyType, kind: IndexType) -> Result<IndexVariant> {
    if key_type.is_constraint() {
        return Ok(IndexVariant::Constraint);
    }
    match kind {
        IndexType::ClusteredColumnstore => Ok(IndexVariant::ClusteredColumnstore),
        IndexType::Clustered => Ok(IndexVariant::ClusteredRegular),
        IndexType::NonClustered => Ok(IndexVariant::NonClusteredRegular),
        other => Err(DdlError::conflicting(
            object_name(index),
            format!("{} indexes are not supported on distributed tables", other),
        )),
    }
}

/// Classify for definition scripting (create, inline, rebuild).
pub fn classify(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Result<IndexVariant> {
    let variant = classify_inner(index, parent, ctx)?;
    debug!(index = index.name(), %variant, "classified index");
    Ok(variant)
}

fn classify_inner(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Result<IndexVariant> {
    let bag = index.properties();
    let kind = bag.get_if_supported::<IndexType>(names::INDEX_TYPE, ctx)?;
    let key_type = bag.get_or(names::INDEX_KEY_TYPE, ctx, IndexKeyType::None)?;
    let drop_existing = index.runtime.is_drop_existing();

    if parent.memory_optimized {
        return memory_optimized_variant(index, infer_kind(index, parent, ctx)?);
    }
    if is_analytical(parent, ctx) {
        return analytical_variant(index, key_type, infer_kind(index, parent, ctx)?);
    }

    let still_defining = index.state().is_new() && kind.is_none();
    let clustering_moved =
        kind.is_some() && bag.is_dirty(names::IS_CLUSTERED) && !bag.is_dirty(names::INDEX_TYPE);
    if still_defining || clustering_moved {
        return classify_by_columns(index, parent, ctx, key_type, drop_existing);
    }

    // Replacing a physical structure in place keeps the physical kind even
    // when the index backs a constraint.
    if key_type.is_constraint() && !drop_existing {
        return Ok(IndexVariant::Constraint);
    }
    kind_variant(index, parent, infer_kind(index, parent, ctx)?)
}

fn kind_variant(index: &Index, parent: &TableRef, kind: IndexType) -> Result<IndexVariant> {
    match kind {
        IndexType::Clustered if parent.is_table_type() => Ok(IndexVariant::UserDefinedTableType),
        IndexType::NonClustered if parent.is_table_type() => Ok(IndexVariant::UserDefinedTableType),
        IndexType::Clustered => Ok(IndexVariant::ClusteredRegular),
        IndexType::NonClustered => Ok(IndexVariant::NonClusteredRegular),
        IndexType::PrimaryXml => Ok(IndexVariant::PrimaryXml),
        IndexType::SecondaryXml => Ok(IndexVariant::SecondaryXml),
        IndexType::Spatial => Ok(IndexVariant::Spatial),
        IndexType::NonClusteredColumnstore => Ok(IndexVariant::NonClusteredColumnstore),
        IndexType::ClusteredColumnstore => Ok(IndexVariant::ClusteredColumnstore),
        IndexType::SelectiveXml => Ok(IndexVariant::SelectiveXml),
        IndexType::SecondarySelectiveXml => Ok(IndexVariant::SecondarySelectiveXml),
        IndexType::NonClusteredHash => Err(DdlError::conflicting(
            object_name(index),
            "hash indexes require a memory-optimized table",
        )),
        IndexType::Heap => Err(DdlError::wrong_value(
            object_name(index),
            names::INDEX_TYPE,
            "a heap cannot be scripted as an index",
        )),
    }
}

fn classify_by_columns(
    index: &Index,
    parent: &TableRef,
    ctx: &ScriptingContext,
    key_type: IndexKeyType,
    drop_existing: bool,
) -> Result<IndexVariant> {
    let has_parent_xml = has_text(index, names::PARENT_XML_INDEX, ctx)?;
    for column in index.key_columns() {
        let Some(table_column) = parent.column(&column.name) else {
            // a view being created in the same script has no columns yet
            if parent.is_view() && parent.state.is_new() {
                continue;
            }
            return Err(DdlError::not_set(
                object_name(index),
                format!("column {} of {}", column.name, parent.full_name()),
            ));
        };
        match table_column.column_type() {
            ColumnType::Xml if has_parent_xml => return Ok(IndexVariant::SecondaryXml),
            ColumnType::Xml => return Ok(IndexVariant::PrimaryXml),
            t if t.is_spatial() => return Ok(IndexVariant::Spatial),
            _ => {}
        }
    }

    if key_type.is_constraint() && !drop_existing {
        return Ok(IndexVariant::Constraint);
    }
    if parent.is_table_type() {
        return Ok(IndexVariant::UserDefinedTableType);
    }
    if index
        .properties()
        .get_or(names::IS_CLUSTERED, ctx, false)?
    {
        Ok(IndexVariant::ClusteredRegular)
    } else {
        Ok(IndexVariant::NonClusteredRegular)
    }
}

/// Classify for alter scripting.
///
/// Only columnstore, selective XML and memory-optimized indexes have their
/// own alter forms; everything else alters like a regular index.
pub fn classify_for_alter(
    index: &Index,
    parent: &TableRef,
    ctx: &ScriptingContext,
) -> Result<IndexVariant> {
    if parent.memory_optimized {
        return memory_optimized_variant(index, infer_kind(index, parent, ctx)?);
    }
    let variant = match infer_kind(index, parent, ctx)? {
        IndexType::NonClusteredColumnstore => IndexVariant::NonClusteredColumnstore,
        IndexType::ClusteredColumnstore => IndexVariant::ClusteredColumnstore,
        IndexType::SelectiveXml => IndexVariant::SelectiveXml,
        _ => IndexVariant::NonClusteredRegular,
    };
    debug!(index = index.name(), %variant, "classified index for alter");
    Ok(variant)
}

/// Classify for drop scripting from what exists on the target.
///
/// Pending changes to kind, key type or clustering describe a structure
/// that was never built, so only committed values count. Objects that
/// were never materialized fall back to their current values. Past that,
/// the kind maps to a variant exactly as it does for create.
pub fn classify_for_drop(
    index: &Index,
    parent: &TableRef,
    ctx: &ScriptingContext,
) -> Result<IndexVariant> {
    let evidence = KindEvidence::committed(index, ctx)?;
    let kind = evidence.infer(index, parent);

    let variant = if parent.memory_optimized {
        memory_optimized_variant(index, kind)?
    } else if is_analytical(parent, ctx) {
        analytical_variant(index, evidence.key_type, kind)?
    } else if evidence.key_type.is_constraint() {
        IndexVariant::Constraint
    } else {
        kind_variant(index, parent, kind)?
    };
    debug!(index = index.name(), %variant, "classified index for drop");
    Ok(variant)
}
