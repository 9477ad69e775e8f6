//! Index script strategies
//!
//! [`IndexScripter`] is the entry point: it classifies an index into one
//! [`IndexVariant`] per operation, validates it, and runs the variant's
//! stage table to produce T-SQL text.
//!
//! ```text
//! Index + TableRef + ScriptingContext
//!          │
//!          ▼
//!     classifier ──► IndexVariant ──► stages (header, columns, options, storage)
//!          │                              │
//!          └──────── validate ◄───────────┘
//! ```

mod classifier;
mod columns;
mod options;
mod stages;
mod validate;

pub use classifier::{
    check_clustering_conflict, classify, classify_for_alter, classify_for_drop, infer_kind,
    resolve_clustered, IndexVariant,
};

use tracing::debug;

use crate::clause::ClauseBuilder;
use crate::context::{ScriptMode, ScriptingContext, SqlServerVersion};
use crate::error::{DdlError, Result};
use crate::model::{names, Index, IndexKeyType, TableRef};
use crate::property::{LifecycleState, PropertyType};
use crate::util::{quote_ident, sql_string};

use options::OptionScope;

/// SET options an index on computed columns or a view depends on.
const INDEX_SET_OPTIONS: [&str; 7] = [
    "SET ARITHABORT ON",
    "SET CONCAT_NULL_YIELDS_NULL ON",
    "SET QUOTED_IDENTIFIER ON",
    "SET ANSI_NULLS ON",
    "SET ANSI_PADDING ON",
    "SET ANSI_WARNINGS ON",
    "SET NUMERIC_ROUNDABORT OFF",
];

/// An index bound to one variant for one operation.
pub(crate) struct Strategy<'a> {
    index: &'a Index,
    parent: &'a TableRef,
    ctx: ScriptingContext,
    variant: IndexVariant,
}

impl<'a> Strategy<'a> {
    fn bag(&self) -> &crate::property::PropertyBag {
        self.index.properties()
    }

    fn object_name(&self) -> String {
        format!("Index {}", self.index.name())
    }

    /// Gated read; unsupported properties read as unset.
    fn get<T: PropertyType>(&self, name: &str) -> Result<Option<T>> {
        self.bag().get_if_supported(name, &self.ctx)
    }

    fn flag(&self, name: &str) -> Result<bool> {
        Ok(self.get::<bool>(name)?.unwrap_or(false))
    }

    /// Non-empty text property.
    fn text(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get::<String>(name)?.filter(|s| !s.is_empty()))
    }

    fn index_name(&self) -> String {
        quote_ident(self.index.name())
    }

    fn table_name(&self) -> String {
        self.parent.script_name(&self.ctx.formatting)
    }

    fn is_memory_optimized(&self) -> bool {
        self.parent.memory_optimized
            && matches!(
                self.variant,
                IndexVariant::Hash | IndexVariant::Range | IndexVariant::ClusteredColumnstore
            )
    }

    fn is_analytical(&self) -> bool {
        self.parent.is_distributed() || self.ctx.is_data_warehouse()
    }

    /// Explicit clustering, if the variant or the properties state one.
    fn clustering(&self) -> Result<Option<bool>> {
        match self.variant {
            IndexVariant::ClusteredRegular => Ok(Some(true)),
            IndexVariant::NonClusteredRegular
            | IndexVariant::ClusteredColumnstore
            | IndexVariant::NonClusteredColumnstore => Ok(Some(false)),
            _ => resolve_clustered(self.index, &self.ctx),
        }
    }

    /// Clustering with the primary key default applied.
    fn is_clustered(&self) -> Result<bool> {
        match self.clustering()? {
            Some(clustered) => Ok(clustered),
            None => Ok(self.get::<IndexKeyType>(names::INDEX_KEY_TYPE)? == Some(IndexKeyType::PrimaryKey)),
        }
    }

    /// Clustering of the structure on the target, for drop options.
    fn drop_clustered(&self) -> Result<bool> {
        let committed = |name: &str| -> Result<Option<crate::property::Value>> {
            if !self.bag().is_supported(name, &self.ctx) {
                return Ok(None);
            }
            let property = self.bag().property(name);
            Ok(if self.index.state().is_new() {
                property.and_then(|p| p.value()).cloned()
            } else {
                property.and_then(|p| p.committed()).cloned()
            })
        };
        if let Some(clustered) = committed(names::IS_CLUSTERED)?.and_then(|v| bool::from_value(&v)) {
            return Ok(clustered);
        }
        let key_type = committed(names::INDEX_KEY_TYPE)?.and_then(|v| IndexKeyType::from_value(&v));
        Ok(key_type == Some(IndexKeyType::PrimaryKey))
    }

    fn existence_guard(&self, exists: bool) -> String {
        let not = if exists { "" } else { "NOT " };
        let table = sql_string(&self.parent.full_name());
        let name = sql_string(self.index.name());
        if self.ctx.at_least(SqlServerVersion::Sql90) {
            format!(
                "IF {}EXISTS (SELECT * FROM sys.indexes WHERE object_id = OBJECT_ID({}) AND name = {})",
                not, table, name
            )
        } else {
            format!(
                "IF {}EXISTS (SELECT * FROM dbo.sysindexes WHERE id = OBJECT_ID({}) AND name = {})",
                not, table, name
            )
        }
    }

    fn table_guard(&self) -> String {
        format!(
            "IF EXISTS (SELECT * FROM sys.objects WHERE object_id = OBJECT_ID({}) AND type in (N'U'))",
            sql_string(&self.parent.full_name())
        )
    }

    fn guarded(&self, guard: Option<String>, statement: String) -> String {
        match guard {
            Some(guard) => format!("{}{}{}", guard, self.ctx.formatting.line_break(), statement),
            None => statement,
        }
    }

    /// Build the statement body: header, columns, details, options, storage.
    fn definition(&self, inline: bool) -> Result<(String, Option<columns::ColumnList>)> {
        let stages = self.variant.stages();
        validate::validate(self)?;

        let header = if inline {
            let Some(inline_header) = stages.inline_header else {
                return Err(DdlError::InvalidOperation {
                    operation: "script inline".to_string(),
                    object: self.object_name(),
                    state: format!("a {} index", self.variant),
                });
            };
            inline_header(self)?
        } else {
            (stages.header)(self)?
        };
        let columns = (stages.columns)(self)?;

        let mut statement = header;
        if let Some(columns) = &columns {
            statement.push_str(&columns.render_keys(self));
        }

        let mut tail = (stages.details)(self, columns.as_ref())?;
        let scope = if inline {
            OptionScope::INLINE
        } else {
            OptionScope::CREATE
        };
        let mut clause = ClauseBuilder::new(&self.ctx);
        (stages.options)(self, &mut clause, scope)?;
        tail.extend(clause.finish("WITH (", ")"));
        tail.extend((stages.storage)(self)?);

        let line_break = self.ctx.formatting.line_break();
        for part in tail {
            statement.push_str(line_break);
            statement.push_str(&part);
        }
        Ok((statement, columns))
    }
}

/// Scripts one index against its parent under a context.
///
/// Each operation classifies the index for itself; creation and drop may
/// land on different variants when kind or clustering changed.
#[derive(Debug, Clone, Copy)]
pub struct IndexScripter<'a> {
    index: &'a Index,
    parent: &'a TableRef,
    ctx: ScriptingContext,
}

impl<'a> IndexScripter<'a> {
    pub fn new(index: &'a Index, parent: &'a TableRef, ctx: &ScriptingContext) -> Self {
        Self {
            index,
            parent,
            ctx: *ctx,
        }
    }

    fn bind(&self, variant: IndexVariant, mode: ScriptMode) -> Strategy<'a> {
        Strategy {
            index: self.index,
            parent: self.parent,
            ctx: self.ctx.with_mode(mode),
            variant,
        }
    }

    /// Variant used for definition scripting.
    pub fn variant(&self) -> Result<IndexVariant> {
        classify(self.index, self.parent, &self.ctx)
    }

    /// Full create script: any SET preamble, the guarded CREATE statement,
    /// and a DISABLE when the index is disabled.
    pub fn script_create(&self) -> Result<Vec<String>> {
        self.index.object().ensure_definable()?;
        let variant = self.variant()?;
        let strategy = self.bind(variant, self.ctx.mode);
        let (statement, columns) = strategy.definition(false)?;

        let mut script = Vec::new();
        let on_computed = columns.as_ref().is_some_and(|c| c.on_computed);
        let on_ansi_padding = columns.as_ref().is_some_and(|c| c.on_ansi_padding);
        let key_type = strategy
            .get::<IndexKeyType>(names::INDEX_KEY_TYPE)?
            .unwrap_or(IndexKeyType::None);
        let xml_or_spatial = variant.is_xml() || variant == IndexVariant::Spatial;
        if ((on_computed || xml_or_spatial) && !key_type.is_constraint()) || self.parent.is_view() {
            script.extend(INDEX_SET_OPTIONS.iter().map(|s| s.to_string()));
        } else if on_computed || on_ansi_padding {
            script.push("SET ANSI_PADDING ON".to_string());
        }

        let guard = (self.ctx.formatting.existence_check && variant.stages().guarded)
            .then(|| strategy.existence_guard(false));
        script.push(strategy.guarded(guard, statement));

        if strategy.flag(names::IS_DISABLED)? && self.ctx.at_least(SqlServerVersion::Sql90) {
            script.push(format!(
                "ALTER INDEX {} ON {} DISABLE",
                strategy.index_name(),
                self.parent.full_name()
            ));
        }
        debug!(index = self.index.name(), %variant, statements = script.len(), "scripted index create");
        Ok(script)
    }

    /// The index as it appears inside a CREATE TABLE or CREATE TYPE body.
    pub fn script_inline(&self) -> Result<String> {
        self.index.object().ensure_definable()?;
        let strategy = self.bind(self.variant()?, self.ctx.mode);
        let (statement, _) = strategy.definition(true)?;
        Ok(statement)
    }

    /// Drop script, classified from the structure that exists on the target.
    pub fn script_drop(&self) -> Result<String> {
        self.index.object().ensure_droppable()?;
        let variant = classify_for_drop(self.index, self.parent, &self.ctx)?;
        let s = self.bind(variant, ScriptMode::ForDrop);
        // table type indexes only go away with the type
        if variant == IndexVariant::UserDefinedTableType {
            return Err(DdlError::InvalidOperation {
                operation: "drop".to_string(),
                object: s.object_name(),
                state: format!("a {} index", variant),
            });
        }
        let existence_check = s.ctx.formatting.existence_check;
        let native_if_exists = s.ctx.at_least(SqlServerVersion::Sql130);
        let memory_optimized = s.is_memory_optimized();
        let if_exists = if existence_check && native_if_exists && !memory_optimized {
            "IF EXISTS "
        } else {
            ""
        };

        let mut statement = if variant == IndexVariant::Constraint {
            format!(
                "ALTER TABLE {} DROP CONSTRAINT {}{}",
                s.table_name(),
                if_exists,
                s.index_name()
            )
        } else if memory_optimized {
            format!("ALTER TABLE {} DROP INDEX {}", s.table_name(), s.index_name())
        } else if !s.ctx.at_least(SqlServerVersion::Sql90) {
            format!("DROP INDEX {}.{}", s.table_name(), s.index_name())
        } else {
            format!("DROP INDEX {}{} ON {}", if_exists, s.index_name(), s.table_name())
        };

        let mut clause = ClauseBuilder::new(&s.ctx);
        options::drop(&s, &mut clause)?;
        if let Some(with) = clause.finish(" WITH (", ")") {
            statement.push_str(&with);
        }

        let guard = if !existence_check {
            None
        } else if !native_if_exists || memory_optimized {
            Some(s.existence_guard(true))
        } else if variant == IndexVariant::Constraint {
            Some(s.table_guard())
        } else {
            None
        };
        debug!(index = self.index.name(), %variant, "scripted index drop");
        Ok(s.guarded(guard, statement))
    }

    /// `ALTER INDEX ... REBUILD`, for one index or every index of the parent.
    ///
    /// `partition` restricts the rebuild to one partition; without it the
    /// whole index is rebuilt.
    pub fn script_rebuild(&self, all: bool, partition: Option<u32>) -> Result<String> {
        self.index.object().ensure_existing("rebuild")?;
        let variant = self.variant()?;
        let s = self.bind(variant, ScriptMode::ForRebuild);
        let table = self.parent.full_name();

        if !s.ctx.at_least(SqlServerVersion::Sql90) {
            if all {
                return Ok(format!("DBCC DBREINDEX({})", sql_string(&table)));
            }
            let fill_factor = s.get::<i64>(names::FILL_FACTOR)?.unwrap_or(0);
            return Ok(format!(
                "DBCC DBREINDEX({}, {}, {})",
                sql_string(&table),
                sql_string(self.index.name()),
                fill_factor
            ));
        }

        let partition = if all { None } else { partition };
        let mut statement = if all {
            format!("ALTER INDEX ALL ON {} REBUILD", table)
        } else {
            format!("ALTER INDEX {} ON {} REBUILD", s.index_name(), table)
        };
        if !all {
            match partition {
                Some(number) => statement.push_str(&format!(" PARTITION = {}", number)),
                None if s.ctx.at_least(SqlServerVersion::Sql100) => statement.push_str(" PARTITION = ALL"),
                None => {}
            }
        }

        if let Some(rebuild_options) = variant.stages().rebuild_options {
            let mut clause = ClauseBuilder::new(&s.ctx);
            rebuild_options(&s, &mut clause, OptionScope::rebuild(partition))?;
            if let Some(with) = clause.finish(" WITH (", ")") {
                statement.push_str(&with);
            }
        }
        Ok(statement)
    }

    /// `ALTER INDEX ... RESUME` for a paused resumable operation.
    pub fn script_resume(&self) -> Result<String> {
        self.index.object().ensure_existing("resume")?;
        self.ctx.require("Resumable index operation", SqlServerVersion::Sql140)?;
        let s = self.bind(self.variant()?, ScriptMode::ForResume);
        let mut statement = format!(
            "ALTER INDEX {} ON {} RESUME",
            s.index_name(),
            self.parent.full_name()
        );
        let mut clause = ClauseBuilder::new(&s.ctx);
        options::resume(&s, &mut clause)?;
        if let Some(with) = clause.finish(" WITH (", ")") {
            statement.push_str(&with);
        }
        Ok(statement)
    }

    /// `ALTER INDEX ... ABORT` when `abort`, otherwise `PAUSE`.
    pub fn script_abort_or_pause(&self, abort: bool) -> Result<String> {
        self.index.object().ensure_existing(if abort { "abort" } else { "pause" })?;
        self.ctx.require("Resumable index operation", SqlServerVersion::Sql140)?;
        Ok(format!(
            "ALTER INDEX {} ON {} {}",
            quote_ident(self.index.name()),
            self.parent.full_name(),
            if abort { "ABORT" } else { "PAUSE" }
        ))
    }

    /// Statements that apply pending changes to an existing index.
    ///
    /// Empty when nothing changed. Only dirty values are scripted.
    pub fn script_alter(&self) -> Result<Vec<String>> {
        self.index.object().ensure_alterable()?;
        let variant = classify_for_alter(self.index, self.parent, &self.ctx)?;
        let s = self.bind(variant, ScriptMode::ForDirectExecution);
        let table = self.parent.full_name();
        let mut script = Vec::new();

        let mut clause = ClauseBuilder::new(&s.ctx);
        options::set(&s, &mut clause)?;
        if let Some(set) = clause.finish("SET (", ")") {
            script.push(format!("ALTER INDEX {} ON {} {}", s.index_name(), table, set));
        }

        match variant {
            IndexVariant::Hash if s.bag().is_dirty(names::BUCKET_COUNT) => {
                if let Some(bucket_count) = s.get::<i64>(names::BUCKET_COUNT)? {
                    script.push(format!(
                        "ALTER TABLE {} ALTER INDEX {} REBUILD WITH (BUCKET_COUNT = {})",
                        s.table_name(),
                        s.index_name(),
                        bucket_count
                    ));
                }
            }
            IndexVariant::SelectiveXml => {
                script.extend(self.selective_xml_alter(&s)?);
            }
            _ => {}
        }

        if s.bag().is_dirty(names::IS_DISABLED) {
            let action = if s.flag(names::IS_DISABLED)? { "DISABLE" } else { "REBUILD" };
            script.push(format!("ALTER INDEX {} ON {} {}", s.index_name(), table, action));
        }
        debug!(index = self.index.name(), %variant, statements = script.len(), "scripted index alter");
        Ok(script)
    }

    fn selective_xml_alter(&self, s: &Strategy<'_>) -> Result<Option<String>> {
        let mut changes: Vec<String> = Vec::new();
        for path in &self.index.selective_paths {
            if path.state.is_new() {
                changes.push(format!("ADD {}", stages::path_definition(path)));
            } else if path.state == LifecycleState::ToBeDropped {
                changes.push(format!("REMOVE {}", quote_ident(&path.name)));
            }
        }
        if changes.is_empty() {
            return Ok(None);
        }
        let line_break = s.ctx.formatting.line_break();
        let mut statement = format!("ALTER INDEX {} ON {}", s.index_name(), self.parent.full_name());
        if let Some(namespaces) = stages::namespace_declarations(s, true) {
            statement.push_str(line_break);
            statement.push_str(&namespaces);
        }
        statement.push_str(line_break);
        statement.push_str(&format!("FOR ({})", changes.join(", ")));
        Ok(Some(statement))
    }
}

/// Create script for `index` on `parent`.
pub fn script_create(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Result<Vec<String>> {
    IndexScripter::new(index, parent, ctx).script_create()
}

/// Drop script for `index` on `parent`.
pub fn script_drop(index: &Index, parent: &TableRef, ctx: &ScriptingContext) -> Result<String> {
    IndexScripter::new(index, parent, ctx).script_drop()
}
