//! Database assembler
//!
//! Composes the statements of a database and its storage layout in
//! dependency order: `USE [master]`, the guarded `CREATE DATABASE`, option
//! statements, then anything that can only run once the database exists.
//! Cloud targets never receive `USE` and never see files or filegroups.
//!
//! Tables compose the same way over their indexes, see
//! [`script_table_indexes`].

mod files;
mod options;
mod tables;

use tracing::debug;

use crate::clause::{ClauseBuilder, Termination};
use crate::compat::{self, ObjectKind};
use crate::context::{ScriptMode, ScriptingContext, SqlServerVersion};
use crate::error::{DdlError, Result};
use crate::model::{
    database_names, file_names, filegroup_names, DataFile, Database, FileGroup, FileGroupType,
    LogFile,
};
use crate::property::LifecycleState;
use crate::util::{quote_ident, sql_string};

use files::{FileSpec, FileSpecUse};

pub use tables::script_table_indexes;

/// Scripts one database.
pub struct DatabaseScripter<'a> {
    database: &'a Database,
    ctx: ScriptingContext,
}

/// Statements in execution order, with the `USE` bookkeeping.
struct Batch<'a> {
    ctx: &'a ScriptingContext,
    database: String,
    statements: Vec<String>,
    in_database: bool,
}

impl<'a> Batch<'a> {
    fn new(ctx: &'a ScriptingContext, database: &str) -> Self {
        Self {
            ctx,
            database: quote_ident(database),
            statements: Vec::new(),
            in_database: false,
        }
    }

    fn push(&mut self, statement: String) {
        self.statements.push(statement);
    }

    /// `ALTER DATABASE [d] {rest}`
    fn alter(&mut self, rest: impl AsRef<str>) {
        let statement = format!("ALTER DATABASE {} {}", self.database, rest.as_ref());
        self.push(statement);
    }

    /// Switch to the database itself for statements that need its context.
    fn use_database(&mut self) {
        if self.ctx.allows_context_switch() && !self.in_database {
            self.push(format!("USE {}", self.database));
            self.in_database = true;
        }
    }

    fn finish(self) -> Vec<String> {
        self.statements
    }
}

fn is_filestream(filegroup: &FileGroup, ctx: &ScriptingContext) -> Result<bool> {
    let kind = filegroup
        .properties()
        .get_if_supported::<FileGroupType>(filegroup_names::FILE_GROUP_TYPE, ctx)?;
    Ok(matches!(
        kind,
        Some(FileGroupType::FileStream | FileGroupType::MemoryOptimized)
    ))
}

fn contains_clause(filegroup: &FileGroup, ctx: &ScriptingContext) -> Result<Option<&'static str>> {
    let kind = filegroup
        .properties()
        .get_if_supported::<FileGroupType>(filegroup_names::FILE_GROUP_TYPE, ctx)?;
    Ok(match kind {
        Some(FileGroupType::FileStream) => Some("CONTAINS FILESTREAM"),
        Some(FileGroupType::MemoryOptimized) => Some("CONTAINS MEMORY_OPTIMIZED_DATA"),
        _ => None,
    })
}

fn is_primary_file(file: &DataFile, ctx: &ScriptingContext) -> Result<bool> {
    file.properties()
        .get_or(file_names::IS_PRIMARY_FILE, ctx, false)
}

fn is_default(filegroup: &FileGroup, ctx: &ScriptingContext) -> Result<bool> {
    filegroup
        .properties()
        .get_or(filegroup_names::IS_DEFAULT, ctx, false)
}

impl<'a> DatabaseScripter<'a> {
    pub fn new(database: &'a Database, ctx: &ScriptingContext) -> Self {
        Self {
            database,
            ctx: *ctx,
        }
    }

    fn object_name(&self) -> String {
        format!("Database {}", self.database.name())
    }

    fn has_storage(&self, ctx: &ScriptingContext) -> bool {
        compat::is_object_supported(ObjectKind::FileGroup, ctx)
    }

    fn existence_guard(&self, exists: bool) -> String {
        let not = if exists { "" } else { "NOT " };
        let catalog = if self.ctx.at_least(SqlServerVersion::Sql90) {
            "sys.databases"
        } else {
            "master.dbo.sysdatabases"
        };
        format!(
            "IF {}EXISTS (SELECT name FROM {} WHERE name = {})",
            not,
            catalog,
            sql_string(self.database.name())
        )
    }

    fn guarded(&self, ctx: &ScriptingContext, exists: bool, statement: String) -> String {
        if ctx.formatting.existence_check {
            format!(
                "{}{}{}",
                self.existence_guard(exists),
                ctx.formatting.line_break(),
                statement
            )
        } else {
            statement
        }
    }

    fn data_file_spec<'f>(
        &self,
        file: &'f DataFile,
        filegroup: &FileGroup,
        ctx: &ScriptingContext,
    ) -> Result<FileSpec<'f>> {
        Ok(FileSpec {
            name: file.name(),
            bag: file.properties(),
            filestream: is_filestream(filegroup, ctx)?,
            with_file_name: !ctx.is_managed_instance(),
        })
    }

    fn log_file_spec<'f>(&self, file: &'f LogFile, ctx: &ScriptingContext) -> FileSpec<'f> {
        FileSpec {
            name: file.name(),
            bag: file.properties(),
            filestream: false,
            with_file_name: !ctx.is_managed_instance(),
        }
    }

    /// File specifications of one filegroup, primary file first.
    fn filegroup_files(&self, filegroup: &FileGroup, ctx: &ScriptingContext) -> Result<Vec<String>> {
        let mut ordered: Vec<&DataFile> = Vec::with_capacity(filegroup.files.len());
        for file in &filegroup.files {
            if is_primary_file(file, ctx)? {
                ordered.insert(0, file);
            } else {
                ordered.push(file);
            }
        }
        let mut specs = Vec::with_capacity(ordered.len());
        for file in ordered {
            let spec = self.data_file_spec(file, filegroup, ctx)?;
            if let Some(text) = spec.render(ctx, FileSpecUse::Define)? {
                specs.push(text);
            }
        }
        Ok(specs)
    }

    /// `ON PRIMARY (...), FILEGROUP [fg] ... (...)` and `LOG ON (...)`.
    fn storage_clauses(&self, ctx: &ScriptingContext) -> Result<Vec<String>> {
        let lb = ctx.formatting.line_break();
        let list_separator = format!(",{}", lb);
        let mut groups = Vec::new();

        let primary = self.database.filegroups.iter().find(|fg| fg.is_primary());
        if let Some(primary) = primary {
            let files = self.filegroup_files(primary, ctx)?;
            if files.is_empty() {
                return Err(DdlError::not_set(
                    self.object_name(),
                    "PRIMARY filegroup files",
                ));
            }
            groups.push(format!("PRIMARY{}{}", lb, files.join(&list_separator)));
        }

        for filegroup in self.database.filegroups.iter().filter(|fg| !fg.is_primary()) {
            let mut header = format!("FILEGROUP {}", quote_ident(filegroup.name()));
            if let Some(contains) = contains_clause(filegroup, ctx)? {
                header.push(' ');
                header.push_str(contains);
            }
            if is_default(filegroup, ctx)? {
                header.push_str(" DEFAULT");
            }
            let files = self.filegroup_files(filegroup, ctx)?;
            if files.is_empty() {
                groups.push(header);
            } else {
                groups.push(format!("{}{}{}", header, lb, files.join(&list_separator)));
            }
        }

        let mut clauses = Vec::new();
        if !groups.is_empty() {
            if primary.is_none() {
                // a filegroup list must start with the primary file list
                return Err(DdlError::not_set(self.object_name(), "PRIMARY filegroup"));
            }
            clauses.push(format!("ON {}", groups.join(&list_separator)));
        }

        let mut logs = Vec::new();
        for log_file in &self.database.log_files {
            if let Some(text) = self.log_file_spec(log_file, ctx).render(ctx, FileSpecUse::Define)? {
                logs.push(text);
            }
        }
        if !logs.is_empty() {
            clauses.push(format!("LOG ON{}{}", lb, logs.join(&list_separator)));
        }
        Ok(clauses)
    }

    fn create_statement(&self, ctx: &ScriptingContext) -> Result<String> {
        let bag = self.database.properties();
        let lb = ctx.formatting.line_break();
        let mut parts = vec![format!("CREATE DATABASE {}", quote_ident(self.database.name()))];

        let mut containment = ClauseBuilder::new(ctx);
        options::containment(&mut containment, bag)?;
        parts.extend(containment.into_fragments());

        if self.has_storage(ctx) && !ctx.is_managed_instance() {
            parts.extend(self.storage_clauses(ctx)?);
        }

        if let Some(collation) = bag.get_if_supported::<String>(database_names::COLLATION, ctx)? {
            parts.push(format!("COLLATE {}", collation));
        }

        if ctx.is_cloud() {
            let mut service = ClauseBuilder::new(ctx);
            options::service_options(&mut service, bag)?;
            if let Some(service) = service.finish("(", ")") {
                parts.push(service);
            }
        }
        Ok(parts.join(lb))
    }

    /// Statements a managed instance can only run once the database exists:
    /// files are added without physical names.
    fn deferred_storage(&self, ctx: &ScriptingContext, batch: &mut Batch<'_>) -> Result<()> {
        for filegroup in &self.database.filegroups {
            if !filegroup.is_primary() {
                batch.alter(self.add_filegroup(filegroup, ctx)?);
            }
            for file in &filegroup.files {
                if filegroup.is_primary() && is_primary_file(file, ctx)? {
                    continue;
                }
                self.add_file(file, filegroup, ctx, batch)?;
            }
        }
        for log_file in &self.database.log_files {
            self.add_log_file(log_file, ctx, batch)?;
        }
        Ok(())
    }

    fn add_filegroup(&self, filegroup: &FileGroup, ctx: &ScriptingContext) -> Result<String> {
        let mut rest = format!("ADD FILEGROUP {}", quote_ident(filegroup.name()));
        if let Some(contains) = contains_clause(filegroup, ctx)? {
            rest.push(' ');
            rest.push_str(contains);
        }
        Ok(rest)
    }

    fn add_file(
        &self,
        file: &DataFile,
        filegroup: &FileGroup,
        ctx: &ScriptingContext,
        batch: &mut Batch<'_>,
    ) -> Result<()> {
        let spec = self.data_file_spec(file, filegroup, ctx)?;
        if let Some(text) = spec.render(ctx, FileSpecUse::Define)? {
            batch.alter(format!(
                "ADD FILE {} TO FILEGROUP {}",
                text,
                quote_ident(filegroup.name())
            ));
        }
        Ok(())
    }

    fn add_log_file(&self, file: &LogFile, ctx: &ScriptingContext, batch: &mut Batch<'_>) -> Result<()> {
        if let Some(text) = self.log_file_spec(file, ctx).render(ctx, FileSpecUse::Define)? {
            batch.alter(format!("ADD LOG FILE {}", text));
        }
        Ok(())
    }

    fn modify_file(&self, spec: FileSpec<'_>, ctx: &ScriptingContext, batch: &mut Batch<'_>) -> Result<()> {
        if let Some(text) = spec.render(ctx, FileSpecUse::Modify)? {
            batch.alter(format!("MODIFY FILE {}", text));
        }
        Ok(())
    }

    fn set_default(&self, filegroup: &FileGroup, batch: &mut Batch<'_>) {
        batch.use_database();
        batch.alter(format!(
            "MODIFY FILEGROUP {} DEFAULT",
            quote_ident(filegroup.name())
        ));
    }

    fn set_statements(
        &self,
        ctx: &ScriptingContext,
        termination: Option<&Termination>,
        batch: &mut Batch<'_>,
    ) -> Result<()> {
        let mut clause = ClauseBuilder::new(ctx);
        options::set_options(&mut clause, self.database.properties(), termination)?;
        for fragment in clause.into_fragments() {
            batch.alter(format!("SET {}", fragment));
        }
        Ok(())
    }

    fn read_only_statement(
        &self,
        ctx: &ScriptingContext,
        termination: Option<&Termination>,
        batch: &mut Batch<'_>,
    ) -> Result<()> {
        let mut clause = ClauseBuilder::new(ctx);
        options::read_only(&mut clause, self.database.properties(), termination)?;
        for fragment in clause.into_fragments() {
            batch.alter(format!("SET {}", fragment));
        }
        Ok(())
    }

    /// Full creation script.
    ///
    /// An existing database may be scripted out as it stands.
    pub fn script_create(&self) -> Result<Vec<String>> {
        self.database.object().ensure_definable()?;
        let ctx = self.ctx.with_mode(ScriptMode::ForCreate);
        let mut batch = Batch::new(&ctx, self.database.name());

        if ctx.allows_context_switch() {
            batch.push("USE [master]".to_string());
        }
        let create = self.create_statement(&ctx)?;
        batch.push(self.guarded(&ctx, false, create));

        self.set_statements(&ctx, None, &mut batch)?;

        if self.has_storage(&ctx) && ctx.is_managed_instance() {
            self.deferred_storage(&ctx, &mut batch)?;
            for filegroup in self.database.filegroups.iter().filter(|fg| !fg.is_primary()) {
                if is_default(filegroup, &ctx)? {
                    self.set_default(filegroup, &mut batch);
                }
            }
        }

        self.read_only_statement(&ctx, None, &mut batch)?;

        let statements = batch.finish();
        debug!(
            database = self.database.name(),
            count = statements.len(),
            "scripted database create"
        );
        Ok(statements)
    }

    /// Changed options and storage changes of an existing database.
    ///
    /// `termination` is applied to the options that accept one.
    pub fn script_alter(&self, termination: Option<Termination>) -> Result<Vec<String>> {
        self.database.object().ensure_existing("alter")?;
        let ctx = self.ctx.with_mode(ScriptMode::ForDirectExecution);
        let termination = termination.as_ref();
        let bag = self.database.properties();
        let mut batch = Batch::new(&ctx, self.database.name());

        // leaving read-only must happen before anything else can change
        let becomes_writable =
            bag.get_if_supported::<bool>(database_names::READ_ONLY, &ctx)? == Some(false);
        if becomes_writable {
            self.read_only_statement(&ctx, termination, &mut batch)?;
        }

        if bag.is_dirty(database_names::COLLATION) {
            if let Some(collation) = bag.get_if_supported::<String>(database_names::COLLATION, &ctx)? {
                batch.alter(format!("COLLATE {}", collation));
            }
        }

        let mut containment = ClauseBuilder::new(&ctx);
        options::containment(&mut containment, bag)?;
        for fragment in containment.into_fragments() {
            batch.alter(format!("SET {}", fragment));
        }

        if ctx.is_cloud() {
            let mut service = ClauseBuilder::new(&ctx);
            options::service_options(&mut service, bag)?;
            if let Some(service) = service.finish("MODIFY (", ")") {
                batch.alter(service);
            }
        }

        self.set_statements(&ctx, termination, &mut batch)?;

        if self.has_storage(&ctx) {
            self.alter_storage(&ctx, &mut batch)?;
        }

        if !becomes_writable {
            self.read_only_statement(&ctx, termination, &mut batch)?;
        }

        let mut statements = batch.finish();
        if !statements.is_empty() && ctx.allows_context_switch() {
            statements.insert(0, "USE [master]".to_string());
        }
        debug!(
            database = self.database.name(),
            count = statements.len(),
            "scripted database alter"
        );
        Ok(statements)
    }

    fn alter_storage(&self, ctx: &ScriptingContext, batch: &mut Batch<'_>) -> Result<()> {
        let mut defaults = Vec::new();

        for filegroup in &self.database.filegroups {
            let state = filegroup.state();
            if state == LifecycleState::ToBeDropped {
                continue;
            }
            if state.is_new() {
                batch.alter(self.add_filegroup(filegroup, ctx)?);
            } else {
                self.alter_filegroup(filegroup, ctx, batch)?;
            }
            for file in &filegroup.files {
                match file.state() {
                    LifecycleState::ToBeDropped | LifecycleState::Dropped => {}
                    s if s.is_new() => self.add_file(file, filegroup, ctx, batch)?,
                    _ => {
                        let spec = self.data_file_spec(file, filegroup, ctx)?;
                        self.modify_file(spec, ctx, batch)?;
                    }
                }
            }
            if filegroup.properties().is_dirty(filegroup_names::IS_DEFAULT) {
                if !is_default(filegroup, ctx)? {
                    return Err(DdlError::wrong_value(
                        format!("FileGroup {}", filegroup.name()),
                        filegroup_names::IS_DEFAULT,
                        "a filegroup stops being the default only when another one becomes it",
                    ));
                }
                defaults.push(filegroup);
            }
        }

        for log_file in &self.database.log_files {
            match log_file.state() {
                LifecycleState::ToBeDropped | LifecycleState::Dropped => {}
                s if s.is_new() => self.add_log_file(log_file, ctx, batch)?,
                _ => self.modify_file(self.log_file_spec(log_file, ctx), ctx, batch)?,
            }
        }

        // files go before the group that holds them
        for filegroup in &self.database.filegroups {
            let dropping_group = filegroup.state() == LifecycleState::ToBeDropped;
            for file in &filegroup.files {
                if dropping_group || file.state() == LifecycleState::ToBeDropped {
                    batch.alter(format!("REMOVE FILE {}", quote_ident(file.name())));
                }
            }
        }
        for log_file in &self.database.log_files {
            if log_file.state() == LifecycleState::ToBeDropped {
                batch.alter(format!("REMOVE FILE {}", quote_ident(log_file.name())));
            }
        }
        for filegroup in &self.database.filegroups {
            if filegroup.state() == LifecycleState::ToBeDropped {
                batch.alter(format!("REMOVE FILEGROUP {}", quote_ident(filegroup.name())));
            }
        }

        for filegroup in defaults {
            self.set_default(filegroup, batch);
        }
        Ok(())
    }

    fn alter_filegroup(
        &self,
        filegroup: &FileGroup,
        ctx: &ScriptingContext,
        batch: &mut Batch<'_>,
    ) -> Result<()> {
        let bag = filegroup.properties();
        let name = quote_ident(filegroup.name());
        if bag.is_dirty(filegroup_names::READ_ONLY) {
            if let Some(read_only) = bag.get_if_supported::<bool>(filegroup_names::READ_ONLY, ctx)? {
                let mode = if read_only { "READONLY" } else { "READWRITE" };
                batch.alter(format!("MODIFY FILEGROUP {} {}", name, mode));
            }
        }
        if bag.is_dirty(filegroup_names::AUTOGROW_ALL_FILES) {
            if let Some(all) = bag.get_if_supported::<bool>(filegroup_names::AUTOGROW_ALL_FILES, ctx)? {
                let mode = if all {
                    "AUTOGROW_ALL_FILES"
                } else {
                    "AUTOGROW_SINGLE_FILE"
                };
                batch.alter(format!("MODIFY FILEGROUP {} {}", name, mode));
            }
        }
        Ok(())
    }

    /// Guarded `DROP DATABASE`.
    pub fn script_drop(&self) -> Result<Vec<String>> {
        self.database.object().ensure_droppable()?;
        let ctx = self.ctx.with_mode(ScriptMode::ForDrop);
        let mut statements = Vec::new();
        if ctx.allows_context_switch() {
            statements.push("USE [master]".to_string());
        }

        let name = quote_ident(self.database.name());
        let statement = if ctx.formatting.existence_check && ctx.at_least(SqlServerVersion::Sql130) {
            format!("DROP DATABASE IF EXISTS {}", name)
        } else {
            self.guarded(&ctx, true, format!("DROP DATABASE {}", name))
        };
        statements.push(statement);
        debug!(
            database = self.database.name(),
            count = statements.len(),
            "scripted database drop"
        );
        Ok(statements)
    }
}

/// Creation script of `database` for `ctx`.
pub fn script_create(database: &Database, ctx: &ScriptingContext) -> Result<Vec<String>> {
    DatabaseScripter::new(database, ctx).script_create()
}

/// Alter script of `database`, with an optional termination clause.
pub fn script_alter(
    database: &Database,
    ctx: &ScriptingContext,
    termination: Option<Termination>,
) -> Result<Vec<String>> {
    DatabaseScripter::new(database, ctx).script_alter(termination)
}

pub fn script_drop(database: &Database, ctx: &ScriptingContext) -> Result<Vec<String>> {
    DatabaseScripter::new(database, ctx).script_drop()
}
