//! Scripting context: what the generated DDL is targeted at
//!
//! A [`ScriptingContext`] is a small value passed by reference through one
//! scripting call tree. It is never mutated in place; the `with_*` methods
//! return an adjusted copy for the one call level that needs it.

mod version;

pub use version::{EngineEdition, EngineType, SqlServerVersion};

use crate::error::{DdlError, Result};

/// The operation a script is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScriptMode {
    /// Script the full definition for creation
    #[default]
    ForCreate,
    /// Script the full current definition of an existing object
    ForAlter,
    /// Script only the delta that a live alter would send
    ForDirectExecution,
    ForRebuild,
    ForResume,
    ForDrop,
}

/// Layout and guard flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatting {
    /// Wrap statements in `IF [NOT] EXISTS (...)` guards
    pub existence_check: bool,
    /// Qualify object names with their schema
    pub schema_qualify: bool,
    /// Lay statements out over several lines (column lists, guards)
    pub newline: bool,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            existence_check: false,
            schema_qualify: true,
            newline: true,
        }
    }
}

impl Formatting {
    /// Everything on one line, no guards.
    pub fn single_line() -> Self {
        Self {
            newline: false,
            ..Self::default()
        }
    }

    /// Line separator between parts of one statement.
    pub fn line_break(&self) -> &'static str {
        if self.newline {
            "\n"
        } else {
            " "
        }
    }

    /// Indentation for items inside a parenthesized list.
    pub fn indent(&self) -> &'static str {
        if self.newline {
            "\t"
        } else {
            ""
        }
    }
}

/// Immutable record of the target and the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptingContext {
    pub target_version: SqlServerVersion,
    pub engine_type: EngineType,
    pub edition: EngineEdition,
    pub mode: ScriptMode,
    pub formatting: Formatting,
}

impl Default for ScriptingContext {
    fn default() -> Self {
        Self::new(SqlServerVersion::default())
    }
}

impl ScriptingContext {
    pub fn new(target_version: SqlServerVersion) -> Self {
        Self {
            target_version,
            engine_type: EngineType::Standalone,
            edition: EngineEdition::Unknown,
            mode: ScriptMode::ForCreate,
            formatting: Formatting::default(),
        }
    }

    pub fn with_version(self, target_version: SqlServerVersion) -> Self {
        Self {
            target_version,
            ..self
        }
    }

    pub fn with_engine_type(self, engine_type: EngineType) -> Self {
        Self {
            engine_type,
            ..self
        }
    }

    pub fn with_edition(self, edition: EngineEdition) -> Self {
        Self { edition, ..self }
    }

    pub fn with_mode(self, mode: ScriptMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_formatting(self, formatting: Formatting) -> Self {
        Self { formatting, ..self }
    }

    pub fn with_existence_check(self, existence_check: bool) -> Self {
        Self {
            formatting: Formatting {
                existence_check,
                ..self.formatting
            },
            ..self
        }
    }

    /// Azure-hosted logical server (database or data warehouse).
    pub fn is_cloud(&self) -> bool {
        matches!(
            self.engine_type,
            EngineType::CloudDatabase | EngineType::CloudDataWarehouse
        )
    }

    pub fn is_cloud_database(&self) -> bool {
        self.engine_type == EngineType::CloudDatabase
    }

    pub fn is_data_warehouse(&self) -> bool {
        self.engine_type == EngineType::CloudDataWarehouse
            || self.edition == EngineEdition::SqlDataWarehouse
    }

    /// Data warehouse and stretch targets compress everything implicitly and
    /// reject explicit compression and most physical options.
    pub fn is_dw_or_stretch(&self) -> bool {
        self.is_data_warehouse() || self.edition == EngineEdition::SqlStretchDatabase
    }

    pub fn is_managed_instance(&self) -> bool {
        matches!(
            self.engine_type,
            EngineType::ManagedInstance | EngineType::ArcManagedInstance
        ) || self.edition == EngineEdition::SqlManagedInstance
    }

    /// Whether `USE [db]` may appear mid-script.
    pub fn allows_context_switch(&self) -> bool {
        !self.is_cloud()
    }

    /// Only dirty properties are scripted.
    pub fn is_delta_only(&self) -> bool {
        self.mode == ScriptMode::ForDirectExecution
    }

    pub fn at_least(&self, version: SqlServerVersion) -> bool {
        self.target_version >= version
    }

    /// Fail with `UnsupportedVersion` when the target is older than `version`.
    pub fn require(&self, feature: &str, version: SqlServerVersion) -> Result<()> {
        if self.target_version < version {
            return Err(DdlError::unsupported_version(
                feature,
                self.target_version,
                version,
            ));
        }
        Ok(())
    }
}
