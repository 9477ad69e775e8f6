//! rust-sqlddl: version-aware SQL Server DDL synthesis
//!
//! Schema objects carry their state in property bags. Scripting takes an
//! object plus a [`ScriptingContext`] (target version, engine type, edition,
//! operation and layout) and returns the T-SQL statements that create,
//! alter, drop or maintain it on that target. Nothing here connects to a
//! server.
//!
//! ```text
//! snapshot + context ─► classifier ─► strategy stages ─► clause builder ─► statements
//!                                                                              │
//!                                                      assembler (databases) ◄─┘
//! ```

pub mod assembler;
pub mod channel;
pub mod clause;
pub mod compat;
pub mod context;
pub mod error;
pub mod index;
pub mod model;
pub mod property;
pub mod snapshot;
pub mod util;

pub use assembler::{script_table_indexes, DatabaseScripter};
pub use clause::{ClauseBuilder, ClauseValue, Termination};
pub use context::{
    EngineEdition, EngineType, Formatting, ScriptMode, ScriptingContext, SqlServerVersion,
};
pub use error::{DdlError, Result};
pub use index::{IndexScripter, IndexVariant};
pub use snapshot::{read_snapshot, save_snapshot, Snapshot, TableSnapshot};
