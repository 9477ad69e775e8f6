//! Snapshot documents
//!
//! A small XML format holding the state of one database or one table with
//! its indexes. Reading a snapshot loads every `Value` as committed and
//! retrieved; a `Pending` attribute replays a change on top of it.
//!
//! ```xml
//! <Database Name="Sales" State="Existing">
//!   <Property Name="RecoveryModel" Value="FULL"/>
//!   <FileGroup Name="PRIMARY">
//!     <File Name="Sales"><Property Name="FileName" Value="C:\data\Sales.mdf"/></File>
//!   </FileGroup>
//!   <LogFile Name="Sales_log"/>
//! </Database>
//! ```

mod reader;
mod writer;

use std::path::Path;

use anyhow::Context;

use crate::error::{DdlError, Result};
use crate::model::{Database, Index, TableRef};

pub use reader::parse_snapshot;
pub use writer::{write_snapshot, write_snapshot_to_string};

/// A table and the indexes defined on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub table: TableRef,
    pub indexes: Vec<Index>,
}

impl TableSnapshot {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            indexes: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn index(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|i| i.name() == name)
    }
}

/// Root object of a snapshot document.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Database(Database),
    Table(TableSnapshot),
}

impl Snapshot {
    pub fn into_database(self) -> Option<Database> {
        match self {
            Snapshot::Database(database) => Some(database),
            Snapshot::Table(_) => None,
        }
    }

    pub fn into_table(self) -> Option<TableSnapshot> {
        match self {
            Snapshot::Table(table) => Some(table),
            Snapshot::Database(_) => None,
        }
    }
}

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path).map_err(|e| DdlError::SnapshotRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_snapshot(&content)
}

/// Write a snapshot file, creating parent directories as needed.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create snapshot file: {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    write_snapshot(&mut writer, snapshot)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    std::io::Write::flush(&mut writer)?;
    Ok(())
}
