//! Schema object model

mod database;
mod enums;
mod index;
mod table;

pub use database::{
    database_names, file_names, filegroup_names, DataFile, Database, FileGroup, LogFile,
};
pub use enums::*;
pub use index::{
    names, Index, IndexRuntimeOptions, IndexedColumn, LowPriorityWait, MoveTarget,
    PhysicalPartition, SelectivePath, XmlNamespace,
};
pub use table::{Column, ColumnType, ParentKind, TableRef};
