//! Compatibility gate
//!
//! A static lookup table answering "is this property (or object type) legal
//! for this target?". Entries name a minimum version, an optional maximum
//! version, and optional engine-type and edition allow-lists. Properties
//! without an entry are legal everywhere.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use tracing::trace;

use crate::context::{EngineEdition, EngineType, ScriptingContext, SqlServerVersion};

/// Kind of scriptable object owning a property bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Database,
    FileGroup,
    DataFile,
    LogFile,
    Index,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Database => "Database",
            ObjectKind::FileGroup => "FileGroup",
            ObjectKind::DataFile => "DataFile",
            ObjectKind::LogFile => "LogFile",
            ObjectKind::Index => "Index",
        };
        f.write_str(name)
    }
}

/// One row of the compatibility table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatEntry {
    pub min_version: SqlServerVersion,
    pub max_version: Option<SqlServerVersion>,
    /// Empty means every engine type
    pub engine_types: &'static [EngineType],
    /// Empty means every edition
    pub editions: &'static [EngineEdition],
}

impl CompatEntry {
    pub const fn since(min_version: SqlServerVersion) -> Self {
        Self {
            min_version,
            max_version: None,
            engine_types: &[],
            editions: &[],
        }
    }

    pub const fn until(self, max_version: SqlServerVersion) -> Self {
        Self {
            max_version: Some(max_version),
            ..self
        }
    }

    pub const fn on(self, engine_types: &'static [EngineType]) -> Self {
        Self {
            engine_types,
            ..self
        }
    }

    pub const fn editions(self, editions: &'static [EngineEdition]) -> Self {
        Self { editions, ..self }
    }

    /// Whether a context satisfies this entry.
    pub fn allows(&self, ctx: &ScriptingContext) -> bool {
        if ctx.target_version < self.min_version {
            return false;
        }
        if let Some(max) = self.max_version {
            if ctx.target_version > max {
                return false;
            }
        }
        if !self.engine_types.is_empty() && !self.engine_types.contains(&ctx.engine_type) {
            return false;
        }
        // an unknown edition is not known to be excluded
        if !self.editions.is_empty()
            && ctx.edition != EngineEdition::Unknown
            && !self.editions.contains(&ctx.edition)
        {
            return false;
        }
        true
    }
}

use EngineType::{ArcManagedInstance, CloudDatabase, CloudDataWarehouse, ManagedInstance, Standalone};
use SqlServerVersion::*;

const ON_PREM: &[EngineType] = &[Standalone, ManagedInstance, ArcManagedInstance];
const NOT_DW: &[EngineType] = &[Standalone, ManagedInstance, ArcManagedInstance, CloudDatabase];
const CLOUD_ONLY: &[EngineType] = &[CloudDatabase, CloudDataWarehouse];
const STANDALONE_ONLY: &[EngineType] = &[Standalone];

const ALL: CompatEntry = CompatEntry::since(Sql80);

static OBJECT_TABLE: LazyLock<HashMap<ObjectKind, CompatEntry>> = LazyLock::new(|| {
    HashMap::from([
        (ObjectKind::Database, ALL),
        (ObjectKind::Index, ALL),
        (ObjectKind::FileGroup, ALL.on(ON_PREM)),
        (ObjectKind::DataFile, ALL.on(ON_PREM)),
        (ObjectKind::LogFile, ALL.on(ON_PREM)),
    ])
});

const INDEX_PROPERTIES: &[(&str, CompatEntry)] = &[
    ("DisallowRowLocks", CompatEntry::since(Sql90)),
    ("DisallowPageLocks", CompatEntry::since(Sql90)),
    ("IsDisabled", CompatEntry::since(Sql90)),
    ("ParentXmlIndex", CompatEntry::since(Sql90)),
    ("SecondaryXmlIndexType", CompatEntry::since(Sql90)),
    ("PartitionScheme", CompatEntry::since(Sql90).on(NOT_DW)),
    ("FileGroup", ALL.on(ON_PREM)),
    ("FilterDefinition", CompatEntry::since(Sql100)),
    ("HasCompressedPartitions", CompatEntry::since(Sql100).on(NOT_DW)),
    ("FileStreamFileGroup", CompatEntry::since(Sql100).on(ON_PREM)),
    ("FileStreamPartitionScheme", CompatEntry::since(Sql100).on(ON_PREM)),
    ("SpatialIndexType", CompatEntry::since(Sql100)),
    ("BoundingBoxXMin", CompatEntry::since(Sql100)),
    ("BoundingBoxYMin", CompatEntry::since(Sql100)),
    ("BoundingBoxXMax", CompatEntry::since(Sql100)),
    ("BoundingBoxYMax", CompatEntry::since(Sql100)),
    ("Level1Grid", CompatEntry::since(Sql100)),
    ("Level2Grid", CompatEntry::since(Sql100)),
    ("Level3Grid", CompatEntry::since(Sql100)),
    ("Level4Grid", CompatEntry::since(Sql100)),
    ("CellsPerObject", CompatEntry::since(Sql100)),
    ("IndexedXmlPathName", CompatEntry::since(Sql110)),
    ("BucketCount", CompatEntry::since(Sql120)),
    ("CompressionDelay", CompatEntry::since(Sql130)),
    ("IsOptimizedForSequentialKey", CompatEntry::since(Sql150).on(NOT_DW)),
    ("HasXmlCompressedPartitions", CompatEntry::since(Sql160).on(NOT_DW)),
];

const DATABASE_PROPERTIES: &[(&str, CompatEntry)] = &[
    ("RecoveryModel", ALL.on(ON_PREM)),
    ("AutoClose", ALL.on(ON_PREM)),
    ("AutoShrink", ALL.on(ON_PREM)),
    ("Trustworthy", CompatEntry::since(Sql90).on(ON_PREM)),
    ("BrokerEnabled", CompatEntry::since(Sql90).on(ON_PREM)),
    ("DateCorrelationOptimization", CompatEntry::since(Sql90).on(ON_PREM)),
    ("AutoUpdateStatisticsAsync", CompatEntry::since(Sql90)),
    ("IsParameterizationForced", CompatEntry::since(Sql90)),
    ("IsReadCommittedSnapshotOn", CompatEntry::since(Sql90).on(NOT_DW)),
    ("PageVerify", CompatEntry::since(Sql90).on(ON_PREM)),
    ("UserAccess", ALL.on(NOT_DW)),
    ("ContainmentType", CompatEntry::since(Sql110).on(ON_PREM)),
    ("TargetRecoveryTime", CompatEntry::since(Sql110).on(NOT_DW)),
    ("DelayedDurability", CompatEntry::since(Sql120).on(NOT_DW)),
    ("AcceleratedRecoveryEnabled", CompatEntry::since(Sql150).on(STANDALONE_ONLY)),
    ("AzureEdition", ALL.on(CLOUD_ONLY)),
    ("AzureServiceObjective", ALL.on(CLOUD_ONLY)),
    ("MaxSizeInBytes", ALL.on(CLOUD_ONLY)),
    (
        "DatabaseOwnershipChaining",
        CompatEntry::since(Sql90).on(STANDALONE_ONLY),
    ),
];

const FILEGROUP_PROPERTIES: &[(&str, CompatEntry)] = &[
    ("FileGroupType", CompatEntry::since(Sql100)),
    ("AutogrowAllFiles", CompatEntry::since(Sql130)),
];

static PROPERTY_TABLE: LazyLock<HashMap<ObjectKind, HashMap<&'static str, CompatEntry>>> =
    LazyLock::new(|| {
        HashMap::from([
            (ObjectKind::Index, INDEX_PROPERTIES.iter().copied().collect()),
            (
                ObjectKind::Database,
                DATABASE_PROPERTIES.iter().copied().collect(),
            ),
            (
                ObjectKind::FileGroup,
                FILEGROUP_PROPERTIES.iter().copied().collect(),
            ),
        ])
    });

/// The table entry for a property, if it has one.
pub fn entry(kind: ObjectKind, property: &str) -> Option<&'static CompatEntry> {
    PROPERTY_TABLE
        .get(&kind)
        .and_then(|properties| properties.get(property))
}

/// Minimum version a property needs, if it is gated.
pub fn min_version(kind: ObjectKind, property: &str) -> Option<SqlServerVersion> {
    entry(kind, property).map(|e| e.min_version)
}

/// Whether `property` of a `kind` object may be read or scripted under `ctx`.
pub fn is_supported(kind: ObjectKind, property: &str, ctx: &ScriptingContext) -> bool {
    let supported = entry(kind, property).map_or(true, |e| e.allows(ctx));
    if !supported {
        trace!(%kind, property, version = %ctx.target_version, engine = %ctx.engine_type, "property gated out");
    }
    supported
}

/// Whether objects of `kind` can be scripted at all under `ctx`.
pub fn is_object_supported(kind: ObjectKind, ctx: &ScriptingContext) -> bool {
    OBJECT_TABLE.get(&kind).map_or(true, |e| e.allows(ctx))
}
