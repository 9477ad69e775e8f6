//! Index model: persisted properties plus per-call runtime options

use super::enums::{AbortAfterWait, CompressionType, XmlPathType};
use crate::compat::ObjectKind;
use crate::error::Result;
use crate::property::{LifecycleState, Property, PropertyBag, PropertyType, TrackedObject};

/// Property names of an index bag.
pub mod names {
    pub const INDEX_TYPE: &str = "IndexType";
    pub const INDEX_KEY_TYPE: &str = "IndexKeyType";
    pub const IS_CLUSTERED: &str = "IsClustered";
    pub const IS_UNIQUE: &str = "IsUnique";
    pub const IS_SYSTEM_NAMED: &str = "IsSystemNamed";
    pub const IS_DISABLED: &str = "IsDisabled";
    pub const IGNORE_DUPLICATE_KEYS: &str = "IgnoreDuplicateKeys";
    pub const PAD_INDEX: &str = "PadIndex";
    pub const NO_AUTOMATIC_RECOMPUTATION: &str = "NoAutomaticRecomputation";
    pub const DISALLOW_ROW_LOCKS: &str = "DisallowRowLocks";
    pub const DISALLOW_PAGE_LOCKS: &str = "DisallowPageLocks";
    pub const FILL_FACTOR: &str = "FillFactor";
    pub const OPTIMIZE_FOR_SEQUENTIAL_KEY: &str = "IsOptimizedForSequentialKey";
    pub const FILTER_DEFINITION: &str = "FilterDefinition";
    pub const FILE_GROUP: &str = "FileGroup";
    pub const PARTITION_SCHEME: &str = "PartitionScheme";
    pub const FILESTREAM_FILE_GROUP: &str = "FileStreamFileGroup";
    pub const FILESTREAM_PARTITION_SCHEME: &str = "FileStreamPartitionScheme";
    pub const PARENT_XML_INDEX: &str = "ParentXmlIndex";
    pub const SECONDARY_XML_INDEX_TYPE: &str = "SecondaryXmlIndexType";
    pub const INDEXED_XML_PATH_NAME: &str = "IndexedXmlPathName";
    pub const SPATIAL_INDEX_TYPE: &str = "SpatialIndexType";
    pub const BOUNDING_BOX_X_MIN: &str = "BoundingBoxXMin";
    pub const BOUNDING_BOX_Y_MIN: &str = "BoundingBoxYMin";
    pub const BOUNDING_BOX_X_MAX: &str = "BoundingBoxXMax";
    pub const BOUNDING_BOX_Y_MAX: &str = "BoundingBoxYMax";
    pub const LEVEL_GRIDS: [&str; 4] = ["Level1Grid", "Level2Grid", "Level3Grid", "Level4Grid"];
    pub const CELLS_PER_OBJECT: &str = "CellsPerObject";
    pub const BUCKET_COUNT: &str = "BucketCount";
    pub const COMPRESSION_DELAY: &str = "CompressionDelay";
    pub const HAS_COMPRESSED_PARTITIONS: &str = "HasCompressedPartitions";
    pub const HAS_XML_COMPRESSED_PARTITIONS: &str = "HasXmlCompressedPartitions";
}

/// One column reference of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedColumn {
    pub name: String,
    /// `None` scripts no sort direction
    pub descending: Option<bool>,
    pub is_included: bool,
    /// 1-based ordinal in a columnstore `ORDER (...)` list
    pub columnstore_order: Option<u32>,
}

impl IndexedColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: None,
            is_included: false,
            columnstore_order: None,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            descending: Some(false),
            ..Self::new(name)
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            descending: Some(true),
            ..Self::new(name)
        }
    }

    pub fn included(name: impl Into<String>) -> Self {
        Self {
            is_included: true,
            ..Self::new(name)
        }
    }

    pub fn ordered(mut self, ordinal: u32) -> Self {
        self.columnstore_order = Some(ordinal);
        self
    }
}

/// `WAIT_AT_LOW_PRIORITY` settings for online operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowPriorityWait {
    pub max_duration_minutes: u32,
    pub abort_after_wait: AbortAfterWait,
}

/// Destination of a clustered index drop that moves the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub data_space: String,
    /// Partitioning columns when `data_space` is a partition scheme
    pub partition_columns: Vec<String>,
}

/// Operation flags that are not persisted with the index.
///
/// Each flag is scripted only when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexRuntimeOptions {
    /// Replace an existing index of the same name in place
    pub drop_existing: Option<bool>,
    pub sort_in_tempdb: Option<bool>,
    pub online: Option<bool>,
    pub resumable: Option<bool>,
    /// Minutes; zero is omitted
    pub resumable_max_duration: Option<u32>,
    pub low_priority_wait: Option<LowPriorityWait>,
    pub max_dop: Option<u32>,
    pub move_to: Option<MoveTarget>,
}

impl IndexRuntimeOptions {
    pub fn is_drop_existing(&self) -> bool {
        self.drop_existing.unwrap_or(false)
    }

    pub fn is_online(&self) -> bool {
        self.online.unwrap_or(false)
    }

    pub fn is_resumable(&self) -> bool {
        self.resumable.unwrap_or(false)
    }
}

/// Compression state of one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalPartition {
    pub number: u32,
    pub data_compression: Property<CompressionType>,
    pub xml_compression: Property<bool>,
}

impl PhysicalPartition {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            data_compression: Property::new("DataCompression"),
            xml_compression: Property::new("XmlCompression"),
        }
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.data_compression.set(compression);
        self
    }

    pub fn with_xml_compression(mut self, on: bool) -> Self {
        self.xml_compression.set(on);
        self
    }

    pub fn compression(&self) -> CompressionType {
        self.data_compression
            .value()
            .copied()
            .unwrap_or(CompressionType::None)
    }

    fn commit(&mut self) {
        self.data_compression.commit();
        self.xml_compression.commit();
    }
}

/// Namespace declared for a selective XML index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNamespace {
    pub prefix: String,
    pub uri: String,
    pub is_default: bool,
    pub state: LifecycleState,
}

impl XmlNamespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
            is_default: false,
            state: LifecycleState::Creating,
        }
    }

    pub fn default_uri(uri: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::new("", uri)
        }
    }
}

/// Promoted path of a selective XML index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectivePath {
    pub name: String,
    pub path: String,
    pub path_type: XmlPathType,
    pub is_node: bool,
    pub xquery_type: Option<String>,
    pub max_length: Option<u32>,
    pub sql_type: Option<String>,
    pub is_singleton: bool,
    pub state: LifecycleState,
}

impl SelectivePath {
    pub fn xquery(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            path_type: XmlPathType::XQuery,
            is_node: false,
            xquery_type: None,
            max_length: None,
            sql_type: None,
            is_singleton: false,
            state: LifecycleState::Creating,
        }
    }

    pub fn sql(name: impl Into<String>, path: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            path_type: XmlPathType::Sql,
            sql_type: Some(sql_type.into()),
            ..Self::xquery(name, path)
        }
    }

    pub fn typed(mut self, xquery_type: impl Into<String>, max_length: Option<u32>) -> Self {
        self.xquery_type = Some(xquery_type.into());
        self.max_length = max_length;
        self
    }

    pub fn node(mut self) -> Self {
        self.is_node = true;
        self
    }

    pub fn singleton(mut self) -> Self {
        self.is_singleton = true;
        self
    }

    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

/// An index or the index backing a primary key / unique constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    object: TrackedObject,
    pub columns: Vec<IndexedColumn>,
    pub runtime: IndexRuntimeOptions,
    pub partitions: Vec<PhysicalPartition>,
    pub partition_scheme_parameters: Vec<String>,
    pub xml_namespaces: Vec<XmlNamespace>,
    pub selective_paths: Vec<SelectivePath>,
}

impl Index {
    /// A new index, not yet on the target.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_object(TrackedObject::new(ObjectKind::Index, name))
    }

    /// An index already materialized on the target.
    pub fn existing(name: impl Into<String>) -> Self {
        Self::from_object(TrackedObject::existing(ObjectKind::Index, name))
    }

    fn from_object(object: TrackedObject) -> Self {
        Self {
            object,
            columns: Vec::new(),
            runtime: IndexRuntimeOptions::default(),
            partitions: Vec::new(),
            partition_scheme_parameters: Vec::new(),
            xml_namespaces: Vec::new(),
            selective_paths: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: IndexedColumn) -> Self {
        self.object.attach();
        self.columns.push(column);
        self
    }

    pub fn with<T: PropertyType>(mut self, name: &str, value: T) -> Self {
        self.set(name, value);
        self
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn state(&self) -> LifecycleState {
        self.object.state()
    }

    pub fn object(&self) -> &TrackedObject {
        &self.object
    }

    pub(crate) fn object_mut(&mut self) -> &mut TrackedObject {
        &mut self.object
    }

    pub fn properties(&self) -> &PropertyBag {
        self.object.properties()
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        self.object.properties_mut()
    }

    pub fn set<T: PropertyType>(&mut self, name: &str, value: T) {
        self.object.set(name, value);
    }

    pub fn load<T: PropertyType>(&mut self, name: &str, value: T) {
        self.object.load(name, value);
    }

    pub fn key_columns(&self) -> impl Iterator<Item = &IndexedColumn> {
        self.columns.iter().filter(|c| !c.is_included)
    }

    /// The create script was applied.
    pub fn mark_created(&mut self) -> Result<()> {
        self.object.mark_created()?;
        self.commit_children();
        Ok(())
    }

    /// The alter script was applied.
    pub fn mark_altered(&mut self) -> Result<()> {
        self.object.mark_altered()?;
        self.commit_children();
        self.selective_paths
            .retain(|p| p.state != LifecycleState::ToBeDropped);
        Ok(())
    }

    pub fn mark_for_drop(&mut self) {
        self.object.mark_for_drop();
    }

    pub fn mark_dropped(&mut self) -> Result<()> {
        self.object.mark_dropped()
    }

    fn commit_children(&mut self) {
        for partition in &mut self.partitions {
            partition.commit();
        }
        for namespace in &mut self.xml_namespaces {
            namespace.state = LifecycleState::Existing;
        }
        for path in &mut self.selective_paths {
            if path.state.is_new() {
                path.state = LifecycleState::Existing;
            }
        }
    }
}
