//! Closed value domains of schema object properties

use crate::property_enum;

property_enum! {
    /// Physical kind of an index.
    pub enum IndexType {
        Clustered => "Clustered",
        NonClustered => "NonClustered",
        PrimaryXml => "PrimaryXml",
        SecondaryXml => "SecondaryXml",
        Spatial => "Spatial",
        NonClusteredColumnstore => "NonClusteredColumnstore",
        ClusteredColumnstore => "ClusteredColumnstore",
        NonClusteredHash => "NonClusteredHash",
        SelectiveXml => "SelectiveXml",
        SecondarySelectiveXml => "SecondarySelectiveXml",
        Heap => "Heap",
    }
}

property_enum! {
    /// Constraint an index backs, if any.
    pub enum IndexKeyType {
        None => "None",
        PrimaryKey => "PrimaryKey",
        Unique => "Unique",
    }
}

property_enum! {
    pub enum SecondaryXmlIndexType {
        None => "None",
        Path => "Path",
        Value => "Value",
        Property => "Property",
    }
}

property_enum! {
    /// Tessellation scheme of a spatial index.
    pub enum SpatialIndexType {
        None => "None",
        GeometryGrid => "GeometryGrid",
        GeographyGrid => "GeographyGrid",
        GeometryAutoGrid => "GeometryAutoGrid",
        GeographyAutoGrid => "GeographyAutoGrid",
    }
}

property_enum! {
    /// Density of one spatial grid level.
    pub enum GridDensity {
        None => "None",
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

property_enum! {
    pub enum CompressionType {
        None => "NONE",
        Row => "ROW",
        Page => "PAGE",
        Columnstore => "COLUMNSTORE",
        ColumnstoreArchive => "COLUMNSTORE_ARCHIVE",
    }
}

property_enum! {
    /// What happens to blockers once a low-priority wait expires.
    pub enum AbortAfterWait {
        None => "NONE",
        SelfAbort => "SELF",
        Blockers => "BLOCKERS",
    }
}

property_enum! {
    /// Role of an indexed column in a graph table.
    pub enum GraphType {
        None => "None",
        GraphId => "GraphId",
        GraphIdComputed => "GraphIdComputed",
        GraphFromObjId => "GraphFromObjId",
        GraphFromId => "GraphFromId",
        GraphFromIdComputed => "GraphFromIdComputed",
        GraphToObjId => "GraphToObjId",
        GraphToId => "GraphToId",
        GraphToIdComputed => "GraphToIdComputed",
    }
}

property_enum! {
    pub enum DwDistribution {
        Hash => "HASH",
        RoundRobin => "ROUND_ROBIN",
        Replicate => "REPLICATE",
    }
}

property_enum! {
    pub enum XmlPathType {
        XQuery => "XQuery",
        Sql => "Sql",
    }
}

property_enum! {
    pub enum FileGroupType {
        Rows => "Rows",
        FileStream => "FileStream",
        MemoryOptimized => "MemoryOptimized",
    }
}

property_enum! {
    pub enum FileGrowthType {
        Kb => "KB",
        Percent => "Percent",
        None => "None",
    }
}

property_enum! {
    pub enum RecoveryModel {
        Full => "FULL",
        BulkLogged => "BULK_LOGGED",
        Simple => "SIMPLE",
    }
}

property_enum! {
    pub enum PageVerify {
        None => "NONE",
        TornPageDetection => "TORN_PAGE_DETECTION",
        Checksum => "CHECKSUM",
    }
}

property_enum! {
    pub enum UserAccess {
        Multiple => "MULTI_USER",
        Single => "SINGLE_USER",
        Restricted => "RESTRICTED_USER",
    }
}

property_enum! {
    pub enum ContainmentType {
        None => "NONE",
        Partial => "PARTIAL",
    }
}

property_enum! {
    pub enum DelayedDurability {
        Disabled => "DISABLED",
        Allowed => "ALLOWED",
        Forced => "FORCED",
    }
}

impl IndexType {
    /// Whether this kind is one of the XML families.
    pub fn is_xml(&self) -> bool {
        matches!(
            self,
            IndexType::PrimaryXml
                | IndexType::SecondaryXml
                | IndexType::SelectiveXml
                | IndexType::SecondarySelectiveXml
        )
    }

    pub fn is_columnstore(&self) -> bool {
        matches!(
            self,
            IndexType::ClusteredColumnstore | IndexType::NonClusteredColumnstore
        )
    }
}

impl IndexKeyType {
    pub fn is_constraint(&self) -> bool {
        *self != IndexKeyType::None
    }
}

impl GraphType {
    /// Name of the pseudo-column a graph column stands for, if any.
    ///
    /// `is_node` picks between `$node_id` and `$edge_id` for graph ids.
    pub fn pseudo_column(&self, is_node: bool) -> Option<&'static str> {
        match self {
            GraphType::GraphId => Some(if is_node { "$node_id" } else { "$edge_id" }),
            GraphType::GraphFromObjId | GraphType::GraphFromId => Some("$from_id"),
            GraphType::GraphToObjId | GraphType::GraphToId => Some("$to_id"),
            _ => None,
        }
    }

    /// Internally computed graph column, referenced unbracketed.
    pub fn is_computed(&self) -> bool {
        matches!(
            self,
            GraphType::GraphIdComputed | GraphType::GraphFromIdComputed | GraphType::GraphToIdComputed
        )
    }
}

/// Whether `name` is one of the graph pseudo-columns.
pub fn is_pseudo_column(name: &str) -> bool {
    matches!(name, "$node_id" | "$edge_id" | "$from_id" | "$to_id")
}
