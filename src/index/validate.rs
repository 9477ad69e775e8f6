//! Pre-script validation
//!
//! Each variant checks the property families that make no sense for it
//! before any text is produced, so a bad definition fails as a whole.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::SqlServerVersion;
use crate::error::{DdlError, Result};
use crate::model::{names, GridDensity, IndexKeyType, SecondaryXmlIndexType, SpatialIndexType};
use crate::property::PropertyType;

use super::classifier::check_clustering_conflict;
use super::{IndexVariant, Strategy};

/// Names the engine generates for unnamed constraints:
/// `PK__Orders__3214EC07A1B2C3D4`, `UQ__T__C5B6...`.
static SYSTEM_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(PK|UQ)__.+__[0-9A-F]{8,16}$").expect("valid system name regex")
});

/// Whether a constraint name was generated by the engine.
pub(super) fn is_system_named(s: &Strategy<'_>) -> Result<bool> {
    match s.get::<bool>(names::IS_SYSTEM_NAMED)? {
        Some(flag) => Ok(flag),
        None => Ok(SYSTEM_NAMED.is_match(s.index.name())),
    }
}

/// Fail when `name` holds something other than its neutral value.
fn forbid<T: PropertyType + PartialEq>(
    s: &Strategy<'_>,
    name: &str,
    neutral: T,
    reason: &str,
) -> Result<()> {
    match s.get::<T>(name)? {
        Some(value) if value != neutral => Err(DdlError::not_supported(s.object_name(), name, reason)),
        _ => Ok(()),
    }
}

fn forbid_text(s: &Strategy<'_>, name: &str, reason: &str) -> Result<()> {
    if s.text(name)?.is_some() {
        return Err(DdlError::not_supported(s.object_name(), name, reason));
    }
    Ok(())
}

fn check_spatial_properties(s: &Strategy<'_>) -> Result<()> {
    const REASON: &str = "only spatial indexes have tessellation settings";
    forbid(s, names::SPATIAL_INDEX_TYPE, SpatialIndexType::None, REASON)?;
    for name in [
        names::BOUNDING_BOX_X_MIN,
        names::BOUNDING_BOX_Y_MIN,
        names::BOUNDING_BOX_X_MAX,
        names::BOUNDING_BOX_Y_MAX,
    ] {
        forbid(s, name, 0.0_f64, REASON)?;
    }
    for name in names::LEVEL_GRIDS {
        forbid(s, name, GridDensity::None, REASON)?;
    }
    forbid(s, names::CELLS_PER_OBJECT, 0_i64, REASON)
}

fn check_xml_properties(s: &Strategy<'_>) -> Result<()> {
    const REASON: &str = "only XML indexes reference a parent XML index";
    forbid_text(s, names::PARENT_XML_INDEX, REASON)?;
    forbid(s, names::SECONDARY_XML_INDEX_TYPE, SecondaryXmlIndexType::None, REASON)
}

fn check_nonclustered_properties(s: &Strategy<'_>) -> Result<()> {
    forbid_text(
        s,
        names::FILTER_DEFINITION,
        "only non-clustered indexes can be filtered",
    )
}

fn check_clustered_properties(s: &Strategy<'_>) -> Result<()> {
    const REASON: &str = "FILESTREAM placement applies to clustered indexes only";
    forbid_text(s, names::FILESTREAM_FILE_GROUP, REASON)?;
    forbid_text(s, names::FILESTREAM_PARTITION_SCHEME, REASON)
}

/// Flags that only a regular b-tree index carries.
fn check_regular_properties(s: &Strategy<'_>) -> Result<()> {
    const REASON: &str = "only regular indexes can set this flag";
    forbid(s, names::IS_CLUSTERED, false, REASON)?;
    forbid(s, names::IS_UNIQUE, false, REASON)?;
    forbid(s, names::IGNORE_DUPLICATE_KEYS, false, REASON)?;
    forbid(s, names::OPTIMIZE_FOR_SEQUENTIAL_KEY, false, REASON)
}

/// A plain index must not claim to back a constraint.
fn check_constraint_properties(s: &Strategy<'_>) -> Result<()> {
    let key_type = s.get::<IndexKeyType>(names::INDEX_KEY_TYPE)?.unwrap_or(IndexKeyType::None);
    if key_type.is_constraint() {
        return Err(DdlError::wrong_value(
            s.object_name(),
            names::INDEX_KEY_TYPE,
            format!("{} is only valid for constraints", key_type),
        ));
    }
    if s.get::<bool>(names::IS_SYSTEM_NAMED)?.unwrap_or(false) {
        return Err(DdlError::not_set(s.object_name(), "Name"));
    }
    Ok(())
}

fn check_columnstore_options(s: &Strategy<'_>) -> Result<()> {
    if s.is_memory_optimized() {
        return Ok(());
    }
    const REASON: &str = "not available for columnstore indexes";
    forbid(s, names::PAD_INDEX, false, REASON)?;
    forbid(s, names::NO_AUTOMATIC_RECOMPUTATION, false, REASON)?;
    forbid(s, names::FILL_FACTOR, 0_i64, REASON)?;
    forbid(s, names::OPTIMIZE_FOR_SEQUENTIAL_KEY, false, REASON)?;
    for name in [names::DISALLOW_ROW_LOCKS, names::DISALLOW_PAGE_LOCKS] {
        if s.bag().is_dirty(name) {
            return Err(DdlError::not_supported(s.object_name(), name, REASON));
        }
    }
    let runtime = &s.index.runtime;
    if runtime.sort_in_tempdb == Some(true) {
        return Err(DdlError::not_supported(s.object_name(), "SortInTempdb", REASON));
    }
    if runtime.is_online() {
        return Err(DdlError::not_supported(s.object_name(), "OnlineIndexOperation", REASON));
    }
    Ok(())
}

fn forbid_online(s: &Strategy<'_>) -> Result<()> {
    if s.index.runtime.is_online() {
        return Err(DdlError::not_supported(
            s.object_name(),
            "OnlineIndexOperation",
            "online operations are not available for this index kind",
        ));
    }
    Ok(())
}

fn single_column(s: &Strategy<'_>, kind: &str) -> Result<()> {
    if s.index.key_columns().count() != 1 {
        return Err(DdlError::wrong_value(
            s.object_name(),
            "IndexedColumns",
            format!("{} indexes take exactly one column", kind),
        ));
    }
    Ok(())
}

fn not_on_view(s: &Strategy<'_>, kind: &str) -> Result<()> {
    if s.parent.is_view() {
        return Err(DdlError::not_supported(
            s.object_name(),
            "Parent",
            format!("{} indexes cannot be created on views", kind),
        ));
    }
    Ok(())
}

fn included_columns(s: &Strategy<'_>) -> Result<()> {
    if !s.index.columns.iter().any(|c| c.is_included) {
        return Ok(());
    }
    let supported = matches!(
        s.variant,
        IndexVariant::NonClusteredRegular
            | IndexVariant::NonClusteredColumnstore
            | IndexVariant::ClusteredColumnstore
    );
    // an index with only included columns scripts them as its keys
    if !supported && s.index.key_columns().next().is_some() {
        return Err(DdlError::wrong_value(
            s.object_name(),
            "IndexedColumns",
            format!("{} indexes cannot have included columns", s.variant),
        ));
    }
    s.ctx.require("Included columns", SqlServerVersion::Sql90)
}

fn parent_xml(s: &Strategy<'_>, required: bool) -> Result<()> {
    let present = s.text(names::PARENT_XML_INDEX)?.is_some();
    match (required, present) {
        (true, false) => Err(DdlError::conflicting(
            s.object_name(),
            "a secondary XML index needs a parent XML index",
        )),
        (false, true) => Err(DdlError::conflicting(
            s.object_name(),
            "a primary XML index cannot have a parent XML index",
        )),
        _ => Ok(()),
    }
}

fn xml_version(s: &Strategy<'_>) -> Result<()> {
    s.ctx.require("XML index", SqlServerVersion::Sql90)?;
    if s.ctx.is_cloud_database() {
        s.ctx.require("XML index on a cloud database", SqlServerVersion::Sql120)?;
    }
    Ok(())
}

/// Run every check the variant needs.
pub(super) fn validate(s: &Strategy<'_>) -> Result<()> {
    included_columns(s)?;
    match s.variant {
        IndexVariant::Constraint => {
            if !s.is_clustered()? {
                check_clustered_properties(s)?;
            }
            check_clustering_conflict(s.index, &s.ctx)?;
            check_nonclustered_properties(s)?;
            check_xml_properties(s)?;
            check_spatial_properties(s)
        }
        IndexVariant::ClusteredRegular | IndexVariant::NonClusteredRegular => {
            if !s.index.runtime.is_drop_existing() {
                check_constraint_properties(s)?;
            }
            check_clustering_conflict(s.index, &s.ctx)?;
            check_xml_properties(s)?;
            check_spatial_properties(s)?;
            if s.variant == IndexVariant::ClusteredRegular {
                check_nonclustered_properties(s)
            } else {
                check_clustered_properties(s)
            }
        }
        IndexVariant::PrimaryXml | IndexVariant::SecondaryXml => {
            xml_version(s)?;
            not_on_view(s, "XML")?;
            single_column(s, "XML")?;
            check_constraint_properties(s)?;
            check_regular_properties(s)?;
            check_clustered_properties(s)?;
            check_nonclustered_properties(s)?;
            check_spatial_properties(s)?;
            if s.variant == IndexVariant::PrimaryXml {
                parent_xml(s, false)
            } else {
                parent_xml(s, true)?;
                match s.get::<SecondaryXmlIndexType>(names::SECONDARY_XML_INDEX_TYPE)? {
                    Some(SecondaryXmlIndexType::None) | None => Err(DdlError::wrong_value(
                        s.object_name(),
                        names::SECONDARY_XML_INDEX_TYPE,
                        "a secondary XML index must be PATH, VALUE or PROPERTY",
                    )),
                    Some(_) => Ok(()),
                }
            }
        }
        IndexVariant::Spatial => {
            s.ctx.require("Spatial index", SqlServerVersion::Sql100)?;
            let auto_grid = matches!(
                s.get::<SpatialIndexType>(names::SPATIAL_INDEX_TYPE)?,
                Some(SpatialIndexType::GeometryAutoGrid | SpatialIndexType::GeographyAutoGrid)
            );
            if auto_grid {
                s.ctx.require("Auto grid spatial index", SqlServerVersion::Sql110)?;
            }
            not_on_view(s, "Spatial")?;
            single_column(s, "Spatial")?;
            check_constraint_properties(s)?;
            check_regular_properties(s)?;
            check_clustered_properties(s)?;
            check_nonclustered_properties(s)?;
            check_xml_properties(s)
        }
        IndexVariant::NonClusteredColumnstore => {
            s.ctx.require("Non-clustered columnstore index", SqlServerVersion::Sql110)?;
            check_constraint_properties(s)?;
            check_regular_properties(s)?;
            check_clustered_properties(s)?;
            check_xml_properties(s)?;
            check_spatial_properties(s)?;
            check_columnstore_options(s)
        }
        IndexVariant::ClusteredColumnstore => {
            s.ctx.require("Clustered columnstore index", SqlServerVersion::Sql120)?;
            check_constraint_properties(s)?;
            check_clustered_properties(s)?;
            check_nonclustered_properties(s)?;
            check_xml_properties(s)?;
            check_spatial_properties(s)?;
            check_columnstore_options(s)
        }
        IndexVariant::Hash | IndexVariant::Range => {
            s.ctx.require("Memory-optimized index", SqlServerVersion::Sql120)?;
            check_clustering_conflict(s.index, &s.ctx)?;
            if s.variant == IndexVariant::Hash && s.get::<i64>(names::BUCKET_COUNT)?.is_none() {
                return Err(DdlError::not_set(s.object_name(), names::BUCKET_COUNT));
            }
            let key_type = s.get::<IndexKeyType>(names::INDEX_KEY_TYPE)?.unwrap_or(IndexKeyType::None);
            if !key_type.is_constraint() {
                forbid(s, names::IS_CLUSTERED, false, "memory-optimized indexes are non-clustered")?;
                forbid(s, names::IGNORE_DUPLICATE_KEYS, false, "not available for memory-optimized indexes")?;
                check_clustered_properties(s)?;
                check_xml_properties(s)?;
                check_spatial_properties(s)?;
            }
            Ok(())
        }
        IndexVariant::SelectiveXml => {
            s.ctx.require("Selective XML index", SqlServerVersion::Sql110)?;
            parent_xml(s, false)?;
            single_column(s, "Selective XML")?;
            check_constraint_properties(s)?;
            check_regular_properties(s)?;
            check_clustered_properties(s)?;
            check_nonclustered_properties(s)?;
            check_spatial_properties(s)?;
            forbid_online(s)?;
            if s.index.xml_namespaces.iter().filter(|n| n.is_default).count() > 1 {
                return Err(DdlError::conflicting(
                    s.object_name(),
                    "only one default XML namespace can be declared",
                ));
            }
            if s.index.selective_paths.is_empty() {
                return Err(DdlError::not_set(s.object_name(), "IndexedXmlPaths"));
            }
            Ok(())
        }
        IndexVariant::SecondarySelectiveXml => {
            s.ctx.require("Secondary selective XML index", SqlServerVersion::Sql110)?;
            parent_xml(s, true)?;
            single_column(s, "Secondary selective XML")?;
            if s.text(names::INDEXED_XML_PATH_NAME)?.is_none() {
                return Err(DdlError::not_set(s.object_name(), names::INDEXED_XML_PATH_NAME));
            }
            check_constraint_properties(s)?;
            check_regular_properties(s)?;
            check_clustered_properties(s)?;
            check_nonclustered_properties(s)?;
            check_spatial_properties(s)?;
            forbid_online(s)
        }
        IndexVariant::UserDefinedTableType => {
            if !s.ctx.is_cloud() {
                s.ctx.require("Index on a table type", SqlServerVersion::Sql130)?;
            }
            check_clustering_conflict(s.index, &s.ctx)
        }
    }
}
