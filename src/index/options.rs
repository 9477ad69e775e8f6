//! `WITH (...)` option clauses
//!
//! Options are always emitted in one canonical order so that scripts are
//! stable across runs: PAD_INDEX, STATISTICS_NORECOMPUTE, SORT_IN_TEMPDB,
//! IGNORE_DUP_KEY, DROP_EXISTING, RESUMABLE, ONLINE, the lock options,
//! MAXDOP, FILLFACTOR, OPTIMIZE_FOR_SEQUENTIAL_KEY, COMPRESSION_DELAY and
//! finally data and XML compression.

use crate::clause::{ClauseBuilder, ClauseValue};
use crate::context::{ScriptMode, SqlServerVersion};
use crate::error::{DdlError, Result};
use crate::model::{names, CompressionType, GridDensity, IndexKeyType, LowPriorityWait, SpatialIndexType};
use crate::property::{LifecycleState, Value};
use crate::util::{on_off, quote_ident};

use super::{IndexVariant, Strategy};

/// Which statement the options are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct OptionScope {
    pub rebuild: bool,
    /// Single partition of a rebuild
    pub partition: Option<u32>,
    /// Inside a CREATE TABLE / CREATE TYPE body
    pub inline: bool,
}

impl OptionScope {
    pub const CREATE: OptionScope = OptionScope {
        rebuild: false,
        partition: None,
        inline: false,
    };

    pub const INLINE: OptionScope = OptionScope {
        rebuild: false,
        partition: None,
        inline: true,
    };

    pub fn rebuild(partition: Option<u32>) -> Self {
        OptionScope {
            rebuild: true,
            partition,
            inline: false,
        }
    }

    /// Whole-index scope, as opposed to one partition of a rebuild.
    fn whole(&self) -> bool {
        !self.rebuild || self.partition.is_none()
    }
}

fn positive_int(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) if *n > 0 => Some(n.to_string()),
        _ => None,
    }
}

fn int_value(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(super) fn low_priority_clause(wait: &LowPriorityWait) -> String {
    format!(
        "WAIT_AT_LOW_PRIORITY (MAX_DURATION = {} MINUTES, ABORT_AFTER_WAIT = {})",
        wait.max_duration_minutes, wait.abort_after_wait
    )
}

/// `ONLINE = ON [(WAIT_AT_LOW_PRIORITY ...)]`
fn online(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) {
    if s.ctx.is_dw_or_stretch() {
        return;
    }
    let Some(online) = s.index.runtime.online else {
        return;
    };
    let mut value = on_off(online).to_string();
    let creating = !scope.rebuild && !scope.inline;
    let low_priority_allowed = (scope.rebuild && s.ctx.at_least(SqlServerVersion::Sql120))
        || (creating && s.ctx.is_cloud_database());
    if online && low_priority_allowed {
        if let Some(wait) = &s.index.runtime.low_priority_wait {
            value = format!("{} ({})", value, low_priority_clause(wait));
        }
    }
    clause.push_option("ONLINE", value);
}

fn resumable(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) {
    if !s.index.runtime.is_resumable() {
        return;
    }
    let creating = !scope.rebuild && !scope.inline && s.ctx.mode != ScriptMode::ForAlter;
    let allowed = (scope.rebuild && s.ctx.at_least(SqlServerVersion::Sql140))
        || (creating && (s.ctx.at_least(SqlServerVersion::Sql150) || s.ctx.is_cloud_database()));
    if !allowed {
        return;
    }
    clause.push_option("RESUMABLE", "ON");
    if let Some(minutes) = s.index.runtime.resumable_max_duration.filter(|m| *m > 0) {
        clause.push_option("MAX_DURATION", format!("{} MINUTES", minutes));
    }
}

fn fill_factor(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    if s.parent.is_table_type() {
        return Ok(());
    }
    clause.try_emit(
        s.bag(),
        names::FILL_FACTOR,
        "FILLFACTOR",
        ClauseValue::Formatted(&positive_int),
        true,
        None,
    )?;
    Ok(())
}

fn lock_options(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    let bag = s.bag();
    clause.try_emit(bag, names::DISALLOW_ROW_LOCKS, "ALLOW_ROW_LOCKS", ClauseValue::OFF_ON, true, None)?;
    clause.try_emit(bag, names::DISALLOW_PAGE_LOCKS, "ALLOW_PAGE_LOCKS", ClauseValue::OFF_ON, true, None)?;
    Ok(())
}

fn max_dop(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) {
    if let Some(dop) = s.index.runtime.max_dop.filter(|d| *d > 0) {
        clause.push_option("MAXDOP", dop);
    }
}

/// Options shared by regular, XML, spatial and selective XML indexes.
pub(super) fn general(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    let ctx = s.ctx;
    let bag = s.bag();
    let restricted = ctx.is_dw_or_stretch();
    let cloud_db = ctx.is_cloud_database();
    let whole = scope.whole();

    if !restricted {
        if whole {
            if !cloud_db {
                clause.try_emit_on_off(bag, names::PAD_INDEX, "PAD_INDEX")?;
            }
            clause.try_emit_on_off(bag, names::NO_AUTOMATIC_RECOMPUTATION, "STATISTICS_NORECOMPUTE")?;
        }
        if !cloud_db {
            if let Some(sort) = s.index.runtime.sort_in_tempdb {
                clause.push_option("SORT_IN_TEMPDB", on_off(sort));
            }
        }
        let unique = s.flag(names::IS_UNIQUE)?;
        let key_type = s.get::<IndexKeyType>(names::INDEX_KEY_TYPE)?.unwrap_or(IndexKeyType::None);
        if whole && unique && !key_type.is_constraint() {
            clause.try_emit_on_off(bag, names::IGNORE_DUPLICATE_KEYS, "IGNORE_DUP_KEY")?;
        }
    }

    if !scope.rebuild && !(restricted && scope.inline) {
        if let Some(drop_existing) = s.index.runtime.drop_existing {
            clause.push_option("DROP_EXISTING", on_off(drop_existing));
        }
    }

    if restricted {
        return Ok(());
    }

    resumable(s, clause, scope);
    if ctx.at_least(SqlServerVersion::Sql90) {
        if whole {
            online(s, clause, scope);
            if !cloud_db {
                lock_options(s, clause)?;
            }
        } else if ctx.at_least(SqlServerVersion::Sql120) {
            online(s, clause, scope);
        }
        max_dop(s, clause);
    }
    if whole {
        fill_factor(s, clause)?;
    }
    if !scope.rebuild && s.variant.is_regular() {
        clause.try_emit_on_off(bag, names::OPTIMIZE_FOR_SEQUENTIAL_KEY, "OPTIMIZE_FOR_SEQUENTIAL_KEY")?;
    }
    Ok(())
}

/// Options of a primary key or unique constraint.
pub(super) fn constraint(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    let ctx = s.ctx;
    let bag = s.bag();
    if s.parent.is_distributed() || ctx.is_data_warehouse() {
        return Ok(());
    }
    if !ctx.at_least(SqlServerVersion::Sql90) || ctx.is_dw_or_stretch() {
        fill_factor(s, clause)?;
        return compression(s, clause);
    }
    if s.parent.is_table_type() {
        clause.try_emit_on_off(bag, names::IGNORE_DUPLICATE_KEYS, "IGNORE_DUP_KEY")?;
        return Ok(());
    }

    let cloud_db = ctx.is_cloud_database();
    let alter_table = !scope.inline;
    if !cloud_db {
        clause.try_emit_on_off(bag, names::PAD_INDEX, "PAD_INDEX")?;
    }
    clause.try_emit_on_off(bag, names::NO_AUTOMATIC_RECOMPUTATION, "STATISTICS_NORECOMPUTE")?;
    if alter_table && !cloud_db {
        if let Some(sort) = s.index.runtime.sort_in_tempdb {
            clause.push_option("SORT_IN_TEMPDB", on_off(sort));
        }
    }
    clause.try_emit_on_off(bag, names::IGNORE_DUPLICATE_KEYS, "IGNORE_DUP_KEY")?;
    if alter_table {
        // no low-priority wait on ALTER TABLE ... ADD CONSTRAINT
        online(s, clause, OptionScope::INLINE);
        if cloud_db && s.index.runtime.is_resumable() {
            clause.push_option("RESUMABLE", "ON");
            if let Some(minutes) = s.index.runtime.resumable_max_duration.filter(|m| *m > 0) {
                clause.push_option("MAX_DURATION", format!("{} MINUTES", minutes));
            }
        }
    }
    if !cloud_db {
        lock_options(s, clause)?;
    }
    if alter_table {
        max_dop(s, clause);
    }
    fill_factor(s, clause)?;
    clause.try_emit_on_off(bag, names::OPTIMIZE_FOR_SEQUENTIAL_KEY, "OPTIMIZE_FOR_SEQUENTIAL_KEY")?;
    compression(s, clause)
}

fn compression_delay(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    clause.try_emit(
        s.bag(),
        names::COMPRESSION_DELAY,
        "COMPRESSION_DELAY",
        ClauseValue::Formatted(&int_value),
        true,
        None,
    )?;
    Ok(())
}

/// Options of clustered and non-clustered columnstore indexes.
pub(super) fn columnstore(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    if s.is_memory_optimized() {
        return compression_delay(s, clause);
    }
    if !scope.rebuild {
        if let Some(drop_existing) = s.index.runtime.drop_existing {
            clause.push_option("DROP_EXISTING", on_off(drop_existing));
        }
        compression_delay(s, clause)?;
    }
    max_dop(s, clause);
    match scope.partition {
        Some(number) => partition_compression(s, clause, number),
        None => compression(s, clause),
    }
}

fn bounding_box(s: &Strategy<'_>) -> Result<Option<[f64; 4]>> {
    let corners = [
        names::BOUNDING_BOX_X_MIN,
        names::BOUNDING_BOX_Y_MIN,
        names::BOUNDING_BOX_X_MAX,
        names::BOUNDING_BOX_Y_MAX,
    ];
    let mut values = [0.0; 4];
    let mut set = 0;
    for (slot, name) in values.iter_mut().zip(corners) {
        if let Some(v) = s.get::<f64>(name)? {
            *slot = v;
            set += 1;
        }
    }
    match set {
        0 => Ok(None),
        4 => Ok(Some(values)),
        _ => Err(DdlError::not_set(s.object_name(), "BoundingBox")),
    }
}

/// Spatial-specific options followed by the general ones.
pub(super) fn spatial(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, scope: OptionScope) -> Result<()> {
    let spatial_type = s
        .get::<SpatialIndexType>(names::SPATIAL_INDEX_TYPE)?
        .unwrap_or(SpatialIndexType::GeometryGrid);
    let geometry = matches!(
        spatial_type,
        SpatialIndexType::GeometryGrid | SpatialIndexType::GeometryAutoGrid
    );

    match bounding_box(s)? {
        Some([x_min, y_min, x_max, y_max]) if geometry => {
            clause.push_option(
                "BOUNDING_BOX",
                format!("({}, {}, {}, {})", x_min, y_min, x_max, y_max),
            );
        }
        None if geometry => return Err(DdlError::not_set(s.object_name(), "BoundingBox")),
        Some(_) => {
            return Err(DdlError::wrong_value(
                s.object_name(),
                "BoundingBox",
                "a bounding box only applies to geometry indexes",
            ))
        }
        None => {}
    }

    let auto_grid = matches!(
        spatial_type,
        SpatialIndexType::GeometryAutoGrid | SpatialIndexType::GeographyAutoGrid
    );
    let mut grids = ClauseBuilder::with_separator(&s.ctx, ",");
    for (level, name) in names::LEVEL_GRIDS.iter().enumerate() {
        let density = s.get::<GridDensity>(name)?.unwrap_or(GridDensity::None);
        if density == GridDensity::None {
            continue;
        }
        if auto_grid {
            return Err(DdlError::wrong_value(
                s.object_name(),
                *name,
                "grid densities cannot be set on an auto grid index",
            ));
        }
        let option = format!("LEVEL_{}", level + 1);
        let render = |value: &Value| match value {
            Value::Text(text) => Some(text.to_uppercase()),
            _ => None,
        };
        grids.try_emit(s.bag(), name, &option, ClauseValue::Formatted(&render), true, None)?;
    }
    if let Some(grids) = grids.finish("GRIDS = (", ")") {
        clause.push_raw(grids);
    }

    let delta = s.ctx.is_delta_only();
    let cells = move |value: &Value| match value {
        Value::Int(n) if delta || *n != 0 => Some(n.to_string()),
        _ => None,
    };
    clause.try_emit(
        s.bag(),
        names::CELLS_PER_OBJECT,
        "CELLS_PER_OBJECT",
        ClauseValue::Formatted(&cells),
        true,
        None,
    )?;

    general(s, clause, scope)?;
    match scope.partition {
        Some(number) => partition_compression(s, clause, number),
        None => compression(s, clause),
    }
}

/// Collapse sorted partition numbers into `1, 3 TO 5` runs.
pub(super) fn partition_ranges(numbers: &[u32]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut i = 0;
    while i < numbers.len() {
        let start = numbers[i];
        let mut end = start;
        while i + 1 < numbers.len() && numbers[i + 1] == end + 1 {
            i += 1;
            end = numbers[i];
        }
        if end > start {
            runs.push(format!("{} TO {}", start, end));
        } else {
            runs.push(start.to_string());
        }
        i += 1;
    }
    runs.join(", ")
}

const COMPRESSION_ORDER: [CompressionType; 5] = [
    CompressionType::Columnstore,
    CompressionType::ColumnstoreArchive,
    CompressionType::Row,
    CompressionType::Page,
    CompressionType::None,
];

/// `DATA_COMPRESSION` and `XML_COMPRESSION` for the whole index.
pub(super) fn compression(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    let ctx = s.ctx;
    if ctx.is_dw_or_stretch() || s.index.partitions.is_empty() {
        return Ok(());
    }
    let creating = s.index.state() != LifecycleState::Existing;

    if s.bag().is_supported(names::HAS_COMPRESSED_PARTITIONS, &ctx) {
        let mut partitions: Vec<(u32, CompressionType)> = s
            .index
            .partitions
            .iter()
            .map(|p| (p.number, p.compression()))
            .collect();
        partitions.sort_by_key(|(n, _)| *n);
        let uniform = partitions.windows(2).all(|w| w[0].1 == w[1].1);
        if uniform {
            let kind = partitions[0].1;
            if kind != CompressionType::None || !creating {
                clause.push_option("DATA_COMPRESSION", kind);
            }
        } else {
            for kind in COMPRESSION_ORDER {
                if kind == CompressionType::None && creating {
                    continue;
                }
                let numbers: Vec<u32> = partitions
                    .iter()
                    .filter(|(_, k)| *k == kind)
                    .map(|(n, _)| *n)
                    .collect();
                if !numbers.is_empty() {
                    clause.push_option(
                        "DATA_COMPRESSION",
                        format!("{} ON PARTITIONS ({})", kind, partition_ranges(&numbers)),
                    );
                }
            }
        }
    }

    if s.bag().is_supported(names::HAS_XML_COMPRESSED_PARTITIONS, &ctx) {
        let mut flagged: Vec<(u32, bool)> = s
            .index
            .partitions
            .iter()
            .filter_map(|p| p.xml_compression.value().map(|on| (p.number, *on)))
            .collect();
        flagged.sort_by_key(|(n, _)| *n);
        if flagged.is_empty() {
            return Ok(());
        }
        let all_on = flagged.iter().all(|(_, on)| *on);
        let all_off = flagged.iter().all(|(_, on)| !*on);
        if all_on && flagged.len() == s.index.partitions.len() {
            clause.push_option("XML_COMPRESSION", "ON");
        } else if !all_off || !creating {
            for on in [true, false] {
                if !on && creating {
                    continue;
                }
                let numbers: Vec<u32> = flagged
                    .iter()
                    .filter(|(_, v)| *v == on)
                    .map(|(n, _)| *n)
                    .collect();
                if !numbers.is_empty() {
                    clause.push_option(
                        "XML_COMPRESSION",
                        format!("{} ON PARTITIONS ({})", on_off(on), partition_ranges(&numbers)),
                    );
                }
            }
        }
    }
    Ok(())
}

/// Compression of the single partition being rebuilt, when it changed.
pub(super) fn partition_compression(
    s: &Strategy<'_>,
    clause: &mut ClauseBuilder<'_>,
    number: u32,
) -> Result<()> {
    if s.ctx.is_dw_or_stretch() {
        return Ok(());
    }
    let Some(partition) = s.index.partitions.iter().find(|p| p.number == number) else {
        return Ok(());
    };
    if partition.data_compression.is_dirty()
        && s.bag().is_supported(names::HAS_COMPRESSED_PARTITIONS, &s.ctx)
    {
        clause.push_option("DATA_COMPRESSION", partition.compression());
    }
    if partition.xml_compression.is_dirty()
        && s.bag().is_supported(names::HAS_XML_COMPRESSED_PARTITIONS, &s.ctx)
    {
        if let Some(on) = partition.xml_compression.value() {
            clause.push_option("XML_COMPRESSION", on_off(*on));
        }
    }
    Ok(())
}

/// Low-priority wait on drop and resume; only from Sql140 on.
fn drop_low_priority(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>, clustered: bool) -> Result<()> {
    let Some(wait) = &s.index.runtime.low_priority_wait else {
        return Ok(());
    };
    if !s.ctx.at_least(SqlServerVersion::Sql140) || wait.max_duration_minutes == 0 {
        return Ok(());
    }
    if clustered && !s.index.runtime.is_online() {
        return Err(DdlError::conflicting(
            s.object_name(),
            "a low priority wait requires ONLINE = ON when dropping a clustered index",
        ));
    }
    clause.push_raw(low_priority_clause(wait));
    Ok(())
}

/// Options of `DROP INDEX` / `DROP CONSTRAINT`.
pub(super) fn drop(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    let ctx = s.ctx;
    if !ctx.at_least(SqlServerVersion::Sql90) {
        return Ok(());
    }
    if ctx.is_cloud_database() && !ctx.at_least(SqlServerVersion::Sql120) {
        return Ok(());
    }
    if ctx.is_data_warehouse() {
        return Ok(());
    }
    let clustered = match s.variant {
        IndexVariant::Constraint => s.drop_clustered()?,
        IndexVariant::ClusteredRegular => true,
        IndexVariant::NonClusteredRegular => false,
        _ => return Ok(()),
    };
    if clustered {
        if let Some(online) = s.index.runtime.online {
            clause.push_option("ONLINE", on_off(online));
        }
        max_dop(s, clause);
        if s.variant == IndexVariant::ClusteredRegular {
            if let Some(target) = &s.index.runtime.move_to {
                let mut destination = quote_ident(&target.data_space);
                if !target.partition_columns.is_empty() {
                    let columns: Vec<String> =
                        target.partition_columns.iter().map(|c| quote_ident(c)).collect();
                    destination.push_str(&format!("({})", columns.join(", ")));
                }
                clause.push_raw(format!("MOVE TO {}", destination));
            }
        }
    }
    drop_low_priority(s, clause, clustered)
}

/// Options of `ALTER INDEX ... RESUME`.
pub(super) fn resume(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    max_dop(s, clause);
    if let Some(minutes) = s.index.runtime.resumable_max_duration.filter(|m| *m > 0) {
        clause.push_option("MAX_DURATION", format!("{} MINUTES", minutes));
    }
    if let Some(wait) = &s.index.runtime.low_priority_wait {
        if wait.max_duration_minutes > 0 {
            clause.push_raw(low_priority_clause(wait));
        }
    }
    Ok(())
}

/// Changed options of `ALTER INDEX ... SET (...)`.
pub(super) fn set(s: &Strategy<'_>, clause: &mut ClauseBuilder<'_>) -> Result<()> {
    let bag = s.bag();
    match s.variant {
        IndexVariant::Hash | IndexVariant::Range | IndexVariant::UserDefinedTableType => Ok(()),
        IndexVariant::ClusteredColumnstore | IndexVariant::NonClusteredColumnstore => {
            compression_delay(s, clause)
        }
        _ => {
            if s.ctx.is_dw_or_stretch() {
                return Ok(());
            }
            lock_options(s, clause)?;
            clause.try_emit_on_off(bag, names::NO_AUTOMATIC_RECOMPUTATION, "STATISTICS_NORECOMPUTE")?;
            clause.try_emit_on_off(bag, names::IGNORE_DUPLICATE_KEYS, "IGNORE_DUP_KEY")?;
            if s.variant.is_regular() {
                clause.try_emit_on_off(bag, names::OPTIMIZE_FOR_SEQUENTIAL_KEY, "OPTIMIZE_FOR_SEQUENTIAL_KEY")?;
            }
            Ok(())
        }
    }
}
