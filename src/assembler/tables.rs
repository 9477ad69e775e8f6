//! Index statements of one table, in dependency order
//!
//! A clustered index is created before anything that points at its keys,
//! a primary XML index before its secondaries. Drops run the other way and
//! come before any creation so a replaced index never collides with itself.

use tracing::debug;

use crate::context::ScriptingContext;
use crate::error::Result;
use crate::index::{classify, classify_for_drop, resolve_clustered, IndexScripter, IndexVariant};
use crate::model::Index;
use crate::property::LifecycleState;
use crate::snapshot::TableSnapshot;

fn rank(variant: IndexVariant, index: &Index, ctx: &ScriptingContext) -> Result<u8> {
    Ok(match variant {
        IndexVariant::ClusteredRegular | IndexVariant::ClusteredColumnstore => 0,
        IndexVariant::Constraint if resolve_clustered(index, ctx)? == Some(true) => 0,
        IndexVariant::PrimaryXml | IndexVariant::SelectiveXml => 2,
        IndexVariant::SecondaryXml | IndexVariant::SecondarySelectiveXml => 3,
        _ => 1,
    })
}

/// Drop, create and alter statements for every index of `snapshot`.
///
/// Indexes marked for drop are dropped, new ones created, and existing ones
/// altered with their pending changes.
pub fn script_table_indexes(snapshot: &TableSnapshot, ctx: &ScriptingContext) -> Result<Vec<String>> {
    let table = &snapshot.table;
    let mut drops = Vec::new();
    let mut creates = Vec::new();
    let mut alters = Vec::new();

    for index in &snapshot.indexes {
        match index.state() {
            LifecycleState::ToBeDropped => {
                let variant = classify_for_drop(index, table, ctx)?;
                drops.push((rank(variant, index, ctx)?, index));
            }
            LifecycleState::Dropped => {}
            state if state.is_new() => {
                let variant = classify(index, table, ctx)?;
                creates.push((rank(variant, index, ctx)?, index));
            }
            _ => alters.push(index),
        }
    }

    // stable sorts keep document order inside one rank
    drops.sort_by_key(|(rank, _)| std::cmp::Reverse(*rank));
    creates.sort_by_key(|(rank, _)| *rank);

    let mut statements = Vec::new();
    for (_, index) in drops {
        statements.push(IndexScripter::new(index, table, ctx).script_drop()?);
    }
    for (_, index) in creates {
        statements.extend(IndexScripter::new(index, table, ctx).script_create()?);
    }
    for index in alters {
        statements.extend(IndexScripter::new(index, table, ctx).script_alter()?);
    }

    debug!(
        table = %table.full_name(),
        count = statements.len(),
        "scripted table indexes"
    );
    Ok(statements)
}
