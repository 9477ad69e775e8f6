//! `ALTER DATABASE ... SET` options

use crate::clause::{ClauseBuilder, ClauseValue, Termination};
use crate::error::Result;
use crate::model::database_names;
use crate::property::{PropertyBag, Value};
use crate::util::escape_string;

#[derive(Debug, Clone, Copy)]
enum Render {
    Switch(&'static str, &'static str),
    /// Enum properties store their T-SQL keyword
    Keyword,
    Seconds,
}

/// One settable database option.
#[derive(Debug, Clone, Copy)]
struct SetOption {
    property: &'static str,
    option: &'static str,
    use_equals: bool,
    render: Render,
    /// Accepts a `WITH ROLLBACK`/`NO_WAIT` termination clause
    terminable: bool,
}

const fn switch(property: &'static str, option: &'static str) -> SetOption {
    SetOption {
        property,
        option,
        use_equals: false,
        render: Render::Switch("ON", "OFF"),
        terminable: false,
    }
}

const fn keyword(property: &'static str, option: &'static str) -> SetOption {
    SetOption {
        property,
        option,
        use_equals: false,
        render: Render::Keyword,
        terminable: false,
    }
}

impl SetOption {
    const fn equals(self) -> Self {
        Self {
            use_equals: true,
            ..self
        }
    }

    const fn terminable(self) -> Self {
        Self {
            terminable: true,
            ..self
        }
    }

    const fn rendered(self, render: Render) -> Self {
        Self { render, ..self }
    }
}

const SET_OPTIONS: &[SetOption] = &[
    keyword("RecoveryModel", "RECOVERY"),
    switch("AutoClose", "AUTO_CLOSE"),
    switch("AutoShrink", "AUTO_SHRINK"),
    switch("AutoUpdateStatisticsAsync", "AUTO_UPDATE_STATISTICS_ASYNC"),
    switch("IsParameterizationForced", "PARAMETERIZATION").rendered(Render::Switch("FORCED", "SIMPLE")),
    switch("IsReadCommittedSnapshotOn", "READ_COMMITTED_SNAPSHOT").terminable(),
    keyword("PageVerify", "PAGE_VERIFY"),
    switch("Trustworthy", "TRUSTWORTHY"),
    switch("DatabaseOwnershipChaining", "DB_CHAINING"),
    switch("DateCorrelationOptimization", "DATE_CORRELATION_OPTIMIZATION"),
    switch("BrokerEnabled", "")
        .rendered(Render::Switch("ENABLE_BROKER", "DISABLE_BROKER"))
        .terminable(),
    keyword("TargetRecoveryTime", "TARGET_RECOVERY_TIME")
        .equals()
        .rendered(Render::Seconds),
    keyword("DelayedDurability", "DELAYED_DURABILITY").equals(),
    switch("AcceleratedRecoveryEnabled", "ACCELERATED_DATABASE_RECOVERY").equals(),
    keyword("UserAccess", "").terminable(),
];

/// Scripted after everything else: later statements could not run against
/// a read-only database.
const READ_ONLY: SetOption = switch(database_names::READ_ONLY, "")
    .rendered(Render::Switch("READ_ONLY", "READ_WRITE"))
    .terminable();

fn keyword_value(value: &Value) -> Option<String> {
    Some(value.to_string())
}

fn seconds_value(value: &Value) -> Option<String> {
    match value {
        Value::Int(n) => Some(format!("{} SECONDS", n)),
        _ => None,
    }
}

fn emit(
    clause: &mut ClauseBuilder<'_>,
    bag: &PropertyBag,
    option: &SetOption,
    termination: Option<&Termination>,
) -> Result<bool> {
    let value = match option.render {
        Render::Switch(on, off) => ClauseValue::Switch { on, off },
        Render::Keyword => ClauseValue::Formatted(&keyword_value),
        Render::Seconds => ClauseValue::Formatted(&seconds_value),
    };
    let termination = termination.filter(|_| option.terminable);
    clause.try_emit(
        bag,
        option.property,
        option.option,
        value,
        option.use_equals,
        termination,
    )
}

/// One `SET` fragment per applicable option, in a fixed order.
pub(super) fn set_options(
    clause: &mut ClauseBuilder<'_>,
    bag: &PropertyBag,
    termination: Option<&Termination>,
) -> Result<()> {
    for option in SET_OPTIONS {
        emit(clause, bag, option, termination)?;
    }
    Ok(())
}

pub(super) fn read_only(
    clause: &mut ClauseBuilder<'_>,
    bag: &PropertyBag,
    termination: Option<&Termination>,
) -> Result<bool> {
    emit(clause, bag, &READ_ONLY, termination)
}

/// `CONTAINMENT = PARTIAL` as part of `CREATE DATABASE` or a `SET`.
pub(super) fn containment(clause: &mut ClauseBuilder<'_>, bag: &PropertyBag) -> Result<bool> {
    clause.try_emit(
        bag,
        database_names::CONTAINMENT_TYPE,
        "CONTAINMENT",
        ClauseValue::Formatted(&keyword_value),
        true,
        None,
    )
}

fn quoted_text(value: &Value) -> Option<String> {
    Some(format!("'{}'", escape_string(&value.to_string())))
}

const BYTES_PER_MB: i64 = 1 << 20;
const BYTES_PER_GB: i64 = 1 << 30;

fn max_size_value(value: &Value) -> Option<String> {
    match value {
        Value::Int(bytes) if *bytes > 0 && bytes % BYTES_PER_GB == 0 => {
            Some(format!("{} GB", bytes / BYTES_PER_GB))
        }
        Value::Int(bytes) if *bytes > 0 => Some(format!("{} MB", bytes / BYTES_PER_MB)),
        _ => None,
    }
}

/// Cloud service options: `EDITION`, `SERVICE_OBJECTIVE`, `MAXSIZE`.
///
/// Rendered inside `CREATE DATABASE [d] (...)` or `ALTER DATABASE [d]
/// MODIFY (...)`.
pub(super) fn service_options(clause: &mut ClauseBuilder<'_>, bag: &PropertyBag) -> Result<()> {
    clause.try_emit(
        bag,
        database_names::AZURE_EDITION,
        "EDITION",
        ClauseValue::Formatted(&quoted_text),
        true,
        None,
    )?;
    clause.try_emit(
        bag,
        database_names::AZURE_SERVICE_OBJECTIVE,
        "SERVICE_OBJECTIVE",
        ClauseValue::Formatted(&quoted_text),
        true,
        None,
    )?;
    clause.try_emit(
        bag,
        database_names::MAX_SIZE_IN_BYTES,
        "MAXSIZE",
        ClauseValue::Formatted(&max_size_value),
        true,
        None,
    )?;
    Ok(())
}
