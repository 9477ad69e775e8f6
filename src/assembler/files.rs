//! File specifications: `( NAME = N'x', FILENAME = N'p', SIZE = ... )`
//!
//! Sizes are stored in KB. The server accepts at most `i32::MAX` of a unit,
//! so larger values are scripted in GB.

use crate::clause::{ClauseBuilder, ClauseValue};
use crate::context::{ScriptMode, ScriptingContext, SqlServerVersion};
use crate::error::{DdlError, Result};
use crate::model::{file_names, FileGrowthType};
use crate::property::{PropertyBag, Value};
use crate::util::sql_string;

const KB_PER_GB: f64 = (1u64 << 20) as f64;

/// How a file specification is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FileSpecUse {
    /// Inside `CREATE DATABASE` or `ADD FILE`: every set value
    Define,
    /// `MODIFY FILE`: changed values only
    Modify,
}

/// One data or log file to render.
pub(super) struct FileSpec<'a> {
    pub name: &'a str,
    pub bag: &'a PropertyBag,
    /// Owned by a FILESTREAM or memory-optimized filegroup
    pub filestream: bool,
    /// Managed instances place files themselves
    pub with_file_name: bool,
}

/// `8192KB`, or `nGB` above the per-unit limit.
pub(super) fn format_size(object: &str, property: &str, kb: f64) -> Result<String> {
    let (size, unit) = if kb > f64::from(i32::MAX) {
        (kb / KB_PER_GB, "GB")
    } else {
        (kb, "KB")
    };
    if size < 0.0 || size > f64::from(i32::MAX) {
        return Err(DdlError::wrong_value(
            object,
            property,
            format!("{} KB is out of range", kb),
        ));
    }
    Ok(format!("{}{}", size.round() as i64, unit))
}

/// Percentage growth is a whole number of at least 1.
fn format_percent(object: &str, percent: f64) -> Result<String> {
    if percent < 1.0 || percent.fract() != 0.0 || percent > f64::from(i32::MAX) {
        return Err(DdlError::wrong_value(
            object,
            file_names::GROWTH,
            format!("percentage growth must be a whole number of at least 1, not {}", percent),
        ));
    }
    Ok(format!("{}%", percent as i64))
}

fn is_unlimited(kb: f64) -> bool {
    kb == 0.0 || kb == -1.0
}

impl FileSpec<'_> {
    fn object(&self) -> String {
        format!("{} {}", self.bag.kind(), self.name)
    }

    fn read_kb(&self, property: &str, ctx: &ScriptingContext) -> Result<Option<f64>> {
        self.bag.get_if_supported::<f64>(property, ctx)
    }

    /// Size-like properties cannot be given for FILESTREAM containers.
    fn forbid_dirty(&self, property: &str, reason: &str) -> Result<()> {
        if self.bag.is_dirty(property) {
            return Err(DdlError::not_supported(self.object(), property, reason));
        }
        Ok(())
    }

    /// Render the specification, or `None` when a modify has nothing to send.
    pub fn render(&self, ctx: &ScriptingContext, usage: FileSpecUse) -> Result<Option<String>> {
        let ctx = match usage {
            FileSpecUse::Define => ctx.with_mode(ScriptMode::ForCreate),
            FileSpecUse::Modify => ctx.with_mode(ScriptMode::ForDirectExecution),
        };
        let mut clause = ClauseBuilder::new(&ctx);
        clause.push_option("NAME", sql_string(self.name));

        if self.with_file_name {
            let emitted = clause.try_emit(
                self.bag,
                file_names::FILE_NAME,
                "FILENAME",
                ClauseValue::Formatted(&|v: &Value| Some(sql_string(&v.to_string()))),
                true,
                None,
            )?;
            if !emitted && usage == FileSpecUse::Define {
                return Err(DdlError::not_set(self.object(), file_names::FILE_NAME));
            }
        }

        self.size_clauses(&ctx, &mut clause)?;

        if usage == FileSpecUse::Modify && clause.len() == 1 {
            return Ok(None);
        }
        Ok(clause.finish("( ", " )"))
    }

    fn size_clauses(&self, ctx: &ScriptingContext, clause: &mut ClauseBuilder<'_>) -> Result<()> {
        let object = self.object();

        if self.filestream {
            self.forbid_dirty(file_names::SIZE, "FILESTREAM files have no size")?;
        } else if let Some(kb) = self.read_kb(file_names::SIZE, ctx)? {
            let size = format_size(&object, file_names::SIZE, kb)?;
            clause.try_emit(
                self.bag,
                file_names::SIZE,
                "SIZE",
                ClauseValue::Formatted(&|_: &Value| Some(size.clone())),
                true,
                None,
            )?;
        }

        if self.filestream && !ctx.at_least(SqlServerVersion::Sql110) {
            self.forbid_dirty(file_names::MAX_SIZE, "FILESTREAM files have no maximum size before Sql110")?;
        } else if let Some(kb) = self.read_kb(file_names::MAX_SIZE, ctx)? {
            let max_size = if is_unlimited(kb) {
                "UNLIMITED".to_string()
            } else {
                format_size(&object, file_names::MAX_SIZE, kb)?
            };
            clause.try_emit(
                self.bag,
                file_names::MAX_SIZE,
                "MAXSIZE",
                ClauseValue::Formatted(&|_: &Value| Some(max_size.clone())),
                true,
                None,
            )?;
        }

        if self.filestream {
            self.forbid_dirty(file_names::GROWTH, "FILESTREAM files do not grow")?;
            self.forbid_dirty(file_names::GROWTH_TYPE, "FILESTREAM files do not grow")?;
            return Ok(());
        }
        self.growth_clause(ctx, clause)
    }

    /// `FILEGROWTH` depends on two properties, so it is resolved by hand.
    fn growth_clause(&self, ctx: &ScriptingContext, clause: &mut ClauseBuilder<'_>) -> Result<()> {
        let object = self.object();
        let full = !ctx.is_delta_only();
        let growth_type = self
            .bag
            .get_if_supported::<FileGrowthType>(file_names::GROWTH_TYPE, ctx)?;
        let growth = self.read_kb(file_names::GROWTH, ctx)?;
        let type_dirty = self.bag.is_dirty(file_names::GROWTH_TYPE);
        let growth_dirty = self.bag.is_dirty(file_names::GROWTH);

        if growth_type == Some(FileGrowthType::None) {
            if !(full || type_dirty) {
                return Ok(());
            }
            if let Some(g) = growth {
                if (full || growth_dirty) && g != 0.0 {
                    return Err(DdlError::wrong_value(
                        object,
                        file_names::GROWTH,
                        "a file without growth must have Growth = 0",
                    ));
                }
            }
            clause.push_option("FILEGROWTH", 0);
            return Ok(());
        }

        match growth {
            Some(g) if full || growth_dirty || type_dirty => {
                let text = if growth_type == Some(FileGrowthType::Percent) {
                    format_percent(&object, g)?
                } else {
                    format_size(&object, file_names::GROWTH, g)?
                };
                clause.push_option("FILEGROWTH", text);
            }
            None if !full && type_dirty => {
                // the growth unit cannot change without the amount
                return Err(DdlError::not_set(object, file_names::GROWTH));
            }
            _ => {}
        }
        Ok(())
    }
}
