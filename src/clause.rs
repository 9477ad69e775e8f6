//! Clause builder
//!
//! Collects `OPTION = value` fragments for one enclosing clause. A fragment
//! backed by a property is emitted only when the property is supported for
//! the target, has a value, and is either dirty or the context scripts full
//! definitions. The enclosing syntax is dropped when nothing was emitted.

use std::fmt;

use tracing::trace;

use crate::context::ScriptingContext;
use crate::error::{DdlError, Result};
use crate::property::{PropertyBag, Value};

/// How to render a property value.
pub enum ClauseValue<'v> {
    /// A boolean rendered through a true/false text pair
    Switch { on: &'v str, off: &'v str },
    /// Any value rendered by the caller; `None` suppresses the fragment
    Formatted(&'v dyn Fn(&Value) -> Option<String>),
}

impl ClauseValue<'static> {
    pub const ON_OFF: ClauseValue<'static> = ClauseValue::Switch {
        on: "ON",
        off: "OFF",
    };

    /// For properties phrased negatively, such as `DisallowRowLocks`.
    pub const OFF_ON: ClauseValue<'static> = ClauseValue::Switch {
        on: "OFF",
        off: "ON",
    };
}

/// Per-invocation termination for database option changes.
///
/// Passed as an argument to a single alter call; nothing stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `WITH ROLLBACK AFTER n SECONDS`
    RollbackAfter { seconds: u32 },
    /// `WITH NO_WAIT`: fail when transactions are open
    NoWait,
    /// `WITH ROLLBACK IMMEDIATE`
    RollbackImmediate,
}

impl Termination {
    /// Build a rollback-after termination from a signed timeout.
    pub fn rollback_after(seconds: i64) -> Result<Self> {
        let seconds = u32::try_from(seconds).map_err(|_| {
            DdlError::wrong_value("Termination", "RollbackAfter", "timeout must be positive")
        })?;
        Ok(Termination::RollbackAfter { seconds })
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::RollbackAfter { seconds } => {
                write!(f, "WITH ROLLBACK AFTER {} SECONDS", seconds)
            }
            Termination::NoWait => f.write_str("WITH NO_WAIT"),
            Termination::RollbackImmediate => f.write_str("WITH ROLLBACK IMMEDIATE"),
        }
    }
}

/// Buffer of option fragments for one clause.
pub struct ClauseBuilder<'c> {
    ctx: &'c ScriptingContext,
    separator: &'static str,
    fragments: Vec<String>,
}

impl<'c> ClauseBuilder<'c> {
    pub fn new(ctx: &'c ScriptingContext) -> Self {
        Self::with_separator(ctx, ", ")
    }

    pub fn with_separator(ctx: &'c ScriptingContext, separator: &'static str) -> Self {
        Self {
            ctx,
            separator,
            fragments: Vec::new(),
        }
    }

    pub fn context(&self) -> &ScriptingContext {
        self.ctx
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    fn append(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    /// Emit a property-backed fragment.
    ///
    /// Returns whether a fragment was emitted so dependent clauses can chain.
    pub fn try_emit(
        &mut self,
        bag: &PropertyBag,
        property: &str,
        option: &str,
        value: ClauseValue<'_>,
        use_equals: bool,
        termination: Option<&Termination>,
    ) -> Result<bool> {
        if !bag.is_supported(property, self.ctx) {
            trace!(property, option, "clause skipped: unsupported on target");
            return Ok(false);
        }
        let Some(prop) = bag.property(property) else {
            return Ok(false);
        };
        let Some(current) = prop.value() else {
            return Ok(false);
        };
        if !prop.is_dirty() && self.ctx.is_delta_only() {
            return Ok(false);
        }

        let rendered = match value {
            ClauseValue::Switch { on, off } => match current {
                Value::Bool(b) => Some(if *b { on } else { off }.to_string()),
                other => {
                    return Err(DdlError::wrong_value(
                        bag.kind().to_string(),
                        property,
                        format!("expected a boolean, found {}", other),
                    ))
                }
            },
            ClauseValue::Formatted(format) => format(current),
        };
        let Some(rendered) = rendered else {
            return Ok(false);
        };

        // an empty option name means the rendered value is the whole option
        let mut fragment = if option.is_empty() {
            rendered
        } else if use_equals {
            format!("{} = {}", option, rendered)
        } else {
            format!("{} {}", option, rendered)
        };
        if let Some(termination) = termination {
            fragment.push(' ');
            fragment.push_str(&termination.to_string());
        }
        self.append(fragment);
        Ok(true)
    }

    /// Shorthand for an `OPTION = ON|OFF` fragment.
    pub fn try_emit_on_off(&mut self, bag: &PropertyBag, property: &str, option: &str) -> Result<bool> {
        self.try_emit(bag, property, option, ClauseValue::ON_OFF, true, None)
    }

    /// Unconditional `OPTION = value` fragment for runtime options that are
    /// not backed by a property.
    pub fn push_option(&mut self, option: &str, value: impl fmt::Display) {
        self.append(format!("{} = {}", option, value));
    }

    /// Unconditional fragment used verbatim.
    pub fn push_raw(&mut self, fragment: impl Into<String>) {
        self.append(fragment.into());
    }

    /// Move every fragment of `other` into this clause.
    pub fn extend(&mut self, other: ClauseBuilder<'_>) {
        self.fragments.extend(other.fragments);
    }

    /// Fragments joined by the separator.
    pub fn body(&self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        Some(self.fragments.join(self.separator))
    }

    /// Wrap the fragments as `{open}{body}{close}`, or `None` when empty.
    pub fn finish(self, open: &str, close: &str) -> Option<String> {
        self.body().map(|body| format!("{}{}{}", open, body, close))
    }

    /// Each fragment on its own, for statement-per-option layouts.
    pub fn into_fragments(self) -> Vec<String> {
        self.fragments
    }
}
