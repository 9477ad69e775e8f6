//! Property model
//!
//! Every scriptable object owns a [`PropertyBag`]. Each [`Property`] keeps two
//! slots: the value last accepted as applied to the target (`committed`) and
//! the value set since then (`pending`). A property is dirty exactly when it
//! has a pending value, and a pending value is only kept when it differs from
//! the committed one.

mod lifecycle;
mod value;

pub use lifecycle::{LifecycleState, TrackedObject};
pub use value::{parse_value, PropertyType, Value};

use crate::compat::{self, ObjectKind};
use crate::context::ScriptingContext;
use crate::error::{DdlError, Result};

/// One named property with committed and pending slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Property<T> {
    name: String,
    committed: Option<T>,
    pending: Option<T>,
    retrieved: bool,
}

impl<T: PartialEq> Property<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            committed: None,
            pending: None,
            retrieved: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value: pending if set, else committed.
    pub fn value(&self) -> Option<&T> {
        self.pending.as_ref().or(self.committed.as_ref())
    }

    /// Value last accepted as applied to the target.
    pub fn committed(&self) -> Option<&T> {
        self.committed.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the committed value was read from the catalog.
    pub fn is_retrieved(&self) -> bool {
        self.retrieved
    }

    pub fn is_null(&self) -> bool {
        self.value().is_none()
    }

    /// Set a new value. Setting the committed value again clears the change.
    pub fn set(&mut self, value: T) {
        if self.committed.as_ref() == Some(&value) {
            self.pending = None;
        } else {
            self.pending = Some(value);
        }
    }

    /// Record a value read from the target.
    pub fn load(&mut self, value: Option<T>) {
        self.committed = value;
        self.pending = None;
        self.retrieved = true;
    }

    /// Accept the pending value as applied.
    pub fn commit(&mut self) {
        if let Some(value) = self.pending.take() {
            self.committed = Some(value);
        }
    }

    /// Drop the pending value.
    pub fn discard(&mut self) {
        self.pending = None;
    }
}

/// Ordered property set of one schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBag {
    kind: ObjectKind,
    properties: Vec<Property<Value>>,
}

impl PropertyBag {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    fn entry(&mut self, name: &str) -> &mut Property<Value> {
        let index = match self.position(name) {
            Some(index) => index,
            None => {
                self.properties.push(Property::new(name));
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    pub fn property(&self, name: &str) -> Option<&Property<Value>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property<Value>> {
        self.properties.iter()
    }

    /// Set a value from the user side; marks it dirty if it changed.
    pub fn set<T: PropertyType>(&mut self, name: &str, value: T) {
        self.entry(name).set(value.into_value());
    }

    /// Store a value read from the target as committed and retrieved.
    pub fn load<T: PropertyType>(&mut self, name: &str, value: T) {
        self.entry(name).load(Some(value.into_value()));
    }

    pub(crate) fn load_value(&mut self, name: &str, value: Value) {
        self.entry(name).load(Some(value));
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.property(name).is_some_and(|p| p.is_dirty())
    }

    pub fn any_dirty(&self) -> bool {
        self.properties.iter().any(|p| p.is_dirty())
    }

    /// Accept every pending value.
    pub fn commit(&mut self) {
        for property in &mut self.properties {
            property.commit();
        }
    }

    pub fn discard(&mut self) {
        for property in &mut self.properties {
            property.discard();
        }
    }

    /// Whether `name` may be read or scripted under `ctx`.
    pub fn is_supported(&self, name: &str, ctx: &ScriptingContext) -> bool {
        compat::is_supported(self.kind, name, ctx)
    }

    fn check_supported(&self, name: &str, ctx: &ScriptingContext) -> Result<()> {
        if self.is_supported(name, ctx) {
            return Ok(());
        }
        let required = compat::min_version(self.kind, name).unwrap_or(ctx.target_version);
        Err(DdlError::unsupported_version(
            format!("{}.{}", self.kind, name),
            ctx.target_version,
            required,
        ))
    }

    fn convert<T: PropertyType>(&self, name: &str, value: Option<&Value>) -> Result<Option<T>> {
        match value {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| {
                DdlError::wrong_value(
                    self.kind.to_string(),
                    name,
                    format!("unexpected value type: {}", value),
                )
            }),
        }
    }

    /// Gated read of the current value.
    ///
    /// Fails with `UnsupportedVersion` when the property is not legal for
    /// the target, rather than returning a default.
    pub fn get<T: PropertyType>(&self, name: &str, ctx: &ScriptingContext) -> Result<Option<T>> {
        self.check_supported(name, ctx)?;
        self.convert(name, self.property(name).and_then(|p| p.value()))
    }

    /// Gated read that yields `None` when the property is unsupported.
    pub fn get_if_supported<T: PropertyType>(
        &self,
        name: &str,
        ctx: &ScriptingContext,
    ) -> Result<Option<T>> {
        if !self.is_supported(name, ctx) {
            return Ok(None);
        }
        self.convert(name, self.property(name).and_then(|p| p.value()))
    }

    /// Gated read with a fallback for absent or unsupported values.
    pub fn get_or<T: PropertyType>(
        &self,
        name: &str,
        ctx: &ScriptingContext,
        default: T,
    ) -> Result<T> {
        Ok(self.get_if_supported(name, ctx)?.unwrap_or(default))
    }

    /// Gated read of the committed value only, ignoring pending changes.
    pub fn get_committed<T: PropertyType>(
        &self,
        name: &str,
        ctx: &ScriptingContext,
    ) -> Result<Option<T>> {
        if !self.is_supported(name, ctx) {
            return Ok(None);
        }
        self.convert(name, self.property(name).and_then(|p| p.committed()))
    }
}
