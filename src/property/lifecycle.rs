//! Object lifecycle and the state every scriptable object carries

use std::fmt;

use super::{PropertyBag, PropertyType};
use crate::compat::ObjectKind;
use crate::error::{DdlError, Result};

/// Where an object stands relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    /// Constructed, never touched
    #[default]
    Pending,
    /// Being defined; not yet created on the target
    Creating,
    /// Materialized on the target
    Existing,
    /// Scheduled for removal by a cascading drop
    ToBeDropped,
    Dropped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Pending => "Pending",
            LifecycleState::Creating => "Creating",
            LifecycleState::Existing => "Existing",
            LifecycleState::ToBeDropped => "ToBeDropped",
            LifecycleState::Dropped => "Dropped",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(LifecycleState::Pending),
            "creating" => Ok(LifecycleState::Creating),
            "existing" => Ok(LifecycleState::Existing),
            "tobedropped" => Ok(LifecycleState::ToBeDropped),
            "dropped" => Ok(LifecycleState::Dropped),
            _ => Err(format!("Unknown lifecycle state: {}", s)),
        }
    }
}

impl LifecycleState {
    /// Not yet materialized on the target.
    pub fn is_new(&self) -> bool {
        matches!(self, LifecycleState::Pending | LifecycleState::Creating)
    }
}

/// Name, lifecycle state and property bag shared by every scriptable object.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    name: String,
    state: LifecycleState,
    properties: PropertyBag,
}

impl TrackedObject {
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Pending,
            properties: PropertyBag::new(kind),
        }
    }

    /// An object already materialized on the target.
    pub fn existing(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Existing,
            properties: PropertyBag::new(kind),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.properties.kind()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        if self.state == LifecycleState::Pending {
            self.state = LifecycleState::Creating;
        }
        &mut self.properties
    }

    /// Set a property from the user side.
    pub fn set<T: PropertyType>(&mut self, name: &str, value: T) {
        self.properties_mut().set(name, value);
    }

    /// Record a property read from the target.
    pub fn load<T: PropertyType>(&mut self, name: &str, value: T) {
        self.properties.load(name, value);
    }

    /// Put the object back in a state recorded earlier, skipping the
    /// transitions that mutations and attachment normally trigger.
    pub(crate) fn restore(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// Attachment to a parent also starts the definition.
    pub fn attach(&mut self) {
        if self.state == LifecycleState::Pending {
            self.state = LifecycleState::Creating;
        }
    }

    fn invalid(&self, operation: &str) -> DdlError {
        DdlError::InvalidOperation {
            operation: operation.to_string(),
            object: format!("{} {}", self.kind(), self.name),
            state: self.state.to_string(),
        }
    }

    pub fn ensure_creatable(&self) -> Result<()> {
        if self.state.is_new() {
            Ok(())
        } else {
            Err(self.invalid("create"))
        }
    }

    pub fn ensure_alterable(&self) -> Result<()> {
        if self.state == LifecycleState::Existing {
            Ok(())
        } else {
            Err(self.invalid("alter"))
        }
    }

    /// Scripting a definition: a new object, or an existing one being
    /// scripted out as it stands.
    pub fn ensure_definable(&self) -> Result<()> {
        match self.state {
            LifecycleState::ToBeDropped | LifecycleState::Dropped => Err(self.invalid("script")),
            _ => Ok(()),
        }
    }

    /// Operations that only make sense against the live object.
    pub fn ensure_existing(&self, operation: &str) -> Result<()> {
        if self.state == LifecycleState::Existing {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    pub fn ensure_droppable(&self) -> Result<()> {
        if matches!(
            self.state,
            LifecycleState::Existing | LifecycleState::ToBeDropped
        ) {
            Ok(())
        } else {
            Err(self.invalid("drop"))
        }
    }

    /// The create script was applied: commit and become `Existing`.
    pub fn mark_created(&mut self) -> Result<()> {
        self.ensure_creatable()?;
        self.properties.commit();
        self.state = LifecycleState::Existing;
        Ok(())
    }

    /// The alter script was applied: commit pending values.
    pub fn mark_altered(&mut self) -> Result<()> {
        self.ensure_alterable()?;
        self.properties.commit();
        Ok(())
    }

    /// Schedule for a cascading drop.
    pub fn mark_for_drop(&mut self) {
        self.state = LifecycleState::ToBeDropped;
    }

    /// The drop script was applied.
    pub fn mark_dropped(&mut self) -> Result<()> {
        self.ensure_droppable()?;
        self.state = LifecycleState::Dropped;
        Ok(())
    }
}
