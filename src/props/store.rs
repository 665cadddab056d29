//! Per-node property store with managed/unmanaged change tracking.
//!
//! Each property is registered with [`PropertyStore::define`] under an explicit
//! string key and a fixed [`ValueKind`]. Assignments only count as a change when
//! the new value differs structurally from the stored one; unchanged
//! assignments fire no callbacks.
//!
//! Two write paths exist:
//!
//! - [`set`](PropertyStore::set): direct, imperative assignment. Marks the
//!   property as set directly for the current cycle.
//! - [`apply_managed_update`](PropertyStore::apply_managed_update): the value a
//!   reconciliation pass wants. For a *managed* property that was already set
//!   directly this cycle, it is ignored, so imperative writes win over
//!   declarative re-application. Unmanaged properties always take it.
//!
//! [`end_cycle`](PropertyStore::end_cycle) forgets the direct-set marks.

use std::fmt;

use super::error::PropertyError;
use super::value::{Value, ValueKind};

/// Callback receiving the new value (`None` when unset).
pub type ValueCallback = Box<dyn Fn(Option<&Value>)>;

/// Callback receiving `(new, old)`.
pub type ChangeCallback = Box<dyn Fn(Option<&Value>, Option<&Value>)>;

// ---------------------------------------------------------------------------
// PropertyDef
// ---------------------------------------------------------------------------

/// Registration parameters for a single property.
pub struct PropertyDef {
    kind: ValueKind,
    initial: Option<Value>,
    managed: bool,
    notify: Option<ValueCallback>,
    on_update: Option<ValueCallback>,
    on_update_with_old: Option<ChangeCallback>,
}

impl PropertyDef {
    /// An unmanaged property of the given kind with no initial value.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            initial: None,
            managed: false,
            notify: None,
            on_update: None,
            on_update_with_old: None,
        }
    }

    /// Mark the property as managed (builder).
    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }

    /// Seed the property with an initial value (builder).
    pub fn with_initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Callback fired on every change with the new value (builder).
    pub fn on_notify(mut self, f: impl Fn(Option<&Value>) + 'static) -> Self {
        self.notify = Some(Box::new(f));
        self
    }

    /// Callback fired after `notify` on every change (builder).
    pub fn on_update(mut self, f: impl Fn(Option<&Value>) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Callback fired after `on_update` with `(new, old)` (builder).
    pub fn on_update_with_old(
        mut self,
        f: impl Fn(Option<&Value>, Option<&Value>) + 'static,
    ) -> Self {
        self.on_update_with_old = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("kind", &self.kind)
            .field("initial", &self.initial)
            .field("managed", &self.managed)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PropertyStore
// ---------------------------------------------------------------------------

struct Slot {
    name: String,
    kind: ValueKind,
    managed: bool,
    value: Option<Value>,
    set_directly: bool,
    notify: Option<ValueCallback>,
    on_update: Option<ValueCallback>,
    on_update_with_old: Option<ChangeCallback>,
}

/// Key/value state container owned by one node.
///
/// Slots are kept in definition order; nodes carry only a handful of
/// properties so lookup is a linear scan.
#[derive(Default)]
pub struct PropertyStore {
    slots: Vec<Slot>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a property. Seeds the stored value if `def` carries one.
    ///
    /// No callbacks fire for the initial value.
    pub fn define(&mut self, name: impl Into<String>, def: PropertyDef) -> Result<(), PropertyError> {
        let name = name.into();
        if self.is_defined(&name) {
            return Err(PropertyError::AlreadyDefined(name));
        }
        if let Some(initial) = &def.initial {
            check_kind(&name, def.kind, initial)?;
        }
        self.slots.push(Slot {
            name,
            kind: def.kind,
            managed: def.managed,
            value: def.initial,
            set_directly: false,
            notify: def.notify,
            on_update: def.on_update,
            on_update_with_old: def.on_update_with_old,
        });
        Ok(())
    }

    /// Whether a property with this name has been defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Whether the property is managed. `None` if undefined.
    pub fn is_managed(&self, name: &str) -> Option<bool> {
        self.slot(name).map(|s| s.managed)
    }

    /// Declared kind of the property. `None` if undefined.
    pub fn kind(&self, name: &str) -> Option<ValueKind> {
        self.slot(name).map(|s| s.kind)
    }

    /// Current value. `None` if unset or undefined.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slot(name).and_then(|s| s.value.as_ref())
    }

    /// Whether the property was assigned through [`set`](Self::set) this cycle.
    pub fn was_set_directly(&self, name: &str) -> bool {
        self.slot(name).is_some_and(|s| s.set_directly)
    }

    /// Direct assignment. `None` unsets the property.
    ///
    /// Returns `Ok(true)` if the stored value changed.
    pub fn set(&mut self, name: &str, value: Option<Value>) -> Result<bool, PropertyError> {
        let slot = self.checked_slot_mut(name, value.as_ref())?;
        if slot.value == value {
            return Ok(false);
        }
        slot.set_directly = true;
        slot.assign(value);
        Ok(true)
    }

    /// Declarative assignment coming from a reconciliation pass.
    ///
    /// A no-op for managed properties already set directly this cycle.
    /// Returns `Ok(true)` if the stored value changed.
    pub fn apply_managed_update(
        &mut self,
        name: &str,
        value: Option<Value>,
    ) -> Result<bool, PropertyError> {
        let slot = self.checked_slot_mut(name, value.as_ref())?;
        if slot.managed && slot.set_directly {
            return Ok(false);
        }
        if slot.value == value {
            return Ok(false);
        }
        slot.assign(value);
        Ok(true)
    }

    /// Forget which properties were set directly.
    pub fn end_cycle(&mut self) {
        for slot in &mut self.slots {
            slot.set_directly = false;
        }
    }

    /// Iterate over set properties in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots
            .iter()
            .filter_map(|s| s.value.as_ref().map(|v| (s.name.as_str(), v)))
    }

    /// Number of defined properties (set or not).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    fn checked_slot_mut(
        &mut self,
        name: &str,
        value: Option<&Value>,
    ) -> Result<&mut Slot, PropertyError> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| PropertyError::Undefined(name.to_owned()))?;
        if let Some(v) = value {
            check_kind(name, slot.kind, v)?;
        }
        Ok(slot)
    }
}

impl Slot {
    /// Store `value` and fire callbacks: notify, update, update-with-old.
    fn assign(&mut self, value: Option<Value>) {
        let old = std::mem::replace(&mut self.value, value);
        let new = self.value.as_ref();
        if let Some(notify) = &self.notify {
            notify(new);
        }
        if let Some(on_update) = &self.on_update {
            on_update(new);
        }
        if let Some(on_update_with_old) = &self.on_update_with_old {
            on_update_with_old(new, old.as_ref());
        }
    }
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|s| (&s.name, &s.value)))
            .finish()
    }
}

fn check_kind(name: &str, expected: ValueKind, value: &Value) -> Result<(), PropertyError> {
    let found = value.kind();
    if found != expected {
        return Err(PropertyError::TypeMismatch {
            name: name.to_owned(),
            expected,
            found,
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
