//! Property-widget synchronization core.
//!
//! This module keeps a GUI control and a single device property mutually
//! consistent. It has three pieces:
//!
//! - [`PropertyIdentifier`] / [`PropertyMetadata`]: which property a binding
//!   talks to, and what the session says about it (type, read-only flag,
//!   allowed values, numeric limits). Metadata is queried once, at binding
//!   construction.
//! - [`ControlKind`]: the closed set of control representations, and the
//!   ordered dispatch that picks one from metadata.
//! - [`BoundControl`] (in `binding`): the live two-way binding itself —
//!   pulls the initial value, subscribes to change notifications, pushes
//!   user edits back, and suppresses its own write-back path while applying
//!   session-originated values so no update ever loops.
//!
//! The session handle is passed in explicitly everywhere; this module holds
//! no global state.

mod binding;
mod widget;

pub use binding::{BoundControl, PropertyValue};

use crate::core::{ControlCore, PropertyType};
use crate::error::{AppResult, ScopeError};

/// Identifies one property on one loaded device.
///
/// Immutable once a binding exists; a pair that does not resolve against
/// the session is a construction-time error, never a runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyIdentifier {
    /// Device label, as listed by the session.
    pub device: String,
    /// Property name on that device.
    pub property: String,
}

impl PropertyIdentifier {
    /// Create an identifier. Existence is checked by
    /// [`PropertyMetadata::query`], not here.
    pub fn new(device: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            property: property.into(),
        }
    }
}

impl std::fmt::Display for PropertyIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.device, self.property)
    }
}

/// Everything the session declares about a property, captured at binding
/// construction time.
///
/// Metadata is assumed stable for the lifetime of a binding; only the
/// *value* is ever re-pulled (via `refresh`).
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    /// Declared value type.
    pub property_type: PropertyType,
    /// Whether the session reports the property as read-only.
    pub read_only: bool,
    /// Declared allowed values, in declaration order; empty means
    /// unconstrained.
    pub allowed_values: Vec<String>,
    /// Declared `(lower, upper)` limits, if any.
    pub limits: Option<(f64, f64)>,
}

impl PropertyMetadata {
    /// Query the session for a property's metadata, failing fast if the
    /// device is not loaded or the property does not exist on it.
    pub fn query(core: &dyn ControlCore, ident: &PropertyIdentifier) -> AppResult<Self> {
        if !core.loaded_devices().iter().any(|d| d == &ident.device) {
            return Err(ScopeError::DeviceNotLoaded(ident.device.clone()));
        }
        if !core.has_property(&ident.device, &ident.property) {
            return Err(ScopeError::PropertyNotFound {
                device: ident.device.clone(),
                property: ident.property.clone(),
            });
        }
        Ok(Self {
            property_type: core.property_type(&ident.device, &ident.property)?,
            read_only: core.is_property_read_only(&ident.device, &ident.property)?,
            allowed_values: core.allowed_property_values(&ident.device, &ident.property)?,
            limits: core.property_limits(&ident.device, &ident.property)?,
        })
    }
}

/// The closed set of control representations a property can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Plain value display; never writes back.
    ReadOnly,
    /// Two-state toggle over an integer property constrained to {0, 1}.
    Toggle,
    /// Closed selection over a declared allowed-value list.
    Choice,
    /// Bounded integer slider with stretch-to-contain limits.
    IntSlider,
    /// Bounded float slider with stretch-to-contain limits.
    FloatSlider,
    /// Free-form text entry.
    Text,
}

impl ControlKind {
    /// Pick the control representation for a property.
    ///
    /// Dispatch is ordered and the first match wins:
    ///
    /// 1. read-only properties always display as [`ControlKind::ReadOnly`],
    ///    whatever their type or allowed values declare;
    /// 2. a non-empty allowed set makes the control enumerated — a
    ///    [`ControlKind::Toggle`] when the property is an integer whose
    ///    allowed set is exactly {0, 1}, a [`ControlKind::Choice`]
    ///    otherwise;
    /// 3. everything else dispatches on the declared type: integers and
    ///    floats get bounded sliders, text gets a free entry field.
    pub fn resolve(meta: &PropertyMetadata) -> ControlKind {
        if meta.read_only {
            return ControlKind::ReadOnly;
        }
        if !meta.allowed_values.is_empty() {
            if meta.property_type == PropertyType::Integer && is_zero_one_set(&meta.allowed_values)
            {
                return ControlKind::Toggle;
            }
            return ControlKind::Choice;
        }
        match meta.property_type {
            PropertyType::Integer => ControlKind::IntSlider,
            PropertyType::Float => ControlKind::FloatSlider,
            PropertyType::Text => ControlKind::Text,
        }
    }
}

/// Resolve the control representation for a property straight from the
/// session: metadata query (fail-fast on unknown references) followed by
/// [`ControlKind::resolve`].
pub fn resolve_control_kind(
    core: &dyn ControlCore,
    ident: &PropertyIdentifier,
) -> AppResult<ControlKind> {
    Ok(ControlKind::resolve(&PropertyMetadata::query(core, ident)?))
}

/// True when `values`, taken as a set, is exactly {"0", "1"}.
fn is_zero_one_set(values: &[String]) -> bool {
    values.len() == 2
        && values.iter().any(|v| v == "0")
        && values.iter().any(|v| v == "1")
}
