//! Core traits and data types for the microscope control session.
//!
//! Everything the application knows about hardware flows through one shared
//! handle: the [`ControlCore`] trait. It models the device-adapter layer the
//! way the rest of the crate needs to see it — a flat namespace of loaded
//! devices, each exposing named, typed, possibly constrained properties
//! whose values travel as strings.
//!
//! ## Design
//!
//! - **Explicit handle, no singleton.** The session is passed around as
//!   `Arc<dyn ControlCore>` ([`SharedCore`]). Every consumer receives it as
//!   a constructor argument; nothing reaches for global state.
//! - **String-encoded values.** Property reads, writes, and change
//!   notifications all carry the value as a string; typed interpretation is
//!   the job of the consumer (see the `property` module). This matches how
//!   device adapters actually report values and keeps the trait object
//!   simple.
//! - **Multicast notifications.** [`ControlCore::subscribe`] hands out an
//!   independent `tokio::sync::broadcast` receiver per caller. Every
//!   subscriber observes every change, in the order the producing writes
//!   happened. Dropping the receiver is the unsubscribe operation, so a
//!   consumer that tore down simply never sees late events.
//!
//! All methods are synchronous and expected to return quickly; calls that
//! can stall on hardware do not belong on this trait.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::AppResult;

/// The declared type of a device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Whole-number values, encoded in decimal.
    Integer,
    /// Floating-point values.
    Float,
    /// Free-form text (the default for anything non-numeric).
    Text,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::Integer => write!(f, "Integer"),
            PropertyType::Float => write!(f, "Float"),
            PropertyType::Text => write!(f, "Text"),
        }
    }
}

/// A property-change notification.
///
/// Emitted by the session strictly after the producing write has landed, so
/// a subscriber that immediately reads the property back sees a value at
/// least as new as the one carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    /// Label of the device whose property changed.
    pub device: String,
    /// Name of the property that changed.
    pub property: String,
    /// The new value, string-encoded.
    pub value: String,
}

impl PropertyChange {
    /// True if this notification is about the given (device, property) pair.
    pub fn concerns(&self, device: &str, property: &str) -> bool {
        self.device == device && self.property == property
    }
}

/// The shared hardware-control session handle.
///
/// Implemented by device-adapter layers (see `hardware::SimulatedCore` for
/// the in-process one). Shared read-mostly: many consumers hold clones of
/// one `Arc`, and none may assume exclusive access.
pub trait ControlCore: Send + Sync {
    /// Labels of all currently loaded devices.
    fn loaded_devices(&self) -> Vec<String>;

    /// Property names exposed by a device, in the device's declared order.
    fn device_property_names(&self, device: &str) -> AppResult<Vec<String>>;

    /// Whether `device` is loaded and exposes `property`.
    fn has_property(&self, device: &str, property: &str) -> bool;

    /// Declared type of a property.
    fn property_type(&self, device: &str, property: &str) -> AppResult<PropertyType>;

    /// Authoritative read-only flag for a property.
    fn is_property_read_only(&self, device: &str, property: &str) -> AppResult<bool>;

    /// The declared allowed-value set, in declaration order.
    ///
    /// Empty means the property is unconstrained.
    fn allowed_property_values(&self, device: &str, property: &str) -> AppResult<Vec<String>>;

    /// Declared numeric limits as `(lower, upper)`, if the property has any.
    fn property_limits(&self, device: &str, property: &str) -> AppResult<Option<(f64, f64)>>;

    /// Current value of a property, string-encoded.
    fn get_property(&self, device: &str, property: &str) -> AppResult<String>;

    /// Write a property value.
    ///
    /// Rejects writes to unknown or read-only properties and values outside
    /// a declared allowed set. On success a [`PropertyChange`] is delivered
    /// to every subscriber, after the write.
    fn set_property(&self, device: &str, property: &str, value: &str) -> AppResult<()>;

    /// Subscribe to the property-change stream.
    ///
    /// Each call returns an independent receiver; dropping it unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<PropertyChange>;
}

/// Shared, reference-counted session handle.
pub type SharedCore = Arc<dyn ControlCore>;
