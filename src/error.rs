//! Custom error types for the application.
//!
//! This module defines the primary error type, `ScopeError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of errors that can occur,
//! from configuration and I/O issues to property-binding failures.
//!
//! ## Error Hierarchy
//!
//! `ScopeError` consolidates the error sources of the application:
//!
//! - **`Config`**: Wraps errors from the `figment` crate, typically file
//!   parsing or format issues in the configuration files.
//! - **`Configuration`**: Semantic errors in the configuration, i.e. values
//!   that parse but are logically invalid. Caught during validation.
//! - **`Io`**: Wraps standard `std::io::Error`.
//! - **`DeviceNotLoaded` / `PropertyNotFound`**: A binding referenced a
//!   device or property the control session does not know about. Both are
//!   raised synchronously at binding construction, before any control
//!   state exists.
//! - **`InvalidChoice`**: A value outside a property's declared allowed set
//!   was pushed into an enumerated control. The control state is left
//!   unchanged when this is returned.
//! - **`InvalidNumber`**: A value that must back a numeric or two-state
//!   control did not parse. The session encodes all values as strings, so
//!   this is a reachable condition rather than a programming error.
//! - **`PropertyReadOnly`**: The session rejected a write to a read-only
//!   property.
//! - **`Core`**: A general category for failures reported by the control
//!   session itself (the hardware layer behind it).
//!
//! By using `#[from]`, `ScopeError` can be seamlessly created from the
//! underlying error types, keeping `?` propagation terse throughout the
//! application.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ScopeError>;

/// The application error type.
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// File or terminal I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A binding referenced a device that is not loaded in the session.
    #[error("Device not loaded: {0:?}")]
    DeviceNotLoaded(String),

    /// A binding referenced a property the device does not expose.
    #[error("Device {device:?} has no property {property:?}")]
    PropertyNotFound {
        /// Device label the lookup ran against.
        device: String,
        /// Property name that was not found.
        property: String,
    },

    /// A value outside an enumerated property's allowed set.
    #[error("{value:?} is not one of the allowed values {allowed:?}")]
    InvalidChoice {
        /// The rejected value.
        value: String,
        /// The declared allowed set, in declaration order.
        allowed: Vec<String>,
    },

    /// A string that must back a numeric or two-state store did not parse.
    #[error("Cannot interpret {value:?} as {wanted}")]
    InvalidNumber {
        /// The unparseable value.
        value: String,
        /// Human-readable name of the expected encoding.
        wanted: &'static str,
    },

    /// Write attempted on a read-only property.
    #[error("Property {device}/{property} is read-only")]
    PropertyReadOnly {
        /// Device label.
        device: String,
        /// Property name.
        property: String,
    },

    /// Failure reported by the control session (hardware layer).
    #[error("Control session error: {0}")]
    Core(String),
}

impl ScopeError {
    /// True for the two construction-time reference failures.
    ///
    /// Both mean the (device, property) pair handed to a binding does not
    /// exist in the session, and a control must not be constructed.
    pub fn is_invalid_reference(&self) -> bool {
        matches!(
            self,
            ScopeError::DeviceNotLoaded(_) | ScopeError::PropertyNotFound { .. }
        )
    }
}
