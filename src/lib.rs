//! # rust_scope Core Library
//!
//! Core library for the `rust_scope` application: a desktop GUI for
//! controlling a microscope through a hardware abstraction layer. Devices
//! expose named, typed, possibly constrained properties via a shared
//! control session, and the GUI binds one live control to each property.
//!
//! ## Crate Structure
//!
//! - **`core`**: The `ControlCore` trait — the shared session handle every
//!   other module talks to — plus the property-change notification types.
//! - **`property`**: The property-widget synchronization core: metadata
//!   capture, control-kind resolution, and the `BoundControl` two-way
//!   binding with feedback-loop suppression.
//! - **`hardware`**: Device-adapter implementations of the session; today
//!   the in-process `SimulatedCore`.
//! - **`gui`**: The eframe/egui main window: device tabs, property tables,
//!   and the log panel.
//! - **`config`**: Figment-based configuration (file + environment) for
//!   the application, window, and device roster.
//! - **`error`**: The central `ScopeError` enum and `AppResult` alias.
//! - **`logging`** / **`log_capture`**: Logger installation for the GUI and
//!   headless frontends, and the in-window log capture buffer.

pub mod config;
pub mod core;
pub mod error;
pub mod gui;
pub mod hardware;
pub mod log_capture;
pub mod logging;
pub mod property;
