//! Device-adapter implementations of the control session.
//!
//! Only the in-process simulated adapter lives here today; a real adapter
//! for a hardware abstraction layer would slot in beside it behind the same
//! `ControlCore` trait.

pub mod sim;

pub use sim::{SimulatedCore, SimulatedDeviceKind};
