//! Simulated control session for development and testing.
//!
//! Provides [`SimulatedCore`], an in-process `ControlCore` implementation
//! backed by a plain device table. It enforces the same write rules a real
//! adapter layer would (unknown references, read-only properties, allowed
//! sets, numeric encodings) and emits a [`PropertyChange`] after every
//! accepted write, so the property-binding core can be exercised end to end
//! without hardware attached.
//!
//! The standard device roster mirrors a small microscope: a camera with
//! enumerated binning and limited exposure/gain, a two-state shutter, a
//! single-axis focus stage, and a free-form generic device. Read-only
//! sensor readouts (camera temperature) drift a little on every
//! [`SimulatedCore::tick`], which gives the GUI a steady source of
//! session-originated updates.

use std::sync::RwLock;

use rand::Rng;
use tokio::sync::broadcast;

use crate::core::{ControlCore, PropertyChange, PropertyType};
use crate::error::{AppResult, ScopeError};

/// Capacity of the change-notification channel.
///
/// Generous relative to the per-frame drain cadence; a subscriber that
/// still lags is told so by the channel and resynchronizes via `refresh`.
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// One property of a simulated device.
#[derive(Debug, Clone)]
struct SimProperty {
    name: String,
    value: String,
    property_type: PropertyType,
    read_only: bool,
    allowed: Vec<String>,
    limits: Option<(f64, f64)>,
}

impl SimProperty {
    fn new(name: &str, property_type: PropertyType, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            property_type,
            read_only: false,
            allowed: Vec::new(),
            limits: None,
        }
    }

    fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn with_allowed<const N: usize>(mut self, allowed: [&str; N]) -> Self {
        self.allowed = allowed.iter().map(|s| s.to_string()).collect();
        self
    }

    fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.limits = Some((lower, upper));
        self
    }
}

/// One simulated device: a label plus an ordered property list.
#[derive(Debug, Clone)]
struct SimDevice {
    label: String,
    properties: Vec<SimProperty>,
}

impl SimDevice {
    fn property(&self, name: &str) -> Option<&SimProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn property_mut(&mut self, name: &str) -> Option<&mut SimProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }
}

/// The kinds of simulated devices the standard roster knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedDeviceKind {
    /// Camera with binning choices, exposure/gain limits, and a drifting
    /// read-only temperature readout.
    Camera,
    /// Two-state shutter (`State` is an integer constrained to 0/1).
    Shutter,
    /// Single-axis stage with a limited `Position`.
    Stage,
    /// Catch-all device with free-text and read-only properties.
    Generic,
}

/// In-process control session with a configurable device table.
pub struct SimulatedCore {
    devices: RwLock<Vec<SimDevice>>,
    changes: broadcast::Sender<PropertyChange>,
}

impl Default for SimulatedCore {
    fn default() -> Self {
        Self::empty()
    }
}

impl SimulatedCore {
    /// Create a session with no devices loaded.
    pub fn empty() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            devices: RwLock::new(Vec::new()),
            changes,
        }
    }

    /// Create a session with the default demo roster.
    pub fn with_demo_devices() -> Self {
        let core = Self::empty();
        core.load_device("Camera", SimulatedDeviceKind::Camera);
        core.load_device("Shutter", SimulatedDeviceKind::Shutter);
        core.load_device("Stage", SimulatedDeviceKind::Stage);
        core
    }

    /// Load one device of the given kind under `label`.
    ///
    /// Reloading an existing label replaces the previous device.
    pub fn load_device(&self, label: &str, kind: SimulatedDeviceKind) {
        let device = match kind {
            SimulatedDeviceKind::Camera => Self::camera(label),
            SimulatedDeviceKind::Shutter => Self::shutter(label),
            SimulatedDeviceKind::Stage => Self::stage(label),
            SimulatedDeviceKind::Generic => Self::generic(label),
        };
        let mut devices = self.write_table();
        devices.retain(|d| d.label != label);
        devices.push(device);
        log::debug!("Loaded simulated device '{label}' ({kind:?})");
    }

    /// Push a hardware-originated value change, bypassing the read-only
    /// check (the device itself is the writer). Unknown references are
    /// reported as errors just like regular writes.
    pub fn apply_external(&self, device: &str, property: &str, value: &str) -> AppResult<()> {
        {
            let mut devices = self.write_table();
            let dev = devices
                .iter_mut()
                .find(|d| d.label == device)
                .ok_or_else(|| ScopeError::DeviceNotLoaded(device.to_string()))?;
            let prop = dev
                .property_mut(property)
                .ok_or_else(|| ScopeError::PropertyNotFound {
                    device: device.to_string(),
                    property: property.to_string(),
                })?;
            prop.value = value.to_string();
        }
        self.announce(device, property, value);
        Ok(())
    }

    /// Advance the simulation one step: drift every read-only float
    /// readout by a small random amount and announce the new values.
    pub fn tick(&self) {
        let mut drifted = Vec::new();
        {
            let mut devices = self.write_table();
            let mut rng = rand::thread_rng();
            for dev in devices.iter_mut() {
                for prop in dev.properties.iter_mut() {
                    if !(prop.read_only && prop.property_type == PropertyType::Float) {
                        continue;
                    }
                    let Ok(current) = prop.value.parse::<f64>() else {
                        continue;
                    };
                    let next = current + rng.gen_range(-0.05..0.05);
                    prop.value = format!("{next:.2}");
                    drifted.push((dev.label.clone(), prop.name.clone(), prop.value.clone()));
                }
            }
        }
        for (device, property, value) in drifted {
            self.announce(&device, &property, &value);
        }
    }

    fn announce(&self, device: &str, property: &str, value: &str) {
        // Send errors only mean nobody is subscribed right now.
        let _ = self.changes.send(PropertyChange {
            device: device.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        });
    }

    // Lock poisoning is unrecoverable for the device table; writers hold
    // the guard only across plain field updates.
    #[allow(clippy::unwrap_used)]
    fn read_table(&self) -> std::sync::RwLockReadGuard<'_, Vec<SimDevice>> {
        self.devices.read().unwrap()
    }

    #[allow(clippy::unwrap_used)]
    fn write_table(&self) -> std::sync::RwLockWriteGuard<'_, Vec<SimDevice>> {
        self.devices.write().unwrap()
    }

    fn with_property<T>(
        &self,
        device: &str,
        property: &str,
        f: impl FnOnce(&SimProperty) -> T,
    ) -> AppResult<T> {
        let devices = self.read_table();
        let dev = devices
            .iter()
            .find(|d| d.label == device)
            .ok_or_else(|| ScopeError::DeviceNotLoaded(device.to_string()))?;
        let prop = dev
            .property(property)
            .ok_or_else(|| ScopeError::PropertyNotFound {
                device: device.to_string(),
                property: property.to_string(),
            })?;
        Ok(f(prop))
    }

    fn camera(label: &str) -> SimDevice {
        SimDevice {
            label: label.to_string(),
            properties: vec![
                SimProperty::new("Binning", PropertyType::Text, "1").with_allowed(["1", "2", "4"]),
                SimProperty::new("Exposure", PropertyType::Float, "10.0")
                    .with_limits(0.1, 10000.0),
                SimProperty::new("Gain", PropertyType::Integer, "1").with_limits(1.0, 16.0),
                SimProperty::new("TransposeMirrorX", PropertyType::Integer, "0")
                    .with_allowed(["0", "1"]),
                SimProperty::new("CameraID", PropertyType::Text, "SimCam-0042").read_only(),
                SimProperty::new("CCDTemperature", PropertyType::Float, "-5.00").read_only(),
            ],
        }
    }

    fn shutter(label: &str) -> SimDevice {
        SimDevice {
            label: label.to_string(),
            properties: vec![
                SimProperty::new("State", PropertyType::Integer, "0").with_allowed(["0", "1"]),
                SimProperty::new("Name", PropertyType::Text, "SimShutter").read_only(),
            ],
        }
    }

    fn stage(label: &str) -> SimDevice {
        SimDevice {
            label: label.to_string(),
            properties: vec![
                SimProperty::new("Position", PropertyType::Float, "0.0").with_limits(0.0, 100.0),
                SimProperty::new("Velocity", PropertyType::Float, "1.0").with_limits(0.1, 10.0),
                SimProperty::new("StepCount", PropertyType::Integer, "0"),
            ],
        }
    }

    fn generic(label: &str) -> SimDevice {
        SimDevice {
            label: label.to_string(),
            properties: vec![
                SimProperty::new("Label", PropertyType::Text, ""),
                SimProperty::new("Description", PropertyType::Text, "Simulated device")
                    .read_only(),
            ],
        }
    }
}

impl ControlCore for SimulatedCore {
    fn loaded_devices(&self) -> Vec<String> {
        self.read_table().iter().map(|d| d.label.clone()).collect()
    }

    fn device_property_names(&self, device: &str) -> AppResult<Vec<String>> {
        let devices = self.read_table();
        let dev = devices
            .iter()
            .find(|d| d.label == device)
            .ok_or_else(|| ScopeError::DeviceNotLoaded(device.to_string()))?;
        Ok(dev.properties.iter().map(|p| p.name.clone()).collect())
    }

    fn has_property(&self, device: &str, property: &str) -> bool {
        self.read_table()
            .iter()
            .any(|d| d.label == device && d.property(property).is_some())
    }

    fn property_type(&self, device: &str, property: &str) -> AppResult<PropertyType> {
        self.with_property(device, property, |p| p.property_type)
    }

    fn is_property_read_only(&self, device: &str, property: &str) -> AppResult<bool> {
        self.with_property(device, property, |p| p.read_only)
    }

    fn allowed_property_values(&self, device: &str, property: &str) -> AppResult<Vec<String>> {
        self.with_property(device, property, |p| p.allowed.clone())
    }

    fn property_limits(&self, device: &str, property: &str) -> AppResult<Option<(f64, f64)>> {
        self.with_property(device, property, |p| p.limits)
    }

    fn get_property(&self, device: &str, property: &str) -> AppResult<String> {
        self.with_property(device, property, |p| p.value.clone())
    }

    fn set_property(&self, device: &str, property: &str, value: &str) -> AppResult<()> {
        {
            let mut devices = self.write_table();
            let dev = devices
                .iter_mut()
                .find(|d| d.label == device)
                .ok_or_else(|| ScopeError::DeviceNotLoaded(device.to_string()))?;
            let prop = dev
                .property_mut(property)
                .ok_or_else(|| ScopeError::PropertyNotFound {
                    device: device.to_string(),
                    property: property.to_string(),
                })?;

            if prop.read_only {
                return Err(ScopeError::PropertyReadOnly {
                    device: device.to_string(),
                    property: property.to_string(),
                });
            }
            if !prop.allowed.is_empty() && !prop.allowed.iter().any(|a| a == value) {
                return Err(ScopeError::InvalidChoice {
                    value: value.to_string(),
                    allowed: prop.allowed.clone(),
                });
            }
            match prop.property_type {
                PropertyType::Integer => {
                    value
                        .parse::<i64>()
                        .map_err(|_| ScopeError::InvalidNumber {
                            value: value.to_string(),
                            wanted: "an integer",
                        })?;
                }
                PropertyType::Float => {
                    value.parse::<f64>().map_err(|_| ScopeError::InvalidNumber {
                        value: value.to_string(),
                        wanted: "a float",
                    })?;
                }
                PropertyType::Text => {}
            }

            prop.value = value.to_string();
        }
        // Announced strictly after the write has landed.
        self.announce(device, property, value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PropertyChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_roster_is_loaded_in_order() {
        let core = SimulatedCore::with_demo_devices();
        assert_eq!(core.loaded_devices(), vec!["Camera", "Shutter", "Stage"]);
        let names = core.device_property_names("Camera").unwrap();
        assert_eq!(names[0], "Binning");
        assert!(core.has_property("Shutter", "State"));
        assert!(!core.has_property("Shutter", "Position"));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let core = SimulatedCore::with_demo_devices();
        assert!(matches!(
            core.get_property("Laser", "Power"),
            Err(ScopeError::DeviceNotLoaded(_))
        ));
        assert!(matches!(
            core.get_property("Camera", "Power"),
            Err(ScopeError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn writes_validate_against_declared_constraints() {
        let core = SimulatedCore::with_demo_devices();
        assert!(core.set_property("Camera", "Binning", "4").is_ok());
        assert!(matches!(
            core.set_property("Camera", "Binning", "8"),
            Err(ScopeError::InvalidChoice { .. })
        ));
        assert!(matches!(
            core.set_property("Camera", "CameraID", "other"),
            Err(ScopeError::PropertyReadOnly { .. })
        ));
        assert!(matches!(
            core.set_property("Camera", "Gain", "not-a-number"),
            Err(ScopeError::InvalidNumber { .. })
        ));
        // The rejected writes left the stored values alone.
        assert_eq!(core.get_property("Camera", "Binning").unwrap(), "4");
        assert_eq!(core.get_property("Camera", "Gain").unwrap(), "1");
    }

    #[test]
    fn every_subscriber_sees_each_write_after_it_lands() {
        let core = SimulatedCore::with_demo_devices();
        let mut first = core.subscribe();
        let mut second = core.subscribe();

        core.set_property("Stage", "Position", "12.5").unwrap();

        for rx in [&mut first, &mut second] {
            let change = rx.try_recv().unwrap();
            assert!(change.concerns("Stage", "Position"));
            assert_eq!(change.value, "12.5");
            // The stored value is already current when the event arrives.
            assert_eq!(core.get_property("Stage", "Position").unwrap(), "12.5");
        }
    }

    #[test]
    fn external_updates_bypass_read_only_and_announce() {
        let core = SimulatedCore::with_demo_devices();
        let mut rx = core.subscribe();

        core.apply_external("Camera", "CCDTemperature", "-4.50").unwrap();

        assert_eq!(
            core.get_property("Camera", "CCDTemperature").unwrap(),
            "-4.50"
        );
        assert!(rx.try_recv().unwrap().concerns("Camera", "CCDTemperature"));
    }

    #[test]
    fn tick_drifts_read_only_float_readouts() {
        let core = SimulatedCore::with_demo_devices();
        let mut rx = core.subscribe();
        core.tick();

        let change = rx.try_recv().unwrap();
        assert!(change.concerns("Camera", "CCDTemperature"));
        let value: f64 = change.value.parse().unwrap();
        assert!((-6.0..=-4.0).contains(&value));
    }
}
