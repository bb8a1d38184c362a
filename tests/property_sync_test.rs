//! End-to-end tests of the property-binding core against the simulated
//! control session: resolver dispatch, initial synchronization, the
//! feedback-loop suppression contract, and teardown behavior.

use std::sync::Arc;

use rust_scope::core::{ControlCore, SharedCore};
use rust_scope::error::ScopeError;
use rust_scope::hardware::{SimulatedCore, SimulatedDeviceKind};
use rust_scope::property::{
    resolve_control_kind, BoundControl, ControlKind, PropertyIdentifier, PropertyValue,
};

fn session() -> (Arc<SimulatedCore>, SharedCore) {
    let sim = Arc::new(SimulatedCore::with_demo_devices());
    let shared: SharedCore = sim.clone();
    (sim, shared)
}

#[test]
fn camera_binning_resolves_to_a_seeded_choice() {
    let (sim, core) = session();
    sim.set_property("Camera", "Binning", "2").unwrap();

    let ident = PropertyIdentifier::new("Camera", "Binning");
    assert_eq!(
        resolve_control_kind(core.as_ref(), &ident).unwrap(),
        ControlKind::Choice
    );

    let control = BoundControl::bind(core, "Camera", "Binning").unwrap();
    // Initial value comes from the session, options verbatim and in order.
    assert_eq!(control.value(), PropertyValue::Text("2".into()));
    assert_eq!(
        core_allowed(&sim, "Camera", "Binning"),
        vec!["1", "2", "4"]
    );
}

#[test]
fn shutter_state_resolves_to_a_toggle() {
    let (sim, core) = session();
    sim.set_property("Shutter", "State", "1").unwrap();

    let control = BoundControl::bind(core, "Shutter", "State").unwrap();
    assert_eq!(control.kind(), ControlKind::Toggle);
    assert_eq!(control.value(), PropertyValue::Integer(1));
}

#[test]
fn out_of_range_initial_value_stretches_the_bound() {
    let (sim, core) = session();
    // The device reports a position beyond its declared [0, 100] limits.
    sim.apply_external("Stage", "Position", "150").unwrap();

    let control = BoundControl::bind(core, "Stage", "Position").unwrap();
    assert_eq!(control.kind(), ControlKind::FloatSlider);
    assert_eq!(control.value(), PropertyValue::Float(150.0));
    let (_, upper) = control.bounds().unwrap();
    assert!(upper >= 150.0);
}

#[test]
fn session_originated_change_updates_without_write_back() {
    let (sim, core) = session();
    let mut control = BoundControl::bind(core.clone(), "Camera", "Exposure").unwrap();
    let mut wire = core.subscribe();

    sim.apply_external("Camera", "Exposure", "250").unwrap();
    control.process_events();

    assert_eq!(control.value(), PropertyValue::Float(250.0));
    // Only the external announcement crossed the wire — the control's
    // update produced no session write of its own.
    assert!(wire.try_recv().unwrap().concerns("Camera", "Exposure"));
    assert!(wire.try_recv().is_err());
    assert_eq!(sim.get_property("Camera", "Exposure").unwrap(), "250");
}

#[test]
fn set_value_normalizes_and_round_trips() {
    let (_sim, core) = session();
    let mut gain = BoundControl::bind(core.clone(), "Camera", "Gain").unwrap();
    gain.set_value("12").unwrap();
    assert_eq!(gain.value(), PropertyValue::Integer(12));

    let mut position = BoundControl::bind(core, "Stage", "Position").unwrap();
    position.set_value("33.25").unwrap();
    assert_eq!(position.value(), PropertyValue::Float(33.25));
    assert_eq!(position.value_text(), "33.25");
}

#[test]
fn numeric_kinds_never_reject_out_of_range_writes() {
    let (_sim, core) = session();
    let mut gain = BoundControl::bind(core.clone(), "Camera", "Gain").unwrap();
    gain.set_value("4000").unwrap();
    assert_eq!(gain.value(), PropertyValue::Integer(4000));
    assert!(gain.bounds().unwrap().1 >= 4000.0);

    let mut position = BoundControl::bind(core, "Stage", "Position").unwrap();
    position.set_value("-12.5").unwrap();
    assert!(position.bounds().unwrap().0 <= -12.5);
}

#[test]
fn choice_rejection_leaves_value_untouched() {
    let (_sim, core) = session();
    let mut control = BoundControl::bind(core, "Camera", "Binning").unwrap();
    let before = control.value();

    let err = control.set_value("16").unwrap_err();
    assert!(matches!(err, ScopeError::InvalidChoice { .. }));
    assert_eq!(control.value(), before);
}

#[test]
fn teardown_is_idempotent_and_late_events_are_no_ops() {
    let (sim, core) = session();
    let mut control = BoundControl::bind(core, "Shutter", "State").unwrap();

    control.detach();
    control.detach();

    sim.apply_external("Shutter", "State", "1").unwrap();
    control.process_events();
    assert_eq!(control.value(), PropertyValue::Integer(0));
}

#[test]
fn notifications_are_multicast_to_same_property_bindings() {
    let (sim, core) = session();
    let mut a = BoundControl::bind(core.clone(), "Stage", "Position").unwrap();
    let mut b = BoundControl::bind(core, "Stage", "Position").unwrap();

    sim.apply_external("Stage", "Position", "61.5").unwrap();
    a.process_events();
    b.process_events();

    assert_eq!(a.value(), PropertyValue::Float(61.5));
    assert_eq!(b.value(), PropertyValue::Float(61.5));
}

#[test]
fn notifications_apply_in_arrival_order() {
    let (sim, core) = session();
    let mut control = BoundControl::bind(core, "Stage", "Position").unwrap();

    for value in ["10", "20", "30"] {
        sim.apply_external("Stage", "Position", value).unwrap();
    }
    control.process_events();

    assert_eq!(control.value(), PropertyValue::Float(30.0));
}

#[test]
fn binding_against_missing_references_fails_before_construction() {
    let (_sim, core) = session();
    assert!(BoundControl::bind(core.clone(), "Condenser", "Aperture")
        .unwrap_err()
        .is_invalid_reference());
    assert!(BoundControl::bind(core, "Camera", "Aperture")
        .unwrap_err()
        .is_invalid_reference());
}

#[test]
fn resolver_covers_every_representation_in_the_demo_roster() {
    let sim = Arc::new(SimulatedCore::with_demo_devices());
    sim.load_device("Misc", SimulatedDeviceKind::Generic);
    let core: SharedCore = sim.clone();

    let expectations = [
        ("Camera", "Binning", ControlKind::Choice),
        ("Camera", "Exposure", ControlKind::FloatSlider),
        ("Camera", "Gain", ControlKind::IntSlider),
        ("Camera", "TransposeMirrorX", ControlKind::Toggle),
        ("Camera", "CameraID", ControlKind::ReadOnly),
        ("Shutter", "State", ControlKind::Toggle),
        ("Stage", "StepCount", ControlKind::IntSlider),
        ("Misc", "Label", ControlKind::Text),
        ("Misc", "Description", ControlKind::ReadOnly),
    ];
    for (device, property, expected) in expectations {
        let ident = PropertyIdentifier::new(device, property);
        assert_eq!(
            resolve_control_kind(core.as_ref(), &ident).unwrap(),
            expected,
            "{device}/{property}"
        );
    }
}

fn core_allowed(core: &SimulatedCore, device: &str, property: &str) -> Vec<String> {
    core.allowed_property_values(device, property).unwrap()
}
