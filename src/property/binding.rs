//! Live two-way binding between one GUI control and one device property.
//!
//! A [`BoundControl`] is created through the resolver dispatch in the parent
//! module and then keeps itself consistent with the session for the rest of
//! its life: it pulls the initial value at construction, drains its own
//! change-notification subscription once per frame, and pushes user edits
//! back through the session handle.
//!
//! The one invariant everything here protects: a value that *came from* the
//! session (initial load, change notification, refresh) must never be
//! echoed back to the session. Every such apply runs with the write-back
//! channel suspended, so the session sees user-originated writes only.

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::core::{ControlCore, PropertyChange, SharedCore};
use crate::error::{AppResult, ScopeError};

use super::{ControlKind, PropertyIdentifier, PropertyMetadata};

/// Typed read-out of a control's visual state.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Integer store (toggles report their state as 0/1 here).
    Integer(i64),
    /// Float store.
    Float(f64),
    /// Text store (read-only displays, choices, and free text).
    Text(String),
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Per-kind visual state.
///
/// Numeric kinds own their current bounds so the stretch-to-contain policy
/// has somewhere to live; the choice kind owns its allowed list verbatim.
#[derive(Debug, Clone)]
pub(super) enum ControlState {
    ReadOnly {
        text: String,
    },
    Toggle {
        on: bool,
    },
    Choice {
        options: Vec<String>,
        selected: String,
    },
    IntSlider {
        value: i64,
        min: i64,
        max: i64,
    },
    FloatSlider {
        value: f64,
        min: f64,
        max: f64,
    },
    Text {
        text: String,
    },
}

/// Fallback span for numeric kinds whose property declares no limits;
/// stretch-to-contain widens it as soon as a value lands outside.
const DEFAULT_SPAN: (f64, f64) = (0.0, 100.0);

impl ControlState {
    /// Build the initial state for a kind, applying declared limits before
    /// any value is pushed in (bounded kinds must know their range by the
    /// time the first value arrives).
    fn initial(kind: ControlKind, meta: &PropertyMetadata) -> Self {
        match kind {
            ControlKind::ReadOnly => ControlState::ReadOnly {
                text: String::new(),
            },
            ControlKind::Toggle => ControlState::Toggle { on: false },
            ControlKind::Choice => ControlState::Choice {
                options: meta.allowed_values.clone(),
                selected: String::new(),
            },
            ControlKind::IntSlider => {
                let (lower, upper) = meta.limits.unwrap_or(DEFAULT_SPAN);
                ControlState::IntSlider {
                    value: lower as i64,
                    min: lower as i64,
                    max: upper as i64,
                }
            }
            ControlKind::FloatSlider => {
                let (lower, upper) = meta.limits.unwrap_or(DEFAULT_SPAN);
                ControlState::FloatSlider {
                    value: lower,
                    min: lower,
                    max: upper,
                }
            }
            ControlKind::Text => ControlState::Text {
                text: String::new(),
            },
        }
    }
}

/// A GUI control bound to exactly one device property.
pub struct BoundControl {
    ident: PropertyIdentifier,
    core: SharedCore,
    kind: ControlKind,
    pub(super) state: ControlState,
    changes: Option<broadcast::Receiver<PropertyChange>>,
    applying_remote: bool,
}

impl BoundControl {
    /// Bind a control to `device`/`property` on the given session.
    ///
    /// Runs the full construction protocol, in order: validate that the
    /// pair exists (no partial construction on failure), capture metadata,
    /// resolve the control kind and apply declared limits, pull the current
    /// value with the write-back channel suspended, then subscribe to the
    /// change stream.
    pub fn bind(core: SharedCore, device: &str, property: &str) -> AppResult<Self> {
        let ident = PropertyIdentifier::new(device, property);
        let meta = PropertyMetadata::query(core.as_ref(), &ident)?;
        let kind = ControlKind::resolve(&meta);
        let state = ControlState::initial(kind, &meta);

        let mut control = Self {
            ident,
            core,
            kind,
            state,
            changes: None,
            applying_remote: false,
        };

        let current = control
            .core
            .get_property(&control.ident.device, &control.ident.property)?;
        control.apply_remote(&current)?;

        control.changes = Some(control.core.subscribe());
        log::debug!("Bound {} as {:?}", control.ident, control.kind);
        Ok(control)
    }

    /// The identifier this control is bound to.
    pub fn ident(&self) -> &PropertyIdentifier {
        &self.ident
    }

    /// The resolved control representation.
    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Current typed value of the control's visual state. Pure read, no
    /// session traffic.
    pub fn value(&self) -> PropertyValue {
        match &self.state {
            ControlState::ReadOnly { text } => PropertyValue::Text(text.clone()),
            ControlState::Toggle { on } => PropertyValue::Integer(i64::from(*on)),
            ControlState::Choice { selected, .. } => PropertyValue::Text(selected.clone()),
            ControlState::IntSlider { value, .. } => PropertyValue::Integer(*value),
            ControlState::FloatSlider { value, .. } => PropertyValue::Float(*value),
            ControlState::Text { text } => PropertyValue::Text(text.clone()),
        }
    }

    /// Current value in the session's string encoding.
    pub fn value_text(&self) -> String {
        self.value().to_string()
    }

    /// Current numeric bounds, for the bounded kinds.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match &self.state {
            ControlState::IntSlider { min, max, .. } => Some((*min as f64, *max as f64)),
            ControlState::FloatSlider { min, max, .. } => Some((*min, *max)),
            _ => None,
        }
    }

    /// Normalize `raw` for this control's kind and update the visual state.
    ///
    /// Enumerated kinds reject values outside their allowed set and leave
    /// the state untouched; numeric kinds widen their own bound to contain
    /// an out-of-range value instead of rejecting it. Never writes to the
    /// session — only user-originated edits do that.
    pub fn set_value(&mut self, raw: &str) -> AppResult<()> {
        match &mut self.state {
            ControlState::ReadOnly { text } => {
                *text = raw.to_string();
            }
            ControlState::Toggle { on } => {
                let v: i64 = raw.parse().map_err(|_| ScopeError::InvalidNumber {
                    value: raw.to_string(),
                    wanted: "a 0/1 state",
                })?;
                *on = v != 0;
            }
            ControlState::Choice { options, selected } => {
                if !options.iter().any(|o| o == raw) {
                    return Err(ScopeError::InvalidChoice {
                        value: raw.to_string(),
                        allowed: options.clone(),
                    });
                }
                *selected = raw.to_string();
            }
            ControlState::IntSlider { value, min, max } => {
                let v: i64 = raw.parse().map_err(|_| ScopeError::InvalidNumber {
                    value: raw.to_string(),
                    wanted: "an integer",
                })?;
                *min = (*min).min(v);
                *max = (*max).max(v);
                *value = v;
            }
            ControlState::FloatSlider { value, min, max } => {
                let v: f64 = raw.parse().map_err(|_| ScopeError::InvalidNumber {
                    value: raw.to_string(),
                    wanted: "a float",
                })?;
                *min = (*min).min(v);
                *max = (*max).max(v);
                *value = v;
            }
            ControlState::Text { text } => {
                *text = raw.to_string();
            }
        }
        Ok(())
    }

    /// Authoritative read-only flag, queried live from the session.
    pub fn is_read_only(&self) -> AppResult<bool> {
        self.core
            .is_property_read_only(&self.ident.device, &self.ident.property)
    }

    /// Re-pull the live value and apply it with write-back suspended.
    ///
    /// If all goes well this is never needed, but it resynchronizes a
    /// control whose change notification was missed.
    pub fn refresh(&mut self) -> AppResult<()> {
        let current = self
            .core
            .get_property(&self.ident.device, &self.ident.property)?;
        self.apply_remote(&current)
    }

    /// Drain this control's change subscription, applying every
    /// notification for the bound identifier in arrival order.
    ///
    /// A detached control treats this as a no-op, so a notification racing
    /// teardown can never fault. If the channel reports missed messages the
    /// control logs it and falls back to [`BoundControl::refresh`].
    pub fn process_events(&mut self) {
        let Some(mut rx) = self.changes.take() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(change) => {
                    if !change.concerns(&self.ident.device, &self.ident.property) {
                        continue;
                    }
                    if let Err(err) = self.apply_remote(&change.value) {
                        log::warn!("Ignoring unusable update for {}: {err}", self.ident);
                    }
                }
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!(
                        "{} missed {missed} change notifications, refreshing",
                        self.ident
                    );
                    if let Err(err) = self.refresh() {
                        log::warn!("Refresh of {} failed: {err}", self.ident);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        self.changes = Some(rx);
    }

    /// Unsubscribe from the change stream. Idempotent; also run on drop.
    pub fn detach(&mut self) {
        if self.changes.take().is_some() {
            log::debug!("Detached {}", self.ident);
        }
    }

    /// Whether the control still holds its change subscription.
    pub fn is_attached(&self) -> bool {
        self.changes.is_some()
    }

    /// Apply a session-originated value with the write-back channel
    /// suspended for the duration of this one update.
    fn apply_remote(&mut self, raw: &str) -> AppResult<()> {
        self.applying_remote = true;
        let result = self.set_value(raw);
        self.applying_remote = false;
        result
    }

    /// Push the control's current value to the session after a user edit.
    ///
    /// Called from the widget layer when the rendered editor reports a
    /// change. Suspended while a session-originated value is being applied.
    pub(super) fn push_user_edit(&mut self) {
        if self.applying_remote {
            return;
        }
        let value = self.value_text();
        if let Err(err) =
            self.core
                .set_property(&self.ident.device, &self.ident.property, &value)
        {
            log::error!("Failed to write {value:?} to {}: {err}", self.ident);
        }
    }
}

impl Drop for BoundControl {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for BoundControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundControl")
            .field("ident", &self.ident)
            .field("kind", &self.kind)
            .field("value", &self.value_text())
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::hardware::SimulatedCore;

    fn demo() -> (Arc<SimulatedCore>, SharedCore) {
        let sim = Arc::new(SimulatedCore::with_demo_devices());
        let shared: SharedCore = sim.clone();
        (sim, shared)
    }

    #[test]
    fn binding_pulls_the_current_value_and_kind() {
        let (_sim, core) = demo();
        let control = BoundControl::bind(core, "Camera", "Binning").unwrap();
        assert_eq!(control.kind(), ControlKind::Choice);
        assert_eq!(control.value(), PropertyValue::Text("1".into()));
        assert!(control.is_attached());
    }

    #[test]
    fn binding_an_unknown_pair_fails_fast() {
        let (_sim, core) = demo();
        let err = BoundControl::bind(core.clone(), "Laser", "Power").unwrap_err();
        assert!(err.is_invalid_reference());
        let err = BoundControl::bind(core, "Camera", "Power").unwrap_err();
        assert!(err.is_invalid_reference());
    }

    #[test]
    fn declared_limits_arrive_before_the_first_value() {
        let (_sim, core) = demo();
        let control = BoundControl::bind(core, "Camera", "Exposure").unwrap();
        assert_eq!(control.kind(), ControlKind::FloatSlider);
        assert_eq!(control.bounds(), Some((0.1, 10000.0)));
        assert_eq!(control.value(), PropertyValue::Float(10.0));
    }

    #[test]
    fn set_value_round_trips_through_normalization() {
        let (_sim, core) = demo();
        let mut control = BoundControl::bind(core, "Camera", "Gain").unwrap();
        control.set_value("7").unwrap();
        assert_eq!(control.value(), PropertyValue::Integer(7));
        assert_eq!(control.value_text(), "7");
    }

    #[test]
    fn set_value_does_not_write_to_the_session() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core, "Camera", "Gain").unwrap();
        control.set_value("9").unwrap();
        // The session still holds the original value; only user-originated
        // edits write back.
        assert_eq!(sim.get_property("Camera", "Gain").unwrap(), "1");
    }

    #[test]
    fn numeric_bounds_stretch_to_contain() {
        let (_sim, core) = demo();
        let mut control = BoundControl::bind(core, "Stage", "Position").unwrap();
        assert_eq!(control.bounds(), Some((0.0, 100.0)));

        control.set_value("150").unwrap();
        assert_eq!(control.value(), PropertyValue::Float(150.0));
        let (_, upper) = control.bounds().unwrap();
        assert!(upper >= 150.0);

        control.set_value("-3.5").unwrap();
        let (lower, _) = control.bounds().unwrap();
        assert!(lower <= -3.5);
    }

    #[test]
    fn choice_rejects_and_leaves_state_unchanged() {
        let (_sim, core) = demo();
        let mut control = BoundControl::bind(core, "Camera", "Binning").unwrap();
        let err = control.set_value("8").unwrap_err();
        assert!(matches!(err, ScopeError::InvalidChoice { .. }));
        assert_eq!(control.value(), PropertyValue::Text("1".into()));
    }

    #[test]
    fn toggle_stores_its_state_as_zero_or_one() {
        let (_sim, core) = demo();
        let mut control = BoundControl::bind(core, "Shutter", "State").unwrap();
        assert_eq!(control.kind(), ControlKind::Toggle);
        assert_eq!(control.value(), PropertyValue::Integer(0));

        control.set_value("1").unwrap();
        assert_eq!(control.value(), PropertyValue::Integer(1));
        assert!(control.set_value("open").is_err());
    }

    #[test]
    fn session_updates_flow_in_without_writing_back() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core.clone(), "Stage", "Position").unwrap();
        let mut observer = core.subscribe();

        sim.apply_external("Stage", "Position", "42.5").unwrap();
        control.process_events();
        assert_eq!(control.value(), PropertyValue::Float(42.5));

        // Exactly the one external announcement went over the wire; the
        // control did not echo the update back as a write.
        assert!(observer.try_recv().unwrap().concerns("Stage", "Position"));
        assert!(observer.try_recv().is_err());
    }

    #[test]
    fn updates_for_other_properties_are_ignored() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core, "Stage", "Position").unwrap();
        sim.apply_external("Stage", "Velocity", "9.0").unwrap();
        control.process_events();
        assert_eq!(control.value(), PropertyValue::Float(0.0));
    }

    #[test]
    fn refresh_resynchronizes_a_stale_control() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core, "Camera", "Binning").unwrap();

        // Mutate behind the control's back, then drop the pending
        // notification to simulate a missed event.
        sim.set_property("Camera", "Binning", "4").unwrap();
        control.changes = Some(control.core.subscribe());

        assert_eq!(control.value(), PropertyValue::Text("1".into()));
        control.refresh().unwrap();
        assert_eq!(control.value(), PropertyValue::Text("4".into()));
    }

    #[test]
    fn detach_is_idempotent_and_silences_late_notifications() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core, "Stage", "Position").unwrap();

        control.detach();
        control.detach();
        assert!(!control.is_attached());

        sim.apply_external("Stage", "Position", "77.0").unwrap();
        control.process_events();
        assert_eq!(control.value(), PropertyValue::Float(0.0));
    }

    #[test]
    fn two_controls_on_one_property_both_observe_a_change() {
        let (sim, core) = demo();
        let mut first = BoundControl::bind(core.clone(), "Shutter", "State").unwrap();
        let mut second = BoundControl::bind(core, "Shutter", "State").unwrap();

        sim.apply_external("Shutter", "State", "1").unwrap();
        first.process_events();
        second.process_events();

        assert_eq!(first.value(), PropertyValue::Integer(1));
        assert_eq!(second.value(), PropertyValue::Integer(1));
    }

    #[test]
    fn read_only_controls_accept_any_session_value() {
        let (sim, core) = demo();
        let mut control = BoundControl::bind(core, "Camera", "CameraID").unwrap();
        assert_eq!(control.kind(), ControlKind::ReadOnly);
        assert!(control.is_read_only().unwrap());

        sim.apply_external("Camera", "CameraID", "SimCam-0099").unwrap();
        control.process_events();
        assert_eq!(control.value(), PropertyValue::Text("SimCam-0099".into()));
    }
}
