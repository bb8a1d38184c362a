//! egui rendering for bound controls.
//!
//! Each control kind maps onto one stock egui editor. The widget layer owns
//! no state of its own: it renders the binding's visual state and, when the
//! editor reports a user edit, hands the write-back to the binding (which
//! suspends that path while session-originated values are being applied).

use eframe::egui::{self, Ui};

use super::binding::ControlState;
use super::BoundControl;

impl BoundControl {
    /// Render this control into `ui` and wire user edits back to the
    /// session. Returns the editor's response for callers that want to
    /// attach tooltips or context menus.
    pub fn ui(&mut self, ui: &mut Ui) -> egui::Response {
        let salt = self.ident().to_string();

        let response = match &mut self.state {
            ControlState::ReadOnly { text } => ui.label(text.as_str()),
            ControlState::Toggle { on } => ui.add(egui::Checkbox::without_text(on)),
            ControlState::Choice { options, selected } => {
                let mut changed = false;
                let combo = egui::ComboBox::from_id_salt(salt)
                    .selected_text(selected.clone())
                    .show_ui(ui, |ui| {
                        for option in options.iter() {
                            changed |= ui
                                .selectable_value(selected, option.clone(), option.clone())
                                .changed();
                        }
                    });
                let mut response = combo.response;
                if changed {
                    response.mark_changed();
                }
                response
            }
            ControlState::IntSlider { value, min, max } => {
                ui.add(egui::Slider::new(value, *min..=*max))
            }
            ControlState::FloatSlider { value, min, max } => {
                ui.add(egui::Slider::new(value, *min..=*max))
            }
            ControlState::Text { text } => ui.add(egui::TextEdit::singleline(text)),
        };

        if response.changed() {
            self.push_user_edit();
        }
        response
    }
}
