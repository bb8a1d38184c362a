//! The in-window log panel.

use eframe::egui::{self, Color32, ScrollArea, TextStyle, Ui};
use log::LevelFilter;

use crate::log_capture::CapturedLog;

/// State of the log panel between frames.
pub struct LogPanel {
    filter_text: String,
    level: LevelFilter,
    stick_to_bottom: bool,
}

impl Default for LogPanel {
    fn default() -> Self {
        Self {
            filter_text: String::new(),
            level: LevelFilter::Info,
            stick_to_bottom: true,
        }
    }
}

impl LogPanel {
    /// Render the panel over the given capture buffer.
    pub fn ui(&mut self, ui: &mut Ui, buffer: &CapturedLog) {
        ui.horizontal(|ui| {
            ui.heading("Log");
            ui.separator();
            self.level_combo(ui);
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.filter_text);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear").clicked() {
                    buffer.clear();
                }
                ui.toggle_value(&mut self.stick_to_bottom, "Follow");
            });
        });
        ui.separator();

        let row_height = ui.text_style_height(&TextStyle::Monospace);
        let records = buffer.read();
        let visible: Vec<_> = records
            .iter()
            .filter(|r| {
                r.level <= self.level.to_level().unwrap_or(log::Level::Trace)
                    && (self.filter_text.is_empty()
                        || r.message.contains(&self.filter_text)
                        || r.target.contains(&self.filter_text))
            })
            .collect();

        ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(self.stick_to_bottom)
            .show_rows(ui, row_height, visible.len(), |ui, range| {
                for record in visible[range].iter() {
                    ui.horizontal(|ui| {
                        ui.colored_label(record.color(), format!("[{:<5}]", record.level));
                        ui.label(record.timestamp.format("%H:%M:%S%.3f").to_string());
                        ui.colored_label(Color32::from_gray(150), &record.target);
                        ui.label(&record.message);
                    });
                }
            });
    }

    fn level_combo(&mut self, ui: &mut Ui) {
        egui::ComboBox::from_id_salt("log_level_filter")
            .selected_text(format!("{:?}", self.level))
            .show_ui(ui, |ui| {
                for level in [
                    LevelFilter::Error,
                    LevelFilter::Warn,
                    LevelFilter::Info,
                    LevelFilter::Debug,
                    LevelFilter::Trace,
                ] {
                    ui.selectable_value(&mut self.level, level, format!("{level:?}"));
                }
            });
    }
}
