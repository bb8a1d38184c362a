//! One dock tab per open device, listing every property as a bound control.

use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::core::{ControlCore, SharedCore};
use crate::property::BoundControl;

/// A property row: display name plus its live binding.
struct PropertyRow {
    name: String,
    control: BoundControl,
}

/// The contents of one device tab.
pub struct DeviceTab {
    /// Device label, doubling as the tab title.
    pub label: String,
    rows: Vec<PropertyRow>,
}

impl DeviceTab {
    /// Open a tab for `label`, binding a control to every property the
    /// device reports. Properties that fail to bind are skipped with a
    /// logged warning rather than taking the whole tab down.
    pub fn open(core: SharedCore, label: &str) -> Self {
        let mut rows = Vec::new();
        match core.device_property_names(label) {
            Ok(names) => {
                for name in names {
                    match BoundControl::bind(core.clone(), label, &name) {
                        Ok(control) => rows.push(PropertyRow { name, control }),
                        Err(err) => log::warn!("Skipping property {label}/{name}: {err}"),
                    }
                }
            }
            Err(err) => log::error!("Cannot list properties of {label}: {err}"),
        }
        Self {
            label: label.to_string(),
            rows,
        }
    }

    /// Drain pending change notifications into every row.
    pub fn process_events(&mut self) {
        for row in &mut self.rows {
            row.control.process_events();
        }
    }

    /// Re-pull every row's value from the session.
    pub fn refresh(&mut self) {
        for row in &mut self.rows {
            if let Err(err) = row.control.refresh() {
                log::warn!("Refresh of {} failed: {err}", row.control.ident());
            }
        }
    }

    /// Detach every binding; used when the tab is closed so no control
    /// outlives its place in the window.
    pub fn detach_all(&mut self) {
        for row in &mut self.rows {
            row.control.detach();
        }
    }

    /// Render the property table.
    pub fn ui(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(&self.label);
            if ui.button("Refresh").clicked() {
                self.refresh();
            }
        });
        ui.separator();

        if self.rows.is_empty() {
            ui.label("This device exposes no bindable properties.");
            return;
        }

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(140.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Property");
                });
                header.col(|ui| {
                    ui.strong("Value");
                });
            })
            .body(|mut body| {
                for row_data in &mut self.rows {
                    body.row(24.0, |mut row| {
                        row.col(|ui| {
                            ui.label(&row_data.name);
                        });
                        row.col(|ui| {
                            row_data.control.ui(ui);
                        });
                    });
                }
            });
    }
}
