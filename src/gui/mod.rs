//! The eframe/egui implementation of the main window.
//!
//! Layout: a top bar for opening device tabs, a dockable central area with
//! one [`DeviceTab`] per open device, and a collapsible log panel along the
//! bottom. Each frame advances the simulated hardware, pumps pending
//! property-change notifications into every open tab, and then paints.

mod device_tab;
mod log_panel;

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;
use egui_dock::{DockArea, DockState, Style, TabViewer};

use crate::config::AppConfig;
use crate::core::{ControlCore, SharedCore};
use crate::hardware::SimulatedCore;
use crate::log_capture::CapturedLog;

pub use device_tab::DeviceTab;
pub use log_panel::LogPanel;

/// How often the simulated hardware advances.
const TICK_INTERVAL: Duration = Duration::from_millis(750);

/// The main application window.
pub struct ScopeGui {
    sim: Arc<SimulatedCore>,
    core: SharedCore,
    title: String,
    log_buffer: CapturedLog,
    log_panel: LogPanel,
    show_log_panel: bool,
    dock_state: DockState<DeviceTab>,
    selected_device: String,
    last_tick: Instant,
}

impl ScopeGui {
    /// Build the window state. The first enabled device opens as a tab so
    /// the window never starts empty.
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        sim: Arc<SimulatedCore>,
        config: &AppConfig,
        log_buffer: CapturedLog,
    ) -> Self {
        let core: SharedCore = sim.clone();
        let devices = core.loaded_devices();
        let selected_device = devices.first().cloned().unwrap_or_default();

        let initial_tabs = devices
            .first()
            .map(|label| vec![DeviceTab::open(core.clone(), label)])
            .unwrap_or_default();

        Self {
            sim,
            core,
            title: config.application.name.clone(),
            log_buffer,
            log_panel: LogPanel::default(),
            show_log_panel: config.gui.show_log_panel,
            dock_state: DockState::new(initial_tabs),
            selected_device,
            last_tick: Instant::now(),
        }
    }

    /// Open a tab for the selected device unless one is already open.
    fn open_selected_device(&mut self) {
        if self.selected_device.is_empty() {
            return;
        }
        let already_open = self
            .dock_state
            .iter_all_tabs()
            .any(|(_, tab)| tab.label == self.selected_device);
        if already_open {
            log::debug!("Device '{}' is already open", self.selected_device);
            return;
        }
        let tab = DeviceTab::open(self.core.clone(), &self.selected_device);
        self.dock_state.push_to_focused_leaf(tab);
    }

    /// Advance the simulation and drain notifications into every tab.
    fn pump(&mut self) {
        if self.last_tick.elapsed() >= TICK_INTERVAL {
            self.sim.tick();
            self.last_tick = Instant::now();
        }
        for (_, tab) in self.dock_state.iter_all_tabs_mut() {
            tab.process_events();
        }
    }
}

impl eframe::App for ScopeGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pump();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&self.title);
                ui.separator();

                egui::ComboBox::from_label("Device")
                    .selected_text(self.selected_device.clone())
                    .show_ui(ui, |ui| {
                        for device in self.core.loaded_devices() {
                            ui.selectable_value(
                                &mut self.selected_device,
                                device.clone(),
                                device.clone(),
                            );
                        }
                    });
                if ui.button("Open").clicked() {
                    self.open_selected_device();
                }

                ui.separator();
                let log_label = if self.show_log_panel {
                    "Hide Log"
                } else {
                    "Show Log"
                };
                if ui.button(log_label).clicked() {
                    self.show_log_panel = !self.show_log_panel;
                }
            });
        });

        if self.show_log_panel {
            egui::TopBottomPanel::bottom("log_panel")
                .resizable(true)
                .min_height(120.0)
                .show(ctx, |ui| {
                    self.log_panel.ui(ui, &self.log_buffer);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.dock_state.iter_all_tabs().next().is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label("Open a device from the toolbar to browse its properties.");
                });
                return;
            }
            DockArea::new(&mut self.dock_state)
                .style(Style::from_egui(ctx.style().as_ref()))
                .show_inside(ui, &mut DeviceTabViewer);
        });

        // Keep the window live so session-originated changes appear
        // without user input.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

/// Docking glue for device tabs.
struct DeviceTabViewer;

impl TabViewer for DeviceTabViewer {
    type Tab = DeviceTab;

    fn title(&mut self, tab: &mut DeviceTab) -> egui::WidgetText {
        tab.label.clone().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut DeviceTab) {
        tab.ui(ui);
    }

    fn on_close(&mut self, tab: &mut DeviceTab) -> bool {
        tab.detach_all();
        true
    }
}
