//! CLI entry point for rust_scope.
//!
//! Two frontends over the same library:
//! - `gui` (the default): the native control window;
//! - `props`: a headless dump of every loaded device's property table,
//!   including the control representation each property resolves to.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use eframe::egui;

use rust_scope::config::AppConfig;
use rust_scope::core::ControlCore;
use rust_scope::gui::ScopeGui;
use rust_scope::hardware::SimulatedCore;
use rust_scope::log_capture::CapturedLog;
use rust_scope::logging;
use rust_scope::property::{ControlKind, PropertyIdentifier, PropertyMetadata};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "rust_scope")]
#[command(about = "Microscope control GUI over a simulated device session", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config location).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the control window (the default).
    Gui,

    /// Print the property table of every loaded device and exit.
    Props {
        /// Emit the table as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::load().context("loading configuration")?,
    };

    match cli.command.unwrap_or(Commands::Gui) {
        Commands::Gui => run_gui(config),
        Commands::Props { json } => run_props(&config, json),
    }
}

fn build_core(config: &AppConfig) -> Arc<SimulatedCore> {
    let core = Arc::new(SimulatedCore::empty());
    for device in config.enabled_devices() {
        core.load_device(&device.label, device.kind);
    }
    core
}

fn run_gui(config: AppConfig) -> anyhow::Result<()> {
    let log_buffer = CapturedLog::new();
    logging::init_gui(&config.application.log_level, &log_buffer)?;
    log::info!("Starting {}", config.application.name);

    let core = build_core(&config);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.gui.window_width, config.gui.window_height])
            .with_title(config.application.name.clone()),
        ..Default::default()
    };

    let title = config.application.name.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(ScopeGui::new(cc, core, &config, log_buffer)))),
    )
    .map_err(|err| anyhow::anyhow!("GUI terminated with an error: {err}"))
}

/// One row of the headless property report.
#[derive(serde::Serialize)]
struct PropertyReport {
    device: String,
    property: String,
    value: String,
    control: ControlKind,
    read_only: bool,
    allowed_values: Vec<String>,
    limits: Option<(f64, f64)>,
}

fn run_props(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    logging::init_headless(&config.application.log_level);
    let core = build_core(config);
    tracing::info!(devices = core.loaded_devices().len(), "Session ready");

    let mut report = Vec::new();
    for device in core.loaded_devices() {
        for property in core.device_property_names(&device)? {
            let ident = PropertyIdentifier::new(&device, &property);
            let meta = PropertyMetadata::query(core.as_ref(), &ident)?;
            let control = ControlKind::resolve(&meta);
            report.push(PropertyReport {
                value: core.get_property(&device, &property)?,
                device: device.clone(),
                property,
                control,
                read_only: meta.read_only,
                allowed_values: meta.allowed_values,
                limits: meta.limits,
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for row in &report {
        let constraints = if !row.allowed_values.is_empty() {
            format!("one of {:?}", row.allowed_values)
        } else if let Some((lower, upper)) = row.limits {
            format!("[{lower}, {upper}]")
        } else {
            "unconstrained".to_string()
        };
        println!(
            "{}/{} = {:?} ({:?}{}) {}",
            row.device,
            row.property,
            row.value,
            row.control,
            if row.read_only { ", read-only" } else { "" },
            constraints,
        );
    }
    Ok(())
}
