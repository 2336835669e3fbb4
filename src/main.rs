#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod detect;
mod document;
mod export;
mod extract;
mod normalize;
mod panel;
mod record;
mod registry;
mod results;
mod store;
mod surface;
mod toolbar;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn main() -> eframe::Result<()> {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TableMark")
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "TableMark",
        options,
        Box::new(|cc| Box::new(app::TableMarkApp::new(cc))),
    )
}
