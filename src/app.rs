use std::path::PathBuf;
use std::time::Duration;

use egui::{Align2, Area, Frame, Id, Key, Order, RichText};
use log::warn;

use crate::detect::load_detection;
use crate::document::DocumentView;
use crate::export::{self, ExportFormat};
use crate::extract::{DemoExtractor, TableExtractor};
use crate::panel::SelectionPanel;
use crate::results::ResultsView;
use crate::store::RecordStore;
use crate::toolbar::{show_toolbar, DrawingMode};

const NOTICE_SECONDS: f64 = 4.0;

pub struct TableMarkApp {
    store: RecordStore,
    document: Option<DocumentView>,
    mode: DrawingMode,
    panel: SelectionPanel,
    results: ResultsView,
    extractor: Box<dyn TableExtractor>,
    /// Transient messages with their expiry time in `ctx.input` seconds.
    notices: Vec<(String, f64)>,
}

impl TableMarkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            store: RecordStore::new(),
            document: None,
            mode: DrawingMode::default(),
            panel: SelectionPanel::new(),
            results: ResultsView::new(),
            extractor: Box::new(DemoExtractor),
            notices: Vec::new(),
        }
    }

    fn push_notice(&mut self, ctx: &egui::Context, message: String) {
        let deadline = ctx.input(|input| input.time) + NOTICE_SECONDS;
        self.notices.push((message, deadline));
    }

    fn open_document(&mut self, ctx: &egui::Context) {
        let Some(mut paths) = rfd::FileDialog::new()
            .add_filter("Page images", &["png", "jpg", "jpeg"])
            .pick_files()
        else {
            return;
        };
        paths.sort();
        let name = document_name(&paths);
        match DocumentView::load(&name, &paths) {
            Ok(document) => {
                self.document = Some(document);
                self.store.reset();
                self.mode = DrawingMode::default();
            }
            Err(err) => {
                warn!("failed to open document: {err:#}");
                self.push_notice(ctx, format!("Failed to open document: {err:#}"));
            }
        }
    }

    fn import_detection(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Detection result", &["json"])
            .pick_file()
        else {
            return;
        };
        match load_detection(&path) {
            Ok(response) => {
                self.store.replace_all(&response.into_detection_map());
            }
            Err(err) => {
                warn!("failed to import detection: {err:#}");
                self.push_notice(ctx, format!("Failed to import detection: {err:#}"));
            }
        }
    }

    fn export_tables(&mut self, ctx: &egui::Context, format: ExportFormat) {
        let message = {
            let records: Vec<_> = self
                .store
                .extracted_ids()
                .into_iter()
                .filter_map(|id| self.store.record(id))
                .collect();
            if records.is_empty() {
                Some("Nothing to export yet".to_owned())
            } else {
                match format {
                    ExportFormat::Csv => rfd::FileDialog::new().pick_folder().map(|dir| {
                        match export::export_csv(&records, &dir) {
                            Ok(written) => format!("Exported {} CSV files", written.len()),
                            Err(err) => format!("Export failed: {err:#}"),
                        }
                    }),
                    ExportFormat::Json => {
                        let base = self
                            .document
                            .as_ref()
                            .map(|document| export::default_base_name(document.name()))
                            .unwrap_or_else(|| export::default_base_name("tables"));
                        rfd::FileDialog::new()
                            .set_file_name(format!("{base}.json"))
                            .add_filter("JSON", &["json"])
                            .save_file()
                            .map(|path| match export::export_json(&records, &path) {
                                Ok(()) => format!("Exported tables to {}", path.display()),
                                Err(err) => format!("Export failed: {err:#}"),
                            })
                    }
                }
            }
        };
        if let Some(message) = message {
            self.push_notice(ctx, message);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Text fields get the keys first.
        if ctx.wants_keyboard_input() {
            return;
        }
        let (delete, escape) = ctx.input(|input| {
            (
                input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace),
                input.key_pressed(Key::Escape),
            )
        });
        if delete {
            if let Some(id) = self.store.selected() {
                self.store.delete_record(id);
            }
        }
        if escape {
            self.mode.enabled = false;
        }
    }

    fn show_notices(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|input| input.time);
        self.notices.retain(|(_, deadline)| *deadline > now);
        if self.notices.is_empty() {
            return;
        }
        Area::new(Id::new("notices"))
            .order(Order::Foreground)
            .anchor(Align2::CENTER_TOP, [0.0, 24.0])
            .show(ctx, |ui| {
                for (message, _) in &self.notices {
                    Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(message.as_str());
                    });
                }
            });
    }
}

fn document_name(paths: &[PathBuf]) -> String {
    paths
        .first()
        .and_then(|path| path.parent())
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_owned()
}

fn empty_document_hint(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.label(
            RichText::new("Open page images to start annotating tables")
                .weak()
                .size(16.0),
        );
    });
}

impl eframe::App for TableMarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        let toolbar_output = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| {
                show_toolbar(
                    ui,
                    &mut self.mode,
                    self.document.as_ref().map(DocumentView::name),
                )
            })
            .inner;
        if toolbar_output.open_document {
            self.open_document(ctx);
        }
        if toolbar_output.import_detection {
            self.import_detection(ctx);
        }

        let results_output = egui::SidePanel::right("results")
            .default_width(360.0)
            .show(ctx, |ui| self.results.show(ui, &mut self.store))
            .inner;
        if let Some(format) = results_output.export {
            self.export_tables(ctx, format);
        }

        let mut pending = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            let Self {
                store,
                document,
                mode,
                panel,
                extractor,
                ..
            } = self;
            match document {
                Some(view) => {
                    view.show(ui, store, mode, panel, extractor.as_ref(), &mut pending)
                }
                None => empty_document_hint(ui),
            }
        });
        for message in pending {
            self.push_notice(ctx, message);
        }

        self.show_notices(ctx);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
