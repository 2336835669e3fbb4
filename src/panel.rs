use egui::{Align2, Area, ComboBox, Context, Frame, Id, Order, Pos2, RichText, TextEdit};
use log::{info, warn};

use crate::extract::{request_for_record, ExtractionMethod, TableExtractor, DEFAULT_PROMPT};
use crate::record::TableRecord;
use crate::store::RecordStore;

/// Floating panel anchored next to the selected rectangle: extraction method,
/// prompt controls, extract and delete.
pub struct SelectionPanel {
    method: ExtractionMethod,
    /// Draft text of the prompt dialog while it is open.
    prompt_dialog: Option<String>,
}

impl SelectionPanel {
    pub fn new() -> Self {
        Self {
            method: ExtractionMethod::default(),
            prompt_dialog: None,
        }
    }

    pub fn show(
        &mut self,
        ctx: &Context,
        anchor: Pos2,
        record: &TableRecord,
        store: &mut RecordStore,
        extractor: &dyn TableExtractor,
        notices: &mut Vec<String>,
    ) {
        let id = record.id;
        Area::new(Id::new(("selection_panel", id)))
            .order(Order::Foreground)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(220.0);
                    ui.label(RichText::new(&record.title).strong());
                    ui.add_space(4.0);

                    ComboBox::from_id_source(("extraction_method", id))
                        .selected_text(self.method.label())
                        .show_ui(ui, |ui| {
                            for method in ExtractionMethod::ALL {
                                ui.selectable_value(&mut self.method, method, method.label());
                            }
                        });

                    if self.method == ExtractionMethod::Llm {
                        let mut use_custom = record.use_custom_prompt;
                        if ui.checkbox(&mut use_custom, "Use custom prompt").changed() {
                            if use_custom && record.extraction_prompt.is_none() {
                                notices.push("No custom prompt defined yet".to_owned());
                            }
                            store.set_use_custom_prompt(id, use_custom);
                        }
                        if ui.button("Customize prompt…").clicked() {
                            self.prompt_dialog =
                                Some(record.extraction_prompt.clone().unwrap_or_default());
                        }
                    }

                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        if ui.button("Extract").clicked() {
                            self.run_extraction(record, store, extractor, notices);
                        }
                        if ui.button("Delete").clicked() {
                            store.delete_record(id);
                        }
                    });
                });
            });

        if self.prompt_dialog.is_some() {
            self.show_prompt_dialog(ctx, record, store);
        }
    }

    fn run_extraction(
        &self,
        record: &TableRecord,
        store: &mut RecordStore,
        extractor: &dyn TableExtractor,
        notices: &mut Vec<String>,
    ) {
        let request = request_for_record(record, self.method);
        match extractor.extract(self.method, &request) {
            Ok(table) if !table.is_empty() => {
                info!(
                    "extracted {} rows for '{}' via {}",
                    table.len(),
                    record.title,
                    self.method.label()
                );
                store.update_extracted_data(record.id, Some(table));
            }
            Ok(_) => {
                notices.push("No table found within given coordinates".to_owned());
            }
            Err(err) => {
                // The record's previous payload stays untouched.
                warn!("extraction failed for '{}': {err:#}", record.title);
                notices.push(format!("Extraction failed: {err:#}"));
            }
        }
    }

    fn show_prompt_dialog(&mut self, ctx: &Context, record: &TableRecord, store: &mut RecordStore) {
        let Some(draft) = self.prompt_dialog.as_mut() else {
            return;
        };
        let mut close = false;
        egui::Window::new("Extraction prompt")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.add(
                    TextEdit::multiline(draft)
                        .hint_text(DEFAULT_PROMPT)
                        .desired_rows(4)
                        .desired_width(320.0),
                );
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        let trimmed = draft.trim();
                        let prompt = (!trimmed.is_empty()).then(|| trimmed.to_owned());
                        store.set_extraction_prompt(record.id, prompt);
                        close = true;
                    }
                    if ui.button("Cancel").clicked() {
                        close = true;
                    }
                });
            });
        if close {
            self.prompt_dialog = None;
        }
    }
}
