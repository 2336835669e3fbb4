use egui::{Grid, RichText, ScrollArea, TextEdit, Ui};

use crate::export::ExportFormat;
use crate::record::RecordId;
use crate::store::RecordStore;

#[derive(Debug, Default)]
pub struct ResultsOutput {
    pub export: Option<ExportFormat>,
}

/// Tabbed view over the extracted tables, with an editable cell grid and the
/// export controls.
pub struct ResultsView {
    active_tab: Option<RecordId>,
    export_format: ExportFormat,
}

impl ResultsView {
    pub fn new() -> Self {
        Self {
            active_tab: None,
            export_format: ExportFormat::default(),
        }
    }

    /// Keeps the active tab pointing at a live extracted table. A selected
    /// record that has a payload takes the tab; when the current tab's table
    /// disappears the view falls back to the last extracted one.
    pub fn sync_active_tab(&mut self, store: &RecordStore) {
        let extracted = store.extracted_ids();
        if extracted.is_empty() {
            self.active_tab = None;
            return;
        }
        if let Some(selected) = store.selected() {
            if extracted.contains(&selected) {
                self.active_tab = Some(selected);
                return;
            }
        }
        match self.active_tab {
            Some(tab) if extracted.contains(&tab) => {}
            Some(_) => self.active_tab = extracted.last().copied(),
            None => {}
        }
    }

    pub fn show(&mut self, ui: &mut Ui, store: &mut RecordStore) -> ResultsOutput {
        let mut output = ResultsOutput::default();
        self.sync_active_tab(store);
        let extracted = store.extracted_ids();

        if extracted.is_empty() {
            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("No extracted tables yet").weak());
            });
            return output;
        }

        ui.horizontal_wrapped(|ui| {
            for id in &extracted {
                let Some(record) = store.record(*id) else {
                    continue;
                };
                let active = self.active_tab == Some(*id);
                if ui.selectable_label(active, &record.title).clicked() {
                    self.active_tab = Some(*id);
                    // Clicking a tab also focuses the rectangle on its page.
                    store.set_selected(Some(*id));
                }
            }
        });
        ui.separator();

        if let Some(id) = self.active_tab {
            self.show_grid(ui, store, id);
        }

        ui.separator();
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_source("export_format")
                .selected_text(self.export_format.label())
                .show_ui(ui, |ui| {
                    for format in ExportFormat::ALL {
                        ui.selectable_value(&mut self.export_format, format, format.label());
                    }
                });
            if ui.button("Export…").clicked() {
                output.export = Some(self.export_format);
            }
        });

        output
    }

    fn show_grid(&self, ui: &mut Ui, store: &mut RecordStore, id: RecordId) {
        let Some(table) = store.record(id).and_then(|record| record.extracted_data.clone()) else {
            return;
        };
        let mut edited = table.clone();
        let mut changed = false;

        ScrollArea::both()
            .id_source(("results_grid", id))
            .max_height(ui.available_height() - 40.0)
            .show(ui, |ui| {
                Grid::new(("cells", id)).striped(true).show(ui, |ui| {
                    for row in edited.iter_mut() {
                        for cell in row.iter_mut() {
                            if ui
                                .add(TextEdit::singleline(cell).desired_width(90.0))
                                .changed()
                            {
                                changed = true;
                            }
                        }
                        ui.end_row();
                    }
                });
            });

        if changed {
            store.update_extracted_data(id, Some(edited));
        }
    }
}
