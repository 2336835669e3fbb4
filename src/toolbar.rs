use egui::{Align, Button, Layout, RichText, Ui};

/// Drawing-mode flags owned by the toolbar and read by every page surface.
/// `locked` keeps drawing enabled after a rectangle is created; otherwise a
/// successful creation disables drawing again (single-shot).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawingMode {
    pub enabled: bool,
    pub locked: bool,
}

#[derive(Debug, Default)]
pub struct ToolbarOutput {
    pub open_document: bool,
    pub import_detection: bool,
}

pub fn show_toolbar(
    ui: &mut Ui,
    mode: &mut DrawingMode,
    document_name: Option<&str>,
) -> ToolbarOutput {
    let mut output = ToolbarOutput::default();
    let has_document = document_name.is_some();

    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
        if ui.button("Open pages…").clicked() {
            output.open_document = true;
        }
        if ui
            .add_enabled(has_document, Button::new("Import detection…"))
            .on_hover_text("Load a table detection result (JSON)")
            .clicked()
        {
            output.import_detection = true;
        }

        ui.separator();

        let label = if mode.enabled {
            "Disable drawing"
        } else {
            "Enable drawing"
        };
        if ui.add_enabled(has_document, Button::new(label)).clicked() {
            mode.enabled = !mode.enabled;
        }
        ui.add_enabled_ui(has_document, |ui| {
            ui.checkbox(&mut mode.locked, "Keep drawing")
                .on_hover_text("Stay in drawing mode after each rectangle");
        });

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if let Some(name) = document_name {
                ui.label(RichText::new(name).weak());
            }
        });
    });

    output
}
