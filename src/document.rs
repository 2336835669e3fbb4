use std::path::PathBuf;

use anyhow::{ensure, Context as _, Result};
use egui::{vec2, ColorImage, Rect, ScrollArea, Sense, TextureHandle, TextureOptions, Ui, Vec2};
use image::DynamicImage;
use log::info;

use crate::extract::TableExtractor;
use crate::panel::SelectionPanel;
use crate::registry::SurfaceRegistry;
use crate::store::RecordStore;
use crate::surface::PageSurface;
use crate::toolbar::DrawingMode;

const PAGE_GAP: f32 = 16.0;
const PANEL_OFFSET: f32 = 10.0;

/// One rendered page. The texture is uploaded lazily on first draw.
struct PageImage {
    dynamic: DynamicImage,
    texture: Option<TextureHandle>,
}

impl PageImage {
    fn size_vec2(&self) -> Vec2 {
        vec2(self.dynamic.width() as f32, self.dynamic.height() as f32)
    }

    fn ensure_texture(&mut self, ui: &Ui, index: usize) -> &TextureHandle {
        self.texture.get_or_insert_with(|| {
            let rgba = self.dynamic.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            ui.ctx()
                .load_texture(format!("page-{index}"), color, TextureOptions::LINEAR)
        })
    }
}

/// The open document: its rendered pages in order, one interactive surface
/// per page and the registry that keeps a single surface active.
pub struct DocumentView {
    name: String,
    pages: Vec<PageImage>,
    surfaces: Vec<PageSurface>,
    registry: SurfaceRegistry,
}

impl DocumentView {
    pub fn load(name: &str, paths: &[PathBuf]) -> Result<Self> {
        ensure!(!paths.is_empty(), "document has no pages");
        let mut pages = Vec::with_capacity(paths.len());
        for path in paths {
            let dynamic = image::open(path)
                .with_context(|| format!("failed to load page {}", path.display()))?;
            pages.push(PageImage {
                dynamic,
                texture: None,
            });
        }
        let mut registry = SurfaceRegistry::new();
        let surfaces = (0..pages.len())
            .map(|index| {
                registry.register(index);
                PageSurface::new(index)
            })
            .collect();
        info!("opened document '{name}' with {} pages", pages.len());
        Ok(Self {
            name: name.to_owned(),
            pages,
            surfaces,
            registry,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        store: &mut RecordStore,
        mode: &mut DrawingMode,
        panel: &mut SelectionPanel,
        extractor: &dyn TableExtractor,
        notices: &mut Vec<String>,
    ) {
        let Self {
            pages,
            surfaces,
            registry,
            ..
        } = self;

        ScrollArea::vertical()
            .id_source("tablemark_pages")
            .show(ui, |ui| {
                for (index, page) in pages.iter_mut().enumerate() {
                    let image_size = page.size_vec2();
                    let scale = (ui.available_width() / image_size.x).min(1.0);
                    let (rect, _) =
                        ui.allocate_exact_size(image_size * scale, Sense::hover());

                    if ui.is_rect_visible(rect) {
                        let texture = page.ensure_texture(ui, index);
                        ui.painter().image(
                            texture.id(),
                            rect,
                            Rect::from_min_max(egui::Pos2::ZERO, egui::pos2(1.0, 1.0)),
                            egui::Color32::WHITE,
                        );
                    }

                    let surface = &mut surfaces[index];
                    let output = surface.show(ui, rect, store, mode, registry);
                    if output.wants_activation {
                        for other in registry.set_active(index) {
                            surfaces[other].clear_visual_selection();
                        }
                    }

                    // Panel for the selected record, next to its rectangle.
                    let selected = store
                        .selected_record()
                        .filter(|record| record.page_index == index)
                        .cloned();
                    if let Some(record) = selected {
                        let abs = record.coordinates.to_page_rect(rect.size());
                        let anchor =
                            rect.min + vec2(abs.max.x + PANEL_OFFSET, abs.min.y);
                        panel.show(ui.ctx(), anchor, &record, store, extractor, notices);
                    }

                    ui.add_space(PAGE_GAP);
                }
            });
    }
}
