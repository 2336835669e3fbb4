use egui::{vec2, Color32, Painter, Pos2, Rect, Response, Sense, Stroke, Ui, Vec2};

use crate::record::{BoundingBox, RecordId};
use crate::registry::SurfaceRegistry;
use crate::store::RecordStore;
use crate::toolbar::DrawingMode;

/// Both sides of a drawn rectangle must strictly exceed this many pixels,
/// otherwise the release discards it.
pub const MIN_DRAW_SIZE: f32 = 10.0;

const HIT_TOLERANCE: f32 = 4.0;
const HANDLE_VISUAL: f32 = 9.0;
const HANDLE_HIT: f32 = 12.0;

const BOX_STROKE: Color32 = Color32::from_rgb(0xE5, 0x3E, 0x3E);
const SELECTION_STROKE: Color32 = Color32::from_rgb(77, 141, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragMode {
    Draw,
    Move,
    Resize,
}

#[derive(Clone, Copy, Debug)]
struct DragState {
    mode: DragMode,
    start: Pos2,
    current: Pos2,
    target: Option<RecordId>,
    handle: Option<Handle>,
    original: Option<Rect>,
}

/// Page-surface events, in page-local pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    DrawStart { pos: Pos2 },
    DrawMove { pos: Pos2 },
    DrawEnd,
    SelectionChanged { id: Option<RecordId> },
    GeometryCommitted { id: RecordId, rect: Rect },
}

pub struct SurfaceOutput {
    /// The surface wants to become the registry's active one; the owner must
    /// call `set_active` and clear the surfaces it returns.
    pub wants_activation: bool,
}

/// Interactive overlay for one page. Holds no coordinate truth of its own:
/// every frame it redraws from the record store converted at the page's
/// current rendered size. Only the in-flight drag is local state.
pub struct PageSurface {
    page_index: usize,
    rendered: Vec2,
    visual_selection: Option<RecordId>,
    drag: Option<DragState>,
}

impl PageSurface {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            rendered: Vec2::ZERO,
            visual_selection: None,
            drag: None,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn set_rendered_size(&mut self, size: Vec2) {
        self.rendered = size;
    }

    pub fn visual_selection(&self) -> Option<RecordId> {
        self.visual_selection
    }

    /// Drops the local visual selection only; the store's logical selection
    /// is untouched. Called when another surface becomes active.
    pub fn clear_visual_selection(&mut self) {
        self.visual_selection = None;
    }

    /// Runs the pointer state machine for one event. Returns true when this
    /// surface should become the registry's active one.
    pub fn handle_event(
        &mut self,
        event: SurfaceEvent,
        store: &mut RecordStore,
        mode: &mut DrawingMode,
        registry: &SurfaceRegistry,
    ) -> bool {
        match event {
            SurfaceEvent::DrawStart { pos } => {
                if !mode.enabled {
                    return false;
                }
                self.drag = Some(DragState {
                    mode: DragMode::Draw,
                    start: pos,
                    current: pos,
                    target: None,
                    handle: None,
                    original: None,
                });
                true
            }
            SurfaceEvent::DrawMove { pos } => {
                if let Some(drag) = self.drag.as_mut() {
                    if drag.mode == DragMode::Draw {
                        drag.current = pos;
                    }
                }
                false
            }
            SurfaceEvent::DrawEnd => {
                match self.drag {
                    Some(drag) if drag.mode == DragMode::Draw => {
                        self.drag = None;
                        let size = (drag.current - drag.start).abs();
                        if size.x > MIN_DRAW_SIZE && size.y > MIN_DRAW_SIZE {
                            let rect = Rect::from_two_pos(drag.start, drag.current);
                            let bbox = BoundingBox::from_page_rect(rect, self.rendered);
                            store.add_record(self.page_index, bbox);
                            if !mode.locked {
                                mode.enabled = false;
                            }
                        }
                    }
                    // Pointer-up without a transient rectangle.
                    _ => {}
                }
                false
            }
            SurfaceEvent::SelectionChanged { id: Some(id) } => {
                self.visual_selection = Some(id);
                store.set_selected(Some(id));
                true
            }
            SurfaceEvent::SelectionChanged { id: None } => {
                self.visual_selection = None;
                // A surface that lost focus must not clear a selection that
                // has already moved elsewhere.
                if registry.is_active(self.page_index) {
                    store.set_selected(None);
                }
                false
            }
            SurfaceEvent::GeometryCommitted { id, rect } => {
                store.update_coordinates(id, BoundingBox::from_page_rect(rect, self.rendered));
                false
            }
        }
    }

    /// Pulls the visual selection onto this surface when the store's global
    /// selection points at one of its records and nothing is visually
    /// selected here yet. Returns true when the surface should activate.
    pub fn sync_selection(&mut self, store: &RecordStore) -> bool {
        if self
            .visual_selection
            .is_some_and(|id| store.record(id).is_none())
        {
            self.visual_selection = None;
        }
        let Some(selected) = store.selected() else {
            return false;
        };
        if store.is_record_on_page(selected, self.page_index) && self.visual_selection.is_none() {
            self.visual_selection = Some(selected);
            return true;
        }
        false
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        page_rect: Rect,
        store: &mut RecordStore,
        mode: &mut DrawingMode,
        registry: &SurfaceRegistry,
    ) -> SurfaceOutput {
        self.set_rendered_size(page_rect.size());
        let mut wants_activation = self.sync_selection(store);

        let response = ui.interact(
            page_rect,
            ui.id().with(("page_surface", self.page_index)),
            Sense::click_and_drag(),
        );

        let boxes = self.page_boxes(store);
        for event in self.interact(&response, page_rect, &boxes, mode) {
            if self.handle_event(event, store, mode, registry) {
                wants_activation = true;
            }
        }

        // Redraw from the store so the surface reflects post-event state.
        let boxes = self.page_boxes(store);
        self.draw(&ui.painter_at(page_rect), page_rect, &boxes);

        SurfaceOutput { wants_activation }
    }

    fn page_boxes(&self, store: &RecordStore) -> Vec<(RecordId, Rect)> {
        store
            .records_for_page(self.page_index)
            .iter()
            .map(|record| (record.id, record.coordinates.to_page_rect(self.rendered)))
            .collect()
    }

    /// Translates raw pointer input into surface events, and advances the
    /// local move/resize drag whose only store-visible effect is the final
    /// `GeometryCommitted`.
    fn interact(
        &mut self,
        response: &Response,
        page_rect: Rect,
        boxes: &[(RecordId, Rect)],
        mode: &DrawingMode,
    ) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        let Some(pointer) = response.interact_pointer_pos() else {
            return events;
        };
        let pos = (pointer - page_rect.min).to_pos2();

        if response.drag_started() {
            if mode.enabled {
                events.push(SurfaceEvent::DrawStart { pos });
            } else if let Some((id, handle, original)) = self
                .visual_selection
                .and_then(|id| hit_handle(id, pos, boxes))
            {
                self.drag = Some(DragState {
                    mode: DragMode::Resize,
                    start: pos,
                    current: pos,
                    target: Some(id),
                    handle: Some(handle),
                    original: Some(original),
                });
            } else if let Some((id, rect)) = hit_box(pos, boxes) {
                self.drag = Some(DragState {
                    mode: DragMode::Move,
                    start: pos,
                    current: pos,
                    target: Some(id),
                    handle: None,
                    original: Some(rect),
                });
                events.push(SurfaceEvent::SelectionChanged { id: Some(id) });
            } else {
                events.push(SurfaceEvent::SelectionChanged { id: None });
            }
        }

        if response.dragged() {
            match self.drag.map(|drag| drag.mode) {
                Some(DragMode::Draw) => events.push(SurfaceEvent::DrawMove { pos }),
                Some(DragMode::Move | DragMode::Resize) => {
                    if let Some(drag) = self.drag.as_mut() {
                        drag.current = pos;
                    }
                }
                None => {}
            }
        }

        if response.drag_stopped() {
            match self.drag.map(|drag| drag.mode) {
                Some(DragMode::Draw) => events.push(SurfaceEvent::DrawEnd),
                Some(DragMode::Move | DragMode::Resize) => {
                    if let Some(drag) = self.drag.take() {
                        if let (Some(id), Some(rect)) = (drag.target, preview_rect(&drag)) {
                            events.push(SurfaceEvent::GeometryCommitted { id, rect });
                        }
                    }
                }
                None => {}
            }
        }

        if response.clicked() && !mode.enabled {
            let hit = hit_box(pos, boxes).map(|(id, _)| id);
            events.push(SurfaceEvent::SelectionChanged { id: hit });
        }

        events
    }

    fn draw(&self, painter: &Painter, page_rect: Rect, boxes: &[(RecordId, Rect)]) {
        let to_screen =
            |rect: Rect| Rect::from_min_max(page_rect.min + rect.min.to_vec2(), page_rect.min + rect.max.to_vec2());

        let drag_target = self.drag.and_then(|drag| drag.target);
        for (id, rect) in boxes {
            let rect = if drag_target == Some(*id) {
                self.drag.as_ref().and_then(preview_rect).unwrap_or(*rect)
            } else {
                *rect
            };
            painter.rect_stroke(to_screen(rect), 0.0, Stroke::new(2.0, BOX_STROKE));
        }

        if let Some(drag) = self.drag.filter(|drag| drag.mode == DragMode::Draw) {
            let preview = Rect::from_two_pos(drag.start, drag.current);
            painter.rect_stroke(
                to_screen(preview),
                0.0,
                Stroke::new(2.0, BOX_STROKE.linear_multiply(0.7)),
            );
        }

        let Some(selected) = self.visual_selection else {
            return;
        };
        let Some(rect) = boxes
            .iter()
            .find(|(id, _)| *id == selected)
            .map(|(_, rect)| *rect)
        else {
            return;
        };
        let rect = if drag_target == Some(selected) {
            self.drag.as_ref().and_then(preview_rect).unwrap_or(rect)
        } else {
            rect
        };

        let screen = to_screen(rect);
        painter.rect_stroke(screen.expand(2.0), 2.0, Stroke::new(1.8, SELECTION_STROKE));
        for (_, point) in handle_points(rect) {
            let handle_pos = page_rect.min + point.to_vec2();
            let handle_rect = Rect::from_center_size(handle_pos, vec2(HANDLE_VISUAL, HANDLE_VISUAL));
            painter.rect_filled(handle_rect, 2.0, SELECTION_STROKE);
            painter.rect_stroke(
                handle_rect,
                2.0,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 200)),
            );
        }
    }
}

fn preview_rect(drag: &DragState) -> Option<Rect> {
    match drag.mode {
        DragMode::Draw => Some(Rect::from_two_pos(drag.start, drag.current)),
        DragMode::Move => drag
            .original
            .map(|original| original.translate(drag.current - drag.start)),
        DragMode::Resize => match (drag.original, drag.handle) {
            (Some(original), Some(handle)) => Some(resize_rect(original, handle, drag.current)),
            _ => None,
        },
    }
}

fn resize_rect(rect: Rect, handle: Handle, to: Pos2) -> Rect {
    let mut min = rect.min;
    let mut max = rect.max;
    match handle {
        Handle::TopLeft => min = to,
        Handle::Top => min.y = to.y,
        Handle::TopRight => {
            min.y = to.y;
            max.x = to.x;
        }
        Handle::Right => max.x = to.x,
        Handle::BottomRight => max = to,
        Handle::Bottom => max.y = to.y,
        Handle::BottomLeft => {
            min.x = to.x;
            max.y = to.y;
        }
        Handle::Left => min.x = to.x,
    }
    // Reorders the corners when a drag crossed the opposite edge.
    Rect::from_two_pos(min, max)
}

fn handle_points(rect: Rect) -> [(Handle, Pos2); 8] {
    let center = rect.center();
    [
        (Handle::TopLeft, rect.left_top()),
        (Handle::Top, Pos2::new(center.x, rect.top())),
        (Handle::TopRight, rect.right_top()),
        (Handle::Right, Pos2::new(rect.right(), center.y)),
        (Handle::BottomRight, rect.right_bottom()),
        (Handle::Bottom, Pos2::new(center.x, rect.bottom())),
        (Handle::BottomLeft, rect.left_bottom()),
        (Handle::Left, Pos2::new(rect.left(), center.y)),
    ]
}

fn hit_handle(id: RecordId, pos: Pos2, boxes: &[(RecordId, Rect)]) -> Option<(RecordId, Handle, Rect)> {
    let rect = boxes
        .iter()
        .find(|(other, _)| *other == id)
        .map(|(_, rect)| *rect)?;
    for (handle, point) in handle_points(rect) {
        if Rect::from_center_size(point, vec2(HANDLE_HIT, HANDLE_HIT)).contains(pos) {
            return Some((id, handle, rect));
        }
    }
    None
}

fn hit_box(pos: Pos2, boxes: &[(RecordId, Rect)]) -> Option<(RecordId, Rect)> {
    boxes
        .iter()
        .rev()
        .find(|(_, rect)| rect.expand(HIT_TOLERANCE).contains(pos))
        .copied()
}

#[cfg(test)]
mod tests {
    use egui::{vec2, Pos2, Rect};

    use crate::record::BoundingBox;
    use crate::registry::SurfaceRegistry;
    use crate::store::RecordStore;
    use crate::toolbar::DrawingMode;

    use super::{resize_rect, Handle, PageSurface, SurfaceEvent};

    fn drawing_mode() -> DrawingMode {
        DrawingMode {
            enabled: true,
            locked: false,
        }
    }

    fn draw(
        surface: &mut PageSurface,
        store: &mut RecordStore,
        mode: &mut DrawingMode,
        registry: &SurfaceRegistry,
        from: Pos2,
        to: Pos2,
    ) -> bool {
        let activated = surface.handle_event(SurfaceEvent::DrawStart { pos: from }, store, mode, registry);
        surface.handle_event(SurfaceEvent::DrawMove { pos: to }, store, mode, registry);
        surface.handle_event(SurfaceEvent::DrawEnd, store, mode, registry);
        activated
    }

    #[test]
    fn released_draw_above_threshold_creates_a_record() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = drawing_mode();
        let registry = SurfaceRegistry::new();

        let activated = draw(
            &mut surface,
            &mut store,
            &mut mode,
            &registry,
            Pos2::new(100.0, 100.0),
            Pos2::new(180.0, 130.0),
        );
        assert!(activated, "starting a draw claims pointer focus");
        assert_eq!(store.len(), 1);

        let record = store.records_for_page(0)[0];
        let bbox = record.coordinates;
        assert!((bbox.upper_left_x - 12.5).abs() < 1e-3);
        assert!((bbox.upper_left_y - 16.667).abs() < 1e-3);
        assert!((bbox.lower_right_x - 22.5).abs() < 1e-3);
        assert!((bbox.lower_right_y - 21.667).abs() < 1e-3);
        assert!(!mode.enabled, "single-shot mode disables drawing");
    }

    #[test]
    fn draw_below_threshold_is_discarded() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = drawing_mode();
        let registry = SurfaceRegistry::new();

        draw(
            &mut surface,
            &mut store,
            &mut mode,
            &registry,
            Pos2::new(100.0, 100.0),
            Pos2::new(105.0, 104.0),
        );
        assert!(store.is_empty());
        assert!(mode.enabled, "a discarded draw does not consume the mode");
    }

    #[test]
    fn one_wide_axis_is_not_enough() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = drawing_mode();
        let registry = SurfaceRegistry::new();

        draw(
            &mut surface,
            &mut store,
            &mut mode,
            &registry,
            Pos2::new(100.0, 100.0),
            Pos2::new(200.0, 105.0),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn locked_mode_keeps_drawing_enabled() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = DrawingMode {
            enabled: true,
            locked: true,
        };
        let registry = SurfaceRegistry::new();

        draw(
            &mut surface,
            &mut store,
            &mut mode,
            &registry,
            Pos2::new(10.0, 10.0),
            Pos2::new(60.0, 60.0),
        );
        assert_eq!(store.len(), 1);
        assert!(mode.enabled);
    }

    #[test]
    fn draw_start_requires_drawing_mode() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = DrawingMode::default();
        let registry = SurfaceRegistry::new();

        let activated =
            surface.handle_event(SurfaceEvent::DrawStart { pos: Pos2::ZERO }, &mut store, &mut mode, &registry);
        assert!(!activated);
        surface.handle_event(SurfaceEvent::DrawEnd, &mut store, &mut mode, &registry);
        assert!(store.is_empty());
    }

    #[test]
    fn draw_end_without_draw_start_is_a_no_op() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = drawing_mode();
        let registry = SurfaceRegistry::new();

        surface.handle_event(SurfaceEvent::DrawEnd, &mut store, &mut mode, &registry);
        assert!(store.is_empty());
    }

    #[test]
    fn selection_events_bind_visual_and_logical_selection() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = DrawingMode::default();
        let mut registry = SurfaceRegistry::new();
        registry.register(0);
        let id = store.add_record(0, BoundingBox::new(10.0, 10.0, 30.0, 30.0));

        let activated =
            surface.handle_event(SurfaceEvent::SelectionChanged { id: Some(id) }, &mut store, &mut mode, &registry);
        assert!(activated);
        assert_eq!(surface.visual_selection(), Some(id));
        assert_eq!(store.selected(), Some(id));

        let _ = registry.set_active(0);
        surface.handle_event(SurfaceEvent::SelectionChanged { id: None }, &mut store, &mut mode, &registry);
        assert_eq!(surface.visual_selection(), None);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn inactive_surface_cannot_clear_a_moved_selection() {
        let mut store = RecordStore::new();
        let mut mode = DrawingMode::default();
        let mut registry = SurfaceRegistry::new();
        registry.register(0);
        registry.register(1);

        let mut first = PageSurface::new(0);
        first.set_rendered_size(vec2(800.0, 600.0));
        let mut second = PageSurface::new(1);
        second.set_rendered_size(vec2(800.0, 600.0));

        let on_first = store.add_record(0, BoundingBox::new(10.0, 10.0, 30.0, 30.0));
        let on_second = store.add_record(1, BoundingBox::new(40.0, 40.0, 60.0, 60.0));

        first.handle_event(SurfaceEvent::SelectionChanged { id: Some(on_first) }, &mut store, &mut mode, &registry);
        for cleared in registry.set_active(0) {
            assert_ne!(cleared, 0);
        }

        // Selection moves to the second surface; the first loses focus.
        second.handle_event(SurfaceEvent::SelectionChanged { id: Some(on_second) }, &mut store, &mut mode, &registry);
        for cleared in registry.set_active(1) {
            first.clear_visual_selection();
            assert_eq!(cleared, 0);
        }

        // The stale clear coming from the first surface must not win.
        first.handle_event(SurfaceEvent::SelectionChanged { id: None }, &mut store, &mut mode, &registry);
        assert_eq!(store.selected(), Some(on_second));
        assert_eq!(second.visual_selection(), Some(on_second));
    }

    #[test]
    fn geometry_commit_updates_the_store() {
        let mut surface = PageSurface::new(0);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let mut store = RecordStore::new();
        let mut mode = DrawingMode::default();
        let registry = SurfaceRegistry::new();
        let id = store.add_record(0, BoundingBox::new(10.0, 10.0, 30.0, 30.0));

        let moved = Rect::from_min_max(Pos2::new(200.0, 150.0), Pos2::new(400.0, 300.0));
        surface.handle_event(SurfaceEvent::GeometryCommitted { id, rect: moved }, &mut store, &mut mode, &registry);

        let bbox = store.record(id).unwrap().coordinates;
        assert!((bbox.upper_left_x - 25.0).abs() < 1e-3);
        assert!((bbox.upper_left_y - 25.0).abs() < 1e-3);
        assert!((bbox.lower_right_x - 50.0).abs() < 1e-3);
        assert!((bbox.lower_right_y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn selection_pull_follows_the_store_across_pages() {
        let mut store = RecordStore::new();
        let mut surface = PageSurface::new(2);
        surface.set_rendered_size(vec2(800.0, 600.0));
        let id = store.add_record(2, BoundingBox::new(10.0, 10.0, 30.0, 30.0));

        // Selection set externally, e.g. by clicking a results tab.
        store.set_selected(Some(id));
        assert!(surface.sync_selection(&store), "the record's page pulls focus");
        assert_eq!(surface.visual_selection(), Some(id));

        // Repeated syncs are stable.
        assert!(!surface.sync_selection(&store));

        // A deleted record drops the stale visual selection.
        store.delete_record(id);
        assert!(!surface.sync_selection(&store));
        assert_eq!(surface.visual_selection(), None);
    }

    #[test]
    fn resize_reorders_crossed_corners() {
        let rect = Rect::from_min_max(Pos2::new(10.0, 10.0), Pos2::new(50.0, 50.0));
        let dragged = resize_rect(rect, Handle::BottomRight, Pos2::new(0.0, 0.0));
        assert_eq!(dragged.min, Pos2::new(0.0, 0.0));
        assert_eq!(dragged.max, Pos2::new(10.0, 10.0));

        let top = resize_rect(rect, Handle::Top, Pos2::new(30.0, 5.0));
        assert_eq!(top.min.y, 5.0);
        assert_eq!(top.max, rect.max);
    }
}
