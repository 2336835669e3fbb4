use std::collections::BTreeSet;

/// Tracks which page surface currently owns the pointer focus.
///
/// Owned and injected by the document view rather than living in a global;
/// it mediates between surfaces only and never touches the record store.
/// The invariant it enforces: at most one surface holds a visually selected
/// rectangle at any time.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    active: Option<usize>,
    registered: BTreeSet<usize>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, page_index: usize) {
        self.registered.insert(page_index);
    }

    pub fn unregister(&mut self, page_index: usize) {
        self.registered.remove(&page_index);
        if self.active == Some(page_index) {
            self.active = None;
        }
    }

    /// Makes `page_index` the active surface and returns the other
    /// registered surfaces, which must drop their local visual selection
    /// (not the store's logical selection). Returns nothing when the surface
    /// already is active.
    #[must_use = "the returned surfaces must have their visual selection cleared"]
    pub fn set_active(&mut self, page_index: usize) -> Vec<usize> {
        if self.active == Some(page_index) {
            return Vec::new();
        }
        self.active = Some(page_index);
        self.registered
            .iter()
            .copied()
            .filter(|&page| page != page_index)
            .collect()
    }

    pub fn is_active(&self, page_index: usize) -> bool {
        self.active == Some(page_index)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::SurfaceRegistry;

    #[test]
    fn activation_reports_the_other_surfaces() {
        let mut registry = SurfaceRegistry::new();
        for page in 0..3 {
            registry.register(page);
        }

        assert_eq!(registry.set_active(1), vec![0, 2]);
        assert!(registry.is_active(1));
        assert_eq!(registry.set_active(1), Vec::<usize>::new());
        assert_eq!(registry.set_active(0), vec![1, 2]);
    }

    #[test]
    fn unregister_drops_the_active_slot() {
        let mut registry = SurfaceRegistry::new();
        registry.register(0);
        registry.register(1);
        let _ = registry.set_active(0);
        registry.unregister(0);
        assert_eq!(registry.active(), None);
        assert!(!registry.is_active(0));
    }

    #[test]
    fn at_most_one_visual_selection_under_churn() {
        let mut registry = SurfaceRegistry::new();
        let mut visually_selected = vec![false; 5];
        for page in 0..5 {
            registry.register(page);
        }

        for &page in &[0usize, 3, 3, 1, 4, 2, 4, 0] {
            for cleared in registry.set_active(page) {
                visually_selected[cleared] = false;
            }
            visually_selected[page] = true;
            let count = visually_selected.iter().filter(|set| **set).count();
            assert!(count <= 1, "more than one surface holds a visual selection");
        }
    }
}
