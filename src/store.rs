use std::collections::{BTreeMap, HashMap};

use log::info;
use uuid::Uuid;

use crate::normalize::display_from_page_index;
use crate::record::{BoundingBox, CellMatrix, DetectionMap, RecordId, TableRecord};

/// Single source of truth for table-candidate records: the record map, the
/// page -> ordered record-id index, and the one globally selected record.
///
/// Every mutation referencing an unknown id is a silent no-op; callers are
/// expected to have obtained ids from a prior read, and this tolerates races
/// between UI removal and a pending action.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<RecordId, TableRecord>,
    pages: BTreeMap<usize, Vec<RecordId>>,
    selected: Option<RecordId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every record, the page index and the selection. Used when a new
    /// document is loaded.
    pub fn reset(&mut self) {
        self.records.clear();
        self.pages.clear();
        self.selected = None;
    }

    /// Full replace with a fresh detection pass. Any user-drawn rectangles
    /// not part of the result are lost; detection defines a new ground truth.
    pub fn replace_all(&mut self, detection: &DetectionMap) {
        self.reset();
        for (&page_index, boxes) in detection {
            for bbox in boxes {
                self.create_record(page_index, bbox.normalized());
            }
        }
        info!(
            "ingested detection result: {} tables across {} pages",
            self.records.len(),
            detection.len()
        );
    }

    /// Creates a single record, typically for a user-drawn rectangle, and
    /// returns its id.
    pub fn add_record(&mut self, page_index: usize, bbox: BoundingBox) -> RecordId {
        self.create_record(page_index, bbox.normalized())
    }

    fn create_record(&mut self, page_index: usize, coordinates: BoundingBox) -> RecordId {
        let ids = self.pages.entry(page_index).or_default();
        let title = format!(
            "Page {} Table {}",
            display_from_page_index(page_index),
            ids.len() + 1
        );
        let id = Uuid::new_v4();
        ids.push(id);
        self.records.insert(
            id,
            TableRecord {
                id,
                title,
                page_index,
                coordinates,
                extracted_data: None,
                extraction_prompt: None,
                use_custom_prompt: false,
            },
        );
        id
    }

    pub fn record(&self, id: RecordId) -> Option<&TableRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for one page in index order. Duplicate ids in the page index
    /// are collapsed defensively; callers must not have to trust the index.
    pub fn records_for_page(&self, page_index: usize) -> Vec<&TableRecord> {
        let Some(ids) = self.pages.get(&page_index) else {
            return Vec::new();
        };
        let mut seen = Vec::with_capacity(ids.len());
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(record) = self.records.get(id) {
                out.push(record);
            }
        }
        out
    }

    /// Replaces the record's coordinates only. No-op for unknown ids.
    pub fn update_coordinates(&mut self, id: RecordId, bbox: BoundingBox) {
        if let Some(record) = self.records.get_mut(&id) {
            record.coordinates = bbox.normalized();
        }
    }

    /// Writes the extraction payload. `None` removes the record from the
    /// derived extracted set.
    pub fn update_extracted_data(&mut self, id: RecordId, data: Option<CellMatrix>) {
        if let Some(record) = self.records.get_mut(&id) {
            record.extracted_data = data;
        }
    }

    pub fn set_extraction_prompt(&mut self, id: RecordId, prompt: Option<String>) {
        if let Some(record) = self.records.get_mut(&id) {
            record.extraction_prompt = prompt;
        }
    }

    pub fn set_use_custom_prompt(&mut self, id: RecordId, use_custom: bool) {
        if let Some(record) = self.records.get_mut(&id) {
            record.use_custom_prompt = use_custom;
        }
    }

    /// Removes the record from the map and its page's index; clears the
    /// selection if it pointed at the record. Idempotent.
    pub fn delete_record(&mut self, id: RecordId) {
        let Some(record) = self.records.remove(&id) else {
            return;
        };
        if let Some(ids) = self.pages.get_mut(&record.page_index) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.pages.remove(&record.page_index);
            }
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Sets the selection verbatim; existence is not validated here. Reads
    /// treat a dangling id as "nothing selected".
    pub fn set_selected(&mut self, id: Option<RecordId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<RecordId> {
        self.selected.filter(|id| self.records.contains_key(id))
    }

    pub fn selected_record(&self) -> Option<&TableRecord> {
        self.selected().and_then(|id| self.records.get(&id))
    }

    pub fn is_record_on_page(&self, id: RecordId, page_index: usize) -> bool {
        self.records
            .get(&id)
            .is_some_and(|record| record.page_index == page_index)
    }

    /// The derived extracted set, in page then index order. Always a pure
    /// filter over the record map; never stored independently.
    pub fn extracted_ids(&self) -> Vec<RecordId> {
        let mut out = Vec::new();
        for ids in self.pages.values() {
            for id in ids {
                if self
                    .records
                    .get(id)
                    .is_some_and(|record| record.extracted_data.is_some())
                    && !out.contains(id)
                {
                    out.push(*id);
                }
            }
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn inject_duplicate_index_entry(&mut self, page_index: usize, id: RecordId) {
        self.pages.entry(page_index).or_default().push(id);
    }

    #[cfg(test)]
    pub(crate) fn check_consistency(&self) {
        for (&page_index, ids) in &self.pages {
            for id in ids {
                let record = self.records.get(id).expect("page index points at a live record");
                assert_eq!(record.page_index, page_index, "page index and record diverged");
            }
        }
        for record in self.records.values() {
            let ids = self.pages.get(&record.page_index).expect("record's page is indexed");
            assert_eq!(
                ids.iter().filter(|id| **id == record.id).count(),
                1,
                "record must appear in its page index exactly once"
            );
            assert!(record.coordinates.is_ordered(), "stored box lost its ordering");
        }
    }
}
