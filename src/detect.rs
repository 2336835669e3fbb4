use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::record::{BoundingBox, DetectionMap};

/// Wire format of a table detection result: percentage-space boxes keyed by
/// zero-based page index. Pages without tables carry an empty list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub all_rectangles: BTreeMap<usize, Vec<BoundingBox>>,
}

impl DetectionResponse {
    /// Normalizes every box at the trust boundary; whatever the detector
    /// emitted, only ordered boxes enter the store.
    pub fn into_detection_map(self) -> DetectionMap {
        self.all_rectangles
            .into_iter()
            .map(|(page, boxes)| {
                (
                    page,
                    boxes.into_iter().map(BoundingBox::normalized).collect(),
                )
            })
            .collect()
    }
}

pub fn parse_detection(json: &str) -> Result<DetectionResponse> {
    serde_json::from_str(json).context("malformed detection result")
}

pub fn load_detection(path: &Path) -> Result<DetectionResponse> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read detection file {}", path.display()))?;
    parse_detection(&json)
}
