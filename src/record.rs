use std::collections::BTreeMap;

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize;

/// Stable identifier of one table-candidate region, assigned at creation.
pub type RecordId = Uuid;

/// Extracted table payload: a rectangular matrix of cell strings.
pub type CellMatrix = Vec<Vec<String>>;

/// Internal form of a detection result: percentage-space boxes keyed by
/// zero-based page index.
pub type DetectionMap = BTreeMap<usize, Vec<BoundingBox>>;

/// Axis-aligned box in percentage space (0–100 of the page's rendered
/// width/height). Invariant: `upper_left <= lower_right` on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub upper_left_x: f32,
    pub upper_left_y: f32,
    pub lower_right_x: f32,
    pub lower_right_y: f32,
}

impl BoundingBox {
    pub fn new(upper_left_x: f32, upper_left_y: f32, lower_right_x: f32, lower_right_y: f32) -> Self {
        Self {
            upper_left_x,
            upper_left_y,
            lower_right_x,
            lower_right_y,
        }
        .normalized()
    }

    /// Reorders the corners so the upper-left really is upper-left,
    /// whichever diagonal the box was described by.
    pub fn normalized(self) -> Self {
        Self {
            upper_left_x: self.upper_left_x.min(self.lower_right_x),
            upper_left_y: self.upper_left_y.min(self.lower_right_y),
            lower_right_x: self.upper_left_x.max(self.lower_right_x),
            lower_right_y: self.upper_left_y.max(self.lower_right_y),
        }
    }

    /// Converts a page-local absolute rect into percentage space for the
    /// page's current rendered size.
    pub fn from_page_rect(rect: Rect, page_size: Vec2) -> Self {
        Self {
            upper_left_x: normalize::to_percentage(rect.min.x, page_size.x),
            upper_left_y: normalize::to_percentage(rect.min.y, page_size.y),
            lower_right_x: normalize::to_percentage(rect.max.x, page_size.x),
            lower_right_y: normalize::to_percentage(rect.max.y, page_size.y),
        }
        .normalized()
    }

    /// Converts back to a page-local absolute rect for the page's current
    /// rendered size.
    pub fn to_page_rect(&self, page_size: Vec2) -> Rect {
        Rect::from_min_max(
            Pos2::new(
                normalize::to_absolute(self.upper_left_x, page_size.x),
                normalize::to_absolute(self.upper_left_y, page_size.y),
            ),
            Pos2::new(
                normalize::to_absolute(self.lower_right_x, page_size.x),
                normalize::to_absolute(self.lower_right_y, page_size.y),
            ),
        )
    }

    pub fn is_ordered(&self) -> bool {
        self.upper_left_x <= self.lower_right_x && self.upper_left_y <= self.lower_right_y
    }
}

/// One table-candidate region with its metadata and extraction payload.
/// Owned exclusively by the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRecord {
    pub id: RecordId,
    /// Display label, fixed at creation; never renumbered afterwards.
    pub title: String,
    /// Zero-based page index. Displays and external services use one-based
    /// numbers; the conversion happens at the edges, never here.
    pub page_index: usize,
    pub coordinates: BoundingBox,
    pub extracted_data: Option<CellMatrix>,
    pub extraction_prompt: Option<String>,
    pub use_custom_prompt: bool,
}

#[cfg(test)]
mod tests {
    use egui::{vec2, Pos2, Rect};

    use super::BoundingBox;

    #[test]
    fn normalized_from_any_drag_diagonal() {
        let page = vec2(800.0, 600.0);
        let corners = [
            (Pos2::new(100.0, 100.0), Pos2::new(180.0, 130.0)),
            (Pos2::new(180.0, 100.0), Pos2::new(100.0, 130.0)),
            (Pos2::new(100.0, 130.0), Pos2::new(180.0, 100.0)),
            (Pos2::new(180.0, 130.0), Pos2::new(100.0, 100.0)),
        ];
        for (a, b) in corners {
            let bbox = BoundingBox::from_page_rect(Rect::from_two_pos(a, b), page);
            assert!(bbox.is_ordered(), "flipped box for drag {a:?} -> {b:?}");
            assert!((bbox.upper_left_x - 12.5).abs() < 1e-3);
            assert!((bbox.lower_right_x - 22.5).abs() < 1e-3);
        }
    }

    #[test]
    fn page_rect_round_trip() {
        let page = vec2(612.0, 792.0);
        let bbox = BoundingBox::new(10.0, 20.0, 55.5, 80.25);
        let back = BoundingBox::from_page_rect(bbox.to_page_rect(page), page);
        assert!((back.upper_left_x - bbox.upper_left_x).abs() < 1e-3);
        assert!((back.upper_left_y - bbox.upper_left_y).abs() < 1e-3);
        assert!((back.lower_right_x - bbox.lower_right_x).abs() < 1e-3);
        assert!((back.lower_right_y - bbox.lower_right_y).abs() < 1e-3);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let json = r#"{"upperLeftX":1.0,"upperLeftY":2.0,"lowerRightX":3.0,"lowerRightY":4.0}"#;
        let bbox: BoundingBox = serde_json::from_str(json).expect("camelCase box");
        assert_eq!(bbox, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
    }
}
