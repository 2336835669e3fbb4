//! Conversions between a page's absolute pixel space and the
//! resolution-independent percentage space records are stored in, plus the
//! single boundary between internal zero-based page indices and the
//! one-based page numbers used by displays and external services.

/// Maps an absolute pixel value to a percentage of the page dimension.
///
/// Percentages are deliberately not clamped; a rectangle may legitimately
/// touch 0 or 100. A zero-sized page is a caller error and fails loudly
/// rather than poisoning stored coordinates with NaN or infinity.
pub fn to_percentage(value: f32, total: f32) -> f32 {
    assert!(total > 0.0, "page dimension must be positive, got {total}");
    value / total * 100.0
}

/// Inverse of [`to_percentage`] for the same page dimension.
pub fn to_absolute(percentage: f32, total: f32) -> f32 {
    assert!(total > 0.0, "page dimension must be positive, got {total}");
    percentage * total / 100.0
}

/// One-based display/API page number to internal zero-based index.
pub fn page_index_from_display(display: usize) -> usize {
    assert!(display >= 1, "display page numbers start at 1");
    display - 1
}

/// Internal zero-based index to one-based display/API page number.
pub fn display_from_page_index(page_index: usize) -> usize {
    page_index + 1
}

#[cfg(test)]
mod tests {
    use super::{display_from_page_index, page_index_from_display, to_absolute, to_percentage};

    #[test]
    fn round_trip_within_tolerance() {
        for total in [1.0_f32, 240.0, 612.5, 800.0, 4096.0] {
            for step in 0..=20 {
                let value = total * step as f32 / 20.0;
                let back = to_absolute(to_percentage(value, total), total);
                assert!(
                    (back - value).abs() < 1e-3,
                    "round trip drifted: {value} -> {back} (total {total})"
                );
            }
        }
    }

    #[test]
    fn percentages_are_not_clamped() {
        assert_eq!(to_percentage(0.0, 800.0), 0.0);
        assert_eq!(to_percentage(800.0, 800.0), 100.0);
        assert!(to_percentage(900.0, 800.0) > 100.0);
    }

    #[test]
    #[should_panic(expected = "page dimension must be positive")]
    fn zero_page_dimension_fails_loudly() {
        to_percentage(10.0, 0.0);
    }

    #[test]
    fn page_number_boundary() {
        assert_eq!(page_index_from_display(1), 0);
        assert_eq!(page_index_from_display(7), 6);
        assert_eq!(display_from_page_index(0), 1);
        assert_eq!(display_from_page_index(6), 7);
        for display in 1..=10 {
            assert_eq!(display_from_page_index(page_index_from_display(display)), display);
        }
    }

    #[test]
    #[should_panic(expected = "display page numbers start at 1")]
    fn display_page_zero_is_rejected() {
        page_index_from_display(0);
    }
}
