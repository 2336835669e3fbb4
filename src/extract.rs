use anyhow::Result;

use crate::normalize::display_from_page_index;
use crate::record::{BoundingBox, CellMatrix, TableRecord};

/// Prompt sent to the language-model backend when the record carries no
/// custom one.
pub const DEFAULT_PROMPT: &str = "Format as excel table, data are as numbers.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionMethod {
    #[default]
    PdfText,
    ImageModel,
    Llm,
}

impl ExtractionMethod {
    pub const ALL: [ExtractionMethod; 3] = [
        ExtractionMethod::PdfText,
        ExtractionMethod::ImageModel,
        ExtractionMethod::Llm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExtractionMethod::PdfText => "Extract from PDF text",
            ExtractionMethod::ImageModel => "Image processing",
            ExtractionMethod::Llm => "Language model",
        }
    }
}

/// What an extraction backend needs to know about one region.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionRequest {
    /// One-based page number, as external services count pages.
    pub page_number: usize,
    pub region: BoundingBox,
    /// Set only for the language-model method, and only when the record opts
    /// into its custom prompt.
    pub custom_prompt: Option<String>,
}

/// Extraction backend seam. Implementations are expected to be slow and
/// fallible; the caller keeps the record untouched on failure.
pub trait TableExtractor {
    fn extract(&self, method: ExtractionMethod, request: &ExtractionRequest) -> Result<CellMatrix>;
}

/// Builds the request for a record, converting the page number at the edge.
pub fn request_for_record(record: &TableRecord, method: ExtractionMethod) -> ExtractionRequest {
    let custom_prompt = match method {
        ExtractionMethod::Llm if record.use_custom_prompt => record.extraction_prompt.clone(),
        _ => None,
    };
    ExtractionRequest {
        page_number: display_from_page_index(record.page_index),
        region: record.coordinates,
        custom_prompt,
    }
}

/// Stand-in backend: answers with a small matrix describing the request so
/// the full annotate -> extract -> edit -> export loop works offline.
#[derive(Debug, Default)]
pub struct DemoExtractor;

impl TableExtractor for DemoExtractor {
    fn extract(&self, method: ExtractionMethod, request: &ExtractionRequest) -> Result<CellMatrix> {
        let region = request.region;
        Ok(vec![
            vec!["Field".to_owned(), "Value".to_owned()],
            vec!["Method".to_owned(), method.label().to_owned()],
            vec!["Page".to_owned(), request.page_number.to_string()],
            vec![
                "Region".to_owned(),
                format!(
                    "({:.1}, {:.1}) - ({:.1}, {:.1})",
                    region.upper_left_x, region.upper_left_y, region.lower_right_x, region.lower_right_y
                ),
            ],
            vec![
                "Prompt".to_owned(),
                request
                    .custom_prompt
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROMPT.to_owned()),
            ],
        ])
    }
}
