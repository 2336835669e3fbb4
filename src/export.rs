use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::info;

use crate::record::{CellMatrix, TableRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Csv, ExportFormat::Json];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV (one file per table)",
            ExportFormat::Json => "JSON (single file)",
        }
    }
}

/// Timestamped base name for an export, derived from the document name.
pub fn default_base_name(document_name: &str) -> String {
    let stem = Path::new(document_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("tables");
    format!("{stem} {}", Local::now().format("%Y-%m-%d %H.%M.%S"))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

pub fn table_to_csv(table: &CellMatrix) -> String {
    let mut out = String::new();
    for row in table {
        let line: Vec<String> = row.iter().map(|cell| csv_field(cell)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn sanitize_file_name(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// Writes one CSV per extracted record into `dir` and returns the written
/// paths. Records without extraction payloads are skipped.
pub fn export_csv(records: &[&TableRecord], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for record in records {
        let Some(table) = &record.extracted_data else {
            continue;
        };
        let base = sanitize_file_name(&record.title);
        let mut path = dir.join(format!("{base}.csv"));
        let mut counter = 1;
        while path.exists() {
            counter += 1;
            path = dir.join(format!("{base} ({counter}).csv"));
        }
        fs::write(&path, table_to_csv(table))
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    info!("exported {} tables as CSV to {}", written.len(), dir.display());
    Ok(written)
}

/// Writes every extracted record, keyed by id, into one JSON file.
pub fn export_json(records: &[&TableRecord], path: &Path) -> Result<()> {
    let extracted: BTreeMap<String, &TableRecord> = records
        .iter()
        .filter(|record| record.extracted_data.is_some())
        .map(|record| (record.id.to_string(), *record))
        .collect();
    let json = serde_json::to_string_pretty(&extracted).context("failed to serialize tables")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!("exported {} tables to {}", extracted.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{csv_field, table_to_csv};

    #[test]
    fn csv_fields_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("1,234"), "\"1,234\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn table_rows_become_lines() {
        let table = vec![
            vec!["Year".to_owned(), "Revenue".to_owned()],
            vec!["2024".to_owned(), "1,250".to_owned()],
        ];
        assert_eq!(table_to_csv(&table), "Year,Revenue\n2024,\"1,250\"\n");
    }
}
