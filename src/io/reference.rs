use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::config::ReferenceConfig;
use crate::models::{AttributeRecord, FieldValue, ReferenceTable};

/// Load the reference attribute table from a CSV export
pub fn load_reference_csv<P: AsRef<Path>>(
    path: P,
    config: &ReferenceConfig,
) -> Result<ReferenceTable> {
    let path = path.as_ref();
    info!("Loading reference table from {}", path.display());
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open reference table: {}", path.display()))?;
    read_reference(reader, config)
        .with_context(|| format!("Failed to read reference table: {}", path.display()))
}

/// Build the reference table from CSV rows.
///
/// Only the configured columns are kept, renamed to their field names. Names lose
/// any `*` markers and surrounding whitespace; rows left without a name are skipped.
pub fn read_reference<R: Read>(
    mut reader: csv::Reader<R>,
    config: &ReferenceConfig,
) -> Result<ReferenceTable> {
    if !config.columns.values().any(|f| f == &config.name_field) {
        bail!("No column is mapped to the name field '{}'", config.name_field);
    }

    let headers = reader.headers().context("Failed to read header row")?.clone();
    let mut columns = Vec::with_capacity(config.columns.len());
    for (header, field) in &config.columns {
        let idx = headers
            .iter()
            .position(|h| h.trim() == header.trim())
            .with_context(|| format!("Reference table has no column '{}'", header))?;
        columns.push((idx, field.as_str()));
    }

    let mut table = ReferenceTable::new();
    let mut skipped = 0;

    for (row_num, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed reference row {}", row_num + 1))?;

        let mut record = AttributeRecord::new();
        let mut name = String::new();

        for &(idx, field) in &columns {
            let raw = row.get(idx).unwrap_or("").trim();

            if field == config.name_field {
                name = raw.replace('*', "").trim().to_string();
                record.insert(field, name.as_str());
                continue;
            }

            let value = if raw.is_empty() || config.missing_values.iter().any(|m| m == raw) {
                if config.zero_fill.iter().any(|z| z == field) {
                    FieldValue::Integer(0)
                } else {
                    FieldValue::Null
                }
            } else {
                FieldValue::parse_cell(raw)
            };
            record.insert(field, value);
        }

        if name.is_empty() {
            skipped += 1;
            continue;
        }
        table.insert(name, record);
    }

    info!(
        "Loaded {} reference rows ({} skipped without a name)",
        table.len(),
        skipped
    );
    Ok(table)
}
