use crate::types::*;
use anyhow::{Context, Result};
use csv::StringRecord;
use std::fs;
use std::path::Path;

/// Write rows to `dir/<T::FILE_NAME>`. The header row is written even when there are no rows.
pub fn write_table<T: TableRow>(dir: &Path, rows: &[T]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(T::FILE_NAME);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every row of `dir/<T::FILE_NAME>`. Columns are matched by header name;
/// missing columns load as empty cells. Invalid UTF-8 is decoded lossily and a
/// row that still cannot be read is skipped with a warning.
pub fn read_table<T: TableRow>(dir: &Path) -> Result<Vec<T>> {
    let path = dir.join(T::FILE_NAME);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = StringRecord::from_byte_record_lossy(
        reader
            .byte_headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .clone(),
    );

    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        // index 0 is the first data line, line 2 of the file
        let line = index + 2;
        let record = match record {
            Ok(record) => StringRecord::from_byte_record_lossy(record),
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), line, error = %e, "skipping unreadable row");
                continue;
            }
        };
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(file = %path.display(), line, error = %e, "skipping malformed row");
            }
        }
    }
    Ok(rows)
}

pub fn write_tables(dir: &Path, tables: &NormalizedTables) -> Result<()> {
    write_table(dir, &tables.recipes)?;
    write_table(dir, &tables.ingredients)?;
    write_table(dir, &tables.steps)?;
    write_table(dir, &tables.interactions)?;
    Ok(())
}

pub fn read_tables(dir: &Path) -> Result<NormalizedTables> {
    Ok(NormalizedTables {
        recipes: read_table(dir)?,
        ingredients: read_table(dir)?,
        steps: read_table(dir)?,
        interactions: read_table(dir)?,
    })
}
