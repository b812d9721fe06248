use crate::config::PipelineConfig;
use crate::store::DocumentStore;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Generated files under the output directory: (directory, extension) pairs
/// plus single files.
fn generated_outputs(config: &PipelineConfig) -> (Vec<(PathBuf, &'static str)>, Vec<PathBuf>) {
    (
        vec![
            (config.raw_json_dir(), "json"),
            (config.csv_dir(), "csv"),
            (config.charts_dir(), "svg"),
        ],
        vec![config.insights_path(), config.validation_report_path()],
    )
}

/// Delete generated outputs. The local store is left alone.
/// Returns how many files were removed.
pub fn cleanup_outputs(config: &PipelineConfig) -> Result<usize> {
    let (dirs, files) = generated_outputs(config);
    let mut removed = 0;

    for (dir, extension) in dirs {
        for path in files_with_extension(&dir, extension)? {
            removed += remove(&path);
        }
    }
    for path in files.iter().filter(|p| p.is_file()) {
        removed += remove(path);
    }

    Ok(removed)
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn remove(path: &Path) -> usize {
    match fs::remove_file(path) {
        Ok(()) => {
            println!("   Deleted: {}", path.display());
            1
        }
        Err(e) => {
            println!("⚠️  Could not delete {}: {}", path.display(), e);
            tracing::warn!(path = %path.display(), error = %e, "delete failed");
            0
        }
    }
}

/// Document count per collection. A failing collection is reported in place
/// and the rest are still counted.
pub fn count_documents(
    store: &dyn DocumentStore,
    collections: &[String],
) -> Vec<(String, Result<usize>)> {
    collections
        .iter()
        .map(|collection| {
            let count = store.count(collection).map_err(anyhow::Error::from);
            (collection.clone(), count)
        })
        .collect()
}
