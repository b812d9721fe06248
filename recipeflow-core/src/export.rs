use crate::store::DocumentStore;
use crate::types::{Document, StoredDocument};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Documents dumped per collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub collections: Vec<(String, usize, PathBuf)>,
}

impl ExportSummary {
    pub fn total(&self) -> usize {
        self.collections.iter().map(|(_, count, _)| count).sum()
    }
}

/// Dump each collection to `<dir>/<collection>.json` as a pretty JSON array,
/// every document carrying its store id under `_id`.
pub fn export_collections(
    store: &dyn DocumentStore,
    collections: &[String],
    dir: &Path,
) -> Result<ExportSummary> {
    fs::create_dir_all(dir)?;
    let mut summary = ExportSummary::default();

    for collection in collections {
        let documents: Vec<Document> = store
            .list(collection)
            .with_context(|| format!("Failed to read collection {collection} from {}", store.name()))?
            .into_iter()
            .map(StoredDocument::into_export)
            .collect();

        let path = dir.join(format!("{collection}.json"));
        let json_str = serde_json::to_string_pretty(&documents)?;
        fs::write(&path, json_str).with_context(|| format!("Failed to write {}", path.display()))?;

        println!("💾 Dumped {} docs from {} to {}", documents.len(), collection, path.display());
        summary.collections.push((collection.clone(), documents.len(), path));
    }

    Ok(summary)
}

/// Read a JSON dump back. Non-object entries are skipped with a warning.
pub fn load_dump(path: &Path) -> Result<Vec<Document>> {
    let json_str = fs::read_to_string(path).with_context(|| {
        format!("Failed to read {} (run the export stage first)", path.display())
    })?;
    let value: Value = serde_json::from_str(&json_str)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let Value::Array(entries) = value else {
        return Err(anyhow!("{} does not hold a JSON array", path.display()));
    };

    let mut documents = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::Object(fields) => documents.push(fields),
            other => tracing::warn!(
                path = %path.display(),
                index,
                kind = json_kind(&other),
                "skipping non-object entry"
            ),
        }
    }
    Ok(documents)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_export_adds_store_id() {
        let store_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(store_dir.path()).unwrap();
        store.put("recipes", "r1", &doc(json!({"title": "Soup"}))).unwrap();
        store.put("recipes", "r2", &doc(json!({"title": "Bread", "_id": "stale"}))).unwrap();

        let collections = vec!["recipes".to_string(), "users".to_string()];
        let summary = export_collections(&store, &collections, out_dir.path()).unwrap();
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.collections[1].1, 0);

        let recipes = load_dump(&out_dir.path().join("recipes.json")).unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0]["_id"], json!("r1"));
        assert_eq!(recipes[0]["title"], json!("Soup"));
        assert_eq!(recipes[1]["_id"], json!("r2"));

        let users = fs::read_to_string(out_dir.path().join("users.json")).unwrap();
        assert_eq!(users.trim(), "[]");
    }

    #[test]
    fn test_load_dump_skips_non_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactions.json");
        fs::write(&path, r#"[{"_id": "i1"}, 42, null, {"_id": "i2"}]"#).unwrap();
        let documents = load_dump(&path).unwrap();
        assert_eq!(documents.len(), 2);
    }

    #[test]
    fn test_load_dump_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_dump(&dir.path().join("recipes.json")).unwrap_err();
        assert!(missing.to_string().contains("recipes.json"));

        let path = dir.path().join("users.json");
        fs::write(&path, r#"{"not": "an array"}"#).unwrap();
        assert!(load_dump(&path).is_err());
    }
}
