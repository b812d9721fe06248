use super::{check_document_id, DocumentStore, StoreError};
use crate::types::{Document, StoredDocument};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based document store: one directory per collection, one JSON file per document
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn document_path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        check_document_id(collection)?;
        check_document_id(id)?;
        Ok(self.collection_dir(collection).join(format!("{id}.json")))
    }
}

impl DocumentStore for LocalStore {
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        check_document_id(collection)?;
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let json_str = fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&json_str)? {
                Value::Object(fields) => documents.push(StoredDocument::new(id, fields)),
                _ => {
                    return Err(StoreError::NotAnObject {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    })
                }
            }
        }

        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), StoreError> {
        let path = self.document_path(collection, id)?;
        fs::create_dir_all(self.collection_dir(collection))?;
        let json_str = serde_json::to_string_pretty(document)?;
        fs::write(path, json_str)?;
        Ok(())
    }

    fn count(&self, collection: &str) -> Result<usize, StoreError> {
        check_document_id(collection)?;
        let dir = self.collection_dir(collection);
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in fs::read_dir(dir)? {
            if entry?.path().extension().and_then(|e| e.to_str()) == Some("json") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn name(&self) -> &str {
        "local"
    }
}
