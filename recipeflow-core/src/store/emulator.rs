use super::firestore_value::{decode_fields, encode_fields};
use super::{check_document_id, DocumentStore, StoreError};
use crate::types::{Document, StoredDocument};
use serde_json::{json, Value};
use std::time::Duration;

const PAGE_SIZE: usize = 300;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// The emulator accepts this token as an admin credential and skips security rules
const EMULATOR_AUTH: &str = "Bearer owner";

/// Firestore emulator client over the REST API
pub struct EmulatorStore {
    documents_url: String,
    agent: ureq::Agent,
}

impl EmulatorStore {
    /// `host` is the `FIRESTORE_EMULATOR_HOST` value, e.g. `127.0.0.1:8080`
    pub fn new(host: &str, project_id: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };

        Self {
            documents_url: format!("{base}/v1/projects/{project_id}/databases/(default)/documents"),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, collection)
    }

    fn fetch_page(&self, url: &str, page_token: Option<&str>) -> Result<Value, StoreError> {
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", EMULATOR_AUTH)
            .query("pageSize", &PAGE_SIZE.to_string());
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }

        let response = request.call().map_err(|e| http_error(url, e))?;
        let body = response.into_string()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl DocumentStore for EmulatorStore {
    fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        check_document_id(collection)?;
        let url = self.collection_url(collection);

        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.fetch_page(&url, page_token.as_deref())?;
            let (mut batch, next) = parse_documents_page(&page)?;
            documents.append(&mut batch);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    fn put(&self, collection: &str, id: &str, document: &Document) -> Result<(), StoreError> {
        check_document_id(collection)?;
        check_document_id(id)?;
        let url = format!("{}/{}", self.collection_url(collection), id);
        let body = json!({ "fields": encode_fields(document) }).to_string();

        self.agent
            .request("PATCH", &url)
            .set("Authorization", EMULATOR_AUTH)
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| http_error(&url, e))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "firestore-emulator"
    }
}

/// Split one `documents.list` response into decoded documents and the next page token.
pub fn parse_documents_page(
    page: &Value,
) -> Result<(Vec<StoredDocument>, Option<String>), StoreError> {
    let mut documents = Vec::new();

    if let Some(items) = page.get("documents").and_then(Value::as_array) {
        for item in items {
            let name = item
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Value("document without a name".to_string()))?;
            // Resource names end in .../documents/<collection>/<id>
            let id = name.rsplit('/').next().unwrap_or(name).to_string();

            let fields = match item.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(other) => return Err(StoreError::Value(format!("fields of {id}: {other}"))),
                None => Document::new(),
            };
            documents.push(StoredDocument::new(id, fields));
        }
    }

    let next = page
        .get("nextPageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    Ok((documents, next))
}

fn http_error(url: &str, err: ureq::Error) -> StoreError {
    let message = match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("HTTP {code}: {}", body.trim())
        }
        other => other.to_string(),
    };
    StoreError::Http {
        url: url.to_string(),
        message,
    }
}
