// Document store REST wire format.
//
//   GET    {base}/{folder}/documents/{id}          -> StoredDocument
//   POST   {base}/{folder}/documents               CreateDocumentRequest -> StoredDocument
//   PUT    {base}/{folder}/documents/{id}          UpdateDocumentRequest -> StoredDocument
//   PUT    {base}/{folder}/documents/{id}/rename   RenameDocumentRequest -> StoredDocument
//   DELETE {base}/{folder}/documents/{id}          -> TokenEnvelope
//
// Any response body may carry a replacement `access_token`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DocumentPayload, DocumentProperties, DocumentRecord};

// ── Bodies ─────────────────────────────────────────────────────────

/// Note body wrapper: `{"note": "..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteContent {
    #[serde(default)]
    pub note: String,
}

/// Metadata block returned with every stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: DocumentProperties,
}

/// A document as the store returns it from get, create, update and rename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDocument {
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub content: NoteContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl StoredDocument {
    pub fn payload(&self) -> DocumentPayload {
        DocumentPayload {
            name: self.metadata.name.clone(),
            content: self.content.note.clone(),
            tags: self.metadata.tags.clone(),
            properties: self.metadata.properties,
        }
    }

    pub fn into_record(self, folder: impl Into<String>) -> DocumentRecord {
        DocumentRecord {
            id: self.metadata.id,
            name: self.metadata.name,
            content: self.content.note,
            tags: self.metadata.tags,
            properties: self.metadata.properties,
            folder: folder.into(),
        }
    }
}

/// `POST {folder}/documents` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub tags: BTreeSet<String>,
    pub properties: DocumentProperties,
    pub content: NoteContent,
}

impl From<&DocumentPayload> for CreateDocumentRequest {
    fn from(payload: &DocumentPayload) -> Self {
        Self {
            name: payload.name.clone(),
            tags: payload.tags.clone(),
            properties: payload.properties,
            content: NoteContent { note: payload.content.clone() },
        }
    }
}

/// Metadata half of an update body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub name: String,
    pub tags: BTreeSet<String>,
    pub properties: DocumentProperties,
}

/// `PUT {folder}/documents/{id}` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateDocumentRequest {
    pub metadata: MetadataUpdate,
    pub content: NoteContent,
}

impl From<&DocumentPayload> for UpdateDocumentRequest {
    fn from(payload: &DocumentPayload) -> Self {
        Self {
            metadata: MetadataUpdate {
                name: payload.name.clone(),
                tags: payload.tags.clone(),
                properties: payload.properties,
            },
            content: NoteContent { note: payload.content.clone() },
        }
    }
}

/// `PUT {folder}/documents/{id}/rename` body. Content is untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameDocumentRequest {
    pub id: String,
    pub name: String,
}

/// Responses whose only interesting field is a refreshed credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenEnvelope {
    #[serde(default)]
    pub access_token: Option<String>,
}

// ── Routes ─────────────────────────────────────────────────────────

/// A document store endpoint, relative to the store base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Documents { folder: &'a str },
    Document { folder: &'a str, id: &'a str },
    Rename { folder: &'a str, id: &'a str },
}

impl<'a> Route<'a> {
    /// Path segments, unescaped. Callers percent-encode when joining.
    pub fn segments(&self) -> Vec<&'a str> {
        match *self {
            Route::Documents { folder } => vec![folder, "documents"],
            Route::Document { folder, id } => vec![folder, "documents", id],
            Route::Rename { folder, id } => vec![folder, "documents", id, "rename"],
        }
    }
}

impl fmt::Display for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> DocumentPayload {
        let mut payload = DocumentPayload {
            name: "Groceries".into(),
            content: "Buy milk".into(),
            ..DocumentPayload::default()
        };
        payload.tags.insert("home".into());
        payload.properties.starred = true;
        payload
    }

    #[test]
    fn create_body_matches_store_shape() {
        let body = serde_json::to_value(CreateDocumentRequest::from(&payload())).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Groceries",
                "tags": ["home"],
                "properties": { "bookmarked": false, "starred": true, "inAILibrary": false },
                "content": { "note": "Buy milk" }
            })
        );
    }

    #[test]
    fn update_body_nests_metadata() {
        let body = serde_json::to_value(UpdateDocumentRequest::from(&payload())).unwrap();
        assert_eq!(body["metadata"]["name"], "Groceries");
        assert_eq!(body["metadata"]["properties"]["starred"], true);
        assert_eq!(body["content"]["note"], "Buy milk");
        assert!(body.get("name").is_none());
    }

    #[test]
    fn stored_document_tolerates_sparse_metadata() {
        let doc: StoredDocument = serde_json::from_value(json!({
            "metadata": { "id": "7", "name": "Plans" },
            "content": { "note": "draft" }
        }))
        .unwrap();
        assert_eq!(doc.metadata.id, "7");
        assert!(doc.metadata.tags.is_empty());
        assert!(!doc.metadata.properties.starred);
        assert!(doc.access_token.is_none());

        let record = doc.into_record("notes");
        assert_eq!(record.id, "7");
        assert_eq!(record.content, "draft");
        assert_eq!(record.folder, "notes");
    }

    #[test]
    fn stored_document_carries_refreshed_token() {
        let doc: StoredDocument = serde_json::from_value(json!({
            "metadata": { "id": "7", "name": "Plans", "tags": ["a", "b"] },
            "content": { "note": "" },
            "access_token": "fresh"
        }))
        .unwrap();
        assert_eq!(doc.access_token.as_deref(), Some("fresh"));
        assert_eq!(doc.payload().tags.len(), 2);
    }

    #[test]
    fn routes_render_relative_paths() {
        assert_eq!(Route::Documents { folder: "notes" }.to_string(), "notes/documents");
        assert_eq!(Route::Document { folder: "notes", id: "7" }.to_string(), "notes/documents/7");
        assert_eq!(
            Route::Rename { folder: "notes", id: "7" }.segments(),
            vec!["notes", "documents", "7", "rename"]
        );
    }

    #[test]
    fn token_envelope_ignores_other_fields() {
        let envelope: TokenEnvelope =
            serde_json::from_value(json!({ "success": true, "access_token": "t2" })).unwrap();
        assert_eq!(envelope.access_token.as_deref(), Some("t2"));

        let empty: TokenEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(empty.access_token.is_none());
    }
}
