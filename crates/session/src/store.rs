// Document store collaborator.
//
// The session never talks to the store directly; the driver runs these
// calls and feeds the results back. `HttpDocumentStore` is the production
// implementation, tests inject in-memory stores.

use std::future::Future;

use sidenote_common::protocol::store::StoredDocument;
use sidenote_common::types::DocumentPayload;
use thiserror::Error;

/// Errors from the document store (network or server side).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unreachable: {0}")]
    Transport(String),

    #[error("document store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("document store response could not be decoded: {0}")]
    Decode(String),

    #[error("document store request was dropped before completing")]
    Dropped,
}

/// A successful store response plus any credential the server rotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReply<T> {
    pub value: T,
    pub access_token: Option<String>,
}

impl<T> StoreReply<T> {
    pub fn new(value: T) -> Self {
        Self { value, access_token: None }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }
}

impl StoreReply<StoredDocument> {
    /// Lift the `access_token` field of a document body into the reply.
    pub fn from_document(mut document: StoredDocument) -> Self {
        let access_token = document.access_token.take();
        Self { value: document, access_token }
    }
}

pub type StoreResult<T> = Result<StoreReply<T>, StoreError>;

/// Abstraction over the remote document store. Trait-based for testability.
///
/// All methods return `Send` futures so the driver can run them as tokio tasks.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch a document by id.
    fn fetch(
        &self,
        folder: &str,
        id: &str,
    ) -> impl Future<Output = StoreResult<StoredDocument>> + Send;

    /// Create a document; the server assigns the id.
    fn create(
        &self,
        folder: &str,
        payload: &DocumentPayload,
    ) -> impl Future<Output = StoreResult<StoredDocument>> + Send;

    /// Replace metadata and content of an existing document.
    fn update(
        &self,
        folder: &str,
        id: &str,
        payload: &DocumentPayload,
    ) -> impl Future<Output = StoreResult<StoredDocument>> + Send;

    /// Change only the name of an existing document.
    fn rename(
        &self,
        folder: &str,
        id: &str,
        name: &str,
    ) -> impl Future<Output = StoreResult<StoredDocument>> + Send;

    /// Delete a document.
    fn delete(&self, folder: &str, id: &str) -> impl Future<Output = StoreResult<()>> + Send;
}
