// HTTP implementations of the store and assistant collaborators.
//
// Both attach the shared bearer token to every request. The store client
// reports refreshed tokens through `StoreReply`; the session adopts them.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use sidenote_common::protocol::store::{
    CreateDocumentRequest, RenameDocumentRequest, Route, StoredDocument, TokenEnvelope,
    UpdateDocumentRequest,
};
use sidenote_common::types::DocumentPayload;
use url::Url;

use crate::assist::{tidy_title, AssistError, Completer, Prompt, TitleSuggester};
use crate::store::{DocumentStore, StoreError, StoreReply, StoreResult};
use crate::token::AuthToken;

/// Join relative path segments onto `base`, percent-encoding each one.
fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}

fn authorize(builder: RequestBuilder, token: &AuthToken) -> RequestBuilder {
    match token.get() {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

// ── Document store ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base: Url,
    token: AuthToken,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, token: AuthToken) -> Result<Self, url::ParseError> {
        Ok(Self::with_client(Client::new(), Url::parse(base_url)?, token))
    }

    pub fn with_client(client: Client, base: Url, token: AuthToken) -> Self {
        Self { client, base, token }
    }

    fn request(&self, method: Method, route: Route<'_>) -> Result<RequestBuilder, StoreError> {
        let url = join_segments(&self.base, route.segments()).ok_or_else(|| {
            StoreError::Transport(format!("`{}` cannot be used as a base URL", self.base))
        })?;
        tracing::trace!(%method, %url, "document store request");
        Ok(authorize(self.client.request(method, url), &self.token))
    }

    async fn send(builder: RequestBuilder) -> Result<Response, StoreError> {
        let response =
            builder.send().await.map_err(|error| StoreError::Transport(error.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status { status: status.as_u16(), body })
    }

    async fn send_document(builder: RequestBuilder) -> StoreResult<StoredDocument> {
        let response = Self::send(builder).await?;
        let document: StoredDocument =
            response.json().await.map_err(|error| StoreError::Decode(error.to_string()))?;
        Ok(StoreReply::from_document(document))
    }
}

impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self, folder: &str, id: &str) -> StoreResult<StoredDocument> {
        let builder = self.request(Method::GET, Route::Document { folder, id })?;
        Self::send_document(builder).await
    }

    async fn create(&self, folder: &str, payload: &DocumentPayload) -> StoreResult<StoredDocument> {
        let builder = self
            .request(Method::POST, Route::Documents { folder })?
            .json(&CreateDocumentRequest::from(payload));
        Self::send_document(builder).await
    }

    async fn update(
        &self,
        folder: &str,
        id: &str,
        payload: &DocumentPayload,
    ) -> StoreResult<StoredDocument> {
        let builder = self
            .request(Method::PUT, Route::Document { folder, id })?
            .json(&UpdateDocumentRequest::from(payload));
        Self::send_document(builder).await
    }

    async fn rename(&self, folder: &str, id: &str, name: &str) -> StoreResult<StoredDocument> {
        let body = RenameDocumentRequest { id: id.to_string(), name: name.to_string() };
        let builder = self.request(Method::PUT, Route::Rename { folder, id })?.json(&body);
        Self::send_document(builder).await
    }

    async fn delete(&self, folder: &str, id: &str) -> StoreResult<()> {
        let builder = self.request(Method::DELETE, Route::Document { folder, id })?;
        let response = Self::send(builder).await?;
        let body = response.text().await.map_err(|error| StoreError::Decode(error.to_string()))?;
        // Delete bodies are informational; only a refreshed token matters.
        let envelope = if body.trim().is_empty() {
            TokenEnvelope::default()
        } else {
            serde_json::from_str(&body).unwrap_or_else(|error| {
                tracing::debug!(%error, "ignoring unparseable delete response");
                TokenEnvelope::default()
            })
        };
        Ok(StoreReply::new(()).with_token(envelope.access_token))
    }
}

// ── Assistant ──────────────────────────────────────────────────────

/// `POST {base}/name_topic` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameTopicRequest {
    pub text: String,
}

/// `POST {base}/name_topic` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameTopicResponse {
    #[serde(default)]
    pub name: Option<String>,
}

/// Naming and completion over HTTP. Completions stream back as a plain
/// UTF-8 body from `POST {base}/complete`.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    client: Client,
    base: Url,
    token: AuthToken,
}

impl HttpAssistant {
    pub fn new(base_url: &str, token: AuthToken) -> Result<Self, url::ParseError> {
        Ok(Self { client: Client::new(), base: Url::parse(base_url)?, token })
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Response, AssistError> {
        let url = join_segments(&self.base, [endpoint]).ok_or_else(|| {
            AssistError::Transport(format!("`{}` cannot be used as a base URL", self.base))
        })?;
        let response = authorize(self.client.post(url), &self.token)
            .json(body)
            .send()
            .await
            .map_err(|error| AssistError::Transport(error.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssistError::Status { status: status.as_u16(), body })
    }
}

impl TitleSuggester for HttpAssistant {
    async fn suggest_title(&self, text: &str) -> Result<Option<String>, AssistError> {
        let response = self.post("name_topic", &NameTopicRequest { text: text.to_string() }).await?;
        let reply: NameTopicResponse =
            response.json().await.map_err(|error| AssistError::Decode(error.to_string()))?;
        Ok(reply.name.as_deref().and_then(tidy_title))
    }
}

impl Completer for HttpAssistant {
    async fn complete(
        &self,
        prompt: &Prompt,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AssistError> {
        let mut response = self.post("complete", prompt).await?;
        let mut decoder = Utf8Stream::default();
        let mut text = String::new();
        while let Some(bytes) =
            response.chunk().await.map_err(|error| AssistError::Transport(error.to_string()))?
        {
            let piece = decoder.push(&bytes)?;
            if !piece.is_empty() {
                on_chunk(&piece);
                text.push_str(&piece);
            }
        }
        decoder.finish()?;
        Ok(text)
    }
}

/// Incremental UTF-8 decoding across chunk boundaries.
#[derive(Debug, Default)]
struct Utf8Stream {
    pending: Vec<u8>,
}

impl Utf8Stream {
    /// Decode as much as possible; an incomplete trailing sequence waits
    /// for the next chunk.
    fn push(&mut self, bytes: &[u8]) -> Result<String, AssistError> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(error) if error.error_len().is_none() => error.valid_up_to(),
            Err(error) => return Err(AssistError::Decode(error.to_string())),
        };
        let rest = self.pending.split_off(valid);
        let decoded = String::from_utf8(std::mem::replace(&mut self.pending, rest))
            .map_err(|error| AssistError::Decode(error.to_string()))?;
        Ok(decoded)
    }

    fn finish(self) -> Result<(), AssistError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(AssistError::Decode("completion ended inside a UTF-8 sequence".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_appended_and_escaped() {
        let base = Url::parse("https://notes.example.com/api/").unwrap();
        let url = join_segments(&base, ["notes", "documents", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://notes.example.com/api/notes/documents/a%20b%2Fc");

        let bare = Url::parse("https://notes.example.com").unwrap();
        let url = join_segments(&bare, Route::Rename { folder: "notes", id: "7" }.segments()).unwrap();
        assert_eq!(url.as_str(), "https://notes.example.com/notes/documents/7/rename");
    }

    #[test]
    fn non_base_urls_are_rejected() {
        let url = Url::parse("mailto:someone@example.com").unwrap();
        assert!(join_segments(&url, ["x"]).is_none());
    }

    #[test]
    fn utf8_stream_waits_for_split_sequences() {
        let mut stream = Utf8Stream::default();
        let bytes = "caf\u{e9}!".as_bytes();
        assert_eq!(stream.push(&bytes[..4]).unwrap(), "caf");
        assert_eq!(stream.push(&bytes[4..]).unwrap(), "\u{e9}!");
        stream.finish().unwrap();
    }

    #[test]
    fn utf8_stream_rejects_invalid_bytes() {
        let mut stream = Utf8Stream::default();
        assert!(matches!(stream.push(&[0x61, 0xff, 0x62]), Err(AssistError::Decode(_))));
    }

    #[test]
    fn utf8_stream_reports_truncated_tail() {
        let mut stream = Utf8Stream::default();
        stream.push(&[0xc3]).unwrap();
        assert!(stream.finish().is_err());
    }

    #[test]
    fn name_topic_response_tolerates_missing_name() {
        let reply: NameTopicResponse = serde_json::from_str("{}").unwrap();
        assert!(reply.name.is_none());
    }
}
