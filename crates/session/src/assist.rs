// AI collaborators: title suggestion and text completion.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A completion request: fixed system instruction plus the user prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assistant unreachable: {0}")]
    Transport(String),

    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("assistant response could not be decoded: {0}")]
    Decode(String),

    #[error("no assistant is configured")]
    Unavailable,

    #[error("assistant request was dropped before completing")]
    Dropped,
}

/// Suggests a short title for a body of text.
pub trait TitleSuggester: Send + Sync + 'static {
    /// `Ok(None)` means the collaborator had no suggestion.
    fn suggest_title(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Option<String>, AssistError>> + Send;
}

/// Produces a continuation for a prompt, streaming partial text as it goes.
pub trait Completer: Send + Sync + 'static {
    fn complete(
        &self,
        prompt: &Prompt,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> impl Future<Output = Result<String, AssistError>> + Send;
}

/// Both collaborators behind one handle.
pub trait Assistant: TitleSuggester + Completer {}

impl<T: TitleSuggester + Completer> Assistant for T {}

/// Stand-in when no assistant is configured: never names, never completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssistant;

impl TitleSuggester for NoAssistant {
    async fn suggest_title(&self, _text: &str) -> Result<Option<String>, AssistError> {
        Ok(None)
    }
}

impl Completer for NoAssistant {
    async fn complete(
        &self,
        _prompt: &Prompt,
        _on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AssistError> {
        Err(AssistError::Unavailable)
    }
}

/// Clean up a raw title suggestion. Blank suggestions become `None`.
pub fn tidy_title(raw: &str) -> Option<String> {
    let title = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_title_strips_quotes_and_whitespace() {
        assert_eq!(tidy_title("  \"Grocery run\"\n").as_deref(), Some("Grocery run"));
        assert_eq!(tidy_title("'Plans'").as_deref(), Some("Plans"));
        assert_eq!(tidy_title("Plain").as_deref(), Some("Plain"));
    }

    #[test]
    fn tidy_title_rejects_blank() {
        assert_eq!(tidy_title(""), None);
        assert_eq!(tidy_title("  \"\"  "), None);
    }

    #[tokio::test]
    async fn no_assistant_declines_politely() {
        assert!(NoAssistant.suggest_title("text").await.unwrap().is_none());
        let prompt = Prompt { system: String::new(), user: String::new() };
        let error = NoAssistant.complete(&prompt, &|_| {}).await.unwrap_err();
        assert!(matches!(error, AssistError::Unavailable));
    }
}
