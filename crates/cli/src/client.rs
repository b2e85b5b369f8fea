// Session plumbing shared by every command.
//
// A command drives one `NoteSession` against the configured document store
// and assistant. Each step is run to rest before the next one starts, and
// anything the session reported is surfaced as an error.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Context};
use sidenote_session::assist::{AssistError, Completer, NoAssistant, Prompt, TitleSuggester};
use sidenote_session::config::config_path;
use sidenote_session::http::{HttpAssistant, HttpDocumentStore};
use sidenote_session::report::{ErrorReporter, Report};
use sidenote_session::{AuthToken, ClientConfig, NoteSession, Notice, SessionDriver};
use tokio::sync::broadcast;

// ── Collaborators ──────────────────────────────────────────────────

/// HTTP assistant when `assistant_url` is configured, otherwise none.
pub enum AssistantClient {
    Http(HttpAssistant),
    Disabled(NoAssistant),
}

impl TitleSuggester for AssistantClient {
    async fn suggest_title(&self, text: &str) -> Result<Option<String>, AssistError> {
        match self {
            Self::Http(assistant) => assistant.suggest_title(text).await,
            Self::Disabled(assistant) => assistant.suggest_title(text).await,
        }
    }
}

impl Completer for AssistantClient {
    async fn complete(
        &self,
        prompt: &Prompt,
        on_chunk: &(dyn Fn(&str) + Send + Sync),
    ) -> Result<String, AssistError> {
        match self {
            Self::Http(assistant) => assistant.complete(prompt, on_chunk).await,
            Self::Disabled(assistant) => assistant.complete(prompt, on_chunk).await,
        }
    }
}

/// Keeps reports so the command can fail once the session is at rest.
#[derive(Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<Report>>,
}

impl CollectingReporter {
    fn lock(&self) -> MutexGuard<'_, Vec<Report>> {
        match self.reports.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *self.lock())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, report: &Report) {
        tracing::debug!(error = %report.error, context = %report.context, "{}", report.message);
        self.lock().push(report.clone());
    }
}

/// A failure the session reported while a command was running.
#[derive(Debug)]
pub struct SessionFailure {
    pub report: Report,
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.report.message, self.report.error, self.report.context)
    }
}

impl std::error::Error for SessionFailure {}

// ── Client ─────────────────────────────────────────────────────────

pub struct NoteClient {
    driver: SessionDriver<HttpDocumentStore, AssistantClient>,
    reporter: Arc<CollectingReporter>,
    token: AuthToken,
    /// Last token known to be on disk (or supplied by the environment).
    saved_token: Option<String>,
}

impl NoteClient {
    pub fn connect(config: &ClientConfig) -> anyhow::Result<Self> {
        let token = AuthToken::new(config.access_token.clone());
        let store = HttpDocumentStore::new(&config.store_url, token.clone())
            .with_context(|| format!("invalid store_url `{}`", config.store_url))?;
        let assistant = match &config.assistant_url {
            Some(url) => AssistantClient::Http(
                HttpAssistant::new(url, token.clone())
                    .with_context(|| format!("invalid assistant_url `{url}`"))?,
            ),
            None => AssistantClient::Disabled(NoAssistant),
        };

        let reporter = Arc::new(CollectingReporter::default());
        let session = NoteSession::new(config.session_config(), token.clone());
        let driver = SessionDriver::new(session, Arc::new(store), Arc::new(assistant), reporter.clone())
            .with_preview_window(config.session.preview_debounce_ms);

        Ok(Self { driver, reporter, token, saved_token: config.access_token.clone() })
    }

    pub fn session(&self) -> &NoteSession {
        self.driver.session()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.driver.subscribe()
    }

    /// Apply one session operation and wait for everything it started.
    pub async fn run<R>(&mut self, operation: impl FnOnce(&mut NoteSession) -> R) -> anyhow::Result<R> {
        let result = self.driver.with_session(operation);
        self.driver.settle().await;
        self.persist_token()?;
        if let Some(report) = self.reporter.take().into_iter().next() {
            return Err(SessionFailure { report }.into());
        }
        Ok(result)
    }

    /// Load `id` into the session.
    pub async fn open(&mut self, id: &str) -> anyhow::Result<()> {
        self.run(|session| session.open(id)).await?;
        if self.session().id() != id {
            bail!("note `{id}` could not be loaded");
        }
        Ok(())
    }

    fn persist_token(&mut self) -> anyhow::Result<()> {
        let current = self.token.get();
        if current.is_none() || current == self.saved_token {
            return Ok(());
        }
        let Some(path) = config_path() else {
            tracing::warn!("no home directory; refreshed access token not persisted");
            return Ok(());
        };
        if let Some(token) = current.as_deref() {
            persist_token_to(&path, token)?;
        }
        self.saved_token = current;
        Ok(())
    }
}

/// Write `token` into the config file at `path`, leaving everything else
/// (and anything the environment overrode) as it is on disk.
pub fn persist_token_to(path: &Path, token: &str) -> anyhow::Result<()> {
    let mut on_disk = if path.exists() {
        ClientConfig::load_from(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        ClientConfig::default()
    };
    on_disk.access_token = Some(token.to_string());
    on_disk
        .save_to(path)
        .with_context(|| format!("failed to persist refreshed access token to {}", path.display()))?;
    tracing::info!(path = %path.display(), "persisted refreshed access token");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn persist_token_keeps_other_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = ClientConfig {
            store_url: "https://notes.example.com".into(),
            folder: "journal".into(),
            access_token: Some("old".into()),
            ..ClientConfig::default()
        };
        config.save_to(&path).unwrap();

        persist_token_to(&path, "new").unwrap();

        let reloaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.access_token.as_deref(), Some("new"));
        assert_eq!(reloaded.store_url, "https://notes.example.com");
        assert_eq!(reloaded.folder, "journal");
    }

    #[test]
    fn persist_token_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        persist_token_to(&path, "fresh").unwrap();
        let reloaded = ClientConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.access_token.as_deref(), Some("fresh"));
    }

    #[test]
    fn collecting_reporter_drains() {
        let reporter = CollectingReporter::default();
        let error = std::io::Error::other("boom");
        reporter.report(&Report::new("Error saving note", &error, "notes/documents/7 PUT"));
        assert_eq!(reporter.take().len(), 1);
        assert!(reporter.take().is_empty());
    }

    #[test]
    fn session_failure_renders_all_parts() {
        let error = std::io::Error::other("HTTP 404");
        let failure = SessionFailure {
            report: Report::new("Error loading note", &error, "notes/documents/7 GET"),
        };
        assert_eq!(failure.to_string(), "Error loading note: HTTP 404 (notes/documents/7 GET)");
    }

    #[test]
    fn connect_rejects_bad_urls() {
        let config = ClientConfig { store_url: "not a url".into(), ..ClientConfig::default() };
        assert!(NoteClient::connect(&config).is_err());
    }

    #[tokio::test]
    async fn disabled_assistant_never_names() {
        let assistant = AssistantClient::Disabled(NoAssistant);
        assert_eq!(assistant.suggest_title("anything").await.unwrap(), None);
        let prompt = Prompt { system: String::new(), user: "go".into() };
        assert!(matches!(
            assistant.complete(&prompt, &|_: &str| {}).await,
            Err(AssistError::Unavailable)
        ));
    }
}
