// Commands a session asks its host to run, and the results that come back.
//
// The session is sans-IO: operations queue `Effect`s, the driver executes
// them, and each finished request returns as a `Completion` carrying the
// `Ticket` it was issued under.

use serde::Serialize;
use sidenote_common::protocol::store::StoredDocument;
use sidenote_common::types::DocumentPayload;

use crate::assist::{AssistError, Prompt};
use crate::report::Report;
use crate::store::StoreResult;

/// Identity of one request. The epoch changes whenever the session resets,
/// so a response for a previous note is recognisable by its epoch alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticket {
    pub epoch: u64,
    pub seq: u64,
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.epoch, self.seq)
    }
}

/// What prompted a save attempt. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Edit,
    Metadata,
    Blur,
    Hidden,
    Hotkey,
    Close,
    Rename,
    Append,
    Import,
    AiMerge,
    Deferred,
}

impl SaveTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Metadata => "metadata",
            Self::Blur => "blur",
            Self::Hidden => "hidden",
            Self::Hotkey => "hotkey",
            Self::Close => "close",
            Self::Rename => "rename",
            Self::Append => "append",
            Self::Import => "import",
            Self::AiMerge => "ai_merge",
            Self::Deferred => "deferred",
        }
    }
}

/// Host-facing notifications about the note's server-side lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    Opened { id: String, name: String },
    Created { id: String, name: String },
    Saved { id: String, name: String },
    Renamed { id: String, name: String },
    Deleted { id: String, name: String },
    /// Streaming completion text so far.
    Preview { ticket: Ticket, text: String },
}

/// Work the session wants done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Load { ticket: Ticket, folder: String, id: String },
    Create { ticket: Ticket, folder: String, payload: DocumentPayload },
    Update { ticket: Ticket, folder: String, id: String, payload: DocumentPayload },
    Rename { ticket: Ticket, folder: String, id: String, name: String },
    Delete { ticket: Ticket, folder: String, id: String, name: String },
    SuggestTitle { ticket: Ticket, text: String },
    Complete { ticket: Ticket, prompt: Prompt },
    Report(Report),
    Notify(Notice),
}

impl Effect {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Effect::Load { ticket, .. }
            | Effect::Create { ticket, .. }
            | Effect::Update { ticket, .. }
            | Effect::Rename { ticket, .. }
            | Effect::Delete { ticket, .. }
            | Effect::SuggestTitle { ticket, .. }
            | Effect::Complete { ticket, .. } => Some(*ticket),
            Effect::Report(_) | Effect::Notify(_) => None,
        }
    }

    /// Requests that go through the single-flight gate.
    pub fn is_gated(&self) -> bool {
        matches!(
            self,
            Effect::Load { .. } | Effect::Create { .. } | Effect::Update { .. } | Effect::Rename { .. }
        )
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Load { .. } => "load",
            Effect::Create { .. } => "create",
            Effect::Update { .. } => "update",
            Effect::Rename { .. } => "rename",
            Effect::Delete { .. } => "delete",
            Effect::SuggestTitle { .. } => "suggest_title",
            Effect::Complete { .. } => "complete",
            Effect::Report(_) => "report",
            Effect::Notify(_) => "notify",
        }
    }
}

/// Result of an executed effect.
#[derive(Debug)]
pub enum Outcome {
    Loaded(StoreResult<StoredDocument>),
    Created(StoreResult<StoredDocument>),
    Updated(StoreResult<StoredDocument>),
    Renamed(StoreResult<StoredDocument>),
    Deleted { id: String, name: String, result: StoreResult<()> },
    TitleSuggested(Result<Option<String>, AssistError>),
    /// A streamed fragment of an outstanding completion.
    Chunk(String),
    Completed(Result<String, AssistError>),
}

impl Outcome {
    /// Replacement credential carried by a successful store response.
    pub fn refreshed_token(&self) -> Option<&str> {
        match self {
            Outcome::Loaded(Ok(reply))
            | Outcome::Created(Ok(reply))
            | Outcome::Updated(Ok(reply))
            | Outcome::Renamed(Ok(reply)) => reply.access_token.as_deref(),
            Outcome::Deleted { result: Ok(reply), .. } => reply.access_token.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub outcome: Outcome,
}

impl Completion {
    pub fn new(ticket: Ticket, outcome: Outcome) -> Self {
        Self { ticket, outcome }
    }
}
