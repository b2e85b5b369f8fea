// Async host for a `NoteSession`.
//
// The driver owns the session and is its only writer. Effects become tokio
// tasks; every task reports back exactly once over an mpsc channel, even if
// it is dropped or panics, so the session's guards are always released.
// Host notices fan out on a broadcast channel; streamed previews are
// coalesced before they go out.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::assist::{AssistError, Assistant};
use crate::debounce::{DebounceConfig, Debouncer};
use crate::effect::{Completion, Effect, Notice, Outcome, Ticket};
use crate::report::ErrorReporter;
use crate::session::NoteSession;
use crate::store::{DocumentStore, StoreError};

const NOTICE_CAPACITY: usize = 64;

pub struct SessionDriver<S, A> {
    session: NoteSession,
    store: Arc<S>,
    assistant: Arc<A>,
    reporter: Arc<dyn ErrorReporter>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    notices: broadcast::Sender<Notice>,
    /// Spawned tasks that have not delivered their final outcome.
    outstanding: usize,
    previews: Debouncer<Ticket, String>,
}

impl<S: DocumentStore, A: Assistant> SessionDriver<S, A> {
    pub fn new(
        session: NoteSession,
        store: Arc<S>,
        assistant: Arc<A>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            session,
            store,
            assistant,
            reporter,
            completions_tx,
            completions_rx,
            notices,
            outstanding: 0,
            previews: Debouncer::new(DebounceConfig::default()),
        }
    }

    /// Window for coalescing streamed previews (clamped to 50–500ms).
    pub fn with_preview_window(mut self, millis: u64) -> Self {
        self.previews = Debouncer::new(DebounceConfig::with_millis(millis));
        self
    }

    pub fn session(&self) -> &NoteSession {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Nothing in flight and no preview waiting.
    pub fn is_idle(&self) -> bool {
        self.outstanding == 0 && self.previews.pending_count() == 0
    }

    /// Run a session operation and dispatch whatever it queued.
    pub fn with_session<R>(&mut self, f: impl FnOnce(&mut NoteSession) -> R) -> R {
        let result = f(&mut self.session);
        self.dispatch();
        result
    }

    /// Handle the next completion or preview deadline. Returns false when
    /// there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }

        let deadline = self.previews.next_deadline();
        let preview_due = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            Some(completion) = self.completions_rx.recv(), if self.outstanding > 0 => {
                self.apply(completion);
            }
            () = preview_due => {
                if let Some(at) = deadline {
                    for (ticket, text) in self.previews.drain_ready_at(at) {
                        self.publish(Notice::Preview { ticket, text });
                    }
                }
            }
        }
        true
    }

    /// Drive until every request has settled.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Publish pending previews now.
    pub fn flush_previews(&mut self) {
        for (ticket, text) in self.previews.flush() {
            self.publish(Notice::Preview { ticket, text });
        }
    }

    pub fn into_session(self) -> NoteSession {
        self.session
    }

    fn apply(&mut self, completion: Completion) {
        match completion.outcome {
            Outcome::Chunk(_) => {}
            Outcome::Completed(_) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.previews.cancel(&completion.ticket);
            }
            _ => self.outstanding = self.outstanding.saturating_sub(1),
        }
        tracing::trace!(ticket = %completion.ticket, outstanding = self.outstanding, "completion");
        self.session.complete(completion);
        self.dispatch();
    }

    fn dispatch(&mut self) {
        for effect in self.session.take_effects() {
            match effect {
                Effect::Report(report) => self.reporter.report(&report),
                Effect::Notify(Notice::Preview { ticket, text }) => self.previews.push(ticket, text),
                Effect::Notify(notice) => self.publish(notice),
                effect => self.spawn(effect),
            }
        }
    }

    fn publish(&self, notice: Notice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    fn spawn(&mut self, effect: Effect) {
        let Some(ticket) = effect.ticket() else {
            return;
        };
        self.outstanding += 1;
        tracing::debug!(%ticket, kind = effect.kind(), "spawning request");
        let store = Arc::clone(&self.store);
        let assistant = Arc::clone(&self.assistant);
        let tx = self.completions_tx.clone();
        tokio::spawn(run_effect(effect, ticket, store, assistant, tx));
    }
}

/// Sends a fallback outcome if the task ends without reporting.
struct CompletionGuard {
    tx: mpsc::UnboundedSender<Completion>,
    ticket: Ticket,
    fallback: Option<Outcome>,
}

impl CompletionGuard {
    fn new(tx: mpsc::UnboundedSender<Completion>, ticket: Ticket, fallback: Outcome) -> Self {
        Self { tx, ticket, fallback: Some(fallback) }
    }

    fn finish(mut self, outcome: Outcome) {
        self.fallback = None;
        let _ = self.tx.send(Completion::new(self.ticket, outcome));
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(outcome) = self.fallback.take() {
            tracing::warn!(ticket = %self.ticket, "request task ended without a result");
            let _ = self.tx.send(Completion::new(self.ticket, outcome));
        }
    }
}

async fn run_effect<S: DocumentStore, A: Assistant>(
    effect: Effect,
    ticket: Ticket,
    store: Arc<S>,
    assistant: Arc<A>,
    tx: mpsc::UnboundedSender<Completion>,
) {
    match effect {
        Effect::Load { folder, id, .. } => {
            let guard = CompletionGuard::new(tx, ticket, Outcome::Loaded(Err(StoreError::Dropped)));
            guard.finish(Outcome::Loaded(store.fetch(&folder, &id).await));
        }
        Effect::Create { folder, payload, .. } => {
            let guard = CompletionGuard::new(tx, ticket, Outcome::Created(Err(StoreError::Dropped)));
            guard.finish(Outcome::Created(store.create(&folder, &payload).await));
        }
        Effect::Update { folder, id, payload, .. } => {
            let guard = CompletionGuard::new(tx, ticket, Outcome::Updated(Err(StoreError::Dropped)));
            guard.finish(Outcome::Updated(store.update(&folder, &id, &payload).await));
        }
        Effect::Rename { folder, id, name, .. } => {
            let guard = CompletionGuard::new(tx, ticket, Outcome::Renamed(Err(StoreError::Dropped)));
            guard.finish(Outcome::Renamed(store.rename(&folder, &id, &name).await));
        }
        Effect::Delete { folder, id, name, .. } => {
            let fallback = Outcome::Deleted {
                id: id.clone(),
                name: name.clone(),
                result: Err(StoreError::Dropped),
            };
            let guard = CompletionGuard::new(tx, ticket, fallback);
            let result = store.delete(&folder, &id).await;
            guard.finish(Outcome::Deleted { id, name, result });
        }
        Effect::SuggestTitle { text, .. } => {
            let guard =
                CompletionGuard::new(tx, ticket, Outcome::TitleSuggested(Err(AssistError::Dropped)));
            guard.finish(Outcome::TitleSuggested(assistant.suggest_title(&text).await));
        }
        Effect::Complete { prompt, .. } => {
            let chunks = tx.clone();
            let guard = CompletionGuard::new(tx, ticket, Outcome::Completed(Err(AssistError::Dropped)));
            let on_chunk = move |text: &str| {
                let _ = chunks.send(Completion::new(ticket, Outcome::Chunk(text.to_string())));
            };
            guard.finish(Outcome::Completed(assistant.complete(&prompt, &on_chunk).await));
        }
        Effect::Report(_) | Effect::Notify(_) => {}
    }
}
