// Controller for one open note.
//
// `NoteSession` owns the record, its status and the naming/merge guards.
// It performs no I/O: operations queue `Effect`s and the host feeds each
// result back through `complete`. Everything that mutates the note happens
// in these methods, so a single owner serializes all state changes.

use std::collections::BTreeSet;

use sidenote_common::protocol::store::{Route, StoredDocument};
use sidenote_common::types::{DocumentRecord, Property};

use crate::assist::{tidy_title, AssistError};
use crate::autoname::{AutoNamer, NamingVerdict};
use crate::change::{ChangeDetector, EditKind};
use crate::config::SessionConfig;
use crate::effect::{Completion, Effect, Notice, Outcome, SaveTrigger, Ticket};
use crate::merge::{append_capture, build_prompt, merge_continuation};
use crate::report::Report;
use crate::scheduler::{plan_save, RequestKind, SavePlan, SaveScheduler};
use crate::status::SessionStatus;
use crate::store::StoreResult;
use crate::token::AuthToken;

pub struct NoteSession {
    config: SessionConfig,
    record: DocumentRecord,
    /// Last name the user or the namer settled on; blank renames revert here.
    committed_name: String,
    status: SessionStatus,
    detector: ChangeDetector,
    namer: AutoNamer,
    scheduler: SaveScheduler,
    token: AuthToken,
    /// Outstanding completion; input is disabled while set.
    completion: Option<Ticket>,
    preview: String,
    /// Content came from a quick capture and the note has not been created yet.
    captured: bool,
    effects: Vec<Effect>,
}

impl NoteSession {
    pub fn new(config: SessionConfig, token: AuthToken) -> Self {
        let record = DocumentRecord::blank(&config.folder, &config.unnamed_name);
        Self {
            committed_name: config.unnamed_name.clone(),
            detector: ChangeDetector::new(config.autoname_threshold),
            config,
            record,
            status: SessionStatus::Idle,
            namer: AutoNamer::new(),
            scheduler: SaveScheduler::new(),
            token,
            completion: None,
            preview: String::new(),
            captured: false,
            effects: Vec::new(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn record(&self) -> &DocumentRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn content(&self) -> &str {
        &self.record.content
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    pub fn is_unnamed(&self) -> bool {
        self.record.name == self.config.unnamed_name
    }

    /// False while a completion is outstanding.
    pub fn input_enabled(&self) -> bool {
        self.completion.is_none()
    }

    pub fn is_naming(&self) -> bool {
        self.namer.is_running()
    }

    /// Streamed completion text received so far.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Drain queued effects in the order they were issued.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Open an existing note. Local state is replaced immediately; the
    /// content arrives with the load.
    pub fn open(&mut self, id: &str) {
        self.reset(false);
        if id.is_empty() {
            return;
        }
        self.record.id = id.to_string();
        let Some(ticket) = self.scheduler.begin(RequestKind::Load, None) else {
            return;
        };
        self.status = SessionStatus::Loading;
        tracing::debug!(%ticket, id, "loading note");
        self.effects.push(Effect::Load {
            ticket,
            folder: self.config.folder.clone(),
            id: id.to_string(),
        });
    }

    /// Start over with a blank, unsaved note.
    pub fn new_note(&mut self) {
        self.reset(false);
    }

    /// Persist what can be persisted, then reset.
    pub fn close(&mut self) {
        self.request_save(SaveTrigger::Close);
        self.reset(false);
    }

    /// Delete the note on the server (if it exists there) and reset at once.
    /// The outcome of the delete never touches the new session state.
    pub fn delete(&mut self) {
        if self.record.is_persisted() {
            let ticket = self.scheduler.ticket();
            tracing::info!(%ticket, id = %self.record.id, "deleting note");
            self.effects.push(Effect::Delete {
                ticket,
                folder: self.config.folder.clone(),
                id: self.record.id.clone(),
                name: self.record.name.clone(),
            });
        }
        self.reset(true);
    }

    fn reset(&mut self, orphan_create: bool) {
        self.scheduler.reset(orphan_create);
        self.record = DocumentRecord::blank(&self.config.folder, &self.config.unnamed_name);
        self.committed_name = self.config.unnamed_name.clone();
        self.status = SessionStatus::Idle;
        self.detector.reset();
        self.namer.reset();
        self.completion = None;
        self.preview.clear();
        self.captured = false;
    }

    // ── Editing ────────────────────────────────────────────────────

    /// A user edit replaced the body. Returns false if it was ignored.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        if self.status == SessionStatus::Loading {
            tracing::debug!("edit ignored while loading");
            return false;
        }
        let content = content.into();
        if content == self.record.content {
            return false;
        }
        self.record.content = content;
        self.status = self.status.mark_changed();

        match self.detector.observe_edit(self.record.content_len()) {
            EditKind::First => self.save(SaveTrigger::Edit, false),
            EditKind::Subsequent { crossed_threshold: true } => self.consider_naming("length"),
            EditKind::Subsequent { crossed_threshold: false } => {}
        }
        true
    }

    /// Enter/newline key in the editor.
    pub fn press_enter(&mut self) {
        self.consider_naming("newline");
    }

    /// Quick capture: append a trimmed line to the body.
    pub fn append(&mut self, text: &str) -> bool {
        if self.status == SessionStatus::Loading {
            return false;
        }
        let Some(merged) = append_capture(&self.record.content, text) else {
            return false;
        };
        self.captured = !self.record.is_persisted();
        self.assign_content(merged, SaveTrigger::Append);
        true
    }

    /// Upload: replace the body wholesale.
    pub fn import_text(&mut self, text: impl Into<String>) -> bool {
        if self.status == SessionStatus::Loading {
            return false;
        }
        self.assign_content(text.into(), SaveTrigger::Import);
        true
    }

    fn assign_content(&mut self, content: String, trigger: SaveTrigger) {
        self.record.content = content;
        self.detector.instantiate();
        self.status = self.status.mark_changed();
        self.save(trigger, true);
    }

    // ── Metadata ───────────────────────────────────────────────────

    pub fn set_tags(&mut self, tags: impl IntoIterator<Item = String>) -> bool {
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        if !self.metadata_editable() || tags == self.record.tags {
            return false;
        }
        self.record.tags = tags;
        self.metadata_changed();
        true
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || !self.metadata_editable() || !self.record.tags.insert(tag.to_string())
        {
            return false;
        }
        self.metadata_changed();
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        if !self.metadata_editable() || !self.record.tags.remove(tag.trim()) {
            return false;
        }
        self.metadata_changed();
        true
    }

    pub fn set_property(&mut self, property: Property, value: bool) -> bool {
        if !self.metadata_editable() || self.record.properties.get(property) == value {
            return false;
        }
        self.record.properties.set(property, value);
        self.metadata_changed();
        true
    }

    pub fn toggle_property(&mut self, property: Property) -> bool {
        let value = !self.record.properties.get(property);
        self.set_property(property, value)
    }

    fn metadata_editable(&self) -> bool {
        self.status != SessionStatus::Loading
    }

    /// Toggles skip the first-edit gate and save straight away.
    fn metadata_changed(&mut self) {
        self.status = self.status.mark_changed();
        self.save(SaveTrigger::Metadata, false);
    }

    // ── Naming ─────────────────────────────────────────────────────

    /// Commit a name typed by the user. Blank or unchanged names revert to
    /// the last committed name. Returns true if a new name was committed.
    pub fn rename(&mut self, name: &str) -> bool {
        if self.status == SessionStatus::Loading {
            return false;
        }
        let name = name.trim();
        if name.is_empty() || name == self.committed_name {
            self.record.name = self.committed_name.clone();
            return false;
        }
        self.commit_name(name.to_string());
        true
    }

    /// Ask the naming collaborator for a title even if the note is named.
    pub fn suggest_name(&mut self) -> bool {
        if self.status == SessionStatus::Loading {
            return false;
        }
        let verdict = self.namer.check_manual(&self.record.content);
        self.start_naming(verdict, true, "manual")
    }

    fn consider_naming(&mut self, reason: &'static str) {
        let verdict = self.namer.check(&self.record.name, &self.config.unnamed_name, &self.record.content);
        self.start_naming(verdict, false, reason);
    }

    fn start_naming(&mut self, verdict: NamingVerdict, manual: bool, reason: &'static str) -> bool {
        if verdict != NamingVerdict::Fire {
            tracing::trace!(?verdict, reason, "naming skipped");
            return false;
        }
        let ticket = self.scheduler.ticket();
        self.namer.start(ticket, manual);
        tracing::debug!(%ticket, reason, "requesting title");
        self.effects.push(Effect::SuggestTitle { ticket, text: self.record.content.clone() });
        true
    }

    fn commit_name(&mut self, name: String) {
        self.record.name = name.clone();
        self.committed_name = name;
        self.status = self.status.mark_changed();

        if self.status.is_busy() {
            // Lands as a full update once the current request settles.
            self.scheduler.defer_forced_save();
            return;
        }
        if !self.record.is_persisted() {
            self.save(SaveTrigger::Rename, false);
            return;
        }

        let mut sent = self.scheduler.persisted().cloned().unwrap_or_else(|| self.record.payload());
        sent.name = self.record.name.clone();
        let Some(ticket) = self.scheduler.begin(RequestKind::Rename, Some(sent)) else {
            return;
        };
        self.status = SessionStatus::Saving;
        tracing::debug!(%ticket, id = %self.record.id, name = %self.record.name, "renaming note");
        self.effects.push(Effect::Rename {
            ticket,
            folder: self.config.folder.clone(),
            id: self.record.id.clone(),
            name: self.record.name.clone(),
        });
    }

    // ── AI completion ──────────────────────────────────────────────

    /// Ask for a continuation of the body. Refused while another completion
    /// is outstanding or the request is blank.
    pub fn ask(&mut self, request: &str) -> bool {
        if !self.input_enabled() || request.trim().is_empty() {
            return false;
        }
        if self.status == SessionStatus::Loading {
            return false;
        }
        let title = (!self.is_unnamed()).then_some(self.record.name.as_str());
        let prompt = build_prompt(title, &self.record.content, request.trim());
        let ticket = self.scheduler.ticket();
        self.completion = Some(ticket);
        self.preview.clear();
        tracing::debug!(%ticket, "requesting completion");
        self.effects.push(Effect::Complete { ticket, prompt });
        true
    }

    fn merge_completion(&mut self, continuation: &str) {
        let Some(merged) = merge_continuation(&self.record.content, continuation) else {
            tracing::debug!("empty completion ignored");
            return;
        };
        self.record.content = merged;
        self.detector.instantiate();
        self.status = self.status.mark_changed();
        self.consider_naming("ai_merge");
        self.save(SaveTrigger::AiMerge, true);
    }

    // ── Saving ─────────────────────────────────────────────────────

    /// External save trigger (blur, hidden, hotkey, ...).
    pub fn request_save(&mut self, trigger: SaveTrigger) {
        self.save(trigger, false);
    }

    fn save(&mut self, trigger: SaveTrigger, forced: bool) {
        let plan = plan_save(self.status, &self.record, &self.config.unnamed_name, forced);
        match plan {
            SavePlan::Busy => {
                if forced {
                    self.scheduler.defer_forced_save();
                }
                tracing::debug!(trigger = trigger.as_str(), status = %self.status, forced, "save dropped: request in flight");
            }
            SavePlan::NothingToCreate | SavePlan::Clean => {
                tracing::trace!(trigger = trigger.as_str(), ?plan, "nothing to save");
            }
            SavePlan::Create => {
                let payload = self.record.payload();
                let Some(ticket) = self.scheduler.begin(RequestKind::Create, Some(payload.clone())) else {
                    return;
                };
                self.status = SessionStatus::Creating;
                tracing::debug!(%ticket, trigger = trigger.as_str(), "creating note");
                self.effects.push(Effect::Create { ticket, folder: self.config.folder.clone(), payload });
            }
            SavePlan::Update => {
                let payload = self.record.payload();
                let Some(ticket) = self.scheduler.begin(RequestKind::Update, Some(payload.clone())) else {
                    return;
                };
                self.status = SessionStatus::Saving;
                tracing::debug!(%ticket, trigger = trigger.as_str(), id = %self.record.id, "saving note");
                self.effects.push(Effect::Update {
                    ticket,
                    folder: self.config.folder.clone(),
                    id: self.record.id.clone(),
                    payload,
                });
            }
        }
    }

    /// A gated request settled: re-issue a save that was deferred meanwhile.
    fn after_settle(&mut self) {
        if !self.status.is_busy() && self.scheduler.take_forced_save() {
            self.save(SaveTrigger::Deferred, false);
        }
    }

    // ── Completions ────────────────────────────────────────────────

    /// Feed back the result of an effect.
    pub fn complete(&mut self, completion: Completion) {
        let Completion { ticket, outcome } = completion;
        if let Some(token) = outcome.refreshed_token() {
            self.token.adopt(token);
        }
        match outcome {
            Outcome::Loaded(result) => self.on_loaded(ticket, result),
            Outcome::Created(result) => self.on_created(ticket, result),
            Outcome::Updated(result) => self.on_updated(ticket, result),
            Outcome::Renamed(result) => self.on_renamed(ticket, result),
            Outcome::Deleted { id, name, result } => self.on_deleted(id, name, result),
            Outcome::TitleSuggested(result) => self.on_title(ticket, result),
            Outcome::Chunk(text) => self.on_chunk(ticket, &text),
            Outcome::Completed(result) => self.on_completed(ticket, result),
        }
    }

    fn on_loaded(&mut self, ticket: Ticket, result: StoreResult<StoredDocument>) {
        let id = self.record.id.clone();
        let context = format!("{} GET", Route::Document { folder: &self.config.folder, id: &id });
        if self.scheduler.settle(ticket, RequestKind::Load).is_none() {
            tracing::trace!(%ticket, "stale load ignored");
            if let Err(error) = &result {
                self.report("Error loading note", error, context);
            }
            return;
        }

        match result {
            Ok(reply) => {
                let document = reply.value;
                let persisted = document.payload();
                let mut record = document.into_record(&self.config.folder);
                if record.id.is_empty() {
                    record.id = id;
                }
                self.detector.reset_loaded(record.content_len());
                self.committed_name = record.name.clone();
                self.record = record;
                self.scheduler.set_persisted(persisted);
                self.status = SessionStatus::Saved;
                tracing::info!(id = %self.record.id, "note opened");
                self.notify(Notice::Opened { id: self.record.id.clone(), name: self.record.name.clone() });
            }
            Err(error) => {
                self.report("Error loading note", &error, context);
                self.reset(false);
            }
        }
        self.after_settle();
    }

    fn on_created(&mut self, ticket: Ticket, result: StoreResult<StoredDocument>) {
        let context = format!("{} POST", Route::Documents { folder: &self.config.folder });
        let Some(flight) = self.scheduler.settle(ticket, RequestKind::Create) else {
            self.on_stale_create(ticket, result, context);
            return;
        };

        match result {
            Ok(reply) => {
                let document = reply.value;
                self.record.id = document.metadata.id;
                let sent = flight.sent.unwrap_or_default();
                self.status = SessionStatus::after_successful_write(self.record.payload() == sent);
                self.scheduler.set_persisted(sent);
                tracing::info!(id = %self.record.id, status = %self.status, "note created");
                self.notify(Notice::Created { id: self.record.id.clone(), name: self.record.name.clone() });
                if std::mem::take(&mut self.captured) {
                    self.consider_naming("capture");
                }
            }
            Err(error) => {
                self.report("Error creating note", &error, context);
                self.status = SessionStatus::after_failed_create(self.record.content.is_empty());
            }
        }
        self.after_settle();
    }

    fn on_stale_create(&mut self, ticket: Ticket, result: StoreResult<StoredDocument>, context: String) {
        let orphaned = self.scheduler.claim_orphan(ticket);
        match result {
            Ok(reply) => {
                let metadata = reply.value.metadata;
                if orphaned {
                    let cleanup = self.scheduler.ticket();
                    tracing::info!(id = %metadata.id, "deleting note created after its session was deleted");
                    self.effects.push(Effect::Delete {
                        ticket: cleanup,
                        folder: self.config.folder.clone(),
                        id: metadata.id,
                        name: metadata.name,
                    });
                } else {
                    self.notify(Notice::Created { id: metadata.id, name: metadata.name });
                }
            }
            Err(error) => self.report("Error creating note", &error, context),
        }
    }

    fn on_updated(&mut self, ticket: Ticket, result: StoreResult<StoredDocument>) {
        let context = self.write_context(&result, "PUT", false);
        let Some(flight) = self.scheduler.settle(ticket, RequestKind::Update) else {
            match result {
                Ok(reply) => {
                    let metadata = reply.value.metadata;
                    self.notify(Notice::Saved { id: metadata.id, name: metadata.name });
                }
                Err(error) => self.report("Error saving note", &error, context),
            }
            return;
        };

        match result {
            Ok(_) => {
                let sent = flight.sent.unwrap_or_default();
                self.status = SessionStatus::after_successful_write(self.record.payload() == sent);
                self.scheduler.set_persisted(sent);
                tracing::debug!(id = %self.record.id, status = %self.status, "note saved");
                self.notify(Notice::Saved { id: self.record.id.clone(), name: self.record.name.clone() });
            }
            Err(error) => {
                self.report("Error saving note", &error, context);
                self.status = SessionStatus::Changed;
            }
        }
        self.after_settle();
    }

    fn on_renamed(&mut self, ticket: Ticket, result: StoreResult<StoredDocument>) {
        let context = self.write_context(&result, "PUT", true);
        let Some(flight) = self.scheduler.settle(ticket, RequestKind::Rename) else {
            match result {
                Ok(reply) => {
                    let metadata = reply.value.metadata;
                    self.notify(Notice::Renamed { id: metadata.id, name: metadata.name });
                }
                Err(error) => self.report("Error renaming note", &error, context),
            }
            return;
        };

        match result {
            Ok(_) => {
                let sent = flight.sent.unwrap_or_default();
                self.status = SessionStatus::after_successful_write(self.record.payload() == sent);
                let name = sent.name.clone();
                self.scheduler.set_persisted(sent);
                tracing::debug!(id = %self.record.id, %name, "note renamed");
                self.notify(Notice::Renamed { id: self.record.id.clone(), name });
            }
            Err(error) => {
                self.report("Error renaming note", &error, context);
                self.status = SessionStatus::Changed;
            }
        }
        self.after_settle();
    }

    fn on_deleted(&mut self, id: String, name: String, result: StoreResult<()>) {
        match result {
            Ok(_) => {
                tracing::info!(%id, "note deleted");
                self.notify(Notice::Deleted { id, name });
            }
            Err(error) => {
                let context = format!("{} DELETE", Route::Document { folder: &self.config.folder, id: &id });
                self.report("Error deleting note", &error, context);
            }
        }
    }

    fn on_title(&mut self, ticket: Ticket, result: Result<Option<String>, AssistError>) {
        let Some(manual) = self.namer.finish(ticket) else {
            if let Err(error) = &result {
                self.report("Error naming note", error, "name_topic");
            }
            return;
        };

        match result {
            Ok(Some(raw)) => match tidy_title(&raw) {
                Some(_) if !manual && !self.is_unnamed() => {
                    tracing::debug!(name = %self.record.name, "title suggestion discarded: note already named");
                }
                Some(title) if title == self.record.name => {}
                Some(title) => {
                    tracing::info!(%title, "applying suggested title");
                    self.commit_name(title);
                }
                None => tracing::debug!("blank title suggestion"),
            },
            Ok(None) => tracing::debug!("no title suggested"),
            Err(error) => self.report("Error naming note", &error, "name_topic"),
        }
    }

    fn on_chunk(&mut self, ticket: Ticket, text: &str) {
        if self.completion != Some(ticket) {
            return;
        }
        self.preview.push_str(text);
        self.notify(Notice::Preview { ticket, text: self.preview.clone() });
    }

    fn on_completed(&mut self, ticket: Ticket, result: Result<String, AssistError>) {
        if self.completion != Some(ticket) {
            if let Err(error) = &result {
                self.report("Error generating text", error, "complete");
            }
            return;
        }
        self.completion = None;
        self.preview.clear();

        match result {
            Ok(text) => self.merge_completion(&text),
            Err(error) => self.report("Error generating text", &error, "complete"),
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn write_context(&self, result: &StoreResult<StoredDocument>, method: &str, rename: bool) -> String {
        let id = match result {
            Ok(reply) if !reply.value.metadata.id.is_empty() => reply.value.metadata.id.as_str(),
            _ => self.record.id.as_str(),
        };
        let folder = self.config.folder.as_str();
        let route = if rename { Route::Rename { folder, id } } else { Route::Document { folder, id } };
        format!("{route} {method}")
    }

    fn report(&mut self, message: &str, error: &dyn std::error::Error, context: impl Into<String>) {
        self.effects.push(Effect::Report(Report::new(message, error, context)));
    }

    fn notify(&mut self, notice: Notice) {
        self.effects.push(Effect::Notify(notice));
    }
}
