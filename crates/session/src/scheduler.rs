// Single-flight save scheduling.
//
// Every load, create, update and rename goes through here. The scheduler
// hands out tickets, remembers the one gated request that may be on the
// wire, and keeps the payload the server is known to hold so a completed
// write can tell whether the record moved while it was in flight.
//
// There is no timer: triggers that arrive while a request is outstanding
// are dropped, and the next trigger after it settles tries again.

use std::collections::HashSet;

use sidenote_common::types::{DocumentPayload, DocumentRecord};

use crate::effect::Ticket;
use crate::status::SessionStatus;

// ── Plans ───────────────────────────────────────────────────────────

/// Which gated request is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Load,
    Create,
    Update,
    Rename,
}

/// Decision for one save trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePlan {
    Create,
    Update,
    /// A request is outstanding; the trigger is dropped.
    Busy,
    /// Unsaved, unnamed and empty: never persisted.
    NothingToCreate,
    /// Persisted and not dirty.
    Clean,
}

/// Decide what a save trigger should do.
///
/// Create vs update depends only on whether the record has an id. A forced
/// save updates a persisted record even when it is not marked changed.
pub fn plan_save(
    status: SessionStatus,
    record: &DocumentRecord,
    unnamed_name: &str,
    forced: bool,
) -> SavePlan {
    if status.is_busy() {
        return SavePlan::Busy;
    }
    if !record.is_persisted() {
        if record.name != unnamed_name || !record.content.is_empty() {
            return SavePlan::Create;
        }
        return SavePlan::NothingToCreate;
    }
    if forced || status == SessionStatus::Changed {
        SavePlan::Update
    } else {
        SavePlan::Clean
    }
}

// ── Scheduler ───────────────────────────────────────────────────────

/// The gated request currently on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub ticket: Ticket,
    pub kind: RequestKind,
    /// What the server holds once this request succeeds. `None` for loads.
    pub sent: Option<DocumentPayload>,
}

#[derive(Debug, Default)]
pub struct SaveScheduler {
    epoch: u64,
    next_seq: u64,
    in_flight: Option<InFlight>,
    persisted: Option<DocumentPayload>,
    forced_pending: bool,
    orphaned_creates: HashSet<Ticket>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Issue a ticket in the current epoch.
    pub fn ticket(&mut self) -> Ticket {
        self.next_seq += 1;
        Ticket { epoch: self.epoch, seq: self.next_seq }
    }

    /// True if the ticket was issued for the current note.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.epoch
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    /// Reserve the single flight slot. `None` if it is already taken.
    pub fn begin(&mut self, kind: RequestKind, sent: Option<DocumentPayload>) -> Option<Ticket> {
        if let Some(existing) = &self.in_flight {
            tracing::warn!(
                ticket = %existing.ticket,
                kind = ?existing.kind,
                requested = ?kind,
                "refusing second in-flight request"
            );
            return None;
        }
        let ticket = self.ticket();
        self.in_flight = Some(InFlight { ticket, kind, sent });
        Some(ticket)
    }

    /// Release the flight slot for a completed request. Returns `None` for
    /// late, duplicate or mismatched completions, which must not touch the
    /// session.
    pub fn settle(&mut self, ticket: Ticket, kind: RequestKind) -> Option<InFlight> {
        match &self.in_flight {
            Some(flight) if flight.ticket == ticket && flight.kind == kind => self.in_flight.take(),
            _ => None,
        }
    }

    pub fn persisted(&self) -> Option<&DocumentPayload> {
        self.persisted.as_ref()
    }

    pub fn set_persisted(&mut self, payload: DocumentPayload) {
        self.persisted = Some(payload);
    }

    /// A forced save hit a busy session; re-issue it once the flight lands.
    pub fn defer_forced_save(&mut self) {
        self.forced_pending = true;
    }

    pub fn take_forced_save(&mut self) -> bool {
        std::mem::take(&mut self.forced_pending)
    }

    /// Move to a new epoch, forgetting the in-flight request and the
    /// persisted snapshot. With `orphan_create`, an outstanding create is
    /// remembered so its record can be deleted when it lands.
    pub fn reset(&mut self, orphan_create: bool) {
        if orphan_create {
            if let Some(flight) = &self.in_flight {
                if flight.kind == RequestKind::Create {
                    self.orphaned_creates.insert(flight.ticket);
                }
            }
        }
        self.epoch += 1;
        self.in_flight = None;
        self.persisted = None;
        self.forced_pending = false;
    }

    /// True (once) if this create was abandoned by a delete.
    pub fn claim_orphan(&mut self, ticket: Ticket) -> bool {
        self.orphaned_creates.remove(&ticket)
    }
}
