// Session save-state machine.
//
//   Idle ──edit──▶ Changed ──save──▶ Saving ──ok──▶ Saved
//     │                       │          └─err──▶ Changed
//     └──first save──▶ Creating ──ok──▶ Saved
//                             └─err──▶ Changed | Idle
//   Loading ──ok──▶ Saved     Loading ──err──▶ Idle
//
// Loading, Saving and Creating are "busy": a request is on the wire and no
// other mutation may be issued until it settles.

use serde::Serialize;

/// Lifecycle state of one open note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Freshly reset; nothing to save.
    #[default]
    Idle,
    /// Fetch in flight.
    Loading,
    /// Dirty; the next save trigger persists it.
    Changed,
    /// Update or rename in flight.
    Saving,
    /// Create in flight.
    Creating,
    /// Matches what the server holds.
    Saved,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Changed => "changed",
            Self::Saving => "saving",
            Self::Creating => "creating",
            Self::Saved => "saved",
        }
    }

    /// A request is outstanding; save triggers must be dropped.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Saving | Self::Creating)
    }

    /// Status after an accepted content or metadata mutation.
    ///
    /// Busy states are kept: a load overwrites local state anyway, and an
    /// in-flight save is reconciled against the record when it settles.
    pub fn mark_changed(self) -> Self {
        match self {
            Self::Idle | Self::Changed | Self::Saved => Self::Changed,
            busy => busy,
        }
    }

    /// Status after a failed create: retryable if there is anything to keep.
    pub fn after_failed_create(content_is_empty: bool) -> Self {
        if content_is_empty {
            Self::Idle
        } else {
            Self::Changed
        }
    }

    /// Status after a successful write, given whether the record still
    /// matches what was sent.
    pub fn after_successful_write(record_matches_sent: bool) -> Self {
        if record_matches_sent {
            Self::Saved
        } else {
            Self::Changed
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SessionStatus; 6] = [
        SessionStatus::Idle,
        SessionStatus::Loading,
        SessionStatus::Changed,
        SessionStatus::Saving,
        SessionStatus::Creating,
        SessionStatus::Saved,
    ];

    #[test]
    fn initial_status_is_idle() {
        assert_eq!(SessionStatus::default(), SessionStatus::Idle);
    }

    #[test]
    fn only_request_states_are_busy() {
        let busy: Vec<_> = ALL.into_iter().filter(|s| s.is_busy()).collect();
        assert_eq!(
            busy,
            vec![SessionStatus::Loading, SessionStatus::Saving, SessionStatus::Creating]
        );
    }

    #[test]
    fn mark_changed_never_leaves_a_busy_state() {
        for status in ALL {
            let next = status.mark_changed();
            if status.is_busy() {
                assert_eq!(next, status);
            } else {
                assert_eq!(next, SessionStatus::Changed);
            }
        }
    }

    #[test]
    fn failed_create_keeps_non_empty_notes_retryable() {
        assert_eq!(SessionStatus::after_failed_create(false), SessionStatus::Changed);
        assert_eq!(SessionStatus::after_failed_create(true), SessionStatus::Idle);
    }

    #[test]
    fn successful_write_lands_on_changed_when_record_moved() {
        assert_eq!(SessionStatus::after_successful_write(true), SessionStatus::Saved);
        assert_eq!(SessionStatus::after_successful_write(false), SessionStatus::Changed);
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&SessionStatus::Creating).unwrap(), "\"creating\"");
        assert_eq!(SessionStatus::Saved.to_string(), "saved");
    }
}
