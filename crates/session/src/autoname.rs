// Automatic naming guard.
//
// At most one title request per session is outstanding. The guard is the
// ticket of that request, so a late answer for an earlier note can never
// clear the guard of the current one.

use crate::effect::Ticket;

/// Whether a naming request may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingVerdict {
    Fire,
    /// A request is already outstanding.
    Busy,
    /// The note carries a real name; automatic naming stays out of it.
    AlreadyNamed,
    /// Nothing but whitespace to name.
    NoContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    ticket: Ticket,
    manual: bool,
}

#[derive(Debug, Default)]
pub struct AutoNamer {
    pending: Option<Pending>,
}

impl AutoNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Gate for automatic triggers.
    pub fn check(&self, name: &str, unnamed_name: &str, content: &str) -> NamingVerdict {
        if self.pending.is_some() {
            NamingVerdict::Busy
        } else if name != unnamed_name {
            NamingVerdict::AlreadyNamed
        } else if content.trim().is_empty() {
            NamingVerdict::NoContent
        } else {
            NamingVerdict::Fire
        }
    }

    /// Gate for an explicit "suggest a name" request: renaming an already
    /// named note is allowed.
    pub fn check_manual(&self, content: &str) -> NamingVerdict {
        if self.pending.is_some() {
            NamingVerdict::Busy
        } else if content.trim().is_empty() {
            NamingVerdict::NoContent
        } else {
            NamingVerdict::Fire
        }
    }

    pub fn start(&mut self, ticket: Ticket, manual: bool) {
        self.pending = Some(Pending { ticket, manual });
    }

    /// Clear the guard for `ticket`. Returns `Some(manual)` if it was the
    /// outstanding request, `None` otherwise.
    pub fn finish(&mut self, ticket: Ticket) -> Option<bool> {
        match self.pending {
            Some(pending) if pending.ticket == ticket => {
                self.pending = None;
                Some(pending.manual)
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNNAMED: &str = "New Note";
    const T1: Ticket = Ticket { epoch: 0, seq: 1 };
    const T2: Ticket = Ticket { epoch: 0, seq: 2 };

    #[test]
    fn fires_for_unnamed_notes_with_content() {
        let namer = AutoNamer::new();
        assert_eq!(namer.check(UNNAMED, UNNAMED, "Buy milk"), NamingVerdict::Fire);
        assert_eq!(namer.check("Groceries", UNNAMED, "Buy milk"), NamingVerdict::AlreadyNamed);
        assert_eq!(namer.check(UNNAMED, UNNAMED, "  \n\t"), NamingVerdict::NoContent);
    }

    #[test]
    fn guard_blocks_until_its_own_ticket_returns() {
        let mut namer = AutoNamer::new();
        namer.start(T1, false);
        assert!(namer.is_running());
        assert_eq!(namer.check(UNNAMED, UNNAMED, "text"), NamingVerdict::Busy);
        assert_eq!(namer.check_manual("text"), NamingVerdict::Busy);

        assert_eq!(namer.finish(T2), None);
        assert!(namer.is_running());
        assert_eq!(namer.finish(T1), Some(false));
        assert!(!namer.is_running());
        assert_eq!(namer.finish(T1), None);
    }

    #[test]
    fn manual_check_ignores_the_current_name() {
        let mut namer = AutoNamer::new();
        assert_eq!(namer.check_manual("some text"), NamingVerdict::Fire);
        assert_eq!(namer.check_manual(" "), NamingVerdict::NoContent);
        namer.start(T1, true);
        assert_eq!(namer.finish(T1), Some(true));
    }

    #[test]
    fn reset_drops_the_guard() {
        let mut namer = AutoNamer::new();
        namer.start(T1, false);
        namer.reset();
        assert!(!namer.is_running());
        assert_eq!(namer.finish(T1), None);
    }
}
