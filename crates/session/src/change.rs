// Edit classification for an open note.
//
// A session starts "uninstantiated": content that arrives from a load is not
// a user edit. The first accepted edit instantiates the note and asks for an
// immediate save; later edits only mark it dirty, plus a one-shot signal when
// the body grows past the auto-naming threshold.

/// Default length (in chars) past which an unnamed note asks for a name.
pub const DEFAULT_AUTONAME_THRESHOLD: usize = 200;

/// What an accepted edit means for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// First edit since reset or load: persist now.
    First,
    /// Any later edit. `crossed_threshold` is true only on the edit that
    /// takes the body from at-or-below the threshold to above it.
    Subsequent { crossed_threshold: bool },
}

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    threshold: usize,
    instantiated: bool,
    above_threshold: bool,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_AUTONAME_THRESHOLD)
    }
}

impl ChangeDetector {
    pub fn new(threshold: usize) -> Self {
        Self { threshold, instantiated: false, above_threshold: false }
    }

    pub fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Classify a user edit that left the body `content_len` chars long.
    pub fn observe_edit(&mut self, content_len: usize) -> EditKind {
        if !self.instantiated {
            self.instantiated = true;
            return EditKind::First;
        }

        let above = content_len > self.threshold;
        let crossed_threshold = above && !self.above_threshold;
        self.above_threshold = above;
        EditKind::Subsequent { crossed_threshold }
    }

    /// Content was assigned by the program (append, upload, AI merge).
    pub fn instantiate(&mut self) {
        self.instantiated = true;
    }

    /// Forget everything; used when the session resets.
    pub fn reset(&mut self) {
        self.instantiated = false;
        self.above_threshold = false;
    }

    /// Start over for freshly loaded content. A long loaded body does not
    /// count as a crossing on the next keystroke.
    pub fn reset_loaded(&mut self, content_len: usize) {
        self.instantiated = false;
        self.above_threshold = content_len > self.threshold;
    }
}
