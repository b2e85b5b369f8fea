// Keyed coalescing timer.
//
// Collapses rapid updates for the same key within a configurable window
// (default 100ms, range 50–500ms). The last value wins and every push
// restarts that key's window. The driver uses it to thin out streaming
// completion previews; it never touches the save path.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default debounce window.
const DEFAULT_DEBOUNCE_MS: u64 = 100;
/// Minimum allowed debounce window.
const MIN_DEBOUNCE_MS: u64 = 50;
/// Maximum allowed debounce window.
const MAX_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    pub window: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { window: Duration::from_millis(DEFAULT_DEBOUNCE_MS) }
    }
}

impl DebounceConfig {
    /// Create a config with the given window in milliseconds, clamped to [50, 500].
    pub fn with_millis(ms: u64) -> Self {
        let clamped = ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        Self { window: Duration::from_millis(clamped) }
    }
}

struct Pending<V> {
    value: V,
    last_seen: Instant,
}

/// Call `push()` for each update, then `drain_ready()` when
/// `next_deadline()` passes.
pub struct Debouncer<K, V> {
    config: DebounceConfig,
    pending: HashMap<K, Pending<V>>,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new(config: DebounceConfig) -> Self {
        Self { config, pending: HashMap::new() }
    }

    /// Record an update for `key`, replacing any pending value and
    /// restarting its window.
    pub fn push(&mut self, key: K, value: V) {
        self.push_at(key, value, Instant::now());
    }

    pub(crate) fn push_at(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(key, Pending { value, last_seen: now });
    }

    /// Drain every entry whose window has elapsed.
    pub fn drain_ready(&mut self) -> Vec<(K, V)> {
        self.drain_ready_at(Instant::now())
    }

    pub(crate) fn drain_ready_at(&mut self, now: Instant) -> Vec<(K, V)> {
        let window = self.config.window;
        let ready_keys: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, pending)| now.duration_since(pending.last_seen) >= window)
            .map(|(key, _)| key.clone())
            .collect();

        ready_keys
            .into_iter()
            .filter_map(|key| self.pending.remove(&key).map(|pending| (key, pending.value)))
            .collect()
    }

    /// Drain everything regardless of age.
    pub fn flush(&mut self) -> Vec<(K, V)> {
        self.pending.drain().map(|(key, pending)| (key, pending.value)).collect()
    }

    /// Drop a pending entry without emitting it.
    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|pending| pending.value)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// When the earliest pending entry becomes ready, or None if empty.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.last_seen + self.config.window).min()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn debouncer() -> Debouncer<&'static str, String> {
        Debouncer::new(DebounceConfig::default())
    }

    // ── DebounceConfig ─────────────────────────────────────────────

    #[test]
    fn default_config_is_100ms() {
        assert_eq!(DebounceConfig::default().window, Duration::from_millis(100));
    }

    #[test]
    fn config_clamps_to_range() {
        assert_eq!(DebounceConfig::with_millis(10).window, Duration::from_millis(50));
        assert_eq!(DebounceConfig::with_millis(1000).window, Duration::from_millis(500));
        assert_eq!(DebounceConfig::with_millis(200).window, Duration::from_millis(200));
    }

    // ── Coalescing ─────────────────────────────────────────────────

    #[test]
    fn not_ready_before_window() {
        let mut debouncer = debouncer();
        let now = Instant::now();
        debouncer.push_at("a", "x".into(), now);

        assert!(debouncer.drain_ready_at(now + Duration::from_millis(50)).is_empty());
        assert_eq!(debouncer.pending_count(), 1);
    }

    #[test]
    fn rapid_updates_coalesce_last_value_wins() {
        let mut debouncer = debouncer();
        let now = Instant::now();
        debouncer.push_at("a", "B".into(), now);
        debouncer.push_at("a", "Bu".into(), now + Duration::from_millis(20));
        debouncer.push_at("a", "Buy".into(), now + Duration::from_millis(40));
        assert_eq!(debouncer.pending_count(), 1);

        // 40ms since the last push.
        assert!(debouncer.drain_ready_at(now + Duration::from_millis(80)).is_empty());

        let ready = debouncer.drain_ready_at(now + Duration::from_millis(140));
        assert_eq!(ready, vec![("a", "Buy".to_string())]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[test]
    fn keys_are_tracked_independently() {
        let mut debouncer = debouncer();
        let now = Instant::now();
        debouncer.push_at("a", "1".into(), now);
        debouncer.push_at("b", "2".into(), now + Duration::from_millis(50));

        let ready = debouncer.drain_ready_at(now + Duration::from_millis(100));
        assert_eq!(ready, vec![("a", "1".to_string())]);

        let ready = debouncer.drain_ready_at(now + Duration::from_millis(150));
        assert_eq!(ready, vec![("b", "2".to_string())]);
    }

    #[test]
    fn drain_ready_is_idempotent() {
        let mut debouncer = debouncer();
        let now = Instant::now();
        debouncer.push_at("a", "x".into(), now);
        assert_eq!(debouncer.drain_ready_at(now + Duration::from_millis(100)).len(), 1);
        assert!(debouncer.drain_ready_at(now + Duration::from_millis(200)).is_empty());
    }

    // ── flush / cancel ─────────────────────────────────────────────

    #[test]
    fn flush_ignores_the_window() {
        let mut debouncer = debouncer();
        debouncer.push("a", "x".into());
        assert_eq!(debouncer.flush(), vec![("a", "x".to_string())]);
        assert!(debouncer.next_deadline().is_none());
    }

    #[test]
    fn cancel_discards_silently() {
        let mut debouncer = debouncer();
        debouncer.push("a", "x".into());
        assert_eq!(debouncer.cancel(&"a").as_deref(), Some("x"));
        assert!(debouncer.flush().is_empty());
    }

    // ── next_deadline ──────────────────────────────────────────────

    #[test]
    fn next_deadline_returns_earliest() {
        let mut debouncer = debouncer();
        assert!(debouncer.next_deadline().is_none());

        let now = Instant::now();
        debouncer.push_at("a", "1".into(), now);
        debouncer.push_at("b", "2".into(), now + Duration::from_millis(50));
        assert_eq!(debouncer.next_deadline(), Some(now + Duration::from_millis(100)));
    }
}
