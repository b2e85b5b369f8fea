// Process-wide bearer credential.
//
// Every document store response may carry a replacement token. Whoever sees
// one adopts it; the last write wins.

use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct AuthToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl AuthToken {
    pub fn new(token: Option<String>) -> Self {
        Self { inner: Arc::new(RwLock::new(token)) }
    }

    pub fn get(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the current token. Blank tokens are ignored.
    pub fn adopt(&self, token: &str) {
        if token.trim().is_empty() {
            return;
        }
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.as_deref() != Some(token) {
            tracing::debug!("adopting refreshed access token");
            *guard = Some(token.to_string());
        }
    }
}
