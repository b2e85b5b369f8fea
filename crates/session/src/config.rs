// Client configuration.
//
// Config file: `~/.sidenote/config.toml`
// Environment overrides: `SIDENOTE_STORE_URL`, `SIDENOTE_TOKEN`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sidenote_common::types::{DEFAULT_FOLDER, DEFAULT_UNNAMED_NAME};
use thiserror::Error;

use crate::change::DEFAULT_AUTONAME_THRESHOLD;

pub const ENV_STORE_URL: &str = "SIDENOTE_STORE_URL";
pub const ENV_TOKEN: &str = "SIDENOTE_TOKEN";

const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_PREVIEW_DEBOUNCE_MS: u64 = 100;

/// Root directory for sidenote state: `~/.sidenote/`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".sidenote"))
}

/// Path to the config file: `~/.sidenote/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

// ── Session settings ───────────────────────────────────────────────

/// What one `NoteSession` needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub folder: String,
    /// Sentinel name meaning "not named yet".
    pub unnamed_name: String,
    /// Body length (chars) past which an unnamed note asks for a name.
    pub autoname_threshold: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FOLDER.to_string(),
            unnamed_name: DEFAULT_UNNAMED_NAME.to_string(),
            autoname_threshold: DEFAULT_AUTONAME_THRESHOLD,
        }
    }
}

/// `[session]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSettings {
    pub unnamed_name: String,
    pub autoname_threshold: usize,
    /// Window for coalescing streamed completion previews.
    pub preview_debounce_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            unnamed_name: DEFAULT_UNNAMED_NAME.to_string(),
            autoname_threshold: DEFAULT_AUTONAME_THRESHOLD,
            preview_debounce_ms: DEFAULT_PREVIEW_DEBOUNCE_MS,
        }
    }
}

// ── Client config ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Document store base URL.
    pub store_url: String,
    /// Naming and completion service base URL. No assistant when unset.
    pub assistant_url: Option<String>,
    pub folder: String,
    /// Bearer credential; refreshed tokens are written back here.
    pub access_token: Option<String>,
    pub session: SessionSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_url: DEFAULT_STORE_URL.to_string(),
            assistant_url: None,
            folder: DEFAULT_FOLDER.to_string(),
            access_token: None,
            session: SessionSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Load from `~/.sidenote/config.toml` and apply environment overrides.
    /// Returns defaults if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), error = %error, "ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Overlay values from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_STORE_URL).filter(|v| !v.trim().is_empty()) {
            self.store_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.access_token = Some(token);
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            folder: self.folder.clone(),
            unnamed_name: self.session.unnamed_name.clone(),
            autoname_threshold: self.session.autoname_threshold,
        }
    }

    /// Save to `~/.sidenote/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories). The file holds
    /// a credential, so it is made owner-only.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            ensure_owner_only(parent, 0o700)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        ensure_owner_only(path, 0o600)?;
        Ok(())
    }
}

fn ensure_owner_only(path: &Path, wanted: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if !path.exists() {
            return Ok(());
        }
        let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
        if mode != wanted {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(wanted))?;
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (path, wanted);
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.store_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.folder, "notes");
        assert!(cfg.assistant_url.is_none());
        assert!(cfg.access_token.is_none());
        assert_eq!(cfg.session.unnamed_name, "New Note");
        assert_eq!(cfg.session.autoname_threshold, 200);
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = ClientConfig {
            store_url: "https://notes.example.com/api".into(),
            assistant_url: Some("https://ai.example.com".into()),
            folder: "journal".into(),
            access_token: Some("t1".into()),
            session: SessionSettings {
                unnamed_name: "Untitled".into(),
                autoname_threshold: 80,
                preview_debounce_ms: 200,
            },
        };
        cfg.save_to(&path).unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap(), cfg);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        ClientConfig::default().save_to(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn parse_partial_toml() {
        let cfg: ClientConfig = toml::from_str(
            r#"
store_url = "https://store.example.com"

[session]
autoname_threshold = 50
"#,
        )
        .unwrap();
        assert_eq!(cfg.store_url, "https://store.example.com");
        assert_eq!(cfg.session.autoname_threshold, 50);
        assert_eq!(cfg.session.unnamed_name, "New Note");
        assert_eq!(cfg.folder, "notes");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ClientConfig::load_from(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn environment_overrides_win() {
        let mut cfg = ClientConfig { access_token: Some("from-file".into()), ..Default::default() };
        cfg.apply_overrides(|key| match key {
            ENV_STORE_URL => Some("https://override.example.com".into()),
            ENV_TOKEN => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(cfg.store_url, "https://override.example.com");
        assert_eq!(cfg.access_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut cfg = ClientConfig::default();
        cfg.apply_overrides(|_| Some("  ".into()));
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn session_config_combines_folder_and_table() {
        let cfg = ClientConfig { folder: "work".into(), ..Default::default() };
        let session = cfg.session_config();
        assert_eq!(session.folder, "work");
        assert_eq!(session.unnamed_name, "New Note");
        assert_eq!(session.autoname_threshold, 200);
    }
}
