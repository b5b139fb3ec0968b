//! Client configuration.
//!
//! Loaded from TOML. Every field is optional in the file; missing ones take
//! the defaults below.
//!
//! ```toml
//! agent_url = "http://localhost:7420"
//! task_timeout_secs = 30
//! card_timeout_secs = 5
//! streaming = "auto"          # auto | always | never
//! suppressed_artifacts = ["final_output_total"]
//!
//! [headers]
//! X-Trace = "on"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{A2AError, A2AResult};
use crate::utils::FINAL_OUTPUT_TOTAL;

/// Whether task sends use `message/stream` or `message/send`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    /// Stream when the agent card advertises `capabilities.streaming`.
    #[default]
    Auto,
    /// Always stream.
    Always,
    /// Never stream.
    Never,
}

impl StreamingMode {
    /// Resolve the mode against what the agent advertises.
    pub fn resolve(self, agent_streams: bool) -> bool {
        match self {
            StreamingMode::Auto => agent_streams,
            StreamingMode::Always => true,
            StreamingMode::Never => false,
        }
    }
}

/// Settings for a [`crate::session::Connection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent to connect to on startup.
    pub agent_url: Option<String>,
    /// Deadline for a task send until its first data arrives.
    pub task_timeout_secs: u64,
    /// Deadline for fetching the agent card.
    pub card_timeout_secs: u64,
    pub streaming: StreamingMode,
    /// Extra HTTP headers sent with every JSON-RPC request.
    pub headers: HashMap<String, String>,
    /// Standalone artifact names that are never shown.
    pub suppressed_artifacts: Vec<String>,
    /// Fixed agent card path instead of the well-known ones.
    pub card_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            agent_url: None,
            task_timeout_secs: 30,
            card_timeout_secs: 5,
            streaming: StreamingMode::Auto,
            headers: HashMap::new(),
            suppressed_artifacts: vec![FINAL_OUTPUT_TOTAL.to_string()],
            card_path: None,
        }
    }
}

impl ClientConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> A2AResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| A2AError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&raw)
            .map_err(|e| A2AError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> A2AResult<Self> {
        toml::from_str(raw).map_err(|e| A2AError::Config(e.to_string()))
    }

    /// `$CONFIG_DIR/a2a-cli/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("a2a-cli").join("config.toml"))
    }

    /// Load from [`Self::default_path`] when that file exists, otherwise
    /// return the defaults.
    pub fn from_default_location() -> A2AResult<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }

    pub fn card_timeout(&self) -> Duration {
        Duration::from_secs(self.card_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.task_timeout(), Duration::from_secs(30));
        assert_eq!(config.card_timeout(), Duration::from_secs(5));
        assert_eq!(config.streaming, StreamingMode::Auto);
        assert_eq!(config.suppressed_artifacts, vec!["final_output_total"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ClientConfig::from_toml(
            r#"
            task_timeout_secs = 90
            streaming = "never"

            [headers]
            X-Trace = "on"
            "#,
        )
        .unwrap();
        assert_eq!(config.task_timeout_secs, 90);
        assert_eq!(config.card_timeout_secs, 5);
        assert_eq!(config.streaming, StreamingMode::Never);
        assert_eq!(config.headers.get("X-Trace").map(String::as_str), Some("on"));
        assert_eq!(config.suppressed_artifacts, vec!["final_output_total"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "agent_url = \"http://localhost:7420\"").unwrap();
        writeln!(file, "suppressed_artifacts = []").unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.agent_url.as_deref(), Some("http://localhost:7420"));
        assert!(config.suppressed_artifacts.is_empty());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "streaming = \"sometimes\"").unwrap();
        assert!(matches!(
            ClientConfig::load(file.path()),
            Err(A2AError::Config(_))
        ));

        assert!(matches!(
            ClientConfig::load("/definitely/not/here.toml"),
            Err(A2AError::Config(_))
        ));
    }

    #[test]
    fn test_streaming_mode_resolution() {
        assert!(StreamingMode::Auto.resolve(true));
        assert!(!StreamingMode::Auto.resolve(false));
        assert!(StreamingMode::Always.resolve(false));
        assert!(!StreamingMode::Never.resolve(true));
    }
}
