use std::path::Path;

use serde::Deserialize;

/// Default per-event listener ceiling.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading config.
    Load(String),
    /// The configured dispatch mode cannot run in the current context.
    Runtime(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Runtime(msg) => write!(f, "Config runtime error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where listener invocations run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// The current tokio runtime if there is one, otherwise a thread per invocation.
    #[default]
    Auto,
    /// The current tokio runtime's blocking pool. Requires a runtime at construction.
    Tokio,
    /// A dedicated OS thread per invocation.
    Thread,
    /// Synchronously on the emitting thread, after all locks are released.
    Inline,
}

/// Emitter settings.
///
/// ```yaml
/// emitter:
///   max_listeners: 25
///   dispatch: thread
/// ```
///
/// Missing keys fall back to [`EmitterConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Per-event listener ceiling. `0` rejects every subscription.
    pub max_listeners: usize,
    pub dispatch: DispatchMode,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            dispatch: DispatchMode::Auto,
        }
    }
}

impl EmitterConfig {
    /// Parse config from YAML.
    ///
    /// Accepts either the settings at the top level or nested under an
    /// `emitter:` key, so the section can live in a larger application file.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
        let section = match yaml.get("emitter") {
            Some(section) => section.clone(),
            None => yaml,
        };
        if section.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(section).map_err(|e| ConfigError::Load(e.to_string()))
    }

    /// Load config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_top_level_keys() {
        let config = EmitterConfig::from_yaml_str("max_listeners: 3\ndispatch: inline\n").unwrap();
        assert_eq!(config.max_listeners, 3);
        assert_eq!(config.dispatch, DispatchMode::Inline);
    }

    #[test]
    fn test_nested_section_with_defaults() {
        let yaml = "app:\n  name: demo\nemitter:\n  dispatch: thread\n";
        let config = EmitterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_listeners, DEFAULT_MAX_LISTENERS);
        assert_eq!(config.dispatch, DispatchMode::Thread);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EmitterConfig::from_yaml_str("").unwrap(), EmitterConfig::default());
    }

    #[test]
    fn test_unknown_dispatch_mode_fails() {
        let err = EmitterConfig::from_yaml_str("dispatch: fibers\n").unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "emitter:\n  max_listeners: 42").unwrap();
        let config = EmitterConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.max_listeners, 42);
        assert_eq!(config.dispatch, DispatchMode::Auto);
    }

    #[test]
    fn test_missing_file_fails() {
        let err = EmitterConfig::from_yaml_file("/nonexistent/emitter.yaml").unwrap_err();
        assert!(err.to_string().starts_with("Config load error"));
    }
}
