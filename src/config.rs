//! Agent configuration loaded from TOML.
//!
//! Every section is optional; missing keys fall back to the defaults of
//! [`DFSConfig`], [`MCTSConfig`] and [`DQNConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dfs::DFSConfig;
use crate::dqn::DQNConfig;
use crate::error::ConfigError;
use crate::mcts::MCTSConfig;

/// Top-level configuration for the three agent families.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dfs: DFSConfig,
    pub mcts: MCTSConfig,
    pub dqn: DQNConfig,
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dfs.validate()?;
        self.mcts.validate()?;
        self.dqn.validate()
    }

    /// All defaults as TOML, as a starting point for a config file.
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&AppConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dqn::{EpsilonSchedule, NetworkSharing};
    use crate::mcts::ExpansionOrder;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
[mcts]
exploration_constant = 0.5
expansion = "InOrder"

[dqn]
epsilon_schedule = "Exponential"
"#,
        )
        .unwrap();
        assert_eq!(config.mcts.exploration_constant, 0.5);
        assert_eq!(config.mcts.expansion, ExpansionOrder::InOrder);
        assert_eq!(config.mcts.iteration_budget, MCTSConfig::default().iteration_budget);
        assert_eq!(config.dqn.epsilon_schedule, EpsilonSchedule::Exponential);
        assert_eq!(config.dfs, DFSConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_section_is_rejected() {
        let err = AppConfig::from_toml("[dfs]\nmax_depth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::from_toml(
            "[dqn]\nnetwork_sharing = \"PerPlayer\"\nreplay_sharing = \"Shared\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[mcts\nseed = 1").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[dfs]
max_depth = 6
time_budget_ms = 250

[dfs.pruning]
max_value = 1.0
max_sum = 1.0

[dqn]
network_sharing = "PerPlayer"
replay_sharing = "PerPlayer"
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.dfs.max_depth, 6);
        assert_eq!(config.dfs.time_budget_ms, Some(250));
        assert!(config.dfs.pruning.is_some());
        assert_eq!(config.dqn.network_sharing, NetworkSharing::PerPlayer);
        assert_eq!(config.mcts, MCTSConfig::default());
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let text = AppConfig::default_toml().unwrap();
        assert_eq!(AppConfig::from_toml(&text).unwrap(), AppConfig::default());
    }
}
