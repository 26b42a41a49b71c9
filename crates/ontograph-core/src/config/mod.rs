//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::domain::import::EdgePolicy;
use crate::storage::{DEFAULT_MAX_CONNECTIONS, default_database_path};

/// Ontograph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontology_path: Option<PathBuf>,
    #[serde(default)]
    pub edge_policy: EdgePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: default_database_path(),
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("ONTOGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("ontograph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.path.as_os_str().is_empty() {
            return Err(anyhow!("store.path must not be empty"));
        }
        if self.store.max_connections == 0 {
            return Err(anyhow!("store.max_connections must be at least 1"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "store.path" => Ok(self.store.path.display().to_string()),
            "store.max_connections" => Ok(self.store.max_connections.to_string()),

            "import.ontology_path" => Ok(self
                .import
                .ontology_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "(not set - pass --ontology to import)".to_string())),
            "import.edge_policy" => Ok(self.import.edge_policy.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `ontograph config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "store.path" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("store.path must not be empty"));
                }
                self.store.path = PathBuf::from(value);
            }
            "store.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("store.max_connections must be at least 1"));
                }
                self.store.max_connections = max;
            }

            "import.ontology_path" => {
                self.import.ontology_path = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "import.edge_policy" => {
                self.import.edge_policy = value.parse::<EdgePolicy>().map_err(|e| anyhow!(e))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `ontograph config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "store.path",
            "store.max_connections",
            "import.ontology_path",
            "import.edge_policy",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.import.edge_policy, EdgePolicy::Merge);
        assert!(config.import.ontology_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("store.path", "/tmp/graph.db").unwrap();
        config.set("import.edge_policy", "append").unwrap();
        config.set("import.ontology_path", "pizza.owl").unwrap();

        assert_eq!(config.get("store.path").unwrap(), "/tmp/graph.db");
        assert_eq!(config.get("import.edge_policy").unwrap(), "append");
        assert_eq!(config.get("import.ontology_path").unwrap(), "pizza.owl");

        config.set("import.ontology_path", "").unwrap();
        assert!(config.import.ontology_path.is_none());
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("import.edge_policy", "replace").is_err());
        assert!(config.set("store.max_connections", "0").is_err());
        assert!(config.set("store.max_connections", "many").is_err());
        assert!(config.set("store.path", " ").is_err());
        assert!(config.set("llm.default_model", "x").is_err());
        assert!(config.get("unknown.key").is_err());
    }

    #[test]
    fn test_list_covers_every_key() {
        let keys: Vec<String> = Config::default()
            .list()
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(
            keys,
            vec![
                "store.path",
                "store.max_connections",
                "import.ontology_path",
                "import.edge_policy"
            ]
        );
    }

    #[test]
    fn test_toml_roundtrip_keeps_policy() {
        let mut config = Config::default();
        config.set("import.edge_policy", "append").unwrap();

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("edge_policy = \"append\""));

        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.import.edge_policy, EdgePolicy::Append);
    }

    #[test]
    fn test_missing_import_section_fields_default() {
        let parsed: Config = toml::from_str(
            "[store]\npath = \"/tmp/g.db\"\nmax_connections = 2\n\n[import]\n",
        )
        .unwrap();
        assert_eq!(parsed.import.edge_policy, EdgePolicy::Merge);
        assert!(parsed.import.ontology_path.is_none());
    }
}
