use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_EMBEDDING_MODEL: &str = "cohere.embed-multilingual-v3";
pub const DEFAULT_STORE_URL: &str = "postgres://localhost:5432/documents";
pub const DEFAULT_TABLE: &str = "documents";
/// Hard per-request limit imposed by the embedding provider.
pub const DEFAULT_BATCH_SIZE: u32 = 96;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("embfill").join("config.toml"))
    }

    /// Load configuration from the config file, then apply environment
    /// overrides and validate.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let mut config = if let Some(path) = Self::config_path()
            && path.exists()
        {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::error::ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<std::path::PathBuf, crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Environment always wins over file values for credential-bearing
    /// settings.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("EMBFILL_DATABASE_URL")
            && !url.is_empty()
        {
            self.store.url = url;
        }
        if let Ok(url) = std::env::var("EMBFILL_EMBEDDING_URL")
            && !url.is_empty()
        {
            self.embedding.url = url;
        }
        if let Ok(key) = std::env::var("EMBFILL_API_KEY")
            && !key.is_empty()
        {
            self.embedding.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        if self.embedding.batch_size == 0 {
            return Err(crate::error::ConfigError::ValidationError(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.batch_size > DEFAULT_BATCH_SIZE {
            return Err(crate::error::ConfigError::ValidationError(format!(
                "embedding.batch_size must not exceed the provider limit of {}",
                DEFAULT_BATCH_SIZE
            )));
        }
        if self.store.table.is_empty() {
            return Err(crate::error::ConfigError::ValidationError(
                "store.table must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_pool_max")]
    pub pool_max: u32,

    #[serde(default = "default_pool_acquire_timeout")]
    pub pool_acquire_timeout: u32,
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_pool_max() -> u32 {
    5
}

fn default_pool_acquire_timeout() -> u32 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            schema: None,
            table: default_table(),
            pool_max: default_pool_max(),
            pool_acquire_timeout: default_pool_acquire_timeout(),
        }
    }
}

impl StoreConfig {
    /// Table name qualified with the schema when one is configured.
    pub fn qualified_table_name(&self) -> String {
        match self.schema {
            Some(ref schema) => format!("{}.{}", schema, self.table),
            None => self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.url, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.embedding.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.store.url, DEFAULT_STORE_URL);
        assert_eq!(config.store.table, DEFAULT_TABLE);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.is_some());
    }

    #[test]
    fn test_qualified_table_name() {
        let config = StoreConfig::default();
        assert_eq!(config.qualified_table_name(), "documents");

        let config = StoreConfig {
            schema: Some("search".to_string()),
            ..Default::default()
        };
        assert_eq!(config.qualified_table_name(), "search.documents");
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = Config {
            embedding: EmbeddingConfig {
                batch_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_batch() {
        let config = Config {
            embedding: EmbeddingConfig {
                batch_size: DEFAULT_BATCH_SIZE + 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\ntable = \"articles\"\n\n[embedding]\nbatch_size = 32"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.store.table, "articles");
        assert_eq!(config.embedding.batch_size, 32);
        // Unspecified fields fall back to defaults
        assert_eq!(config.store.url, DEFAULT_STORE_URL);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
    }
}
