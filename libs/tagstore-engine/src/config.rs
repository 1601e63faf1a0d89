use std::collections::HashSet;

use serde::Deserialize;

use tagstore_api::{FingerprintStrategy, Record};

use crate::error::EngineError;
use crate::store::ResourceStore;

/// Root configuration — parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct TagstoreConfig {
    /// HTTP API port.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Fingerprint strategy for every record in the store.
    #[serde(default)]
    pub fingerprint: FingerprintStrategy,

    /// `Cache-Control` value sent with fingerprinted reads.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,

    /// Seed records. Empty means the built-in seed.
    #[serde(default)]
    pub records: Vec<SeedRecord>,
}

fn default_api_port() -> u16 {
    3000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_cache_control() -> String {
    "private, must-revalidate".to_string()
}

impl Default for TagstoreConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind: default_bind(),
            fingerprint: FingerprintStrategy::default(),
            cache_control: default_cache_control(),
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
}

impl TagstoreConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for seed in &self.records {
            if !seen.insert(seed.id) {
                return Err(EngineError::Config(format!("duplicate record id {}", seed.id)));
            }
        }
        Ok(())
    }

    /// Socket address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.api_port)
    }

    /// Build the store described by this config, stamping seeds with the current time.
    pub fn build_store(&self) -> ResourceStore {
        if self.records.is_empty() {
            return ResourceStore::seeded(self.fingerprint);
        }
        ResourceStore::from_records(
            self.fingerprint,
            self.records
                .iter()
                .map(|s| Record::new(s.id, s.name.clone(), s.email.clone())),
        )
    }
}
