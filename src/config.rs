//! Configuration for the contract mock engine.
//!
//! A YAML file holds the contract collection together with store settings.

use crate::contract::{validate_contracts, Contracts};
use crate::hold::HoldMode;
use crate::store::{LogSettings, MockStore};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    /// Contracts keyed by name, in declaration order
    #[serde(default)]
    pub contracts: Contracts,

    /// Store settings
    #[serde(default)]
    pub settings: StoreSettings,
}

impl MockConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_contracts(&self.contracts)?;

        for (contract_key, response_key) in &self.settings.initial_state {
            let contract = self.contracts.get(contract_key).ok_or_else(|| {
                anyhow::anyhow!("Initial state: unknown contract '{}'", contract_key)
            })?;
            if contract.response(response_key).is_none() {
                anyhow::bail!(
                    "Initial state: contract '{}' has no response '{}'",
                    contract_key,
                    response_key
                );
            }
        }
        Ok(())
    }

    /// Build a store from this configuration, seeded with the initial state.
    pub fn build_store(&self) -> anyhow::Result<MockStore> {
        let store = MockStore::new(self.contracts.clone())
            .with_hold_mode(self.settings.hold_mode())
            .with_logging(self.settings.log_settings());
        store.set_state(&self.settings.initial_state)?;
        Ok(store)
    }
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Log every matched call
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log calls no contract matched
    #[serde(default = "default_true")]
    pub log_unmatched: bool,

    /// Resolve held responses after this delay instead of waiting for a release
    #[serde(default)]
    pub hold_delay_ms: Option<u64>,

    /// Response selections applied when the store is built
    #[serde(default)]
    pub initial_state: IndexMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
            hold_delay_ms: None,
            initial_state: IndexMap::new(),
        }
    }
}

impl StoreSettings {
    pub fn hold_mode(&self) -> HoldMode {
        match self.hold_delay_ms {
            Some(ms) => HoldMode::Timed(Duration::from_millis(ms)),
            None => HoldMode::Manual,
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            log_matches: self.log_matches,
            log_unmatched: self.log_unmatched,
        }
    }
}
