//! Plugin configuration
//!
//! Re-exports the shared config types and adds persistence plus a shared
//! handle that both cadences snapshot from.

use std::path::Path;
use std::sync::{Arc, RwLock};

pub use counterspy_types::{
    ACCEPTED_PATH_PREFIXES, CounterSpyConfig, DEFAULT_EFFECT_PATH, EffectConfig, TargetListConfig,
};

use super::ConfigError;

const APP_NAME: &str = "counterspy";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for CounterSpyConfig persistence
pub trait CounterSpyConfigExt: Sized {
    /// Load from the platform config directory, defaults if missing or unreadable.
    fn load() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
}

impl CounterSpyConfigExt for CounterSpyConfig {
    fn load() -> Self {
        confy::load(APP_NAME, CONFIG_NAME).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to load configuration, using defaults");
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Ok(confy::load_path(path)?)
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(ConfigError::Save)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration shared between the settings UI (writer) and the plugin
/// cadences (readers).
///
/// Readers take one [`snapshot`](Self::snapshot) per cadence so a multi-field
/// edit is never observed half-applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<RwLock<CounterSpyConfig>>,
}

impl ConfigHandle {
    pub fn new(config: CounterSpyConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> CounterSpyConfig {
        match self.inner.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply an edit atomically with respect to snapshots.
    pub fn update(&self, edit: impl FnOnce(&mut CounterSpyConfig)) {
        match self.inner.write() {
            Ok(mut config) => edit(&mut config),
            Err(poisoned) => edit(&mut poisoned.into_inner()),
        }
    }
}
