mod config;
mod error;

pub use config::{
    ACCEPTED_PATH_PREFIXES, ConfigHandle, CounterSpyConfig, CounterSpyConfigExt,
    DEFAULT_EFFECT_PATH, EffectConfig, TargetListConfig,
};
pub use error::ConfigError;
