//! Shared configuration types for CounterSpy
//!
//! This crate contains serializable configuration types that are shared between
//! the engine (counterspy-core) and whatever settings UI edits them.

use serde::{Deserialize, Serialize};

/// Effect asset spawned on players that target you.
pub const DEFAULT_EFFECT_PATH: &str = "vfx/common/eff/sta_death00_m1.avfx";

/// Path prefixes of cataloged effect assets.
pub const ACCEPTED_PATH_PREFIXES: &[&str] = &["vfx/", "bgcommon/"];

/// File extension every effect asset carries.
pub const EFFECT_EXTENSION: &str = ".avfx";

// ─────────────────────────────────────────────────────────────────────────────
// Effect Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Visual effect settings read by the effect lifecycle on every cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Spawn effects on players targeting you
    pub enabled: bool,
    /// Game path of the effect asset
    pub effect_path: String,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            effect_path: DEFAULT_EFFECT_PATH.to_string(),
        }
    }
}

impl EffectConfig {
    /// Returns true if the path names a cataloged effect asset that can be
    /// handed to the game as a C string.
    pub fn is_well_formed(&self) -> bool {
        let path = self.effect_path.as_str();
        !path.is_empty()
            && !path.contains('\0')
            && path.ends_with(EFFECT_EXTENSION)
            && ACCEPTED_PATH_PREFIXES
                .iter()
                .any(|prefix| path.len() > prefix.len() && path.starts_with(prefix))
    }

    /// Returns true if effects should be spawned with these settings.
    pub fn should_spawn(&self) -> bool {
        self.enabled && self.is_well_formed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target List Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Which entity kinds presentation layers list as "targeting you".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetListConfig {
    pub show_players: bool,
    pub show_npcs: bool,
}

impl Default for TargetListConfig {
    fn default() -> Self {
        Self {
            show_players: true,
            show_npcs: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSpyConfig {
    pub effect: EffectConfig,

    /// Track every nearby player and combatant regardless of their target.
    /// Used to preview markers and effects without needing to be targeted.
    pub preview_mode: bool,

    pub targets: TargetListConfig,
}
