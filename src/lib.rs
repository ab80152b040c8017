//! CounterSpy
//!
//! In-process plugin that tracks which players and NPCs are targeting the
//! local player and marks targeting players with a visual effect.

pub mod logging;
mod plugin;

#[cfg(test)]
mod plugin_tests;

pub use counterspy_core::{
    ConfigHandle, CounterSpyConfig, CounterSpyConfigExt, EffectConfig, Entity, EntityId,
    EntityKind, HookManager, LocalPlayer, NativeObject, ObjectDirectory, Position,
    RefreshOutcome, TargetSummary, VfxHooks, WorldState,
};
pub use plugin::CounterSpy;

#[cfg(target_os = "windows")]
pub use counterspy_core::DetourHooks;
