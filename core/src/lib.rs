pub mod context;
pub mod effects;
pub mod interop;
pub mod tracker;
pub mod world;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use context::{ConfigError, ConfigHandle, CounterSpyConfig, CounterSpyConfigExt, EffectConfig};
pub use effects::{EffectLifecycleController, RetireReason};
pub use interop::{EffectHandle, HookError, HookManager, LocateError, ModuleImage, VfxHooks};
pub use tracker::{ObjectTracker, RefreshOutcome, TargetSummary};
pub use world::{
    Entity, EntityId, EntityKind, LocalPlayer, NativeObject, ObjectDirectory, Position, WorldState,
};

#[cfg(target_os = "windows")]
pub use interop::DetourHooks;
