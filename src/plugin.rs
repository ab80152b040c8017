//! Plugin wiring
//!
//! Binds the engine to the host's callbacks:
//! - `on_tick` (world-state tick): refresh the tracked set, then reconcile effects
//! - `on_draw` (render pass): spawn effects on newly targeting players
//! - `dispose`: free every effect before the hooks go away
//!
//! The handle table and hook manager sit behind one `Mutex`, so the two
//! callbacks stay correct even on hosts that run them on different threads.
//! Single-threaded hosts only ever take it uncontended.

use std::sync::{Mutex, MutexGuard, PoisonError};

use counterspy_core::{
    ConfigHandle, EffectLifecycleController, Entity, EntityId, HookManager, ObjectTracker,
    RefreshOutcome, TargetSummary, VfxHooks, WorldState,
};

struct VfxState<H: VfxHooks> {
    hooks: HookManager<H>,
    controller: EffectLifecycleController,
}

pub struct CounterSpy<H: VfxHooks> {
    config: ConfigHandle,
    tracker: ObjectTracker,
    vfx: Mutex<VfxState<H>>,
}

impl<H: VfxHooks> CounterSpy<H> {
    pub fn new(config: ConfigHandle, hooks: HookManager<H>) -> Self {
        Self {
            config,
            tracker: ObjectTracker::new(),
            vfx: Mutex::new(VfxState {
                hooks,
                controller: EffectLifecycleController::new(),
            }),
        }
    }

    /// Handle for the settings UI to edit.
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    /// World-state tick: refresh the tracked set, then retire stale effects.
    pub fn on_tick<W>(&self, world: &W) -> RefreshOutcome
    where
        W: WorldState + ?Sized,
    {
        let config = self.config.snapshot();
        let player = world.local_player();
        let outcome = self
            .tracker
            .refresh(world, player.as_ref(), config.preview_mode);

        let mut vfx = self.lock_vfx();
        let VfxState { hooks, controller } = &mut *vfx;
        controller.reconcile(&config.effect, &self.tracker, world, hooks);

        outcome
    }

    /// Render pass: spawn effects on tracked players that have none yet.
    pub fn on_draw<W>(&self, world: &W)
    where
        W: WorldState + ?Sized,
    {
        let config = self.config.snapshot();

        let mut vfx = self.lock_vfx();
        let VfxState { hooks, controller } = &mut *vfx;
        controller.spawn_pass(&config.effect, &self.tracker, world, hooks);
    }

    /// Entities targeting you, filtered by the configured kinds.
    pub fn targets(&self) -> Vec<Entity> {
        let targets = self.config.snapshot().targets;
        self.tracker.query(targets.show_players, targets.show_npcs)
    }

    pub fn is_targeting_you(&self, id: EntityId) -> bool {
        self.tracker.is_targeting(id)
    }

    pub fn summary(&self) -> TargetSummary {
        self.tracker.summary()
    }

    /// Number of effects currently spawned.
    pub fn active_effects(&self) -> usize {
        self.lock_vfx().controller.len()
    }

    pub fn hooks_active(&self) -> bool {
        self.lock_vfx().hooks.is_active()
    }

    /// Remove every spawned effect, release the hooks, forget all targets.
    pub fn dispose(&self) {
        let mut vfx = self.lock_vfx();
        let VfxState { hooks, controller } = &mut *vfx;
        controller.retire_all(hooks);
        hooks.teardown();
        drop(vfx);

        self.tracker.clear();
    }

    fn lock_vfx(&self) -> MutexGuard<'_, VfxState<H>> {
        self.vfx.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(target_os = "windows")]
impl CounterSpy<counterspy_core::DetourHooks> {
    /// Scan the host executable and hook its VFX routines.
    ///
    /// If the scan or hooking fails the plugin still tracks targets; only
    /// effects are unavailable.
    pub fn attach(config: ConfigHandle) -> Self {
        let hooks = match counterspy_core::ModuleImage::current_process() {
            Ok(image) => HookManager::start(&image),
            Err(err) => {
                tracing::error!(error = %err, "Host image unavailable, effects disabled");
                HookManager::disabled()
            }
        };
        Self::new(config, hooks)
    }
}
