//! Handle table reconciliation
//!
//! Both entry points take `&mut self`: the caller serializes the render pass
//! and the world-state tick (the plugin wraps this in a `Mutex`).

use hashbrown::HashMap;

use counterspy_types::EffectConfig;

use crate::interop::{EffectHandle, HookManager, VfxHooks, VfxStruct};
use crate::tracker::ObjectTracker;
use crate::world::{EntityId, ObjectDirectory};

/// Why a handle was removed during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// The game's object index no longer resolves the entity
    Vanished,
    Disabled,
    /// Spawned under a different effect path than the one configured now
    PathChanged,
    /// Dropped out of the tracked set
    NotTargeting,
    /// The create routine returned an address no effect instance can live at
    Unaddressable,
}

#[derive(Debug, Clone)]
struct SpawnedEffect {
    handle: EffectHandle,
    /// Path the handle was created with
    path: String,
}

/// Owns the entity → effect handle table.
#[derive(Debug, Default)]
pub struct EffectLifecycleController {
    handles: HashMap<EntityId, SpawnedEffect>,
}

impl EffectLifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render-pass step. Inserts handles, never removes them.
    ///
    /// Spawns on each tracked player without a handle when effects are
    /// enabled and the path is well formed. Holds off entirely while any
    /// handle from a previous path is still waiting for reconciliation.
    /// Returns the number of handles spawned.
    pub fn spawn_pass<H, D>(
        &mut self,
        config: &EffectConfig,
        tracker: &ObjectTracker,
        directory: &D,
        hooks: &mut HookManager<H>,
    ) -> usize
    where
        H: VfxHooks,
        D: ObjectDirectory + ?Sized,
    {
        if !config.should_spawn() || !hooks.is_active() {
            return 0;
        }
        if self
            .handles
            .values()
            .any(|spawned| spawned.path != config.effect_path)
        {
            return 0;
        }

        let mut spawned = 0;
        for player in tracker.query(true, false) {
            if self.handles.contains_key(&player.id) {
                continue;
            }

            let Some(object) = directory.lookup(player.id) else {
                tracing::debug!(entity_id = player.id, "GameObject not found");
                continue;
            };

            let Some(handle) = hooks.spawn(&config.effect_path, object) else {
                continue;
            };

            tracing::info!(
                entity_id = player.id,
                name = %player.name,
                handle = ?handle,
                "Playing VFX"
            );
            self.handles.insert(
                player.id,
                SpawnedEffect {
                    handle,
                    path: config.effect_path.clone(),
                },
            );
            spawned += 1;
        }
        spawned
    }

    /// World-state-tick step. Removes handles, never inserts them.
    ///
    /// Must run after the tracker's refresh for the same tick. Each owning
    /// entity is re-resolved against the game's object index rather than the
    /// tracked snapshot. Returns the number of handles removed.
    pub fn reconcile<H, D>(
        &mut self,
        config: &EffectConfig,
        tracker: &ObjectTracker,
        directory: &D,
        hooks: &mut HookManager<H>,
    ) -> usize
    where
        H: VfxHooks,
        D: ObjectDirectory + ?Sized,
    {
        let before = self.handles.len();

        self.handles.retain(|&id, spawned| {
            let Some(reason) = retire_reason(id, spawned, config, tracker, directory) else {
                return true;
            };

            tracing::debug!(entity_id = id, reason = ?reason, "Retiring VFX");
            hooks.remove(spawned.handle);
            false
        });

        before - self.handles.len()
    }

    /// Remove every handle this controller holds, regardless of state.
    pub fn retire_all<H: VfxHooks>(&mut self, hooks: &mut HookManager<H>) {
        for (_, spawned) in self.handles.drain() {
            hooks.remove(spawned.handle);
        }
    }

    pub fn handle_for(&self, id: EntityId) -> Option<EffectHandle> {
        self.handles.get(&id).map(|spawned| spawned.handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

fn retire_reason<D>(
    id: EntityId,
    spawned: &SpawnedEffect,
    config: &EffectConfig,
    tracker: &ObjectTracker,
    directory: &D,
) -> Option<RetireReason>
where
    D: ObjectDirectory + ?Sized,
{
    if VfxStruct::probe(spawned.handle).is_none() {
        Some(RetireReason::Unaddressable)
    } else if directory.lookup(id).is_none() {
        Some(RetireReason::Vanished)
    } else if !config.enabled {
        Some(RetireReason::Disabled)
    } else if spawned.path != config.effect_path {
        Some(RetireReason::PathChanged)
    } else if !tracker.is_targeting(id) {
        Some(RetireReason::NotTargeting)
    } else {
        None
    }
}
