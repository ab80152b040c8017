//! Object table polling
//!
//! Rebuilds the tracked set from the host's object table once per tick.
//! Readers on either cadence see the result of the last completed refresh,
//! never a partially rebuilt set.

use std::cmp::Ordering;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::HashMap;
use serde::Serialize;

use crate::world::{Entity, EntityId, EntityKind, LocalPlayer, ObjectDirectory};

/// What a call to [`ObjectTracker::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Local player unresolved; the previous set was kept as-is.
    Skipped,
    /// Zone transition or cutscene; the set was emptied.
    Cleared,
    /// The set was rebuilt from the directory.
    Updated { tracked: usize },
}

/// Per-kind counts for list and widget layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TargetSummary {
    pub players: usize,
    pub npcs: usize,
}

impl TargetSummary {
    pub fn is_empty(&self) -> bool {
        self.players == 0 && self.npcs == 0
    }
}

#[derive(Debug, Clone)]
struct TrackedEntity {
    entity: Entity,
    /// Position in the iteration that confirmed this entity
    rank: usize,
}

/// Thread-safe set of entities that are targeting the local player.
#[derive(Debug, Default)]
pub struct ObjectTracker {
    objects: RwLock<HashMap<EntityId, TrackedEntity>>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the tracked set from the directory.
    ///
    /// Holds the write lock for the entire rebuild. An entity is kept iff it
    /// is valid, alive, a player or battle NPC, not the local player, not
    /// targeting itself, and targeting the local player (any target in
    /// `preview_mode`). Preview mode iterates nearest-first.
    pub fn refresh<D>(
        &self,
        directory: &D,
        local_player: Option<&LocalPlayer>,
        preview_mode: bool,
    ) -> RefreshOutcome
    where
        D: ObjectDirectory + ?Sized,
    {
        let Some(player) = local_player else {
            return RefreshOutcome::Skipped;
        };

        let mut objects = self.write();

        if player.is_transitioning() {
            if !objects.is_empty() {
                tracing::debug!(
                    dropped = objects.len(),
                    between_areas = player.is_between_areas,
                    cutscene = player.is_in_cutscene,
                    "Clearing tracked targets"
                );
            }
            objects.clear();
            return RefreshOutcome::Cleared;
        }

        let mut candidates: Vec<&Entity> = directory.objects().iter().collect();
        if preview_mode {
            candidates.sort_by(|a, b| {
                let da = a.position.distance(&player.position);
                let db = b.position.distance(&player.position);
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        }

        let mut rebuilt = HashMap::with_capacity(objects.len());
        for entity in candidates {
            if !qualifies(entity, player.id, preview_mode) {
                continue;
            }
            let rank = rebuilt.len();
            rebuilt.entry(entity.id).or_insert_with(|| TrackedEntity {
                entity: entity.clone(),
                rank,
            });
        }

        *objects = rebuilt;
        RefreshOutcome::Updated {
            tracked: objects.len(),
        }
    }

    /// Snapshot of tracked entities of the requested kinds, in refresh order.
    pub fn query(&self, include_players: bool, include_npcs: bool) -> Vec<Entity> {
        let objects = self.read();

        let mut selected: Vec<&TrackedEntity> = objects
            .values()
            .filter(|tracked| match tracked.entity.kind {
                EntityKind::Player => include_players,
                EntityKind::BattleNpc => include_npcs,
                EntityKind::Other => false,
            })
            .collect();
        selected.sort_by_key(|tracked| tracked.rank);
        selected.into_iter().map(|t| t.entity.clone()).collect()
    }

    pub fn is_targeting(&self, id: EntityId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn summary(&self) -> TargetSummary {
        self.read()
            .values()
            .fold(TargetSummary::default(), |mut summary, tracked| {
                match tracked.entity.kind {
                    EntityKind::Player => summary.players += 1,
                    EntityKind::BattleNpc => summary.npcs += 1,
                    EntityKind::Other => {}
                }
                summary
            })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // A panicked writer leaves either the previous set or a finished rebuild
    // in place, and the next refresh replaces it wholesale.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<EntityId, TrackedEntity>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<EntityId, TrackedEntity>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The targeting predicate.
fn qualifies(entity: &Entity, local_player_id: EntityId, preview_mode: bool) -> bool {
    entity.is_valid
        && !entity.is_dead
        && entity.is_combatant()
        && entity.id != local_player_id
        && !entity.targets_self()
        && (preview_mode || entity.is_targeting(local_player_id))
}
