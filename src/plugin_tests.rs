//! End-to-end tests for the plugin callbacks against a scripted world

use std::cell::Cell;

use counterspy_core::interop::{CreateCall, EffectHandle, HookError, VfxAddresses};
use counterspy_core::{
    ConfigHandle, CounterSpyConfig, Entity, EntityId, EntityKind, HookManager, LocalPlayer,
    NativeObject, ObjectDirectory, Position, RefreshOutcome, VfxHooks, WorldState,
};

use crate::CounterSpy;

// ═══════════════════════════════════════════════════════════════════════════
// Test Helpers
// ═══════════════════════════════════════════════════════════════════════════

const ME: EntityId = 1;

thread_local! {
    static CREATED: Cell<usize> = const { Cell::new(0) };
    static REMOVED: Cell<usize> = const { Cell::new(0) };
    static RELEASED: Cell<bool> = const { Cell::new(false) };
}

fn reset_counters() {
    CREATED.set(0);
    REMOVED.set(0);
    RELEASED.set(false);
}

struct CountingHooks;

impl VfxHooks for CountingHooks {
    fn install(_addresses: VfxAddresses) -> Result<Self, HookError> {
        Ok(Self)
    }

    fn create(&mut self, call: &CreateCall<'_>) -> usize {
        CREATED.set(CREATED.get() + 1);
        call.target.addr() * 0x10
    }

    fn remove(&mut self, _handle: EffectHandle, _flag: u8) {
        REMOVED.set(REMOVED.get() + 1);
    }

    fn release(self) {
        RELEASED.set(true);
    }
}

#[derive(Default)]
struct World {
    entities: Vec<Entity>,
    player: Option<LocalPlayer>,
}

impl World {
    fn with_player() -> Self {
        Self {
            entities: Vec::new(),
            player: Some(LocalPlayer {
                id: ME,
                ..Default::default()
            }),
        }
    }

    fn spawn(&mut self, id: EntityId, kind: EntityKind, target_id: EntityId, x: f32) {
        self.entities.push(Entity {
            id,
            name: format!("Entity {id}"),
            kind,
            position: Position::new(x, 0.0, 0.0),
            target_id,
            is_dead: false,
            is_valid: true,
        });
    }

    fn get_mut(&mut self, id: EntityId) -> &mut Entity {
        self.entities.iter_mut().find(|e| e.id == id).unwrap()
    }
}

impl ObjectDirectory for World {
    fn objects(&self) -> &[Entity] {
        &self.entities
    }

    fn lookup(&self, id: EntityId) -> Option<NativeObject> {
        self.entities
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| NativeObject::from_addr(0x4000 + e.id as usize))
    }
}

impl WorldState for World {
    fn local_player(&self) -> Option<LocalPlayer> {
        self.player
    }
}

fn plugin(config: CounterSpyConfig) -> CounterSpy<CountingHooks> {
    reset_counters();
    let hooks = HookManager::initialize(Ok(VfxAddresses {
        create: 0x1000,
        remove: 0x2000,
    }));
    CounterSpy::new(ConfigHandle::new(config), hooks)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_npc_targets_then_dies() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::BattleNpc, ME, 5.0);

    spy.on_tick(&world);
    assert!(spy.is_targeting_you(10));

    world.get_mut(10).is_dead = true;
    spy.on_tick(&world);
    assert!(!spy.is_targeting_you(10));
    assert!(spy.summary().is_empty());
}

#[test]
fn test_targeting_player_gets_effect_until_it_looks_away() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::Player, ME, 5.0);

    spy.on_tick(&world);
    spy.on_draw(&world);
    spy.on_draw(&world);
    assert_eq!(spy.active_effects(), 1);
    assert_eq!(CREATED.get(), 1);

    world.get_mut(10).target_id = 0;
    spy.on_tick(&world);
    assert_eq!(spy.active_effects(), 0);
    assert_eq!(REMOVED.get(), 1);
}

#[test]
fn test_disabling_in_config_clears_effects_next_tick() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::Player, ME, 5.0);
    world.spawn(11, EntityKind::Player, ME, 8.0);

    spy.on_tick(&world);
    spy.on_draw(&world);
    assert_eq!(spy.active_effects(), 2);

    spy.config().update(|config| config.effect.enabled = false);
    spy.on_draw(&world);
    assert_eq!(spy.active_effects(), 2, "render pass never removes");

    spy.on_tick(&world);
    assert_eq!(spy.active_effects(), 0);
    assert_eq!(REMOVED.get(), 2);
}

#[test]
fn test_preview_mode_lists_everyone_nearby() {
    let mut config = CounterSpyConfig::default();
    config.preview_mode = true;
    config.targets.show_npcs = true;
    let spy = plugin(config);

    let mut world = World::with_player();
    world.spawn(10, EntityKind::BattleNpc, 0, 40.0);
    world.spawn(11, EntityKind::BattleNpc, 0, 10.0);
    world.spawn(12, EntityKind::BattleNpc, 99, 25.0);
    world.spawn(13, EntityKind::Player, 0, 2.0);

    assert_eq!(spy.on_tick(&world), RefreshOutcome::Updated { tracked: 4 });
    let ids: Vec<EntityId> = spy.targets().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![13, 11, 12, 10]);
}

#[test]
fn test_target_list_respects_kind_filter() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::BattleNpc, ME, 5.0);
    world.spawn(11, EntityKind::Player, ME, 5.0);

    spy.on_tick(&world);
    let ids: Vec<EntityId> = spy.targets().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![11]);

    spy.config().update(|config| config.targets.show_npcs = true);
    assert_eq!(spy.targets().len(), 2);
}

#[test]
fn test_unresolved_player_keeps_previous_targets() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::BattleNpc, ME, 5.0);
    spy.on_tick(&world);

    world.player = None;
    assert_eq!(spy.on_tick(&world), RefreshOutcome::Skipped);
    assert!(spy.is_targeting_you(10));
}

#[test]
fn test_dispose_drains_effects_then_releases_hooks() {
    let spy = plugin(CounterSpyConfig::default());
    let mut world = World::with_player();
    world.spawn(10, EntityKind::Player, ME, 5.0);
    world.spawn(11, EntityKind::Player, ME, 5.0);
    spy.on_tick(&world);
    spy.on_draw(&world);

    spy.dispose();

    assert_eq!(REMOVED.get(), 2);
    assert!(RELEASED.get());
    assert!(!spy.hooks_active());
    assert!(spy.tracker().is_empty());

    spy.on_tick(&world);
    spy.on_draw(&world);
    assert_eq!(CREATED.get(), 2, "no effects after dispose");
}

#[test]
fn test_failed_startup_still_tracks_targets() {
    reset_counters();
    let hooks: HookManager<CountingHooks> = HookManager::disabled();
    let spy = CounterSpy::new(ConfigHandle::default(), hooks);
    let mut world = World::with_player();
    world.spawn(10, EntityKind::Player, ME, 5.0);

    spy.on_tick(&world);
    spy.on_draw(&world);

    assert!(spy.is_targeting_you(10));
    assert_eq!(spy.active_effects(), 0);
    assert_eq!(CREATED.get(), 0);
    spy.dispose();
    assert!(!RELEASED.get());
}
