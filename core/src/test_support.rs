//! Fixtures shared by engine tests

use hashbrown::HashMap;

use crate::world::{
    Entity, EntityId, EntityKind, LocalPlayer, NativeObject, ObjectDirectory, Position, WorldState,
};

pub const LOCAL_PLAYER: EntityId = 1;

/// Object table stand-in. Every entity added resolves to a native address
/// unless it has been removed from the game's index with [`FakeWorld::vanish`].
#[derive(Debug, Default)]
pub struct FakeWorld {
    pub entities: Vec<Entity>,
    pub native: HashMap<EntityId, NativeObject>,
    pub player: Option<LocalPlayer>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self {
            player: Some(LocalPlayer {
                id: LOCAL_PLAYER,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn add(&mut self, entity: Entity) {
        let addr = 0x1000_0000 + (entity.id as usize) * 0x100;
        if let Some(obj) = NativeObject::from_addr(addr) {
            self.native.insert(entity.id, obj);
        }
        self.entities.push(entity);
    }

    pub fn entity_mut(&mut self, id: EntityId) -> &mut Entity {
        self.entities
            .iter_mut()
            .find(|e| e.id == id)
            .expect("entity exists in fixture")
    }

    /// Remove from both the table and the native index.
    pub fn vanish(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
        self.native.remove(&id);
    }

    pub fn native_of(&self, id: EntityId) -> usize {
        self.native[&id].addr()
    }

    pub fn set_cutscene(&mut self, in_cutscene: bool) {
        if let Some(player) = self.player.as_mut() {
            player.is_in_cutscene = in_cutscene;
        }
    }
}

impl ObjectDirectory for FakeWorld {
    fn objects(&self) -> &[Entity] {
        &self.entities
    }

    fn lookup(&self, id: EntityId) -> Option<NativeObject> {
        self.native.get(&id).copied()
    }
}

impl WorldState for FakeWorld {
    fn local_player(&self) -> Option<LocalPlayer> {
        self.player
    }
}

pub fn entity(id: EntityId, kind: EntityKind, target_id: EntityId) -> Entity {
    Entity {
        id,
        name: format!("Entity {id}"),
        kind,
        position: Position::default(),
        target_id,
        is_dead: false,
        is_valid: true,
    }
}

pub fn player_targeting(id: EntityId, target_id: EntityId) -> Entity {
    entity(id, EntityKind::Player, target_id)
}

pub fn npc_targeting(id: EntityId, target_id: EntityId) -> Entity {
    entity(id, EntityKind::BattleNpc, target_id)
}

pub fn at(mut entity: Entity, x: f32) -> Entity {
    entity.position = Position::new(x, 0.0, 0.0);
    entity
}
