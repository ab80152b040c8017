//! Live world-state model
//!
//! The host refreshes these snapshots once per world-state tick. Nothing in
//! this crate mutates them; they are read, filtered and copied.
//!
//! Two collaborators are expressed as traits so the engine can run against
//! the live object table in-process and against fixtures in tests:
//! - [`ObjectDirectory`]: the object table plus the game's own object index
//! - [`WorldState`]: adds the local player's identity and transition flags

use std::num::NonZeroUsize;

use serde::Serialize;

/// Stable game object identifier. `0` means "no object".
pub type EntityId = u64;

/// Target id carried by entities that are not targeting anything.
pub const NO_TARGET: EntityId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EntityKind {
    Player,
    BattleNpc,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A game object as seen in the object table this tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub position: Position,
    /// Id of the object this entity has targeted, or [`NO_TARGET`]
    pub target_id: EntityId,
    pub is_dead: bool,
    /// False once the host has invalidated the backing object
    pub is_valid: bool,
}

impl Entity {
    pub fn is_combatant(&self) -> bool {
        matches!(self.kind, EntityKind::Player | EntityKind::BattleNpc)
    }

    pub fn targets_self(&self) -> bool {
        self.target_id == self.id
    }

    pub fn is_targeting(&self, id: EntityId) -> bool {
        id != NO_TARGET && self.target_id == id
    }
}

/// The local player's identity and transitional state for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPlayer {
    pub id: EntityId,
    pub position: Position,
    pub is_between_areas: bool,
    pub is_in_cutscene: bool,
}

impl LocalPlayer {
    /// Zone transitions and cutscenes invalidate everything currently tracked.
    pub fn is_transitioning(&self) -> bool {
        self.is_between_areas || self.is_in_cutscene
    }
}

/// Address of a live object inside the host process.
///
/// Only ever handed back to native code; never dereferenced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeObject(NonZeroUsize);

impl NativeObject {
    pub fn from_addr(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    pub fn addr(self) -> usize {
        self.0.get()
    }
}

/// The host's object table.
pub trait ObjectDirectory {
    /// Every object currently known to the host, in table order.
    fn objects(&self) -> &[Entity];

    /// Resolve an id against the game's own object index.
    ///
    /// Returns `None` once the object has left the world, even if a stale
    /// copy still sits in [`ObjectDirectory::objects`].
    fn lookup(&self, id: EntityId) -> Option<NativeObject>;
}

/// Everything a world-state tick needs from the host.
pub trait WorldState: ObjectDirectory {
    /// `None` while the local player object is not yet available
    /// (login, loading screens).
    fn local_player(&self) -> Option<LocalPlayer>;
}
