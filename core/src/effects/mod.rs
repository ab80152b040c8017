//! Effect lifecycle
//!
//! Spawns a native VFX on every player targeting you and retires it as soon
//! as any condition that justified it stops holding.
//!
//! # Cadences
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │ render pass (frequent)   │        │ world-state tick (less so)   │
//! │ spawn_pass: NONE→ACTIVE  │        │ reconcile: ACTIVE→NONE       │
//! └────────────┬─────────────┘        └──────────────┬───────────────┘
//!              │            HandleTable              │
//!              └──────► entity id → EffectHandle ◄───┘
//! ```
//!
//! A spawn is keyed on the id being absent from the table, so repeated
//! render passes inside one tick never double-spawn.

mod controller;


pub use controller::{EffectLifecycleController, RetireReason};
