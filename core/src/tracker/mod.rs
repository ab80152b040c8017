//! Targeting tracker
//!
//! Maintains the set of live entities currently targeting the local player
//! (or, in preview mode, every nearby combatant).
//!
//! # Cadence
//!
//! ```text
//!   world-state tick ──► ObjectTracker::refresh ──► TrackedSet (rebuilt under write lock)
//!                                                        │
//!   render pass / tick ──► query / is_targeting ◄────────┘  (read lock)
//! ```

mod object_tracker;


pub use object_tracker::{ObjectTracker, RefreshOutcome, TargetSummary};
