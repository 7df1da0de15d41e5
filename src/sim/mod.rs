//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by object ID, contacts sorted per step)
//! - No rendering or platform dependencies

pub mod collision;
pub mod game_loop;
pub mod object;
pub mod physics;
pub mod rank;
pub mod slots;
pub mod state;
pub mod tick;
pub mod wait;

pub use collision::{Merge, Resolution, propagate_ground_touch, resolve_merges};
pub use game_loop::{FixedStepLoop, FrameTicks};
pub use object::{Fruit, GameObject, ObjectId, ObjectKind};
pub use physics::{
    BodyDesc, BodyHandle, BodyKind, BodyState, Contact, PhysicsWorld, RapierWorld, ScriptedWorld,
};
pub use rank::{Rank, RankModel};
pub use slots::{HeldFruit, PlayerSlot, SlotLayout, Wedge};
pub use state::{GamePhase, GameState};
pub use tick::{TickReport, tick};
pub use wait::{ClickSignal, Dismissal, First, WaitClock, game_over_sequence, poll_once, race};
