//! Game objects living in the physics world
//!
//! Every body carries the id of exactly one object. The kind is a closed
//! variant resolved once when a body is read back, never re-checked ad hoc.

use serde::{Deserialize, Serialize};

use super::physics::BodyHandle;
use super::rank::Rank;

/// Stable id of a game object (allocated by the session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Gameplay state of a physical fruit
#[derive(Debug, Clone, PartialEq)]
pub struct Fruit {
    pub rank: Rank,
    /// Seconds spent out of bounds since last being inside (grounded only)
    pub outside_bounds_time: f32,
    /// Consumed by a merge during the current resolution pass
    pub destroyed: bool,
}

impl Fruit {
    pub fn new(rank: Rank) -> Self {
        Self {
            rank,
            outside_bounds_time: 0.0,
            destroyed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Planet,
    Fruit(Fruit),
}

/// An object owned by the session, backed by one physics body
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub id: ObjectId,
    pub body: BodyHandle,
    pub kind: ObjectKind,
    /// Has touched the planet or another grounded object
    has_touched_ground: bool,
}

impl GameObject {
    pub fn planet(id: ObjectId, body: BodyHandle) -> Self {
        Self {
            id,
            body,
            kind: ObjectKind::Planet,
            has_touched_ground: true,
        }
    }

    pub fn fruit(id: ObjectId, body: BodyHandle, rank: Rank, has_touched_ground: bool) -> Self {
        Self {
            id,
            body,
            kind: ObjectKind::Fruit(Fruit::new(rank)),
            has_touched_ground,
        }
    }

    pub fn has_touched_ground(&self) -> bool {
        self.has_touched_ground
    }

    /// Planets are always grounded; fruit keep the flag once set
    pub fn set_touched_ground(&mut self, touched: bool) {
        self.has_touched_ground = match self.kind {
            ObjectKind::Planet => true,
            ObjectKind::Fruit(_) => touched,
        };
    }

    pub fn as_fruit(&self) -> Option<&Fruit> {
        match &self.kind {
            ObjectKind::Fruit(fruit) => Some(fruit),
            ObjectKind::Planet => None,
        }
    }

    pub fn as_fruit_mut(&mut self) -> Option<&mut Fruit> {
        match &mut self.kind {
            ObjectKind::Fruit(fruit) => Some(fruit),
            ObjectKind::Planet => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.as_fruit().is_some_and(|f| f.destroyed)
    }
}
