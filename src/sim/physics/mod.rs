//! Rigid-body physics seam
//!
//! The solver itself is an external engine. The simulation only needs the
//! narrow contract below: circular bodies, forces, fixed steps and
//! begin-contact events reported as pairs of game objects.

mod rapier;
mod scripted;

pub use rapier::RapierWorld;
pub use scripted::ScriptedWorld;

use glam::Vec2;

use super::object::ObjectId;

/// Opaque body id handed out by a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// Everything needed to create a body with one circular fixture
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub radius: f32,
    pub density: f32,
    /// Back-reference used to recover the game object from contacts
    pub object: ObjectId,
}

/// Snapshot of a body after the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub kind: BodyKind,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub mass: f32,
}

/// Two objects whose fixtures started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: ObjectId,
    pub b: ObjectId,
}

impl Contact {
    pub fn new(a: ObjectId, b: ObjectId) -> Self {
        Self { a, b }
    }

    /// Order-independent key for deterministic sorting
    pub fn sort_key(&self) -> (ObjectId, ObjectId) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

/// Contract consumed from the physics engine
pub trait PhysicsWorld {
    /// Create a body. Panics on a non-positive radius.
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Destroy a body and its fixture. Unknown handles are ignored.
    fn destroy_body(&mut self, body: BodyHandle);

    /// Apply a force at the center of mass for the next step
    fn apply_force(&mut self, body: BodyHandle, force: Vec2);

    /// Advance by `dt` seconds, appending begin-contact pairs to `contacts`
    /// in a deterministic order
    fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>);

    /// Live bodies in a stable order
    fn bodies(&self) -> Vec<BodyHandle>;

    fn body_state(&self, body: BodyHandle) -> Option<BodyState>;

    fn object_of(&self, body: BodyHandle) -> Option<ObjectId>;

    fn set_object(&mut self, body: BodyHandle, object: ObjectId);
}

/// Panic on fixtures the engine cannot represent
pub(crate) fn check_desc(desc: &BodyDesc) {
    assert!(
        desc.radius > 0.0 && desc.radius.is_finite(),
        "fixture radius must be positive, got {}",
        desc.radius
    );
    assert!(desc.density >= 0.0, "fixture density must be non-negative");
}
