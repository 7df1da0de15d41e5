//! Engine-free physics world
//!
//! Integrates forces with semi-implicit Euler and never resolves overlaps.
//! Contacts are only reported when queued by the caller, which makes merge
//! chains and loss timers reproducible without a solver in the loop.

use std::f32::consts::PI;

use glam::Vec2;

use super::{BodyDesc, BodyHandle, BodyKind, BodyState, Contact, PhysicsWorld, check_desc};
use crate::sim::object::ObjectId;

#[derive(Debug, Clone)]
struct ScriptedBody {
    handle: BodyHandle,
    kind: BodyKind,
    position: Vec2,
    rotation: f32,
    velocity: Vec2,
    mass: f32,
    radius: f32,
    object: ObjectId,
    force: Vec2,
}

#[derive(Debug, Default)]
pub struct ScriptedWorld {
    bodies: Vec<ScriptedBody>,
    queued: Vec<(BodyHandle, BodyHandle)>,
    next_handle: u64,
    steps: u64,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a begin-contact between two bodies on the next step
    pub fn queue_contact(&mut self, a: BodyHandle, b: BodyHandle) {
        self.queued.push((a, b));
    }

    /// Teleport a body
    pub fn place(&mut self, body: BodyHandle, position: Vec2, velocity: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.position = position;
            b.velocity = velocity;
        }
    }

    pub fn radius_of(&self, body: BodyHandle) -> Option<f32> {
        self.get(body).map(|b| b.radius)
    }

    /// Number of steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn get(&self, body: BodyHandle) -> Option<&ScriptedBody> {
        self.bodies.iter().find(|b| b.handle == body)
    }

    fn get_mut(&mut self, body: BodyHandle) -> Option<&mut ScriptedBody> {
        self.bodies.iter_mut().find(|b| b.handle == body)
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        check_desc(desc);
        self.next_handle += 1;
        let handle = BodyHandle(self.next_handle);
        let mass = match desc.kind {
            BodyKind::Dynamic => desc.density * PI * desc.radius * desc.radius,
            BodyKind::Static => 0.0,
        };
        self.bodies.push(ScriptedBody {
            handle,
            kind: desc.kind,
            position: desc.position,
            rotation: desc.rotation,
            velocity: desc.velocity,
            mass,
            radius: desc.radius,
            object: desc.object,
            force: Vec2::ZERO,
        });
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        self.bodies.retain(|b| b.handle != body);
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.force += force;
        }
    }

    fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>) {
        self.steps += 1;
        for body in &mut self.bodies {
            if body.kind == BodyKind::Dynamic && body.mass > 0.0 {
                body.velocity += body.force / body.mass * dt;
                body.position += body.velocity * dt;
            }
            body.force = Vec2::ZERO;
        }

        let first = contacts.len();
        for (a, b) in std::mem::take(&mut self.queued) {
            if let (Some(a), Some(b)) = (self.object_of(a), self.object_of(b)) {
                contacts.push(Contact::new(a, b));
            }
        }
        contacts[first..].sort_by_key(Contact::sort_key);
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        self.bodies.iter().map(|b| b.handle).collect()
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        self.get(body).map(|b| BodyState {
            kind: b.kind,
            position: b.position,
            rotation: b.rotation,
            velocity: b.velocity,
            mass: b.mass,
        })
    }

    fn object_of(&self, body: BodyHandle) -> Option<ObjectId> {
        self.get(body).map(|b| b.object)
    }

    fn set_object(&mut self, body: BodyHandle, object: ObjectId) {
        if let Some(b) = self.get_mut(body) {
            b.object = object;
        }
    }
}
