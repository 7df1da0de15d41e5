//! rapier2d-backed physics world
//!
//! Zero engine gravity: the radial pull and drag are applied as forces by the
//! tick. Game object ids ride along in both the body and collider `user_data`
//! so collision events map straight back to objects.

use glam::Vec2;
use rapier2d::prelude::*;

use super::{BodyDesc, BodyHandle, BodyKind, BodyState, Contact, PhysicsWorld, check_desc};
use crate::sim::object::ObjectId;

pub struct RapierWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    fn pack(handle: RigidBodyHandle) -> BodyHandle {
        let (index, generation) = handle.into_raw_parts();
        BodyHandle(((generation as u64) << 32) | index as u64)
    }

    fn unpack(body: BodyHandle) -> RigidBodyHandle {
        RigidBodyHandle::from_raw_parts(body.0 as u32, (body.0 >> 32) as u32)
    }

    fn collider_object(&self, handle: ColliderHandle) -> Option<ObjectId> {
        self.collider_set
            .get(handle)
            .map(|collider| ObjectId(collider.user_data as u32))
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        check_desc(desc);

        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic()
                .linvel(vector![desc.velocity.x, desc.velocity.y])
                .ccd_enabled(true),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let rb = builder
            .translation(vector![desc.position.x, desc.position.y])
            .rotation(desc.rotation)
            .user_data(desc.object.0 as u128)
            .build();
        let body_handle = self.rigid_body_set.insert(rb);

        let collider = ColliderBuilder::ball(desc.radius)
            .density(desc.density)
            .friction(0.5)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(desc.object.0 as u128)
            .build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        Self::pack(body_handle)
    }

    fn destroy_body(&mut self, body: BodyHandle) {
        self.rigid_body_set.remove(
            Self::unpack(body),
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(rb) = self.rigid_body_set.get_mut(Self::unpack(body)) {
            rb.add_force(vector![force.x, force.y], true);
        }
    }

    fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>) {
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None, // query pipeline (unused)
            &(),  // physics hooks
            &event_handler,
        );

        // User forces persist in rapier until reset; ours are per tick.
        for (_, rb) in self.rigid_body_set.iter_mut() {
            rb.reset_forces(false);
        }

        let first = contacts.len();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                if let (Some(a), Some(b)) = (self.collider_object(h1), self.collider_object(h2)) {
                    contacts.push(Contact::new(a, b));
                }
            }
        }
        // Channel delivery order is not stable across runs.
        contacts[first..].sort_by_key(Contact::sort_key);
    }

    fn bodies(&self) -> Vec<BodyHandle> {
        let mut bodies: Vec<_> = self
            .rigid_body_set
            .iter()
            .map(|(handle, _)| Self::pack(handle))
            .collect();
        bodies.sort();
        bodies
    }

    fn body_state(&self, body: BodyHandle) -> Option<BodyState> {
        let rb = self.rigid_body_set.get(Self::unpack(body))?;
        let translation = rb.translation();
        let linvel = rb.linvel();
        Some(BodyState {
            kind: if rb.is_dynamic() {
                BodyKind::Dynamic
            } else {
                BodyKind::Static
            },
            position: Vec2::new(translation.x, translation.y),
            rotation: rb.rotation().angle(),
            velocity: Vec2::new(linvel.x, linvel.y),
            mass: rb.mass(),
        })
    }

    fn object_of(&self, body: BodyHandle) -> Option<ObjectId> {
        self.rigid_body_set
            .get(Self::unpack(body))
            .map(|rb| ObjectId(rb.user_data as u32))
    }

    fn set_object(&mut self, body: BodyHandle, object: ObjectId) {
        if let Some(rb) = self.rigid_body_set.get_mut(Self::unpack(body)) {
            rb.user_data = object.0 as u128;
            for &collider in rb.colliders() {
                if let Some(collider) = self.collider_set.get_mut(collider) {
                    collider.user_data = object.0 as u128;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(kind: BodyKind, position: Vec2, radius: f32, object: u32) -> BodyDesc {
        BodyDesc {
            kind,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            radius,
            density: if kind == BodyKind::Static { 0.0 } else { 1.0 },
            object: ObjectId(object),
        }
    }

    #[test]
    fn test_handles_round_trip_objects() {
        let mut world = RapierWorld::new();
        let planet = world.create_body(&ball(BodyKind::Static, Vec2::ZERO, 10.0, 1));
        let fruit = world.create_body(&ball(BodyKind::Dynamic, Vec2::new(20.0, 0.0), 1.0, 2));

        assert_eq!(world.object_of(planet), Some(ObjectId(1)));
        assert_eq!(world.object_of(fruit), Some(ObjectId(2)));
        assert_eq!(world.bodies().len(), 2);

        world.set_object(fruit, ObjectId(7));
        assert_eq!(world.object_of(fruit), Some(ObjectId(7)));

        world.destroy_body(fruit);
        assert_eq!(world.bodies(), vec![planet]);
        assert!(world.body_state(fruit).is_none());
    }

    #[test]
    fn test_force_pulls_body_and_reports_contact() {
        let mut world = RapierWorld::new();
        world.create_body(&ball(BodyKind::Static, Vec2::ZERO, 10.0, 1));
        let fruit = world.create_body(&ball(BodyKind::Dynamic, Vec2::new(13.0, 0.0), 1.0, 2));

        let mut contacts = Vec::new();
        for _ in 0..120 {
            let state = world.body_state(fruit).unwrap();
            let pull = -state.position.normalize_or_zero() * 30.0 * state.mass.max(1e-3);
            world.apply_force(fruit, pull);
            world.step(1.0 / 60.0, &mut contacts);
        }

        let state = world.body_state(fruit).unwrap();
        assert!(state.position.length() < 12.0);
        assert!(
            contacts
                .iter()
                .any(|c| c.sort_key() == (ObjectId(1), ObjectId(2)))
        );
    }

    #[test]
    #[should_panic]
    fn test_zero_radius_is_fatal() {
        let mut world = RapierWorld::new();
        world.create_body(&ball(BodyKind::Dynamic, Vec2::ZERO, 0.0, 1));
    }
}
