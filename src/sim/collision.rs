//! Contact resolution for buffered collisions
//!
//! The physics world reports begin-contact pairs during a step. After the
//! step, in buffer order:
//! 1. ground-touch flags are OR-ed across every touching pair
//! 2. same-rank fruit pairs merge, each object at most once per pass

use std::collections::BTreeMap;

use glam::Vec2;

use super::object::{GameObject, ObjectId};
use super::physics::{Contact, PhysicsWorld};
use super::rank::Rank;
use super::state::GameState;

/// One resolved merge
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// Rank of the two consumed fruit
    pub rank: Rank,
    pub consumed: (ObjectId, ObjectId),
    /// Fruit of the next rank, `None` at the ceiling
    pub produced: Option<ObjectId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub points: u64,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub merges: Vec<Merge>,
    /// Pop cues, capped per tick
    pub pops: Vec<Rank>,
    pub points: u64,
}

/// Spread "touched ground" across every touching pair
pub fn propagate_ground_touch(objects: &mut BTreeMap<ObjectId, GameObject>, contacts: &[Contact]) {
    for contact in contacts {
        let (Some(a), Some(b)) = (objects.get(&contact.a), objects.get(&contact.b)) else {
            continue;
        };
        let touched = a.has_touched_ground() || b.has_touched_ground();
        for id in [contact.a, contact.b] {
            if let Some(object) = objects.get_mut(&id) {
                object.set_touched_ground(touched);
            }
        }
    }
}

/// Merge equal-rank fruit pairs and award points
///
/// An object destroyed earlier in the pass is skipped, so three or more
/// touching fruit of one rank produce at most one merge per object.
/// Destroyed objects are dropped from the session before returning.
pub fn resolve_merges<W: PhysicsWorld>(
    state: &mut GameState,
    world: &mut W,
    contacts: &[Contact],
) -> Resolution {
    let mut resolution = Resolution::default();
    let max_pops = state.config.max_pops_per_tick;

    for contact in contacts {
        let Some((rank, touched)) = mergeable(&state.objects, contact) else {
            continue;
        };
        let body_a = state.objects[&contact.a].body;
        let body_b = state.objects[&contact.b].body;
        let (Some(a), Some(b)) = (world.body_state(body_a), world.body_state(body_b)) else {
            continue;
        };

        let position = (a.position + b.position) * 0.5;
        let velocity = (a.velocity + b.velocity) * 0.5;

        for (id, body) in [(contact.a, body_a), (contact.b, body_b)] {
            if let Some(fruit) = state.objects.get_mut(&id).and_then(GameObject::as_fruit_mut) {
                fruit.destroyed = true;
            }
            world.destroy_body(body);
        }

        let produced = state
            .ranks
            .next(rank)
            .map(|next| state.spawn_fruit(world, next, position, velocity, 0.0, touched));

        let points = state.ranks.score_value(rank);
        state.score += points;
        resolution.points += points;
        if resolution.pops.len() < max_pops {
            resolution.pops.push(rank);
        }

        log::debug!(
            "merge rank {} ({:?} + {:?}) -> {:?}, +{} points",
            rank,
            contact.a,
            contact.b,
            produced,
            points
        );
        resolution.merges.push(Merge {
            rank,
            consumed: (contact.a, contact.b),
            produced,
            position,
            velocity,
            points,
        });
    }

    state.objects.retain(|_, object| !object.is_destroyed());
    resolution
}

/// Rank and inherited ground flag if both sides are live fruit of one rank
fn mergeable(objects: &BTreeMap<ObjectId, GameObject>, contact: &Contact) -> Option<(Rank, bool)> {
    if contact.a == contact.b {
        return None;
    }
    let a = objects.get(&contact.a)?;
    let b = objects.get(&contact.b)?;
    let (fa, fb) = (a.as_fruit()?, b.as_fruit()?);
    if fa.destroyed || fb.destroyed || fa.rank != fb.rank {
        return None;
    }
    Some((fa.rank, a.has_touched_ground() || b.has_touched_ground()))
}
