//! Fixed timestep simulation tick
//!
//! Advances one session by one step: forces, physics, contact resolution,
//! then loss detection.

use super::collision::{Merge, propagate_ground_touch, resolve_merges};
use super::physics::{BodyKind, PhysicsWorld};
use super::rank::Rank;
use super::state::GameState;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub merges: Vec<Merge>,
    /// Pop cues for the audio layer, capped per tick
    pub pops: Vec<Rank>,
    pub score_changed: bool,
    /// Longest out-of-bounds time among grounded fruit
    pub max_outside_time: f32,
    pub danger: bool,
    /// The session entered game over on this tick
    pub game_over: bool,
}

/// Advance the session by one fixed timestep
///
/// Does nothing once the session is over.
pub fn tick<W: PhysicsWorld>(state: &mut GameState, world: &mut W, dt: f32) -> TickReport {
    if state.is_over() {
        return TickReport::default();
    }
    state.time_ticks += 1;

    apply_forces(state, world);

    let mut contacts = std::mem::take(&mut state.contacts);
    contacts.clear();
    world.step(dt, &mut contacts);

    propagate_ground_touch(&mut state.objects, &contacts);
    let resolution = resolve_merges(state, world, &contacts);
    contacts.clear();
    state.contacts = contacts;

    let max_outside_time = update_bounds_timers(state, world, dt);
    state.danger = max_outside_time > state.config.danger_time();

    let mut report = TickReport {
        score_changed: resolution.points > 0,
        merges: resolution.merges,
        pops: resolution.pops,
        max_outside_time,
        danger: state.danger,
        game_over: false,
    };

    if max_outside_time > state.config.game_over_time {
        report.game_over = state.enter_game_over();
        report.danger = state.danger;
    }
    report
}

/// Radial pull toward the origin plus linear drag, both scaled by mass
fn apply_forces<W: PhysicsWorld>(state: &GameState, world: &mut W) {
    let gravity = state.config.gravity;
    let drag = state.config.drag;
    for body in world.bodies() {
        let Some(body_state) = world.body_state(body) else {
            continue;
        };
        if body_state.kind != BodyKind::Dynamic {
            continue;
        }
        let pull = -body_state.position.normalize_or_zero() * gravity;
        let resist = -body_state.velocity * drag;
        world.apply_force(body, (pull + resist) * body_state.mass);
    }
}

/// Update each fruit's out-of-bounds timer; returns the largest
///
/// A timer only runs while the fruit is grounded and beyond the safe radius,
/// and resets to zero otherwise.
fn update_bounds_timers<W: PhysicsWorld>(state: &mut GameState, world: &W, dt: f32) -> f32 {
    let safe_radius = state.config.safe_radius();
    let mut max_time = 0.0f32;

    for object in state.objects.values_mut() {
        let grounded = object.has_touched_ground();
        let Some(position) = world.body_state(object.body).map(|b| b.position) else {
            continue;
        };
        let Some(fruit) = object.as_fruit_mut() else {
            continue;
        };
        if grounded && position.length() > safe_radius {
            fruit.outside_bounds_time += dt;
        } else {
            fruit.outside_bounds_time = 0.0;
        }
        max_time = max_time.max(fruit.outside_bounds_time);
    }
    max_time
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::consts::TIME_STEP;
    use crate::settings::GameConfig;
    use crate::sim::object::ObjectId;
    use crate::sim::physics::ScriptedWorld;
    use crate::sim::state::GamePhase;

    fn session(config: GameConfig) -> (GameState, ScriptedWorld) {
        let mut world = ScriptedWorld::new();
        let state = GameState::new(config, 99, &mut world);
        (state, world)
    }

    /// Exactly representable step so timer thresholds are hit exactly
    const COARSE_DT: f32 = 0.125;

    fn one_player() -> GameConfig {
        GameConfig::with_players(1)
    }

    /// Fruit parked outside the safe radius with no forces acting
    fn parked_outside(state: &mut GameState, world: &mut ScriptedWorld, touched: bool) -> ObjectId {
        state.config.gravity = 0.0;
        let at = Vec2::new(state.config.safe_radius() + 1.0, 0.0);
        state.spawn_fruit(world, Rank::new(0), at, Vec2::ZERO, 0.0, touched)
    }

    fn contact(world: &mut ScriptedWorld, state: &GameState, a: ObjectId, b: ObjectId) {
        world.queue_contact(state.objects[&a].body, state.objects[&b].body);
    }

    #[test]
    fn test_gravity_pulls_toward_planet() {
        let (mut state, mut world) = session(one_player());
        let id = state.drop_fruit(&mut world, 0).unwrap();
        let start = world.body_state(state.objects[&id].body).unwrap().position;

        for _ in 0..30 {
            tick(&mut state, &mut world, TIME_STEP);
        }
        let body = world.body_state(state.objects[&id].body).unwrap();
        assert!(body.position.length() < start.length());
        // Pull is radial
        assert!(body.position.normalize().dot(start.normalize()) > 0.999);
        assert_eq!(state.time_ticks, 30);
    }

    #[test]
    fn test_drag_slows_free_fruit() {
        let (mut state, mut world) = session(one_player());
        state.config.gravity = 0.0;
        let id = state.spawn_fruit(
            &mut world,
            Rank::new(0),
            Vec2::new(20.0, 0.0),
            Vec2::new(0.0, 10.0),
            0.0,
            false,
        );
        tick(&mut state, &mut world, TIME_STEP);
        let speed = world.body_state(state.objects[&id].body).unwrap().velocity.length();
        assert!(speed < 10.0);
    }

    #[test]
    fn test_merge_chain_scores_1_4_10_then_vanishes() {
        let config = GameConfig {
            max_rank: 2,
            min_spawn_rank: 0,
            max_spawn_rank: 2,
            ..one_player()
        };
        let (mut state, mut world) = session(config);
        state.config.gravity = 0.0;
        let planet = state.planet();

        let spawn = |state: &mut GameState, world: &mut ScriptedWorld, rank: u8, x: f32| {
            state.spawn_fruit(world, Rank::new(rank), Vec2::new(x, 0.0), Vec2::ZERO, 0.0, false)
        };

        let a = spawn(&mut state, &mut world, 0, 12.0);
        let b = spawn(&mut state, &mut world, 0, 14.0);
        contact(&mut world, &state, planet, a);
        contact(&mut world, &state, a, b);
        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(state.score, 1);
        assert!(report.score_changed);
        let r1 = report.merges[0].produced.unwrap();
        assert!(state.objects[&r1].has_touched_ground());

        let c = spawn(&mut state, &mut world, 1, 16.0);
        contact(&mut world, &state, r1, c);
        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(state.score, 4);
        let r2 = report.merges[0].produced.unwrap();
        assert_eq!(state.objects[&r2].as_fruit().unwrap().rank, Rank::new(2));

        let d = spawn(&mut state, &mut world, 2, 18.0);
        contact(&mut world, &state, r2, d);
        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(state.score, 10);
        assert_eq!(report.merges[0].produced, None);
        assert_eq!(state.fruit_count(), 0);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_three_touching_fruit_merge_once() {
        let (mut state, mut world) = session(one_player());
        state.config.gravity = 0.0;
        let ids: Vec<_> = (0..3)
            .map(|i| {
                state.spawn_fruit(
                    &mut world,
                    Rank::new(0),
                    Vec2::new(15.0 + i as f32, 0.0),
                    Vec2::ZERO,
                    0.0,
                    false,
                )
            })
            .collect();
        contact(&mut world, &state, ids[0], ids[1]);
        contact(&mut world, &state, ids[1], ids[2]);
        contact(&mut world, &state, ids[0], ids[2]);

        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(report.merges.len(), 1);
        assert_eq!(state.score, 1);
        assert_eq!(state.fruit_count(), 2);
        assert!(state.objects.contains_key(&ids[2]));
    }

    #[test]
    fn test_grounded_fruit_outside_ends_game() {
        let (mut state, mut world) = session(one_player());
        parked_outside(&mut state, &mut world, true);

        // 4 ticks = 0.5s exactly: not strictly greater yet
        for _ in 0..4 {
            assert!(!tick(&mut state, &mut world, COARSE_DT).game_over);
        }
        assert_eq!(state.phase, GamePhase::Running);

        let report = tick(&mut state, &mut world, COARSE_DT);
        assert!(report.game_over);
        assert!(!report.danger);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.slots.iter().all(|s| s.held.is_none()));
    }

    #[test]
    fn test_danger_after_half_the_limit() {
        let (mut state, mut world) = session(one_player());
        parked_outside(&mut state, &mut world, true);

        // 0.25s exactly is not yet danger
        for _ in 0..2 {
            assert!(!tick(&mut state, &mut world, COARSE_DT).danger);
        }
        assert!(tick(&mut state, &mut world, COARSE_DT).danger);
        assert!(state.danger);
    }

    #[test]
    fn test_ungrounded_fruit_never_loses() {
        let (mut state, mut world) = session(one_player());
        let id = parked_outside(&mut state, &mut world, false);
        for _ in 0..600 {
            let report = tick(&mut state, &mut world, TIME_STEP);
            assert!(!report.game_over);
            assert_eq!(report.max_outside_time, 0.0);
        }
        assert_eq!(state.objects[&id].as_fruit().unwrap().outside_bounds_time, 0.0);
    }

    #[test]
    fn test_returning_inside_resets_timer() {
        let (mut state, mut world) = session(one_player());
        let id = parked_outside(&mut state, &mut world, true);
        let body = state.objects[&id].body;

        for _ in 0..20 {
            tick(&mut state, &mut world, TIME_STEP);
        }
        world.place(body, Vec2::new(20.0, 0.0), Vec2::ZERO);
        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(report.max_outside_time, 0.0);
        assert!(!report.danger);

        world.place(body, Vec2::new(state.config.safe_radius() + 1.0, 0.0), Vec2::ZERO);
        for _ in 0..25 {
            assert!(!tick(&mut state, &mut world, TIME_STEP).game_over);
        }
    }

    #[test]
    fn test_tick_is_frozen_after_game_over() {
        let (mut state, mut world) = session(one_player());
        let id = state.drop_fruit(&mut world, 0).unwrap();
        state.enter_game_over();
        let before = world.body_state(state.objects[&id].body).unwrap();
        let ticks = state.time_ticks;

        let report = tick(&mut state, &mut world, TIME_STEP);
        assert_eq!(report, TickReport::default());
        assert_eq!(world.body_state(state.objects[&id].body).unwrap(), before);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(world.steps(), 0);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let run = || {
            let (mut state, mut world) = session(GameConfig::with_players(3));
            for i in 0..90 {
                if i % 10 == 0 {
                    state.drop_fruit(&mut world, i / 10 % 3);
                }
                tick(&mut state, &mut world, TIME_STEP);
            }
            let positions: Vec<_> = world
                .bodies()
                .into_iter()
                .filter_map(|b| world.body_state(b))
                .map(|b| b.position)
                .collect();
            (state.score, state.slots.clone(), positions)
        };
        assert_eq!(run(), run());
    }
}
