//! End-to-end session scenarios against the public API

use glam::Vec2;

use suika_planet::consts::TIME_STEP;
use suika_planet::highscores::ScoreBoard;
use suika_planet::input::InputEvent;
use suika_planet::presentation::LogPresenter;
use suika_planet::sim::{
    Dismissal, GamePhase, GameState, HeldFruit, PhysicsWorld, RapierWorld, Rank, ScriptedWorld,
    tick,
};
use suika_planet::{Game, GameConfig};

const STEP_MS: f64 = TIME_STEP as f64 * 1000.0;

fn run_ticks<W: PhysicsWorld>(state: &mut GameState, world: &mut W, ticks: u32) {
    for _ in 0..ticks {
        tick(state, world, TIME_STEP);
    }
}

#[test]
fn test_rank_ceiling_scenario() {
    let config = GameConfig {
        num_players: 1,
        max_rank: 2,
        min_spawn_rank: 0,
        max_spawn_rank: 2,
        gravity: 0.0,
        ..GameConfig::default()
    };
    let mut world = ScriptedWorld::new();
    let mut state = GameState::new(config, 5, &mut world);

    let mut expected = 0;
    for (rank, score) in [(0u8, 1u64), (1, 4), (2, 10)] {
        let a = state.spawn_fruit(&mut world, Rank::new(rank), Vec2::new(15.0, 0.0), Vec2::ZERO, 0.0, false);
        let b = state.spawn_fruit(&mut world, Rank::new(rank), Vec2::new(15.0, 3.0), Vec2::ZERO, 0.0, false);
        world.queue_contact(state.objects[&a].body, state.objects[&b].body);
        tick(&mut state, &mut world, TIME_STEP);

        expected += state.ranks.score_value(Rank::new(rank));
        assert_eq!(state.score, score);
        assert_eq!(state.score, expected);
        // Merged fruit removed before the next round
        state.objects.retain(|_, o| o.as_fruit().is_none());
        for body in world.bodies().into_iter().skip(1) {
            world.destroy_body(body);
        }
    }
    assert_eq!(state.phase, GamePhase::Running);
}

#[test]
fn test_single_player_first_drop_is_grounded() {
    let config = GameConfig {
        num_players: 1,
        min_spawn_rank: 1,
        max_spawn_rank: 5,
        ..GameConfig::default()
    };
    let mut world = ScriptedWorld::new();
    let mut state = GameState::new(config, 8, &mut world);

    let held = state.slots[0].held.unwrap();
    assert!((1..=5).contains(&held.rank.get()));
    let id = state.drop_fruit(&mut world, 0).unwrap();
    assert!(state.objects[&id].has_touched_ground());
    assert_eq!(world.steps(), 0);
}

/// Drop once from every player count, then watch the grounded first fruit fall
fn first_drop_stays_safe<W: PhysicsWorld + Default>(config: GameConfig) {
    assert!(config.validate().is_ok());
    let mut world = W::default();
    let mut state = GameState::new(config, 13, &mut world);
    let id = state.drop_fruit(&mut world, 0).unwrap();
    assert!(state.objects[&id].has_touched_ground());

    for _ in 0..180 {
        let report = tick(&mut state, &mut world, TIME_STEP);
        assert!(!report.danger);
        assert_eq!(report.max_outside_time, 0.0);
    }
    assert_eq!(state.phase, GamePhase::Running);
}

#[test]
fn test_first_drop_never_raises_danger() {
    for players in [1, 2, 4, 8] {
        first_drop_stays_safe::<ScriptedWorld>(GameConfig::with_players(players));
        first_drop_stays_safe::<RapierWorld>(GameConfig::with_players(players));
    }
}

#[test]
fn test_first_drop_under_weak_gravity_never_loses() {
    let config = GameConfig {
        gravity: 10.0,
        ..GameConfig::with_players(2)
    };
    first_drop_stays_safe::<ScriptedWorld>(config.clone());
    first_drop_stays_safe::<RapierWorld>(config);
}

#[test]
fn test_dropped_fruit_settle_on_planet() {
    let mut world = RapierWorld::new();
    let mut state = GameState::new(GameConfig::with_players(4), 21, &mut world);

    for slot in 0..4 {
        state.drop_fruit(&mut world, slot);
        run_ticks(&mut state, &mut world, 30);
    }
    run_ticks(&mut state, &mut world, 300);

    assert_eq!(state.phase, GamePhase::Running);
    let safe = state.config.safe_radius();
    for object in state.objects.values() {
        if object.as_fruit().is_none() {
            continue;
        }
        let body = world.body_state(object.body).unwrap();
        assert!(body.position.length() < safe);
        assert!(body.position.length() > state.config.planet_radius * 0.9);
        assert!(object.has_touched_ground());
    }
}

#[test]
fn test_same_rank_drops_merge_on_contact() {
    let config = GameConfig::with_players(1);
    let mut world = RapierWorld::new();
    let mut state = GameState::new(config, 4, &mut world);

    let angle = std::f32::consts::FRAC_PI_2;
    for _ in 0..2 {
        state.slots[0].held = Some(HeldFruit {
            rank: Rank::new(0),
            angle,
        });
        state.drop_fruit(&mut world, 0);
        run_ticks(&mut state, &mut world, 120);
    }
    run_ticks(&mut state, &mut world, 120);

    assert_eq!(state.score, 1);
    let ranks: Vec<_> = state
        .objects
        .values()
        .filter_map(|o| o.as_fruit().map(|f| f.rank))
        .collect();
    assert_eq!(ranks, vec![Rank::new(1)]);
}

#[test]
fn test_full_session_times_out() {
    let mut game = Game::new(
        GameConfig::with_players(2),
        77,
        RapierWorld::new(),
        LogPresenter::default(),
        ScoreBoard::new(),
    );
    game.frame(0.0);
    game.handle_input(InputEvent::PointerDown { x: 0.0, y: 20.0 });

    // Park a grounded fruit beyond the safe radius with nothing pulling it back
    {
        let (state, world) = game.session_mut();
        state.config.gravity = 0.0;
        let at = Vec2::new(state.config.safe_radius() + 2.0, 0.0);
        state.spawn_fruit(world, Rank::new(0), at, Vec2::ZERO, 0.0, true);
    }

    let mut now = 0.0;
    while !game.state().is_over() {
        now += STEP_MS;
        game.frame(now);
        assert!(now < 2000.0, "session should end within the loss threshold");
    }
    let over_at = now;
    game.handle_input(InputEvent::DropAll);
    assert!(game.state().slots.iter().all(|s| s.held.is_none()));

    while game.ended().is_none() {
        now += STEP_MS;
        game.frame(now);
    }
    assert_eq!(game.ended(), Some(Dismissal::TimedOut));
    assert!(now >= over_at + 6000.0);
    assert_eq!(game.presenter().ended, Some(Dismissal::TimedOut));
}
