//! Game session orchestration
//!
//! [`Game`] owns one session and everything it drives: the physics world, the
//! fixed-step loop, input routing, the input subscription, score persistence
//! and the game-over waits. The platform layer calls [`Game::frame`] once per
//! animation frame and forwards input events and clicks.

use std::future::Future;
use std::pin::Pin;

use crate::highscores::{ScoreBoard, ScoreRecord};
use crate::input::{InputEvent, InputRouter, InputSubscription, SlotCommand};
use crate::presentation::{FrameView, Presenter};
use crate::settings::GameConfig;
use crate::sim::{
    ClickSignal, Dismissal, FixedStepLoop, FrameTicks, GameState, PhysicsWorld, WaitClock,
    game_over_sequence, poll_once, tick,
};

type DismissalWait = Pin<Box<dyn Future<Output = Dismissal>>>;

pub struct Game<W: PhysicsWorld, P: Presenter> {
    state: GameState,
    world: W,
    presenter: P,
    frame_loop: FixedStepLoop,
    router: InputRouter,
    subscription: Option<InputSubscription>,
    scores: ScoreBoard,
    clock: WaitClock,
    clicks: ClickSignal,
    dismissal: Option<DismissalWait>,
    ended: Option<Dismissal>,
    last_danger: bool,
    commands: Vec<SlotCommand>,
}

impl<W: PhysicsWorld, P: Presenter> Game<W, P> {
    pub fn new(config: GameConfig, seed: u64, mut world: W, presenter: P, scores: ScoreBoard) -> Self {
        let state = GameState::new(config, seed, &mut world);
        let router = InputRouter::new(state.slots.len());
        Self {
            state,
            world,
            presenter,
            frame_loop: FixedStepLoop::new(),
            router,
            subscription: None,
            scores,
            clock: WaitClock::new(),
            clicks: ClickSignal::new(),
            dismissal: None,
            ended: None,
            last_danger: false,
            commands: Vec::new(),
        }
    }

    /// Start a fresh session with the same config, presenter and score board
    ///
    /// Input must be attached again.
    pub fn restart(&mut self, seed: u64, mut world: W) {
        let config = self.state.config.clone();
        self.state = GameState::new(config, seed, &mut world);
        self.world = world;
        self.frame_loop = FixedStepLoop::new();
        self.router = InputRouter::new(self.state.slots.len());
        self.subscription = None;
        self.dismissal = None;
        self.ended = None;
        self.last_danger = false;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// State and world together, for callers that spawn bodies directly
    pub fn session_mut(&mut self) -> (&mut GameState, &mut W) {
        (&mut self.state, &mut self.world)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// How the session ended, once the game-over screen is dismissed
    pub fn ended(&self) -> Option<Dismissal> {
        self.ended
    }

    /// Take ownership of the platform's input listeners
    ///
    /// Released on game over. Attaching after game over releases at once.
    pub fn attach_input(&mut self, subscription: InputSubscription) {
        if self.state.is_over() {
            subscription.release();
            return;
        }
        self.subscription = Some(subscription);
    }

    pub fn input_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply an input event to slot state; visible to the next tick
    pub fn handle_input(&mut self, event: InputEvent) {
        if self.state.is_over() {
            return;
        }
        let mut commands = std::mem::take(&mut self.commands);
        self.router.route(event, &self.state.layout, &mut commands);
        for command in commands.drain(..) {
            match command {
                SlotCommand::Aim { slot, x, y } => self.state.aim_slot(slot, x, y),
                SlotCommand::Drop { slot } => {
                    let dropped = self.state.drop_fruit(&mut self.world, slot);
                    let rank = dropped
                        .and_then(|id| self.state.objects.get(&id))
                        .and_then(|object| object.as_fruit())
                        .map(|fruit| fruit.rank);
                    if let Some(rank) = rank {
                        self.presenter.dropped(rank);
                    }
                }
            }
        }
        self.commands = commands;
    }

    /// A click or tap anywhere (dismisses the game-over screen)
    pub fn click(&self) {
        self.clicks.fire();
    }

    /// Run catch-up ticks for `now_ms`, then render once
    pub fn frame(&mut self, now_ms: f64) -> FrameTicks {
        self.clock.set(now_ms);

        let Self {
            state,
            world,
            presenter,
            frame_loop,
            scores,
            ..
        } = self;
        let mut entered_game_over = false;
        let ticks = frame_loop.advance(now_ms, |dt| {
            let report = tick(state, world, dt);
            for rank in report.pops {
                presenter.pop(rank, state.ranks.fraction(rank));
            }
            if report.score_changed {
                presenter.score_changed(state.score);
                persist_score(state, scores);
            }
            entered_game_over |= report.game_over;
        });

        if self.state.danger != self.last_danger {
            self.last_danger = self.state.danger;
            self.presenter.danger_changed(self.last_danger);
        }
        if entered_game_over {
            self.begin_game_over();
        }

        let view = FrameView::capture(&self.state, &self.world);
        self.presenter.render(&view);
        self.poll_dismissal();
        ticks
    }

    fn begin_game_over(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
        self.presenter.game_over(self.state.score);
        self.dismissal = Some(Box::pin(game_over_sequence(
            self.clock.clone(),
            self.clicks.clone(),
            self.state.config.game_over_settle_ms,
            self.state.config.game_over_dismiss_ms,
        )));
    }

    fn poll_dismissal(&mut self) {
        let Some(wait) = self.dismissal.as_mut() else {
            return;
        };
        if let Some(how) = poll_once(wait.as_mut()) {
            self.dismissal = None;
            self.ended = Some(how);
            log::info!("Session {} dismissed: {:?}", self.state.session_id, how);
            self.presenter.session_ended(self.state.score, how);
        }
    }
}

fn persist_score(state: &GameState, scores: &mut ScoreBoard) {
    scores.upsert(ScoreRecord {
        session_id: state.session_id.clone(),
        score: state.score,
        timestamp: wall_clock_ms(),
        num_players: state.config.num_players,
    });
    if let Err(e) = scores.save() {
        log::warn!("Failed to save scores: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn wall_clock_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn wall_clock_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
