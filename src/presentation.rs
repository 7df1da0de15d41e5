//! Presentation sink
//!
//! The session hands a [`FrameView`] to a [`Presenter`] once per animation
//! frame, plus one-off cues (score, pops, game over). The browser build
//! renders DOM nodes; the native build logs.

use glam::Vec2;

use crate::polar_to_cartesian;
use crate::sim::{Dismissal, GameState, ObjectId, ObjectKind, PhysicsWorld, Rank, Wedge};

/// What an object looks like
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visual {
    Planet,
    Fruit { rank: Rank },
}

/// One live object, as of the last tick
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectView {
    pub id: ObjectId,
    pub visual: Visual,
    pub position: Vec2,
    pub rotation: f32,
    pub radius: f32,
}

/// Next-fruit previews are drawn at this fraction of the real size
pub const NEXT_PREVIEW_SCALE: f32 = 0.5;

/// A slot's held fruit, or the preview of its next one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldView {
    pub rank: Rank,
    pub position: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub index: usize,
    pub wedge: Wedge,
    pub held: Option<HeldView>,
    /// Shrunken preview between the held fruit and the rim
    pub next: Option<HeldView>,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub objects: Vec<ObjectView>,
    pub slots: Vec<SlotView>,
    /// Divider center angles and their half arc
    pub dividers: Vec<f32>,
    pub divider_half_arc: f32,
    pub score: u64,
    pub danger: bool,
    pub game_over: bool,
}

impl FrameView {
    /// Snapshot the session, reading each body back to its object once
    pub fn capture<W: PhysicsWorld>(state: &GameState, world: &W) -> Self {
        let objects = world
            .bodies()
            .into_iter()
            .filter_map(|body| {
                let id = world.object_of(body)?;
                let object = state.objects.get(&id)?;
                let body = world.body_state(body)?;
                let (visual, radius) = match &object.kind {
                    ObjectKind::Planet => (Visual::Planet, state.config.planet_radius),
                    ObjectKind::Fruit(fruit) => (
                        Visual::Fruit { rank: fruit.rank },
                        state.ranks.radius_of(fruit.rank),
                    ),
                };
                Some(ObjectView {
                    id,
                    visual,
                    position: body.position,
                    rotation: body.rotation,
                    radius,
                })
            })
            .collect();

        let slots = state
            .slots
            .iter()
            .map(|slot| SlotView {
                index: slot.index,
                wedge: *state.layout.wedge(slot.index),
                held: slot.held.map(|held| HeldView {
                    rank: held.rank,
                    position: polar_to_cartesian(state.layout.hold_radius(), held.angle),
                    radius: state.ranks.radius_of(held.rank),
                }),
                next: slot.next.map(|rank| {
                    let wedge = state.layout.wedge(slot.index);
                    let rim = (state.layout.hold_radius() + state.config.play_field_radius) / 2.0;
                    HeldView {
                        rank,
                        position: polar_to_cartesian(rim, wedge.middle_angle),
                        radius: state.ranks.radius_of(rank) * NEXT_PREVIEW_SCALE,
                    }
                }),
            })
            .collect();

        Self {
            objects,
            slots,
            dividers: state.layout.divider_angles(),
            divider_half_arc: state.layout.divider_half_arc(),
            score: state.score,
            danger: state.danger,
            game_over: state.is_over(),
        }
    }
}

/// Receives frames and cues from a running session
pub trait Presenter {
    /// Called once per animation frame, after the catch-up ticks
    fn render(&mut self, frame: &FrameView);

    /// A slot released a fruit of `rank`
    fn dropped(&mut self, _rank: Rank) {}

    fn score_changed(&mut self, _score: u64) {}

    /// A merge consumed two fruit of `rank`; `fraction` is rank / max rank
    fn pop(&mut self, _rank: Rank, _fraction: f32) {}

    fn danger_changed(&mut self, _danger: bool) {}

    fn game_over(&mut self, _score: u64) {}

    /// The game-over screen was dismissed; the session is finished
    fn session_ended(&mut self, _score: u64, _how: Dismissal) {}
}

/// Logs cues instead of drawing
#[derive(Debug, Default)]
pub struct LogPresenter {
    pub frames: u64,
    pub drops: u64,
    pub pops: u64,
    pub ended: Option<Dismissal>,
}

impl Presenter for LogPresenter {
    fn render(&mut self, _frame: &FrameView) {
        self.frames += 1;
    }

    fn dropped(&mut self, rank: Rank) {
        self.drops += 1;
        log::trace!("Drop rank {}", rank);
    }

    fn score_changed(&mut self, score: u64) {
        log::debug!("Score: {}", score);
    }

    fn pop(&mut self, rank: Rank, _fraction: f32) {
        self.pops += 1;
        log::trace!("Pop rank {}", rank);
    }

    fn danger_changed(&mut self, danger: bool) {
        if danger {
            log::info!("Danger!");
        }
    }

    fn game_over(&mut self, score: u64) {
        log::info!("Game over, score {}", score);
    }

    fn session_ended(&mut self, score: u64, how: Dismissal) {
        log::info!("Session ended ({:?}) with score {}", how, score);
        self.ended = Some(how);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GameConfig;
    use crate::sim::ScriptedWorld;

    #[test]
    fn test_capture_reads_objects_and_slots() {
        let mut world = ScriptedWorld::new();
        let mut state = GameState::new(GameConfig::with_players(2), 3, &mut world);
        let id = state.drop_fruit(&mut world, 0).unwrap();

        let frame = FrameView::capture(&state, &world);
        assert_eq!(frame.objects.len(), 2);
        assert_eq!(frame.objects[0].visual, Visual::Planet);
        assert_eq!(frame.objects[0].radius, state.config.planet_radius);

        let fruit = frame.objects.iter().find(|o| o.id == id).unwrap();
        let rank = state.objects[&id].as_fruit().unwrap().rank;
        assert_eq!(fruit.visual, Visual::Fruit { rank });
        assert_eq!(fruit.radius, state.ranks.radius_of(rank));

        assert_eq!(frame.slots.len(), 2);
        assert!(frame.slots.iter().all(|s| s.held.is_some() && s.next.is_some()));
        assert_eq!(frame.dividers.len(), 2);
        assert!(!frame.game_over);
    }

    #[test]
    fn test_next_preview_sits_outside_held_fruit() {
        let mut world = ScriptedWorld::new();
        let state = GameState::new(GameConfig::with_players(4), 9, &mut world);
        let frame = FrameView::capture(&state, &world);

        for (slot, view) in state.slots.iter().zip(&frame.slots) {
            let next = view.next.unwrap();
            let rank = slot.next.unwrap();
            assert_eq!(next.rank, rank);
            assert_eq!(next.radius, state.ranks.radius_of(rank) * NEXT_PREVIEW_SCALE);

            let r = next.position.length();
            assert!(r > state.layout.hold_radius());
            assert!(r < state.config.play_field_radius);
            assert!(view.wedge.contains_angle(crate::cartesian_to_polar(next.position).1));
        }
    }

    #[test]
    fn test_game_over_frame_has_no_held_fruit() {
        let mut world = ScriptedWorld::new();
        let mut state = GameState::new(GameConfig::with_players(3), 3, &mut world);
        state.enter_game_over();

        let frame = FrameView::capture(&state, &world);
        assert!(frame.game_over);
        assert!(frame.slots.iter().all(|s| s.held.is_none() && s.next.is_none()));
    }
}
