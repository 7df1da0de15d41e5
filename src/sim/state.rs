//! Game session state
//!
//! Owns the game objects, player slots, score and phase. The physics world is
//! passed in wherever bodies are created or read so the same state works with
//! any engine.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::object::{GameObject, ObjectId};
use super::physics::{BodyDesc, BodyKind, Contact, PhysicsWorld};
use super::rank::{Rank, RankModel};
use super::slots::{HeldFruit, PlayerSlot, SlotLayout};
use crate::polar_to_cartesian;
use crate::settings::GameConfig;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Accepting drops, simulating
    Running,
    /// Loss detected; simulation frozen
    GameOver,
}

/// One game session
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Identifies this session in the score board
    pub session_id: String,
    pub config: GameConfig,
    pub ranks: RankModel,
    pub layout: SlotLayout,
    /// One per player, indexed by slot
    pub slots: Vec<PlayerSlot>,
    /// Live objects, iterated in id order
    pub objects: BTreeMap<ObjectId, GameObject>,
    pub score: u64,
    pub phase: GamePhase,
    /// A grounded fruit has been out of bounds for over half the limit
    pub danger: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Begin-contact buffer, filled during a step and cleared after
    pub(crate) contacts: Vec<Contact>,
    rng: Pcg32,
    planet: ObjectId,
    next_id: u32,
}

impl GameState {
    /// Create a session and its planet in `world`
    ///
    /// Panics on an invalid config; validate user-provided values first.
    pub fn new<W: PhysicsWorld>(config: GameConfig, seed: u64, world: &mut W) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid game config: {}", e);
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let session_id = format!("{:016x}", rng.random::<u64>());
        let ranks = config.rank_model();
        let layout = SlotLayout::new(config.num_players, config.hold_radius, config.divider_half_arc);

        let mut state = Self {
            seed,
            session_id,
            ranks,
            layout,
            slots: Vec::with_capacity(config.num_players),
            objects: BTreeMap::new(),
            score: 0,
            phase: GamePhase::Running,
            danger: false,
            time_ticks: 0,
            contacts: Vec::new(),
            rng,
            planet: ObjectId(0),
            next_id: 1,
            config,
        };

        state.planet = state.spawn_planet(world);
        for index in 0..state.config.num_players {
            let held = HeldFruit {
                rank: state.roll_rank(),
                angle: state.layout.wedge(index).middle_angle,
            };
            let next = state.roll_rank();
            state.slots.push(PlayerSlot::new(index, held, next));
        }

        log::info!(
            "Session {} started: {} player(s), seed {}",
            state.session_id,
            state.config.num_players,
            seed
        );
        state
    }

    /// Allocate a new object id
    pub fn next_entity_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn planet(&self) -> ObjectId {
        self.planet
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn fruit_count(&self) -> usize {
        self.objects.values().filter(|o| o.as_fruit().is_some()).count()
    }

    /// Uniform rank in the configured spawn range
    fn roll_rank(&mut self) -> Rank {
        Rank::new(
            self.rng
                .random_range(self.config.min_spawn_rank..=self.config.max_spawn_rank),
        )
    }

    fn spawn_planet<W: PhysicsWorld>(&mut self, world: &mut W) -> ObjectId {
        let id = self.next_entity_id();
        let body = world.create_body(&BodyDesc {
            kind: BodyKind::Static,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            radius: self.config.planet_radius,
            density: 0.0,
            object: id,
        });
        self.objects.insert(id, GameObject::planet(id, body));
        id
    }

    /// Create a fruit body and register its object
    pub fn spawn_fruit<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        rank: Rank,
        position: Vec2,
        velocity: Vec2,
        rotation: f32,
        touched_ground: bool,
    ) -> ObjectId {
        let id = self.next_entity_id();
        let body = world.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            position,
            rotation,
            velocity,
            radius: self.ranks.radius_of(rank),
            density: self.config.fruit_density,
            object: id,
        });
        self.objects
            .insert(id, GameObject::fruit(id, body, rank, touched_ground));
        id
    }

    /// Point a slot's held fruit at (x, y), clamped inside the slot
    ///
    /// Ignored after game over.
    pub fn aim_slot(&mut self, slot: usize, x: f32, y: f32) {
        assert!(slot < self.slots.len(), "slot {} out of range", slot);
        if self.is_over() {
            return;
        }
        if let Some(held) = self.slots[slot].held.as_mut() {
            let radius = self.ranks.radius_of(held.rank);
            held.angle = self.layout.clamp_angle(slot, x, y, radius);
        }
    }

    /// World position of a slot's held fruit
    pub fn held_position(&self, slot: usize) -> Option<Vec2> {
        assert!(slot < self.slots.len(), "slot {} out of range", slot);
        self.slots[slot]
            .held
            .map(|held| polar_to_cartesian(self.layout.hold_radius(), held.angle))
    }

    /// Release a slot's held fruit into the world
    ///
    /// The next fruit moves up to held, keeping the aim clamped for its own
    /// size, and a fresh next is rolled. Returns `None` after game over.
    pub fn drop_fruit<W: PhysicsWorld>(&mut self, world: &mut W, slot: usize) -> Option<ObjectId> {
        assert!(slot < self.slots.len(), "slot {} out of range", slot);
        if self.is_over() {
            return None;
        }
        let held = self.slots[slot].held?;

        // Nothing to land on yet except the planet: count as grounded
        let first = self.fruit_count() == 0;
        let position = polar_to_cartesian(self.layout.hold_radius(), held.angle);
        let id = self.spawn_fruit(world, held.rank, position, Vec2::ZERO, 0.0, first);

        let promoted = match self.slots[slot].next {
            Some(rank) => rank,
            None => self.roll_rank(),
        };
        let next = self.roll_rank();
        let padding = self.layout.padding_for(self.ranks.radius_of(promoted));
        let angle = self.layout.wedge(slot).clamp_angle(held.angle, padding);

        let player = &mut self.slots[slot];
        player.held = Some(HeldFruit {
            rank: promoted,
            angle,
        });
        player.next = Some(next);

        log::debug!("Slot {} dropped rank {} as {:?}", slot, held.rank, id);
        Some(id)
    }

    /// Switch to game over; returns false if already over
    pub fn enter_game_over(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.danger = false;
        for slot in &mut self.slots {
            slot.clear();
        }
        log::info!("Session {} over with score {}", self.session_id, self.score);
        true
    }
}
