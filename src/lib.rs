//! Suika Planet - a multiplayer merge game around a tiny planet
//!
//! Core modules:
//! - `sim`: Deterministic simulation (ranks, slots, merges, fixed-step loop)
//! - `game`: Session orchestration (input routing, presentation, game over)
//! - `input`: Pointer/touch/keyboard events and slot routing
//! - `presentation`: Read-only view handed to the renderer
//! - `highscores`: Score records upserted per session
//! - `settings`: Gameplay configuration and player preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod error;
pub mod game;
pub mod highscores;
pub mod input;
pub mod presentation;
pub mod settings;
pub mod sim;

pub use error::{GameError, GameResult};
pub use game::Game;
pub use highscores::ScoreBoard;
pub use settings::{GameConfig, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// World units are meters; the DOM layer scales by `M_TO_DISPLAY`.
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const TIME_STEP: f32 = 1.0 / 60.0;
    /// Catch-up cap per animation frame
    pub const MAX_UPDATES_PER_FRAME: u32 = 10;

    /// Display scale
    pub const M_TO_DISPLAY: f32 = 10.0;
    pub const DISPLAY_TO_M: f32 = 1.0 / M_TO_DISPLAY;

    /// Play field (800x800 px display)
    pub const PLAY_FIELD_RADIUS: f32 = 40.0;
    pub const PLANET_RADIUS: f32 = 10.0;
    /// Radius at which held fruit wait to be dropped; inside the safe radius
    /// with room for the largest spawn rank
    pub const HOLD_RADIUS: f32 = 32.0;
    /// Fruit farther than this fraction of the play field are out of bounds
    pub const OUTSIDE_BOUNDS_FRACTION: f32 = 0.9;

    /// Players
    pub const DEFAULT_PLAYERS: usize = 2;
    pub const MAX_PLAYERS: usize = 8;
    /// Half of the angular width of the divider between two slots (radians)
    pub const DIVIDER_HALF_ARC: f32 = 1.5 / 50.0;

    /// Ranks: 11 fruit from cherry to watermelon
    pub const MAX_RANK: u8 = 10;
    pub const MIN_SPAWN_RANK: u8 = 0;
    pub const MAX_SPAWN_RANK: u8 = 4;
    pub const MIN_FRUIT_RADIUS: f32 = 1.0;
    pub const MAX_FRUIT_RADIUS: f32 = 8.0;
    pub const FRUIT_DENSITY: f32 = 1.0;

    /// Radial gravity (m/s², multiplied by mass)
    pub const GRAVITY: f32 = 30.0;
    /// Linear drag coefficient (1/s, multiplied by mass)
    pub const DRAG: f32 = 1.0;

    /// Seconds a grounded fruit may stay out of bounds
    pub const GAME_OVER_TIME: f32 = 0.5;
    /// Pop cues per tick before the rest are dropped
    pub const MAX_POPS_PER_TICK: usize = 3;

    /// Game over: pause before accepting dismissal, then auto-dismiss timeout
    pub const GAME_OVER_SETTLE_MS: f64 = 1000.0;
    pub const GAME_OVER_DISMISS_MS: f64 = 5000.0;
}

/// Normalize an angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Exponential interpolation: equal steps in `t` scale the value by equal ratios
#[inline]
pub fn experp(a: f32, b: f32, t: f32) -> f32 {
    a * (b / a).powf(t)
}
