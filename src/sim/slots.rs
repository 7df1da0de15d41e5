//! Player slots: angular wedges of the play field
//!
//! In polar coordinates a wedge is defined by:
//! - middle_angle: center of the wedge (radians)
//! - half_width: angular distance from the middle to either edge
//!
//! N wedges split the circle evenly, each narrowed by the divider between
//! neighbors. A single player owns the whole circle.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;

use super::rank::Rank;
use crate::{normalize_angle, polar_to_cartesian};

/// Angular extent of one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub middle_angle: f32,
    pub half_width: f32,
    /// Covers the whole circle (single player)
    pub full_circle: bool,
}

impl Wedge {
    /// Signed angular distance from the middle, in (-π, π]
    #[inline]
    pub fn offset_of(&self, theta: f32) -> f32 {
        normalize_angle(theta - self.middle_angle)
    }

    /// Boundaries are exclusive
    pub fn contains_angle(&self, theta: f32) -> bool {
        self.full_circle || self.offset_of(theta).abs() < self.half_width
    }

    /// Clamp an angle into the wedge, keeping `padding` radians from each edge
    pub fn clamp_angle(&self, theta: f32, padding: f32) -> f32 {
        if self.full_circle {
            return normalize_angle(theta);
        }
        let limit = (self.half_width - padding).max(0.0);
        normalize_angle(self.middle_angle + self.offset_of(theta).clamp(-limit, limit))
    }
}

/// Wedge layout for a session
#[derive(Debug, Clone, PartialEq)]
pub struct SlotLayout {
    wedges: Vec<Wedge>,
    hold_radius: f32,
    divider_half_arc: f32,
}

impl SlotLayout {
    /// Panics on zero players: routing input to no slot is a caller bug.
    pub fn new(num_players: usize, hold_radius: f32, divider_half_arc: f32) -> Self {
        assert!(num_players > 0, "a session needs at least one player");
        let wedges = if num_players == 1 {
            vec![Wedge {
                middle_angle: FRAC_PI_2,
                half_width: PI,
                full_circle: true,
            }]
        } else {
            let spacing = TAU / num_players as f32;
            (0..num_players)
                .map(|i| Wedge {
                    middle_angle: normalize_angle(FRAC_PI_2 + i as f32 * spacing),
                    half_width: spacing / 2.0 - divider_half_arc,
                    full_circle: false,
                })
                .collect()
        };
        Self {
            wedges,
            hold_radius,
            divider_half_arc,
        }
    }

    pub fn len(&self) -> usize {
        self.wedges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wedges.is_empty()
    }

    pub fn hold_radius(&self) -> f32 {
        self.hold_radius
    }

    pub fn wedge(&self, slot: usize) -> &Wedge {
        assert!(slot < self.wedges.len(), "slot {} out of range", slot);
        &self.wedges[slot]
    }

    pub fn wedges(&self) -> &[Wedge] {
        &self.wedges
    }

    /// Slot owning a point relative to the field center; first match wins
    pub fn slot_containing(&self, x: f32, y: f32) -> Option<usize> {
        let theta = y.atan2(x);
        self.wedges.iter().position(|w| w.contains_angle(theta))
    }

    /// Angular footprint of a fruit held at the hold radius
    pub fn padding_for(&self, radius: f32) -> f32 {
        (radius / self.hold_radius).clamp(0.0, 1.0).asin()
    }

    /// Angle for a fruit of `radius` aimed at (x, y) that stays inside the slot
    pub fn clamp_angle(&self, slot: usize, x: f32, y: f32, radius: f32) -> f32 {
        self.wedge(slot)
            .clamp_angle(y.atan2(x), self.padding_for(radius))
    }

    /// Held fruit position for a pointer at (x, y)
    pub fn clamp_to_slot(&self, slot: usize, x: f32, y: f32, radius: f32) -> Vec2 {
        polar_to_cartesian(self.hold_radius, self.clamp_angle(slot, x, y, radius))
    }

    /// Center angles of the dividers between slots (empty for one player)
    pub fn divider_angles(&self) -> Vec<f32> {
        if self.wedges.len() < 2 {
            return Vec::new();
        }
        let spacing = TAU / self.wedges.len() as f32;
        self.wedges
            .iter()
            .map(|w| normalize_angle(w.middle_angle + spacing / 2.0))
            .collect()
    }

    pub fn divider_half_arc(&self) -> f32 {
        self.divider_half_arc
    }
}

/// A fruit waiting in a slot, not yet in the physics world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldFruit {
    pub rank: Rank,
    /// Aim angle at the hold radius
    pub angle: f32,
}

/// One player's slot
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSlot {
    pub index: usize,
    pub held: Option<HeldFruit>,
    pub next: Option<Rank>,
}

impl PlayerSlot {
    pub fn new(index: usize, held: HeldFruit, next: Rank) -> Self {
        Self {
            index,
            held: Some(held),
            next: Some(next),
        }
    }

    /// Remove held/next visuals (game over)
    pub fn clear(&mut self) {
        self.held = None;
        self.next = None;
    }
}
