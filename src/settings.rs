//! Gameplay configuration and player preferences
//!
//! `GameConfig` holds the tuning for one session and is validated before a
//! session starts. `Settings` are audio preferences persisted separately in
//! LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, GameResult};
use crate::sim::rank::{Rank, RankModel};

/// Tuning for one game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of players (one slot each)
    pub num_players: usize,

    // === Ranks ===
    pub max_rank: u8,
    /// Inclusive spawn range for held/next fruit
    pub min_spawn_rank: u8,
    pub max_spawn_rank: u8,
    pub min_fruit_radius: f32,
    pub max_fruit_radius: f32,
    pub fruit_density: f32,

    // === Field ===
    pub planet_radius: f32,
    pub play_field_radius: f32,
    pub hold_radius: f32,
    pub outside_bounds_fraction: f32,
    pub divider_half_arc: f32,

    // === Forces ===
    pub gravity: f32,
    pub drag: f32,

    // === Loss ===
    /// Seconds a grounded fruit may stay out of bounds before game over
    pub game_over_time: f32,
    pub max_pops_per_tick: usize,
    pub game_over_settle_ms: f64,
    pub game_over_dismiss_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num_players: DEFAULT_PLAYERS,

            max_rank: MAX_RANK,
            min_spawn_rank: MIN_SPAWN_RANK,
            max_spawn_rank: MAX_SPAWN_RANK,
            min_fruit_radius: MIN_FRUIT_RADIUS,
            max_fruit_radius: MAX_FRUIT_RADIUS,
            fruit_density: FRUIT_DENSITY,

            planet_radius: PLANET_RADIUS,
            play_field_radius: PLAY_FIELD_RADIUS,
            hold_radius: HOLD_RADIUS,
            outside_bounds_fraction: OUTSIDE_BOUNDS_FRACTION,
            divider_half_arc: DIVIDER_HALF_ARC,

            gravity: GRAVITY,
            drag: DRAG,

            game_over_time: GAME_OVER_TIME,
            max_pops_per_tick: MAX_POPS_PER_TICK,
            game_over_settle_ms: GAME_OVER_SETTLE_MS,
            game_over_dismiss_ms: GAME_OVER_DISMISS_MS,
        }
    }
}

impl GameConfig {
    /// Default config for the given player count
    pub fn with_players(num_players: usize) -> Self {
        Self {
            num_players,
            ..Self::default()
        }
    }

    /// Apply URL query parameters (`?players=3`). Unknown keys are ignored.
    pub fn from_query(query: &str) -> GameResult<Self> {
        let mut config = Self::default();
        if let Some(players) = Self::query_players(query)? {
            config.num_players = players;
        }
        config.validate()?;
        Ok(config)
    }

    /// The `players` query parameter, if given; the last one wins
    pub fn query_players(query: &str) -> GameResult<Option<usize>> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut players = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key == "players" {
                players = Some(value.parse().map_err(|_| GameError::BadQuery {
                    key: key.to_string(),
                    value: value.to_string(),
                })?);
            }
        }
        Ok(players)
    }

    /// Check every value against its valid range
    pub fn validate(&self) -> GameResult<()> {
        fn invalid(name: &'static str, value: impl ToString, expected: &'static str) -> GameError {
            GameError::InvalidConfig {
                name,
                value: value.to_string(),
                expected,
            }
        }

        if self.num_players == 0 || self.num_players > MAX_PLAYERS {
            return Err(invalid("num_players", self.num_players, "1..=8"));
        }
        if self.max_spawn_rank > self.max_rank {
            return Err(invalid("max_spawn_rank", self.max_spawn_rank, "<= max_rank"));
        }
        if self.min_spawn_rank > self.max_spawn_rank {
            return Err(invalid("min_spawn_rank", self.min_spawn_rank, "<= max_spawn_rank"));
        }
        if self.min_fruit_radius <= 0.0 {
            return Err(invalid("min_fruit_radius", self.min_fruit_radius, "> 0"));
        }
        if self.max_fruit_radius <= self.min_fruit_radius {
            return Err(invalid("max_fruit_radius", self.max_fruit_radius, "> min_fruit_radius"));
        }
        if self.fruit_density <= 0.0 {
            return Err(invalid("fruit_density", self.fruit_density, "> 0"));
        }
        if self.planet_radius <= 0.0 || self.planet_radius >= self.hold_radius {
            return Err(invalid("planet_radius", self.planet_radius, "in (0, hold_radius)"));
        }
        if self.hold_radius >= self.play_field_radius {
            return Err(invalid("hold_radius", self.hold_radius, "< play_field_radius"));
        }
        if !(self.outside_bounds_fraction > 0.0 && self.outside_bounds_fraction <= 1.0) {
            return Err(invalid(
                "outside_bounds_fraction",
                self.outside_bounds_fraction,
                "in (0, 1]",
            ));
        }
        if self.divider_half_arc < 0.0
            || self.divider_half_arc >= std::f32::consts::PI / self.num_players as f32
        {
            return Err(invalid(
                "divider_half_arc",
                self.divider_half_arc,
                "in [0, PI / num_players)",
            ));
        }
        // Out-of-bounds is measured at the fruit center, so a fresh drop
        // must start at or inside the safe radius
        if self.hold_radius > self.safe_radius() {
            return Err(invalid("hold_radius", self.hold_radius, "<= safe radius"));
        }
        if self.game_over_time <= 0.0 {
            return Err(invalid("game_over_time", self.game_over_time, "> 0"));
        }
        Ok(())
    }

    pub fn rank_model(&self) -> RankModel {
        RankModel::new(
            Rank::new(self.max_rank),
            self.min_fruit_radius,
            self.max_fruit_radius,
        )
    }

    /// Distance from the origin beyond which a fruit counts as out of bounds
    pub fn safe_radius(&self) -> f32 {
        self.play_field_radius * self.outside_bounds_fraction
    }

    /// Out-of-bounds time that raises the danger hint
    pub fn danger_time(&self) -> f32 {
        self.game_over_time / 2.0
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 0.3,
            muted: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "suika_planet_settings";

    /// Effective sound effect volume
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Flip mute; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> GameResult<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| GameError::Storage("no LocalStorage".to_string()))?;
        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|e| GameError::Storage(format!("{:?}", e)))?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> GameResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_query_sets_players() {
        let config = GameConfig::from_query("?players=5").unwrap();
        assert_eq!(config.num_players, 5);

        let config = GameConfig::from_query("mode=x&players=1").unwrap();
        assert_eq!(config.num_players, 1);

        let config = GameConfig::from_query("").unwrap();
        assert_eq!(config.num_players, DEFAULT_PLAYERS);
    }

    #[test]
    fn test_query_players_only_when_given() {
        assert_eq!(GameConfig::query_players("").unwrap(), None);
        assert_eq!(GameConfig::query_players("?mode=x").unwrap(), None);
        assert_eq!(GameConfig::query_players("?players=3").unwrap(), Some(3));
        assert!(GameConfig::query_players("?players=").is_err());
    }

    #[test]
    fn test_query_rejects_bad_players() {
        assert!(matches!(
            GameConfig::from_query("?players=abc"),
            Err(GameError::BadQuery { .. })
        ));
        assert!(matches!(
            GameConfig::from_query("?players=0"),
            Err(GameError::InvalidConfig { name: "num_players", .. })
        ));
        assert!(matches!(
            GameConfig::from_query("?players=9"),
            Err(GameError::InvalidConfig { name: "num_players", .. })
        ));
    }

    #[test]
    fn test_spawn_range_must_fit_ranks() {
        let config = GameConfig {
            max_rank: 2,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            max_rank: 2,
            min_spawn_rank: 0,
            max_spawn_rank: 2,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hold_radius_must_be_in_bounds() {
        let config = GameConfig::default();
        assert!(config.hold_radius <= config.safe_radius());

        let config = GameConfig {
            hold_radius: 37.5,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig { name: "hold_radius", .. })
        ));
    }

    #[test]
    fn test_divider_arc_leaves_room_for_slots() {
        let config = GameConfig {
            divider_half_arc: std::f32::consts::PI / 8.0,
            ..GameConfig::with_players(8)
        };
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig { name: "divider_half_arc", .. })
        ));

        // The same arc is fine with fewer, wider slots
        let config = GameConfig {
            divider_half_arc: std::f32::consts::PI / 8.0,
            ..GameConfig::with_players(2)
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"num_players": 4}"#).unwrap();
        assert_eq!(config.num_players, 4);
        assert_eq!(config.max_rank, MAX_RANK);
        assert_eq!(config.game_over_time, GAME_OVER_TIME);
    }

    #[test]
    fn test_muted_silences_everything() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_toggle_mute_round_trips() {
        let mut settings = Settings::default();
        let audible = settings.effective_sfx_volume();
        assert!(audible > 0.0);

        assert!(settings.toggle_mute());
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert!(settings.save().is_ok());

        assert!(!settings.toggle_mute());
        assert_eq!(settings.effective_sfx_volume(), audible);
    }

    #[test]
    fn test_stored_settings_tolerate_old_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"muted": true, "music_volume": 0.2}"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.sfx_volume, Settings::default().sfx_volume);
    }
}
