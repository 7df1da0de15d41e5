//! Score board
//!
//! One record per session, updated in place as the session's score grows.
//! Persisted to LocalStorage, always kept sorted by score descending.

use serde::{Deserialize, Serialize};

use crate::error::GameResult;
#[cfg(target_arch = "wasm32")]
use crate::error::GameError;

/// A single session's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub session_id: String,
    pub score: u64,
    /// Unix timestamp (ms) of the last update
    pub timestamp: f64,
    pub num_players: usize,
}

/// Every recorded session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    pub records: Vec<ScoreRecord>,
}

impl ScoreBoard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "suika_planet_scores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `record.session_id`
    ///
    /// Returns the 1-indexed position after sorting.
    pub fn upsert(&mut self, record: ScoreRecord) -> usize {
        match self
            .records
            .iter_mut()
            .find(|r| r.session_id == record.session_id)
        {
            Some(existing) => *existing = record.clone(),
            None => self.records.push(record.clone()),
        }
        // Stable: equal scores keep their insertion order
        self.records.sort_by(|a, b| b.score.cmp(&a.score));
        self.position_of(&record.session_id).unwrap_or(self.records.len())
    }

    /// 1-indexed position of a session
    pub fn position_of(&self, session_id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.session_id == session_id)
            .map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.records.first().map(|r| r.score)
    }

    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> GameResult<Self> {
        let mut board: Self = serde_json::from_str(json)?;
        board.records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(board)
    }

    /// Load the board from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(board) => {
                        log::info!("Loaded {} score records", board.len());
                        return board;
                    }
                    Err(e) => log::warn!("Ignoring stored scores: {}", e),
                }
            }
        }

        log::info!("No scores found, starting fresh");
        Self::new()
    }

    /// Save the board to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> GameResult<()> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| GameError::Storage("no LocalStorage".to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &self.to_json()?)
            .map_err(|e| GameError::Storage(format!("{:?}", e)))?;
        log::debug!("Scores saved ({} records)", self.records.len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> GameResult<()> {
        Ok(())
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let diff_mins = (js_sys::Date::now() - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 7.0 {
        let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
        format!(
            "{}/{}/{}",
            date.get_month() + 1,
            date.get_date(),
            date.get_full_year() % 100
        )
    } else if diff_days >= 2.0 {
        format!("{} days ago", diff_days.floor() as i32)
    } else if diff_days >= 1.0 {
        "Yesterday".to_string()
    } else if diff_hours >= 1.0 {
        format!("{}h ago", diff_hours.floor() as i32)
    } else if diff_mins >= 1.0 {
        format!("{} min ago", diff_mins.floor() as i32)
    } else {
        "Just now".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(_timestamp: f64) -> String {
    "N/A".to_string()
}
