//! Per-user navigation preferences.
//!
//! Out-of-range or unparsable values never fail: they are clamped or ignored
//! with a warning.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::policy::TraversalPolicy;
use crate::room::RoomType;

pub const HISTORY_LIMIT: usize = 10;

pub const SPEECH_RATE_RANGE: (f64, f64) = (0.5, 2.0);
pub const PAUSE_SECS_RANGE: (f64, f64) = (0.5, 10.0);

/// Custom setting scaling every edge weight.
pub const PATH_WEIGHT_MULTIPLIER: &str = "path_weight_multiplier";
/// Custom setting granting a discount to edges wider than [`WIDE_PATH_WIDTH`].
pub const PREFER_WIDE_PATHS: &str = "prefer_wide_paths";

pub const WIDE_PATH_WIDTH: f64 = 2.5;
pub const WIDE_PATH_DISCOUNT: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub preferred_policy: TraversalPolicy,
    pub tts_enabled: bool,
    pub voice_recognition_enabled: bool,
    speech_rate: f64,
    pub use_landmark_instructions: bool,
    pub preferred_voice: String,
    instruction_pause_secs: f64,
    pub avoid_room_types: BTreeSet<RoomType>,
    pub avoid_path_types: BTreeSet<String>,
    pub custom_settings: BTreeMap<String, String>,
    history: VecDeque<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new("default_user")
    }
}

impl UserPreferences {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            preferred_policy: TraversalPolicy::Standard,
            tts_enabled: true,
            voice_recognition_enabled: true,
            speech_rate: 1.0,
            use_landmark_instructions: true,
            preferred_voice: "default".to_string(),
            instruction_pause_secs: 2.0,
            avoid_room_types: BTreeSet::new(),
            avoid_path_types: BTreeSet::new(),
            custom_settings: BTreeMap::new(),
            history: VecDeque::new(),
        }
    }

    pub fn speech_rate(&self) -> f64 {
        self.speech_rate
    }

    pub fn set_speech_rate(&mut self, rate: f64) {
        self.speech_rate =
            clamp_with_warning("speech rate", rate, SPEECH_RATE_RANGE, self.speech_rate);
    }

    pub fn instruction_pause_secs(&self) -> f64 {
        self.instruction_pause_secs
    }

    pub fn set_instruction_pause_secs(&mut self, secs: f64) {
        self.instruction_pause_secs = clamp_with_warning(
            "instruction pause",
            secs,
            PAUSE_SECS_RANGE,
            self.instruction_pause_secs,
        );
    }

    pub fn avoid_room_type(&mut self, room_type: RoomType) {
        self.avoid_room_types.insert(room_type);
    }

    pub fn avoid_path_type(&mut self, path_type: impl Into<String>) {
        self.avoid_path_types.insert(path_type.into());
    }

    pub fn avoids_room_type(&self, room_type: RoomType) -> bool {
        self.avoid_room_types.contains(&room_type)
    }

    pub fn avoids_path_type(&self, path_type: &str) -> bool {
        self.avoid_path_types.contains(path_type)
    }

    pub fn set_custom(&mut self, key: impl Into<String>, value: impl ToString) {
        self.custom_settings.insert(key.into(), value.to_string());
    }

    pub fn custom(&self, key: &str) -> Option<&str> {
        self.custom_settings.get(key).map(String::as_str)
    }

    /// Global edge-weight multiplier. Anything that is not a finite,
    /// non-negative number is ignored.
    pub fn path_weight_multiplier(&self) -> Option<f64> {
        let raw = self.custom(PATH_WEIGHT_MULTIPLIER)?;
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
            _ => {
                warn!(user = %self.user_id, value = raw, "ignoring invalid path weight multiplier");
                None
            }
        }
    }

    pub fn prefers_wide_paths(&self) -> bool {
        match self.custom(PREFER_WIDE_PATHS) {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().parse::<bool>() {
                Ok(value) => value,
                Err(_) => {
                    warn!(
                        user = %self.user_id,
                        value = raw,
                        "ignoring invalid prefer_wide_paths flag"
                    );
                    false
                }
            },
        }
    }

    /// Resolves the custom weight settings. Invalid values are reported
    /// here, so call this once per search rather than per edge.
    pub fn weight_adjust(&self) -> WeightAdjust {
        WeightAdjust {
            multiplier: self.path_weight_multiplier().unwrap_or(1.0),
            prefer_wide: self.prefers_wide_paths(),
        }
    }

    /// Most recent destination first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn add_to_history(&mut self, destination: impl Into<String>) {
        self.history.push_front(destination.into());
        self.history.truncate(HISTORY_LIMIT);
    }

    /// Appends an older entry behind the existing ones, used when reloading a
    /// stored most-recent-first list.
    pub(crate) fn push_older_history(&mut self, destination: impl Into<String>) {
        if self.history.len() < HISTORY_LIMIT {
            self.history.push_back(destination.into());
        }
    }
}

/// Preference-scoped edge-weight multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightAdjust {
    pub multiplier: f64,
    pub prefer_wide: bool,
}

impl Default for WeightAdjust {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            prefer_wide: false,
        }
    }
}

impl WeightAdjust {
    pub fn apply(&self, weight: f64, edge_width: f64) -> f64 {
        let weight = weight * self.multiplier;
        if self.prefer_wide && edge_width > WIDE_PATH_WIDTH {
            weight * WIDE_PATH_DISCOUNT
        } else {
            weight
        }
    }
}

fn clamp_with_warning(what: &str, value: f64, (min, max): (f64, f64), current: f64) -> f64 {
    if value.is_nan() {
        warn!(setting = what, "ignoring NaN value");
        return current;
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(setting = what, value, clamped, "value out of range, clamping");
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.user_id, "default_user");
        assert_eq!(prefs.preferred_policy, TraversalPolicy::Standard);
        assert!(prefs.use_landmark_instructions);
        assert_eq!(prefs.instruction_pause_secs(), 2.0);
    }

    #[test]
    fn test_clamping() {
        let mut prefs = UserPreferences::new("u");
        prefs.set_speech_rate(9.0);
        assert_eq!(prefs.speech_rate(), 2.0);
        prefs.set_instruction_pause_secs(0.0);
        assert_eq!(prefs.instruction_pause_secs(), 0.5);
        prefs.set_instruction_pause_secs(f64::NAN);
        assert_eq!(prefs.instruction_pause_secs(), 0.5);
    }

    #[test]
    fn test_history_keeps_ten_most_recent() {
        let mut prefs = UserPreferences::new("u");
        for i in 0..15 {
            prefs.add_to_history(format!("room{i}"));
        }
        let history: Vec<&str> = prefs.history().collect();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], "room14");
        assert_eq!(history[9], "room5");
    }

    #[test]
    fn test_weight_multiplier_parsing() {
        let mut prefs = UserPreferences::new("u");
        assert_eq!(prefs.path_weight_multiplier(), None);
        prefs.set_custom(PATH_WEIGHT_MULTIPLIER, "1.5");
        assert_eq!(prefs.path_weight_multiplier(), Some(1.5));
        prefs.set_custom(PATH_WEIGHT_MULTIPLIER, "fast");
        assert_eq!(prefs.path_weight_multiplier(), None);
        prefs.set_custom(PATH_WEIGHT_MULTIPLIER, "-2");
        assert_eq!(prefs.path_weight_multiplier(), None);
    }

    #[test]
    fn test_weight_adjust() {
        let mut prefs = UserPreferences::new("u");
        assert_eq!(prefs.weight_adjust(), WeightAdjust::default());
        assert_eq!(prefs.weight_adjust().apply(10.0, 3.0), 10.0);
        prefs.set_custom(PREFER_WIDE_PATHS, true);
        assert_eq!(prefs.weight_adjust().apply(10.0, 3.0), 9.0);
        assert_eq!(prefs.weight_adjust().apply(10.0, 2.5), 10.0);
        prefs.set_custom(PATH_WEIGHT_MULTIPLIER, 2.0);
        assert_eq!(prefs.weight_adjust().apply(10.0, 3.0), 18.0);
    }

    #[test]
    fn test_invalid_settings_resolve_to_neutral() {
        let mut prefs = UserPreferences::new("u");
        prefs.set_custom(PATH_WEIGHT_MULTIPLIER, "fast");
        prefs.set_custom(PREFER_WIDE_PATHS, "sometimes");
        assert_eq!(prefs.weight_adjust(), WeightAdjust::default());
    }
}
