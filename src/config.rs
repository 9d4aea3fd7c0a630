use std::f32::consts::FRAC_PI_2;

use crate::body::{CHASER_RADIUS, CHASER_SPEED, PLAYER_RADIUS, PLAYER_SPEED};

pub const DEFAULT_CHASER_COUNT: usize = 4;
/// Longest simulated step; slower frames are clamped to this.
pub const MAX_STEP: f32 = 1.0 / 30.0;

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub player_speed: f32,
    pub player_radius: f32,
    pub chaser_speed: f32,
    pub chaser_radius: f32,
    pub chaser_count: usize,
    pub max_step: f32,
    pub player_spawn_yaw: f32,
    pub chaser_spawn_yaw: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            player_radius: PLAYER_RADIUS,
            chaser_speed: CHASER_SPEED,
            chaser_radius: CHASER_RADIUS,
            chaser_count: DEFAULT_CHASER_COUNT,
            max_step: MAX_STEP,
            player_spawn_yaw: FRAC_PI_2,
            chaser_spawn_yaw: -FRAC_PI_2,
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `BRUIN_CHASERS`, `BRUIN_PLAYER_SPEED` and
    /// `BRUIN_CHASER_SPEED`. Unparsable values are ignored, as are speeds
    /// that would cover half a cell or more in one clamped frame.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let chaser_count = lookup("BRUIN_CHASERS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.chaser_count);
        let max_step = defaults.max_step;
        let player_speed = lookup("BRUIN_PLAYER_SPEED")
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| usable_speed(*v, max_step))
            .unwrap_or(defaults.player_speed);
        let chaser_speed = lookup("BRUIN_CHASER_SPEED")
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|v| usable_speed(*v, max_step))
            .unwrap_or(defaults.chaser_speed);
        Self {
            chaser_count,
            player_speed,
            chaser_speed,
            ..defaults
        }
    }
}

/// Chasers re-decide only when their leading edge crosses a cell boundary,
/// and the player is resolved against its 3x3 neighbourhood. Both need less
/// than half a cell of travel per frame.
fn usable_speed(speed: f32, max_step: f32) -> bool {
    speed.is_finite() && speed > 0.0 && speed * max_step < 0.5
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::GameConfig;

    #[test]
    fn env_overrides_apply_and_bad_values_fall_back() {
        let vars: HashMap<&str, &str> = [
            ("BRUIN_CHASERS", "2"),
            ("BRUIN_PLAYER_SPEED", "-3"),
            ("BRUIN_CHASER_SPEED", "1.5"),
        ]
        .into_iter()
        .collect();
        let config = GameConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.chaser_count, 2);
        assert_eq!(config.player_speed, GameConfig::default().player_speed);
        assert_eq!(config.chaser_speed, 1.5);
    }

    #[test]
    fn speeds_of_half_a_cell_per_frame_fall_back() {
        let vars: HashMap<&str, &str> = [
            ("BRUIN_CHASERS", "1"),
            ("BRUIN_PLAYER_SPEED", "16"),
            ("BRUIN_CHASER_SPEED", "45"),
        ]
        .into_iter()
        .collect();
        let config = GameConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        let defaults = GameConfig::default();

        assert_eq!(config.player_speed, defaults.player_speed);
        assert_eq!(config.chaser_speed, defaults.chaser_speed);

        let fast = GameConfig::from_lookup(|k| match k {
            "BRUIN_PLAYER_SPEED" | "BRUIN_CHASER_SPEED" => Some("12".to_string()),
            _ => None,
        });
        assert_eq!(fast.player_speed, 12.0);
        assert_eq!(fast.chaser_speed, 12.0);
        assert!(fast.chaser_speed * fast.max_step < 0.5);
    }

    #[test]
    fn missing_vars_keep_defaults() {
        assert_eq!(GameConfig::from_lookup(|_| None), GameConfig::default());
    }
}
