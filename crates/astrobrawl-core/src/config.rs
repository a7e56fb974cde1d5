use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Data-driven tuning for the arena simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Simulation rate in frames per second. Can be set lower for testing.
    pub fps: u32,
    /// Arena width in world units.
    pub arena_width: f32,
    /// Arena height in world units.
    pub arena_height: f32,
    /// Roster capacity.
    pub max_players: usize,
    /// Entity pool capacity.
    pub max_entities: usize,
    /// Frames that must pass after a reset before the next one (frames).
    pub reset_cooldown: u64,
    /// How long the welcome banner stays up (frames).
    pub welcome_cooldown: u32,
    /// Scoreboard row offset from the top edge.
    pub scoreboard_y_offset: f32,
    /// Text size for the scoreboard and banner.
    pub font_size: f32,
    /// Ship bounding box.
    pub ship_size: Vec2,
    /// Speed change per speed-up/speed-down action.
    pub ship_speed_step: f32,
    /// Heading change per turn action (degrees).
    pub ship_turn_step: f32,
    /// Minimum frames between shots (frames).
    pub missile_cooldown: u64,
    /// Asteroid bounding box.
    pub asteroid_size: Vec2,
    /// Asteroid speed is drawn uniformly from [0, this].
    pub asteroid_max_speed: f32,
    /// Asteroids spawned on reset.
    pub start_asteroids: usize,
    /// Hard cap on concurrently active asteroids.
    pub max_asteroids: usize,
    /// Average spawn rate the probability formula targets.
    pub expected_asteroids_per_sec: f32,
    /// How strongly the spawn probability leans toward the midpoint count.
    pub spawn_driver: f32,
    /// Speed added to the launching ship's speed for a missile.
    pub missile_speed: f32,
    /// Missile collision radius.
    pub missile_radius: f32,
    /// Rotation applied to the launcher heading at missile spawn (degrees).
    pub missile_angle_offset: f32,
    /// How far inside the opposite edge a wrapped entity re-enters.
    pub edge_buffer: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            arena_width: 1600.0,
            arena_height: 1066.0, // 2/3 of the width
            max_players: 8,
            max_entities: 200,
            reset_cooldown: 60,
            welcome_cooldown: 300,
            scoreboard_y_offset: 30.0,
            font_size: 24.0,
            ship_size: Vec2::new(20.0, 20.0),
            ship_speed_step: 0.4,
            ship_turn_step: 5.0,
            missile_cooldown: 10,
            asteroid_size: Vec2::new(35.0, 35.0),
            asteroid_max_speed: 8.0,
            start_asteroids: 5,
            max_asteroids: 30,
            expected_asteroids_per_sec: 3.0,
            spawn_driver: 0.05,
            missile_speed: 20.0,
            missile_radius: 1.0,
            missile_angle_offset: 0.0,
            edge_buffer: 5.0,
        }
    }
}

impl ArenaConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ASTROBRAWL_CONFIG") {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Self>(&contents) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse {path}: {e}, using defaults"),
                },
                Err(e) => tracing::warn!("Failed to read {path}: {e}, using defaults"),
            }
        }
        if let Ok(contents) = std::fs::read_to_string("config/astrobrawl.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }

    /// Asteroid count the spawn probability steers toward.
    pub fn spawn_midpoint(&self) -> f32 {
        ((self.max_asteroids - self.start_asteroids) / 2) as f32
    }

    /// Per-frame spawn probability before the population correction.
    pub fn base_spawn_probability(&self) -> f32 {
        self.expected_asteroids_per_sec / self.fps as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_tuning_constants() {
        let cfg = ArenaConfig::default();
        assert_eq!(cfg.fps, 60);
        assert_eq!(cfg.max_entities, 200);
        assert_eq!(cfg.max_players, 8);
        assert_eq!(cfg.missile_cooldown, 10);
        assert_eq!(cfg.start_asteroids, 5);
        assert_eq!(cfg.max_asteroids, 30);
    }

    #[test]
    fn spawn_midpoint_uses_integer_halving() {
        let cfg = ArenaConfig::default();
        // (30 - 5) / 2 == 12 in integer arithmetic.
        assert_eq!(cfg.spawn_midpoint(), 12.0);
    }

    #[test]
    fn partial_toml_overrides_keep_defaults_elsewhere() {
        let cfg: ArenaConfig = toml::from_str("max_players = 4\nfps = 30").unwrap();
        assert_eq!(cfg.max_players, 4);
        assert_eq!(cfg.fps, 30);
        assert_eq!(cfg.max_entities, 200);
        assert_eq!(cfg.asteroid_max_speed, 8.0);
    }

    #[test]
    fn base_probability_matches_rate_over_fps() {
        let cfg = ArenaConfig::default();
        assert!((cfg.base_spawn_probability() - 0.05).abs() < 1e-6);
    }
}
