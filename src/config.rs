use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::room::CleanupConfig;

/// Runtime configuration, read from the environment with the defaults the
/// game was tuned for
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Players required to form one room
    pub required_players: usize,
    /// Rounds per story
    pub max_round: u32,
    /// Reserved player id for simulated traffic; never matched
    pub simulation_player_id: String,
    /// Event-bus buffer size per subscriber
    pub event_capacity: usize,
    /// How long mirrored guest ids stay alive
    pub guest_ttl: Duration,
    pub cleanup: CleanupConfig,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            required_players: 4,
            max_round: 3,
            simulation_player_id: "simulation-player".to_string(),
            event_capacity: 256,
            guest_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cleanup: CleanupConfig::default(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            required_players: env_or("STORYWEAVE_REQUIRED_PLAYERS", defaults.required_players),
            max_round: env_or("STORYWEAVE_MAX_ROUND", defaults.max_round),
            simulation_player_id: env::var("STORYWEAVE_SIMULATION_PLAYER_ID")
                .unwrap_or(defaults.simulation_player_id),
            event_capacity: env_or("STORYWEAVE_EVENT_CAPACITY", defaults.event_capacity),
            guest_ttl: Duration::from_secs(env_or(
                "STORYWEAVE_GUEST_TTL_DAYS",
                7u64,
            ) * 24 * 60 * 60),
            cleanup: CleanupConfig {
                cleanup_interval: Duration::from_secs(env_or(
                    "STORYWEAVE_CLEANUP_INTERVAL_SECS",
                    defaults.cleanup.cleanup_interval.as_secs(),
                )),
                idle_threshold: Duration::from_secs(env_or(
                    "STORYWEAVE_ROOM_TTL_SECS",
                    defaults.cleanup.idle_threshold.as_secs(),
                )),
            },
            bind_addr: env::var("STORYWEAVE_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.required_players, 4);
        assert_eq!(config.max_round, 3);
        assert_eq!(config.simulation_player_id, "simulation-player");
        assert_eq!(config.guest_ttl, Duration::from_secs(604_800));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("STORYWEAVE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("STORYWEAVE_TEST_GARBAGE", 42usize), 42);
        env::remove_var("STORYWEAVE_TEST_GARBAGE");
    }
}
