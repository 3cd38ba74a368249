//! Application configuration management.

use std::path::PathBuf;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active user: identity, taste, theme. Read-only input to the engine,
    /// refreshed at session start.
    #[serde(default)]
    pub user: UserConfig,

    /// Feed and navigation tuning
    #[serde(default)]
    pub feed: FeedConfig,

    /// Player configuration
    #[serde(default)]
    pub player: PlayerConfig,

    /// Favorites persistence service
    #[serde(default)]
    pub favorites: FavoritesConfig,
}

/// The active user's identity and preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User id sent to the favorites service
    #[serde(default = "default_user_id")]
    pub id: String,

    /// Preferred genres; empty means "no preference, use the trending pool"
    #[serde(default)]
    pub favorite_genres: Vec<String>,

    /// Visualizer theme token
    #[serde(default = "default_theme")]
    pub theme: String,
}

/// Feed aggregation and navigation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Tracks requested per genre channel per round
    #[serde(default = "default_tracks_per_genre")]
    pub tracks_per_genre: usize,

    /// Distance from the feed tail that triggers a prefetch round
    #[serde(default = "default_lookahead")]
    pub lookahead: usize,

    /// Navigation debounce cooldown in milliseconds
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Minimum accumulated wheel delta for one navigation intent
    #[serde(default = "default_wheel_threshold")]
    pub wheel_threshold: i32,

    /// Minimum drag distance in rows for one swipe intent
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: u16,

    /// Per-request timeout for catalog queries, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Player configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume level (0-100)
    #[serde(default = "default_volume")]
    pub volume: u8,
}

/// Favorites service connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FavoritesConfig {
    /// Base URL of the favorites service; unset means favorites are
    /// session-local only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_user_id() -> String {
    String::from("local")
}

fn default_theme() -> String {
    String::from("default")
}

fn default_tracks_per_genre() -> usize {
    10
}

fn default_lookahead() -> usize {
    10
}

fn default_cooldown_ms() -> u64 {
    700
}

fn default_wheel_threshold() -> i32 {
    2
}

fn default_swipe_threshold() -> u16 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_volume() -> u8 {
    80
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            favorite_genres: Vec::new(),
            theme: default_theme(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tracks_per_genre: default_tracks_per_genre(),
            lookahead: default_lookahead(),
            cooldown_ms: default_cooldown_ms(),
            wheel_threshold: default_wheel_threshold(),
            swipe_threshold: default_swipe_threshold(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
        }
    }
}

impl Config {
    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join("swipefm").join("config.toml"))
    }

    /// Load configuration from file, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Clamp values that would otherwise wedge the engine
        config.player.volume = config.player.volume.min(100);
        config.feed.lookahead = config.feed.lookahead.max(1);
        config.feed.tracks_per_genre = config.feed.tracks_per_genre.max(1);

        Ok(config)
    }

    /// Save configuration to file.
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        Ok(())
    }

    /// Session volume as the 0.0-1.0 level the player expects.
    pub fn volume_level(&self) -> f32 {
        f32::from(self.player.volume) / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = Config::default();
        assert!(config.user.favorite_genres.is_empty());
        assert_eq!(config.feed.lookahead, 10);
        assert_eq!(config.feed.cooldown_ms, 700);
        assert!((config.volume_level() - 0.8).abs() < f32::EPSILON);
        assert!(config.favorites.base_url.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [user]
            id = "u-1"
            favorite_genres = ["Pop", "Dance"]
            "#,
        )
        .unwrap();

        assert_eq!(config.user.id, "u-1");
        assert_eq!(config.user.theme, "default");
        assert_eq!(config.feed.tracks_per_genre, 10);
    }
}
