//! Player configuration.

use std::time::Duration;

/// Largest accepted minimum delay between frames, in milliseconds.
pub const MAX_DELAY_MS: u64 = 2_100_000;

/// Minimum delay between frames when none is configured.
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Loop mode for movie playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoopMode {
    /// Stop at the end of the movie
    #[default]
    Once,
    /// Rewind the source and play again; needs a seekable source
    Loop,
}

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("delay must be between 0 and {max} milliseconds (inclusive), got {delay_ms}")]
    DelayTooLong { delay_ms: u64, max: u64 },
    #[cfg(feature = "toml")]
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Validated playback settings.
///
/// All fields are optional in a config file; missing ones take defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct PlayerConfig {
    /// Minimum time each frame stays on screen, in milliseconds
    pub delay_ms: u64,
    /// Whether to replay the movie from the start
    #[cfg_attr(feature = "serde", serde(rename = "loop"))]
    pub loop_mode: LoopMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            loop_mode: LoopMode::Once,
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a TOML config string.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use tmv::{LoopMode, PlayerConfig};
    ///
    /// let config = PlayerConfig::from_toml_str("delay_ms = 40\nloop = \"loop\"").unwrap();
    /// assert_eq!(config.delay_ms, 40);
    /// assert_eq!(config.loop_mode, LoopMode::Loop);
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the delay is within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::DelayTooLong {
                delay_ms: self.delay_ms,
                max: MAX_DELAY_MS,
            });
        }
        Ok(())
    }

    /// Minimum time between frames. Zero disables pacing.
    #[inline]
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Check if the movie should be replayed.
    #[inline]
    pub fn loops(&self) -> bool {
        self.loop_mode == LoopMode::Loop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.delay_ms, 100);
        assert_eq!(config.loop_mode, LoopMode::Once);
        assert_eq!(config.frame_delay(), Duration::from_millis(100));
        assert!(!config.loops());
    }

    #[test]
    fn delay_bounds() {
        let ok = PlayerConfig {
            delay_ms: MAX_DELAY_MS,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_long = PlayerConfig {
            delay_ms: MAX_DELAY_MS + 1,
            ..Default::default()
        };
        assert!(matches!(
            too_long.validate(),
            Err(ConfigError::DelayTooLong { .. })
        ));
    }

    #[test]
    fn zero_delay_disables_pacing() {
        let config = PlayerConfig {
            delay_ms: 0,
            ..Default::default()
        };
        assert!(config.frame_delay().is_zero());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_partial() {
        let config = PlayerConfig::from_toml_str("loop = \"loop\"").unwrap();
        assert_eq!(config.delay_ms, DEFAULT_DELAY_MS);
        assert!(config.loops());

        let empty = PlayerConfig::from_toml_str("").unwrap();
        assert_eq!(empty, PlayerConfig::default());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_rejects_bad_values() {
        assert!(matches!(
            PlayerConfig::from_toml_str("delay_ms = 3000000"),
            Err(ConfigError::DelayTooLong { .. })
        ));
        assert!(matches!(
            PlayerConfig::from_toml_str("loop = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            PlayerConfig::from_toml_str("fps = 24"),
            Err(ConfigError::Toml(_))
        ));
    }
}
