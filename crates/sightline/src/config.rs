//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `sightline.ron` file (if exists)
//! 3. Environment variables prefixed with `SIGHTLINE_`
//!
//! Example environment variable: `SIGHTLINE_PLAYBACK__DEFAULT_DURATION_MS=750`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};
use sightline_core::{DEFAULT_DURATION_MS, DEFAULT_EASING, RegistryDefaults, SequenceOptions};

/// Main runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SightlineConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

/// Viewpoint playback preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Transition duration given to freshly captured viewpoints
    pub default_duration_ms: u32,
    /// Easing name given to freshly captured viewpoints
    pub default_easing: String,
    /// Pause between sequence steps
    pub sequence_interval_ms: u64,
    /// Play the main bucket as a sequence once the tour's setup has run
    pub auto_play_enabled: bool,
    /// Loop the auto-played sequence
    pub auto_play_loop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_DURATION_MS,
            default_easing: DEFAULT_EASING.to_string(),
            sequence_interval_ms: 500,
            auto_play_enabled: false,
            auto_play_loop: false,
        }
    }
}

/// Headless frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Simulated frames per second
    pub fps: u32,
    /// Hard cap on frames per tour (10 minutes at 60 fps)
    pub max_frames: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            max_frames: 36_000,
        }
    }
}

/// Debug/development settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebugConfig {
    /// Enable verbose logging
    pub verbose_logging: bool,
}

impl SightlineConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `sightline.ron` file (if exists)
    /// 3. Environment variables prefixed with `SIGHTLINE_` (highest priority)
    pub fn load() -> Result<Self> {
        let builder = Self::defaults()?
            .add_source(
                File::with_name("sightline")
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            .add_source(Environment::with_prefix("SIGHTLINE").separator("__"));

        Self::build(builder)
    }

    /// Like [`SightlineConfig::load`], but with an explicit file that must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let builder = Self::defaults()?
            .add_source(File::from(path).format(config::FileFormat::Ron).required(true))
            .add_source(Environment::with_prefix("SIGHTLINE").separator("__"));

        Self::build(builder).with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            .set_default("playback.default_duration_ms", DEFAULT_DURATION_MS as i64)?
            .set_default("playback.default_easing", DEFAULT_EASING)?
            .set_default("playback.sequence_interval_ms", 500_i64)?
            .set_default("playback.auto_play_enabled", false)?
            .set_default("playback.auto_play_loop", false)?
            .set_default("runner.fps", 60_i64)?
            .set_default("runner.max_frames", 36_000_i64)?
            .set_default("debug.verbose_logging", false)?;
        Ok(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Values for viewpoints captured by a director built from this config.
    pub fn registry_defaults(&self) -> RegistryDefaults {
        RegistryDefaults {
            duration_ms: self.playback.default_duration_ms,
            easing_name: self.playback.default_easing.clone(),
        }
    }

    /// Sequence options on the main bucket with the configured interval.
    pub fn sequence_options(&self) -> SequenceOptions {
        SequenceOptions {
            loop_playback: self.playback.auto_play_loop,
            interval_ms: self.playback.sequence_interval_ms,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SightlineConfig::default();
        assert_eq!(config.playback.default_duration_ms, 1000);
        assert_eq!(config.playback.default_easing, "Linear.None");
        assert_eq!(config.playback.sequence_interval_ms, 500);
        assert!(!config.playback.auto_play_enabled);
        assert_eq!(config.runner.fps, 60);
        assert_eq!(config.runner.max_frames, 36_000);
        assert!(!config.debug.verbose_logging);
    }

    #[test]
    fn test_load_config_with_defaults() {
        // Should load defaults when no config file exists
        let config = SightlineConfig::load().expect("Failed to load config");
        assert_eq!(config.runner.fps, 60);
        assert_eq!(config.playback.default_easing, "Linear.None");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(
            file,
            r#"(
                playback: (default_duration_ms: 250, default_easing: "Cubic.InOut"),
                runner: (fps: 30),
            )"#
        )
        .unwrap();

        let config = SightlineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.playback.default_duration_ms, 250);
        assert_eq!(config.playback.default_easing, "Cubic.InOut");
        assert_eq!(config.playback.sequence_interval_ms, 500);
        assert_eq!(config.runner.fps, 30);
        assert_eq!(config.runner.max_frames, 36_000);

        let defaults = config.registry_defaults();
        assert_eq!(defaults.duration_ms, 250);
        assert_eq!(defaults.easing_name, "Cubic.InOut");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(SightlineConfig::load_from("/nonexistent/sightline.ron").is_err());
    }
}
