//! Configuration from an optional `~/.glitch/config.yaml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! Command-line flags override what the file says.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::AudioConfig;
use crate::midi::MidiConfig;
use crate::osc::OscConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchConfig {
    pub audio: AudioConfig,
    pub midi: MidiConfig,
    pub osc: OscConfig,
    /// Directory of user samples, one subdirectory per sample function.
    pub samples_dir: Option<PathBuf>,
    /// Seed for `r()`, pluck noise and the synthesized drums.
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Yaml(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Yaml(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Yaml(e)
    }
}

/// Default path for the config file.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".glitch");
    path.push("config.yaml");
    path
}

impl GlitchConfig {
    /// Load from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Like [`load`](Self::load), but a missing file is created with the
    /// defaults so there is something to edit. Failing to write it is only
    /// logged.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        match config.save(path) {
            Ok(()) => info!(path = %path.display(), "wrote default config"),
            Err(e) => warn!(path = %path.display(), "could not write default config: {e}"),
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = GlitchConfig::load(&dir.path().join("none.yaml")).unwrap();
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.osc.listen_port, 9000);
        assert!(config.samples_dir.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
audio:
  sample_rate: 48000
midi:
  channel_filter: 9
seed: 7
"#;
        let config = GlitchConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.audio.channels, 2);
        assert_eq!(config.midi.channel_filter, Some(9));
        assert!(config.midi.device_name.is_none());
        assert_eq!(config.osc.prefix, "/glitch");
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn empty_file_is_default() {
        let config = GlitchConfig::from_yaml("\n").unwrap();
        assert_eq!(config.audio.buffer_size, 512);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = GlitchConfig::from_yaml("audio: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let mut config = GlitchConfig::default();
        config.audio.volume = 0.5;
        config.samples_dir = Some(PathBuf::from("/tmp/samples"));
        config.save(&path).unwrap();

        let loaded = GlitchConfig::load(&path).unwrap();
        assert_eq!(loaded.audio.volume, 0.5);
        assert_eq!(loaded.samples_dir, Some(PathBuf::from("/tmp/samples")));
    }

    #[test]
    fn first_load_writes_the_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".glitch").join("config.yaml");
        let config = GlitchConfig::load_or_init(&path).unwrap();
        assert_eq!(config.audio, AudioConfig::default());
        assert!(path.exists());

        std::fs::write(&path, "seed: 3\n").unwrap();
        let config = GlitchConfig::load_or_init(&path).unwrap();
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn unwritable_location_still_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let path = blocker.join("config.yaml");
        let config = GlitchConfig::load_or_init(&path).unwrap();
        assert_eq!(config.osc.listen_port, 9000);
        assert!(!path.exists());
    }

    #[test]
    fn default_path_is_under_dot_glitch() {
        let path = default_config_path();
        assert!(path.ends_with(".glitch/config.yaml"));
    }
}
