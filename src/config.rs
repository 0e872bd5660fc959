// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON in `$XDG_CONFIG_HOME/still-camera/config.json`. Missing
//! fields fall back to their defaults so older files keep loading.

use crate::app::preview::VideoGravity;
use crate::backends::camera::{CameraPosition, DeviceType, PhotoCodec, PhotoSettings};
use crate::constants::{APP_ID, CONFIG_FILE_NAME, QualityPreset};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where saved photos go (default: ~/Pictures/still-camera)
    pub photo_directory: Option<PathBuf>,
    /// Device types tried in order when configuring the session
    pub preferred_devices: Vec<DeviceType>,
    /// Which side of the device to use
    pub camera_position: CameraPosition,
    /// Preview scaling policy
    pub video_gravity: VideoGravity,
    /// Codec requested from the output sink
    pub photo_codec: PhotoCodec,
    /// JPEG quality preset
    pub quality_preset: QualityPreset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photo_directory: None,
            // Dual camera first, wide-angle as the fallback every phone has
            preferred_devices: vec![DeviceType::DualCamera, DeviceType::WideAngleCamera],
            camera_position: CameraPosition::Back,
            video_gravity: VideoGravity::AspectFill,
            photo_codec: PhotoCodec::Jpeg,
            quality_preset: QualityPreset::default(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the default location
    ///
    /// Any problem (no config dir, missing or unreadable file) yields the
    /// defaults; a corrupt file is reported but never fatal.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load the config from a specific file
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Write the config to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Resolved photo directory
    pub fn photo_directory(&self) -> PathBuf {
        if let Some(dir) = &self.photo_directory {
            return dir.clone();
        }
        dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_ID)
    }

    /// Capture settings derived from the config
    pub fn photo_settings(&self) -> PhotoSettings {
        PhotoSettings {
            codec: self.photo_codec,
            quality: self.quality_preset.jpeg_quality(),
        }
    }
}
