// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Application identifier used for config and photo directories
pub const APP_ID: &str = "still-camera";

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Prefix of saved photo file names
pub const PHOTO_FILE_PREFIX: &str = "IMG";

/// JPEG quality used when no preset is configured
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Virtual camera frame size
pub const VIRTUAL_FRAME_WIDTH: u32 = 640;
pub const VIRTUAL_FRAME_HEIGHT: u32 = 480;

/// Photo quality presets
///
/// Only affects lossy codecs; PNG captures ignore the preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityPreset {
    /// High compression
    Low,
    /// Balanced
    Medium,
    /// Low compression (default)
    #[default]
    High,
    /// Minimal compression
    Maximum,
}

impl QualityPreset {
    /// Get all preset variants for UI iteration
    pub const ALL: [QualityPreset; 4] = [
        QualityPreset::Low,
        QualityPreset::Medium,
        QualityPreset::High,
        QualityPreset::Maximum,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
            QualityPreset::Maximum => "Maximum",
        }
    }

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 80,
            QualityPreset::High => DEFAULT_JPEG_QUALITY,
            QualityPreset::Maximum => 98,
        }
    }
}
