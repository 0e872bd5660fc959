// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use still_camera::constants::QualityPreset;

#[test]
fn test_quality_preset_values() {
    assert_eq!(QualityPreset::ALL.len(), 4);
}

#[test]
fn test_quality_preset_ordering() {
    // Presets are ordered from most to least compression
    let mut prev_quality = 0u8;
    for preset in QualityPreset::ALL {
        let quality = preset.jpeg_quality();
        assert!(
            quality > prev_quality,
            "Presets should be ordered from lowest to highest"
        );
        assert!(quality <= 100);
        prev_quality = quality;
    }
}

#[test]
fn test_quality_preset_names() {
    for preset in QualityPreset::ALL {
        assert!(!preset.display_name().is_empty());
    }
}
