// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use still_camera::Config;
use still_camera::QualityPreset;
use still_camera::app::VideoGravity;
use still_camera::backends::camera::{CameraPosition, DeviceType, PhotoCodec};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(
        config.preferred_devices,
        vec![DeviceType::DualCamera, DeviceType::WideAngleCamera],
        "Dual camera should be preferred with a wide-angle fallback"
    );
    assert_eq!(config.camera_position, CameraPosition::Back);
    assert_eq!(config.video_gravity, VideoGravity::AspectFill);
    assert_eq!(config.photo_codec, PhotoCodec::Jpeg);
    assert!(config.photo_directory.is_none());
}

#[test]
fn test_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        photo_directory: Some(dir.path().join("photos")),
        camera_position: CameraPosition::Front,
        quality_preset: QualityPreset::Maximum,
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_missing_fields_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "video_gravity": "AspectFit" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.video_gravity, VideoGravity::AspectFit);
    assert_eq!(config.preferred_devices, Config::default().preferred_devices);
}

#[test]
fn test_corrupt_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(Config::load_from(&path).is_err());
}

#[test]
fn test_photo_directory_override() {
    let config = Config {
        photo_directory: Some("/tmp/shots".into()),
        ..Default::default()
    };
    assert_eq!(config.photo_directory(), std::path::PathBuf::from("/tmp/shots"));
    assert!(Config::default().photo_directory().ends_with("still-camera"));
}

#[test]
fn test_photo_settings_follow_preset() {
    let config = Config {
        quality_preset: QualityPreset::Low,
        ..Default::default()
    };
    let settings = config.photo_settings();
    assert_eq!(settings.codec, PhotoCodec::Jpeg);
    assert_eq!(settings.quality, QualityPreset::Low.jpeg_quality());
}
