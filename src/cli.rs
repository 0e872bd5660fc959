// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running the full permission → preview → capture → save flow
//! - Showing the effective configuration

use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use still_camera::app::{CameraSessionController, PreviewSurface, Rect, SessionState};
use still_camera::backends::camera::{AuthorizationStatus, CaptureSession, SessionHandle};
use still_camera::backends::virtual_camera::{VirtualCamera, VirtualPermissionAuthority};
use still_camera::storage::{PhotoLibrary, latest_photo};
use still_camera::Config;

/// Default preview bounds for the CLI run (a portrait phone screen)
const PREVIEW_WIDTH: f32 = 390.0;
const PREVIEW_HEIGHT: f32 = 844.0;

/// Authorization the virtual permission authority reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionArg {
    Authorized,
    Undetermined,
    Denied,
    Restricted,
}

impl From<PermissionArg> for AuthorizationStatus {
    fn from(arg: PermissionArg) -> Self {
        match arg {
            PermissionArg::Authorized => AuthorizationStatus::Authorized,
            PermissionArg::Undetermined => AuthorizationStatus::Undetermined,
            PermissionArg::Denied => AuthorizationStatus::Denied,
            PermissionArg::Restricted => AuthorizationStatus::Restricted,
        }
    }
}

/// Options for a photo run
pub struct PhotoOptions {
    pub output: Option<PathBuf>,
    pub permission: PermissionArg,
    pub deny_request: bool,
    pub retake: bool,
    pub fail_capture: Option<String>,
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let camera = VirtualCamera::new();

    let selected = config
        .preferred_devices
        .iter()
        .find_map(|kind| camera.default_device(*kind, config.camera_position));
    let cameras = camera.devices();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, device) in cameras.iter().enumerate() {
        let marker = if selected.as_ref() == Some(device) {
            " (selected)"
        } else {
            ""
        };
        println!("  [{}] {}{}", index, device.name, marker);
        println!(
            "      Type: {}, position: {}",
            device.device_type, device.position
        );
    }

    Ok(())
}

/// Take a photo through the session controller
pub fn take_photo(options: PhotoOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if let Some(dir) = options.output {
        config.photo_directory = Some(dir);
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let camera = VirtualCamera::new();
        let probe = camera.probe();
        if let Some(reason) = options.fail_capture {
            probe.fail_next_capture(reason);
        }

        let library = Arc::new(PhotoLibrary::new(config.photo_directory()));
        let photo_dir = library.directory().to_path_buf();
        let gravity = config.video_gravity;
        let authority = Arc::new(VirtualPermissionAuthority::new(
            options.permission.into(),
            !options.deny_request,
        ));

        let mut controller = CameraSessionController::new(
            config,
            authority,
            SessionHandle::new(Box::new(camera)),
            library,
        )?;
        controller.bind_surface(Arc::new(PreviewSurface::new(
            gravity,
            Rect::sized(PREVIEW_WIDTH, PREVIEW_HEIGHT),
        )));

        controller.check_authorization_and_configure();
        controller.settle().await;

        let state = controller.state();
        if state.show_permission_alert {
            println!("Please enable camera access.");
            return Ok(());
        }
        if state.session_state != SessionState::Running {
            let reason = state
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| format!("camera access {}", state.authorization_state));
            return Err(format!("Camera not running: {}", reason).into());
        }

        println!("Capturing...");
        controller.capture_photo();
        controller.settle().await;

        if options.retake {
            println!("Retaking...");
            controller.retake();
            controller.settle().await;
            controller.capture_photo();
            controller.settle().await;
        }

        if !controller.state().has_photo() {
            let reason = controller
                .state()
                .last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no photo delivered".to_string());
            return Err(format!("Capture failed: {}", reason).into());
        }
        println!(
            "Captured {} bytes",
            controller.state().captured_image.len()
        );

        controller.save_photo();
        controller.settle().await;

        let state = controller.state();
        match (&state.saved_path, &state.last_error) {
            (Some(path), _) => println!("Photo saved: {}", path.display()),
            (None, Some(err)) => return Err(err.to_string().into()),
            (None, None) => println!("Photo handed to the library"),
        }

        if let Some(latest) = latest_photo(photo_dir).await {
            println!("Latest photo in library: {}", latest.display());
        }

        Ok::<_, Box<dyn std::error::Error>>(())
    })
}

/// Print the effective configuration
pub fn show_config() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    match Config::default_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!("Photo directory: {}", config.photo_directory().display());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
