// SPDX-License-Identifier: MPL-2.0

//! Still Camera - a single-photo camera screen
//!
//! This library drives the camera session behind a "take one photo" screen:
//! permission flow, session configuration, live preview binding, capture,
//! saving to the photo library and retake.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Session controller, published state and preview surface
//! - [`backends`]: Platform traits, owned session handle and virtual backend
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo library writer
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use still_camera::app::{CameraSessionController, PreviewSurface, Rect};
//! use still_camera::backends::camera::SessionHandle;
//! use still_camera::backends::virtual_camera::{VirtualCamera, VirtualPermissionAuthority};
//! use still_camera::storage::PhotoLibrary;
//! use still_camera::Config;
//!
//! # async fn run() -> still_camera::errors::AppResult<()> {
//! let config = Config::load();
//! let library = Arc::new(PhotoLibrary::new(config.photo_directory()));
//! let gravity = config.video_gravity;
//! let mut camera = CameraSessionController::new(
//!     config,
//!     Arc::new(VirtualPermissionAuthority::authorized()),
//!     SessionHandle::new(Box::new(VirtualCamera::new())),
//!     library,
//! )?;
//! camera.bind_surface(Arc::new(PreviewSurface::new(gravity, Rect::sized(390.0, 844.0))));
//! camera.check_authorization_and_configure();
//! camera.settle().await;
//! camera.capture_photo();
//! camera.settle().await;
//! camera.save_photo();
//! camera.settle().await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod storage;

// Re-export commonly used types
pub use app::{CameraSessionController, ControllerState, SessionState};
pub use config::Config;
pub use constants::QualityPreset;
