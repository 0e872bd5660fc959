// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! Platform collaborators of the camera controller, expressed as traits so
//! the controller can run against a real platform binding or the bundled
//! virtual backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ CameraSessionController  │  ← UI context, owns published state
//! └──────┬──────────┬────────┘
//!        │          │
//!        ▼          ▼
//! ┌────────────┐ ┌───────────────┐ ┌────────────────┐
//! │ Permission │ │ SessionHandle │◄│ CaptureSurface │
//! │ Authority  │ └──────┬────────┘ └────────────────┘
//! └────────────┘        ▼
//!               ┌───────────────┐
//!               │ CaptureSession│  ← device input + photo output
//!               └───────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::{SessionHandle, SessionLease};
pub use types::*;

/// Answers and requests camera authorization
pub trait PermissionAuthority: Send + Sync {
    /// Current authorization status for a media type
    fn authorization_status(&self, media_type: MediaType) -> AuthorizationStatus;

    /// Ask the user for access
    ///
    /// The callback is invoked exactly once, possibly on another thread,
    /// with `true` when access was granted.
    fn request_access(&self, media_type: MediaType, callback: Box<dyn FnOnce(bool) + Send>);
}

/// Live camera pipeline connecting a device input to a photo output
///
/// All methods may block on device I/O and must not be called from the
/// UI context.
pub trait CaptureSession: Send {
    /// Find the default device of a given type at a given position
    fn default_device(&self, device_type: DeviceType, position: CameraPosition)
    -> Option<CameraDevice>;

    /// Enumerate every device the backend knows about
    fn devices(&self) -> Vec<CameraDevice>;

    /// Construct an input from a device
    fn open_input(&self, device: &CameraDevice) -> BackendResult<DeviceInput>;

    /// Start an atomic configuration block
    fn begin_configuration(&mut self) {}

    /// Commit the configuration block
    fn commit_configuration(&mut self) {}

    /// Capability check for an input
    fn can_add_input(&self, input: &DeviceInput) -> bool;

    /// Attach an input; returns false if the session refused it
    fn add_input(&mut self, input: DeviceInput) -> bool;

    /// Capability check for an output
    fn can_add_output(&self, output: &PhotoOutput) -> bool;

    /// Attach an output; returns false if the session refused it
    fn add_output(&mut self, output: PhotoOutput) -> bool;

    /// Start delivering frames
    fn start_running(&mut self) -> BackendResult<()>;

    /// Stop delivering frames and pause the camera hardware
    fn stop_running(&mut self);

    /// Whether the session is currently running
    fn is_running(&self) -> bool;

    /// Request a still photo from the attached output
    ///
    /// The returned completion resolves exactly once, even if the session is
    /// stopped while the request is in flight.
    fn capture_photo(&mut self, settings: PhotoSettings) -> BackendResult<PendingPhoto>;

    /// Native dimensions of the frames the session produces
    fn frame_size(&self) -> Option<(u32, u32)>;
}

/// Rendering layer presenting the live session
pub trait CaptureSurface: Send + Sync {
    /// Bind the surface to the session it renders
    fn bind(&self, lease: SessionLease);

    /// Whether a session is bound
    fn is_bound(&self) -> bool;

    /// Start the bound session (blocking)
    fn start_running(&self) -> BackendResult<()>;

    /// Stop the bound session (blocking)
    fn stop_running(&self);

    /// Native frame size of the configured session
    ///
    /// Called from the UI context; implementations must not touch the session.
    fn set_source_size(&self, size: (u32, u32));

    /// Re-layout the rendering frame for new host bounds
    fn set_bounds(&self, bounds: crate::app::preview::Rect);
}
