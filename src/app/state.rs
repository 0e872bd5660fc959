// SPDX-License-Identifier: GPL-3.0-only

//! Controller state and messages

use crate::backends::camera::{BackendResult, CameraDevice, CaptureResult, PendingPhoto};
use crate::errors::{AppError, CameraError, PhotoError};
use std::path::PathBuf;

pub use crate::backends::camera::AuthorizationStatus as AuthorizationState;

/// Camera session lifecycle
///
/// ```text
/// Idle ──► Configuring ──► Running ⇄ Stopped
/// ```
///
/// Teardown (dropping the controller) exits from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing configured yet
    #[default]
    Idle,
    /// Configuration in progress or committed, waiting for the surface to start it
    Configuring,
    /// Frames flowing; capture allowed
    Running,
    /// Stopped after a capture; retake restarts it
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Configuring => write!(f, "configuring"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Everything the view layer reads, published after each mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub authorization_state: AuthorizationState,
    pub session_state: SessionState,
    /// Input and output attached and committed
    pub session_ready: bool,
    /// Device whose input is attached
    pub active_device: Option<CameraDevice>,
    pub is_photo_taken: bool,
    pub is_photo_saved: bool,
    /// Encoded photo bytes; empty until a capture completes
    pub captured_image: Vec<u8>,
    /// Ask the view to show the "enable camera access" notice
    pub show_permission_alert: bool,
    /// Most recent failure, if any
    pub last_error: Option<AppError>,
    /// Where the library stored the last saved photo
    pub saved_path: Option<PathBuf>,
}

impl ControllerState {
    /// A photo buffer is available
    pub fn has_photo(&self) -> bool {
        !self.captured_image.is_empty()
    }

    /// Whether the save button should do anything
    pub fn can_save(&self) -> bool {
        self.is_photo_taken && self.has_photo() && !self.is_photo_saved
    }
}

/// Outcome of a successful configuration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfiguration {
    /// Device whose input was attached
    pub device: CameraDevice,
    /// Native frame size, read while the session lock was already held
    pub frame_size: Option<(u32, u32)>,
}

/// Kind of blocking job a worker runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerJob {
    Configure,
    Start,
    Capture,
    Restart,
    Write,
}

impl std::fmt::Display for WorkerJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerJob::Configure => write!(f, "configure"),
            WorkerJob::Start => write!(f, "start"),
            WorkerJob::Capture => write!(f, "capture"),
            WorkerJob::Restart => write!(f, "restart"),
            WorkerJob::Write => write!(f, "write"),
        }
    }
}

/// Results delivered back to the UI context
#[derive(Debug)]
pub enum Message {
    /// Answer to a permission prompt
    AccessResponse(bool),
    /// Session configuration finished on a worker
    SessionConfigured(Result<SessionConfiguration, CameraError>),
    /// The surface started the session
    SessionStarted(BackendResult<()>),
    /// Capture request issued and session stopped
    CaptureFinished {
        generation: u64,
        pending: BackendResult<PendingPhoto>,
    },
    /// Output sink delivered the photo
    PhotoCaptured {
        generation: u64,
        result: CaptureResult,
    },
    /// Retake restarted the session
    SessionRestarted(BackendResult<()>),
    /// Library write finished
    PhotoWritten {
        generation: u64,
        result: Result<PathBuf, PhotoError>,
    },
    /// A worker job panicked or was cancelled
    WorkerFailed { job: WorkerJob, reason: String },
}
