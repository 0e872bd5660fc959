// SPDX-License-Identifier: MPL-2.0

//! Camera screen logic
//!
//! # Architecture
//!
//! - `controller`: Session lifecycle, permission flow, capture/save/retake
//! - `state`: Published controller state, session states and worker messages
//! - `preview`: Capture surface and preview layout
//!
//! # Main Types
//!
//! - `CameraSessionController`: Owns the session for one camera screen
//! - `ControllerState`: Everything a view renders
//! - `SessionState`: `Idle → Configuring → Running ⇄ Stopped`

pub mod controller;
pub mod preview;
pub mod state;

pub use controller::CameraSessionController;
pub use preview::{PreviewSurface, Rect, VideoGravity};
pub use state::{
    AuthorizationState, ControllerState, Message, SessionConfiguration, SessionState, WorkerJob,
};
