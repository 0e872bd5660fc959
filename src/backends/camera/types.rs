// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};
use futures::channel::oneshot;

/// Media type an authorization query refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
        }
    }
}

/// Authorization status reported by a permission authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    Undetermined,
    /// Access granted
    Authorized,
    /// The user refused access
    Denied,
    /// Access is blocked by policy (parental controls, MDM, ...)
    Restricted,
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationStatus::Undetermined => write!(f, "undetermined"),
            AuthorizationStatus::Authorized => write!(f, "authorized"),
            AuthorizationStatus::Denied => write!(f, "denied"),
            AuthorizationStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Physical position of a camera on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
    External,
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
            CameraPosition::External => write!(f, "external"),
        }
    }
}

/// Kind of capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Wide + telephoto pair exposed as one logical device
    DualCamera,
    /// Single wide-angle module
    WideAngleCamera,
    /// Single telephoto module
    TelephotoCamera,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::DualCamera => write!(f, "dual"),
            DeviceType::WideAngleCamera => write!(f, "wide-angle"),
            DeviceType::TelephotoCamera => write!(f, "telephoto"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub unique_id: String,
    pub device_type: DeviceType,
    pub position: CameraPosition,
}

/// Input constructed from a camera device, ready to attach to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    pub device: CameraDevice,
}

/// Still-photo output sink descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoOutput {
    /// Whether the sink should prefer high resolution captures
    pub high_resolution: bool,
}

/// Codec of the encoded photo delivered by the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoCodec {
    #[default]
    Jpeg,
    Png,
}

/// Per-capture settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSettings {
    pub codec: PhotoCodec,
    /// JPEG quality (0-100), ignored for PNG
    pub quality: u8,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            codec: PhotoCodec::Jpeg,
            quality: crate::constants::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Outcome of a single capture request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    /// Encoded photo bytes
    Success(Vec<u8>),
    /// Capture failed with a backend-provided reason
    Failure(String),
}

/// Completion signal for an in-flight capture request
///
/// The output sink keeps the request alive independently of whether the
/// session is still running, so the completion may resolve after the
/// session has been stopped.
#[derive(Debug)]
pub struct PendingPhoto {
    receiver: oneshot::Receiver<CaptureResult>,
}

/// Sending half held by the backend for an in-flight capture
#[derive(Debug)]
pub struct PhotoDelivery {
    sender: oneshot::Sender<CaptureResult>,
}

impl PendingPhoto {
    /// Create a linked completion pair
    pub fn channel() -> (PhotoDelivery, PendingPhoto) {
        let (sender, receiver) = oneshot::channel();
        (PhotoDelivery { sender }, PendingPhoto { receiver })
    }

    /// Create a completion that has already resolved
    pub fn ready(result: CaptureResult) -> Self {
        let (delivery, pending) = Self::channel();
        delivery.deliver(result);
        pending
    }

    /// Wait for the capture to complete
    ///
    /// A backend that drops the request without answering counts as a failure.
    pub async fn wait(self) -> CaptureResult {
        self.receiver.await.unwrap_or_else(|_| {
            CaptureResult::Failure("capture request dropped by output sink".to_string())
        })
    }
}

impl PhotoDelivery {
    /// Deliver the capture outcome
    pub fn deliver(self, result: CaptureResult) {
        // Receiver gone means the controller was torn down; nothing to notify
        let _ = self.sender.send(result);
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Failed to open a device
    DeviceOpenFailed(String),
    /// Operation requires a configured session
    NotConfigured,
    /// Operation requires a running session
    NotRunning,
    /// Session has been torn down
    TornDown,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::DeviceOpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            BackendError::NotConfigured => write!(f, "Session is not configured"),
            BackendError::NotRunning => write!(f, "Session is not running"),
            BackendError::TornDown => write!(f, "Session has been torn down"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_photo_delivers_result() {
        let (delivery, pending) = PendingPhoto::channel();
        delivery.deliver(CaptureResult::Success(vec![0x01, 0x02]));
        assert_eq!(pending.wait().await, CaptureResult::Success(vec![0x01, 0x02]));
    }

    #[tokio::test]
    async fn test_dropped_delivery_is_failure() {
        let (delivery, pending) = PendingPhoto::channel();
        drop(delivery);
        assert!(matches!(pending.wait().await, CaptureResult::Failure(_)));
    }
}
