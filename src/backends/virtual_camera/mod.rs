// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! In-process implementations of the platform collaborators. The virtual
//! camera renders a gradient test pattern and encodes it the same way a
//! hardware output sink would, so the controller can be exercised end to
//! end without a device.
//!
//! ```text
//! capture_photo ──► capture thread ──► test pattern ──► JPEG/PNG ──► PendingPhoto
//!                     (independent of running state)
//! ```

use crate::backends::camera::types::*;
use crate::backends::camera::{CaptureSession, PermissionAuthority};
use crate::constants::{VIRTUAL_FRAME_HEIGHT, VIRTUAL_FRAME_WIDTH};
use image::{ImageFormat, RgbImage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shared counters and fault switches for a [`VirtualCamera`]
///
/// The camera itself is moved into a session handle, so tests and the CLI
/// observe and steer it through this probe.
#[derive(Clone, Default)]
pub struct VirtualCameraProbe {
    inner: Arc<ProbeInner>,
}

#[derive(Default)]
struct ProbeInner {
    running: AtomicBool,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    capture_count: AtomicUsize,
    output_rejections: AtomicUsize,
    fail_next_start: Mutex<Option<String>>,
    fail_next_capture: Mutex<Option<String>>,
    capture_payload: Mutex<Option<Vec<u8>>>,
}

impl VirtualCameraProbe {
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.inner.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.inner.stop_count.load(Ordering::SeqCst)
    }

    pub fn capture_count(&self) -> usize {
        self.inner.capture_count.load(Ordering::SeqCst)
    }

    /// Refuse the photo output at the next `count` capability checks
    pub fn reject_next_outputs(&self, count: usize) {
        self.inner.output_rejections.store(count, Ordering::SeqCst);
    }

    /// Make the next start fail
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        *self
            .inner
            .fail_next_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Make the next capture report a failure
    pub fn fail_next_capture(&self, reason: impl Into<String>) {
        *self
            .inner
            .fail_next_capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Deliver these exact bytes instead of an encoded test pattern
    pub fn set_capture_payload(&self, payload: Vec<u8>) {
        *self
            .inner
            .capture_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(payload);
    }

    fn take_output_rejection(&self) -> bool {
        self.inner
            .output_rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn take_start_failure(&self) -> Option<String> {
        self.inner
            .fail_next_start
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn take_failure(&self) -> Option<String> {
        self.inner
            .fail_next_capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn payload(&self) -> Option<Vec<u8>> {
        self.inner
            .capture_payload
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Virtual capture session
pub struct VirtualCamera {
    devices: Vec<CameraDevice>,
    accept_input: bool,
    accept_output: bool,
    input_error: Option<String>,
    frame_size: (u32, u32),
    capture_delay: Duration,
    start_delay: Duration,
    input: Option<DeviceInput>,
    output: Option<PhotoOutput>,
    configuring: bool,
    probe: VirtualCameraProbe,
}

fn virtual_device(device_type: DeviceType, position: CameraPosition) -> CameraDevice {
    CameraDevice {
        name: format!("Virtual {} {} camera", position, device_type),
        unique_id: format!("virtual:{}:{}", position, device_type),
        device_type,
        position,
    }
}

impl VirtualCamera {
    /// A phone-like device set: back dual, back wide-angle and front wide-angle
    pub fn new() -> Self {
        Self {
            devices: vec![
                virtual_device(DeviceType::DualCamera, CameraPosition::Back),
                virtual_device(DeviceType::WideAngleCamera, CameraPosition::Back),
                virtual_device(DeviceType::WideAngleCamera, CameraPosition::Front),
            ],
            accept_input: true,
            accept_output: true,
            input_error: None,
            frame_size: (VIRTUAL_FRAME_WIDTH, VIRTUAL_FRAME_HEIGHT),
            capture_delay: Duration::ZERO,
            start_delay: Duration::ZERO,
            input: None,
            output: None,
            configuring: false,
            probe: VirtualCameraProbe::default(),
        }
    }

    /// Replace the device set
    pub fn with_devices(mut self, devices: Vec<(DeviceType, CameraPosition)>) -> Self {
        self.devices = devices
            .into_iter()
            .map(|(device_type, position)| virtual_device(device_type, position))
            .collect();
        self
    }

    /// Refuse every device input at the capability check
    pub fn rejecting_input(mut self) -> Self {
        self.accept_input = false;
        self
    }

    /// Refuse the photo output at the capability check
    pub fn rejecting_output(mut self) -> Self {
        self.accept_output = false;
        self
    }

    /// Fail input construction with the given reason
    pub fn failing_input(mut self, reason: impl Into<String>) -> Self {
        self.input_error = Some(reason.into());
        self
    }

    /// Delay between a capture request and its delivery
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// Time `start_running` blocks, like hardware warming up
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width.max(1), height.max(1));
        self
    }

    /// Observer for counters and fault injection
    pub fn probe(&self) -> VirtualCameraProbe {
        self.probe.clone()
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the diagonal gradient test pattern
pub fn test_pattern(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) * 255 / (width + height).max(1)) as u8;
        image::Rgb([r, g, b])
    })
}

/// Encode an image the way the virtual output sink does
pub fn encode_pattern(image: &RgbImage, settings: PhotoSettings) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    match settings.codec {
        PhotoCodec::Jpeg => {
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, settings.quality);
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| format!("JPEG encoding failed: {}", e))?;
        }
        PhotoCodec::Png => {
            image
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(|e| format!("PNG encoding failed: {}", e))?;
        }
    }
    Ok(buffer)
}

impl CaptureSession for VirtualCamera {
    fn default_device(
        &self,
        device_type: DeviceType,
        position: CameraPosition,
    ) -> Option<CameraDevice> {
        self.devices
            .iter()
            .find(|d| d.device_type == device_type && d.position == position)
            .cloned()
    }

    fn devices(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn open_input(&self, device: &CameraDevice) -> BackendResult<DeviceInput> {
        if let Some(reason) = &self.input_error {
            return Err(BackendError::DeviceOpenFailed(reason.clone()));
        }
        if !self.devices.contains(device) {
            return Err(BackendError::DeviceNotFound(device.unique_id.clone()));
        }
        Ok(DeviceInput {
            device: device.clone(),
        })
    }

    fn begin_configuration(&mut self) {
        self.configuring = true;
    }

    fn commit_configuration(&mut self) {
        if !self.configuring {
            warn!("Configuration committed without a matching begin");
        }
        self.configuring = false;
        debug!(
            input = ?self.input.as_ref().map(|i| &i.device.name),
            output = self.output.is_some(),
            "Virtual session configuration committed"
        );
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.accept_input && self.input.is_none()
    }

    fn add_input(&mut self, input: DeviceInput) -> bool {
        if !self.can_add_input(&input) {
            return false;
        }
        self.input = Some(input);
        true
    }

    fn can_add_output(&self, _output: &PhotoOutput) -> bool {
        if !self.accept_output || self.output.is_some() {
            return false;
        }
        !self.probe.take_output_rejection()
    }

    fn add_output(&mut self, output: PhotoOutput) -> bool {
        if !self.can_add_output(&output) {
            return false;
        }
        self.output = Some(output);
        true
    }

    fn start_running(&mut self) -> BackendResult<()> {
        if self.input.is_none() {
            return Err(BackendError::NotConfigured);
        }
        if !self.start_delay.is_zero() {
            std::thread::sleep(self.start_delay);
        }
        if let Some(reason) = self.probe.take_start_failure() {
            warn!(reason = %reason, "Virtual start failing on request");
            return Err(BackendError::Other(reason));
        }
        self.probe.inner.running.store(true, Ordering::SeqCst);
        self.probe.inner.start_count.fetch_add(1, Ordering::SeqCst);
        info!("Virtual camera running");
        Ok(())
    }

    fn stop_running(&mut self) {
        self.probe.inner.running.store(false, Ordering::SeqCst);
        self.probe.inner.stop_count.fetch_add(1, Ordering::SeqCst);
        info!("Virtual camera stopped");
    }

    fn is_running(&self) -> bool {
        self.probe.is_running()
    }

    fn capture_photo(&mut self, settings: PhotoSettings) -> BackendResult<PendingPhoto> {
        if self.output.is_none() {
            return Err(BackendError::NotConfigured);
        }
        self.probe.inner.capture_count.fetch_add(1, Ordering::SeqCst);

        let failure = self.probe.take_failure();
        let payload = self.probe.payload();
        let (width, height) = self.frame_size;
        let delay = self.capture_delay;
        let (delivery, pending) = PendingPhoto::channel();

        // The sink owns the request from here on; stopping the session does not cancel it
        std::thread::spawn(move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            let result = if let Some(reason) = failure {
                warn!(reason = %reason, "Virtual capture failing on request");
                CaptureResult::Failure(reason)
            } else if let Some(bytes) = payload {
                CaptureResult::Success(bytes)
            } else {
                match encode_pattern(&test_pattern(width, height), settings) {
                    Ok(bytes) => CaptureResult::Success(bytes),
                    Err(e) => CaptureResult::Failure(e),
                }
            };
            delivery.deliver(result);
        });

        Ok(pending)
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        Some(self.frame_size)
    }
}

/// Virtual permission authority with a scripted answer
pub struct VirtualPermissionAuthority {
    status: Arc<Mutex<AuthorizationStatus>>,
    grant_on_request: bool,
    requests: Arc<AtomicUsize>,
}

impl VirtualPermissionAuthority {
    /// Authority reporting `status`; requests are answered with `grant_on_request`
    pub fn new(status: AuthorizationStatus, grant_on_request: bool) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            grant_on_request,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Already authorized
    pub fn authorized() -> Self {
        Self::new(AuthorizationStatus::Authorized, true)
    }

    /// Number of access requests issued so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionAuthority for VirtualPermissionAuthority {
    fn authorization_status(&self, _media_type: MediaType) -> AuthorizationStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_access(&self, media_type: MediaType, callback: Box<dyn FnOnce(bool) + Send>) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let status = Arc::clone(&self.status);
        let granted = self.grant_on_request;
        info!(media = %media_type, granted, "Virtual permission prompt answered");

        // Platform prompts answer asynchronously, off the caller's context
        std::thread::spawn(move || {
            *status.lock().unwrap_or_else(PoisonError::into_inner) = if granted {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            callback(granted);
        });
    }
}
