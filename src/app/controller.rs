// SPDX-License-Identifier: GPL-3.0-only

//! Camera session controller
//!
//! Owns the session lifecycle for one camera screen. The controller itself is
//! the UI context: every published field is mutated here and nowhere else.
//! Blocking camera work (configuration, start/stop, capture issuance, library
//! writes) runs on the blocking worker pool and reports back as a
//! [`Message`], which the host feeds through [`CameraSessionController::pump`],
//! [`CameraSessionController::next_message`] or [`CameraSessionController::settle`].
//!
//! ```text
//!   UI context (controller)                worker pool
//!   ───────────────────────                ───────────
//!   capture_photo() ──────────────────────► capture + stop
//!   update(CaptureFinished) ◄─────────────┘
//!   update(PhotoCaptured)   ◄──── output sink completion
//! ```

use crate::app::preview::Rect;
use crate::app::state::{
    AuthorizationState, ControllerState, Message, SessionConfiguration, SessionState, WorkerJob,
};
use crate::backends::camera::{
    CameraDevice, CameraPosition, CaptureResult, CaptureSession, CaptureSurface, DeviceType,
    MediaType, PendingPhoto, PermissionAuthority, PhotoOutput, SessionHandle, SessionLease,
};
use crate::config::Config;
use crate::errors::{AppError, AppResult, CameraError, PhotoError};
use crate::storage::MediaLibraryWriter;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Reply slot for a permission prompt
///
/// An authority that drops the callback without calling it counts as a denial,
/// so the pending job is always accounted for.
struct AccessReply {
    sender: Option<mpsc::UnboundedSender<Message>>,
}

impl AccessReply {
    fn send(mut self, granted: bool) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Message::AccessResponse(granted));
        }
    }
}

impl Drop for AccessReply {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            warn!("Permission prompt dropped without an answer");
            let _ = sender.send(Message::AccessResponse(false));
        }
    }
}

/// Controller for a single-photo camera screen
pub struct CameraSessionController {
    config: Config,
    authority: Arc<dyn PermissionAuthority>,
    library: Arc<dyn MediaLibraryWriter>,
    surface: Option<Arc<dyn CaptureSurface>>,
    state: ControllerState,
    publisher: watch::Sender<ControllerState>,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    runtime: Handle,
    /// Worker results not yet applied
    in_flight: usize,
    /// Surface start issued and not yet answered
    start_requested: bool,
    /// Capture issued, session stop not yet confirmed
    stopping: bool,
    /// Retake issued, session restart not yet confirmed
    restarting: bool,
    /// Native frame size reported by the configured session
    frame_size: Option<(u32, u32)>,
    /// Bumped on every capture and retake; stale photo deliveries are dropped
    capture_generation: u64,
    // Dropped last so in-flight leases see the teardown
    session: SessionHandle,
}

impl CameraSessionController {
    /// Create a controller owning `session`
    ///
    /// Must be called from within a Tokio runtime; worker jobs run on its
    /// blocking pool.
    pub fn new(
        config: Config,
        authority: Arc<dyn PermissionAuthority>,
        session: SessionHandle,
        library: Arc<dyn MediaLibraryWriter>,
    ) -> AppResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::Other(format!("Camera controller needs a Tokio runtime: {}", e)))?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = ControllerState::default();
        let (publisher, _) = watch::channel(state.clone());

        Ok(Self {
            config,
            authority,
            library,
            surface: None,
            state,
            publisher,
            sender,
            receiver,
            runtime,
            in_flight: 0,
            start_requested: false,
            stopping: false,
            restarting: false,
            frame_size: None,
            capture_generation: 0,
            session,
        })
    }

    /// Current state snapshot
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Receive every published state change
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.publisher.subscribe()
    }

    /// The owned session
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether any worker result is still outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    // =========================================================================
    // Permission and configuration
    // =========================================================================

    /// Query the permission authority and configure the session if allowed
    pub fn check_authorization_and_configure(&mut self) {
        let status = self.authority.authorization_status(MediaType::Video);
        self.state.authorization_state = status;
        info!(%status, "Camera authorization status");

        match status {
            AuthorizationState::Authorized => self.configure_session(),
            AuthorizationState::Undetermined => {
                self.in_flight += 1;
                let reply = AccessReply {
                    sender: Some(self.sender.clone()),
                };
                self.authority.request_access(
                    MediaType::Video,
                    Box::new(move |granted| reply.send(granted)),
                );
            }
            AuthorizationState::Denied | AuthorizationState::Restricted => {
                warn!(%status, "Camera access not permitted");
                self.state.show_permission_alert = true;
                self.state.last_error = Some(CameraError::PermissionDenied.into());
            }
        }
        self.publish();
    }

    /// Attach the back camera and a photo output to the session
    ///
    /// The device work happens on a worker; the outcome arrives as
    /// [`Message::SessionConfigured`].
    pub fn configure_session(&mut self) {
        if self.state.authorization_state != AuthorizationState::Authorized {
            warn!(
                status = %self.state.authorization_state,
                "Refusing to configure session without authorization"
            );
            return;
        }
        if self.state.session_state != SessionState::Idle {
            debug!(state = %self.state.session_state, "Session already configured");
            return;
        }

        self.state.session_state = SessionState::Configuring;
        let lease = self.session.lease();
        let preferred = self.config.preferred_devices.clone();
        let position = self.config.camera_position;
        self.spawn_worker(WorkerJob::Configure, move || {
            Message::SessionConfigured(configure_blocking(&lease, &preferred, position))
        });
        self.publish();
    }

    /// Dismiss the permission notice
    pub fn dismiss_permission_alert(&mut self) {
        self.state.show_permission_alert = false;
        self.publish();
    }

    // =========================================================================
    // Surface
    // =========================================================================

    /// Bind the capture surface; it starts the session once configured
    pub fn bind_surface(&mut self, surface: Arc<dyn CaptureSurface>) {
        surface.bind(self.session.lease());
        if let Some(size) = self.frame_size {
            surface.set_source_size(size);
        }
        self.surface = Some(surface);
        self.start_if_ready();
        self.publish();
    }

    /// Host bounds changed
    ///
    /// Runs on the UI context and never waits on the session.
    pub fn resize_surface(&self, bounds: Rect) {
        if let Some(surface) = &self.surface {
            surface.set_bounds(bounds);
        }
    }

    fn start_if_ready(&mut self) {
        if !self.state.session_ready
            || self.state.session_state != SessionState::Configuring
            || self.start_requested
        {
            return;
        }
        let Some(surface) = self.surface.clone() else {
            debug!("Session ready, waiting for a surface");
            return;
        };

        self.start_requested = true;
        self.spawn_worker(WorkerJob::Start, move || {
            Message::SessionStarted(surface.start_running())
        });
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Capture a still photo and stop the session
    ///
    /// Only allowed while the session is running; repeated taps are ignored
    /// because the session leaves `Running` immediately.
    pub fn capture_photo(&mut self) {
        if self.state.session_state != SessionState::Running {
            warn!(state = %self.state.session_state, "Ignoring capture: session not running");
            return;
        }

        info!("Capturing photo...");
        self.state.session_state = SessionState::Stopped;
        self.stopping = true;
        self.capture_generation += 1;

        let generation = self.capture_generation;
        let lease = self.session.lease();
        let settings = self.config.photo_settings();
        self.spawn_worker(WorkerJob::Capture, move || {
            // Request first, then stop; the sink keeps the request alive
            let pending = lease.capture_photo(settings);
            lease.stop_running();
            Message::CaptureFinished {
                generation,
                pending,
            }
        });
        self.publish();
    }

    /// Apply the output sink's answer for the current capture
    pub fn on_photo_captured(&mut self, result: CaptureResult) {
        match result {
            CaptureResult::Success(bytes) => {
                info!(size = bytes.len(), "Photo captured");
                self.state.captured_image = bytes;
            }
            CaptureResult::Failure(reason) => {
                error!(%reason, "Photo capture failed");
                self.state.captured_image.clear();
                self.state.last_error = Some(PhotoError::CaptureFailed(reason).into());
            }
        }
        self.publish();
    }

    fn await_photo(&mut self, generation: u64, pending: PendingPhoto) {
        self.in_flight += 1;
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            let result = pending.wait().await;
            let _ = sender.send(Message::PhotoCaptured { generation, result });
        });
    }

    // =========================================================================
    // Save and retake
    // =========================================================================

    /// Hand the captured photo to the media library
    ///
    /// Marks the photo saved as soon as the write is issued; the write outcome
    /// only shows up in `saved_path` / `last_error`.
    pub fn save_photo(&mut self) {
        if self.state.captured_image.is_empty() {
            warn!("Ignoring save: no captured photo");
            return;
        }
        if self.state.is_photo_saved {
            debug!("Ignoring save: photo already saved");
            return;
        }
        if !self.state.is_photo_taken {
            warn!("Ignoring save: no capture in progress");
            return;
        }

        let generation = self.capture_generation;
        let bytes = self.state.captured_image.clone();
        let library = Arc::clone(&self.library);
        self.spawn_worker(WorkerJob::Write, move || Message::PhotoWritten {
            generation,
            result: library.write(&bytes),
        });

        self.state.is_photo_saved = true;
        self.publish();
    }

    /// Discard the photo and restart the session
    pub fn retake(&mut self) {
        if self.state.session_state != SessionState::Stopped || self.stopping || self.restarting {
            warn!(
                state = %self.state.session_state,
                stopping = self.stopping,
                restarting = self.restarting,
                "Ignoring retake: session not stopped"
            );
            return;
        }

        info!("Retaking photo");
        self.state.is_photo_taken = false;
        self.state.is_photo_saved = false;
        self.state.captured_image.clear();
        self.state.saved_path = None;
        self.state.last_error = None;
        self.capture_generation += 1;
        self.restarting = true;

        let lease = self.session.lease();
        self.spawn_worker(WorkerJob::Restart, move || {
            Message::SessionRestarted(lease.start_running())
        });
        self.publish();
    }

    // =========================================================================
    // Message loop
    // =========================================================================

    /// Apply all results that are already queued
    pub fn pump(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            self.update(message);
        }
    }

    /// Wait for the next result and apply it
    ///
    /// Returns false when nothing is outstanding.
    pub async fn next_message(&mut self) -> bool {
        if self.in_flight == 0 {
            self.pump();
            return false;
        }
        match self.receiver.recv().await {
            Some(message) => {
                self.update(message);
                true
            }
            None => false,
        }
    }

    /// Drive the controller until every worker result has been applied
    pub async fn settle(&mut self) {
        while self.next_message().await {}
    }

    fn update(&mut self, message: Message) {
        self.in_flight = self.in_flight.saturating_sub(1);
        debug!(in_flight = self.in_flight, "Applying worker result");

        match message {
            Message::AccessResponse(granted) => {
                if granted {
                    info!("Camera access granted");
                    self.state.authorization_state = AuthorizationState::Authorized;
                    self.configure_session();
                } else {
                    info!("Camera access denied at prompt");
                    self.state.authorization_state = AuthorizationState::Denied;
                }
            }
            Message::SessionConfigured(Ok(SessionConfiguration { device, frame_size })) => {
                info!(device = %device.name, kind = %device.device_type, "Session configured");
                self.frame_size = frame_size;
                if let (Some(surface), Some(size)) = (&self.surface, frame_size) {
                    surface.set_source_size(size);
                }
                self.state.session_ready = true;
                self.state.active_device = Some(device);
                self.start_if_ready();
            }
            Message::SessionConfigured(Err(err)) => {
                error!(%err, "Session configuration failed");
                self.state.session_state = SessionState::Idle;
                self.state.session_ready = false;
                self.state.active_device = None;
                self.state.last_error = Some(err.into());
            }
            Message::SessionStarted(result) => {
                self.start_requested = false;
                match result {
                    Ok(()) => {
                        info!("Session running");
                        self.state.session_state = SessionState::Running;
                    }
                    Err(err) => {
                        error!(%err, "Surface failed to start session");
                        self.state.last_error =
                            Some(CameraError::StartFailed(err.to_string()).into());
                    }
                }
            }
            Message::CaptureFinished {
                generation,
                pending,
            } => {
                self.stopping = false;
                self.state.is_photo_taken = true;
                match pending {
                    Ok(pending) => self.await_photo(generation, pending),
                    Err(err) => self.on_photo_captured(CaptureResult::Failure(err.to_string())),
                }
            }
            Message::PhotoCaptured { generation, result } => {
                if generation == self.capture_generation {
                    self.on_photo_captured(result);
                } else {
                    debug!(generation, "Discarding photo from an earlier capture");
                }
            }
            Message::SessionRestarted(result) => {
                self.restarting = false;
                match result {
                    Ok(()) => {
                        info!("Session restarted");
                        self.state.session_state = SessionState::Running;
                    }
                    Err(err) => {
                        error!(%err, "Failed to restart session");
                        self.state.last_error =
                            Some(CameraError::StartFailed(err.to_string()).into());
                    }
                }
            }
            Message::PhotoWritten { generation, result } => {
                if generation != self.capture_generation {
                    debug!(generation, "Discarding library write for a retaken photo");
                } else {
                    match result {
                        Ok(path) => {
                            info!(path = %path.display(), "Photo written to library");
                            self.state.saved_path = Some(path);
                        }
                        Err(err) => {
                            error!(%err, "Photo library write failed");
                            self.state.last_error = Some(err.into());
                        }
                    }
                }
            }
            Message::WorkerFailed { job, reason } => {
                error!(%job, %reason, "Camera worker failed");
                self.recover_from_failed_job(job);
                self.state.last_error = Some(AppError::Other(reason));
            }
        }
        self.publish();
    }

    /// Clear the pending flag a lost job would otherwise leave set
    fn recover_from_failed_job(&mut self, job: WorkerJob) {
        match job {
            WorkerJob::Configure => {
                self.state.session_state = SessionState::Idle;
                self.state.session_ready = false;
                self.state.active_device = None;
            }
            WorkerJob::Start => self.start_requested = false,
            // Session state is unknown; allow retake to restart it
            WorkerJob::Capture => self.stopping = false,
            WorkerJob::Restart => self.restarting = false,
            WorkerJob::Write => {}
        }
    }

    fn spawn_worker<F>(&mut self, job: WorkerJob, work: F)
    where
        F: FnOnce() -> Message + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.sender.clone();
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let message = runtime.spawn_blocking(work).await.unwrap_or_else(|e| {
                Message::WorkerFailed {
                    job,
                    reason: format!("{} worker error: {}", job, e),
                }
            });
            let _ = sender.send(message);
        });
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

impl std::fmt::Debug for CameraSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSessionController")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight)
            .field("session", &self.session)
            .finish()
    }
}

/// Select a device and attach input and output inside one configuration block
fn configure_blocking(
    lease: &SessionLease,
    preferred: &[DeviceType],
    position: CameraPosition,
) -> Result<SessionConfiguration, CameraError> {
    lease
        .with_session(|session| {
            session.begin_configuration();
            let result = attach_device(session, preferred, position);
            session.commit_configuration();
            result.map(|device| SessionConfiguration {
                device,
                frame_size: session.frame_size(),
            })
        })
        .map_err(CameraError::from)?
}

fn attach_device(
    session: &mut dyn CaptureSession,
    preferred: &[DeviceType],
    position: CameraPosition,
) -> Result<CameraDevice, CameraError> {
    let device = preferred
        .iter()
        .find_map(|device_type| session.default_device(*device_type, position))
        .ok_or(CameraError::NoCameraFound)?;
    debug!(device = %device.name, "Selected camera device");

    let input = session
        .open_input(&device)
        .map_err(|e| CameraError::InputFailed(e.to_string()))?;
    let output = PhotoOutput {
        high_resolution: true,
    };

    // Check both before attaching either so a refusal leaves the session untouched
    if !session.can_add_input(&input) {
        return Err(CameraError::InputRejected);
    }
    if !session.can_add_output(&output) {
        return Err(CameraError::OutputRejected);
    }
    if !session.add_input(input) {
        return Err(CameraError::InputRejected);
    }
    if !session.add_output(output) {
        return Err(CameraError::OutputRejected);
    }

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::preview::{PreviewSurface, VideoGravity};
    use crate::backends::virtual_camera::{
        VirtualCamera, VirtualCameraProbe, VirtualPermissionAuthority,
    };
    use crate::storage::PhotoLibrary;

    async fn running() -> (CameraSessionController, VirtualCameraProbe) {
        let camera = VirtualCamera::new();
        let probe = camera.probe();
        let mut controller = CameraSessionController::new(
            Config::default(),
            Arc::new(VirtualPermissionAuthority::authorized()),
            SessionHandle::new(Box::new(camera)),
            Arc::new(PhotoLibrary::new(std::env::temp_dir())),
        )
        .unwrap();
        controller.bind_surface(Arc::new(PreviewSurface::new(
            VideoGravity::AspectFill,
            Rect::sized(100.0, 100.0),
        )));
        controller.check_authorization_and_configure();
        controller.settle().await;
        assert_eq!(controller.state().session_state, SessionState::Running);
        (controller, probe)
    }

    #[tokio::test]
    async fn test_lost_capture_worker_allows_retake() {
        let (mut controller, probe) = running().await;
        controller.state.session_state = SessionState::Stopped;
        controller.stopping = true;

        controller.update(Message::WorkerFailed {
            job: WorkerJob::Capture,
            reason: "capture worker error: task panicked".to_string(),
        });
        assert!(!controller.stopping);
        assert!(matches!(controller.state().last_error, Some(AppError::Other(_))));

        controller.retake();
        controller.settle().await;
        assert_eq!(controller.state().session_state, SessionState::Running);
        assert_eq!(probe.start_count(), 2);
    }

    #[tokio::test]
    async fn test_lost_restart_worker_allows_retake() {
        let (mut controller, _probe) = running().await;
        controller.state.session_state = SessionState::Stopped;
        controller.restarting = true;

        controller.update(Message::WorkerFailed {
            job: WorkerJob::Restart,
            reason: "restart worker error: task panicked".to_string(),
        });
        assert!(!controller.restarting);
    }

    #[tokio::test]
    async fn test_lost_configure_worker_returns_to_idle() {
        let (mut controller, _probe) = running().await;
        controller.state.session_state = SessionState::Configuring;

        controller.update(Message::WorkerFailed {
            job: WorkerJob::Configure,
            reason: "configure worker error: task panicked".to_string(),
        });
        assert_eq!(controller.state().session_state, SessionState::Idle);
        assert!(!controller.state().session_ready);
        assert!(controller.state().active_device.is_none());
    }
}
