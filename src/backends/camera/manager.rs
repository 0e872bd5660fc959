// SPDX-License-Identifier: GPL-3.0-only

//! Owned capture session handle
//!
//! The handle provides:
//! - Exclusive ownership of the camera session (not `Clone`)
//! - Short-lived leases for worker jobs and the capture surface
//! - Deterministic teardown when the handle is dropped

use super::CaptureSession;
use super::types::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Internal session state
struct SessionSlot {
    /// The platform session
    session: Box<dyn CaptureSession>,
    /// Set once the owning handle has been dropped
    torn_down: bool,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

fn lock(slot: &SharedSlot) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owning handle to the camera session
///
/// Exactly one handle exists per session. Dropping it stops the session and
/// releases the device; leases that outlive it become inert.
pub struct SessionHandle {
    slot: SharedSlot,
}

/// Temporary access to a session owned by a [`SessionHandle`]
#[derive(Clone)]
pub struct SessionLease {
    slot: SharedSlot,
}

impl SessionHandle {
    /// Take ownership of a platform session
    pub fn new(session: Box<dyn CaptureSession>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(SessionSlot {
                session,
                torn_down: false,
            })),
        }
    }

    /// Hand out a lease for a worker job or surface
    pub fn lease(&self) -> SessionLease {
        SessionLease {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Enumerate devices known to the session backend
    pub fn devices(&self) -> Vec<CameraDevice> {
        lock(&self.slot).session.devices()
    }

    /// Whether the session is currently running
    pub fn is_running(&self) -> bool {
        let slot = lock(&self.slot);
        !slot.torn_down && slot.session.is_running()
    }

    fn teardown(&self) {
        let mut slot = lock(&self.slot);
        if slot.torn_down {
            return;
        }
        if slot.session.is_running() {
            slot.session.stop_running();
        }
        slot.torn_down = true;
        info!("Camera session torn down");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = lock(&self.slot);
        f.debug_struct("SessionHandle")
            .field("running", &slot.session.is_running())
            .field("torn_down", &slot.torn_down)
            .finish()
    }
}

impl SessionLease {
    /// Run a closure against the live session
    ///
    /// Returns `BackendError::TornDown` once the owning handle is gone.
    pub fn with_session<R>(
        &self,
        f: impl FnOnce(&mut dyn CaptureSession) -> R,
    ) -> BackendResult<R> {
        let mut slot = lock(&self.slot);
        if slot.torn_down {
            debug!("Ignoring session access after teardown");
            return Err(BackendError::TornDown);
        }
        Ok(f(slot.session.as_mut()))
    }

    /// Start the session
    pub fn start_running(&self) -> BackendResult<()> {
        self.with_session(|session| session.start_running())?
    }

    /// Stop the session; a no-op after teardown
    pub fn stop_running(&self) {
        let _ = self.with_session(|session| session.stop_running());
    }

    /// Whether the session is running
    pub fn is_running(&self) -> bool {
        self.with_session(|session| session.is_running())
            .unwrap_or(false)
    }

    /// Issue a capture request
    pub fn capture_photo(&self, settings: PhotoSettings) -> BackendResult<PendingPhoto> {
        self.with_session(|session| session.capture_photo(settings))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_camera::VirtualCamera;

    #[test]
    fn test_drop_stops_running_session() {
        let camera = VirtualCamera::new();
        let probe = camera.probe();
        let handle = SessionHandle::new(Box::new(camera));
        let lease = handle.lease();

        lease
            .with_session(|session| {
                let device = session
                    .default_device(DeviceType::WideAngleCamera, CameraPosition::Back)
                    .unwrap();
                let input = session.open_input(&device).unwrap();
                assert!(session.add_input(input));
                assert!(session.add_output(PhotoOutput::default()));
            })
            .unwrap();
        lease.start_running().unwrap();
        assert!(handle.is_running());

        drop(handle);
        assert!(!probe.is_running());
        assert_eq!(lease.start_running(), Err(BackendError::TornDown));
        assert!(!lease.is_running());
    }
}
