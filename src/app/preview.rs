// SPDX-License-Identifier: GPL-3.0-only

//! Live preview surface
//!
//! Binds to the camera session, starts and stops it on behalf of the
//! controller, and keeps the rendering frame laid out for the host bounds.

use crate::backends::camera::{BackendError, BackendResult, CaptureSurface, SessionLease};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Axis-aligned rectangle in host view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether `other` lies fully inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }
}

/// How frames are scaled into the preview bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoGravity {
    /// Stretch to the bounds, ignoring aspect ratio
    Resize,
    /// Letterbox: whole frame visible
    AspectFit,
    /// Crop: bounds fully covered
    #[default]
    AspectFill,
}

/// Compute the frame the video layer occupies for given bounds
///
/// The result is centered on the bounds. With `AspectFill` it may extend past
/// them (the host clips); with `AspectFit` it always fits inside.
pub fn layout_frame(gravity: VideoGravity, bounds: Rect, source: (u32, u32)) -> Rect {
    let (source_width, source_height) = (source.0 as f32, source.1 as f32);
    if bounds.is_empty() || source_width <= 0.0 || source_height <= 0.0 {
        return bounds;
    }

    let scale_x = bounds.width / source_width;
    let scale_y = bounds.height / source_height;
    let scale = match gravity {
        VideoGravity::Resize => return bounds,
        VideoGravity::AspectFit => scale_x.min(scale_y),
        VideoGravity::AspectFill => scale_x.max(scale_y),
    };

    let width = source_width * scale;
    let height = source_height * scale;
    Rect {
        x: bounds.x + (bounds.width - width) / 2.0,
        y: bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    }
}

struct SurfaceState {
    lease: Option<SessionLease>,
    /// Native frame size of the bound session, once known
    source: Option<(u32, u32)>,
    bounds: Rect,
    frame: Rect,
}

/// Default capture surface
pub struct PreviewSurface {
    gravity: VideoGravity,
    state: Mutex<SurfaceState>,
}

impl PreviewSurface {
    pub fn new(gravity: VideoGravity, bounds: Rect) -> Self {
        Self {
            gravity,
            state: Mutex::new(SurfaceState {
                lease: None,
                source: None,
                bounds,
                frame: bounds,
            }),
        }
    }

    pub fn gravity(&self) -> VideoGravity {
        self.gravity
    }

    /// Current host bounds
    pub fn bounds(&self) -> Rect {
        self.lock().bounds
    }

    /// Current video layer frame
    pub fn frame(&self) -> Rect {
        self.lock().frame
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Only reads surface state; never takes the session lock
    fn relayout(&self, state: &mut SurfaceState) {
        let source = state.source.unwrap_or((0, 0));
        state.frame = layout_frame(self.gravity, state.bounds, source);
        debug!(bounds = ?state.bounds, frame = ?state.frame, "Preview laid out");
    }

    fn lease(&self) -> Option<SessionLease> {
        self.lock().lease.clone()
    }
}

impl CaptureSurface for PreviewSurface {
    fn bind(&self, lease: SessionLease) {
        let mut state = self.lock();
        state.lease = Some(lease);
        self.relayout(&mut state);
        info!(gravity = ?self.gravity, "Preview bound to session");
    }

    fn is_bound(&self) -> bool {
        self.lock().lease.is_some()
    }

    fn start_running(&self) -> BackendResult<()> {
        // Never hold the surface lock across a blocking session call
        let lease = self.lease().ok_or(BackendError::NotConfigured)?;
        lease.start_running()
    }

    fn stop_running(&self) {
        if let Some(lease) = self.lease() {
            lease.stop_running();
        }
    }

    fn set_source_size(&self, size: (u32, u32)) {
        let mut state = self.lock();
        if state.source == Some(size) {
            return;
        }
        state.source = Some(size);
        self.relayout(&mut state);
    }

    fn set_bounds(&self, bounds: Rect) {
        let mut state = self.lock();
        if state.bounds == bounds {
            return;
        }
        state.bounds = bounds;
        self.relayout(&mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_fill_covers_bounds() {
        let bounds = Rect::sized(390.0, 844.0);
        let frame = layout_frame(VideoGravity::AspectFill, bounds, (640, 480));
        assert!(frame.width > bounds.width);
        assert!((frame.height - 844.0).abs() < 0.01);
        assert!(frame.x < 0.0);
        // Centered horizontally
        assert!((frame.x + frame.width / 2.0 - 195.0).abs() < 0.01);
    }

    #[test]
    fn test_aspect_fit_stays_inside() {
        let bounds = Rect::new(10.0, 20.0, 390.0, 844.0);
        let frame = layout_frame(VideoGravity::AspectFit, bounds, (640, 480));
        assert!(bounds.contains(&frame));
        assert_eq!(frame.width, 390.0);
    }

    #[test]
    fn test_resize_and_degenerate_inputs_return_bounds() {
        let bounds = Rect::sized(100.0, 50.0);
        assert_eq!(layout_frame(VideoGravity::Resize, bounds, (640, 480)), bounds);
        assert_eq!(layout_frame(VideoGravity::AspectFill, bounds, (0, 480)), bounds);
        let empty = Rect::sized(0.0, 50.0);
        assert_eq!(layout_frame(VideoGravity::AspectFill, empty, (640, 480)), empty);
    }

    #[test]
    fn test_unbound_surface_cannot_start() {
        let surface = PreviewSurface::new(VideoGravity::AspectFill, Rect::sized(100.0, 100.0));
        assert!(!surface.is_bound());
        assert_eq!(surface.start_running(), Err(BackendError::NotConfigured));
    }

    #[test]
    fn test_set_bounds_relayouts() {
        let surface = PreviewSurface::new(VideoGravity::AspectFill, Rect::sized(100.0, 100.0));
        surface.set_bounds(Rect::sized(200.0, 100.0));
        assert_eq!(surface.bounds(), Rect::sized(200.0, 100.0));
        // No source size yet, so the frame tracks the bounds
        assert_eq!(surface.frame(), Rect::sized(200.0, 100.0));
    }

    #[test]
    fn test_source_size_relayouts() {
        let surface = PreviewSurface::new(VideoGravity::AspectFit, Rect::sized(400.0, 400.0));
        surface.set_source_size((640, 480));
        assert_eq!(surface.frame(), Rect::new(0.0, 50.0, 400.0, 300.0));

        surface.set_bounds(Rect::sized(800.0, 400.0));
        assert!((surface.frame().height - 400.0).abs() < 0.01);
        assert!((surface.frame().width - 533.333).abs() < 0.01);
    }
}
