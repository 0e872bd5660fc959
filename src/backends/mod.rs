// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera access
//!
//! # Modules
//!
//! - [`camera`]: Platform traits, shared types and the owned session handle
//! - [`virtual_camera`]: In-process backend rendering a test pattern

pub mod camera;
pub mod virtual_camera;
