//! Core kernel for real-time spatial audio: poses, motion history and the
//! lock-free handoff between the control thread and the audio callback.
//!
//! # Primary API
//!
//! - [`Pose`] / [`SharedPose`] / [`PoseHandle`]: position + orientation, published
//!   by the control thread and snapshotted by the audio thread
//! - [`PositionHistory`]: 4-deep motion history used for intra-block interpolation
//! - [`slerp_buffer`] / [`RecursiveSine`]: per-frame orientation interpolation
//! - [`SceneConfig`]: sample rate, block size and speed of sound
//!
//! Geometry is expressed with `nalgebra`; [`Vec3`] and [`Quat`] are the aliases
//! used throughout the workspace.
//!
//! # Coordinate frame
//!
//! Right-handed, +x forward, +y left, +z up. Azimuth is measured in degrees
//! counter-clockwise from the front (90 = left, -90 = right), elevation in
//! degrees up from the horizontal plane.

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::SceneConfig;

pub mod geometry;
pub use geometry::{angle_between, direction_from_degrees, Quat, Vec3};

pub(crate) mod lockfree;
pub use lockfree::{AtomicDouble, AtomicFlag, AtomicFloat};

mod pose;
pub use pose::{Pose, PoseHandle, SharedPose};

mod history;
pub use history::{slerp_buffer, PositionHistory, RecursiveSine, HISTORY_DEPTH};

pub use std::sync::atomic::Ordering;
pub use std::sync::Arc;
