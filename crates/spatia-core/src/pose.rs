//! Position + orientation, and the lock-free handoff used to move sources and
//! listeners from the control thread while the audio thread renders.

use crate::geometry::{Quat, Vec3};
use crate::lockfree::AtomicDouble;
use nalgebra::Quaternion;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;

/// Read attempts made by the audio thread before it keeps its previous snapshot.
const MAX_READ_ATTEMPTS: usize = 4;

/// Position and orientation in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at `(x, y, z)` with identity orientation.
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Express a world-space point in this pose's local frame.
    #[inline]
    pub fn to_local(&self, world: &Vec3) -> Vec3 {
        self.orientation.inverse_transform_vector(&(world - self.position))
    }
}

/// Sequence-locked pose shared between the control thread and the audio thread.
///
/// Writers serialize among themselves through the sequence counter (odd while a
/// write is in flight). The audio thread reads with [`SharedPose::snapshot`],
/// which retries a bounded number of times and otherwise keeps the snapshot it
/// already had, so a read never blocks. A contended read therefore observes a
/// pose at most one block old, never a torn one.
#[derive(Debug)]
#[repr(align(64))]
pub struct SharedPose {
    seq: AtomicU64,
    px: AtomicDouble,
    py: AtomicDouble,
    pz: AtomicDouble,
    qw: AtomicDouble,
    qx: AtomicDouble,
    qy: AtomicDouble,
    qz: AtomicDouble,
}

impl SharedPose {
    pub fn new(pose: Pose) -> Self {
        let Pose {
            position: p,
            orientation: q,
        } = pose;
        Self {
            seq: AtomicU64::new(0),
            px: AtomicDouble::new(p.x),
            py: AtomicDouble::new(p.y),
            pz: AtomicDouble::new(p.z),
            qw: AtomicDouble::new(q.w),
            qx: AtomicDouble::new(q.i),
            qy: AtomicDouble::new(q.j),
            qz: AtomicDouble::new(q.k),
        }
    }

    fn begin_write(&self) -> u64 {
        loop {
            let seq = self.seq.load(Ordering::Relaxed);
            if seq & 1 == 0
                && self
                    .seq
                    .compare_exchange_weak(seq, seq + 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                fence(Ordering::Release);
                return seq;
            }
            std::hint::spin_loop();
        }
    }

    #[inline]
    fn end_write(&self, seq: u64) {
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    #[inline]
    fn write_position(&self, p: &Vec3) {
        self.px.set(p.x);
        self.py.set(p.y);
        self.pz.set(p.z);
    }

    #[inline]
    fn write_orientation(&self, q: &Quat) {
        self.qw.set(q.w);
        self.qx.set(q.i);
        self.qy.set(q.j);
        self.qz.set(q.k);
    }

    pub fn store(&self, pose: &Pose) {
        let seq = self.begin_write();
        self.write_position(&pose.position);
        self.write_orientation(&pose.orientation);
        self.end_write(seq);
    }

    pub fn store_position(&self, position: &Vec3) {
        let seq = self.begin_write();
        self.write_position(position);
        self.end_write(seq);
    }

    pub fn store_orientation(&self, orientation: &Quat) {
        let seq = self.begin_write();
        self.write_orientation(orientation);
        self.end_write(seq);
    }

    fn try_read(&self) -> Option<Pose> {
        let before = self.seq.load(Ordering::Acquire);
        if before & 1 == 1 {
            return None;
        }
        let position = Vec3::new(self.px.get(), self.py.get(), self.pz.get());
        let q = Quaternion::new(self.qw.get(), self.qx.get(), self.qy.get(), self.qz.get());
        fence(Ordering::Acquire);
        if self.seq.load(Ordering::Relaxed) != before {
            return None;
        }
        Some(Pose::new(position, Quat::new_unchecked(q)))
    }

    /// Real-time read. Returns `previous` unchanged if a writer kept the pose
    /// busy for every attempt.
    #[inline]
    pub fn snapshot(&self, previous: &Pose) -> Pose {
        for _ in 0..MAX_READ_ATTEMPTS {
            if let Some(pose) = self.try_read() {
                return pose;
            }
            std::hint::spin_loop();
        }
        *previous
    }

    /// Blocking read for control-thread code.
    pub fn load(&self) -> Pose {
        loop {
            if let Some(pose) = self.try_read() {
                return pose;
            }
            std::hint::spin_loop();
        }
    }
}

/// Cloneable control-thread handle to a source's or listener's pose.
#[derive(Debug, Clone)]
pub struct PoseHandle {
    shared: Arc<SharedPose>,
}

impl PoseHandle {
    pub fn new(pose: Pose) -> Self {
        Self {
            shared: Arc::new(SharedPose::new(pose)),
        }
    }

    pub fn set(&self, pose: Pose) {
        self.shared.store(&pose);
    }

    pub fn set_position(&self, x: f64, y: f64, z: f64) {
        self.shared.store_position(&Vec3::new(x, y, z));
    }

    pub fn set_position_vec(&self, position: Vec3) {
        self.shared.store_position(&position);
    }

    pub fn set_orientation(&self, orientation: Quat) {
        self.shared.store_orientation(&orientation);
    }

    /// Current pose (control thread).
    pub fn get(&self) -> Pose {
        self.shared.load()
    }

    /// Real-time snapshot, see [`SharedPose::snapshot`].
    #[inline]
    pub fn snapshot(&self, previous: &Pose) -> Pose {
        self.shared.snapshot(previous)
    }
}

impl Default for SharedPose {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

impl Default for PoseHandle {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}
