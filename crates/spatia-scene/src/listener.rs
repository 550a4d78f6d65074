//! Listeners: a pose bound to one spatializer.

use crate::spatializer::Spatializer;
use crate::Result;
use spatia_core::{slerp_buffer, AtomicFlag, Pose, PoseHandle, PositionHistory, Quat, SceneConfig};
use std::sync::Arc;

/// A point of audition rendered through its own spatializer.
///
/// Owned by the [`AudioScene`](crate::AudioScene) that created it. Orientation
/// changes are slerped across each block, one quaternion per frame, so turning
/// the head does not step the image at block boundaries.
pub struct Listener {
    pose: PoseHandle,
    current: Pose,
    history: PositionHistory,
    primed: bool,
    quat_prev: Quat,
    quat_history: Vec<Quat>,
    spatializer: Box<dyn Spatializer>,
    config: SceneConfig,
    enabled: Arc<AtomicFlag>,
    compiled: bool,
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("spatializer", &self.spatializer.name())
            .field("pose", &self.current)
            .field("sample_rate", &self.config.sample_rate)
            .field("num_frames", &self.quat_history.len())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

impl Listener {
    pub(crate) fn new(spatializer: Box<dyn Spatializer>, config: SceneConfig) -> Self {
        let num_frames = config.num_frames;
        Self {
            pose: PoseHandle::default(),
            current: Pose::default(),
            history: PositionHistory::default(),
            primed: false,
            quat_prev: Quat::identity(),
            quat_history: vec![Quat::identity(); num_frames],
            spatializer,
            config,
            enabled: Arc::new(AtomicFlag::new(true)),
            compiled: false,
        }
    }

    /// Precompute the spatializer for the scene's block size and sample rate.
    /// Needs `&mut`, so it can never overlap a render of the same scene.
    pub fn compile(&mut self) -> Result<()> {
        self.spatializer.compile(&self.config)?;
        self.compiled = true;
        tracing::debug!(
            spatializer = self.spatializer.name(),
            speakers = self.spatializer.layout().len(),
            sample_rate = self.config.sample_rate,
            num_frames = self.config.num_frames,
            "listener compiled"
        );
        Ok(())
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Follow a change of the scene configuration. A new block size or sample
    /// rate needs another [`Listener::compile`] before the next render.
    pub(crate) fn set_config(&mut self, config: &SceneConfig) {
        if config.num_frames != self.config.num_frames || config.sample_rate != self.config.sample_rate {
            self.quat_history.resize(config.num_frames, self.quat_prev);
            self.compiled = false;
        }
        self.config = config.clone();
    }

    pub fn num_frames(&self) -> usize {
        self.quat_history.len()
    }

    pub fn pose(&self) -> &PoseHandle {
        &self.pose
    }

    /// Shared flag; clear it from any thread to stop rendering this listener.
    pub fn enabled(&self) -> Arc<AtomicFlag> {
        self.enabled.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn spatializer(&self) -> &dyn Spatializer {
        self.spatializer.as_ref()
    }

    /// Changes that affect precomputation take effect after [`Listener::compile`].
    pub fn spatializer_mut(&mut self) -> &mut dyn Spatializer {
        self.compiled = false;
        self.spatializer.as_mut()
    }

    /// Per-frame orientations of the last block.
    pub fn quat_history(&self) -> &[Quat] {
        &self.quat_history
    }

    /// Snapshot the pose and slerp from the previous block's orientation to
    /// the new one over the first `num_frames` frames.
    pub fn update_history(&mut self, num_frames: usize) {
        self.current = self.pose.snapshot(&self.current);
        if self.primed {
            self.history.push(self.current.position);
        } else {
            self.history.fill(self.current.position);
            self.quat_prev = self.current.orientation;
            self.primed = true;
        }
        let n = num_frames.min(self.quat_history.len());
        slerp_buffer(&self.quat_prev, &self.current.orientation, &mut self.quat_history[..n]);
        self.quat_prev = self.current.orientation;
    }

    /// Split borrow for the render loop.
    pub(crate) fn render_parts(&mut self) -> RenderParts<'_> {
        RenderParts {
            spatializer: self.spatializer.as_mut(),
            quat_history: &self.quat_history,
            pose: &self.current,
            history: &self.history,
        }
    }
}

pub(crate) struct RenderParts<'a> {
    pub spatializer: &'a mut dyn Spatializer,
    pub quat_history: &'a [Quat],
    pub pose: &'a Pose,
    pub history: &'a PositionHistory,
}
