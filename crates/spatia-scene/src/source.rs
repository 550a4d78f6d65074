//! Sound sources: a pose, a propagation delay line and a distance policy.

use crate::spatializer::SpatialCache;
use crate::{Error, Result};
use spatia_core::{
    AtomicFlag, AtomicFloat, Pose, PoseHandle, PositionHistory, Quat, SceneConfig, Vec3,
};
use spatia_dsp::{AttenuationLaw, BiquadCascade, BiquadKind, DelayLine, DistanceAttenuation};
use std::sync::Arc;

/// Fastest radial speed, as a fraction of the speed of sound, used for
/// physical Doppler.
const MAX_MACH: f64 = 0.9;

/// How propagation delay follows distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DopplerType {
    /// No propagation delay; distance still attenuates.
    None,
    /// Delay proportional to distance. Approaching and receding at the same
    /// speed shift pitch by the same ratio.
    #[default]
    Symmetric,
    /// Delay scaled by the radial velocity of the source through the medium,
    /// so the shift follows `c / (c + v)`.
    Physical,
}

/// How often the source's direction and distance are re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Once per frame from interpolated motion history. Smooth Doppler, costlier.
    PerSample,
    /// Once per block. Cheap, but fast movers can warble at block edges.
    #[default]
    PerBuffer,
}

/// Stages, center frequency, bandwidth in octaves and gain in dB.
type PresenceDesign = (usize, f32, f32, f32);

fn design_presence((stages, freq, bandwidth, gain_db): PresenceDesign, sample_rate: f64) -> BiquadCascade {
    let mut filter = BiquadCascade::new(stages, BiquadKind::Peak, sample_rate as f32);
    filter.set(freq, bandwidth, gain_db);
    filter
}

/// Live parameters the control thread changes while the scene owns the source.
#[derive(Debug)]
struct SourceParams {
    gain: AtomicFloat,
    muted: AtomicFlag,
}

/// Control-thread handle to a source owned by an [`AudioScene`](crate::AudioScene).
#[derive(Debug, Clone)]
pub struct SourceHandle {
    pose: PoseHandle,
    params: Arc<SourceParams>,
}

impl SourceHandle {
    pub fn pose(&self) -> &PoseHandle {
        &self.pose
    }

    pub fn set_position(&self, x: f64, y: f64, z: f64) {
        self.pose.set_position(x, y, z);
    }

    pub fn gain(&self) -> f32 {
        self.params.gain.get()
    }

    pub fn set_gain(&self, gain: f32) {
        self.params.gain.set(gain);
    }

    pub fn is_muted(&self) -> bool {
        self.params.muted.get()
    }

    pub fn set_muted(&self, muted: bool) {
        self.params.muted.set(muted);
    }
}

/// A mono signal placed in the scene.
///
/// The audio thread writes the source's samples for a block (after the
/// presence filter, if any) into its delay line before calling
/// [`AudioScene::render`](crate::AudioScene::render), which then reads them
/// back at a delay given by the distance to each listener.
#[derive(Debug)]
pub struct SoundSource {
    pose: PoseHandle,
    params: Arc<SourceParams>,
    current: Pose,
    history: PositionHistory,
    primed: bool,
    delay: DelayLine,
    /// Delay line follows the far clip rather than an explicit capacity.
    auto_capacity: bool,
    sample_rate: f64,
    attenuation: DistanceAttenuation,
    use_attenuation: bool,
    doppler: DopplerType,
    mode: ProcessingMode,
    presence: Option<(BiquadCascade, PresenceDesign)>,
    pub(crate) cache: SpatialCache,
}

impl SoundSource {
    pub fn builder() -> SoundSourceBuilder {
        SoundSourceBuilder::default()
    }

    /// Delay-line size that covers `distance` meters plus one block.
    pub fn buffer_size(config: &SceneConfig, distance: f64) -> usize {
        config.delay_capacity_for(distance) + config.num_frames + DelayLine::MIN_CAPACITY
    }

    pub fn handle(&self) -> SourceHandle {
        SourceHandle {
            pose: self.pose.clone(),
            params: self.params.clone(),
        }
    }

    pub fn pose(&self) -> &PoseHandle {
        &self.pose
    }

    pub fn gain(&self) -> f32 {
        self.params.gain.get()
    }

    pub fn set_gain(&self, gain: f32) {
        self.params.gain.set(gain);
    }

    pub fn is_muted(&self) -> bool {
        self.params.muted.get()
    }

    pub fn set_muted(&self, muted: bool) {
        self.params.muted.set(muted);
    }

    pub fn doppler(&self) -> DopplerType {
        self.doppler
    }

    pub fn set_doppler(&mut self, doppler: DopplerType) {
        self.doppler = doppler;
    }

    pub fn processing_mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Switching mode mid-stream can click once; the caller decides when.
    pub fn set_processing_mode(&mut self, mode: ProcessingMode) {
        self.mode = mode;
    }

    pub fn distance_attenuation(&self) -> &DistanceAttenuation {
        &self.attenuation
    }

    pub fn set_distance_attenuation(&mut self, attenuation: DistanceAttenuation) {
        self.attenuation = attenuation;
    }

    pub fn use_attenuation(&self) -> bool {
        self.use_attenuation
    }

    pub fn set_use_attenuation(&mut self, enabled: bool) {
        self.use_attenuation = enabled;
    }

    pub fn presence_filter_mut(&mut self) -> Option<&mut BiquadCascade> {
        self.presence.as_mut().map(|(filter, _)| filter)
    }

    /// Sample rate the delay line and presence filter are designed for.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Adapt the source to `config` before it joins a scene.
    ///
    /// On a new sample rate the presence filter is designed again. A delay line
    /// sized from the far clip is reallocated to cover it at the new rate and
    /// block size, dropping its contents; an explicit
    /// [`SoundSourceBuilder::delay_capacity`] is kept. Control thread only.
    pub fn prepare_for(&mut self, config: &SceneConfig) -> Result<()> {
        if config.sample_rate != self.sample_rate {
            if let Some((filter, design)) = &mut self.presence {
                *filter = design_presence(*design, config.sample_rate);
            }
            self.sample_rate = config.sample_rate;
        }
        if self.auto_capacity {
            let capacity = Self::buffer_size(config, self.attenuation.far());
            if capacity != self.delay.capacity() {
                self.delay = DelayLine::new(capacity)?;
                tracing::debug!(capacity, sample_rate = config.sample_rate, "source delay line resized");
            }
        }
        Ok(())
    }

    /// Largest delay, in samples, the source can still be read at.
    pub fn max_delay(&self) -> f64 {
        self.delay.max_delay()
    }

    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }

    /// Feed the next sample of the source signal.
    #[inline]
    pub fn write_sample(&mut self, sample: f32) {
        let sample = match &mut self.presence {
            Some((filter, _)) => filter.process(sample),
            None => sample,
        };
        self.delay.write(sample);
    }

    /// Feed a block of the source signal.
    pub fn write_buffer(&mut self, samples: &[f32]) {
        for &s in samples {
            self.write_sample(s);
        }
    }

    /// Sample written `delay` samples ago, interpolated.
    #[inline]
    pub fn read_sample(&self, delay: f64) -> f32 {
        self.delay.read_by_delay(delay)
    }

    /// Gain for a listener `distance` meters away, or 1 with attenuation off.
    #[inline]
    pub fn attenuation(&self, distance: f64) -> f64 {
        if self.use_attenuation {
            self.attenuation.gain(distance)
        } else {
            1.0
        }
    }

    /// Samples of delay per meter for this source's Doppler mode.
    ///
    /// `radial_velocity` is the rate at which the listener distance grows,
    /// in meters per second, and only matters for [`DopplerType::Physical`].
    #[inline]
    pub fn samples_per_meter(&self, config: &SceneConfig, radial_velocity: f64) -> f64 {
        match self.doppler {
            DopplerType::None => 0.0,
            DopplerType::Symmetric => config.samples_per_meter(),
            DopplerType::Physical => {
                let c = config.speed_of_sound;
                let limit = c * MAX_MACH;
                config.sample_rate / (c + radial_velocity.clamp(-limit, limit))
            }
        }
    }

    /// The attenuated sample heard `distance` meters away, `frames_ago` frames
    /// before the end of the block, or `None` when the delay runs past the
    /// delay line.
    #[inline]
    pub fn next_sample(&self, distance: f64, samples_per_meter: f64, frames_ago: usize) -> Option<f32> {
        let index = distance * samples_per_meter + frames_ago as f64;
        if index > self.delay.max_delay() {
            return None;
        }
        Some(self.read_sample(index) * self.attenuation(distance) as f32)
    }

    /// Fill `out` with the block heard `distance` meters away. Frames beyond
    /// the delay line's reach are silent. Returns `false` if every frame was.
    pub fn fill_buffer(&self, distance: f64, samples_per_meter: f64, out: &mut [f32]) -> bool {
        let n = out.len();
        let gain = self.attenuation(distance) as f32;
        let base = distance * samples_per_meter;
        let max = self.delay.max_delay();
        let mut audible = false;
        for (i, slot) in out.iter_mut().enumerate() {
            let index = base + (n - 1 - i) as f64;
            *slot = if index > max {
                0.0
            } else {
                audible = true;
                self.read_sample(index) * gain
            };
        }
        audible
    }

    /// Take this block's pose snapshot and shift it into the motion history.
    pub(crate) fn update_history(&mut self) {
        self.current = self.pose.snapshot(&self.current);
        if self.primed {
            self.history.push(self.current.position);
        } else {
            self.history.fill(self.current.position);
            self.primed = true;
        }
    }

    pub(crate) fn current(&self) -> &Pose {
        &self.current
    }

    pub(crate) fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.delay.clear();
        if let Some((filter, _)) = &mut self.presence {
            filter.reset();
        }
        self.primed = false;
    }
}

/// Builder for [`SoundSource`].
#[derive(Debug, Clone, Default)]
pub struct SoundSourceBuilder {
    position: Option<Vec3>,
    near_clip: Option<f64>,
    far_clip: Option<f64>,
    law: AttenuationLaw,
    far_bias: f64,
    use_attenuation: Option<bool>,
    doppler: DopplerType,
    mode: ProcessingMode,
    capacity: Option<usize>,
    presence: Option<PresenceDesign>,
    gain: Option<f32>,
}

impl SoundSourceBuilder {
    /// Initial position.
    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some(Vec3::new(x, y, z));
        self
    }

    /// Distance within which the source plays at full level.
    pub fn near_clip(mut self, meters: f64) -> Self {
        self.near_clip = Some(meters);
        self
    }

    /// Distance beyond which the level stops falling.
    pub fn far_clip(mut self, meters: f64) -> Self {
        self.far_clip = Some(meters);
        self
    }

    pub fn attenuation_law(mut self, law: AttenuationLaw) -> Self {
        self.law = law;
        self
    }

    /// Level reached at the far clip by [`AttenuationLaw::Linear`].
    pub fn far_bias(mut self, bias: f64) -> Self {
        self.far_bias = bias;
        self
    }

    pub fn use_attenuation(mut self, enabled: bool) -> Self {
        self.use_attenuation = Some(enabled);
        self
    }

    pub fn doppler(mut self, doppler: DopplerType) -> Self {
        self.doppler = doppler;
        self
    }

    pub fn processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Delay-line capacity in samples, kept whatever scene the source joins.
    /// Defaults to enough for the far clip at the scene's sample rate, see
    /// [`SoundSourceBuilder::build_for`].
    pub fn delay_capacity(mut self, samples: usize) -> Self {
        self.capacity = Some(samples);
        self
    }

    /// Filter every written sample through `stages` peaking sections.
    pub fn presence_filter(mut self, stages: usize, freq: f32, bandwidth: f32, gain_db: f32) -> Self {
        self.presence = Some((stages, freq, bandwidth, gain_db));
        self
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = Some(gain);
        self
    }

    /// Build with a delay line sized for `config`.
    pub fn build_for(self, config: &SceneConfig) -> Result<SoundSource> {
        let far = self.far_clip.unwrap_or_else(|| DistanceAttenuation::default().far());
        let capacity = self
            .capacity
            .unwrap_or_else(|| SoundSource::buffer_size(config, far));
        self.finish(capacity, config.sample_rate)
    }

    /// Build with the default [`SceneConfig`]. [`AudioScene::add_source`]
    /// adapts the result to the scene it joins.
    ///
    /// [`AudioScene::add_source`]: crate::AudioScene::add_source
    pub fn build(self) -> Result<SoundSource> {
        self.build_for(&SceneConfig::default())
    }

    fn finish(self, capacity: usize, sample_rate: f64) -> Result<SoundSource> {
        let defaults = DistanceAttenuation::default();
        let attenuation = DistanceAttenuation::new(
            self.near_clip.unwrap_or(defaults.near()),
            self.far_clip.unwrap_or(defaults.far()),
            self.law,
            self.far_bias,
        )?;

        let presence = match self.presence {
            Some((0, ..)) => {
                return Err(Error::InvalidParameter(
                    "presence filter needs at least one stage".into(),
                ))
            }
            Some(design) => Some((design_presence(design, sample_rate), design)),
            None => None,
        };

        let position = self.position.unwrap_or_else(Vec3::zeros);
        Ok(SoundSource {
            pose: PoseHandle::new(Pose::new(position, Quat::identity())),
            params: Arc::new(SourceParams {
                gain: AtomicFloat::new(self.gain.unwrap_or(1.0)),
                muted: AtomicFlag::new(false),
            }),
            current: Pose::new(position, Quat::identity()),
            history: PositionHistory::filled(position),
            primed: false,
            delay: DelayLine::new(capacity)?,
            auto_capacity: self.capacity.is_none(),
            sample_rate,
            attenuation,
            use_attenuation: self.use_attenuation.unwrap_or(true),
            doppler: self.doppler,
            mode: self.mode,
            presence,
            cache: SpatialCache::default(),
        })
    }
}
