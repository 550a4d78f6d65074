//! The audio scene: listeners, sources and the per-block render.

use crate::listener::{Listener, RenderParts};
use crate::output::OutputBlock;
use crate::source::{DopplerType, ProcessingMode, SoundSource, SoundSourceBuilder};
use crate::spatializer::Spatializer;
use crate::{Error, Result};
use spatia_core::SceneConfig;

/// Handle to a listener created by [`AudioScene::create_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a source registered with [`AudioScene::add_source`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Renders every source for every listener, block by block.
///
/// Per block the caller writes each source's new samples
/// ([`SoundSource::write_buffer`]) and then calls [`AudioScene::render`]. For
/// each enabled listener the render runs its spatializer through
/// `prepare`, one `render_sample`/`render_buffer` pass per audible source, and
/// `finalize`.
///
/// Everything that allocates or compiles takes `&mut self` and belongs on the
/// control thread between blocks; [`AudioScene::render`] itself never
/// allocates, locks or fails.
#[derive(Debug)]
pub struct AudioScene {
    config: SceneConfig,
    listeners: Vec<Listener>,
    sources: Vec<(SourceId, SoundSource)>,
    next_source: u64,
    scratch: Vec<f32>,
}

impl AudioScene {
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            sample_rate = config.sample_rate,
            num_frames = config.num_frames,
            speed_of_sound = config.speed_of_sound,
            "audio scene created"
        );
        Ok(Self {
            scratch: vec![0.0; config.num_frames],
            config,
            listeners: Vec::new(),
            sources: Vec::new(),
            next_source: 0,
        })
    }

    pub fn builder() -> AudioSceneBuilder {
        AudioSceneBuilder::default()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Change the block size, recompiling every listener.
    pub fn set_num_frames(&mut self, num_frames: usize) -> Result<()> {
        let config = SceneConfig {
            num_frames,
            ..self.config.clone()
        };
        config.validate()?;
        if num_frames == self.config.num_frames {
            return Ok(());
        }
        self.config = config;
        self.scratch = vec![0.0; num_frames];
        for listener in &mut self.listeners {
            listener.set_config(&self.config);
            listener.compile()?;
        }
        for (_, source) in &mut self.sources {
            source.prepare_for(&self.config)?;
        }
        tracing::debug!(num_frames, listeners = self.listeners.len(), "scene block size changed");
        Ok(())
    }

    pub fn set_speed_of_sound(&mut self, meters_per_second: f64) -> Result<()> {
        let config = SceneConfig {
            speed_of_sound: meters_per_second,
            ..self.config.clone()
        };
        config.validate()?;
        for listener in &mut self.listeners {
            listener.set_config(&config);
        }
        self.config = config;
        Ok(())
    }

    /// Bind `spatializer` to a new listener at the origin and compile it.
    pub fn create_listener<S>(&mut self, spatializer: S) -> Result<ListenerId>
    where
        S: Spatializer + 'static,
    {
        let mut listener = Listener::new(Box::new(spatializer), self.config.clone());
        listener.compile()?;
        let id = ListenerId(self.listeners.len());
        tracing::info!(
            listener = id.0,
            spatializer = listener.spatializer().name(),
            "listener created"
        );
        self.listeners.push(listener);
        Ok(id)
    }

    pub fn listener(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners.get(id.0)
    }

    pub fn listener_mut(&mut self, id: ListenerId) -> Option<&mut Listener> {
        self.listeners.get_mut(id.0)
    }

    /// Recompile a listener after changing its spatializer.
    pub fn compile_listener(&mut self, id: ListenerId) -> Result<()> {
        self.listeners
            .get_mut(id.0)
            .ok_or(Error::UnknownListener(id.0))?
            .compile()
    }

    pub fn listeners(&self) -> impl Iterator<Item = (ListenerId, &Listener)> {
        self.listeners
            .iter()
            .enumerate()
            .map(|(i, l)| (ListenerId(i), l))
    }

    pub fn num_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Take ownership of `source` and start rendering it. A source built for
    /// another configuration is adapted first, see [`SoundSource::prepare_for`].
    pub fn add_source(&mut self, mut source: SoundSource) -> Result<SourceId> {
        source.prepare_for(&self.config)?;
        let id = SourceId(self.next_source);
        self.next_source += 1;
        tracing::debug!(
            source = id.0,
            capacity = source.capacity(),
            doppler = ?source.doppler(),
            "source added"
        );
        self.sources.push((id, source));
        Ok(id)
    }

    /// Build a source sized for this scene's configuration and add it.
    pub fn create_source(&mut self, builder: SoundSourceBuilder) -> Result<SourceId> {
        let source = builder.build_for(&self.config)?;
        self.add_source(source)
    }

    /// Stop rendering a source and hand it back.
    pub fn remove_source(&mut self, id: SourceId) -> Option<SoundSource> {
        let index = self.sources.iter().position(|(sid, _)| *sid == id)?;
        tracing::debug!(source = id.0, "source removed");
        Some(self.sources.remove(index).1)
    }

    pub fn source(&self, id: SourceId) -> Option<&SoundSource> {
        self.sources
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, s)| s)
    }

    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut SoundSource> {
        self.sources
            .iter_mut()
            .find(|(sid, _)| *sid == id)
            .map(|(_, s)| s)
    }

    pub fn sources_mut(&mut self) -> impl Iterator<Item = (SourceId, &mut SoundSource)> {
        self.sources.iter_mut().map(|(id, s)| (*id, s))
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Write a block of samples to a source.
    pub fn write_source(&mut self, id: SourceId, samples: &[f32]) -> Result<()> {
        self.source_mut(id)
            .ok_or(Error::UnknownSource(id.0))?
            .write_buffer(samples);
        Ok(())
    }

    /// Render one block, accumulating into `out`.
    ///
    /// Renders `min(out.num_frames(), num_frames)` frames, and expects that
    /// many new samples to have been written to every source. `out` is not
    /// cleared. Listeners that are disabled or waiting for a compile are
    /// skipped, as are muted sources and any frame whose propagation delay
    /// runs past its source's delay line.
    pub fn render(&mut self, out: &mut OutputBlock<'_>) {
        let frames = out.num_frames().min(self.config.num_frames);
        if frames == 0 {
            return;
        }

        for (_, source) in &mut self.sources {
            source.update_history();
        }

        let block_seconds = frames as f64 / self.config.sample_rate;
        let scratch = &mut self.scratch[..frames];

        for listener in &mut self.listeners {
            if !listener.is_enabled() || !listener.is_compiled() {
                continue;
            }
            listener.update_history(frames);
            let RenderParts {
                spatializer,
                quat_history,
                pose,
                history,
            } = listener.render_parts();
            spatializer.prepare();

            for (_, source) in self.sources.iter_mut() {
                if source.is_muted() {
                    continue;
                }
                let gain = source.gain();

                let radial_velocity = if source.doppler() == DopplerType::Physical {
                    let now = (source.history().get(0) - history.get(0)).norm();
                    let before = (source.history().get(1) - history.get(1)).norm();
                    (now - before) / block_seconds
                } else {
                    0.0
                };
                let samples_per_meter = source.samples_per_meter(&self.config, radial_velocity);

                match source.processing_mode() {
                    ProcessingMode::PerSample => {
                        for i in 0..frames {
                            let alpha = i as f64 / frames as f64;
                            let relpos = source.history().blend(alpha) - history.blend(alpha);
                            let distance = relpos.norm();
                            let Some(sample) =
                                source.next_sample(distance, samples_per_meter, frames - 1 - i)
                            else {
                                continue;
                            };
                            let direction = quat_history[i].inverse_transform_vector(&relpos);
                            spatializer.render_sample(
                                out,
                                &direction,
                                sample * gain,
                                i,
                                &mut source.cache,
                            );
                        }
                    }
                    ProcessingMode::PerBuffer => {
                        let relpos = source.current().position - pose.position;
                        let distance = relpos.norm();
                        if !source.fill_buffer(distance, samples_per_meter, scratch) {
                            continue;
                        }
                        if gain != 1.0 {
                            for s in scratch.iter_mut() {
                                *s *= gain;
                            }
                        }
                        let direction = pose.orientation.inverse_transform_vector(&relpos);
                        spatializer.render_buffer(out, &direction, scratch, &mut source.cache);
                    }
                }
            }

            spatializer.finalize(out);
        }
    }
}

/// Builder for [`AudioScene`].
#[derive(Debug, Clone, Default)]
pub struct AudioSceneBuilder {
    config: SceneConfig,
}

impl AudioSceneBuilder {
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Frames per block.
    pub fn num_frames(mut self, num_frames: usize) -> Self {
        self.config.num_frames = num_frames;
        self
    }

    /// Meters per second.
    pub fn speed_of_sound(mut self, speed: f64) -> Self {
        self.config.speed_of_sound = speed;
        self
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: SceneConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AudioScene> {
        AudioScene::new(self.config)
    }
}
