//! Vector-base amplitude panning.

mod search;
mod triple;

pub use triple::SpeakerTriple;

use super::{Dimensions, SpatialCache, Spatializer};
use crate::output::OutputBlock;
use crate::speaker::SpeakerLayout;
use crate::{Error, Result};
use spatia_core::{SceneConfig, Vec3};
use std::sync::Arc;

/// Gains this far below zero still count as inside a triangle (edge rounding).
const GAIN_TOLERANCE: f64 = -1e-9;

#[derive(Debug, Clone)]
enum Route {
    Direct(usize),
    /// Logical speaker redistributed over several device channels.
    Phantom(Vec<usize>),
}

/// Pans each source between the two (horizontal) or three (periphonic)
/// speakers surrounding its direction.
///
/// Speaker sets are searched at construction; a layout that yields none is
/// rejected there, since nothing could be rendered. At render time sets are
/// scanned from the source's last match onward, so a slowly moving source
/// usually hits on the first try.
#[derive(Debug)]
pub struct Vbap {
    layout: Arc<SpeakerLayout>,
    dims: Dimensions,
    triples: Vec<SpeakerTriple>,
    routes: Vec<Route>,
    speaker_gains: Vec<f32>,
    stale: bool,
}

impl Vbap {
    pub fn new(layout: Arc<SpeakerLayout>, dims: Dimensions) -> Result<Self> {
        let routes = layout
            .iter()
            .map(|s| Route::Direct(s.device_channel))
            .collect();
        let speaker_gains = layout.iter().map(|s| s.gain).collect();
        let mut vbap = Self {
            layout,
            dims,
            triples: Vec::new(),
            routes,
            speaker_gains,
            stale: true,
        };
        vbap.search()?;
        Ok(vbap)
    }

    fn search(&mut self) -> Result<()> {
        let (triples, kind) = match self.dims {
            Dimensions::Two => (search::find_pairs(&self.layout), "pairs"),
            Dimensions::Three => (search::find_triplets(&self.layout), "triplets"),
        };
        if triples.is_empty() {
            tracing::warn!(
                speakers = self.layout.len(),
                kind,
                "no vbap speaker sets found, check dimensions or layout"
            );
            return Err(Error::NoSpeakerSets {
                kind,
                speakers: self.layout.len(),
            });
        }
        tracing::info!(sets = triples.len(), kind, "vbap compiled");
        self.triples = triples;
        self.stale = false;
        Ok(())
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Switch between pair and triangle panning. Takes effect on the next
    /// [`Spatializer::compile`], which repeats the search and discards manual sets.
    pub fn set_dimensions(&mut self, dims: Dimensions) {
        if dims != self.dims {
            self.dims = dims;
            self.stale = true;
        }
    }

    pub fn triples(&self) -> &[SpeakerTriple] {
        &self.triples
    }

    /// Add a speaker set by hand: two indices for a pair, three for a triangle.
    pub fn add_triple(&mut self, speakers: &[usize]) -> Result<()> {
        let directions: Vec<Vec3> = self.layout.iter().map(|s| s.direction()).collect();
        let triple = match *speakers {
            [a, b] => SpeakerTriple::pair(&directions, a, b),
            [a, b, c] => SpeakerTriple::triangle(&directions, a, b, c),
            _ => None,
        }
        .ok_or_else(|| {
            Error::InvalidParameter(format!("speakers {:?} do not form a usable set", speakers))
        })?;
        self.triples.push(triple);
        Ok(())
    }

    /// Redirect the speaker on `device_channel` to `outputs`, splitting its
    /// power equally between them.
    pub fn make_phantom_channel(&mut self, device_channel: usize, outputs: Vec<usize>) -> Result<()> {
        if outputs.is_empty() {
            return Err(Error::InvalidParameter(
                "phantom channel needs at least one output".into(),
            ));
        }
        let speaker = self
            .layout
            .iter()
            .position(|s| s.device_channel == device_channel)
            .ok_or_else(|| {
                Error::InvalidParameter(format!("no speaker on device channel {}", device_channel))
            })?;
        tracing::debug!(device_channel, ?outputs, "vbap phantom channel");
        self.routes[speaker] = Route::Phantom(outputs);
        Ok(())
    }

    /// Find the speaker set containing `direction` and its normalized gains.
    ///
    /// Returns `None` for a direction no set covers (a gap in the layout) or a
    /// direction with no usable component (zero vector, or straight up/down
    /// when panning in two dimensions).
    pub fn find_gains(&self, direction: &Vec3, cache: &mut SpatialCache) -> Option<(usize, Vec3)> {
        let n = self.triples.len();
        if n == 0 {
            return None;
        }
        let start = cache.last_set % n;
        for offset in 0..n {
            let idx = (start + offset) % n;
            let triple = &self.triples[idx];
            let g = triple.gains(direction);
            let inside = g[0] >= GAIN_TOLERANCE
                && g[1] >= GAIN_TOLERANCE
                && (triple.is_pair() || g[2] >= GAIN_TOLERANCE);
            if inside {
                let g = g.map(|x| x.max(0.0));
                let norm = g.norm();
                if norm < 1e-12 {
                    return None;
                }
                cache.last_set = idx;
                return Some((idx, g / norm));
            }
        }
        None
    }

    fn is_centered(&self, direction: &Vec3) -> bool {
        match self.dims {
            Dimensions::Two => direction.x.hypot(direction.y) < 1e-9,
            Dimensions::Three => direction.norm() < 1e-9,
        }
    }

    #[inline]
    fn emit(&self, out: &mut OutputBlock<'_>, speaker: usize, gain: f32, frame: usize, sample: f32) {
        let gain = gain * self.speaker_gains[speaker];
        match &self.routes[speaker] {
            Route::Direct(ch) => out.add(*ch, frame, sample * gain),
            Route::Phantom(outputs) => {
                let split = gain / (outputs.len() as f32).sqrt();
                for &ch in outputs {
                    out.add(ch, frame, sample * split);
                }
            }
        }
    }

    /// Source on top of the listener: equal power to every speaker.
    fn emit_centered(&self, out: &mut OutputBlock<'_>, frame: usize, sample: f32) {
        let gain = 1.0 / (self.layout.len() as f32).sqrt();
        for speaker in 0..self.layout.len() {
            self.emit(out, speaker, gain, frame, sample);
        }
    }

    /// Dump the speaker sets at debug level.
    pub fn log_triples(&self) {
        tracing::debug!(count = self.triples.len(), "vbap speaker sets");
        for (i, t) in self.triples.iter().enumerate() {
            let channels: Vec<usize> = t
                .speakers()
                .iter()
                .map(|&s| self.layout.speakers()[s].device_channel)
                .collect();
            tracing::debug!(set = i, ?channels, "vbap set");
        }
    }
}

impl Spatializer for Vbap {
    fn name(&self) -> &'static str {
        "vbap"
    }

    fn layout(&self) -> &SpeakerLayout {
        &self.layout
    }

    fn compile(&mut self, _config: &SceneConfig) -> Result<()> {
        if self.stale || self.triples.is_empty() {
            self.search()?;
        }
        Ok(())
    }

    fn render_sample(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        sample: f32,
        frame: usize,
        cache: &mut SpatialCache,
    ) {
        if self.is_centered(direction) {
            self.emit_centered(out, frame, sample);
            return;
        }
        if let Some((idx, gains)) = self.find_gains(direction, cache) {
            let triple = &self.triples[idx];
            for (k, &speaker) in triple.speakers().iter().enumerate() {
                self.emit(out, speaker, gains[k] as f32, frame, sample);
            }
        }
    }

    fn render_buffer(
        &mut self,
        out: &mut OutputBlock<'_>,
        direction: &Vec3,
        samples: &[f32],
        cache: &mut SpatialCache,
    ) {
        if self.is_centered(direction) {
            for (frame, &sample) in samples.iter().enumerate() {
                self.emit_centered(out, frame, sample);
            }
            return;
        }
        let Some((idx, gains)) = self.find_gains(direction, cache) else {
            return;
        };
        let triple = &self.triples[idx];
        for (k, &speaker) in triple.speakers().iter().enumerate() {
            let gain = gains[k] as f32;
            if gain == 0.0 {
                continue;
            }
            for (frame, &sample) in samples.iter().enumerate() {
                self.emit(out, speaker, gain, frame, sample);
            }
        }
    }
}
