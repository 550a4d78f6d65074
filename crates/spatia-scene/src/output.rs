//! Non-interleaved output block.

/// Channel-major view over a block of output samples.
///
/// Channel `c` occupies `data[c * num_frames..(c + 1) * num_frames]`. Writes to
/// channels or frames outside the block are dropped, so a spatializer can never
/// panic on a layout that addresses more channels than the device provides.
#[derive(Debug)]
pub struct OutputBlock<'a> {
    data: &'a mut [f32],
    num_frames: usize,
    num_channels: usize,
}

impl<'a> OutputBlock<'a> {
    /// Wrap `data`; trailing samples that do not fill a whole channel are ignored.
    pub fn new(data: &'a mut [f32], num_frames: usize) -> Self {
        let num_channels = if num_frames == 0 {
            0
        } else {
            data.len() / num_frames
        };
        Self {
            data,
            num_frames,
            num_channels,
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Accumulate `value` into `(channel, frame)`.
    #[inline]
    pub fn add(&mut self, channel: usize, frame: usize, value: f32) {
        if channel < self.num_channels && frame < self.num_frames {
            self.data[channel * self.num_frames + frame] += value;
        }
    }

    #[inline]
    pub fn get(&self, channel: usize, frame: usize) -> f32 {
        if channel < self.num_channels && frame < self.num_frames {
            self.data[channel * self.num_frames + frame]
        } else {
            0.0
        }
    }

    /// Samples of one channel, empty if the channel does not exist.
    pub fn channel(&self, channel: usize) -> &[f32] {
        if channel < self.num_channels {
            &self.data[channel * self.num_frames..(channel + 1) * self.num_frames]
        } else {
            &[]
        }
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        if channel < self.num_channels {
            &mut self.data[channel * self.num_frames..(channel + 1) * self.num_frames]
        } else {
            &mut []
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_channel_major() {
        let mut data = vec![0.0; 8];
        let mut block = OutputBlock::new(&mut data, 4);
        assert_eq!(block.num_channels(), 2);
        block.add(1, 2, 0.5);
        block.add(1, 2, 0.25);
        assert_eq!(block.channel(1), &[0.0, 0.0, 0.75, 0.0]);
        assert_eq!(data[6], 0.75);
    }

    #[test]
    fn test_out_of_range_writes_dropped() {
        let mut data = vec![0.0; 4];
        let mut block = OutputBlock::new(&mut data, 4);
        block.add(3, 0, 1.0);
        block.add(0, 9, 1.0);
        assert_eq!(block.get(3, 0), 0.0);
        assert!(block.channel(3).is_empty());
        assert!(data.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_zero_frames() {
        let mut data = vec![1.0; 4];
        let block = OutputBlock::new(&mut data, 0);
        assert_eq!(block.num_channels(), 0);
    }
}
