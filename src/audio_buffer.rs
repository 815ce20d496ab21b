// src/audio_buffer.rs
//
// Borrowed views over planar float audio.
//
// Layout is channel-major: the sample for channel `c` at frame `i` lives at
// index `c * frames + i`. Views never own their samples.

use crate::error::{AudioError, Result};

/// Read-only view of planar float audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioBuffer<'a> {
    data: &'a [f32],
    frames: usize,
    channels: u16,
    sample_rate: u32,
}

impl<'a> AudioBuffer<'a> {
    /// Wrap planar samples, deriving the frame count from the slice length.
    pub fn new(data: &'a [f32], channels: u16, sample_rate: u32) -> Result<Self> {
        validate_format(channels, sample_rate)?;
        let channel_count = channels as usize;
        if data.len() % channel_count != 0 {
            return Err(AudioError::InvalidBuffer(
                "sample count is not a multiple of the channel count",
            ));
        }
        Ok(Self {
            data,
            frames: data.len() / channel_count,
            channels,
            sample_rate,
        })
    }

    /// Wrap planar samples with an explicit frame count.
    pub fn from_parts(data: &'a [f32], frames: usize, channels: u16, sample_rate: u32) -> Result<Self> {
        validate_format(channels, sample_rate)?;
        check_len(data.len(), frames, channels)?;
        Ok(Self {
            data,
            frames,
            channels,
            sample_rate,
        })
    }

    /// Frames per channel.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Frames of channel `ch`.
    #[inline]
    pub fn channel(&self, ch: usize) -> &'a [f32] {
        let start = ch * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Iterate channels in order.
    pub fn channels_iter(self) -> impl Iterator<Item = &'a [f32]> {
        let frames = self.frames;
        let data = self.data;
        (0..self.channels as usize).map(move |ch| &data[ch * frames..(ch + 1) * frames])
    }

    /// All samples in planar order.
    #[inline]
    pub fn samples(&self) -> &'a [f32] {
        self.data
    }

    /// Whether `other` has the same channel count and sample rate.
    pub fn same_format(&self, other: &AudioBuffer<'_>) -> bool {
        self.channels == other.channels && self.sample_rate == other.sample_rate
    }

    /// Fail with [`AudioError::FormatMismatch`] unless `other` shares this format.
    pub fn require_same_format(&self, other: &AudioBuffer<'_>) -> Result<()> {
        if self.same_format(other) {
            Ok(())
        } else {
            Err(AudioError::FormatMismatch {
                expected_channels: self.channels,
                expected_rate: self.sample_rate,
                channels: other.channels,
                sample_rate: other.sample_rate,
            })
        }
    }
}

/// Mutable view of planar float audio, for in-place processing.
#[derive(Debug)]
pub struct AudioBufferMut<'a> {
    data: &'a mut [f32],
    frames: usize,
    channels: u16,
    sample_rate: u32,
}

impl<'a> AudioBufferMut<'a> {
    pub fn new(data: &'a mut [f32], channels: u16, sample_rate: u32) -> Result<Self> {
        validate_format(channels, sample_rate)?;
        let channel_count = channels as usize;
        if data.len() % channel_count != 0 {
            return Err(AudioError::InvalidBuffer(
                "sample count is not a multiple of the channel count",
            ));
        }
        let frames = data.len() / channel_count;
        Ok(Self {
            data,
            frames,
            channels,
            sample_rate,
        })
    }

    pub fn from_parts(
        data: &'a mut [f32],
        frames: usize,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self> {
        validate_format(channels, sample_rate)?;
        check_len(data.len(), frames, channels)?;
        Ok(Self {
            data,
            frames,
            channels,
            sample_rate,
        })
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.frames;
        &mut self.data[start..start + self.frames]
    }

    /// Get mutable access to all samples in planar order.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f32] {
        self.data
    }

    /// Reborrow as a read-only view.
    pub fn as_buffer(&self) -> AudioBuffer<'_> {
        AudioBuffer {
            data: &*self.data,
            frames: self.frames,
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }
}

fn validate_format(channels: u16, sample_rate: u32) -> Result<()> {
    if channels == 0 {
        return Err(AudioError::InvalidBuffer("channel count must be at least 1"));
    }
    if sample_rate == 0 {
        return Err(AudioError::InvalidBuffer("sample rate must be positive"));
    }
    Ok(())
}

fn check_len(len: usize, frames: usize, channels: u16) -> Result<()> {
    let expected = frames
        .checked_mul(channels as usize)
        .ok_or(AudioError::TooLarge)?;
    if len != expected {
        return Err(AudioError::InvalidBuffer(
            "sample count does not match frames * channels",
        ));
    }
    Ok(())
}
