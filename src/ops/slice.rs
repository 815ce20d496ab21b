// Frame-range extraction.

use crate::arena::ScratchArena;
use crate::audio_buffer::AudioBuffer;
use crate::error::Result;

use super::sample_count;

/// Copy `length` frames starting at `start_frame` from every channel.
///
/// The range is clamped to the source: a start at or past the end yields an
/// empty buffer, and an overlong `length` is cut to the remaining frames.
/// The result keeps the planar layout with stride equal to its own length.
pub fn slice<'a>(
    arena: &'a mut ScratchArena,
    source: &AudioBuffer<'_>,
    start_frame: usize,
    length: usize,
) -> Result<AudioBuffer<'a>> {
    let start = start_frame.min(source.frames());
    let length = length.min(source.frames() - start);
    let count = sample_count(length, source.channels())?;

    let samples = arena.write_samples(count, |out| {
        for (ch, src) in source.channels_iter().enumerate() {
            out[ch * length..(ch + 1) * length].copy_from_slice(&src[start..start + length]);
        }
    })?;

    AudioBuffer::from_parts(samples, length, source.channels(), source.sample_rate())
}
