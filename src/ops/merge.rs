// Concatenation of buffers sharing one format.

use crate::arena::ScratchArena;
use crate::audio_buffer::AudioBuffer;
use crate::error::{AudioError, Result};

use super::sample_count;

/// Concatenate `buffers` in order.
///
/// All inputs must share channel count and sample rate. Channel `c` of the
/// result is the concatenation of channel `c` across the inputs, with
/// output stride equal to the summed frame count.
pub fn merge<'a>(arena: &'a mut ScratchArena, buffers: &[AudioBuffer<'_>]) -> Result<AudioBuffer<'a>> {
    let first = buffers
        .first()
        .ok_or(AudioError::InvalidBuffer("merge needs at least one buffer"))?;

    let mut total = 0usize;
    for buffer in buffers {
        first.require_same_format(buffer)?;
        total = total
            .checked_add(buffer.frames())
            .ok_or(AudioError::TooLarge)?;
    }
    let count = sample_count(total, first.channels())?;

    let samples = arena.write_samples(count, |out| {
        let mut offset = 0;
        for buffer in buffers {
            let frames = buffer.frames();
            for (ch, src) in buffer.channels_iter().enumerate() {
                let dst = ch * total + offset;
                out[dst..dst + frames].copy_from_slice(src);
            }
            offset += frames;
        }
    })?;

    AudioBuffer::from_parts(samples, total, first.channels(), first.sample_rate())
}
