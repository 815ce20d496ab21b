// Sample-rate conversion by linear interpolation.
//
// No anti-aliasing filter is applied; downsampling aliases.

use crate::arena::ScratchArena;
use crate::audio_buffer::AudioBuffer;
use crate::error::{AudioError, Result};

use super::sample_count;

/// Convert `source` to `target_rate` by linear interpolation.
///
/// The output holds `floor(frames * target_rate / source_rate)` frames.
/// Output frame `i` reads source position `i / ratio`; positions at or past
/// the last source frame hold the last source sample. Equal rates copy the
/// input unchanged.
pub fn resample<'a>(
    arena: &'a mut ScratchArena,
    source: &AudioBuffer<'_>,
    target_rate: u32,
) -> Result<AudioBuffer<'a>> {
    if target_rate == 0 {
        return Err(AudioError::InvalidBuffer("target sample rate must be positive"));
    }

    let source_rate = source.sample_rate();
    if target_rate == source_rate {
        let samples = arena.write_samples(source.samples().len(), |out| {
            out.copy_from_slice(source.samples())
        })?;
        return AudioBuffer::from_parts(samples, source.frames(), source.channels(), target_rate);
    }

    let target_len = target_length(source.frames(), source_rate, target_rate)?;
    let count = sample_count(target_len, source.channels())?;
    // Source frames advanced per output frame, i.e. 1 / ratio.
    let step = source_rate as f64 / target_rate as f64;

    let samples = arena.write_samples(count, |out| {
        for (ch, src) in source.channels_iter().enumerate() {
            let dst = &mut out[ch * target_len..(ch + 1) * target_len];
            let last = src.len().saturating_sub(1);
            for (i, sample) in dst.iter_mut().enumerate() {
                let pos = i as f64 * step;
                let idx = pos as usize;
                *sample = if idx >= last {
                    src[last]
                } else {
                    let frac = pos - idx as f64;
                    (src[idx] as f64 * (1.0 - frac) + src[idx + 1] as f64 * frac) as f32
                };
            }
        }
    })?;

    log::trace!(
        "resampled {} -> {} frames ({} Hz -> {} Hz)",
        source.frames(),
        target_len,
        source_rate,
        target_rate
    );
    AudioBuffer::from_parts(samples, target_len, source.channels(), target_rate)
}

/// `floor(frames * target / source)` in exact integer arithmetic.
fn target_length(frames: usize, source_rate: u32, target_rate: u32) -> Result<usize> {
    let len = frames as u128 * target_rate as u128 / source_rate as u128;
    usize::try_from(len).map_err(|_| AudioError::TooLarge)
}
