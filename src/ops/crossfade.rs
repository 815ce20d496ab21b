// Linear crossfade joining two buffers.

use crate::arena::ScratchArena;
use crate::audio_buffer::AudioBuffer;
use crate::error::{AudioError, Result};

use super::sample_count;

/// Join `a` and `b`, overlapping the last `fade_length` frames of `a` with
/// the first `fade_length` frames of `b`.
///
/// Output length is `a.frames() + b.frames() - fade_length`. Inside the
/// overlap the weight on `a` rises linearly from 0 on the first mixed frame
/// to 1 on the last, and `b` takes the complementary weight, so every mixed
/// sample is a convex combination of the two inputs.
pub fn cross_fade<'a>(
    arena: &'a mut ScratchArena,
    a: &AudioBuffer<'_>,
    b: &AudioBuffer<'_>,
    fade_length: usize,
) -> Result<AudioBuffer<'a>> {
    a.require_same_format(b)?;
    let available = a.frames().min(b.frames());
    if fade_length > available {
        return Err(AudioError::InvalidFade {
            fade_length,
            available,
        });
    }

    let head = a.frames() - fade_length;
    let total = a.frames() + b.frames() - fade_length;
    let count = sample_count(total, a.channels())?;

    let samples = arena.write_samples(count, |out| {
        for (ch, (src_a, src_b)) in a.channels_iter().zip(b.channels_iter()).enumerate() {
            let dst = &mut out[ch * total..(ch + 1) * total];

            dst[..head].copy_from_slice(&src_a[..head]);

            let mixed = dst[head..a.frames()]
                .iter_mut()
                .zip(&src_a[head..])
                .zip(&src_b[..fade_length]);
            for (i, ((sample, &tail), &lead)) in mixed.enumerate() {
                let weight = fade_weight(i, fade_length);
                *sample = tail * weight + lead * (1.0 - weight);
            }

            dst[a.frames()..].copy_from_slice(&src_b[fade_length..]);
        }
    })?;

    AudioBuffer::from_parts(samples, total, a.channels(), a.sample_rate())
}

/// Weight applied to `a` at overlap frame `i`, spanning `[0, 1]` inclusive.
fn fade_weight(i: usize, fade_length: usize) -> f32 {
    if fade_length <= 1 {
        0.0
    } else {
        i as f32 / (fade_length - 1) as f32
    }
}
