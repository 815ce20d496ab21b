// src/ops/mod.rs
//
// In-memory transformations on planar float audio.
//
// Every producing operation writes its result into the scratch arena from
// offset 0 and returns a view borrowing the arena. `adjust_volume` works in
// place and never touches the arena.

mod crossfade;
mod gain;
mod merge;
mod resample;
mod slice;

pub use crossfade::cross_fade;
pub use gain::adjust_volume;
pub use merge::merge;
pub use resample::resample;
pub use slice::slice;

use crate::error::{AudioError, Result};

/// `frames * channels`, checked.
fn sample_count(frames: usize, channels: u16) -> Result<usize> {
    frames
        .checked_mul(channels as usize)
        .ok_or(AudioError::TooLarge)
}
