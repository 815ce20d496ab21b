// C-compatible FFI bindings for wasm32 and native hosts.
//
// Safety requirements:
// - Descriptor pointers must be valid for reads (or writes, for outputs)
// - Sample and byte pointers must cover `length * channels` floats or
//   `size` bytes respectively
// - Calls must not overlap: the boundary arena is process-wide
// - Pointers into the arena are invalidated by the next producing call
//
// Every producing call returns a positive sample, frame or byte count on
// success and 0 on any failure.

use std::borrow::Cow;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::arena::ScratchArena;
use crate::audio_buffer::{AudioBuffer, AudioBufferMut};
use crate::error::{AudioError, Result};
use crate::ops;
use crate::wav::{self, BitDepth};

// Logger subsystem identifier
#[cfg(feature = "ios")]
const LOG_SUBSYSTEM: &str = "com.pcmkit.engine";

static ARENA: Mutex<ScratchArena> = Mutex::new(ScratchArena::new());

fn arena() -> MutexGuard<'static, ScratchArena> {
    // The arena is never left half-updated, so a poisoned lock is still usable.
    ARENA.lock().unwrap_or_else(PoisonError::into_inner)
}

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup; messages appear in Console.app and
/// Xcode's debug console.
#[cfg(feature = "ios")]
#[unsafe(no_mangle)]
pub extern "C" fn pcmkit_init_logger() {
    oslog::OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(log::LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Descriptor
// ═══════════════════════════════════════════════════════════════════════════

/// Buffer descriptor exchanged with the host.
///
/// Samples are planar: channel `c`, frame `i` is at `data[c * length + i]`.
/// On wasm32 the record is 16 bytes with fields at offsets 0, 4, 8 and 12.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AudioDescriptor {
    pub data: *mut f32,
    /// Frames per channel.
    pub length: u32,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Host input copied out of the arena when it would otherwise be overwritten.
struct StagedBuffer<'a> {
    samples: Cow<'a, [f32]>,
    frames: usize,
    channels: u16,
    sample_rate: u32,
}

impl StagedBuffer<'_> {
    fn view(&self) -> Result<AudioBuffer<'_>> {
        AudioBuffer::from_parts(&self.samples, self.frames, self.channels, self.sample_rate)
    }
}

/// Borrow `count` host values, or copy them if they live inside the arena.
///
/// # Safety
/// `ptr` must be valid for `count` reads for the lifetime `'a`.
unsafe fn stage<'a, T: Clone>(arena: &ScratchArena, ptr: *const T, count: usize) -> Result<Cow<'a, [T]>> {
    if count == 0 {
        return Ok(Cow::Borrowed(&[]));
    }
    if ptr.is_null() {
        return Err(AudioError::InvalidBuffer("null data pointer"));
    }
    let bytes = count
        .checked_mul(std::mem::size_of::<T>())
        .ok_or(AudioError::TooLarge)?;
    let values = unsafe { std::slice::from_raw_parts(ptr, count) };
    if arena.overlaps(ptr.cast(), bytes) {
        debug!("staging {} input bytes held in the arena", bytes);
        Ok(Cow::Owned(values.to_vec()))
    } else {
        Ok(Cow::Borrowed(values))
    }
}

/// # Safety
/// `desc.data` must be valid for `length * channels` reads.
unsafe fn stage_buffer<'a>(arena: &ScratchArena, desc: &AudioDescriptor) -> Result<StagedBuffer<'a>> {
    let frames = desc.length as usize;
    let count = frames
        .checked_mul(desc.channels as usize)
        .ok_or(AudioError::TooLarge)?;
    let samples = unsafe { stage(arena, desc.data.cast_const(), count)? };
    Ok(StagedBuffer {
        samples,
        frames,
        channels: desc.channels,
        sample_rate: desc.sample_rate,
    })
}

/// Read a host descriptor, tolerating unaligned records.
///
/// # Safety
/// `ptr` must be null or valid for one descriptor read.
unsafe fn read_descriptor(ptr: *const AudioDescriptor) -> Option<AudioDescriptor> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { ptr.read_unaligned() })
    }
}

/// Describe the arena's current float result into `out`.
///
/// # Safety
/// `out` must be non-null and valid for one descriptor write.
unsafe fn publish(
    arena: &mut ScratchArena,
    out: *mut AudioDescriptor,
    frames: usize,
    channels: u16,
    sample_rate: u32,
) -> Result<usize> {
    let desc = AudioDescriptor {
        data: arena.base_mut().cast(),
        length: u32::try_from(frames).map_err(|_| AudioError::TooLarge)?,
        channels,
        sample_rate,
    };
    unsafe { out.write_unaligned(desc) };
    Ok(frames)
}

/// Flatten a result to the boundary's count-or-zero convention.
fn report(op: &str, result: Result<usize>) -> u32 {
    match result.and_then(|n| u32::try_from(n).map_err(|_| AudioError::TooLarge)) {
        Ok(n) => n,
        Err(err) => {
            warn!("{} failed [{}]: {}", op, err.error_code(), err);
            0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Arena Lifecycle
// ═══════════════════════════════════════════════════════════════════════════

/// Discard the arena and allocate `size` bytes.
///
/// Returns `size`, or 0 if the allocation failed.
#[unsafe(no_mangle)]
pub extern "C" fn init_memory(size: u32) -> u32 {
    report("init_memory", arena().init(size as usize))
}

/// Base pointer of the arena (null before the first allocation).
#[unsafe(no_mangle)]
pub extern "C" fn get_memory_buffer() -> *mut u8 {
    arena().base_mut()
}

/// Bytes produced by the most recent successful call.
#[unsafe(no_mangle)]
pub extern "C" fn get_buffer_size() -> u32 {
    report("get_buffer_size", Ok(arena().used_bytes()))
}

/// Free the arena.
#[unsafe(no_mangle)]
pub extern "C" fn cleanup() {
    arena().teardown();
}

// ═══════════════════════════════════════════════════════════════════════════
// WAV Codec
// ═══════════════════════════════════════════════════════════════════════════

/// Encode planar float audio as a canonical PCM WAV file in the arena.
///
/// Returns the total file size in bytes (44-byte header plus payload).
///
/// # Safety
/// `data` must be valid for `length * channels` float reads.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn audio_buffer_to_wav(
    data: *const f32,
    length: u32,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
) -> u32 {
    let source = AudioDescriptor {
        data: data.cast_mut(),
        length,
        channels,
        sample_rate,
    };
    let result = unsafe { encode_into(&mut arena(), &source, bits_per_sample) };
    report("audio_buffer_to_wav", result)
}

unsafe fn encode_into(arena: &mut ScratchArena, source: &AudioDescriptor, bits: u16) -> Result<usize> {
    let bit_depth = BitDepth::try_from(bits)?;
    let staged = unsafe { stage_buffer(arena, source)? };
    let buffer = staged.view()?;
    Ok(wav::encode(arena, &buffer, bit_depth)?.len())
}

/// Decode a canonical PCM WAV file into planar floats in the arena.
///
/// On success `out` describes the decoded buffer and the frame count is
/// returned.
///
/// # Safety
/// - `wav` must be valid for `size` byte reads
/// - `out` must be valid for one descriptor write
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wav_to_audio_buffer(
    wav: *const u8,
    size: u32,
    out: *mut AudioDescriptor,
) -> u32 {
    if wav.is_null() || out.is_null() {
        return 0;
    }
    let result = unsafe { decode_into(&mut arena(), wav, size as usize, out) };
    report("wav_to_audio_buffer", result)
}

unsafe fn decode_into(
    arena: &mut ScratchArena,
    wav: *const u8,
    size: usize,
    out: *mut AudioDescriptor,
) -> Result<usize> {
    let bytes = unsafe { stage(arena, wav, size)? };
    let decoded = wav::decode(arena, &bytes)?;
    let (frames, channels, rate) = (decoded.frames(), decoded.channels(), decoded.sample_rate());
    unsafe { publish(arena, out, frames, channels, rate) }
}

// ═══════════════════════════════════════════════════════════════════════════
// Buffer Operations
// ═══════════════════════════════════════════════════════════════════════════

/// Copy `length` frames from `start` of every channel into the arena.
///
/// Returns the frame count actually produced; the planar result in the
/// arena uses that count as its channel stride.
///
/// # Safety
/// `source` must point to a valid descriptor.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn slice_audio(source: *const AudioDescriptor, start: u32, length: u32) -> u32 {
    let Some(source) = (unsafe { read_descriptor(source) }) else {
        return 0;
    };
    let result = unsafe { slice_into(&mut arena(), &source, start as usize, length as usize) };
    report("slice_audio", result)
}

unsafe fn slice_into(
    arena: &mut ScratchArena,
    source: &AudioDescriptor,
    start: usize,
    length: usize,
) -> Result<usize> {
    let staged = unsafe { stage_buffer(arena, source)? };
    let buffer = staged.view()?;
    Ok(ops::slice(arena, &buffer, start, length)?.frames())
}

/// Concatenate `count` buffers that share channel count and sample rate.
///
/// # Safety
/// - `buffers` must point to `count` valid descriptors
/// - `out` must be valid for one descriptor write
#[unsafe(no_mangle)]
pub unsafe extern "C" fn merge_audio_buffers(
    buffers: *const AudioDescriptor,
    count: u32,
    out: *mut AudioDescriptor,
) -> u32 {
    if buffers.is_null() || out.is_null() || count == 0 {
        return 0;
    }
    let result = unsafe { merge_into(&mut arena(), buffers, count as usize, out) };
    report("merge_audio_buffers", result)
}

unsafe fn merge_into(
    arena: &mut ScratchArena,
    buffers: *const AudioDescriptor,
    count: usize,
    out: *mut AudioDescriptor,
) -> Result<usize> {
    let mut staged = Vec::with_capacity(count);
    for i in 0..count {
        let desc = unsafe { buffers.add(i).read_unaligned() };
        staged.push(unsafe { stage_buffer(arena, &desc)? });
    }
    let views = staged
        .iter()
        .map(|buffer| buffer.view())
        .collect::<Result<Vec<_>>>()?;

    let merged = ops::merge(arena, &views)?;
    let (frames, channels, rate) = (merged.frames(), merged.channels(), merged.sample_rate());
    unsafe { publish(arena, out, frames, channels, rate) }
}

/// Resample to `target_rate` by linear interpolation.
///
/// # Safety
/// - `source` must point to a valid descriptor
/// - `out` must be valid for one descriptor write
#[unsafe(no_mangle)]
pub unsafe extern "C" fn resample_audio(
    source: *const AudioDescriptor,
    target_rate: u32,
    out: *mut AudioDescriptor,
) -> u32 {
    let Some(source) = (unsafe { read_descriptor(source) }) else {
        return 0;
    };
    if out.is_null() {
        return 0;
    }
    let result = unsafe { resample_into(&mut arena(), &source, target_rate, out) };
    report("resample_audio", result)
}

unsafe fn resample_into(
    arena: &mut ScratchArena,
    source: &AudioDescriptor,
    target_rate: u32,
    out: *mut AudioDescriptor,
) -> Result<usize> {
    let staged = unsafe { stage_buffer(arena, source)? };
    let buffer = staged.view()?;
    let resampled = ops::resample(arena, &buffer, target_rate)?;
    let (frames, channels, rate) = (resampled.frames(), resampled.channels(), resampled.sample_rate());
    unsafe { publish(arena, out, frames, channels, rate) }
}

/// Scale every sample by `volume` in place, clamping to `[-1, 1]`.
///
/// Does not touch the arena.
///
/// # Safety
/// `buffer` must point to a valid descriptor whose data is writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn adjust_volume(buffer: *const AudioDescriptor, volume: f32) {
    let Some(desc) = (unsafe { read_descriptor(buffer) }) else {
        return;
    };
    let frames = desc.length as usize;
    let Some(count) = frames.checked_mul(desc.channels as usize) else {
        return;
    };
    if count == 0 || desc.data.is_null() {
        return;
    }

    let samples = unsafe { std::slice::from_raw_parts_mut(desc.data, count) };
    match AudioBufferMut::from_parts(samples, frames, desc.channels, desc.sample_rate) {
        Ok(mut view) => ops::adjust_volume(&mut view, volume),
        Err(err) => warn!("adjust_volume failed [{}]: {}", err.error_code(), err),
    }
}

/// Join `a` and `b` with a linear crossfade of `fade_length` frames.
///
/// # Safety
/// - `a` and `b` must point to valid descriptors
/// - `out` must be valid for one descriptor write
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cross_fade(
    a: *const AudioDescriptor,
    b: *const AudioDescriptor,
    fade_length: u32,
    out: *mut AudioDescriptor,
) -> u32 {
    let (Some(a), Some(b)) = (unsafe { read_descriptor(a) }, unsafe { read_descriptor(b) }) else {
        return 0;
    };
    if out.is_null() {
        return 0;
    }
    let result = unsafe { cross_fade_into(&mut arena(), &a, &b, fade_length as usize, out) };
    report("cross_fade", result)
}

unsafe fn cross_fade_into(
    arena: &mut ScratchArena,
    a: &AudioDescriptor,
    b: &AudioDescriptor,
    fade_length: usize,
    out: *mut AudioDescriptor,
) -> Result<usize> {
    let staged_a = unsafe { stage_buffer(arena, a)? };
    let staged_b = unsafe { stage_buffer(arena, b)? };
    let (a, b) = (staged_a.view()?, staged_b.view()?);
    let joined = ops::cross_fade(arena, &a, &b, fade_length)?;
    let (frames, channels, rate) = (joined.frames(), joined.channels(), joined.sample_rate());
    unsafe { publish(arena, out, frames, channels, rate) }
}
