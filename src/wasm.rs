//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! Unlike the raw C-ABI exports in [`crate::ffi`], each [`AudioProcessor`]
//! owns its own scratch arena and results are copied into JS-owned typed
//! arrays, so nothing is invalidated between calls.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { pcmkit_init, AudioProcessor } from './pcmkit.js';
//!
//! await init();
//! pcmkit_init();
//!
//! const processor = new AudioProcessor();
//! const decoded = processor.decode_wav(new Uint8Array(fileBytes));
//! const louder = decoded.samples;
//! AudioProcessor.adjust_volume(louder, decoded.channels, decoded.sample_rate, 1.5);
//! const wav = processor.encode_wav(louder, decoded.channels, decoded.sample_rate, 16);
//! ```

use wasm_bindgen::prelude::*;

use crate::arena::ScratchArena;
use crate::audio_buffer::{AudioBuffer, AudioBufferMut};
use crate::config::{ArenaConfig, DEFAULT_BIT_DEPTH};
use crate::error::AudioError;
use crate::ops;
use crate::wav::{self, BitDepth};

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn pcmkit_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Decoded Audio
// ═══════════════════════════════════════════════════════════════════════════

/// Result of decoding a WAV file: planar samples plus their format.
#[wasm_bindgen]
pub struct DecodedAudio {
    samples: Vec<f32>,
    frames: u32,
    channels: u16,
    sample_rate: u32,
}

#[wasm_bindgen]
impl DecodedAudio {
    /// Planar samples (channel-major).
    #[wasm_bindgen(getter)]
    pub fn samples(&self) -> Vec<f32> {
        self.samples.clone()
    }

    /// Frames per channel.
    #[wasm_bindgen(getter)]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[wasm_bindgen(getter)]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Processor
// ═══════════════════════════════════════════════════════════════════════════

/// Audio processor owning its own scratch arena.
#[wasm_bindgen]
pub struct AudioProcessor {
    arena: ScratchArena,
}

#[wasm_bindgen]
impl AudioProcessor {
    /// Create a processor with an empty arena that grows on demand.
    #[wasm_bindgen(constructor)]
    pub fn new() -> AudioProcessor {
        Self {
            arena: ScratchArena::new(),
        }
    }

    /// Create a processor with `bytes` of arena allocated up front.
    pub fn with_capacity(bytes: u32) -> Result<AudioProcessor, JsError> {
        let arena = ScratchArena::with_config(ArenaConfig::with_initial_bytes(bytes as usize))?;
        Ok(Self { arena })
    }

    /// Bytes produced by the most recent call.
    pub fn buffer_size(&self) -> u32 {
        self.arena.used_bytes() as u32
    }

    // ─────────────────────────────────────────────────────────────────────────
    // WAV Codec
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode planar samples as a canonical PCM WAV file.
    ///
    /// `bits_per_sample` is 16 or 24; 0 selects 16.
    pub fn encode_wav(
        &mut self,
        data: &[f32],
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> Result<Vec<u8>, JsError> {
        let bits = if bits_per_sample == 0 {
            DEFAULT_BIT_DEPTH
        } else {
            bits_per_sample
        };
        let bit_depth = BitDepth::try_from(bits)?;
        let buffer = AudioBuffer::new(data, channels, sample_rate)?;
        Ok(wav::encode(&mut self.arena, &buffer, bit_depth)?.to_vec())
    }

    /// Decode a canonical PCM WAV file into planar samples.
    pub fn decode_wav(&mut self, bytes: &[u8]) -> Result<DecodedAudio, JsError> {
        let decoded = wav::decode(&mut self.arena, bytes)?;
        Ok(DecodedAudio {
            samples: decoded.samples().to_vec(),
            frames: decoded.frames() as u32,
            channels: decoded.channels(),
            sample_rate: decoded.sample_rate(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Buffer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Extract `length` frames starting at `start` (clamped to the source).
    pub fn slice(
        &mut self,
        data: &[f32],
        channels: u16,
        sample_rate: u32,
        start: u32,
        length: u32,
    ) -> Result<Vec<f32>, JsError> {
        let source = AudioBuffer::new(data, channels, sample_rate)?;
        let out = ops::slice(&mut self.arena, &source, start as usize, length as usize)?;
        Ok(out.samples().to_vec())
    }

    /// Concatenate buffers passed back to back in `data`.
    ///
    /// `lengths[i]` is the frame count of buffer `i`; each buffer is planar
    /// on its own and all share `channels` and `sample_rate`.
    pub fn merge(
        &mut self,
        data: &[f32],
        lengths: &[u32],
        channels: u16,
        sample_rate: u32,
    ) -> Result<Vec<f32>, JsError> {
        let mut buffers = Vec::with_capacity(lengths.len());
        let mut rest = data;
        for &frames in lengths {
            let count = frames as usize * channels as usize;
            if count > rest.len() {
                return Err(AudioError::InvalidBuffer("lengths exceed the supplied samples").into());
            }
            let (chunk, tail) = rest.split_at(count);
            buffers.push(AudioBuffer::from_parts(chunk, frames as usize, channels, sample_rate)?);
            rest = tail;
        }
        let out = ops::merge(&mut self.arena, &buffers)?;
        Ok(out.samples().to_vec())
    }

    /// Resample to `target_rate` by linear interpolation.
    pub fn resample(
        &mut self,
        data: &[f32],
        channels: u16,
        sample_rate: u32,
        target_rate: u32,
    ) -> Result<Vec<f32>, JsError> {
        let source = AudioBuffer::new(data, channels, sample_rate)?;
        let out = ops::resample(&mut self.arena, &source, target_rate)?;
        Ok(out.samples().to_vec())
    }

    /// Scale samples in place by `volume`, clamping to `[-1, 1]`.
    pub fn adjust_volume(
        data: &mut [f32],
        channels: u16,
        sample_rate: u32,
        volume: f32,
    ) -> Result<(), JsError> {
        let mut buffer = AudioBufferMut::new(data, channels, sample_rate)?;
        ops::adjust_volume(&mut buffer, volume);
        Ok(())
    }

    /// Join `a` and `b` with a linear crossfade of `fade_length` frames.
    pub fn cross_fade(
        &mut self,
        a: &[f32],
        b: &[f32],
        channels: u16,
        sample_rate: u32,
        fade_length: u32,
    ) -> Result<Vec<f32>, JsError> {
        let a = AudioBuffer::new(a, channels, sample_rate)?;
        let b = AudioBuffer::new(b, channels, sample_rate)?;
        let out = ops::cross_fade(&mut self.arena, &a, &b, fade_length as usize)?;
        Ok(out.samples().to_vec())
    }
}

impl Default for AudioProcessor {
    fn default() -> Self {
        Self::new()
    }
}
