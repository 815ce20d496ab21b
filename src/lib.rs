// src/lib.rs
//
// Library entry point for FFI consumers (WebAssembly hosts, iOS/Swift).

pub mod arena;
pub mod audio_buffer;
pub mod config;
pub mod error;
pub mod ops;
pub mod wav;

pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use arena::ScratchArena;
pub use audio_buffer::{AudioBuffer, AudioBufferMut};
pub use config::ArenaConfig;
pub use error::{AudioError, Result};
pub use ops::{adjust_volume, cross_fade, merge, resample, slice};
pub use wav::{decode, encode, BitDepth, WavHeader};
