// src/error.rs
//
// Error type shared by the arena, the WAV codec and the buffer operations.
// The C-ABI boundary flattens all of these to a `0` return.

use thiserror::Error;

/// Result type alias for pcmkit operations.
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors raised by arena, codec and buffer operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The arena could not grow to the requested size.
    #[error("arena allocation of {requested} bytes failed (limit {limit} bytes)")]
    AllocationFailed { requested: usize, limit: usize },

    /// Buffers combined by merge or crossfade disagree on their format.
    #[error(
        "format mismatch: expected {expected_channels} ch @ {expected_rate} Hz, \
         got {channels} ch @ {sample_rate} Hz"
    )]
    FormatMismatch {
        expected_channels: u16,
        expected_rate: u32,
        channels: u16,
        sample_rate: u32,
    },

    /// The byte stream is not a canonical 44-byte-header PCM WAV.
    #[error("invalid WAV: {0}")]
    InvalidWav(&'static str),

    #[error("unsupported bit depth: {0} (expected 16 or 24)")]
    UnsupportedBitDepth(u16),

    #[error("unsupported WAV audio format tag: {0} (only PCM is handled)")]
    UnsupportedAudioFormat(u16),

    /// A buffer descriptor is internally inconsistent.
    #[error("invalid audio buffer: {0}")]
    InvalidBuffer(&'static str),

    #[error("fade length {fade_length} exceeds available frames {available}")]
    InvalidFade { fade_length: usize, available: usize },

    /// A result size does not fit the 32-bit sizes used at the boundary.
    #[error("result exceeds the 32-bit size limit")]
    TooLarge,
}

impl AudioError {
    /// Short stable code for log lines and host-side diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            AudioError::AllocationFailed { .. } => "ALLOCATION_FAILED",
            AudioError::FormatMismatch { .. } => "FORMAT_MISMATCH",
            AudioError::InvalidWav(_) => "INVALID_WAV",
            AudioError::UnsupportedBitDepth(_) => "UNSUPPORTED_BIT_DEPTH",
            AudioError::UnsupportedAudioFormat(_) => "UNSUPPORTED_AUDIO_FORMAT",
            AudioError::InvalidBuffer(_) => "INVALID_BUFFER",
            AudioError::InvalidFade { .. } => "INVALID_FADE",
            AudioError::TooLarge => "TOO_LARGE",
        }
    }
}
