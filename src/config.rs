// src/config.rs
//
// Arena sizing configuration and shared defaults.

/// Bytes per stored float sample.
pub const SAMPLE_BYTES: usize = std::mem::size_of::<f32>();

/// Every size crosses the host boundary as a `u32`.
pub const MAX_ARENA_BYTES: usize = u32::MAX as usize;

/// Bit depth used by the web bindings when the caller passes 0.
pub const DEFAULT_BIT_DEPTH: u16 = 16;

/// Sizing for a [`ScratchArena`](crate::arena::ScratchArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Bytes allocated up front.
    pub initial_bytes: usize,
    /// Hard ceiling for on-demand growth. Requests above it fail like an
    /// allocator refusal.
    pub max_bytes: usize,
}

impl ArenaConfig {
    pub fn with_initial_bytes(initial_bytes: usize) -> Self {
        Self {
            initial_bytes,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes.min(MAX_ARENA_BYTES);
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_bytes: 0,
            max_bytes: MAX_ARENA_BYTES,
        }
    }
}
