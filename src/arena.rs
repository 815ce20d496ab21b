// src/arena.rs
//
// Scratch arena - the single growable region every producing operation
// writes its result into.
//
// Each producing call overwrites the previous result from offset 0. Any
// view or pointer handed out earlier is invalidated by the next producing
// call; in Rust this is enforced by the `&mut self` borrow, at the C
// boundary it is part of the host contract.

use log::debug;

use crate::config::{ArenaConfig, MAX_ARENA_BYTES, SAMPLE_BYTES};
use crate::error::{AudioError, Result};

/// Growable output region shared by all producing operations.
///
/// Backing storage is kept as `f32` words so float results are always
/// correctly aligned; byte results (WAV) are written through a byte view of
/// the same storage.
#[derive(Debug)]
pub struct ScratchArena {
    /// Backing storage. Holds at least `capacity` bytes.
    storage: Vec<f32>,
    /// Bytes produced by the most recent successful call.
    used: usize,
    /// Bytes currently reserved for output.
    capacity: usize,
    /// Growth ceiling in bytes.
    limit: usize,
}

impl ScratchArena {
    /// Create an empty arena with no storage.
    pub const fn new() -> Self {
        Self {
            storage: Vec::new(),
            used: 0,
            capacity: 0,
            limit: MAX_ARENA_BYTES,
        }
    }

    /// Create an arena sized and limited by `config`.
    pub fn with_config(config: ArenaConfig) -> Result<Self> {
        let mut arena = Self::new();
        arena.limit = config.max_bytes;
        arena.init(config.initial_bytes)?;
        Ok(arena)
    }

    /// Discard any existing storage and allocate `size` bytes.
    ///
    /// Returns `size` on success. On failure the arena is left empty.
    pub fn init(&mut self, size: usize) -> Result<usize> {
        self.teardown();
        self.grow_to(size)?;
        Ok(size)
    }

    /// Make sure at least `bytes` bytes are available.
    ///
    /// Contents are not guaranteed to survive a grow. On failure the arena
    /// keeps its previous storage and `used` count.
    pub fn ensure(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.capacity {
            self.grow_to(bytes)?;
        }
        Ok(())
    }

    fn grow_to(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.limit {
            return Err(AudioError::AllocationFailed {
                requested: bytes,
                limit: self.limit,
            });
        }

        let words = bytes.div_ceil(SAMPLE_BYTES);
        let additional = words.saturating_sub(self.storage.len());
        self.storage
            .try_reserve_exact(additional)
            .map_err(|_| AudioError::AllocationFailed {
                requested: bytes,
                limit: self.limit,
            })?;
        if words > self.storage.len() {
            self.storage.resize(words, 0.0);
        }

        debug!("arena grown: {} -> {} bytes", self.capacity, bytes);
        self.capacity = bytes;
        Ok(())
    }

    /// Base pointer of the arena, or null when it holds no storage.
    pub fn base(&self) -> *const u8 {
        if self.capacity == 0 {
            std::ptr::null()
        } else {
            self.storage.as_ptr().cast()
        }
    }

    /// Mutable base pointer of the arena, or null when it holds no storage.
    pub fn base_mut(&mut self) -> *mut u8 {
        if self.capacity == 0 {
            std::ptr::null_mut()
        } else {
            self.storage.as_mut_ptr().cast()
        }
    }

    /// Bytes produced by the most recent successful call.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free all storage and reset every counter.
    pub fn teardown(&mut self) {
        if self.capacity > 0 {
            debug!("arena released: {} bytes", self.capacity);
        }
        self.storage = Vec::new();
        self.used = 0;
        self.capacity = 0;
    }

    /// Whether the byte range `[ptr, ptr + len)` overlaps arena storage.
    pub fn overlaps(&self, ptr: *const u8, len: usize) -> bool {
        if self.storage.is_empty() || len == 0 {
            return false;
        }
        let start = self.storage.as_ptr() as usize;
        let end = start + self.storage.len() * SAMPLE_BYTES;
        let other = ptr as usize;
        other < end && other.saturating_add(len) > start
    }

    /// The last result viewed as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.byte_view()[..self.used]
    }

    /// The last result viewed as float samples.
    pub fn as_samples(&self) -> &[f32] {
        &self.storage[..self.used / SAMPLE_BYTES]
    }

    /// Produce `count` float samples.
    ///
    /// `fill` receives exactly `count` writable samples. `used` is only
    /// updated once `fill` has returned.
    pub fn write_samples<F>(&mut self, count: usize, fill: F) -> Result<&[f32]>
    where
        F: FnOnce(&mut [f32]),
    {
        let bytes = count.checked_mul(SAMPLE_BYTES).ok_or(AudioError::TooLarge)?;
        self.ensure(bytes)?;
        fill(&mut self.storage[..count]);
        self.used = bytes;
        Ok(&self.storage[..count])
    }

    /// Produce `count` raw bytes. Same contract as [`write_samples`](Self::write_samples).
    pub fn write_bytes<F>(&mut self, count: usize, fill: F) -> Result<&[u8]>
    where
        F: FnOnce(&mut [u8]),
    {
        self.ensure(count)?;
        fill(&mut self.byte_view_mut()[..count]);
        self.used = count;
        Ok(&self.byte_view()[..count])
    }

    fn byte_view(&self) -> &[u8] {
        bytemuck::cast_slice(&self.storage)
    }

    fn byte_view_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.storage)
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_is_empty() {
        let arena = ScratchArena::new();
        assert!(arena.base().is_null());
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.used_bytes(), 0);
        assert!(arena.as_bytes().is_empty());
    }

    #[test]
    fn test_init_allocates_requested_size() {
        let mut arena = ScratchArena::new();
        assert_eq!(arena.init(1024), Ok(1024));
        assert_eq!(arena.capacity(), 1024);
        assert_eq!(arena.used_bytes(), 0);
        assert!(!arena.base().is_null());

        // Re-init discards previous storage
        assert_eq!(arena.init(16), Ok(16));
        assert_eq!(arena.capacity(), 16);
    }

    #[test]
    fn test_init_zero_keeps_null_base() {
        let mut arena = ScratchArena::new();
        assert_eq!(arena.init(0), Ok(0));
        assert!(arena.base().is_null());
    }

    #[test]
    fn test_init_beyond_limit_fails() {
        let mut arena = ScratchArena::with_config(ArenaConfig::default().with_limit(64)).unwrap();
        assert!(matches!(
            arena.init(65),
            Err(AudioError::AllocationFailed { requested: 65, limit: 64 })
        ));
        assert_eq!(arena.capacity(), 0);
        assert!(arena.base().is_null());
    }

    #[test]
    fn test_ensure_grows_on_demand() {
        let mut arena = ScratchArena::new();
        arena.ensure(10).unwrap();
        assert_eq!(arena.capacity(), 10);

        // Smaller request does not shrink
        arena.ensure(4).unwrap();
        assert_eq!(arena.capacity(), 10);

        arena.ensure(100).unwrap();
        assert_eq!(arena.capacity(), 100);
    }

    #[test]
    fn test_write_samples_sets_used() {
        let mut arena = ScratchArena::new();
        let out = arena
            .write_samples(3, |out| out.copy_from_slice(&[0.25, -0.5, 1.0]))
            .unwrap();
        assert_eq!(out, &[0.25, -0.5, 1.0]);
        assert_eq!(arena.used_bytes(), 12);
        assert_eq!(arena.as_samples(), &[0.25, -0.5, 1.0]);
    }

    #[test]
    fn test_write_bytes_shares_storage_with_samples() {
        let mut arena = ScratchArena::new();
        arena
            .write_bytes(4, |out| out.copy_from_slice(&1.0f32.to_ne_bytes()))
            .unwrap();
        assert_eq!(arena.used_bytes(), 4);
        assert_eq!(arena.as_samples(), &[1.0]);
        assert_eq!(arena.as_bytes(), &1.0f32.to_ne_bytes());
    }

    #[test]
    fn test_failed_write_keeps_previous_result() {
        let mut arena = ScratchArena::with_config(ArenaConfig::default().with_limit(16)).unwrap();
        arena.write_samples(2, |out| out.fill(0.5)).unwrap();
        assert_eq!(arena.used_bytes(), 8);

        let err = arena.write_samples(8, |out| out.fill(1.0)).unwrap_err();
        assert!(matches!(err, AudioError::AllocationFailed { requested: 32, .. }));
        assert_eq!(arena.used_bytes(), 8);
        assert_eq!(arena.as_samples(), &[0.5, 0.5]);
    }

    #[test]
    fn test_teardown_resets_everything() {
        let mut arena = ScratchArena::new();
        arena.write_samples(4, |out| out.fill(0.0)).unwrap();
        arena.teardown();
        assert!(arena.base().is_null());
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.used_bytes(), 0);
    }

    #[test]
    fn test_overlaps_detects_arena_ranges() {
        let mut arena = ScratchArena::new();
        arena.init(64).unwrap();
        let base = arena.base();
        assert!(arena.overlaps(base, 4));
        assert!(arena.overlaps(base.wrapping_add(60), 16));
        assert!(!arena.overlaps(base.wrapping_add(64), 4));

        let outside = [0u8; 8];
        assert!(!arena.overlaps(outside.as_ptr(), outside.len()));
    }
}
