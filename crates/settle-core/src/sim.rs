//! Per-tick report and the determinism hash.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Tick report
// ---------------------------------------------------------------------------

/// Summary of what one `Engine::tick()` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Turn counter after the tick.
    pub turn: Ticks,
    /// Total units credited to extractor buffers.
    pub extracted: Fixed64,
    /// Extractors that could not take their full yield.
    pub extractors_blocked: u32,
    pub cycles_started: u32,
    pub cycles_completed: u32,
    /// Recipe inputs deducted by cycles that started this tick.
    pub consumed: Fixed64,
    /// Recipe outputs released by cycles that completed this tick.
    pub produced: Fixed64,
    /// Overflow drains into neighboring storage.
    pub overflow_drains: u32,
    /// Total units moved along connections.
    pub transported: Fixed64,
    /// -1, 0 or +1.
    pub population_change: i32,
    /// True only on the tick the win condition was first met.
    pub won_this_tick: bool,
    pub state_hash: u64,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for desync detection.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_is_offset_basis() {
        assert_eq!(StateHash::new().finish(), 0xcbf29ce484222325);
    }

    #[test]
    fn same_input_same_hash() {
        let mut a = StateHash::new();
        let mut b = StateHash::new();
        a.write_u64(7);
        a.write_fixed64(Fixed64::from_num(1.5));
        b.write_u64(7);
        b.write_fixed64(Fixed64::from_num(1.5));
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn order_matters() {
        let mut a = StateHash::new();
        let mut b = StateHash::new();
        a.write_u32(1);
        a.write_u32(2);
        b.write_u32(2);
        b.write_u32(1);
        assert_ne!(a.finish(), b.finish());
    }
}
