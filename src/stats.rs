//! Update outcome counters
//!
//! Malformed updates are dropped rather than surfaced as errors; these
//! counters make the drops (and the association outcomes) observable to the
//! surrounding system.

use serde::Serialize;

/// Counters accumulated across all updates processed by an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FusionStats {
    /// Updates dropped because the sensor tag was not recognized
    pub unknown_sensor: u64,
    /// Updates dropped because the object id was at or above table capacity
    pub id_out_of_range: u64,
    /// Geometry updates whose existing destination was reconfirmed
    pub reconfirmed: u64,
    /// Geometry updates matched to an existing slot by search
    pub matched: u64,
    /// Reconfirmation attempts rejected for exceeding the match threshold
    pub rejected: u64,
    /// Fused slots handed out by the allocator
    pub allocated: u64,
    /// Allocations that overwrote a populated slot
    pub evicted: u64,
}

impl FusionStats {
    /// Total number of updates silently dropped at the boundary.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.unknown_sensor + self.id_out_of_range
    }
}
