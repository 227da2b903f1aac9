//! Observability for fusion engine execution.
//!
//! This module provides the [`FusionReporter`] trait for debugging and
//! monitoring instrumentation. Reporters receive callbacks at key points of
//! each update without polluting the association logic.
//!
//! The default [`NoOpReporter`] compiles to zero overhead; all callback
//! methods are empty and optimized away. [`DebugReporter`] captures events
//! for post-hoc assertions in tests. [`LoggingReporter`] emits `log` events,
//! replacing the verbosity flags of the original deployment with the
//! standard facade.

use nalgebra::Vector2;

use crate::types::{FusedObject, Sensor};

/// Reason an update was dropped at the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Discard {
    /// The sensor tag did not decode to a known sensor
    UnknownSensor {
        /// The offending wire tag
        tag: char,
    },
    /// The object id was at or above the sensor table capacity
    IdOutOfRange {
        /// The reporting sensor
        sensor: Sensor,
        /// The offending id
        id: usize,
    },
}

/// Observability trait for engine execution.
///
/// All methods have default empty implementations; implement only the
/// events you care about. Callbacks take `&mut self`, so reporters need no
/// interior mutability and are not required to be `Send + Sync`.
pub trait FusionReporter {
    /// Called when an update is dropped at the boundary.
    fn on_discard(&mut self, _discard: Discard) {}

    /// Called after a geometry update is transformed into the map frame.
    fn on_transform(&mut self, _sensor: Sensor, _id: usize, _position: Vector2<f64>) {}

    /// Called after a full nearest-slot search, with the best candidate
    /// found (`None` when no slot was valid). The candidate may still be
    /// rejected by the threshold.
    fn on_search(&mut self, _sensor: Sensor, _id: usize, _nearest: Option<(usize, f64)>) {}

    /// Called when an existing destination is reconfirmed.
    fn on_confirmed(&mut self, _sensor: Sensor, _id: usize, _slot: usize, _score: f64) {}

    /// Called when an existing destination fails reconfirmation and the
    /// link is severed before re-searching.
    fn on_rejected(&mut self, _sensor: Sensor, _id: usize, _slot: usize, _score: f64) {}

    /// Called when the round-robin allocator hands out a slot.
    fn on_allocated(&mut self, _slot: usize) {}

    /// Called when an allocation overwrites a populated slot.
    fn on_evicted(&mut self, _slot: usize) {}

    /// Called after the sensor object is merged into its fused slot.
    fn on_merged(&mut self, _sensor: Sensor, _id: usize, _slot: usize, _fused: &FusedObject) {}
}

// ============================================================================
// NoOpReporter
// ============================================================================

/// Zero-cost reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl NoOpReporter {
    /// Create a new no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl FusionReporter for NoOpReporter {
    // All methods use default empty implementations
}

// ============================================================================
// DebugReporter
// ============================================================================

/// Reporter that captures all events for post-hoc inspection.
///
/// Stores copies of everything passed to callbacks; intended for tests and
/// offline analysis, not long production runs.
#[derive(Debug, Clone, Default)]
pub struct DebugReporter {
    discards: Vec<Discard>,
    transforms: Vec<(Sensor, usize, Vector2<f64>)>,
    searches: Vec<(Sensor, usize, Option<(usize, f64)>)>,
    confirmations: Vec<(Sensor, usize, usize, f64)>,
    rejections: Vec<(Sensor, usize, usize, f64)>,
    allocations: Vec<usize>,
    evictions: Vec<usize>,
    merges: Vec<(Sensor, usize, usize, FusedObject)>,
}

impl DebugReporter {
    /// Create a new empty debug reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// All boundary discards seen so far.
    pub fn discards(&self) -> &[Discard] {
        &self.discards
    }

    /// All transform events: (sensor, id, map position).
    pub fn transforms(&self) -> &[(Sensor, usize, Vector2<f64>)] {
        &self.transforms
    }

    /// All search events: (sensor, id, best candidate).
    pub fn searches(&self) -> &[(Sensor, usize, Option<(usize, f64)>)] {
        &self.searches
    }

    /// All reconfirmations: (sensor, id, slot, score).
    pub fn confirmations(&self) -> &[(Sensor, usize, usize, f64)] {
        &self.confirmations
    }

    /// All rejected reconfirmations: (sensor, id, slot, score).
    pub fn rejections(&self) -> &[(Sensor, usize, usize, f64)] {
        &self.rejections
    }

    /// Slots handed out by the allocator, in order.
    pub fn allocations(&self) -> &[usize] {
        &self.allocations
    }

    /// Slots whose occupant was evicted, in order.
    pub fn evictions(&self) -> &[usize] {
        &self.evictions
    }

    /// All merges: (sensor, id, slot, fused record after the merge).
    pub fn merges(&self) -> &[(Sensor, usize, usize, FusedObject)] {
        &self.merges
    }

    /// Drop all captured events.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl FusionReporter for DebugReporter {
    fn on_discard(&mut self, discard: Discard) {
        self.discards.push(discard);
    }

    fn on_transform(&mut self, sensor: Sensor, id: usize, position: Vector2<f64>) {
        self.transforms.push((sensor, id, position));
    }

    fn on_search(&mut self, sensor: Sensor, id: usize, nearest: Option<(usize, f64)>) {
        self.searches.push((sensor, id, nearest));
    }

    fn on_confirmed(&mut self, sensor: Sensor, id: usize, slot: usize, score: f64) {
        self.confirmations.push((sensor, id, slot, score));
    }

    fn on_rejected(&mut self, sensor: Sensor, id: usize, slot: usize, score: f64) {
        self.rejections.push((sensor, id, slot, score));
    }

    fn on_allocated(&mut self, slot: usize) {
        self.allocations.push(slot);
    }

    fn on_evicted(&mut self, slot: usize) {
        self.evictions.push(slot);
    }

    fn on_merged(&mut self, sensor: Sensor, id: usize, slot: usize, fused: &FusedObject) {
        self.merges.push((sensor, id, slot, *fused));
    }
}

// ============================================================================
// LoggingReporter
// ============================================================================

/// Reporter that emits engine events through the `log` facade.
///
/// Per-update noise (transforms, searches, merges) goes to `trace`;
/// lifecycle events (allocations, evictions, rejections, discards) go to
/// `debug`. Pair with any `log` backend the host process already uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingReporter;

impl LoggingReporter {
    /// Create a new logging reporter.
    pub fn new() -> Self {
        Self
    }
}

impl FusionReporter for LoggingReporter {
    fn on_discard(&mut self, discard: Discard) {
        match discard {
            Discard::UnknownSensor { tag } => {
                log::debug!("dropping update from unknown sensor tag {:?}", tag);
            }
            Discard::IdOutOfRange { sensor, id } => {
                log::debug!(
                    "dropping update from sensor {:?} with out-of-range id {}",
                    sensor,
                    id
                );
            }
        }
    }

    fn on_transform(&mut self, sensor: Sensor, id: usize, position: Vector2<f64>) {
        log::trace!(
            "object {}/{} at x {:.3} y {:.3}",
            sensor.tag(),
            id,
            position.x,
            position.y
        );
    }

    fn on_search(&mut self, sensor: Sensor, id: usize, nearest: Option<(usize, f64)>) {
        match nearest {
            Some((slot, score)) => log::trace!(
                "search for {}/{}: nearest slot {} at {:.4}",
                sensor.tag(),
                id,
                slot,
                score
            ),
            None => log::trace!("search for {}/{}: no valid slot", sensor.tag(), id),
        }
    }

    fn on_confirmed(&mut self, sensor: Sensor, id: usize, slot: usize, score: f64) {
        log::trace!(
            "match confirmed for {}/{} on slot {} at {:.4}",
            sensor.tag(),
            id,
            slot,
            score
        );
    }

    fn on_rejected(&mut self, sensor: Sensor, id: usize, slot: usize, score: f64) {
        log::debug!(
            "match not confirmed for {}/{} on slot {} at {:.4}",
            sensor.tag(),
            id,
            slot,
            score
        );
    }

    fn on_allocated(&mut self, slot: usize) {
        log::debug!("new slot {}", slot);
    }

    fn on_evicted(&mut self, slot: usize) {
        log::debug!("evicting occupant of slot {}", slot);
    }

    fn on_merged(&mut self, sensor: Sensor, id: usize, slot: usize, fused: &FusedObject) {
        log::trace!(
            "merged {}/{} into slot {}: x {:.3} y {:.3} sources {:?}",
            sensor.tag(),
            id,
            slot,
            fused.position.x,
            fused.position.y,
            fused.sources
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_reporter_ignores_everything() {
        let mut reporter = NoOpReporter::new();
        reporter.on_allocated(0);
        reporter.on_discard(Discard::UnknownSensor { tag: 'x' });
    }

    #[test]
    fn test_debug_reporter_captures_events() {
        let mut reporter = DebugReporter::new();

        reporter.on_discard(Discard::UnknownSensor { tag: 'x' });
        reporter.on_allocated(3);
        reporter.on_evicted(3);
        reporter.on_confirmed(Sensor::Left, 2, 1, 0.05);

        assert_eq!(reporter.discards().len(), 1);
        assert_eq!(reporter.allocations(), &[3]);
        assert_eq!(reporter.evictions(), &[3]);
        assert_eq!(reporter.confirmations(), &[(Sensor::Left, 2, 1, 0.05)]);

        reporter.clear();
        assert!(reporter.allocations().is_empty());
    }
}
