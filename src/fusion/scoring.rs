//! Match scoring and nearest-slot search
//!
//! The similarity metric between a sensor detection and a fused map entry
//! is the squared euclidean distance between their cartesian positions.
//! Smaller is better; thresholding against the rejection limit is the
//! engine's job, not the scorer's.

use nalgebra::Vector2;

use crate::types::FusedObject;

/// Squared euclidean distance between two map positions.
///
/// Deterministic, no side effects.
#[inline]
pub fn match_score(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a - b).norm_squared()
}

/// Find the valid fused slot nearest to `position`.
///
/// Scans in slot order keeping the first strict minimum, so ties resolve to
/// the earliest-indexed slot. Slots that no contributing sensor has flagged
/// valid are skipped. Returns the winning slot index and its score, or
/// `None` when no slot is valid.
pub fn nearest_valid_slot(slots: &[FusedObject], position: &Vector2<f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, slot) in slots.iter().enumerate() {
        if !slot.is_valid() {
            continue;
        }
        let score = match_score(&slot.position, position);
        match best {
            Some((_, current)) if score >= current => {}
            _ => best = Some((index, score)),
        }
    }
    best
}
