//! Association and merging of sensor detections into the fused map.
//!
//! Split into the pure scoring primitives ([`scoring`]) and the stateful
//! engine that owns the tables and the allocation cursor ([`engine`]).

pub mod engine;
pub mod scoring;

pub use engine::FusionEngine;
pub use scoring::{match_score, nearest_valid_slot};
