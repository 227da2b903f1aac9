/*!
# Polarfuse - Two-sensor polar object fusion

Fuses object detections streamed from two angularly-offset polar range
sensors ("left" and "right") into a single unified cartesian object map,
deduplicating the same physical object seen by both units.

## Features

- Per-sensor object tables keyed by the sensor-assigned object id
- Polar to cartesian transform over per-sensor mounting calibration
- Nearest-neighbor association with a squared-distance rejection threshold
- Round-robin fused slot lifecycle under bounded capacity
- Exponential smoothing of fused attributes
- Pluggable observability via [`FusionReporter`]

## Modules

- [`fusion`] - The association engine and scoring primitives
- [`types`] - Sensor/fused record types and capacities
- [`geometry`] - The polar to cartesian transform
- [`config`] - Mounting geometry and tuning parameters
- [`reporter`] - Observability hooks
- [`stats`] - Update outcome counters
- [`errors`] - Configuration errors

## Example

```rust
use polarfuse::{FusionConfig, FusionEngine, ObjectProperties, PolarReading};

// Two sensors two meters apart, both mounted straight
let config = FusionConfig::default().with_separation(2.0);
let mut engine = FusionEngine::new(config).unwrap();

// The transport decodes sensor messages and feeds them in
engine.update_properties('l', 0, ObjectProperties {
    birth: 12.5,
    lifetime: 0.8,
    alive: 1,
    valid: 1,
    zombie: 0,
});
let slot = engine
    .update_geometry('l', 0, PolarReading {
        angle_deg: 90.0,
        dist: 1.0,
        width: 0.4,
        depth: 0.2,
    })
    .unwrap();

// The affected fused record is ready for forwarding downstream
let fused = engine.fused(slot).unwrap();
assert!(fused.is_valid());
```

The engine is synchronous and single-owner; wrap whole update calls in one
mutual-exclusion boundary if the transport delivers from multiple threads.
*/

pub mod config;
pub mod errors;
pub mod fusion;
pub mod geometry;
pub mod reporter;
pub mod stats;
pub mod types;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core engine
pub use fusion::{match_score, nearest_valid_slot, FusionEngine};

// Records and capacities
pub use types::{
    FusedObject, ObjectProperties, PolarReading, Sensor, SensorObject, SourceMask, MAP_OBJECTS,
    SENSOR_OBJECTS,
};

// Configuration
pub use config::{FusionConfig, SensorCalibration, SMOOTHING, WORST_MATCH};

// Errors
pub use errors::ConfigError;

// Observability
pub use reporter::{DebugReporter, Discard, FusionReporter, LoggingReporter, NoOpReporter};
pub use stats::FusionStats;

// Geometry
pub use geometry::polar_to_cartesian;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
