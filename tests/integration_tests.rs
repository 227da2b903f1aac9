//! End-to-end tests for the fusion engine
//!
//! Drives the engine exclusively through the two wire-facing entry points,
//! the way the transport layer does, and checks the externally observable
//! behavior: transform geometry, association decisions, slot lifecycle,
//! smoothing and the discard boundary.

use polarfuse::{
    DebugReporter, FusionConfig, FusionEngine, ObjectProperties, PolarReading, Sensor, SourceMask,
    MAP_OBJECTS,
};

const EPS: f64 = 1e-9;

fn valid_props() -> ObjectProperties {
    ObjectProperties {
        birth: 1.0,
        lifetime: 0.5,
        alive: 1,
        valid: 1,
        zombie: 0,
    }
}

/// A reading straight along the boresight; with zero mounting geometry it
/// lands at (dist, 0) in the map frame.
fn ahead(dist: f64) -> PolarReading {
    PolarReading {
        angle_deg: 90.0,
        dist,
        width: 0.6,
        depth: 0.3,
    }
}

/// The left-sensor reading that lands on the given map position.
fn left_reading_for(config: &FusionConfig, x: f64, y: f64) -> PolarReading {
    let dx = x + config.separation / 2.0;
    let effective = y.atan2(dx);
    PolarReading {
        angle_deg: effective.to_degrees() + 90.0,
        dist: (dx * dx + y * y).sqrt(),
        width: 0.6,
        depth: 0.3,
    }
}

/// The right-sensor reading that lands on the given map position.
fn right_reading_for(config: &FusionConfig, x: f64, y: f64) -> PolarReading {
    let dx = config.separation / 2.0 - x;
    let effective = y.atan2(dx);
    PolarReading {
        angle_deg: 90.0 - effective.to_degrees(),
        dist: (dx * dx + y * y).sqrt(),
        width: 0.6,
        depth: 0.3,
    }
}

// ============================================================================
// Geometry through the wire boundary
// ============================================================================

#[test]
fn test_transform_through_entry_point() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();

    // Boresight projects onto the baseline axis
    engine.update_geometry('l', 0, ahead(5.0));
    let object = engine.sensor_object(Sensor::Left, 0).unwrap();
    assert!((object.position.x - 5.0).abs() < EPS);
    assert!(object.position.y.abs() < EPS);
    // Degrees were converted before storing
    assert!((object.angle - std::f64::consts::FRAC_PI_2).abs() < EPS);

    // A quarter turn past boresight projects onto the normal
    engine.update_geometry('l', 1, PolarReading {
        angle_deg: 180.0,
        dist: 5.0,
        ..ahead(5.0)
    });
    let object = engine.sensor_object(Sensor::Left, 1).unwrap();
    assert!(object.position.x.abs() < EPS);
    assert!((object.position.y - 5.0).abs() < EPS);
}

#[test]
fn test_left_right_symmetry() {
    let config = FusionConfig::default().with_separation(2.0);
    let mut engine = FusionEngine::new(config).unwrap();

    // Equal bearing offsets from the two boresights, equal range
    engine.update_geometry('l', 0, PolarReading {
        angle_deg: 110.0,
        dist: 5.0,
        ..ahead(5.0)
    });
    engine.update_geometry('r', 0, PolarReading {
        angle_deg: 70.0,
        dist: 5.0,
        ..ahead(5.0)
    });

    let left = engine.sensor_object(Sensor::Left, 0).unwrap().position;
    let right = engine.sensor_object(Sensor::Right, 0).unwrap().position;
    assert!((left.x + right.x).abs() < EPS, "mirrored about x=0");
    assert!((left.y - right.y).abs() < EPS, "same height");
}

// ============================================================================
// Association decisions
// ============================================================================

#[test]
fn test_matching_idempotence() {
    let reporter = DebugReporter::new();
    let mut engine = FusionEngine::with_reporter(FusionConfig::default(), reporter).unwrap();

    engine.update_properties('l', 0, valid_props());
    let first = engine.update_geometry('l', 0, ahead(5.0)).unwrap();
    let second = engine.update_geometry('l', 0, ahead(5.0)).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.stats().allocated, 1);
    assert_eq!(engine.stats().reconfirmed, 1);

    // The repeated update re-scored its destination at exactly zero
    let confirmations = engine.reporter().confirmations();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].3, 0.0);
    assert_eq!(
        engine.sensor_object(Sensor::Left, 0).unwrap().match_score,
        0.0
    );
}

#[test]
fn test_score_below_threshold_is_accepted() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();
    engine.update_properties('l', 0, valid_props());
    engine.update_properties('l', 1, valid_props());

    engine.update_geometry('l', 0, ahead(10.0));
    // 0.44 apart: squared distance 0.1936, under the 0.2 default
    let slot = engine.update_geometry('l', 1, ahead(10.44)).unwrap();

    assert_eq!(slot, 0);
    assert_eq!(engine.stats().matched, 1);
    assert_eq!(engine.stats().allocated, 1);
}

#[test]
fn test_score_above_threshold_is_rejected() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();
    engine.update_properties('l', 0, valid_props());
    engine.update_properties('l', 1, valid_props());

    engine.update_geometry('l', 0, ahead(10.0));
    // 0.45 apart: squared distance 0.2025, over the 0.2 default
    let slot = engine.update_geometry('l', 1, ahead(10.45)).unwrap();

    assert_eq!(slot, 1);
    assert_eq!(engine.stats().matched, 0);
    assert_eq!(engine.stats().allocated, 2);
}

#[test]
fn test_score_exactly_at_threshold_is_rejected() {
    // 0.25 and a 0.5 meter gap are exactly representable, making the
    // boundary comparison exact
    let config = FusionConfig::default().with_worst_match(0.25);
    let mut engine = FusionEngine::new(config).unwrap();
    engine.update_properties('l', 0, valid_props());
    engine.update_properties('l', 1, valid_props());

    engine.update_geometry('l', 0, ahead(10.0));
    let slot = engine.update_geometry('l', 1, ahead(10.5)).unwrap();

    assert_eq!(slot, 1, "a score equal to the threshold is not a match");
    assert_eq!(engine.stats().allocated, 2);
}

// ============================================================================
// Slot lifecycle
// ============================================================================

#[test]
fn test_round_robin_wraparound() {
    let reporter = DebugReporter::new();
    let mut engine = FusionEngine::with_reporter(FusionConfig::default(), reporter).unwrap();

    // Nine mutually distant objects through an eight-slot map
    for id in 0..=MAP_OBJECTS {
        engine.update_properties('l', id, valid_props());
        engine.update_geometry('l', id, ahead(10.0 * (id + 1) as f64));
    }

    assert_eq!(engine.stats().allocated, (MAP_OBJECTS + 1) as u64);
    assert_eq!(engine.stats().evicted, 1);
    assert_eq!(engine.reporter().evictions(), &[0]);

    // The ninth allocation wrapped to slot 0
    let ninth = engine.sensor_object(Sensor::Left, MAP_OBJECTS).unwrap();
    assert_eq!(ninth.dest, Some(0));
    assert_eq!(engine.fused(0).unwrap().source_left, Some(MAP_OBJECTS));

    // The evicted owner observes the severed back-reference
    assert_eq!(engine.sensor_object(Sensor::Left, 0).unwrap().dest, None);
}

#[test]
fn test_eviction_clears_prior_contents() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();

    for id in 0..=MAP_OBJECTS {
        engine.update_properties('l', id, valid_props());
        engine.update_geometry('l', id, ahead(10.0 * (id + 1) as f64));
    }

    // Slot 0 now belongs to the wrapped-around ninth object alone
    let fused = engine.fused(0).unwrap();
    assert_eq!(fused.sources, SourceMask::LEFT);
    assert_eq!(fused.source_left, Some(MAP_OBJECTS));
    assert_eq!(fused.source_right, None);
    let expected = 10.0 * (MAP_OBJECTS + 1) as f64;
    assert!((fused.position.x - expected).abs() < EPS, "no blend against the evicted occupant");
}

// ============================================================================
// Smoothing
// ============================================================================

#[test]
fn test_smoothing_convergence_law() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();
    engine.update_properties('l', 0, valid_props());

    // Fused position initializes at the first sample
    engine.update_geometry('l', 0, ahead(10.0));

    // Repeated updates at a fixed true position contract the error by the
    // retention factor each time
    let target = 10.4;
    let mut expected_error = 0.4;
    for _ in 0..10 {
        engine.update_geometry('l', 0, ahead(target));
        expected_error *= 0.7;
        let fused = engine.fused(0).unwrap();
        assert!(((target - fused.position.x).abs() - expected_error).abs() < EPS);
    }
}

#[test]
fn test_smoothing_applies_to_extents() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();
    engine.update_properties('l', 0, valid_props());

    engine.update_geometry('l', 0, PolarReading {
        width: 1.0,
        depth: 2.0,
        ..ahead(10.0)
    });
    engine.update_geometry('l', 0, PolarReading {
        width: 2.0,
        depth: 1.0,
        ..ahead(10.0)
    });

    let fused = engine.fused(0).unwrap();
    assert!((fused.width - (0.7 * 1.0 + 0.3 * 2.0)).abs() < EPS);
    assert!((fused.depth - (0.7 * 2.0 + 0.3 * 1.0)).abs() < EPS);
}

// ============================================================================
// Two-sensor fusion
// ============================================================================

#[test]
fn test_bitmask_merge_across_sensors() {
    let config = FusionConfig::default().with_separation(2.0);
    let mut engine = FusionEngine::new(config.clone()).unwrap();

    engine.update_properties('l', 0, valid_props());
    engine.update_properties('r', 0, valid_props());

    // Both sensors report the same physical point
    let slot_left = engine
        .update_geometry('l', 0, left_reading_for(&config, 0.0, 1.0))
        .unwrap();
    let fused = engine.fused(slot_left).unwrap();
    assert_eq!(fused.sources, SourceMask::LEFT);

    let slot_right = engine
        .update_geometry('r', 0, right_reading_for(&config, 0.0, 1.0))
        .unwrap();
    assert_eq!(slot_left, slot_right, "deduplicated into one fused object");

    let fused = engine.fused(slot_right).unwrap();
    assert_eq!(fused.sources, SourceMask::LEFT | SourceMask::RIGHT);
    assert_eq!(fused.source_left, Some(0));
    assert_eq!(fused.source_right, Some(0));
    assert_eq!(engine.stats().matched, 1);
    assert_eq!(engine.stats().allocated, 1);
}

#[test]
fn test_two_objects_seen_by_both_sensors() {
    let config = FusionConfig::default().with_separation(2.0);
    let mut engine = FusionEngine::new(config.clone()).unwrap();

    let a = (0.3, 1.5);
    let b = (-0.4, 2.5);

    for id in 0..2 {
        engine.update_properties('l', id, valid_props());
        engine.update_properties('r', id, valid_props());
    }
    engine.update_geometry('l', 0, left_reading_for(&config, a.0, a.1));
    engine.update_geometry('l', 1, left_reading_for(&config, b.0, b.1));
    engine.update_geometry('r', 0, right_reading_for(&config, a.0, a.1));
    engine.update_geometry('r', 1, right_reading_for(&config, b.0, b.1));

    let populated: Vec<_> = engine.valid_fused().collect();
    assert_eq!(populated.len(), 2, "two physical objects, two fused slots");
    for (_, fused) in populated {
        assert_eq!(fused.sources, SourceMask::LEFT | SourceMask::RIGHT);
    }

    let slot_a = engine.sensor_object(Sensor::Left, 0).unwrap().dest.unwrap();
    let fused_a = engine.fused(slot_a).unwrap();
    assert!((fused_a.position.x - a.0).abs() < 1e-6);
    assert!((fused_a.position.y - a.1).abs() < 1e-6);
}

#[test]
fn test_lifecycle_fields_merge() {
    let config = FusionConfig::default().with_separation(2.0);
    let mut engine = FusionEngine::new(config.clone()).unwrap();

    engine.update_properties('l', 0, ObjectProperties {
        birth: 1.0,
        lifetime: 10.0,
        alive: 1,
        valid: 1,
        zombie: 0,
    });
    engine.update_properties('r', 0, ObjectProperties {
        birth: 2.0,
        lifetime: 20.0,
        alive: 2,
        valid: 4,
        zombie: 0,
    });

    engine.update_geometry('l', 0, left_reading_for(&config, 0.0, 1.0));
    let slot = engine
        .update_geometry('r', 0, right_reading_for(&config, 0.0, 1.0))
        .unwrap();

    let fused = engine.fused(slot).unwrap();
    // Timestamps are last-write-wins, flags merge by OR
    assert_eq!(fused.birth, 2.0);
    assert_eq!(fused.lifetime, 20.0);
    assert_eq!(fused.alive, 1 | 2);
    assert_eq!(fused.valid, 1 | 4);
}

// ============================================================================
// Boundary discards
// ============================================================================

#[test]
fn test_invalid_inputs_leave_tables_unchanged() {
    let reporter = DebugReporter::new();
    let mut engine = FusionEngine::with_reporter(FusionConfig::default(), reporter).unwrap();

    engine.update_properties('z', 0, valid_props());
    engine.update_properties('l', 20, valid_props());
    assert_eq!(engine.update_geometry('z', 0, ahead(5.0)), None);
    assert_eq!(engine.update_geometry('l', 20, ahead(5.0)), None);
    assert_eq!(engine.update_geometry('r', 1000, ahead(5.0)), None);

    assert_eq!(engine.stats().unknown_sensor, 2);
    assert_eq!(engine.stats().id_out_of_range, 3);
    assert_eq!(engine.stats().discarded(), 5);
    assert_eq!(engine.stats().allocated, 0);
    assert_eq!(engine.reporter().discards().len(), 5);

    // Nothing reached the tables
    assert_eq!(engine.valid_fused().count(), 0);
    for sensor in [Sensor::Left, Sensor::Right] {
        for id in 0..20 {
            let object = engine.sensor_object(sensor, id).unwrap();
            assert_eq!(object.valid, 0);
            assert_eq!(object.dest, None);
            assert_eq!(object.source, SourceMask::NONE);
        }
    }
}

// ============================================================================
// Outbound boundary
// ============================================================================

#[test]
fn test_fused_record_serializes_for_forwarding() {
    let mut engine = FusionEngine::new(FusionConfig::default()).unwrap();
    engine.update_properties('l', 0, valid_props());
    let slot = engine.update_geometry('l', 0, ahead(5.0)).unwrap();

    let value = serde_json::to_value(engine.fused(slot).unwrap()).unwrap();
    assert_eq!(value["sources"], 1);
    assert_eq!(value["valid"], 1);
    assert_eq!(value["width"], 0.6);
    assert!(value.get("position").is_some());

    let stats = serde_json::to_value(engine.stats()).unwrap();
    assert_eq!(stats["allocated"], 1);

    let config = serde_json::to_value(engine.config()).unwrap();
    assert_eq!(config["worst_match"], 0.2);
}
