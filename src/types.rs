//! Core record types for the fusion engine
//!
//! This module defines the per-sensor object records, the fused map records,
//! and the small tag/bitmask types that link them. Cross-references between
//! the tables are plain indices, so severing a link is a matter of writing
//! `None` and can never dangle.

use nalgebra::Vector2;
use serde::Serialize;

/// Capacity of each per-sensor object table.
///
/// Sensors address their objects with small integer ids; ids at or above
/// this bound are discarded at the entry points.
pub const SENSOR_OBJECTS: usize = 20;

/// Capacity of the fused output map.
pub const MAP_OBJECTS: usize = 8;

// ============================================================================
// Sensor tag and source bitmask
// ============================================================================

/// Identifies one of the two physical sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sensor {
    /// The left-hand sensor (negative lateral offset, unmirrored angles)
    Left,
    /// The right-hand sensor (positive lateral offset, mirrored angles)
    Right,
}

impl Sensor {
    /// Decode the single-character wire tag used by the transport.
    ///
    /// Returns `None` for unrecognized tags; callers count and drop those.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'l' => Some(Sensor::Left),
            'r' => Some(Sensor::Right),
            _ => None,
        }
    }

    /// The wire tag for this sensor.
    #[inline]
    pub fn tag(self) -> char {
        match self {
            Sensor::Left => 'l',
            Sensor::Right => 'r',
        }
    }

    /// The source bit contributed by this sensor when merged into a fused record.
    #[inline]
    pub fn mask(self) -> SourceMask {
        match self {
            Sensor::Left => SourceMask::LEFT,
            Sensor::Right => SourceMask::RIGHT,
        }
    }
}

/// Bitmask labelling which sources back a fused record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceMask(pub u8);

impl SourceMask {
    /// No contributing source
    pub const NONE: SourceMask = SourceMask(0);
    /// Left sensor contributes
    pub const LEFT: SourceMask = SourceMask(1);
    /// Right sensor contributes
    pub const RIGHT: SourceMask = SourceMask(2);
    /// Reserved for extrapolated entries with no current detection
    pub const ESTIMATE: SourceMask = SourceMask(4);

    /// True if no source bit is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: SourceMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Clear the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: SourceMask) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for SourceMask {
    type Output = SourceMask;

    #[inline]
    fn bitor(self, rhs: SourceMask) -> SourceMask {
        SourceMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SourceMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: SourceMask) {
        self.0 |= rhs.0;
    }
}

// ============================================================================
// Wire-side argument bundles
// ============================================================================

/// Lifecycle metadata reported by a sensor for one of its objects.
///
/// All fields are opaque to the engine apart from propagation into the
/// fused record: `birth`/`lifetime` overwrite, `alive`/`valid` merge by
/// bitwise-OR. `zombie` is retained on the sensor record only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectProperties {
    /// Sensor-reported birth timestamp
    pub birth: f64,
    /// Sensor-reported lifetime
    pub lifetime: f64,
    /// Liveness flag
    pub alive: i32,
    /// Validity flag; fused slots only participate in matching once valid
    pub valid: i32,
    /// Reported but otherwise unused
    pub zombie: i32,
}

/// One polar-geometry observation reported by a sensor.
///
/// Angles arrive in degrees, matching the sensor wire format; the engine
/// converts to radians before transforming.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarReading {
    /// Bearing in degrees, in the sensor's own angular convention
    pub angle_deg: f64,
    /// Range in meters
    pub dist: f64,
    /// Extent normal to the angular radius, in meters
    pub width: f64,
    /// Extent parallel to the angular radius, in meters
    pub depth: f64,
}

// ============================================================================
// Table records
// ============================================================================

/// Latest known state of one object as reported by a single sensor.
///
/// One record exists per (sensor, object-id) slot; updates for an id
/// overwrite the slot in place. Records are never freed independently.
#[derive(Debug, Clone, Copy)]
pub struct SensorObject {
    /// Source bit of the producing sensor, set on every update
    pub source: SourceMask,
    /// Sensor-reported birth timestamp
    pub birth: f64,
    /// Sensor-reported lifetime
    pub lifetime: f64,
    /// Liveness flag
    pub alive: i32,
    /// Validity flag
    pub valid: i32,
    /// Reported but otherwise unused
    pub zombie: i32,
    /// Latest reported bearing in radians
    pub angle: f64,
    /// Latest reported range in meters
    pub dist: f64,
    /// Extent normal to the angular radius
    pub width: f64,
    /// Extent parallel to the angular radius
    pub depth: f64,
    /// Cartesian position in the shared map frame, derived from the polar
    /// fields by the geometry transform
    pub position: Vector2<f64>,
    /// Squared-distance score of the most recent association attempt
    pub match_score: f64,
    /// Fused slot this object is currently mapped to.
    ///
    /// Maintained bidirectionally with the slot's same-sensor source link;
    /// severed when the slot is erased or the link is taken over.
    pub dest: Option<usize>,
}

impl Default for SensorObject {
    fn default() -> Self {
        Self {
            source: SourceMask::NONE,
            birth: 0.0,
            lifetime: 0.0,
            alive: 0,
            valid: 0,
            zombie: 0,
            angle: 0.0,
            dist: 0.0,
            width: 0.0,
            depth: 0.0,
            position: Vector2::zeros(),
            match_score: 0.0,
            dest: None,
        }
    }
}

/// One entry of the unified output map.
///
/// Represents a single physical object, backed by detections from one or
/// both sensors. Attributes are exponentially smoothed across updates.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FusedObject {
    /// Which sensors currently contribute
    pub sources: SourceMask,
    /// Back-reference to the contributing left-sensor object id
    pub source_left: Option<usize>,
    /// Back-reference to the contributing right-sensor object id
    pub source_right: Option<usize>,
    /// Last-written birth timestamp
    pub birth: f64,
    /// Last-written lifetime
    pub lifetime: f64,
    /// OR of contributing liveness flags
    pub alive: i32,
    /// OR of contributing validity flags
    pub valid: i32,
    /// Smoothed cartesian position
    pub position: Vector2<f64>,
    /// Smoothed width
    pub width: f64,
    /// Smoothed depth
    pub depth: f64,
}

impl Default for FusedObject {
    fn default() -> Self {
        Self {
            sources: SourceMask::NONE,
            source_left: None,
            source_right: None,
            birth: 0.0,
            lifetime: 0.0,
            alive: 0,
            valid: 0,
            position: Vector2::zeros(),
            width: 0.0,
            depth: 0.0,
        }
    }
}

impl FusedObject {
    /// A slot participates in nearest-neighbor search only once a
    /// contributing sensor has flagged it valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid != 0
    }

    /// The back-reference for the given sensor.
    #[inline]
    pub fn source_link(&self, sensor: Sensor) -> Option<usize> {
        match sensor {
            Sensor::Left => self.source_left,
            Sensor::Right => self.source_right,
        }
    }

    /// Set the back-reference for the given sensor.
    #[inline]
    pub fn set_source_link(&mut self, sensor: Sensor, id: Option<usize>) {
        match sensor {
            Sensor::Left => self.source_left = id,
            Sensor::Right => self.source_right = id,
        }
    }
}
