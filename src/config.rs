//! Engine configuration
//!
//! The surrounding system sets the mounting geometry and tuning parameters
//! once at startup; the engine treats them as immutable afterwards. The
//! original deployment configured mount angles in degrees on the command
//! line, so degree-based setters are provided alongside the radian fields.

use serde::Serialize;

use crate::errors::ConfigError;
use crate::types::Sensor;

/// Default squared-distance rejection threshold for association.
pub const WORST_MATCH: f64 = 0.2;

/// Default exponential smoothing retention factor.
pub const SMOOTHING: f64 = 0.7;

/// Process-wide fusion parameters.
///
/// The two sensors face each other from opposite ends of a shared baseline
/// of length `separation`, each with its own yaw offset. All angles are in
/// radians, all distances in meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionConfig {
    /// Yaw offset of the left sensor
    pub left_mount_angle: f64,
    /// Yaw offset of the right sensor
    pub right_mount_angle: f64,
    /// Baseline distance between the two sensors
    pub separation: f64,
    /// Squared-distance limit for an acceptable association; scores at or
    /// above it are rejected
    pub worst_match: f64,
    /// Fraction of the previous fused attribute retained per update
    pub smoothing: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            left_mount_angle: 0.0,
            right_mount_angle: 0.0,
            separation: 0.0,
            worst_match: WORST_MATCH,
            smoothing: SMOOTHING,
        }
    }
}

impl FusionConfig {
    /// Create a configuration with default tuning and the given geometry.
    pub fn new(left_mount_angle: f64, right_mount_angle: f64, separation: f64) -> Self {
        Self {
            left_mount_angle,
            right_mount_angle,
            separation,
            ..Self::default()
        }
    }

    /// Set both mount angles, in radians.
    pub fn with_mount_angles(mut self, left: f64, right: f64) -> Self {
        self.left_mount_angle = left;
        self.right_mount_angle = right;
        self
    }

    /// Set both mount angles, in degrees.
    pub fn with_mount_angles_deg(self, left: f64, right: f64) -> Self {
        self.with_mount_angles(left.to_radians(), right.to_radians())
    }

    /// Set the sensor baseline separation, in meters.
    pub fn with_separation(mut self, separation: f64) -> Self {
        self.separation = separation;
        self
    }

    /// Set the association rejection threshold (squared meters).
    pub fn with_worst_match(mut self, worst_match: f64) -> Self {
        self.worst_match = worst_match;
        self
    }

    /// Set the smoothing retention factor.
    ///
    /// `0.0` disables smoothing (every update overwrites); values close to
    /// `1.0` make the fused attributes very slow to follow new data.
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Check all parameters for consistency.
    ///
    /// # Errors
    /// Returns the first offending parameter as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("left_mount_angle", self.left_mount_angle),
            ("right_mount_angle", self.right_mount_angle),
            ("separation", self.separation),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }
        if !(self.worst_match.is_finite() && self.worst_match > 0.0) {
            return Err(ConfigError::InvalidMatchThreshold {
                value: self.worst_match,
            });
        }
        if !(self.smoothing >= 0.0 && self.smoothing < 1.0) {
            return Err(ConfigError::InvalidSmoothing {
                value: self.smoothing,
            });
        }
        if self.separation < 0.0 {
            return Err(ConfigError::NegativeSeparation {
                value: self.separation,
            });
        }
        Ok(())
    }

    /// Fixed mounting calibration for one sensor.
    ///
    /// The left sensor sits at `-separation/2` on the baseline with an
    /// unmirrored angular convention; the right sensor sits at
    /// `+separation/2` and reports mirrored angles.
    pub fn calibration(&self, sensor: Sensor) -> SensorCalibration {
        match sensor {
            Sensor::Left => SensorCalibration {
                mount_angle: self.left_mount_angle,
                lateral_offset: -self.separation / 2.0,
                reflect: 1.0,
            },
            Sensor::Right => SensorCalibration {
                mount_angle: self.right_mount_angle,
                lateral_offset: self.separation / 2.0,
                reflect: -1.0,
            },
        }
    }
}

/// Mounting parameters of a single sensor, consumed by the geometry
/// transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorCalibration {
    /// Yaw offset added after reflection, in radians
    pub mount_angle: f64,
    /// Signed position on the baseline, in meters
    pub lateral_offset: f64,
    /// `+1.0` for the left sensor, `-1.0` for the mirrored right sensor
    pub reflect: f64,
}
