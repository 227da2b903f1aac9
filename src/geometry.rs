//! Polar to cartesian coordinate transform
//!
//! Each sensor reports detections in its own polar frame: a bearing and a
//! range, with the bearing convention mirrored between the two units. This
//! module unifies both into one cartesian frame centered on the midpoint of
//! the sensor baseline, with x running along the baseline.
//!
//! The transform first shifts the bearing so that the sensor boresight
//! (90 degrees in sensor terms) maps to zero, applies the sensor's mirror
//! direction and mount yaw, then projects the range onto the baseline (x,
//! offset by the sensor's position) and its normal (y).

use nalgebra::Vector2;
use std::f64::consts::FRAC_PI_2;

use crate::config::SensorCalibration;

/// Transform one polar detection into the shared cartesian map frame.
///
/// # Arguments
/// * `angle` - Reported bearing in radians, in the sensor's own convention
/// * `dist` - Reported range in meters
/// * `calibration` - The reporting sensor's fixed mounting parameters
///
/// # Returns
/// Position in the shared map frame, meters.
///
/// Pure function of its inputs; no error conditions.
pub fn polar_to_cartesian(angle: f64, dist: f64, calibration: &SensorCalibration) -> Vector2<f64> {
    let effective = calibration.reflect * (angle - FRAC_PI_2) + calibration.mount_angle;
    Vector2::new(
        calibration.lateral_offset + calibration.reflect * effective.cos() * dist,
        effective.sin() * dist,
    )
}
