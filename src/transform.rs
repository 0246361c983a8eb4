//! Pure per-frame pose math: axis remapping, child-frame twist rotation,
//! confidence-scaled covariance.
//!
//! The sensor's native frame maps onto the output convention by a fixed
//! permutation/negation:
//!
//! ```text
//! out.x = -native.z    out.y = -native.x    out.z = native.y
//! ```
//!
//! The same remap applies to the orientation quaternion's vector part (w is
//! kept) and to both velocity vectors, which are then rotated into the child
//! frame via the conjugate of the output orientation.

use crate::types::{PoseSample, TrackerConfidence};

/// Result of transforming one native pose sample.
#[derive(Debug, Clone, Copy)]
pub struct TransformedPose {
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    /// Linear velocity expressed in the child frame.
    pub linear_velocity: [f64; 3],
    /// Angular velocity expressed in the child frame.
    pub angular_velocity: [f64; 3],
    pub pose_covariance: [f64; 36],
    pub twist_covariance: [f64; 36],
}

/// Remap a native-frame vector into the output frame convention.
pub fn remap_position(v: [f64; 3]) -> [f64; 3] {
    [-v[2], -v[0], v[1]]
}

/// Remap a native-frame quaternion [qx, qy, qz, qw] into the output frame.
pub fn remap_orientation(q: [f64; 4]) -> [f64; 4] {
    [-q[2], -q[0], q[1], q[3]]
}

/// Quaternion conjugate (inverse for unit quaternions).
pub fn conjugate(q: [f64; 4]) -> [f64; 4] {
    [-q[0], -q[1], -q[2], q[3]]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Rotate a vector by a quaternion: v' = v + 2w(u x v) + 2(u x (u x v)).
pub fn rotate(q: [f64; 4], v: [f64; 3]) -> [f64; 3] {
    let u = [q[0], q[1], q[2]];
    let w = q[3];
    let uv = cross(u, v);
    let uuv = cross(u, uv);
    [
        v[0] + 2.0 * (w * uv[0] + uuv[0]),
        v[1] + 2.0 * (w * uv[1] + uuv[1]),
        v[2] + 2.0 * (w * uv[2] + uuv[2]),
    ]
}

/// Express an output-frame vector in the child frame whose orientation is
/// `orientation`, by rotating with the conjugate quaternion.
pub fn rotate_into_child(orientation: [f64; 4], v: [f64; 3]) -> [f64; 3] {
    rotate(conjugate(orientation), v)
}

/// Pose covariance scalar: base * 10^(3 - confidence).
///
/// High confidence (3) yields the base scale; each lower level inflates the
/// uncertainty by an order of magnitude so fusion filters discount the
/// sample quickly.
pub fn pose_cov_scale(base: f64, confidence: TrackerConfidence) -> f64 {
    base * 10f64.powi(3 - confidence.level())
}

/// Twist covariance scalar: base * 10^(1 - confidence).
pub fn twist_cov_scale(base: f64, confidence: TrackerConfidence) -> f64 {
    base * 10f64.powi(1 - confidence.level())
}

/// Row-major 6x6 diagonal covariance: `position` on the first three diagonal
/// entries, `rotation` on the last three, zero elsewhere.
pub fn diagonal_covariance(position: f64, rotation: f64) -> [f64; 36] {
    let mut m = [0.0; 36];
    for i in 0..3 {
        m[i * 6 + i] = position;
    }
    for i in 3..6 {
        m[i * 6 + i] = rotation;
    }
    m
}

/// Transform one native pose sample into the output frame convention.
///
/// Stateless: identical input always produces identical output.
pub fn transform(
    sample: &PoseSample,
    position_cov_base: f64,
    rotation_cov_base: f64,
) -> TransformedPose {
    let position = remap_position(sample.translation);
    let orientation = remap_orientation(sample.rotation);
    let linear_velocity = rotate_into_child(orientation, remap_position(sample.velocity));
    let angular_velocity =
        rotate_into_child(orientation, remap_position(sample.angular_velocity));

    let cov_pose = pose_cov_scale(position_cov_base, sample.confidence);
    let cov_twist = twist_cov_scale(rotation_cov_base, sample.confidence);
    let covariance = diagonal_covariance(cov_pose, cov_twist);

    TransformedPose {
        position,
        orientation,
        linear_velocity,
        angular_velocity,
        pose_covariance: covariance,
        twist_covariance: covariance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(
        translation: [f64; 3],
        rotation: [f64; 4],
        confidence: TrackerConfidence,
    ) -> PoseSample {
        PoseSample {
            timestamp_us: 0,
            translation,
            rotation,
            velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            confidence,
        }
    }

    #[test]
    fn remap_is_fixed_permutation() {
        assert_eq!(remap_position([1.0, 2.0, 3.0]), [-3.0, -1.0, 2.0]);
        assert_eq!(
            remap_orientation([0.0, 0.0, 0.0, 1.0]),
            [0.0, -0.0, 0.0, 1.0]
        );
        // Quaternion vector part follows the same permutation.
        assert_eq!(
            remap_orientation([0.1, 0.2, 0.3, 0.9]),
            [-0.3, -0.1, 0.2, 0.9]
        );
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        // 90 degrees about +z maps +x to +y.
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let q = [0.0, 0.0, half, half];
        let v = rotate(q, [1.0, 0.0, 0.0]);
        assert!((v[0]).abs() < 1e-12);
        assert!((v[1] - 1.0).abs() < 1e-12);
        assert!((v[2]).abs() < 1e-12);
        // The conjugate undoes it.
        let back = rotate(conjugate(q), v);
        assert!((back[0] - 1.0).abs() < 1e-12);
        assert!((back[1]).abs() < 1e-12);
    }

    #[test]
    fn child_frame_velocity_uses_conjugate() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let orientation = [0.0, 0.0, half, half];
        // A world +y velocity seen from a frame rotated 90 deg about z is +x.
        let v = rotate_into_child(orientation, [0.0, 1.0, 0.0]);
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[1]).abs() < 1e-12);
    }

    #[test]
    fn covariance_scaling_over_all_confidence_levels() {
        let levels = [
            TrackerConfidence::Failed,
            TrackerConfidence::Low,
            TrackerConfidence::Medium,
            TrackerConfidence::High,
        ];
        let expected_pose = [100.0, 10.0, 1.0, 0.1];
        let expected_twist = [2.0, 0.2, 0.02, 0.002];
        for (i, &conf) in levels.iter().enumerate() {
            assert!((pose_cov_scale(0.1, conf) - expected_pose[i]).abs() < 1e-12);
            assert!((twist_cov_scale(0.2, conf) - expected_twist[i]).abs() < 1e-12);
        }
        // Monotonically decreasing as confidence rises.
        for w in expected_pose.windows(2) {
            assert!(w[0] > w[1]);
        }
    }

    #[test]
    fn diagonal_covariance_layout() {
        let m = diagonal_covariance(0.5, 0.01);
        for row in 0..6 {
            for col in 0..6 {
                let v = m[row * 6 + col];
                if row != col {
                    assert_eq!(v, 0.0);
                } else if row < 3 {
                    assert_eq!(v, 0.5);
                } else {
                    assert_eq!(v, 0.01);
                }
            }
        }
    }

    #[test]
    fn transform_is_deterministic() {
        let s = sample([0.3, -1.2, 4.5], [0.1, 0.2, 0.3, 0.927], TrackerConfidence::Low);
        let a = transform(&s, 0.1, 0.1);
        let b = transform(&s, 0.1, 0.1);
        assert_eq!(a.position, b.position);
        assert_eq!(a.orientation, b.orientation);
        assert_eq!(a.linear_velocity, b.linear_velocity);
        assert_eq!(a.pose_covariance, b.pose_covariance);
    }

    #[test]
    fn transform_identity_rotation_passes_velocity_through_remap() {
        let mut s = sample([0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], TrackerConfidence::High);
        s.velocity = [1.0, 2.0, 3.0];
        let out = transform(&s, 0.1, 0.1);
        // Identity orientation: child-frame velocity is just the remap.
        assert_eq!(out.linear_velocity, [-3.0, -1.0, 2.0]);
        assert_eq!(out.pose_covariance[0], 0.1);
        assert!((out.pose_covariance[21] - 0.001).abs() < 1e-15);
    }
}
