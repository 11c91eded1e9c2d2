//! Unit quaternions for orientations and orientation-space interpolation.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Rotation quaternion stored as `[x, y, z, w]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Self {
        let Some(axis) = axis.try_normalize() else {
            return Self::IDENTITY;
        };
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Shortest-arc rotation taking unit vector `a` onto unit vector `b`.
    pub fn from_unit_vectors(a: Vec3, b: Vec3) -> Self {
        let dot = a.dot(b).clamp(-1.0, 1.0);

        // Nearly opposite vectors: pick arbitrary orthogonal axis.
        if dot < -0.999_999 {
            let mut axis = Vec3::X.cross(a);
            if axis.length_squared() < 1e-12 {
                axis = Vec3::Y.cross(a);
            }
            let axis = axis.normalize_or_zero();
            return Self::new(axis.x, axis.y, axis.z, 0.0);
        }

        if dot > 0.999_999 {
            return Self::IDENTITY;
        }

        let axis = a.cross(b);
        Self::new(axis.x, axis.y, axis.z, 1.0 + dot).normalize()
    }

    /// Rotation whose matrix has the given orthonormal columns.
    ///
    /// `right`, `up` and `forward` are the images of the local X, Y and Z axes.
    pub fn from_basis(right: Vec3, up: Vec3, forward: Vec3) -> Self {
        let (m00, m01, m02) = (right.x, up.x, forward.x);
        let (m10, m11, m12) = (right.y, up.y, forward.y);
        let (m20, m21, m22) = (right.z, up.z, forward.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Self::new((m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s)
        } else if m00 > m11 && m00 > m22 {
            let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn normalize(self) -> Self {
        let n = self.dot(self).sqrt();
        if n > 1e-10 {
            Self::new(self.x / n, self.y / n, self.z / n, self.w / n)
        } else {
            Self::IDENTITY
        }
    }

    /// Inverse for unit quaternions.
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotation angle in radians.
    pub fn angle(self) -> f64 {
        2.0 * self.w.abs().clamp(-1.0, 1.0).acos()
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }

    /// Spherical linear interpolation along the shorter arc.
    pub fn slerp(self, other: Self, t: f64) -> Self {
        let mut dot = self.dot(other);

        let mut b = other;
        if dot < 0.0 {
            b = Self::new(-b.x, -b.y, -b.z, -b.w);
            dot = -dot;
        }

        // Nearly parallel: normalized lerp is accurate and avoids 0/0.
        if dot > 0.9995 {
            return Self::new(
                self.x + t * (b.x - self.x),
                self.y + t * (b.y - self.y),
                self.z + t * (b.z - self.z),
                self.w + t * (b.w - self.w),
            )
            .normalize();
        }

        let theta_0 = dot.clamp(-1.0, 1.0).acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Self::new(
            s0 * self.x + s1 * b.x,
            s0 * self.y + s1 * b.y,
            s0 * self.z + s1 * b.z,
            s0 * self.w + s1 * b.w,
        )
    }

    pub fn as_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;

    fn mul(self, b: Self) -> Self::Output {
        let a = self;
        Self::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Quat;
    use crate::math::Vec3;

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        let diff = (a - b).length();
        assert!(diff <= eps, "expected {a:?} ~= {b:?} (diff {diff})");
    }

    #[test]
    fn identity_leaves_vectors_alone() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_close(Quat::IDENTITY.rotate(v), v, 1e-12);
    }

    #[test]
    fn from_unit_vectors_maps_a_onto_b() {
        let cases = [
            (Vec3::X, Vec3::Y),
            (Vec3::Y, Vec3::new(0.0, 0.6, 0.8)),
            (Vec3::Y, -Vec3::Y),
            (Vec3::Z, Vec3::Z),
        ];
        for (a, b) in cases {
            let q = Quat::from_unit_vectors(a, b);
            assert_vec_close(q.rotate(a), b, 1e-6);
        }
    }

    #[test]
    fn from_basis_reproduces_columns() {
        let right = Vec3::new(0.0, 0.0, -1.0);
        let up = Vec3::new(0.0, 1.0, 0.0);
        let forward = Vec3::new(1.0, 0.0, 0.0);
        let q = Quat::from_basis(right, up, forward);
        assert_vec_close(q.rotate(Vec3::X), right, 1e-9);
        assert_vec_close(q.rotate(Vec3::Y), up, 1e-9);
        assert_vec_close(q.rotate(Vec3::Z), forward, 1e-9);
    }

    #[test]
    fn from_basis_handles_half_turns() {
        // Trace is -1 here, exercising the non-trace branches.
        let q = Quat::from_basis(-Vec3::X, Vec3::Y, -Vec3::Z);
        assert_vec_close(q.rotate(Vec3::X), -Vec3::X, 1e-9);
        assert_vec_close(q.rotate(Vec3::Z), -Vec3::Z, 1e-9);
    }

    #[test]
    fn slerp_endpoints_and_midpoint() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2);
        assert_vec_close(a.slerp(b, 0.0).rotate(Vec3::X), Vec3::X, 1e-9);
        assert_vec_close(a.slerp(b, 1.0).rotate(Vec3::X), Vec3::Y, 1e-9);

        let mid = a.slerp(b, 0.5).rotate(Vec3::X);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert_vec_close(mid, Vec3::new(h, h, 0.0), 1e-9);
    }

    #[test]
    fn multiplication_composes_rotations() {
        let q1 = Quat::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2);
        let q2 = Quat::from_axis_angle(Vec3::X, std::f64::consts::FRAC_PI_2);
        let v = Vec3::X;
        assert_vec_close((q2 * q1).rotate(v), q2.rotate(q1.rotate(v)), 1e-9);
        assert!((q1.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }
}
