use foundation::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation snapshot handed to the renderer.
///
/// This is the only thing a loaded vessel model needs: once the asset
/// resolves, the renderer attaches it to the latest transform for that id.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Column-major 4x4 model matrix.
    pub fn to_matrix_f32(&self) -> [[f32; 4]; 4] {
        let x = self.orientation.rotate(Vec3::X);
        let y = self.orientation.rotate(Vec3::Y);
        let z = self.orientation.rotate(Vec3::Z);
        let p = self.position;
        [
            [x.x as f32, x.y as f32, x.z as f32, 0.0],
            [y.x as f32, y.y as f32, y.z as f32, 0.0],
            [z.x as f32, z.y as f32, z.z as f32, 0.0],
            [p.x as f32, p.y as f32, p.z as f32, 1.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::Vec3;

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position, Vec3::new(0.0, 0.0, 0.0));
        let m = transform.to_matrix_f32();
        assert_eq!(m[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
