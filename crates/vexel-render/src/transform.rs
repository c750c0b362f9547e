//! Rotation/scale/pivot transform for the non-axis-aligned draw path.

use glam::{Mat4, Vec3, Vec4};

/// Parameters of a transformed surface draw.
///
/// `rotation` holds Euler angles in radians around the X, Y and Z axes;
/// the rotation matrix composes them in Y·X·Z order. `scale` scales each
/// output axis after rotation, and `center` is the pivot point translated
/// into the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    pub center: Vec3,
    pub scale: Vec3,
    pub rotation: Vec3,
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

impl SurfaceTransform {
    pub fn new(center: Vec3, scale: Vec3, rotation: Vec3) -> Self {
        Self {
            center,
            scale,
            rotation,
        }
    }

    /// Build the transform matrix.
    ///
    /// The element formulas are written for row vectors (`p' = p · M`);
    /// laying the rows out as glam columns makes
    /// [`Mat4::transform_point3`] apply the same mapping.
    pub fn matrix(&self) -> Mat4 {
        let (sr, cr) = (self.rotation.y.sin(), self.rotation.y.cos());
        let (sp, cp) = (self.rotation.x.sin(), self.rotation.x.cos());
        let (sy, cy) = (self.rotation.z.sin(), self.rotation.z.cos());

        let m11 = cp * cy;
        let m12 = sr * sp * cy - cr * sy;
        let m13 = cr * sp * cy + sr * sy;
        let m21 = cp * sy;
        let m22 = sr * sp * sy + cr * cy;
        let m23 = cr * sp * sy - sr * cy;
        let m31 = -sp;
        let m32 = sr * cp;
        let m33 = cr * cp;

        let (sx, sy_scale, sz) = (self.scale.x, self.scale.y, self.scale.z);
        let c = self.center;

        let t1 = (c.x * m11 + c.y * m21 + c.z * m31) * sx;
        let t2 = (c.x * m12 + c.y * m22 + c.z * m32) * sy_scale;
        let t3 = (c.x * m13 + c.y * m23 + c.z * m33) * sz;

        Mat4::from_cols(
            Vec4::new(m11 * sx, m12 * sy_scale, m13 * sz, 0.0),
            Vec4::new(m21 * sx, m22 * sy_scale, m23 * sz, 0.0),
            Vec4::new(m31 * sx, m32 * sy_scale, m33 * sz, 0.0),
            Vec4::new(t1, t2, t3, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let m = SurfaceTransform::default().matrix();
        let p = m.transform_point3(Vec3::new(3.0, -2.0, 0.0));
        assert!((p - Vec3::new(3.0, -2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_scale_and_pivot() {
        let t = SurfaceTransform::new(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(2.0, 1.0, 1.0),
            Vec3::ZERO,
        );
        let p = t.matrix().transform_point3(Vec3::new(1.0, 1.0, 0.0));
        // x: (1 + 10) * 2, y unchanged
        assert!((p.x - 22.0).abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_z_rotation_quarter_turn() {
        let t = SurfaceTransform::new(
            Vec3::ZERO,
            Vec3::ONE,
            Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
        );
        // row-vector convention: (1, 0) maps to (m11, m12) = (0, -1)
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!(p.x.abs() < 1e-6);
        assert!((p.y + 1.0).abs() < 1e-6);
    }
}
