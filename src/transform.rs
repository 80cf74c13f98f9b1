use glam::{Mat4, Quat, Vec3};

/// Translation, rotation and scale of a scene node. Equality is exact per component, which is what
/// the overlay dirty check relies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3D {
    pub const IDENTITY: Transform3D =
        Transform3D { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, ..Self::IDENTITY }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * (point - self.translation);
        local / safe_scale(self.scale)
    }

    /// Places `self` (expressed in `parent` space) into the space `parent` lives in.
    pub fn compose(&self, parent: &Transform3D) -> Transform3D {
        Transform3D {
            translation: parent.transform_point(self.translation),
            rotation: (parent.rotation * self.rotation).normalize(),
            scale: parent.scale * self.scale,
        }
    }

    /// Expresses `self` in the local space of `other`, so that `result.compose(other) == self`
    /// up to float error.
    pub fn relative_to(&self, other: &Transform3D) -> Transform3D {
        let inv_rotation = other.rotation.inverse();
        Transform3D {
            translation: other.inverse_transform_point(self.translation),
            rotation: (inv_rotation * self.rotation).normalize(),
            scale: self.scale / safe_scale(other.scale),
        }
    }
}

fn safe_scale(scale: Vec3) -> Vec3 {
    Vec3::select(scale.abs().cmplt(Vec3::splat(f32::EPSILON)), Vec3::ONE, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_then_compose_roundtrips() {
        let parent = Transform3D::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::splat(2.0),
        );
        let child = Transform3D::new(Vec3::new(-4.0, 0.5, 9.0), Quat::from_rotation_x(0.3), Vec3::ONE);
        let relative = child.relative_to(&parent);
        let back = relative.compose(&parent);
        assert!(back.translation.abs_diff_eq(child.translation, 1e-4));
        assert!(back.rotation.abs_diff_eq(child.rotation, 1e-5));
        assert!(back.scale.abs_diff_eq(child.scale, 1e-5));
    }

    #[test]
    fn inverse_transform_point_undoes_transform_point() {
        let tx = Transform3D::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_z(1.2), Vec3::new(1.0, 2.0, 0.5));
        let point = Vec3::new(3.0, -2.0, 7.0);
        let local = tx.inverse_transform_point(point);
        assert!(tx.transform_point(local).abs_diff_eq(point, 1e-4));
    }

    #[test]
    fn equality_is_exact() {
        let a = Transform3D::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Transform3D::from_translation(Vec3::new(1.0 + 1.0e-6, 0.0, 0.0));
        assert_ne!(a, b);
        assert_eq!(a, a);
    }
}
