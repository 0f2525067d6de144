use na::{Isometry3, Translation3, UnitQuaternion};
use nalgebra as na;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotation: glm::Quat::identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn new(translation: glm::Vec3, rotation: glm::Quat, scale: glm::Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: glm::Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> glm::Mat4 {
        glm::translation(&self.translation)
            * glm::quat_to_mat4(&self.rotation)
            * glm::scaling(&self.scale)
    }

    /// Rigid part of the transform, scale is dropped.
    pub fn as_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::from(self.translation),
            UnitQuaternion::from_quaternion(self.rotation),
        )
    }

    pub fn set_pose(&mut self, translation: &glm::Vec3, rotation: &UnitQuaternion<f32>) {
        self.translation = *translation;
        self.rotation = *rotation.quaternion();
    }

    pub fn as_view_matrix(&self) -> glm::Mat4 {
        let eye = self.translation;
        let target = self.translation + self.forward();
        let up = self.up();
        glm::look_at(&eye, &target, &up)
    }

    pub fn up(&self) -> glm::Vec3 {
        glm::quat_rotate_vec3(&self.rotation.normalize(), &glm::Vec3::y())
    }

    pub fn forward(&self) -> glm::Vec3 {
        glm::quat_rotate_vec3(&self.rotation.normalize(), &(-glm::Vec3::z()))
    }

    /// Turns the transform so `forward` points at `target`.
    pub fn look_at(&mut self, target: &glm::Vec3, up: &glm::Vec3) {
        let direction = target - self.translation;
        if glm::length(&direction) <= f32::EPSILON {
            return;
        }
        self.rotation = glm::quat_conjugate(&glm::quat_look_at(&direction.normalize(), up));
    }
}

impl From<Isometry3<f32>> for Transform {
    fn from(isometry: Isometry3<f32>) -> Self {
        Self {
            translation: isometry.translation.vector,
            rotation: *isometry.rotation.quaternion(),
            ..Default::default()
        }
    }
}
