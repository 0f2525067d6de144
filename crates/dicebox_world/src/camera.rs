use crate::Transform;
use dicebox_physics::{
    rapier3d::{
        na::{Point2, Point3},
        parry::query::Ray,
    },
    PickCamera,
};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        let height = if self.height > 0.0 { self.height } else { 1.0 };
        self.width / height
    }

    pub fn as_glm_vec(&self) -> glm::Vec4 {
        glm::vec4(self.x, self.y, self.width, self.height)
    }

    /// Converts a position in pixels, origin at the top left, to normalized device coordinates.
    pub fn to_ndc(&self, position: &glm::Vec2) -> glm::Vec2 {
        let width = if self.width > 0.0 { self.width } else { 1.0 };
        let height = if self.height > 0.0 { self.height } else { 1.0 };
        glm::vec2(
            2.0 * (position.x - self.x) / width - 1.0,
            1.0 - 2.0 * (position.y - self.y) / height,
        )
    }

    pub fn from_ndc(&self, ndc: &glm::Vec2) -> glm::Vec2 {
        glm::vec2(
            self.x + (ndc.x + 1.0) * 0.5 * self.width,
            self.y + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Projection {
    Perspective(PerspectiveCamera),
    Orthographic(OrthographicCamera),
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    pub aspect_ratio: Option<f32>,
    pub y_fov_rad: f32,
    pub z_far: Option<f32>,
    pub z_near: f32,
}

impl PerspectiveCamera {
    pub fn matrix(&self, viewport_aspect_ratio: f32) -> glm::Mat4 {
        let aspect_ratio = if let Some(aspect_ratio) = self.aspect_ratio {
            aspect_ratio
        } else {
            viewport_aspect_ratio
        };

        if let Some(z_far) = self.z_far {
            glm::perspective_zo(aspect_ratio, self.y_fov_rad, self.z_near, z_far)
        } else {
            glm::infinite_perspective_rh_zo(aspect_ratio, self.y_fov_rad, self.z_near)
        }
    }
}

#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct OrthographicCamera {
    pub x_mag: f32,
    pub y_mag: f32,
    pub z_far: f32,
    pub z_near: f32,
}

impl OrthographicCamera {
    pub fn matrix(&self) -> glm::Mat4 {
        glm::ortho_rh_zo(
            -self.x_mag,
            self.x_mag,
            -self.y_mag,
            self.y_mag,
            self.z_near,
            self.z_far,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub projection: Projection,
    pub transform: Transform,
    pub viewport: Viewport,
}

impl Camera {
    pub fn new(projection: Projection, transform: Transform, viewport: Viewport) -> Self {
        Self {
            projection,
            transform,
            viewport,
        }
    }

    /// A perspective camera at `eye` looking at `target`.
    pub fn looking_at(
        eye: glm::Vec3,
        target: glm::Vec3,
        y_fov_rad: f32,
        viewport: Viewport,
    ) -> Self {
        let mut transform = Transform::from_translation(eye);
        transform.look_at(&target, &glm::Vec3::y());
        Self::new(
            Projection::Perspective(PerspectiveCamera {
                aspect_ratio: None,
                y_fov_rad,
                z_far: Some(1000.0),
                z_near: 0.1,
            }),
            transform,
            viewport,
        )
    }

    pub fn projection_matrix(&self) -> glm::Mat4 {
        match &self.projection {
            Projection::Perspective(camera) => camera.matrix(self.viewport.aspect_ratio()),
            Projection::Orthographic(camera) => camera.matrix(),
        }
    }

    pub fn view_matrix(&self) -> glm::Mat4 {
        self.transform.as_view_matrix()
    }

    /// Ray through a pointer position in pixels, origin at the top left of the viewport.
    pub fn mouse_ray(&self, mouse_position: &glm::Vec2) -> Ray {
        let mut position = *mouse_position;
        position.y = self.viewport.height - (position.y - self.viewport.y) + self.viewport.y;

        let near_point = glm::vec2_to_vec3(&position);

        // Unprojecting depth 1.0 lands at infinity without a far plane
        let mut far_point = near_point;
        far_point.z = match &self.projection {
            Projection::Perspective(PerspectiveCamera { z_far: None, .. }) => 0.5,
            _ => 1.0,
        };

        let view_matrix = self.view_matrix();
        let projection_matrix = self.projection_matrix();
        let viewport = self.viewport.as_glm_vec();
        let p_near = glm::unproject_zo(&near_point, &view_matrix, &projection_matrix, viewport);
        let p_far = glm::unproject_zo(&far_point, &view_matrix, &projection_matrix, viewport);

        let direction = (p_far - p_near).normalize();
        Ray::new(Point3::from(p_near), direction)
    }
}

impl PickCamera for Camera {
    fn view_direction(&self) -> glm::Vec3 {
        self.transform.forward().normalize()
    }

    fn pointer_ray(&self, ndc: &Point2<f32>) -> Ray {
        self.mouse_ray(&self.viewport.from_ndc(&glm::vec2(ndc.x, ndc.y)))
    }
}
