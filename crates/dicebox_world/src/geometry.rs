use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Render geometry handed to the physics side: positions plus the transform of the mesh that owns them.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    pub vertices: Vec<glm::Vec3>,
    pub transform: glm::Mat4,
}

impl MeshGeometry {
    pub fn world_vertices(&self) -> impl Iterator<Item = glm::Vec3> + '_ {
        self.vertices.iter().map(move |vertex| {
            let position = self.transform * glm::vec4(vertex.x, vertex.y, vertex.z, 1.0);
            glm::vec4_to_vec3(&position)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DieKind {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distance from a die's center to its farthest corner.
const DIE_RADIUS: f32 = 0.6;

impl DieKind {
    pub const ALL: [DieKind; 6] = [
        DieKind::D4,
        DieKind::D6,
        DieKind::D8,
        DieKind::D10,
        DieKind::D12,
        DieKind::D20,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::D4 => "d4",
            Self::D6 => "d6",
            Self::D8 => "d8",
            Self::D10 => "d10",
            Self::D12 => "d12",
            Self::D20 => "d20",
        }
    }

    /// Template mesh for the die, flat shaded: every corner is repeated once per face touching it.
    ///
    /// Templates are modelled Z-up, their transform turns them Y-up.
    pub fn template(&self) -> MeshGeometry {
        let (corners, valence) = self.corners();

        let radius = corners
            .iter()
            .map(|corner| glm::length(corner))
            .fold(0.0_f32, f32::max);
        let scale = if radius > 0.0 { DIE_RADIUS / radius } else { 1.0 };

        let vertices = corners
            .iter()
            .zip(valence)
            .flat_map(|(corner, faces)| std::iter::repeat(corner * scale).take(faces))
            .collect();

        MeshGeometry {
            vertices,
            transform: glm::rotation(-std::f32::consts::FRAC_PI_2, &glm::Vec3::x()),
        }
    }

    fn corners(&self) -> (Vec<glm::Vec3>, Vec<usize>) {
        let phi = (1.0 + 5.0_f32.sqrt()) * 0.5;
        let inverse_phi = 1.0 / phi;

        match self {
            Self::D4 => uniform(
                vec![
                    glm::vec3(1.0, 1.0, 1.0),
                    glm::vec3(1.0, -1.0, -1.0),
                    glm::vec3(-1.0, 1.0, -1.0),
                    glm::vec3(-1.0, -1.0, 1.0),
                ],
                3,
            ),
            Self::D6 => uniform(signed_corners(1.0, 1.0, 1.0), 3),
            Self::D8 => uniform(
                vec![
                    glm::vec3(1.0, 0.0, 0.0),
                    glm::vec3(-1.0, 0.0, 0.0),
                    glm::vec3(0.0, 1.0, 0.0),
                    glm::vec3(0.0, -1.0, 0.0),
                    glm::vec3(0.0, 0.0, 1.0),
                    glm::vec3(0.0, 0.0, -1.0),
                ],
                4,
            ),
            Self::D10 => {
                // Pentagonal trapezohedron: two apexes joined by a zig-zag ring of ten corners
                let mut corners = vec![glm::vec3(0.0, 0.0, 1.0), glm::vec3(0.0, 0.0, -1.0)];
                let mut valence = vec![5, 5];
                for index in 0..10 {
                    let angle = index as f32 * std::f32::consts::PI / 5.0;
                    let height = if index % 2 == 0 { 0.105 } else { -0.105 };
                    corners.push(glm::vec3(angle.cos(), angle.sin(), height));
                    valence.push(3);
                }
                (corners, valence)
            }
            Self::D12 => {
                let mut corners = signed_corners(1.0, 1.0, 1.0);
                for (a, b) in [
                    (inverse_phi, phi),
                    (inverse_phi, -phi),
                    (-inverse_phi, phi),
                    (-inverse_phi, -phi),
                ] {
                    corners.push(glm::vec3(0.0, a, b));
                    corners.push(glm::vec3(a, b, 0.0));
                    corners.push(glm::vec3(b, 0.0, a));
                }
                uniform(corners, 3)
            }
            Self::D20 => {
                let mut corners = Vec::with_capacity(12);
                for (a, b) in [(1.0, phi), (1.0, -phi), (-1.0, phi), (-1.0, -phi)] {
                    corners.push(glm::vec3(0.0, a, b));
                    corners.push(glm::vec3(a, b, 0.0));
                    corners.push(glm::vec3(b, 0.0, a));
                }
                uniform(corners, 5)
            }
        }
    }
}

fn uniform(corners: Vec<glm::Vec3>, valence: usize) -> (Vec<glm::Vec3>, Vec<usize>) {
    let count = corners.len();
    (corners, vec![valence; count])
}

fn signed_corners(x: f32, y: f32, z: f32) -> Vec<glm::Vec3> {
    let mut corners = Vec::with_capacity(8);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                corners.push(glm::vec3(sx * x, sy * y, sz * z));
            }
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn templates_repeat_corners_per_face() {
        let expected = [
            (DieKind::D4, 4 * 3),
            (DieKind::D6, 8 * 3),
            (DieKind::D8, 6 * 4),
            (DieKind::D10, 2 * 5 + 10 * 3),
            (DieKind::D12, 20 * 3),
            (DieKind::D20, 12 * 5),
        ];
        for (kind, count) in expected {
            assert_eq!(kind.template().vertices.len(), count, "{}", kind);
        }
    }

    #[test]
    fn templates_fit_the_die_radius_around_the_origin() {
        for kind in DieKind::ALL {
            let template = kind.template();
            let farthest = template
                .world_vertices()
                .map(|vertex| glm::length(&vertex))
                .fold(0.0_f32, f32::max);
            assert_relative_eq!(farthest, DIE_RADIUS, epsilon = 1e-5);

            let count = template.vertices.len() as f32;
            let center = template
                .world_vertices()
                .fold(glm::Vec3::zeros(), |sum, vertex| sum + vertex)
                / count;
            assert!(glm::length(&center) < 1e-4, "{} is off center", kind);
        }
    }

    #[test]
    fn template_transform_turns_z_up_into_y_up() {
        let template = DieKind::D10.template();
        let top = template
            .world_vertices()
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .expect("template has vertices");
        assert_relative_eq!(top.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(top.z, 0.0, epsilon = 1e-5);
        assert!(top.y > 0.5 * DIE_RADIUS);
    }
}
