use crate::{PhysicsConfig, PhysicsError, Result};
use log::warn;
use rapier3d::{
    geometry::SharedShape,
    math::Real,
    na::{Isometry3, Matrix3, Matrix4, Point3, UnitQuaternion, Vector3},
    parry::mass_properties::MassProperties,
};
use std::{collections::HashMap, fmt, sync::Arc};

/// Primitive collision volumes described by their dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box { half_extents: Vector3<Real> },
    /// Cylinder aligned with the local Y axis.
    Cylinder { radius: Real, half_height: Real },
    Sphere { radius: Real },
}

#[derive(Debug, Clone)]
pub enum ShapeKind {
    Box {
        half_extents: Vector3<Real>,
    },
    Cylinder {
        radius: Real,
        half_height: Real,
    },
    Sphere {
        radius: Real,
    },
    ConvexHull {
        points: Vec<Point3<Real>>,
    },
    Compound {
        children: Vec<(Isometry3<Real>, Arc<CollisionShape>)>,
    },
}

/// An immutable collision shape, shared between every body built from the same template.
pub struct CollisionShape {
    kind: ShapeKind,
    shape: SharedShape,
    centroid: Point3<Real>,
}

impl fmt::Debug for CollisionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionShape")
            .field("kind", &self.kind)
            .field("centroid", &self.centroid)
            .finish()
    }
}

impl CollisionShape {
    fn new(kind: ShapeKind, shape: SharedShape) -> Result<Self> {
        let unit = shape.mass_properties(1.0);
        if !(unit.mass() > Real::EPSILON) {
            return Err(PhysicsError::InvalidGeometry(
                "shape encloses no volume".to_string(),
            ));
        }
        Ok(Self {
            kind,
            shape,
            centroid: unit.local_com,
        })
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shared(&self) -> &SharedShape {
        &self.shape
    }

    /// Center of the enclosed volume, in the shape's local frame.
    pub fn centroid(&self) -> Point3<Real> {
        self.centroid
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, ShapeKind::Compound { .. })
    }

    /// Number of points a convex hull was built from, zero for other shapes.
    pub fn hull_point_count(&self) -> usize {
        match &self.kind {
            ShapeKind::ConvexHull { points } => points.len(),
            _ => 0,
        }
    }

    /// Mass properties of a body of the given total mass built from this shape.
    pub fn mass_data(&self, mass: Real) -> Result<MassData> {
        let unit = self.shape.mass_properties(1.0);
        let volume = unit.mass();
        if !(volume > Real::EPSILON) {
            return Err(PhysicsError::InvalidGeometry(
                "shape encloses no volume".to_string(),
            ));
        }
        let scale = mass / volume;
        Ok(MassData {
            mass,
            local_center_of_mass: unit.local_com,
            principal_inertia: unit.principal_inertia() * scale,
            principal_frame: unit.principal_inertia_local_frame,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassData {
    pub mass: Real,
    pub local_center_of_mass: Point3<Real>,
    /// Diagonal of the inertia tensor, expressed in `principal_frame`.
    pub principal_inertia: Vector3<Real>,
    pub principal_frame: UnitQuaternion<Real>,
}

impl MassData {
    pub fn zero() -> Self {
        Self {
            mass: 0.0,
            local_center_of_mass: Point3::origin(),
            principal_inertia: Vector3::zeros(),
            principal_frame: UnitQuaternion::identity(),
        }
    }

    pub fn inverse_mass(&self) -> Real {
        inverse(self.mass)
    }

    /// Inverse inertia tensor in world space for a body with the given orientation.
    pub fn world_inverse_inertia(&self, rotation: &UnitQuaternion<Real>) -> Matrix3<Real> {
        let frame = (rotation * self.principal_frame)
            .to_rotation_matrix()
            .into_inner();
        let inverse_principal = self.principal_inertia.map(inverse);
        frame * Matrix3::from_diagonal(&inverse_principal) * frame.transpose()
    }

    pub fn to_mass_properties(&self) -> MassProperties {
        MassProperties::with_principal_inertia_frame(
            self.local_center_of_mass,
            self.mass,
            self.principal_inertia,
            self.principal_frame,
        )
    }
}

fn inverse(value: Real) -> Real {
    if value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

/// Builds collision shapes from dimensions or from render geometry.
#[derive(Debug, Clone, Copy)]
pub struct ShapeFactory {
    merge_tolerance: Real,
}

impl Default for ShapeFactory {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

impl ShapeFactory {
    pub fn new(merge_tolerance: Real) -> Self {
        Self { merge_tolerance }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.hull_merge_tolerance)
    }

    pub fn build_primitive(&self, primitive: Primitive) -> Result<Arc<CollisionShape>> {
        let (kind, shape) = match primitive {
            Primitive::Box { half_extents } => {
                ensure_dimensions("box half extents", half_extents.as_slice())?;
                (
                    ShapeKind::Box { half_extents },
                    SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
                )
            }
            Primitive::Cylinder {
                radius,
                half_height,
            } => {
                ensure_dimensions("cylinder dimensions", &[radius, half_height])?;
                (
                    ShapeKind::Cylinder {
                        radius,
                        half_height,
                    },
                    SharedShape::cylinder(half_height, radius),
                )
            }
            Primitive::Sphere { radius } => {
                ensure_dimensions("sphere radius", &[radius])?;
                (ShapeKind::Sphere { radius }, SharedShape::ball(radius))
            }
        };
        Ok(Arc::new(CollisionShape::new(kind, shape)?))
    }

    /// Builds a convex hull around render geometry.
    ///
    /// Every vertex is moved by the full world transform of its source mesh
    /// before near-coincident vertices are merged. The hull is not re-centered:
    /// geometry whose origin is not its centroid yields an off-center shape.
    pub fn build_convex_hull(
        &self,
        vertices: &[Point3<Real>],
        world_transform: &Matrix4<Real>,
    ) -> Result<Arc<CollisionShape>> {
        if vertices.is_empty() {
            return Err(PhysicsError::InvalidGeometry(
                "a convex hull needs at least one vertex".to_string(),
            ));
        }

        let transformed = vertices
            .iter()
            .map(|vertex| world_transform.transform_point(vertex))
            .collect::<Vec<_>>();

        if !transformed
            .iter()
            .all(|point| point.coords.iter().all(|c| c.is_finite()))
        {
            return Err(PhysicsError::InvalidGeometry(
                "convex hull vertices must be finite".to_string(),
            ));
        }

        let points = merge_vertices(&transformed, self.merge_tolerance);

        if !spans_volume(&points, self.merge_tolerance) {
            return Err(PhysicsError::InvalidGeometry(format!(
                "{} vertices merged into {} points that enclose no volume",
                vertices.len(),
                points.len()
            )));
        }

        let shape = SharedShape::convex_hull(&points).ok_or_else(|| {
            PhysicsError::InvalidGeometry("failed to compute a convex hull".to_string())
        })?;

        let hull = CollisionShape::new(ShapeKind::ConvexHull { points }, shape)?;

        let offset = hull.centroid().coords.norm();
        if offset > self.merge_tolerance.max(Real::EPSILON) {
            warn!(
                "Convex hull centroid sits {:.4} units away from its body origin, the shape is not re-centered",
                offset
            );
        }

        Ok(Arc::new(hull))
    }

    pub fn build_compound(
        &self,
        children: Vec<(Isometry3<Real>, Arc<CollisionShape>)>,
    ) -> Result<Arc<CollisionShape>> {
        if children.is_empty() {
            return Err(PhysicsError::InvalidGeometry(
                "a compound shape needs at least one child".to_string(),
            ));
        }

        if children.iter().any(|(_, child)| child.is_compound()) {
            return Err(PhysicsError::InvalidGeometry(
                "compound shapes cannot be nested".to_string(),
            ));
        }

        let shapes = children
            .iter()
            .map(|(isometry, child)| (*isometry, child.shared().clone()))
            .collect::<Vec<_>>();

        let shape = SharedShape::compound(shapes);
        Ok(Arc::new(CollisionShape::new(
            ShapeKind::Compound { children },
            shape,
        )?))
    }
}

fn ensure_dimensions(what: &str, dimensions: &[Real]) -> Result<()> {
    if dimensions
        .iter()
        .all(|dimension| dimension.is_finite() && *dimension > 0.0)
    {
        Ok(())
    } else {
        Err(PhysicsError::InvalidGeometry(format!(
            "{} must be positive and finite, got {:?}",
            what, dimensions
        )))
    }
}

/// Merges points closer than `tolerance` to a point kept before them.
///
/// The first occurrence of every cluster is kept and input order is preserved,
/// so the result never holds more points than the input.
pub fn merge_vertices(points: &[Point3<Real>], tolerance: Real) -> Vec<Point3<Real>> {
    let tolerance = tolerance.max(Real::EPSILON);
    let tolerance_squared = tolerance * tolerance;

    let cell_of = |point: &Point3<Real>| -> [i64; 3] {
        [
            (point.x / tolerance).floor() as i64,
            (point.y / tolerance).floor() as i64,
            (point.z / tolerance).floor() as i64,
        ]
    };

    let mut cells: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
    let mut merged: Vec<Point3<Real>> = Vec::with_capacity(points.len());

    for point in points {
        let cell = cell_of(point);

        let mut duplicate = false;
        'search: for x in -1..=1_i64 {
            for y in -1..=1_i64 {
                for z in -1..=1_i64 {
                    let neighbor = [
                        cell[0].saturating_add(x),
                        cell[1].saturating_add(y),
                        cell[2].saturating_add(z),
                    ];
                    if let Some(indices) = cells.get(&neighbor) {
                        if indices.iter().any(|index| {
                            (merged[*index] - point).norm_squared() <= tolerance_squared
                        }) {
                            duplicate = true;
                            break 'search;
                        }
                    }
                }
            }
        }

        if !duplicate {
            cells.entry(cell).or_default().push(merged.len());
            merged.push(*point);
        }
    }

    merged
}

/// Whether the points contain four that are not coplanar within `tolerance`.
fn spans_volume(points: &[Point3<Real>], tolerance: Real) -> bool {
    let tolerance = tolerance.max(Real::EPSILON);
    if points.len() < 4 {
        return false;
    }

    let first = points[0];

    let farthest = |measure: &dyn Fn(&Point3<Real>) -> Real| {
        points
            .iter()
            .map(|point| (measure(point), *point))
            .fold((0.0, first), |best, candidate| {
                if candidate.0 > best.0 {
                    candidate
                } else {
                    best
                }
            })
    };

    let (distance, second) = farthest(&|point| (point - first).norm());
    if distance <= tolerance {
        return false;
    }
    let axis = (second - first).normalize();

    let (distance, third) = farthest(&|point| {
        let offset = point - first;
        (offset - axis * offset.dot(&axis)).norm()
    });
    if distance <= tolerance {
        return false;
    }

    let normal = axis.cross(&(third - first)).normalize();
    let (distance, _) = farthest(&|point| (point - first).dot(&normal).abs());
    distance > tolerance
}
