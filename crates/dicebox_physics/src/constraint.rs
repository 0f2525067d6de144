use crate::{DragSettings, Handle, MassData};
use rapier3d::{
    dynamics::RigidBody,
    math::Real,
    na::{Matrix3, Point3, Vector3},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub(crate) u64);

/// Pulls a point fixed on a body toward a target point in world space.
#[derive(Debug, Clone)]
pub struct PointConstraint {
    body: Handle,
    local_pivot: Point3<Real>,
    target: Point3<Real>,
    settings: DragSettings,
    mass: MassData,
}

impl PointConstraint {
    pub fn new(
        body: Handle,
        local_pivot: Point3<Real>,
        target: Point3<Real>,
        settings: DragSettings,
        mass: MassData,
    ) -> Self {
        Self {
            body,
            local_pivot,
            target,
            settings,
            mass,
        }
    }

    pub fn body(&self) -> Handle {
        self.body
    }

    pub fn local_pivot(&self) -> Point3<Real> {
        self.local_pivot
    }

    pub fn target(&self) -> Point3<Real> {
        self.target
    }

    pub fn set_target(&mut self, target: Point3<Real>) {
        self.target = target;
    }

    pub fn settings(&self) -> &DragSettings {
        &self.settings
    }

    /// The pivot in world space for the body's current pose.
    pub fn world_pivot(&self, body: &RigidBody) -> Point3<Real> {
        body.position() * self.local_pivot
    }

    /// Applies one substep worth of corrective impulse to the body.
    pub(crate) fn solve(&self, body: &mut RigidBody, dt: Real) {
        if !body.is_dynamic() || dt <= 0.0 {
            return;
        }

        let inverse_mass = self.mass.inverse_mass();
        if inverse_mass <= 0.0 {
            return;
        }

        let position = *body.position();
        let pivot = position * self.local_pivot;
        let center_of_mass = position * self.mass.local_center_of_mass;
        let arm = pivot - center_of_mass;

        let velocity = body.linvel() + body.angvel().cross(&arm);
        let error = self.target - pivot;
        let desired = error * (self.settings.tau / dt) - velocity * self.settings.damping;

        let inverse_inertia = self.mass.world_inverse_inertia(&position.rotation);
        let skew = arm.cross_matrix();
        let effective = Matrix3::identity() * inverse_mass - skew * inverse_inertia * skew;

        let mut impulse = match effective.try_inverse() {
            Some(inverse) => inverse * desired,
            None => desired / inverse_mass,
        };

        let clamp = self.settings.impulse_clamp;
        if clamp > 0.0 {
            let magnitude = impulse.norm();
            if magnitude > clamp {
                impulse *= clamp / magnitude;
            }
        }

        if impulse.iter().all(|component| component.is_finite()) && impulse != Vector3::zeros() {
            body.apply_impulse_at_point(impulse, pivot, true);
        }
    }
}
