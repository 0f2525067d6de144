use crate::{PhysicsError, Result};
use rapier3d::{math::Real, na::Vector3};
use serde::{Deserialize, Serialize};

/// Tuning for the point-to-point constraint that drags a picked body.
///
/// Low stiffness with high damping keeps a dragged body from rocketing off
/// when the target pivot jumps a long way between two pointer moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Fraction of the pivot's position error corrected per substep.
    pub tau: Real,
    /// Fraction of the pivot's current velocity removed per substep.
    pub damping: Real,
    /// Largest impulse magnitude the constraint may apply in one substep.
    /// Zero disables the clamp.
    pub impulse_clamp: Real,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            tau: 0.1,
            damping: 1.0,
            impulse_clamp: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// World gravity in meters per second squared.
    pub gravity: [Real; 3],
    /// Internal integration substeps taken by every call to `PhysicsWorld::step`.
    pub substeps: u32,
    /// Upper bound for the frame time handed to `step`.
    /// Left unset, frame time spikes are simulated in full.
    pub max_frame_time: Option<Real>,
    /// Vertices of a convex hull closer than this are merged into one point.
    pub hull_merge_tolerance: Real,
    /// Maximum length of the picking ray.
    pub pick_distance: Real,
    pub drag: DragSettings,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -10.0, 0.0],
            substeps: 10,
            max_frame_time: None,
            hull_merge_tolerance: 1e-4,
            pick_distance: 1000.0,
            drag: DragSettings::default(),
        }
    }
}

impl PhysicsConfig {
    pub fn gravity(&self) -> Vector3<Real> {
        Vector3::from(self.gravity)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gravity.iter().all(|component| component.is_finite()) {
            return Err(PhysicsError::Initialization(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }

        if self.substeps == 0 {
            return Err(PhysicsError::Initialization(
                "at least one substep is required".to_string(),
            ));
        }

        if let Some(max_frame_time) = self.max_frame_time {
            if !(max_frame_time > 0.0 && max_frame_time.is_finite()) {
                return Err(PhysicsError::Initialization(format!(
                    "max_frame_time must be positive, got {}",
                    max_frame_time
                )));
            }
        }

        if !(self.hull_merge_tolerance >= 0.0 && self.hull_merge_tolerance.is_finite()) {
            return Err(PhysicsError::Initialization(format!(
                "hull_merge_tolerance must be non-negative, got {}",
                self.hull_merge_tolerance
            )));
        }

        if !(self.pick_distance > 0.0) {
            return Err(PhysicsError::Initialization(format!(
                "pick_distance must be positive, got {}",
                self.pick_distance
            )));
        }

        let DragSettings {
            tau,
            damping,
            impulse_clamp,
        } = self.drag;
        let in_unit_range = |value: Real| (0.0..=1.0).contains(&value);
        if !(tau > 0.0 && in_unit_range(tau)) || !in_unit_range(damping) {
            return Err(PhysicsError::Initialization(format!(
                "drag tau must lie in (0, 1] and damping in [0, 1], got tau {} and damping {}",
                tau, damping
            )));
        }

        if !(impulse_clamp >= 0.0 && impulse_clamp.is_finite()) {
            return Err(PhysicsError::Initialization(format!(
                "drag impulse_clamp must be non-negative, got {}",
                impulse_clamp
            )));
        }

        Ok(())
    }
}
