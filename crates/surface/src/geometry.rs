//! Mapping between world space and surface pixels.

use glam::{Vec2, Vec3};
use pointerkit_core::Pose;
use thiserror::Error;

/// Errors raised when building a surface.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SurfaceError {
    /// Both sizes must be finite and strictly positive.
    #[error("invalid surface size: physical {physical}, logical {logical}")]
    InvalidSize {
        /// Requested physical size.
        physical: Vec2,
        /// Requested logical size.
        logical: Vec2,
    },
}

/// Where a surface sits and how big it is, physically and logically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    /// World transform of the panel center. The panel faces `+Z`.
    pub pose: Pose,
    /// Physical size in meters.
    pub physical_size: Vec2,
    /// Logical size in pixels.
    pub logical_size: Vec2,
}

impl Default for SurfaceGeometry {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            physical_size: Vec2::new(3.0, 2.0),
            logical_size: Vec2::new(300.0, 200.0),
        }
    }
}

impl SurfaceGeometry {
    /// Create a geometry. Sizes must be finite and positive on both axes.
    pub fn new(pose: Pose, physical_size: Vec2, logical_size: Vec2) -> Result<Self, SurfaceError> {
        if !is_positive_size(physical_size) || !is_positive_size(logical_size) {
            return Err(SurfaceError::InvalidSize {
                physical: physical_size,
                logical: logical_size,
            });
        }
        Ok(Self {
            pose,
            physical_size,
            logical_size,
        })
    }

    /// Convert a world-space point into surface pixel coordinates.
    ///
    /// Physical `+Y` is up while pixel `+Y` is down, so the vertical axis flips.
    pub fn to_local(&self, world: Vec3) -> Vec2 {
        let local = self.pose.inverse_transform_point(world);
        self.local_to_pixels(local)
    }

    /// Convert a point already in the panel's local frame into pixels.
    pub fn local_to_pixels(&self, local: Vec3) -> Vec2 {
        Vec2::new(
            (local.x / self.physical_size.x + 0.5) * self.logical_size.x,
            (0.5 - local.y / self.physical_size.y) * self.logical_size.y,
        )
    }

    /// Half extents of the panel in its local frame, for a collider of `thickness`.
    pub fn half_extents(&self, thickness: f32) -> Vec3 {
        (self.physical_size * 0.5).extend(thickness * 0.5)
    }
}

/// Whether both components are finite and strictly positive.
pub fn is_positive_size(size: Vec2) -> bool {
    size.is_finite() && size.x > 0.0 && size.y > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn center_and_corner_map_to_pixels() {
        let geometry = SurfaceGeometry::default();
        assert!(approx(geometry.to_local(Vec3::ZERO), Vec2::new(150.0, 100.0)));
        assert!(approx(
            geometry.to_local(Vec3::new(1.5, -1.0, 0.0)),
            Vec2::new(300.0, 200.0)
        ));
        assert!(approx(
            geometry.to_local(Vec3::new(-1.5, 1.0, 0.0)),
            Vec2::ZERO
        ));
    }

    #[test]
    fn transformed_panel_maps_through_its_pose() {
        let pose = Pose::new(
            Vec3::new(0.0, 1.0, -2.0),
            Quat::from_rotation_y(std::f32::consts::PI),
        );
        let geometry = SurfaceGeometry::new(pose, Vec2::new(2.0, 1.0), Vec2::new(200.0, 100.0))
            .expect("valid sizes");
        // Rotated half a turn: world -X is the panel's local +X.
        let world = Vec3::new(-1.0, 1.0, -2.0);
        assert!(approx(geometry.to_local(world), Vec2::new(200.0, 50.0)));
    }

    #[test]
    fn half_extents_use_physical_size() {
        let geometry = SurfaceGeometry::default();
        assert_eq!(geometry.half_extents(0.02), Vec3::new(1.5, 1.0, 0.01));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        let logical = Vec2::new(300.0, 200.0);
        for physical in [
            Vec2::new(f32::NAN, 2.0),
            Vec2::new(3.0, f32::INFINITY),
            Vec2::new(0.0, 2.0),
            Vec2::new(3.0, -2.0),
        ] {
            assert!(
                SurfaceGeometry::new(Pose::IDENTITY, physical, logical).is_err(),
                "{physical:?} accepted"
            );
        }
        let physical = Vec2::new(3.0, 2.0);
        assert!(SurfaceGeometry::new(Pose::IDENTITY, physical, Vec2::new(f32::NAN, 1.0)).is_err());
    }
}
