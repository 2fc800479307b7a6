//! Soft volumetric boundary.
//!
//! Inverse-square repulsion from the faces of an axis-aligned volume. Agents
//! strictly inside the inner region feel nothing.

use crate::core::config::{BoundaryConfig, BoundaryShape, WallMask};
use glam::Vec3;

/// Distances below this are clamped so a boid at or past a face still gets a
/// finite push.
pub const MIN_WALL_DISTANCE: f32 = 1e-3;

#[inline]
fn inverse_square(distance: f32) -> f32 {
    1.0 / distance.max(MIN_WALL_DISTANCE).powi(2)
}

/// One axis of the cube variant, in coordinates relative to the center.
#[inline]
fn cube_axis(p: f32, outer_half: f32, inner_half: f32) -> f32 {
    let mut force = 0.0;
    if p > inner_half {
        force -= inverse_square(outer_half - p);
    }
    if p < -inner_half {
        force += inverse_square(p + outer_half);
    }
    force
}

/// One axis of the plane variant.
#[inline]
fn wall_axis(p: f32, min: f32, max: f32, threshold: f32, positive: bool, negative: bool) -> f32 {
    let mut force = 0.0;
    if positive && max - p < threshold {
        force -= inverse_square(max - p);
    }
    if negative && p - min < threshold {
        force += inverse_square(p - min);
    }
    force
}

/// Raw cube force before normalization.
pub fn cube_force(position: Vec3, center: Vec3, outer_size: f32, inner_size: f32) -> Vec3 {
    let p = position - center;
    let (outer, inner) = (outer_size * 0.5, inner_size * 0.5);
    Vec3::new(
        cube_axis(p.x, outer, inner),
        cube_axis(p.y, outer, inner),
        cube_axis(p.z, outer, inner),
    )
}

pub fn wall_force(position: Vec3, min: Vec3, max: Vec3, threshold: f32, walls: WallMask) -> Vec3 {
    Vec3::new(
        wall_axis(position.x, min.x, max.x, threshold, walls.x_positive, walls.x_negative),
        wall_axis(position.y, min.y, max.y, threshold, walls.y_positive, walls.y_negative),
        wall_axis(position.z, min.z, max.z, threshold, walls.z_positive, walls.z_negative),
    )
}

/// Scaled boundary force for one agent.
///
/// The cube variant is a direction (normalized, then scaled); the wall
/// variant keeps each face's inverse-square magnitude.
pub fn boundary_force(position: Vec3, boundary: &BoundaryConfig) -> Vec3 {
    match boundary.shape {
        BoundaryShape::Cube {
            center,
            outer_size,
            inner_size,
        } => {
            cube_force(position, center, outer_size, inner_size).normalize_or_zero()
                * boundary.force_magnitude
        }
        BoundaryShape::Walls {
            min,
            max,
            threshold,
            walls,
        } => wall_force(position, min, max, threshold, walls) * boundary.force_magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::BoundaryApplication;

    fn cube() -> BoundaryConfig {
        BoundaryConfig {
            shape: BoundaryShape::Cube {
                center: Vec3::ZERO,
                outer_size: 30.0,
                inner_size: 20.0,
            },
            force_magnitude: 5.0,
            application: BoundaryApplication::Steering,
        }
    }

    fn walls(mask: WallMask) -> BoundaryConfig {
        BoundaryConfig {
            shape: BoundaryShape::Walls {
                min: Vec3::splat(-10.0),
                max: Vec3::splat(10.0),
                threshold: 2.0,
                walls: mask,
            },
            force_magnitude: 3.0,
            application: BoundaryApplication::Force,
        }
    }

    #[test]
    fn cube_pushes_back_on_each_side() {
        let b = cube();
        let pos_x = boundary_force(Vec3::new(12.0, 0.0, 0.0), &b);
        let neg_x = boundary_force(Vec3::new(-12.0, 0.0, 0.0), &b);
        assert!(pos_x.x < 0.0);
        assert!(neg_x.x > 0.0);
        assert!((pos_x.length() - 5.0).abs() < 1e-5);
        assert_eq!(pos_x.y, 0.0);
    }

    #[test]
    fn cube_is_silent_inside_inner_volume() {
        let b = cube();
        for p in [Vec3::ZERO, Vec3::splat(9.99), Vec3::new(-9.5, 3.0, 9.0)] {
            assert_eq!(boundary_force(p, &b), Vec3::ZERO);
        }
    }

    #[test]
    fn walls_push_back_and_grow_near_face() {
        let b = walls(WallMask::default());
        let far = boundary_force(Vec3::new(8.5, 0.0, 0.0), &b);
        let near = boundary_force(Vec3::new(9.5, 0.0, 0.0), &b);
        assert!(far.x < 0.0 && near.x < far.x);
        assert!(boundary_force(Vec3::new(-9.5, 0.0, 0.0), &b).x > 0.0);
        // unnormalized: 1 / 0.5² · 3
        assert!((near.x + 12.0).abs() < 1e-4);
    }

    #[test]
    fn walls_are_silent_inside_threshold() {
        let b = walls(WallMask::default());
        for p in [Vec3::ZERO, Vec3::splat(7.9), Vec3::splat(-7.9)] {
            assert_eq!(boundary_force(p, &b), Vec3::ZERO);
        }
    }

    #[test]
    fn disabled_wall_contributes_nothing() {
        let mask = WallMask {
            x_positive: false,
            ..WallMask::default()
        };
        let b = walls(mask);
        assert_eq!(boundary_force(Vec3::new(9.5, 0.0, 0.0), &b), Vec3::ZERO);
        assert!(boundary_force(Vec3::new(-9.5, 0.0, 0.0), &b).x > 0.0);
    }

    #[test]
    fn past_the_face_stays_finite() {
        let b = walls(WallMask::default());
        let f = boundary_force(Vec3::new(10.5, 0.0, 0.0), &b);
        assert!(f.x.is_finite() && f.x < 0.0);
        let c = boundary_force(Vec3::new(15.0, 0.0, 0.0), &cube());
        assert!(c.is_finite() && c.x < 0.0);
    }
}
