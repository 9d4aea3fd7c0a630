use std::f32::consts::{PI, TAU};
use std::sync::OnceLock;

use glam::{Mat4, Vec3};

const SPHERE_RINGS: usize = 8;
const SPHERE_SEGMENTS: usize = 16;

/// Rounds half-way values toward positive infinity, so `-0.5` becomes `0`
/// and `0.5` becomes `1`. Cell lookups depend on this exact rule.
pub fn round_half_up(v: f32) -> f32 {
    (v + 0.5).floor()
}

/// Integer cell under a continuous position.
pub fn cell_of(p: Vec3) -> (i32, i32) {
    (round_half_up(p.x) as i32, round_half_up(p.y) as i32)
}

pub fn cell_center(x: i32, y: i32) -> Vec3 {
    Vec3::new(x as f32, y as f32, 0.0)
}

/// Sample points on the unit sphere: both poles plus evenly spaced rings.
/// The equator ring includes the four axis directions.
pub fn unit_sphere_points() -> &'static [Vec3] {
    static POINTS: OnceLock<Vec<Vec3>> = OnceLock::new();
    POINTS.get_or_init(|| {
        let mut points = Vec::with_capacity(2 + (SPHERE_RINGS - 1) * SPHERE_SEGMENTS);
        points.push(Vec3::Z);
        for ring in 1..SPHERE_RINGS {
            let polar = PI * ring as f32 / SPHERE_RINGS as f32;
            let (sin_p, cos_p) = polar.sin_cos();
            for seg in 0..SPHERE_SEGMENTS {
                let azimuth = TAU * seg as f32 / SPHERE_SEGMENTS as f32;
                let (sin_a, cos_a) = azimuth.sin_cos();
                points.push(Vec3::new(sin_p * cos_a, sin_p * sin_a, cos_p));
            }
        }
        points.push(Vec3::NEG_Z);
        points
    })
}

/// Whether any of `points`, placed by `item_transform`, falls strictly inside
/// the unit sphere of the body whose inverse model matrix is `inverse`.
pub fn touches(inverse: Mat4, item_transform: Mat4, points: &[Vec3]) -> bool {
    let to_local = inverse * item_transform;
    points
        .iter()
        .any(|p| to_local.transform_point3(*p).length_squared() < 1.0)
}
