use std::collections::HashSet;

use glam::{Mat4, Vec3};

use crate::body::{Body, BodyKind, PICKUP_RADIUS, WALL_HALF_EXTENT};
use crate::geometry::{cell_center, cell_of, touches, unit_sphere_points};
use crate::maze::Maze;

const FADE_RATE: f32 = 0.3;
const MIN_OPACITY: f32 = 0.2;

/// Held keys for one frame. Forward wins over backward and left over right
/// when both are held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub forward: bool,
    pub backward: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub radius: f32,
    /// Drops while the lose sequence plays. Cosmetic only.
    pub opacity: f32,
    inverse: Mat4,
}

impl Player {
    pub fn new(position: Vec3, yaw: f32, radius: f32, speed: f32) -> Self {
        let body = Body::new(BodyKind::Player, position, yaw, radius, speed);
        let inverse = body.inverse_transform();
        Self {
            body,
            radius,
            opacity: 1.0,
            inverse,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Inverse model matrix of the pose left by the last integration,
    /// after wall resolution.
    pub fn inverse(&self) -> Mat4 {
        self.inverse
    }

    pub fn fade(&mut self, dt: f32) {
        self.opacity = (self.opacity - FADE_RATE * dt).max(MIN_OPACITY);
    }

    /// Whether any sample point of a sphere placed by `item_transform`
    /// falls inside the player's collision sphere.
    pub fn touches(&self, item_transform: Mat4) -> bool {
        touches(self.inverse, item_transform, unit_sphere_points())
    }
}

/// Smallest push that separates a circle of `radius` from the wall cell
/// centered at `wall`, along the axis with the larger offset (x on ties).
/// Zero when they do not overlap.
pub fn wall_displacement(position: Vec3, radius: f32, wall: Vec3) -> Vec3 {
    let width = radius + WALL_HALF_EXTENT;
    let dx = position.x - wall.x;
    let dy = position.y - wall.y;
    if dx.abs() >= width || dy.abs() >= width {
        return Vec3::ZERO;
    }
    if dx.abs() >= dy.abs() {
        let push = if dx < 0.0 { -width - dx } else { width - dx };
        Vec3::new(push, 0.0, 0.0)
    } else {
        let push = if dy < 0.0 { -width - dy } else { width - dy };
        Vec3::new(0.0, push, 0.0)
    }
}

pub fn pickup_transform(x: i32, y: i32) -> Mat4 {
    Mat4::from_translation(cell_center(x, y)) * Mat4::from_scale(Vec3::splat(PICKUP_RADIUS))
}

/// Moves the player for one frame and resolves it against walls and pickups
/// in the 3x3 block of cells around it.
pub fn integrate_player(player: &mut Player, maze: &mut Maze, input: Input, dt: f32) {
    let body = &mut player.body;
    if input.forward {
        body.advance(dt);
    } else if input.backward {
        body.advance(-dt);
    }
    if input.turn_left {
        body.rotate(dt);
    } else if input.turn_right {
        body.rotate(-dt);
    }
    body.blend_state();
    player.inverse = player.body.inverse_transform();

    let (cx, cy) = cell_of(player.body.position);
    let mut visited = HashSet::with_capacity(9);
    let mut push = Vec3::ZERO;
    for dx in [1, 0, -1] {
        for dy in [1, 0, -1] {
            let (x, y) = (cx + dx, cy + dy);
            if !visited.insert((x, y)) {
                continue;
            }
            if maze.is_wall(x, y) {
                let candidate = wall_displacement(player.body.position, player.radius, cell_center(x, y));
                if candidate.length_squared() > push.length_squared() {
                    push = candidate;
                }
            } else if maze.is_pickup_active(x, y)
                && touches(player.inverse, pickup_transform(x, y), unit_sphere_points())
            {
                maze.consume_pickup(x, y);
            }
        }
    }

    player.body.position += push;
    player.body.blend_state();
    player.inverse = player.body.inverse_transform();
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::Vec3;

    use super::{integrate_player, wall_displacement, Input, Player};
    use crate::body::{PLAYER_RADIUS, PLAYER_SPEED, WALL_HALF_EXTENT};
    use crate::geometry::cell_center;
    use crate::maze::Maze;

    const OPEN_ROOM: &[&str] = &[
        "# # # # # # #",
        "#           #",
        "#     #     #",
        "#   P       #",
        "#           #",
        "# # # # # # #",
    ];

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec3::new(x, y, 0.0), FRAC_PI_2, PLAYER_RADIUS, PLAYER_SPEED)
    }

    fn overlaps(position: Vec3, wall: Vec3) -> f32 {
        let width = PLAYER_RADIUS + WALL_HALF_EXTENT;
        let ox = width - (position.x - wall.x).abs();
        let oy = width - (position.y - wall.y).abs();
        ox.min(oy)
    }

    #[test]
    fn displacement_picks_axis_of_larger_offset() {
        let wall = Vec3::ZERO;
        assert_eq!(
            wall_displacement(Vec3::new(0.6, 0.1, 0.0), PLAYER_RADIUS, wall),
            Vec3::new(0.75 - 0.6, 0.0, 0.0)
        );
        let up = wall_displacement(Vec3::new(0.1, -0.7, 0.0), PLAYER_RADIUS, wall);
        assert!((up.y - (-0.05)).abs() < 1e-6 && up.x == 0.0);
        assert_eq!(
            wall_displacement(Vec3::new(0.8, 0.0, 0.0), PLAYER_RADIUS, wall),
            Vec3::ZERO
        );
    }

    #[test]
    fn ties_push_along_x() {
        let push = wall_displacement(Vec3::new(-0.5, 0.5, 0.0), PLAYER_RADIUS, Vec3::ZERO);
        assert!((push.x - (-0.25)).abs() < 1e-6);
        assert_eq!(push.y, 0.0);
    }

    #[test]
    fn single_wall_contact_is_fully_resolved() {
        let wall = cell_center(3, -2);
        let starts = [
            (2.4, -2.0),
            (3.6, -2.1),
            (3.1, -1.35),
            (2.9, -2.7),
            (2.35, -1.4),
            (3.7, -2.65),
        ];
        for (x, y) in starts {
            let mut maze = Maze::build(OPEN_ROOM).unwrap();
            let mut player = player_at(x, y);
            assert!(overlaps(player.position(), wall) > 0.0);

            integrate_player(&mut player, &mut maze, Input::default(), 0.0);

            assert!(
                overlaps(player.position(), wall) <= 1e-5,
                "still inside wall from ({x}, {y}): {:?}",
                player.position()
            );
        }
    }

    #[test]
    fn corner_keeps_only_the_largest_push() {
        // Inside corner at (1, -1): walls at (0, -1) and (1, 0).
        let mut maze = Maze::build(OPEN_ROOM).unwrap();
        let mut player = player_at(0.6, -0.7);

        integrate_player(&mut player, &mut maze, Input::default(), 0.0);

        // The left wall asks for 0.15 in x, the top walls for 0.05 in y.
        let p = player.position();
        assert!((p.x - 0.75).abs() < 1e-5);
        assert!((p.y - (-0.7)).abs() < 1e-6);

        let expected = player.body.inverse_transform();
        assert!(player.inverse().abs_diff_eq(expected, 1e-6));
        let origin = player.inverse().transform_point3(p);
        assert!(origin.length() < 1e-5);
    }

    #[test]
    fn forward_input_moves_along_heading() {
        let mut maze = Maze::build(OPEN_ROOM).unwrap();
        let mut player = player_at(4.0, -3.0);
        let input = Input {
            forward: true,
            ..Input::default()
        };

        integrate_player(&mut player, &mut maze, input, 0.25);

        assert!((player.position() - Vec3::new(3.5, -3.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn backward_and_turn_inputs_apply() {
        let mut maze = Maze::build(OPEN_ROOM).unwrap();
        let mut player = player_at(3.0, -4.0);
        let input = Input {
            backward: true,
            turn_right: true,
            ..Input::default()
        };

        integrate_player(&mut player, &mut maze, input, 0.25);

        assert!((player.position() - Vec3::new(3.5, -4.0, 0.0)).length() < 1e-5);
        assert!((player.body.yaw - FRAC_PI_2 * 0.75).abs() < 1e-5);
    }

    #[test]
    fn touching_pickup_is_consumed_once() {
        let layout = &["# # # # #", "# . P   #", "# # # # #"];
        let mut maze = Maze::build(layout).unwrap();
        let mut player = player_at(1.2, -1.0);

        integrate_player(&mut player, &mut maze, Input::default(), 0.0);
        integrate_player(&mut player, &mut maze, Input::default(), 0.0);

        assert!(!maze.is_pickup_active(1, -1));
        assert_eq!(maze.num_pickups_remaining(), 0);
    }

    #[test]
    fn distant_pickup_is_left_alone() {
        let layout = &["# # # # #", "# . P   #", "# # # # #"];
        let mut maze = Maze::build(layout).unwrap();
        let mut player = player_at(2.0, -1.0);

        integrate_player(&mut player, &mut maze, Input::default(), 0.0);

        assert!(maze.is_pickup_active(1, -1));
    }

    #[test]
    fn fade_stops_at_floor() {
        let mut player = player_at(0.0, 0.0);
        player.fade(1.0);
        assert!((player.opacity - 0.7).abs() < 1e-6);
        player.fade(10.0);
        assert_eq!(player.opacity, 0.2);
    }
}
