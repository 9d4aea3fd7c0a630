use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Quat, Vec3};

use crate::presentation::DrawPose;

pub const PLAYER_SPEED: f32 = 2.0;
pub const PLAYER_RADIUS: f32 = 0.25;
pub const CHASER_SPEED: f32 = 1.0;
pub const CHASER_RADIUS: f32 = 0.25 * 1.25;
pub const PICKUP_RADIUS: f32 = 0.05;
pub const WALL_HALF_EXTENT: f32 = 0.5;
/// Radians per second of held turning input.
pub const TURN_RATE: f32 = FRAC_PI_2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Player,
    Chaser,
    Pickup,
    Banner,
}

/// Model-space correction applied after translation, heading and scale.
/// Player and chaser meshes are authored facing a different axis.
pub fn render_pose_for(kind: BodyKind) -> Mat4 {
    match kind {
        BodyKind::Player => Mat4::from_rotation_y(-FRAC_PI_2),
        BodyKind::Chaser => Mat4::from_rotation_y(-FRAC_PI_2) * Mat4::from_rotation_x(-PI),
        BodyKind::Pickup | BodyKind::Banner => Mat4::IDENTITY,
    }
}

/// Unit forward vector for a heading: `(0, 1, 0)` rotated about the vertical axis.
pub fn forward_for(yaw: f32) -> Vec3 {
    Quat::from_rotation_z(yaw) * Vec3::Y
}

#[derive(Clone, Debug)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec3,
    /// Heading, radians about +z, kept in `[0, 2π)`.
    pub yaw: f32,
    pub size: Vec3,
    pub speed: f32,
    pub visible: bool,
    pub draw_position: Vec3,
    pub draw_yaw: f32,
    transform: Mat4,
}

impl Body {
    pub fn new(kind: BodyKind, position: Vec3, yaw: f32, radius: f32, speed: f32) -> Self {
        let mut body = Self {
            kind,
            position,
            yaw: yaw.rem_euclid(TAU),
            size: Vec3::splat(radius),
            speed,
            visible: true,
            draw_position: position,
            draw_yaw: yaw,
            transform: Mat4::IDENTITY,
        };
        body.blend_state();
        body
    }

    pub fn forward(&self) -> Vec3 {
        forward_for(self.yaw)
    }

    /// Where the body would be after travelling `distance` along its heading.
    pub fn project(&self, distance: f32) -> Vec3 {
        self.position + self.forward() * distance
    }

    pub fn advance(&mut self, dt: f32) {
        if self.speed == 0.0 {
            return;
        }
        self.position = self.project(dt * self.speed);
    }

    pub fn rotate(&mut self, dt: f32) {
        self.set_yaw(self.yaw + dt * TURN_RATE);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw.rem_euclid(TAU);
    }

    /// Rebuilds the drawn pose from the physical state.
    pub fn blend_state(&mut self) {
        self.draw_position = self.position;
        self.draw_yaw = self.yaw;
        self.transform = Mat4::from_translation(self.draw_position)
            * Mat4::from_rotation_z(self.draw_yaw)
            * Mat4::from_scale(self.size)
            * render_pose_for(self.kind);
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inverse_transform(&self) -> Mat4 {
        self.transform.inverse()
    }

    pub fn pose(&self) -> DrawPose {
        DrawPose {
            position: self.draw_position,
            yaw: self.draw_yaw,
            transform: self.transform,
        }
    }
}
