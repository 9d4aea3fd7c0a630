use glam::{Mat4, Vec3};

use crate::maze::GridBounds;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawPose {
    pub position: Vec3,
    pub yaw: f32,
    pub transform: Mat4,
}

impl DrawPose {
    pub fn at(position: Vec3, size: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            transform: Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(size)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Appearance {
    Wall,
    Pickup,
    Player { opacity: f32 },
    Chaser { index: usize },
    Banner { won: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Background,
    Death,
}

/// Rendering and audio side of the game. The session calls into it and
/// never reads anything back.
pub trait Presentation {
    /// Called once before the draw calls of a frame.
    fn begin_frame(&mut self, _bounds: GridBounds) {}

    fn draw(&mut self, pose: &DrawPose, appearance: Appearance);

    fn play_sound(&mut self, cue: SoundCue);

    fn stop_sound(&mut self, cue: SoundCue);
}

/// Discards every call. Handy for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {
    fn draw(&mut self, _pose: &DrawPose, _appearance: Appearance) {}

    fn play_sound(&mut self, _cue: SoundCue) {}

    fn stop_sound(&mut self, _cue: SoundCue) {}
}
