//! Maze chase simulation: a player body steered through a fixed maze,
//! collecting pickups while autonomous chasers roam the corridors.
//!
//! Rendering and audio are left to a [`Presentation`] collaborator that the
//! [`Session`] calls into each frame.

pub mod body;
pub mod chaser;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod maze;
pub mod player;
pub mod presentation;
pub mod session;

pub use config::GameConfig;
pub use error::{GameError, LayoutError};
pub use maze::{Cell, GridBounds, Maze};
pub use presentation::{Appearance, DrawPose, NullPresentation, Presentation, SoundCue};
pub use session::{Input, Outcome, Session};
