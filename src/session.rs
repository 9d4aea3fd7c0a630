use glam::Vec3;
use rand::Rng;
use tracing::{info, trace};

use crate::body::{Body, BodyKind, PICKUP_RADIUS, WALL_HALF_EXTENT};
use crate::chaser::{apply_chaser, plan_chaser, Chaser};
use crate::config::GameConfig;
use crate::error::{GameResult, LayoutError};
use crate::geometry::cell_center;
use crate::maze::Maze;
use crate::player::{integrate_player, Player};
use crate::presentation::{Appearance, DrawPose, Presentation, SoundCue};

pub use crate::player::Input;

const BANNER_DISTANCE: f32 = 0.6;
const BANNER_HEIGHT: f32 = 0.6;
const BANNER_SIZE: Vec3 = Vec3::new(2.0, 2.0, 0.1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::Ongoing
    }
}

struct Banner {
    body: Body,
    won: bool,
}

/// One play-through of a layout. Once the outcome is terminal the session
/// stays that way; start a new one to play again.
pub struct Session<P: Presentation> {
    config: GameConfig,
    maze: Maze,
    player: Player,
    chasers: Vec<Chaser>,
    banner: Option<Banner>,
    outcome: Outcome,
    clock: f32,
    presenter: P,
}

impl<P: Presentation> Session<P> {
    pub fn new(layout: &[&str], config: GameConfig, mut presenter: P) -> Result<Self, LayoutError> {
        let maze = Maze::build(layout)?;
        let spawns = maze.chaser_spawns();
        if config.chaser_count > 0 && spawns.is_empty() {
            return Err(LayoutError::NoChaserSpawn {
                requested: config.chaser_count,
            });
        }

        let (px, py) = maze.player_spawn();
        let player = Player::new(
            cell_center(px, py),
            config.player_spawn_yaw,
            config.player_radius,
            config.player_speed,
        );
        let chasers = (0..config.chaser_count)
            .map(|i| {
                let (x, y) = spawns[i % spawns.len()];
                Chaser::new(
                    cell_center(x, y),
                    config.chaser_spawn_yaw,
                    config.chaser_radius,
                    config.chaser_speed,
                )
            })
            .collect();

        info!(
            pickups = maze.total_pickups(),
            chasers = config.chaser_count,
            "session started"
        );
        presenter.play_sound(SoundCue::Background);

        Ok(Self {
            config,
            maze,
            player,
            chasers,
            banner: None,
            outcome: Outcome::Ongoing,
            clock: 0.0,
            presenter,
        })
    }

    /// Advances the simulation by `elapsed` seconds of wall time, clamped to
    /// the configured maximum step. Non-positive or non-finite input leaves
    /// everything untouched.
    ///
    /// The player moves first, then every chaser, then capture and
    /// completion are checked against the moved positions. Chaser decisions
    /// are made before anything moves, so a `ChaserTrapped` error leaves the
    /// session exactly as it was.
    pub fn step(&mut self, elapsed: f32, input: Input, rng: &mut impl Rng) -> GameResult<Outcome> {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return Ok(self.outcome);
        }
        let dt = elapsed.min(self.config.max_step);
        if dt < elapsed {
            trace!(elapsed, dt, "frame clamped");
        }

        match self.outcome {
            Outcome::Lost => {
                self.clock += dt;
                self.player.fade(dt);
                return Ok(self.outcome);
            }
            Outcome::Won => {
                self.clock += dt;
                return Ok(self.outcome);
            }
            Outcome::Ongoing => {}
        }

        let moves = self
            .chasers
            .iter()
            .enumerate()
            .map(|(index, chaser)| plan_chaser(index, chaser, &self.maze, dt, rng))
            .collect::<GameResult<Vec<_>>>()?;

        self.clock += dt;
        integrate_player(&mut self.player, &mut self.maze, input, dt);
        for (chaser, step) in self.chasers.iter_mut().zip(moves) {
            apply_chaser(chaser, step, dt);
        }

        let caught_by = self
            .chasers
            .iter()
            .position(|chaser| self.player.touches(chaser.body.transform()));
        if let Some(index) = caught_by {
            info!(index, clock = self.clock, "player caught");
            self.finish(Outcome::Lost);
        } else if self.maze.num_pickups_remaining() == 0 {
            info!(clock = self.clock, "all pickups collected");
            self.finish(Outcome::Won);
        }
        Ok(self.outcome)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;

        let player = &self.player.body;
        let mut position = player.project(BANNER_DISTANCE);
        position.z = BANNER_HEIGHT;
        let mut body = Body::new(BodyKind::Banner, position, player.yaw, 1.0, 0.0);
        body.size = BANNER_SIZE;
        body.blend_state();
        self.banner = Some(Banner {
            body,
            won: outcome == Outcome::Won,
        });

        self.presenter.stop_sound(SoundCue::Background);
        if outcome == Outcome::Lost {
            self.presenter.play_sound(SoundCue::Death);
        }
    }

    /// Hands every visible thing to the presenter.
    pub fn draw(&mut self) {
        self.presenter.begin_frame(self.maze.bounds());
        for (x, y) in self.maze.walls() {
            self.presenter
                .draw(&DrawPose::at(cell_center(x, y), WALL_HALF_EXTENT), Appearance::Wall);
        }
        for (x, y) in self.maze.active_pickups() {
            self.presenter
                .draw(&DrawPose::at(cell_center(x, y), PICKUP_RADIUS), Appearance::Pickup);
        }
        for (index, chaser) in self.chasers.iter().enumerate() {
            if chaser.body.visible {
                self.presenter
                    .draw(&chaser.body.pose(), Appearance::Chaser { index });
            }
        }
        if self.player.body.visible {
            self.presenter.draw(
                &self.player.body.pose(),
                Appearance::Player {
                    opacity: self.player.opacity,
                },
            );
        }
        if let Some(banner) = &self.banner {
            self.presenter
                .draw(&banner.body.pose(), Appearance::Banner { won: banner.won });
        }
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn chasers(&self) -> &[Chaser] {
        &self.chasers
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Simulated seconds since the session started.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }
}
