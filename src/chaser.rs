use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::body::{forward_for, Body, BodyKind};
use crate::error::{GameError, GameResult};
use crate::geometry::{cell_center, cell_of, round_half_up};
use crate::maze::Maze;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    Straight,
    Left,
    Right,
    Reverse,
}

impl Turn {
    pub fn yaw_offset(self) -> f32 {
        match self {
            Turn::Straight => 0.0,
            Turn::Left => FRAC_PI_2,
            Turn::Right => -FRAC_PI_2,
            Turn::Reverse => PI,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Chaser {
    pub body: Body,
}

impl Chaser {
    pub fn new(position: Vec3, yaw: f32, radius: f32, speed: f32) -> Self {
        Self {
            body: Body::new(BodyKind::Chaser, position, yaw, radius, speed),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }
}

fn neighbour(cell: (i32, i32), yaw: f32) -> (i32, i32) {
    cell_of(cell_center(cell.0, cell.1) + forward_for(yaw))
}

/// Turns out of `cell` that do not run into a wall, in priority order.
/// Reverse only shows up when straight, left and right are all blocked.
pub fn open_turns(maze: &Maze, cell: (i32, i32), yaw: f32) -> Vec<Turn> {
    let mut turns: Vec<Turn> = [Turn::Straight, Turn::Left, Turn::Right]
        .into_iter()
        .filter(|turn| {
            let (x, y) = neighbour(cell, yaw + turn.yaw_offset());
            !maze.is_wall(x, y)
        })
        .collect();
    if turns.is_empty() {
        let (x, y) = neighbour(cell, yaw + Turn::Reverse.yaw_offset());
        if !maze.is_wall(x, y) {
            turns.push(Turn::Reverse);
        }
    }
    turns
}

/// Picks uniformly among the open turns. `None` if the cell is walled in.
pub fn choose_turn(maze: &Maze, cell: (i32, i32), yaw: f32, rng: &mut impl Rng) -> Option<Turn> {
    open_turns(maze, cell, yaw).choose(rng).copied()
}

/// What a chaser does this frame: keep going, or snap onto `cell` and turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChaserMove {
    Advance,
    Turn { cell: (i32, i32), turn: Turn },
}

/// Decides a chaser's move without touching it. Headings are only
/// re-decided when the chaser's leading edge crosses into a new cell.
pub fn plan_chaser(
    index: usize,
    chaser: &Chaser,
    maze: &Maze,
    dt: f32,
    rng: &mut impl Rng,
) -> GameResult<ChaserMove> {
    let body = &chaser.body;
    let previous = cell_of(body.project(0.5));
    let current = cell_of(body.project(0.5 + dt * body.speed));
    if previous == current {
        return Ok(ChaserMove::Advance);
    }

    let cell = cell_of(body.position);
    let Some(turn) = choose_turn(maze, cell, body.yaw, rng) else {
        warn!(index, x = cell.0, y = cell.1, "chaser has no way out");
        return Err(GameError::ChaserTrapped {
            index,
            x: cell.0,
            y: cell.1,
        });
    };
    if turn != Turn::Straight {
        debug!(index, x = cell.0, y = cell.1, ?turn, "chaser turns");
    }
    Ok(ChaserMove::Turn { cell, turn })
}

pub fn apply_chaser(chaser: &mut Chaser, step: ChaserMove, dt: f32) {
    let body = &mut chaser.body;
    if let ChaserMove::Turn { cell, turn } = step {
        body.position = Vec3::new(cell.0 as f32, cell.1 as f32, round_half_up(body.position.z));
        body.set_yaw(body.yaw + turn.yaw_offset());
    }
    body.advance(dt);
    body.blend_state();
}

/// Plans and applies one chaser's move for a frame. On a turn the chaser is
/// snapped onto the cell it occupies first.
pub fn integrate_chaser(
    index: usize,
    chaser: &mut Chaser,
    maze: &Maze,
    dt: f32,
    rng: &mut impl Rng,
) -> GameResult<()> {
    let step = plan_chaser(index, chaser, maze, dt, rng)?;
    apply_chaser(chaser, step, dt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::f32::consts::{FRAC_PI_2, PI};

    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{choose_turn, integrate_chaser, open_turns, plan_chaser, Chaser, ChaserMove, Turn};
    use crate::body::{CHASER_RADIUS, CHASER_SPEED};
    use crate::error::GameError;
    use crate::geometry::cell_of;
    use crate::layout::DEFAULT_LAYOUT;
    use crate::maze::Maze;

    const EAST: f32 = -FRAC_PI_2;
    const NORTH: f32 = 0.0;
    const SOUTH: f32 = PI;

    const JUNCTION: &[&str] = &[
        "# # # # # # #",
        "#         P #",
        "# # #   # # #",
        "# # #   # # #",
        "# # # # # # #",
    ];

    fn chaser_at(x: f32, y: f32, yaw: f32) -> Chaser {
        Chaser::new(Vec3::new(x, y, 0.0), yaw, CHASER_RADIUS, CHASER_SPEED)
    }

    #[test]
    fn junction_offers_only_open_non_reverse_turns() {
        let maze = Maze::build(JUNCTION).unwrap();
        assert_eq!(open_turns(&maze, (3, -1), EAST), vec![Turn::Straight, Turn::Right]);
        assert_eq!(open_turns(&maze, (3, -2), NORTH), vec![Turn::Straight]);
    }

    #[test]
    fn random_choice_covers_every_open_turn() {
        let maze = Maze::build(JUNCTION).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let turn = choose_turn(&maze, (3, -1), EAST, &mut rng).unwrap();
            assert!(matches!(turn, Turn::Straight | Turn::Right));
            seen.insert(turn);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn dead_end_always_reverses() {
        let maze = Maze::build(JUNCTION).unwrap();
        assert_eq!(open_turns(&maze, (3, -3), SOUTH), vec![Turn::Reverse]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(choose_turn(&maze, (3, -3), SOUTH, &mut rng), Some(Turn::Reverse));
        }
    }

    #[test]
    fn chaser_reaching_dead_end_turns_back() {
        let maze = Maze::build(JUNCTION).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut chaser = chaser_at(3.0, -2.98, SOUTH);

        integrate_chaser(0, &mut chaser, &maze, 1.0 / 30.0, &mut rng).unwrap();

        assert!((chaser.body.forward() - Vec3::Y).length() < 1e-5);
        let expected = Vec3::new(3.0, -3.0 + 1.0 / 30.0, 0.0);
        assert!((chaser.position() - expected).length() < 1e-5);
    }

    #[test]
    fn mid_corridor_chaser_just_advances() {
        let maze = Maze::build(JUNCTION).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut chaser = chaser_at(2.0, -1.0, EAST);

        integrate_chaser(0, &mut chaser, &maze, 1.0 / 30.0, &mut rng).unwrap();

        let expected = Vec3::new(2.0 + 1.0 / 30.0, -1.0, 0.0);
        assert!((chaser.position() - expected).length() < 1e-5);
        assert!((chaser.body.forward() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn planning_leaves_the_chaser_untouched() {
        let maze = Maze::build(JUNCTION).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let chaser = chaser_at(3.0, -2.98, SOUTH);

        let step = plan_chaser(0, &chaser, &maze, 1.0 / 30.0, &mut rng).unwrap();

        assert_eq!(
            step,
            ChaserMove::Turn {
                cell: (3, -3),
                turn: Turn::Reverse
            }
        );
        assert_eq!(chaser.position(), Vec3::new(3.0, -2.98, 0.0));
    }

    #[test]
    fn walled_in_chaser_is_an_error() {
        let maze = Maze::build(&["# # # # #", "# G # P #", "# # # # #"]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut chaser = chaser_at(1.0, -1.0, SOUTH);

        let err = integrate_chaser(2, &mut chaser, &maze, 1.0 / 30.0, &mut rng).unwrap_err();

        assert!(matches!(err, GameError::ChaserTrapped { index: 2, x: 1, y: -1 }));
    }

    #[test]
    fn chasers_stay_in_open_cells_of_the_arcade_maze() {
        let maze = Maze::build(DEFAULT_LAYOUT).unwrap();
        let (sx, sy) = maze.chaser_spawns()[0];
        for seed in 0..4u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut chaser = chaser_at(sx as f32, sy as f32, EAST);
            for frame in 0..3000 {
                integrate_chaser(0, &mut chaser, &maze, 1.0 / 30.0, &mut rng).unwrap();
                let (x, y) = cell_of(chaser.position());
                assert!(
                    !maze.is_wall(x, y),
                    "seed={seed} frame={frame}: chaser entered wall at ({x}, {y})"
                );
            }
        }
    }
}
