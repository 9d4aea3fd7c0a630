use glam::Vec3;
use tracing::debug;

use crate::error::LayoutError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Pickup,
}

/// Rectangle covered by the parsed layout. `y` grows upward, so the top row
/// sits at `min_y + height - 1 == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub width: usize,
    pub height: usize,
}

impl GridBounds {
    pub fn max_x(&self) -> i32 {
        self.min_x + self.width as i32 - 1
    }

    pub fn max_y(&self) -> i32 {
        self.min_y + self.height as i32 - 1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x() && y >= self.min_y && y <= self.max_y()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        Some((x - self.min_x) as usize + (y - self.min_y) as usize * self.width)
    }
}

pub struct Maze {
    bounds: GridBounds,
    cells: Vec<Cell>,
    pickup_active: Vec<bool>,
    player_spawn: (i32, i32),
    chaser_spawns: Vec<(i32, i32)>,
    total_pickups: usize,
    pickups_remaining: usize,
}

impl Maze {
    /// Parses a layout table. Glyphs sit on even columns; odd columns are
    /// separators and are ignored.
    pub fn build(layout: &[&str]) -> Result<Maze, LayoutError> {
        if layout.is_empty() {
            return Err(LayoutError::EmptyLayout);
        }
        let width = layout
            .iter()
            .map(|row| row.chars().count().div_ceil(2))
            .max()
            .unwrap_or(0);
        let height = layout.len();
        let bounds = GridBounds {
            min_x: 0,
            min_y: -(height as i32 - 1),
            width,
            height,
        };

        let mut cells = vec![Cell::Empty; width * height];
        let mut player_spawn: Option<(i32, i32)> = None;
        let mut chaser_spawns = Vec::new();
        let mut total_pickups = 0;

        for (row, line) in layout.iter().enumerate() {
            let y = -(row as i32);
            for (column, glyph) in line.chars().enumerate().step_by(2) {
                let x = (column / 2) as i32;
                let Some(idx) = bounds.index(x, y) else {
                    continue;
                };
                match glyph {
                    '#' => cells[idx] = Cell::Wall,
                    '.' => {
                        cells[idx] = Cell::Pickup;
                        total_pickups += 1;
                    }
                    'P' => {
                        if let Some(first) = player_spawn {
                            return Err(LayoutError::MultiplePlayerSpawns {
                                first,
                                second: (x, y),
                            });
                        }
                        player_spawn = Some((x, y));
                    }
                    'G' => chaser_spawns.push((x, y)),
                    _ => {}
                }
            }
        }

        let player_spawn = player_spawn.ok_or(LayoutError::NoPlayerSpawn)?;
        let pickup_active = cells.iter().map(|c| *c == Cell::Pickup).collect();
        debug!(
            width,
            height,
            total_pickups,
            chaser_spawns = chaser_spawns.len(),
            "maze built"
        );

        Ok(Maze {
            bounds,
            cells,
            pickup_active,
            player_spawn,
            chaser_spawns,
            total_pickups,
            pickups_remaining: total_pickups,
        })
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Geometric center of the grid, at floor height.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.bounds.min_x + self.bounds.max_x()) as f32 / 2.0,
            (self.bounds.min_y + self.bounds.max_y()) as f32 / 2.0,
            0.0,
        )
    }

    pub fn cell(&self, x: i32, y: i32) -> Cell {
        self.bounds
            .index(x, y)
            .map(|idx| self.cells[idx])
            .unwrap_or(Cell::Empty)
    }

    /// Cells outside the layout count as open floor.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == Cell::Wall
    }

    pub fn is_pickup_active(&self, x: i32, y: i32) -> bool {
        self.bounds
            .index(x, y)
            .map(|idx| self.pickup_active[idx])
            .unwrap_or(false)
    }

    /// Marks a pickup consumed. Calling it on anything but an active pickup
    /// does nothing.
    pub fn consume_pickup(&mut self, x: i32, y: i32) {
        let Some(idx) = self.bounds.index(x, y) else {
            return;
        };
        if self.pickup_active[idx] {
            self.pickup_active[idx] = false;
            self.pickups_remaining -= 1;
            debug!(x, y, remaining = self.pickups_remaining, "pickup consumed");
        }
    }

    pub fn num_pickups_remaining(&self) -> usize {
        self.pickups_remaining
    }

    pub fn total_pickups(&self) -> usize {
        self.total_pickups
    }

    pub fn player_spawn(&self) -> (i32, i32) {
        self.player_spawn
    }

    pub fn chaser_spawns(&self) -> &[(i32, i32)] {
        &self.chaser_spawns
    }

    pub fn walls(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.positions()
            .filter(move |&(x, y)| self.cell(x, y) == Cell::Wall)
    }

    pub fn active_pickups(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.positions()
            .filter(move |&(x, y)| self.is_pickup_active(x, y))
    }

    fn positions(&self) -> impl Iterator<Item = (i32, i32)> {
        let b = self.bounds;
        (b.min_y..=b.max_y())
            .rev()
            .flat_map(move |y| (b.min_x..=b.max_x()).map(move |x| (x, y)))
    }
}
