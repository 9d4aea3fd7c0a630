use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    EmptyLayout,
    #[error("layout has no player spawn (P)")]
    NoPlayerSpawn,
    #[error("layout has more than one player spawn: ({}, {}) and ({}, {})", .first.0, .first.1, .second.0, .second.1)]
    MultiplePlayerSpawns {
        first: (i32, i32),
        second: (i32, i32),
    },
    #[error("layout has no chaser spawn (G) but {requested} chasers were requested")]
    NoChaserSpawn { requested: usize },
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// Every heading out of the chaser's cell is a wall. The layout is unsound.
    #[error("chaser {index} is walled in at ({x}, {y})")]
    ChaserTrapped { index: usize, x: i32, y: i32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
