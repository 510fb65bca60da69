//! Engine-level rejections. All are local and recoverable; none poison state.

use thiserror::Error;

use crate::board::BOARD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("coordinate ({x}, {y}) is outside the {size}x{size} board", size = BOARD_SIZE)]
    OutOfBounds { x: usize, y: usize },

    #[error("cells ({x1}, {y1}) and ({x2}, {y2}) are not adjacent")]
    NotAdjacent {
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
    },

    #[error("a move is still resolving")]
    EngineBusy,

    #[error("no power token at ({x}, {y})")]
    NotAPowerToken { x: usize, y: usize },
}
