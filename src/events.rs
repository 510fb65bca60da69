//! Structured change log emitted per move. The presentation layer replays
//! these to drive animation; the engine never waits on it.

use crate::board::{Pos, TokenColor, TokenId};
use crate::cascade::{TokenMove, TokenSpawn};

/// One token destroyed during a pass. `color` is None for whirlpools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedToken {
    pub id: TokenId,
    pub pos: Pos,
    pub color: Option<TokenColor>,
}

/// Ordered per-phase record of everything a move did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// Two cells exchanged by a player swap.
    Swapped { a: Pos, b: Pos },
    /// The swap produced no match and was undone.
    SwapReverted { a: Pos, b: Pos },
    /// One resolution pass removed these matched tokens.
    TokensRemoved {
        tokens: Vec<RemovedToken>,
        combo: u32,
        score_delta: u32,
    },
    /// A power-eligible cluster left a whirlpool behind.
    WhirlpoolSpawned { id: TokenId, pos: Pos, power: u8 },
    /// A whirlpool was activated and swept `rows` (start..end).
    WhirlpoolActivated {
        id: TokenId,
        pos: Pos,
        power: u8,
        rows: (usize, usize),
        tokens: Vec<RemovedToken>,
        score_delta: u32,
    },
    /// Gravity slid these tokens down.
    TokensFell { moves: Vec<TokenMove> },
    /// Refill spawned these tokens.
    TokensSpawned { spawns: Vec<TokenSpawn> },
    /// Score crossed a threshold.
    LevelUp { level: u32 },
    /// The board was rebuilt after a deadlock; renderers should re-read the
    /// snapshot rather than replay spawns.
    BoardRegenerated { attempts: u32 },
    /// Regeneration gave up; the board may have no legal swap.
    DeadlockAccepted { attempts: u32 },
}

/// Outcome of one top-level move (swap or activation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub score_delta: u32,
    pub combo_depth: u32,
    pub level_changed: bool,
    pub events: Vec<BoardEvent>,
}
