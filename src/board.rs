//! Grid primitives: cells, token identity, bounds-checked board operations,
//! and the no-instant-match color picker.

use crate::error::EngineError;
use crate::rng::Lcg;

/// Board edge length. Fixed at build time; coordinates are (x, y) in [0, BOARD_SIZE).
pub const BOARD_SIZE: usize = 8;

/// Color-pick retries before accepting a match-forming color. The relaxation
/// means a freshly filled board may rarely carry a latent match; the resolve
/// loop picks it up on the next scan.
const PICK_ATTEMPTS: u32 = 10;

/// Grid coordinate, (x, y), y = 0 at the top.
pub type Pos = (usize, usize);

/// Stable token identity. Survives gravity; dies with the token.
pub type TokenId = u32;

/// Token colors (the five jellyfish).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenColor {
    Pink,
    Blue,
    Purple,
    Green,
    Yellow,
}

impl TokenColor {
    pub const ALL: [Self; 5] = [
        Self::Pink,
        Self::Blue,
        Self::Purple,
        Self::Green,
        Self::Yellow,
    ];

    /// Index into theme token colors.
    pub fn index(self) -> usize {
        match self {
            Self::Pink => 0,
            Self::Blue => 1,
            Self::Purple => 2,
            Self::Green => 3,
            Self::Yellow => 4,
        }
    }
}

/// Single cell: empty, a colored token, or a whirlpool power token.
/// Whirlpools have no color; the match scanner treats them like gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Token { color: TokenColor, id: TokenId },
    Whirlpool { power: u8, id: TokenId },
}

impl Cell {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    #[inline]
    pub fn is_whirlpool(self) -> bool {
        matches!(self, Self::Whirlpool { .. })
    }

    /// Color of a plain token; None for empties and whirlpools.
    #[inline]
    pub fn color(self) -> Option<TokenColor> {
        match self {
            Self::Token { color, .. } => Some(color),
            _ => None,
        }
    }

    /// Identity of any live token.
    #[inline]
    pub fn id(self) -> Option<TokenId> {
        match self {
            Self::Empty => None,
            Self::Token { id, .. } | Self::Whirlpool { id, .. } => Some(id),
        }
    }
}

/// Allocator for token ids. Monotonic; never reused within one game.
#[derive(Debug, Clone)]
pub struct TokenIds {
    next: TokenId,
}

impl TokenIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> TokenId {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for TokenIds {
    fn default() -> Self {
        Self::new()
    }
}

/// The grid. rows[y][x]; y = 0 is the top row, gravity pulls toward y = BOARD_SIZE - 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    fn check_bounds(x: usize, y: usize) -> Result<(), EngineError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(EngineError::OutOfBounds { x, y });
        }
        Ok(())
    }

    pub fn get(&self, x: usize, y: usize) -> Result<Cell, EngineError> {
        Self::check_bounds(x, y)?;
        Ok(self.cells[y][x])
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), EngineError> {
        Self::check_bounds(x, y)?;
        self.cells[y][x] = cell;
        Ok(())
    }

    pub fn clear(&mut self, x: usize, y: usize) -> Result<(), EngineError> {
        self.set(x, y, Cell::Empty)
    }

    /// Exchange two cells in place. Adjacency is the caller's business;
    /// swapping a cell with itself is not.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<(), EngineError> {
        debug_assert_ne!(a, b);
        Self::check_bounds(a.0, a.1)?;
        Self::check_bounds(b.0, b.1)?;
        let tmp = self.cells[a.1][a.0];
        self.cells[a.1][a.0] = self.cells[b.1][b.0];
        self.cells[b.1][b.0] = tmp;
        Ok(())
    }

    /// Unchecked read for scanners whose loops stay inside BOARD_SIZE.
    #[inline]
    pub(crate) fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y][x]
    }

    /// Unchecked write for internal passes whose loops stay inside BOARD_SIZE.
    #[inline]
    pub(crate) fn put(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y][x] = cell;
    }

    pub(crate) fn count_non_empty(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| !c.is_empty())
            .count()
    }

    pub(crate) fn has_whirlpool(&self) -> bool {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .any(|c| c.is_whirlpool())
    }

    pub(crate) fn cells(&self) -> [[Cell; BOARD_SIZE]; BOARD_SIZE] {
        self.cells
    }
}

/// True if placing `color` at (x, y) would complete a run of 3 with the two
/// cells immediately left or immediately above. Those two directions suffice
/// because boards are filled left-to-right, top-to-bottom.
pub fn would_complete_run(board: &Board, x: usize, y: usize, color: TokenColor) -> bool {
    if x >= 2
        && board.cell(x - 1, y).color() == Some(color)
        && board.cell(x - 2, y).color() == Some(color)
    {
        return true;
    }
    if y >= 2
        && board.cell(x, y - 1).color() == Some(color)
        && board.cell(x, y - 2).color() == Some(color)
    {
        return true;
    }
    false
}

/// Pick a color for (x, y) that does not instantly match, retrying up to
/// PICK_ATTEMPTS times and then accepting whatever came up last.
pub fn pick_color(board: &Board, rng: &mut Lcg, x: usize, y: usize) -> TokenColor {
    let mut candidate = TokenColor::ALL[rng.below(TokenColor::ALL.len() as u32) as usize];
    let mut attempts = 1;
    while would_complete_run(board, x, y, candidate) && attempts < PICK_ATTEMPTS {
        candidate = TokenColor::ALL[rng.below(TokenColor::ALL.len() as u32) as usize];
        attempts += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(color: TokenColor, id: TokenId) -> Cell {
        Cell::Token { color, id }
    }

    #[test]
    fn get_and_set_reject_out_of_bounds() {
        let mut board = Board::empty();
        assert_eq!(
            board.get(BOARD_SIZE, 0),
            Err(EngineError::OutOfBounds { x: BOARD_SIZE, y: 0 })
        );
        assert_eq!(
            board.set(0, BOARD_SIZE, Cell::Empty),
            Err(EngineError::OutOfBounds { x: 0, y: BOARD_SIZE })
        );
        assert!(board.get(BOARD_SIZE - 1, BOARD_SIZE - 1).is_ok());
    }

    #[test]
    fn swap_is_an_involution() {
        let mut board = Board::empty();
        board.set(0, 0, token(TokenColor::Pink, 1)).unwrap();
        board.set(1, 0, token(TokenColor::Blue, 2)).unwrap();
        let before = board.clone();
        board.swap((0, 0), (1, 0)).unwrap();
        assert_eq!(board.get(0, 0).unwrap(), token(TokenColor::Blue, 2));
        board.swap((0, 0), (1, 0)).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn clear_empties_the_cell() {
        let mut board = Board::empty();
        board.set(3, 4, token(TokenColor::Green, 9)).unwrap();
        board.clear(3, 4).unwrap();
        assert!(board.get(3, 4).unwrap().is_empty());
    }

    #[test]
    fn picker_avoids_completing_a_left_run() {
        let mut board = Board::empty();
        board.set(0, 0, token(TokenColor::Pink, 1)).unwrap();
        board.set(1, 0, token(TokenColor::Pink, 2)).unwrap();
        let mut rng = Lcg::new(1);
        for _ in 0..50 {
            assert_ne!(pick_color(&board, &mut rng, 2, 0), TokenColor::Pink);
        }
    }

    #[test]
    fn picker_avoids_completing_an_above_run() {
        let mut board = Board::empty();
        board.set(5, 0, token(TokenColor::Yellow, 1)).unwrap();
        board.set(5, 1, token(TokenColor::Yellow, 2)).unwrap();
        let mut rng = Lcg::new(2);
        for _ in 0..50 {
            assert_ne!(pick_color(&board, &mut rng, 5, 2), TokenColor::Yellow);
        }
    }

    #[test]
    fn whirlpools_do_not_count_toward_runs() {
        let mut board = Board::empty();
        board.set(0, 0, token(TokenColor::Pink, 1)).unwrap();
        board.set(1, 0, Cell::Whirlpool { power: 0, id: 2 }).unwrap();
        assert!(!would_complete_run(&board, 2, 0, TokenColor::Pink));
    }

    #[test]
    fn token_ids_are_unique_and_monotonic() {
        let mut ids = TokenIds::new();
        let a = ids.next();
        let b = ids.next();
        let c = ids.next();
        assert!(a < b && b < c);
    }
}
