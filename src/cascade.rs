//! Gravity and refill: compact each column downward, then spawn new tokens
//! into whatever stayed empty at the top.

use crate::board::{BOARD_SIZE, Board, Cell, Pos, TokenColor, TokenId, TokenIds, pick_color};
use crate::rng::Lcg;

/// One token sliding down a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMove {
    pub id: TokenId,
    pub from: Pos,
    pub to: Pos,
}

/// One freshly spawned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpawn {
    pub id: TokenId,
    pub pos: Pos,
    pub color: TokenColor,
}

/// Stable gravity: per column, non-empty cells keep their relative order and
/// sink to the bottom; empties bubble to the top. Returns the moves made.
pub fn apply_gravity(board: &mut Board) -> Vec<TokenMove> {
    let mut moves = Vec::new();
    for x in 0..BOARD_SIZE {
        let mut write = BOARD_SIZE;
        for y in (0..BOARD_SIZE).rev() {
            let cell = board.cell(x, y);
            if cell.is_empty() {
                continue;
            }
            write -= 1;
            if write != y {
                board.put(x, write, cell);
                board.put(x, y, Cell::Empty);
                if let Some(id) = cell.id() {
                    moves.push(TokenMove {
                        id,
                        from: (x, y),
                        to: (x, write),
                    });
                }
            }
        }
    }
    moves
}

/// Fill every remaining empty cell with a fresh token. Columns fill left to
/// right, top to bottom, so the picker only ever inspects settled cells.
pub fn refill(board: &mut Board, rng: &mut Lcg, ids: &mut TokenIds) -> Vec<TokenSpawn> {
    let mut spawns = Vec::new();
    for x in 0..BOARD_SIZE {
        for y in 0..BOARD_SIZE {
            if !board.cell(x, y).is_empty() {
                continue;
            }
            let color = pick_color(board, rng, x, y);
            let id = ids.next();
            board.put(x, y, Cell::Token { color, id });
            spawns.push(TokenSpawn {
                id,
                pos: (x, y),
                color,
            });
        }
    }
    spawns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(color: TokenColor, id: TokenId) -> Cell {
        Cell::Token { color, id }
    }

    #[test]
    fn gravity_compacts_a_column_preserving_order() {
        let mut board = Board::empty();
        // Column 2, top to bottom: A _ B _ C with gaps.
        board.set(2, 0, token(TokenColor::Pink, 1)).unwrap();
        board.set(2, 2, token(TokenColor::Blue, 2)).unwrap();
        board.set(2, 4, token(TokenColor::Green, 3)).unwrap();
        let moves = apply_gravity(&mut board);

        assert_eq!(board.get(2, BOARD_SIZE - 1).unwrap().id(), Some(3));
        assert_eq!(board.get(2, BOARD_SIZE - 2).unwrap().id(), Some(2));
        assert_eq!(board.get(2, BOARD_SIZE - 3).unwrap().id(), Some(1));
        for y in 0..BOARD_SIZE - 3 {
            assert!(board.get(2, y).unwrap().is_empty());
        }
        assert_eq!(moves.len(), 3);
        assert!(moves.iter().all(|m| m.from.0 == 2 && m.to.0 == 2));
    }

    #[test]
    fn gravity_leaves_settled_columns_alone() {
        let mut board = Board::empty();
        board.set(0, BOARD_SIZE - 1, token(TokenColor::Pink, 1)).unwrap();
        board.set(0, BOARD_SIZE - 2, token(TokenColor::Blue, 2)).unwrap();
        let before = board.clone();
        assert!(apply_gravity(&mut board).is_empty());
        assert_eq!(board, before);
    }

    #[test]
    fn gravity_moves_whirlpools_too() {
        let mut board = Board::empty();
        board.set(4, 1, Cell::Whirlpool { power: 1, id: 7 }).unwrap();
        let moves = apply_gravity(&mut board);
        assert_eq!(moves, vec![TokenMove {
            id: 7,
            from: (4, 1),
            to: (4, BOARD_SIZE - 1),
        }]);
        assert!(board.get(4, BOARD_SIZE - 1).unwrap().is_whirlpool());
    }

    #[test]
    fn refill_leaves_no_empties() {
        let mut board = Board::empty();
        let mut rng = Lcg::new(3);
        let mut ids = TokenIds::new();
        let spawns = refill(&mut board, &mut rng, &mut ids);
        assert_eq!(spawns.len(), BOARD_SIZE * BOARD_SIZE);
        assert_eq!(board.count_non_empty(), BOARD_SIZE * BOARD_SIZE);
    }

    #[test]
    fn refill_only_touches_empty_cells() {
        let mut board = Board::empty();
        let mut rng = Lcg::new(4);
        let mut ids = TokenIds::new();
        board.set(3, 7, Cell::Whirlpool { power: 2, id: 900 }).unwrap();
        let spawns = refill(&mut board, &mut rng, &mut ids);
        assert_eq!(spawns.len(), BOARD_SIZE * BOARD_SIZE - 1);
        assert_eq!(board.get(3, 7).unwrap(), Cell::Whirlpool { power: 2, id: 900 });
    }

    #[test]
    fn gravity_then_refill_restores_full_board() {
        let mut board = Board::empty();
        let mut rng = Lcg::new(5);
        let mut ids = TokenIds::new();
        refill(&mut board, &mut rng, &mut ids);
        // Punch a hole pattern and resettle.
        for x in 0..BOARD_SIZE {
            board.clear(x, 3).unwrap();
        }
        board.clear(0, 7).unwrap();
        apply_gravity(&mut board);
        refill(&mut board, &mut rng, &mut ids);
        assert_eq!(board.count_non_empty(), BOARD_SIZE * BOARD_SIZE);
    }
}
