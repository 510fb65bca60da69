//! Whirlpool power tokens: spawned from big clusters, activated to sweep
//! whole rows.

use crate::board::{BOARD_SIZE, Board, Cell, Pos};
use crate::events::RemovedToken;

/// Power levels above this are clamped; 8-cell and larger clusters all
/// produce a level-2 whirlpool.
pub const MAX_POWER_LEVEL: u8 = 2;

/// Points per swept token, scaled by (1 + power).
const ROW_CLEAR_SCORE: u32 = 50;

/// Cluster size → power level: 5 → 0, 6–7 → 1, 8+ → 2.
pub fn power_level(cluster_size: usize) -> u8 {
    debug_assert!(cluster_size >= 5);
    (((cluster_size - 4) / 2) as u8).min(MAX_POWER_LEVEL)
}

/// Rows swept by an activation at row `y`: `1 + power` contiguous rows
/// centered on `y`, clamped to the grid (fewer rows at the edges).
pub fn row_window(y: usize, power: u8) -> (usize, usize) {
    let count = 1 + power as usize;
    let start = y.saturating_sub((count - 1) / 2);
    let end = (start + count).min(BOARD_SIZE);
    (start, end)
}

/// What an activation swept off the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Swept rows, start..end.
    pub rows: (usize, usize),
    /// Everything removed except the whirlpool itself.
    pub cleared: Vec<RemovedToken>,
    pub power: u8,
}

impl Activation {
    pub fn score(&self) -> u32 {
        self.cleared.len() as u32 * ROW_CLEAR_SCORE * (1 + u32::from(self.power))
    }
}

/// Sweep the window around (x, y) and remove the whirlpool itself. The caller
/// has already verified the cell holds a whirlpool of this `power`.
pub fn activate(board: &mut Board, pos: Pos, power: u8) -> Activation {
    let (x, y) = pos;
    let rows = row_window(y, power);
    let mut cleared = Vec::new();
    for row in rows.0..rows.1 {
        for col in 0..BOARD_SIZE {
            if (col, row) == (x, y) {
                continue;
            }
            let cell = board.cell(col, row);
            if let Some(id) = cell.id() {
                cleared.push(RemovedToken {
                    id,
                    pos: (col, row),
                    color: cell.color(),
                });
                board.put(col, row, Cell::Empty);
            }
        }
    }
    board.put(x, y, Cell::Empty);
    Activation {
        rows,
        cleared,
        power,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TokenColor, TokenIds};
    use crate::cascade::refill;
    use crate::rng::Lcg;

    #[test]
    fn power_level_maps_cluster_sizes() {
        assert_eq!(power_level(5), 0);
        assert_eq!(power_level(6), 1);
        assert_eq!(power_level(7), 1);
        assert_eq!(power_level(8), 2);
        assert_eq!(power_level(12), 2);
    }

    #[test]
    fn row_window_is_centered_and_clamped() {
        assert_eq!(row_window(4, 0), (4, 5));
        assert_eq!(row_window(4, 1), (4, 6));
        assert_eq!(row_window(4, 2), (3, 6));
        // Top edge: nothing above row 0 to sweep.
        assert_eq!(row_window(0, 2), (0, 3));
        // Bottom edge: window shrinks instead of wrapping.
        assert_eq!(row_window(BOARD_SIZE - 1, 1), (BOARD_SIZE - 1, BOARD_SIZE));
        assert_eq!(row_window(BOARD_SIZE - 1, 2), (BOARD_SIZE - 2, BOARD_SIZE));
    }

    #[test]
    fn activation_sweeps_only_its_band() {
        let mut board = Board::empty();
        let mut rng = Lcg::new(11);
        let mut ids = TokenIds::new();
        refill(&mut board, &mut rng, &mut ids);
        let wid = ids.next();
        board.set(3, 4, Cell::Whirlpool { power: 1, id: wid }).unwrap();

        let activation = activate(&mut board, (3, 4), 1);
        assert_eq!(activation.rows, (4, 6));
        // Two full rows minus the whirlpool cell.
        assert_eq!(activation.cleared.len(), 2 * BOARD_SIZE - 1);
        for y in 4..6 {
            for x in 0..BOARD_SIZE {
                assert!(board.get(x, y).unwrap().is_empty());
            }
        }
        // Rows outside the band are untouched.
        assert_eq!(board.count_non_empty(), 6 * BOARD_SIZE);
    }

    #[test]
    fn activation_score_scales_with_power() {
        let activation = Activation {
            rows: (0, 1),
            cleared: vec![
                RemovedToken { id: 1, pos: (0, 0), color: Some(TokenColor::Pink) };
                4
            ],
            power: 2,
        };
        assert_eq!(activation.score(), 4 * 50 * 3);
    }

    #[test]
    fn activation_removes_other_whirlpools_in_the_band() {
        let mut board = Board::empty();
        board.set(0, 2, Cell::Whirlpool { power: 0, id: 1 }).unwrap();
        board.set(5, 2, Cell::Whirlpool { power: 2, id: 2 }).unwrap();
        let activation = activate(&mut board, (0, 2), 0);
        assert_eq!(activation.cleared, vec![RemovedToken {
            id: 2,
            pos: (5, 2),
            color: None,
        }]);
        assert_eq!(board.count_non_empty(), 0);
    }
}
