//! Deadlock detection: does any single adjacent swap produce a match?

use crate::board::{BOARD_SIZE, Board};
use crate::matcher::find_clusters;

/// Trial-swap every cell with its right and bottom neighbor on a scratch
/// copy and scan for clusters. O(N⁴), fine at N = 8.
pub fn has_available_matches(board: &Board) -> bool {
    let mut scratch = board.clone();
    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE {
            if x + 1 < BOARD_SIZE && trial_swap(&mut scratch, (x, y), (x + 1, y)) {
                return true;
            }
            if y + 1 < BOARD_SIZE && trial_swap(&mut scratch, (x, y), (x, y + 1)) {
                return true;
            }
        }
    }
    false
}

fn trial_swap(scratch: &mut Board, a: (usize, usize), b: (usize, usize)) -> bool {
    exchange(scratch, a, b);
    let found = !find_clusters(scratch).is_empty();
    exchange(scratch, a, b);
    found
}

fn exchange(scratch: &mut Board, a: (usize, usize), b: (usize, usize)) {
    let (ca, cb) = (scratch.cell(a.0, a.1), scratch.cell(b.0, b.1));
    scratch.put(a.0, a.1, cb);
    scratch.put(b.0, b.1, ca);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, TokenColor, TokenIds};
    use crate::cascade::refill;
    use crate::rng::Lcg;

    /// Lattice with color (x + 2y) mod 5: provably no swap creates a run.
    fn deadlocked_board() -> Board {
        let mut board = Board::empty();
        let mut id = 1;
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                let color = TokenColor::ALL[(x + 2 * y) % 5];
                board.set(x, y, Cell::Token { color, id }).unwrap();
                id += 1;
            }
        }
        board
    }

    /// Brute-force twin written independently of the engine path: clone the
    /// board per trial instead of swap/restore.
    fn brute_force_has_move(board: &Board) -> bool {
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                    if nx >= BOARD_SIZE || ny >= BOARD_SIZE {
                        continue;
                    }
                    let mut copy = board.clone();
                    copy.swap((x, y), (nx, ny)).unwrap();
                    if !find_clusters(&copy).is_empty() {
                        return true;
                    }
                }
            }
        }
        false
    }

    #[test]
    fn lattice_board_is_deadlocked() {
        assert!(!has_available_matches(&deadlocked_board()));
    }

    #[test]
    fn one_planted_pair_makes_a_move_available() {
        let mut board = deadlocked_board();
        // Row 0 holds P B U G Y P B U; planting pink at (1,0) and (3,0)
        // lets the (2,0)↔(3,0) swap complete a pink triple.
        board.set(1, 0, Cell::Token { color: TokenColor::Pink, id: 100 }).unwrap();
        board.set(3, 0, Cell::Token { color: TokenColor::Pink, id: 101 }).unwrap();
        assert!(has_available_matches(&board));
    }

    #[test]
    fn empty_board_has_no_moves() {
        assert!(!has_available_matches(&Board::empty()));
    }

    #[test]
    fn trial_swaps_leave_the_board_untouched() {
        let board = deadlocked_board();
        let copy = board.clone();
        has_available_matches(&board);
        assert_eq!(board, copy);
    }

    #[test]
    fn agrees_with_brute_force_on_random_boards() {
        for seed in 1..20 {
            let mut board = Board::empty();
            let mut rng = Lcg::new(seed);
            let mut ids = TokenIds::new();
            refill(&mut board, &mut rng, &mut ids);
            assert_eq!(
                has_available_matches(&board),
                brute_force_has_move(&board),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn agrees_with_brute_force_on_fixed_boards() {
        let deadlocked = deadlocked_board();
        assert_eq!(
            has_available_matches(&deadlocked),
            brute_force_has_move(&deadlocked)
        );
        let mut solvable = deadlocked_board();
        solvable.set(1, 0, Cell::Token { color: TokenColor::Pink, id: 100 }).unwrap();
        solvable.set(3, 0, Cell::Token { color: TokenColor::Pink, id: 101 }).unwrap();
        assert_eq!(
            has_available_matches(&solvable),
            brute_force_has_move(&solvable)
        );
    }
}
