//! Match detection: run-length scan of every row and column, then a union
//! pass that fuses overlapping same-color runs into clusters.

use std::collections::HashSet;

use crate::board::{BOARD_SIZE, Board, Pos, TokenColor};

/// Minimum run length that counts as a match.
pub const MATCH_MIN: usize = 3;

/// Minimum merged cluster size that spawns a whirlpool.
pub const POWER_MIN: usize = 5;

/// One maximal run of ≥ MATCH_MIN same-colored tokens within a single line.
#[derive(Debug, Clone)]
struct Run {
    color: TokenColor,
    cells: Vec<Pos>,
}

/// A merged match: same-colored cells from one or more crossing runs.
/// Cells are sorted by (y, x) and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub color: TokenColor,
    pub cells: Vec<Pos>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_power_eligible(&self) -> bool {
        self.cells.len() >= POWER_MIN
    }

    /// Whirlpool spawn site: the midpoint entry of the merged member list.
    pub fn center(&self) -> Pos {
        self.cells[self.cells.len() / 2]
    }
}

/// Accumulate runs along one line of positions. Empties and whirlpools break
/// runs exactly like a color change.
fn scan_line(board: &Board, line: impl Iterator<Item = Pos>, runs: &mut Vec<Run>) {
    let mut current: Option<Run> = None;
    for (x, y) in line {
        match board.cell(x, y).color() {
            Some(c) => {
                if let Some(run) = current.as_mut() {
                    if run.color == c {
                        run.cells.push((x, y));
                        continue;
                    }
                }
                flush(&mut current, runs);
                current = Some(Run {
                    color: c,
                    cells: vec![(x, y)],
                });
            }
            None => flush(&mut current, runs),
        }
    }
    flush(&mut current, runs);
}

fn flush(current: &mut Option<Run>, runs: &mut Vec<Run>) {
    if let Some(run) = current.take() {
        if run.cells.len() >= MATCH_MIN {
            runs.push(run);
        }
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Scan the whole board for clusters. An empty result means the board is
/// settled. Output order is deterministic: clusters sorted by their lowest
/// (y, x) member.
pub fn find_clusters(board: &Board) -> Vec<Cluster> {
    let mut runs: Vec<Run> = Vec::new();
    for y in 0..BOARD_SIZE {
        scan_line(board, (0..BOARD_SIZE).map(|x| (x, y)), &mut runs);
    }
    for x in 0..BOARD_SIZE {
        scan_line(board, (0..BOARD_SIZE).map(|y| (x, y)), &mut runs);
    }

    // Union runs that share a cell (a horizontal and vertical run crossing).
    let sets: Vec<HashSet<Pos>> = runs
        .iter()
        .map(|r| r.cells.iter().copied().collect())
        .collect();
    let mut parent: Vec<usize> = (0..runs.len()).collect();
    for i in 0..runs.len() {
        for j in (i + 1)..runs.len() {
            if runs[i].color != runs[j].color {
                continue;
            }
            if !sets[i].is_disjoint(&sets[j]) {
                let (ri, rj) = (find_root(&mut parent, i), find_root(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    let mut root_to_cluster: Vec<Option<usize>> = vec![None; runs.len()];
    for i in 0..runs.len() {
        let root = find_root(&mut parent, i);
        let idx = match root_to_cluster[root] {
            Some(idx) => idx,
            None => {
                clusters.push(Cluster {
                    color: runs[i].color,
                    cells: Vec::new(),
                });
                root_to_cluster[root] = Some(clusters.len() - 1);
                clusters.len() - 1
            }
        };
        clusters[idx].cells.extend(runs[i].cells.iter().copied());
    }

    for cluster in &mut clusters {
        cluster.cells.sort_by_key(|&(x, y)| (y, x));
        cluster.cells.dedup();
    }
    clusters.sort_by_key(|c| {
        let (x, y) = c.cells[0];
        (y, x)
    });
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, TokenColor};

    /// Board from ASCII rows: letters are colors, '.' empty, '@' whirlpool.
    fn board_from(rows: &[&str]) -> Board {
        let mut board = Board::empty();
        let mut id = 1;
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '.' => Cell::Empty,
                    '@' => Cell::Whirlpool { power: 0, id },
                    'P' => Cell::Token { color: TokenColor::Pink, id },
                    'B' => Cell::Token { color: TokenColor::Blue, id },
                    'U' => Cell::Token { color: TokenColor::Purple, id },
                    'G' => Cell::Token { color: TokenColor::Green, id },
                    'Y' => Cell::Token { color: TokenColor::Yellow, id },
                    _ => panic!("bad cell char {ch}"),
                };
                id += 1;
                board.set(x, y, cell).unwrap();
            }
        }
        board
    }

    #[test]
    fn empty_board_has_no_clusters() {
        assert!(find_clusters(&Board::empty()).is_empty());
    }

    #[test]
    fn finds_a_horizontal_three() {
        let board = board_from(&["PPPB", ".GYB", "..GY"]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].color, TokenColor::Pink);
        assert_eq!(clusters[0].cells, vec![(0, 0), (1, 0), (2, 0)]);
        assert!(!clusters[0].is_power_eligible());
    }

    #[test]
    fn finds_a_vertical_three() {
        let board = board_from(&["B...", "B.G.", "B.Y."]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cells, vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn a_four_run_is_one_cluster_without_duplicates() {
        let board = board_from(&["GGGG"]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].cells, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn crossing_runs_merge_into_a_power_cluster() {
        // Vertical Y run through column 1 crosses a horizontal Y run in row 1.
        let board = board_from(&[".Y..", "YYY.", ".Y.."]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 5);
        assert!(clusters[0].is_power_eligible());
        // Sorted by (y, x): (1,0) (0,1) (1,1) (2,1) (1,2); midpoint is the cross.
        assert_eq!(clusters[0].center(), (1, 1));
    }

    #[test]
    fn whirlpools_break_runs() {
        let board = board_from(&["PP@P"]);
        assert!(find_clusters(&board).is_empty());
    }

    #[test]
    fn empties_break_runs() {
        let board = board_from(&["PP.P"]);
        assert!(find_clusters(&board).is_empty());
    }

    #[test]
    fn distinct_clusters_come_out_in_scan_order() {
        let board = board_from(&["BBB.....", "........", "GGG....."]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].color, TokenColor::Blue);
        assert_eq!(clusters[1].color, TokenColor::Green);
    }

    #[test]
    fn same_color_parallel_runs_stay_separate() {
        // Two pink rows separated by a gap row: no shared cell, no merge.
        let board = board_from(&["PPP.", "....", "PPP."]);
        let clusters = find_clusters(&board);
        assert_eq!(clusters.len(), 2);
    }
}
