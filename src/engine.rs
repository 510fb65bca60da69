//! Move orchestration: validates swaps and activations, runs the
//! match→remove→cascade→refill loop until the board settles, keeps
//! score/level/move accounting, and emits the per-move event log.

use crate::board::{BOARD_SIZE, Board, Cell, Pos, TokenIds, pick_color};
use crate::cascade::{apply_gravity, refill};
use crate::deadlock::has_available_matches;
use crate::error::EngineError;
use crate::events::{BoardEvent, MoveResult, RemovedToken};
use crate::matcher::{Cluster, find_clusters};
use crate::rng::Lcg;
use crate::whirlpool::{activate, power_level};

/// Cumulative score required to leave each level (index = current level).
pub const LEVEL_THRESHOLDS: [u32; 10] = [0, 100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200];

/// Full-board rebuilds before a deadlocked board is accepted as-is.
const REGEN_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub seed: u32,
    pub thresholds: Vec<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            thresholds: LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    pub score: u32,
    pub moves: u32,
    pub level: u32,
    pub combo: u32,
    /// Score needed for the next level; None once the table is exhausted.
    pub next_threshold: Option<u32>,
    /// Regeneration gave up on a deadlocked board; play may be stuck.
    pub deadlock_warning: bool,
}

/// The board engine. Owns all game state; callers see snapshots and events.
#[derive(Debug)]
pub struct Engine {
    board: Board,
    rng: Lcg,
    ids: TokenIds,
    thresholds: Vec<u32>,
    score: u32,
    moves: u32,
    level: u32,
    combo: u32,
    resolving: bool,
    deadlock_warning: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            board: Board::empty(),
            rng: Lcg::new(config.seed),
            ids: TokenIds::new(),
            thresholds: config.thresholds,
            score: 0,
            moves: 0,
            level: 1,
            combo: 0,
            resolving: false,
            deadlock_warning: false,
        };
        engine.rebuild_board();
        engine
    }

    /// Fresh board, zeroed counters. The RNG keeps running, so consecutive
    /// games from one seed differ but the whole session stays reproducible.
    pub fn restart(&mut self) {
        self.ids = TokenIds::new();
        self.score = 0;
        self.moves = 0;
        self.level = 1;
        self.combo = 0;
        self.resolving = false;
        self.deadlock_warning = false;
        self.rebuild_board();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: self.board.cells(),
            score: self.score,
            moves: self.moves,
            level: self.level,
            combo: self.combo,
            next_threshold: self.thresholds.get(self.level as usize).copied(),
            deadlock_warning: self.deadlock_warning,
        }
    }

    /// Swap two adjacent cells. A swap that yields no match is undone and
    /// costs nothing; otherwise the full cascade loop runs to a settled
    /// board before this returns.
    pub fn request_swap(&mut self, a: Pos, b: Pos) -> Result<MoveResult, EngineError> {
        if self.resolving {
            return Err(EngineError::EngineBusy);
        }
        self.board.get(a.0, a.1)?;
        self.board.get(b.0, b.1)?;
        if a.0.abs_diff(b.0) + a.1.abs_diff(b.1) != 1 {
            return Err(EngineError::NotAdjacent {
                x1: a.0,
                y1: a.1,
                x2: b.0,
                y2: b.1,
            });
        }

        self.board.swap(a, b)?;
        self.resolving = true;
        self.moves += 1;
        self.combo = 0;
        let mut events = vec![BoardEvent::Swapped { a, b }];

        let clusters = find_clusters(&self.board);
        if clusters.is_empty() {
            self.board.swap(a, b)?;
            self.moves -= 1;
            events.push(BoardEvent::SwapReverted { a, b });
            self.resolving = false;
            return Ok(MoveResult {
                score_delta: 0,
                combo_depth: 0,
                level_changed: false,
                events,
            });
        }

        let (score_delta, level_changed) = self.resolve(clusters, &mut events);
        self.settle(&mut events);
        self.resolving = false;
        Ok(MoveResult {
            score_delta,
            combo_depth: self.combo,
            level_changed,
            events,
        })
    }

    /// Activate the whirlpool at `pos`: sweep its row band, then run the
    /// same cascade loop a swap would.
    pub fn request_activate(&mut self, pos: Pos) -> Result<MoveResult, EngineError> {
        if self.resolving {
            return Err(EngineError::EngineBusy);
        }
        let cell = self.board.get(pos.0, pos.1)?;
        let Cell::Whirlpool { power, id } = cell else {
            return Err(EngineError::NotAPowerToken { x: pos.0, y: pos.1 });
        };

        self.resolving = true;
        self.moves += 1;
        self.combo = 0;
        let mut events = Vec::new();

        let activation = activate(&mut self.board, pos, power);
        let sweep_score = activation.score();
        self.score += sweep_score;
        events.push(BoardEvent::WhirlpoolActivated {
            id,
            pos,
            power,
            rows: activation.rows,
            tokens: activation.cleared,
            score_delta: sweep_score,
        });
        let mut level_changed = self.check_level_up(&mut events);

        let moves = apply_gravity(&mut self.board);
        if !moves.is_empty() {
            events.push(BoardEvent::TokensFell { moves });
        }
        let spawns = refill(&mut self.board, &mut self.rng, &mut self.ids);
        if !spawns.is_empty() {
            events.push(BoardEvent::TokensSpawned { spawns });
        }

        let clusters = find_clusters(&self.board);
        let (chained_score, chained_level) = self.resolve(clusters, &mut events);
        level_changed |= chained_level;
        self.settle(&mut events);
        self.resolving = false;
        Ok(MoveResult {
            score_delta: sweep_score + chained_score,
            combo_depth: self.combo,
            level_changed,
            events,
        })
    }

    /// Iterative resolution: remove, score, spawn whirlpools, level-check,
    /// cascade, refill, re-scan, looping until a scan comes back empty.
    fn resolve(&mut self, initial: Vec<Cluster>, events: &mut Vec<BoardEvent>) -> (u32, bool) {
        let mut total = 0u32;
        let mut level_changed = false;
        let mut clusters = initial;
        while !clusters.is_empty() {
            self.combo += 1;
            // Per removed token: 10·combo base plus a level bonus of
            // floor(base · level / 10).
            let base = 10 * self.combo;
            let per_token = base + base * self.level / 10;

            let power_sites: Vec<(Pos, usize)> = clusters
                .iter()
                .filter(|c| c.is_power_eligible())
                .map(|c| (c.center(), c.len()))
                .collect();

            let mut removed = Vec::new();
            for cluster in &clusters {
                for &(x, y) in &cluster.cells {
                    let cell = self.board.cell(x, y);
                    if let Some(id) = cell.id() {
                        removed.push(RemovedToken {
                            id,
                            pos: (x, y),
                            color: cell.color(),
                        });
                    }
                    self.board.put(x, y, Cell::Empty);
                }
            }
            let pass_score = per_token * removed.len() as u32;
            self.score += pass_score;
            total += pass_score;
            events.push(BoardEvent::TokensRemoved {
                tokens: removed,
                combo: self.combo,
                score_delta: pass_score,
            });

            for (site, size) in power_sites {
                let power = power_level(size);
                let id = self.ids.next();
                self.board.put(site.0, site.1, Cell::Whirlpool { power, id });
                events.push(BoardEvent::WhirlpoolSpawned {
                    id,
                    pos: site,
                    power,
                });
            }

            level_changed |= self.check_level_up(events);

            let moves = apply_gravity(&mut self.board);
            if !moves.is_empty() {
                events.push(BoardEvent::TokensFell { moves });
            }
            let spawns = refill(&mut self.board, &mut self.rng, &mut self.ids);
            if !spawns.is_empty() {
                events.push(BoardEvent::TokensSpawned { spawns });
            }

            clusters = find_clusters(&self.board);
        }
        (total, level_changed)
    }

    /// At most one level per resolution pass, even when one award spans
    /// several thresholds.
    fn check_level_up(&mut self, events: &mut Vec<BoardEvent>) -> bool {
        let idx = self.level as usize;
        if idx >= self.thresholds.len() {
            return false;
        }
        if self.score >= self.thresholds[idx] {
            self.level += 1;
            events.push(BoardEvent::LevelUp { level: self.level });
            return true;
        }
        false
    }

    /// Post-settle deadlock handling. A board carrying a whirlpool always
    /// has a legal move, so regeneration is skipped.
    fn settle(&mut self, events: &mut Vec<BoardEvent>) {
        if self.board.has_whirlpool() || has_available_matches(&self.board) {
            return;
        }
        let attempts = self.rebuild_board();
        events.push(BoardEvent::BoardRegenerated { attempts });
        if self.deadlock_warning {
            events.push(BoardEvent::DeadlockAccepted { attempts });
        }
    }

    /// Rebuild the whole grid until it is both match-free and solvable, up
    /// to REGEN_ATTEMPTS; then take what we got and flag it.
    fn rebuild_board(&mut self) -> u32 {
        let mut attempts = 0;
        loop {
            attempts += 1;
            self.fill_board();
            if find_clusters(&self.board).is_empty() && has_available_matches(&self.board) {
                self.deadlock_warning = false;
                return attempts;
            }
            if attempts >= REGEN_ATTEMPTS {
                self.deadlock_warning = !has_available_matches(&self.board);
                return attempts;
            }
        }
    }

    /// Discard the grid and refill every cell, left-to-right, top-to-bottom,
    /// so the picker only ever sees already-placed neighbors.
    fn fill_board(&mut self) {
        self.board = Board::empty();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                let color = pick_color(&self.board, &mut self.rng, x, y);
                let id = self.ids.next();
                self.board.put(x, y, Cell::Token { color, id });
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}
