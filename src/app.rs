//! App: terminal init, main loop, cursor/selection handling, and turning the
//! engine's event log into popups, fades and map reveals.

use crate::GameConfig;
use crate::board::{BOARD_SIZE, Pos};
use crate::engine::{Engine, EngineConfig};
use crate::events::{BoardEvent, MoveResult};
use crate::input::{Action, key_to_action};
use crate::rng::Lcg;
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::style::Color;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render frame budget (~60 FPS).
const FRAME_MS: u64 = 16;

/// Stagger between chained combo popups so cascades read sequentially.
const POPUP_STAGGER_MS: u32 = 250;

/// Popup lifetime once visible.
const POPUP_LIFE_MS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub x: usize,
    pub y: usize,
    pub amount: u32,
    pub combo: u32,
    /// Not drawn until the delay runs out; chained passes appear in order.
    pub delay_ms: u32,
    pub age_ms: u32,
    pub color: Color,
}

/// Treasure map sidebar: 3×3 blocks, one revealed per level-up. Pure
/// presentation state driven by LevelUp events; reset on restart.
#[derive(Debug)]
pub struct MapPanel {
    revealed: [bool; 9],
    rng: Lcg,
}

impl MapPanel {
    fn new(seed: u32) -> Self {
        Self {
            revealed: [false; 9],
            rng: Lcg::new(seed ^ 0x9E37_79B9),
        }
    }

    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.get(index).copied().unwrap_or(false)
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    fn reveal_random(&mut self) {
        let hidden: Vec<usize> = (0..9).filter(|&i| !self.revealed[i]).collect();
        if hidden.is_empty() {
            return;
        }
        let pick = hidden[self.rng.below(hidden.len() as u32) as usize];
        self.revealed[pick] = true;
    }

    fn reset(&mut self) {
        self.revealed = [false; 9];
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    engine: Engine,
    screen: Screen,
    paused: bool,
    cursor: Pos,
    selected: Option<Pos>,
    quit_selected: QuitOption,
    popups: Vec<ScorePopup>,
    map: MapPanel,
    /// When the last rejected/reverted move flashed the ✗.
    invalid_flash: Option<Instant>,
    /// Cells currently fading out (fed to the TachyonFX effect).
    removal_cells: Vec<(usize, usize)>,
    removal_effect: Option<Effect>,
    removal_process_time: Option<Instant>,
    last_frame: Instant,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let engine = Engine::new(EngineConfig {
            seed: config.seed,
            ..EngineConfig::default()
        });
        let map = MapPanel::new(config.seed);
        Self {
            config,
            theme,
            engine,
            screen: Screen::Playing,
            paused: false,
            cursor: (BOARD_SIZE / 2, BOARD_SIZE / 2),
            selected: None,
            quit_selected: QuitOption::Resume,
            popups: Vec::new(),
            map,
            invalid_flash: None,
            removal_cells: Vec::new(),
            removal_effect: None,
            removal_process_time: None,
            last_frame: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let snapshot = self.engine.snapshot();
            let invalid_age = self
                .invalid_flash
                .map(|t| now.saturating_duration_since(t).as_millis() as u64);
            let quit_selected =
                (self.screen == Screen::QuitMenu).then_some(self.quit_selected);
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &snapshot,
                    &self.theme,
                    self.paused,
                    self.cursor,
                    self.selected,
                    &self.popups,
                    invalid_age,
                    &self.map,
                    &self.removal_cells,
                    &mut self.removal_effect,
                    &mut self.removal_process_time,
                    now,
                    self.config.no_animation,
                    quit_selected,
                )
            })?;

            // Retire the fade once done so stale cells stop rendering.
            if self.removal_effect.as_ref().is_some_and(|e| e.done()) {
                self.removal_effect = None;
                self.removal_process_time = None;
                self.removal_cells.clear();
            }
            if invalid_age.is_some_and(|ms| ms >= crate::ui::INVALID_FLASH_MS) {
                self.invalid_flash = None;
            }

            let delta_ms = self
                .last_frame
                .elapsed()
                .as_millis()
                .min(u32::MAX as u128) as u32;
            self.last_frame = now;
            self.tick_popups(delta_ms);

            let timeout = Duration::from_millis(FRAME_MS);
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        let action = key_to_action(key);
                        let quit = match self.screen {
                            Screen::Playing => self.handle_playing(action),
                            Screen::QuitMenu => self.handle_quit_menu(action),
                        };
                        if quit {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_playing(&mut self, action: Action) -> bool {
        if self.paused {
            match action {
                Action::Pause => self.paused = false,
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ => {}
            }
            return false;
        }
        match action {
            Action::CursorLeft => self.cursor.0 = self.cursor.0.saturating_sub(1),
            Action::CursorRight => self.cursor.0 = (self.cursor.0 + 1).min(BOARD_SIZE - 1),
            Action::CursorUp => self.cursor.1 = self.cursor.1.saturating_sub(1),
            Action::CursorDown => self.cursor.1 = (self.cursor.1 + 1).min(BOARD_SIZE - 1),
            Action::Select => self.select(),
            Action::Deselect => self.selected = None,
            Action::Pause => self.paused = true,
            Action::Restart => self.restart(),
            Action::Quit => {
                self.screen = Screen::QuitMenu;
                self.quit_selected = QuitOption::Resume;
            }
            Action::None => {}
        }
        false
    }

    fn handle_quit_menu(&mut self, action: Action) -> bool {
        match action {
            Action::CursorDown | Action::CursorRight => {
                self.quit_selected = match self.quit_selected {
                    QuitOption::Resume => QuitOption::Restart,
                    QuitOption::Restart => QuitOption::Exit,
                    QuitOption::Exit => QuitOption::Resume,
                };
            }
            Action::CursorUp | Action::CursorLeft => {
                self.quit_selected = match self.quit_selected {
                    QuitOption::Resume => QuitOption::Exit,
                    QuitOption::Restart => QuitOption::Resume,
                    QuitOption::Exit => QuitOption::Restart,
                };
            }
            Action::Select => match self.quit_selected {
                QuitOption::Resume => self.screen = Screen::Playing,
                QuitOption::Restart => {
                    self.restart();
                    self.screen = Screen::Playing;
                }
                QuitOption::Exit => return true,
            },
            Action::Pause | Action::Quit => self.screen = Screen::Playing,
            _ => {}
        }
        false
    }

    /// Select/swap/activate at the cursor: a whirlpool activates immediately,
    /// an adjacent pair swaps, and a second click anywhere else just drops
    /// the selection.
    fn select(&mut self) {
        let cursor = self.cursor;
        let snapshot = self.engine.snapshot();
        let cell = snapshot.cells[cursor.1][cursor.0];

        if cell.is_whirlpool() && self.selected.is_none() {
            match self.engine.request_activate(cursor) {
                Ok(result) => self.consume(result),
                Err(_) => self.invalid_flash = Some(Instant::now()),
            }
            return;
        }

        match self.selected.take() {
            Some(prev) if prev == cursor => {}
            Some(prev) if prev.0.abs_diff(cursor.0) + prev.1.abs_diff(cursor.1) == 1 => {
                match self.engine.request_swap(prev, cursor) {
                    Ok(result) => self.consume(result),
                    Err(_) => self.invalid_flash = Some(Instant::now()),
                }
            }
            Some(_) => {}
            None => self.selected = Some(cursor),
        }
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.map.reset();
        self.popups.clear();
        self.selected = None;
        self.paused = false;
        self.invalid_flash = None;
        self.removal_cells.clear();
        self.removal_effect = None;
        self.removal_process_time = None;
    }

    /// Walk one move's event log and schedule its presentation.
    fn consume(&mut self, result: MoveResult) {
        let mut stagger = 0u32;
        for event in &result.events {
            match event {
                BoardEvent::SwapReverted { .. } => {
                    self.invalid_flash = Some(Instant::now());
                }
                BoardEvent::TokensRemoved {
                    tokens,
                    combo,
                    score_delta,
                } => {
                    if let Some(first) = tokens.first() {
                        self.popups.push(ScorePopup {
                            x: first.pos.0,
                            y: first.pos.1,
                            amount: *score_delta,
                            combo: *combo,
                            delay_ms: stagger,
                            age_ms: 0,
                            color: Color::Yellow,
                        });
                    }
                    self.removal_cells.extend(tokens.iter().map(|t| t.pos));
                    stagger += POPUP_STAGGER_MS;
                }
                BoardEvent::WhirlpoolActivated {
                    pos,
                    tokens,
                    score_delta,
                    ..
                } => {
                    self.popups.push(ScorePopup {
                        x: pos.0,
                        y: pos.1,
                        amount: *score_delta,
                        combo: 1,
                        delay_ms: stagger,
                        age_ms: 0,
                        color: self.theme.whirlpool,
                    });
                    self.removal_cells.push(*pos);
                    self.removal_cells.extend(tokens.iter().map(|t| t.pos));
                    stagger += POPUP_STAGGER_MS;
                }
                BoardEvent::LevelUp { .. } => self.map.reveal_random(),
                BoardEvent::BoardRegenerated { .. } => {
                    // The grid was rebuilt wholesale; a fade over the old
                    // positions would lie.
                    self.removal_cells.clear();
                }
                _ => {}
            }
        }
        if !self.removal_cells.is_empty() {
            self.removal_effect = None;
            self.removal_process_time = None;
        }
    }

    fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            if p.delay_ms > 0 {
                p.delay_ms = p.delay_ms.saturating_sub(delta_ms);
                return true;
            }
            let old_steps = p.age_ms / 300;
            p.age_ms += delta_ms;
            let new_steps = p.age_ms / 300;
            if new_steps > old_steps && p.y > 0 {
                p.y -= 1; // Float up smoothly
            }
            p.age_ms < POPUP_LIFE_MS
        });
    }
}
