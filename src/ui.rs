//! Layout and drawing: board, cursor, sidebar, treasure map, pause and quit
//! overlays, score popups, removal fade.

use crate::app::{MapPanel, QuitOption, ScorePopup, Screen};
use crate::board::{BOARD_SIZE, Cell};
use crate::engine::Snapshot;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is 2 terminal columns wide, 1 row tall.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;

/// Duration of the removal fade (TachyonFX) in ms.
const REMOVAL_FADE_MS: u32 = 400;

/// How long the invalid-swap ✗ stays on screen.
pub const INVALID_FLASH_MS: u64 = 600;

/// Board size in terminal cells (border + grid).
fn board_pixel_size() -> (u16, u16) {
    (BOARD_SIZE as u16 * CELL_WIDTH + 2, BOARD_SIZE as u16 + 2)
}

/// Sidebar drives the centered strip height; it is taller than the board.
const STRIP_HEIGHT: u16 = 25;

/// Board inner rect (grid only, no border) for given area; matches draw_game layout.
fn board_rect(area: Rect) -> Rect {
    let (pw, ph) = board_pixel_size();
    let total_w = pw + SIDEBAR_WIDTH;
    let strip_h = ph.max(STRIP_HEIGHT);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(strip_h) / 2;
    let outer = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    };
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (BOARD_SIZE as u16 * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (BOARD_SIZE as u16).min(outer.height.saturating_sub(2)),
    }
}

/// Build set of buffer (x, y) positions covered by the given grid cells.
fn cell_buffer_positions(rect: Rect, cells: &[(usize, usize)]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = rect.x + (gx as u16) * CELL_WIDTH;
        let y0 = rect.y + gy as u16;
        for bx in x0..(x0 + CELL_WIDTH).min(rect.x + rect.width) {
            if y0 < rect.y + rect.height {
                set.insert((bx, y0));
            }
        }
    }
    set
}

/// Create or update the removal fade effect and process it (fade cleared
/// cells back from white to the board colours).
fn apply_removal_effect(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    removal_cells: &[(usize, usize)],
    removal_effect: &mut Option<Effect>,
    removal_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let rect = board_rect(area);
    let delta = removal_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *removal_process_time = Some(now);

    if removal_effect.is_none() {
        let fading_set = cell_buffer_positions(rect, removal_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            fading_set.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (REMOVAL_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(rect);
        *removal_effect = Some(effect);
    }

    if let Some(effect) = removal_effect {
        frame.render_effect(effect, rect, tfx_delta);
    }
}

/// Draw the current screen, with optional pause overlay, quit menu, invalid
/// flash and removal fade.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    snapshot: &Snapshot,
    theme: &Theme,
    paused: bool,
    cursor: (usize, usize),
    selected: Option<(usize, usize)>,
    popups: &[ScorePopup],
    invalid_flash_age_ms: Option<u64>,
    map: &MapPanel,
    removal_cells: &[(usize, usize)],
    removal_effect: &mut Option<Effect>,
    removal_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
    quit_selected: Option<QuitOption>,
) {
    let area = frame.area();
    draw_game(frame, snapshot, theme, cursor, selected, popups, map, area);

    if !removal_cells.is_empty() && !no_animation {
        apply_removal_effect(
            frame,
            theme,
            area,
            removal_cells,
            removal_effect,
            removal_process_time,
            now,
        );
    }

    if let Some(age) = invalid_flash_age_ms {
        if age < INVALID_FLASH_MS {
            draw_invalid_flash(frame, theme, area);
        }
    }

    if paused {
        draw_pause_overlay(frame, theme, area);
    }

    if screen == Screen::QuitMenu {
        if let Some(opt) = quit_selected {
            draw_quit_menu(frame, theme, opt);
        }
    }
}

fn draw_game(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    cursor: (usize, usize),
    selected: Option<(usize, usize)>,
    popups: &[ScorePopup],
    map: &MapPanel,
    area: Rect,
) {
    let (pw, ph) = board_pixel_size();
    let total_w = pw + SIDEBAR_WIDTH;

    // Center horizontally
    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    // Center vertically; sidebar is taller than the board.
    let sidebar_h = ph.max(STRIP_HEIGHT);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(sidebar_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let (board_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(vert_chunks[1]);
        (inner[0], inner[1])
    };
    let board_outer = Rect {
        height: ph.min(board_area.height),
        ..board_area
    };

    draw_board(frame, snapshot, theme, cursor, selected, popups, board_outer);
    draw_sidebar(frame, snapshot, theme, map, sidebar_area);
}

fn draw_board(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    cursor: (usize, usize),
    selected: Option<(usize, usize)>,
    popups: &[ScorePopup],
    outer: Rect,
) {
    let title = format!(" Reefswap  | Moves: {} ", snapshot.moves);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let rect = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let buf = frame.buffer_mut();

    for y in 0..BOARD_SIZE {
        for x in 0..BOARD_SIZE {
            let rx = rect.x + (x as u16) * CELL_WIDTH;
            let ry = rect.y + y as u16;
            if rx + 1 >= rect.x + rect.width || ry >= rect.y + rect.height {
                continue;
            }

            let cell = snapshot.cells[y][x];
            let (left, right, style) = match cell {
                Cell::Token { color, .. } => {
                    let c = theme.token_color(color.index());
                    (" ", " ", Style::default().fg(theme.bg).bg(c))
                }
                Cell::Whirlpool { power, .. } => {
                    // Right half shows how many rows an activation sweeps.
                    let rows = char::from_digit(1 + u32::from(power), 10).unwrap_or('?');
                    let mut s = [0u8; 4];
                    let digit: &str = rows.encode_utf8(&mut s);
                    buf[(rx, ry)].set_symbol("◉").set_style(
                        Style::default()
                            .fg(theme.whirlpool)
                            .bg(theme.bg)
                            .add_modifier(Modifier::BOLD),
                    );
                    buf[(rx + 1, ry)].set_symbol(digit).set_style(
                        Style::default().fg(theme.whirlpool).bg(theme.bg),
                    );
                    mark_cursor_and_selection(buf, rx, ry, (x, y), cursor, selected);
                    continue;
                }
                Cell::Empty => (" ", " ", Style::default().bg(theme.bg)),
            };
            buf[(rx, ry)].set_symbol(left).set_style(style);
            buf[(rx + 1, ry)].set_symbol(right).set_style(style);
            mark_cursor_and_selection(buf, rx, ry, (x, y), cursor, selected);
        }
    }

    // Floating score popups
    for popup in popups {
        if popup.delay_ms > 0 {
            continue;
        }
        let rx = rect.x + (popup.x as u16) * CELL_WIDTH;
        let ry = rect.y + popup.y as u16;
        if rx < rect.x + rect.width && ry < rect.y + rect.height {
            let label = if popup.combo > 1 {
                format!("+{} (x{})", popup.amount, popup.combo)
            } else {
                format!("+{}", popup.amount)
            };
            let style = Style::default()
                .fg(popup.color)
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD);
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

/// Cursor brackets and selection parentheses drawn over the cell's own style.
fn mark_cursor_and_selection(
    buf: &mut ratatui::buffer::Buffer,
    rx: u16,
    ry: u16,
    pos: (usize, usize),
    cursor: (usize, usize),
    selected: Option<(usize, usize)>,
) {
    let marker = if Some(pos) == selected && pos == cursor {
        Some(("[", "]", Modifier::BOLD | Modifier::SLOW_BLINK))
    } else if pos == cursor {
        Some(("[", "]", Modifier::BOLD))
    } else if Some(pos) == selected {
        Some(("(", ")", Modifier::BOLD))
    } else {
        None
    };
    if let Some((l, r, modifier)) = marker {
        let left_style = buf[(rx, ry)].style().fg(Color::White).add_modifier(modifier);
        buf[(rx, ry)].set_symbol(l).set_style(left_style);
        let right_style = buf[(rx + 1, ry)]
            .style()
            .fg(Color::White)
            .add_modifier(modifier);
        buf[(rx + 1, ry)].set_symbol(r).set_style(right_style);
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    snapshot: &Snapshot,
    theme: &Theme,
    map: &MapPanel,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    // Free-floating sections with their own borders; vertical layout with small gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats (border + score, moves, level, combo)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Next level (border + gauge)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Colours (border + strip)
            Constraint::Length(1), // gap
            Constraint::Length(7), // Map (border + 3x3 blocks + hint)
        ])
        .split(area);

    // --- Stats (own border) ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let mut stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(snapshot.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Moves: ", title_style),
            Span::styled(snapshot.moves.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(snapshot.level.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Combo: ", title_style),
            Span::styled(
                if snapshot.combo > 0 {
                    format!("x{}", snapshot.combo)
                } else {
                    "-".to_string()
                },
                fg_style,
            ),
        ]),
    ];
    if snapshot.deadlock_warning {
        stats_lines.push(Line::from(Span::styled(
            "No moves left!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    Paragraph::new(ratatui::text::Text::from(stats_lines))
        .render(stats_inner, frame.buffer_mut());

    // --- Next level progress (own border) ---
    let next_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let next_inner = next_block.inner(chunks[2]);
    next_block.render(chunks[2], frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next level", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    let (ratio, label) = match snapshot.next_threshold {
        Some(next) if next > 0 => (
            (f64::from(snapshot.score) / f64::from(next)).min(1.0),
            format!("{}/{}", snapshot.score, next),
        ),
        _ => (1.0, "MAX".to_string()),
    };
    Gauge::default()
        .ratio(ratio)
        .label(label)
        .gauge_style(Style::default().fg(theme.title).bg(theme.bg))
        .render(next_layout[1], frame.buffer_mut());

    // --- Colours (own border) ---
    let colours_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let colours_inner = colours_block.inner(chunks[4]);
    colours_block.render(chunks[4], frame.buffer_mut());
    let mut swatches: Vec<Span> = Vec::new();
    for i in 0..5 {
        swatches.push(Span::styled(
            "██",
            Style::default().fg(theme.token_color(i)),
        ));
        swatches.push(Span::from(" "));
    }
    swatches.push(Span::styled("◉", Style::default().fg(theme.whirlpool)));
    Paragraph::new(Line::from(swatches)).render(colours_inner, frame.buffer_mut());

    // --- Treasure map (own border): one block revealed per level-up ---
    let map_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Map ", title_style));
    let map_inner = map_block.inner(chunks[6]);
    map_block.render(chunks[6], frame.buffer_mut());
    for row in 0..3 {
        let mut spans: Vec<Span> = Vec::new();
        for col in 0..3 {
            let revealed = map.is_revealed(row * 3 + col);
            spans.push(if revealed {
                Span::styled("▓▓▓", Style::default().fg(theme.title))
            } else {
                Span::styled("░░░", Style::default().fg(theme.inactive_fg))
            });
            spans.push(Span::from(" "));
        }
        let line_area = Rect {
            x: map_inner.x,
            y: map_inner.y + row as u16,
            width: map_inner.width,
            height: 1,
        };
        if line_area.y < map_inner.y + map_inner.height {
            Paragraph::new(Line::from(spans)).render(line_area, frame.buffer_mut());
        }
    }
    let hint_area = Rect {
        x: map_inner.x,
        y: map_inner.y + 4,
        width: map_inner.width,
        height: 1,
    };
    if hint_area.y < map_inner.y + map_inner.height {
        Paragraph::new(Line::from(Span::styled(
            format!("{}/9 revealed", map.revealed_count()),
            Style::default().fg(theme.inactive_fg),
        )))
        .render(hint_area, frame.buffer_mut());
    }
}

/// Big red ✗ over the board after a reverted swap.
fn draw_invalid_flash(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 16u16;
    let popup_h = 3u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![Line::from(Span::styled(
        " ✗  NO MATCH ",
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    ))];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw,
        height: qh,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    // Clear background
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        frame.buffer_mut().set_string(rx, ry, label, style);
    }
}
