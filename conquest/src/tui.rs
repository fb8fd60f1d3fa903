//! TUI front-end using ratatui.
//!
//! Renders the world as a colored cell grid with a status panel and event
//! feed beside it, and translates terminal mouse events into the core's
//! world-coordinate pointer port. The cell→territory mapping is cached and
//! only rebuilt when the viewport or the loaded map changes; ownership
//! colors always read from the current frame's snapshot.

use anyhow::Result;
use conquest_core::{
    Bounds, Command, GameController, GameEvent, GamePhase, ObserverRegistry, Owner, PointerInput,
    Snapshot, TerritoryId, TerritoryView,
};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::collections::{HashMap, VecDeque};
use std::io::{self, stdout, Stdout};
use std::panic;
use std::time::{Duration, Instant};

pub fn run(mut game: GameController, registry: &ObserverRegistry) -> Result<()> {
    let mut terminal = init_terminal()?;
    let mut guard = TerminalGuard::new();
    panic::set_hook(Box::new(|info| {
        let _ = restore_terminal();
        eprintln!("panic: {info}");
    }));

    let result = main_loop(&mut terminal, &mut game, registry);

    restore_terminal()?;
    guard.disarm();
    result
}

fn main_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    game: &mut GameController,
    registry: &ObserverRegistry,
) -> Result<()> {
    let mut view = ViewState::new();
    let mut last_frame = Instant::now();

    loop {
        let delta = last_frame.elapsed();
        last_frame = Instant::now();
        game.tick(delta);

        let snapshot = game.snapshot();
        registry.notify(&snapshot);
        for event in &snapshot.events {
            view.push_event(event);
        }

        let size = terminal.size()?;
        let full = Rect::new(0, 0, size.width, size.height);
        view.rebuild_cache_if_needed(full, game, &snapshot);

        terminal.draw(|frame| draw_ui(frame, &snapshot, &view))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                        let toggle = if game.paused() {
                            Command::Resume
                        } else {
                            Command::Pause
                        };
                        let _ = game.execute(toggle);
                    }
                    KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('>')
                    | KeyCode::Char('.') => {
                        let _ = game.execute(Command::SpeedUp);
                    }
                    KeyCode::Char('-') | KeyCode::Char('_') | KeyCode::Char('<')
                    | KeyCode::Char(',') => {
                        let _ = game.execute(Command::SlowDown);
                    }
                    KeyCode::Char('1') => {
                        let _ = game.execute(Command::ResetSpeed);
                    }
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        let _ = game.execute(Command::Restart);
                        view.reset();
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => view.forward_mouse(&mouse, game),
                _ => {}
            }
        }
    }
}

/// Cell→territory lookup for the current viewport.
struct CachedMap {
    inner: Rect,
    bounds: Bounds,
    /// `grid[row][col]` is the territory under that cell's center.
    grid: Vec<Vec<Option<TerritoryId>>>,
}

struct ViewState {
    cache: Option<CachedMap>,
    feed: VecDeque<String>,
}

impl ViewState {
    fn new() -> Self {
        Self {
            cache: None,
            feed: VecDeque::new(),
        }
    }

    fn reset(&mut self) {
        self.cache = None;
        self.feed.clear();
    }

    fn push_event(&mut self, event: &GameEvent) {
        self.feed.push_front(format_event(event));
        self.feed.truncate(64);
    }

    fn rebuild_cache_if_needed(&mut self, full: Rect, game: &GameController, snapshot: &Snapshot) {
        let (map_area, _, _) = layout(full);
        let inner = inner_rect(map_area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let Some(bounds) = snapshot.state.world_bounds() else {
            return;
        };

        let valid = self
            .cache
            .as_ref()
            .map(|c| c.inner == inner && c.bounds == bounds)
            .unwrap_or(false);
        if valid {
            return;
        }

        let mut grid = Vec::with_capacity(inner.height as usize);
        for row in 0..inner.height {
            let mut cells = Vec::with_capacity(inner.width as usize);
            for col in 0..inner.width {
                let (x, y) = cell_to_world(col, row, inner, &bounds);
                cells.push(game.directory().territory_at(x, y).map(|t| t.id.clone()));
            }
            grid.push(cells);
        }
        self.cache = Some(CachedMap {
            inner,
            bounds,
            grid,
        });
    }

    /// Translate a terminal mouse event into the world-coordinate pointer
    /// port. Everything outside the map pane is ignored.
    fn forward_mouse(&self, mouse: &MouseEvent, game: &mut GameController) {
        let Some(cache) = &self.cache else {
            return;
        };
        let inner = cache.inner;
        if mouse.column < inner.x
            || mouse.column >= inner.x + inner.width
            || mouse.row < inner.y
            || mouse.row >= inner.y + inner.height
        {
            return;
        }
        let col = mouse.column - inner.x;
        let row = mouse.row - inner.y;
        let (x, y) = cell_to_world(col, row, inner, &cache.bounds);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                game.mouse_down(x, y);
                game.click(x, y);
            }
            MouseEventKind::Down(MouseButton::Right) => game.right_click(x, y),
            MouseEventKind::Drag(MouseButton::Left) => {
                game.drag_start(x, y);
                game.drag(x, y);
            }
            MouseEventKind::Up(MouseButton::Left) => game.drop(x, y),
            MouseEventKind::Moved => game.hover(x, y),
            _ => {}
        }
    }
}

fn layout(full: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(full);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(38)])
        .split(rows[0]);
    (columns[0], columns[1], rows[1])
}

fn inner_rect(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// Center of a map cell in world coordinates. Row zero is the northern edge.
fn cell_to_world(col: u16, row: u16, inner: Rect, bounds: &Bounds) -> (f64, f64) {
    let fx = (col as f64 + 0.5) / inner.width as f64;
    let fy = (row as f64 + 0.5) / inner.height as f64;
    (
        bounds.min_x + fx * bounds.width(),
        bounds.max_y - fy * bounds.height(),
    )
}

fn owner_color(owner: Owner) -> Color {
    match owner {
        Owner::Neutral => Color::DarkGray,
        Owner::Player => Color::Green,
        Owner::Ai => Color::Red,
    }
}

fn draw_ui(frame: &mut Frame, snapshot: &Snapshot, view: &ViewState) {
    let (map_area, side_area, footer_area) = layout(frame.area());

    draw_map(frame, map_area, snapshot, view);
    draw_side_panel(frame, side_area, snapshot, view);

    let footer = Paragraph::new(
        " q quit · space pause · +/- speed · 1 reset · r restart · click select · right-click attack",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, footer_area);

    if snapshot.state.phase.is_terminal() {
        draw_outcome_overlay(frame, map_area, snapshot.state.phase);
    }
}

fn draw_map(frame: &mut Frame, area: Rect, snapshot: &Snapshot, view: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title(" World Conquest ");
    frame.render_widget(block, area);

    let Some(cache) = &view.cache else {
        let waiting = Paragraph::new("waiting for map data...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(waiting, inner_rect(area));
        return;
    };

    let by_id: HashMap<&TerritoryId, &TerritoryView> = snapshot
        .state
        .territories
        .iter()
        .map(|t| (&t.id, t))
        .collect();
    let state = &snapshot.state;

    let mut lines = Vec::with_capacity(cache.grid.len());
    for row in &cache.grid {
        let mut spans = Vec::with_capacity(row.len());
        for cell in row {
            let span = match cell {
                None => Span::styled("·", Style::default().fg(Color::Indexed(236))),
                Some(id) => {
                    let owner = by_id.get(id).map(|t| t.owner).unwrap_or(Owner::Neutral);
                    let mut style = Style::default().fg(owner_color(owner));
                    if state.selected.as_ref() == Some(id) || state.drag_source.as_ref() == Some(id)
                    {
                        style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
                    } else if state.drag_target.as_ref() == Some(id) {
                        style = Style::default().fg(Color::Magenta);
                    } else if state.hovered.as_ref() == Some(id) {
                        style = style.add_modifier(Modifier::BOLD);
                    }
                    Span::styled("█", style)
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), cache.inner);
}

fn draw_side_panel(frame: &mut Frame, area: Rect, snapshot: &Snapshot, view: &ViewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(13), Constraint::Min(0)])
        .split(area);

    let state = &snapshot.state;
    let (mut player_troops, mut ai_troops, mut neutral_troops) = (0u64, 0u64, 0u64);
    for t in &state.territories {
        match t.owner {
            Owner::Player => player_troops += t.troops as u64,
            Owner::Ai => ai_troops += t.troops as u64,
            Owner::Neutral => neutral_troops += t.troops as u64,
        }
    }

    let mut lines = vec![
        Line::from(vec![
            Span::raw("Phase: "),
            Span::styled(state.phase.label(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(format!(
            "Speed: {:>4}x{}",
            state.speed,
            if state.paused { "  [PAUSED]" } else { "" }
        )),
    ];
    match state.phase {
        GamePhase::Selection => lines.push(Line::from(format!(
            "Pick a start: {}s left",
            state.selection_remaining_ms / 1_000
        ))),
        GamePhase::Gameplay => lines.push(Line::from(format!(
            "Next production: {}s",
            state.production_countdown_s
        ))),
        _ => lines.push(Line::from("")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Player  ", Style::default().fg(Color::Green)),
        Span::raw(format!(
            "{:>3} territories  {:>5} troops",
            state.player_territories, player_troops
        )),
    ]));
    lines.push(Line::from(vec![
        Span::styled("AI      ", Style::default().fg(Color::Red)),
        Span::raw(format!(
            "{:>3} territories  {:>5} troops",
            state.ai_territories, ai_troops
        )),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Neutral ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{:>3} territories  {:>5} troops",
            state.neutral_territories, neutral_troops
        )),
    ]));
    lines.push(Line::from(""));

    let describe = |id: &Option<TerritoryId>| -> String {
        id.as_ref()
            .and_then(|id| state.territories.iter().find(|t| &t.id == id))
            .map(|t| format!("{} ({} troops)", t.name, t.troops))
            .unwrap_or_else(|| "-".to_string())
    };
    lines.push(Line::from(format!("Selected: {}", describe(&state.selected))));
    lines.push(Line::from(format!("Hovered:  {}", describe(&state.hovered))));
    lines.push(Line::from(format!("Attacks in flight: {}", state.attacks.len())));

    let status =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Status "));
    frame.render_widget(status, chunks[0]);

    let feed: Vec<Line> = view
        .feed
        .iter()
        .take(chunks[1].height.saturating_sub(2) as usize)
        .map(|entry| Line::from(entry.as_str()))
        .collect();
    let events =
        Paragraph::new(feed).block(Block::default().borders(Borders::ALL).title(" Events "));
    frame.render_widget(events, chunks[1]);
}

fn draw_outcome_overlay(frame: &mut Frame, map_area: Rect, phase: GamePhase) {
    let (text, color) = match phase {
        GamePhase::Victory => ("VICTORY — the world is yours", Color::Green),
        _ => ("DEFEAT — your last territory fell", Color::Red),
    };
    let width = (text.len() as u16 + 4).min(map_area.width);
    let rect = Rect {
        x: map_area.x + map_area.width.saturating_sub(width) / 2,
        y: map_area.y + map_area.height / 2,
        width,
        height: 3,
    };
    frame.render_widget(Clear, rect);
    let overlay = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(overlay, rect);
}

fn format_event(event: &GameEvent) -> String {
    match event {
        GameEvent::PhaseChanged { to, .. } => format!("phase: {}", to.label()),
        GameEvent::StartSelected {
            territory, auto, ..
        } => {
            if *auto {
                format!("start auto-selected: {territory}")
            } else {
                format!("start selected: {territory}")
            }
        }
        GameEvent::TerritoryCaptured {
            territory,
            attacker,
            to,
            survivors,
            ..
        } => format!("{attacker} took {territory} for {} ({survivors} left)", to.label()),
        GameEvent::AttackRepelled {
            attacker,
            defender,
            attacker_losses,
            ..
        } => format!("{defender} repelled {attacker} (-{attacker_losses})"),
        GameEvent::ProductionGranted {
            player_per_territory,
            ai_per_territory,
            ..
        } => format!("production: player +{player_per_territory}/t, ai +{ai_per_territory}/t"),
        GameEvent::GameOver { outcome, .. } => format!("game over: {}", outcome.label()),
    }
}

fn init_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Ensures the terminal is restored on panic or early return.
struct TerminalGuard {
    armed: bool,
}

impl TerminalGuard {
    fn new() -> Self {
        Self { armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = restore_terminal();
        }
    }
}
