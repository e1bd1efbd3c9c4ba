//! Terminal front-end: arrow keys or WASD to move, `q`/Esc/Ctrl-C to quit.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, execute, queue, style, terminal};
use rand::Rng;
use std::io::{self, Write};

use crate::engine::Direction;
use crate::game::{Game, GameState};

/// A recognised key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Move(Direction),
    Quit,
}

/// Map a key event to an input; everything unrecognised is `None`.
pub fn map_key(key: &KeyEvent) -> Option<Input> {
    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Input::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Left => Some(Input::Move(Direction::Left)),
        KeyCode::Right => Some(Input::Move(Direction::Right)),
        KeyCode::Up => Some(Input::Move(Direction::Up)),
        KeyCode::Down => Some(Input::Move(Direction::Down)),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'a' => Some(Input::Move(Direction::Left)),
            'd' => Some(Input::Move(Direction::Right)),
            'w' => Some(Input::Move(Direction::Up)),
            's' => Some(Input::Move(Direction::Down)),
            'q' => Some(Input::Quit),
            _ => None,
        },
        _ => None,
    }
}

/// The last move shown under the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    pub dir: Direction,
    pub reward: u64,
    pub changed: bool,
}

/// Lines of one frame: board, score, status and key help.
pub fn render_frame(state: &GameState, last: Option<LastMove>) -> Vec<String> {
    let mut lines: Vec<String> = state.board.to_string().lines().map(str::to_string).collect();
    lines.push(String::new());
    lines.push(format!("Score: {}", state.score));
    lines.push(match last {
        Some(m) if m.changed => format!("Player: {} | Gain: {:4}", m.dir, m.reward),
        Some(m) => format!("Player: {} | no change", m.dir),
        None => String::new(),
    });
    if state.won {
        lines.push("You reached the winning tile!".to_string());
    }
    if state.lost {
        lines.push("Game over. Press q to quit.".to_string());
    } else {
        lines.push("Arrows/WASD to move, q to quit".to_string());
    }
    lines
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter(out: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn draw(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    queue!(out, terminal::Clear(terminal::ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(out, cursor::MoveTo(0, row), style::Print(line))?;
    }
    out.flush()
}

/// Play `game` interactively until the user quits. Returns the final state.
pub fn run<R: Rng>(game: &mut Game<R>) -> io::Result<GameState> {
    let mut out = io::stdout();
    let _guard = TerminalGuard::enter(&mut out)?;
    let mut state = game.state();
    let mut last = None;
    draw(&mut out, &render_frame(&state, last))?;

    loop {
        match event::read()? {
            Event::Key(key) => match map_key(&key) {
                Some(Input::Quit) => break,
                Some(Input::Move(dir)) if !state.lost => {
                    let step = game.update(dir);
                    tracing::debug!(%dir, reward = step.reward, changed = step.changed, "player move");
                    last = Some(LastMove { dir, reward: step.reward, changed: step.changed });
                    state = step.state;
                    draw(&mut out, &render_frame(&state, last))?;
                }
                _ => {}
            },
            Event::Resize(..) => draw(&mut out, &render_frame(&state, last))?,
            _ => {}
        }
    }
    Ok(state)
}
