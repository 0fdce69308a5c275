//! Keyboard and mouse input for the reading view.

use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sentences skipped by PgUp/PgDn.
pub const PAGE_JUMP: isize = 10;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    TogglePlay,
    Next,
    Previous,
    /// Relative jump by a number of sentences
    Jump(isize),
    First,
    Last,
    FasterRate,
    SlowerRate,
    NextVoice,
    PreviousVoice,
    Click { column: u16, row: u16 },
    Resize { columns: u16, rows: u16 },
    Quit,
}

/// Map a terminal event to a command. Unbound events map to `None`.
pub fn map_event(event: &Event) -> Option<UserCommand> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(UserCommand::Click { column: mouse.column, row: mouse.row }),
            _ => None,
        },
        Event::Resize(columns, rows) => Some(UserCommand::Resize { columns: *columns, rows: *rows }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<UserCommand> {
    // Raw mode swallows SIGINT, so Ctrl+C arrives as a key
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    let command = match key.code {
        KeyCode::Char(' ') => UserCommand::TogglePlay,
        KeyCode::Right | KeyCode::Char('n') => UserCommand::Next,
        KeyCode::Left | KeyCode::Char('p') => UserCommand::Previous,
        KeyCode::PageDown => UserCommand::Jump(PAGE_JUMP),
        KeyCode::PageUp => UserCommand::Jump(-PAGE_JUMP),
        KeyCode::Home => UserCommand::First,
        KeyCode::End => UserCommand::Last,
        KeyCode::Char('+') | KeyCode::Char('=') => UserCommand::FasterRate,
        KeyCode::Char('-') | KeyCode::Char('_') => UserCommand::SlowerRate,
        KeyCode::Char('v') => UserCommand::NextVoice,
        KeyCode::Char('V') => UserCommand::PreviousVoice,
        KeyCode::Char('q') | KeyCode::Esc => UserCommand::Quit,
        _ => return None,
    };
    Some(command)
}

/// Read terminal events on a dedicated thread and forward them as commands.
///
/// The thread exits when `stop` is canceled or the receiver is dropped.
pub fn spawn_input_reader(commands: mpsc::UnboundedSender<UserCommand>, stop: CancellationToken) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.is_cancelled() {
            match event::poll(Duration::from_millis(100)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    warn!("Failed to poll terminal input: {}", e);
                    break;
                }
            }

            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    warn!("Failed to read terminal input: {}", e);
                    break;
                }
            };

            let Some(command) = map_event(&event) else {
                continue;
            };
            if commands.send(command).is_err() {
                break;
            }
        }
        debug!("Input reader stopped");
    })
}
