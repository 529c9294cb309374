/// Line input.
///
/// The game reads whole lines: the player types into the input window and
/// commits with Enter. Each tick the loop drains all pending terminal events
/// without blocking, edits the line buffer, and remembers the most recently
/// committed line until the game takes it.
///
/// Esc and Ctrl+C raise an exit signal instead of editing text.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

/// Where the game gets player input from.
pub trait LineSource {
    /// The latest committed line, if any. Taking it consumes it.
    fn take_latest_line(&mut self) -> Option<String>;

    /// True once per exit request (Esc / Ctrl+C).
    fn take_exit_signal(&mut self) -> bool;
}

/// Line editor fed by key events.
pub struct LineEditor {
    buffer: String,
    max_len: usize,
    committed: Option<String>,
    exit_requested: bool,
}

impl LineEditor {
    pub fn new(max_len: usize) -> Self {
        LineEditor {
            buffer: String::new(),
            max_len,
            committed: None,
            exit_requested: false,
        }
    }

    /// Text typed so far on the uncommitted line.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.exit_requested = true,
            KeyCode::Char('c') | KeyCode::Char('C') if ctrl => self.exit_requested = true,
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.buffer);
                debug!(line = %line, "line committed");
                self.committed = Some(line.trim().to_string());
            }
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Char(c) if !ctrl && (' '..='~').contains(&c) => {
                if self.buffer.len() < self.max_len {
                    self.buffer.push(c);
                }
            }
            _ => {}
        }
    }
}

impl LineSource for LineEditor {
    fn take_latest_line(&mut self) -> Option<String> {
        self.committed.take()
    }

    fn take_exit_signal(&mut self) -> bool {
        std::mem::take(&mut self.exit_requested)
    }
}

/// Terminal-backed line input.
pub struct TerminalInput {
    editor: LineEditor,
}

impl TerminalInput {
    pub fn new(max_len: usize) -> Self {
        TerminalInput { editor: LineEditor::new(max_len) }
    }

    pub fn buffer(&self) -> &str {
        self.editor.buffer()
    }

    /// Drain all pending terminal events.
    /// Call this once per tick, before the session reads input.
    pub fn drain_events(&mut self) {
        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.editor.handle_key(key),
                Ok(_) => {}
                Err(e) => {
                    debug!("terminal event read failed: {e}");
                    break;
                }
            }
        }
    }
}

impl LineSource for TerminalInput {
    fn take_latest_line(&mut self) -> Option<String> {
        self.editor.take_latest_line()
    }

    fn take_exit_signal(&mut self) -> bool {
        self.editor.take_exit_signal()
    }
}

/// Scripted input for tests: one entry per tick.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedInput {
    pub lines: std::collections::VecDeque<Option<String>>,
    pub exit: bool,
}

#[cfg(test)]
impl ScriptedInput {
    pub fn push(&mut self, line: &str) {
        self.lines.push_back(Some(line.to_string()));
    }
}

#[cfg(test)]
impl LineSource for ScriptedInput {
    fn take_latest_line(&mut self) -> Option<String> {
        self.lines.pop_front().flatten()
    }

    fn take_exit_signal(&mut self) -> bool {
        std::mem::take(&mut self.exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(ed: &mut LineEditor, s: &str) {
        for c in s.chars() {
            ed.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_commits_trimmed_line_once() {
        let mut ed = LineEditor::new(20);
        type_str(&mut ed, " 500 ");
        assert_eq!(ed.take_latest_line(), None);
        ed.handle_key(key(KeyCode::Enter));
        assert_eq!(ed.buffer(), "");
        assert_eq!(ed.take_latest_line().as_deref(), Some("500"));
        assert_eq!(ed.take_latest_line(), None);
    }

    #[test]
    fn latest_commit_wins() {
        let mut ed = LineEditor::new(20);
        type_str(&mut ed, "h");
        ed.handle_key(key(KeyCode::Enter));
        type_str(&mut ed, "t");
        ed.handle_key(key(KeyCode::Enter));
        assert_eq!(ed.take_latest_line().as_deref(), Some("t"));
    }

    #[test]
    fn backspace_and_length_limit() {
        let mut ed = LineEditor::new(3);
        type_str(&mut ed, "abcd");
        assert_eq!(ed.buffer(), "abc");
        ed.handle_key(key(KeyCode::Backspace));
        assert_eq!(ed.buffer(), "ab");
    }

    #[test]
    fn esc_and_ctrl_c_signal_exit() {
        let mut ed = LineEditor::new(10);
        ed.handle_key(key(KeyCode::Esc));
        assert!(ed.take_exit_signal());
        assert!(!ed.take_exit_signal());

        ed.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(ed.take_exit_signal());
        assert_eq!(ed.buffer(), "");
    }

    #[test]
    fn non_printable_keys_are_ignored() {
        let mut ed = LineEditor::new(10);
        ed.handle_key(key(KeyCode::Char('é')));
        ed.handle_key(key(KeyCode::Tab));
        assert_eq!(ed.buffer(), "");
    }
}
