/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose every window (border + laid-out text) into the `front` buffer
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Animations redraw every tick, so a full-screen repaint would flicker.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use thiserror::Error;

use crate::config::LayoutConfig;
use crate::ui::surface::Window;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("terminal is {cols}x{rows} but the game needs at least {need_cols}x{need_rows}; enlarge the window and try again")]
    TooSmall {
        cols: usize,
        rows: usize,
        need_cols: usize,
        need_rows: usize,
    },
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 24 };
    const TEXT: Color = Color::Rgb { r: 230, g: 230, b: 230 };
    const BORDER: Color = Color::Rgb { r: 110, g: 110, b: 130 };

    const BLANK: Cell = Cell { ch: ' ', fg: Cell::TEXT };

    /// Never equal to a composed cell, so every position is diff'd.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell { ch, fg });
        }
    }

    /// Border plus the window's laid-out text.
    fn compose_window(&mut self, win: &Window) {
        let r = win.outer();
        if r.width < 2 || r.height < 2 {
            return;
        }
        let (right, bottom) = (r.x + r.width - 1, r.y + r.height - 1);
        let border = |ch| Cell { ch, fg: Cell::BORDER };
        for x in r.x + 1..right {
            self.set(x, r.y, border('─'));
            self.set(x, bottom, border('─'));
        }
        for y in r.y + 1..bottom {
            self.set(r.x, y, border('│'));
            self.set(right, y, border('│'));
        }
        self.set(r.x, r.y, border('┌'));
        self.set(right, r.y, border('┐'));
        self.set(r.x, bottom, border('└'));
        self.set(right, bottom, border('┘'));

        let inner = win.interior();
        for (x, y, text) in win.layout() {
            self.put_str(inner.x + x, inner.y + y, &text, Cell::TEXT);
        }
    }
}

// ── Renderer ──

/// What one frame shows.
pub struct Frame<'a> {
    pub windows: [&'a Window; 3],
    /// Screen position of the text cursor.
    pub cursor: (usize, usize),
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    need: (usize, usize),
}

impl Renderer {
    pub fn new(layout: &LayoutConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            need: layout.required_size(),
        }
    }

    /// Check the terminal size, then switch to raw mode and the alternate
    /// screen. Nothing is changed when the terminal is too small.
    pub fn init(&mut self) -> Result<(), ScreenError> {
        let (tw, th) = terminal::size()?;
        self.check_size(tw as usize, th as usize)?;

        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn check_size(&self, cols: usize, rows: usize) -> Result<(), ScreenError> {
        let (need_cols, need_rows) = self.need;
        if cols < need_cols || rows < need_rows {
            return Err(ScreenError::TooSmall { cols, rows, need_cols, need_rows });
        }
        Ok(())
    }

    pub fn render(&mut self, frame: &Frame) -> Result<(), ScreenError> {
        // Detect terminal resize
        let (tw, th) = terminal::size()?;
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.check_size(tw as usize, th as usize)?;
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        for win in frame.windows {
            self.front.compose_window(win);
        }

        self.flush_diff()?;
        let (cx, cy) = frame.cursor;
        queue!(self.writer, MoveTo(cx as u16, cy as u16), cursor::Show)?;
        self.writer.flush()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Cell::TEXT;
        let mut need_move = true;
        let mut last_x = 0;
        let mut last_y = 0;

        queue!(self.writer, cursor::Hide, SetForegroundColor(last_fg), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rect;
    use crate::ui::surface::Surface;

    fn row(buf: &FrameBuffer, y: usize) -> String {
        (0..buf.width).map(|x| buf.get(x, y).ch).collect()
    }

    #[test]
    fn window_is_boxed_with_text_inside() {
        let mut buf = FrameBuffer::new(10, 4);
        let mut win = Window::new(Rect::new(1, 0, 8, 3));
        win.write_text(0, 0, "hi there");
        buf.compose_window(&win);
        assert_eq!(row(&buf, 0), " ┌──────┐ ");
        assert_eq!(row(&buf, 1), " │hi    │ ");
        assert_eq!(row(&buf, 2), " └──────┘ ");
        assert_eq!(row(&buf, 3), "          ");
    }

    #[test]
    fn text_outside_buffer_is_dropped() {
        let mut buf = FrameBuffer::new(4, 1);
        buf.put_str(2, 0, "abcdef", Cell::TEXT);
        buf.put_str(0, 5, "zz", Cell::TEXT);
        assert_eq!(row(&buf, 0), "  ab");
    }

    #[test]
    fn size_check_uses_layout_requirement() {
        let r = Renderer::new(&crate::config::GameConfig::with_modes(crate::domain::mode::ModeTable::with_thresholds([-1; 4])).layout);
        assert!(r.check_size(121, 39).is_ok());
        assert!(matches!(
            r.check_size(120, 39),
            Err(ScreenError::TooSmall { need_cols: 121, need_rows: 39, .. })
        ));
    }
}
