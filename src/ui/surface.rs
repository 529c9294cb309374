/// Drawing surfaces.
///
/// The game core only knows `Surface`: "put this text at (x, y)". A `Window`
/// is the terminal implementation: a bordered rectangle that collects
/// positioned strings each tick and lays them out (wrapping, clipping) when
/// the renderer composes the frame.

use crate::config::Rect;

pub trait Surface {
    /// Text that may wrap on word boundaries.
    fn write_text(&mut self, x: usize, y: usize, text: &str);

    /// Text kept on one line and clipped at the right edge.
    fn write_line(&mut self, x: usize, y: usize, text: &str) {
        self.write_text(x, y, text);
    }

    /// Forget everything written so far.
    fn clear(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionedString {
    pub x: usize,
    pub y: usize,
    pub text: String,
    pub wrap: bool,
}

/// A bordered window. Coordinates given to `write_*` are relative to the
/// interior (inside the border).
#[derive(Clone, Debug)]
pub struct Window {
    outer: Rect,
    strings: Vec<PositionedString>,
}

impl Window {
    pub fn new(outer: Rect) -> Self {
        Window { outer, strings: vec![] }
    }

    pub fn outer(&self) -> Rect {
        self.outer
    }

    /// Drawable area in screen coordinates.
    pub fn interior(&self) -> Rect {
        Rect::new(
            self.outer.x + 1,
            self.outer.y + 1,
            self.outer.width.saturating_sub(2),
            self.outer.height.saturating_sub(2),
        )
    }

    /// Change the window's outer size, keeping its position.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.outer.width = width;
        self.outer.height = height;
    }

    /// Lay out all strings: `(interior x, interior y, text)` per visible
    /// line, already wrapped and clipped.
    ///
    /// Wrapped strings starting at column 0 flow: one that would land on a
    /// row used by an earlier wrapped paragraph is pushed below it.
    pub fn layout(&self) -> Vec<(usize, usize, String)> {
        let inner = self.interior();
        let mut out = vec![];
        let mut flow_row = 0;
        for s in &self.strings {
            if s.x >= inner.width {
                continue;
            }
            let avail = inner.width - s.x;
            let lines = if s.wrap {
                wrap(&s.text, avail)
            } else {
                vec![s.text.clone()]
            };
            let top = if s.wrap && s.x == 0 {
                let top = s.y.max(flow_row);
                flow_row = top + lines.len();
                top
            } else {
                s.y
            };
            for (i, line) in lines.into_iter().enumerate() {
                let y = top + i;
                if y >= inner.height {
                    break;
                }
                out.push((s.x, y, line.chars().take(avail).collect()));
            }
        }
        out
    }
}

impl Surface for Window {
    fn write_text(&mut self, x: usize, y: usize, text: &str) {
        self.strings.push(PositionedString { x, y, text: text.to_string(), wrap: true });
    }

    fn write_line(&mut self, x: usize, y: usize, text: &str) {
        self.strings.push(PositionedString { x, y, text: text.to_string(), wrap: false });
    }

    fn clear(&mut self) {
        self.strings.clear();
    }
}

/// Greedy word wrap. Whitespace is kept as written; words longer than the
/// width are split hard. Explicit newlines start a new line.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![];
    }
    let mut lines = vec![];
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for token in split_keep_spaces(paragraph) {
            let len = token.chars().count();
            if line_len + len <= width {
                line.push_str(token);
                line_len += len;
                continue;
            }
            if token.trim().is_empty() {
                // Whitespace at a break point is dropped.
                lines.push(std::mem::take(&mut line));
                line_len = 0;
                continue;
            }
            if line_len > 0 {
                lines.push(line.trim_end().to_string());
                line.clear();
                line_len = 0;
            }
            let mut chars: Vec<char> = token.chars().collect();
            while chars.len() > width {
                lines.push(chars.drain(..width).collect());
            }
            line_len = chars.len();
            line = chars.into_iter().collect();
        }
        if line_len > 0 || lines.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Split into alternating runs of non-space and space characters.
fn split_keep_spaces(s: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut start = 0;
    let mut prev_space: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let space = c == ' ';
        if let Some(p) = prev_space {
            if p != space {
                out.push(&s[start..i]);
                start = i;
            }
        }
        prev_space = Some(space);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Surface that just records calls, for tests.
#[cfg(test)]
#[derive(Default, Debug)]
pub struct RecordingSurface {
    pub lines: Vec<(usize, usize, String)>,
}

#[cfg(test)]
impl RecordingSurface {
    pub fn text(&self) -> String {
        self.lines.iter().map(|(_, _, t)| t.as_str()).collect::<Vec<_>>().join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, _, t)| t.contains(needle))
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn write_text(&mut self, x: usize, y: usize, text: &str) {
        self.lines.push((x, y, text.to_string()));
    }

    fn clear(&mut self) {
        self.lines.clear();
    }
}
