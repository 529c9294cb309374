/// ASCII frame animations.
///
/// ## Asset format
///   Consecutive non-blank lines form one frame. A blank (whitespace-only)
///   line ends the frame. Lines after the last blank line are not a complete
///   frame and are ignored. Trailing whitespace is stripped; ragged rows are
///   right-padded with spaces to the widest row of the asset.
///
/// ## Normalization
///   Frames are resized once, at construction, to exactly `width` x `height`:
///   larger sources are cropped symmetrically, smaller ones are padded by
///   repeating the edge character (width) or edge row (height). After that,
///   drawing a frame is plain indexing.
///
/// ## Timing
///   `play()` is called every tick. Wall-clock time is cut into slots of
///   1/fps seconds and the slot parity is sampled. A frame advance happens
///   only on a parity change, so the frame rate depends on elapsed time and
///   not on how often the game loop ticks.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Rect;
use crate::ui::surface::Surface;

pub const IDLE_ANIMATION_FILE: &str = "idle_animation.txt";
pub const COIN_ANIMATION_FILE: &str = "coin_flip_animation.txt";

const EMBEDDED_IDLE: &str = include_str!("../../assets/idle_animation.txt");
const EMBEDDED_COIN: &str = include_str!("../../assets/coin_flip_animation.txt");

/// One frame: rows of equal character width.
pub type Frame = Vec<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("cannot shrink {axis:?} from {current} to larger size {goal}")]
    ShrinkToLarger { axis: Axis, goal: usize, current: usize },
    #[error("cannot expand {axis:?} from {current} to smaller size {goal}")]
    ExpandToSmaller { axis: Axis, goal: usize, current: usize },
    #[error("cannot resize an empty {axis:?} to {goal}")]
    EmptySource { axis: Axis, goal: usize },
    #[error("animation asset {name} has no complete frame")]
    NoFrames { name: String },
    #[error("could not read animation asset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Asset loading
// ══════════════════════════════════════════════════════════════

/// Parse an animation asset into frames.
pub fn parse_frames(name: &str, text: &str) -> Result<Vec<Frame>, AnimationError> {
    let mut frames: Vec<Frame> = vec![];
    let mut frame: Frame = vec![];

    for line in text.lines() {
        if line.trim().is_empty() {
            // Consecutive blank lines must not produce empty frames.
            if !frame.is_empty() {
                frames.push(std::mem::take(&mut frame));
            }
        } else {
            frame.push(line.trim_end().to_string());
        }
    }

    if frames.is_empty() {
        return Err(AnimationError::NoFrames { name: name.to_string() });
    }

    let widest = frames.iter().flatten().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in frames.iter_mut().flatten() {
        let pad = widest - row.chars().count();
        row.extend(std::iter::repeat(' ').take(pad));
    }

    Ok(frames)
}

/// Load an asset from `dir/file_name`, falling back to the copy embedded in
/// the binary when the file does not exist.
pub fn load_asset(dir: &Path, file_name: &str) -> Result<Vec<Frame>, AnimationError> {
    let path = dir.join(file_name);
    if path.is_file() {
        let text = std::fs::read_to_string(&path)
            .map_err(|source| AnimationError::Io { path: path.clone(), source })?;
        info!(path = %path.display(), "loaded animation asset");
        return parse_frames(file_name, &text);
    }

    let embedded = match file_name {
        IDLE_ANIMATION_FILE => EMBEDDED_IDLE,
        COIN_ANIMATION_FILE => EMBEDDED_COIN,
        _ => "",
    };
    debug!(file_name, "using embedded animation asset");
    parse_frames(file_name, embedded)
}

// ══════════════════════════════════════════════════════════════
// Symmetric resize
// ══════════════════════════════════════════════════════════════

/// Crop to `goal` items: floor(diff/2) from the front, the rest from the back.
pub fn shrink_to<T: Clone>(items: &[T], goal: usize, axis: Axis) -> Result<Vec<T>, AnimationError> {
    if goal > items.len() {
        return Err(AnimationError::ShrinkToLarger { axis, goal, current: items.len() });
    }
    let diff = items.len() - goal;
    let start = diff / 2;
    Ok(items[start..start + goal].to_vec())
}

/// Pad to `goal` items: the first item repeated `diff - floor(diff/2)` times
/// in front, the last item repeated `floor(diff/2)` times at the back.
pub fn expand_to<T: Clone>(items: &[T], goal: usize, axis: Axis) -> Result<Vec<T>, AnimationError> {
    if goal < items.len() {
        return Err(AnimationError::ExpandToSmaller { axis, goal, current: items.len() });
    }
    let (first, last) = match (items.first(), items.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return Err(AnimationError::EmptySource { axis, goal }),
    };
    let diff = goal - items.len();
    let right = diff / 2;
    let left = diff - right;

    let mut out = Vec::with_capacity(goal);
    out.extend(std::iter::repeat(first).take(left).cloned());
    out.extend_from_slice(items);
    out.extend(std::iter::repeat(last).take(right).cloned());
    Ok(out)
}

fn resize_to<T: Clone>(items: &[T], current: usize, goal: usize, axis: Axis) -> Result<Vec<T>, AnimationError> {
    if current > goal {
        shrink_to(items, goal, axis)
    } else if current < goal {
        expand_to(items, goal, axis)
    } else {
        Ok(items.to_vec())
    }
}

/// Resize every frame to exactly `width` x `height`.
///
/// The direction of each axis is decided from the first frame (its first row
/// for width). Frames that disagree with it fail with a dimension error.
pub fn normalize(frames: Vec<Frame>, width: usize, height: usize) -> Result<Vec<Frame>, AnimationError> {
    let Some(first) = frames.first() else {
        return Ok(frames);
    };
    let src_w = first.first().map(|r| r.chars().count()).unwrap_or(0);
    let src_h = first.len();

    let mut out = Vec::with_capacity(frames.len());
    for frame in frames {
        let mut rows = Vec::with_capacity(frame.len());
        for row in &frame {
            let chars: Vec<char> = row.chars().collect();
            let resized = resize_to(&chars, src_w, width, Axis::Width)?;
            rows.push(resized.into_iter().collect::<String>());
        }
        out.push(resize_to(&rows, src_h, height, Axis::Height)?);
    }
    Ok(out)
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

pub struct AnimationPlayer {
    frames: Vec<Frame>,
    current_frame: usize,
    area: Rect,
    looping: bool,
    fps: u32,
    /// Parity sampled on the previous and the latest `play()` call.
    prev_phase: Option<u64>,
    phase: Option<u64>,
    clock_origin: Instant,
}

impl AnimationPlayer {
    /// Build a player drawing at `area` (position and target size) and
    /// normalize its frames to that size.
    pub fn new(frames: Vec<Frame>, area: Rect, looping: bool, fps: u32) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::NoFrames { name: String::from("<frames>") });
        }
        let frames = normalize(frames, area.width, area.height)?;
        Ok(AnimationPlayer {
            frames,
            current_frame: 0,
            area,
            looping,
            fps: fps.max(1),
            prev_phase: None,
            phase: None,
            clock_origin: Instant::now(),
        })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[allow(dead_code)]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// True once the last frame is showing. Only meaningful for
    /// non-looping players.
    pub fn is_finished(&self) -> bool {
        self.current_frame == self.frames.len() - 1
    }

    /// Rewind to the first frame. Timing markers are left alone.
    pub fn reset(&mut self) {
        self.current_frame = 0;
    }

    /// Advance (if a frame slot boundary passed) and draw the current frame.
    pub fn play(&mut self, surface: &mut dyn Surface) {
        let elapsed = self.clock_origin.elapsed();
        self.play_at(elapsed, surface);
    }

    /// `play()` with an explicit time since the player's clock origin.
    pub fn play_at(&mut self, elapsed: Duration, surface: &mut dyn Surface) {
        self.advance_at(elapsed);
        self.draw(surface);
    }

    fn advance_at(&mut self, elapsed: Duration) {
        if let (Some(prev), Some(cur)) = (self.prev_phase, self.phase) {
            if prev != cur {
                self.step();
            }
        }
        let slot = (elapsed.as_secs_f64() * self.fps as f64).floor() as u64;
        self.prev_phase = self.phase;
        self.phase = Some(slot % 2);
    }

    fn step(&mut self) {
        let last = self.frames.len() - 1;
        self.current_frame = if self.looping {
            (self.current_frame + 1) % self.frames.len()
        } else {
            (self.current_frame + 1).min(last)
        };
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let frame = &self.frames[self.current_frame];
        for (i, row) in frame.iter().take(self.area.height).enumerate() {
            let visible: String = row.chars().take(self.area.width).collect();
            surface.write_line(self.area.x, self.area.y + i, &visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::surface::RecordingSurface;

    fn frames_of(w: usize, h: usize, n: usize) -> Vec<Frame> {
        (0..n)
            .map(|f| (0..h).map(|r| {
                let c = char::from(b'a' + ((f + r) % 26) as u8);
                std::iter::repeat(c).take(w).collect()
            }).collect())
            .collect()
    }

    fn player(n: usize, looping: bool) -> AnimationPlayer {
        AnimationPlayer::new(frames_of(4, 2, n), Rect::new(0, 0, 4, 2), looping, 15).unwrap()
    }

    /// Drive the player with a tick every `tick` for `total`.
    fn run(p: &mut AnimationPlayer, tick: Duration, total: Duration) {
        let mut s = RecordingSurface::default();
        let mut t = Duration::ZERO;
        while t <= total {
            p.play_at(t, &mut s);
            t += tick;
        }
    }

    // ── parsing ──

    #[test]
    fn parse_splits_on_blank_lines() {
        let text = "ab\ncd\n\nef\ngh\n   \n";
        let frames = parse_frames("t", text).unwrap();
        assert_eq!(frames, vec![vec!["ab", "cd"], vec!["ef", "gh"]]);
    }

    #[test]
    fn parse_ignores_unterminated_tail_and_repeated_blanks() {
        let text = "ab\n\n\n\ncd\nef";
        let frames = parse_frames("t", text).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn parse_pads_ragged_rows() {
        let frames = parse_frames("t", "a\nabc\n\n").unwrap();
        assert_eq!(frames[0], vec!["a  ", "abc"]);
    }

    #[test]
    fn parse_requires_a_complete_frame() {
        assert!(matches!(parse_frames("t", "abc"), Err(AnimationError::NoFrames { .. })));
        assert!(matches!(parse_frames("t", ""), Err(AnimationError::NoFrames { .. })));
    }

    #[test]
    fn embedded_assets_parse() {
        let dir = Path::new("/nonexistent-animation-dir");
        assert!(load_asset(dir, IDLE_ANIMATION_FILE).unwrap().len() > 1);
        assert!(load_asset(dir, COIN_ANIMATION_FILE).unwrap().len() > 1);
    }

    // ── resize ──

    #[test]
    fn shrink_crops_front_floor_half() {
        let v: Vec<u8> = (0..7).collect();
        assert_eq!(shrink_to(&v, 4, Axis::Width).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(shrink_to(&v, 7, Axis::Width).unwrap(), v);
    }

    #[test]
    fn expand_pads_left_with_ceil_half() {
        let v = vec![1, 2, 3];
        assert_eq!(expand_to(&v, 6, Axis::Width).unwrap(), vec![1, 1, 1, 2, 3, 3]);
        assert_eq!(expand_to(&v, 4, Axis::Width).unwrap(), vec![1, 1, 2, 3]);
    }

    #[test]
    fn resize_in_wrong_direction_fails() {
        let v = vec![1, 2, 3];
        assert!(matches!(shrink_to(&v, 5, Axis::Height), Err(AnimationError::ShrinkToLarger { .. })));
        assert!(matches!(expand_to(&v, 2, Axis::Height), Err(AnimationError::ExpandToSmaller { .. })));
    }

    #[test]
    fn normalize_always_hits_target_size() {
        for (w, h) in [(10, 6), (3, 3), (1, 1)] {
            for (tw, th) in [(w, h), (1, 1), (w / 2 + 1, h), (w, h / 2 + 1), (w + 5, h + 4), (w + 1, 1)] {
                let frames = normalize(frames_of(w, h, 3), tw, th).unwrap();
                for f in &frames {
                    assert_eq!(f.len(), th);
                    assert!(f.iter().all(|r| r.chars().count() == tw), "{w}x{h} -> {tw}x{th}");
                }
            }
        }
    }

    #[test]
    fn normalize_pads_with_edge_rows_and_chars() {
        let frames = vec![vec!["<ab>".to_string(), "[cd]".to_string()]];
        let out = normalize(frames, 6, 4).unwrap();
        assert_eq!(out[0], vec!["<<ab>>", "<<ab>>", "[[cd]]", "[[cd]]"]);
    }

    #[test]
    fn normalize_rejects_inconsistent_frames() {
        let mut frames = frames_of(6, 4, 2);
        frames[1].truncate(1);
        assert!(normalize(frames, 6, 2).is_err());
    }

    // ── playback ──

    #[test]
    fn first_call_never_advances() {
        let mut p = player(5, true);
        let mut s = RecordingSurface::default();
        p.play_at(Duration::from_secs(3), &mut s);
        assert_eq!(p.current_frame(), 0);
    }

    #[test]
    fn frame_rate_follows_wall_clock_not_tick_rate() {
        let mut slow = player(1000, false);
        let mut fast = player(1000, false);
        run(&mut slow, Duration::from_millis(16), Duration::from_secs(2));
        run(&mut fast, Duration::from_millis(8), Duration::from_secs(2));
        // 2 seconds at 15 fps is 30 slot changes.
        let a = slow.current_frame() as i64;
        let b = fast.current_frame() as i64;
        assert!((a - b).abs() <= 1, "{a} vs {b}");
        assert!((29..=30).contains(&a), "{a}");
    }

    #[test]
    fn looping_wraps_modulo_frame_count() {
        let mut p = player(4, true);
        for n in 1..=10 {
            p.step();
            assert_eq!(p.current_frame(), n % 4);
            assert!(p.current_frame() != 3 || p.is_finished());
        }
    }

    #[test]
    fn non_looping_clamps_and_finishes() {
        let mut p = player(4, false);
        assert!(!p.is_finished());
        for n in 1..=10usize {
            p.step();
            assert_eq!(p.current_frame(), n.min(3));
            assert_eq!(p.is_finished(), n >= 3);
        }
        p.reset();
        assert_eq!(p.current_frame(), 0);
        assert!(!p.is_finished());
    }

    #[test]
    fn draw_writes_each_row_at_offset() {
        let frames = vec![vec!["abcdef".to_string(), "ghijkl".to_string()]];
        let mut p = AnimationPlayer::new(frames, Rect::new(3, 5, 4, 2), true, 15).unwrap();
        let mut s = RecordingSurface::default();
        p.play_at(Duration::ZERO, &mut s);
        assert_eq!(
            s.lines,
            vec![(3, 5, "bcde".to_string()), (3, 6, "hijk".to_string())]
        );
    }

    #[test]
    fn frame_interval_from_fps() {
        let p = player(2, true);
        assert_eq!(p.frame_interval(), Duration::from_secs_f64(1.0 / 15.0));
    }
}
