use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, InvalidDirectionError};

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Which way lines run through the grid for a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Each line is a row (Left/Right).
    Row,
    /// Each line is a column (Up/Down).
    Col,
}

impl Direction {
    /// All four directions, in a fixed order.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Row,
            Direction::Up | Direction::Down => Axis::Col,
        }
    }

    /// True when tiles travel toward the high-index end of each line.
    #[inline]
    pub fn toward_end(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }

    /// Single-letter code (`L`, `R`, `U`, `D`).
    pub fn code(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Up => 'U',
            Direction::Down => 'D',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Direction {
    type Err = InvalidDirectionError;

    /// Accepts the one-letter codes and the full names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            _ => Err(InvalidDirectionError(s.to_string())),
        }
    }
}

/// Result of sliding/merging a line or a whole board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shift {
    /// Any tile moved, or any merge happened.
    pub changed: bool,
    /// Sum of the values created by merges.
    pub reward: u64,
}

/// Largest tile accepted on a seeded board or as a spawn value.
pub const MAX_TILE: u64 = 1 << 62;

/// Upper bound on `rows * cols`.
pub const MAX_CELLS: usize = 1 << 20;

/// Validated cell count for a `rows x cols` grid.
pub(crate) fn cell_count(rows: usize, cols: usize) -> Result<usize, ConfigError> {
    match rows.checked_mul(cols) {
        Some(n) if rows > 0 && cols > 0 && n <= MAX_CELLS => Ok(n),
        _ => Err(ConfigError::InvalidSize { rows, cols }),
    }
}

/// A `rows x cols` grid of tiles stored row-major. `0` is an empty cell,
/// every other cell holds `2^k` with `k >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<u64>,
}

impl Board {
    /// An all-empty board.
    pub fn empty(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        let n = cell_count(rows, cols)?;
        Ok(Board { rows, cols, cells: vec![0; n] })
    }

    /// Build a board from explicit rows. Rows must be non-empty, equally long,
    /// and hold only `0` or powers of two in `2..=MAX_TILE`.
    ///
    /// ```
    /// use grid_2048::engine::Board;
    /// let b = Board::from_rows(&[[2u64, 2, 0, 0], [0, 0, 0, 4]]).unwrap();
    /// assert_eq!((b.rows(), b.cols()), (2, 4));
    /// assert_eq!(b.get(1, 3), 4);
    /// ```
    pub fn from_rows<L: AsRef<[u64]>>(lines: &[L]) -> Result<Self, ConfigError> {
        let rows = lines.len();
        let cols = lines.first().map(|l| l.as_ref().len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(cell_count(rows, cols)?);
        for line in lines {
            let line = line.as_ref();
            if line.len() != cols {
                return Err(ConfigError::BoardShape { rows, cols });
            }
            for &v in line {
                if !is_tile_value(v) || v > MAX_TILE {
                    return Err(ConfigError::InvalidTile(v));
                }
                cells.push(v);
            }
        }
        Ok(Board { rows, cols, cells })
    }

    #[inline]
    pub fn rows(&self) -> usize { self.rows }

    #[inline]
    pub fn cols(&self) -> usize { self.cols }

    /// Row-major view of all cells.
    #[inline]
    pub fn cells(&self) -> &[u64] { &self.cells }

    /// Tile value at `(r, c)`; `0` when empty.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u64 { self.cells[r * self.cols + c] }

    #[inline]
    pub(crate) fn set(&mut self, r: usize, c: usize, value: u64) {
        self.cells[r * self.cols + c] = value;
    }

    #[inline]
    pub fn occupied(&self, r: usize, c: usize) -> bool { self.get(r, c) != 0 }

    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    pub fn highest_tile(&self) -> u64 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn contains(&self, value: u64) -> bool {
        self.cells.contains(&value)
    }

    /// Iterate over rows as slices.
    pub fn iter_rows(&self) -> std::slice::Chunks<'_, u64> {
        self.cells.chunks(self.cols)
    }

    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.iter_rows().map(<[u64]>::to_vec).collect()
    }

    /// True when the board is full and no two orthogonal neighbours match.
    ///
    /// ```
    /// use grid_2048::engine::Board;
    /// let stuck = Board::from_rows(&[[2u64, 4], [4, 2]]).unwrap();
    /// assert!(stuck.is_lost());
    /// let open = Board::from_rows(&[[2u64, 4], [4, 0]]).unwrap();
    /// assert!(!open.is_lost());
    /// ```
    pub fn is_lost(&self) -> bool {
        for r in 0..self.rows {
            for c in 0..self.cols {
                let v = self.get(r, c);
                if v == 0
                    || (c + 1 < self.cols && mergeable(v, self.get(r, c + 1)))
                    || (r + 1 < self.rows && mergeable(v, self.get(r + 1, c)))
                {
                    return false;
                }
            }
        }
        true
    }

    /// Pick a uniformly random empty cell by rejection sampling.
    ///
    /// Panics if the board is full; callers must check for a loss first.
    pub fn random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        assert!(self.cells.contains(&0), "random_empty_cell called on a full board");
        loop {
            let r = rng.gen_range(0..self.rows);
            let c = rng.gen_range(0..self.cols);
            if !self.occupied(r, c) {
                return (r, c);
            }
        }
    }

    /// Slide and merge every line toward `dir`, in place.
    ///
    /// ```
    /// use grid_2048::engine::{Board, Direction};
    /// let mut b = Board::from_rows(&[[0u64, 2, 0, 2]]).unwrap();
    /// let s = b.shift(Direction::Right);
    /// assert_eq!(b.to_rows(), vec![vec![0, 0, 0, 4]]);
    /// assert!(s.changed && s.reward == 4);
    /// ```
    pub fn shift(&mut self, dir: Direction) -> Shift {
        let (lines, len) = match dir.axis() {
            Axis::Row => (self.rows, self.cols),
            Axis::Col => (self.cols, self.rows),
        };
        let mut buf = vec![0u64; len];
        let mut total = Shift::default();
        for line in 0..lines {
            for (pos, slot) in buf.iter_mut().enumerate() {
                *slot = self.cells[self.line_index(dir, line, pos)];
            }
            let res = slide_line(&mut buf);
            if res.changed {
                for (pos, &v) in buf.iter().enumerate() {
                    let idx = self.line_index(dir, line, pos);
                    self.cells[idx] = v;
                }
            }
            total.changed = total.changed || res.changed;
            total.reward = total.reward.saturating_add(res.reward);
        }
        total
    }

    /// Like [`Board::shift`] but leaves `self` untouched.
    pub fn shifted(&self, dir: Direction) -> (Board, Shift) {
        let mut next = self.clone();
        let s = next.shift(dir);
        (next, s)
    }

    /// Cell index of position `pos` along line `line`, where position 0 is
    /// the edge tiles move toward.
    #[inline]
    fn line_index(&self, dir: Direction, line: usize, pos: usize) -> usize {
        match dir.axis() {
            Axis::Row => {
                let c = if dir.toward_end() { self.cols - 1 - pos } else { pos };
                line * self.cols + c
            }
            Axis::Col => {
                let r = if dir.toward_end() { self.rows - 1 - pos } else { pos };
                r * self.cols + line
            }
        }
    }
}

/// Compact, merge, compact again on one line whose target edge is index 0.
///
/// Each tile takes part in at most one merge.
///
/// ```
/// use grid_2048::engine::slide_line;
/// let mut line = [2, 2, 2, 0];
/// let s = slide_line(&mut line);
/// assert_eq!(line, [4, 2, 0, 0]);
/// assert_eq!(s.reward, 4);
/// ```
pub fn slide_line(line: &mut [u64]) -> Shift {
    let moved = compact(line);
    let reward = merge(line);
    let closed = compact(line);
    Shift { changed: moved || reward > 0 || closed, reward }
}

// Stable partition of occupied cells toward index 0.
fn compact(line: &mut [u64]) -> bool {
    let mut write = 0;
    let mut moved = false;
    for read in 0..line.len() {
        if line[read] != 0 {
            if read != write {
                line[write] = line[read];
                line[read] = 0;
                moved = true;
            }
            write += 1;
        }
    }
    moved
}

// Equal tiles merge unless the result would not fit in a u64.
#[inline]
fn mergeable(a: u64, b: u64) -> bool {
    a != 0 && a == b && a.checked_mul(2).is_some()
}

fn merge(line: &mut [u64]) -> u64 {
    let mut reward: u64 = 0;
    let mut i = 0;
    while i + 1 < line.len() {
        if mergeable(line[i], line[i + 1]) {
            line[i] *= 2;
            line[i + 1] = 0;
            reward = reward.saturating_add(line[i]);
            i += 2;
        } else {
            i += 1;
        }
    }
    reward
}

/// The winning tile for a board of this size, `2^(1 + rows*cols)`, or `None`
/// when it does not fit in a `u64` (such boards cannot be won).
pub fn win_tile(rows: usize, cols: usize) -> Option<u64> {
    let exp = rows.checked_mul(cols)?.checked_add(1)?;
    u32::try_from(exp).ok().and_then(|e| 1u64.checked_shl(e))
}

#[inline]
pub(crate) fn is_tile_value(v: u64) -> bool {
    v == 0 || (v >= 2 && v.is_power_of_two())
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.highest_tile().to_string().len().max(5) + 2;
        let rule = "-".repeat(self.cols * (width + 1) - 1);
        writeln!(f)?;
        for (r, row) in self.iter_rows().enumerate() {
            if r > 0 {
                writeln!(f, "{rule}")?;
            }
            let cells: Vec<String> = row.iter().map(|&v| format_val(v, width)).collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u64, width: usize) -> String {
    if val == 0 {
        " ".repeat(width)
    } else {
        format!("{val:^width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn board(rows: &[&[u64]]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    fn line(mut v: Vec<u64>) -> (Vec<u64>, Shift) {
        let s = slide_line(&mut v);
        (v, s)
    }

    #[test]
    fn it_slide_line() {
        assert_eq!(line(vec![0, 0, 0, 0]), (vec![0, 0, 0, 0], Shift { changed: false, reward: 0 }));
        assert_eq!(line(vec![2, 4, 2, 4]), (vec![2, 4, 2, 4], Shift { changed: false, reward: 0 }));
        assert_eq!(line(vec![2, 2, 4, 4]), (vec![4, 8, 0, 0], Shift { changed: true, reward: 12 }));
        assert_eq!(line(vec![2, 0, 0, 2]), (vec![4, 0, 0, 0], Shift { changed: true, reward: 4 }));
        assert_eq!(line(vec![2, 2, 2, 2]), (vec![4, 4, 0, 0], Shift { changed: true, reward: 8 }));
    }

    #[test]
    fn merge_does_not_cascade() {
        assert_eq!(line(vec![2, 2, 2, 0]), (vec![4, 2, 0, 0], Shift { changed: true, reward: 4 }));
        assert_eq!(line(vec![4, 2, 2, 0]), (vec![4, 4, 0, 0], Shift { changed: true, reward: 4 }));
    }

    #[test]
    fn merge_only_line_is_changed() {
        // nothing moves before the merge, yet the line changes
        assert_eq!(line(vec![8, 8]), (vec![16, 0], Shift { changed: true, reward: 16 }));
    }

    #[test]
    fn test_shift_row_left_right() {
        let mut b = board(&[&[0, 2, 0, 2]]);
        assert_eq!(b.shift(Direction::Left), Shift { changed: true, reward: 4 });
        assert_eq!(b.to_rows(), vec![vec![4, 0, 0, 0]]);

        let mut b = board(&[&[0, 2, 0, 2]]);
        assert_eq!(b.shift(Direction::Right), Shift { changed: true, reward: 4 });
        assert_eq!(b.to_rows(), vec![vec![0, 0, 0, 4]]);

        let mut b = board(&[&[0, 4, 4, 4]]);
        b.shift(Direction::Right);
        assert_eq!(b.to_rows(), vec![vec![0, 0, 4, 8]]);
    }

    #[test]
    fn test_move_left() {
        let mut b = board(&[&[2, 4, 8, 16], &[2, 8, 8, 4], &[4, 0, 0, 4], &[2, 0, 0, 4]]);
        let s = b.shift(Direction::Left);
        assert_eq!(b, board(&[&[2, 4, 8, 16], &[2, 16, 4, 0], &[8, 0, 0, 0], &[2, 4, 0, 0]]));
        assert_eq!(s, Shift { changed: true, reward: 24 });
    }

    #[test]
    fn test_move_right() {
        let mut b = board(&[&[2, 4, 8, 16], &[2, 8, 8, 4], &[4, 0, 0, 4], &[2, 0, 0, 4]]);
        b.shift(Direction::Right);
        assert_eq!(b, board(&[&[2, 4, 8, 16], &[0, 2, 16, 4], &[0, 0, 0, 8], &[0, 0, 2, 4]]));
    }

    #[test]
    fn test_move_up() {
        let mut b = board(&[&[2, 2, 4, 2], &[4, 8, 0, 0], &[8, 8, 0, 0], &[16, 4, 4, 4]]);
        let s = b.shift(Direction::Up);
        assert_eq!(b, board(&[&[2, 2, 8, 2], &[4, 16, 0, 4], &[8, 4, 0, 0], &[16, 0, 0, 0]]));
        assert_eq!(s, Shift { changed: true, reward: 24 });
    }

    #[test]
    fn test_move_down() {
        let mut b = board(&[&[2, 2, 4, 2], &[4, 8, 0, 0], &[8, 8, 0, 0], &[16, 4, 4, 4]]);
        b.shift(Direction::Down);
        assert_eq!(b, board(&[&[2, 0, 0, 0], &[4, 2, 0, 0], &[8, 16, 0, 2], &[16, 4, 8, 4]]));
    }

    #[test]
    fn shift_non_square_columns() {
        let mut b = board(&[&[2, 0, 0], &[2, 0, 4], &[0, 0, 4], &[2, 8, 0]]);
        let s = b.shift(Direction::Down);
        assert_eq!(b, board(&[&[0, 0, 0], &[0, 0, 0], &[2, 0, 0], &[4, 8, 8]]));
        assert_eq!(s.reward, 12);
    }

    #[test]
    fn unchanged_shift_reports_no_change() {
        let mut b = board(&[&[2, 4, 0, 0], &[8, 0, 0, 0]]);
        let before = b.clone();
        assert_eq!(b.shift(Direction::Left), Shift::default());
        assert_eq!(b, before);
    }

    #[test]
    fn shifted_leaves_original() {
        let b = board(&[&[0, 0, 2, 2]]);
        let (next, s) = b.shifted(Direction::Left);
        assert_eq!(b.to_rows(), vec![vec![0, 0, 2, 2]]);
        assert_eq!(next.to_rows(), vec![vec![4, 0, 0, 0]]);
        assert!(s.changed);
    }

    #[test]
    fn loss_detection() {
        let full = board(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 2, 4], &[4, 2, 4, 2]]);
        assert!(full.is_lost());
        let open = board(&[&[2, 4, 2, 4], &[4, 2, 4, 2], &[2, 4, 0, 4], &[4, 2, 4, 2]]);
        assert!(!open.is_lost());
        let vertical_pair = board(&[&[2, 4], &[2, 8]]);
        assert!(!vertical_pair.is_lost());
        let horizontal_pair = board(&[&[2, 2], &[4, 8]]);
        assert!(!horizontal_pair.is_lost());
    }

    #[test]
    fn it_win_tile() {
        assert_eq!(win_tile(4, 4), Some(1 << 17));
        assert_eq!(win_tile(1, 1), Some(4));
        assert_eq!(win_tile(2, 3), Some(128));
        assert_eq!(win_tile(8, 8), None);
    }

    #[test]
    fn rejects_bad_boards() {
        assert!(matches!(Board::empty(0, 4), Err(ConfigError::InvalidSize { .. })));
        assert!(matches!(Board::from_rows(&[vec![2u64, 0], vec![2]]), Err(ConfigError::BoardShape { .. })));
        assert!(matches!(Board::from_rows(&[[3u64, 0]]), Err(ConfigError::InvalidTile(3))));
        assert!(matches!(Board::from_rows(&[[1u64, 0]]), Err(ConfigError::InvalidTile(1))));
        let none: [[u64; 2]; 0] = [];
        assert!(Board::from_rows(&none).is_err());
    }

    #[test]
    fn largest_tiles_merge_without_overflow() {
        let mut b = board(&[&[MAX_TILE, MAX_TILE]]);
        let s = b.shift(Direction::Left);
        assert_eq!(b.to_rows(), vec![vec![1 << 63, 0]]);
        assert_eq!(s, Shift { changed: true, reward: 1 << 63 });
    }

    #[test]
    fn top_tiles_never_merge() {
        let mut line = vec![1u64 << 63, 1 << 63];
        assert_eq!(slide_line(&mut line), Shift::default());
        assert_eq!(line, vec![1 << 63, 1 << 63]);
        // only reachable by merging, but must not count as a live pair
        let mut b = board(&[&[MAX_TILE, MAX_TILE]]);
        b.shift(Direction::Left);
        b.set(0, 1, 1 << 63);
        assert!(b.is_lost());
    }

    #[test]
    fn rejects_oversized_input() {
        assert!(matches!(Board::from_rows(&[[1u64 << 63, 1 << 63]]), Err(ConfigError::InvalidTile(_))));
        assert!(matches!(Board::empty(usize::MAX, 2), Err(ConfigError::InvalidSize { .. })));
        assert!(matches!(Board::empty(MAX_CELLS, 2), Err(ConfigError::InvalidSize { .. })));
        assert!(Board::empty(1, MAX_CELLS).is_ok());
    }

    #[test]
    fn random_empty_cell_hits_only_gap() {
        let b = board(&[&[2, 4, 8], &[16, 0, 32]]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(b.random_empty_cell(&mut rng), (1, 1));
        }
    }

    #[test]
    fn it_parse_direction() {
        assert_eq!("L".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!(" Up ".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("x".parse::<Direction>(), Err(InvalidDirectionError("x".to_string())));
        for d in Direction::ALL {
            assert_eq!(d.code().to_string().parse::<Direction>(), Ok(d));
        }
    }

    #[test]
    fn it_display() {
        let b = board(&[&[2, 0], &[0, 1024]]);
        let text = b.to_string();
        assert!(text.contains("1024"));
        assert_eq!(text.lines().filter(|l| l.starts_with('-')).count(), 1);
    }
}
