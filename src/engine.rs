use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Fixed evaluation order. Ties are always broken toward the earlier entry.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Position of this direction in [`Move::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    /// Single-letter form used by the runners (`U`, `D`, `L`, `R`).
    pub fn letter(self) -> char {
        b"UDLR"[self.index()] as char
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Probability that a spawned tile is a 2 (otherwise a 4).
pub const TWO_TILE_PROB: f64 = 0.9;

/// Number of rank-1 tiles on a fresh board.
pub const INITIAL_TILES: usize = 3;

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines
const MAX_RANK: u8 = 15;
const COL_MASK: u64 = 0xF000_F000_F000_F000;

struct Stores {
    row_left: Box<[u16]>,
    row_right: Box<[u16]>,
    col_up: Box<[u64]>,
    col_down: Box<[u64]>,
    score: Box<[Score]>,
}

type BoardRaw = u64;
type Line = u64;
type Tile = u64;
type Score = u64;

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
///
/// Each nibble holds a rank `r` (tile value `2^r`, 0 = empty). Cell `(x, y)`
/// lives at nibble `4 * y + x`, counted from the most significant nibble, so
/// row 0 occupies the top 16 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

/// Outcome of applying a direction to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    /// False when the direction left the board unchanged (an illegal move).
    pub moved: bool,
    /// Points earned by the merges of this move.
    pub score_delta: Score,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board(raw) }

    /// Consume this `Board`, returning the raw packed `u64`.
    #[inline]
    pub fn into_raw(self) -> BoardRaw { self.0 }

    /// Borrow the raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw { self.0 }

    /// Build a board from 16 row-major ranks.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// let b = Board::from_ranks([1, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 11]);
    /// assert_eq!(b.get(1, 1), 4);
    /// assert_eq!(b.get(3, 3), 2048);
    /// ```
    pub fn from_ranks(ranks: [u8; 16]) -> Self {
        let raw = ranks
            .iter()
            .enumerate()
            .fold(0u64, |acc, (idx, &r)| acc | (((r & 0xf) as u64) << nibble_shift(idx)));
        Board(raw)
    }

    /// Rank stored at column `x`, row `y` (0 when empty or out of range).
    #[inline]
    pub fn rank(self, x: usize, y: usize) -> u8 {
        if x >= 4 || y >= 4 {
            return 0;
        }
        extract_tile(self, 4 * y + x) as u8
    }

    /// Tile value at column `x`, row `y` (0 when empty or out of range).
    #[inline]
    pub fn get(self, x: usize, y: usize) -> u32 {
        match self.rank(x, y) {
            0 => 0,
            r => 1 << r,
        }
    }

    /// Return a copy with the cell at `(x, y)` set to `value`.
    ///
    /// `value` must be 0 (clear) or a power of two between 2 and 32768; any
    /// other value, or an out-of-range coordinate, leaves the board unchanged.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// let b = Board::EMPTY.with_tile(0, 0, 8);
    /// assert_eq!(b.get(0, 0), 8);
    /// assert_eq!(b.with_tile(0, 0, 6), b);
    /// ```
    #[inline]
    pub fn with_tile(self, x: usize, y: usize, value: u32) -> Self {
        if x >= 4 || y >= 4 {
            return self;
        }
        let rank = match value {
            0 => 0,
            v if v >= 2 && v.is_power_of_two() && v.trailing_zeros() <= MAX_RANK as u32 => v.trailing_zeros() as u64,
            _ => return self,
        };
        let shift = nibble_shift(4 * y + x);
        Board((self.0 & !(0xf << shift)) | (rank << shift))
    }

    /// Return the board resulting from sliding/merging tiles in `dir` (no random insert).
    ///
    /// Example
    /// ```
    /// use auto_2048::engine::{Board, Move};
    /// let b = Board::EMPTY;
    /// assert_eq!(b.shift(Move::Left), b);
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        let s = stores();
        match dir {
            Move::Left => shift_rows(self, &s.row_left),
            Move::Right => shift_rows(self, &s.row_right),
            Move::Up => shift_cols(self, &s.col_up),
            Move::Down => shift_cols(self, &s.col_down),
        }
    }

    /// Apply `dir` and report whether anything changed and how many points the merges earned.
    ///
    /// ```
    /// use auto_2048::engine::{Board, Move};
    /// let b = Board::from_ranks([1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    /// let r = b.apply(Move::Left);
    /// assert!(r.moved);
    /// assert_eq!(r.score_delta, 4);
    /// assert_eq!(r.board.get(0, 0), 4);
    /// ```
    #[inline]
    pub fn apply(self, dir: Move) -> MoveResult {
        let board = self.shift(dir);
        let moved = board != self;
        let score_delta = if moved { board.score().saturating_sub(self.score()) } else { 0 };
        MoveResult { board, moved, score_delta }
    }

    /// True if sliding in `dir` changes the board.
    #[inline]
    pub fn is_legal(self, dir: Move) -> bool { self.shift(dir) != self }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot, using the provided RNG.
    ///
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    #[inline]
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let tile = generate_random_tile(rng);
        self.with_tile_at_random(tile, rng)
    }

    /// Starting position: three 2-tiles on distinct random cells.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let b = Board::initial(&mut StdRng::seed_from_u64(5));
    /// assert_eq!(b.count_occupied(), 3);
    /// assert_eq!(b.highest_tile(), 2);
    /// ```
    pub fn initial<R: Rng + ?Sized>(rng: &mut R) -> Self {
        (0..INITIAL_TILES).fold(Board::EMPTY, |b, _| b.with_tile_at_random(1, rng))
    }

    fn with_tile_at_random<R: Rng + ?Sized>(self, mut tile: Tile, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 { break; }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Perform a move then insert a random tile if the move changed the board, using the provided RNG.
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, direction: Move, rng: &mut R) -> Self {
        let moved = self.shift(direction);
        if moved != self { moved.with_random_tile(rng) } else { self }
    }

    /// Implied score of this board: every tile counted as built from 2-tiles.
    #[inline]
    pub fn score(self) -> Score { get_score(self) }

    /// True when no empty cell remains and no direction changes the board.
    ///
    /// ```
    /// use auto_2048::engine::Board;
    /// assert!(!Board::EMPTY.is_game_over());
    /// assert!(Board::from_raw(0x1212_2121_1212_2121).is_game_over());
    /// ```
    #[inline]
    pub fn is_game_over(self) -> bool { is_game_over(self) }

    /// Return the highest tile value (e.g., 2048) present on the board, 0 when empty.
    #[inline]
    pub fn highest_tile(self) -> Tile { get_highest_tile_val(self) }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(self) -> u64 { count_empty(self) }

    /// Count the number of occupied cells on the board.
    #[inline]
    pub fn count_occupied(self) -> u64 { 16 - count_empty(self) }

    /// Number of distinct non-empty ranks present.
    #[inline]
    pub fn count_distinct_tiles(self) -> u32 { count_distinct_tiles(self) }

    /// `(x, y)` coordinates of every empty cell, row-major.
    pub fn empty_cells(self) -> impl Iterator<Item = (usize, usize)> {
        (0..16).filter(move |&idx| extract_tile(self, idx) == 0).map(|idx| (idx % 4, idx / 4))
    }

    /// Get the actual value at index (2^exponent stored at nibble, 0 when empty).
    ///
    /// Index runs 0..16 row-major.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 { get_tile_val(self, idx) }

    /// Rows and columns swapped.
    #[inline]
    pub fn transpose(self) -> Self { Board(transpose(self.0)) }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<_> = to_vec(*self).iter().map(format_val).collect();
        for (row_idx, row) in cells.chunks(4).enumerate() {
            if row_idx > 0 {
                writeln!(f, "-------------------------------")?;
            }
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

impl From<BoardRaw> for Board { fn from(v: BoardRaw) -> Self { Board::from_raw(v) } }
impl From<Board> for BoardRaw { fn from(b: Board) -> Self { b.into_raw() } }

/// Initialize internal tables eagerly. Safe to call multiple times; tables are
/// otherwise built on first use.
pub fn new() {
    let _ = stores();
}

/// Compute the total score for a board.
pub fn get_score(board: Board) -> Score {
    let score_table = &stores().score;
    (0..4).fold(0, |acc, idx| acc + score_table[extract_line(board.0, idx) as usize])
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline(always)]
pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

/// Return the cell's actual value (0 if empty), e.g., 2, 4, 8, ...
pub fn get_tile_val(board: Board, idx: usize) -> u32 {
    match extract_tile(board, idx) {
        0 => 0,
        r => 1 << r,
    }
}

/// Decode a 16-bit line into its four ranks, leading nibble first.
pub fn line_to_ranks(line: Line) -> [u8; 4] {
    [(line >> 12 & 0xf) as u8, (line >> 8 & 0xf) as u8, (line >> 4 & 0xf) as u8, (line & 0xf) as u8]
}

fn ranks_to_line(ranks: [u8; 4]) -> Line {
    (ranks[0] as Line) << 12 | (ranks[1] as Line) << 8 | (ranks[2] as Line) << 4 | ranks[3] as Line
}

/// True when the board is full and no move in any direction changes it.
pub fn is_game_over(board: Board) -> bool {
    count_empty(board) == 0 && Move::ALL.iter().all(|&dir| board.shift(dir) == board)
}

/// Count the number of zero tiles.
///
/// The nibble ladder below only works for a non-empty board (16 empties would
/// overflow the final nibble), so the all-zero board is answered directly.
pub fn count_empty(board: Board) -> u64 {
    let mut x = board.0;
    if x == 0 {
        return 16;
    }
    x |= (x >> 2) & 0x3333_3333_3333_3333;
    x |= x >> 1;
    x = !x & 0x1111_1111_1111_1111;
    x += x >> 32;
    x += x >> 16;
    x += x >> 8;
    x += x >> 4;
    x & 0xf
}

// Credit to Nneonneo
pub fn count_distinct_tiles(board: Board) -> u32 {
    let mut bitset = 0u16;
    let mut board_copy = board.0;
    while board_copy != 0 {
        bitset |= 1 << (board_copy & 0xf);
        board_copy >>= 4;
    }
    bitset >>= 1; // don't count empty tiles
    bitset.count_ones()
}

static STORES: OnceLock<Stores> = OnceLock::new();

fn create_stores() -> Stores {
    // Allocate on the heap to avoid large stack frames
    let mut row_left = vec![0u16; LINE_TABLE_SIZE];
    let mut row_right = vec![0u16; LINE_TABLE_SIZE];
    let mut col_up = vec![0u64; LINE_TABLE_SIZE];
    let mut col_down = vec![0u64; LINE_TABLE_SIZE];
    let mut score = vec![0u64; LINE_TABLE_SIZE];

    for val in 0..LINE_TABLE_SIZE {
        let line = val as Line;
        let ranks = line_to_ranks(line);
        let left = ranks_to_line(slide_ranks_left(ranks));
        let right = ranks_to_line(slide_ranks_right(ranks));
        row_left[val] = (line ^ left) as u16;
        row_right[val] = (line ^ right) as u16;
        col_up[val] = unpack_col(line) ^ unpack_col(left);
        col_down[val] = unpack_col(line) ^ unpack_col(right);
        score[val] = calc_score(ranks);
    }

    Stores {
        row_left: row_left.into_boxed_slice(),
        row_right: row_right.into_boxed_slice(),
        col_up: col_up.into_boxed_slice(),
        col_down: col_down.into_boxed_slice(),
        score: score.into_boxed_slice(),
    }
}

#[inline(always)]
fn stores() -> &'static Stores {
    STORES.get_or_init(create_stores)
}

/// Spread a column line (leading nibble = top row) into column 0 of a board.
#[inline(always)]
fn unpack_col(line: Line) -> BoardRaw {
    ((line << 48) | (line << 36) | (line << 24) | (line << 12)) & COL_MASK
}

#[inline(always)]
fn nibble_shift(idx: usize) -> u64 {
    (60 - 4 * idx) as u64
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_bool(TWO_TILE_PROB) { 1 } else { 2 }
}

fn shift_rows(board: Board, table: &[u16]) -> Board {
    let res = (0..4).fold(board.0, |new_board, row_idx| {
        let delta = table[extract_line(board.0, row_idx) as usize] as u64;
        new_board ^ (delta << ((3 - row_idx) * 16))
    });
    Board(res)
}

fn shift_cols(board: Board, table: &[u64]) -> Board {
    let transpose_board = transpose(board.0);
    let res = (0..4).fold(board.0, |new_board, col_idx| {
        let delta = table[extract_line(transpose_board, col_idx) as usize];
        new_board ^ (delta >> (4 * col_idx))
    });
    Board(res)
}

/// Slide toward index 0, merging each equal pair at most once per move.
/// Two rank-15 tiles merge into rank 15 (representational limit).
fn slide_ranks_left(ranks: [u8; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let mut len = 0;
    let mut can_merge = false;
    for &rank in ranks.iter().filter(|&&r| r != 0) {
        if can_merge && out[len - 1] == rank {
            out[len - 1] = (rank + 1).min(MAX_RANK);
            can_merge = false;
        } else {
            out[len] = rank;
            len += 1;
            can_merge = true;
        }
    }
    out
}

fn slide_ranks_right(mut ranks: [u8; 4]) -> [u8; 4] {
    ranks.reverse();
    let mut out = slide_ranks_left(ranks);
    out.reverse();
    out
}

// Credit to Nneonneo
fn calc_score(ranks: [u8; 4]) -> Score {
    ranks
        .iter()
        .filter(|&&r| r >= 2)
        // the score is the total sum of the tile and all intermediate merged tiles
        .map(|&r| (r as Score - 1) * (1 << r))
        .sum()
}

pub(crate) fn to_vec(board: Board) -> Vec<u8> {
    (0..16).map(|idx| extract_tile(board, idx) as u8).collect()
}

#[inline(always)]
fn extract_tile(board: Board, idx: usize) -> Tile {
    (board.0 >> ((15 - idx) * 4)) & 0xf
}

fn format_val(val: &u8) -> String {
    match val {
        0 => " ".repeat(7),
        &x => format!("{:^7}", 1u32 << x),
    }
}

pub fn get_highest_tile_val(board: Board) -> Tile {
    match (0..16).map(|idx| extract_tile(board, idx)).max() {
        Some(0) | None => 0,
        Some(max_tile) => 1 << max_tile,
    }
}
