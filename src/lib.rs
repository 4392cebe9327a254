use std::error::Error;
use std::fmt as stdfmt;
use std::ops::{Index, IndexMut};

use anyhow::{bail, ensure, Result};
use arrayvec::ArrayVec;

mod fmt;
mod parse;
pub mod solve;

pub use fmt::group_moves;

/// Largest supported width or height, so both fit the serialized header.
pub const MAX_SIDE: usize = u8::MAX as usize;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Wall,
    Space,
    Block,
    Player,
    Exit,
}

impl Cell {
    pub const fn symbol(self) -> u8 {
        match self {
            Cell::Wall => b'#',
            Cell::Space => b' ',
            Cell::Block => b'$',
            Cell::Player => b'+',
            Cell::Exit => b'*',
        }
    }

    /// Cells a shifted row never passes through.
    pub fn is_fixed(self) -> bool {
        matches!(self, Self::Wall | Self::Exit)
    }

    /// Cells carried along by a row shift.
    pub fn is_movable(self) -> bool {
        matches!(self, Self::Block | Self::Player)
    }
}

/// Unknown symbols are walls.
impl From<u8> for Cell {
    fn from(symbol: u8) -> Self {
        match symbol {
            b' ' => Cell::Space,
            b'$' => Cell::Block,
            b'+' => Cell::Player,
            b'*' => Cell::Exit,
            _ => Cell::Wall,
        }
    }
}

impl From<char> for Cell {
    fn from(ch: char) -> Self {
        u8::try_from(ch).map_or(Cell::Wall, Cell::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Probe order of `Grid::legal_moves`. Fixes the discovery order of the search.
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Left => 'l',
            Direction::Down => 'd',
            Direction::Right => 'r',
        }
    }

    pub fn from_letter(ch: char) -> Option<Self> {
        Some(match ch {
            'u' => Direction::Up,
            'l' => Direction::Left,
            'd' => Direction::Down,
            'r' => Direction::Right,
            _ => return None,
        })
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Column and row, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vec2(pub u8, pub u8);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GridError {
    PlayerCount(usize),
    OpenBorder(Vec2),
}

impl stdfmt::Display for GridError {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        match self {
            GridError::PlayerCount(n) => write!(f, "expected exactly one player, found {n}"),
            GridError::OpenBorder(Vec2(x, y)) => write!(f, "border is open at ({x}, {y})"),
        }
    }
}

impl Error for GridError {}

/// An illegal move was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocked(pub Direction);

impl stdfmt::Display for Blocked {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        write!(f, "cannot move {}", self.0.letter())
    }
}

impl Error for Blocked {}

/// Serialized grid content, the identity of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridKey(Box<[u8]>);

impl From<&GridKey> for Grid {
    fn from(key: &GridKey) -> Self {
        // Keys are only built from grids, so the header always matches the body.
        Grid::decode(key.0[0], key.0[1], &key.0[2..])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    width: u8,
    height: u8,
    cells: Box<[Cell]>,
}

impl Index<Vec2> for Grid {
    type Output = Cell;
    fn index(&self, pos: Vec2) -> &Self::Output {
        let idx = pos.1 as usize * self.width as usize + pos.0 as usize;
        &self.cells[idx]
    }
}
impl IndexMut<Vec2> for Grid {
    fn index_mut(&mut self, pos: Vec2) -> &mut Self::Output {
        let idx = pos.1 as usize * self.width as usize + pos.0 as usize;
        &mut self.cells[idx]
    }
}

impl Grid {
    /// An all-wall grid.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        ensure!(
            width <= MAX_SIDE && height <= MAX_SIDE,
            "Grid of {width}x{height} exceeds the maximum size of {MAX_SIDE}x{MAX_SIDE}",
        );
        Ok(Self {
            width: width as u8,
            height: height as u8,
            cells: vec![Cell::Wall; width * height].into(),
        })
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (Vec2, Cell)> + '_ {
        let w = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, &cell)| (Vec2((idx % w) as u8, (idx / w) as u8), cell))
    }

    fn row(&self, y: u8) -> &[Cell] {
        let w = self.width as usize;
        &self.cells[y as usize * w..(y as usize + 1) * w]
    }

    fn row_mut(&mut self, y: u8) -> &mut [Cell] {
        let w = self.width as usize;
        &mut self.cells[y as usize * w..(y as usize + 1) * w]
    }

    fn pos(&self, x: i32, y: i32) -> Option<Vec2> {
        let x = u8::try_from(x).ok()?;
        let y = u8::try_from(y).ok()?;
        (x < self.width && y < self.height).then_some(Vec2(x, y))
    }

    /// The cell at `(x, y)`, or `Wall` anywhere outside the grid.
    pub fn cell_at(&self, x: i32, y: i32) -> Cell {
        self.pos(x, y).map_or(Cell::Wall, |pos| self[pos])
    }

    /// Writes outside the grid are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(pos) = self.pos(x, y) {
            self[pos] = cell;
        }
    }

    fn sibling_pos(&self, pos: Vec2, dir: Direction) -> Option<Vec2> {
        const DIRECTIONS: [(i8, i8); 4] = [(0, -1), (-1, 0), (0, 1), (1, 0)];
        let x = pos.0.checked_add_signed(DIRECTIONS[dir as usize].0)?;
        let y = pos.1.checked_add_signed(DIRECTIONS[dir as usize].1)?;
        if self.width <= x || self.height <= y {
            return None;
        }
        Some(Vec2(x, y))
    }

    fn sibling(&self, pos: Vec2, dir: Direction) -> Cell {
        self.sibling_pos(pos, dir).map_or(Cell::Wall, |pos| self[pos])
    }

    /// Position of the player, or the origin if there is none.
    pub fn player(&self) -> Vec2 {
        self.cells()
            .find(|&(_, cell)| cell == Cell::Player)
            .map_or(Vec2(0, 0), |(pos, _)| pos)
    }

    /// `(to, from)` column pairs of a horizontal row shift, in walking order.
    /// Each `to` inherits the content of `from`.
    fn row_walk(width: u8, dir: Direction) -> impl Iterator<Item = (usize, usize)> {
        let w = width as usize;
        let leftward = dir == Direction::Left;
        (0..w.saturating_sub(1)).map(move |i| {
            if leftward {
                (i, i + 1)
            } else {
                (w - 1 - i, w - 2 - i)
            }
        })
    }

    /// Whether row `y` can slide one cell in `dir` without pressing a block or
    /// the player against a wall or the exit.
    pub fn can_shift(&self, y: u8, dir: Direction) -> bool {
        if y >= self.height || !dir.is_horizontal() {
            return false;
        }
        let row = self.row(y);
        Self::row_walk(self.width, dir)
            .all(|(to, from)| !(row[to].is_fixed() && row[from].is_movable()))
    }

    /// Slides every run of row `y` between fixed cells one cell in `dir`.
    /// Cells left behind next to a fixed cell become `Space`.
    pub fn shift(&mut self, y: u8, dir: Direction) {
        if y >= self.height || !dir.is_horizontal() {
            return;
        }
        let width = self.width;
        let row = self.row_mut(y);
        for (to, from) in Self::row_walk(width, dir) {
            if !row[to].is_fixed() {
                row[to] = if row[from].is_fixed() {
                    Cell::Space
                } else {
                    row[from]
                };
            }
        }
    }

    fn can_go(&self, from: Vec2, dir: Direction) -> bool {
        match self.sibling(from, dir) {
            Cell::Space | Cell::Exit => true,
            // Only horizontal moves push.
            Cell::Block => self.can_shift(from.1, dir),
            Cell::Wall | Cell::Player => false,
        }
    }

    pub fn legal_moves(&self) -> ArrayVec<Direction, 4> {
        let player = self.player();
        Direction::ALL
            .into_iter()
            .filter(|&dir| self.can_go(player, dir))
            .collect()
    }

    /// Moves the player without checking legality. Returns whether the player
    /// stepped onto the exit.
    pub fn apply_move(&mut self, dir: Direction) -> bool {
        let from = self.player();
        if from.0 >= self.width || from.1 >= self.height {
            return false;
        }
        self[from] = Cell::Space;
        let Some(to) = self.sibling_pos(from, dir) else {
            return false;
        };
        let target = self[to];
        if target == Cell::Block && dir.is_horizontal() {
            self.shift(from.1, dir);
        }
        self[to] = Cell::Player;
        target == Cell::Exit
    }

    /// Moves the player if the move is legal. Returns whether the player escaped.
    pub fn go(&mut self, dir: Direction) -> Result<bool, Blocked> {
        if !self.can_go(self.player(), dir) {
            return Err(Blocked(dir));
        }
        Ok(self.apply_move(dir))
    }

    pub fn validate(&self) -> Result<(), GridError> {
        let mut players = 0;
        let mut open_border = None;
        for (pos @ Vec2(x, y), cell) in self.cells() {
            if cell == Cell::Player {
                players += 1;
            }
            let on_border = x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height;
            if on_border && !cell.is_fixed() && open_border.is_none() {
                open_border = Some(pos);
            }
        }
        if players != 1 {
            return Err(GridError::PlayerCount(players));
        }
        match open_border {
            Some(pos) => Err(GridError::OpenBorder(pos)),
            None => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// `[width, height, cells...]`, each cell as its text symbol.
    pub fn to_bytes(&self) -> Box<[u8]> {
        [self.width, self.height]
            .into_iter()
            .chain(self.cells.iter().map(|cell| cell.symbol()))
            .collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let [width, height, body @ ..] = bytes else {
            bail!("Truncated grid header: {} bytes", bytes.len());
        };
        ensure!(
            body.len() == *width as usize * *height as usize,
            "Grid body has {} cells, expecting {width}x{height}",
            body.len(),
        );
        Ok(Self::decode(*width, *height, body))
    }

    fn decode(width: u8, height: u8, body: &[u8]) -> Self {
        Self {
            width,
            height,
            cells: body.iter().map(|&b| Cell::from(b)).collect(),
        }
    }

    pub fn key(&self) -> GridKey {
        GridKey(self.to_bytes())
    }
}
