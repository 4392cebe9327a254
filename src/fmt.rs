use std::fmt;

use crate::{Cell, Direction, Grid};

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, cell) in self.cells() {
            cell.fmt(f)?;
            if pos.0 as usize + 1 == self.width() {
                "\n".fmt(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        char::from(self.symbol()).fmt(f)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.letter().fmt(f)
    }
}

/// Splits a move string into groups of 4, with 4 groups per line.
pub fn group_moves(moves: &str) -> String {
    let chars = moves.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(chars.len() * 5 / 4 + 8);
    for (chunk, i) in chars.chunks(4).zip(1..) {
        out.extend(chunk);
        out.push(' ');
        if i % 4 == 0 {
            out.push('\n');
        }
    }
    out
}
