use std::str::FromStr;

use anyhow::{Context, Result};

use crate::{Cell, Grid};

/// Lines that carry grid content: blank lines and `;` comments are skipped.
fn content_lines(s: &str) -> impl Iterator<Item = &str> {
    s.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
}

impl FromStr for Grid {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let width = content_lines(s)
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let height = content_lines(s).count();

        // Short lines stay padded with walls.
        let mut grid = Grid::new(width, height).context("Puzzle too large")?;
        for (line, y) in content_lines(s).zip(0..) {
            for (ch, x) in line.chars().zip(0..) {
                grid.set(x, y, Cell::from(ch));
            }
        }

        // Trimming swallows the floor left of a player on the border column.
        for y in 0..height as i32 {
            if grid.cell_at(0, y) == Cell::Player {
                grid.set(0, y, Cell::Wall);
                grid.set(1, y, Cell::Player);
            }
        }

        Ok(grid)
    }
}
