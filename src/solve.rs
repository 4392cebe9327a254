//! Breadth-first search over every configuration reachable from a start grid.
//!
//! Rounds expand configurations in order of move count, and the first path
//! recorded for a configuration is never replaced, so every recorded path is a
//! shortest one.

use std::error::Error;
use std::fmt;

use arrayvec::ArrayVec;
use rayon::prelude::*;

use crate::{group_moves, Cell, Direction, Grid, GridError, GridKey};

type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Moves leading to a configuration. `reached_exit` marks configurations
/// where the last move left the board through the exit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    pub moves: Vec<Direction>,
    pub reached_exit: bool,
}

impl Path {
    pub const EXIT_MARKER: char = 'e';

    fn then(&self, dir: Direction, reached_exit: bool) -> Self {
        let mut moves = Vec::with_capacity(self.moves.len() + 1);
        moves.extend_from_slice(&self.moves);
        moves.push(dir);
        Self {
            moves,
            reached_exit,
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.moves {
            dir.fmt(f)?;
        }
        if self.reached_exit {
            Self::EXIT_MARKER.fmt(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    InvalidStart(GridError),
    NoSolution,
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidStart(err) => write!(f, "not a valid start configuration ({err})"),
            SolveError::NoSolution => "no solution found".fmt(f),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SolveError::InvalidStart(err) => Some(err),
            SolveError::NoSolution => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub positions: usize,
    pub solutions: usize,
    pub shortest: Option<Path>,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Positions reached: {}", self.positions)?;
        writeln!(f, "Number of solutions found: {}", self.solutions)?;
        let shortest = self
            .shortest
            .as_ref()
            .map(|path| group_moves(&path.to_string()))
            .unwrap_or_default();
        writeln!(f, "Shortest solution: \n{shortest}")
    }
}

struct Successor {
    dir: Direction,
    grid: Grid,
    key: GridKey,
    exited: bool,
}

fn successors(grid: &Grid) -> ArrayVec<Successor, 4> {
    grid.legal_moves()
        .into_iter()
        .map(|dir| {
            let mut grid = grid.clone();
            let exited = grid.apply_move(dir);
            let key = grid.key();
            Successor {
                dir,
                grid,
                key,
                exited,
            }
        })
        .collect()
}

/// Frontier entries: visited-set index of the configuration and the configuration itself.
type Frontier = Vec<(usize, Grid)>;

/// Exhaustive breadth-first solver. Holds the visited set of the last run.
#[derive(Debug, Default)]
pub struct Solver {
    parallel: bool,
    start: Option<Grid>,
    visited: IndexMap<GridKey, Path>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A solver expanding each round's frontier on the rayon thread pool.
    /// Results are identical to the sequential solver.
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        self.visited.clear();
        self.start = None;
    }

    /// Explores every configuration reachable from `start` and returns the
    /// shortest path through the exit. `on_round` receives the visited count
    /// after each round.
    pub fn solve(
        &mut self,
        start: Grid,
        mut on_round: impl FnMut(usize),
    ) -> Result<Path, SolveError> {
        self.reset();
        start.validate().map_err(SolveError::InvalidStart)?;

        let (root, _) = self.visited.insert_full(start.key(), Path::default());
        let mut frontier = vec![(root, start.clone())];
        self.start = Some(start);

        let mut rounds = 0;
        while !frontier.is_empty() {
            #[cfg(feature = "coz")]
            coz::scope!("Round");

            rounds += 1;
            frontier = self.expand_round(&frontier);
            log::debug!(
                "Round {rounds}: {} new configurations to expand, {} visited",
                frontier.len(),
                self.visited.len(),
            );
            on_round(self.visited.len());
        }

        let stats = self.stats();
        log::info!(
            "Search finished after {rounds} rounds: {} positions, {} solutions",
            stats.positions,
            stats.solutions,
        );
        stats.shortest.ok_or(SolveError::NoSolution)
    }

    fn expand_round(&mut self, frontier: &Frontier) -> Frontier {
        let expanded = if self.parallel {
            frontier
                .par_iter()
                .map(|(_, grid)| successors(grid))
                .collect::<Vec<_>>()
        } else {
            frontier
                .iter()
                .map(|(_, grid)| successors(grid))
                .collect::<Vec<_>>()
        };

        // Insert in frontier order so the first-seen path wins regardless of expansion mode.
        let mut next = Vec::new();
        for (&(parent, _), succs) in frontier.iter().zip(expanded) {
            for succ in succs {
                #[cfg(feature = "coz")]
                coz::progress!("Step");

                if self.visited.contains_key(&succ.key) {
                    continue;
                }
                let path = self.visited[parent].then(succ.dir, succ.exited);
                let (index, _) = self.visited.insert_full(succ.key, path);
                // Escaped configurations are leaves.
                if !succ.exited {
                    next.push((index, succ.grid));
                }
            }
        }
        next
    }

    pub fn start(&self) -> Option<&Grid> {
        self.start.as_ref()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Recorded path to `grid`, if it was reached.
    pub fn path_to(&self, grid: &Grid) -> Option<&Path> {
        self.visited.get(&grid.key())
    }

    /// Paths that left through the exit, in discovery order.
    pub fn solutions(&self) -> impl Iterator<Item = &Path> + '_ {
        self.visited.values().filter(|path| path.reached_exit)
    }

    /// The shortest solution. Ties go to the one discovered first.
    pub fn shortest(&self) -> Option<&Path> {
        self.solutions().min_by_key(|path| path.len())
    }

    pub fn stats(&self) -> Stats {
        Stats {
            positions: self.visited.len(),
            solutions: self.solutions().count(),
            shortest: self.shortest().cloned(),
        }
    }

    /// The start grid with the player drawn on every position it reached.
    pub fn reached_positions(&self) -> Option<Grid> {
        let mut overlay = self.start.clone()?;
        for key in self.visited.keys() {
            let pos = Grid::from(key).player();
            overlay.set(pos.0 as i32, pos.1 as i32, Cell::Player);
        }
        Some(overlay)
    }
}
