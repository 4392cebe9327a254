use std::time::Duration;

use anyhow::{bail, Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use mazezam_solver::solve::{SolveError, Solver};
use mazezam_solver::Grid;

const USAGE: &str = "Usage: mazezam-solver [--par] [--positions] <FILE>";

struct Options {
    path: String,
    parallel: bool,
    show_positions: bool,
}

impl Options {
    fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut path = None;
        let mut parallel = false;
        let mut show_positions = false;
        for arg in args {
            match arg.as_str() {
                "--par" => parallel = true,
                "--positions" => show_positions = true,
                _ if path.is_none() && !arg.starts_with("--") => path = Some(arg),
                _ => bail!("Unexpected argument {arg:?}\n{USAGE}"),
            }
        }
        Ok(Self {
            path: path.context(USAGE)?,
            parallel,
            show_positions,
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let opts = Options::from_args(std::env::args().skip(1))?;
    let map_data = std::fs::read_to_string(&opts.path)
        .with_context(|| format!("Could not read file {}", opts.path))?;
    let grid = map_data
        .parse::<Grid>()
        .context("Failed to parse the puzzle")?;
    println!("{grid}");

    let mut solver = if opts.parallel {
        Solver::parallel()
    } else {
        Solver::new()
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {elapsed} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    let ret = solver.solve(grid, |visited| {
        pb.set_message(format!("{visited} positions"));
    });
    pb.finish_and_clear();

    match ret {
        Ok(path) => println!("{}", style(format!("Solved in {} moves", path.len())).green()),
        Err(err @ SolveError::NoSolution) => println!("{}", style(err).yellow()),
        Err(err) => return Err(err).context("Cannot solve the puzzle"),
    }

    if opts.show_positions {
        if let Some(overlay) = solver.reached_positions() {
            println!("{overlay}");
        }
    }
    print!("{}", solver.stats());
    Ok(())
}
