use clap::Parser;
use crossword_csp::backtracking_search::{find_fill, FillFailure, FillOptions};
use crossword_csp::grid_config::{load_grid_config, render_grid, save_image};
use crossword_csp::word_list::WordList;
use log::warn;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// crossword_csp: Fill a crossword structure from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing fillable cells and anything else a block
    structure: String,

    /// Path to the word list, with one word per line
    words: String,

    /// Path to write an image of the filled grid to, as a PNG
    output: Option<String>,

    /// Give up after this many seconds [default: none]
    #[arg(long)]
    timeout: Option<u64>,

    /// Give up after this many backtracks [default: none]
    #[arg(long)]
    max_backtracks: Option<usize>,

    /// Seed for breaking ties between equally-constrained slots
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let word_list = WordList::from_file(&args.words).map_err(|err| Error(err.to_string()))?;

    for error in &word_list.errors {
        warn!("{error}");
    }

    let grid_config =
        load_grid_config(word_list, &args.structure).map_err(|err| Error(err.to_string()))?;
    let config = grid_config.to_config_ref();

    let options = FillOptions {
        timeout: args.timeout.map(Duration::from_secs),
        max_backtracks: args.max_backtracks,
        rng_seed: args.seed,
    };

    let result = match find_fill(&config, &options) {
        Ok(result) => result,
        Err(FillFailure::NoSolution) => {
            println!("No solution.");
            return Ok(());
        }
        Err(failure) => return Err(Error(failure.to_string())),
    };

    println!("{}", render_grid(&config, &result.assignment));

    if let Some(output) = &args.output {
        save_image(&config, &result.assignment, output).map_err(|err| Error(err.to_string()))?;
    }

    Ok(())
}
