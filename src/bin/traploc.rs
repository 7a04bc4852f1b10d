use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use traploc::{Dcel, InsertionOrder, Options, TrapMap, DEFAULT_EPSILON, DEFAULT_MARGIN};

/// Locate points in a planar subdivision using a trapezoidal map
#[derive(Parser)]
#[command(name = "traploc", version, about)]
struct Cli {
    /// File describing the subdivision as a doubly connected edge list
    dcel: PathBuf,

    /// Query points, as `x,y`. They are read from stdin, one per line, when none is given
    #[arg(value_parser = parse_point, allow_hyphen_values = true)]
    points: Vec<[f64; 2]>,

    /// Tolerance for vertex coincidence and point-on-segment tests
    #[arg(long, default_value_t = DEFAULT_EPSILON, value_parser = parse_positive)]
    epsilon: f64,

    /// Distance between the outermost vertices and the bounding box
    #[arg(long, default_value_t = DEFAULT_MARGIN, value_parser = parse_positive)]
    margin: f64,

    /// Shuffle the segments with this seed before inserting them
    #[arg(long)]
    seed: Option<u64>,

    /// Check the invariants of the map after every insertion
    #[arg(long)]
    check: bool,

    /// Print statistics about the search structure to stderr
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.dcel)
        .with_context(|| format!("Failed to read `{}`", cli.dcel.display()))?;
    let dcel: Dcel = text
        .parse()
        .with_context(|| format!("Invalid subdivision in `{}`", cli.dcel.display()))?;

    let mut options = Options::default()
        .with_epsilon(cli.epsilon)
        .with_margin(cli.margin)
        .check_each_insertion(cli.check);
    if let Some(seed) = cli.seed {
        options = options.with_order(InsertionOrder::Shuffled { seed });
    }
    let trap_map = TrapMap::build(&dcel, &options)?;
    if cli.stats {
        eprintln!("{}", trap_map.stats());
    }

    if !cli.points.is_empty() {
        for point in &cli.points {
            answer(&trap_map, point);
        }
        return Ok(());
    }
    for (idx, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let point = parse_point(line).map_err(|err| anyhow!("Line {} of stdin: {}", idx + 1, err))?;
        answer(&trap_map, &point);
    }
    Ok(())
}

fn answer(trap_map: &TrapMap, point: &[f64; 2]) {
    let response = trap_map.query(point);
    tracing::debug!(?point, ?response, "query");
    println!("{}", trap_map.describe(&response));
    match trap_map.face_of(&response) {
        Some(face) => println!("face {}\n", face),
        None => println!(),
    }
}

fn parse_point(s: &str) -> Result<[f64; 2], String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{}`", s))?;
    let coord = |c: &str| {
        c.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate `{}`: {}", c.trim(), err))
    };
    Ok([coord(x)?, coord(y)?])
}

fn parse_positive(s: &str) -> Result<f64, String> {
    let value = s
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid number `{}`: {}", s.trim(), err))?;
    if value > 0. && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("expected a positive number, got `{}`", s.trim()))
    }
}
