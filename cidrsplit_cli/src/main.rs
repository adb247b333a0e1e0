mod config;
mod errors;
mod report;
mod tally;
mod tokenize;

use crate::config::Seed;
use crate::errors::CliError;
use cidrsplit_core::{decompose, telemetry, PrefixIndex};
use clap::Parser;
use log::{debug, error, info, LevelFilter};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cidrsplit", version, about, long_about = None)]
struct Cli {
    /// TOML file with `[[seed]]` entries; replaces the built-in seed list
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra seed as CIDR@LEN, e.g. 192.168.0.0/16@24 (repeatable)
    #[arg(short, long = "seed")]
    seeds: Vec<Seed>,

    /// Read from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Only list blocks that were hit at least once
    #[arg(long, default_value_t = false)]
    hits_only: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::builder()
        .format_timestamp(None)
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn build_index(seeds: &[Seed]) -> PrefixIndex {
    let mut index = PrefixIndex::new();
    for seed in seeds {
        // a bad seed is skipped, the rest still load
        if let Err(e) = decompose(&mut index, &seed.cidr, seed.target) {
            error!("split {}@{}: {} ({})", seed.cidr, seed.target, e, e.code().as_str());
        }
    }
    info!("index ready: {} blocks", index.len());
    index
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut seeds = match &cli.config {
        Some(path) => config::load_seeds(path)?,
        None => config::default_seeds(),
    };
    seeds.extend(cli.seeds.iter().cloned());

    let mut index = build_index(&seeds);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let tally = match &cli.input {
        Some(path) => tally::run(&mut index, BufReader::new(File::open(path)?), &mut out)?,
        None => tally::run(&mut index, io::stdin().lock(), &mut out)?,
    };

    report::write_report(&mut out, &index, &tally, cli.hits_only)?;
    out.flush()?;

    for (name, value) in telemetry::snapshot() {
        debug!("{} = {}", name, value);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    telemetry::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("cidrsplit: {}", e);
            ExitCode::FAILURE
        }
    }
}
