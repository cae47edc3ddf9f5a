//! jsonselect - filter JSON records with SQL

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use jsonselect::{SelectOptions, SelectQuery};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::PathBuf;

/// jsonselect - Run a SELECT ... WHERE query over a stream of JSON records
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Query, e.g. "SELECT * FROM S3Object s WHERE s.age > 30"
    query: String,

    /// Input file (defaults to stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Comma-separated column names used for positional lookup
    #[arg(short, long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Separator written after each output record
    #[arg(long, default_value = "\n")]
    record_delimiter: String,

    /// Print run statistics as JSON on stderr
    #[arg(long)]
    stats: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let options = SelectOptions {
        column_names: args.columns,
        record_delimiter: args.record_delimiter,
    };
    let query = SelectQuery::prepare_with(&args.query, &options).context("Invalid query")?;

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("Failed to open input file {}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    let output = BufWriter::new(io::stdout().lock());

    let stats = query.run(input, output).context("Query failed")?;

    if args.stats {
        eprintln!("{}", serde_json::to_string(&stats)?);
    }

    Ok(())
}
