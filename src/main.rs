use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use ufshard::config::FingerprintConfig;
use ufshard::fingerprint::Fingerprinter;
use ufshard::models::ShardRecord;
use ufshard::{pipeline, search, source};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ufshard")]
#[command(about = "Fingerprint municipal registry records and shard them into per-UF binary files")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the dataset, fingerprint records, and write per-UF shards
    Process(ProcessArgs),
    /// Query an existing shard directory
    Search(SearchArgs),
}

#[derive(Args)]
struct ProcessArgs {
    /// Path to the semicolon-delimited municipalities dataset
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the binary shard files
    #[arg(short, long)]
    output: PathBuf,

    /// Snapshot file to diff against and refresh with the input dataset
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// PBKDF2 iteration count for fingerprint derivation
    #[arg(long, default_value_t = FingerprintConfig::default().iterations)]
    iterations: u32,

    /// Fingerprint digest length in bytes
    #[arg(long, default_value_t = FingerprintConfig::default().digest_len)]
    digest_len: usize,
}

#[derive(Args)]
struct SearchArgs {
    /// Directory containing the binary shard files
    #[arg(short, long)]
    output: PathBuf,

    /// Exact UF code (e.g. SP)
    #[arg(long)]
    uf: Option<String>,

    /// Case-insensitive substring of the municipality name
    #[arg(long)]
    name: Option<String>,

    /// Exact IBGE code (e.g. 3509502)
    #[arg(long)]
    ibge: Option<String>,
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let started = Instant::now();

    // A failed load aborts here, before any shard file is touched.
    let lines = source::load_lines(&args.input)?;

    if let Some(snapshot) = &args.snapshot {
        let outcome = source::refresh_snapshot(&lines, snapshot)?;
        if outcome.changed_lines > 0 {
            info!(
                changed = outcome.changed_lines,
                "Dataset changed since the previous snapshot"
            );
        }
    }

    let config = FingerprintConfig {
        iterations: args.iterations,
        digest_len: args.digest_len,
    };
    let fingerprinter = Fingerprinter::new(config);

    let stats = pipeline::run_pipeline(&lines, &args.output, &fingerprinter)?;

    println!();
    println!("=== Summary ===");
    println!("Records parsed:     {}", stats.records_parsed);
    println!("Lines skipped:      {}", stats.lines_skipped);
    println!("Exterior dropped:   {}", stats.exterior_dropped);
    println!("Shards written:     {}", stats.shards_written);
    println!("Records written:    {}", stats.records_written);
    println!("Total time:         {:.2}s", started.elapsed().as_secs_f64());
    println!();
    println!("Output directory:   {}", args.output.display());

    Ok(())
}

fn run_search(args: SearchArgs) -> Result<()> {
    let (results, title) = match (&args.uf, &args.name, &args.ibge) {
        (Some(uf), None, None) => (
            search::search_by_uf(&args.output, uf),
            format!("Results for UF '{}'", uf.to_uppercase()),
        ),
        (None, Some(term), None) => (
            search::search_by_name(&args.output, term)?,
            format!("Results for name '{}'", term),
        ),
        (None, None, Some(code)) => (
            search::search_by_ibge(&args.output, code)?,
            format!("Results for IBGE code '{}'", code),
        ),
        _ => bail!("Provide exactly one of --uf, --name, or --ibge"),
    };

    print_results(&results, &title);
    Ok(())
}

fn print_results(results: &[ShardRecord], title: &str) {
    println!("--- {} ({} found) ---", title, results.len());
    if results.is_empty() {
        println!("No municipality matches the search criteria.");
    } else {
        for record in results {
            println!("{}", record);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Process(args) => run_process(args),
        Commands::Search(args) => run_search(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
