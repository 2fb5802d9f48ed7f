use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use evstats::iea::{write_iea_report, IeaDataset, IeaReportOptions};
use evstats::report::{write_highlights, write_store_report, ReportOptions};
use evstats::{generate_and_store, GeneratorConfig, Store};

#[derive(Parser, Debug)]
#[command(name = "evstats", about = "Synthetic EV adoption statistics and reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the series, write CSV tables and build the store
    Generate {
        /// JSON generator config; built-in tables when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overrides the config's jitter seed
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(long, default_value = "ev_data")]
        store: PathBuf,
    },
    /// Print the views of a generated store
    Report {
        #[arg(long, default_value = "ev_data")]
        store: PathBuf,

        /// Year to rank countries by; defaults to the store's last year
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Report on an IEA-format CSV export
    IeaReport {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value_t = 2024)]
        year: i32,

        #[arg(long, default_value_t = 2020)]
        since: i32,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Generate {
            config,
            seed,
            data_dir,
            store,
        } => {
            let mut config = match config {
                Some(path) => GeneratorConfig::from_json_file(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => GeneratorConfig::default(),
            };
            if let Some(seed) = seed {
                config.seed = seed;
            }

            let (_, store) = generate_and_store(&config, &data_dir, &store)
                .context("generating EV dataset")?;
            write_highlights(&store, &ReportOptions::default(), &mut out)?;
        }
        Command::Report { store, year, top } => {
            let store = Store::open(&store)
                .with_context(|| format!("opening store {}", store.display()))?;
            write_store_report(&store, &ReportOptions { year, top }, &mut out)?;
        }
        Command::IeaReport { input, year, since } => {
            let dataset = IeaDataset::from_csv(&input)
                .with_context(|| format!("loading {}", input.display()))?;
            write_iea_report(&dataset, &IeaReportOptions { year, since }, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
