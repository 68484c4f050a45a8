use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

use sales_ledger::{
    actions::{self, Batch},
    notify::LogNotifier,
    Channel, CodeRange, Config, SummaryQuery, YearMonth,
};

#[derive(Parser)]
#[command(version, about = "Monthly sales ledgers and product sales summaries")]
struct Cli {
    /// Directory holding the ledger and catalog databases and their CSV snapshots.
    #[arg(long, global = true, env = "SALES_LEDGER_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Directory reports are written to.
    #[arg(long, global = true, env = "SALES_LEDGER_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add WEB exports (named like `2024年5月.csv`) to the WEB ledger.
    IngestWeb {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Add store exports (named like `export202405.csv`) to the store ledger.
    IngestStore {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import a product-master extract into the catalog.
    ImportMaster { file: PathBuf },
    /// Apply a tax-inclusive price feed to the catalog.
    ImportPrices { file: PathBuf },
    /// Build the per-product monthly sales summary.
    Summary {
        #[command(flatten)]
        range: Range,
        #[arg(long, value_parser = clap::value_parser!(Channel), default_value = "all")]
        channel: Channel,
        /// Print the summary instead of writing a workbook.
        #[arg(long)]
        print: bool,
    },
    /// Export WEB ledger lines to a workbook.
    Export {
        #[command(flatten)]
        range: Range,
    },
}

#[derive(clap::Args)]
struct Range {
    /// First month, e.g. 2024-01.
    #[arg(long)]
    from: YearMonth,
    /// Last month, inclusive.
    #[arg(long)]
    to: YearMonth,
    /// First product code; ignored unless --end-code is also given.
    #[arg(long, default_value = "")]
    start_code: String,
    /// Last product code, inclusive.
    #[arg(long, default_value = "")]
    end_code: String,
}

impl Range {
    fn query(&self) -> sales_ledger::Result<SummaryQuery> {
        Ok(SummaryQuery::new(self.from, self.to)?
            .with_codes(CodeRange::new(&self.start_code, &self.end_code)))
    }
}

fn check(batch: Batch) -> Result<()> {
    if batch.failed > 0 {
        bail!("{} of {} files failed", batch.failed, batch.failed + batch.processed);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sales_ledger=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::new(cli.data_dir, cli.output_dir);
    let mut notifier = LogNotifier;
    match cli.command {
        Command::IngestWeb { files } => {
            check(actions::ingest_web_files(&config, &files, &mut notifier))?;
        }
        Command::IngestStore { files } => {
            check(actions::ingest_store_files(&config, &files, &mut notifier))?;
        }
        Command::ImportMaster { file } => {
            actions::notify(
                &mut notifier,
                "Product master import",
                actions::import_master(&config, &file),
            )?;
        }
        Command::ImportPrices { file } => {
            actions::notify(
                &mut notifier,
                "Price feed import",
                actions::import_prices(&config, &file),
            )?;
        }
        Command::Summary {
            range,
            channel,
            print,
        } => {
            let query = range.query()?.with_channel(channel);
            if print {
                print!("{}", actions::sales_summary(&config, &query)?);
            } else {
                actions::notify(
                    &mut notifier,
                    "Sales summary",
                    actions::write_sales_summary(&config, &query),
                )?;
            }
        }
        Command::Export { range } => {
            let query = range.query()?;
            actions::notify(&mut notifier, "Order export", actions::export_orders(&config, &query))?;
        }
    }
    Ok(())
}
