//! ticketdb CLI - load ticket orders and barcodes from CSV and query them

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, CommandFactory, Parser};
use ticketdb::config::{self, DATABASE_URL_ENV, Settings};
use ticketdb::ingest::{self, IngestMode, IngestReport};
use ticketdb::output::{OutputMode, emit_success};
use ticketdb::query::QueryEngine;
use ticketdb::storage::SqliteStore;
use ticketdb::ui::{self, Icons};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ticketdb")]
#[command(version)]
#[command(about = "Data management for ticket orders and barcodes")]
#[command(long_about = r#"
ticketdb keeps ticket orders and their barcodes in a SQLite database.

The two CSV files may be given in either order; the orders file is the one
whose header names a customer_id column.

Example usage:
  DATABASE_URL=sqlite:///./tickets.db ticketdb --load-data orders.csv barcodes.csv
  ticketdb --append-data barcodes.csv orders.csv
  ticketdb --top-customers 3
"#)]
#[command(group(ArgGroup::new("action").multiple(false)))]
struct Cli {
    /// Load data from CSV files. Overwrites all previous data
    #[arg(long, num_args = 2, value_names = ["FILE", "FILE"], group = "action")]
    load_data: Option<Vec<PathBuf>>,

    /// Append data from CSV files. Adds new rows and skips existing ones
    #[arg(long, num_args = 2, value_names = ["FILE", "FILE"], group = "action")]
    append_data: Option<Vec<PathBuf>>,

    /// List all barcodes grouped by customer and order
    #[arg(long, group = "action")]
    barcodes: bool,

    /// List the top N customers by number of tickets purchased (default 5)
    #[arg(long, value_name = "N", num_args = 0..=1, group = "action")]
    top_customers: Option<Option<usize>>,

    /// Count barcodes that are not assigned to an order
    #[arg(long, group = "action")]
    unused_barcodes: bool,

    /// Database connection string, e.g. sqlite:///./tickets.db
    #[arg(long, env = DATABASE_URL_ENV, hide_env_values = true)]
    database: Option<String>,

    /// Path to the config file (defaults to ticketdb.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

enum Command {
    Load(PathBuf, PathBuf),
    Append(PathBuf, PathBuf),
    Barcodes,
    TopCustomers(Option<usize>),
    UnusedBarcodes,
}

impl Cli {
    fn action(&self) -> Option<Command> {
        if let Some([a, b]) = self.load_data.as_deref() {
            return Some(Command::Load(a.clone(), b.clone()));
        }
        if let Some([a, b]) = self.append_data.as_deref() {
            return Some(Command::Append(a.clone(), b.clone()));
        }
        if self.barcodes {
            return Some(Command::Barcodes);
        }
        if let Some(n) = self.top_customers {
            return Some(Command::TopCustomers(n));
        }
        if self.unused_barcodes {
            return Some(Command::UnusedBarcodes);
        }
        None
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.action() else {
        Cli::command().print_help()?;
        return Ok(());
    };
    let output_mode = OutputMode::from_json_flag(cli.json);

    let file_config = config::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(cli.database.as_deref(), file_config.as_ref())?;
    tracing::debug!("Using storage {:?}", settings.storage);

    let mut store = settings.storage.open()?;
    let outcome = dispatch(&mut store, &settings, command, output_mode);

    // close on every path, but report the command's own failure first
    let closed = store.close();
    outcome?;
    closed?;
    Ok(())
}

fn dispatch(
    store: &mut SqliteStore,
    settings: &Settings,
    command: Command,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Command::Load(a, b) => run_ingest(store, [&a, &b], IngestMode::Load, output_mode),

        Command::Append(a, b) => run_ingest(store, [&a, &b], IngestMode::Append, output_mode),

        Command::Barcodes => {
            let listing = QueryEngine::new(store).barcode_listing()?;
            ensure_initialized(listing.initialized)?;
            if !output_mode.is_human() {
                emit_success("barcodes", &listing)?;
                return Ok(());
            }
            ui::header(Icons::TICKET, "Barcodes by customer and order");
            if listing.groups.is_empty() {
                ui::empty("No assigned barcodes.");
            }
            for group in &listing.groups {
                println!("{}", ui::group_line(group));
            }
            tracing::info!("Barcodes grouped and listed successfully.");
            Ok(())
        }

        Command::TopCustomers(limit) => {
            let limit = limit.unwrap_or(settings.top_customers);
            let top = QueryEngine::new(store).top_customers(limit)?;
            ensure_initialized(top.initialized)?;
            if !output_mode.is_human() {
                emit_success("top-customers", &top)?;
                return Ok(());
            }
            ui::header(Icons::TROPHY, &format!("Top {} customers by tickets", limit));
            if top.customers.is_empty() {
                ui::empty("No tickets sold yet.");
            } else if console::Term::stdout().is_term() {
                println!("{}", ui::customers_table(&top.customers));
            } else {
                for (i, customer) in top.customers.iter().enumerate() {
                    println!("{}", ui::customer_line(i + 1, customer));
                }
            }
            Ok(())
        }

        Command::UnusedBarcodes => {
            let unused = QueryEngine::new(store).unused_barcodes()?;
            ensure_initialized(unused.initialized)?;
            if output_mode.is_human() {
                println!("{}", unused);
            } else {
                emit_success("unused-barcodes", &unused)?;
            }
            Ok(())
        }
    }
}

/// A read against a store without tables printed nothing; fail the command so
/// the user is told to load data first.
fn ensure_initialized(initialized: bool) -> ticketdb::Result<()> {
    if initialized {
        Ok(())
    } else {
        Err(ticketdb::Error::Uninitialized)
    }
}

fn run_ingest(
    store: &mut SqliteStore,
    paths: [&Path; 2],
    mode: IngestMode,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let report = match mode {
        IngestMode::Load => ingest::load(store, paths)?,
        IngestMode::Append => ingest::append(store, paths)?,
    };

    if output_mode.is_human() {
        print_report(&report);
        let stats = store.stats()?;
        ui::info("Orders stored", &stats.orders.to_string());
        ui::info("Barcodes stored", &stats.barcodes.to_string());
        ui::success(match report.mode {
            IngestMode::Load => "Data loaded successfully.",
            IngestMode::Append => "Data appended successfully.",
        });
    } else {
        emit_success(report.mode.as_str(), &report)?;
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    ui::header(Icons::FILE, &format!("Orders file: {}", report.orders_file.display()));
    ui::header(Icons::FILE, &format!("Barcodes file: {}", report.barcodes_file.display()));
    for issue in &report.issues {
        ui::warn(&issue.to_string());
    }
    println!("{}", ui::metrics_table(&report.metrics()));
}

const LOAD_FIRST_HINT: &str =
    "No data found in the database. Please load data first using --load-data.";

fn is_uninitialized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ticketdb::Error>()
        .is_some_and(ticketdb::Error::is_uninitialized)
}

/// The user-facing line for a failed command
fn failure_message(err: &anyhow::Error) -> String {
    if is_uninitialized(err) {
        LOAD_FIRST_HINT.to_string()
    } else {
        format!("{:#}", err)
    }
}

fn report_failure(err: &anyhow::Error) {
    ui::error(&failure_message(err));
    if is_uninitialized(err) {
        tracing::error!("Attempted to access database tables before data was loaded.");
    } else {
        tracing::debug!("{:?}", err);
    }
}
