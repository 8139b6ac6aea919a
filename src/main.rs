use clap::{Parser, Subcommand};
use colored::Colorize;
use herdbook::cli::{self, AddArgs, UpdateArgs};
use herdbook::dates::EditDatePolicy;
use herdbook::error::HerdbookResult;
use herdbook::store::{StoreConfig, DEFAULT_SHEET};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "herdbook")]
#[command(about = "Animal register kept in a spreadsheet worksheet.")]
#[command(long_about = "Herdbook - animal register kept in a spreadsheet worksheet

Every change rewrites the whole worksheet. Dates are stored as dd/mm/yyyy.

COMMANDS:
  init     - Create a workbook with an empty register
  list     - Show every record with its index
  add      - Add a record
  update   - Change fields of a record
  delete   - Remove a record
  years    - Records grouped by year and species
  counts   - Year x species count table

EXAMPLES:
  herdbook -f herd.xlsx init
  herdbook -f herd.xlsx add --name Fido --species Dog --acquired 01/06/2022
  herdbook -f herd.xlsx update 0 --disposed 02/01/2025
  herdbook -f herd.xlsx counts")]
#[command(version)]
struct Cli {
    /// Workbook holding the register
    #[arg(short, long, env = "HERDBOOK_FILE", global = true, default_value = "herdbook.xlsx")]
    file: PathBuf,

    /// Worksheet name inside the workbook
    #[arg(short, long, env = "HERDBOOK_SHEET", global = true, default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Refuse malformed dates on update instead of substituting today
    #[arg(long, global = true)]
    strict_dates: bool,

    /// Log store activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a workbook with an empty register
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show every record with its index
    List,

    /// Add a record
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        species: String,

        /// Acquisition or birth date, dd/mm/yyyy (default: today)
        #[arg(long)]
        acquired: Option<String>,

        #[arg(long, default_value = "")]
        feed: String,

        #[arg(long, default_value = "")]
        notes: String,
    },

    #[command(long_about = "Change fields of a record.

Fields that are not given keep their value. Dates are dd/mm/yyyy. A blank or
malformed acquisition date becomes today's date unless --strict-dates is set.
Pass --disposed \"\" to mark the animal as present again.")]
    /// Change fields of a record
    Update {
        /// Index shown by `list`
        index: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        species: Option<String>,

        #[arg(long)]
        acquired: Option<String>,

        /// Date the animal died or was sold
        #[arg(long)]
        disposed: Option<String>,

        #[arg(long)]
        feed: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a record
    Delete {
        /// Index shown by `list`
        index: usize,
    },

    /// Records grouped by year and species
    Years,

    /// Year x species count table
    Counts,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "herdbook=info" } else { "herdbook=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "❌ Error:".bold().red(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> HerdbookResult<()> {
    let config = StoreConfig::new(cli.file, cli.sheet);
    let policy = if cli.strict_dates {
        EditDatePolicy::Reject
    } else {
        EditDatePolicy::FallbackToToday
    };

    match cli.command {
        Commands::Init { force } => cli::init(&config, force),

        Commands::List => cli::list(&config),

        Commands::Add {
            name,
            species,
            acquired,
            feed,
            notes,
        } => cli::add(
            &config,
            AddArgs {
                name,
                species,
                acquired,
                feed,
                notes,
            },
        ),

        Commands::Update {
            index,
            name,
            species,
            acquired,
            disposed,
            feed,
            notes,
        } => cli::update(
            &config,
            policy,
            index,
            UpdateArgs {
                name,
                species,
                acquired,
                disposed,
                feed,
                notes,
            },
        ),

        Commands::Delete { index } => cli::delete(&config, index),

        Commands::Years => cli::years(&config),

        Commands::Counts => cli::counts(&config),
    }
}
