//! Herdbook API Server binary
//!
//! JSON HTTP API over a register kept in an .xlsx worksheet.

use clap::Parser;
use herdbook::api::{run_api_server, ApiConfig};
use herdbook::dates::EditDatePolicy;
use herdbook::register::Register;
use herdbook::store::{DynStore, StoreConfig, DEFAULT_SHEET};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "herdbook-server")]
#[command(version)]
#[command(about = "Herdbook API Server - JSON HTTP API for the animal register")]
#[command(long_about = r#"
Herdbook API Server

Endpoints:
  - GET    /api/v1/records          - List records
  - POST   /api/v1/records          - Add a record
  - PUT    /api/v1/records/:index   - Update a record
  - DELETE /api/v1/records/:index   - Delete a record
  - GET    /api/v1/years            - Year partition
  - GET    /api/v1/counts           - Year x species counts
  - GET    /health, /version, /

Every change rewrites the whole worksheet. The workbook must exist
(create it with `herdbook init`); the server refuses to start otherwise.

Example usage:
  herdbook-server --file herd.xlsx --port 3000

  curl -X POST http://localhost:3000/api/v1/records \
    -H "Content-Type: application/json" \
    -d '{"name": "Fido", "species": "Dog", "acquired": "01/06/2022"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "HERDBOOK_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "HERDBOOK_PORT")]
    port: u16,

    /// Workbook holding the register
    #[arg(short, long, env = "HERDBOOK_FILE", default_value = "herdbook.xlsx")]
    file: PathBuf,

    /// Worksheet name inside the workbook
    #[arg(short, long, env = "HERDBOOK_SHEET", default_value = DEFAULT_SHEET)]
    sheet: String,

    /// Refuse malformed dates on update instead of substituting today
    #[arg(long)]
    strict_dates: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herdbook=info,herdbook_server=info,tower_http=info".into()),
        )
        .init();

    let policy = if args.strict_dates {
        EditDatePolicy::Reject
    } else {
        EditDatePolicy::FallbackToToday
    };

    // Opening the store is the one fatal step
    let store: DynStore = Box::new(StoreConfig::new(&args.file, &args.sheet).open()?);
    let register = Register::open(store)?.with_policy(policy);

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, register).await
}
