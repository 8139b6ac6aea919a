//! Herdbook - animal register kept in a spreadsheet worksheet
//!
//! The worksheet is the only persistence. The register loads it once, and
//! every add, update or delete rewrites the whole worksheet.
//!
//! # Features
//!
//! - Full-overwrite sync behind a `load`/`commit` boundary ([`store::RowStore`])
//! - Day-first date parsing, `dd/mm/yyyy` on disk
//! - Year partition and zero-filled year × species counts
//! - Named fallback rules for malformed dates ([`dates::EditDatePolicy`])
//! - `.xlsx` worksheet backend, CLI and JSON HTTP API
//!
//! # Example
//!
//! ```no_run
//! use herdbook::register::Register;
//! use herdbook::store::StoreConfig;
//! use herdbook::types::Record;
//!
//! let store = StoreConfig::new("herd.xlsx", "Sheet1").open()?;
//! let mut register = Register::open(store)?;
//!
//! register.add(Record::new("Fido", "Dog").with_acquired("01/06/2022"))?;
//! let counts = register.counts();
//! println!("Dogs in 2022: {:?}", counts.get(2022, "Dog"));
//! # Ok::<(), herdbook::error::HerdbookError>(())
//! ```

pub mod api;
pub mod cli;
pub mod dates;
pub mod error;
pub mod partition;
pub mod register;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{HerdbookError, HerdbookResult};
pub use register::Register;
pub use types::{CellValue, Frame, Record};
