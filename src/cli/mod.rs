//! CLI command handlers

pub mod commands;

pub use commands::{add, counts, delete, init, list, update, years, AddArgs, UpdateArgs};
