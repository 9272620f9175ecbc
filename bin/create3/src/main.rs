//! `create3` CLI tool for deterministic contract deployment.
//!
//! Predicts CREATE3-style addresses and simulates deployments through the factory on a fresh
//! in-memory chain.

use clap::Parser;

mod cmd;
pub use cmd::*;

mod address_of;
mod common;
mod deploy;
mod factory_code;

fn main() -> Result<(), Error> {
    Cli::parse().run().inspect_err(|e| eprintln!("{e}"))
}
