use clap::{Parser, Subcommand};

use crate::common::{CliError, LogArgs};

/// Deterministic CREATE3-style deployment tool
#[derive(Parser, Debug)]
#[command(name = "create3", version, infer_subcommands = true)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub cmd: MainCmd,

    /// Logging configuration
    #[command(flatten)]
    pub log_args: LogArgs,
}

/// Main command enumeration for the create3 CLI tool
#[derive(Subcommand, Debug)]
pub enum MainCmd {
    /// Predict the proxy and deployed addresses of a salt
    AddressOf(crate::address_of::Cmd),
    /// Simulate a deployment on a fresh in-memory chain
    Deploy(crate::deploy::Cmd),
    /// Print the factory bytecode
    FactoryCode(crate::factory_code::Cmd),
}

/// Error types for the main command system
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command error
    #[error("{0}")]
    Cli(#[from] CliError),
}

impl Cli {
    /// Initialize logging and execute the command
    pub fn run(&self) -> Result<(), Error> {
        self.log_args.init()?;
        match &self.cmd {
            MainCmd::AddressOf(cmd) => cmd.run()?,
            MainCmd::Deploy(cmd) => cmd.run()?,
            MainCmd::FactoryCode(cmd) => cmd.run()?,
        }
        Ok(())
    }
}
