use std::path::PathBuf;

use alloy_primitives::{Address, Bytes, B256, U256};
use clap::Parser;
use create3::{Create3Config, Create3Factory, MemoryHost};
use serde::Serialize;
use tracing::{debug, info};

use crate::common::{load_hex, CliError, Result};

/// Simulate a deployment on a fresh in-memory chain
#[derive(Parser, Debug)]
pub struct Cmd {
    /// Payload creation code as hex string (positional argument)
    #[arg(value_name = "CODE")]
    pub code: Option<String>,

    /// File containing the payload creation code. If '-' is specified, code is read from stdin
    #[arg(long = "codefile")]
    pub codefile: Option<PathBuf>,

    /// The 32-byte salt
    #[arg(long = "salt", default_value_t = B256::ZERO)]
    pub salt: B256,

    /// The account that deploys the factory
    #[arg(long = "deployer", default_value = "0x0000000000000000000000000000000000100000")]
    pub deployer: Address,

    /// The account that calls the factory
    #[arg(long = "caller", visible_aliases = ["from"], default_value = "0x0000000000000000000000000000000000100001")]
    pub caller: Address,

    /// Value endowed to the payload
    #[arg(long = "value", default_value = "0")]
    pub value: U256,

    /// JSON configuration file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

/// Outcome of a simulated deployment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    factory: Address,
    salt: B256,
    proxy: Address,
    deployed: Address,
    proxy_code: Bytes,
    deployed_code: Bytes,
    gas_used: u64,
}

impl Cmd {
    fn load_config(&self) -> Result<Create3Config> {
        let Some(path) = &self.config else {
            return Ok(Create3Config::default());
        };
        debug!(config = ?path, "Loading config");
        let config: Create3Config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Deploy the factory and the payload, returning the report
    pub fn simulate(&self) -> Result<DeployReport> {
        let code = load_hex(self.code.as_deref(), self.codefile.as_deref())?.ok_or_else(|| {
            CliError::InvalidInput("no payload code, pass CODE or --codefile".to_string())
        })?;
        let config = self.load_config()?;

        let mut host = MemoryHost::default().account_balance(self.caller, self.value);
        let factory = Create3Factory::deploy_factory(&mut host, self.deployer, config)?;
        info!(factory = %factory.address(), "Factory deployed");

        let deployment =
            factory.deploy_with_value(&mut host, self.caller, self.salt, &code, self.value)?;
        Ok(DeployReport {
            factory: factory.address(),
            salt: deployment.salt,
            proxy: deployment.proxy,
            deployed: deployment.deployed,
            proxy_code: host.code(deployment.proxy),
            deployed_code: host.code(deployment.deployed),
            gas_used: deployment.gas_used,
        })
    }

    /// Execute the deploy command
    pub fn run(&self) -> Result<()> {
        let report = self.simulate()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
