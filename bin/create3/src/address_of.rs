use alloy_primitives::{Address, B256};
use clap::Parser;
use create3::{constants::proxy, AddressDeriver};
use serde::Serialize;
use tracing::debug;

use crate::common::Result;

/// Predict the proxy and deployed addresses of a salt
#[derive(Parser, Debug)]
pub struct Cmd {
    /// The factory address
    #[arg(long = "factory")]
    pub factory: Address,

    /// The 32-byte salt
    #[arg(long = "salt", default_value_t = B256::ZERO)]
    pub salt: B256,

    /// The nonce the proxy creates the payload with
    #[arg(long = "proxy-nonce", default_value_t = proxy::CREATE_NONCE)]
    pub proxy_nonce: u64,
}

/// Predicted addresses of a salt
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReport {
    factory: Address,
    salt: B256,
    proxy: Address,
    deployed: Address,
}

impl Cmd {
    /// Compute the report
    pub fn report(&self) -> AddressReport {
        let deriver = AddressDeriver::new(self.factory, self.proxy_nonce);
        let proxy = deriver.proxy_address(self.salt);
        AddressReport {
            factory: self.factory,
            salt: self.salt,
            proxy,
            deployed: deriver.deployed_address_from_proxy(proxy),
        }
    }

    /// Execute the address-of command
    pub fn run(&self) -> Result<()> {
        let report = self.report();
        debug!(factory = %report.factory, salt = %report.salt, "Addresses derived");
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
