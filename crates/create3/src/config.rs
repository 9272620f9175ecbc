//! Factory and transaction configuration.

use revm::primitives::hardfork::SpecId;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{factory, proxy},
    Create3Error,
};

/// Configuration of a factory and of the transactions sent to it.
///
/// `proxy_nonce` is the environment constant the final address derivation depends on. It is
/// pinned to the EIP-161 value and verified on every deployment: if the EVM disagrees, the
/// deployment fails with [`Create3Error::AddressMismatch`] and nothing is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Create3Config {
    /// The hardfork transactions execute under.
    pub spec: SpecId,
    /// Gas limit of each factory transaction.
    pub gas_limit: u64,
    /// The nonce the proxy creates the payload with.
    pub proxy_nonce: u64,
}

impl Default for Create3Config {
    fn default() -> Self {
        Self {
            spec: SpecId::PRAGUE,
            gas_limit: factory::DEFAULT_GAS_LIMIT,
            proxy_nonce: proxy::CREATE_NONCE,
        }
    }
}

impl Create3Config {
    /// Set the spec.
    pub const fn with_spec(mut self, spec: SpecId) -> Self {
        self.spec = spec;
        self
    }

    /// Set the gas limit.
    pub const fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set the proxy nonce.
    pub const fn with_proxy_nonce(mut self, proxy_nonce: u64) -> Self {
        self.proxy_nonce = proxy_nonce;
        self
    }

    /// Checks that the factory program can run under this configuration.
    pub fn validate(&self) -> Result<(), Create3Error> {
        if !self.spec.is_enabled_in(SpecId::SHANGHAI) {
            return Err(Create3Error::UnsupportedSpec(self.spec));
        }
        Ok(())
    }
}
