//! Error types of the deployment protocol.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolError};
use revm::primitives::hardfork::SpecId;

sol! {
    /// Errors the factory program reverts with.
    #[derive(Debug, PartialEq, Eq)]
    interface ICreate3Factory {
        /// The proxy slot of the salt is already occupied.
        error SaltCollision();
        /// The payload init code reverted, halted or returned empty code.
        error PayloadCreationFailed();
    }
}

/// Result type of the deployment protocol.
pub type Result<T, E = Create3Error> = core::result::Result<T, E>;

/// Errors raised while deploying through the factory.
///
/// Every error leaves the host untouched: the transaction's state diff is discarded before the
/// error is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Create3Error {
    /// The salt was already used on this factory. Pick a fresh salt.
    #[error("salt {salt} already claimed, proxy {proxy} exists")]
    SaltCollision {
        /// The salt.
        salt: B256,
        /// The occupied proxy address.
        proxy: Address,
    },
    /// The payload init code failed. The salt remains available.
    #[error("payload creation failed for salt {salt}")]
    PayloadCreationFailed {
        /// The salt.
        salt: B256,
    },
    /// A creation landed somewhere other than the derived address. This is a fault in the
    /// derivation constants, not a runtime condition, and must not be retried.
    #[error("address mismatch: expected {expected}, got {actual}")]
    AddressMismatch {
        /// The derived address.
        expected: Address,
        /// The address the EVM reported.
        actual: Address,
    },
    /// The proxy persisted something other than the runtime stub.
    #[error("proxy {proxy} persisted unexpected code {code}")]
    ProxyCodeMismatch {
        /// The proxy address.
        proxy: Address,
        /// The persisted code.
        code: Bytes,
    },
    /// The factory reported the derived payload address, but the transaction left no code
    /// there.
    #[error("no code deployed at {deployed}")]
    DeployedCodeMissing {
        /// The payload address.
        deployed: Address,
    },
    /// There is no code at the factory address.
    #[error("no factory deployed at {0}")]
    FactoryNotDeployed(Address),
    /// The factory program needs `PUSH0`, which is only available from Shanghai on.
    #[error("unsupported spec {0:?}, the factory requires SHANGHAI or later")]
    UnsupportedSpec(SpecId),
    /// The transaction reverted with data the factory never produces.
    #[error("transaction reverted with {output}")]
    Reverted {
        /// The revert data.
        output: Bytes,
    },
    /// The transaction halted.
    #[error("transaction halted: {reason}, gas used {gas_used}")]
    Halted {
        /// Debug rendering of the halt reason.
        reason: String,
        /// The gas used.
        gas_used: u64,
    },
    /// The transaction succeeded with output of an unexpected shape.
    #[error("unexpected output {0}")]
    UnexpectedOutput(Bytes),
    /// The EVM rejected the transaction.
    #[error("evm error: {0}")]
    Evm(String),
}

impl Create3Error {
    /// Returns `true` for protocol faults: the derivation and the EVM disagree, and no caller
    /// action can fix it.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AddressMismatch { .. }
                | Self::ProxyCodeMismatch { .. }
                | Self::DeployedCodeMissing { .. }
        )
    }

    /// Maps factory revert data to an error.
    pub fn from_revert(salt: B256, proxy: Address, output: Bytes) -> Self {
        match decode_factory_error(&output) {
            Some(ICreate3Factory::ICreate3FactoryErrors::SaltCollision(_)) => {
                Self::SaltCollision { salt, proxy }
            }
            Some(ICreate3Factory::ICreate3FactoryErrors::PayloadCreationFailed(_)) => {
                Self::PayloadCreationFailed { salt }
            }
            None => Self::Reverted { output },
        }
    }
}

/// Decodes factory revert data. The factory reverts with bare selectors.
pub fn decode_factory_error(output: &[u8]) -> Option<ICreate3Factory::ICreate3FactoryErrors> {
    use ICreate3Factory::{ICreate3FactoryErrors, PayloadCreationFailed, SaltCollision};

    let selector: [u8; 4] = output.try_into().ok()?;
    if selector == SaltCollision::SELECTOR {
        Some(ICreate3FactoryErrors::SaltCollision(SaltCollision {}))
    } else if selector == PayloadCreationFailed::SELECTOR {
        Some(ICreate3FactoryErrors::PayloadCreationFailed(PayloadCreationFailed {}))
    } else {
        None
    }
}
