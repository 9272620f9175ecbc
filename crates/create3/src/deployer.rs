//! Host-side driver of the factory.

use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use revm::{
    context::{
        result::{ExecutionResult, Output, ResultAndState},
        TxEnv,
    },
    state::EvmState,
    DatabaseCommit,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    constants::proxy, decode_factory_output, factory_calldata, factory_init_code,
    factory_runtime_code, AddressDeriver, Create3Config, Create3Error, MemoryHost, Result,
};

/// The record of a successful deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// The salt.
    pub salt: B256,
    /// The proxy address, `address_of(salt)`.
    pub proxy: Address,
    /// The payload address.
    pub deployed: Address,
    /// Gas used by the factory transaction.
    pub gas_used: u64,
}

/// What the host holds for a salt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SlotState {
    /// No proxy exists for the salt.
    Unclaimed,
    /// The proxy exists and has deployed the payload.
    Deployed {
        /// The proxy address.
        proxy: Address,
        /// The payload address.
        deployed: Address,
    },
}

/// A handle to a factory living in a [`MemoryHost`].
///
/// The handle holds no state of its own besides the factory address and the configuration.
/// Every deployment is a single factory transaction: it is executed without committing, its
/// outcome is checked against [`AddressDeriver`], and only then is the state diff committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Create3Factory {
    address: Address,
    config: Create3Config,
}

impl Create3Factory {
    /// Attaches to a factory at `address` without touching any state.
    pub const fn at(address: Address, config: Create3Config) -> Self {
        Self { address, config }
    }

    /// Deploys the factory with a `CREATE` transaction sent by `deployer`.
    pub fn deploy_factory(
        host: &mut MemoryHost,
        deployer: Address,
        config: Create3Config,
    ) -> Result<Self> {
        config.validate()?;
        let expected = deployer.create(host.nonce(deployer));
        let address =
            host.create(config.spec, deployer, factory_init_code(), U256::ZERO, config.gas_limit)?;
        if address != expected {
            warn!(%expected, actual = %address, "Factory landed at an unexpected address");
            return Err(Create3Error::AddressMismatch { expected, actual: address });
        }
        debug!(%deployer, factory = %address, "Factory deployed");
        Ok(Self::at(address, config))
    }

    /// Places the factory runtime code at `address` directly, the way genesis allocations do.
    pub fn install(host: &mut MemoryHost, address: Address, config: Create3Config) -> Self {
        host.set_account_code(address, factory_runtime_code());
        host.set_account_nonce(address, 1);
        debug!(factory = %address, "Factory installed");
        Self::at(address, config)
    }

    /// The factory address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The configuration.
    pub const fn config(&self) -> &Create3Config {
        &self.config
    }

    /// The address derivation of this factory.
    pub const fn deriver(&self) -> AddressDeriver {
        AddressDeriver::new(self.address, self.config.proxy_nonce)
    }

    /// The proxy address of `salt`. Never inspects state.
    pub fn address_of(&self, salt: B256) -> Address {
        self.deriver().proxy_address(salt)
    }

    /// The address the payload deployed under `salt` occupies. Never inspects state.
    pub fn deployed_address_of(&self, salt: B256) -> Address {
        self.deriver().deployed_address(salt)
    }

    /// Reads whether `salt` has been used on this factory.
    pub fn slot_state(&self, host: &MemoryHost, salt: B256) -> SlotState {
        let proxy = self.address_of(salt);
        if host.has_code(proxy) {
            let deployed = self.deriver().deployed_address_from_proxy(proxy);
            SlotState::Deployed { proxy, deployed }
        } else {
            SlotState::Unclaimed
        }
    }

    /// Deploys `creation_code` under `salt`, sent by `caller`.
    pub fn deploy(
        &self,
        host: &mut MemoryHost,
        caller: Address,
        salt: B256,
        creation_code: &[u8],
    ) -> Result<Deployment> {
        self.deploy_with_value(host, caller, salt, creation_code, U256::ZERO)
    }

    /// Deploys `creation_code` under `salt`, sent by `caller`, endowing the payload with
    /// `value`.
    ///
    /// Either the whole deployment is committed, or the host is left exactly as it was.
    pub fn deploy_with_value(
        &self,
        host: &mut MemoryHost,
        caller: Address,
        salt: B256,
        creation_code: &[u8],
        value: U256,
    ) -> Result<Deployment> {
        self.config.validate()?;
        if !host.has_code(self.address) {
            return Err(Create3Error::FactoryNotDeployed(self.address));
        }

        let proxy = self.address_of(salt);
        let deployed = self.deriver().deployed_address_from_proxy(proxy);
        debug!(%salt, %proxy, %deployed, payload_len = creation_code.len(), "Deploying");

        let tx = TxEnv {
            caller,
            kind: TxKind::Call(self.address),
            data: factory_calldata(salt, creation_code),
            value,
            gas_limit: self.config.gas_limit,
            ..Default::default()
        };
        let ResultAndState { result, state } = host.transact(self.config.spec, tx)?;

        let outcome = match result {
            ExecutionResult::Success { output: Output::Call(output), gas_used, .. } => self
                .verify(&state, salt, &output)
                .map(|(proxy, deployed)| Deployment { salt, proxy, deployed, gas_used }),
            ExecutionResult::Success { output, .. } => {
                Err(Create3Error::UnexpectedOutput(output.into_data()))
            }
            ExecutionResult::Revert { output, .. } => {
                Err(Create3Error::from_revert(salt, proxy, output))
            }
            ExecutionResult::Halt { reason, gas_used } => {
                Err(Create3Error::Halted { reason: format!("{reason:?}"), gas_used })
            }
        };

        match outcome {
            Ok(deployment) => {
                host.commit(state);
                info!(
                    %salt,
                    proxy = %deployment.proxy,
                    deployed = %deployment.deployed,
                    gas_used = deployment.gas_used,
                    "Deployed"
                );
                Ok(deployment)
            }
            Err(err) => {
                if err.is_fatal() {
                    warn!(%salt, %err, "Deployment rejected");
                } else {
                    debug!(%salt, %err, "Deployment failed");
                }
                Err(err)
            }
        }
    }

    /// Checks a successful factory output against the derivation and the code the transaction
    /// persisted.
    fn verify(&self, state: &EvmState, salt: B256, output: &Bytes) -> Result<(Address, Address)> {
        let (proxy, deployed) = decode_factory_output(output)
            .ok_or_else(|| Create3Error::UnexpectedOutput(output.clone()))?;

        let expected_proxy = self.address_of(salt);
        if proxy != expected_proxy {
            return Err(Create3Error::AddressMismatch { expected: expected_proxy, actual: proxy });
        }
        let expected_deployed = self.deriver().deployed_address_from_proxy(proxy);
        if deployed != expected_deployed {
            return Err(Create3Error::AddressMismatch {
                expected: expected_deployed,
                actual: deployed,
            });
        }

        let code = persisted_code(state, proxy);
        if code[..] != proxy::RUNTIME_CODE[..] {
            return Err(Create3Error::ProxyCodeMismatch { proxy, code });
        }
        if persisted_code(state, deployed).is_empty() {
            return Err(Create3Error::DeployedCodeMissing { deployed });
        }

        Ok((proxy, deployed))
    }
}

/// The code `address` holds in the transaction's state diff, empty if it was not touched.
fn persisted_code(state: &EvmState, address: Address) -> Bytes {
    state
        .get(&address)
        .and_then(|account| account.info.code.as_ref())
        .map(|code| code.original_bytes())
        .unwrap_or_default()
}
