use alloy_primitives::{address, Address, U256};

use crate::{Create3Config, Create3Factory, MemoryHost, Result};

/// The account that deploys the factory in tests.
pub const TEST_DEPLOYER: Address = address!("0000000000000000000000000000000000100000");

/// The account that calls the factory in tests.
pub const TEST_CALLER: Address = address!("0000000000000000000000000000000000100001");

/// The balance given to the test accounts.
pub const TEST_BALANCE: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Creates a host with funded test accounts and a factory deployed by [`TEST_DEPLOYER`].
pub fn setup_factory(config: Create3Config) -> Result<(MemoryHost, Create3Factory)> {
    let mut host = MemoryHost::default()
        .account_balance(TEST_DEPLOYER, TEST_BALANCE)
        .account_balance(TEST_CALLER, TEST_BALANCE);
    let factory = Create3Factory::deploy_factory(&mut host, TEST_DEPLOYER, config)?;
    Ok((host, factory))
}
