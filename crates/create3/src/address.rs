//! Address derivation for the two deployment stages.
//!
//! Both formulas are reproduced byte for byte so that off-chain tooling and the factory program
//! agree on every address:
//!
//! - proxy: `keccak256(0xff ‖ factory ‖ salt ‖ keccak256(proxy init code))[12..]` (EIP-1014)
//! - deployed: `keccak256(rlp([proxy, nonce]))[12..]`

use alloy_primitives::{keccak256, Address, B256};

use crate::constants::proxy;

/// Length of the `CREATE2` hash preimage: `0xff ‖ deployer ‖ salt ‖ init_code_hash`.
pub const CREATE2_PREIMAGE_LENGTH: usize = 1 + 20 + 32 + 32;

/// Prefix byte of the `CREATE2` hash preimage.
pub const CREATE2_PREFIX: u8 = 0xff;

/// Builds the `CREATE2` hash preimage.
pub fn create2_preimage(
    deployer: Address,
    salt: B256,
    init_code_hash: B256,
) -> [u8; CREATE2_PREIMAGE_LENGTH] {
    let mut preimage = [0u8; CREATE2_PREIMAGE_LENGTH];
    preimage[0] = CREATE2_PREFIX;
    preimage[1..21].copy_from_slice(deployer.as_slice());
    preimage[21..53].copy_from_slice(salt.as_slice());
    preimage[53..].copy_from_slice(init_code_hash.as_slice());
    preimage
}

/// Computes the address a `CREATE2` by `deployer` lands at.
pub fn create2_address(deployer: Address, salt: B256, init_code_hash: B256) -> Address {
    let hash = keccak256(create2_preimage(deployer, salt, init_code_hash));
    Address::from_word(hash)
}

/// Derives the addresses of the proxy and the deployed contract for a given factory.
///
/// The deriver never looks at chain state; it answers the same before, during and after a
/// deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressDeriver {
    factory: Address,
    proxy_nonce: u64,
}

impl AddressDeriver {
    /// Creates a deriver for `factory`, assuming the proxy creates the payload at
    /// `proxy_nonce`.
    pub const fn new(factory: Address, proxy_nonce: u64) -> Self {
        Self { factory, proxy_nonce }
    }

    /// Creates a deriver using the EIP-161 proxy nonce.
    pub const fn with_factory(factory: Address) -> Self {
        Self::new(factory, proxy::CREATE_NONCE)
    }

    /// The factory address.
    pub const fn factory(&self) -> Address {
        self.factory
    }

    /// The nonce the proxy is assumed to create the payload with.
    pub const fn proxy_nonce(&self) -> u64 {
        self.proxy_nonce
    }

    /// The `CREATE2` preimage of the proxy for `salt`.
    pub fn proxy_preimage(&self, salt: B256) -> [u8; CREATE2_PREIMAGE_LENGTH] {
        create2_preimage(self.factory, salt, proxy::INIT_CODE_HASH)
    }

    /// The address of the proxy for `salt`.
    pub fn proxy_address(&self, salt: B256) -> Address {
        create2_address(self.factory, salt, proxy::INIT_CODE_HASH)
    }

    /// The address of the contract the proxy at `proxy` creates.
    pub fn deployed_address_from_proxy(&self, proxy: Address) -> Address {
        proxy.create(self.proxy_nonce)
    }

    /// The address of the contract deployed under `salt`.
    pub fn deployed_address(&self, salt: B256) -> Address {
        self.deployed_address_from_proxy(self.proxy_address(salt))
    }
}
