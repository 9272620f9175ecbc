//! Constants of the deployment protocol.
//!
//! Changing any of the proxy constants changes every address the factory will ever derive, so
//! they are versioned together.

use alloy_primitives::{b256, hex, B256};

/// Constants of the version 1 proxy.
pub mod proxy {
    use super::*;

    /// Creation code of the proxy.
    ///
    /// ```text
    /// 0x00  67 363d3d37363d34f0   PUSH8 <runtime stub>
    /// 0x09  3d                    RETURNDATASIZE      (0)
    /// 0x0a  52                    MSTORE              mem[24..32] = stub
    /// 0x0b  6008                  PUSH1 8             size
    /// 0x0d  6018                  PUSH1 24            offset
    /// 0x0f  f3                    RETURN
    /// ```
    pub const INIT_CODE: [u8; 16] = hex!("67363d3d37363d34f03d5260086018f3");

    /// `keccak256(INIT_CODE)`, the init-code hash used by every `CREATE2` derivation.
    pub const INIT_CODE_HASH: B256 =
        b256!("21c35dbe1b344a2488cf3321d6ce542f8e9f305544ff09e4993a62319a497c1f");

    /// Runtime code the proxy persists after its creation.
    ///
    /// ```text
    /// 36  CALLDATASIZE
    /// 3d  RETURNDATASIZE      (0)
    /// 3d  RETURNDATASIZE      (0)
    /// 37  CALLDATACOPY        mem[0..calldatasize] = calldata
    /// 36  CALLDATASIZE
    /// 3d  RETURNDATASIZE      (0)
    /// 34  CALLVALUE
    /// f0  CREATE              create(callvalue, 0, calldatasize)
    /// ```
    pub const RUNTIME_CODE: [u8; 8] = hex!("363d3d37363d34f0");

    /// Nonce a contract account holds right after its creation (EIP-161), and therefore the
    /// nonce the proxy uses for its one and only `CREATE`.
    pub const CREATE_NONCE: u64 = 1;
}

/// Constants of the factory program.
pub mod factory {
    /// Length of the salt prefix in the factory call data.
    pub const SALT_LENGTH: usize = 32;

    /// Length of the factory return data: the proxy word followed by the deployed word.
    pub const OUTPUT_LENGTH: usize = 64;

    /// Default gas limit of a factory transaction.
    pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;
}
