//! The factory program.
//!
//! The factory is an EVM program without storage. Its call data is the 32-byte salt followed by
//! the payload init code:
//!
//! 1. `CREATE2` the proxy init code with the salt. A zero result means the proxy address is
//!    already occupied: revert with `SaltCollision()`.
//! 2. `CALL` the proxy with the payload init code, forwarding `CALLVALUE`. The proxy `CREATE`s
//!    the payload.
//! 3. Derive the payload address as `keccak256(0xd6 ‖ 0x94 ‖ proxy ‖ nonce)[12..]`. Without code
//!    there, revert with `PayloadCreationFailed()`, which also unwinds the proxy creation.
//! 4. Return the proxy and payload addresses as two words.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::SolError;
use once_cell::sync::Lazy;
use revm::bytecode::opcode::{
    AND, CALL, CALLDATACOPY, CALLDATALOAD, CALLDATASIZE, CALLVALUE, CODECOPY, CREATE2, DUP1, DUP3,
    DUP7, EXTCODESIZE, GAS, ISZERO, JUMPI, KECCAK256, LT, MSTORE, MSTORE8, POP, PUSH0, RETURN, SUB,
};

use crate::{
    constants::{factory, proxy},
    BytecodeBuilder, ICreate3Factory,
};

const COLLISION: &str = "collision";
const PAYLOAD_FAILED: &str = "payload_failed";
const INVALID_INPUT: &str = "invalid_input";

/// RLP list header of `[address, nonce]` for a single-byte nonce: `0xc0 + 21 + 1`.
const RLP_LIST_HEADER: u8 = 0xd6;
/// RLP string header of a 20-byte address.
const RLP_ADDRESS_HEADER: u8 = 0x94;

// A nonce in 1..=0x7f is its own single-byte RLP encoding.
const _: () = assert!(proxy::CREATE_NONCE >= 1 && proxy::CREATE_NONCE < 0x80);

/// Length of the init code prefix that copies the runtime program out of the code.
const INIT_PREFIX_LENGTH: usize = 11;

static FACTORY_RUNTIME_CODE: Lazy<Bytes> = Lazy::new(assemble_runtime_code);

static FACTORY_INIT_CODE: Lazy<Bytes> = Lazy::new(|| assemble_init_code(&FACTORY_RUNTIME_CODE));

/// The runtime code of the factory.
pub fn factory_runtime_code() -> Bytes {
    FACTORY_RUNTIME_CODE.clone()
}

/// The creation code of the factory: a prefix returning the runtime code, then the runtime code.
pub fn factory_init_code() -> Bytes {
    FACTORY_INIT_CODE.clone()
}

/// Encodes the factory call data: `salt ‖ creation_code`.
pub fn factory_calldata(salt: B256, creation_code: &[u8]) -> Bytes {
    let mut data = Vec::with_capacity(factory::SALT_LENGTH + creation_code.len());
    data.extend_from_slice(salt.as_slice());
    data.extend_from_slice(creation_code);
    data.into()
}

/// Decodes the factory return data into `(proxy, deployed)`.
///
/// Returns `None` unless the output is exactly two words holding addresses.
pub fn decode_factory_output(output: &[u8]) -> Option<(Address, Address)> {
    if output.len() != factory::OUTPUT_LENGTH {
        return None;
    }
    let word_to_address = |word: &[u8]| {
        let word = B256::from_slice(word);
        word[..12].iter().all(|byte| *byte == 0).then(|| Address::from_word(word))
    };
    Some((word_to_address(&output[..32])?, word_to_address(&output[32..])?))
}

fn assemble_runtime_code() -> Bytes {
    BytecodeBuilder::default()
        // calldatasize < 32: no salt
        .push_number(factory::SALT_LENGTH as u8)
        .append(CALLDATASIZE)
        .append(LT)
        .push_label(INVALID_INPUT)
        .append(JUMPI)
        // mem[16..32] = proxy init code
        .push_bytes(proxy::INIT_CODE)
        .append(PUSH0)
        .append(MSTORE)
        // create2(0, 16, 16, salt)
        .append(PUSH0)
        .append(CALLDATALOAD)
        .push_number(proxy::INIT_CODE.len() as u8)
        .push_number((32 - proxy::INIT_CODE.len()) as u8)
        .append(PUSH0)
        .append(CREATE2)
        .append(DUP1)
        .append(ISZERO)
        .push_label(COLLISION)
        .append(JUMPI)
        // [proxy, len]; mem[0..len] = payload
        .push_number(factory::SALT_LENGTH as u8)
        .append(CALLDATASIZE)
        .append(SUB)
        .append(DUP1)
        .push_number(factory::SALT_LENGTH as u8)
        .append(PUSH0)
        .append(CALLDATACOPY)
        // call(gas, proxy, callvalue, 0, len, 0, 0)
        .append(PUSH0)
        .append(PUSH0)
        .append(DUP3)
        .append(PUSH0)
        .append(CALLVALUE)
        .append(DUP7)
        .append(GAS)
        .append(CALL)
        .append(ISZERO)
        .push_label(PAYLOAD_FAILED)
        .append(JUMPI)
        .append(POP)
        // [proxy]; mem[10..33] = rlp([proxy, nonce])
        .append(DUP1)
        .append(PUSH0)
        .append(MSTORE)
        .push_number(RLP_LIST_HEADER)
        .push_number(10u8)
        .append(MSTORE8)
        .push_number(RLP_ADDRESS_HEADER)
        .push_number(11u8)
        .append(MSTORE8)
        .push_number(proxy::CREATE_NONCE as u8)
        .push_number(32u8)
        .append(MSTORE8)
        .push_number(23u8)
        .push_number(10u8)
        .append(KECCAK256)
        .push_address(Address::repeat_byte(0xff))
        .append(AND)
        // [proxy, deployed]
        .append(DUP1)
        .append(EXTCODESIZE)
        .append(ISZERO)
        .push_label(PAYLOAD_FAILED)
        .append(JUMPI)
        .push_number(32u8)
        .append(MSTORE)
        .append(PUSH0)
        .append(MSTORE)
        .push_number(factory::OUTPUT_LENGTH as u8)
        .append(PUSH0)
        .append(RETURN)
        .jumpdest(COLLISION)
        .revert_with_selector(ICreate3Factory::SaltCollision::SELECTOR)
        .jumpdest(PAYLOAD_FAILED)
        .revert_with_selector(ICreate3Factory::PayloadCreationFailed::SELECTOR)
        .jumpdest(INVALID_INPUT)
        .revert()
        .build()
}

fn assemble_init_code(runtime: &[u8]) -> Bytes {
    debug_assert!(runtime.len() <= u16::MAX as usize);
    let prefix = BytecodeBuilder::default()
        .push_number(runtime.len() as u16)
        .append(DUP1)
        .push_number(INIT_PREFIX_LENGTH as u16)
        .append(PUSH0)
        .append(CODECOPY)
        .append(PUSH0)
        .append(RETURN)
        .build_vec();
    debug_assert_eq!(prefix.len(), INIT_PREFIX_LENGTH);
    [prefix.as_slice(), runtime].concat().into()
}
