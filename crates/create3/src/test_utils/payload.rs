use alloy_primitives::Bytes;
use revm::bytecode::opcode::{CALLVALUE, PUSH0, SSTORE};

use crate::BytecodeBuilder;

/// Init code whose constructor returns `runtime` as the contract code.
pub fn init_code_returning(runtime: impl AsRef<[u8]>) -> Bytes {
    BytecodeBuilder::default().return_with_data(runtime).build()
}

/// Init code that stores `CALLVALUE` in slot 0, then returns `runtime`.
pub fn init_code_storing_value(runtime: impl AsRef<[u8]>) -> Bytes {
    BytecodeBuilder::default()
        .append(CALLVALUE)
        .append(PUSH0)
        .append(SSTORE)
        .return_with_data(runtime)
        .build()
}

/// Init code that always reverts.
pub fn reverting_init_code() -> Bytes {
    BytecodeBuilder::default().revert().build()
}

/// Init code that succeeds but leaves no code behind.
pub fn empty_code_init_code() -> Bytes {
    BytecodeBuilder::default().return_empty().build()
}
