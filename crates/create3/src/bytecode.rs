//! A small assembler for EVM bytecode.

use alloy_primitives::{Address, Bytes};
use revm::bytecode::opcode::{JUMPDEST, MSTORE, PUSH0, PUSH2, RETURN, REVERT};

/// A builder for assembling EVM bytecode.
///
/// Jump targets are named: [`push_label`](Self::push_label) emits a `PUSH2` whose operand is
/// patched during [`build`](Self::build) with the offset of the matching
/// [`jumpdest`](Self::jumpdest).
#[derive(Debug, Default, Clone)]
pub struct BytecodeBuilder {
    code: Vec<u8>,
    labels: Vec<(&'static str, usize)>,
    fixups: Vec<(usize, &'static str)>,
}

impl BytecodeBuilder {
    /// Build the bytecode.
    ///
    /// # Panics
    ///
    /// Panics if a pushed label was never defined, or a label sits beyond the `PUSH2` range.
    pub fn build(self) -> Bytes {
        self.build_vec().into()
    }

    /// Build the bytecode as a vector.
    ///
    /// # Panics
    ///
    /// See [`build`](Self::build).
    pub fn build_vec(mut self) -> Vec<u8> {
        for (position, name) in &self.fixups {
            let offset = self
                .labels
                .iter()
                .find_map(|(label, offset)| (label == name).then_some(*offset))
                .unwrap_or_else(|| panic!("undefined label `{name}`"));
            let offset = u16::try_from(offset)
                .unwrap_or_else(|_| panic!("label `{name}` out of range"));
            self.code[position + 1..position + 3].copy_from_slice(&offset.to_be_bytes());
        }
        self.code
    }

    /// Append a single opcode or byte.
    pub fn append(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    /// Append a series of opcodes or bytes.
    pub fn append_many(mut self, items: impl IntoIterator<Item = u8>) -> Self {
        self.code.extend(items);
        self
    }

    /// Append a PUSH opcode and the bytes to push.
    pub fn push_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes: &[u8] = bytes.as_ref();
        assert!(bytes.len() <= 32);
        self.code.push(PUSH0 + bytes.len() as u8);
        self.code.extend_from_slice(bytes);
        self
    }

    /// Append a PUSH opcode and the number to push, using the width of `T`.
    pub fn push_number<T: Into<u128> + Copy>(self, number: T) -> Self {
        let num = number.into();
        let bytes = match core::mem::size_of::<T>() {
            1 => (num as u8).to_be_bytes().to_vec(),
            2 => (num as u16).to_be_bytes().to_vec(),
            4 => (num as u32).to_be_bytes().to_vec(),
            8 => (num as u64).to_be_bytes().to_vec(),
            16 => num.to_be_bytes().to_vec(),
            _ => panic!("Unsupported integer size"),
        };
        self.push_bytes(bytes)
    }

    /// Append a PUSH opcode and the address to push.
    pub fn push_address(self, address: Address) -> Self {
        self.push_bytes(address)
    }

    /// Append a `PUSH2` of the offset of `label`, resolved at build time.
    pub fn push_label(mut self, label: &'static str) -> Self {
        self.fixups.push((self.code.len(), label));
        self.code.extend([PUSH2, 0, 0]);
        self
    }

    /// Define `label` at the current offset and append a `JUMPDEST`.
    ///
    /// # Panics
    ///
    /// Panics if `label` is already defined.
    pub fn jumpdest(mut self, label: &'static str) -> Self {
        assert!(
            self.labels.iter().all(|(defined, _)| *defined != label),
            "label `{label}` defined twice"
        );
        self.labels.push((label, self.code.len()));
        self.code.push(JUMPDEST);
        self
    }

    /// Append a series of MSTORE opcodes to store the given bytes at the given offset.
    pub fn mstore(self, offset: usize, bytes: impl AsRef<[u8]>) -> Self {
        let padded_bytes = right_pad_bytes(bytes, 32);
        let mut this = self;
        for (i, chunk) in padded_bytes.chunks(32).enumerate() {
            this = this.push_bytes(chunk);
            this = this.push_number((offset + i * 32) as u64);
            this.code.push(MSTORE);
        }
        this
    }

    /// Append a REVERT opcode with empty return data.
    pub fn revert(self) -> Self {
        self.append_many([PUSH0, PUSH0, REVERT])
    }

    /// Append a REVERT opcode whose return data is a 4-byte error selector.
    ///
    /// Stores the selector right-aligned in the first memory word, which is cheaper than a
    /// padded `MSTORE` of the whole word.
    pub fn revert_with_selector(self, selector: [u8; 4]) -> Self {
        self.push_bytes(selector)
            .append(PUSH0)
            .append(MSTORE)
            .push_number(4u8)
            .push_number(28u8)
            .append(REVERT)
    }

    /// Append a RETURN opcode with empty return data.
    pub fn return_empty(self) -> Self {
        self.append_many([PUSH0, PUSH0, RETURN])
    }

    /// Append a RETURN opcode with the given return data.
    pub fn return_with_data(self, data: impl AsRef<[u8]>) -> Self {
        let data_len = data.as_ref().len();
        self.mstore(0x0, data).push_number(data_len as u64).append(PUSH0).append(RETURN)
    }
}

/// Pads the bytes to the right with 0s to make it a multiple of the length.
pub fn right_pad_bytes(bytes: impl AsRef<[u8]>, multiple_of: usize) -> Vec<u8> {
    let bytes = bytes.as_ref();
    let padding = (multiple_of - (bytes.len() % multiple_of)) % multiple_of;
    [bytes, vec![0u8; padding].as_slice()].concat()
}
