//! An in-memory EVM host.

use core::convert::Infallible;

use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use delegate::delegate;
use revm::{
    context::{
        result::{ExecutionResult, Output, ResultAndState},
        CfgEnv, TxEnv,
    },
    database::{AccountState, CacheDB, DbAccount, EmptyDB},
    primitives::{hardfork::SpecId, StorageKey, StorageValue, KECCAK_EMPTY},
    state::{AccountInfo, Bytecode},
    Context, DatabaseCommit, DatabaseRef, ExecuteEvm, MainBuilder, MainContext,
};
use tracing::trace;

use crate::{Create3Error, Result};

/// An in-memory chain state that executes transactions with revm.
///
/// [`transact`](Self::transact) never writes: it returns the state diff, and the caller decides
/// whether to [`commit`](DatabaseCommit::commit) it. A failed deployment is therefore discarded
/// by simply dropping its diff.
#[derive(Debug, Default, Clone, derive_more::Deref, derive_more::DerefMut)]
pub struct MemoryHost {
    #[deref]
    #[deref_mut]
    db: CacheDB<EmptyDB>,
}

impl MemoryHost {
    fn account_mut(&mut self, address: Address) -> &mut DbAccount {
        let Ok(account) = self.db.load_account(address);
        account.account_state = AccountState::None;
        account
    }

    /// Sets the code of an account.
    pub fn set_account_code(&mut self, address: Address, code: Bytes) {
        let bytecode = Bytecode::new_legacy(code);
        let code_hash = bytecode.hash_slow();
        let account = self.account_mut(address);
        account.info.code = Some(bytecode);
        account.info.code_hash = code_hash;
    }

    /// Sets the code of an account.
    pub fn account_code(mut self, address: Address, code: Bytes) -> Self {
        self.set_account_code(address, code);
        self
    }

    /// Sets the balance of an account.
    pub fn set_account_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).info.balance = balance;
    }

    /// Sets the balance of an account.
    pub fn account_balance(mut self, address: Address, balance: U256) -> Self {
        self.set_account_balance(address, balance);
        self
    }

    /// Sets the nonce of an account.
    pub fn set_account_nonce(&mut self, address: Address, nonce: u64) {
        self.account_mut(address).info.nonce = nonce;
    }

    /// Sets the nonce of an account.
    pub fn account_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.set_account_nonce(address, nonce);
        self
    }

    /// Returns the account info, or the empty account.
    pub fn account_info(&self, address: Address) -> AccountInfo {
        let Ok(info) = self.db.basic_ref(address);
        info.unwrap_or_default()
    }

    /// Returns the runtime code at `address`, empty if there is none.
    pub fn code(&self, address: Address) -> Bytes {
        let info = self.account_info(address);
        if info.code_hash == KECCAK_EMPTY {
            return Bytes::new();
        }
        let code = match info.code {
            Some(code) => code,
            None => {
                let Ok(code) = self.db.code_by_hash_ref(info.code_hash);
                code
            }
        };
        code.original_bytes()
    }

    /// Returns `true` if there is code at `address`.
    pub fn has_code(&self, address: Address) -> bool {
        !self.code(address).is_empty()
    }

    /// Returns the nonce of `address`.
    pub fn nonce(&self, address: Address) -> u64 {
        self.account_info(address).nonce
    }

    /// Returns the balance of `address`.
    pub fn balance(&self, address: Address) -> U256 {
        self.account_info(address).balance
    }

    /// Executes `tx` under `spec` without committing.
    ///
    /// The transaction nonce is taken from the caller account and gas is free.
    pub fn transact(&mut self, spec: SpecId, mut tx: TxEnv) -> Result<ResultAndState> {
        tx.nonce = self.nonce(tx.caller);
        tx.gas_price = 0;
        trace!(caller = %tx.caller, kind = ?tx.kind, ?spec, "transact");

        let mut evm = Context::mainnet()
            .with_db(&mut self.db)
            .with_cfg(CfgEnv::new_with_spec(spec))
            .build_mainnet();
        evm.transact(tx).map_err(|err| Create3Error::Evm(err.to_string()))
    }

    /// Creates a contract from `caller` with a plain `CREATE` transaction and commits it.
    ///
    /// Returns the created address.
    pub fn create(
        &mut self,
        spec: SpecId,
        caller: Address,
        init_code: Bytes,
        value: U256,
        gas_limit: u64,
    ) -> Result<Address> {
        let tx = TxEnv {
            caller,
            kind: TxKind::Create,
            data: init_code,
            value,
            gas_limit,
            ..Default::default()
        };
        let ResultAndState { result, state } = self.transact(spec, tx)?;
        match result {
            ExecutionResult::Success { output: Output::Create(_, Some(address)), .. } => {
                self.commit(state);
                Ok(address)
            }
            ExecutionResult::Success { output, .. } => {
                Err(Create3Error::UnexpectedOutput(output.into_data()))
            }
            ExecutionResult::Revert { output, .. } => Err(Create3Error::Reverted { output }),
            ExecutionResult::Halt { reason, gas_used } => {
                Err(Create3Error::Halted { reason: format!("{reason:?}"), gas_used })
            }
        }
    }
}

impl revm::Database for MemoryHost {
    type Error = Infallible;

    delegate! {
        to self.db {
            fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;
            fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;
            fn storage(&mut self, address: Address, index: StorageKey) -> Result<StorageValue, Self::Error>;
            fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error>;
        }
    }
}

impl DatabaseCommit for MemoryHost {
    delegate! {
        to self.db {
            fn commit(&mut self, changes: revm::primitives::HashMap<Address, revm::state::Account>);
        }
    }
}
