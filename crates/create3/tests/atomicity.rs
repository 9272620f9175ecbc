//! Tests for rejected deployments. A rejected deployment must leave the host untouched.

use std::{
    sync::{Arc, Mutex},
    thread,
};

use alloy_primitives::{bytes, Address, Bytes, B256, U256};
use create3::{
    constants::proxy,
    revm::bytecode::opcode::{CREATE2, MSTORE, PUSH0, RETURN},
    test_utils::{
        empty_code_init_code, init_code_returning, reverting_init_code, setup_factory,
        TEST_BALANCE, TEST_CALLER,
    },
    BytecodeBuilder, Create3Config, Create3Error, Create3Factory, MemoryHost, SlotState,
};

/// The observable state a failed deployment must not change.
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    caller_nonce: u64,
    caller_balance: U256,
    factory_nonce: u64,
    proxy_code: Bytes,
    deployed_code: Bytes,
}

fn snapshot(host: &MemoryHost, factory: &Create3Factory, salt: B256) -> Snapshot {
    Snapshot {
        caller_nonce: host.nonce(TEST_CALLER),
        caller_balance: host.balance(TEST_CALLER),
        factory_nonce: host.nonce(factory.address()),
        proxy_code: host.code(factory.address_of(salt)),
        deployed_code: host.code(factory.deployed_address_of(salt)),
    }
}

#[test]
fn test_salt_collision() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let salt = B256::repeat_byte(0x11);

    factory.deploy(&mut host, TEST_CALLER, salt, &init_code_returning([1])).unwrap();
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([2]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(error, Create3Error::SaltCollision { salt, proxy: factory.address_of(salt) });
    assert!(!error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
    assert_eq!(host.code(factory.deployed_address_of(salt)), bytes!("01"));
}

#[test]
fn test_reverting_payload_rolls_back() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let salt = B256::repeat_byte(0x22);
    let before = snapshot(&host, &factory, salt);

    let error = factory.deploy(&mut host, TEST_CALLER, salt, &reverting_init_code()).unwrap_err();
    assert_eq!(error, Create3Error::PayloadCreationFailed { salt });
    assert_eq!(snapshot(&host, &factory, salt), before);
    assert!(!host.has_code(factory.address_of(salt)));
    assert_eq!(factory.slot_state(&host, salt), SlotState::Unclaimed);

    // the salt is still available
    let deployment =
        factory.deploy(&mut host, TEST_CALLER, salt, &init_code_returning([0x33])).unwrap();
    assert_eq!(deployment.deployed, factory.deployed_address_of(salt));
    assert_eq!(host.code(deployment.deployed), bytes!("33"));
}

#[test]
fn test_empty_code_payload_fails() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let salt = B256::repeat_byte(0x44);
    let before = snapshot(&host, &factory, salt);

    let error =
        factory.deploy(&mut host, TEST_CALLER, salt, &empty_code_init_code()).unwrap_err();
    assert_eq!(error, Create3Error::PayloadCreationFailed { salt });
    assert_eq!(snapshot(&host, &factory, salt), before);

    // an empty payload creates nothing either
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &[]).unwrap_err();
    assert_eq!(error, Create3Error::PayloadCreationFailed { salt });
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_wrong_proxy_nonce_never_commits() {
    let config = Create3Config::default().with_proxy_nonce(0);
    let (mut host, factory) = setup_factory(config).unwrap();
    let salt = B256::repeat_byte(0x55);
    let before = snapshot(&host, &factory, salt);
    let proxy = factory.address_of(salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(
        error,
        Create3Error::AddressMismatch { expected: proxy.create(0), actual: proxy.create(1) }
    );
    assert!(error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
    assert!(!host.has_code(proxy));
    assert!(!host.has_code(proxy.create(1)));
}

#[test]
fn test_out_of_gas_is_discarded() {
    let config = Create3Config::default().with_gas_limit(50_000);
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let factory = Create3Factory::at(factory.address(), config);
    let salt = B256::repeat_byte(0x66);
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert!(matches!(error, Create3Error::Halted { .. }), "{error:?}");
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_unaffordable_value_is_rejected() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let salt = B256::repeat_byte(0x77);
    let before = snapshot(&host, &factory, salt);

    let value = TEST_BALANCE + U256::from(1);
    let error = factory
        .deploy_with_value(&mut host, TEST_CALLER, salt, &init_code_returning([1]), value)
        .unwrap_err();
    assert!(matches!(error, Create3Error::Evm(_)), "{error:?}");
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_short_calldata_reverts() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let tx = revm::context::TxEnv {
        caller: TEST_CALLER,
        kind: alloy_primitives::TxKind::Call(factory.address()),
        data: bytes!("00"),
        gas_limit: 1_000_000,
        ..Default::default()
    };
    let outcome = host.transact(factory.config().spec, tx).unwrap();
    assert!(matches!(
        outcome.result,
        revm::context::result::ExecutionResult::Revert { ref output, .. } if output.is_empty()
    ));
}

#[test]
fn test_racing_deploys_resolve_by_order() {
    let (host, factory) = setup_factory(Create3Config::default()).unwrap();
    let salt = B256::repeat_byte(0x88);
    let host = Arc::new(Mutex::new(host));

    let handles: Vec<_> = [0xaa_u8, 0xbb]
        .into_iter()
        .map(|byte| {
            let host = Arc::clone(&host);
            thread::spawn(move || {
                let mut host = host.lock().unwrap();
                factory
                    .deploy(&mut host, TEST_CALLER, salt, &init_code_returning([byte]))
                    .map(|deployment| (deployment, byte))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let (deployment, byte) = winners[0];

    let losers: Vec<_> = results.iter().filter_map(|result| result.as_ref().err()).collect();
    assert_eq!(
        losers,
        vec![&Create3Error::SaltCollision { salt, proxy: factory.address_of(salt) }]
    );

    let host = host.lock().unwrap();
    assert_eq!(host.code(deployment.deployed), Bytes::from(vec![*byte]));
    assert_eq!(host.nonce(TEST_CALLER), 1);
}

#[test]
fn test_collision_across_factories_is_independent() {
    let (mut host, factory) = setup_factory(Create3Config::default()).unwrap();
    let other = Create3Factory::install(
        &mut host,
        Address::repeat_byte(0x0f),
        Create3Config::default(),
    );
    let salt = B256::ZERO;

    let a = factory.deploy(&mut host, TEST_CALLER, salt, &init_code_returning([1])).unwrap();
    let b = other.deploy(&mut host, TEST_CALLER, salt, &init_code_returning([2])).unwrap();
    assert_ne!(a.proxy, b.proxy);
    assert_ne!(a.deployed, b.deployed);
}

/// Places `runtime` at a fixed address and attaches a factory handle to it.
fn fake_factory(host: &mut MemoryHost, runtime: Bytes) -> Create3Factory {
    let address = Address::repeat_byte(0xfa);
    host.set_account_code(address, runtime);
    Create3Factory::at(address, Create3Config::default())
}

fn funded_host() -> MemoryHost {
    MemoryHost::default().account_balance(TEST_CALLER, TEST_BALANCE)
}

/// Returns the two words `proxy ‖ deployed` without creating anything.
fn returning_words(proxy: Address, deployed: Address) -> Bytes {
    BytecodeBuilder::default()
        .return_with_data([proxy.into_word(), deployed.into_word()].concat())
        .build()
}

#[test]
fn test_zero_words_are_an_address_mismatch() {
    let mut host = funded_host();
    // return(0, 64) of zeroed memory
    let factory = fake_factory(&mut host, bytes!("60405ff3"));
    let salt = B256::repeat_byte(0x91);
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(
        error,
        Create3Error::AddressMismatch {
            expected: factory.address_of(salt),
            actual: Address::ZERO,
        }
    );
    assert!(error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_wrong_deployed_word_is_an_address_mismatch() {
    let mut host = funded_host();
    let salt = B256::repeat_byte(0x92);
    let attached = Create3Factory::at(Address::repeat_byte(0xfa), Create3Config::default());
    let proxy = attached.address_of(salt);
    let factory = fake_factory(&mut host, returning_words(proxy, Address::repeat_byte(0x01)));
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(
        error,
        Create3Error::AddressMismatch {
            expected: factory.deployed_address_of(salt),
            actual: Address::repeat_byte(0x01),
        }
    );
    assert!(error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_short_output_is_unexpected() {
    let mut host = funded_host();
    // return(0, 1)
    let factory = fake_factory(&mut host, bytes!("60015ff3"));
    let salt = B256::repeat_byte(0x93);
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(error, Create3Error::UnexpectedOutput(bytes!("00")));
    assert!(!error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_missing_proxy_code_is_rejected() {
    let mut host = funded_host();
    let salt = B256::repeat_byte(0x94);
    let attached = Create3Factory::at(Address::repeat_byte(0xfa), Create3Config::default());
    let (proxy, deployed) = (attached.address_of(salt), attached.deployed_address_of(salt));
    // the right words, but no proxy was ever created
    let factory = fake_factory(&mut host, returning_words(proxy, deployed));
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(error, Create3Error::ProxyCodeMismatch { proxy, code: Bytes::new() });
    assert!(error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
}

#[test]
fn test_proxy_without_payload_is_rejected() {
    let mut host = funded_host();
    let salt = B256::repeat_byte(0x95);
    let attached = Create3Factory::at(Address::repeat_byte(0xfa), Create3Config::default());
    let (proxy, deployed) = (attached.address_of(salt), attached.deployed_address_of(salt));
    // creates the genuine proxy but never calls it, then reports both addresses
    let runtime = BytecodeBuilder::default()
        .push_bytes(proxy::INIT_CODE)
        .append(PUSH0)
        .append(MSTORE)
        .push_bytes(salt)
        .push_number(proxy::INIT_CODE.len() as u8)
        .push_number((32 - proxy::INIT_CODE.len()) as u8)
        .append(PUSH0)
        .append(CREATE2)
        .append(PUSH0)
        .append(MSTORE)
        .push_address(deployed)
        .push_number(32u8)
        .append(MSTORE)
        .push_number(64u8)
        .append(PUSH0)
        .append(RETURN)
        .build();
    let factory = fake_factory(&mut host, runtime);
    let before = snapshot(&host, &factory, salt);

    let payload = init_code_returning([1]);
    let error = factory.deploy(&mut host, TEST_CALLER, salt, &payload).unwrap_err();
    assert_eq!(error, Create3Error::DeployedCodeMissing { deployed });
    assert!(error.is_fatal());
    assert_eq!(snapshot(&host, &factory, salt), before);
    assert!(!host.has_code(proxy));
    assert_eq!(factory.slot_state(&host, salt), SlotState::Unclaimed);
}
