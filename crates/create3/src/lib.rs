//! Deterministic contract deployment for the EVM, in the style of CREATE3.
//!
//! A factory places a tiny fixed proxy with `CREATE2`, and the proxy immediately `CREATE`s the
//! caller's payload. Because the proxy's init code never changes, the proxy address depends only
//! on the factory and the salt; because the proxy creates exactly once, the payload address
//! depends only on the proxy. The payload's bytecode never enters the derivation.
//!
//! ```text
//! salt ──► proxy = keccak256(0xff ‖ factory ‖ salt ‖ keccak256(proxy init code))[12..]
//!                    │
//!                    └──► deployed = keccak256(rlp([proxy, 1]))[12..]
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod address;
pub use address::*;

mod bytecode;
pub use bytecode::*;

mod config;
pub use config::*;

mod deployer;
pub use deployer::*;

mod error;
pub use error::*;

mod factory;
pub use factory::*;

mod host;
pub use host::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use alloy_primitives;
pub use revm;
