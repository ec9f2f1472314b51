//! The deposit contract's external interface.

pub mod abi;

pub use abi::{AbiFunction, ContractDescriptor, StateMutability, decode_uint};
