//! Wasmsim Types - Core type definitions for the wasmsim contract simulator.
//!
//! This crate provides the fundamental types shared by the VM layer and the
//! execution engine:
//! - Addresses (bech32 with a host-supplied prefix) and the deterministic
//!   contract address derivation
//! - Binary payloads (base64 on the wire)
//! - Coins, events and attributes
//! - Block/contract environment and message info
//! - The closed message, query and reply sums
//! - Contract and application responses

pub mod addr;
pub mod binary;
pub mod coin;
pub mod env;
pub mod error;
pub mod event;
pub mod msg;
pub mod query;
pub mod response;

pub use addr::{contract_addr_hash, derive_contract_addr, validate_addr, validate_prefix, Addr};
pub use binary::Binary;
pub use coin::Coin;
pub use env::{BlockInfo, ContractEnv, Env, MessageInfo};
pub use error::TypesError;
pub use event::{Attribute, Event};
pub use msg::{BankMsg, CosmosMsg, Reply, ReplyOn, SubMsg, SubMsgResponse, SubMsgResult, WasmMsg};
pub use query::{BalanceResponse, BankQuery, ContractInfoResponse, QueryRequest, WasmQuery};
pub use response::{AppResponse, ContractResponse, ContractResult};
