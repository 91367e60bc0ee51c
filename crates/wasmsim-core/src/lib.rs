//! Wasmsim Core - the contract execution engine.
//!
//! This crate drives contracts through a sandboxed VM abstraction and keeps
//! all chain state in one snapshottable value:
//! - Code & instance registry with deterministic bech32 addresses
//! - Per-contract ordered key/value storage
//! - VM host with a best-effort instance cache
//! - Execution orchestrator for instantiate/execute/reply/query
//! - Submessage state machine with reply-on policies and transactional
//!   revert
//! - Hierarchical trace recorder
//!
//! The simulator is offline: no networking, no consensus, no persistence.
//! Height and time only move when the host advances them.

pub mod app;
pub mod bank;
pub mod error;
pub mod querier;
pub mod router;
pub mod store;
pub mod trace;
pub mod wasm;

pub use app::App;
pub use bank::BankKeeper;
pub use error::CoreError;
pub use querier::StoreQuerier;
pub use router::{CosmosRouter, Router};
pub use store::{ChainStore, CodeInfo, ContractInfo};
pub use trace::{CallRecord, ReplyRecord, TraceNode};
pub use wasm::{build_app_response, WasmKeeper, CONTRACT_ATTR, CONTRACT_ATTR_FULL};
