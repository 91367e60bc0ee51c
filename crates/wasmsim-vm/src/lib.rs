//! Wasmsim VM - the virtual machine seam of the wasmsim simulator.
//!
//! The execution engine never talks to a concrete bytecode runtime; it drives
//! the [`ContractVm`] trait through instances built by a [`VmLoader`]. This
//! crate provides:
//! - The `ContractVm`/`VmLoader` traits and the [`Backend`] wiring (address
//!   api, seeded storage, chain querier)
//! - Debug log capture
//! - [`ScriptVm`], a deterministic JSON-scripted contract runtime that serves
//!   as the in-repo reference VM

pub mod backend;
pub mod error;
pub mod script;
pub mod vm;

pub use backend::{Backend, BackendApi, DebugLog, NullQuerier, Querier, VmStorage};
pub use error::VmError;
pub use script::{ScriptLoader, ScriptVm};
pub use vm::{ContractVm, VmLoader};
