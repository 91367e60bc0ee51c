use thiserror::Error;
use wasmsim_types::{Addr, TypesError};
use wasmsim_vm::VmError;

/// Errors surfaced by the execution engine.
///
/// Two classes share this enum. Recoverable failures carry a message the
/// contract (or a module) produced; they trigger snapshot revert at the
/// enclosing call and may be consumed by a `reply_on` handler. Structural
/// failures mean the chain state the engine relies on is missing; the
/// submessage machinery refuses to feed those to reply handlers, so they
/// abort the whole top-level call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A contract entry point failed. The payload is the contract's raw
    /// error string, surfaced unmodified.
    #[error("{0}")]
    Contract(String),

    /// The bank module refused an operation.
    #[error("{0}")]
    Bank(String),

    /// The VM loader could not build an instance from the stored code.
    #[error("{0}")]
    Vm(#[from] VmError),

    /// An address or payload failed validation.
    #[error("{0}")]
    Types(#[from] TypesError),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// No key in contract storage. Only raised by raw queries.
    #[error("Key {0} not found")]
    KeyNotFound(String),

    /// No contract registered at this address.
    #[error("Contract {0} not found")]
    ContractNotFound(Addr),

    /// No code stored under this id.
    #[error("Code {0} not found")]
    CodeNotFound(u64),
}

impl CoreError {
    /// Whether a `reply_on` handler is allowed to consume this failure.
    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            CoreError::ContractNotFound(_) | CoreError::CodeNotFound(_)
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
