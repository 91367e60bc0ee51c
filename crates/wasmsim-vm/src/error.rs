use thiserror::Error;

/// Errors that can occur while building a VM instance.
///
/// Failures inside an entry point are not represented here: those are
/// contract-level outcomes and travel as the error side of
/// `ContractResult`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VmError {
    #[error("empty contract code")]
    EmptyCode,

    #[error("invalid contract code: {0}")]
    InvalidCode(String),
}
