use crate::addr::Addr;
use crate::coin::Coin;
use serde::{Deserialize, Serialize};

/// Block context supplied by the host.
///
/// The simulator has no block production: height and time only move when the
/// host advances them, and both are expected to be monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    /// Nanoseconds since the unix epoch.
    pub time: u64,
    pub chain_id: String,
}

/// The contract half of the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEnv {
    pub address: Addr,
}

/// Environment injected into every VM entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Env {
    pub block: BlockInfo,
    pub contract: ContractEnv,
}

/// Sender and funds for instantiate/execute calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub sender: Addr,
    pub funds: Vec<Coin>,
}
