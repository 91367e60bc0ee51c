use crate::binary::Binary;
use crate::coin::Coin;
use serde::{Deserialize, Serialize};

/// Top-level query sum routed by the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRequest {
    Wasm(WasmQuery),
    Bank(BankQuery),
}

/// Queries handled by the wasm engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasmQuery {
    /// Run the contract's query entry point.
    Smart { contract_addr: String, msg: Binary },
    /// Read a raw key from contract storage.
    Raw { contract_addr: String, key: Binary },
    /// Contract metadata.
    ContractInfo { contract_addr: String },
}

/// Queries handled by the bank module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankQuery {
    Balance { address: String, denom: String },
}

impl From<WasmQuery> for QueryRequest {
    fn from(query: WasmQuery) -> Self {
        QueryRequest::Wasm(query)
    }
}

impl From<BankQuery> for QueryRequest {
    fn from(query: BankQuery) -> Self {
        QueryRequest::Bank(query)
    }
}

/// Response to [`WasmQuery::ContractInfo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInfoResponse {
    pub code_id: u64,
    pub creator: String,
    pub admin: Option<String>,
    pub ibc_port: Option<String>,
    pub pinned: bool,
}

/// Response to [`BankQuery::Balance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub amount: Coin,
}
