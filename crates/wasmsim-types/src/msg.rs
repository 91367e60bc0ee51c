use crate::binary::Binary;
use crate::coin::Coin;
use crate::event::Event;
use serde::{Deserialize, Serialize};

/// Top-level message sum routed by the chain.
///
/// This is a closed sum: adding a module means adding a variant, and every
/// match over it is exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmosMsg {
    Wasm(WasmMsg),
    Bank(BankMsg),
}

/// Messages handled by the wasm engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasmMsg {
    /// Call a function on an existing contract.
    Execute {
        contract_addr: String,
        msg: Binary,
        funds: Vec<Coin>,
    },
    /// Create a new contract instance from stored code.
    Instantiate {
        code_id: u64,
        msg: Binary,
        funds: Vec<Coin>,
    },
}

/// Messages handled by the bank module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankMsg {
    Send {
        to_address: String,
        amount: Vec<Coin>,
    },
    Burn {
        amount: Vec<Coin>,
    },
}

impl From<WasmMsg> for CosmosMsg {
    fn from(msg: WasmMsg) -> Self {
        CosmosMsg::Wasm(msg)
    }
}

impl From<BankMsg> for CosmosMsg {
    fn from(msg: BankMsg) -> Self {
        CosmosMsg::Bank(msg)
    }
}

/// Policy controlling whether the emitting contract's `reply` entry point is
/// invoked once a submessage settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOn {
    #[default]
    Never,
    Success,
    Error,
    Always,
}

/// A message emitted by a contract, processed after its own entry point
/// returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMsg {
    #[serde(default)]
    pub id: u64,
    pub msg: CosmosMsg,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub reply_on: ReplyOn,
}

impl SubMsg {
    /// Fire-and-collect: no reply, id is meaningless.
    pub fn new(msg: impl Into<CosmosMsg>) -> Self {
        Self {
            id: 0,
            msg: msg.into(),
            gas_limit: None,
            reply_on: ReplyOn::Never,
        }
    }

    pub fn reply_on_success(msg: impl Into<CosmosMsg>, id: u64) -> Self {
        Self::reply_on(msg, id, ReplyOn::Success)
    }

    pub fn reply_on_error(msg: impl Into<CosmosMsg>, id: u64) -> Self {
        Self::reply_on(msg, id, ReplyOn::Error)
    }

    pub fn reply_always(msg: impl Into<CosmosMsg>, id: u64) -> Self {
        Self::reply_on(msg, id, ReplyOn::Always)
    }

    fn reply_on(msg: impl Into<CosmosMsg>, id: u64, reply_on: ReplyOn) -> Self {
        Self {
            id,
            msg: msg.into(),
            gas_limit: None,
            reply_on,
        }
    }
}

/// Settled outcome of a submessage, delivered to the emitting contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub result: SubMsgResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubMsgResult {
    Ok(SubMsgResponse),
    #[serde(rename = "error")]
    Err(String),
}

impl SubMsgResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, SubMsgResult::Ok(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMsgResponse {
    pub events: Vec<Event>,
    pub data: Option<Binary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submsg_defaults() {
        let sub = SubMsg::new(BankMsg::Send {
            to_address: "addr".to_string(),
            amount: vec![],
        });
        assert_eq!(sub.id, 0);
        assert_eq!(sub.reply_on, ReplyOn::Never);
        assert_eq!(sub.gas_limit, None);
    }

    #[test]
    fn test_reply_on_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReplyOn::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(serde_json::to_string(&ReplyOn::Never).unwrap(), "\"never\"");
    }

    #[test]
    fn test_submsg_result_serde() {
        let err = SubMsgResult::Err("boom".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "boom");

        let ok = SubMsgResult::Ok(SubMsgResponse {
            events: vec![],
            data: None,
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert!(json.get("ok").is_some());
    }

    #[test]
    fn test_cosmos_msg_wire_shape() {
        let msg: CosmosMsg = WasmMsg::Execute {
            contract_addr: "wasm1x".to_string(),
            msg: Binary::new(b"{}".to_vec()),
            funds: vec![],
        }
        .into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["wasm"]["execute"]["contract_addr"], "wasm1x");

        let back: CosmosMsg = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
