use crate::binary::Binary;
use crate::event::{Attribute, Event};
use crate::msg::SubMsg;
use serde::{Deserialize, Serialize};

/// The ok-or-error envelope every VM entry point returns.
///
/// The error side is a plain string: it is the contract's own message and
/// must surface to callers unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractResult<T> {
    Ok(T),
    #[serde(rename = "error")]
    Err(String),
}

impl<T> ContractResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ContractResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            ContractResult::Ok(value) => Ok(value),
            ContractResult::Err(message) => Err(message),
        }
    }
}

impl<T> From<Result<T, String>> for ContractResult<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => ContractResult::Ok(value),
            Err(message) => ContractResult::Err(message),
        }
    }
}

/// What a contract returns from instantiate/execute/reply.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContractResponse {
    #[serde(default)]
    pub messages: Vec<SubMsg>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub data: Option<Binary>,
}

/// What the engine returns to its caller: the flattened, rewritten event
/// list and the final data payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppResponse {
    pub events: Vec<Event>,
    pub data: Option<Binary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_result_serde() {
        let ok: ContractResult<u32> = ContractResult::Ok(5);
        assert_eq!(serde_json::to_string(&ok).unwrap(), "{\"ok\":5}");

        let err: ContractResult<u32> = ContractResult::Err("boom".to_string());
        assert_eq!(serde_json::to_string(&err).unwrap(), "{\"error\":\"boom\"}");
    }

    #[test]
    fn test_contract_result_into_result() {
        let ok: ContractResult<u32> = ContractResult::Ok(5);
        assert_eq!(ok.into_result(), Ok(5));

        let err: ContractResult<u32> = ContractResult::Err("boom".to_string());
        assert_eq!(err.into_result(), Err("boom".to_string()));
    }

    #[test]
    fn test_contract_response_from_partial_json() {
        let response: ContractResponse = serde_json::from_str("{}").unwrap();
        assert!(response.messages.is_empty());
        assert!(response.data.is_none());
    }
}
