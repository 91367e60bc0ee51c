//! A deterministic, JSON-scripted contract runtime.
//!
//! `ScriptVm` stands in for a real bytecode VM: instead of wasm, "code" is
//! any non-empty blob and every message is a JSON script of storage
//! operations plus the response to return. That makes contract behavior in
//! tests and demos fully explicit while the engine still only sees the
//! [`ContractVm`] trait.
//!
//! Reply handlers are programmed through storage: before emitting a
//! submessage with id `N`, a script stores the JSON for a [`ReplyScript`]
//! under the key `reply/N`. When the engine later drives the `reply` entry
//! point, the branch matching the submessage outcome runs as a script of its
//! own. A missing key or branch is an accepting no-op handler.

use crate::backend::{Backend, DebugLog, Querier, VmStorage};
use crate::error::VmError;
use crate::vm::{ContractVm, VmLoader};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wasmsim_types::{
    Attribute, Binary, ContractResponse, ContractResult, Env, Event, MessageInfo, QueryRequest,
    Reply, SubMsg, SubMsgResult,
};

/// Storage key prefix under which reply handlers are programmed.
const REPLY_PREFIX: &str = "reply/";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    ops: Vec<Op>,
    #[serde(default)]
    attributes: Vec<Attribute>,
    #[serde(default)]
    events: Vec<Event>,
    #[serde(default)]
    data: Option<Binary>,
    #[serde(default)]
    messages: Vec<SubMsg>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum Op {
    Set { key: String, value: String },
    Remove { key: String },
    Debug { message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReplyScript {
    on_success: Option<Script>,
    on_error: Option<Script>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum QueryScript {
    /// Read a storage key; answers `{"value": <utf8 or null>}`.
    Get { key: String },
    /// Answer with the given JSON value verbatim.
    Echo { value: serde_json::Value },
    /// Fail with the given message.
    Error { message: String },
    /// Forward a request to the backend querier.
    Chain { request: QueryRequest },
}

#[derive(Serialize)]
struct GetResponse {
    value: Option<String>,
}

/// The scripted reference VM.
pub struct ScriptVm {
    backend: Backend,
    logs: Vec<DebugLog>,
}

impl ScriptVm {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            logs: Vec::new(),
        }
    }

    fn call(&mut self, msg: &[u8]) -> ContractResult<ContractResponse> {
        match serde_json::from_slice::<Script>(msg) {
            Ok(script) => self.run(script),
            Err(e) => ContractResult::Err(format!("invalid script: {e}")),
        }
    }

    fn run(&mut self, script: Script) -> ContractResult<ContractResponse> {
        for op in script.ops {
            match op {
                Op::Set { key, value } => {
                    Arc::make_mut(&mut self.backend.storage)
                        .insert(key.into_bytes(), value.into_bytes());
                }
                Op::Remove { key } => {
                    Arc::make_mut(&mut self.backend.storage).remove(key.as_bytes());
                }
                Op::Debug { message } => {
                    self.logs.push(DebugLog::new(message));
                }
            }
        }

        // Writes above stay in working storage even on failure; the engine's
        // snapshot revert is what discards them.
        if let Some(message) = script.error {
            return ContractResult::Err(message);
        }

        ContractResult::Ok(ContractResponse {
            messages: script.messages,
            attributes: script.attributes,
            events: script.events,
            data: script.data,
        })
    }
}

impl ContractVm for ScriptVm {
    fn instantiate(
        &mut self,
        _env: &Env,
        _info: &MessageInfo,
        msg: &[u8],
    ) -> ContractResult<ContractResponse> {
        self.call(msg)
    }

    fn execute(
        &mut self,
        _env: &Env,
        _info: &MessageInfo,
        msg: &[u8],
    ) -> ContractResult<ContractResponse> {
        self.call(msg)
    }

    fn reply(&mut self, _env: &Env, reply: &Reply) -> ContractResult<ContractResponse> {
        let key = format!("{}{}", REPLY_PREFIX, reply.id);
        let program = match self.backend.storage.get(key.as_bytes()) {
            Some(raw) => match serde_json::from_slice::<ReplyScript>(raw) {
                Ok(program) => program,
                Err(e) => return ContractResult::Err(format!("invalid reply script: {e}")),
            },
            None => ReplyScript::default(),
        };

        let branch = match reply.result {
            SubMsgResult::Ok(_) => program.on_success,
            SubMsgResult::Err(_) => program.on_error,
        };

        match branch {
            Some(script) => self.run(script),
            None => ContractResult::Ok(ContractResponse::default()),
        }
    }

    fn query(&mut self, _env: &Env, msg: &[u8]) -> ContractResult<Binary> {
        let script = match serde_json::from_slice::<QueryScript>(msg) {
            Ok(script) => script,
            Err(e) => return ContractResult::Err(format!("invalid query: {e}")),
        };

        let result = match script {
            QueryScript::Get { key } => {
                let value = self
                    .backend
                    .storage
                    .get(key.as_bytes())
                    .map(|v| String::from_utf8_lossy(v).into_owned());
                serde_json::to_vec(&GetResponse { value })
                    .map(Binary::from)
                    .map_err(|e| e.to_string())
            }
            QueryScript::Echo { value } => serde_json::to_vec(&value)
                .map(Binary::from)
                .map_err(|e| e.to_string()),
            QueryScript::Error { message } => Err(message),
            QueryScript::Chain { request } => self.backend.querier.query_chain(&request),
        };

        result.into()
    }

    fn seed_storage(&mut self, storage: VmStorage) {
        self.backend.storage = storage;
    }

    fn storage(&self) -> VmStorage {
        self.backend.storage.clone()
    }

    fn set_querier(&mut self, querier: Box<dyn Querier>) {
        self.backend.querier = querier;
    }

    fn take_logs(&mut self) -> Vec<DebugLog> {
        std::mem::take(&mut self.logs)
    }
}

/// Loader for [`ScriptVm`] instances. Any non-empty code blob is accepted.
pub struct ScriptLoader;

impl VmLoader for ScriptLoader {
    fn build(&self, code: &[u8], backend: Backend) -> Result<Box<dyn ContractVm>, VmError> {
        if code.is_empty() {
            return Err(VmError::EmptyCode);
        }
        tracing::debug!(bytes = code.len(), "building script vm");
        Ok(Box::new(ScriptVm::new(backend)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendApi;
    use serde_json::json;
    use wasmsim_types::{Addr, BlockInfo, ContractEnv};

    fn test_env() -> Env {
        Env {
            block: BlockInfo {
                height: 1,
                time: 1,
                chain_id: "test-1".to_string(),
            },
            contract: ContractEnv {
                address: Addr::unchecked("wasm1contract"),
            },
        }
    }

    fn test_info() -> MessageInfo {
        MessageInfo {
            sender: Addr::unchecked("wasm1sender"),
            funds: vec![],
        }
    }

    fn test_vm() -> ScriptVm {
        ScriptVm::new(Backend::new(BackendApi::new("wasm")))
    }

    fn msg(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_loader_rejects_empty_code() {
        let result = ScriptLoader.build(&[], Backend::new(BackendApi::new("wasm")));
        assert_eq!(result.err(), Some(VmError::EmptyCode));
    }

    #[test]
    fn test_set_then_get() {
        let mut vm = test_vm();
        let env = test_env();

        let script = msg(json!({"ops": [{"set": {"key": "a", "value": "1"}}]}));
        let result = vm.execute(&env, &test_info(), &script);
        assert!(result.is_ok());

        let query = msg(json!({"get": {"key": "a"}}));
        let out = vm.query(&env, &query).into_result().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(out.as_slice()).unwrap();
        assert_eq!(parsed["value"], "1");
    }

    #[test]
    fn test_error_script_keeps_writes_in_working_storage() {
        let mut vm = test_vm();
        let env = test_env();

        let script = msg(json!({
            "ops": [{"set": {"key": "a", "value": "1"}}],
            "error": "boom"
        }));
        let result = vm.execute(&env, &test_info(), &script);
        assert_eq!(result.into_result(), Err("boom".to_string()));

        // The write is still in working storage; discarding it is the
        // engine's job, not the VM's.
        assert!(vm.storage().contains_key(b"a".as_slice()));
    }

    #[test]
    fn test_reply_branches() {
        let mut vm = test_vm();
        let env = test_env();

        let program = json!({"on_error": {"data": "ZA=="}}).to_string();
        let script = msg(json!({
            "ops": [{"set": {"key": "reply/7", "value": program}}]
        }));
        assert!(vm.execute(&env, &test_info(), &script).is_ok());

        // Error branch is programmed
        let reply = Reply {
            id: 7,
            result: SubMsgResult::Err("x".to_string()),
        };
        let response = vm.reply(&env, &reply).into_result().unwrap();
        assert_eq!(response.data, Some(Binary::new(b"d".to_vec())));

        // Success branch is not: accepting no-op
        let reply = Reply {
            id: 7,
            result: SubMsgResult::Ok(wasmsim_types::SubMsgResponse {
                events: vec![],
                data: None,
            }),
        };
        let response = vm.reply(&env, &reply).into_result().unwrap();
        assert_eq!(response, ContractResponse::default());
    }

    #[test]
    fn test_reply_without_program_is_noop() {
        let mut vm = test_vm();
        let reply = Reply {
            id: 99,
            result: SubMsgResult::Err("x".to_string()),
        };
        let response = vm.reply(&test_env(), &reply).into_result().unwrap();
        assert_eq!(response, ContractResponse::default());
    }

    #[test]
    fn test_query_echo_and_error() {
        let mut vm = test_vm();
        let env = test_env();

        let out = vm
            .query(&env, &msg(json!({"echo": {"value": {"a": 1}}})))
            .into_result()
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(out.as_slice()).unwrap();
        assert_eq!(parsed["a"], 1);

        let result = vm.query(&env, &msg(json!({"error": {"message": "nope"}})));
        assert_eq!(result.into_result(), Err("nope".to_string()));
    }

    #[test]
    fn test_chain_query_uses_backend_querier() {
        let mut vm = test_vm();
        let request = json!({"chain": {"request": {"bank": {"balance": {
            "address": "wasm1x", "denom": "utoken"
        }}}}});
        // NullQuerier answers nothing
        let result = vm.query(&test_env(), &msg(request));
        assert_eq!(result.into_result(), Err("querier unavailable".to_string()));
    }

    #[test]
    fn test_debug_logs_drained() {
        let mut vm = test_vm();
        let env = test_env();

        let script = msg(json!({"ops": [{"debug": {"message": "hello"}}]}));
        assert!(vm.execute(&env, &test_info(), &script).is_ok());

        let logs = vm.take_logs();
        assert_eq!(logs, vec![DebugLog::new("hello")]);
        assert!(vm.take_logs().is_empty());
    }

    #[test]
    fn test_malformed_script_is_contract_error() {
        let mut vm = test_vm();
        let result = vm.execute(&test_env(), &test_info(), b"not json");
        assert!(result.into_result().unwrap_err().starts_with("invalid script"));
    }
}
