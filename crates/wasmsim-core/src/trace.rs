//! Hierarchical execution trace.
//!
//! Every VM entry point appends exactly one node to the caller-supplied
//! trace list; submessage work nests in the node's own `trace` field, so the
//! recorded shape mirrors the call tree instead of flattening it. The trace
//! is an audit log, not a projection of final state: nodes for siblings that
//! were later reverted stay in place.

use crate::store::ChainStore;
use serde::Serialize;
use wasmsim_types::{
    Addr, AppResponse, Binary, ContractResponse, ContractResult, Env, MessageInfo, Reply,
};
use wasmsim_vm::DebugLog;

/// One recorded entry-point invocation, tagged by call kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TraceNode {
    Instantiate(CallRecord),
    Execute(CallRecord),
    Reply(ReplyRecord),
}

/// Record for instantiate/execute calls.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub contract_address: Addr,
    pub msg: Binary,
    pub info: MessageInfo,
    pub env: Env,
    /// The VM's own outcome, before event rewriting. `None` when the VM
    /// could not be built at all.
    pub response: Option<ContractResult<ContractResponse>>,
    pub logs: Vec<DebugLog>,
    /// The chain store as it stood once this call settled: post-revert on
    /// failure, post-success otherwise.
    pub store_snapshot: ChainStore,
    pub result: ContractResult<AppResponse>,
    /// Nested records for submessage and reply work spawned by this call.
    pub trace: Vec<TraceNode>,
}

/// Record for reply calls.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRecord {
    pub contract_address: Addr,
    pub reply: Reply,
    pub env: Env,
    pub response: Option<ContractResult<ContractResponse>>,
    pub logs: Vec<DebugLog>,
    pub store_snapshot: ChainStore,
    pub result: ContractResult<AppResponse>,
    pub trace: Vec<TraceNode>,
}

impl TraceNode {
    pub fn contract_address(&self) -> &Addr {
        match self {
            TraceNode::Instantiate(r) | TraceNode::Execute(r) => &r.contract_address,
            TraceNode::Reply(r) => &r.contract_address,
        }
    }

    pub fn result(&self) -> &ContractResult<AppResponse> {
        match self {
            TraceNode::Instantiate(r) | TraceNode::Execute(r) => &r.result,
            TraceNode::Reply(r) => &r.result,
        }
    }

    pub fn store_snapshot(&self) -> &ChainStore {
        match self {
            TraceNode::Instantiate(r) | TraceNode::Execute(r) => &r.store_snapshot,
            TraceNode::Reply(r) => &r.store_snapshot,
        }
    }

    pub fn sub_trace(&self) -> &[TraceNode] {
        match self {
            TraceNode::Instantiate(r) | TraceNode::Execute(r) => &r.trace,
            TraceNode::Reply(r) => &r.trace,
        }
    }

    pub fn logs(&self) -> &[DebugLog] {
        match self {
            TraceNode::Instantiate(r) | TraceNode::Execute(r) => &r.logs,
            TraceNode::Reply(r) => &r.logs,
        }
    }
}
