//! Message and query routing across modules.

use crate::bank::BankKeeper;
use crate::error::CoreError;
use crate::store::ChainStore;
use crate::trace::TraceNode;
use crate::wasm::WasmKeeper;
use wasmsim_types::{Addr, AppResponse, Binary, BlockInfo, CosmosMsg, QueryRequest};

/// How the engine re-enters the chain for submessages and queries.
///
/// Every submessage a contract emits comes back through here, which is what
/// makes sends to other modules (bank, wasm execute/instantiate) uniform and
/// lets the wasm engine recurse into itself.
pub trait CosmosRouter {
    fn execute(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        trace: &mut Vec<TraceNode>,
        sender: Addr,
        msg: CosmosMsg,
    ) -> Result<AppResponse, CoreError>;

    fn query(
        &self,
        store: &ChainStore,
        block: &BlockInfo,
        request: QueryRequest,
    ) -> Result<Binary, CoreError>;
}

/// The chain's module table.
pub struct Router {
    pub wasm: WasmKeeper,
    pub bank: BankKeeper,
}

impl CosmosRouter for Router {
    fn execute(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        trace: &mut Vec<TraceNode>,
        sender: Addr,
        msg: CosmosMsg,
    ) -> Result<AppResponse, CoreError> {
        match msg {
            CosmosMsg::Wasm(msg) => self.wasm.handle_msg(store, block, self, trace, sender, msg),
            CosmosMsg::Bank(msg) => self.bank.handle_msg(store, sender, msg),
        }
    }

    fn query(
        &self,
        store: &ChainStore,
        block: &BlockInfo,
        request: QueryRequest,
    ) -> Result<Binary, CoreError> {
        match request {
            QueryRequest::Wasm(query) => self.wasm.handle_query(store, block, query),
            QueryRequest::Bank(query) => self.bank.handle_query(store, query),
        }
    }
}
