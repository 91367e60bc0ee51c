//! The contract execution engine.
//!
//! `WasmKeeper` owns the code/instance registry and the VM host, drives the
//! four entry points (instantiate/execute/reply/query), rewrites contract
//! responses into application responses, and runs the submessage state
//! machine. All chain state flows through the [`ChainStore`] passed into
//! each call; the keeper's only own state is the best-effort VM cache.

use crate::error::CoreError;
use crate::querier::StoreQuerier;
use crate::router::CosmosRouter;
use crate::store::{ChainStore, ContractInfo};
use crate::trace::{CallRecord, ReplyRecord, TraceNode};
use parking_lot::RwLock;
use std::collections::HashMap;
use wasmsim_types::{
    derive_contract_addr, validate_addr, validate_prefix, Addr, AppResponse, Binary, BlockInfo,
    ContractEnv, ContractInfoResponse, ContractResponse, ContractResult, Env, Event, MessageInfo,
    Reply, ReplyOn, SubMsg, SubMsgResponse, SubMsgResult, WasmMsg, WasmQuery,
};
use wasmsim_vm::{Backend, BackendApi, ContractVm, DebugLog, VmLoader, VmStorage};

/// Reserved attribute naming the emitting contract.
pub const CONTRACT_ATTR: &str = "_contract_addr";

/// The instantiate event spells the attribute out in full; every other event
/// uses the short form. Both spellings are load-bearing downstream.
pub const CONTRACT_ATTR_FULL: &str = "_contract_address";

/// The contract execution engine.
pub struct WasmKeeper {
    prefix: String,
    loader: Box<dyn VmLoader>,
    /// Best-effort cache of live VM instances, keyed by address. Entries are
    /// checked out for the duration of a call so re-entrant execution never
    /// holds the lock. Authoritative state lives in the chain store; any
    /// entry can be dropped and rebuilt.
    vms: RwLock<HashMap<Addr, Box<dyn ContractVm>>>,
}

impl WasmKeeper {
    pub fn new(prefix: impl Into<String>, loader: Box<dyn VmLoader>) -> Result<Self, CoreError> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        Ok(Self {
            prefix,
            loader,
            vms: RwLock::new(HashMap::new()),
        })
    }

    pub fn bech32_prefix(&self) -> &str {
        &self.prefix
    }

    // --- registry ---

    /// Store contract code and return its id.
    pub fn store_code(&self, store: &mut ChainStore, creator: Addr, code: Binary) -> u64 {
        let code_id = store.save_code(creator, code);
        tracing::debug!(code_id, "stored contract code");
        code_id
    }

    /// Allocate the next instance id, derive the deterministic address, and
    /// write the initial contract metadata plus empty storage.
    pub fn register_contract(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        sender: Addr,
        code_id: u64,
    ) -> Result<Addr, CoreError> {
        let instance_id = store.last_instance_id() + 1;
        let addr = derive_contract_addr(&self.prefix, code_id, instance_id)?;
        store.bump_instance_id();
        store.register_contract(
            addr.clone(),
            ContractInfo {
                code_id,
                creator: sender,
                admin: None,
                label: String::new(),
                created: block.height,
            },
        );
        tracing::debug!(%addr, code_id, instance_id, "registered contract instance");
        Ok(addr)
    }

    // --- VM host ---

    /// Take the VM for `addr` out of the cache, building it on a miss.
    fn checkout_vm(
        &self,
        store: &ChainStore,
        addr: &Addr,
    ) -> Result<Box<dyn ContractVm>, CoreError> {
        if let Some(vm) = self.vms.write().remove(addr) {
            return Ok(vm);
        }

        let info = store
            .contract_info(addr)
            .ok_or_else(|| CoreError::ContractNotFound(addr.clone()))?;
        let code = store
            .code_info(info.code_id)
            .ok_or(CoreError::CodeNotFound(info.code_id))?;

        let backend = Backend::new(BackendApi::new(self.prefix.clone()));
        let vm = self.loader.build(code.wasm_code.as_slice(), backend)?;
        tracing::debug!(%addr, code_id = info.code_id, "built contract vm");
        Ok(vm)
    }

    fn checkin_vm(&self, addr: &Addr, vm: Box<dyn ContractVm>) {
        self.vms.write().insert(addr.clone(), vm);
    }

    fn evict_vm(&self, addr: &Addr) {
        if self.vms.write().remove(addr).is_some() {
            tracing::debug!(%addr, "evicted contract vm");
        }
    }

    /// Run one VM call with storage seeded from the chain store and a fresh
    /// querier snapshot. Returns the call result, the VM's storage after the
    /// call, and the drained debug logs.
    fn call_vm<T>(
        &self,
        store: &ChainStore,
        addr: &Addr,
        call: impl FnOnce(&mut dyn ContractVm) -> T,
    ) -> Result<(T, VmStorage, Vec<DebugLog>), CoreError> {
        let mut vm = self.checkout_vm(store, addr)?;
        vm.seed_storage(store.contract_storage(addr).unwrap_or_default());
        vm.set_querier(Box::new(StoreQuerier::new(store.clone())));

        let result = call(vm.as_mut());
        let storage = vm.storage();
        let logs = vm.take_logs();
        self.checkin_vm(addr, vm);
        Ok((result, storage, logs))
    }

    fn environment(&self, block: &BlockInfo, addr: &Addr) -> Env {
        Env {
            block: block.clone(),
            contract: ContractEnv {
                address: addr.clone(),
            },
        }
    }

    // --- entry points ---

    /// Register a new instance of `code_id` and drive its instantiate entry
    /// point. On failure the whole store snapshot is restored, so neither
    /// the instance id, the metadata, nor any storage survives.
    #[allow(clippy::too_many_arguments)]
    pub fn instantiate_contract(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        sender: Addr,
        funds: Vec<wasmsim_types::Coin>,
        code_id: u64,
        msg: &[u8],
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        let snapshot = store.clone();
        let addr = self.register_contract(store, block, sender.clone(), code_id)?;
        let env = self.environment(block, &addr);
        let info = MessageInfo { sender, funds };

        let (vm_result, logs) =
            match self.call_vm(store, &addr, |vm| vm.instantiate(&env, &info, msg)) {
                Ok((vm_result, storage, logs)) => {
                    store.set_contract_storage(&addr, storage);
                    (vm_result, logs)
                }
                Err(err) => {
                    *store = snapshot;
                    self.evict_vm(&addr);
                    trace.push(TraceNode::Instantiate(CallRecord {
                        contract_address: addr,
                        msg: Binary::from(msg),
                        info,
                        env,
                        response: None,
                        logs: Vec::new(),
                        store_snapshot: store.clone(),
                        result: ContractResult::Err(err.to_string()),
                        trace: Vec::new(),
                    }));
                    return Err(err);
                }
            };

        match vm_result {
            ContractResult::Err(message) => {
                *store = snapshot;
                // The restored instance counter will hand this address out
                // again; a cached VM would keep the wrong code bound to it.
                self.evict_vm(&addr);
                tracing::debug!(%addr, error = %message, "instantiate failed, snapshot restored");
                trace.push(TraceNode::Instantiate(CallRecord {
                    contract_address: addr,
                    msg: Binary::from(msg),
                    info,
                    env,
                    response: Some(ContractResult::Err(message.clone())),
                    logs,
                    store_snapshot: store.clone(),
                    result: ContractResult::Err(message.clone()),
                    trace: Vec::new(),
                }));
                Err(CoreError::Contract(message))
            }
            ContractResult::Ok(response) => {
                tracing::debug!(%addr, code_id, "contract instantiated");
                let custom = Event::new("instantiate")
                    .add_attribute(CONTRACT_ATTR_FULL, addr.as_str())
                    .add_attribute("code_id", code_id.to_string());
                let (app, messages) = build_app_response(&addr, custom, response.clone());

                let mut sub_trace = Vec::new();
                let result = self
                    .handle_contract_response(store, block, router, &addr, messages, app, &mut sub_trace);
                if result.is_err() {
                    // A failed submessage fails the whole instantiate: the
                    // registration and the contract's own writes go too.
                    *store = snapshot;
                    self.evict_vm(&addr);
                }
                trace.push(TraceNode::Instantiate(CallRecord {
                    contract_address: addr,
                    msg: Binary::from(msg),
                    info,
                    env,
                    response: Some(ContractResult::Ok(response)),
                    logs,
                    store_snapshot: store.clone(),
                    result: trace_result(&result),
                    trace: sub_trace,
                }));
                result
            }
        }
    }

    /// Drive a contract's execute entry point.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_contract(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        sender: Addr,
        funds: Vec<wasmsim_types::Coin>,
        addr: Addr,
        msg: &[u8],
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        let snapshot = store.clone();
        let env = self.environment(block, &addr);
        let info = MessageInfo { sender, funds };

        let (vm_result, logs) =
            match self.call_vm(store, &addr, |vm| vm.execute(&env, &info, msg)) {
                Ok((vm_result, storage, logs)) => {
                    store.set_contract_storage(&addr, storage);
                    (vm_result, logs)
                }
                Err(err) => {
                    *store = snapshot;
                    trace.push(TraceNode::Execute(CallRecord {
                        contract_address: addr,
                        msg: Binary::from(msg),
                        info,
                        env,
                        response: None,
                        logs: Vec::new(),
                        store_snapshot: store.clone(),
                        result: ContractResult::Err(err.to_string()),
                        trace: Vec::new(),
                    }));
                    return Err(err);
                }
            };

        match vm_result {
            ContractResult::Err(message) => {
                *store = snapshot;
                tracing::debug!(%addr, error = %message, "execute failed, snapshot restored");
                trace.push(TraceNode::Execute(CallRecord {
                    contract_address: addr,
                    msg: Binary::from(msg),
                    info,
                    env,
                    response: Some(ContractResult::Err(message.clone())),
                    logs,
                    store_snapshot: store.clone(),
                    result: ContractResult::Err(message.clone()),
                    trace: Vec::new(),
                }));
                Err(CoreError::Contract(message))
            }
            ContractResult::Ok(response) => {
                let custom = Event::new("execute").add_attribute(CONTRACT_ATTR, addr.as_str());
                let (app, messages) = build_app_response(&addr, custom, response.clone());

                let mut sub_trace = Vec::new();
                let result = self
                    .handle_contract_response(store, block, router, &addr, messages, app, &mut sub_trace);
                if result.is_err() {
                    *store = snapshot;
                }
                trace.push(TraceNode::Execute(CallRecord {
                    contract_address: addr,
                    msg: Binary::from(msg),
                    info,
                    env,
                    response: Some(ContractResult::Ok(response)),
                    logs,
                    store_snapshot: store.clone(),
                    result: trace_result(&result),
                    trace: sub_trace,
                }));
                result
            }
        }
    }

    /// Deliver a settled submessage outcome to the emitting contract.
    pub fn reply(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        addr: Addr,
        reply: Reply,
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        let snapshot = store.clone();
        let env = self.environment(block, &addr);
        let mode = if reply.result.is_ok() {
            "handle_success"
        } else {
            "handle_failure"
        };

        let (vm_result, logs) =
            match self.call_vm(store, &addr, |vm| vm.reply(&env, &reply)) {
                Ok((vm_result, storage, logs)) => {
                    store.set_contract_storage(&addr, storage);
                    (vm_result, logs)
                }
                Err(err) => {
                    *store = snapshot;
                    trace.push(TraceNode::Reply(ReplyRecord {
                        contract_address: addr,
                        reply,
                        env,
                        response: None,
                        logs: Vec::new(),
                        store_snapshot: store.clone(),
                        result: ContractResult::Err(err.to_string()),
                        trace: Vec::new(),
                    }));
                    return Err(err);
                }
            };

        match vm_result {
            ContractResult::Err(message) => {
                *store = snapshot;
                tracing::debug!(%addr, error = %message, "reply failed, snapshot restored");
                trace.push(TraceNode::Reply(ReplyRecord {
                    contract_address: addr,
                    reply,
                    env,
                    response: Some(ContractResult::Err(message.clone())),
                    logs,
                    store_snapshot: store.clone(),
                    result: ContractResult::Err(message.clone()),
                    trace: Vec::new(),
                }));
                Err(CoreError::Contract(message))
            }
            ContractResult::Ok(response) => {
                let custom = Event::new("reply")
                    .add_attribute(CONTRACT_ATTR, addr.as_str())
                    .add_attribute("mode", mode);
                let (app, messages) = build_app_response(&addr, custom, response.clone());

                let mut sub_trace = Vec::new();
                let result = self
                    .handle_contract_response(store, block, router, &addr, messages, app, &mut sub_trace);
                if result.is_err() {
                    *store = snapshot;
                }
                trace.push(TraceNode::Reply(ReplyRecord {
                    contract_address: addr,
                    reply,
                    env,
                    response: Some(ContractResult::Ok(response)),
                    logs,
                    store_snapshot: store.clone(),
                    result: trace_result(&result),
                    trace: sub_trace,
                }));
                result
            }
        }
    }

    /// Drive a contract's query entry point. Stateless: no snapshot is
    /// taken and the VM's storage is discarded afterwards.
    pub fn query(
        &self,
        store: &ChainStore,
        block: &BlockInfo,
        addr: &Addr,
        msg: &[u8],
    ) -> Result<Binary, CoreError> {
        let env = self.environment(block, addr);
        let (result, _storage, _logs) = self.call_vm(store, addr, |vm| vm.query(&env, msg))?;
        result.into_result().map_err(CoreError::Contract)
    }

    // --- router entry ---

    /// Dispatch a wasm message to the matching entry point.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_msg(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        trace: &mut Vec<TraceNode>,
        sender: Addr,
        msg: WasmMsg,
    ) -> Result<AppResponse, CoreError> {
        match msg {
            WasmMsg::Execute {
                contract_addr,
                msg,
                funds,
            } => {
                let addr = validate_addr(&self.prefix, &contract_addr)?;
                self.execute_contract(
                    store,
                    block,
                    router,
                    sender,
                    funds,
                    addr,
                    msg.as_slice(),
                    trace,
                )
            }
            WasmMsg::Instantiate {
                code_id,
                msg,
                funds,
            } => self.instantiate_contract(
                store,
                block,
                router,
                sender,
                funds,
                code_id,
                msg.as_slice(),
                trace,
            ),
        }
    }

    /// Answer a wasm query.
    pub fn handle_query(
        &self,
        store: &ChainStore,
        block: &BlockInfo,
        query: WasmQuery,
    ) -> Result<Binary, CoreError> {
        match query {
            WasmQuery::Smart { contract_addr, msg } => {
                let addr = validate_addr(&self.prefix, &contract_addr)?;
                self.query(store, block, &addr, msg.as_slice())
            }
            WasmQuery::Raw { contract_addr, key } => {
                query_raw(store, &Addr::unchecked(contract_addr), key.as_slice())
            }
            WasmQuery::ContractInfo { contract_addr } => {
                query_contract_info(store, &Addr::unchecked(contract_addr))
            }
        }
    }

    // --- submessage state machine ---

    /// Process a contract's emitted submessages in order, folding their
    /// events (and last non-null data) into `res`. Any failure reverts the
    /// store to its state at entry, discarding earlier siblings' effects as
    /// well.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn handle_contract_response(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        addr: &Addr,
        messages: Vec<SubMsg>,
        mut res: AppResponse,
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        let snapshot = store.clone();
        for sub in messages {
            match self.execute_submsg(store, block, router, addr, sub, trace) {
                Ok(subres) => {
                    res.events.extend(subres.events);
                    if subres.data.is_some() {
                        res.data = subres.data;
                    }
                }
                Err(err) => {
                    *store = snapshot;
                    tracing::debug!(%addr, error = %err, "submessage failed, siblings reverted");
                    return Err(err);
                }
            }
        }
        Ok(res)
    }

    /// Run one submessage through the router and apply its `reply_on`
    /// policy.
    fn execute_submsg(
        &self,
        store: &mut ChainStore,
        block: &BlockInfo,
        router: &dyn CosmosRouter,
        addr: &Addr,
        sub: SubMsg,
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        let SubMsg {
            id, msg, reply_on, ..
        } = sub;

        match router.execute(store, block, trace, addr.clone(), msg) {
            Ok(mut r) => match reply_on {
                ReplyOn::Always | ReplyOn::Success => {
                    let reply = Reply {
                        id,
                        result: SubMsgResult::Ok(SubMsgResponse {
                            events: r.events.clone(),
                            data: r.data.clone(),
                        }),
                    };
                    let reply_res = self.reply(store, block, router, addr.clone(), reply, trace)?;
                    if reply_res.data.is_some() {
                        r.data = reply_res.data;
                    }
                    r.events.extend(reply_res.events);
                    Ok(r)
                }
                ReplyOn::Never | ReplyOn::Error => {
                    // Without a reply, data never crosses to the parent;
                    // events do.
                    r.data = None;
                    Ok(r)
                }
            },
            Err(err) => {
                if matches!(reply_on, ReplyOn::Always | ReplyOn::Error) && err.recoverable() {
                    let reply = Reply {
                        id,
                        result: SubMsgResult::Err(err.to_string()),
                    };
                    // A successful reply hides the failure from the parent.
                    // The failed subtree's writes were already reverted by
                    // the nested call's own snapshot.
                    self.reply(store, block, router, addr.clone(), reply, trace)
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// Rewrite a contract response into the application event stream:
/// the synthesized custom event first, then a `wasm` event aggregating the
/// response attributes (if any), then each contract event under a
/// `wasm-<type>` name. Every event names the emitting contract first.
pub fn build_app_response(
    addr: &Addr,
    custom_event: Event,
    response: ContractResponse,
) -> (AppResponse, Vec<SubMsg>) {
    let ContractResponse {
        messages,
        attributes,
        events,
        data,
    } = response;

    let mut app_events = Vec::with_capacity(2 + events.len());
    app_events.push(custom_event);

    if !attributes.is_empty() {
        let mut wasm_event = Event::new("wasm").add_attribute(CONTRACT_ATTR, addr.as_str());
        wasm_event.attributes.extend(attributes);
        app_events.push(wasm_event);
    }

    for event in events {
        let mut rewritten =
            Event::new(format!("wasm-{}", event.ty)).add_attribute(CONTRACT_ATTR, addr.as_str());
        rewritten.attributes.extend(event.attributes);
        app_events.push(rewritten);
    }

    (
        AppResponse {
            events: app_events,
            data,
        },
        messages,
    )
}

/// Raw storage read with the exact error wording callers depend on.
pub(crate) fn query_raw(store: &ChainStore, addr: &Addr, key: &[u8]) -> Result<Binary, CoreError> {
    let storage = store
        .contract_storage(addr)
        .ok_or_else(|| CoreError::ContractNotFound(addr.clone()))?;
    match storage.get(key) {
        Some(value) => Ok(Binary::from(value.as_slice())),
        None => Err(CoreError::KeyNotFound(
            String::from_utf8_lossy(key).into_owned(),
        )),
    }
}

pub(crate) fn query_contract_info(store: &ChainStore, addr: &Addr) -> Result<Binary, CoreError> {
    let info = store
        .contract_info(addr)
        .ok_or_else(|| CoreError::ContractNotFound(addr.clone()))?;
    let response = ContractInfoResponse {
        code_id: info.code_id,
        creator: info.creator.to_string(),
        admin: info.admin.as_ref().map(|a| a.to_string()),
        ibc_port: None,
        // VMs stay pinned for the process lifetime
        pinned: true,
    };
    Ok(Binary::from(serde_json::to_vec(&response)?))
}

fn trace_result(result: &Result<AppResponse, CoreError>) -> ContractResult<AppResponse> {
    match result {
        Ok(response) => ContractResult::Ok(response.clone()),
        Err(err) => ContractResult::Err(err.to_string()),
    }
}
