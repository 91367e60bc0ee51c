//! The public simulator surface.

use crate::bank::BankKeeper;
use crate::error::CoreError;
use crate::router::{CosmosRouter, Router};
use crate::store::ChainStore;
use crate::trace::TraceNode;
use crate::wasm::WasmKeeper;
use wasmsim_types::{
    Addr, AppResponse, Binary, BlockInfo, Coin, CosmosMsg, QueryRequest, WasmQuery,
};
use wasmsim_vm::VmLoader;

/// Default genesis time: an arbitrary fixed instant, in nanoseconds.
const GENESIS_TIME: u64 = 1_600_000_000_000_000_000;

/// Seconds of simulated time added per block by [`App::advance_blocks`].
const BLOCK_TIME_SECS: u64 = 5;

/// One simulated chain: a store, a block clock, and the module table.
///
/// The simulator executes one message at a time; `&mut self` on every
/// mutating call enforces that at the type level.
pub struct App {
    router: Router,
    store: ChainStore,
    block: BlockInfo,
}

impl App {
    pub fn new(
        chain_id: impl Into<String>,
        bech32_prefix: &str,
        loader: Box<dyn VmLoader>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            router: Router {
                wasm: WasmKeeper::new(bech32_prefix, loader)?,
                bank: BankKeeper,
            },
            store: ChainStore::default(),
            block: BlockInfo {
                height: 1,
                time: GENESIS_TIME,
                chain_id: chain_id.into(),
            },
        })
    }

    // --- chain state ---

    pub fn store(&self) -> &ChainStore {
        &self.store
    }

    pub fn block(&self) -> &BlockInfo {
        &self.block
    }

    /// Host-driven clock: advance height and time together.
    pub fn advance_blocks(&mut self, count: u64) {
        self.block.height += count;
        self.block.time += count * BLOCK_TIME_SECS * 1_000_000_000;
    }

    pub fn update_block(&mut self, action: impl FnOnce(&mut BlockInfo)) {
        action(&mut self.block);
    }

    /// Replace an account's balance. Test fixture API, not a chain message.
    pub fn set_balance(&mut self, addr: &Addr, coins: Vec<Coin>) {
        self.store.set_balance(addr, coins);
    }

    pub fn balance(&self, addr: &Addr, denom: &str) -> u128 {
        self.store.balance_of(addr, denom)
    }

    // --- engine surface ---

    /// Upload contract code, returning its id.
    pub fn store_code(&mut self, creator: Addr, code: Binary) -> u64 {
        self.router.wasm.store_code(&mut self.store, creator, code)
    }

    pub fn instantiate_contract(
        &mut self,
        sender: Addr,
        funds: Vec<Coin>,
        code_id: u64,
        msg: &[u8],
    ) -> Result<AppResponse, CoreError> {
        let mut trace = Vec::new();
        self.instantiate_contract_traced(sender, funds, code_id, msg, &mut trace)
    }

    pub fn instantiate_contract_traced(
        &mut self,
        sender: Addr,
        funds: Vec<Coin>,
        code_id: u64,
        msg: &[u8],
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        self.router.wasm.instantiate_contract(
            &mut self.store,
            &self.block,
            &self.router,
            sender,
            funds,
            code_id,
            msg,
            trace,
        )
    }

    pub fn execute_contract(
        &mut self,
        sender: Addr,
        funds: Vec<Coin>,
        contract: &Addr,
        msg: &[u8],
    ) -> Result<AppResponse, CoreError> {
        let mut trace = Vec::new();
        self.execute_contract_traced(sender, funds, contract, msg, &mut trace)
    }

    pub fn execute_contract_traced(
        &mut self,
        sender: Addr,
        funds: Vec<Coin>,
        contract: &Addr,
        msg: &[u8],
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        self.router.wasm.execute_contract(
            &mut self.store,
            &self.block,
            &self.router,
            sender,
            funds,
            contract.clone(),
            msg,
            trace,
        )
    }

    /// Run a contract's query entry point. Stateless.
    pub fn query(&self, contract: &Addr, msg: &[u8]) -> Result<Binary, CoreError> {
        self.router
            .wasm
            .query(&self.store, &self.block, contract, msg)
    }

    /// Router entry for any chain message.
    pub fn handle_msg(&mut self, sender: Addr, msg: CosmosMsg) -> Result<AppResponse, CoreError> {
        let mut trace = Vec::new();
        self.handle_msg_traced(sender, msg, &mut trace)
    }

    pub fn handle_msg_traced(
        &mut self,
        sender: Addr,
        msg: CosmosMsg,
        trace: &mut Vec<TraceNode>,
    ) -> Result<AppResponse, CoreError> {
        self.router
            .execute(&mut self.store, &self.block, trace, sender, msg)
    }

    /// Router entry for wasm queries: smart, raw, or contract-info.
    pub fn handle_query(&self, query: WasmQuery) -> Result<Binary, CoreError> {
        self.router
            .query(&self.store, &self.block, QueryRequest::Wasm(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmsim_vm::ScriptLoader;

    #[test]
    fn test_new_app() {
        let app = App::new("sim-1", "wasm", Box::new(ScriptLoader)).unwrap();
        assert_eq!(app.block().height, 1);
        assert_eq!(app.block().chain_id, "sim-1");
        assert_eq!(app.store().last_code_id(), 0);
    }

    #[test]
    fn test_new_app_rejects_bad_prefix() {
        assert!(App::new("sim-1", "", Box::new(ScriptLoader)).is_err());
    }

    #[test]
    fn test_advance_blocks() {
        let mut app = App::new("sim-1", "wasm", Box::new(ScriptLoader)).unwrap();
        let t0 = app.block().time;
        app.advance_blocks(3);
        assert_eq!(app.block().height, 4);
        assert_eq!(app.block().time, t0 + 15_000_000_000);
    }

    #[test]
    fn test_update_block() {
        let mut app = App::new("sim-1", "wasm", Box::new(ScriptLoader)).unwrap();
        app.update_block(|b| b.height = 42);
        assert_eq!(app.block().height, 42);
    }

    #[test]
    fn test_balance_fixture() {
        let mut app = App::new("sim-1", "wasm", Box::new(ScriptLoader)).unwrap();
        let alice = Addr::unchecked("alice");
        app.set_balance(&alice, vec![Coin::new(10, "utoken")]);
        assert_eq!(app.balance(&alice, "utoken"), 10);
    }
}
