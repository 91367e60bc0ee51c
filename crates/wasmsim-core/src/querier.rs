//! The chain querier handed to contract backends.

use crate::bank::BankKeeper;
use crate::store::ChainStore;
use crate::wasm::{query_contract_info, query_raw};
use wasmsim_types::{Addr, Binary, QueryRequest, WasmQuery};
use wasmsim_vm::Querier;

/// Answers contract-side queries from a store snapshot taken when the
/// enclosing entry point began.
///
/// Raw reads, contract-info lookups and bank balances are served directly
/// from the snapshot. Smart queries would recurse into the VM host mid-call
/// and are only available on the host-facing query surface.
pub struct StoreQuerier {
    store: ChainStore,
}

impl StoreQuerier {
    pub fn new(store: ChainStore) -> Self {
        Self { store }
    }
}

impl Querier for StoreQuerier {
    fn query_chain(&self, request: &QueryRequest) -> Result<Binary, String> {
        match request {
            QueryRequest::Wasm(WasmQuery::Smart { .. }) => {
                Err("smart queries are not available from contract backends".to_string())
            }
            QueryRequest::Wasm(WasmQuery::Raw { contract_addr, key }) => query_raw(
                &self.store,
                &Addr::unchecked(contract_addr.clone()),
                key.as_slice(),
            )
            .map_err(|e| e.to_string()),
            QueryRequest::Wasm(WasmQuery::ContractInfo { contract_addr }) => {
                query_contract_info(&self.store, &Addr::unchecked(contract_addr.clone()))
                    .map_err(|e| e.to_string())
            }
            QueryRequest::Bank(query) => BankKeeper
                .handle_query(&self.store, query.clone())
                .map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContractInfo;
    use std::sync::Arc;
    use wasmsim_types::{BankQuery, Coin};

    #[test]
    fn test_raw_query_through_querier() {
        let mut store = ChainStore::default();
        let addr = Addr::unchecked("wasm1a");
        store.register_contract(
            addr.clone(),
            ContractInfo {
                code_id: 1,
                creator: Addr::unchecked("creator"),
                admin: None,
                label: String::new(),
                created: 1,
            },
        );
        let mut storage = store.contract_storage(&addr).unwrap();
        Arc::make_mut(&mut storage).insert(b"k".to_vec(), b"v".to_vec());
        store.set_contract_storage(&addr, storage);

        let querier = StoreQuerier::new(store);
        let out = querier
            .query_chain(&QueryRequest::Wasm(WasmQuery::Raw {
                contract_addr: "wasm1a".to_string(),
                key: Binary::new(b"k".to_vec()),
            }))
            .unwrap();
        assert_eq!(out.as_slice(), b"v");
    }

    #[test]
    fn test_smart_query_rejected() {
        let querier = StoreQuerier::new(ChainStore::default());
        let err = querier
            .query_chain(&QueryRequest::Wasm(WasmQuery::Smart {
                contract_addr: "wasm1a".to_string(),
                msg: Binary::default(),
            }))
            .unwrap_err();
        assert!(err.contains("smart queries"));
    }

    #[test]
    fn test_bank_query_through_querier() {
        let mut store = ChainStore::default();
        store.set_balance(&Addr::unchecked("alice"), vec![Coin::new(5, "utoken")]);

        let querier = StoreQuerier::new(store);
        let out = querier
            .query_chain(&QueryRequest::Bank(BankQuery::Balance {
                address: "alice".to_string(),
                denom: "utoken".to_string(),
            }))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(out.as_slice()).unwrap();
        assert_eq!(parsed["amount"]["amount"], 5);
    }
}
