//! Chain state with O(1) snapshots.
//!
//! `ChainStore` is one persistent value: cloning it *is* taking a snapshot,
//! and assigning a clone back *is* the revert. The interior maps are
//! `Arc`-shared and mutated copy-on-write, so a snapshot never aliases later
//! mutations and cloning at every call frame stays cheap.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use wasmsim_types::{Addr, Binary, Coin};
use wasmsim_vm::VmStorage;

/// Stored contract code and who uploaded it. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeInfo {
    pub creator: Addr,
    pub wasm_code: Binary,
}

/// Metadata for one contract instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractInfo {
    pub code_id: u64,
    pub creator: Addr,
    pub admin: Option<Addr>,
    pub label: String,
    /// Block height at registration.
    pub created: u64,
}

/// The root chain value.
///
/// The id counters live inside the snapshotted value on purpose: reverting a
/// snapshot restores them, so a failed instantiate can never leak an
/// instance id, even when the failure happens in a nested call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainStore {
    codes: Arc<BTreeMap<u64, CodeInfo>>,
    contracts: Arc<BTreeMap<Addr, ContractInfo>>,
    #[serde(serialize_with = "serialize_contract_storage")]
    contract_storage: Arc<BTreeMap<Addr, VmStorage>>,
    balances: Arc<BTreeMap<Addr, BTreeMap<String, u128>>>,
    last_code_id: u64,
    last_instance_id: u64,
}

impl ChainStore {
    // --- codes ---

    /// Store code under the next id and return it. Ids are assigned by a
    /// strictly monotonic counter starting at 1.
    pub fn save_code(&mut self, creator: Addr, wasm_code: Binary) -> u64 {
        let code_id = self.last_code_id + 1;
        Arc::make_mut(&mut self.codes).insert(code_id, CodeInfo { creator, wasm_code });
        self.last_code_id = code_id;
        code_id
    }

    pub fn code_info(&self, code_id: u64) -> Option<&CodeInfo> {
        self.codes.get(&code_id)
    }

    pub fn last_code_id(&self) -> u64 {
        self.last_code_id
    }

    // --- contracts ---

    /// Insert contract metadata together with its empty storage map.
    /// Storage exists iff the contract exists: the two are only ever
    /// inserted as a pair, and a failed registration disappears through
    /// snapshot restore rather than targeted deletion.
    pub fn register_contract(&mut self, addr: Addr, info: ContractInfo) {
        Arc::make_mut(&mut self.contracts).insert(addr.clone(), info);
        Arc::make_mut(&mut self.contract_storage).insert(addr, VmStorage::default());
    }

    pub fn contract_info(&self, addr: &Addr) -> Option<&ContractInfo> {
        self.contracts.get(addr)
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }

    pub fn contract_storage(&self, addr: &Addr) -> Option<VmStorage> {
        self.contract_storage.get(addr).cloned()
    }

    pub fn set_contract_storage(&mut self, addr: &Addr, storage: VmStorage) {
        Arc::make_mut(&mut self.contract_storage).insert(addr.clone(), storage);
    }

    // --- instance ids ---

    pub fn last_instance_id(&self) -> u64 {
        self.last_instance_id
    }

    /// Advance the instance counter and return the newly allocated id.
    pub fn bump_instance_id(&mut self) -> u64 {
        self.last_instance_id += 1;
        self.last_instance_id
    }

    // --- balances ---

    pub fn balance_of(&self, addr: &Addr, denom: &str) -> u128 {
        self.balances
            .get(addr)
            .and_then(|denoms| denoms.get(denom))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_denom_balance(&mut self, addr: &Addr, denom: &str, amount: u128) {
        let balances = Arc::make_mut(&mut self.balances);
        if amount == 0 {
            if let Some(denoms) = balances.get_mut(addr) {
                denoms.remove(denom);
                if denoms.is_empty() {
                    balances.remove(addr);
                }
            }
        } else {
            balances
                .entry(addr.clone())
                .or_default()
                .insert(denom.to_string(), amount);
        }
    }

    /// Replace an account's whole balance. Host-level fixture API.
    pub fn set_balance(&mut self, addr: &Addr, coins: Vec<Coin>) {
        let balances = Arc::make_mut(&mut self.balances);
        balances.remove(addr);
        let denoms: BTreeMap<String, u128> = coins
            .into_iter()
            .filter(|c| c.amount > 0)
            .map(|c| (c.denom, c.amount))
            .collect();
        if !denoms.is_empty() {
            balances.insert(addr.clone(), denoms);
        }
    }
}

fn serialize_contract_storage<S: Serializer>(
    map: &Arc<BTreeMap<Addr, VmStorage>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut outer = serializer.serialize_map(Some(map.len()))?;
    for (addr, storage) in map.iter() {
        let encoded: BTreeMap<String, String> = storage
            .iter()
            .map(|(k, v)| (STANDARD.encode(k), STANDARD.encode(v)))
            .collect();
        outer.serialize_entry(addr, &encoded)?;
    }
    outer.end()
}
