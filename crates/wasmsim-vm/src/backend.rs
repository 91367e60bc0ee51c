//! Backend services wired into every VM instance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use wasmsim_types::{validate_addr, Addr, Binary, QueryRequest, TypesError};

/// Working storage for one VM instance.
///
/// Keys are raw bytes, so iteration order is byte-lexicographic by
/// construction. The map is shared structurally: seeding a VM from the chain
/// store and reading it back are both O(1), and writes copy only when the
/// map is aliased by a snapshot.
pub type VmStorage = Arc<BTreeMap<Vec<u8>, Vec<u8>>>;

/// One debug line emitted by a contract during a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLog {
    pub message: String,
}

impl DebugLog {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Chain queries available to a contract during a call.
///
/// Supplied by the chain; the VM layer treats it as opaque. Errors are plain
/// strings so they can be handed to the contract unmodified.
pub trait Querier {
    fn query_chain(&self, request: &QueryRequest) -> Result<Binary, String>;
}

/// A querier that answers nothing. Used as the placeholder between VM
/// construction and the first call, and by VM-only tests.
pub struct NullQuerier;

impl Querier for NullQuerier {
    fn query_chain(&self, _request: &QueryRequest) -> Result<Binary, String> {
        Err("querier unavailable".to_string())
    }
}

/// Address services exposed to contracts.
#[derive(Debug, Clone)]
pub struct BackendApi {
    prefix: String,
}

impl BackendApi {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn bech32_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn addr_validate(&self, input: &str) -> Result<Addr, TypesError> {
        validate_addr(&self.prefix, input)
    }
}

/// Everything a VM instance needs from the chain: the address api, its
/// seeded storage, and a querier.
pub struct Backend {
    pub api: BackendApi,
    pub storage: VmStorage,
    pub querier: Box<dyn Querier>,
}

impl Backend {
    pub fn new(api: BackendApi) -> Self {
        Self {
            api,
            storage: VmStorage::default(),
            querier: Box::new(NullQuerier),
        }
    }
}
