//! The contract VM abstraction the engine drives.

use crate::backend::{Backend, DebugLog, Querier, VmStorage};
use crate::error::VmError;
use wasmsim_types::{Binary, ContractResponse, ContractResult, Env, MessageInfo, Reply};

/// One loaded contract instance.
///
/// The VM's storage is working memory only: the engine seeds it from the
/// chain store before every call and copies it back after, so an instance
/// can be dropped and rebuilt at any time without semantic change.
pub trait ContractVm {
    fn instantiate(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        msg: &[u8],
    ) -> ContractResult<ContractResponse>;

    fn execute(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        msg: &[u8],
    ) -> ContractResult<ContractResponse>;

    fn reply(&mut self, env: &Env, reply: &Reply) -> ContractResult<ContractResponse>;

    fn query(&mut self, env: &Env, msg: &[u8]) -> ContractResult<Binary>;

    /// Replace the instance's working storage.
    fn seed_storage(&mut self, storage: VmStorage);

    /// Read the working storage back out.
    fn storage(&self) -> VmStorage;

    /// Replace the chain querier for the next call.
    fn set_querier(&mut self, querier: Box<dyn Querier>);

    /// Drain debug output accumulated since the last drain.
    fn take_logs(&mut self) -> Vec<DebugLog>;
}

/// Builds VM instances from stored contract code.
pub trait VmLoader {
    fn build(&self, code: &[u8], backend: Backend) -> Result<Box<dyn ContractVm>, VmError>;
}
