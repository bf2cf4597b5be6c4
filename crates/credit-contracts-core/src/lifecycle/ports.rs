//! Collaborators the lifecycle manager reads from and writes to.
//!
//! Stores take `&self`; implementations own their synchronization. All
//! writes of one lifecycle operation run inside a single
//! [`UnitOfWork::atomically`] call.

use std::error::Error;

use super::model::{Contract, ContractFilter, ContractId, FundingRequest, ScheduleItem};
use super::status::InstallmentStatus;
use crate::ContractResult;

pub trait FundingRequestStore {
    fn find_funding_request(&self, id: &str) -> ContractResult<Option<FundingRequest>>;

    /// Mark the request DISBURSED and link the contract issued from it.
    fn mark_disbursed(&self, id: &str, contract_id: ContractId) -> ContractResult<()>;
}

pub trait ContractStore {
    fn insert_contract(&self, contract: &Contract) -> ContractResult<()>;

    fn find_contract(&self, id: ContractId) -> ContractResult<Option<Contract>>;

    fn update_contract(&self, contract: &Contract) -> ContractResult<()>;

    fn contract_number_exists(&self, contract_number: &str) -> ContractResult<bool>;

    fn query_contracts(&self, filter: &ContractFilter) -> ContractResult<Vec<Contract>>;
}

pub trait ScheduleStore {
    fn insert_schedule_items(&self, items: &[ScheduleItem]) -> ContractResult<()>;

    fn find_schedule_items(&self, contract_id: ContractId) -> ContractResult<Vec<ScheduleItem>>;

    /// Move every item of `contract_id` in status `from` to `to`; returns how many moved.
    fn update_schedule_status(
        &self,
        contract_id: ContractId,
        from: InstallmentStatus,
        to: InstallmentStatus,
    ) -> ContractResult<u64>;

    fn count_schedule_items(
        &self,
        contract_id: ContractId,
        status: InstallmentStatus,
    ) -> ContractResult<u64>;
}

/// Transaction boundary: either every write made by `work` commits, or none does.
pub trait UnitOfWork {
    fn atomically<T, F>(&self, work: F) -> ContractResult<T>
    where
        F: FnOnce() -> ContractResult<T>;
}

/// Everything the lifecycle manager persists through.
pub trait LendingStore: FundingRequestStore + ContractStore + ScheduleStore + UnitOfWork {}

impl<T> LendingStore for T where T: FundingRequestStore + ContractStore + ScheduleStore + UnitOfWork {}

pub type EventError = Box<dyn Error + Send + Sync>;

/// Fire-and-forget notifications. Failures are logged by the caller and
/// never undo the operation that raised them.
pub trait ContractEventSink: Send + Sync {
    fn contract_created(&self, contract: &Contract) -> Result<(), EventError>;
}

/// Publishes events to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl ContractEventSink for TracingEventSink {
    fn contract_created(&self, contract: &Contract) -> Result<(), EventError> {
        tracing::info!(
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            client_id = %contract.client_id,
            principal = %contract.principal_amount,
            "contract created"
        );
        Ok(())
    }
}
