//! In-process store implementing every lifecycle collaborator.
//!
//! Transactions snapshot the whole state and restore it when the unit of
//! work fails, so this store assumes a single writer at a time.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::model::{
    Contract, ContractFilter, ContractId, FundingRequest, FundingRequestStatus, ScheduleItem,
};
use super::ports::{ContractStore, FundingRequestStore, ScheduleStore, UnitOfWork};
use super::status::InstallmentStatus;
use crate::error::ContractError;
use crate::ContractResult;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    funding_requests: BTreeMap<String, FundingRequest>,
    contracts: BTreeMap<ContractId, Contract>,
    schedule_items: Vec<ScheduleItem>,
}

#[derive(Debug, Default)]
pub struct InMemoryLendingStore {
    state: RwLock<MemoryState>,
}

impl InMemoryLendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a funding request.
    pub fn put_funding_request(&self, request: FundingRequest) -> ContractResult<()> {
        self.write()?
            .funding_requests
            .insert(request.id.clone(), request);
        Ok(())
    }

    /// Set the status of a single installment, e.g. when a payment settles it.
    pub fn set_installment_status(
        &self,
        contract_id: ContractId,
        installment_number: u32,
        status: InstallmentStatus,
    ) -> ContractResult<()> {
        let mut state = self.write()?;
        let item = state
            .schedule_items
            .iter_mut()
            .find(|i| i.contract_id == contract_id && i.installment_number == installment_number)
            .ok_or_else(|| {
                ContractError::not_found(
                    "installment",
                    format!("{contract_id}#{installment_number}"),
                )
            })?;
        item.status = status;
        if status == InstallmentStatus::Paid {
            item.remaining_amount = rust_decimal::Decimal::ZERO;
        }
        Ok(())
    }

    fn read(&self) -> ContractResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| ContractError::Storage("in-memory store lock poisoned".into()))
    }

    fn write(&self) -> ContractResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| ContractError::Storage("in-memory store lock poisoned".into()))
    }
}

impl FundingRequestStore for InMemoryLendingStore {
    fn find_funding_request(&self, id: &str) -> ContractResult<Option<FundingRequest>> {
        Ok(self.read()?.funding_requests.get(id).cloned())
    }

    fn mark_disbursed(&self, id: &str, contract_id: ContractId) -> ContractResult<()> {
        let mut state = self.write()?;
        let request = state
            .funding_requests
            .get_mut(id)
            .ok_or_else(|| ContractError::not_found("funding request", id))?;
        request.status = FundingRequestStatus::Disbursed;
        request.contract_id = Some(contract_id);
        Ok(())
    }
}

impl ContractStore for InMemoryLendingStore {
    fn insert_contract(&self, contract: &Contract) -> ContractResult<()> {
        let mut state = self.write()?;
        if state.contracts.contains_key(&contract.id) {
            return Err(ContractError::Storage(format!(
                "contract {} already exists",
                contract.id
            )));
        }
        state.contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    fn find_contract(&self, id: ContractId) -> ContractResult<Option<Contract>> {
        Ok(self.read()?.contracts.get(&id).cloned())
    }

    fn update_contract(&self, contract: &Contract) -> ContractResult<()> {
        let mut state = self.write()?;
        let slot = state
            .contracts
            .get_mut(&contract.id)
            .ok_or_else(|| ContractError::not_found("contract", contract.id))?;
        *slot = contract.clone();
        Ok(())
    }

    fn contract_number_exists(&self, contract_number: &str) -> ContractResult<bool> {
        Ok(self
            .read()?
            .contracts
            .values()
            .any(|c| c.contract_number == contract_number))
    }

    fn query_contracts(&self, filter: &ContractFilter) -> ContractResult<Vec<Contract>> {
        let mut found: Vec<Contract> = self
            .read()?
            .contracts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.contract_number.cmp(&b.contract_number)));
        Ok(found)
    }
}

impl ScheduleStore for InMemoryLendingStore {
    fn insert_schedule_items(&self, items: &[ScheduleItem]) -> ContractResult<()> {
        self.write()?.schedule_items.extend_from_slice(items);
        Ok(())
    }

    fn find_schedule_items(&self, contract_id: ContractId) -> ContractResult<Vec<ScheduleItem>> {
        Ok(self
            .read()?
            .schedule_items
            .iter()
            .filter(|i| i.contract_id == contract_id)
            .cloned()
            .collect())
    }

    fn update_schedule_status(
        &self,
        contract_id: ContractId,
        from: InstallmentStatus,
        to: InstallmentStatus,
    ) -> ContractResult<u64> {
        let mut state = self.write()?;
        let mut moved = 0;
        for item in state
            .schedule_items
            .iter_mut()
            .filter(|i| i.contract_id == contract_id && i.status == from)
        {
            item.status = to;
            moved += 1;
        }
        Ok(moved)
    }

    fn count_schedule_items(
        &self,
        contract_id: ContractId,
        status: InstallmentStatus,
    ) -> ContractResult<u64> {
        Ok(self
            .read()?
            .schedule_items
            .iter()
            .filter(|i| i.contract_id == contract_id && i.status == status)
            .count() as u64)
    }
}

impl UnitOfWork for InMemoryLendingStore {
    fn atomically<T, F>(&self, work: F) -> ContractResult<T>
    where
        F: FnOnce() -> ContractResult<T>,
    {
        let snapshot = self.read()?.clone();
        match work() {
            Ok(value) => Ok(value),
            Err(e) => {
                *self.write()? = snapshot;
                tracing::debug!(error = %e, "rolled back in-memory unit of work");
                Err(e)
            }
        }
    }
}
