//! Contract issuance and status changes.

use chrono::Datelike;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::model::{
    Contract, ContractFilter, ContractId, CreateContractParams, FundingRequest,
    FundingRequestStatus, ScheduleItem,
};
use super::numbering::{ContractNumberAllocator, RandomContractNumbers};
use super::ports::{ContractEventSink, LendingStore, TracingEventSink};
use super::status::{validate_transition, InstallmentStatus, StatusChange};
use crate::config::EngineConfig;
use crate::error::ContractError;
use crate::schedule::{convert_term, derive_end_date, generate_schedule, Installment, ScheduleParams};
use crate::ContractResult;

/// Owns the contract state machine and its persistence side effects.
pub struct LifecycleManager<S> {
    store: S,
    numbers: Box<dyn ContractNumberAllocator>,
    events: Box<dyn ContractEventSink>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

impl<S: LendingStore> LifecycleManager<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            numbers: Box::new(RandomContractNumbers::new(config.contract_number_prefix.clone())),
            events: Box::new(TracingEventSink),
            clock: Box::new(SystemClock),
            config,
        }
    }

    pub fn with_numbers(mut self, numbers: impl ContractNumberAllocator + 'static) -> Self {
        self.numbers = Box::new(numbers);
        self
    }

    pub fn with_events(mut self, events: impl ContractEventSink + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Issuance
    // -----------------------------------------------------------------------

    /// Issue a DRAFT contract and its initial schedule from an approved
    /// funding request, then mark the request DISBURSED.
    ///
    /// Contract, schedule and funding-request writes commit together. The
    /// contract-created notification is sent afterwards and its failure is
    /// only logged.
    pub fn create_from_funding_request(
        &self,
        params: &CreateContractParams,
        actor: &str,
    ) -> ContractResult<Contract> {
        let request = self
            .store
            .find_funding_request(&params.funding_request_id)?
            .ok_or_else(|| ContractError::not_found("funding request", &params.funding_request_id))?;

        if request.status != FundingRequestStatus::Approved {
            return Err(ContractError::InvalidState(format!(
                "funding request {} is {:?}, expected APPROVED",
                request.id, request.status
            )));
        }
        if params.interest_rate < Decimal::ZERO {
            return Err(ContractError::invalid(
                "interest_rate",
                "Interest rate must not be negative",
            ));
        }

        let now = self.clock.now();
        let contract_number = self.allocate_contract_number(now.year())?;
        let end_date = match params.end_date {
            Some(end) => end,
            None => derive_end_date(params.start_date, request.duration, request.duration_unit)?,
        };

        let contract = Contract::new_draft(
            Uuid::new_v4(),
            contract_number,
            &request,
            params,
            end_date,
            actor,
            now,
        );
        let installments = self.initial_schedule(&request, &contract)?;
        let items: Vec<ScheduleItem> = installments
            .iter()
            .map(|i| ScheduleItem::pending(contract.id, i))
            .collect();

        self.store.atomically(|| {
            self.store.insert_contract(&contract)?;
            self.store.insert_schedule_items(&items)?;
            self.store.mark_disbursed(&request.id, contract.id)
        })?;

        tracing::info!(
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            funding_request_id = %request.id,
            installments = items.len(),
            actor,
            "issued contract from funding request"
        );

        if let Err(e) = self.events.contract_created(&contract) {
            tracing::warn!(
                contract_id = %contract.id,
                error = %e,
                "contract-created notification failed"
            );
        }

        Ok(contract)
    }

    fn initial_schedule(
        &self,
        request: &FundingRequest,
        contract: &Contract,
    ) -> ContractResult<Vec<Installment>> {
        let term = convert_term(
            request.duration,
            request.duration_unit,
            contract.payment_frequency,
        )?;
        generate_schedule(&ScheduleParams {
            principal: contract.principal_amount,
            annual_rate: contract.interest_rate,
            term,
            start_date: contract.start_date,
            frequency: contract.payment_frequency,
            amortization_type: contract.amortization_type,
            grace_period: contract.grace_period,
            balloon_payment: contract.balloon_payment,
            rounding_scale: self.config.rounding_scale,
        })
    }

    fn allocate_contract_number(&self, year: i32) -> ContractResult<String> {
        let attempts = self.config.contract_number_attempts.max(1);
        for attempt in 1..=attempts {
            let candidate = self.numbers.next_number(year);
            if !self.store.contract_number_exists(&candidate)? {
                return Ok(candidate);
            }
            tracing::warn!(%candidate, attempt, "contract number already taken, drawing again");
        }
        Err(ContractError::NumberAllocation { attempts })
    }

    // -----------------------------------------------------------------------
    // Status changes
    // -----------------------------------------------------------------------

    /// Move a contract to the status named by `change`, applying that
    /// status's side effects. The contract is unchanged on any error.
    pub fn change_status(&self, contract_id: ContractId, change: StatusChange) -> ContractResult<Contract> {
        let mut contract = self.get_contract(contract_id)?;
        let from = contract.status();
        let to = change.target();
        validate_transition(from, to)?;

        let now = self.clock.now();
        let contract = self.store.atomically(|| {
            match change {
                StatusChange::Suspended { reason } => {
                    contract.suspension_reason = Some(reason);
                    contract.suspension_date = Some(now);
                }
                StatusChange::Restructured => {
                    contract.restructured_date = Some(now);
                }
                StatusChange::Litigation { reason } => {
                    contract.litigation_reason = Some(reason);
                    contract.litigation_date = Some(now);
                }
                StatusChange::Defaulted => {
                    let moved = self.store.update_schedule_status(
                        contract_id,
                        InstallmentStatus::Pending,
                        InstallmentStatus::Defaulted,
                    )?;
                    tracing::debug!(%contract_id, moved, "pending installments marked defaulted");
                }
                StatusChange::Completed => {
                    let pending = self
                        .store
                        .count_schedule_items(contract_id, InstallmentStatus::Pending)?;
                    if pending > 0 {
                        return Err(ContractError::IncompleteSchedule {
                            contract_id: contract_id.to_string(),
                            pending,
                        });
                    }
                }
                StatusChange::Active | StatusChange::Canceled => {}
            }

            contract.set_status(to, now);
            self.store.update_contract(&contract)?;
            Ok(contract)
        })?;

        tracing::info!(%contract_id, %from, %to, "contract status changed");
        Ok(contract)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn get_contract(&self, contract_id: ContractId) -> ContractResult<Contract> {
        self.store
            .find_contract(contract_id)?
            .ok_or_else(|| ContractError::not_found("contract", contract_id))
    }

    /// Schedule items ordered by installment number.
    pub fn get_schedule(&self, contract_id: ContractId) -> ContractResult<Vec<ScheduleItem>> {
        self.get_contract(contract_id)?;
        let mut items = self.store.find_schedule_items(contract_id)?;
        items.sort_by_key(|i| i.installment_number);
        Ok(items)
    }

    pub fn list_contracts(&self, filter: &ContractFilter) -> ContractResult<Vec<Contract>> {
        self.store.query_contracts(filter)
    }
}
