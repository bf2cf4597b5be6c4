//! Contract, funding request and persisted schedule rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{ContractStatus, InstallmentStatus};
use crate::schedule::{AmortizationType, DurationUnit, Installment, PaymentFrequency};
use crate::types::{Money, Rate};

pub type ContractId = Uuid;

/// Collateral or surety attached to a credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantee {
    pub guarantee_type: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingRequestStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
}

/// Upstream approved credit application a contract is issued from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequest {
    pub id: String,
    pub client_id: String,
    pub portfolio_id: String,
    pub approved_amount: Money,
    pub duration: u32,
    pub duration_unit: DurationUnit,
    #[serde(default)]
    pub proposed_guarantees: Vec<Guarantee>,
    pub status: FundingRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<ContractId>,
}

/// Terms chosen when issuing a contract from a funding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContractParams {
    pub funding_request_id: String,
    /// Annual rate as a percentage.
    pub interest_rate: Rate,
    /// Nominal/effective label, stored as given.
    pub interest_type: String,
    pub payment_frequency: PaymentFrequency,
    pub amortization_type: AmortizationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_payment: Option<Money>,
    pub start_date: NaiveDate,
    /// Derived from the funding request duration when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Replaces the funding request's proposed guarantees when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantees: Option<Vec<Guarantee>>,
}

/// An issued credit contract.
///
/// `status` is private: it only changes through the lifecycle manager's
/// transition guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub contract_number: String,
    pub funding_request_id: String,
    pub client_id: String,
    pub portfolio_id: String,

    pub principal_amount: Money,
    pub interest_rate: Rate,
    pub interest_type: String,
    pub term: u32,
    pub term_unit: DurationUnit,

    pub payment_frequency: PaymentFrequency,
    pub amortization_type: AmortizationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balloon_payment: Option<Money>,

    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub guarantees: Vec<Guarantee>,

    status: ContractStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restructured_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub litigation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub litigation_date: Option<DateTime<Utc>>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn status(&self) -> ContractStatus {
        self.status
    }

    pub(crate) fn new_draft(
        id: ContractId,
        contract_number: String,
        request: &FundingRequest,
        params: &CreateContractParams,
        end_date: NaiveDate,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            contract_number,
            funding_request_id: request.id.clone(),
            client_id: request.client_id.clone(),
            portfolio_id: request.portfolio_id.clone(),
            principal_amount: request.approved_amount,
            interest_rate: params.interest_rate,
            interest_type: params.interest_type.clone(),
            term: request.duration,
            term_unit: request.duration_unit,
            payment_frequency: params.payment_frequency,
            amortization_type: params.amortization_type,
            grace_period: params.grace_period,
            balloon_payment: params.balloon_payment,
            start_date: params.start_date,
            end_date,
            guarantees: params
                .guarantees
                .clone()
                .unwrap_or_else(|| request.proposed_guarantees.clone()),
            status: ContractStatus::Draft,
            suspension_reason: None,
            suspension_date: None,
            restructured_date: None,
            litigation_reason: None,
            litigation_date: None,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn set_status(&mut self, status: ContractStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

/// One persisted installment of a contract's repayment plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: Uuid,
    pub contract_id: ContractId,
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub total_amount: Money,
    /// Amount still owed on this installment.
    pub remaining_amount: Money,
    pub status: InstallmentStatus,
}

impl ScheduleItem {
    pub fn pending(contract_id: ContractId, installment: &Installment) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            installment_number: installment.installment_number,
            due_date: installment.due_date,
            principal_amount: installment.principal_amount,
            interest_amount: installment.interest_amount,
            total_amount: installment.total_amount,
            remaining_amount: installment.total_amount,
            status: InstallmentStatus::Pending,
        }
    }
}

/// Contract query; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_id: Option<String>,
}

impl ContractFilter {
    pub fn matches(&self, contract: &Contract) -> bool {
        self.status.map_or(true, |s| s == contract.status())
            && self
                .client_id
                .as_deref()
                .map_or(true, |c| c == contract.client_id)
            && self
                .portfolio_id
                .as_deref()
                .map_or(true, |p| p == contract.portfolio_id)
    }
}
