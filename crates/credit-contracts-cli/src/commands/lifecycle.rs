use std::collections::HashMap;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use credit_contracts_core::lifecycle::{
    Contract, ContractFilter, ContractId, ContractStatus, CreateContractParams, FundingRequest,
    InMemoryLendingStore, InstallmentStatus, LifecycleManager, ScheduleItem,
    SequentialContractNumbers, StatusChange,
};
use credit_contracts_core::{ContractError, ContractResult, EngineConfig};

use crate::input;

/// Arguments for the transition table
#[derive(Args)]
pub struct TransitionsArgs {
    /// Only show transitions out of this status (e.g. ACTIVE)
    #[arg(long)]
    pub from: Option<String>,
}

/// Arguments for lifecycle scenario replay
#[derive(Args)]
pub struct LifecycleArgs {
    /// Path to JSON/YAML scenario: funding requests plus ordered steps
    #[arg(long)]
    pub input: Option<String>,

    /// Number contracts sequentially from this value instead of randomly
    #[arg(long)]
    pub first_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    funding_requests: Vec<FundingRequest>,
    steps: Vec<Step>,
}

/// One replayed operation. `key` names a contract created by an earlier
/// `create` step.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Create {
        key: String,
        params: CreateContractParams,
        #[serde(default = "default_actor")]
        actor: String,
    },
    ChangeStatus {
        key: String,
        change: StatusChange,
    },
    /// Mark installments paid; all pending ones when `installments` is absent.
    Settle {
        key: String,
        #[serde(default)]
        installments: Option<Vec<u32>>,
    },
}

fn default_actor() -> String {
    "ccm".to_string()
}

#[derive(Debug, Serialize)]
struct StepOutcome {
    step: usize,
    op: &'static str,
    key: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ContractStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContractState {
    key: String,
    contract: Contract,
    schedule: Vec<ScheduleItem>,
}

pub fn run_transitions(args: TransitionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sources: Vec<ContractStatus> = match args.from {
        Some(ref from) => vec![from.parse::<ContractStatus>()?],
        None => ContractStatus::ALL.to_vec(),
    };
    let rows: Vec<Value> = sources
        .into_iter()
        .map(|from| {
            json!({
                "from": from,
                "allowed": from
                    .allowed_targets()
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                "terminal": from.is_terminal(),
            })
        })
        .collect();
    Ok(json!({ "result": { "transitions": rows } }))
}

pub fn run_lifecycle(
    args: LifecycleArgs,
    engine: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario: Scenario = input::load(args.input.as_deref(), "lifecycle scenario")?;

    let store = InMemoryLendingStore::new();
    for request in scenario.funding_requests {
        store.put_funding_request(request)?;
    }
    let mut manager = LifecycleManager::new(store, engine.clone());
    if let Some(first) = args.first_number {
        manager = manager.with_numbers(SequentialContractNumbers::new(
            engine.contract_number_prefix.clone(),
            first,
        ));
    }

    let mut keys: HashMap<String, ContractId> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut outcomes = Vec::with_capacity(scenario.steps.len());

    for (i, step) in scenario.steps.into_iter().enumerate() {
        let (op, key, result) = match step {
            Step::Create { key, params, actor } => {
                let result = manager
                    .create_from_funding_request(&params, &actor)
                    .map(|contract| {
                        if keys.insert(key.clone(), contract.id).is_none() {
                            order.push(key.clone());
                        }
                        contract.status()
                    });
                ("create", key, result)
            }
            Step::ChangeStatus { key, change } => {
                let result = lookup(&keys, &key)
                    .and_then(|id| manager.change_status(id, change))
                    .map(|contract| contract.status());
                ("change_status", key, result)
            }
            Step::Settle { key, installments } => {
                let result = lookup(&keys, &key)
                    .and_then(|id| settle(&manager, id, installments.as_deref()));
                ("settle", key, result)
            }
        };

        let outcome = match result {
            Ok(status) => StepOutcome {
                step: i + 1,
                op,
                key,
                ok: true,
                status: Some(status),
                error: None,
            },
            Err(e) => {
                tracing::warn!(step = i + 1, op, error = %e, "Scenario step failed");
                StepOutcome {
                    step: i + 1,
                    op,
                    key,
                    ok: false,
                    status: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let mut contracts = Vec::with_capacity(order.len());
    for key in order {
        let id = keys[&key];
        contracts.push(ContractState {
            key,
            contract: manager.get_contract(id)?,
            schedule: manager.get_schedule(id)?,
        });
    }
    let active = manager
        .list_contracts(&ContractFilter {
            status: Some(ContractStatus::Active),
            ..ContractFilter::default()
        })?
        .len();

    Ok(json!({
        "result": {
            "steps": outcomes,
            "contracts": contracts,
            "active_contracts": active,
        }
    }))
}

fn lookup(keys: &HashMap<String, ContractId>, key: &str) -> ContractResult<ContractId> {
    keys.get(key)
        .copied()
        .ok_or_else(|| ContractError::NotFound {
            entity: "scenario contract".into(),
            id: key.to_string(),
        })
}

fn settle(
    manager: &LifecycleManager<InMemoryLendingStore>,
    id: ContractId,
    installments: Option<&[u32]>,
) -> ContractResult<ContractStatus> {
    let numbers: Vec<u32> = match installments {
        Some(numbers) => numbers.to_vec(),
        None => manager
            .get_schedule(id)?
            .into_iter()
            .filter(|item| item.status == InstallmentStatus::Pending)
            .map(|item| item.installment_number)
            .collect(),
    };
    for n in numbers {
        manager
            .store()
            .set_installment_status(id, n, InstallmentStatus::Paid)?;
    }
    Ok(manager.get_contract(id)?.status())
}
