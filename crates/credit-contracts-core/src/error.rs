use thiserror::Error;

/// Coarse classification a host service maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Internal,
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Transition from {from} to {to} is not allowed")]
    BadTransition { from: String, to: String },

    #[error("Contract {contract_id} still has {pending} pending installment(s)")]
    IncompleteSchedule { contract_id: String, pending: u64 },

    #[error("Could not allocate a free contract number after {attempts} attempts")]
    NumberAllocation { attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ContractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::NotFound { .. } => ErrorKind::NotFound,
            ContractError::InvalidInput { .. }
            | ContractError::InvalidState(_)
            | ContractError::BadTransition { .. }
            | ContractError::IncompleteSchedule { .. } => ErrorKind::BadRequest,
            ContractError::NumberAllocation { .. }
            | ContractError::Storage(_)
            | ContractError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        ContractError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ContractError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(e: serde_json::Error) -> Self {
        ContractError::SerializationError(e.to_string())
    }
}
