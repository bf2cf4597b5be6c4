//! Contract status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ContractError;
use crate::ContractResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    Active,
    Suspended,
    Restructured,
    Litigation,
    Defaulted,
    Completed,
    Canceled,
}

use ContractStatus::*;

/// Allowed transitions, source → targets. Completed and Canceled are terminal.
static TRANSITIONS: [(ContractStatus, &[ContractStatus]); 8] = [
    (Draft, &[Active, Canceled]),
    (Active, &[Suspended, Defaulted, Restructured, Litigation, Completed]),
    (Suspended, &[Active, Defaulted, Restructured, Litigation]),
    (Restructured, &[Active, Defaulted, Litigation, Completed]),
    (Litigation, &[Active, Defaulted, Completed]),
    (Defaulted, &[Active, Restructured, Litigation, Completed]),
    (Completed, &[]),
    (Canceled, &[]),
];

impl ContractStatus {
    pub const ALL: [ContractStatus; 8] = [
        Draft,
        Active,
        Suspended,
        Restructured,
        Litigation,
        Defaulted,
        Completed,
        Canceled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Draft => "DRAFT",
            Active => "ACTIVE",
            Suspended => "SUSPENDED",
            Restructured => "RESTRUCTURED",
            Litigation => "LITIGATION",
            Defaulted => "DEFAULTED",
            Completed => "COMPLETED",
            Canceled => "CANCELED",
        }
    }

    pub fn allowed_targets(self) -> &'static [ContractStatus] {
        TRANSITIONS
            .iter()
            .find(|(source, _)| *source == self)
            .map(|(_, targets)| *targets)
            .unwrap_or(&[])
    }

    pub fn can_transition_to(self, target: ContractStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ContractError::invalid("status", format!("Unknown contract status '{s}'")))
    }
}

/// Fails with `BadTransition` unless `from → to` is in the transition table.
pub fn validate_transition(from: ContractStatus, to: ContractStatus) -> ContractResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ContractError::BadTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// A requested status change, keyed by target status and carrying only
/// what that target needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusChange {
    Active,
    Suspended { reason: String },
    Restructured,
    Litigation { reason: String },
    Defaulted,
    Completed,
    Canceled,
}

impl StatusChange {
    pub fn target(&self) -> ContractStatus {
        match self {
            StatusChange::Active => Active,
            StatusChange::Suspended { .. } => Suspended,
            StatusChange::Restructured => Restructured,
            StatusChange::Litigation { .. } => Litigation,
            StatusChange::Defaulted => Defaulted,
            StatusChange::Completed => Completed,
            StatusChange::Canceled => Canceled,
        }
    }
}

/// Settlement state of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Defaulted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(Completed.is_terminal());
        assert!(Canceled.is_terminal());
        for status in [Draft, Active, Suspended, Restructured, Litigation, Defaulted] {
            assert!(!status.is_terminal(), "{status} should not be terminal");
        }
    }

    #[test]
    fn test_table_covers_every_state_once() {
        for status in ContractStatus::ALL {
            let rows = TRANSITIONS.iter().filter(|(s, _)| *s == status).count();
            assert_eq!(rows, 1, "{status}");
        }
    }

    #[test]
    fn test_no_transition_back_to_draft_or_self() {
        for status in ContractStatus::ALL {
            assert!(!status.can_transition_to(Draft));
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_validate_transition_error_names_states() {
        match validate_transition(Draft, Completed).unwrap_err() {
            ContractError::BadTransition { from, to } => {
                assert_eq!(from, "DRAFT");
                assert_eq!(to, "COMPLETED");
            }
            other => panic!("Expected BadTransition, got {:?}", other),
        }
        assert!(validate_transition(Draft, Active).is_ok());
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for status in ContractStatus::ALL {
            assert_eq!(status.to_string().parse::<ContractStatus>().unwrap(), status);
        }
        assert_eq!("suspended".parse::<ContractStatus>().unwrap(), Suspended);
        assert!("CLOSED".parse::<ContractStatus>().is_err());
    }

    #[test]
    fn test_status_change_tagged_json() {
        let change: StatusChange =
            serde_json::from_str(r#"{"status":"SUSPENDED","reason":"missed payments"}"#).unwrap();
        assert_eq!(
            change,
            StatusChange::Suspended {
                reason: "missed payments".into()
            }
        );
        assert_eq!(change.target(), Suspended);

        let change: StatusChange = serde_json::from_str(r#"{"status":"DEFAULTED"}"#).unwrap();
        assert_eq!(change.target(), Defaulted);

        assert!(serde_json::from_str::<StatusChange>(r#"{"status":"LITIGATION"}"#).is_err());
    }
}
