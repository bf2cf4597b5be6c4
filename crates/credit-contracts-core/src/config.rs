//! Engine-wide settings shared by the lifecycle manager and front-ends.

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_ROUNDING_SCALE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal places of the currency minimum unit.
    pub rounding_scale: u32,
    /// Prefix of human-readable contract numbers (`<prefix>-<year>-<nnnn>`).
    pub contract_number_prefix: String,
    /// How many times a colliding contract number is re-drawn before giving up.
    pub contract_number_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rounding_scale: DEFAULT_ROUNDING_SCALE,
            contract_number_prefix: "CNT".to_string(),
            contract_number_attempts: 5,
        }
    }
}
