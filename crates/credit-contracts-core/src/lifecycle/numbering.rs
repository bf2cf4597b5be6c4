//! Human-readable contract numbers: `<prefix>-<year>-<nnnn>`.

use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};

const SUFFIX_SPACE: u32 = 10_000;

/// Source of candidate contract numbers. Uniqueness is checked by the
/// lifecycle manager, which asks again on collision.
pub trait ContractNumberAllocator: Send + Sync {
    fn next_number(&self, year: i32) -> String;
}

fn format_number(prefix: &str, year: i32, suffix: u32) -> String {
    format!("{prefix}-{year}-{suffix:04}")
}

/// Random four-digit suffix.
#[derive(Debug, Clone)]
pub struct RandomContractNumbers {
    prefix: String,
}

impl RandomContractNumbers {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ContractNumberAllocator for RandomContractNumbers {
    fn next_number(&self, year: i32) -> String {
        let suffix = rand::thread_rng().gen_range(0..SUFFIX_SPACE);
        format_number(&self.prefix, year, suffix)
    }
}

/// Deterministic counter, wrapping after 9999.
#[derive(Debug)]
pub struct SequentialContractNumbers {
    prefix: String,
    next: AtomicU32,
}

impl SequentialContractNumbers {
    pub fn new(prefix: impl Into<String>, first: u32) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU32::new(first),
        }
    }
}

impl ContractNumberAllocator for SequentialContractNumbers {
    fn next_number(&self, year: i32) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) % SUFFIX_SPACE;
        format_number(&self.prefix, year, n)
    }
}
