use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value;

use credit_contracts_core::schedule::report::{
    self, RecalculationInput, TermConversionInput,
};
use credit_contracts_core::schedule::ScheduleParams;
use credit_contracts_core::EngineConfig;

use super::parse_flag;
use crate::input;

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON/YAML schedule parameters (overrides the flags below)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (12 = 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of installments, grace period included
    #[arg(long)]
    pub term: Option<u32>,

    /// Anchor date; installment 1 falls due one period later (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Payment frequency: monthly, quarterly, biannual, annual
    #[arg(long, default_value = "monthly")]
    pub frequency: String,

    /// Amortization: constant, degressive, balloon, bullet
    #[arg(long, default_value = "constant")]
    pub amortization: String,

    /// Leading interest-only installments
    #[arg(long)]
    pub grace: Option<u32>,

    /// Lump sum due with the last installment (balloon only)
    #[arg(long)]
    pub balloon: Option<Decimal>,
}

/// Arguments for partial-payment recalculation
#[derive(Args)]
pub struct RecalculateArgs {
    /// Path to JSON/YAML recalculation input
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for term conversion
#[derive(Args)]
pub struct TermArgs {
    /// Duration as approved on the funding request
    #[arg(long)]
    pub duration: u32,

    /// Duration unit: days, weeks, months, years
    #[arg(long, default_value = "months")]
    pub unit: String,

    /// Payment frequency: monthly, quarterly, biannual, annual
    #[arg(long, default_value = "monthly")]
    pub frequency: String,

    /// Start date, to also derive the maturity date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

impl ScheduleArgs {
    /// Terms from the command-line flags; `None` when no term flag is given.
    fn flag_params(&self, engine: &EngineConfig) -> Result<Option<ScheduleParams>, Box<dyn std::error::Error>> {
        let required = [
            ("--principal", self.principal.is_some()),
            ("--rate", self.rate.is_some()),
            ("--term", self.term.is_some()),
            ("--start-date", self.start_date.is_some()),
        ];
        let any_set = required.iter().any(|(_, set)| *set)
            || self.grace.is_some()
            || self.balloon.is_some();
        if !any_set {
            return Ok(None);
        }

        match (self.principal, self.rate, self.term, self.start_date) {
            (Some(principal), Some(rate), Some(term), Some(start_date)) => Ok(Some(ScheduleParams {
                principal,
                annual_rate: rate,
                term,
                start_date,
                frequency: parse_flag("frequency", &self.frequency)?,
                amortization_type: parse_flag("amortization", &self.amortization)?,
                grace_period: self.grace,
                balloon_payment: self.balloon,
                rounding_scale: engine.rounding_scale,
            })),
            _ => {
                let missing: Vec<&str> = required
                    .iter()
                    .filter(|(_, set)| !*set)
                    .map(|(flag, _)| *flag)
                    .collect();
                Err(format!("incomplete schedule flags, missing {}", missing.join(", ")).into())
            }
        }
    }
}

pub fn run_schedule(
    args: ScheduleArgs,
    engine: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ScheduleParams = match args.input {
        Some(ref path) => load_scaled(Some(path), "schedule generation", None, engine)?,
        None => match args.flag_params(engine)? {
            Some(params) => params,
            None => load_scaled(
                None,
                "schedule generation (or --principal, --rate, --term and --start-date)",
                None,
                engine,
            )?,
        },
    };
    let result = report::build_schedule(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_recalculate(
    args: RecalculateArgs,
    engine: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let recalc_input: RecalculationInput = load_scaled(
        args.input.as_deref(),
        "partial-payment recalculation",
        Some("params"),
        engine,
    )?;
    let result = report::build_recalculation(&recalc_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Load a document, taking `rounding_scale` from the engine settings when
/// the schedule terms (at `terms_key`, or the root) leave it out.
fn load_scaled<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
    terms_key: Option<&str>,
    engine: &EngineConfig,
) -> Result<T, Box<dyn std::error::Error>> {
    let mut doc: Value = input::load(path, what)?;
    apply_rounding_scale(&mut doc, terms_key, engine.rounding_scale);
    Ok(serde_json::from_value(doc)?)
}

fn apply_rounding_scale(doc: &mut Value, terms_key: Option<&str>, scale: u32) {
    let terms = match terms_key {
        Some(key) => doc.get_mut(key),
        None => Some(doc),
    };
    if let Some(Value::Object(terms)) = terms {
        terms
            .entry("rounding_scale")
            .or_insert_with(|| Value::from(scale));
    }
}

pub fn run_term(args: TermArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let term_input = TermConversionInput {
        duration: args.duration,
        duration_unit: parse_flag("unit", &args.unit)?,
        frequency: parse_flag("frequency", &args.frequency)?,
        start_date: args.start_date,
    };
    let result = report::build_term_conversion(&term_input)?;
    Ok(serde_json::to_value(result)?)
}
