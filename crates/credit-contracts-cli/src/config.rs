//! Engine settings: defaults, then an optional file, then `CCM__*` variables.

use config::{Config, Environment, File};
use credit_contracts_core::EngineConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Build(#[from] config::ConfigError),
}

const ENV_PREFIX: &str = "CCM";

pub fn load(path: Option<&str>) -> Result<EngineConfig, ConfigLoadError> {
    load_with_prefix(path, ENV_PREFIX)
}

fn load_with_prefix(path: Option<&str>, env_prefix: &str) -> Result<EngineConfig, ConfigLoadError> {
    let defaults = EngineConfig::default();
    let mut builder = Config::builder()
        .set_default("rounding_scale", i64::from(defaults.rounding_scale))?
        .set_default("contract_number_prefix", defaults.contract_number_prefix)?
        .set_default(
            "contract_number_attempts",
            i64::from(defaults.contract_number_attempts),
        )?;

    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}
