//! File-based (TOML) configuration, read from `<root_dir>/config.toml`.

use crate::util;
use std::fs;

use super::{Deserialize, LogFormat, LogLevel};

#[derive(Debug, thiserror::Error)]
pub enum TomlConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    #[serde(default)]
    pub core: CoreConfig,
}

// TOML integers are i64, so vote amounts are u64 here
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CoreConfig {
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub timelock_period: Option<u32>,
    pub execution_period: Option<u32>,
    pub voting_period: Option<u32>,
    pub quorum_numerator: Option<u64>,
    pub basis_numerator: Option<u64>,
    pub required_proposer_weight: Option<u64>,
    pub freeze_votes_threshold: Option<u64>,
    pub freeze_proposal_period: Option<u32>,
    pub freeze_period: Option<u32>,
}

pub(super) fn read_config(root_dir: &str) -> Result<Option<TomlConfig>, TomlConfigError> {
    util::get_toml_config_file(root_dir, "config").map_or(Ok(None), |config_file| {
        if !config_file.exists() {
            return Ok(None);
        }

        Ok(Some(toml::from_str::<TomlConfig>(
            fs::read_to_string(config_file)?.as_str(),
        )?))
    })
}
