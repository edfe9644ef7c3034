//! Configuration for fractal - using the CLI (clap), env (clap), and configuration file (toml).

mod clap_config;
mod toml_config;

use clap::{parser::ValueSource, ArgMatches, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml config error")]
    TomlConfig(#[from] toml_config::TomlConfigError),

    #[error("invalid arguments")]
    Clap(#[from] clap::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub command: Option<FractalCommand>,

    /// Directory holding config.toml
    pub root_dir: String,

    pub log_level: LogLevel,

    pub log_format: LogFormat,

    /// Blocks between the end of voting and execution
    pub timelock_period: u32,

    /// Blocks a passed proposal stays executable
    pub execution_period: u32,

    /// Blocks voting stays open
    pub voting_period: u32,

    /// Parts per million of the total supply
    pub quorum_numerator: u64,

    /// Parts per million of yes + no votes
    pub basis_numerator: u64,

    pub required_proposer_weight: u64,

    pub freeze_votes_threshold: u64,

    pub freeze_proposal_period: u32,

    pub freeze_period: u32,
}

impl Config {
    pub fn new() -> ConfigResult<Self> {
        Self::from_matches(clap_config::get_matches())
    }

    /// Parse from an explicit argument list instead of the process arguments
    pub fn try_parse_from<I, T>(args: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_matches(clap_config::command().try_get_matches_from(args)?)
    }

    fn from_matches(matches: ArgMatches) -> ConfigResult<Self> {
        let mut config: Config = matches.clone().into();
        config.merge_toml_core_config(&matches)?;
        Ok(config)
    }

    fn was_supplied_by_user(key: &str, matches: &ArgMatches) -> bool {
        !matches!(matches.value_source(key), Some(ValueSource::DefaultValue))
    }

    /// The order of priority is (in decreasing order):
    /// cli -> env -> toml -> default
    ///
    /// A value the user did not supply is replaced by the TOML value for
    /// the same key, if there is one.
    fn merge_toml_core_config(&mut self, matches: &ArgMatches) -> ConfigResult<()> {
        let Some(toml_config) = toml_config::read_config(&self.root_dir)? else {
            return Ok(());
        };
        let core = toml_config.core;

        if let (false, Some(log_level)) = (
            Self::was_supplied_by_user("log-level", matches),
            core.log_level,
        ) {
            self.log_level = log_level;
        }

        if let (false, Some(log_format)) = (
            Self::was_supplied_by_user("log-format", matches),
            core.log_format,
        ) {
            self.log_format = log_format;
        }

        if let (false, Some(period)) = (
            Self::was_supplied_by_user("timelock-period", matches),
            core.timelock_period,
        ) {
            self.timelock_period = period;
        }

        if let (false, Some(period)) = (
            Self::was_supplied_by_user("execution-period", matches),
            core.execution_period,
        ) {
            self.execution_period = period;
        }

        if let (false, Some(period)) = (
            Self::was_supplied_by_user("voting-period", matches),
            core.voting_period,
        ) {
            self.voting_period = period;
        }

        if let (false, Some(numerator)) = (
            Self::was_supplied_by_user("quorum-numerator", matches),
            core.quorum_numerator,
        ) {
            self.quorum_numerator = numerator;
        }

        if let (false, Some(numerator)) = (
            Self::was_supplied_by_user("basis-numerator", matches),
            core.basis_numerator,
        ) {
            self.basis_numerator = numerator;
        }

        if let (false, Some(weight)) = (
            Self::was_supplied_by_user("required-proposer-weight", matches),
            core.required_proposer_weight,
        ) {
            self.required_proposer_weight = weight;
        }

        if let (false, Some(threshold)) = (
            Self::was_supplied_by_user("freeze-votes-threshold", matches),
            core.freeze_votes_threshold,
        ) {
            self.freeze_votes_threshold = threshold;
        }

        if let (false, Some(period)) = (
            Self::was_supplied_by_user("freeze-proposal-period", matches),
            core.freeze_proposal_period,
        ) {
            self.freeze_proposal_period = period;
        }

        if let (false, Some(period)) = (
            Self::was_supplied_by_user("freeze-period", matches),
            core.freeze_period,
        ) {
            self.freeze_period = period;
        }

        Ok(())
    }
}

// `clap` does not provide an automated way to do so in builder mode.
// Every argument read with `unwrap` has a default value.
#[allow(clippy::unwrap_used)]
impl From<ArgMatches> for Config {
    fn from(am: ArgMatches) -> Self {
        Config {
            command: match am.subcommand() {
                Some(("run", sub)) => Some(FractalCommand::Run {
                    scenario: sub.get_one::<PathBuf>("scenario").unwrap().clone(),
                    keep_going: sub.get_flag("keep-going"),
                    salt: *sub.get_one::<u64>("salt").unwrap(),
                }),
                Some(("predict", sub)) => Some(FractalCommand::Predict {
                    salt: *sub.get_one::<u64>("salt").unwrap(),
                }),
                _ => None,
            },

            root_dir: am.get_one::<String>("root-dir").unwrap().clone(),
            log_level: *am.get_one::<LogLevel>("log-level").unwrap(),
            log_format: *am.get_one::<LogFormat>("log-format").unwrap(),
            timelock_period: *am.get_one::<u32>("timelock-period").unwrap(),
            execution_period: *am.get_one::<u32>("execution-period").unwrap(),
            voting_period: *am.get_one::<u32>("voting-period").unwrap(),
            quorum_numerator: *am.get_one::<u64>("quorum-numerator").unwrap(),
            basis_numerator: *am.get_one::<u64>("basis-numerator").unwrap(),
            required_proposer_weight: *am.get_one::<u64>("required-proposer-weight").unwrap(),
            freeze_votes_threshold: *am.get_one::<u64>("freeze-votes-threshold").unwrap(),
            freeze_proposal_period: *am.get_one::<u32>("freeze-proposal-period").unwrap(),
            freeze_period: *am.get_one::<u32>("freeze-period").unwrap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FractalCommand {
    /// Replay a scenario file
    Run {
        scenario: PathBuf,
        keep_going: bool,
        salt: u64,
    },

    /// Print the Azorius module address for a salt
    Predict { salt: u64 },
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, ValueEnum)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Deserialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogFormat {
    #[serde(rename = "PRETTY")]
    Pretty,
    #[serde(rename = "JSON")]
    Json,
}
