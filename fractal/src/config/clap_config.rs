use clap::{crate_version, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use super::{LogFormat, LogLevel};

pub(super) fn get_matches() -> ArgMatches {
    command().get_matches()
}

/// Builder-mode `clap` command. Builder mode gives `value_source`, which
/// tells a user supplied value (cli/env) apart from a default so the TOML
/// file can fill in the rest.
pub(super) fn command() -> Command {
    Command::new("fractal")
        .about("Replay governance scenarios against an in-memory parent/child DAO")
        .version(crate_version!())
        .propagate_version(true)
        .subcommand(
            Command::new("run")
                .about("Build the DAO and replay a JSON scenario")
                .arg(
                    Arg::new("scenario")
                        .help("Scenario file")
                        .long("scenario")
                        .short('s')
                        .value_name("FILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("keep-going")
                        .help("Report failing steps and continue")
                        .long("keep-going")
                        .action(ArgAction::SetTrue),
                )
                .arg(salt_arg()),
        )
        .subcommand(
            Command::new("predict")
                .about("Print the address the Azorius module is deployed at")
                .arg(salt_arg()),
        )
        .arg(
            Arg::new("root-dir")
                .help("Directory holding config.toml")
                .short('r')
                .long("root-dir")
                .value_name("ROOT_DIR")
                .env("FRACTAL_ROOT_DIR")
                .value_parser(clap::value_parser!(String))
                .default_value("~/.fractal"),
        )
        .arg(
            Arg::new("log-level")
                .help("Log level")
                .long("log-level")
                .value_name("LOG_LEVEL")
                .env("FRACTAL_LOG_LEVEL")
                .value_parser(clap::builder::EnumValueParser::<LogLevel>::new())
                .default_value("INFO"),
        )
        .arg(
            Arg::new("log-format")
                .help("Log format")
                .long("log-format")
                .value_name("LOG_FORMAT")
                .env("FRACTAL_LOG_FORMAT")
                .value_parser(clap::builder::EnumValueParser::<LogFormat>::new())
                .default_value("PRETTY"),
        )
        .arg(
            Arg::new("timelock-period")
                .help("Blocks between the end of voting and execution")
                .long("timelock-period")
                .value_name("BLOCKS")
                .env("FRACTAL_TIMELOCK_PERIOD")
                .value_parser(clap::value_parser!(u32))
                .default_value("60"),
        )
        .arg(
            Arg::new("execution-period")
                .help("Blocks a passed proposal stays executable")
                .long("execution-period")
                .value_name("BLOCKS")
                .env("FRACTAL_EXECUTION_PERIOD")
                .value_parser(clap::value_parser!(u32))
                .default_value("600"),
        )
        .arg(
            Arg::new("voting-period")
                .help("Blocks voting stays open")
                .long("voting-period")
                .value_name("BLOCKS")
                .env("FRACTAL_VOTING_PERIOD")
                .value_parser(clap::value_parser!(u32))
                .default_value("100"),
        )
        .arg(
            Arg::new("quorum-numerator")
                .help("Quorum as parts per million of the total supply")
                .long("quorum-numerator")
                .value_name("PPM")
                .env("FRACTAL_QUORUM_NUMERATOR")
                .value_parser(clap::value_parser!(u64))
                .default_value("40000"),
        )
        .arg(
            Arg::new("basis-numerator")
                .help("Share of yes + no votes that must be yes, in parts per million")
                .long("basis-numerator")
                .value_name("PPM")
                .env("FRACTAL_BASIS_NUMERATOR")
                .value_parser(clap::value_parser!(u64))
                .default_value("500000"),
        )
        .arg(
            Arg::new("required-proposer-weight")
                .help("Delegated votes needed to submit a proposal")
                .long("required-proposer-weight")
                .value_name("VOTES")
                .env("FRACTAL_REQUIRED_PROPOSER_WEIGHT")
                .value_parser(clap::value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("freeze-votes-threshold")
                .help("Parent votes needed to freeze the child")
                .long("freeze-votes-threshold")
                .value_name("VOTES")
                .env("FRACTAL_FREEZE_VOTES_THRESHOLD")
                .value_parser(clap::value_parser!(u64))
                .default_value("1"),
        )
        .arg(
            Arg::new("freeze-proposal-period")
                .help("Blocks a freeze round stays open")
                .long("freeze-proposal-period")
                .value_name("BLOCKS")
                .env("FRACTAL_FREEZE_PROPOSAL_PERIOD")
                .value_parser(clap::value_parser!(u32))
                .default_value("100"),
        )
        .arg(
            Arg::new("freeze-period")
                .help("Blocks a freeze lasts")
                .long("freeze-period")
                .value_name("BLOCKS")
                .env("FRACTAL_FREEZE_PERIOD")
                .value_parser(clap::value_parser!(u32))
                .default_value("200"),
        )
}

fn salt_arg() -> Arg {
    Arg::new("salt")
        .help("Deployment salt")
        .long("salt")
        .value_name("SALT")
        .value_parser(clap::value_parser!(u64))
        .default_value("0")
}
