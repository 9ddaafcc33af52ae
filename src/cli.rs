//! CLI bindings for all internal commands and modules.
//!
//! This module focuses on the common CLI bindings required to provide easy
//! APIs and consistency across all other modules. This is where the parent
//! CLI can be found, as well as utilities for fetching common switches and
//! values.
use clap::{App, AppSettings, Arg, ArgMatches};
use rusoto_s3::*;

use crate::types::UtilResult;

/// Constructs a new CLI application using Clap.
///
/// This will register all subcommand modules and embed all metadata. All
/// metadata is fetched dynamically from Cargo and shouldn't require to
/// be updated (ever).
pub fn build<'a, 'b>() -> App<'a, 'b> {
    App::new("")
        .name(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .args(&global_args())
        .subcommand(crate::report::cmd())
        .settings(&[
            AppSettings::ArgRequiredElseHelp,
            AppSettings::DisableHelpSubcommand,
            AppSettings::SubcommandRequiredElseHelp,
            AppSettings::VersionlessSubcommands,
        ])
}

/// Executes a subcommand based on the parsed arguments from the CLI.
///
/// This will pass a singleton `S3Client` to each submodule to avoid
/// having to construct a client inside each module.
pub async fn exec(s3: S3Client, args: &ArgMatches<'_>) -> UtilResult<()> {
    match args.subcommand() {
        ("report", Some(subargs)) => crate::report::exec(s3, subargs).await,
        _ => {
            build().print_help()?;
            Ok(())
        }
    }
}

/// Fetches the set of global arguments which apply to every command.
pub fn global_args<'a, 'b>() -> [Arg<'a, 'b>; 2] {
    [
        Arg::with_name("quiet")
            .help("Only prints errors during execution")
            .short("q")
            .long("quiet")
            .global(true),
        Arg::with_name("verbose")
            .help("Prints debugging output during execution")
            .short("v")
            .long("verbose")
            .conflicts_with("quiet")
            .global(true),
    ]
}

/// Splits a bucket argument into a bucket/prefix pair.
///
/// Buckets may be provided as `name`, `s3://name` or `s3://name/prefix`.
pub fn get_bucket_pair(value: &str) -> (String, Option<String>) {
    let mut splitn = value.trim_start_matches("s3://").splitn(2, '/');

    // bucket is required, prefix is optional after `/`
    (
        splitn.next().unwrap_or_default().to_string(),
        splitn
            .next()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty()),
    )
}

/// Fetches a comma separated list argument, skipping empty entries.
pub fn get_list(args: &ArgMatches<'_>, name: &str) -> Vec<String> {
    args.value_of(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates an argument as a strictly positive count.
pub fn validate_count(value: String) -> Result<(), String> {
    match value.parse::<usize>() {
        Ok(count) if count > 0 => Ok(()),
        _ => Err(format!("{} is not a positive number", value)),
    }
}

/// Determines if the verbose switch was provided in this execution.
pub fn is_verbose(args: &ArgMatches<'_>) -> bool {
    is_global_present(args, "verbose")
}

/// Determines if the quiet switch was provided in this execution.
pub fn is_quiet(args: &ArgMatches<'_>) -> bool {
    is_global_present(args, "quiet")
}

/// Checks a global switch on both the parent and the subcommand matches.
fn is_global_present(args: &ArgMatches<'_>, name: &str) -> bool {
    args.is_present(name) || args.subcommand().1.map_or(false, |sub| sub.is_present(name))
}
