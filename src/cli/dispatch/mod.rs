use crate::{cli::actions::Action, options::CacheOptions};
use anyhow::{Context, Result};
use clap::ArgMatches;
use std::{collections::HashMap, path::PathBuf};

/// Global flags mapped to cache option names
const OPTION_ARGS: [(&str, &str); 8] = [
    ("backend", "backend"),
    ("path", "path"),
    ("driver", "driver"),
    ("dsn", "dsn"),
    ("table", "table"),
    ("addr", "addr"),
    ("password", "password"),
    ("db", "db"),
];

/// Collect the global flags into the flat option map understood by
/// [`CacheOptions::from_map`]
#[must_use]
pub fn option_map(matches: &ArgMatches) -> HashMap<String, String> {
    let mut options: HashMap<String, String> = OPTION_ARGS
        .iter()
        .filter_map(|(arg, option)| {
            matches
                .get_one::<String>(arg)
                .map(|value| ((*option).to_string(), value.clone()))
        })
        .collect();

    if matches.get_flag("precache") {
        options.insert("usePrecaching".to_string(), "true".to_string());
    }

    if let Some(key) = matches.get_one::<String>("encryption-key") {
        options.insert("encryptionKey".to_string(), key.clone());
    }

    options
}

/// Convert `ArgMatches` into typed Action enum with validation
///
/// # Errors
///
/// Returns an error if the cache options are invalid or no subcommand was given
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let options = CacheOptions::from_map(&option_map(matches)).context("Invalid cache options")?;

    let (name, sub) = matches.subcommand().context("A subcommand is required")?;

    let key = sub
        .get_one::<String>("key")
        .context("A key is required")?
        .clone();

    match name {
        "get" => Ok(Action::Get {
            options,
            key,
            output: sub.get_one::<String>("output").map(PathBuf::from),
        }),
        "put" => Ok(Action::Put {
            options,
            key,
            input: sub.get_one::<String>("input").map(PathBuf::from),
        }),
        "delete" => Ok(Action::Delete { options, key }),
        other => anyhow::bail!("Unknown subcommand: {other}"),
    }
}
