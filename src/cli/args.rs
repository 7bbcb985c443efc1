//! Command-line argument parsing for parley.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::path::PathBuf;
use thiserror::Error;

/// Flags that override the environment when serving.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub backend_url: Option<String>,
    pub app_name: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub no_persist: bool,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run the console server (default)
    Serve(ServeOverrides),
}

#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("unknown argument: {0}")]
    UnknownFlag(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// `--version` and `--help` win as soon as they are seen; anything else
/// accumulates into [`ServeOverrides`].
///
/// # Examples
///
/// ```
/// use parley::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["parley".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut overrides = ServeOverrides::default();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |flag: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--port" | "-p" => {
                let raw = value(&flag)?;
                let port = raw.parse().map_err(|_| ArgsError::InvalidPort(raw))?;
                overrides.port = Some(port);
            }
            "--backend" => overrides.backend_url = Some(value(&flag)?),
            "--app" => overrides.app_name = Some(value(&flag)?),
            "--data-dir" => overrides.data_dir = Some(PathBuf::from(value(&flag)?)),
            "--no-persist" => overrides.no_persist = true,
            _ => return Err(ArgsError::UnknownFlag(arg)),
        }
    }

    Ok(CliCommand::Serve(overrides))
}
