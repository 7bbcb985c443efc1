//! CLI module for parley.
//!
//! Parses flags before anything else starts:
//!
//! ```ignore
//! use parley::cli::{parse_args, run_cli_command};
//!
//! let overrides = run_cli_command(parse_args(std::env::args())?);
//! // start the console with `overrides`
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, ServeOverrides};
pub use version::{handle_help_command, handle_version_command, version_line, USAGE, VERSION};

/// Run a CLI command if applicable.
///
/// `Version` and `Help` print and exit; `Serve` hands its overrides back.
pub fn run_cli_command(command: CliCommand) -> ServeOverrides {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => handle_help_command(),
        CliCommand::Serve(overrides) => overrides,
    }
}
