//! Version and usage output.

/// The current version of parley, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "\
Usage: parley [OPTIONS]

Chat debugging console for agent backends.

Options:
  -p, --port <PORT>       Port to listen on [env: PARLEY_PORT] [default: 3000]
      --backend <URL>     Agent backend base URL [env: PARLEY_BACKEND_URL]
      --app <NAME>        Default app name [env: PARLEY_APP_NAME]
      --data-dir <DIR>    Transcript directory [env: PARLEY_DATA_DIR] [default: ~/.parley]
      --no-persist        Keep transcripts in memory only
  -V, --version           Print version
  -h, --help              Print this help
";

pub fn version_line() -> String {
    format!("parley {}", VERSION)
}

/// Handle the --version command.
pub fn handle_version_command() -> ! {
    println!("{}", version_line());
    std::process::exit(0)
}

/// Handle the --help command.
pub fn handle_help_command() -> ! {
    println!("{}\n\n{}", version_line(), USAGE);
    std::process::exit(0)
}
