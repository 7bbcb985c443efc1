use std::sync::Arc;

use color_eyre::{eyre::WrapErr, Result};
use parley::adapters::{FileTranscriptStore, InMemoryTranscriptStore};
use parley::cli::{parse_args, run_cli_command, USAGE};
use parley::config::ConsoleConfig;
use parley::debug::create_debug_channel;
use parley::server::{start_server_on, AppState};
use parley::traits::TranscriptStore;

fn main() -> Result<()> {
    // Handle --version and --help before any initialization
    let overrides = match parse_args(std::env::args()) {
        Ok(command) => run_cli_command(command),
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = ConsoleConfig::from_env().apply(overrides);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))
}

async fn serve(config: ConsoleConfig) -> Result<()> {
    let store: Arc<dyn TranscriptStore> = if config.persist {
        let data_dir = config
            .resolved_data_dir()
            .wrap_err("Failed to resolve the transcript directory; set PARLEY_DATA_DIR")?;
        tracing::info!("Transcripts are saved under {}", data_dir.display());
        Arc::new(FileTranscriptStore::new(data_dir))
    } else {
        tracing::info!("Persistence disabled; transcripts live in memory");
        Arc::new(InMemoryTranscriptStore::new())
    };

    let addr = config.socket_addr();
    tracing::info!("Relaying to {} (app {})", config.backend_url, config.app_name);

    let (event_tx, _) = create_debug_channel(config.debug_capacity);
    let state = AppState::new(config, store, event_tx);

    let (server, actual_addr) = start_server_on(addr, state)
        .await
        .wrap_err_with(|| format!("Failed to start the console on {}", addr))?;
    println!("parley console: http://{}", actual_addr);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
        result = server => {
            if let Err(e) = result {
                tracing::error!("Console server task failed: {}", e);
            }
        }
    }

    Ok(())
}
