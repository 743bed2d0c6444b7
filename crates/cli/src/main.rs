mod index_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    plugdex_index::Index,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::index_commands::{Lookup, handle};

#[derive(Parser)]
#[command(name = "plugdex", about = "plugdex — installed plugin registry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/plugdex/).
    #[arg(long, global = true, env = "PLUGDEX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
    /// Custom data directory holding the global index.
    #[arg(long, global = true, env = "PLUGDEX_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Use this index file directly instead of resolving project/global scope.
    #[arg(long, global = true, env = "PLUGDEX_INDEX_FILE")]
    index_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a plugin and the capabilities it provides.
    Register {
        name: String,
        /// Directory holding the plugin's code.
        #[arg(long)]
        path: PathBuf,
        /// Directory to add to the load path (repeatable).
        #[arg(long = "load-path")]
        load_paths: Vec<String>,
        /// Command provided by the plugin (repeatable).
        #[arg(long = "command")]
        commands: Vec<String>,
        /// Source handler provided by the plugin (repeatable).
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Hook event the plugin subscribes to (repeatable).
        #[arg(long = "hook")]
        hooks: Vec<String>,
    },
    /// Remove a plugin and everything it provides.
    Unregister { name: String },
    /// List installed plugins.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show details about an installed plugin.
    Info { name: String },
    /// Show which plugin provides a command or source.
    Which {
        #[command(subcommand)]
        lookup: Lookup,
    },
    /// List plugins subscribed to a hook event.
    Hooks { event: String },
}

/// Initialise tracing with an env-filter and either a human or JSON layer.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn open_index(cli: &Cli) -> anyhow::Result<Index> {
    if let Some(ref dir) = cli.config_dir {
        plugdex_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        plugdex_config::set_data_dir(dir.clone());
    }

    let index = match cli.index_file {
        Some(ref path) => Index::open(path)?,
        None => Index::for_directory(&std::env::current_dir()?)?,
    };
    debug!(index_file = %index.index_file().display(), "using plugin index");
    Ok(index)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let index = open_index(&cli)?;
    handle(index, cli.command)
}
