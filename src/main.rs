mod cli;
mod mcp;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use memdash::config::DashConfig;

#[derive(Parser)]
#[command(name = "memdash", version, about = "Semantic memory MCP server and dashboard backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on; defaults to the configured one
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// List the available operations
    Tools,
    /// Run a single operation and print its JSON result
    Call {
        /// Operation name, e.g. retrieve_memory
        tool: String,
        /// Arguments as a JSON object
        args: Option<String>,
    },
    /// Show memory statistics
    Stats,
    /// Check the store and show health metrics
    Health,
    /// Write a compressed backup of the store
    Backup,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Sse,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.memdash/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DashConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = match transport {
                Some(t) => t,
                None => match config.server.transport.as_str() {
                    "stdio" => Transport::Stdio,
                    "sse" | "http" => Transport::Sse,
                    other => anyhow::bail!("unknown transport in config: {other}"),
                },
            };
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Sse => server::serve_sse(config).await?,
            }
        }
        Command::Tools => cli::call::list_tools(),
        Command::Call { tool, args } => {
            let dispatcher = server::open_dispatcher(&config)?;
            cli::call::call(&dispatcher, &tool, args.as_deref())?;
        }
        Command::Stats => {
            let dispatcher = server::open_dispatcher(&config)?;
            cli::stats::stats(&dispatcher)?;
        }
        Command::Health => {
            let dispatcher = server::open_dispatcher(&config)?;
            cli::stats::health(&dispatcher)?;
        }
        Command::Backup => {
            let dispatcher = server::open_dispatcher(&config)?;
            cli::stats::backup(&dispatcher)?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
    }

    Ok(())
}
