//! bidctl — operator tool for the BidGrid bid strategy engine.
//!
//! # Usage
//!
//! ```text
//! bidctl init --node-id node-1 > bidgrid.toml
//! bidctl evaluate --config bidgrid.toml --job job.json --deadline 5s
//! bidctl distance --node-id node-1 --job-id job-42 --network-size 500
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bidctl",
    about = "BidGrid — bid strategy engine for compute nodes",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a node would bid on a job.
    ///
    /// Prints the outcome as JSON on stdout. Logs go to stderr.
    Evaluate {
        /// Node configuration (bidgrid.toml).
        #[arg(short, long, default_value = "bidgrid.toml")]
        config: PathBuf,
        /// Job specification as JSON.
        #[arg(short, long)]
        job: PathBuf,
        /// Evaluating node id (default: [node].id from the config).
        #[arg(long)]
        node_id: Option<String>,
        /// Callback URL forwarded to probes.
        #[arg(long)]
        callback: Option<String>,
        /// Overall deadline for the evaluation, e.g. "5s" or "500ms".
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Print a bidgrid.toml scaffold.
    Init {
        #[arg(long)]
        node_id: String,
        /// Write to this path instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show where a node lands relative to a job on the distance-delay ring.
    Distance {
        #[arg(long)]
        node_id: String,
        #[arg(long)]
        job_id: String,
        /// Nodes expected to bid on the job.
        #[arg(long, default_value = "1")]
        concurrency: u32,
        /// Estimated number of nodes in the network.
        #[arg(long)]
        network_size: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Evaluate {
            config,
            job,
            node_id,
            callback,
            deadline,
        } => {
            commands::evaluate::run(commands::evaluate::EvaluateArgs {
                config,
                job,
                node_id,
                callback,
                deadline,
            })
            .await
        }
        Commands::Init { node_id, output } => commands::init::run(&node_id, output.as_deref()),
        Commands::Distance {
            node_id,
            job_id,
            concurrency,
            network_size,
        } => commands::distance::run(&node_id, &job_id, concurrency, network_size),
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,bidgrid=debug,bidctl=debug"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
