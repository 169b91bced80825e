use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use bidgrid_core::{Job, NodeConfig, parse_duration};
use bidgrid_strategy::{BidOutcome, BidRequest, Collaborators, build_bidder};

pub struct EvaluateArgs {
    pub config: PathBuf,
    pub job: PathBuf,
    pub node_id: Option<String>,
    pub callback: Option<String>,
    pub deadline: Option<String>,
}

pub async fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    let outcome = evaluate(args).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn evaluate(args: EvaluateArgs) -> anyhow::Result<BidOutcome> {
    let config = NodeConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let raw = std::fs::read_to_string(&args.job)
        .with_context(|| format!("failed to read {}", args.job.display()))?;
    let job: Job = serde_json::from_str(&raw)
        .with_context(|| format!("invalid job specification in {}", args.job.display()))?;

    let node_id = args
        .node_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| config.node.id.clone());
    if node_id.is_empty() {
        anyhow::bail!("no node id: pass --node-id or set [node].id in the config");
    }

    let deadline = args
        .deadline
        .as_deref()
        .map(parse_duration)
        .transpose()
        .context("invalid --deadline")?;

    let bidder = build_bidder(&config, Collaborators::from_config(&config))
        .context("failed to assemble bid strategy")?;

    let mut request = BidRequest::new(node_id, job);
    if let Some(callback) = args.callback {
        request = request.with_callback(callback);
    }

    info!(node_id = %request.node_id, job_id = %request.job.id, "evaluating job offer");
    let outcome = match deadline {
        Some(deadline) => bidder.run_bidding_within(&request, deadline).await?,
        None => bidder.run_bidding(&request).await?,
    };
    Ok(outcome)
}
