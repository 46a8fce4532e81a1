//! grimoire-query: run one query through the pipeline and print the response JSON.
//!
//! ```text
//! grimoire-query --query "What is the range of Fireball?" --env dev --top-k 5
//! grimoire-query --config grimoire.toml --query "..." --answer "..." --json-logs
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use grimoire_core::config::GrimoireConfig;
use grimoire_engine::{AppContext, QueryPipeline, QueryRequest};
use grimoire_observability::tracing_setup::init_from_config;

#[derive(Parser)]
#[command(name = "grimoire-query", version, about = "Run a query through the grimoire pipeline")]
struct Cli {
    /// TOML configuration file. Defaults plus GRIMOIRE_* overrides when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ingestion environment (overrides the config).
    #[arg(long)]
    env: Option<String>,

    #[arg(long)]
    query: String,

    #[arg(long)]
    top_k: Option<usize>,

    /// Request deadline in milliseconds; 0 disables it.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// A generated answer to run through the evaluation gate.
    #[arg(long)]
    answer: Option<String>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    json_logs: bool,

    /// Print query-log statistics after the response.
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GrimoireConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GrimoireConfig::from_env().context("building config from environment")?,
    };
    if let Some(env) = cli.env {
        config.paths.environment = env;
    }
    if cli.json_logs {
        config.observability.json_logs = true;
    }
    init_from_config(&config.observability);

    let ctx = Arc::new(AppContext::new(config, None).context("initializing app context")?);
    let pipeline = QueryPipeline::new(Arc::clone(&ctx));

    let mut request = QueryRequest::new(cli.query);
    request.top_k = cli.top_k;
    request.deadline_ms = cli.deadline_ms;

    let session = pipeline.start(request).context("planning and retrieval failed")?;
    let response = pipeline
        .complete(session, cli.answer.as_deref())
        .context("completing query failed")?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    if cli.stats {
        println!("{}", serde_json::to_string_pretty(&ctx.stats())?);
    }
    Ok(())
}
