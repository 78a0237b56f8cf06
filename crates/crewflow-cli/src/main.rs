use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use crewflow_core::{
    Config, ConfigLoader, EventFetcher, EvaluationHarness, ReFetchController, RefetchPolicy,
    SerperEventFetcher, SessionLogInput, SessionOptions, StubEventFetcher, SufficiencyThreshold,
    log_session_completion, run_event_session_with_options,
};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crewflow-cli", version, about = "Event-planning crew demo")]
struct Cli {
    /// Path to a config.toml (defaults to CREWFLOW_CONFIG or ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full crew: collect, verify, summarize.
    Run(RunArgs),
    /// Run only the bounded collection stage and print the events.
    Fetch(FetchArgs),
    /// Aggregate metrics from a session log.
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Query describing the events to collect.
    #[arg(long, default_value = "exciting events in New York City this week")]
    query: String,

    /// Optional session ID.
    #[arg(long)]
    session: Option<String>,

    /// Override the configured sufficiency threshold.
    #[arg(long)]
    threshold: Option<usize>,

    /// Override the configured fetch-attempt budget.
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Use the live Serper search API instead of the stub fetcher.
    #[arg(long)]
    serper: bool,

    /// Skip writing the session completion log.
    #[arg(long)]
    no_log: bool,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Query describing the events to collect.
    #[arg(long, default_value = "exciting events in New York City this week")]
    query: String,

    /// Override the configured sufficiency threshold.
    #[arg(long)]
    threshold: Option<usize>,

    /// Override the configured fetch-attempt budget.
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Use the live Serper search API instead of the stub fetcher.
    #[arg(long)]
    serper: bool,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Path to a session.jsonl file.
    #[arg(long)]
    log: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load(cli.config.clone())?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let rt = Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Command::Run(args) => run_command(args, &config).await?,
            Command::Fetch(args) => fetch_command(args, &config).await?,
            Command::Eval(args) => eval_command(args)?,
        }
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}

fn effective_policy(
    config: &Config,
    threshold: Option<usize>,
    max_attempts: Option<usize>,
) -> RefetchPolicy {
    let base = config.refetch_policy();
    RefetchPolicy::new(
        threshold
            .map(SufficiencyThreshold::new)
            .unwrap_or(base.threshold),
        max_attempts.unwrap_or(base.max_attempts),
    )
}

fn build_fetcher(config: &Config, query: &str, serper: bool) -> Result<Arc<dyn EventFetcher>> {
    if serper {
        Ok(Arc::new(SerperEventFetcher::new(&config.search, query)?))
    } else {
        Ok(Arc::new(StubEventFetcher::for_topic(query)))
    }
}

async fn run_command(args: RunArgs, config: &Config) -> Result<()> {
    info!(query = %args.query, "starting event crew session");

    let policy = effective_policy(config, args.threshold, args.max_attempts);
    let fetcher = build_fetcher(config, &args.query, args.serper)?;

    let mut options = SessionOptions::new(&args.query)
        .with_policy(policy)
        .with_fetcher(fetcher);
    if let Some(session_id) = args.session {
        options = options.with_session_id(session_id);
    }

    let outcome = run_event_session_with_options(options).await?;
    println!("{}", outcome.summary);

    if args.no_log {
        return Ok(());
    }
    if let Err(err) = log_session_completion(
        &config.logging.dir,
        SessionLogInput {
            session_id: outcome.session_id.clone(),
            query: Some(args.query),
            summary: outcome.summary.clone(),
            verdict: outcome.verdict.clone(),
            exhausted: outcome.exhausted,
            events_count: outcome.events.len(),
            attempts: outcome.attempts,
        },
    ) {
        warn!(%err, "failed to write session log");
    }

    Ok(())
}

async fn fetch_command(args: FetchArgs, config: &Config) -> Result<()> {
    info!(query = %args.query, "running bounded collection");

    let policy = effective_policy(config, args.threshold, args.max_attempts);
    let fetcher = build_fetcher(config, &args.query, args.serper)?;
    let controller = ReFetchController::new(policy);

    let outcome = controller.run(fetcher.as_ref()).await?;
    info!(
        attempts = outcome.attempts,
        events = outcome.events.len(),
        exhausted = outcome.is_exhausted(),
        "collection finished"
    );
    println!("{}", serde_json::to_string_pretty(outcome.events.events())?);

    Ok(())
}

fn eval_command(args: EvalArgs) -> Result<()> {
    let metrics = EvaluationHarness::analyze_log(&args.log)?;
    println!("{}", metrics.summary());
    for session_id in &metrics.exhausted_ids {
        println!("exhausted: {session_id}");
    }
    Ok(())
}
