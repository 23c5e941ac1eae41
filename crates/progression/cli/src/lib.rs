//! `progression` - command-line host for the progression engine.
//!
//! Maps the library's pure results onto a terminal: inspect the tier table,
//! resolve balances, price rewards, ask the gate, replay deltas through a
//! ledger and push a draft through the publication pipeline.

#![deny(unsafe_code)]

mod output;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use progression_engine::{ProgressionEngine, TierId};
use progression_publish::{ContentDraft, Publisher};
use progression_types::{Action, ProgressionConfig, ProgressionError};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::output::{Output, ResolveView, SimulationStep};

#[derive(Parser)]
#[command(name = "progression", about = "Tier, reward and permission engine")]
#[command(version)]
struct Cli {
    /// Config file (TOML); defaults apply when absent
    #[arg(long, global = true, env = "PROGRESSION_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tier table
    Tiers,

    /// Resolve a balance to its tier, permissions and progress
    Resolve {
        #[arg(allow_negative_numbers = true)]
        balance: i64,
    },

    /// Points credited for a base amount at a tier
    Reward {
        #[arg(long, allow_negative_numbers = true)]
        base: i64,
        #[arg(long)]
        tier: u32,
    },

    /// Ask the gate whether a tier may perform an action
    Can {
        /// edit_direct, moderate, publish or comment
        action: String,
        #[arg(long)]
        tier: u32,
        /// Comments already posted today (comment action only)
        #[arg(long)]
        used_today: Option<u32>,
    },

    /// Replay signed deltas through a ledger
    Simulate {
        #[arg(long, default_value_t = 0)]
        start: u64,
        #[arg(allow_negative_numbers = true, required = true)]
        deltas: Vec<i64>,
    },

    /// Run a draft (TOML: title, body, tags) through the publication pipeline
    Publish {
        #[arg(long)]
        draft: PathBuf,
        /// Author's balance before publishing
        #[arg(long, default_value_t = 0)]
        balance: u64,
    },
}

/// Run using the current process arguments.
pub fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Initialize tracing; stdout stays clean for --json
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    let config = ProgressionConfig::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;
    let engine = ProgressionEngine::from_config(&config).context("building engine")?;
    let out = Output::new(cli.json);
    debug!(tiers = engine.table().len(), "Engine ready");

    match cli.command {
        Commands::Tiers => out.tiers(engine.table().tiers()),
        Commands::Resolve { balance } => {
            let progress = engine.progress(balance)?;
            let permissions = engine.resolve_permissions(progress.tier)?;
            out.resolve(&ResolveView {
                progress,
                permissions,
            })
        }
        Commands::Reward { base, tier } => {
            let credited = engine.calculate_reward(base, TierId(tier))?;
            out.reward(base, TierId(tier), credited)
        }
        Commands::Can {
            action,
            tier,
            used_today,
        } => {
            let action: Action = action.parse()?;
            let decision = match (action, used_today) {
                (Action::Comment, Some(used)) => engine.gate().can_comment(TierId(tier), used)?,
                _ => engine.can_perform(action, TierId(tier))?,
            };
            out.decision(action, TierId(tier), &decision)
        }
        Commands::Simulate { start, deltas } => {
            let ledger = engine.open_ledger(start);
            let mut steps = Vec::with_capacity(deltas.len());
            for delta in deltas {
                match ledger.apply_delta(delta) {
                    Ok(outcome) => steps.push(SimulationStep::applied(delta, outcome)),
                    Err(err @ ProgressionError::BalanceOverflow { .. }) => {
                        steps.push(SimulationStep::rejected(delta, &err))
                    }
                    Err(err) if err.is_recoverable() => {
                        steps.push(SimulationStep::rejected(delta, &err))
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            out.simulation(start, &steps, &ledger.snapshot()?)
        }
        Commands::Publish {
            draft: path,
            balance,
        } => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading draft {}", path.display()))?;
            let draft: ContentDraft = toml::from_str(&contents)
                .with_context(|| format!("parsing draft {}", path.display()))?;
            let ledger = engine.open_ledger(balance);
            let publisher = Publisher::from_engine(&engine, &config.publication);
            let receipt = publisher.publish(&draft, &ledger)?;
            out.publication(&receipt)
        }
    }
}
