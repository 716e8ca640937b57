use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mintflow::config::{config, init_config, MintflowConfig};
use mintflow::identity::EphemeralIdentities;
use mintflow::ledger::{InMemoryLedger, LedgerOps};
use mintflow::observability::ledger_metrics;
use mintflow::telemetry::{init_telemetry, shutdown_telemetry};
use mintflow::workflow::{
    format_base_units, token_lifecycle, LifecyclePlan, RunContext, RunState, StepStatus,
    WorkflowOrchestrator, WorkflowResult,
};

#[derive(Parser)]
#[command(name = "mintflow")]
#[command(about = "Token lifecycle workflow orchestration")]
#[command(
    long_about = "Mintflow drives a fungible-token lifecycle against a ledger as an \
                  explicit workflow: create a mint, create token accounts, mint supply, \
                  delegate spend authority, transfer, revoke, and burn, with per-step \
                  confirmation, timeouts, and resumable partial results."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the full token lifecycle against the in-memory devnet simulator
    Run {
        /// Mint precision (decimal places)
        #[arg(long, help = "Mint precision in decimal places")]
        decimals: Option<u8>,
        /// Human amount to mint to the owner account
        #[arg(long, help = "Amount minted to the owner account, e.g. 100 or 1.50")]
        mint_amount: Option<String>,
        /// Human allowance approved for the delegate
        #[arg(long, help = "Allowance approved for the delegate")]
        approve_amount: Option<String>,
        /// Human amount the delegate transfers to the receiver
        #[arg(long, help = "Amount the delegate transfers to the receiver")]
        transfer_amount: Option<String>,
        /// Human amount burned from the owner account
        #[arg(long, help = "Amount burned from the owner account at the end")]
        burn_amount: Option<String>,
        /// Per-step confirmation timeout in seconds
        #[arg(long, help = "Per-step confirmation timeout in seconds")]
        step_timeout_secs: Option<u64>,
        /// Print the full workflow result as JSON
        #[arg(long, help = "Print the full workflow result as JSON")]
        json: bool,
    },
    /// Print the planned step table without executing anything
    Plan,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_config()?;
    if config()?.observability.tracing_enabled {
        init_telemetry()?;
    }

    match cli.command {
        None => {
            println!("mintflow: token lifecycle workflow orchestration");
            println!();
            println!("  mintflow run    execute the lifecycle against the devnet simulator");
            println!("  mintflow plan   show the step table without executing");
            println!();
            println!("Run 'mintflow --help' for options.");
            Ok(())
        }
        Some(Commands::Plan) => plan_command(),
        Some(Commands::Run {
            decimals,
            mint_amount,
            approve_amount,
            transfer_amount,
            burn_amount,
            step_timeout_secs,
            json,
        }) => tokio::runtime::Runtime::new()?.block_on(run_command(RunArgs {
            decimals,
            mint_amount,
            approve_amount,
            transfer_amount,
            burn_amount,
            step_timeout_secs,
            json,
        })),
    }
}

struct RunArgs {
    decimals: Option<u8>,
    mint_amount: Option<String>,
    approve_amount: Option<String>,
    transfer_amount: Option<String>,
    burn_amount: Option<String>,
    step_timeout_secs: Option<u64>,
    json: bool,
}

fn build_plan(cfg: &MintflowConfig, args: &RunArgs) -> Result<LifecyclePlan> {
    let decimals = args.decimals.unwrap_or(cfg.workflow.decimals);
    let mint = args
        .mint_amount
        .as_deref()
        .unwrap_or(&cfg.workflow.mint_amount);
    let approve = args
        .approve_amount
        .as_deref()
        .unwrap_or(&cfg.workflow.approve_amount);
    let transfer = args
        .transfer_amount
        .as_deref()
        .unwrap_or(&cfg.workflow.transfer_amount);
    let burn = args
        .burn_amount
        .as_deref()
        .unwrap_or(&cfg.workflow.burn_amount);
    Ok(LifecyclePlan::from_human(
        decimals, mint, approve, transfer, burn,
    )?)
}

fn plan_command() -> Result<()> {
    let cfg = config()?;
    let plan = build_plan(
        cfg,
        &RunArgs {
            decimals: None,
            mint_amount: None,
            approve_amount: None,
            transfer_amount: None,
            burn_amount: None,
            step_timeout_secs: None,
            json: false,
        },
    )?;

    println!(
        "Planned token lifecycle (decimals={}, cluster={}):",
        plan.decimals, cfg.ledger.cluster
    );
    println!();
    for (index, step) in token_lifecycle(&plan).iter().enumerate() {
        println!("  {}. {:<18} {}", index + 1, step.id, step.op.describe());
    }
    println!();
    println!("'@step-id' marks an input bound to that step's output at run time.");
    Ok(())
}

async fn run_command(args: RunArgs) -> Result<()> {
    let cfg = config()?;
    let plan = build_plan(cfg, &args)?;

    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_latency(Duration::from_millis(cfg.ledger.simulated_latency_ms)),
    );
    let identities = EphemeralIdentities::new();
    let ctx = RunContext::provision(&identities).await?;

    let step_timeout = Duration::from_secs(
        args.step_timeout_secs
            .unwrap_or(cfg.ledger.step_timeout_seconds),
    );
    let orchestrator = WorkflowOrchestrator::new(ledger.clone())
        .with_step_timeout(step_timeout)
        .with_network(&cfg.ledger.explorer_base, &cfg.ledger.cluster);

    let result = orchestrator.run(&ctx, &plan).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, plan.decimals, ledger.as_ref()).await;
    }

    if cfg.observability.metrics_enabled {
        ledger_metrics().log_stats();
    }
    shutdown_telemetry();

    match &result.state {
        RunState::Completed => Ok(()),
        RunState::Aborted { step, error } => Err(anyhow::anyhow!(
            "workflow aborted at step '{step}': {error}"
        )),
        other => Err(anyhow::anyhow!(
            "workflow ended in non-terminal state '{}'",
            other.name()
        )),
    }
}

async fn print_summary(result: &WorkflowResult, decimals: u8, ledger: &dyn LedgerOps) {
    println!("Workflow run {} ({})", result.run_id, result.state.name());
    println!();
    for (index, record) in result.steps.iter().enumerate() {
        let status = match &record.status {
            StepStatus::Confirmed { .. } => "confirmed".to_string(),
            StepStatus::Failed { error } => format!("failed ({})", error.kind()),
            other => other.name().to_string(),
        };
        println!("  {}. {:<18} {}", index + 1, record.spec.id, status);
    }
    println!();

    if let Some(mint) = &result.mint {
        match ledger.mint_info(mint).await {
            Ok(info) => println!(
                "  mint {mint}: supply {} ({} units)",
                info.supply,
                format_base_units(info.supply, decimals)
            ),
            Err(err) => println!("  mint {mint}: unavailable ({err})"),
        }
    }
    for (label, account) in [
        ("owner", result.owner_account.as_ref()),
        ("receiver", result.receiver_account.as_ref()),
    ] {
        if let Some(account) = account {
            match ledger.token_account_info(account).await {
                Ok(info) => println!(
                    "  {label} account {account}: balance {} ({} units)",
                    info.balance,
                    format_base_units(info.balance, decimals)
                ),
                Err(err) => println!("  {label} account {account}: unavailable ({err})"),
            }
        }
    }
}
