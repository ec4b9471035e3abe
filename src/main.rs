// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::U256;
use clap::Parser;
use oxidity_cycler::app::config::GlobalSettings;
use oxidity_cycler::app::logging::{level_for, setup_logging};
use oxidity_cycler::app::prompt::{Prompter, parse_amount, parse_cycle_count, parse_menu_choice};
use oxidity_cycler::common::retry::retry_async;
use oxidity_cycler::common::units::{native_to_wei, wei_to_native};
use oxidity_cycler::data::keys::{load_private_keys, load_recipients};
use oxidity_cycler::domain::constants::NATIVE_SYMBOL;
use oxidity_cycler::domain::error::AppError;
use oxidity_cycler::network::gas::GasOracle;
use oxidity_cycler::network::provider::{ChainClient, RpcChainClient};
use oxidity_cycler::network::simulated::SimulatedChain;
use oxidity_cycler::services::account::AccountContext;
use oxidity_cycler::services::execution::builder::TransactionBuilder;
use oxidity_cycler::services::execution::scheduler::{RunSummary, Scheduler};
use oxidity_cycler::services::execution::sequencer::Sequencer;
use oxidity_cycler::services::execution::submission::SubmissionEngine;
use oxidity_cycler::services::protocols::{
    Protocol, ProtocolContext, TransferMode, TransferPlan, workflow_factory,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-account transaction cycling for the Monad testnet")]
struct Cli {
    /// Path to config file (default: config.toml when present)
    #[arg(long)]
    config: Option<String>,

    /// Run one protocol and exit instead of showing the menu
    #[arg(long)]
    protocol: Option<String>,

    /// Cycles per account for --protocol; with --transfer-list, passes over the recipients file
    #[arg(long, default_value_t = 1)]
    cycles: u32,

    /// With --protocol transfer: send to every address in the recipients file
    #[arg(long, default_value_t = false)]
    transfer_list: bool,

    /// Never broadcast; run against an in-memory chain
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[arg(long, default_value_t = false)]
    debug: bool,

    #[arg(long, default_value_t = false)]
    log_json: bool,
}

/// Simulated balance per account under --dry-run.
const DRY_RUN_FUNDING: &str = "1000";

struct App {
    settings: GlobalSettings,
    client: Arc<dyn ChainClient>,
    simulated: Option<Arc<SimulatedChain>>,
    chain_id: u64,
}

impl App {
    fn load_accounts(&self) -> Result<Vec<AccountContext>, AppError> {
        let keys = load_private_keys(&self.settings.private_keys_path())?;
        let accounts = AccountContext::load_all(&keys)?;
        if let Some(sim) = &self.simulated {
            let funding = native_to_wei(DRY_RUN_FUNDING)?;
            for account in &accounts {
                sim.fund(account.address(), funding);
            }
        }
        tracing::info!(target: "config", accounts = accounts.len(), "Loaded accounts");
        Ok(accounts)
    }

    fn transfer_plan(&self, amount: U256, from_list: bool) -> Result<TransferPlan, AppError> {
        let mode = if from_list {
            TransferMode::List(load_recipients(&self.settings.recipients_path())?)
        } else {
            TransferMode::Random
        };
        Ok(TransferPlan { amount, mode })
    }

    async fn run_protocol(
        &self,
        protocol: Protocol,
        cycles: u32,
        transfer: Option<TransferPlan>,
    ) -> Result<RunSummary, AppError> {
        let mut accounts = self.load_accounts()?;
        let ctx = ProtocolContext {
            settings: self.settings.protocol_settings()?,
            client: self.client.clone(),
            transfer,
        };
        let factory = workflow_factory(protocol, &ctx)?;

        let gas = GasOracle::new(self.client.clone(), self.settings.priority_fee_floor_gwei);
        let builder = TransactionBuilder::new(self.client.clone(), gas, self.chain_id);
        let engine = Arc::new(SubmissionEngine::new(
            self.client.clone(),
            builder,
            self.settings.submission_config(),
        ));
        let scheduler = Scheduler::new(Sequencer::new(engine), self.settings.scheduler_pacing());

        tracing::info!(
            target: "scheduler",
            protocol = %protocol,
            cycles,
            accounts = accounts.len(),
            "Starting run"
        );
        Ok(scheduler.run_all(&mut accounts, cycles, factory.as_ref()).await)
    }

    async fn menu<R: BufRead, W: Write>(&self, prompt: &mut Prompter<R, W>) -> Result<(), AppError> {
        loop {
            prompt.say("")?;
            for (i, p) in Protocol::ALL.iter().enumerate() {
                prompt.say(&format!("  {}. {:<9} {}", i + 1, p.name(), p.description()))?;
            }
            prompt.say(&format!("  {}. exit", Protocol::ALL.len() + 1))?;

            let choice = match prompt.ask("Select: ", |s| parse_menu_choice(s, Protocol::ALL.len() + 1)) {
                Ok(c) => c,
                Err(_) => return Ok(()),
            };
            let Some(&protocol) = Protocol::ALL.get(choice) else {
                return Ok(());
            };

            if let Err(e) = self.interactive_run(protocol, prompt).await {
                tracing::error!(target: "scheduler", protocol = %protocol, error = %e, "Command aborted");
            }
        }
    }

    async fn interactive_run<R: BufRead, W: Write>(
        &self,
        protocol: Protocol,
        prompt: &mut Prompter<R, W>,
    ) -> Result<(), AppError> {
        let transfer = if protocol == Protocol::Transfer {
            let default = TransferPlan::default();
            let amount = prompt.ask(
                &format!(
                    "Amount of {NATIVE_SYMBOL} per transfer [{}]: ",
                    wei_to_native(default.amount)
                ),
                |s| parse_amount(s, default.amount),
            )?;
            let mode = prompt.ask("Recipients: 1. random  2. from file [1]: ", |s| {
                if s.trim().is_empty() {
                    Ok(0)
                } else {
                    parse_menu_choice(s, 2)
                }
            })?;
            Some(self.transfer_plan(amount, mode == 1)?)
        } else {
            None
        };
        let cycles = prompt.ask("How many cycles per account? [1]: ", |s| parse_cycle_count(s, 1))?;

        let summary = self.run_protocol(protocol, cycles, transfer).await?;
        prompt.say(&format!(
            "{}: {}/{} cycles succeeded, {} transactions",
            summary.workflow, summary.succeeded, summary.attempted, summary.submissions
        ))
    }
}

async fn resolve_chain_id(
    settings: &GlobalSettings,
    client: &Arc<dyn ChainClient>,
) -> Result<u64, AppError> {
    if let Some(id) = settings.chain_id {
        return Ok(id);
    }
    let client = client.clone();
    let id = retry_async(
        move |_| {
            let client = client.clone();
            async move { client.chain_id().await }
        },
        3,
        Duration::from_secs(1),
    )
    .await?;
    tracing::info!(target: "config", chain_id = id, "Detected chain id");
    Ok(id)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(
        &level_for(cli.debug || settings.debug),
        cli.log_json || settings.log_json,
    );

    let (client, simulated) = if cli.dry_run {
        let chain_id = settings
            .chain_id
            .unwrap_or(oxidity_cycler::domain::constants::CHAIN_MONAD_TESTNET);
        let sim = Arc::new(SimulatedChain::new(chain_id));
        tracing::warn!(target: "config", "Dry run: transactions go to an in-memory chain");
        (sim.clone() as Arc<dyn ChainClient>, Some(sim))
    } else {
        (
            Arc::new(RpcChainClient::connect(settings.rpc_url.trim())?) as Arc<dyn ChainClient>,
            None,
        )
    };
    let chain_id = resolve_chain_id(&settings, &client).await?;
    tracing::info!(
        target: "config",
        rpc = %settings.rpc_url,
        chain_id,
        dry_run = cli.dry_run,
        "Connected"
    );

    let app = App {
        settings,
        client,
        simulated,
        chain_id,
    };

    match cli.protocol.as_deref() {
        Some(name) => {
            let protocol: Protocol = name.parse()?;
            let cycles = parse_cycle_count(&cli.cycles.to_string(), 1)?;
            let transfer = if protocol == Protocol::Transfer {
                Some(app.transfer_plan(TransferPlan::default().amount, cli.transfer_list)?)
            } else {
                None
            };
            let summary = app.run_protocol(protocol, cycles, transfer).await?;
            if summary.failed() > 0 {
                std::process::exit(1);
            }
        }
        None => {
            let stdin = std::io::stdin();
            let mut prompt = Prompter::new(stdin.lock(), std::io::stdout());
            app.menu(&mut prompt).await?;
        }
    }
    Ok(())
}
