use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lotto_client::{
    config::{LedgerConfig, RoundConfig},
    draw::EntropySource,
    ledger::{Ledger, LedgerSettlement, RpcLedger},
    round::RoundState,
    Game, RoundEvent, RoundView,
};
use tokio::time;
use tracing_subscriber::EnvFilter;

/// How long `enter` waits for the first balance read.
const BALANCE_WAIT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "lotto", version, about = "Pick six numbers, watch the draw")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a round against an in-memory balance.
    Play {
        /// Six distinct numbers from 1 to 49, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        numbers: Vec<u8>,

        /// Replay a draw.
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        round: RoundConfig,
    },
    /// Enter the on-chain lottery and play the round out.
    Enter {
        #[arg(long, value_delimiter = ',', required = true)]
        numbers: Vec<u8>,

        #[command(flatten)]
        round: RoundConfig,

        #[command(flatten)]
        ledger: LedgerConfig,
    },
    /// Start a new on-chain round. Owner only.
    Reset {
        #[command(flatten)]
        ledger: LedgerConfig,
    },
    /// Show the owner, the balance and the entry status of the signer.
    Status {
        #[command(flatten)]
        ledger: LedgerConfig,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Play {
            numbers,
            seed,
            round,
        } => {
            let source = seed.map(EntropySource::seeded).unwrap_or_default();
            let mut game = Game::local(&round, source);
            play(&mut game, &numbers).await
        }
        Command::Enter {
            numbers,
            round,
            ledger,
        } => {
            let rpc: Arc<dyn Ledger> = Arc::new(RpcLedger::connect(&ledger)?);
            let mut game =
                Game::with_ledger(rpc, &round, ledger.poll_interval(), EntropySource::new()).await;
            time::timeout(BALANCE_WAIT, async {
                while game.view().balance.is_none() && game.step().await.is_some() {}
            })
            .await
            .context("ledger balance unavailable")?;
            play(&mut game, &numbers).await
        }
        Command::Reset { ledger } => {
            let rpc: Arc<dyn Ledger> = Arc::new(RpcLedger::connect(&ledger)?);
            LedgerSettlement::connect(rpc).await.reset_round().await?;
            println!("Lottery reset.");
            Ok(())
        }
        Command::Status { ledger } => status(&ledger).await,
    }
}

/// Selects `numbers` on a fresh board. A repeat would toggle the earlier
/// pick back off, so repeats are refused up front.
fn pick(game: &mut Game, numbers: &[u8]) -> Result<()> {
    for (i, &number) in numbers.iter().enumerate() {
        if numbers[..i].contains(&number) {
            bail!("cannot pick {number} twice: numbers must be distinct");
        }
        if !game.toggle_selection(number) {
            bail!("cannot pick {number}: numbers must be from 1 to 49, six at most");
        }
    }
    Ok(())
}

async fn play(game: &mut Game, numbers: &[u8]) -> Result<()> {
    pick(game, numbers)?;

    let before = game.view();
    println!("Balance: {}", balance_line(&before));
    if !game.commit().await? {
        bail!(
            "cannot start the round: pick exactly six numbers (picked {}) and keep the stake in your balance",
            before.selected.len()
        );
    }
    println!("Picked {:?}. Drawing in...", game.view().selected);

    let view = run_round(game).await;
    if let Some(failure) = view.failure {
        return Err(failure.into());
    }
    println!("Drawn: {:?}", view.drawn);
    if let Some(message) = view.message() {
        println!("{message}");
    }
    println!("Balance: {}", balance_line(&view));
    Ok(())
}

async fn run_round(game: &mut Game) -> RoundView {
    while game.view().state.is_active() {
        match game.step().await {
            Some(RoundEvent::Tick { .. }) => {
                let view = game.view();
                if let (RoundState::Committed, Some(remaining)) = (view.state, view.countdown) {
                    println!("{remaining}");
                }
            }
            Some(_) => {}
            None => break,
        }
    }
    game.view()
}

fn balance_line(view: &RoundView) -> String {
    view.balance
        .map_or_else(|| "unavailable".to_string(), |amount| amount.to_string())
}

async fn status(config: &LedgerConfig) -> Result<()> {
    let ledger = RpcLedger::connect(config)?;
    let account = ledger.account();
    println!("Account: {account}");

    match ledger.owner().await {
        Ok(owner) => {
            println!("Owner: {owner}");
            println!("You are the owner: {}", owner == account);
        }
        Err(err) => println!("Owner: unavailable ({err})"),
    }

    let balance = ledger
        .balance(&account)
        .await
        .context("could not read the balance")?;
    println!("Balance: {balance}");

    let entered = ledger
        .has_entered(&account)
        .await
        .context("could not read the entry status")?;
    println!("Entered this round: {entered}");
    Ok(())
}
