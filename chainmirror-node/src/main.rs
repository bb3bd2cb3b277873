mod errors;
mod mirror;
mod shutdown;

use std::{path::PathBuf, time::Instant};

use chainmirror_config::ChainMirrorConfig;
use chainmirror_core::{round_timer::compute_snapshot, Clock};
use chainmirror_rpc_client::{BroadcastOutcome, SignedTransaction};
use chainmirror_sync::{AppState, Story};
use chainmirror_tx_tracker::{TransactionKind, TransactionStatus};
use clap::{Parser, Subcommand};
use log::*;

use crate::{
    errors::{NodeError, NodeResult},
    mirror::ChainMirror,
    shutdown::wait_for_shutdown_signal,
};

#[derive(Debug, Parser)]
#[clap(
    name = "chainmirror",
    version,
    about = "Mirrors contract state into a local cache"
)]
struct Cli {
    #[clap(
        short,
        long,
        help = "Path to the config file, defaults are used when omitted",
        env = "CHAINMIRROR_CONFIG"
    )]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[clap(about = "Fetches one story with its rounds")]
    Fetch {
        id: u64,
        #[clap(long, help = "Bypass the cache and read fresh")]
        refresh: bool,
    },
    #[clap(about = "Lists every story the contract knows of")]
    List {
        #[clap(long, help = "Bypass the cache and read fresh")]
        refresh: bool,
    },
    #[clap(about = "Keeps the mirror fresh until interrupted")]
    Watch,
    #[clap(about = "Shows the tracked transaction history")]
    Transactions {
        #[clap(long, help = "Drop entries older than the retention period")]
        prune: bool,
        #[clap(long, help = "Only show pending, confirmed or failed entries")]
        status: Option<String>,
    },
    #[clap(about = "Broadcasts a signed transaction and tracks it")]
    Submit {
        #[clap(long)]
        id: String,
        #[clap(long, help = "One of the tracked transaction kinds")]
        kind: String,
        #[clap(help = "Hex encoded signed transaction")]
        payload: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("chainmirror failed: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> NodeResult<()> {
    let config = match &cli.config {
        Some(path) => ChainMirrorConfig::try_load_from_file(path)?,
        None => {
            info!("No config file provided, using defaults");
            ChainMirrorConfig::default()
        }
    };
    debug!("Starting with config:\n{}", config);

    let mut mirror = ChainMirror::try_from_config(config).await?;
    mirror.start_metrics_service().await?;

    let result = match cli.command {
        Command::Fetch { id, refresh } => fetch(&mirror, id, refresh).await,
        Command::List { refresh } => list(&mirror, refresh).await,
        Command::Watch => watch(&mut mirror).await,
        Command::Transactions { prune, status } => {
            transactions(&mirror, prune, status.as_deref()).await
        }
        Command::Submit { id, kind, payload } => {
            submit(&mirror, id, &kind, &payload).await
        }
    };
    mirror.stop().await;
    result
}

// -----------------
// Commands
// -----------------
async fn fetch(
    mirror: &ChainMirror,
    id: u64,
    refresh: bool,
) -> NodeResult<()> {
    let coordinator = mirror.coordinator();
    let story = if refresh {
        coordinator.refresh_entity(id).await?
    } else {
        coordinator.fetch_entity(id, true).await?
    };
    match story {
        Some(story) => print_story(mirror, &story, true),
        None => println!("Story {id} does not exist"),
    }
    Ok(())
}

async fn list(mirror: &ChainMirror, refresh: bool) -> NodeResult<()> {
    let coordinator = mirror.coordinator();
    let stories = if refresh {
        coordinator.refresh_all_entities().await?
    } else {
        coordinator.fetch_all_entities().await?
    };
    if stories.is_empty() {
        println!("No stories");
    }
    for story in &stories {
        print_story(mirror, story, false);
    }
    Ok(())
}

async fn watch(mirror: &mut ChainMirror) -> NodeResult<()> {
    let mut updates = mirror.coordinator().state().subscribe();
    mirror.start_polling();

    let started = Instant::now();
    let wait_for_shutdown = wait_for_shutdown_signal();
    tokio::pin!(wait_for_shutdown);
    loop {
        tokio::select! {
            res = &mut wait_for_shutdown => {
                match res {
                    Ok(signal) => debug!("Stopping watch on {}", signal),
                    Err(err) => error!(
                        "Failed to wait for shutdown signal: {:?}",
                        err
                    ),
                }
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let count = updates.borrow_and_update().len();
                info!("Mirror holds {} stories", count);
            }
        }
    }
    // No new poll starts while the services stop
    mirror.lifecycle().send_replace(AppState::Inactive);
    debug!("Watched for {:?}", started.elapsed());
    Ok(())
}

async fn transactions(
    mirror: &ChainMirror,
    prune: bool,
    status: Option<&str>,
) -> NodeResult<()> {
    let status = status.map(TransactionStatus::try_from).transpose()?;
    let tracker = mirror.tracker();
    if prune {
        let removed = tracker.prune().await;
        println!("Pruned {removed} transactions");
    }
    let listed = match status {
        Some(status) => tracker.by_status(status).await,
        None => tracker.all().await,
    };
    if listed.is_empty() {
        println!("No tracked transactions");
    }
    for tx in listed {
        let mut line = format!(
            "{} {:<14} {:<9} at {}",
            tx.id,
            tx.kind.as_str(),
            tx.status.as_str(),
            tx.created_at
        );
        if let Some(error) = &tx.error {
            line.push_str(&format!(" ({error})"));
        }
        println!("{line}");
    }
    Ok(())
}

async fn submit(
    mirror: &ChainMirror,
    id: String,
    kind: &str,
    payload: &str,
) -> NodeResult<()> {
    let kind = TransactionKind::try_from(kind)?;
    let transaction = SignedTransaction::from_hex(payload)
        .map_err(|err| NodeError::InvalidPayload(err.to_string()))?;
    match mirror
        .submitter()
        .submit(id.clone(), kind, &transaction, None)
        .await?
    {
        BroadcastOutcome::Accepted { txid } => {
            println!("Transaction {id} accepted as {txid}")
        }
        outcome @ BroadcastOutcome::Rejected { .. } => println!(
            "Transaction {id} rejected: {}",
            outcome.rejection_message().unwrap_or_default()
        ),
    }
    Ok(())
}

fn print_story(mirror: &ChainMirror, story: &Story, with_rounds: bool) {
    let timer =
        compute_snapshot(mirror.clock().now_secs(), &story.round_timing());
    println!(
        "#{} {} by {} | round {}/{} | {} ({:.0}%){}",
        story.id,
        story.title,
        story.author,
        story.current_round,
        story.max_rounds,
        timer.formatted_time_remaining,
        timer.round_progress_percentage,
        if story.is_sealed { " | sealed" } else { "" }
    );
    if with_rounds {
        for round in &story.rounds {
            println!(
                "  {:>3}. {} ({} votes{}): {}",
                round.round,
                round.author,
                round.votes,
                if round.finalized { ", final" } else { "" },
                round.content
            );
        }
    }
}
