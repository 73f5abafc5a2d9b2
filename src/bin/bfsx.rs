// Headless explorer: polls the node and logs every view change

use anyhow::{Context, Result};
use std::sync::Arc;

use bfsx::{
    config::load,
    poller::{IntervalTicker, Poller},
    resolver::RouteResolver,
    types::Detail,
    util_text::{format_amount, format_timestamp, short_hash, BLOCK_HASH_PREVIEW, TX_HASH_PREVIEW},
    view_model::{DetailState, ViewModel},
    ExplorerApi, HttpTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = load().context("Failed to load configuration")?;
    cfg.print_summary();

    let transport = HttpTransport::new(&cfg.api_url, cfg.request_timeout_ms)
        .with_context(|| format!("Failed to build HTTP client for {}", cfg.api_url))?;
    let api = Arc::new(ExplorerApi::new(transport));
    let view = ViewModel::new();

    let mut blocks_rx = view.subscribe_blocks();
    let mut pool_rx = view.subscribe_pending_pool();
    let mut detail_rx = view.subscribe_detail();

    let mut poller = Poller::new(api.clone(), view.clone()).with_overlap(cfg.overlap);
    poller.start(IntervalTicker::new(cfg.poll_interval()));

    let mut resolver = RouteResolver::new(api, view.clone());
    if let Some(path) = &cfg.route {
        resolver
            .resolve_path(path)
            .with_context(|| format!("Cannot open route {path}"))?;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("interrupted, shutting down");
                break;
            }
            Ok(()) = blocks_rx.changed() => {
                let blocks = blocks_rx.borrow_and_update().clone();
                match blocks.first() {
                    Some(head) => println!(
                        "blocks: {} (newest #{} {} {})",
                        blocks.len(),
                        head.number,
                        short_hash(&head.hash, BLOCK_HASH_PREVIEW),
                        head.timestamp_seconds.map(format_timestamp).unwrap_or_else(|| "-".into()),
                    ),
                    None => println!("blocks: none"),
                }
            }
            Ok(()) = pool_rx.changed() => {
                let pool = pool_rx.borrow_and_update().clone();
                println!("pending pool: {} txs", pool.len());
                for tx in pool.values() {
                    println!(
                        "  {} {} -> {} {}",
                        short_hash(&tx.hash, TX_HASH_PREVIEW),
                        short_hash(&tx.from, TX_HASH_PREVIEW),
                        short_hash(&tx.to, TX_HASH_PREVIEW),
                        format_amount(&tx.value),
                    );
                }
            }
            Ok(()) = detail_rx.changed() => {
                let state = detail_rx.borrow_and_update().clone();
                print_detail(&state);
            }
        }
    }

    poller.stop();
    resolver.teardown();
    Ok(())
}

fn print_detail(state: &DetailState) {
    match state {
        DetailState::None => {}
        DetailState::Loading(route) => println!("{route}: loading"),
        DetailState::Failed { route, error } => println!("{route}: {error}"),
        DetailState::Ready { route, detail } => match detail {
            Detail::Block(block) => {
                println!(
                    "{route}: block #{} {} mined={} txs={}",
                    block.number, block.hash, block.mined, block.transaction_count
                );
                if let Some(reward) = &block.reward {
                    println!("  reward {}", format_amount(reward));
                }
                for tx in block.transactions.iter().flatten() {
                    println!(
                        "  {} {}",
                        short_hash(&tx.hash, TX_HASH_PREVIEW),
                        format_amount(&tx.value)
                    );
                }
            }
            Detail::Account(account) => println!(
                "{route}: balance {} nonce {}",
                format_amount(&account.balance),
                account.nonce
            ),
            Detail::Transaction(tx) => println!(
                "{route}: {} -> {} {} at {}",
                tx.from,
                tx.to,
                format_amount(&tx.value),
                format_timestamp(tx.timestamp_seconds)
            ),
        },
    }
}
