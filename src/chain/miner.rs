use crate::chain::DevChain;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Mine a block every `block_time` until shutdown is signalled.
/// Empty blocks are mined too, so block height keeps advancing like a geth dev node.
/// A zero `block_time` is an error.
pub async fn run_miner(
    chain: Arc<DevChain>,
    block_time: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    anyhow::ensure!(!block_time.is_zero(), "miner block time must be non-zero");
    let mut ticker = tokio::time::interval(block_time);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    info!(?block_time, "miner started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let block = chain.mine_block();
                debug!(number = block.number, txs = block.transactions.len(), "mined block");
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    info!("miner stopped");
    Ok(())
}
