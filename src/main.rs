//! Log-tailing runner: polls the chain for Antibot contract logs and feeds
//! them to the reconciler in block order, checkpointing after each chunk.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use antibot_indexer::config::Config;
use antibot_indexer::env::harden_env_setup;
use antibot_indexer::events::{antibot_event_topics, AntibotEvent};
use antibot_indexer::reconciler::Reconciler;
use antibot_indexer::store::SqliteStore;
use std::time::Duration;

const RPC_RETRY_BASE_MS: u64 = 1_000;
const RPC_RETRY_MAX_MS: u64 = 60_000;

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    harden_env_setup();
    init_tracing();

    let cfg = Config::load()?;
    let store = SqliteStore::open(&cfg.db_path)?;
    let provider = ProviderBuilder::new().on_http(cfg.eth_rpc_url.parse()?);
    let reconciler = Reconciler::new(store.clone());

    tracing::info!(
        "[INDEX] Starting antibot indexer: contract={:#x} db={} start_block={}",
        cfg.antibot_address,
        cfg.db_path,
        cfg.start_block
    );

    let topics = antibot_event_topics();
    let mut backoff_ms = RPC_RETRY_BASE_MS;

    loop {
        let head = match provider.get_block_number().await {
            Ok(number) => {
                backoff_ms = RPC_RETRY_BASE_MS;
                number
            }
            Err(err) => {
                tracing::warn!(
                    "[INDEX] Head poll failed, retrying in {}ms: {}",
                    backoff_ms,
                    err
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(RPC_RETRY_MAX_MS);
                continue;
            }
        };

        let mut from = match store.load_checkpoint()? {
            Some(block) => block.saturating_add(1),
            None => cfg.start_block,
        };

        while from <= head {
            let to = from.saturating_add(cfg.log_chunk_blocks - 1).min(head);
            let filter = Filter::new()
                .address(cfg.antibot_address)
                .event_signature(topics.clone())
                .from_block(from)
                .to_block(to);

            // Transport failures re-poll the same range; store and decode
            // failures abort the run uncaught.
            let logs = match provider.get_logs(&filter).await {
                Ok(logs) => logs,
                Err(err) => {
                    tracing::warn!(
                        "[INDEX] get_logs failed for blocks [{}..={}], retrying in {}ms: {}",
                        from,
                        to,
                        backoff_ms,
                        err
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(RPC_RETRY_MAX_MS);
                    continue;
                }
            };
            backoff_ms = RPC_RETRY_BASE_MS;

            let mut applied = 0usize;
            for log in &logs {
                let Some(event) = AntibotEvent::decode(&log.inner)? else {
                    continue;
                };
                tracing::debug!("[INDEX] {} at block {:?}", event.name(), log.block_number);
                reconciler.handle(&event)?;
                applied += 1;
            }
            store.save_checkpoint(to)?;
            if applied > 0 {
                tracing::info!(
                    "[INDEX] Applied {} event(s) in blocks [{}..={}]",
                    applied,
                    from,
                    to
                );
            }
            from = to.saturating_add(1);
        }

        tokio::time::sleep(Duration::from_millis(cfg.poll_interval_ms)).await;
    }
}
