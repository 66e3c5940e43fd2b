//! Provider-backed log service
//!
//! Implements [`LogQuery`] and [`FilterRegistry`] on top of an alloy HTTP
//! provider. Queries are bounded by `latest - confirmations` and a fixed
//! lookback window, split into chunks to stay under RPC range limits, and
//! trimmed client-side to `since`. Nodes that omit `blockTimestamp` on logs
//! get it filled in from the block header.

use alloy::{
    eips::BlockNumberOrTag,
    primitives::Address,
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{BlockTransactionsKind, Filter, Log},
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{eyre, Result, WrapErr};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::evm::logs::{FilterRegistry, IndexedLogQuery, LogFilter, LogQuery};

/// Log service over a single chain's RPC endpoint
pub struct RpcLogPoller {
    /// Read-only provider
    provider: RootProvider<Http<Client>>,
    /// Blocks scanned back from the confirmed head
    lookback_blocks: u64,
    /// Maximum block range per `eth_getLogs` call
    max_block_range: u64,
    /// Registered filters by name
    filters: RwLock<HashMap<String, LogFilter>>,
}

impl RpcLogPoller {
    /// Create a new poller
    pub fn new(config: &PollerConfig) -> Result<Self> {
        let url = config
            .rpc_url
            .parse()
            .map_err(|e| eyre!("Invalid RPC URL: {}", e))?;
        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            provider,
            lookback_blocks: config.lookback_blocks,
            max_block_range: config.max_block_range.max(1),
            filters: RwLock::new(HashMap::new()),
        })
    }

    /// Get the underlying provider
    pub fn provider(&self) -> &RootProvider<Http<Client>> {
        &self.provider
    }

    /// Names of the currently registered filters
    pub async fn filter_names(&self) -> Vec<String> {
        self.filters.read().await.keys().cloned().collect()
    }

    async fn is_indexed(&self, address: &Address, query: &IndexedLogQuery) -> bool {
        self.filters
            .read()
            .await
            .values()
            .any(|f| f.covers(address, &query.event))
    }

    async fn block_timestamp(&self, number: u64) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number), BlockTransactionsKind::Hashes)
            .await
            .wrap_err_with(|| format!("Failed to get block {}", number))?
            .ok_or_else(|| eyre!("Block {} not found", number))?;
        Ok(block.header.timestamp)
    }

    fn base_filter(query: &IndexedLogQuery) -> Result<Filter> {
        let filter = Filter::new()
            .address(query.address)
            .event_signature(query.event);

        let values = query.values.clone();
        match query.topic_index {
            1 => Ok(filter.topic1(values)),
            2 => Ok(filter.topic2(values)),
            3 => Ok(filter.topic3(values)),
            other => Err(eyre!("Invalid indexed topic position {}", other)),
        }
    }
}

/// Split `[from, to]` into inclusive chunks of at most `max_range` blocks
fn block_ranges(from: u64, to: u64, max_range: u64) -> Vec<(u64, u64)> {
    let mut ranges = Vec::new();
    let mut current = from;
    while current <= to {
        let end = std::cmp::min(current.saturating_add(max_range.max(1) - 1), to);
        ranges.push((current, end));
        if end == to {
            break;
        }
        current = end + 1;
    }
    ranges
}

/// Set `block_timestamp` on logs that lack it, one header lookup per block.
/// Returns the number of headers fetched.
async fn fill_block_timestamps<F, Fut>(logs: &mut [Log], block_timestamp: F) -> Result<usize>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let mut timestamps: HashMap<u64, u64> = HashMap::new();
    for log in logs.iter_mut().filter(|log| log.block_timestamp.is_none()) {
        let number = log
            .block_number
            .ok_or_else(|| eyre!("Log without block number"))?;
        let ts = match timestamps.get(&number) {
            Some(ts) => *ts,
            None => {
                let ts = block_timestamp(number).await?;
                timestamps.insert(number, ts);
                ts
            }
        };
        log.block_timestamp = Some(ts);
    }
    Ok(timestamps.len())
}

/// Keep logs emitted at or after `since`
fn retain_since(logs: &mut Vec<Log>, since: DateTime<Utc>) {
    let since = since.timestamp();
    logs.retain(|log| log.block_timestamp.is_some_and(|ts| ts as i64 >= since));
}

#[async_trait]
impl LogQuery for RpcLogPoller {
    async fn fetch_indexed_logs(&self, query: &IndexedLogQuery) -> Result<Vec<Log>> {
        if !self.is_indexed(&query.address, query).await {
            warn!(
                address = %query.address,
                event = %query.event,
                "Querying logs not covered by any registered filter"
            );
        }

        let base = Self::base_filter(query)?;

        let latest = self
            .provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")?;
        let to_block = latest.saturating_sub(query.confirmations);
        let from_block = to_block.saturating_sub(self.lookback_blocks);

        let mut all_logs = Vec::new();
        for (chunk_from, chunk_to) in block_ranges(from_block, to_block, self.max_block_range) {
            let filter = base.clone().from_block(chunk_from).to_block(chunk_to);
            let logs = self.provider.get_logs(&filter).await.wrap_err_with(|| {
                format!("Failed to get logs from block {} to {}", chunk_from, chunk_to)
            })?;
            all_logs.extend(logs);
        }

        let fetched_blocks = fill_block_timestamps(&mut all_logs, |number| self.block_timestamp(number)).await?;
        if fetched_blocks > 0 {
            debug!(blocks = fetched_blocks, "Filled log timestamps from block headers");
        }
        retain_since(&mut all_logs, query.since);

        debug!(
            address = %query.address,
            event = %query.event,
            from_block,
            to_block,
            count = all_logs.len(),
            "Fetched indexed logs"
        );

        Ok(all_logs)
    }
}

#[async_trait]
impl FilterRegistry for RpcLogPoller {
    async fn register_filter(&self, filter: &LogFilter) -> Result<()> {
        if filter.addresses.is_empty() || filter.events.is_empty() {
            return Err(eyre!(
                "Filter {} must name at least one address and one event",
                filter.name
            ));
        }

        let mut filters = self.filters.write().await;
        if filters.insert(filter.name.clone(), filter.clone()).is_some() {
            debug!(name = %filter.name, "Replaced existing log filter");
        } else {
            info!(
                name = %filter.name,
                addresses = filter.addresses.len(),
                events = filter.events.len(),
                retention_secs = filter.retention.as_secs(),
                "Registered log filter"
            );
        }
        Ok(())
    }

    async fn unregister_filter(&self, name: &str) -> Result<()> {
        match self.filters.write().await.remove(name) {
            Some(_) => {
                info!(name, "Unregistered log filter");
                Ok(())
            }
            None => Err(eyre!("Log filter {} is not registered", name)),
        }
    }
}
