//! Bridge facade
//!
//! [`LiquidityBridge`] reconciles one direction between two chains. It owns a
//! log filter on each chain, fetches the three event streams on every call,
//! and hands them to its [`TransferStrategy`] for partitioning and payload
//! generation. Nothing is cached between calls.

mod deposit;
mod withdrawal;

pub use deposit::DepositStrategy;
pub use withdrawal::WithdrawalStrategy;

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::Log;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assembler::{to_pending_transfers, TransferRoute};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, ExternalContext, Result};
use crate::evm::{
    events::log_metadata, topics, FilterRegistry, IndexedLogQuery, LiquidityTransferredEvent,
    LogFilter, LogQuery, RpcLogPoller, SentEvent, StepEvent,
};
use crate::metrics;
use crate::quorum;
use crate::types::{Direction, LogKey, LogMetadata, PendingTransfer, Transfer, TransferStatus};

/// `LiquidityTransferred` indexes `fromChainSelector` as topic 2
const FROM_CHAIN_SELECTOR_TOPIC_INDEX: usize = 2;
/// `LiquidityTransferred` indexes `toChainSelector` as topic 3
const TO_CHAIN_SELECTOR_TOPIC_INDEX: usize = 3;

/// Operations exposed to the rebalancing layer
#[async_trait]
pub trait Bridge: Send + Sync {
    /// All in-flight transfers of `local_token` to `remote_token`
    async fn get_transfers(
        &self,
        local_token: Address,
        remote_token: Address,
    ) -> Result<Vec<PendingTransfer>>;

    /// Bridge-specific send payload and native fee for a new transfer
    async fn get_bridge_payload_and_fee(&self, transfer: &Transfer) -> Result<(Bytes, U256)>;

    /// Accept a payload once more than `f` observers agree on its nonce
    fn quorumized_bridge_payload(&self, payloads: &[Bytes], f: usize) -> Result<Bytes>;

    /// Unregister the log filters on both chains
    async fn close(&self) -> Result<()>;
}

/// Log service handles for one chain
#[derive(Clone)]
pub struct ChainLogs {
    pub logs: Arc<dyn LogQuery>,
    pub filters: Arc<dyn FilterRegistry>,
}

impl ChainLogs {
    pub fn new(logs: Arc<dyn LogQuery>, filters: Arc<dyn FilterRegistry>) -> Self {
        Self { logs, filters }
    }

    /// Use one RPC poller for both queries and filter registration
    pub fn from_poller(poller: Arc<RpcLogPoller>) -> Self {
        Self {
            logs: poller.clone(),
            filters: poller,
        }
    }
}

/// Where a direction's bridge steps are emitted on the remote chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSource {
    pub address: Address,
    pub event: B256,
    pub topic_index: usize,
    pub value: B256,
}

/// Sent events split by readiness
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub not_ready: Vec<SentEvent>,
    pub ready: Vec<SentEvent>,
}

/// Direction-specific behavior of a [`LiquidityBridge`]
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    type Step: StepEvent + 'static;

    fn direction(&self) -> Direction;

    fn step_source(&self, config: &BridgeConfig) -> StepSource;

    fn parse_step(&self, log: &Log) -> eyre::Result<Self::Step>;

    fn partition(
        &self,
        config: &BridgeConfig,
        local_token: Address,
        sent: &[SentEvent],
        steps: &[Self::Step],
        received: &[SentEvent],
    ) -> Result<Partition>;

    /// Payload for the next action of each ready transfer, in order
    async fn ready_payloads(&self, ready: &[SentEvent]) -> Result<Vec<Bytes>>;

    async fn bridge_payload_and_fee(&self, _transfer: &Transfer) -> Result<(Bytes, U256)> {
        Ok((Bytes::new(), U256::ZERO))
    }
}

/// Reconciles one direction of liquidity transfers between two chains
pub struct LiquidityBridge<S> {
    config: BridgeConfig,
    local: ChainLogs,
    remote: ChainLogs,
    strategy: S,
    local_filter: String,
    remote_filter: String,
}

impl<S: TransferStrategy> LiquidityBridge<S> {
    /// Create a bridge and register its log filters on both chains
    pub async fn new(config: BridgeConfig, local: ChainLogs, remote: ChainLogs, strategy: S) -> Result<Self> {
        let direction = strategy.direction();
        let step = strategy.step_source(&config);
        let transferred = topics::topic(topics::LIQUIDITY_TRANSFERRED);

        let local_filter = LogFilter {
            name: filter_name(direction, "local", &config),
            addresses: vec![config.local_liquidity_manager],
            events: vec![transferred],
            retention: config.filter_retention,
        };

        let mut remote_addresses = vec![config.remote_liquidity_manager];
        if step.address != config.remote_liquidity_manager {
            remote_addresses.push(step.address);
        }
        let mut remote_events = vec![transferred];
        if step.event != transferred {
            remote_events.push(step.event);
        }
        let remote_filter = LogFilter {
            name: filter_name(direction, "remote", &config),
            addresses: remote_addresses,
            events: remote_events,
            retention: config.filter_retention,
        };

        local
            .filters
            .register_filter(&local_filter)
            .await
            .external_context(|| format!("register local filter {}", local_filter.name))?;
        remote
            .filters
            .register_filter(&remote_filter)
            .await
            .external_context(|| format!("register remote filter {}", remote_filter.name))?;

        info!(
            direction = %direction,
            local_selector = %config.local_selector,
            remote_selector = %config.remote_selector,
            local_filter = %local_filter.name,
            remote_filter = %remote_filter.name,
            "Liquidity bridge initialized"
        );

        Ok(Self {
            config,
            local,
            remote,
            strategy,
            local_filter: local_filter.name,
            remote_filter: remote_filter.name,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Names of the local and remote log filters
    pub fn filter_names(&self) -> (&str, &str) {
        (&self.local_filter, &self.remote_filter)
    }

    fn since(&self) -> DateTime<Utc> {
        let now = Utc::now();
        chrono::Duration::from_std(self.config.lookback)
            .ok()
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    async fn fetch(&self, chain: &ChainLogs, query: IndexedLogQuery, what: &str) -> Result<Vec<Log>> {
        let logs = chain
            .logs
            .fetch_indexed_logs(&query)
            .await
            .external_context(|| format!("fetch {} logs", what))?;
        debug!(direction = %self.strategy.direction(), count = logs.len(), "Fetched {} logs", what);
        Ok(logs)
    }

    async fn reconcile(&self, local_token: Address, remote_token: Address) -> Result<Vec<PendingTransfer>> {
        let direction = self.strategy.direction();
        let since = self.since();
        let transferred = topics::topic(topics::LIQUIDITY_TRANSFERRED);
        let step = self.strategy.step_source(&self.config);

        let sent_logs = self
            .fetch(
                &self.local,
                IndexedLogQuery {
                    event: transferred,
                    address: self.config.local_liquidity_manager,
                    topic_index: TO_CHAIN_SELECTOR_TOPIC_INDEX,
                    values: vec![self.config.remote_selector.to_topic()],
                    since,
                    confirmations: self.config.confirmations,
                },
                "sent",
            )
            .await?;

        let step_logs = self
            .fetch(
                &self.remote,
                IndexedLogQuery {
                    event: step.event,
                    address: step.address,
                    topic_index: step.topic_index,
                    values: vec![step.value],
                    since,
                    confirmations: self.config.confirmations,
                },
                "bridge step",
            )
            .await?;

        let received_logs = self
            .fetch(
                &self.remote,
                IndexedLogQuery {
                    event: transferred,
                    address: self.config.remote_liquidity_manager,
                    topic_index: FROM_CHAIN_SELECTOR_TOPIC_INDEX,
                    values: vec![self.config.local_selector.to_topic()],
                    since,
                    confirmations: self.config.confirmations,
                },
                "received",
            )
            .await?;

        let sent = parse_logs(&sent_logs, LiquidityTransferredEvent::from_log, "sent")?;
        let steps = parse_logs(&step_logs, |log| self.strategy.parse_step(log), "bridge step")?;
        let received = parse_logs(&received_logs, LiquidityTransferredEvent::from_log, "received")?;

        let metadata = sent_logs
            .iter()
            .map(log_metadata)
            .collect::<eyre::Result<HashMap<LogKey, LogMetadata>>>()
            .external_context(|| "read sent log metadata")?;

        let partition = self
            .strategy
            .partition(&self.config, local_token, &sent, &steps, &received)?;
        let ready_data = self.strategy.ready_payloads(&partition.ready).await?;

        let route = TransferRoute {
            from: self.config.local_selector,
            to: self.config.remote_selector,
            sender: self.config.local_liquidity_manager,
            receiver: self.config.remote_liquidity_manager,
            local_token,
            remote_token,
        };
        let transfers = to_pending_transfers(
            &route,
            &partition.not_ready,
            &partition.ready,
            &ready_data,
            &metadata,
        )?;

        for (status, count) in [
            (TransferStatus::NotReady, partition.not_ready.len()),
            (TransferStatus::Ready, partition.ready.len()),
        ] {
            metrics::set_pending_transfers(
                direction,
                self.config.local_selector,
                self.config.remote_selector,
                status,
                count,
            );
        }

        info!(
            direction = %direction,
            sent = sent.len(),
            steps = steps.len(),
            received = received.len(),
            not_ready = partition.not_ready.len(),
            ready = partition.ready.len(),
            "Reconciled liquidity transfers"
        );

        Ok(transfers)
    }
}

impl LiquidityBridge<DepositStrategy> {
    /// L1 -> L2 bridge: local chain is L1, remote chain is L2
    pub async fn deposit(
        config: BridgeConfig,
        l1: ChainLogs,
        l2: ChainLogs,
        strategy: DepositStrategy,
    ) -> Result<Self> {
        Self::new(config, l1, l2, strategy).await
    }
}

impl LiquidityBridge<WithdrawalStrategy> {
    /// L2 -> L1 bridge: local chain is L2, remote chain is L1
    pub async fn withdrawal(
        config: BridgeConfig,
        l2: ChainLogs,
        l1: ChainLogs,
        strategy: WithdrawalStrategy,
    ) -> Result<Self> {
        Self::new(config, l2, l1, strategy).await
    }
}

#[async_trait]
impl<S: TransferStrategy> Bridge for LiquidityBridge<S> {
    async fn get_transfers(
        &self,
        local_token: Address,
        remote_token: Address,
    ) -> Result<Vec<PendingTransfer>> {
        self.reconcile(local_token, remote_token).await.inspect_err(|e| {
            warn!(direction = %self.strategy.direction(), error = %e, "Reconciliation failed");
            metrics::record_error(self.strategy.direction());
        })
    }

    async fn get_bridge_payload_and_fee(&self, transfer: &Transfer) -> Result<(Bytes, U256)> {
        self.strategy.bridge_payload_and_fee(transfer).await
    }

    fn quorumized_bridge_payload(&self, payloads: &[Bytes], f: usize) -> Result<Bytes> {
        quorum::quorumized_bridge_payload(payloads, f)
    }

    async fn close(&self) -> Result<()> {
        let local = self.local.filters.unregister_filter(&self.local_filter).await;
        let remote = self.remote.filters.unregister_filter(&self.remote_filter).await;

        let errors: Vec<String> = [(&self.local_filter, local), (&self.remote_filter, remote)]
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| format!("{}: {:#}", name, e)))
            .collect();

        if errors.is_empty() {
            info!(direction = %self.strategy.direction(), "Liquidity bridge closed");
            Ok(())
        } else {
            Err(BridgeError::Close { errors })
        }
    }
}

fn filter_name(direction: Direction, side: &str, config: &BridgeConfig) -> String {
    format!(
        "LiquidityBridge-{}-{}-{}-{}",
        direction, side, config.local_selector, config.remote_selector
    )
}

fn parse_logs<T, F>(logs: &[Log], parse: F, what: &str) -> Result<Vec<T>>
where
    F: Fn(&Log) -> eyre::Result<T>,
{
    logs.iter()
        .map(|log| {
            parse(log).external_context(|| {
                format!(
                    "parse {} log {}",
                    what,
                    log.transaction_hash.unwrap_or_default()
                )
            })
        })
        .collect()
}
