//! L1 -> L2 deposits through the native standard bridge

use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::Log;
use async_trait::async_trait;

use super::{Partition, StepSource, TransferStrategy};
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::evm::{topics, BridgeFinalizedEvent, SentEvent};
use crate::matching::{partition_deposits, DepositExpectations};
use crate::types::Direction;

/// `ERC20BridgeFinalized` indexes `from` as topic 3
const FINALIZED_FROM_TOPIC_INDEX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositStrategy {
    /// L1 adapter that initiates native bridge deposits
    pub l1_bridge_adapter: Address,
    /// L2 standard bridge emitting `ERC20BridgeFinalized`
    pub l2_standard_bridge: Address,
}

impl DepositStrategy {
    pub fn new(l1_bridge_adapter: Address, l2_standard_bridge: Address) -> Self {
        Self {
            l1_bridge_adapter,
            l2_standard_bridge,
        }
    }
}

#[async_trait]
impl TransferStrategy for DepositStrategy {
    type Step = BridgeFinalizedEvent;

    fn direction(&self) -> Direction {
        Direction::Deposit
    }

    fn step_source(&self, _config: &BridgeConfig) -> StepSource {
        StepSource {
            address: self.l2_standard_bridge,
            event: topics::topic(topics::ERC20_BRIDGE_FINALIZED),
            topic_index: FINALIZED_FROM_TOPIC_INDEX,
            value: self.l1_bridge_adapter.into_word(),
        }
    }

    fn parse_step(&self, log: &Log) -> eyre::Result<BridgeFinalizedEvent> {
        BridgeFinalizedEvent::from_log(log)
    }

    fn partition(
        &self,
        config: &BridgeConfig,
        local_token: Address,
        sent: &[SentEvent],
        steps: &[BridgeFinalizedEvent],
        received: &[SentEvent],
    ) -> Result<Partition> {
        let expected = DepositExpectations {
            local_token,
            l1_bridge_adapter: self.l1_bridge_adapter,
            l2_liquidity_manager: config.remote_liquidity_manager,
        };
        let partition = partition_deposits(&expected, sent, steps, received)?;

        Ok(Partition {
            not_ready: partition.not_ready,
            ready: partition.ready,
        })
    }

    /// The L2 liquidity manager claims a finalized deposit with the packed
    /// nonce it was sent with.
    async fn ready_payloads(&self, ready: &[SentEvent]) -> Result<Vec<Bytes>> {
        Ok(ready
            .iter()
            .map(|event| event.bridge_return_data.clone())
            .collect())
    }
}
