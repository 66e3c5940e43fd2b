//! End-to-end reconciliation through the public API with in-memory chains

use alloy::primitives::{Address, Bytes, Log as PrimitiveLog, LogData, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use liquidity_bridge::evm::contracts::{
    L2StandardBridge, LiquidityManager, OutputRootProof, WithdrawalTransaction,
};
use liquidity_bridge::evm::{FilterRegistry, IndexedLogQuery, LogFilter, LogQuery};
use liquidity_bridge::prover::{encode_finalize_withdrawal_payload, WithdrawalProof, WithdrawalProver};
use liquidity_bridge::{
    encode_nonce, Bridge, BridgeConfig, ChainLogs, ChainSelector, DepositStrategy,
    LiquidityBridge, TransferStage, TransferStatus, WithdrawalStrategy,
};

const L1: ChainSelector = ChainSelector(1);
const L2: ChainSelector = ChainSelector(10);

const L1_MANAGER: Address = Address::repeat_byte(0xa1);
const L2_MANAGER: Address = Address::repeat_byte(0xa2);
const L1_TOKEN: Address = Address::repeat_byte(0x11);
const L2_TOKEN: Address = Address::repeat_byte(0x22);
const L1_ADAPTER: Address = Address::repeat_byte(0xb1);
const L2_STANDARD_BRIDGE: Address = Address::repeat_byte(0xb2);

/// In-memory log store answering indexed queries
#[derive(Default)]
struct Chain {
    logs: Mutex<Vec<Log>>,
    filters: Mutex<Vec<String>>,
}

impl Chain {
    fn push(&self, address: Address, data: LogData, tx: u8) {
        let mut logs = self.logs.lock().unwrap();
        let log_index = logs.len() as u64;
        logs.push(Log {
            inner: PrimitiveLog { address, data },
            block_hash: Some(B256::with_last_byte(tx)),
            block_number: Some(tx as u64),
            block_timestamp: Some(1_800_000_000 + tx as u64),
            transaction_hash: Some(B256::with_last_byte(tx)),
            transaction_index: Some(0),
            log_index: Some(log_index),
            removed: false,
        });
    }
}

#[async_trait]
impl LogQuery for Chain {
    async fn fetch_indexed_logs(&self, query: &IndexedLogQuery) -> eyre::Result<Vec<Log>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                let topics = log.topics();
                log.address() == query.address
                    && topics.first() == Some(&query.event)
                    && topics
                        .get(query.topic_index)
                        .is_some_and(|t| query.values.contains(t))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FilterRegistry for Chain {
    async fn register_filter(&self, filter: &LogFilter) -> eyre::Result<()> {
        self.filters.lock().unwrap().push(filter.name.clone());
        Ok(())
    }

    async fn unregister_filter(&self, name: &str) -> eyre::Result<()> {
        let mut filters = self.filters.lock().unwrap();
        let before = filters.len();
        filters.retain(|f| f != name);
        if filters.len() == before {
            eyre::bail!("unknown filter {}", name);
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn logs(chain: &Arc<Chain>) -> ChainLogs {
    ChainLogs::new(chain.clone(), chain.clone())
}

fn transferred(from: ChainSelector, to: ChainSelector, receiver: Address, specific: Bytes, ret: Bytes) -> LogData {
    LiquidityManager::LiquidityTransferred {
        ocrSeqNum: 1,
        fromChainSelector: from.0,
        toChainSelector: to.0,
        to: receiver,
        amount: U256::from(1_000),
        bridgeSpecificData: specific,
        bridgeReturnData: ret,
    }
    .encode_log_data()
}

fn nonce(n: u64) -> Bytes {
    encode_nonce(U256::from(n))
}

fn config(local: ChainSelector, remote: ChainSelector, local_manager: Address, remote_manager: Address) -> BridgeConfig {
    BridgeConfig {
        local_selector: local,
        remote_selector: remote,
        local_liquidity_manager: local_manager,
        remote_liquidity_manager: remote_manager,
        lookback: Duration::from_secs(u32::MAX as u64),
        confirmations: 1,
        filter_retention: Duration::from_secs(86_400),
    }
}

#[tokio::test]
async fn deposit_transfers_across_all_stages() {
    init_tracing();
    let l1 = Arc::new(Chain::default());
    let l2 = Arc::new(Chain::default());

    for n in 1..=3u8 {
        l1.push(L1_MANAGER, transferred(L1, L2, L2_MANAGER, Bytes::new(), nonce(n as u64)), n);
    }
    for n in [2u64, 3, 0x65] {
        let data = L2StandardBridge::ERC20BridgeFinalized {
            localToken: L2_TOKEN,
            remoteToken: L1_TOKEN,
            from: L1_ADAPTER,
            to: L2_MANAGER,
            amount: U256::from(1_000),
            extraData: nonce(n),
        }
        .encode_log_data();
        l2.push(L2_STANDARD_BRIDGE, data, 0x40 + n as u8);
    }
    l2.push(L2_MANAGER, transferred(L1, L2, L2_MANAGER, nonce(3), Bytes::new()), 0x80);

    let bridge = LiquidityBridge::deposit(
        config(L1, L2, L1_MANAGER, L2_MANAGER),
        logs(&l1),
        logs(&l2),
        DepositStrategy::new(L1_ADAPTER, L2_STANDARD_BRIDGE),
    )
    .await
    .unwrap();

    let mut transfers = bridge.get_transfers(L1_TOKEN, L2_TOKEN).await.unwrap();
    transfers.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].status, TransferStatus::NotReady);
    assert_eq!(transfers[0].transfer.stage, TransferStage::Initiated);
    assert_eq!(transfers[0].id, format!("{}-0", B256::with_last_byte(1)));
    assert_eq!(transfers[0].transfer.date.timestamp(), 1_800_000_001);

    assert_eq!(transfers[1].status, TransferStatus::Ready);
    assert_eq!(transfers[1].transfer.stage, TransferStage::FinalizationReady);
    assert_eq!(transfers[1].transfer.bridge_data, nonce(2));

    bridge.close().await.unwrap();
    assert!(l1.filters.lock().unwrap().is_empty());
    assert!(l2.filters.lock().unwrap().is_empty());
    // Filters are gone, so a second close reports both failures
    assert!(bridge.close().await.is_err());
}

struct FixedProver;

#[async_trait]
impl WithdrawalProver for FixedProver {
    async fn prove(&self, tx_hash: B256) -> eyre::Result<WithdrawalProof> {
        Ok(WithdrawalProof {
            withdrawal: WithdrawalTransaction {
                nonce: U256::from_be_bytes(tx_hash.0),
                sender: L2_MANAGER,
                target: L1_MANAGER,
                value: U256::ZERO,
                gasLimit: U256::from(100_000),
                data: Bytes::new(),
            },
            l2_output_index: U256::from(1),
            output_root_proof: OutputRootProof {
                version: B256::ZERO,
                stateRoot: B256::ZERO,
                messagePasserStorageRoot: B256::ZERO,
                latestBlockhash: B256::ZERO,
            },
            withdrawal_proof: vec![],
        })
    }
}

#[tokio::test]
async fn withdrawal_transfers_need_proof_then_finalization() {
    init_tracing();
    let l2 = Arc::new(Chain::default());
    let l1 = Arc::new(Chain::default());

    for n in 1..=3u8 {
        l2.push(L2_MANAGER, transferred(L2, L1, L1_MANAGER, Bytes::new(), nonce(n as u64)), n);
    }
    for n in [2u64, 3] {
        let data = LiquidityManager::FinalizationStepCompleted {
            ocrSeqNum: 1,
            remoteChainSelector: L2.0,
            bridgeSpecificData: nonce(n),
        }
        .encode_log_data();
        l1.push(L1_MANAGER, data, 0x40 + n as u8);
    }
    l1.push(L1_MANAGER, transferred(L2, L1, L1_MANAGER, nonce(3), Bytes::new()), 0x80);

    let bridge = LiquidityBridge::withdrawal(
        config(L2, L1, L2_MANAGER, L1_MANAGER),
        logs(&l2),
        logs(&l1),
        WithdrawalStrategy::new(Arc::new(FixedProver)),
    )
    .await
    .unwrap();

    let mut transfers = bridge.get_transfers(L2_TOKEN, L1_TOKEN).await.unwrap();
    transfers.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].status, TransferStatus::NotReady);
    assert!(transfers[0].transfer.bridge_data.is_empty());

    let proof = FixedProver.prove(B256::with_last_byte(2)).await.unwrap();
    assert_eq!(transfers[1].status, TransferStatus::Ready);
    assert_eq!(
        transfers[1].transfer.bridge_data,
        encode_finalize_withdrawal_payload(&proof.withdrawal)
    );
    assert_eq!(transfers[1].transfer.from, L2);
    assert_eq!(transfers[1].transfer.receiver, L1_MANAGER);

    // L1 echoes the finalize payload it was handed as the received data
    let finalize_payload = transfers[1].transfer.bridge_data.clone();
    l1.push(L1_MANAGER, transferred(L2, L1, L1_MANAGER, finalize_payload, Bytes::new()), 0x81);

    let transfers = bridge.get_transfers(L2_TOKEN, L1_TOKEN).await.unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].status, TransferStatus::NotReady);
    assert_eq!(transfers[0].id, format!("{}-0", B256::with_last_byte(1)));

    bridge.close().await.unwrap();
}
