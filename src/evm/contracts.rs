//! Contract ABI definitions
//!
//! Uses alloy's sol! macro to generate event and struct bindings for the
//! liquidity manager, the OP-stack standard bridge, and the withdrawal
//! payloads consumed by the L1 bridge adapter.

use alloy::sol;

sol! {
    /// Liquidity manager events (same contract on both chains)
    contract LiquidityManager {
        /// Emitted on the source chain when liquidity is sent, and on the
        /// destination chain when it is received.
        ///
        /// On send, `bridgeReturnData` holds the adapter-assigned nonce.
        /// On receive, `bridgeSpecificData` holds the same nonce.
        event LiquidityTransferred(
            uint64 indexed ocrSeqNum,
            uint64 indexed fromChainSelector,
            uint64 indexed toChainSelector,
            address to,
            uint256 amount,
            bytes bridgeSpecificData,
            bytes bridgeReturnData
        );

        /// Emitted when an intermediate bridge step (e.g. proving a
        /// withdrawal) completes. `bridgeSpecificData` holds the nonce.
        event FinalizationStepCompleted(
            uint64 indexed ocrSeqNum,
            uint64 indexed remoteChainSelector,
            bytes bridgeSpecificData
        );
    }

    /// OP-stack L2 standard bridge
    contract L2StandardBridge {
        /// Emitted on L2 when a deposit is finalized.
        ///
        /// `localToken` is the L2 token, `remoteToken` the L1 token.
        /// `extraData` carries the nonce passed through by the L1 adapter.
        event ERC20BridgeFinalized(
            address indexed localToken,
            address indexed remoteToken,
            address indexed from,
            address to,
            uint256 amount,
            bytes extraData
        );
    }

    /// Withdrawal message passed from L2 to L1
    #[derive(Debug, PartialEq, Eq)]
    struct WithdrawalTransaction {
        uint256 nonce;
        address sender;
        address target;
        uint256 value;
        uint256 gasLimit;
        bytes data;
    }

    /// Output root preimage used to prove a withdrawal
    #[derive(Debug, PartialEq, Eq)]
    struct OutputRootProof {
        bytes32 version;
        bytes32 stateRoot;
        bytes32 messagePasserStorageRoot;
        bytes32 latestBlockhash;
    }

    /// Parameters of `OptimismPortal.proveWithdrawalTransaction`
    #[derive(Debug, PartialEq, Eq)]
    struct ProveWithdrawalParams {
        WithdrawalTransaction withdrawalTransaction;
        uint256 l2OutputIndex;
        OutputRootProof outputRootProof;
        bytes[] withdrawalProof;
    }

    /// Envelope understood by the L1 bridge adapter's finalize entry point
    #[derive(Debug, PartialEq, Eq)]
    struct FinalizeWithdrawERC20Payload {
        uint8 action;
        bytes data;
    }
}

/// `FinalizeWithdrawERC20Payload.action` for the prove step
pub const ACTION_PROVE_WITHDRAWAL: u8 = 0;

/// `FinalizeWithdrawERC20Payload.action` for the finalize step
pub const ACTION_FINALIZE_WITHDRAWAL: u8 = 1;
