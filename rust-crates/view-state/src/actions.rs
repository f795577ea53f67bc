//! State-changing calls and the user-visible state of a submitted transaction.
//!
//! Submission returns as soon as the node hands back a hash; confirmation is
//! awaited separately. Any failure on the way, including a revert, ends in
//! [`ActionState::Failed`] carrying the underlying message verbatim.

use crate::{
    Result,
    address::Address,
    game::TokenId,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Create {
        asset: Address,
        players: Vec<Address>,
        amount: u128,
    },
    Deposit {
        token_id: TokenId,
    },
    Claim {
        token_id: TokenId,
    },
    Recover {
        token_id: TokenId,
    },
    /// Unlimited ERC-20 approval of the Pasanaku contract on `asset`.
    Approve {
        asset: Address,
    },
    /// Test-network mint of `amount` minor units of `asset` to `to`.
    Faucet {
        asset: Address,
        to: Address,
        amount: u128,
    },
}

impl ContractCall {
    pub fn label(&self) -> &'static str {
        match self {
            ContractCall::Create { .. } => "create",
            ContractCall::Deposit { .. } => "deposit",
            ContractCall::Claim { .. } => "claim",
            ContractCall::Recover { .. } => "recover",
            ContractCall::Approve { .. } => "approve",
            ContractCall::Faucet { .. } => "faucet",
        }
    }

    /// Calls that are payable and must carry the protocol fee as value.
    pub fn pays_protocol_fee(&self) -> bool {
        matches!(
            self,
            ContractCall::Create { .. }
                | ContractCall::Deposit { .. }
                | ContractCall::Claim { .. }
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Succeeded,
    Reverted,
}

pub trait TransactionSender {
    fn send(
        &self,
        call: &ContractCall,
        value: u128,
    ) -> impl Future<Output = Result<TxHash>>;

    fn wait_for_receipt(
        &self,
        hash: &TxHash,
    ) -> impl Future<Output = Result<ReceiptStatus>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    Pending(TxHash),
    Confirmed(TxHash),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ActionTracker {
    call: ContractCall,
    state: ActionState,
}

impl ActionTracker {
    pub fn new(call: ContractCall) -> Self {
        Self {
            call,
            state: ActionState::Idle,
        }
    }

    pub fn call(&self) -> &ContractCall {
        &self.call
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ActionState::Pending(_))
    }

    pub async fn submit<S: TransactionSender>(
        &mut self,
        sender: &S,
        value: u128,
    ) -> &ActionState {
        if self.is_pending() {
            return &self.state;
        }
        tracing::info!("submitting {} transaction", self.call.label());
        self.state = match sender.send(&self.call, value).await {
            Ok(hash) => {
                tracing::info!("{} transaction pending: {hash}", self.call.label());
                ActionState::Pending(hash)
            }
            Err(e) => {
                tracing::warn!("{} submission failed: {e:#}", self.call.label());
                ActionState::Failed(format!("{e:#}"))
            }
        };
        &self.state
    }

    /// Await the receipt of a pending submission. Callers re-read every
    /// eligibility fact once this returns [`ActionState::Confirmed`].
    pub async fn confirm<S: TransactionSender>(&mut self, sender: &S) -> &ActionState {
        let ActionState::Pending(hash) = self.state else {
            return &self.state;
        };
        self.state = match sender.wait_for_receipt(&hash).await {
            Ok(ReceiptStatus::Succeeded) => {
                tracing::info!("{} transaction confirmed: {hash}", self.call.label());
                ActionState::Confirmed(hash)
            }
            Ok(ReceiptStatus::Reverted) => {
                ActionState::Failed(format!("transaction {hash} reverted"))
            }
            Err(e) => ActionState::Failed(format!("{e:#}")),
        };
        &self.state
    }
}
