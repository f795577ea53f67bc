use crate::bindings::{
    IERC20,
    IPasanaku,
    IPasanakuParticipants,
    IPasanakuPlayers,
};
use alloy::{
    primitives::{
        B256,
        Bytes,
        U256,
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    rpc::types::{
        TransactionInput,
        TransactionRequest,
    },
    sol_types::SolCall,
};
use anyhow::{
    Context,
    Result,
    anyhow,
};
use deployments::TupleLayout;
use pasanaku_view::{
    Address,
    RawGame,
    TokenId,
    actions::{
        ContractCall,
        ReceiptStatus,
        TransactionSender,
        TxHash,
    },
    game::{
        ParticipantsTuple,
        PlayersTuple,
    },
    reads::{
        ContractReader,
        TokenReader,
    },
};
use std::time::Duration;
use url::Url;


const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_MAX_POLLS: u32 = 120;

/// Pasanaku contract and its ERC-20 assets, reached over JSON-RPC.
///
/// Writes are sent with `eth_sendTransaction` from `sender`, an account the
/// node manages; without a sender every write fails.
#[derive(Clone)]
pub struct PasanakuRpc {
    provider: DynProvider,
    contract: Address,
    layout: TupleLayout,
    sender: Option<Address>,
    poll_interval: Duration,
    max_polls: u32,
}

/// Token amounts stay `u128` minor units in the view layer; a larger value is
/// an error rather than a silent truncation.
fn amount(value: U256, field: &str) -> Result<u128> {
    u128::try_from(value).map_err(|_| anyhow!("{field} {value} does not fit in 128 bits"))
}

fn counter(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} {value} does not fit in 64 bits"))
}

fn players_tuple(game: IPasanakuPlayers::RotatingSavings) -> Result<PlayersTuple> {
    Ok(PlayersTuple {
        players: game.players,
        asset: game.asset,
        amount: amount(game.amount, "amount")?,
        player_count: counter(game.player_count, "player_count")?,
        current_player_index: counter(game.current_player_index, "current_player_index")?,
        creator: game.creator,
        total_deposited: amount(game.total_deposited, "total_deposited")?,
        token_id: counter(game.token_id, "token_id")?,
        ended: game.ended,
        created_at: counter(game.created_at, "created_at")?,
        last_updated_at: counter(game.last_updated_at, "last_updated_at")?,
    })
}

fn participants_tuple(
    game: IPasanakuParticipants::RotatingSavings,
) -> Result<ParticipantsTuple> {
    Ok(ParticipantsTuple {
        participants: game.participants,
        asset: game.asset,
        amount: amount(game.amount, "amount")?,
        current_index: counter(game.current_index, "current_index")?,
        total_deposited: amount(game.total_deposited, "total_deposited")?,
        token_id: counter(game.token_id, "token_id")?,
        ended: game.ended,
        recovered: game.recovered,
        creator: game.creator,
        created_at: counter(game.created_at, "created_at")?,
        last_updated_at: counter(game.last_updated_at, "last_updated_at")?,
    })
}

impl PasanakuRpc {
    pub fn new(provider: DynProvider, contract: Address, layout: TupleLayout) -> Self {
        Self {
            provider,
            contract,
            layout,
            sender: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    /// HTTP provider without fillers: the node assigns nonce and gas for the
    /// accounts it manages.
    pub fn connect(rpc_url: &str, contract: Address, layout: TupleLayout) -> Result<Self> {
        let url: Url = rpc_url
            .parse()
            .with_context(|| format!("invalid rpc url '{rpc_url}'"))?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url)
            .erased();
        Ok(Self::new(provider, contract, layout))
    }

    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    async fn read<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(call.abi_encode().into()));
        let data = self
            .provider
            .call(tx)
            .await
            .with_context(|| format!("{} on {to}", C::SIGNATURE))?;
        C::abi_decode_returns(&data)
            .with_context(|| format!("decoding {} from {to}", C::SIGNATURE))
    }

    /// Target contract and calldata for a write.
    pub fn encode_write(&self, call: &ContractCall) -> (Address, Bytes) {
        let (to, calldata) = match call {
            ContractCall::Create {
                asset,
                players,
                amount,
            } => (
                self.contract,
                IPasanaku::createCall {
                    asset: *asset,
                    players: players.clone(),
                    amount: U256::from(*amount),
                }
                .abi_encode(),
            ),
            ContractCall::Deposit { token_id } => (
                self.contract,
                IPasanaku::depositCall {
                    token_id: U256::from(*token_id),
                }
                .abi_encode(),
            ),
            ContractCall::Claim { token_id } => (
                self.contract,
                IPasanaku::claimCall {
                    token_id: U256::from(*token_id),
                }
                .abi_encode(),
            ),
            ContractCall::Recover { token_id } => (
                self.contract,
                IPasanaku::recoverCall {
                    token_id: U256::from(*token_id),
                }
                .abi_encode(),
            ),
            ContractCall::Approve { asset } => (
                *asset,
                IERC20::approveCall {
                    spender: self.contract,
                    amount: U256::MAX,
                }
                .abi_encode(),
            ),
            ContractCall::Faucet { asset, to, amount } => (
                *asset,
                IERC20::faucetCall {
                    to: *to,
                    amount: U256::from(*amount),
                }
                .abi_encode(),
            ),
        };
        (to, calldata.into())
    }
}

impl ContractReader for PasanakuRpc {
    async fn rotating_savings(&self, token_id: TokenId) -> Result<RawGame> {
        let id = U256::from(token_id);
        let game = match self.layout {
            TupleLayout::Players => {
                let call = IPasanakuPlayers::rotating_savingsCall { token_id: id };
                players_tuple(self.read(self.contract, call).await?).map(RawGame::Players)
            }
            TupleLayout::Participants => {
                let call = IPasanakuParticipants::rotating_savingsCall { token_id: id };
                participants_tuple(self.read(self.contract, call).await?)
                    .map(RawGame::Participants)
            }
        };
        game.with_context(|| format!("decoding game {token_id} as {:?} layout", self.layout))
    }

    async fn next_token_id(&self) -> Result<TokenId> {
        let next = self
            .read(self.contract, IPasanaku::next_token_idCall {})
            .await?;
        counter(next, "next_token_id")
    }

    async fn has_deposited(
        &self,
        account: &Address,
        token_id: TokenId,
        round: u64,
    ) -> Result<bool> {
        let call = IPasanaku::has_depositedCall {
            account: *account,
            token_id: U256::from(token_id),
            index: U256::from(round),
        };
        self.read(self.contract, call).await
    }

    async fn can_current_recipient_claim(&self, token_id: TokenId) -> Result<bool> {
        let call = IPasanaku::can_current_recipient_claimCall {
            token_id: U256::from(token_id),
        };
        self.read(self.contract, call).await
    }

    async fn can_be_recovered(&self, token_id: TokenId) -> Result<bool> {
        let call = IPasanaku::can_be_recoveredCall {
            token_id: U256::from(token_id),
        };
        self.read(self.contract, call).await
    }

    async fn supported_assets(&self) -> Result<Vec<Address>> {
        let slots = self
            .read(self.contract, IPasanaku::supported_assetsCall {})
            .await?;
        Ok(slots.to_vec())
    }

    async fn protocol_fee(&self) -> Result<u128> {
        let fee = self
            .read(self.contract, IPasanaku::protocol_feeCall {})
            .await?;
        amount(fee, "protocol_fee")
    }

    async fn balance_of_batch(&self, owners: &[Address], ids: &[TokenId]) -> Result<Vec<u128>> {
        let call = IPasanaku::balanceOfBatchCall {
            owners: owners.to_vec(),
            ids: ids.iter().map(|id| U256::from(*id)).collect(),
        };
        self.read(self.contract, call)
            .await?
            .into_iter()
            .map(|balance| amount(balance, "balance"))
            .collect()
    }
}

impl TokenReader for PasanakuRpc {
    async fn symbol(&self, asset: &Address) -> Result<String> {
        self.read(*asset, IERC20::symbolCall {}).await
    }

    async fn decimals(&self, asset: &Address) -> Result<u8> {
        self.read(*asset, IERC20::decimalsCall {}).await
    }

    /// Unlimited approvals are `U256::MAX`; they read as `u128::MAX`.
    async fn allowance(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<u128> {
        let call = IERC20::allowanceCall {
            owner: *owner,
            spender: *spender,
        };
        let allowance = self.read(*asset, call).await?;
        Ok(u128::try_from(allowance).unwrap_or(u128::MAX))
    }

    async fn balance_of(&self, asset: &Address, owner: &Address) -> Result<u128> {
        let balance = self
            .read(*asset, IERC20::balanceOfCall { owner: *owner })
            .await?;
        amount(balance, "balance")
    }
}

impl TransactionSender for PasanakuRpc {
    async fn send(&self, call: &ContractCall, value: u128) -> Result<TxHash> {
        let sender = self
            .sender
            .ok_or_else(|| anyhow!("no sender account configured for {}", call.label()))?;
        let (to, calldata) = self.encode_write(call);
        let tx = TransactionRequest::default()
            .from(sender)
            .to(to)
            .value(U256::from(value))
            .input(TransactionInput::new(calldata));
        tracing::info!("sending {} to {to} from {sender} with value {value}", call.label());
        let pending = self.provider.send_transaction(tx).await?;
        Ok(TxHash(pending.tx_hash().0))
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<ReceiptStatus> {
        for _ in 0..self.max_polls {
            let receipt = self
                .provider
                .get_transaction_receipt(B256::from(hash.0))
                .await?;
            if let Some(receipt) = receipt {
                tracing::debug!(
                    "receipt for {hash} in block {:?}",
                    receipt.block_number
                );
                return Ok(if receipt.status() {
                    ReceiptStatus::Succeeded
                } else {
                    ReceiptStatus::Reverted
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(anyhow!(
            "no receipt for {hash} after {} polls",
            self.max_polls
        ))
    }
}
