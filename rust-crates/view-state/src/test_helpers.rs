//! In-process contract double with read counters, shared by this crate's tests
//! and by downstream crates through the `test-helpers` feature.

use crate::{
    Result,
    actions::{
        ContractCall,
        ReceiptStatus,
        TransactionSender,
        TxHash,
    },
    address::Address,
    game::{
        PlayersTuple,
        RawGame,
        TokenId,
    },
    reads::{
        ContractReader,
        TokenReader,
    },
};
use anyhow::anyhow;
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicUsize,
            Ordering,
        },
    },
};

#[derive(Default)]
struct State {
    games: HashMap<TokenId, RawGame>,
    failing_games: HashSet<TokenId>,
    next_token_id: Option<TokenId>,
    deposits: HashSet<(Address, TokenId, u64)>,
    failing_deposit_reads: HashSet<Address>,
    claimable: HashSet<TokenId>,
    recoverable: HashSet<TokenId>,
    supported_assets: Vec<Address>,
    protocol_fee: u128,
    tokens: HashMap<Address, (String, u8)>,
    allowances: HashMap<(Address, Address), u128>,
    token_balances: HashMap<(Address, Address), u128>,
    game_balances: HashMap<(Address, TokenId), u128>,
    send_error: Option<String>,
    receipt: Option<ReceiptStatus>,
    sent: Vec<(TxHash, ContractCall, u128)>,
}

#[derive(Clone, Default)]
pub struct FakeContract {
    state: Arc<Mutex<State>>,
    reads: Arc<AtomicUsize>,
    reads_by_method: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl FakeContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(self, raw: RawGame) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let token_id = match &raw {
                RawGame::Players(t) => t.token_id,
                RawGame::Participants(t) => t.token_id,
            };
            state.games.insert(token_id, raw);
            let next = state.next_token_id.unwrap_or(0).max(token_id + 1);
            state.next_token_id = Some(next);
        }
        self
    }

    pub fn with_failing_game(self, token_id: TokenId) -> Self {
        self.state.lock().unwrap().failing_games.insert(token_id);
        self
    }

    pub fn with_next_token_id(self, next: TokenId) -> Self {
        self.state.lock().unwrap().next_token_id = Some(next);
        self
    }

    pub fn with_deposit(self, account: Address, token_id: TokenId, round: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .deposits
            .insert((account, token_id, round));
        self
    }

    pub fn with_failing_deposit_read(self, account: Address) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deposit_reads
            .insert(account);
        self
    }

    pub fn with_claimable(self, token_id: TokenId) -> Self {
        self.state.lock().unwrap().claimable.insert(token_id);
        self
    }

    pub fn with_recoverable(self, token_id: TokenId) -> Self {
        self.state.lock().unwrap().recoverable.insert(token_id);
        self
    }

    pub fn with_supported_assets(self, assets: Vec<Address>) -> Self {
        self.state.lock().unwrap().supported_assets = assets;
        self
    }

    pub fn with_protocol_fee(self, fee: u128) -> Self {
        self.state.lock().unwrap().protocol_fee = fee;
        self
    }

    pub fn with_token(self, asset: Address, symbol: &str, decimals: u8) -> Self {
        self.state
            .lock()
            .unwrap()
            .tokens
            .insert(asset, (symbol.to_string(), decimals));
        self
    }

    pub fn with_allowance(self, asset: Address, owner: Address, amount: u128) -> Self {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((asset, owner), amount);
        self
    }

    pub fn with_token_balance(self, asset: Address, owner: Address, amount: u128) -> Self {
        self.state
            .lock()
            .unwrap()
            .token_balances
            .insert((asset, owner), amount);
        self
    }

    /// ERC-1155 share of game `token_id` held by `owner`.
    pub fn with_game_balance(self, owner: Address, token_id: TokenId, amount: u128) -> Self {
        self.state
            .lock()
            .unwrap()
            .game_balances
            .insert((owner, token_id), amount);
        self
    }

    pub fn with_send_error(self, message: &str) -> Self {
        self.state.lock().unwrap().send_error = Some(message.to_string());
        self
    }

    pub fn with_receipt(self, status: ReceiptStatus) -> Self {
        self.state.lock().unwrap().receipt = Some(status);
        self
    }

    /// Number of contract reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Reads of one contract method, e.g. `"symbol"`.
    pub fn reads_of(&self, method: &str) -> usize {
        self.reads_by_method
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    pub fn sent_transactions(&self) -> Vec<(TxHash, ContractCall, u128)> {
        self.state.lock().unwrap().sent.clone()
    }

    fn read<T>(&self, method: &'static str, f: impl FnOnce(&State) -> Result<T>) -> Result<T> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        *self.reads_by_method.lock().unwrap().entry(method).or_default() += 1;
        let state = self.state.lock().unwrap();
        f(&state)
    }
}

/// Zero-valued tuple the contract returns for ids it never issued.
pub fn zero_game(token_id: TokenId) -> RawGame {
    RawGame::Players(PlayersTuple {
        token_id,
        ..PlayersTuple::default()
    })
}

impl ContractReader for FakeContract {
    async fn rotating_savings(&self, token_id: TokenId) -> Result<RawGame> {
        self.read("rotating_savings", |state| {
            if state.failing_games.contains(&token_id) {
                return Err(anyhow!("execution reverted: rpc unavailable"));
            }
            Ok(state
                .games
                .get(&token_id)
                .cloned()
                .unwrap_or_else(|| zero_game(token_id)))
        })
    }

    async fn next_token_id(&self) -> Result<TokenId> {
        self.read("next_token_id", |state| Ok(state.next_token_id.unwrap_or(0)))
    }

    async fn has_deposited(
        &self,
        account: &Address,
        token_id: TokenId,
        round: u64,
    ) -> Result<bool> {
        self.read("has_deposited", |state| {
            if state.failing_deposit_reads.contains(account) {
                return Err(anyhow!("has_deposited read failed"));
            }
            Ok(state.deposits.contains(&(*account, token_id, round)))
        })
    }

    async fn can_current_recipient_claim(&self, token_id: TokenId) -> Result<bool> {
        self.read("can_current_recipient_claim", |state| {
            Ok(state.claimable.contains(&token_id))
        })
    }

    async fn can_be_recovered(&self, token_id: TokenId) -> Result<bool> {
        self.read("can_be_recovered", |state| Ok(state.recoverable.contains(&token_id)))
    }

    async fn supported_assets(&self) -> Result<Vec<Address>> {
        self.read("supported_assets", |state| Ok(state.supported_assets.clone()))
    }

    async fn protocol_fee(&self) -> Result<u128> {
        self.read("protocol_fee", |state| Ok(state.protocol_fee))
    }

    async fn balance_of_batch(&self, owners: &[Address], ids: &[TokenId]) -> Result<Vec<u128>> {
        self.read("balanceOfBatch", |state| {
            if owners.len() != ids.len() {
                return Err(anyhow!("execution reverted: length mismatch"));
            }
            Ok(owners
                .iter()
                .zip(ids)
                .map(|(owner, id)| {
                    state.game_balances.get(&(*owner, *id)).copied().unwrap_or(0)
                })
                .collect())
        })
    }
}

impl TokenReader for FakeContract {
    async fn symbol(&self, asset: &Address) -> Result<String> {
        self.read("symbol", |state| {
            state
                .tokens
                .get(asset)
                .map(|(symbol, _)| symbol.clone())
                .ok_or_else(|| anyhow!("no code at {asset}"))
        })
    }

    async fn decimals(&self, asset: &Address) -> Result<u8> {
        self.read("decimals", |state| {
            state
                .tokens
                .get(asset)
                .map(|(_, decimals)| *decimals)
                .ok_or_else(|| anyhow!("no code at {asset}"))
        })
    }

    async fn allowance(
        &self,
        asset: &Address,
        owner: &Address,
        _spender: &Address,
    ) -> Result<u128> {
        self.read("allowance", |state| {
            Ok(state
                .allowances
                .get(&(*asset, *owner))
                .copied()
                .unwrap_or(0))
        })
    }

    async fn balance_of(&self, asset: &Address, owner: &Address) -> Result<u128> {
        self.read("balanceOf", |state| {
            if !state.tokens.contains_key(asset) {
                return Err(anyhow!("no code at {asset}"));
            }
            Ok(state
                .token_balances
                .get(&(*asset, *owner))
                .copied()
                .unwrap_or(0))
        })
    }
}

impl TransactionSender for FakeContract {
    async fn send(&self, call: &ContractCall, value: u128) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.send_error {
            return Err(anyhow!("{message}"));
        }
        let hash = TxHash([state.sent.len() as u8 + 1; 32]);
        state.sent.push((hash, call.clone(), value));
        Ok(hash)
    }

    async fn wait_for_receipt(&self, _hash: &TxHash) -> Result<ReceiptStatus> {
        let state = self.state.lock().unwrap();
        Ok(state.receipt.unwrap_or(ReceiptStatus::Succeeded))
    }
}
