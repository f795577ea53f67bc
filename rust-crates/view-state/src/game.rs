use crate::address::Address;
use serde::Serialize;

pub type TokenId = u64;

/// `rotating_savings` tuple as exposed by the published ABI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayersTuple {
    pub players: Vec<Address>,
    pub asset: Address,
    pub amount: u128,
    pub player_count: u64,
    pub current_player_index: u64,
    pub creator: Address,
    pub total_deposited: u128,
    pub token_id: TokenId,
    pub ended: bool,
    pub created_at: u64,
    pub last_updated_at: u64,
}

/// `rotating_savings` tuple as exposed by the newer contract interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParticipantsTuple {
    pub participants: Vec<Address>,
    pub asset: Address,
    pub amount: u128,
    pub current_index: u64,
    pub total_deposited: u128,
    pub token_id: TokenId,
    pub ended: bool,
    pub recovered: bool,
    pub creator: Address,
    pub created_at: u64,
    pub last_updated_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawGame {
    Players(PlayersTuple),
    Participants(ParticipantsTuple),
}

/// Canonical game state read from the contract. Never mutated locally; a new
/// record is read after every confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub token_id: TokenId,
    pub asset: Address,
    pub amount: u128,
    pub participants: Vec<Address>,
    pub player_count: u64,
    pub current_index: u64,
    pub total_deposited: u128,
    pub creator: Address,
    pub ended: bool,
    pub recovered: Option<bool>,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl From<RawGame> for GameRecord {
    fn from(raw: RawGame) -> Self {
        GameRecord::normalize(raw)
    }
}

impl GameRecord {
    pub fn normalize(raw: RawGame) -> Self {
        match raw {
            RawGame::Players(t) => {
                if t.player_count != t.players.len() as u64 {
                    tracing::debug!(
                        "game {} reports player_count {} for {} players",
                        t.token_id,
                        t.player_count,
                        t.players.len()
                    );
                }
                GameRecord {
                    token_id: t.token_id,
                    asset: t.asset,
                    amount: t.amount,
                    player_count: t.players.len() as u64,
                    participants: t.players,
                    current_index: t.current_player_index,
                    total_deposited: t.total_deposited,
                    creator: t.creator,
                    ended: t.ended,
                    recovered: None,
                    created_at: t.created_at,
                    last_updated_at: t.last_updated_at,
                }
            }
            RawGame::Participants(t) => GameRecord {
                token_id: t.token_id,
                asset: t.asset,
                amount: t.amount,
                player_count: t.participants.len() as u64,
                participants: t.participants,
                current_index: t.current_index,
                total_deposited: t.total_deposited,
                creator: t.creator,
                ended: t.ended,
                recovered: Some(t.recovered),
                created_at: t.created_at,
                last_updated_at: t.last_updated_at,
            },
        }
    }

    /// The contract answers unknown ids with a zero-valued tuple instead of an
    /// error; such a record means "no such game".
    pub fn is_empty(&self) -> bool {
        self.player_count == 0 || self.participants.is_empty() || self.asset.is_zero()
    }

    /// Pot owed by all non-recipient participants in one round.
    pub fn expected_round_total(&self) -> u128 {
        self.amount
            .saturating_mul(u128::from(self.player_count.saturating_sub(1)))
    }

    pub fn recipient(&self) -> Option<&Address> {
        usize::try_from(self.current_index)
            .ok()
            .and_then(|index| self.participants.get(index))
    }

    pub fn is_recipient(&self, account: &Address) -> bool {
        self.recipient() == Some(account)
    }

    pub fn is_participant(&self, account: &Address) -> bool {
        self.participants.contains(account)
    }

    /// Participants expected to deposit this round, in rotation order.
    pub fn payers(&self) -> impl Iterator<Item = &Address> {
        let current = usize::try_from(self.current_index).ok();
        self.participants
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != current)
            .map(|(_, account)| account)
    }
}

#[cfg(test)]
pub(crate) fn sample_record(participants: usize) -> GameRecord {
    let players: Vec<Address> = (1..=participants)
        .map(|i| Address::new([i as u8; 20]))
        .collect();
    GameRecord::normalize(RawGame::Players(PlayersTuple {
        player_count: players.len() as u64,
        players,
        asset: Address::new([0xaa; 20]),
        amount: 100_000000,
        creator: Address::new([0xcc; 20]),
        token_id: 5,
        created_at: 1_700_000_000,
        last_updated_at: 1_700_000_000,
        ..PlayersTuple::default()
    }))
}
