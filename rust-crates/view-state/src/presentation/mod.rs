use crate::{
    address::{
        Address,
        short_address,
    },
    amount::format_amount,
    assets::AssetMetadata,
    game::{
        GameRecord,
        TokenId,
    },
    status::GameStatus,
};
use chrono::DateTime;
use serde::Serialize;
use std::fmt;

pub mod image;
pub mod metadata;

/// Share of the round pot deposited so far, floored and clamped to 100. A
/// single-player game has nothing to collect and reports 0.
pub fn progress_percentage(total_deposited: u128, expected_round_total: u128) -> u8 {
    if expected_round_total == 0 {
        return 0;
    }
    if total_deposited >= expected_round_total {
        return 100;
    }
    let ratio = match total_deposited.checked_mul(100) {
        Some(scaled) => scaled / expected_round_total,
        None => total_deposited / (expected_round_total / 100),
    };
    ratio.min(100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundLabel {
    pub current: u64,
    pub total: u64,
}

impl RoundLabel {
    /// One-based round; after the last round the index may equal the player
    /// count, which still reads as the final round.
    pub fn for_record(record: &GameRecord) -> Self {
        let current = record
            .current_index
            .saturating_add(1)
            .min(record.player_count);
        Self {
            current,
            total: record.player_count,
        }
    }

    pub fn compact(&self) -> String {
        format!("{}/{}", self.current, self.total)
    }

    /// Fraction of rounds reached, for the image progress bar.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.current, self.total)
    }
}

/// `Jan 5, 2025`, in UTC.
pub fn format_created_date(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|date| date.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Every derived value a view of one game shows. Built once per read and
/// shared by the detail view, game list, summary image and metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub token_id: TokenId,
    pub symbol: String,
    pub decimals: u8,
    pub status: GameStatus,
    pub amount: String,
    pub pot: String,
    pub expected_round_total: String,
    pub progress: u8,
    pub round: RoundLabel,
    pub player_count: u64,
    pub creator: Address,
    pub created: String,
}

impl GameSummary {
    /// `record` must not be empty; empty games are reported as not found
    /// before reaching presentation.
    pub fn build(record: &GameRecord, asset: &AssetMetadata, now: u64) -> Self {
        let expected = record.expected_round_total();
        GameSummary {
            token_id: record.token_id,
            symbol: asset.symbol.clone(),
            decimals: asset.decimals,
            status: GameStatus::classify(record, now),
            amount: format_amount(record.amount, asset.decimals),
            pot: format_amount(record.total_deposited, asset.decimals),
            expected_round_total: format_amount(expected, asset.decimals),
            progress: progress_percentage(record.total_deposited, expected),
            round: RoundLabel::for_record(record),
            player_count: record.player_count,
            creator: record.creator,
            created: format_created_date(record.created_at),
        }
    }

    pub fn title(&self) -> String {
        format!("Pasanaku #{}", self.token_id)
    }

    pub fn creator_short(&self) -> String {
        short_address(&self.creator)
    }
}
