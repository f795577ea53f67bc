//! Marketplace-facing token metadata document.

use crate::presentation::GameSummary;
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: AttributeValue,
}

impl Attribute {
    fn text(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: AttributeValue::Text(value.into()),
        }
    }

    fn number(trait_type: &str, value: u64) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: AttributeValue::Number(value),
        }
    }
}

/// Field order is fixed so identical summaries serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

impl TokenMetadata {
    /// `origin` is the scheme and host the image route is served from, without
    /// a trailing slash.
    pub fn from_summary(summary: &GameSummary, origin: &str) -> Self {
        let symbol = &summary.symbol;
        let description = [
            format!(
                "Rotating savings game. {} {symbol} per round.",
                summary.amount
            ),
            format!(
                "{} players, round {}.",
                summary.player_count, summary.round
            ),
            format!("Pot: {} {symbol}. Status: {}.", summary.pot, summary.status),
        ]
        .join(" ");

        TokenMetadata {
            name: summary.title(),
            description,
            image: format!(
                "{}/api/v1/token/{}/image",
                origin.trim_end_matches('/'),
                summary.token_id
            ),
            attributes: vec![
                Attribute::text("Token ID", summary.token_id.to_string()),
                Attribute::text("Asset", symbol.clone()),
                Attribute::text("Amount", summary.amount.clone()),
                Attribute::number("Players", summary.player_count),
                Attribute::text("Round", summary.round.to_string()),
                Attribute::text("Pot", format!("{} {symbol}", summary.pot)),
                Attribute::text("Status", summary.status.as_str()),
                Attribute::text("Creator", summary.creator.to_string()),
            ],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
