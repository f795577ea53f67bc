//! Decides which action a viewer is offered on a game.
//!
//! Eligibility facts come from contract reads. A fact that is still pending or
//! whose read failed never defaults to `false`: the evaluator reports
//! [`Affordance::Unknown`] instead, so no action is shown that would revert.

use crate::{
    address::Address,
    game::{
        GameRecord,
        TokenId,
    },
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact<T> {
    Pending,
    Failed(String),
    Resolved(T),
}

impl<T: Copy> Fact<T> {
    pub fn resolved(&self) -> Option<T> {
        match self {
            Fact::Resolved(value) => Some(*value),
            _ => None,
        }
    }
}

impl<T> From<anyhow::Result<T>> for Fact<T> {
    fn from(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Fact::Resolved(value),
            Err(e) => Fact::Failed(format!("{e:#}")),
        }
    }
}

/// Named facts joined from independent reads for one viewer and round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityFacts {
    pub next_token_id: Fact<TokenId>,
    pub has_deposited: Fact<bool>,
    pub can_claim: Fact<bool>,
}

impl Default for EligibilityFacts {
    fn default() -> Self {
        Self {
            next_token_id: Fact::Pending,
            has_deposited: Fact::Pending,
            can_claim: Fact::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Affordance {
    NotFound,
    Ended,
    Claim { amount: u128 },
    Deposit { amount: u128 },
    AlreadyDeposited,
    Nothing,
    Unknown,
}

/// Checks run in order and short-circuit. Recipient status wins over payer
/// status, so a recipient is never offered a deposit.
pub fn evaluate(
    record: &GameRecord,
    viewer: Option<&Address>,
    facts: &EligibilityFacts,
) -> Affordance {
    if record.is_empty() {
        return Affordance::NotFound;
    }
    match facts.next_token_id.resolved() {
        Some(next) if record.token_id >= next => return Affordance::NotFound,
        Some(_) => {}
        None => return Affordance::Unknown,
    }
    if record.ended {
        return Affordance::Ended;
    }
    let Some(viewer) = viewer else {
        return Affordance::Nothing;
    };
    if !record.is_participant(viewer) {
        return Affordance::Nothing;
    }

    if record.is_recipient(viewer) {
        return match facts.can_claim.resolved() {
            Some(true) => Affordance::Claim {
                amount: record.expected_round_total(),
            },
            Some(false) => Affordance::Nothing,
            None => Affordance::Unknown,
        };
    }

    match facts.has_deposited.resolved() {
        Some(false) => Affordance::Deposit {
            amount: record.amount,
        },
        Some(true) => Affordance::AlreadyDeposited,
        None => Affordance::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    Available,
    Unavailable,
    Unknown,
}

/// A stuck round can be recovered by its participants once the contract says
/// so. Independent of the deposit/claim affordance.
pub fn evaluate_recovery(
    record: &GameRecord,
    viewer: Option<&Address>,
    can_be_recovered: &Fact<bool>,
) -> Recovery {
    let is_participant = viewer.is_some_and(|v| record.is_participant(v));
    if record.is_empty() || record.ended || !is_participant {
        return Recovery::Unavailable;
    }
    match can_be_recovered.resolved() {
        Some(true) => Recovery::Available,
        Some(false) => Recovery::Unavailable,
        None => Recovery::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllowanceGate {
    Unknown,
    NeedsApproval { required: u128 },
    Approved,
}

/// Token spending must be approved before the contract can pull `required`.
pub fn allowance_gate(allowance: &Fact<u128>, required: u128) -> AllowanceGate {
    match allowance.resolved() {
        Some(granted) if granted >= required => AllowanceGate::Approved,
        Some(_) => AllowanceGate::NeedsApproval { required },
        None => AllowanceGate::Unknown,
    }
}
