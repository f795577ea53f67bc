use crate::{
    Result,
    address::Address,
    assets::{
        AssetMetadata,
        AssetRegistry,
    },
    eligibility::{
        Affordance,
        AllowanceGate,
        EligibilityFacts,
        Fact,
        Recovery,
        allowance_gate,
        evaluate,
        evaluate_recovery,
    },
    error::LookupError,
    game::{
        GameRecord,
        TokenId,
    },
    presentation::GameSummary,
    reads::{
        ContractReader,
        TokenReader,
    },
    token_id::parse_token_id,
};
use futures::future::join_all;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::Arc,
};


/// Upper bound on the ids scanned when listing games.
pub const LIST_BATCH_SIZE: TokenId = 100;

pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositState {
    Deposited,
    Outstanding,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRow {
    pub account: Address,
    pub state: DepositState,
}

/// Everything the detail view of one game shows for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub record: GameRecord,
    pub summary: GameSummary,
    pub affordance: Affordance,
    pub recovery: Recovery,
    pub deposits: Vec<DepositRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    Loaded(GameSummary),
    Failed { token_id: TokenId, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedAsset {
    pub address: Address,
    pub metadata: AssetMetadata,
}

/// Explicitly constructed once at start-up and handed to every consumer.
/// Each read produces an independent snapshot; nothing is cached between
/// calls.
#[derive(Clone)]
pub struct ViewContext<R> {
    reader: R,
    registry: AssetRegistry,
    clock: Clock,
}

impl<R> ViewContext<R> {
    pub fn new(reader: R, registry: AssetRegistry) -> Self {
        Self {
            reader,
            registry,
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn now(&self) -> u64 {
        (self.clock)()
    }
}

impl<R: ContractReader + TokenReader> ViewContext<R> {
    /// Parse `raw_id`, read and normalise the game. Malformed ids are rejected
    /// before any read; empty games are reported as not found.
    pub async fn load_record(&self, raw_id: &str) -> Result<GameRecord, LookupError> {
        let token_id = parse_token_id(raw_id)?;
        self.load_record_by_id(token_id).await
    }

    pub async fn load_record_by_id(
        &self,
        token_id: TokenId,
    ) -> Result<GameRecord, LookupError> {
        let raw = self
            .reader
            .rotating_savings(token_id)
            .await
            .map_err(LookupError::Upstream)?;
        let record = GameRecord::normalize(raw);
        if record.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(record)
    }

    pub async fn asset_metadata(&self, asset: &Address) -> AssetMetadata {
        self.registry.resolve(&self.reader, asset).await
    }

    pub async fn summary(&self, record: &GameRecord) -> GameSummary {
        let asset = self.asset_metadata(&record.asset).await;
        GameSummary::build(record, &asset, self.now())
    }

    /// Summary of a game for the metadata document and image routes.
    pub async fn load_summary(&self, raw_id: &str) -> Result<GameSummary, LookupError> {
        let record = self.load_record(raw_id).await?;
        Ok(self.summary(&record).await)
    }

    /// Issue the eligibility reads for `viewer` concurrently and join them.
    /// Reads that do not apply to the viewer stay pending.
    pub async fn eligibility_facts(
        &self,
        record: &GameRecord,
        viewer: Option<&Address>,
    ) -> EligibilityFacts {
        let token_id = record.token_id;
        let needs_claim = viewer.is_some_and(|v| record.is_recipient(v));
        let needs_deposit =
            viewer.is_some_and(|v| record.is_participant(v) && !record.is_recipient(v));

        let next = self.reader.next_token_id();
        let deposited = async {
            match viewer {
                Some(v) if needs_deposit => Fact::from(
                    self.reader
                        .has_deposited(v, token_id, record.current_index)
                        .await,
                ),
                _ => Fact::Pending,
            }
        };
        let claimable = async {
            if needs_claim {
                Fact::from(self.reader.can_current_recipient_claim(token_id).await)
            } else {
                Fact::Pending
            }
        };
        let (next_token_id, has_deposited, can_claim) =
            futures::join!(next, deposited, claimable);
        EligibilityFacts {
            next_token_id: Fact::from(next_token_id),
            has_deposited,
            can_claim,
        }
    }

    /// Per-payer deposit state for the current round. Each row degrades on
    /// its own when its read fails.
    pub async fn deposits(&self, record: &GameRecord) -> Vec<DepositRow> {
        let payers: Vec<Address> = record.payers().copied().collect();
        let reads = payers.iter().map(|account| {
            self.reader
                .has_deposited(account, record.token_id, record.current_index)
        });
        let results = join_all(reads).await;
        payers
            .into_iter()
            .zip(results)
            .map(|(account, result)| {
                let state = match result {
                    Ok(true) => DepositState::Deposited,
                    Ok(false) => DepositState::Outstanding,
                    Err(e) => {
                        tracing::warn!(
                            "deposit read for {account} on game {} failed: {e:#}",
                            record.token_id
                        );
                        DepositState::Unknown
                    }
                };
                DepositRow { account, state }
            })
            .collect()
    }

    pub async fn load_game_view(
        &self,
        raw_id: &str,
        viewer: Option<&Address>,
    ) -> Result<GameView, LookupError> {
        let record = self.load_record(raw_id).await?;
        let recoverable = async {
            if viewer.is_some_and(|v| record.is_participant(v)) && !record.ended {
                Fact::from(self.reader.can_be_recovered(record.token_id).await)
            } else {
                Fact::Pending
            }
        };
        let (summary, facts, deposits, recoverable) = futures::join!(
            self.summary(&record),
            self.eligibility_facts(&record, viewer),
            self.deposits(&record),
            recoverable,
        );
        let affordance = evaluate(&record, viewer, &facts);
        if affordance == Affordance::NotFound {
            return Err(LookupError::NotFound);
        }
        let recovery = evaluate_recovery(&record, viewer, &recoverable);
        Ok(GameView {
            record,
            summary,
            affordance,
            recovery,
            deposits,
        })
    }

    /// Ids in `ids` of which `viewer` holds at least one share, from a single
    /// `balanceOfBatch` read.
    pub async fn held_token_ids(
        &self,
        viewer: &Address,
        ids: &[TokenId],
    ) -> Result<Vec<TokenId>> {
        let owners = vec![*viewer; ids.len()];
        let balances = self.reader.balance_of_batch(&owners, ids).await?;
        Ok(ids
            .iter()
            .zip(balances)
            .filter(|(_, balance)| *balance > 0)
            .map(|(id, _)| *id)
            .collect())
    }

    /// Games `0..min(next_token_id, LIST_BATCH_SIZE)`, read concurrently; with
    /// a viewer, only the games they hold a share of. Empty games are skipped
    /// and a failing game becomes a failed row. Each distinct asset is resolved
    /// once for the whole list.
    pub async fn load_game_list(&self, viewer: Option<&Address>) -> Result<Vec<ListItem>> {
        let next = self.reader.next_token_id().await?;
        let mut ids: Vec<TokenId> = (0..next.min(LIST_BATCH_SIZE)).collect();
        if let Some(viewer) = viewer {
            ids = self.held_token_ids(viewer, &ids).await?;
        }
        let records = join_all(ids.iter().map(|id| self.load_record_by_id(*id))).await;

        let mut assets: Vec<Address> = records
            .iter()
            .filter_map(|result| result.as_ref().ok())
            .map(|record| record.asset)
            .collect();
        assets.sort();
        assets.dedup();
        let resolved = join_all(assets.iter().map(|asset| self.asset_metadata(asset))).await;
        let metadata: HashMap<Address, AssetMetadata> =
            assets.into_iter().zip(resolved).collect();
        let now = self.now();

        let mut items = Vec::new();
        for (token_id, result) in ids.into_iter().zip(records) {
            match result {
                Ok(record) => {
                    let asset = metadata
                        .get(&record.asset)
                        .cloned()
                        .unwrap_or_else(AssetMetadata::placeholder);
                    items.push(ListItem::Loaded(GameSummary::build(&record, &asset, now)));
                }
                Err(LookupError::NotFound) => {}
                Err(e) => {
                    tracing::warn!("failed to load game {token_id}: {e}");
                    items.push(ListItem::Failed {
                        token_id,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(items)
    }

    /// ERC-20 balance of `owner` in minor units of `asset`.
    pub async fn token_balance(&self, asset: &Address, owner: &Address) -> Result<u128> {
        self.reader.balance_of(asset, owner).await
    }

    /// Assets accepted by the contract, zero slots removed, each with
    /// metadata resolved concurrently.
    pub async fn load_supported_assets(&self) -> Result<Vec<SupportedAsset>> {
        let addresses: Vec<Address> = self
            .reader
            .supported_assets()
            .await?
            .into_iter()
            .filter(|address| !address.is_zero())
            .collect();
        let metadata = join_all(addresses.iter().map(|a| self.asset_metadata(a))).await;
        Ok(addresses
            .into_iter()
            .zip(metadata)
            .map(|(address, metadata)| SupportedAsset { address, metadata })
            .collect())
    }

    pub async fn allowance_gate(
        &self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        required: u128,
    ) -> AllowanceGate {
        let allowance = Fact::from(self.reader.allowance(asset, owner, spender).await);
        allowance_gate(&allowance, required)
    }
}
