use crate::render;
use color_eyre::eyre::{
    Result,
    eyre,
};
use futures::future::join_all;
use pasanaku_view::{
    Address,
    ViewContext,
    actions::{
        ActionState,
        ActionTracker,
        ContractCall,
        TransactionSender,
        TxHash,
    },
    address::parse_address,
    amount::format_amount,
    assets::AssetMetadata,
    eligibility::{
        Affordance,
        AllowanceGate,
        Recovery,
    },
    forms::{
        CreateGameInput,
        FaucetInput,
    },
    reads::{
        ContractReader,
        TokenReader,
    },
};

#[cfg(test)]
mod tests;

/// Read and write context shared by every subcommand, built once in `main`.
pub struct AppContext<R> {
    pub views: ViewContext<R>,
    pub contract: Address,
}

impl<R> AppContext<R> {
    pub fn new(views: ViewContext<R>, contract: Address) -> Self {
        Self { views, contract }
    }
}

impl<R: ContractReader + TokenReader> AppContext<R> {
    /// A failed read renders as a failure line instead of failing the view.
    async fn balance(&self, asset: &Address, owner: &Address) -> Option<u128> {
        match self.views.token_balance(asset, owner).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::warn!("balance of {owner} on {asset} failed: {e:#}");
                None
            }
        }
    }

    pub async fn assets(&self, owner: Option<&Address>) -> Result<String> {
        let assets = self
            .views
            .load_supported_assets()
            .await
            .map_err(|e| eyre!("failed to load supported assets: {e:#}"))?;
        let mut out = render::supported_assets(&assets);
        if let Some(owner) = owner {
            let balances =
                join_all(assets.iter().map(|asset| self.balance(&asset.address, owner))).await;
            for (asset, balance) in assets.iter().zip(balances) {
                out.push_str(&format!(
                    "{:<8} {}\n",
                    asset.metadata.symbol,
                    render::token_balance(balance, &asset.metadata)
                ));
            }
        }
        Ok(out)
    }

    /// Every game, or with `viewer` only those they hold a share of.
    pub async fn games(&self, viewer: Option<&Address>) -> Result<String> {
        let items = self
            .views
            .load_game_list(viewer)
            .await
            .map_err(|e| eyre!("failed to load games: {e:#}"))?;
        Ok(render::game_list(&items))
    }

    pub async fn show(&self, raw_id: &str, viewer: Option<&Address>) -> Result<String> {
        let view = self.views.load_game_view(raw_id, viewer).await?;
        let mut out = render::game_view(&view, viewer);
        if let Some(viewer) = viewer {
            let balance = self.balance(&view.record.asset, viewer).await;
            let metadata = AssetMetadata::new(view.summary.symbol.clone(), view.summary.decimals);
            out.push_str(&render::token_balance(balance, &metadata));
            out.push('\n');
        }
        Ok(out)
    }
}

impl<R: ContractReader + TokenReader + TransactionSender> AppContext<R> {
    /// Submit `call` with the protocol fee attached when it is payable, then
    /// wait for its receipt.
    async fn execute(&self, call: ContractCall) -> Result<TxHash> {
        let value = if call.pays_protocol_fee() {
            self.views
                .reader()
                .protocol_fee()
                .await
                .map_err(|e| eyre!("failed to read protocol fee: {e:#}"))?
        } else {
            0
        };
        let label = call.label();
        let mut tracker = ActionTracker::new(call);
        tracker.submit(self.views.reader(), value).await;
        match tracker.confirm(self.views.reader()).await {
            ActionState::Confirmed(hash) => Ok(*hash),
            ActionState::Failed(message) => Err(eyre!("{label} failed: {message}")),
            other => Err(eyre!("{label} ended in unexpected state {other:?}")),
        }
    }

    /// Below the required allowance the write would revert; approve first
    /// when asked to, otherwise stop.
    async fn ensure_allowance(
        &self,
        asset: &Address,
        owner: &Address,
        required: u128,
        metadata: &AssetMetadata,
        approve: bool,
    ) -> Result<()> {
        let gate = self
            .views
            .allowance_gate(asset, owner, &self.contract, required)
            .await;
        match gate {
            AllowanceGate::Approved => Ok(()),
            AllowanceGate::NeedsApproval { required } if approve => {
                tracing::info!("allowance below {required} on {asset}; approving first");
                let hash = self.execute(ContractCall::Approve { asset: *asset }).await?;
                tracing::info!("approval confirmed: {hash}");
                Ok(())
            }
            AllowanceGate::NeedsApproval { required } => Err(eyre!(
                "{} {} must be approved for spending; rerun with --approve or run `pasanaku approve {asset}`",
                format_amount(required, metadata.decimals),
                metadata.symbol
            )),
            AllowanceGate::Unknown => Err(eyre!("unable to read allowance on {asset}")),
        }
    }

    pub async fn approve(&self, asset: &Address) -> Result<String> {
        let hash = self.execute(ContractCall::Approve { asset: *asset }).await?;
        Ok(format!("approve confirmed: {hash}"))
    }

    /// Creating a game moves no tokens, so no allowance is checked here; the
    /// first deposit is gated instead.
    pub async fn create(&self, input: CreateGameInput) -> Result<String> {
        let metadata = match parse_address(input.asset.trim()) {
            Ok(asset) => self.views.asset_metadata(&asset).await,
            Err(_) => AssetMetadata::placeholder(),
        };
        let request = input.into_request(|_| metadata.decimals)?;
        let hash = self
            .execute(ContractCall::Create {
                asset: request.asset,
                players: request.players,
                amount: request.amount_raw,
            })
            .await?;
        Ok(format!(
            "create confirmed: {hash} ({} {} per round)",
            request.amount, metadata.symbol
        ))
    }

    /// Mint test tokens; decimals of an unknown token default to 18.
    pub async fn faucet(&self, input: FaucetInput) -> Result<String> {
        let metadata = match parse_address(input.token.trim()) {
            Ok(token) => self.views.asset_metadata(&token).await,
            Err(_) => AssetMetadata::placeholder(),
        };
        let request = input.into_request(|_| metadata.decimals)?;
        let hash = self
            .execute(ContractCall::Faucet {
                asset: request.token,
                to: request.to,
                amount: request.amount_raw,
            })
            .await?;
        Ok(format!(
            "faucet confirmed: {hash} ({} {} to {})",
            request.amount, metadata.symbol, request.to
        ))
    }

    pub async fn deposit(&self, raw_id: &str, from: &Address, approve: bool) -> Result<String> {
        let view = self.views.load_game_view(raw_id, Some(from)).await?;
        let Affordance::Deposit { amount } = view.affordance else {
            return Err(eyre!(
                "cannot deposit into {}: {}",
                view.summary.title(),
                render::affordance(&view.affordance, &view.summary)
            ));
        };
        let metadata = AssetMetadata::new(view.summary.symbol.clone(), view.summary.decimals);
        self.ensure_allowance(&view.record.asset, from, amount, &metadata, approve)
            .await?;
        let hash = self
            .execute(ContractCall::Deposit {
                token_id: view.record.token_id,
            })
            .await?;
        Ok(format!("deposit confirmed: {hash}"))
    }

    pub async fn claim(&self, raw_id: &str, from: &Address) -> Result<String> {
        let view = self.views.load_game_view(raw_id, Some(from)).await?;
        let Affordance::Claim { amount } = view.affordance else {
            return Err(eyre!(
                "cannot claim {}: {}",
                view.summary.title(),
                render::affordance(&view.affordance, &view.summary)
            ));
        };
        let hash = self
            .execute(ContractCall::Claim {
                token_id: view.record.token_id,
            })
            .await?;
        Ok(format!(
            "claim confirmed: {hash} ({} {})",
            format_amount(amount, view.summary.decimals),
            view.summary.symbol
        ))
    }

    pub async fn recover(&self, raw_id: &str, from: &Address) -> Result<String> {
        let view = self.views.load_game_view(raw_id, Some(from)).await?;
        match view.recovery {
            Recovery::Available => {}
            Recovery::Unavailable => {
                return Err(eyre!("{} cannot be recovered", view.summary.title()));
            }
            Recovery::Unknown => {
                return Err(eyre!(
                    "unable to determine whether {} can be recovered",
                    view.summary.title()
                ));
            }
        }
        let hash = self
            .execute(ContractCall::Recover {
                token_id: view.record.token_id,
            })
            .await?;
        Ok(format!("recover confirmed: {hash}"))
    }
}
