//! Resolves which contract and node to talk to from the stored deployment
//! record of a network plus command-line overrides.

use crate::PasanakuRpc;
use anyhow::{
    Context,
    Result,
    anyhow,
};
use deployments::{
    DeploymentEnv,
    DeploymentRecord,
    TupleLayout,
};
use pasanaku_view::{
    Address,
    ViewContext,
    address::parse_address,
    assets::{
        AssetMetadata,
        AssetRegistry,
        AssetTable,
    },
};

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub contract_address: Option<String>,
    pub rpc_url: Option<String>,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedDeployment {
    pub env: DeploymentEnv,
    pub contract: Address,
    pub rpc_url: String,
    pub layout: TupleLayout,
    pub public_url: Option<String>,
    pub assets: AssetTable,
}

fn address_field(raw: &str, what: &str) -> Result<Address> {
    parse_address(raw.trim()).map_err(|e| anyhow!("failed to parse {what} '{raw}': {e}"))
}

/// Static table for `env`: the built-in mainnet assets, then any assets the
/// deployment record lists, which win on conflict.
pub fn asset_table(
    env: DeploymentEnv,
    record: Option<&DeploymentRecord>,
) -> Result<AssetTable> {
    let mut table = match env {
        DeploymentEnv::Mainnet => AssetTable::builtin(),
        DeploymentEnv::Test | DeploymentEnv::Local => AssetTable::empty(),
    };
    for stored in record.map(|r| r.assets.as_slice()).unwrap_or_default() {
        let address = address_field(&stored.address, "deployment asset")?;
        table.insert(address, AssetMetadata::new(stored.symbol.clone(), stored.decimals));
    }
    Ok(table)
}

impl ResolvedDeployment {
    /// A `--contract-address` that differs from the stored record discards the
    /// record; its layout and assets describe another deployment.
    pub fn resolve(
        env: DeploymentEnv,
        stored: Option<DeploymentRecord>,
        overrides: Overrides,
    ) -> Result<Self> {
        let cli_contract = overrides
            .contract_address
            .as_deref()
            .map(|raw| address_field(raw, "--contract-address"))
            .transpose()?;
        let record = match (cli_contract, stored) {
            (Some(cli), Some(record)) => {
                let stored = address_field(&record.contract_address, "stored contract")?;
                (stored == cli).then_some(record)
            }
            (None, record) => record,
            (Some(_), None) => None,
        };
        let contract = match (&record, cli_contract) {
            (_, Some(cli)) => cli,
            (Some(record), None) => {
                address_field(&record.contract_address, "stored contract").with_context(
                    || format!("deployment record for {env} is unusable"),
                )?
            }
            (None, None) => {
                return Err(anyhow!(
                    "No deployment record found for {env}; provide --contract-address"
                ));
            }
        };
        if let Some(record) = &record {
            tracing::info!(
                "Using deployment record {} ({}) deployed at {}",
                record.contract_address,
                record.network_url,
                record.deployed_at
            );
        } else {
            tracing::info!("Using contract {contract} provided via CLI override");
        }

        let rpc_url = overrides
            .rpc_url
            .or_else(|| record.as_ref().map(|r| r.network_url.clone()))
            .unwrap_or_else(|| env.default_rpc_url().to_string());
        let public_url = overrides
            .public_url
            .or_else(|| record.as_ref().and_then(|r| r.public_url.clone()));
        Ok(Self {
            env,
            contract,
            rpc_url,
            layout: record.as_ref().map(|r| r.tuple_layout).unwrap_or_default(),
            public_url,
            assets: asset_table(env, record.as_ref())?,
        })
    }

    pub fn client(&self) -> Result<PasanakuRpc> {
        PasanakuRpc::connect(&self.rpc_url, self.contract, self.layout)
    }

    pub fn view_context(&self) -> Result<ViewContext<PasanakuRpc>> {
        let registry = AssetRegistry::new(self.assets.clone());
        Ok(ViewContext::new(self.client()?, registry))
    }
}
