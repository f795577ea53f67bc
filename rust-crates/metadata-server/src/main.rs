use anyhow::Context;
use clap::{
    ArgGroup,
    Parser,
};
use deployments::{
    DeploymentEnv,
    DeploymentStore,
};
use metadata_server::app::{
    TokenService,
    actix_token_api::ActixTokenApi,
    init_tracing,
};
use pasanaku_contract::deployment::{
    Overrides,
    ResolvedDeployment,
};
use pasanaku_view::presentation::image::ImageRenderer;
use std::net::IpAddr;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    group(
        ArgGroup::new("network")
            .args(["local", "test", "mainnet"])
            .required(true)
    )
)]
struct Args {
    #[arg(short, long)]
    contract_address: Option<String>,

    #[arg(short, long)]
    rpc_url: Option<Url>,

    /// Interface to listen on; `0.0.0.0` exposes the API beyond this host.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(short, long)]
    port: Option<u16>,

    /// Origin written into the `image` link of every metadata document.
    #[arg(long)]
    public_url: Option<Url>,

    #[arg(short, long, default_value = "false")]
    tracing: bool,

    #[arg(long)]
    local: bool,

    #[arg(long)]
    test: bool,

    #[arg(long)]
    mainnet: bool,
}

async fn handle_interupt() {
    let res = tokio::signal::ctrl_c().await;
    match res {
        Ok(_) => {
            tracing::info!("Received interrupt, exiting");
        }
        Err(_) => {
            tracing::warn!("Received interrupt error, exiting anyway");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }
    let deployment_env = if args.local {
        DeploymentEnv::Local
    } else if args.test {
        DeploymentEnv::Test
    } else {
        DeploymentEnv::Mainnet
    };
    let store =
        DeploymentStore::new(deployment_env).context("opening deployments store")?;
    let stored_record = store.load().context("loading deployment")?;
    let overrides = Overrides {
        contract_address: args.contract_address,
        rpc_url: args.rpc_url.map(|url| url.to_string()),
        public_url: args.public_url.map(|url| url.to_string()),
    };
    let deployment = ResolvedDeployment::resolve(deployment_env, stored_record, overrides)?;
    tracing::info!(
        "Serving token metadata for {} on {} via {}",
        deployment.contract,
        deployment.env,
        deployment.rpc_url
    );

    let service = TokenService::new(deployment.view_context()?, ImageRenderer::new())
        .with_public_url(deployment.public_url.clone());
    let api = ActixTokenApi::new(args.host, args.port, service)?;
    tracing::info!("Token API available at {}/api/v1/token/{{id}}", api.base_url());

    handle_interupt().await;
    drop(api);
    tracing::info!("Exiting metadata server");
    Ok(())
}
