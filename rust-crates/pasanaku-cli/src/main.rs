use clap::{
    ArgGroup,
    Parser,
    Subcommand,
    ValueEnum,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use commands::AppContext;
use deployments::{
    DeploymentEnv,
    DeploymentStore,
    TupleLayout,
};
use pasanaku_contract::deployment::{
    Overrides,
    ResolvedDeployment,
};
use pasanaku_view::{
    Address,
    ViewContext,
    address::parse_address,
    assets::AssetRegistry,
    forms::{
        CreateGameInput,
        FaucetInput,
    },
};
use std::path::{
    Path,
    PathBuf,
};
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

mod commands;
mod render;

const DEFAULT_LOG_FILE: &str = "pasanaku.log";

#[derive(Parser, Debug)]
#[command(
    name = "pasanaku",
    version,
    about = "Browse and play Pasanaku rotating savings games",
    long_about = None,
    group(
        ArgGroup::new("network")
            .args(["local", "test", "mainnet"])
            .required(true)
    )
)]
struct Cli {
    #[arg(long, global = true)]
    contract_address: Option<String>,

    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Where diagnostics are written; stdout only carries rendered views.
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    #[arg(long)]
    local: bool,

    #[arg(long)]
    test: bool,

    #[arg(long)]
    mainnet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assets the contract accepts, with `--owner`'s balance of each
    Assets {
        #[arg(long, value_parser = parse_address)]
        owner: Option<Address>,
    },
    /// Ongoing games; with `--viewer` only the games they hold a share of
    Games {
        #[arg(long, value_parser = parse_address)]
        viewer: Option<Address>,
    },
    /// One game, with the actions open to `--viewer`
    Show {
        id: String,
        #[arg(long, value_parser = parse_address)]
        viewer: Option<Address>,
    },
    /// Start a new game with `--from` as creator
    Create {
        #[arg(long)]
        asset: String,
        /// Contribution per round, in whole units of the asset
        #[arg(long)]
        amount: String,
        /// Comma separated player addresses
        #[arg(long)]
        players: String,
        #[arg(long, value_parser = parse_address)]
        from: Address,
    },
    /// Allow the contract to spend an asset on behalf of `--from`
    Approve {
        #[arg(value_parser = parse_address)]
        asset: Address,
        #[arg(long, value_parser = parse_address)]
        from: Address,
    },
    Deposit {
        id: String,
        #[arg(long, value_parser = parse_address)]
        from: Address,
        #[arg(long)]
        approve: bool,
    },
    Claim {
        id: String,
        #[arg(long, value_parser = parse_address)]
        from: Address,
    },
    Recover {
        id: String,
        #[arg(long, value_parser = parse_address)]
        from: Address,
    },
    /// Mint test tokens to `--to`, or to `--from` when omitted
    Faucet {
        #[arg(long)]
        token: String,
        /// Whole units of the token
        #[arg(long)]
        amount: String,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, value_parser = parse_address)]
        from: Address,
    },
    /// Store the deployment record for the selected network
    Register {
        #[arg(long)]
        contract: String,
        #[arg(long)]
        node_url: String,
        #[arg(long, value_enum, default_value_t = Layout::Players)]
        layout: Layout,
        #[arg(long)]
        public_url: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    Players,
    Participants,
}

impl From<Layout> for TupleLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Players => TupleLayout::Players,
            Layout::Participants => TupleLayout::Participants,
        }
    }
}

impl Command {
    fn sender(&self) -> Option<Address> {
        match self {
            Command::Create { from, .. }
            | Command::Approve { from, .. }
            | Command::Deposit { from, .. }
            | Command::Claim { from, .. }
            | Command::Recover { from, .. }
            | Command::Faucet { from, .. } => Some(*from),
            Command::Assets { .. }
            | Command::Games { .. }
            | Command::Show { .. }
            | Command::Register { .. } => None,
        }
    }
}

fn init_tracing(log_file: &Path) -> Result<()> {
    let directory = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .ok_or_else(|| eyre!("--log-file must name a file"))?;
    let appender = rolling::never(directory, file_name);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn network(cli: &Cli) -> DeploymentEnv {
    if cli.local {
        DeploymentEnv::Local
    } else if cli.test {
        DeploymentEnv::Test
    } else {
        DeploymentEnv::Mainnet
    }
}

fn register(env: DeploymentEnv, command: Command) -> Result<String> {
    let Command::Register {
        contract,
        node_url,
        layout,
        public_url,
    } = command
    else {
        return Err(eyre!("not a register command"));
    };
    parse_address(contract.trim())
        .map_err(|e| eyre!("invalid contract address '{contract}': {e}"))?;
    let store = DeploymentStore::new(env).map_err(|e| eyre!("{e:#}"))?;
    let mut record = deployments::DeploymentRecord::new(contract.trim(), node_url);
    record.tuple_layout = layout.into();
    record.public_url = public_url;
    if let Some(existing) = store.load().map_err(|e| eyre!("{e:#}"))? {
        if existing.contract_address.eq_ignore_ascii_case(&record.contract_address) {
            record.assets = existing.assets;
        }
    }
    store.save(record.clone()).map_err(|e| eyre!("{e:#}"))?;
    Ok(format!(
        "registered {} on {env} ({})",
        record.contract_address,
        store.path().display()
    ))
}

async fn run(cli: Cli) -> Result<String> {
    let env = network(&cli);
    if matches!(cli.command, Command::Register { .. }) {
        return register(env, cli.command);
    }
    if matches!(cli.command, Command::Faucet { .. }) && env == DeploymentEnv::Mainnet {
        return Err(eyre!("the faucet only exists on test networks"));
    }

    let store = DeploymentStore::new(env).map_err(|e| eyre!("{e:#}"))?;
    let stored = store
        .load()
        .map_err(|e| eyre!("{e:#}"))
        .wrap_err("loading deployment")?;
    let overrides = Overrides {
        contract_address: cli.contract_address,
        rpc_url: cli.rpc_url,
        public_url: None,
    };
    let deployment =
        ResolvedDeployment::resolve(env, stored, overrides).map_err(|e| eyre!("{e:#}"))?;
    let mut client = deployment.client().map_err(|e| eyre!("{e:#}"))?;
    if let Some(sender) = cli.command.sender() {
        client = client.with_sender(sender);
    }
    let views = ViewContext::new(client, AssetRegistry::new(deployment.assets.clone()));
    let app = AppContext::new(views, deployment.contract);

    match cli.command {
        Command::Assets { owner } => app.assets(owner.as_ref()).await,
        Command::Games { viewer } => app.games(viewer.as_ref()).await,
        Command::Show { id, viewer } => app.show(&id, viewer.as_ref()).await,
        Command::Create {
            asset,
            amount,
            players,
            ..
        } => {
            let input = CreateGameInput {
                asset,
                amount,
                players,
            };
            app.create(input).await
        }
        Command::Approve { asset, .. } => app.approve(&asset).await,
        Command::Deposit { id, from, approve } => app.deposit(&id, &from, approve).await,
        Command::Claim { id, from } => app.claim(&id, &from).await,
        Command::Recover { id, from } => app.recover(&id, &from).await,
        Command::Faucet {
            token,
            amount,
            to,
            from,
        } => {
            let input = FaucetInput {
                token,
                address: to.unwrap_or_else(|| from.to_string()),
                amount,
            };
            app.faucet(input).await
        }
        Command::Register { .. } => Err(eyre!("register is handled before connecting")),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;
    tracing::info!("starting pasanaku client: {:?}", cli.command);
    deployments::ensure_structure().map_err(|e| eyre!(e))?;
    let output = run(cli).await?;
    println!("{output}");
    Ok(())
}
