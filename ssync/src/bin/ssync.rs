use anyhow::{Context, anyhow};
use clap::Parser;

use ssync_tools_ssync::cp;
use ssync_tools_ssync::path::DynamicPath;
use ssync_tools_ssync::progress::Progress;

#[derive(Parser, Debug)]
#[command(
    name = "ssync",
    version,
    about = "Copy files across named spaces - a multi-source cp for a small set of machines",
    long_about = "`ssync` copies files between the local filesystem and named remote \"spaces\" \
(sandboxed directory roots exposed by an ssync server).

Remote paths use `server:space/subpath` syntax; sources may contain glob patterns.

EXAMPLES:
    # Copy a local file into a remote space
    ssync cp notes.txt homelab:docs/notes.txt

    # Fan a remote glob out into a local directory
    ssync cp 'homelab:docs/*.txt' /tmp/backup

    # Several sources, one directory destination
    ssync cp a.txt b.txt homelab:docs/inbox

    # Run the server side
    ssync serve -c /etc/ssync/config.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Copy files between local paths and remote spaces
    Cp(CpArgs),
    /// Serve the configured spaces over the transfer API
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct CpArgs {
    /// Path to the configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Overwrite existing destination files
    #[arg(short = 'f', long)]
    force: bool,

    /// Number of workers per pipeline stage (default from config, else 10)
    #[arg(short = 'w', long, value_name = "N")]
    workers: Option<usize>,

    /// Per-request timeout for remote operations, e.g. "5s" or "500ms"
    /// (default from config, else 5s)
    #[arg(short = 't', long, value_name = "DURATION")]
    timeout: Option<humantime::Duration>,

    /// Show per-file progress
    #[arg(long)]
    progress: bool,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: WARN)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Source path(s) and destination path
    #[arg(required = true, num_args = 2..)]
    paths: Vec<String>,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Path to the configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: WARN)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Cp(args) => run_cp(args).await,
        Command::Serve(args) => run_serve(args).await,
    };
    if let Err(error) = result {
        eprintln!("ssync: error: {error:#}");
        std::process::exit(1);
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> anyhow::Result<common::config::Config> {
    let path = common::config::find_config(explicit)?;
    let config = common::config::load(&path)?;
    config.validate()?;
    Ok(config)
}

async fn run_cp(args: CpArgs) -> anyhow::Result<()> {
    common::trace::init(args.verbose);
    let config = load_config(args.config.as_deref())?;
    let client_config = config
        .client
        .ok_or_else(|| anyhow!("no configuration found for client"))?;
    let servers: std::collections::HashMap<String, std::sync::Arc<client::ServerInfo>> =
        client_config
            .servers
            .iter()
            .map(|(name, entry)| {
                (
                    name.clone(),
                    std::sync::Arc::new(client::ServerInfo {
                        name: name.clone(),
                        address: entry.address.clone(),
                        guid: entry.guid.clone(),
                    }),
                )
            })
            .collect();
    let timeout = args
        .timeout
        .map(Into::into)
        .or_else(|| {
            client_config
                .default_timeout_ms
                .map(std::time::Duration::from_millis)
        })
        .unwrap_or(std::time::Duration::from_millis(
            common::config::DEFAULT_TIMEOUT_MS,
        ));
    let workers = args
        .workers
        .or(client_config.default_workers)
        .unwrap_or(common::config::DEFAULT_WORKERS);
    anyhow::ensure!(workers > 0, "worker count must be at least 1");

    let cwd = std::env::current_dir().context("getting current directory")?;
    let (src_raw, dest_raw) = args.paths.split_at(args.paths.len() - 1);
    let mut srcs = Vec::with_capacity(src_raw.len());
    for raw in src_raw {
        srcs.push(
            DynamicPath::parse(raw, &cwd, &servers)
                .with_context(|| format!("malformed path '{raw}'"))?,
        );
    }
    let dest = DynamicPath::parse(&dest_raw[0], &cwd, &servers)
        .with_context(|| format!("malformed path '{}'", dest_raw[0]))?;

    let api_client = client::ApiClient::new(timeout)?;
    let progress = Progress::new(args.progress);
    let settings = cp::Settings {
        force: args.force,
        workers,
    };
    let summary = cp::run(&api_client, srcs, dest, &settings, &progress).await?;
    tracing::info!(
        "copied {} file(s), {} byte(s)",
        summary.files_copied,
        summary.bytes_copied
    );
    Ok(())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    common::trace::init(args.verbose);
    let config = load_config(args.config.as_deref())?;
    let server_config = config
        .server
        .ok_or_else(|| anyhow!("no configuration found for server"))?;
    for (name, root) in &server_config.spaces {
        match tokio::fs::metadata(root).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => tracing::warn!(
                "validating space '{}': path '{}' is not a directory",
                name,
                root.display()
            ),
            Err(_) => tracing::warn!(
                "validating space '{}': path '{}' does not exist",
                name,
                root.display()
            ),
        }
    }
    if server_config.users.is_empty() {
        tracing::warn!("starting server with no users!");
    }
    let users: std::collections::HashMap<String, api::auth::UserInfo> = server_config
        .users
        .iter()
        .map(|user| {
            (
                user.guid.clone(),
                api::auth::UserInfo {
                    guid: user.guid.clone(),
                    spaces: user.spaces.iter().cloned().collect(),
                },
            )
        })
        .collect();
    let state = api::AppState::new(
        server_config.spaces.clone(),
        users,
        server_config.max_tree_depth,
    );
    api::serve(state, &server_config.address).await
}
