use clap::{Parser, Subcommand};

mod chat;
mod render;

#[derive(Parser)]
#[command(name = "chanchat")]
#[command(about = "Channel Chat CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: CHANCHAT_CONFIG_PATH or ~/.chanchat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the local development backend (channel and chat endpoints, in-memory sessions).
    Serve {
        /// Config file path (default: CHANCHAT_CONFIG_PATH or ~/.chanchat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Process a channel and chat about its content (interactive).
    Chat {
        /// Config file path (default: CHANCHAT_CONFIG_PATH or ~/.chanchat/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Backend base URL (overrides CHANCHAT_BACKEND_URL and backend.baseUrl).
        #[arg(long, value_name = "URL")]
        backend_url: Option<String>,

        /// Channel to process before the first prompt.
        #[arg(long, value_name = "NAME")]
        channel: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("chanchat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat {
            config,
            backend_url,
            channel,
        }) => {
            if let Err(e) = chat::run_chat(config, backend_url, channel).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!("starting backend on {}:{}", config.server.bind, config.server.port);
    lib::server::run_server(config.server).await
}
