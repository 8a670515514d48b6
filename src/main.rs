use clap::Parser;
use std::path::PathBuf;
use voice_draft_lib::config::AppConfig;
use voice_draft_lib::observability::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "voice-draft", version, about = "Turns voice memos into written drafts")]
struct Cli {
    /// JSON config file
    #[arg(short, long, env = "VOICE_DRAFT_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    init_tracing(config.json_logs());

    voice_draft_lib::run(config).await
}
