use anyhow::Result;
use clap::{Parser, Subcommand};

mod authorizer;
mod client;
mod commands;
mod flow;
mod messages;
mod ui;

#[derive(Parser)]
#[command(name = "exnota")]
#[command(about = "Connect Notion to your notes.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect Notion through your browser
    Connect,

    /// Show whether a Notion token is stored
    Token,

    /// Store a Notion internal integration token
    SetToken {
        /// Token to store. Prompted for if omitted.
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Check a Notion integration token without storing it
    Validate {
        /// Token to check. Prompted for if omitted.
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Forget the stored Notion token
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Debug logs stay hidden unless RUST_LOG asks for them
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Connect => commands::connect::run().await,
        Commands::Token => commands::token::run().await,
        Commands::SetToken { token } => commands::set_token::run(token).await,
        Commands::Validate { token } => commands::validate::run(token).await,
        Commands::Disconnect { yes } => commands::disconnect::run(yes).await,
    }
}
