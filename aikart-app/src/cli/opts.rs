use aikart_core::{DeckId, UserId};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Process-local; nothing survives a restart
    Memory,
    Json,
    Sqlite,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "aikart", version, about = "aiKart deck service (HTTP API + admin CLI)")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "AIKART_STORE", default_value_t = StoreKind::Json, global = true)]
    pub store: StoreKind,

    /// JSON file or SQLite database path (defaults to the app data dir)
    #[arg(long, env = "AIKART_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, env = "AIKART_LOG", default_value_t = Level::INFO, global = true)]
    pub log_level: Level,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the deck HTTP API
    Serve(ServeCmd),
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port)
    #[arg(long, env = "AIKART_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add(DeckAdd),
    List,
    Show { id: DeckId },
    Rm { id: DeckId },
    /// Decks owned by a user
    Owned { user: UserId },
}

#[derive(Debug, Args, Clone)]
pub struct DeckAdd {
    pub name: String,
    #[arg(long)]
    pub creator: UserId,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub public: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        deck: DeckId,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: DeckId,
    #[arg(long)]
    pub question: String,
    #[arg(long)]
    pub answer: String,
}
