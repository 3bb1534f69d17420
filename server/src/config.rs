use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Command-line and environment configuration for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "haggle-server", about = "Marketplace listings and price negotiation over HTTP")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "HAGGLE_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Directory holding `listings.csv` and the `conversations/` logs.
    #[arg(long, env = "HAGGLE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Listings file (default: `<data-dir>/listings.csv`).
    #[arg(long, env = "HAGGLE_LISTINGS_FILE")]
    pub listings_file: Option<PathBuf>,

    /// Conversation log directory (default: `<data-dir>/conversations`).
    #[arg(long, env = "HAGGLE_CONVERSATIONS_DIR")]
    pub conversations_dir: Option<PathBuf>,
}

impl Config {
    pub fn listings_path(&self) -> PathBuf {
        self.listings_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("listings.csv"))
    }

    pub fn conversations_path(&self) -> PathBuf {
        self.conversations_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("conversations"))
    }

    /// Configuration rooted at `data_dir` with default file names.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_dir: data_dir.into(),
            listings_file: None,
            conversations_dir: None,
        }
    }
}
