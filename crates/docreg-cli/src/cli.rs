use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docreg",
    about = "Content-addressed document registry",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a signing key
    Keygen(KeygenArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Register a file
    Add(AddArgs),
    /// Read a registered file by name
    Get(GetArgs),
    /// Show the record for a content hash
    Show(ShowArgs),
    /// List the documents owned by this key
    List,
    /// Delete a registered file by name
    Delete(DeleteArgs),
    /// Print the number of live documents
    Supply,
    /// Verify the ledger journal and keyspace invariants
    Verify,
    /// Rewrite the ledger log as a snapshot of its current state
    Compact,
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Where to write the key (defaults to the configured key path)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct AddArgs {
    pub file: PathBuf,
    /// Registered name (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub name: String,
    /// Write the bytes here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub content_hash: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub name: String,
}
