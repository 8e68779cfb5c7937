use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "coinmeta",
    about = "Resolve metadata published in coin spends",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Resolve an identifier into its nested metadata document
    Resolve(ResolveArgs),
    /// Decode a serialized solution or metadata list
    Decode(DecodeArgs),
    /// Encode a JSON object as a serialized metadata list
    Encode(EncodeArgs),
    /// Convert between hex identifiers and addresses
    Address(AddressArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Root identifier as hex (with or without 0x) or as an address
    pub root: String,
    /// Full node RPC URL, overriding the config file
    #[arg(long)]
    pub rpc_url: Option<String>,
    /// Deepest child level to expand (capped at 512)
    #[arg(long)]
    pub max_depth: Option<usize>,
    /// Report traversal counters
    #[arg(long)]
    pub stats: bool,
}

#[derive(Args)]
pub struct DecodeArgs {
    /// Serialized program as hex
    pub hex: String,
    /// Input is the metadata list itself rather than a full solution
    #[arg(long)]
    pub metadata: bool,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// JSON object, or a path to a file containing one
    pub input: String,
    /// Wrap the list as the first element of a solution
    #[arg(long)]
    pub solution: bool,
}

#[derive(Args)]
pub struct AddressArgs {
    /// Hex identifier to encode, or address to decode
    pub value: String,
    #[arg(long)]
    pub prefix: Option<String>,
}
