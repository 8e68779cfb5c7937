use std::path::Path;

use anyhow::Context;
use coinmeta_codec::{
    decode_metadata, encode_metadata, solution_metadata, MetadataNode, MetadataValue, Program,
    SerializedProgram,
};
use coinmeta_resolver::{Resolver, TraversalContext};
use coinmeta_store::RpcRecordStore;
use coinmeta_types::{decode_address, encode_address, Identifier};
use colored::Colorize;
use serde_json::json;
use tracing::info;

use crate::cli::*;
use crate::config::CliConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Resolve(args) => cmd_resolve(args, config, cli.format).await,
        Command::Decode(args) => cmd_decode(args, cli.format),
        Command::Encode(args) => cmd_encode(args, cli.format),
        Command::Address(args) => cmd_address(args, &config, cli.format),
    }
}

async fn cmd_resolve(
    args: ResolveArgs,
    mut config: CliConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    config.apply_overrides(args.rpc_url, args.max_depth);
    let root = parse_root(&args.root)?;

    let store = RpcRecordStore::from_config(&config.rpc).context("building RPC client")?;
    info!(url = store.base_url(), root = %root.short_hex(), "resolving");
    let resolver = Resolver::with_config(store, config.resolver);

    let mut ctx = TraversalContext::new();
    let metadata = resolver
        .resolve_with(&root, &mut ctx)
        .await
        .with_context(|| format!("resolving {root}"))?;

    match format {
        OutputFormat::Json => {
            let value = if args.stats {
                json!({ "metadata": metadata, "stats": ctx.stats() })
            } else {
                serde_json::to_value(&metadata)?
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            match &metadata {
                Some(node) => print!("{}", render_text(node)),
                None => println!(
                    "{} No metadata published for {}",
                    "✗".red().bold(),
                    root.to_prefixed_hex().yellow()
                ),
            }
            if args.stats {
                let s = ctx.stats();
                println!(
                    "\n{} visited, {} expanded, {} listings, {} payloads, {} transport / {} decode failures",
                    s.visited.to_string().bold(),
                    s.expanded.to_string().bold(),
                    s.listings,
                    s.payload_fetches,
                    s.transport_failures,
                    s.decode_failures
                );
            }
        }
    }
    Ok(())
}

fn cmd_decode(args: DecodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let node = decode_hex(&args.hex, args.metadata)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&node)?),
        OutputFormat::Text => print!("{}", render_text(&node)),
    }
    Ok(())
}

fn cmd_encode(args: EncodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let serialized = encode_json(&args.input, args.solution)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "hex": serialized.to_hex() })),
        OutputFormat::Text => println!("{}", serialized.to_hex()),
    }
    Ok(())
}

fn cmd_address(args: AddressArgs, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let prefix = args.prefix.as_deref().unwrap_or(&config.address_prefix);
    let converted = convert_address(&args.value, prefix)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "input": args.value, "output": converted })),
        OutputFormat::Text => println!("{} → {}", args.value.dimmed(), converted.green()),
    }
    Ok(())
}

/// Accept a root as 32-byte hex or as an address.
fn parse_root(input: &str) -> anyhow::Result<Identifier> {
    if let Ok(id) = Identifier::from_hex(input) {
        return Ok(id);
    }
    decode_address(input)
        .with_context(|| format!("{input:?} is neither a 32-byte hex identifier nor an address"))
}

fn decode_hex(hex: &str, metadata_only: bool) -> anyhow::Result<MetadataNode> {
    let serialized = SerializedProgram::from_hex(hex).context("decoding hex input")?;
    let node = if metadata_only {
        decode_metadata(&serialized.to_program()?)?
    } else {
        solution_metadata(&serialized)?
    };
    Ok(node)
}

fn encode_json(input: &str, as_solution: bool) -> anyhow::Result<SerializedProgram> {
    let text = if Path::new(input).is_file() {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    } else {
        input.to_string()
    };
    let node: MetadataNode = serde_json::from_str(&text).context("parsing metadata JSON")?;
    let list = encode_metadata(&node)?;
    let program = if as_solution {
        Program::list([list])
    } else {
        list
    };
    Ok(SerializedProgram::from_program(&program)?)
}

/// Hex becomes an address under `prefix`; anything else is decoded as an address.
fn convert_address(value: &str, prefix: &str) -> anyhow::Result<String> {
    match Identifier::from_hex(value) {
        Ok(id) => Ok(encode_address(&id, prefix)),
        Err(_) => Ok(decode_address(value)
            .with_context(|| format!("{value:?} is neither hex nor an address"))?
            .to_prefixed_hex()),
    }
}

fn render_text(node: &MetadataNode) -> String {
    let mut out = String::new();
    render_node(node, 0, &mut out);
    out
}

fn render_node(node: &MetadataNode, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    for (key, value) in node.iter() {
        match value {
            MetadataValue::Text(text) => {
                out.push_str(&format!("{pad}{}: {}\n", key.bold(), text));
            }
            MetadataValue::Integer(digits) => {
                out.push_str(&format!("{pad}{}: {}\n", key.bold(), digits.cyan()));
            }
            MetadataValue::Node(child) => {
                out.push_str(&format!("{pad}{}:\n", key.bold()));
                render_node(child, indent + 1, out);
            }
        }
    }
}
