use std::io::Write;
use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use colored::Colorize;
use docreg_crypto::{content_hash, SigningKey};
use docreg_registry::{open_local, LocalNode, LEDGER_FILE};
use docreg_server::{load_key, load_or_generate, save_key, DocregServer, ServerConfig};
use docreg_types::{ContentHash, DocumentRecord};
use serde_json::json;

use crate::cli::*;

const KEY_FILE: &str = "service.key";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    tracing::debug!(data_dir = %config.data_dir.display(), key_path = %config.key_path.display(), "configuration resolved");
    let format = cli.format;
    match cli.command {
        Command::Keygen(args) => cmd_keygen(&config, args, format),
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Add(args) => cmd_add(&config, args, format).await,
        Command::Get(args) => cmd_get(&config, args).await,
        Command::Show(args) => cmd_show(&config, args, format).await,
        Command::List => cmd_list(&config, format),
        Command::Delete(args) => cmd_delete(&config, args, format).await,
        Command::Supply => cmd_supply(&config, format).await,
        Command::Verify => cmd_verify(&config, format),
        Command::Compact => cmd_compact(&config, format),
    }
}

/// Configuration file (or defaults) with the `--data-dir` override applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        if config.key_path == ServerConfig::default().key_path {
            config.key_path = dir.join(KEY_FILE);
        }
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn open_node(config: &ServerConfig) -> anyhow::Result<LocalNode> {
    open_local(&config.data_dir, config.local_options())
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))
}

fn print_record(record: &DocumentRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "content_hash": record.content_hash.to_hex(),
                "name_hash": record.name_hash.to_hex(),
                "name": record.name,
                "owner": record.owner.to_hex(),
            })
        ),
        OutputFormat::Text => {
            println!("{}  {}", record.content_hash.to_hex().yellow(), record.name.bold());
            println!("  owner: {}", record.owner.to_hex().cyan());
        }
    }
}

fn cmd_keygen(config: &ServerConfig, args: KeygenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = args.path.unwrap_or_else(|| config.key_path.clone());
    let key = SigningKey::generate();
    save_key(&path, &key)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "path": path.display().to_string(), "owner": key.owner_id().to_hex() })
        ),
        OutputFormat::Text => {
            println!("{} Key written to {}", "✓".green().bold(), path.display().to_string().bold());
            println!("  Owner: {}", key.owner_id().to_hex().cyan());
        }
    }
    Ok(())
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    DocregServer::open(config)?.serve().await?;
    Ok(())
}

async fn cmd_add(config: &ServerConfig, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => file_name(&args.file)?,
    };
    let content = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let node = open_node(config)?;
    let key = load_or_generate(&config.key_path)?;
    let hash = content_hash(&content);

    match node.registry.add(key.owner_id(), &name, Bytes::from(content)).await {
        Ok(address) => {
            match format {
                OutputFormat::Json => println!(
                    "{}",
                    json!({
                        "address": address.to_string(),
                        "object_id": address.object_id.to_hex(),
                        "content_hash": address.content_hash.to_hex(),
                        "name": name,
                    })
                ),
                OutputFormat::Text => {
                    println!("{} Registered {}", "✓".green().bold(), name.bold());
                    println!("  Content hash: {}", address.content_hash.to_hex().yellow());
                    println!("  Object: {}", address.object_id.to_hex().dimmed());
                }
            }
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            // Registered already: report the existing record when the content matches.
            match node.registry.get(&hash).await {
                Ok(existing) => {
                    if format == OutputFormat::Text {
                        println!(
                            "{} Content already registered as {}",
                            "•".yellow().bold(),
                            existing.name.bold()
                        );
                    }
                    print_record(&existing, format);
                    Ok(())
                }
                Err(_) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_get(config: &ServerConfig, args: GetArgs) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let key = load_key(&config.key_path)?;
    let doc = node.registry.read_by_name(&key.owner_id(), &args.name).await?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &doc.content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!(
                "{} {} bytes written to {}",
                "✓".green().bold(),
                doc.content.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&doc.content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn cmd_show(config: &ServerConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let hash = ContentHash::from_hex(&args.content_hash)
        .with_context(|| format!("invalid content hash {:?}", args.content_hash))?;
    let node = open_node(config)?;
    let record = node.registry.get(&hash).await?;
    print_record(&record, format);
    Ok(())
}

fn cmd_list(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let key = load_key(&config.key_path)?;
    let records = node.ledger.documents_of(&key.owner_id())?;
    if records.is_empty() && format == OutputFormat::Text {
        println!("No documents.");
    }
    for record in &records {
        print_record(record, format);
    }
    Ok(())
}

async fn cmd_delete(config: &ServerConfig, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let key = load_key(&config.key_path)?;
    let removed = node.registry.delete_by_name(&key, &args.name).await?;
    match format {
        OutputFormat::Json => print_record(&removed, format),
        OutputFormat::Text => {
            println!("{} Deleted {}", "✓".green().bold(), removed.name.bold());
            println!("  Content hash: {}", removed.content_hash.to_hex().yellow());
        }
    }
    Ok(())
}

async fn cmd_supply(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let supply = node.registry.total_supply().await?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "total_supply": supply })),
        OutputFormat::Text => println!("Total supply: {}", supply.to_string().bold()),
    }
    Ok(())
}

fn cmd_verify(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let receipts = node.ledger.validate_journal()?;
    let records = node.ledger.check_invariants()?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "journal_receipts": receipts, "live_documents": records, "valid": true })
        ),
        OutputFormat::Text => {
            println!("{} Ledger integrity verified", "✓".green().bold());
            println!("  Journal: {} receipts, hash chain {}", receipts.to_string().bold(), "valid".green());
            println!("  Documents: {} live, supply and index {}", records.to_string().bold(), "consistent".green());
        }
    }
    Ok(())
}

fn cmd_compact(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let node = open_node(config)?;
    let wal = node.data_dir.join(LEDGER_FILE);
    let before = wal_len(&wal)?;
    node.ledger.compact().context("compacting ledger")?;
    let after = wal_len(&wal)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({ "path": wal.display().to_string(), "bytes_before": before, "bytes_after": after })
        ),
        OutputFormat::Text => {
            println!("{} Ledger compacted", "✓".green().bold());
            println!("  {} -> {} bytes", before, after.to_string().bold());
        }
    }
    Ok(())
}

fn wal_len(path: &Path) -> anyhow::Result<u64> {
    Ok(std::fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len())
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name; pass --name", path.display()))
}
