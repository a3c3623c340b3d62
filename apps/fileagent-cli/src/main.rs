//! Headless file agent demo.
//!
//! Feeds local paths through the drop flow of a [`FileAgent`] rendered on
//! the in-memory surface, optionally uploads them, and prints the resulting
//! records.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fileagent_agent::{AgentConfig, DropPayload, FileAgent};
use fileagent_record::FileRecord;
use fileagent_uploader::HttpUploader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fileagent-cli", version, about = "Validate and upload files with a file agent")]
struct Args {
    /// JSON agent configuration (camelCase keys).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upload endpoint; overrides `uploadUrl` from the config.
    #[arg(long)]
    upload_url: Option<String>,

    /// Keep a single file, like a non-multiple input.
    #[arg(long)]
    single: bool,

    /// Files or directories to drop.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn describe(record: &FileRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{:?}",
        record.name(),
        record.size_text(),
        record.upload_state()
    );
    if let Some(error) = record.error() {
        line.push_str(&format!("\terror: {}", error.message));
    }
    if let Some(url) = record.url() {
        line.push_str(&format!("\t{url}"));
    }
    line
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,fileagent=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AgentConfig {
            multiple: true,
            ..AgentConfig::default()
        },
    };
    if args.single {
        config.multiple = false;
    }
    if let Some(url) = args.upload_url {
        config.upload_url = Some(url);
    }

    let mut builder = FileAgent::builder(config.clone());
    if config.auto_upload_url().is_some() {
        builder = builder.uploader(Arc::new(HttpUploader::new()));
    }
    let agent = builder.build().context("building file agent")?;

    tracing::info!(paths = args.paths.len(), "dropping paths");
    let added = agent.drop_files(DropPayload::paths(args.paths)).await?;
    if added.is_empty() {
        tracing::warn!("no files were added");
    }

    for record in agent.records() {
        println!("{}", describe(&record));
    }
    Ok(())
}
