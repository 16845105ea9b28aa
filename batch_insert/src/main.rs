use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use batch_insert::config;
use batch_insert::utils::logging::init_logging;
use batch_insert::{
    BatchInsertClient, BatchInserter, DryRunExecutor, InsertOptions, Row, TableRegistry,
};

/// Insert a JSON or YAML array of objects into a table, one multi-row
/// statement per chunk
#[derive(Debug, Parser)]
#[command(name = "batch_insert", version)]
struct Cli {
    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long)]
    config: PathBuf,

    /// Destination table
    #[arg(short, long)]
    table: String,

    /// Input file holding an array of row objects
    #[arg(short, long)]
    input: PathBuf,

    /// Override `batch.chunk_size`
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Compose and log statements without touching the database
    #[arg(long)]
    dry_run: bool,
}

fn load_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_yaml = path
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");
    let document: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let serde_json::Value::Array(items) = document else {
        bail!("{} must contain an array of objects", path.display());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| Row::try_from(item).with_context(|| format!("row {}", i)))
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.to_string_lossy();
    let mut config = config::load_from_file(&config_path)?;
    if let Some(chunk_size) = cli.chunk_size {
        config.batch.chunk_size = chunk_size;
        config.validate()?;
    }
    init_logging(&config.logging)?;

    let rows = load_rows(&cli.input)?;

    if cli.dry_run {
        let inserter = BatchInserter::with_options(Arc::new(TableRegistry::new()), InsertOptions::from(&config.batch));
        let columns = inserter
            .plan(Some(cli.table.as_str()), &rows)?
            .map_or(0, |plan| plan.shape().columns.len());
        let mut executor = DryRunExecutor::new(columns);
        let affected = inserter.insert(Some(cli.table.as_str()), &rows, &mut executor)?;

        for statement in executor.statements() {
            println!("{};", statement.sql);
            println!("-- params: {}", serde_json::to_string(&statement.params)?);
        }
        println!(
            "{} rows in {} statements (dry run)",
            affected.unwrap_or(0),
            executor.statements().len()
        );
        return Ok(());
    }

    let client = BatchInsertClient::new(config).await?;
    match client.insert_rows(Some(cli.table.as_str()), &rows).await? {
        Some(affected) => println!("{} rows inserted into {}", affected, cli.table),
        None => println!("nothing to insert"),
    }
    client.connection().close().await;

    Ok(())
}
