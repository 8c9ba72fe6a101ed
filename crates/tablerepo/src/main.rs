use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tablerepo::config::StoreConfig;
use tablerepo::diagnostics::FailureAnalysis;
use tablerepo::models::{TableWithPartition, TableWithSort};
use tablerepo::repository::{CrudRepository, ReadRepository, Reader, Writer};
use tablerepo::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process store with the demo tables created on startup
    Memory,
    /// Existing DynamoDB tables
    Dynamodb,
}

/// tablerepo - Typed repositories over partition/sort key tables
#[derive(Parser, Debug)]
#[command(name = "tablerepo")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Store backend to run the walk-through against
    #[arg(long, short, value_enum, default_value = "memory")]
    backend: Backend,

    /// General AWS region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// DynamoDB region, takes precedence over --region
    #[arg(long, env = "AWS_DYNAMODB_REGION")]
    dynamodb_region: Option<String>,

    /// Custom DynamoDB endpoint (for local DynamoDB)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            region: self.region.clone(),
            dynamodb_region: self.dynamodb_region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tablerepo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(&cli).await {
        if let Some(analysis) = FailureAnalysis::analyze(&err) {
            eprintln!("\n{analysis}");
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let store = create_store(cli).await?;

    let partitioned = CrudRepository::<TableWithPartition, String>::new(store.clone())
        .context("binding TableWithPartition repository")?;
    let sorted = CrudRepository::<TableWithSort, String, String>::new(store.clone())
        .context("binding TableWithSort repository")?;
    let consistent =
        ReadRepository::<TableWithPartition, String>::with_consistent_read(store, true)
            .context("binding consistent TableWithPartition reader")?;

    walk_through_partitioned(&partitioned, &consistent).await?;
    walk_through_sorted(&sorted).await?;

    tracing::info!("Walk-through finished");
    Ok(())
}

async fn create_store(cli: &Cli) -> Result<SharedStore> {
    match cli.backend {
        Backend::Memory => {
            let store = tablerepo::storage::InMemoryStore::new();
            store.create_table("Test", "id", None).await;
            store.create_table("TableWithSort", "id", Some("sort")).await;
            tracing::info!("Using in-memory store");
            Ok(Arc::new(store))
        }
        Backend::Dynamodb => create_dynamodb_store(&cli.store_config()).await,
    }
}

#[cfg(feature = "dynamodb")]
async fn create_dynamodb_store(config: &StoreConfig) -> Result<SharedStore> {
    let client = tablerepo::storage::dynamodb::create_client(config).await?;
    Ok(Arc::new(tablerepo::storage::DynamoDbStore::new(client)))
}

#[cfg(not(feature = "dynamodb"))]
async fn create_dynamodb_store(config: &StoreConfig) -> Result<SharedStore> {
    // Resolve the region anyway so a missing one is reported the same way
    config.resolve_region()?;
    anyhow::bail!("DynamoDB backend not compiled in; rebuild with --features dynamodb")
}

async fn walk_through_partitioned(
    repo: &CrudRepository<TableWithPartition, String>,
    consistent: &ReadRepository<TableWithPartition, String>,
) -> Result<()> {
    let samples = TableWithPartition::samples();
    repo.save_all(&samples).await?;
    tracing::info!(count = repo.find_all().await?.len(), table = repo.table_name(), "Saved rows");

    let found = consistent.find_by(&"test1".to_string()).await?;
    tracing::info!(?found, "Consistent lookup of test1");

    let matching = repo
        .find_all_by_partition_key(&"test2".to_string())
        .await?;
    tracing::info!(count = matching.len(), "Rows with partition key test2");

    repo.save(&TableWithPartition::new("test1", "Something New"))
        .await?;
    tracing::info!(exists = repo.exists_by(&"test1".to_string()).await?, "Updated test1");

    repo.delete_by(&"test2".to_string()).await?;
    match repo.delete_by(&"test2".to_string()).await {
        Err(err) if err.is_not_found() => tracing::info!(%err, "Second delete of test2"),
        other => other?,
    }

    repo.delete_all().await?;
    tracing::info!(count = repo.find_all().await?.len(), "Cleaned up");
    Ok(())
}

async fn walk_through_sorted(repo: &CrudRepository<TableWithSort, String, String>) -> Result<()> {
    let samples = TableWithSort::samples();
    repo.save_all(&samples).await?;

    let matching = repo
        .find_all_by_partition_key(&"test2".to_string())
        .await?;
    tracing::info!(count = matching.len(), "Rows with partition key test2");

    let found = repo
        .find_by_keys(&"test1".to_string(), &"sort11".to_string())
        .await?;
    tracing::info!(?found, "Lookup of test1/sort11");

    match repo.find_by(&"test1".to_string()).await {
        Err(err) if err.is_usage() => {
            tracing::info!(%err, action = err.action().unwrap_or_default(), "Partition-only lookup")
        }
        other => {
            other?;
        }
    }

    let limited = repo.find_all_by(&|request| request.max_items(2)).await?;
    tracing::info!(count = limited.len(), "Scan limited to two rows");

    repo.delete_entities(&samples).await?;
    tracing::info!(count = repo.find_all().await?.len(), "Cleaned up");
    Ok(())
}
