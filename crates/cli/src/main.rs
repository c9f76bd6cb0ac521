mod command;

use std::io::Read;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use custody_core::arrangement::ArrangementRequest;
use custody_core::config::CustodyConfig;
use custody_core::engine::ArrangementEngine;
use custody_core::query::QueryService;
use custody_db::{DbConfig, PgCustodyStore};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::command::{Cli, Command, RequestSource};

/// Exit status when an arrangement was refused by the custody rules.
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custody_cli=info,custody_core=info,custody_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- Configuration ---
    let custody_config = CustodyConfig::from_env()?;
    let db_config = DbConfig::from_env()?;
    tracing::debug!(
        operator_department_id = custody_config.operator_department_id,
        max_conflict_retries = custody_config.max_conflict_retries,
        max_connections = db_config.max_connections,
        "Loaded configuration"
    );

    // --- Database ---
    let pool = custody_db::create_pool(&db_config)
        .await
        .context("failed to connect to database")?;
    custody_db::health_check(&pool)
        .await
        .context("database health check failed")?;
    let store = PgCustodyStore::new(pool, db_config.lock_timeout);

    match cli.command {
        Command::Prepare { asset_ids } => {
            let view = queries(&store, custody_config).prepare(&asset_ids).await?;
            print_json(&view)?;
        }
        Command::Process { source } => {
            let request = read_request(&source)?;
            let engine = ArrangementEngine::new(
                store.clone(),
                store.clone(),
                store,
                custody_config,
            );
            let outcome = engine.process(request).await?;
            print_json(&outcome)?;
            if !outcome.is_ok() {
                return Ok(ExitCode::from(EXIT_REJECTED));
            }
        }
        Command::History { asset_id } => {
            let entries = queries(&store, custody_config).history(asset_id).await?;
            print_json(&entries)?;
        }
        Command::Holdings { worker_id } => {
            let records = queries(&store, custody_config).holdings(worker_id).await?;
            print_json(&records)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn queries(
    store: &PgCustodyStore,
    config: CustodyConfig,
) -> QueryService<PgCustodyStore, PgCustodyStore, PgCustodyStore> {
    QueryService::new(store.clone(), store.clone(), store.clone(), config)
}

fn read_request(source: &RequestSource) -> anyhow::Result<ArrangementRequest> {
    let raw = match source {
        RequestSource::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read request from stdin")?;
            buf
        }
        RequestSource::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
    };
    serde_json::from_str(&raw).context("request is not a valid arrangement document")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
