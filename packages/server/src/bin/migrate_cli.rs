//! CLI for executing data migrations
//!
//! Outputs one JSON document per command for scripting.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_core::config::Config;
use portal_core::data_migrations::{
    all_migrations, find_migration, run_migration, DataMigration, MigrationContext,
    MigrationSummary, VerifyResult,
};
use portal_core::kernel::ServerDeps;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Registrant data migration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered migrations
    List,

    /// Estimate items to migrate
    Estimate { name: String },

    /// Run a migration to completion
    Run {
        name: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify migration completion
    Verify { name: String },
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize, Default)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<Vec<MigrationInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<MigrationSummary>,
}

#[derive(Serialize)]
struct MigrationInfo {
    name: String,
    description: Option<String>,
}

fn output(resp: Response) -> Result<()> {
    println!("{}", serde_json::to_string(&resp)?);
    Ok(())
}

fn not_found(name: &str) -> Result<()> {
    output(Response {
        success: false,
        message: Some(format!("Migration '{}' not found", name)),
        ..Default::default()
    })
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Estimate { name } => cmd_estimate(&name).await,
        Commands::Run { name, dry_run } => cmd_run(&name, dry_run).await,
        Commands::Verify { name } => cmd_verify(&name).await,
    }
}

async fn get_deps() -> Result<ServerDeps> {
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    ServerDeps::from_config(pool, &config)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list() -> Result<()> {
    let migrations: Vec<MigrationInfo> = all_migrations()
        .iter()
        .map(|m| MigrationInfo {
            name: m.name().to_string(),
            description: Some(m.description())
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
        .collect();

    output(Response {
        success: true,
        migrations: Some(migrations),
        ..Default::default()
    })
}

async fn cmd_estimate(name: &str) -> Result<()> {
    let Some(migration) = find_migration(name) else {
        return not_found(name);
    };
    let deps = get_deps().await?;

    let count = migration.estimate(&deps).await?;

    output(Response {
        success: true,
        count: Some(count),
        ..Default::default()
    })
}

async fn cmd_run(name: &str, dry_run: bool) -> Result<()> {
    let Some(migration) = find_migration(name) else {
        return not_found(name);
    };
    let ctx = MigrationContext {
        deps: get_deps().await?,
        dry_run,
    };

    let summary = run_migration(migration.as_ref(), &ctx).await?;
    let message = if summary.aborted {
        format!(
            "Error budget exceeded after {} items ({:.1}% failed)",
            summary.processed(),
            summary.error_rate() * 100.0
        )
    } else {
        format!(
            "Completed: {}, Skipped: {}, Failed: {}",
            summary.completed, summary.skipped, summary.failed
        )
    };

    output(Response {
        success: !summary.aborted && summary.failed == 0,
        message: Some(message),
        count: Some(summary.processed()),
        summary: Some(summary),
        ..Default::default()
    })
}

async fn cmd_verify(name: &str) -> Result<()> {
    let Some(migration) = find_migration(name) else {
        return not_found(name);
    };
    let deps = get_deps().await?;

    let response = match migration.verify(&deps).await? {
        VerifyResult::Passed => Response {
            success: true,
            message: Some("Verification passed".to_string()),
            ..Default::default()
        },
        VerifyResult::Incomplete { remaining } => Response {
            success: false,
            message: Some(format!("{} items remaining", remaining)),
            count: Some(remaining),
            ..Default::default()
        },
        VerifyResult::Failed { issues } => Response {
            success: false,
            message: Some(issues.join("; ")),
            ..Default::default()
        },
    };

    output(response)
}
