use clap::{Parser, Subcommand};
use ferrous_filters_application::FilterEngine;
use ferrous_filters_domain::{CliOverrides, FilterId, GroupId};
use ferrous_filters_jobs::{FilterUpdateJob, JobRunner};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod commands;
mod di;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ferrous-filters")]
#[command(version)]
#[command(about = "Ferrous Filters - Content-filter subscription manager")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Database path
    #[arg(long)]
    database: Option<String>,

    /// Rule files directory
    #[arg(long)]
    rules_dir: Option<String>,

    /// Subscription catalog (filters.json)
    #[arg(long)]
    catalog: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the engine with scheduled update checks until interrupted
    Run,
    /// List filters and groups
    List,
    /// Enable filters
    Enable {
        #[arg(required = true)]
        ids: Vec<FilterId>,
    },
    /// Disable filters
    Disable {
        #[arg(required = true)]
        ids: Vec<FilterId>,
    },
    /// Enable a filter group
    EnableGroup { id: GroupId },
    /// Disable a filter group
    DisableGroup { id: GroupId },
    /// Subscribe to a custom filter list
    AddCustom {
        url: String,
        /// Title used when the list has no `! Title:` header
        #[arg(long)]
        title: Option<String>,
        /// Allow scriptlet and replace rules from this list
        #[arg(long)]
        trusted: bool,
    },
    /// Remove a custom filter
    RemoveCustom { id: FilterId },
    /// Edit the user's own rules
    UserRules {
        #[command(subcommand)]
        action: UserRulesAction,
    },
    /// Print the number of active rules
    Count,
    /// Check every enabled filter for updates now
    CheckUpdates,
}

#[derive(Subcommand)]
enum UserRulesAction {
    Add {
        #[arg(required = true)]
        rules: Vec<String>,
    },
    Remove {
        rule: String,
    },
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        database_path: cli.database.clone(),
        rules_dir: cli.rules_dir.clone(),
        catalog_path: cli.catalog.clone(),
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config.logging)?;

    info!("Starting Ferrous Filters v{}", env!("CARGO_PKG_VERSION"));

    let pool = bootstrap::init_database(&config.storage.database_path).await?;
    let adapters = di::Adapters::new(&config, pool)?;

    let default_period_hours = i64::try_from(config.updates.default_period_hours).unwrap_or(i64::MAX);
    let engine = FilterEngine::start(adapters.ports(), &config.engine, default_period_hours).await?;
    let use_cases = di::UseCases::new(&engine);

    let result = match cli.command {
        Command::Run => run(&engine, &config.updates).await,
        Command::List => commands::list(&use_cases).await,
        Command::Enable { ids } => commands::set_enabled(&use_cases, &ids, true).await,
        Command::Disable { ids } => commands::set_enabled(&use_cases, &ids, false).await,
        Command::EnableGroup { id } => commands::set_group_enabled(&use_cases, id, true).await,
        Command::DisableGroup { id } => commands::set_group_enabled(&use_cases, id, false).await,
        Command::AddCustom {
            url,
            title,
            trusted,
        } => commands::add_custom(&use_cases, &url, title.as_deref(), trusted).await,
        Command::RemoveCustom { id } => commands::remove_custom(&use_cases, id).await,
        Command::UserRules { action } => match action {
            UserRulesAction::Add { rules } => {
                use_cases.user_rules.add(rules);
                Ok(())
            }
            UserRulesAction::Remove { rule } => {
                use_cases.user_rules.remove(&rule);
                Ok(())
            }
            UserRulesAction::Show => commands::show_user_rules(&use_cases).await,
        },
        Command::Count => {
            println!("{}", use_cases.get_active_rule_count.execute());
            Ok(())
        }
        Command::CheckUpdates => commands::check_updates(&use_cases).await,
    };

    // Flushes pending batched changes before exit.
    engine.shutdown().await;

    if let Err(e) = &result {
        error!(error = %e, "Command failed");
    }
    result
}

async fn run(
    engine: &FilterEngine,
    updates: &ferrous_filters_domain::config::UpdatesConfig,
) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let update_job = FilterUpdateJob::new(
        Arc::clone(&engine.updates),
        Arc::clone(&engine.settings),
        Arc::clone(&engine.bus),
    )
    .with_first_check_delay(updates.first_check_delay())
    .with_enabled_filter_skip(updates.enabled_filter_skip());

    let handles = JobRunner::new()
        .with_filter_update(update_job)
        .with_shutdown_token(shutdown.clone())
        .start()
        .await;

    info!(
        rules = engine.get_active_rule_count(),
        "Engine running, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    shutdown.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Background job ended abnormally");
        }
    }
    Ok(())
}
