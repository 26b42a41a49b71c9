//! Ontograph CLI - import OWL class hierarchies into a property graph

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ontograph_core::commands::{graph, import};
use ontograph_core::config::Config;
use ontograph_core::domain::import::EdgePolicy;
use ontograph_core::storage::{CURRENT_VERSION, Database, DatabaseConfig};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ontograph")]
#[command(author, version, about = "Import OWL class hierarchies into a property graph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Graph store database file (overrides store.path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an ontology's class hierarchy into the graph store
    Import {
        /// Ontology document (.ttl, .nt, .owl, .rdf, .xml)
        #[arg(short, long)]
        ontology: Option<PathBuf>,
        /// How existing isA edges are treated (merge or append)
        #[arg(short, long)]
        edge_policy: Option<EdgePolicy>,
    },

    /// Show graph store statistics
    Stats,

    /// Show a class node with its parents and children
    Show {
        /// Canonical class name, e.g. Animal or owl:Thing
        name: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "ontograph=warn" } else { "ontograph=info" };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = default.parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(e: &anyhow::Error) {
    match e.downcast_ref::<ontograph_core::Error>() {
        Some(err) => {
            eprintln!("Error [{}]: {}", err.code(), err);
            if let Some(suggestion) = err.suggestion() {
                eprintln!("  Suggestion: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", e),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Import {
            ontology,
            edge_policy,
        } => cmd_import(cli.store, ontology, edge_policy, cli.format, cli.quiet).await,

        Commands::Stats => cmd_stats(cli.store, cli.format, cli.quiet).await,

        Commands::Show { name } => cmd_show(cli.store, &name, cli.format, cli.quiet).await,

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Doctor => cmd_doctor(cli.store, cli.quiet).await,
    }
}

/// Load the config file, reporting any failure as a configuration error
fn load_config() -> anyhow::Result<Config> {
    Config::load().map_err(config_error)
}

fn config_error(e: anyhow::Error) -> anyhow::Error {
    ontograph_core::Error::ConfigError(format!("{e:#}")).into()
}

/// Open the graph store, preferring `--store` over the configured path
async fn open_store(config: &Config, store: Option<PathBuf>) -> anyhow::Result<Database> {
    let path = store.unwrap_or_else(|| config.store.path.clone());
    let db_config = DatabaseConfig::with_path(path).max_connections(config.store.max_connections);
    Database::new(db_config).await
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_import(
    store: Option<PathBuf>,
    ontology: Option<PathBuf>,
    edge_policy: Option<EdgePolicy>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;

    let ontology_path = ontology
        .or_else(|| config.import.ontology_path.clone())
        .ok_or_else(|| {
            ontograph_core::Error::InvalidInput(
                "No ontology given. Pass --ontology or set import.ontology_path.".to_string(),
            )
        })?;
    let edge_policy = edge_policy.unwrap_or(config.import.edge_policy);

    let db = open_store(&config, store).await?;
    info!(store = %db.path().display(), "Graph store opened");

    let outcome = tokio::select! {
        result = import::run(db.pool(), &ontology_path, edge_policy) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    db.close().await;

    let report = match outcome {
        Some(result) => result?,
        None => {
            warn!("Import interrupted, transaction rolled back");
            return Err(ontograph_core::Error::Other(
                "Import interrupted. No changes were written.".to_string(),
            )
            .into());
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if quiet {
                println!("{}", report.run_id);
            } else {
                println!("{}", report);
            }
        }
    }
    Ok(())
}

async fn cmd_stats(
    store: Option<PathBuf>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let db = open_store(&config, store).await?;
    let result = graph::get_stats(db.pool()).await;
    db.close().await;
    let stats = result?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            if !quiet {
                println!("Graph Store Statistics");
                println!("======================");
                println!();
            }
            println!("Nodes:          {}", stats.total_nodes);
            println!("Labelled nodes: {}", stats.labelled_nodes);
            println!("Relationships:  {}", stats.total_relationships);
            for (rel_type, count) in &stats.relationships_by_type {
                println!("  {:<12} {}", rel_type, count);
            }
            if stats.duplicate_relationships > 0 {
                println!("Duplicate relationships: {}", stats.duplicate_relationships);
            }
        }
    }
    Ok(())
}

async fn cmd_show(
    store: Option<PathBuf>,
    name: &str,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let db = open_store(&config, store).await?;
    let result = graph::get_node_details(db.pool(), name).await;
    db.close().await;
    let details = result?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&details)?),
        OutputFormat::Text => {
            println!("{}", details.name);
            if !quiet {
                let labels = if details.labels.is_empty() {
                    "(none)".to_string()
                } else {
                    details.labels.join(", ")
                };
                println!("  Labels:   {}", labels);
            }
            for parent in &details.parents {
                println!("  isA ->    {}", parent);
            }
            for child in &details.children {
                println!("  <- isA    {}", child);
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config()?;
            let value = config.get(&key).map_err(config_error)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = load_config()?;
            config.set(&key, &value).map_err(config_error)?;
            config.save().map_err(config_error)?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = load_config()?;
            let items = config.list().map_err(config_error)?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset().map_err(config_error)?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path().map_err(config_error)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(store: Option<PathBuf>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Ontograph Health Check");
        println!("======================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
            Config::default()
        }
    };

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) => {
                if path.exists() {
                    println!("[OK] Config file: {}", path.display());
                } else {
                    println!("[--] Config file: {} (using defaults)", path.display());
                }
            }
            Err(e) => {
                println!("[!!] Config file: Error - {}", e);
            }
        }
    }

    // Check ontology path
    if let Some(path) = &config.import.ontology_path {
        if path.exists() {
            if !quiet {
                println!("[OK] Ontology: {}", path.display());
            }
        } else {
            all_ok = false;
            if !quiet {
                println!("[!!] Ontology: {} not found", path.display());
            }
        }
    }

    // Check graph store
    match open_store(&config, store).await {
        Ok(db) => {
            match db.health_check().await {
                Ok(()) => {
                    if !quiet {
                        println!("[OK] Graph store: {}", db.path().display());
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Graph store: Error - {}", e);
                    }
                }
            }

            match db.migration_status().await {
                Ok(status) if !status.needs_migration => {
                    if !quiet {
                        println!("[OK] Schema: version {}", status.current_version);
                    }
                }
                Ok(status) => {
                    all_ok = false;
                    if !quiet {
                        println!(
                            "[!!] Schema: version {} (expected {})",
                            status.current_version, CURRENT_VERSION
                        );
                    }
                }
                Err(e) => {
                    all_ok = false;
                    if !quiet {
                        println!("[!!] Schema: Error - {}", e);
                    }
                }
            }

            db.close().await;
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Graph store: Error - {:#}", e);
            }
        }
    }

    if !quiet {
        println!();
    }

    if all_ok {
        if !quiet {
            println!("All checks passed.");
        }
        Ok(())
    } else {
        Err(anyhow::anyhow!("Some health checks failed"))
    }
}
