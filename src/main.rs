use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use worldwiki::canvas::doc::{MapDoc, RelationshipDoc, SceneDocument, SceneError, SceneKind, SystemDoc, parse};
use worldwiki::category::Category;
use worldwiki::config::{ConfigError, DEFAULT_STORE_BASE_URL, StoreConfig};
use worldwiki::store::rest::{RestStore, spawn_change_poller};
use worldwiki::store::{DocumentStore, StoreError, StoreEvent};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("store request failed: {0}")]
    Store(#[from] StoreError),
    #[error("scene document rejected: {0}")]
    Scene(#[from] SceneError),
    #[error("file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("page `{0}` not found")]
    NotFound(String),
    #[error("change poller stopped: {0}")]
    PollerStopped(String),
}

#[derive(Parser, Debug)]
#[command(name = "worldwiki", about = "Worldbuilding wiki scene and page tools")]
struct Cli {
    #[arg(long, env = "WIKI_STORE_BASE_URL", default_value = DEFAULT_STORE_BASE_URL)]
    base_url: String,

    #[arg(long, env = "WIKI_STORE_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "WIKI_USER_ID", default_value = "")]
    user_id: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Scene(SceneCommand),
    Pages(PagesCommand),
}

#[derive(Args, Debug)]
struct SceneCommand {
    #[command(subcommand)]
    command: SceneSubcommand,
}

#[derive(Subcommand, Debug)]
enum SceneSubcommand {
    /// Report what loading a scene file would produce.
    Check {
        file: PathBuf,
        #[arg(long, value_parser = parse_kind)]
        kind: SceneKind,
    },
    /// Print (or rewrite) a scene file at the current schema version.
    Migrate {
        file: PathBuf,
        #[arg(long, value_parser = parse_kind)]
        kind: SceneKind,
        #[arg(long)]
        write: bool,
    },
}

#[derive(Args, Debug)]
struct PagesCommand {
    #[command(subcommand)]
    command: PagesSubcommand,
}

#[derive(Subcommand, Debug)]
enum PagesSubcommand {
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Show {
        key: String,
    },
    Delete {
        key: String,
    },
    /// Print page-count changes until interrupted.
    Watch,
}

fn parse_kind(raw: &str) -> Result<SceneKind, String> {
    SceneKind::parse(raw).ok_or_else(|| format!("unknown scene kind `{raw}` (map, relationships, system)"))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("no .env loaded: {e}");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scene(scene) => run_scene(scene),
        Command::Pages(pages) => {
            let config = StoreConfig::with_overrides(Some(&cli.base_url), &cli.user_id, cli.token)?;
            run_pages(&config, pages).await
        }
    }
}

// =============================================================================
// scene
// =============================================================================

fn run_scene(scene: SceneCommand) -> Result<(), CliError> {
    match scene.command {
        SceneSubcommand::Check { file, kind } => {
            let raw = std::fs::read_to_string(&file)?;
            print_json(&check_scene(kind, &raw)?)
        }
        SceneSubcommand::Migrate { file, kind, write } => {
            let raw = std::fs::read_to_string(&file)?;
            let migrated = migrate_scene(kind, &raw)?;
            if write {
                write_scene(&file, &migrated)?;
                info!(file = %file.display(), %kind, "scene file migrated");
                Ok(())
            } else {
                print_json(&migrated)
            }
        }
    }
}

fn stored_version(raw: &str) -> Result<u64, CliError> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(value.get("metaVersion").and_then(Value::as_u64).unwrap_or(0))
}

fn check_scene(kind: SceneKind, raw: &str) -> Result<Value, CliError> {
    let stored = stored_version(raw)?;
    let (version, entities, edges, dangling) = match kind {
        SceneKind::Map => {
            let doc: MapDoc = parse(raw)?;
            (doc.meta_version, doc.markers.len(), 0, 0)
        }
        SceneKind::Relationships => {
            let doc: RelationshipDoc = parse(raw)?;
            let dangling = doc
                .edges
                .iter()
                .filter(|e| !doc.nodes.iter().any(|n| n.key == e.from) || !doc.nodes.iter().any(|n| n.key == e.to))
                .count();
            (doc.meta_version, doc.nodes.len(), doc.edges.len(), dangling)
        }
        SceneKind::System => {
            let doc: SystemDoc = parse(raw)?;
            let dangling = doc
                .edges
                .iter()
                .filter(|e| !doc.nodes.iter().any(|n| n.id == e.from) || !doc.nodes.iter().any(|n| n.id == e.to))
                .count();
            (doc.meta_version, doc.nodes.len(), doc.edges.len(), dangling)
        }
    };
    Ok(json!({
        "kind": kind.to_string(),
        "storedVersion": stored,
        "metaVersion": version,
        "entities": entities,
        "edges": edges,
        "danglingEdges": dangling,
    }))
}

fn migrate_scene(kind: SceneKind, raw: &str) -> Result<Value, CliError> {
    let value = match kind {
        SceneKind::Map => parse::<MapDoc>(raw)?.to_value()?,
        SceneKind::Relationships => parse::<RelationshipDoc>(raw)?.to_value()?,
        SceneKind::System => parse::<SystemDoc>(raw)?.to_value()?,
    };
    Ok(value)
}

fn write_scene(file: &Path, value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    std::fs::write(file, rendered)?;
    Ok(())
}

// =============================================================================
// pages
// =============================================================================

async fn run_pages(config: &StoreConfig, pages: PagesCommand) -> Result<(), CliError> {
    let store = Arc::new(RestStore::new(config)?);
    match pages.command {
        PagesSubcommand::List { category } => {
            let filter = category
                .map(|raw| Category::parse(&raw).ok_or(CliError::UnknownCategory(raw)))
                .transpose()?;
            let listed: Vec<Value> = store
                .list()
                .await?
                .iter()
                .filter(|(_, page)| filter.is_none_or(|c| page.category() == c))
                .map(|(key, page)| json!({ "key": key, "category": page.category().label(), "title": page.title(key) }))
                .collect();
            print_json(&Value::Array(listed))
        }
        PagesSubcommand::Show { key } => {
            let page = store.load(&key).await?.ok_or_else(|| CliError::NotFound(key.clone()))?;
            print_json(&serde_json::to_value(&page)?)
        }
        PagesSubcommand::Delete { key } => {
            store.delete(&key).await?;
            print_json(&json!({ "deleted": key }))
        }
        PagesSubcommand::Watch => run_pages_watch(store, Duration::from_millis(config.poll_interval_ms)).await,
    }
}

async fn run_pages_watch(store: Arc<RestStore>, interval: Duration) -> Result<(), CliError> {
    let mut events = store.subscribe();
    let poller = spawn_change_poller(store, interval);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "ctrl-c handler failed");
                }
                break;
            }
            event = events.recv() => match event {
                Ok(StoreEvent::PagesChanged(pages)) => print_json(&json!({ "pages": pages.len() }))?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "page change events dropped"),
                Err(RecvError::Closed) => return poller_exit(poller.await),
            },
        }
    }
    poller.abort();
    Ok(())
}

/// The event feed only closes once the poller has dropped the store.
fn poller_exit(joined: Result<(), tokio::task::JoinError>) -> Result<(), CliError> {
    match joined {
        Err(e) => Err(CliError::PollerStopped(e.to_string())),
        Ok(()) => Err(CliError::PollerStopped("event feed closed".into())),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
