use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hd_core::Ingestor;
use hd_core::types::{BatchResult, EventStream};
use hd_db::{DbStore, schema};
use hd_serve::config::Config;
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "hd", about = "Helpdesk event ingestion service")]
struct Cli {
    /// TOML config file. `HD_*` environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database path, overriding config and environment.
    #[arg(long, global = true)]
    db_path: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP ingestion service.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Ingest a batch file directly into the store.
    Ingest {
        #[arg(long, value_enum, default_value_t = StreamArg::AiLog)]
        stream: StreamArg,
        /// JSON array of events, or an object with a `logs`/`events` array.
        file: PathBuf,
    },
    /// Create or update the database schema.
    Migrate,
}

#[derive(Clone, Copy, ValueEnum)]
enum StreamArg {
    AiLog,
    Telemetry,
}

impl From<StreamArg> for EventStream {
    fn from(value: StreamArg) -> Self {
        match value {
            StreamArg::AiLog => EventStream::AiLog,
            StreamArg::Telemetry => EventStream::Telemetry,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }
    init_tracing(&config.log_filter);

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            config.validate(true)?;
            ensure_parent_dir(&config.db_path)?;
            let addr = config.socket_addr()?;
            tracing::info!(?config, "configuration loaded");
            let state = hd_serve::AppState::initialize(config)?;
            hd_serve::serve(state, addr).await?;
        }
        Command::Ingest { stream, file } => {
            config.validate(false)?;
            ensure_parent_dir(&config.db_path)?;
            let items = read_batch(&file)?;
            let stream = EventStream::from(stream);
            let conn = schema::open_and_migrate(&config.db_path, config.store_timeout())?;
            let ingestor = Ingestor::new(DbStore::new(conn), config.ingest_config());
            let result = ingestor.stream(stream).ingest(&items)?;
            print_summary(stream, &result);
        }
        Command::Migrate => {
            ensure_parent_dir(&config.db_path)?;
            schema::open_and_migrate(&config.db_path, config.store_timeout())?;
            println!("{} {}", "migrated".green(), config.db_path);
        }
    }
    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

fn read_batch(path: &Path) -> anyhow::Result<Vec<Value>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("logs").or_else(|| map.remove("events")) {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("{} has no `logs` or `events` array", path.display()),
        },
        _ => anyhow::bail!("{} is not a batch", path.display()),
    }
}

fn print_summary(stream: EventStream, result: &BatchResult) {
    println!(
        "{} received={} {} {} {}",
        stream.bold(),
        result.received,
        format!("saved={}", result.saved).green(),
        format!("duplicate={}", result.duplicate).yellow(),
        format!("failed={}", result.failed).red(),
    );
    for failure in &result.failures {
        let id = if failure.event_id.is_empty() {
            "<no eventId>"
        } else {
            failure.event_id.as_str()
        };
        println!("  {} {}", id.red(), failure.reason);
    }
}
