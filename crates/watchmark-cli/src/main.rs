use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use watchmark_core::{MarkerConfig, MouseButton};
use watchmark_engine::{MarkerSession, NodeId, PointerAction, SnapshotPage, ToggleOutcome};
use watchmark_store::{FileStore, HistoryStore};

#[derive(Parser)]
#[command(name = "watchmark")]
#[command(about = "Watched-video marker engine, driven from page snapshots", long_about = None)]
struct Cli {
    /// Directory holding the persisted watched history
    #[arg(long, default_value = ".watchmark")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass over a page snapshot
    Pass {
        /// Page snapshot JSON file; updated in place with marker state
        #[arg(long)]
        page: PathBuf,
        /// Clock override, milliseconds since epoch
        #[arg(long)]
        now: Option<i64>,
    },
    /// Simulate a modifier+pointer toggle on a snapshot container
    Toggle {
        #[arg(long)]
        page: PathBuf,
        /// Index of the container under the pointer
        #[arg(long)]
        node: usize,
        #[arg(long, default_value = "primary")]
        button: MouseButton,
        #[arg(long)]
        now: Option<i64>,
    },
    /// Show the stored watched history
    History,
    /// Reset the stored watched history to empty
    Clear,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let backend = FileStore::open(&cli.data_dir)
        .with_context(|| format!("Failed to open data dir {:?}", cli.data_dir))?;

    match cli.command {
        Commands::Pass { page, now } => run_pass(backend, &page, now),
        Commands::Toggle {
            page,
            node,
            button,
            now,
        } => run_toggle(backend, &page, node, button, now),
        Commands::History => show_history(backend),
        Commands::Clear => clear_history(backend),
    }
}

fn clock(now_ms: Option<i64>) -> Result<DateTime<Utc>> {
    match now_ms {
        Some(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .with_context(|| format!("Invalid --now value {ms}")),
        None => Ok(Utc::now()),
    }
}

fn load_page(path: &Path) -> Result<SnapshotPage> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse snapshot {path:?}"))
}

fn save_page(path: &Path, page: &SnapshotPage) -> Result<()> {
    let raw = serde_json::to_string_pretty(page).context("Failed to serialize snapshot")?;
    fs::write(path, raw).with_context(|| format!("Failed to write snapshot {path:?}"))
}

fn run_pass(backend: FileStore, page_path: &Path, now_ms: Option<i64>) -> Result<()> {
    let mut page = load_page(page_path)?;
    let now = clock(now_ms)?;
    let mut session = MarkerSession::new(MarkerConfig::default(), backend);

    let report = session.run_pass(&mut page, now)?;
    println!(
        "pruned {} record(s), marked {}, unmarked {}, skipped {}",
        report.pruned, report.stats.marked, report.stats.unmarked, report.stats.skipped
    );
    match report.visit_recorded {
        Some(id) => println!("recorded visit: {id}"),
        None => println!("no visit recorded"),
    }
    print_containers(&page);
    save_page(page_path, &page)
}

fn run_toggle(
    backend: FileStore,
    page_path: &Path,
    node: usize,
    button: MouseButton,
    now_ms: Option<i64>,
) -> Result<()> {
    let mut page = load_page(page_path)?;
    if page.container(NodeId(node)).is_none() {
        anyhow::bail!("Snapshot has no container {node}");
    }
    let now = clock(now_ms)?;
    let mut session = MarkerSession::new(MarkerConfig::default(), backend);

    let action = PointerAction {
        button,
        alt_held: true,
        target: NodeId(node),
    };
    match session.handle_pointer(&mut page, action, now)? {
        ToggleOutcome::Ignored => println!("action ignored (button not configured)"),
        ToggleOutcome::NoAnchor => println!("no anchor at container {node}"),
        ToggleOutcome::NoVideoId => println!("anchor carries no video id"),
        ToggleOutcome::Toggled(toggled) => println!("toggled: {toggled:?}"),
    }
    print_containers(&page);
    save_page(page_path, &page)
}

fn show_history(backend: FileStore) -> Result<()> {
    let mut store = HistoryStore::new(backend);
    let history = store.load()?;
    if history.is_empty() {
        println!("history is empty");
        return Ok(());
    }
    println!("{} watched video(s):", history.len());
    for record in history.records() {
        println!("  {}  {}", record.timestamp.to_rfc3339(), record.id);
    }
    Ok(())
}

fn clear_history(backend: FileStore) -> Result<()> {
    let mut store = HistoryStore::new(backend);
    store.persist(&watchmark_store::WatchedHistory::new())?;
    println!("history cleared");
    Ok(())
}

fn print_containers(page: &SnapshotPage) {
    for (index, container) in page.containers.iter().enumerate() {
        let marker = if container.watched { "watched" } else { "-" };
        let href = container.anchor_href.as_deref().unwrap_or("(no anchor)");
        println!("  [{index}] {marker:7} {href}");
    }
}
