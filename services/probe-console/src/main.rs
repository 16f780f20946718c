//! Probe Console CLI
//!
//! Headless front end for the dashboard controller: lists monitors, shows a
//! monitor's history, or bulk re-triggers a tag cohort.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use probe_console::panel::PanelView;
use probe_console::state::{DashboardView, GridStatus};
use probe_console::{load_config, Config, Dashboard, MonitorKind, ResultRecord, Tag};
use tracing::Level;

#[derive(Parser)]
#[command(name = "probe-console")]
#[command(about = "Headless console for the probe monitoring dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monitoring API base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List monitors matching a name search and tag filters
    List {
        /// Case-insensitive name substring
        #[arg(short, long)]
        search: Option<String>,

        /// Tag filter as key:value (repeatable, OR-ed)
        #[arg(short, long = "tag")]
        tags: Vec<Tag>,
    },
    /// Show the execution history of one monitor
    Results {
        #[arg(long, conflicts_with = "story", required_unless_present = "story")]
        probe: Option<String>,

        #[arg(long)]
        story: Option<String>,
    },
    /// Select every monitor matching the tag filters and re-run them
    Trigger {
        /// Tag filter as key:value (repeatable, OR-ed)
        #[arg(short, long = "tag")]
        tags: Vec<Tag>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, base_url={:?}, log_level={:?}",
        args.config,
        args.base_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    tracing::info!("Using monitoring API at {}", config.api.base_url);
    let dashboard = Dashboard::from_config(&config)?;

    match args.command {
        Command::List { search, tags } => {
            dashboard.load().await?;
            if let Some(term) = search {
                dashboard.set_search_term(&term).await;
            }
            for tag in &tags {
                dashboard.toggle_tag(&tag.to_string()).await?;
            }
            print_grid(&dashboard.view().await);
        }
        Command::Results { probe, story } => {
            let (kind, name) = match (probe, story) {
                (Some(name), _) => (MonitorKind::Probe, name),
                (None, Some(name)) => (MonitorKind::Story, name),
                (None, None) => return Err("either --probe or --story is required".into()),
            };
            let outcome = dashboard.open_monitor(kind, &name).await;
            print_panel(&dashboard.view().await);
            outcome?;
        }
        Command::Trigger { tags } => {
            dashboard.load().await?;
            for tag in &tags {
                dashboard.toggle_tag(&tag.to_string()).await?;
            }
            let selected = dashboard.select_all().await;
            if selected == 0 {
                return Err("no monitors match the tag filter; nothing triggered".into());
            }
            tracing::info!("Triggering {} selected monitors", selected);
            let outcome = dashboard.trigger_bulk().await;
            print_panel(&dashboard.view().await);
            outcome?;
        }
    }

    Ok(())
}

fn print_grid(view: &DashboardView) {
    if !view.vocabulary.is_empty() {
        println!("Tags:");
        for (key, values) in &view.vocabulary {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            println!("  {}: {}", key, values.join(", "));
        }
        println!();
    }

    match &view.grid {
        GridStatus::Loading => println!("Loading monitors..."),
        GridStatus::LoadFailed(message) => println!("{}", message),
        GridStatus::NoMonitorsConfigured => println!("No monitors configured"),
        GridStatus::NoMatches => println!("No monitors match your filters"),
        GridStatus::Showing { visible, total } => {
            if visible == total {
                println!("Showing all {} monitors", total);
            } else {
                println!("Showing {} of {} monitors", visible, total);
            }
            for monitor in &view.monitors {
                let tags: Vec<String> = monitor.item.flattened_tags().collect();
                println!(
                    "  [{}] {:<32} {:<8} {}  {}",
                    monitor.kind,
                    monitor.item.name,
                    monitor.item.status,
                    monitor.item.last_probed.format("%b %d %H:%M:%S"),
                    tags.join(" ")
                );
            }
        }
    }
}

fn print_panel(view: &DashboardView) {
    match view.panel.view() {
        PanelView::Closed => {}
        PanelView::Loading { target } => println!("{}: loading...", target),
        PanelView::Failed { target, message } => match target {
            Some(target) => println!("{}: {}", target, message),
            None => println!("{}", message),
        },
        PanelView::NoResults { target } => println!("{}: No results found", target),
        PanelView::Monitor { target, records } => {
            println!("{} results", target);
            for record in records {
                print_record(record, false);
            }
        }
        PanelView::Bulk { records, summary } => {
            println!(
                "Bulk Trigger Results: {} items triggered, {} successful, {} failed",
                summary.triggered_count, summary.succeeded, summary.failed
            );
            for record in records {
                print_record(record, true);
            }
        }
    }
}

fn print_record(record: &ResultRecord, show_name: bool) {
    let status = if record.success() { "OK" } else { "FAILED" };
    let started = record.started_at().format("%b %d %H:%M:%S");
    let name = if show_name {
        format!("{} ", record.name())
    } else {
        String::new()
    };

    match record {
        ResultRecord::Probe(probe) => {
            println!("  {}{} {}", name, started, status);
            if let Some(error) = &probe.error_message {
                println!("      error: {}", error);
            }
            if let Some(trace_id) = &probe.trace_id {
                println!("      trace: {}", trace_id);
            }
        }
        ResultRecord::Story(story) => {
            println!("  {}{} {}", name, started, status);
            for step in &story.step_results {
                let step_status = if step.success { "OK" } else { "FAILED" };
                println!("      {} {}", step.step_name, step_status);
                if let Some(error) = &step.error_message {
                    println!("        error: {}", error);
                }
            }
        }
    }
}
