use anyhow::{Context, Result, bail};
use config::DashboardConfig;
use dashboard::{Dashboard, DashboardSession, FilterControls, SessionEvent, TextPresenter, Views};
use loader::CsvLoader;
use processor::SalesAggregator;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use storage::ExportManager;
use tracing::{error, info, warn};

mod config;
mod dashboard;
mod loader;
mod models;
mod processor;
mod storage;

const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "src/configs/dashboard.toml";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let interactive = args.iter().any(|arg| arg == "--interactive" || arg == "-i");
    let export = args.iter().any(|arg| arg == "--export" || arg == "-e");
    let json = args.iter().any(|arg| arg == "--json");

    let config_path = arg_value(&args, "--config")?
        .or_else(|| env::var(CONFIG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    info!("🚀 Starting sales dashboard for {}", config.data.path);

    // The base table is read once and shared read-only from here on
    let loader = CsvLoader::from_config(&config.data);
    let table = loader
        .load()
        .with_context(|| format!("Failed to load sales data from {}", loader.path().display()))?;

    let dashboard = Dashboard::new(table, SalesAggregator::new(config.report.top_regions));
    let controls = FilterControls::from_table(dashboard.table())?.with_defaults(&config.filters)?;
    let presenter = TextPresenter::new(&config.report.title, config.report.chart_width);
    let exporter = ExportManager::new(&config.report.export_dir);
    let mut session = DashboardSession::new(dashboard, controls);

    let views = session.current()?;
    show(&views, &presenter, json)?;

    if export {
        export_views(&session, &exporter, &views)?;
    }

    if interactive {
        run_interactive(&mut session, &presenter, &exporter, json)?;
    }

    Ok(())
}

fn load_config(path: &str) -> Result<DashboardConfig> {
    if Path::new(path).exists() {
        let config = DashboardConfig::from_file(path)
            .with_context(|| format!("Failed to load dashboard configuration from {}", path))?;
        info!("Loaded configuration from {}", path);
        return Ok(config);
    }

    warn!("Config file not found at {}, using defaults", path);
    let mut config = DashboardConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Value following `flag`. A flag given without a value is an error.
fn arg_value(args: &[String], flag: &str) -> Result<Option<String>> {
    let Some(idx) = args.iter().position(|arg| arg == flag) else {
        return Ok(None);
    };

    match args.get(idx + 1) {
        Some(value) if !value.starts_with('-') => Ok(Some(value.clone())),
        _ => bail!("{} expects a value", flag),
    }
}

fn show(views: &Views, presenter: &TextPresenter, json: bool) -> Result<()> {
    if views.is_empty() {
        warn!("No orders match the current filters");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(views)?)?;
    } else {
        presenter.present(views, &mut out)?;
    }

    out.flush()?;
    Ok(())
}

fn export_views(session: &DashboardSession, exporter: &ExportManager, views: &Views) -> Result<()> {
    let filtered = session.filtered()?;
    let paths = exporter.export(views, &filtered)?;
    info!("✅ Views written to {}", paths.views.display());
    info!("✅ Filtered rows written to {}", paths.filtered.display());
    Ok(())
}

fn run_interactive(
    session: &mut DashboardSession,
    presenter: &TextPresenter,
    exporter: &ExportManager,
    json: bool,
) -> Result<()> {
    let controls = session.controls();
    let (first, last) = controls.date_bounds();
    println!("\nDates: {} to {}", first, last);
    println!("Categories: {}", controls.category_options().join(", "));
    println!("Courier statuses: {}", controls.status_options().join(", "));
    println!("Type 'help' for commands.");
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match session.handle(&line) {
            Ok(SessionEvent::Rendered(views)) => show(&views, presenter, json)?,
            Ok(SessionEvent::Export(views)) => {
                if let Err(e) = export_views(session, exporter, &views) {
                    error!("❌ Export failed: {:#}", e);
                }
            }
            Ok(SessionEvent::Message(message)) => println!("{}", message),
            Ok(SessionEvent::Quit) => break,
            Err(e) => warn!("{:#}", e),
        }
    }

    info!("Session closed");
    Ok(())
}
