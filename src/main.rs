// Entry point: parse flags, load configuration, dispatch the subcommand.
//
// `serve` runs the dashboard server; `report`, `summary` and `export` load
// the dataset once and write their output before exiting.

use anyhow::{bail, Context, Result};
use space_dashboard::cli::{Args, Command};
use space_dashboard::config::{Config, DEFAULT_CONFIG_FILE};
use space_dashboard::http::{create_router, AppState, Settings};
use space_dashboard::loader::{load_dataset, DatasetCache, Dataset};
use space_dashboard::report::{self, report_filename, ReportOptions};
use space_dashboard::reports::Analysis;
use space_dashboard::{output, util};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    if let Command::InitConfig { force } = args.command {
        if let Err(e) = handle_init_config(force) {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

fn handle_init_config(force: bool) -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite it", DEFAULT_CONFIG_FILE);
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref path) = args.config {
        info!("Loading config from: {}", path.display());
        return Ok(Config::load(path)?);
    }
    match Config::load_from_dir(Path::new(".")) {
        Ok(Some(config)) => {
            info!("Loaded config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    match args.command {
        Command::Serve { .. } => serve(&config).await,
        Command::Report { ref output, .. } => {
            let dataset = load(&config)?;
            write_report(&config, &dataset, output.as_deref())
        }
        Command::Summary { rows, .. } => {
            let dataset = load(&config)?;
            print_summary(&dataset, rows);
            Ok(())
        }
        Command::Export { ref dir, .. } => {
            let dataset = load(&config)?;
            let analysis = Analysis::compute(&dataset);
            let written = output::export_analysis(&analysis, dir)
                .with_context(|| format!("Failed to export to {}", dir.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

fn load(config: &Config) -> Result<Dataset> {
    load_dataset(&config.data.path, config.data.label_locale)
        .with_context(|| format!("Failed to load dataset {}", config.data.path.display()))
}

fn write_report(config: &Config, dataset: &Dataset, output: Option<&Path>) -> Result<()> {
    let options = ReportOptions::now(config.report.title.clone());
    let bytes = report::generate(dataset, &options).context("Failed to generate report")?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => config.report.output_dir.join(report_filename(options.generated_at)),
    };
    std::fs::write(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "Report written to {} ({} bytes)",
        path.display(),
        util::format_large_number(bytes.len() as f64)
    );
    Ok(())
}

fn print_summary(dataset: &Dataset, rows: usize) {
    let analysis = Analysis::compute(dataset);
    let s = &analysis.summary;
    println!(
        "Dataset: {} records, {} countries, {} mission types",
        util::format_int(s.records),
        util::format_int(s.countries),
        util::format_int(s.mission_types)
    );
    if let (Some(first), Some(last)) = (s.first_year, s.last_year) {
        println!("Years: {} - {}", first, last);
    }
    println!(
        "Mean success rate: {}",
        util::format_optional(s.mean_success_rate, util::format_percent)
    );
    println!(
        "Mean budget: {}",
        util::format_optional(s.mean_budget, util::format_billions)
    );
    output::print_analysis(&analysis, rows);
}

async fn serve(config: &Config) -> Result<()> {
    let cache = DatasetCache::new(config.data.path.clone(), config.data.label_locale);
    // Warm the cache. Load failures are reported again on every request.
    match cache.get() {
        Ok(dataset) => info!(
            "Serving {} records from {}",
            util::format_int(dataset.len()),
            cache.path().display()
        ),
        Err(e) => warn!("Dataset {} not loaded yet: {}", cache.path().display(), e),
    }
    let state = AppState::new(
        cache,
        Settings {
            title: config.report.title.clone(),
            sample_rows: config.data.sample_rows,
        },
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Dashboard listening on http://{}", config.server.bind);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
