// Mismatch model entry point.
//
// Run sequence:
// 1. Initialize tracing (stderr, away from the console ranking)
// 2. Parse the CLI
// 3. Seed config/ from defaults/ on first run, load settings and weights
// 4. Load sources and the schedule, run the pipeline, write artifacts

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use mismatch_model::sources::games::GameRecord;
use mismatch_model::{config, matchup, pipeline, report, sources};

#[derive(Parser)]
#[command(name = "mismatch")]
#[command(about = "Aggregate, merge, and score team stats into mismatch rankings")]
struct Cli {
    /// Path to settings.toml
    #[arg(long, default_value = config::DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Path to weights.toml
    #[arg(long, default_value = config::DEFAULT_WEIGHTS_PATH)]
    weights: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every configured source and write the ranked team summary
    Analyze,

    /// Rank scheduled games by passing tilt and write weekly reports
    Matchups {
        /// How many matchups to report
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;

    // 2. Parse the CLI
    let cli = Cli::parse();

    // 3. Seed config/ from defaults/ when running against the default paths
    if cli.settings == Path::new(config::DEFAULT_SETTINGS_PATH)
        && cli.weights == Path::new(config::DEFAULT_WEIGHTS_PATH)
    {
        let copied = config::ensure_config_files(Path::new("."))
            .context("failed to initialize config files")?;
        for path in &copied {
            info!("Created {} from defaults", path.display());
        }
    }

    let settings = config::load_settings(&cli.settings).context("failed to load settings")?;
    let weights = config::load_weights(&cli.weights).context("failed to load weights")?;
    info!(
        "Config loaded: {} stat sources, {} weighted groups",
        settings.stats_paths.len(),
        weights.stats_weights.len()
    );

    // 4. Run the requested command
    match cli.command {
        Commands::Analyze => analyze(&settings, &weights),
        Commands::Matchups { top } => matchups(&settings, &weights, top),
    }
}

fn analyze(settings: &config::Settings, weights: &config::WeightConfig) -> anyhow::Result<()> {
    let sources = sources::load_enabled(settings);
    let games = load_schedule(settings);
    let artifacts = pipeline::run(&sources, games.as_deref(), weights, &[]);

    let written = report::write_team_tables(&settings.output.dir, &artifacts.tables)
        .context("failed to write team tables")?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    let summary_path = report::write_summary(&settings.output.dir, &artifacts.summary)
        .context("failed to write team summary")?;
    info!("Wrote {}", summary_path.display());

    print!(
        "{}",
        report::render_top(&artifacts.summary, settings.output.top_n)
    );
    println!("Full summary: {}", summary_path.display());
    Ok(())
}

fn matchups(
    settings: &config::Settings,
    weights: &config::WeightConfig,
    top: usize,
) -> anyhow::Result<()> {
    let Some(games) = load_schedule(settings) else {
        anyhow::bail!(
            "matchups needs a [games] table in settings and a readable schedule file"
        );
    };

    let sources = sources::load_enabled(settings);
    let artifacts = pipeline::run(&sources, Some(&games), weights, &[]);
    if artifacts.summary.is_empty() {
        warn!("summary is empty; no matchup reports written");
        return Ok(());
    }

    let tilts = matchup::compute_pass_tilts(&artifacts.summary, &games);
    let shown = &tilts[..tilts.len().min(top)];
    let (csv_path, md_path) = matchup::write_reports(&settings.output.dir, shown)
        .context("failed to write matchup reports")?;

    println!("Wrote {} and {}", csv_path.display(), md_path.display());
    Ok(())
}

/// Load the season schedule when games are configured. A missing or
/// unreadable schedule file downgrades to a warning; the pipeline still
/// runs without outcome metrics.
fn load_schedule(settings: &config::Settings) -> Option<Vec<GameRecord>> {
    let games_settings = settings.games.as_ref()?;
    let path = games_settings.games_file();
    match sources::games::load_games(&path) {
        Ok(games) => {
            info!(
                "loaded {} scheduled games from {}",
                games.len(),
                path.display()
            );
            Some(games)
        }
        Err(e) => {
            warn!("skipping game outcomes: {e}");
            None
        }
    }
}

/// Initialize tracing to stderr, leaving stdout for the rankings.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mismatch_model=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
