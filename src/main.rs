//! SahiBin - waste detection from the command line.
//!
//! Classifies each image given on the command line in one session and prints
//! the detection headline, disposal guide, nearby collection centers and the
//! running dashboard after every image.
//!
//! # Usage
//!
//! ```text
//! sahibin [--config DIR] <image>...
//! ```
//!
//! Settings are read from `DIR/SahiBin Settings.yaml` (default directory
//! `SahiBin Data/`), overridable with `SAHIBIN_<SECTION>__<KEY>` variables.

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use sahibin::config::DEFAULT_CONFIG_DIR;
use sahibin::models::{AggregateStats, DetectionHeadline, category_breakdown};
use sahibin::services::centers::{self, GeoLocation};
use sahibin::services::{guide, impact};
use sahibin::{APP_NAME, ClassificationResult, ConfigManager, SessionController, VERSION};

#[derive(Parser, Debug)]
#[command(name = "sahibin", version)]
#[command(about = "Classify waste images and track their environmental impact")]
#[command(
    after_help = "Environment:\n  SAHIBIN_<SECTION>__<KEY>   Override a setting, e.g. SAHIBIN_CLASSIFIER__TIMEOUT_SECS=5"
)]
struct Cli {
    /// Directory holding `SahiBin Settings.yaml`
    #[arg(long = "config", value_name = "DIR", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: Utf8PathBuf,

    /// Images to classify, in order
    #[arg(value_name = "IMAGE", required = true, num_args = 1..)]
    images: Vec<Utf8PathBuf>,
}

fn print_detection(headline: &DetectionHeadline, results: &[ClassificationResult]) {
    println!(
        "  Detected: {} ({}% confidence)",
        headline.category, headline.confidence_percent
    );
    println!("  Recyclable: {}", headline.recyclable_label());
    println!("  Disposal bin: {}", headline.disposal_bin);

    for (category, count) in category_breakdown(results) {
        println!("    {} x{}", category, count);
    }
}

fn print_guide(category: &str) {
    let info = guide::lookup(category);
    println!("  How to dispose ({}):", info.category);
    for (i, step) in info.steps.iter().enumerate() {
        println!("    {}. {}", i + 1, step);
    }
    println!("  Tip: {}", info.tips);
    println!("  {}", info.schedule);
}

fn print_centers(category: &str, origin: &GeoLocation, radius_km: f64) {
    let nearby = centers::accepting_near(category, origin, radius_km);
    if nearby.is_empty() {
        println!("  No collection centers accept {} within {} km", category, radius_km);
        return;
    }
    println!("  Collection centers accepting {}:", category);
    for (center, distance_km) in nearby {
        println!(
            "    {} - {} ({:.1} km away, {})",
            center.name, center.address, distance_km, center.hours
        );
    }
}

fn print_dashboard(stats: &AggregateStats) {
    println!("Dashboard:");
    for metric in stats.dashboard_metrics() {
        println!("  {:<16} {}", metric.title, metric.value);
    }
}

fn print_impact(stats: &AggregateStats) {
    println!("Projected impact:");
    for projection in impact::project(stats) {
        let f = projection.figures;
        println!(
            "  {:<8} {:.1} kg CO₂, {:.1} kWh, {:.2} trees, {:.0} L water",
            projection.period.label(),
            f.co2_kg,
            f.energy_kwh,
            f.trees,
            f.water_l
        );
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let config_manager = ConfigManager::new(&args.config_dir)?;
    let settings = config_manager.load_settings()?;

    // Guard must live until exit so buffered log lines are flushed
    let _guard = sahibin::logging::setup_logging(&settings.logging, "sahibin")?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("sahibin-worker")
        .build()?;

    let session = SessionController::from_settings(&settings.classifier)?;
    let origin = GeoLocation::from(&settings.centers);
    let radius_km = settings.centers.search_radius_km;

    let mut failures = 0usize;
    for path in &args.images {
        println!("== {} ==", path);

        match runtime.block_on(session.capture_from_path(path)) {
            Ok(results) => {
                if let Some(headline) = session.headline() {
                    print_detection(&headline, &results);
                    print_guide(&headline.category);
                    print_centers(&headline.category, &origin, radius_km);
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!("Failed to process {}: {}", path, e);
                println!("  Error: {}", e);
            }
        }

        // Back to Idle for the next image; statistics carry over
        session.retry()?;
        println!();
    }

    let stats = session.aggregate_stats();
    print_dashboard(&stats);
    print_impact(&stats);

    session.metrics().log_summary();
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Processed {} images, {} failed", args.images.len(), failures);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_dir_defaults() {
        let cli = Cli::try_parse_from(["sahibin", "peel.jpg", "bottle.png"]).unwrap();

        assert_eq!(cli.config_dir, Utf8PathBuf::from(DEFAULT_CONFIG_DIR));
        assert_eq!(
            cli.images,
            vec![Utf8PathBuf::from("peel.jpg"), Utf8PathBuf::from("bottle.png")]
        );
    }

    #[test]
    fn test_config_dir_override() {
        let cli = Cli::try_parse_from(["sahibin", "--config", "conf", "peel.jpg"]).unwrap();
        assert_eq!(cli.config_dir, Utf8PathBuf::from("conf"));
    }

    #[test]
    fn test_images_required() {
        let err = Cli::try_parse_from(["sahibin"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["sahibin", "--bogus", "a.jpg"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
