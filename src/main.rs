use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use media_regen::background::generator::FileDerivativeGenerator;
use media_regen::background::processors::conversion::ConversionPerformer;
use media_regen::background::queue::{ConversionQueue, spawn_worker};
use media_regen::bootstrap::guard::confirm_to_proceed;
use media_regen::bootstrap::logger::initialize_logger;
use media_regen::common::INDEX_RUNTIME;
use media_regen::common::errors::handle_error;
use media_regen::common::time_limit::TimeLimit;
use media_regen::config::RegenConfig;
use media_regen::config::args::RegenerateArgs;
use media_regen::config::conversions::load_conversions;
use media_regen::database::ops::repository::MediaRepository;
use media_regen::database::ops::tree::Tree;
use media_regen::regenerate::{RegenerationReport, Regenerator};
use media_regen::selection::resolve;
use media_regen::utils::MediaStorage;

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{elapsed_precise} [{bar:40.cyan/blue}] {pos}/{len} {per_sec}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn present(report: &RegenerationReport) {
    if report.has_errors() {
        warn!("All done, but with some error messages:");
        for line in report.error_lines() {
            warn!("{}", line);
        }
        if let Some(last_id) = report.last_processed_id() {
            info!(
                "To resume after the last processed media, set REGENERATE_STARTING_FROM_ID={} REGENERATE_EXCLUDE_STARTING_ID=true",
                last_id
            );
        }
    }
    info!("All done!");
}

fn write_report(report: &RegenerationReport, config: &RegenConfig) -> Result<()> {
    if let Some(path) = &config.report_path {
        let json = serde_json::to_vec_pretty(report)?;
        std::fs::write(path, json).context(format!("failed to write report to {:?}", path))?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run() -> Result<()> {
    let config = RegenConfig::from_env()?;
    let args = RegenerateArgs::from_env()?;

    confirm_to_proceed(&config, args.force)?;

    let time_limit = match config.time_limit_secs {
        Some(secs) => TimeLimit::arm(Duration::from_secs(secs)),
        None => TimeLimit::none(),
    };

    let tree = Arc::new(Tree::open(&config.db_path)?);
    let conversions = load_conversions(&config.conversions_path)?;
    let performer = ConversionPerformer::new(
        tree.clone(),
        MediaStorage::new(&config.storage_root),
        conversions,
        config.responsive_widths.clone(),
    );

    let (queue, worker) = if config.is_synchronous() {
        (ConversionQueue::Sync(performer.clone()), None)
    } else {
        let (queue, handle) = spawn_worker(&INDEX_RUNTIME, performer.clone());
        (queue, Some(handle))
    };
    let generator = FileDerivativeGenerator::new(performer, queue);

    let criterion = resolve(&args.selection_input());
    info!("Regenerating {}", criterion);
    let total = tree.count(&criterion)?;
    let progress = progress_bar(total);

    let report = Regenerator::new(&generator, config.is_synchronous())
        .with_time_limit(&time_limit)
        .run(
            criterion.fetch(tree.as_ref()),
            &args.generation_options(),
            &progress,
        )?;

    // Dropping the generator closes the queue so the worker can drain and stop.
    drop(generator);
    if let Some(handle) = worker {
        info!("Waiting for queued conversions to finish");
        if let Err(e) = INDEX_RUNTIME.block_on(handle) {
            error!("Conversion worker failed: {}", e);
        }
    }

    println!();
    present(&report);
    write_report(&report, &config)?;
    Ok(())
}

fn main() {
    dotenv::dotenv().ok();
    initialize_logger();

    if let Err(e) = run() {
        handle_error(e.context("Regeneration aborted"));
        std::process::exit(1);
    }
}
