// Scheduler binary entry point
//
// One invocation = one batch: build the calendar context, evaluate
// every active template against it, create a ticket for each match.
// Periodic invocation (cron, systemd timer) is external.

use anyhow::Context;
use common::calendar::CalendarContext;
use common::config::Settings;
use common::dispatch::Dispatcher;
use common::templates;
use common::tracker::{DryRunTracker, GitLabTracker, IssueTracker};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|reason| anyhow::anyhow!(reason))
        .context("Invalid configuration")?;

    // Initialize tracing/logging
    common::telemetry::init_logging(&settings.observability.log_level)?;

    info!(
        tracker_url = %settings.tracker.server_url,
        dry_run = settings.scheduler.dry_run,
        "Starting recurring ticket scheduler"
    );

    // Load templates fresh for this run
    let templates = templates::load_templates(&settings.scheduler.templates_file)
        .with_context(|| {
            format!(
                "Failed to load templates from {}",
                settings.scheduler.templates_file
            )
        })?;
    info!(count = templates.len(), "Templates loaded");

    // Build the calendar context: injected reference date, or today in
    // the configured timezone
    let timezone = settings
        .scheduler
        .timezone()
        .map_err(|reason| anyhow::anyhow!(reason))?;
    let ctx = match settings
        .scheduler
        .reference_date()
        .map_err(|reason| anyhow::anyhow!(reason))?
    {
        Some(date) => {
            info!(date = %date, "Using injected reference date");
            CalendarContext::for_date(date)
        }
        None => CalendarContext::today_in(timezone),
    };
    info!(date = %ctx.date_string, weekday = %ctx.weekday_name, "Calendar context built");

    // Choose the tracker collaborator
    let tracker: Arc<dyn IssueTracker> = if settings.scheduler.dry_run {
        Arc::new(DryRunTracker)
    } else {
        let gitlab =
            GitLabTracker::new(&settings.tracker).context("Failed to build tracker client")?;
        // Fail fast on a bad token before touching any template
        gitlab
            .verify_auth()
            .await
            .context("Tracker authentication failed")?;
        Arc::new(gitlab)
    };

    // Run the batch
    let dispatcher = Dispatcher::new(tracker, settings.scheduler.default_labels.clone());
    let summary = dispatcher.run(&templates, &ctx).await;

    info!(
        evaluated = summary.evaluated,
        fired = summary.fired,
        skipped = summary.skipped,
        failed = summary.failed,
        "Run complete"
    );

    if summary.failed > 0 {
        // Per-template failures were already logged and did not stop
        // the batch; the process itself still completed.
        error!(failed = summary.failed, "Some ticket creations failed");
    }

    Ok(())
}
