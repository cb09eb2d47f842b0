use std::path::Path;

use anyhow::{bail, Context};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drawbridge_client::HttpBackend;
use drawbridge_core::color::aci_to_rgb;
use drawbridge_core::job::{ConvertMode, JobKind, JobRecord, JobStatus, JobStore};
use drawbridge_core::semantic::{build_entries, Selection};
use drawbridge_core::table::distinct_handle_count;
use drawbridge_pipeline::{channel, BatchRunner, JobEvent};

mod config;

use config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drawbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ClientConfig::from_env();
    tracing::info!(backend_url = %config.backend_url, "Loaded client configuration");

    // --- Job list ---
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: drawbridge <file.dwg|file.dxf>...");
    }

    let mut store = JobStore::new();
    for path in &paths {
        let job = job_for_path(path)?;
        let id = store.add(job);
        tracing::info!(job_id = id, path, "Queued job");
    }

    // --- Backend + events ---
    let backend = HttpBackend::new(config.backend_url.clone());
    let (events, rx) = channel();
    let listener = tokio::spawn(log_events(rx));

    let runner = BatchRunner::new(&backend, events)
        .with_poll_config(config.poll_config())
        .with_retry_config(config.retry_config());

    // Ctrl-C cancels the batch; running jobs fail, queued jobs stay put.
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling batch");
            cancel.cancel();
        }
    });

    let outcomes = runner.run(&mut store).await;
    // Dropping the runner drops the last event sender, which lets the
    // listener drain and exit on channel close.
    drop(runner);
    let _ = listener.await;

    // --- Summaries ---
    for outcome in &outcomes {
        if let Some(job) = store.get(outcome.job) {
            print_summary(outcome.job, job);
        }
    }

    let entries = build_entries(&store);
    if !entries.is_empty() {
        println!("\nSemantic entries ({}):", entries.len());
        let mut selection = Selection::default();
        selection.clamp(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let marker = if i == selection.index() { ">" } else { " " };
            let bbox = entry
                .bounding_box
                .map(|b| format!("[{:.1}, {:.1}] - [{:.1}, {:.1}]", b.xmin, b.ymin, b.xmax, b.ymax))
                .unwrap_or_else(|| "no bbox".to_string());
            println!(
                "{marker} border {} (job {}): {bbox}",
                entry.border_index, entry.source_job
            );
        }
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        bail!("{failed} of {} jobs failed", outcomes.len());
    }
    Ok(())
}

/// Classify a file path into a job: `.dwg` is converted to DXF, `.dxf`
/// goes through the analysis pipeline.
fn job_for_path(path: &str) -> anyhow::Result<JobRecord> {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file path: {path}"))?
        .to_string();
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let bytes = std::fs::read(path).with_context(|| format!("could not read {path}"))?;

    match extension.as_deref() {
        Some("dwg") => Ok(JobRecord::new(
            name,
            bytes,
            JobKind::Convert,
            Some(ConvertMode::DwgToDxf),
        )),
        Some("dxf") => Ok(JobRecord::new(name, bytes, JobKind::Analyze, None)),
        _ => bail!("unsupported file type: {path} (expected .dwg or .dxf)"),
    }
}

/// Mirror every broadcast job event into the log.
async fn log_events(mut rx: broadcast::Receiver<JobEvent>) {
    loop {
        match rx.recv().await {
            Ok(JobEvent::Progress {
                job,
                status,
                progress,
                label,
            }) => {
                tracing::info!(job_id = job, status = %status, progress, label, "Job progress");
            }
            Ok(JobEvent::Completed { job }) => {
                tracing::info!(job_id = job, "Job completed");
            }
            Ok(JobEvent::Failed { job, error }) => {
                tracing::error!(job_id = job, error, "Job failed");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_summary(id: drawbridge_core::job::JobId, job: &JobRecord) {
    println!("\n== job {id}: {} ({})", job.file_name, job.status());
    if job.status() == JobStatus::Failed {
        println!("   error: {}", job.log);
        return;
    }

    if let Some(path) = &job.artifact_path {
        println!("   artifact: {path}");
    }

    if let Some(table) = job.entity_table.get() {
        println!(
            "   entities: {} rows, {} distinct handles",
            table.rows.len(),
            distinct_handle_count(table)
        );
    }

    if let Some(geometry) = job.parsed_geometry.get() {
        println!("   layers ({}):", geometry.layers.len());
        for layer in &geometry.layers {
            let rgb = aci_to_rgb(layer.color);
            println!("     {} {}", rgb.hex(), layer.name);
        }
    }

    if let Some(summary) = job.semantic_summary.get() {
        println!(
            "   semantic: {} borders, {} columns, {} walls, {} rooms, {} doors",
            summary.border_count,
            summary.column_count,
            summary.wall_count,
            summary.room_count,
            summary.door_count,
        );
    }
}
