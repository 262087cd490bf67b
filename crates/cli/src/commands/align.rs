//! `align` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::AlignArgs;
use crate::pipeline::Pipeline;
use crate::plan::{apply_outputs, build_plan};

/// Execute the `align` command
pub async fn run_align(args: &AlignArgs) -> Result<()> {
    let mut plan = build_plan(&args.plan).context("Failed to build alignment plan")?;
    apply_outputs(&mut plan, args.output_dir.as_deref(), args.report.as_deref())
        .context("Invalid output routing")?;

    info!(
        tracker = %plan.tracker.path.display(),
        devices = plan.devices.len(),
        metric = %plan.search.metric,
        candidates = plan.search.num_candidates,
        parallel = plan.search.parallel,
        "Plan ready"
    );

    let pipeline = Pipeline::new(plan);

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Alignment run failed")?;
            info!(
                devices = stats.devices,
                duration_secs = stats.duration.as_secs_f64(),
                "Alignment run completed"
            );
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, abandoning alignment run");
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM; never resolves if no handler can be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
