use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

use modrelay_core::{Credentials, RunConfig};
use modrelay_sync::{pipeline, RunOptions, RunReport, SyncError};

use crate::error::{io_err, DaemonError};

/// One blocking pipeline invocation, run on tokio's blocking pool.
pub type RunJob = Arc<dyn Fn() -> Result<RunReport, SyncError> + Send + Sync>;

/// Start the scheduler and block the current thread until it exits.
pub fn start_blocking(
    config: RunConfig,
    credentials: Credentials,
    options: RunOptions,
    every: Duration,
) -> Result<(), DaemonError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, credentials, options, every))
}

/// Run the pipeline every `every` until ctrl-c.
pub async fn run(
    config: RunConfig,
    credentials: Credentials,
    options: RunOptions,
    every: Duration,
) -> Result<(), DaemonError> {
    tracing::info!(
        interval_secs = every.as_secs(),
        state_dir = %config.state_dir.display(),
        "scheduler starting"
    );
    let job: RunJob = Arc::new(move || pipeline::run_with_network(&config, &credentials, options));
    let (shutdown_tx, _) = broadcast::channel::<()>(4);

    let scheduler_handle = {
        let shutdown = shutdown_tx.clone();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = run_schedule(every, job, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        let mut shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, stopping after the current run");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Signal(err)),
                    }
                }
            }
        })
    };

    let (scheduler_result, signal_result) = tokio::join!(scheduler_handle, signal_handle);
    handle_join("scheduler", scheduler_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

/// Invoke `job` immediately, then once per `every`, until `shutdown_rx` fires.
///
/// Runs never overlap: the next tick is awaited only after the previous run
/// returns. A shutdown received mid-run takes effect once that run finishes.
/// A run that fails with a [`SyncError`] is logged and the schedule goes on.
pub async fn run_schedule(
    every: Duration,
    job: RunJob,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut runs = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                runs += 1;
                let started = Instant::now();
                let job = job.clone();
                let result = tokio::task::spawn_blocking(move || job())
                    .await
                    .map_err(|err| DaemonError::Join {
                        task: "pipeline",
                        reason: err.to_string(),
                    })?;

                match result {
                    Ok(report) => tracing::info!(
                        run = runs,
                        failures = report.failures(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "scheduled run finished"
                    ),
                    Err(err) => tracing::error!(run = runs, error = %err, "scheduled run aborted"),
                }
            }
        }
    }

    tracing::info!(runs, "scheduler stopped");
    Ok(())
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Join {
            task,
            reason: err.to_string(),
        }),
    }
}

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default `info` filter. Output goes to stderr.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
