//! `simulate` 命令：合成负载驱动调度器

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use contracts::{channels, Clock, ContractError, ManualClock, SchedulerConfig, SystemClock};
use observability::TickSample;
use scheduler::{LogHandler, UpdateScheduler};

use super::load_config;
use crate::cli::SimulateArgs;
use crate::error::CliError;
use crate::simulation::{SimulationStats, SyntheticProducer};

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let period = tick_period(args.tick_hz)?;
    if args.virtual_time && args.ticks == 0 {
        return Err(CliError::invalid_argument(
            "ticks",
            "must be > 0 with --virtual-time",
        )
        .into());
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            info!("No configuration file given, using defaults");
            SchedulerConfig::default()
        }
    };

    if args.metrics_port != 0 {
        observability::init_metrics(args.metrics_port)
            .context("Failed to start metrics endpoint")?;
    }

    info!(
        ticks = args.ticks,
        tick_hz = args.tick_hz,
        virtual_time = args.virtual_time,
        fail_channel = ?args.fail_channel,
        "Starting simulation"
    );

    let stats = if args.virtual_time {
        run_virtual(args, config, period)?
    } else {
        run_realtime(args, config, period).await?
    };

    info!(
        ticks = stats.ticks,
        dispatched = stats.scheduler.total_dispatched,
        faulted = stats.scheduler.faulted,
        duration_secs = stats.duration.as_secs_f64(),
        "Simulation finished"
    );
    stats.print_summary();
    Ok(())
}

/// 由 tick 频率换算周期
///
/// The period must be a non-zero `Duration`; tokio intervals reject zero.
fn tick_period(tick_hz: f64) -> Result<Duration, CliError> {
    if !tick_hz.is_finite() || tick_hz <= 0.0 {
        return Err(CliError::invalid_argument(
            "tick-hz",
            format!("must be a positive number, got {tick_hz}"),
        ));
    }
    match Duration::try_from_secs_f64(1.0 / tick_hz) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(CliError::invalid_argument(
            "tick-hz",
            format!("{tick_hz} gives a tick period outside the supported range"),
        )),
    }
}

/// Ticks on a tokio interval until the tick count is reached or Ctrl+C
async fn run_realtime(
    args: &SimulateArgs,
    config: SchedulerConfig,
    period: Duration,
) -> Result<SimulationStats> {
    let mut sim = Simulation::new(args, config, SystemClock)?;
    let started = Instant::now();

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    while args.ticks == 0 || sim.ticks() < args.ticks {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping simulation...");
                break;
            }
            _ = interval.tick() => sim.step(),
        }
    }

    Ok(sim.finish(started.elapsed()))
}

/// Runs every tick back to back on a simulated clock
fn run_virtual(
    args: &SimulateArgs,
    config: SchedulerConfig,
    period: Duration,
) -> Result<SimulationStats> {
    let clock = ManualClock::new();
    let mut sim = Simulation::new(args, config, clock.clone())?;

    for _ in 0..args.ticks {
        sim.step();
        clock.advance(period);
    }

    Ok(sim.finish(clock.elapsed()))
}

/// Scheduler wired to the synthetic producer
struct Simulation {
    scheduler: UpdateScheduler<u64>,
    producer: SyntheticProducer,
    stats: SimulationStats,
}

impl Simulation {
    fn new(
        args: &SimulateArgs,
        config: SchedulerConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, CliError> {
        let mut scheduler: UpdateScheduler<u64> =
            UpdateScheduler::builder(config).clock(clock).build()?;

        for channel in channels::ALL {
            scheduler.register_handler(channel, LogHandler::new(channel))?;
        }

        if let Some(failing) = &args.fail_channel {
            if !channels::ALL.contains(&failing.as_str()) {
                warn!(channel = %failing, "Failing channel is never produced by the workload");
            }
            let name = failing.clone();
            scheduler.register_fn(
                failing.as_str(),
                move |_: &mut UpdateScheduler<u64>, payload: Option<&u64>| {
                    Err(ContractError::handler_fault(
                        name.as_str(),
                        format!("simulated failure (update {payload:?})"),
                    ))
                },
            )?;
        }

        Ok(Self {
            scheduler,
            producer: SyntheticProducer::new(args.seed),
            stats: SimulationStats::default(),
        })
    }

    fn ticks(&self) -> u64 {
        self.stats.ticks
    }

    /// Submit this frame's changes, then run one tick
    fn step(&mut self) {
        for change in self.producer.changes(self.stats.ticks) {
            let submission =
                self.scheduler
                    .request_update(change.channel, Some(change.payload), change.critical);
            self.stats.submissions.record(submission);
        }

        let started = Instant::now();
        let report = self.scheduler.tick();
        let sample = TickSample {
            dispatched: report.dispatched,
            faulted: report.faulted,
            throttled: report.throttled,
            skipped: report.skipped,
            queue_depth: report.remaining,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        };
        self.stats
            .tick_metrics
            .update(&sample, self.scheduler.max_per_invocation());
        self.stats.ticks += 1;
    }

    fn finish(mut self, duration: Duration) -> SimulationStats {
        self.stats.duration = duration;
        self.stats.scheduler = self.scheduler.statistics();
        self.stats
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
