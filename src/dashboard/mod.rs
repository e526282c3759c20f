//! The dashboard owns the session timer and the metrics and drives both from a single event loop.
//! Front-ends talk to it through a [DashboardHandle]: commands go in over a channel, snapshots come
//! out through a watch channel. Dropping the handle stops the loop.

pub mod command;
pub mod shutdown;
pub mod snapshot;

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use command::{CommandReply, CommandRequest, DashboardCommand};
use snapshot::DashboardSnapshot;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::Instant,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use crate::{
    config::{ConfigError, DashboardConfig},
    metrics::{gauges::Gauges, history::MetricsHistory, sampler::Sampler},
    session::{
        log::SessionLog,
        timer::{SessionTimer, TimerState},
    },
    utils::{clock::Clock, time::next_day_start},
};

const COMMAND_BUFFER: usize = 16;

enum Event {
    Shutdown,
    Command(Option<CommandRequest>),
    Tick,
    Sample,
}

/// State and scheduling of the dashboard. Only reachable through [Dashboard::spawn].
pub struct Dashboard {
    timer: SessionTimer,
    history: MetricsHistory,
    gauges: Gauges,
    log: SessionLog,
    sampler: Box<dyn Sampler>,
    clock: Box<dyn Clock>,
    default_project: Arc<str>,
    tick_interval: Duration,
    sample_interval: Duration,
    next_tick: Instant,
    next_sample: Instant,
    next_day: Option<DateTime<Utc>>,
    commands: mpsc::Receiver<CommandRequest>,
    snapshots: watch::Sender<DashboardSnapshot>,
    shutdown: CancellationToken,
}

impl Dashboard {
    /// Starts the event loop on the current runtime.
    pub fn spawn(
        config: &DashboardConfig,
        sampler: impl Sampler,
        clock: impl Clock,
    ) -> Result<DashboardHandle, ConfigError> {
        config.validate()?;
        let history = MetricsHistory::new_opt(config.history_capacity).ok_or_else(|| {
            ConfigError::Invalid("history_capacity must be at least 1".into())
        })?;

        let timer = SessionTimer::new();
        let gauges = Gauges::new(config.metrics.clone());
        let log = SessionLog::new(config.recent_sessions);
        let now = clock.time();
        let initial = DashboardSnapshot::capture(now, &timer, &gauges, &history, &log);

        let (command_sender, commands) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots, snapshot_receiver) = watch::channel(initial);
        let shutdown = CancellationToken::new();
        let start = clock.instant();

        let dashboard = Dashboard {
            timer,
            history,
            gauges,
            log,
            sampler: Box::new(sampler),
            default_project: config.default_project.clone(),
            tick_interval: config.tick_interval(),
            sample_interval: config.sample_interval(),
            next_tick: start + config.tick_interval(),
            next_sample: start + config.sample_interval(),
            next_day: next_day_start(now),
            clock: Box::new(clock),
            commands,
            snapshots,
            shutdown: shutdown.clone(),
        };

        let task = tokio::spawn(dashboard.run().instrument(info_span!("dashboard")));

        Ok(DashboardHandle {
            commands: command_sender,
            snapshots: snapshot_receiver,
            shutdown: shutdown.clone(),
            task,
            _guard: shutdown.drop_guard(),
        })
    }

    async fn run(mut self) -> Result<()> {
        info!("Dashboard started");
        loop {
            // Every branch only borrows, the event is applied once the select is over.
            let event = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => Event::Shutdown,
                request = self.commands.recv() => Event::Command(request),
                _ = self.clock.sleep_until(self.next_tick) => Event::Tick,
                _ = self.clock.sleep_until(self.next_sample) => Event::Sample,
            };

            match event {
                Event::Shutdown => break,
                Event::Command(None) => {
                    debug!("All handles are gone");
                    break;
                }
                Event::Command(Some(request)) => self.handle_request(request),
                Event::Tick => {
                    self.next_tick += self.tick_interval;
                    self.on_tick();
                }
                Event::Sample => {
                    self.next_sample += self.sample_interval;
                    self.on_sample();
                }
            }
        }
        self.commands.close();
        info!("Dashboard stopped");
        Ok(())
    }

    fn handle_request(&mut self, CommandRequest { command, reply }: CommandRequest) {
        debug!("Received command {:?}", command);
        let result = self.apply(command);
        if reply.send(result).is_err() {
            warn!("Command sender left before receiving a reply");
        }
    }

    fn apply(&mut self, command: DashboardCommand) -> CommandReply {
        let was_running = self.timer.state() == TimerState::Running;
        match command {
            DashboardCommand::Start { project } => self
                .timer
                .start(project.unwrap_or_else(|| self.default_project.clone()))?,
            DashboardCommand::Pause => self.timer.pause()?,
            DashboardCommand::Resume => self.timer.resume()?,
            DashboardCommand::Stop => {
                let finished = self.timer.stop()?;
                self.log.record(finished, self.clock.time());
            }
        }
        // A session counts whole seconds from the moment it (re)starts.
        if !was_running && self.timer.state() == TimerState::Running {
            self.next_tick = self.clock.instant() + self.tick_interval;
        }
        Ok(self.publish())
    }

    fn on_tick(&mut self) {
        let now = self.clock.time();
        let new_day = matches!(self.next_day, Some(next_day) if now >= next_day);
        if new_day {
            info!("Day changed at {now}");
            self.timer.start_new_day();
            self.next_day = next_day_start(now);
        }
        if self.timer.tick() || new_day {
            trace!("Tick {}", self.timer.format_elapsed());
            self.publish();
        }
    }

    fn on_sample(&mut self) {
        let now = self.clock.time();
        self.gauges
            .advance(self.sampler.as_mut(), &mut self.history, now);
        self.publish();
    }

    fn publish(&self) -> DashboardSnapshot {
        let snapshot = DashboardSnapshot::capture(
            self.clock.time(),
            &self.timer,
            &self.gauges,
            &self.history,
            &self.log,
        );
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

/// Front-end side of a running [Dashboard]. Dropping it cancels the event loop.
pub struct DashboardHandle {
    commands: mpsc::Sender<CommandRequest>,
    snapshots: watch::Receiver<DashboardSnapshot>,
    shutdown: CancellationToken,
    task: JoinHandle<Result<()>>,
    _guard: DropGuard,
}

impl DashboardHandle {
    /// Sends a command and waits for the dashboard to apply it. The outer error means the
    /// dashboard is gone, the inner one that the timer rejected the command.
    pub async fn send(&self, command: DashboardCommand) -> Result<CommandReply> {
        let (reply, receiver) = oneshot::channel();
        self.commands
            .send(CommandRequest { command, reply })
            .await
            .map_err(|_| anyhow!("dashboard is not running"))?;
        receiver
            .await
            .map_err(|_| anyhow!("dashboard stopped before replying"))
    }

    pub async fn start(&self, project: Option<Arc<str>>) -> Result<CommandReply> {
        self.send(DashboardCommand::Start { project }).await
    }

    pub async fn pause(&self) -> Result<CommandReply> {
        self.send(DashboardCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<CommandReply> {
        self.send(DashboardCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<CommandReply> {
        self.send(DashboardCommand::Stop).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stops the event loop and waits for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown.cancel();
        self.task
            .await?
            .inspect_err(|e| error!("Dashboard finished with an error {e:?}"))
    }
}
