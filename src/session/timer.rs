use std::{fmt::Display, sync::Arc};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::format::format_hms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerState::Idle => write!(f, "idle"),
            TimerState::Running => write!(f, "running"),
            TimerState::Paused => write!(f, "paused"),
            TimerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Commands that change [TimerState]. Used for reporting rejected transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Stop,
}

impl Display for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerCommand::Start => write!(f, "start"),
            TimerCommand::Pause => write!(f, "pause"),
            TimerCommand::Resume => write!(f, "resume"),
            TimerCommand::Stop => write!(f, "stop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("can't {command} a session that is {state}")]
    InvalidTransition {
        command: TimerCommand,
        state: TimerState,
    },
}

/// Result of a stopped session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    pub project: Arc<str>,
    pub seconds: u64,
}

/// Work-session state machine. It has no notion of real time: whoever owns it is expected to call
/// [SessionTimer::tick] once per second while a session is running.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    state: TimerState,
    elapsed_seconds: u64,
    daily_total_seconds: u64,
    project: Arc<str>,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_seconds: 0,
            daily_total_seconds: 0,
            project: "".into(),
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn daily_total_seconds(&self) -> u64 {
        self.daily_total_seconds
    }

    pub fn project(&self) -> &Arc<str> {
        &self.project
    }

    pub fn start(&mut self, project: impl Into<Arc<str>>) -> Result<(), TimerError> {
        self.require(TimerCommand::Start, &[TimerState::Idle, TimerState::Stopped])?;
        self.project = project.into();
        self.state = TimerState::Running;
        info!("Started session for {}", self.project);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        self.require(TimerCommand::Pause, &[TimerState::Running])?;
        self.state = TimerState::Paused;
        info!("Paused session at {}", self.format_elapsed());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        self.require(TimerCommand::Resume, &[TimerState::Paused])?;
        self.state = TimerState::Running;
        info!("Resumed session at {}", self.format_elapsed());
        Ok(())
    }

    /// Ends the current session. The daily total already contains every second of it, since
    /// [SessionTimer::tick] accrues both counters, so here only the elapsed counter is reset.
    pub fn stop(&mut self) -> Result<FinishedSession, TimerError> {
        self.require(TimerCommand::Stop, &[TimerState::Running, TimerState::Paused])?;
        let finished = FinishedSession {
            project: self.project.clone(),
            seconds: self.elapsed_seconds,
        };
        self.state = TimerState::Stopped;
        self.elapsed_seconds = 0;
        info!(
            "Stopped session for {} after {}",
            finished.project,
            format_hms(finished.seconds)
        );
        Ok(finished)
    }

    /// Counts one second if the session is running. Returns whether the tick was counted.
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.elapsed_seconds += 1;
        self.daily_total_seconds += 1;
        true
    }

    /// Clears the daily total when a new day begins. The current session keeps running and its
    /// next ticks count towards the new day.
    pub fn start_new_day(&mut self) {
        debug!(
            "New day, dropping daily total of {}",
            format_hms(self.daily_total_seconds)
        );
        self.daily_total_seconds = 0;
    }

    pub fn format_elapsed(&self) -> String {
        format_hms(self.elapsed_seconds)
    }

    pub fn format_daily_total(&self) -> String {
        format_hms(self.daily_total_seconds)
    }

    fn require(&self, command: TimerCommand, allowed: &[TimerState]) -> Result<(), TimerError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            let error = TimerError::InvalidTransition {
                command,
                state: self.state,
            };
            warn!("{error}");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::{SessionTimer, TimerCommand, TimerError, TimerState};

    fn tick_n(timer: &mut SessionTimer, n: usize) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn five_ticks_format() {
        let mut timer = SessionTimer::new();
        timer.start("Writing").unwrap();
        tick_n(&mut timer, 5);
        assert_eq!(timer.format_elapsed(), "00:00:05");
        assert_eq!(timer.project().as_ref(), "Writing");
    }

    #[test]
    fn pause_while_idle_is_rejected() {
        let mut timer = SessionTimer::new();
        assert_eq!(
            timer.pause(),
            Err(TimerError::InvalidTransition {
                command: TimerCommand::Pause,
                state: TimerState::Idle
            })
        );
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn double_pause() {
        let mut timer = SessionTimer::new();
        timer.start("Planning").unwrap();
        tick_n(&mut timer, 2);
        timer.pause().unwrap();
        assert_eq!(timer.state(), TimerState::Paused);
        assert!(matches!(
            timer.pause(),
            Err(TimerError::InvalidTransition {
                command: TimerCommand::Pause,
                state: TimerState::Paused
            })
        ));
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.elapsed_seconds(), 2);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut timer = SessionTimer::new();
        timer.start("a").unwrap();
        assert!(timer.start("b").is_err());
        timer.pause().unwrap();
        assert!(timer.start("b").is_err());
        assert_eq!(timer.project().as_ref(), "a");
    }

    #[test]
    fn resume_and_stop_require_a_session() {
        let mut timer = SessionTimer::new();
        assert!(timer.resume().is_err());
        assert!(timer.stop().is_err());
        timer.start("a").unwrap();
        assert!(timer.resume().is_err());
        timer.stop().unwrap();
        assert!(timer.stop().is_err());
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn paused_session_ignores_ticks() {
        let mut timer = SessionTimer::new();
        timer.start("Code Review").unwrap();
        tick_n(&mut timer, 3);
        timer.pause().unwrap();
        tick_n(&mut timer, 10);
        assert_eq!(timer.elapsed_seconds(), 3);
        timer.resume().unwrap();
        tick_n(&mut timer, 4);
        assert_eq!(timer.elapsed_seconds(), 7);
    }

    #[test]
    fn ticks_outside_of_session_are_ignored() {
        let mut timer = SessionTimer::new();
        assert!(!timer.tick());
        timer.start("a").unwrap();
        assert!(timer.tick());
        timer.stop().unwrap();
        assert!(!timer.tick());
        assert_eq!(timer.elapsed_seconds(), 0);
        assert_eq!(timer.daily_total_seconds(), 1);
    }

    #[test]
    fn stop_reports_running_ticks_and_resets() {
        let mut timer = SessionTimer::new();
        timer.start("Documentation").unwrap();
        tick_n(&mut timer, 4);
        timer.pause().unwrap();
        tick_n(&mut timer, 4);
        timer.resume().unwrap();
        tick_n(&mut timer, 6);

        let finished = timer.stop().unwrap();
        assert_eq!(finished.seconds, 10);
        assert_eq!(finished.project.as_ref(), "Documentation");
        assert_eq!(timer.elapsed_seconds(), 0);
        assert_eq!(timer.daily_total_seconds(), 10);

        timer.start("Planning").unwrap();
        assert_eq!(timer.elapsed_seconds(), 0);
    }

    #[test]
    fn daily_total_never_decreases_across_sessions() {
        let mut timer = SessionTimer::new();
        let mut last_total = 0;
        for (i, ticks) in [3, 0, 7, 1].into_iter().enumerate() {
            timer.start(format!("project {i}")).unwrap();
            for _ in 0..ticks {
                timer.tick();
                assert!(timer.daily_total_seconds() >= last_total);
                last_total = timer.daily_total_seconds();
            }
            timer.pause().unwrap();
            timer.stop().unwrap();
            assert!(timer.daily_total_seconds() >= last_total);
            last_total = timer.daily_total_seconds();
        }
        assert_eq!(timer.daily_total_seconds(), 11);
    }

    #[test]
    fn new_day_keeps_running_session() {
        let mut timer = SessionTimer::new();
        timer.start("a").unwrap();
        tick_n(&mut timer, 5);
        timer.start_new_day();
        tick_n(&mut timer, 2);
        assert_eq!(timer.elapsed_seconds(), 7);
        assert_eq!(timer.daily_total_seconds(), 2);
        assert_eq!(timer.format_daily_total(), "00:00:02");
    }

    #[test]
    fn random_command_sequences() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut timer = SessionTimer::new();
            let mut running_ticks = 0;
            for step in 0..300 {
                let before = timer.clone();
                let result = match rng.gen_range(0..8) {
                    0 => timer.start(format!("project {step}")).map(|_| None),
                    1 => timer.pause().map(|_| None),
                    2 => timer.resume().map(|_| None),
                    3 => timer.stop().map(Some),
                    _ => {
                        if timer.tick() {
                            running_ticks += 1;
                        }
                        Ok(None)
                    }
                };

                match result {
                    Ok(Some(finished)) => {
                        assert_eq!(finished.seconds, running_ticks, "seed {seed} step {step}");
                        assert_eq!(timer.elapsed_seconds(), 0);
                        running_ticks = 0;
                    }
                    Ok(None) => assert_eq!(timer.elapsed_seconds(), running_ticks),
                    Err(TimerError::InvalidTransition { state, .. }) => {
                        assert_eq!(state, before.state());
                        assert_eq!(timer.state(), before.state());
                        assert_eq!(timer.elapsed_seconds(), before.elapsed_seconds());
                        assert_eq!(timer.daily_total_seconds(), before.daily_total_seconds());
                        assert_eq!(timer.project(), before.project());
                    }
                }
                assert!(
                    timer.daily_total_seconds() >= before.daily_total_seconds(),
                    "seed {seed} step {step}"
                );
            }
        }
    }
}
