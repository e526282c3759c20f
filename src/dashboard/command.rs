use std::sync::Arc;

use tokio::sync::oneshot;

use crate::session::timer::TimerError;

use super::snapshot::DashboardSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    /// Starts a session. Without a project the configured default is used.
    Start { project: Option<Arc<str>> },
    Pause,
    Resume,
    Stop,
}

pub type CommandReply = Result<DashboardSnapshot, TimerError>;

#[derive(Debug)]
pub struct CommandRequest {
    pub command: DashboardCommand,
    pub reply: oneshot::Sender<CommandReply>,
}
