use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::timer::FinishedSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub project: Arc<str>,
    pub seconds: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    pub project: Arc<str>,
    pub seconds: u64,
}

/// Keeps the last few finished sessions plus the time spent on each project since the log was
/// created. Lives only as long as the dashboard does.
#[derive(Debug)]
pub struct SessionLog {
    recent: VecDeque<SessionRecord>,
    max_recent: usize,
    totals: HashMap<Arc<str>, u64>,
}

impl SessionLog {
    pub fn new(max_recent: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(max_recent),
            max_recent,
            totals: HashMap::new(),
        }
    }

    pub fn record(&mut self, session: FinishedSession, ended_at: DateTime<Utc>) {
        *self.totals.entry(session.project.clone()).or_default() += session.seconds;

        if self.max_recent == 0 {
            return;
        }
        while self.recent.len() >= self.max_recent {
            self.recent.pop_front();
        }
        self.recent.push_back(SessionRecord {
            project: session.project,
            seconds: session.seconds,
            ended_at,
        });
    }

    /// Finished sessions, oldest first.
    pub fn recent(&self) -> Vec<SessionRecord> {
        self.recent.iter().cloned().collect()
    }

    /// Per project totals, largest first.
    pub fn project_totals(&self) -> Vec<ProjectTotal> {
        let mut totals = self
            .totals
            .iter()
            .map(|(project, seconds)| ProjectTotal {
                project: project.clone(),
                seconds: *seconds,
            })
            .collect::<Vec<_>>();
        totals.sort_by(|a, b| b.seconds.cmp(&a.seconds).then(a.project.cmp(&b.project)));
        totals
    }
}
