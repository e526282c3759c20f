use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    metrics::{
        gauges::{GaugeReading, Gauges},
        history::{MetricsHistory, Sample},
    },
    session::{
        log::{ProjectTotal, SessionLog, SessionRecord},
        timer::{SessionTimer, TimerState},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub name: Arc<str>,
    pub samples: Vec<Sample>,
}

/// Read-only copy of everything the dashboard shows. Published after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub taken_at: DateTime<Utc>,
    pub state: TimerState,
    pub project: Arc<str>,
    pub elapsed_seconds: u64,
    pub elapsed: String,
    pub daily_total_seconds: u64,
    pub daily_total: String,
    pub gauges: Vec<GaugeReading>,
    pub series: Vec<SeriesSnapshot>,
    pub recent_sessions: Vec<SessionRecord>,
    pub project_totals: Vec<ProjectTotal>,
}

impl DashboardSnapshot {
    pub fn capture(
        taken_at: DateTime<Utc>,
        timer: &SessionTimer,
        gauges: &Gauges,
        history: &MetricsHistory,
        log: &SessionLog,
    ) -> Self {
        Self {
            taken_at,
            state: timer.state(),
            project: timer.project().clone(),
            elapsed_seconds: timer.elapsed_seconds(),
            elapsed: timer.format_elapsed(),
            daily_total_seconds: timer.daily_total_seconds(),
            daily_total: timer.format_daily_total(),
            gauges: gauges.readings(),
            series: gauges
                .charted()
                .map(|name| SeriesSnapshot {
                    name: name.clone(),
                    samples: history.values(name),
                })
                .collect(),
            recent_sessions: log.recent(),
            project_totals: log.project_totals(),
        }
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges
            .iter()
            .find(|v| v.name.as_ref() == name)
            .map(|v| v.value)
    }

    pub fn series(&self, name: &str) -> &[Sample] {
        self.series
            .iter()
            .find(|v| v.name.as_ref() == name)
            .map(|v| v.samples.as_slice())
            .unwrap_or_default()
    }
}
