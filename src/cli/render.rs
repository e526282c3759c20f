use std::{fmt::Write, sync::Arc};

use ansi_term::{Colour, Style};

use crate::{
    dashboard::snapshot::DashboardSnapshot,
    metrics::history::Sample,
    session::{format::format_hms, timer::TimerState},
};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Chooses between human readable output and one JSON document per line.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub json: bool,
    pub colour: bool,
}

impl Renderer {
    pub fn render(&self, snapshot: &DashboardSnapshot) -> String {
        if self.json {
            serde_json::to_string(snapshot).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
        } else {
            self.render_text(snapshot)
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colour {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn render_text(&self, snapshot: &DashboardSnapshot) -> String {
        let state_style = match snapshot.state {
            TimerState::Running => Colour::Green.bold(),
            TimerState::Paused => Colour::Yellow.bold(),
            TimerState::Stopped => Colour::Red.normal(),
            TimerState::Idle => Style::new().dimmed(),
        };

        let mut out = String::new();
        let project = if snapshot.project.is_empty() {
            "-"
        } else {
            snapshot.project.as_ref()
        };
        let _ = writeln!(
            out,
            "{}\t{}\t{}\ttoday {}",
            self.paint(state_style, &snapshot.state.to_string()),
            self.paint(Colour::Blue.bold(), &snapshot.elapsed),
            project,
            snapshot.daily_total
        );

        let gauges = snapshot
            .gauges
            .iter()
            .map(|v| format!("{} {:.1}", v.name, v.value))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{gauges}");

        for series in &snapshot.series {
            let _ = writeln!(out, "{:<12}{}", series.name, sparkline(&series.samples));
        }

        out.trim_end().to_string()
    }

    pub fn render_projects(&self, projects: &[Arc<str>], snapshot: &DashboardSnapshot) -> String {
        let mut out = String::new();
        let configured = projects.iter().map(|project| {
            let total = snapshot
                .project_totals
                .iter()
                .find(|v| v.project == *project)
                .map(|v| v.seconds)
                .unwrap_or(0);
            (project, total)
        });
        // Sessions started with a name that isn't in the config still have a total.
        let ad_hoc = snapshot
            .project_totals
            .iter()
            .filter(|v| !projects.contains(&v.project))
            .map(|v| (&v.project, v.seconds));
        for (project, total) in configured.chain(ad_hoc) {
            let marker = if *project == snapshot.project { "*" } else { " " };
            let _ = writeln!(out, "{marker} {}\t{}", format_hms(total), project);
        }
        for session in &snapshot.recent_sessions {
            let _ = writeln!(
                out,
                "  {}\t{}\tended {}",
                format_hms(session.seconds),
                session.project,
                session.ended_at.format("%H:%M:%S")
            );
        }
        out.trim_end().to_string()
    }

    pub fn render_error(&self, error: &dyn std::fmt::Display) -> String {
        self.paint(Colour::Red.normal(), &error.to_string())
    }
}

/// Draws samples as a row of block characters scaled between the lowest and highest value.
pub fn sparkline(samples: &[Sample]) -> String {
    let (min, max) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v.value), hi.max(v.value))
    });
    let range = max - min;
    samples
        .iter()
        .map(|v| {
            if range <= f64::EPSILON {
                SPARK_LEVELS[SPARK_LEVELS.len() / 2]
            } else {
                let level = ((v.value - min) / range * (SPARK_LEVELS.len() - 1) as f64).round();
                SPARK_LEVELS[level as usize]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        dashboard::snapshot::{DashboardSnapshot, SeriesSnapshot},
        metrics::{gauges::GaugeReading, history::Sample},
        session::{log::ProjectTotal, timer::TimerState},
    };

    use super::{sparkline, Renderer};

    fn sample(value: f64) -> Sample {
        Sample {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            value,
        }
    }

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            taken_at: Utc.timestamp_opt(0, 0).unwrap(),
            state: TimerState::Running,
            project: "Writing".into(),
            elapsed_seconds: 5,
            elapsed: "00:00:05".into(),
            daily_total_seconds: 65,
            daily_total: "00:01:05".into(),
            gauges: vec![GaugeReading {
                name: "cpu".into(),
                value: 45.31,
            }],
            series: vec![SeriesSnapshot {
                name: "cpu".into(),
                samples: vec![sample(10.), sample(50.), sample(90.)],
            }],
            recent_sessions: vec![],
            project_totals: vec![ProjectTotal {
                project: "Planning".into(),
                seconds: 60,
            }],
        }
    }

    #[test]
    fn sparkline_scales() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[sample(10.), sample(50.), sample(90.)]), "▁▅█");
        assert_eq!(sparkline(&[sample(3.), sample(3.)]), "▅▅");
    }

    #[test]
    fn plain_text() {
        let renderer = Renderer {
            json: false,
            colour: false,
        };
        let text = renderer.render(&snapshot());
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("running\t00:00:05\tWriting\ttoday 00:01:05"));
        assert_eq!(lines.next(), Some("cpu 45.3"));
        assert_eq!(lines.next(), Some(format!("{:<12}▁▅█", "cpu").as_str()));
    }

    #[test]
    fn json_line() {
        let renderer = Renderer {
            json: true,
            colour: false,
        };
        let text = renderer.render(&snapshot());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["state"], "running");
        assert_eq!(value["elapsed"], "00:00:05");
        assert_eq!(value["series"][0]["samples"][2]["value"], 90.);
        assert!(!text.contains('\n'));
    }

    #[test]
    fn projects_list() {
        let renderer = Renderer {
            json: false,
            colour: false,
        };
        let text = renderer.render_projects(&["Planning".into(), "Writing".into()], &snapshot());
        assert_eq!(text, "  00:01:00\tPlanning\n* 00:00:00\tWriting");
    }

    #[test]
    fn projects_list_includes_unconfigured_totals() {
        let renderer = Renderer {
            json: false,
            colour: false,
        };
        let mut snapshot = snapshot();
        snapshot.project_totals.push(ProjectTotal {
            project: "Writing".into(),
            seconds: 5,
        });
        let text = renderer.render_projects(&["Planning".into()], &snapshot);
        assert_eq!(text, "  00:01:00\tPlanning\n* 00:00:05\tWriting");
    }
}
