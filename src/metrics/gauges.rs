use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    history::MetricsHistory,
    sampler::{MetricSpec, Sampler},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeReading {
    pub name: Arc<str>,
    pub value: f64,
}

/// Holds the current value of every configured metric and advances them all at once.
pub struct Gauges {
    metrics: Vec<(MetricSpec, f64)>,
}

impl Gauges {
    pub fn new(specs: Vec<MetricSpec>) -> Self {
        Self {
            metrics: specs
                .into_iter()
                .map(|spec| {
                    let initial = spec.clamp(spec.initial);
                    (spec, initial)
                })
                .collect(),
        }
    }

    /// Moves every metric to its next value and records the charted ones. History receives the
    /// value produced by this round, so a chart always ends at the value currently shown.
    pub fn advance(
        &mut self,
        sampler: &mut dyn Sampler,
        history: &mut MetricsHistory,
        timestamp: DateTime<Utc>,
    ) {
        for (spec, value) in self.metrics.iter_mut() {
            *value = spec.clamp(sampler.next_value(spec, *value));
            if spec.charted {
                history.sample(&spec.name, *value, timestamp);
            }
        }
    }

    pub fn readings(&self) -> Vec<GaugeReading> {
        self.metrics
            .iter()
            .map(|(spec, value)| GaugeReading {
                name: spec.name.clone(),
                value: *value,
            })
            .collect()
    }

    pub fn charted(&self) -> impl Iterator<Item = &Arc<str>> {
        self.metrics
            .iter()
            .filter(|(spec, _)| spec.charted)
            .map(|(spec, _)| &spec.name)
    }
}
