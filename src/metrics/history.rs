use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Bounded buffer of recent samples, one per series. It doesn't know what the series mean, it only
/// keeps the last `capacity` values of each in arrival order.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    capacity: usize,
    series: HashMap<Arc<str>, VecDeque<Sample>>,
}

impl MetricsHistory {
    /// Returns None for a capacity of 0.
    pub fn new_opt(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            None
        } else {
            Some(Self {
                capacity,
                series: HashMap::new(),
            })
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sample(&mut self, series: &str, value: f64, timestamp: DateTime<Utc>) {
        let capacity = self.capacity;
        let samples = self
            .series
            .entry(series.into())
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        samples.push_back(Sample { timestamp, value });
        while samples.len() > capacity {
            samples.pop_front();
        }
        trace!("Sampled {series} = {value}");
    }

    /// Samples of a series, oldest first. Unknown series are empty.
    pub fn values(&self, series: &str) -> Vec<Sample> {
        self.series
            .get(series)
            .map(|samples| samples.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, series: &str) -> Option<Sample> {
        self.series.get(series).and_then(|v| v.back().copied())
    }

    pub fn series_names(&self) -> Vec<Arc<str>> {
        let mut names = self.series.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}
