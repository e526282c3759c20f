//! Simulated system metrics. Values come from a [sampler::Sampler], the charted ones are kept in a
//! [history::MetricsHistory].

pub mod gauges;
pub mod history;
pub mod sampler;
