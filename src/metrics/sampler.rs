use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Describes a simulated metric: where it starts, how much it can move per sample and the range it
/// has to stay in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: Arc<str>,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub step: f64,
    pub initial: f64,
    /// Whether the metric keeps a history for charts. Metrics without one are only shown as
    /// their latest value.
    #[serde(default = "default_charted")]
    pub charted: bool,
}

fn default_charted() -> bool {
    true
}

impl MetricSpec {
    pub fn new(name: &str, min: f64, max: f64, step: f64, initial: f64, charted: bool) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            step,
            initial,
            charted,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// The metrics shown on the dashboard when nothing else is configured.
pub fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("cpu", 10., 90., 10., 45., true),
        MetricSpec::new("memory", 20., 95., 5., 62., true),
        MetricSpec::new("network", 0., 100., 10., 45.2, true),
        MetricSpec::new("network_up", 0., 100., 5., 12.5, false),
        MetricSpec::new("temperature", 45., 85., 3., 68., false),
        MetricSpec::new("disk", 0., 100., 0., 78., false),
    ]
}

/// Produces the next value of a metric from the previous one. Implementations must keep the result
/// inside `[spec.min, spec.max]`.
#[cfg_attr(test, mockall::automock)]
pub trait Sampler: Send + 'static {
    fn next_value(&mut self, spec: &MetricSpec, previous: f64) -> f64;
}

/// Bounded random walk. Every sample moves the value by at most half a step in either direction.
pub struct RandomWalkSampler<R: Rng + Send + 'static = StdRng> {
    rng: R,
}

impl RandomWalkSampler<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send + 'static> RandomWalkSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + 'static> Sampler for RandomWalkSampler<R> {
    fn next_value(&mut self, spec: &MetricSpec, previous: f64) -> f64 {
        let jitter = (self.rng.gen::<f64>() - 0.5) * spec.step;
        spec.clamp(previous + jitter)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::mock::StepRng, SeedableRng};

    use super::{default_metrics, MetricSpec, RandomWalkSampler, Sampler};

    #[test]
    fn stays_in_bounds() {
        let mut sampler = RandomWalkSampler::seeded(7);
        for spec in default_metrics() {
            let mut value = spec.initial;
            for _ in 0..1000 {
                let next = sampler.next_value(&spec, value);
                assert!(next >= spec.min && next <= spec.max, "{} = {next}", spec.name);
                assert!((next - value).abs() <= spec.step / 2. + 1e-9);
                value = next;
            }
        }
    }

    #[test]
    fn clamps_out_of_range_previous() {
        let spec = MetricSpec::new("cpu", 10., 90., 10., 45., true);
        let mut sampler = RandomWalkSampler::seeded(1);
        assert_eq!(sampler.next_value(&spec, 500.), 90.);
        assert_eq!(sampler.next_value(&spec, -500.), 10.);
    }

    #[test]
    fn zero_step_is_constant() {
        let spec = MetricSpec::new("disk", 0., 100., 0., 78., false);
        let mut sampler = RandomWalkSampler::new(rand::rngs::StdRng::seed_from_u64(3));
        assert_eq!(sampler.next_value(&spec, 78.), 78.);
    }

    #[test]
    fn lowest_draw_moves_down_half_a_step() {
        // StepRng with 0 always produces 0, which is the smallest possible draw.
        let mut sampler = RandomWalkSampler::new(StepRng::new(0, 0));
        let spec = MetricSpec::new("memory", 20., 95., 5., 62., true);
        assert_eq!(sampler.next_value(&spec, 62.), 59.5);
    }

    #[test]
    fn same_seed_same_walk() {
        let spec = MetricSpec::new("network", 0., 100., 10., 45.2, true);
        let mut a = RandomWalkSampler::seeded(42);
        let mut b = RandomWalkSampler::seeded(42);
        let (mut va, mut vb) = (spec.initial, spec.initial);
        for _ in 0..50 {
            va = a.next_value(&spec, va);
            vb = b.next_value(&spec, vb);
        }
        assert_eq!(va, vb);
    }
}
