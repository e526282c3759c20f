use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use crate::{
    config::DashboardConfig,
    metrics::{
        gauges::Gauges,
        history::MetricsHistory,
        sampler::{RandomWalkSampler, Sampler},
    },
};

use super::render::sparkline;

#[derive(Debug, Parser)]
pub struct SimulateCommand {
    #[arg(short = 'n', long, default_value_t = 40, help = "Number of sampling rounds")]
    samples: usize,
    #[arg(short, long, help = "History size. Defaults to the configured history_capacity")]
    capacity: Option<usize>,
    #[arg(long, help = "Seed for the random walk. Same seed gives the same series")]
    seed: Option<u64>,
}

/// Runs the sampler without waiting for real time and returns the charted history.
pub fn simulate(
    config: &DashboardConfig,
    sampler: &mut dyn Sampler,
    rounds: usize,
    capacity: usize,
    start: DateTime<Utc>,
) -> Result<(Gauges, MetricsHistory)> {
    let mut history = MetricsHistory::new_opt(capacity)
        .ok_or_else(|| anyhow!("History capacity must be at least 1"))?;
    let mut gauges = Gauges::new(config.metrics.clone());
    let interval = i64::try_from(config.sample_interval_ms)
        .ok()
        .and_then(chrono::Duration::try_milliseconds)
        .ok_or_else(|| anyhow!("Sample interval {}ms is too long", config.sample_interval_ms))?;
    let mut timestamp = start;
    for round in 0..rounds {
        timestamp = timestamp.checked_add_signed(interval).ok_or_else(|| {
            anyhow!("Simulated time runs out of range after {round} of {rounds} rounds")
        })?;
        gauges.advance(sampler, &mut history, timestamp);
    }
    Ok((gauges, history))
}

pub fn process_simulate_command(
    SimulateCommand {
        samples,
        capacity,
        seed,
    }: SimulateCommand,
    config: &DashboardConfig,
) -> Result<()> {
    let mut sampler = match seed {
        Some(seed) => RandomWalkSampler::seeded(seed),
        None => RandomWalkSampler::from_entropy(),
    };
    let capacity = capacity.unwrap_or(config.history_capacity);
    let (_, history) = simulate(config, &mut sampler, samples, capacity, Utc::now())?;
    println!("{}", render_history(&history));
    Ok(())
}

/// One row per charted series: sparkline, latest value, then every kept value.
fn render_history(history: &MetricsHistory) -> String {
    history
        .series_names()
        .into_iter()
        .filter_map(|name| {
            let latest = history.latest(&name)?;
            let values = history.values(&name);
            Some(format!(
                "{:<12}{}\t{:.1}\t{}",
                name,
                sparkline(&values),
                latest.value,
                values
                    .iter()
                    .map(|v| format!("{:.1}", v.value))
                    .collect::<Vec<_>>()
                    .join(" ")
            ))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
