//! Work session timer and simulated system metrics for a personal dashboard.
//! The core is [session::timer::SessionTimer] and [metrics::history::MetricsHistory], both plain
//! synchronous types. [dashboard::Dashboard] drives them from a single event loop and the `cli`
//! module is a small terminal front-end on top of it.

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod metrics;
pub mod session;
pub mod utils;
