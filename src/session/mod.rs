//! Work session tracking. [timer::SessionTimer] is the state machine, [log::SessionLog] keeps what
//! happened to finished sessions.

pub mod format;
pub mod log;
pub mod timer;
