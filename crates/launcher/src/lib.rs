//! Bootstrap binary wiring: CLI surface, hardware probe, and the launch
//! plan for the `xtts_api_server` child process.

pub mod app;
pub mod args;
pub mod hardware;
pub mod launch;
pub mod logging;
