//! Beatpad - beat-synchronized mining daemon
//!
//! Wires the metronome client, the beat cache and the mining coordinator
//! into a round loop that mines one block per metronome beat.

pub mod cli;
pub mod config;
pub mod daemon;
pub mod errors;
pub mod local_node;
pub mod orchestrator;
pub mod shutdown;
pub mod ui;

pub use cli::Args;
pub use config::Config;
pub use daemon::Daemon;
pub use errors::DaemonError;
pub use local_node::LocalNode;
pub use orchestrator::{Orchestrator, OrchestratorConfig, RoundOutcome};
