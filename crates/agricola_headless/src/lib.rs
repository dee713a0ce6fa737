//! Headless match runner for Agricola agents.
//!
//! Connects the deterministic engine in `agricola_core` to the outside
//! world:
//!
//! - **Agents**: external programs that read observations and answer with
//!   decisions, one JSON document per line
//! - **Game logs**: every externalized decision is appended to a per-game
//!   JSON-lines file
//! - **Replay**: a log's decisions can be fed back through a fresh game to
//!   reproduce it exactly
//!
//! # Protocol
//!
//! - **agent stdin**: one [`Observation`](agricola_core::snapshot::Observation)
//!   per line
//! - **agent stdout**: one [`Decision`](agricola_core::choice::Decision) per line
//! - **runner stderr**: logs (human-readable)
//!
//! See the [`protocol`] module for the record formats.
//!
//! # Example
//!
//! ```bash
//! # Four seats, each driven by its own process
//! cargo run -p agricola_headless -- run --agents ./bot ./bot ./bot ./bot --players 4
//!
//! # Built-in random agents, logs under ./logs
//! cargo run -p agricola_headless -- run --players 2 --seed 7 --logdir logs
//!
//! # Replay a log and check the final state
//! cargo run -p agricola_headless -- replay --log logs/game_state.jsonl
//! ```

pub mod agent;
pub mod game_log;
pub mod protocol;
pub mod random_agent;
pub mod runner;
pub mod scenario;

pub use agent::{Agent, AgentError, ProcessAgent, StreamAgent};
pub use game_log::{GameLog, LogError, ReplaySource};
pub use protocol::{LogRecord, MatchReport};
pub use random_agent::RandomAgent;
pub use runner::{replay, run_match, verify_determinism, RunnerError, Seats};
pub use scenario::{Scenario, ScenarioError};
