//! Match orchestration: seats, logging, replay and determinism checks.

use std::path::Path;

use agricola_core::cards::CardCatalogue;
use agricola_core::choice::Decision;
use agricola_core::config::GameConfig;
use agricola_core::engine::{DecisionSource, Game, GameOutcome, TurnOutcome};
use agricola_core::error::GameError;
use agricola_core::snapshot::Observation;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::agent::{Agent, AgentError};
use crate::game_log::{read_log, read_report, result_path_for, GameLog, LogError, ReplaySource};
use crate::protocol::{decision_from_value, output_value, LogRecord, MatchReport};
use crate::random_agent::RandomAgent;
use crate::scenario::ScenarioError;

/// Error type for running matches.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The scenario could not be loaded.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The engine failed.
    #[error(transparent)]
    Game(#[from] GameError),
    /// An agent failed.
    #[error(transparent)]
    Agent(#[from] AgentError),
    /// The game log failed.
    #[error(transparent)]
    Log(#[from] LogError),
    /// No agent was given.
    #[error("at least one agent is required")]
    NoAgents,
    /// Agents were given, but not one per seat.
    #[error("{agents} agents for {players} players; give one agent or one per seat")]
    AgentCount {
        /// Agents given.
        agents: usize,
        /// Seats in the game.
        players: usize,
    },
    /// Replay has no configuration to rebuild the game from.
    #[error("no result file next to {0}; pass the scenario the game was played with")]
    MissingConfig(String),
}

// ============================================================================
// Seats
// ============================================================================

/// Routes each externalized choice to the acting seat's agent and logs the
/// exchange.
///
/// With a single agent, every seat shares it.
pub struct Seats {
    agents: Vec<Box<dyn Agent>>,
    log: Option<GameLog>,
    failure: Option<RunnerError>,
    decisions: usize,
}

impl Seats {
    /// Seats driven by `agents`.
    pub fn new(agents: Vec<Box<dyn Agent>>) -> Result<Self, RunnerError> {
        if agents.is_empty() {
            return Err(RunnerError::NoAgents);
        }
        Ok(Self {
            agents,
            log: None,
            failure: None,
            decisions: 0,
        })
    }

    /// One seeded [`RandomAgent`] per seat.
    pub fn random(players: usize, seed: u64) -> Result<Self, RunnerError> {
        let agents = (0..players)
            .map(|seat| Box::new(RandomAgent::new(seed.wrapping_add(seat as u64))) as Box<dyn Agent>)
            .collect();
        Self::new(agents)
    }

    /// Builder: append every exchange to `log`.
    #[must_use]
    pub fn with_log(mut self, log: GameLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Check that the agents fit a table of `players`.
    pub fn check_players(&self, players: usize) -> Result<(), RunnerError> {
        let agents = self.agents.len();
        if agents == 1 || agents == players {
            Ok(())
        } else {
            Err(RunnerError::AgentCount { agents, players })
        }
    }

    /// Decisions asked so far.
    #[must_use]
    pub const fn decisions(&self) -> usize {
        self.decisions
    }

    /// The open log, if any.
    #[must_use]
    pub fn log(&self) -> Option<&GameLog> {
        self.log.as_ref()
    }

    /// The error that made the seats stop answering, if any.
    pub fn take_failure(&mut self) -> Option<RunnerError> {
        self.failure.take()
    }
}

impl std::fmt::Debug for Seats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seats")
            .field("agents", &self.agents.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("log", &self.log.as_ref().map(GameLog::path))
            .field("decisions", &self.decisions)
            .finish_non_exhaustive()
    }
}

impl DecisionSource for Seats {
    fn decide(&mut self, observation: &Observation) -> Option<Decision> {
        if self.failure.is_some() {
            return None;
        }
        let index = observation.player % self.agents.len();
        let agent = &mut self.agents[index];
        let line = match agent.respond(observation) {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!(seat = observation.player, agent = agent.name(), "agent closed its output");
                return None;
            }
            Err(e) => {
                error!(seat = observation.player, agent = agent.name(), error = %e, "agent failed");
                self.failure = Some(e.into());
                return None;
            }
        };
        self.decisions += 1;

        let player_output = output_value(&line);
        let decision = decision_from_value(&player_output);
        if let Decision::Malformed { reason } = &decision {
            warn!(seat = observation.player, %reason, "agent sent a malformed decision");
        }
        if let Some(log) = self.log.as_mut() {
            let record = LogRecord {
                observation: observation.clone(),
                player_output,
            };
            if let Err(e) = log.append(&record) {
                error!(error = %e, "game log write failed");
                self.failure = Some(e.into());
                return None;
            }
        }
        Some(decision)
    }
}

// ============================================================================
// Playing
// ============================================================================

/// Counters from one game loop.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Played {
    outcome: GameOutcome,
    turns: usize,
    rollbacks: usize,
}

fn play(game: &mut Game, source: &mut dyn DecisionSource) -> Result<Played, GameError> {
    let mut turns = 0;
    let mut rollbacks = 0;
    loop {
        match game.play_turn(source)? {
            TurnOutcome::GameOver => {
                return Ok(Played {
                    outcome: game.outcome()?,
                    turns,
                    rollbacks,
                })
            }
            TurnOutcome::Abandoned => {
                return Ok(Played {
                    outcome: GameOutcome::Abandoned {
                        round: game.state().round,
                    },
                    turns,
                    rollbacks,
                })
            }
            TurnOutcome::Committed { player } => {
                turns += 1;
                debug!(player, round = game.state().round, "turn committed");
            }
            TurnOutcome::RolledBack { player, error } => {
                turns += 1;
                rollbacks += 1;
                info!(player, round = game.state().round, %error, "attempt rolled back");
            }
        }
    }
}

/// Play a full match from `config` with `seats`.
///
/// If the seats carry a log, the report is also written next to it.
pub fn run_match(config: &GameConfig, seats: &mut Seats) -> Result<MatchReport, RunnerError> {
    seats.check_players(config.players)?;
    let mut game = Game::new(config, CardCatalogue::standard())?;
    info!(
        game_id = %config.game_id,
        players = config.players,
        seed = config.seed,
        "match started"
    );

    let played = play(&mut game, seats)?;
    if matches!(played.outcome, GameOutcome::Abandoned { .. }) {
        if let Some(failure) = seats.take_failure() {
            return Err(failure);
        }
    }

    let report = MatchReport {
        game_id: config.game_id.clone(),
        config: config.clone(),
        outcome: played.outcome,
        state_hash: game.state().state_hash(),
        turns: played.turns,
        rollbacks: played.rollbacks,
        decisions: seats.decisions(),
    };
    if let Some(log) = seats.log() {
        let path = log.write_report(&report)?;
        info!(path = %path.display(), records = log.records(), "match report written");
    }
    info!(
        game_id = %report.game_id,
        turns = report.turns,
        rollbacks = report.rollbacks,
        hash = report.state_hash,
        "match finished"
    );
    Ok(report)
}

// ============================================================================
// Replay
// ============================================================================

/// What replaying a log produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Records in the log.
    pub records: usize,
    /// Records fed back to the game.
    pub replayed: usize,
    /// Why the replay stopped early.
    pub divergence: Option<String>,
    /// Final state hash of the replayed game.
    pub state_hash: u64,
    /// Final hash recorded with the log, if a result file was found.
    pub expected_hash: Option<u64>,
    /// Outcome of the replayed game.
    pub outcome: GameOutcome,
}

impl ReplayReport {
    /// Whether every record was consumed without divergence and the final
    /// hash matches the recorded one (when there is one).
    #[must_use]
    pub fn is_faithful(&self) -> bool {
        self.divergence.is_none()
            && self.replayed == self.records
            && self.expected_hash.map_or(true, |hash| hash == self.state_hash)
    }
}

/// Replay the log at `log_path`.
///
/// The configuration comes from `config` when given, otherwise from the
/// result file written next to the log.
pub fn replay(log_path: &Path, config: Option<GameConfig>) -> Result<ReplayReport, RunnerError> {
    let recorded = result_path_for(log_path)
        .filter(|path| path.exists())
        .map(|path| read_report(&path))
        .transpose()?;
    let expected_hash = recorded.as_ref().map(|report| report.state_hash);
    let config = match (config, recorded) {
        (Some(config), _) => config,
        (None, Some(report)) => report.config,
        (None, None) => return Err(RunnerError::MissingConfig(log_path.display().to_string())),
    };

    let records = read_log(log_path)?;
    let total = records.len();
    let mut source = ReplaySource::new(records);
    let mut game = Game::new(&config, CardCatalogue::standard())?;
    info!(game_id = %config.game_id, records = total, "replay started");
    let played = play(&mut game, &mut source)?;

    let report = ReplayReport {
        records: total,
        replayed: source.used(),
        divergence: source.divergence().map(String::from),
        state_hash: game.state().state_hash(),
        expected_hash,
        outcome: played.outcome,
    };
    if report.is_faithful() {
        info!(hash = report.state_hash, "replay matches the log");
    } else {
        warn!(
            replayed = report.replayed,
            records = report.records,
            hash = report.state_hash,
            expected = ?report.expected_hash,
            "replay does not match the log"
        );
    }
    Ok(report)
}

// ============================================================================
// Determinism
// ============================================================================

/// Hashes from repeated runs of one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Final state hash per run.
    pub hashes: Vec<u64>,
    /// Turn attempts in the first run.
    pub turns: usize,
}

impl VerifyReport {
    /// Whether all runs ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Play `config` `runs` times with random agents seeded from `agent_seed`
/// and collect the final hashes.
pub fn verify_determinism(
    config: &GameConfig,
    runs: usize,
    agent_seed: u64,
) -> Result<VerifyReport, RunnerError> {
    let mut hashes = Vec::with_capacity(runs);
    let mut turns = 0;
    for run in 0..runs {
        let mut seats = Seats::random(config.players, agent_seed)?;
        let mut game = Game::new(config, CardCatalogue::standard())?;
        let played = play(&mut game, &mut seats)?;
        if run == 0 {
            turns = played.turns;
        }
        let hash = game.state().state_hash();
        debug!(run, turns = played.turns, hash, "verification run finished");
        hashes.push(hash);
    }
    Ok(VerifyReport { hashes, turns })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seats_need_an_agent() {
        assert!(matches!(Seats::new(Vec::new()), Err(RunnerError::NoAgents)));
    }

    #[test]
    fn test_agent_count_must_fit() {
        let seats = Seats::random(3, 0).unwrap();
        assert!(seats.check_players(3).is_ok());
        assert!(matches!(
            seats.check_players(2),
            Err(RunnerError::AgentCount { agents: 3, players: 2 })
        ));
        assert!(Seats::random(1, 0).unwrap().check_players(4).is_ok());
    }

    #[test]
    fn test_random_match_finishes() {
        let config = GameConfig::default().with_seed(3).with_game_id("unit");
        let mut seats = Seats::random(2, 1).unwrap();
        let report = run_match(&config, &mut seats).unwrap();
        assert!(matches!(report.outcome, GameOutcome::Finished { .. }));
        assert!(report.turns >= 28);
        assert_eq!(report.decisions, seats.decisions());
    }

    #[test]
    fn test_verify_is_deterministic() {
        let report = verify_determinism(&GameConfig::default(), 3, 7).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.is_deterministic());
    }
}
