//! JSON-lines protocol between the runner and its agents.
//!
//! Each exchange is one line in each direction:
//!
//! **To the agent:** an [`Observation`] of the game from the acting seat
//! **From the agent:** a [`Decision`]
//!
//! # Example Session
//!
//! ```text
//! -> {"game_id":"g1","round":1,"stage":1,"player":0,...,"current_event":"select_action",...}
//! <- {"type":"pick","index":4}
//! -> {"game_id":"g1","round":1,...,"current_event":"plow","free_form":"space",...}
//! <- {"type":"space","space":[0,2]}
//! -> {"game_id":"g1","round":1,...,"current_event":"fence",...}
//! <- {"type":"pastures","pastures":[[[0,3],[0,4]]]}
//! <- {"type":"decline"}
//! ```
//!
//! Agent output that is not a valid decision still counts as an answer: it
//! becomes an invalid choice, and the attempt is rolled back.

use agricola_core::choice::Decision;
use agricola_core::config::GameConfig;
use agricola_core::engine::GameOutcome;
use agricola_core::snapshot::Observation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Runner -> agent
// ============================================================================

/// Serialize an observation to a JSON line (with newline).
pub fn observation_line(observation: &Observation) -> serde_json::Result<String> {
    let mut json = serde_json::to_string(observation)?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// Agent -> runner
// ============================================================================

/// Keep an agent's raw output line as a JSON value.
///
/// Lines that are not JSON at all are kept as a string so the log still
/// shows what the agent said.
#[must_use]
pub fn output_value(line: &str) -> Value {
    let line = line.trim();
    serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string()))
}

/// Read a decision from an agent's output.
///
/// Live play and replay both go through here, so a malformed answer
/// produces the same error text both times.
#[must_use]
pub fn decision_from_value(value: &Value) -> Decision {
    match Decision::deserialize(value) {
        Ok(decision) => decision,
        Err(e) => Decision::Malformed {
            reason: e.to_string(),
        },
    }
}

/// Parse one line of agent output.
#[must_use]
pub fn parse_decision(line: &str) -> Decision {
    decision_from_value(&output_value(line))
}

// ============================================================================
// Log records
// ============================================================================

/// One externalized decision, as appended to the game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// What the agent was shown.
    pub observation: Observation,
    /// What the agent answered.
    pub player_output: Value,
}

impl LogRecord {
    /// The decision this record replays as.
    #[must_use]
    pub fn decision(&self) -> Decision {
        decision_from_value(&self.player_output)
    }
}

/// Summary of a finished (or abandoned) match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Game identifier.
    pub game_id: String,
    /// Configuration the game was set up from.
    pub config: GameConfig,
    /// Scores and winners, or where the game stopped.
    pub outcome: GameOutcome,
    /// Hash of the final state.
    pub state_hash: u64,
    /// Turn attempts played, including rolled back ones.
    pub turns: usize,
    /// Turn attempts that were rolled back.
    pub rollbacks: usize,
    /// Decisions asked of agents.
    pub decisions: usize,
}

impl MatchReport {
    /// Serialize to a pretty JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agricola_core::board::Space;

    #[test]
    fn test_parse_pick() {
        assert_eq!(
            parse_decision(r#"{"type":"pick","index":4}"#),
            Decision::Pick { index: 4 }
        );
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(
            parse_decision("  {\"type\":\"space\",\"space\":[0,2]}\r\n"),
            Decision::Space {
                space: Space::new(0, 2)
            }
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_decision("plow please"),
            Decision::Malformed { .. }
        ));
        assert!(matches!(
            parse_decision(r#"{"type":"pick"}"#),
            Decision::Malformed { .. }
        ));
    }

    #[test]
    fn test_raw_output_is_preserved() {
        assert_eq!(output_value("hello"), Value::String("hello".into()));
        assert_eq!(output_value(r#"{"type":"decline"}"#)["type"], "decline");
    }

    #[test]
    fn test_malformed_reason_is_stable() {
        let live = parse_decision("not json");
        let replayed = decision_from_value(&output_value("not json"));
        assert_eq!(live, replayed);
    }
}
