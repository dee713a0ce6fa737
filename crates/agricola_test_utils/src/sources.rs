//! Decision sources for tests.

use std::collections::VecDeque;

use agricola_core::choice::Decision;
use agricola_core::engine::DecisionSource;
use agricola_core::snapshot::Observation;

/// Pick the first candidate whose label starts with `prefix`.
#[must_use]
pub fn pick_labelled(observation: &Observation, prefix: &str) -> Option<Decision> {
    observation
        .choice_candidates
        .iter()
        .find(|candidate| candidate.label.starts_with(prefix))
        .map(|candidate| Decision::Pick {
            index: candidate.index,
        })
}

/// Replays a fixed queue of decisions and records every observation it was
/// shown. Gives up when the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    decisions: VecDeque<Decision>,
    observations: Vec<Observation>,
}

impl ScriptedSource {
    /// Source answering with `decisions` in order.
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            observations: Vec::new(),
        }
    }

    /// Queue another decision.
    pub fn push(&mut self, decision: Decision) {
        self.decisions.push_back(decision);
    }

    /// Observations seen so far, oldest first.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of times the source was asked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.observations.len()
    }

    /// Decisions not yet used.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.decisions.len()
    }
}

impl DecisionSource for ScriptedSource {
    fn decide(&mut self, observation: &Observation) -> Option<Decision> {
        self.observations.push(observation.clone());
        self.decisions.pop_front()
    }
}

/// Never gives up: answers the n-th question with candidate `n * stride`
/// modulo the number of candidates. Declines when nothing is listed.
#[derive(Debug, Clone)]
pub struct CyclingSource {
    asked: usize,
    stride: usize,
}

impl CyclingSource {
    /// Source stepping through candidates `stride` at a time.
    #[must_use]
    pub fn new(stride: usize) -> Self {
        Self { asked: 0, stride }
    }

    /// Source that always takes the first candidate.
    #[must_use]
    pub fn first() -> Self {
        Self::new(0)
    }
}

impl DecisionSource for CyclingSource {
    fn decide(&mut self, observation: &Observation) -> Option<Decision> {
        let count = observation.choice_candidates.len();
        let turn = self.asked;
        self.asked += 1;
        if count == 0 {
            return Some(Decision::Decline);
        }
        let index = turn.wrapping_mul(self.stride) % count;
        Some(Decision::Pick {
            index: observation.choice_candidates[index].index,
        })
    }
}
