//! Built-in agent that picks uniformly among the listed candidates.

use agricola_core::choice::Decision;
use agricola_core::rng::DeckRng;
use agricola_core::snapshot::Observation;

use crate::agent::{Agent, AgentError};

/// Seeded random agent. The same seed answers the same observations the
/// same way.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    name: String,
    rng: DeckRng,
}

impl RandomAgent {
    /// Agent seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            name: format!("random-{seed}"),
            rng: DeckRng::new(seed),
        }
    }

    /// Pick a decision for `observation`.
    pub fn choose(&mut self, observation: &Observation) -> Decision {
        let candidates = &observation.choice_candidates;
        if candidates.is_empty() {
            return Decision::Decline;
        }
        let pick = &candidates[self.rng.below(candidates.len())];
        Decision::Pick { index: pick.index }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn respond(&mut self, observation: &Observation) -> Result<Option<String>, AgentError> {
        let decision = self.choose(observation);
        Ok(Some(serde_json::to_string(&decision)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agricola_core::cards::CardCatalogue;
    use agricola_core::config::GameConfig;
    use agricola_core::engine::Game;

    fn observation() -> Observation {
        let mut game = Game::new(&GameConfig::default(), CardCatalogue::standard()).unwrap();
        game.start_round().unwrap();
        let mut seen = None;
        let mut capture = |obs: &Observation| -> Option<Decision> {
            seen = Some(obs.clone());
            None
        };
        game.play_turn(&mut capture).unwrap();
        seen.unwrap()
    }

    #[test]
    fn test_picks_listed_candidates() {
        let obs = observation();
        let mut agent = RandomAgent::new(3);
        for _ in 0..20 {
            let Decision::Pick { index } = agent.choose(&obs) else {
                panic!("expected a pick");
            };
            assert!(index < obs.choice_candidates.len());
        }
    }

    #[test]
    fn test_same_seed_same_answers() {
        let obs = observation();
        let mut a = RandomAgent::new(9);
        let mut b = RandomAgent::new(9);
        for _ in 0..10 {
            assert_eq!(a.respond(&obs).unwrap(), b.respond(&obs).unwrap());
        }
    }

    #[test]
    fn test_declines_without_candidates() {
        let mut obs = observation();
        obs.choice_candidates.clear();
        assert_eq!(RandomAgent::new(0).choose(&obs), Decision::Decline);
    }
}
