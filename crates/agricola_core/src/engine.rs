//! Turn resolution and the round loop.
//!
//! A turn is a stack of [`Step`]s. [`StepEngine`] pops one step at a time,
//! asks the step for a [`Choice`], resolves it (automatically when forced,
//! otherwise through a [`DecisionSource`]) and pushes the follow-ups.
//!
//! [`Game`] drives rounds: it runs each turn on a scratch copy of the state
//! and commits the copy only when the turn succeeds. A rule violation throws
//! the copy away and costs the player one action.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::actions::{round_cards, starting_actions, ActionSpace};
use crate::board::Board;
use crate::cards::{CardCatalogue, CardKind};
use crate::choice::Decision;
use crate::config::GameConfig;
use crate::error::{GameError, Result, RuleError};
use crate::events::{fire_direct, EventRegistry, GameEvent, Site};
use crate::game::{is_stage_end, is_stage_start, stage_of, total_rounds, GameState, GameStatus};
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};
use crate::rng::DeckRng;
use crate::score::{score_player, ScoreCard};
use crate::snapshot::Observation;
use crate::step::Step;

// ============================================================================
// Decisions
// ============================================================================

/// Supplies decisions for choices the engine cannot resolve alone.
///
/// Returning `None` abandons the game.
pub trait DecisionSource {
    /// Decide the pending choice described by `observation`.
    fn decide(&mut self, observation: &Observation) -> Option<Decision>;
}

impl<F> DecisionSource for F
where
    F: FnMut(&Observation) -> Option<Decision>,
{
    fn decide(&mut self, observation: &Observation) -> Option<Decision> {
        self(observation)
    }
}

// ============================================================================
// Step engine
// ============================================================================

/// What the engine is doing with the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No step in flight.
    #[default]
    Idle,
    /// Waiting on a decision source.
    AwaitingChoice,
    /// Applying a step's effect.
    Applying,
}

/// How a stack run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Every step resolved.
    Drained,
    /// The decision source gave up.
    Abandoned,
}

/// One player's turn stack.
#[derive(Debug, Clone)]
pub struct StepEngine {
    player: usize,
    stack: Vec<Step>,
    phase: TurnPhase,
}

impl StepEngine {
    /// Empty stack for `player`.
    #[must_use]
    pub fn new(player: usize) -> Self {
        Self {
            player,
            stack: Vec::new(),
            phase: TurnPhase::Idle,
        }
    }

    /// Stack for a normal turn: place a worker, then trade.
    #[must_use]
    pub fn for_turn(player: usize) -> Self {
        let mut engine = Self::new(player);
        engine.push(Step::Trade);
        engine.push(Step::SelectAction);
        engine
    }

    /// Push a step; it resolves before everything already on the stack.
    pub fn push(&mut self, step: Step) {
        self.stack.push(step);
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Steps still pending, bottom first.
    #[must_use]
    pub fn pending(&self) -> &[Step] {
        &self.stack
    }

    /// Resolve steps until the stack is empty or the source gives up.
    ///
    /// Any error leaves `state` partially modified; callers run this on a
    /// scratch copy.
    pub fn run(
        &mut self,
        state: &mut GameState,
        catalogue: &CardCatalogue,
        source: &mut dyn DecisionSource,
    ) -> Result<Resolution> {
        while let Some(step) = self.stack.pop() {
            debug!(player = self.player, step = step.name(), depth = self.stack.len(), "resolving step");
            let mut choice = step.required_choice(state, catalogue, self.player)?;
            if let Some(pending) = choice.as_mut() {
                if pending.is_dead_end() {
                    return Err(RuleError::ImpossibleAction(format!(
                        "no legal option for {}",
                        step.name()
                    ))
                    .into());
                }
                if !pending.auto_resolve() {
                    self.phase = TurnPhase::AwaitingChoice;
                    let observation =
                        Observation::capture(state, catalogue, self.player, Some(&*pending))?;
                    let Some(decision) = source.decide(&observation) else {
                        self.stack.push(step);
                        self.phase = TurnPhase::Idle;
                        return Ok(Resolution::Abandoned);
                    };
                    pending.resolve(&decision)?;
                }
                if let Some(summary) = pending.selected_summary() {
                    debug!(player = self.player, kind = %pending.kind, choice = %summary.label, "choice resolved");
                }
            }
            self.phase = TurnPhase::Applying;
            let follow_ups = step.effect(state, catalogue, self.player, choice.as_ref())?;
            self.stack.extend(follow_ups);
        }
        self.phase = TurnPhase::Idle;
        Ok(Resolution::Drained)
    }
}

// ============================================================================
// Game loop
// ============================================================================

/// What one call to [`Game::play_turn`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn resolved and was committed.
    Committed {
        /// Acting seat.
        player: usize,
    },
    /// The turn broke a rule and was discarded.
    RolledBack {
        /// Acting seat.
        player: usize,
        /// What went wrong.
        error: RuleError,
    },
    /// The decision source gave up mid-turn.
    Abandoned,
    /// The game was already over.
    GameOver,
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GameOutcome {
    /// All rounds were played.
    Finished {
        /// Score card per seat.
        scores: Vec<ScoreCard>,
        /// Seats sharing the best total.
        winners: Vec<usize>,
    },
    /// A decision source stopped answering.
    Abandoned {
        /// Round in progress.
        round: u8,
    },
}

/// A game in progress.
#[derive(Debug, Clone)]
pub struct Game {
    state: GameState,
    catalogue: CardCatalogue,
}

impl Game {
    /// Set up a new game: deal hands, lay out the board and stack the round
    /// cards.
    pub fn new(config: &GameConfig, catalogue: CardCatalogue) -> Result<Self> {
        config.validate()?;
        let n = config.players;
        let mut rng = DeckRng::new(config.seed);

        let mut occupations = catalogue.of_kind(CardKind::Occupation, n);
        let mut minors = catalogue.of_kind(CardKind::MinorImprovement, n);
        rng.shuffle(&mut occupations);
        rng.shuffle(&mut minors);
        let per_occupation = config.hand_size.min(occupations.len() / n);
        let per_minor = config.hand_size.min(minors.len() / n);

        let (rows, cols) = config.board_shape;
        let players = (0..n)
            .map(|seat| {
                let mut player = Player::new(
                    seat,
                    config.resources_for(seat),
                    Board::starting(rows, cols, &config.starting_rooms),
                );
                player.hand_occupations =
                    occupations[seat * per_occupation..(seat + 1) * per_occupation].to_vec();
                player.hand_minors = minors[seat * per_minor..(seat + 1) * per_minor].to_vec();
                player
            })
            .collect();

        let mut upcoming = Vec::new();
        for mut stage in round_cards() {
            if config.shuffle_round_cards {
                rng.shuffle(&mut stage);
            }
            upcoming.extend(stage);
        }

        let state = GameState {
            game_id: config.game_id.clone(),
            round: 0,
            players,
            first_player: 0,
            current_player: 0,
            action_spaces: starting_actions(n).into_iter().map(ActionSpace::new).collect(),
            upcoming,
            remaining_majors: catalogue.of_kind(CardKind::MajorImprovement, n),
            registry: EventRegistry::new(),
            status: GameStatus::BeforeRound,
        };
        info!(game_id = %state.game_id, players = n, seed = config.seed, "game created");
        Ok(Self { state, catalogue })
    }

    /// Resume from a saved state.
    #[must_use]
    pub fn from_state(state: GameState, catalogue: CardCatalogue) -> Self {
        Self { state, catalogue }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state, for setting up scenarios.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Card definitions in use.
    #[must_use]
    pub const fn catalogue(&self) -> &CardCatalogue {
        &self.catalogue
    }

    /// Whether the last round is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.status == GameStatus::Finished
    }

    /// Describe the game from `player`'s seat with no pending choice.
    pub fn observe(&self, player: usize) -> Result<Observation> {
        Observation::capture(&self.state, &self.catalogue, player, None)
    }

    // ------------------------------------------------------------------------
    // Rounds
    // ------------------------------------------------------------------------

    /// Begin the next round: reveal a round card, refill the board, hand
    /// out scheduled goods and fire the start-of-round events.
    pub fn start_round(&mut self) -> Result<()> {
        if self.state.status == GameStatus::Finished {
            return Err(GameError::InvalidState("the game is over".into()));
        }
        let round = self.state.round + 1;
        if round > total_rounds() {
            return Err(GameError::InvalidState(format!("round {round} does not exist")));
        }
        self.state.round = round;
        self.state.status = GameStatus::InRound;

        if !self.state.upcoming.is_empty() {
            let kind = self.state.upcoming.remove(0);
            debug!(round, action = %kind, "round card revealed");
            self.state.action_spaces.push(ActionSpace::new(kind));
        }
        let n = self.state.players.len();
        for space in &mut self.state.action_spaces {
            space.replenish(n);
        }
        for player in &mut self.state.players {
            if let Some(goods) = player.take_futures(round) {
                player.ledger.grant(&goods)?;
            }
            player.actions_remaining = player.people().max(0) as u8;
        }

        if is_stage_start(round) {
            self.fire_upkeep(GameEvent::StartStage)?;
        }
        self.fire_upkeep(GameEvent::StartRound)?;
        self.state.current_player = self.state.first_player;
        info!(round, stage = stage_of(round), first_player = self.state.first_player, "round started");
        Ok(())
    }

    /// Play one turn for the current seat, starting the round first if
    /// needed.
    pub fn play_turn(&mut self, source: &mut dyn DecisionSource) -> Result<TurnOutcome> {
        match self.state.status {
            GameStatus::Finished => return Ok(TurnOutcome::GameOver),
            GameStatus::BeforeRound => self.start_round()?,
            GameStatus::InRound => {}
        }

        let seat = self.state.current_player;
        let mut scratch = self.state.clone();
        let mut engine = StepEngine::for_turn(seat);
        let attempt = engine
            .run(&mut scratch, &self.catalogue, source)
            .and_then(|resolution| {
                if resolution == Resolution::Drained {
                    scratch.player(seat)?.check_animals()?;
                }
                Ok(resolution)
            });

        match attempt {
            Ok(Resolution::Drained) => {
                scratch.player_mut(seat)?.last_error = None;
                self.state = scratch;
                debug!(player = seat, hash = self.state.state_hash(), "turn committed");
                self.advance(seat)?;
                Ok(TurnOutcome::Committed { player: seat })
            }
            Ok(Resolution::Abandoned) => {
                info!(player = seat, round = self.state.round, "decision source stopped");
                Ok(TurnOutcome::Abandoned)
            }
            Err(GameError::Rule(error)) => {
                warn!(player = seat, %error, "turn rolled back");
                let player = self.state.player_mut(seat)?;
                player.actions_remaining = player.actions_remaining.saturating_sub(1);
                player.last_error = Some(error.to_string());
                if player.actions_remaining == 0 {
                    self.advance(seat)?;
                }
                Ok(TurnOutcome::RolledBack {
                    player: seat,
                    error,
                })
            }
            Err(fault) => Err(fault),
        }
    }

    /// Play turns until the game ends or a source gives up.
    pub fn run(&mut self, source: &mut dyn DecisionSource) -> Result<GameOutcome> {
        loop {
            match self.play_turn(source)? {
                TurnOutcome::GameOver => return self.outcome(),
                TurnOutcome::Abandoned => {
                    return Ok(GameOutcome::Abandoned {
                        round: self.state.round,
                    })
                }
                TurnOutcome::Committed { .. } | TurnOutcome::RolledBack { .. } => {}
            }
        }
    }

    /// Current score cards, one per seat.
    pub fn scores(&self) -> Result<Vec<ScoreCard>> {
        self.state
            .players
            .iter()
            .map(|player| score_player(player, &self.catalogue))
            .collect()
    }

    /// Final result; valid at any time, but only meaningful once finished.
    pub fn outcome(&self) -> Result<GameOutcome> {
        let scores = self.scores()?;
        let best = scores.iter().map(|card| card.total).max().unwrap_or(0);
        let winners = scores
            .iter()
            .filter(|card| card.total == best)
            .map(|card| card.player)
            .collect();
        Ok(GameOutcome::Finished { scores, winners })
    }

    /// Hand the turn to the next seat with workers left, or close the round.
    fn advance(&mut self, from: usize) -> Result<()> {
        let n = self.state.players.len();
        let next = (1..=n)
            .map(|k| (from + k) % n)
            .find(|&seat| self.state.players[seat].actions_remaining > 0);
        match next {
            Some(seat) => self.state.current_player = seat,
            None => self.finish_round()?,
        }
        Ok(())
    }

    fn finish_round(&mut self) -> Result<()> {
        let round = self.state.round;
        self.fire_upkeep(GameEvent::EndRound)?;
        if is_stage_end(round) {
            self.harvest()?;
            self.fire_upkeep(GameEvent::EndStage)?;
        }
        if round >= total_rounds() {
            self.state.status = GameStatus::Finished;
            info!(game_id = %self.state.game_id, hash = self.state.state_hash(), "game finished");
        } else {
            self.state.status = GameStatus::BeforeRound;
            info!(round, "round finished");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Harvest
    // ------------------------------------------------------------------------

    fn harvest(&mut self) -> Result<()> {
        info!(round = self.state.round, stage = self.state.stage(), "harvest");
        let order = self.state.seat_order();

        for &seat in &order {
            let player = self.state.player_mut(seat)?;
            let crops = player.board.harvest_fields();
            player.ledger.grant(&crops)?;
            fire_direct(&mut self.state, &self.catalogue, GameEvent::FieldPhase, seat, Site::Upkeep)?;
        }

        for &seat in &order {
            let player = self.state.player_mut(seat)?;
            let meal = ResourceMap::of(Resource::Food, FOOD_PER_PERSON * player.people());
            let receipt = player.ledger.pay(&meal)?;
            if receipt.begged > 0 {
                info!(player = seat, begged = receipt.begged, "family went hungry");
            }
            fire_direct(&mut self.state, &self.catalogue, GameEvent::FeedingPhase, seat, Site::Upkeep)?;
        }

        for &seat in &order {
            let player = self.state.player_mut(seat)?;
            for animal in Resource::ANIMALS {
                if player.ledger.get(animal) < 2 {
                    continue;
                }
                let mut grown = player.ledger.animals();
                grown.add(animal, 1);
                if player.board.can_hold(&grown) {
                    player.ledger.grant(&ResourceMap::of(animal, 1))?;
                    debug!(player = seat, %animal, "animal born");
                }
            }
            fire_direct(&mut self.state, &self.catalogue, GameEvent::BreedingPhase, seat, Site::Upkeep)?;
        }
        Ok(())
    }

    fn fire_upkeep(&mut self, event: GameEvent) -> Result<()> {
        for seat in self.state.seat_order() {
            fire_direct(&mut self.state, &self.catalogue, event, seat, Site::Upkeep)?;
        }
        Ok(())
    }
}

/// Food each family member eats at harvest.
pub const FOOD_PER_PERSON: i32 = 2;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;
    use crate::board::Space;
    use crate::resources::Ledger;

    fn game() -> Game {
        let config = GameConfig::default().with_seed(3);
        Game::new(&config, CardCatalogue::standard()).unwrap()
    }

    /// Picks the candidate whose label starts with `prefix`, else declines.
    fn pick(prefix: &'static str) -> impl FnMut(&Observation) -> Option<Decision> {
        move |obs: &Observation| {
            let found = obs
                .choice_candidates
                .iter()
                .find(|c| c.label.starts_with(prefix))
                .or_else(|| obs.choice_candidates.first())?;
            Some(Decision::Pick { index: found.index })
        }
    }

    #[test]
    fn test_new_game_deals_hands() {
        let game = game();
        let state = game.state();
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.players[0].hand_occupations.len(), 7);
        assert_eq!(state.players[1].hand_minors.len(), 3);
        assert!(state
            .players[0]
            .hand_occupations
            .iter()
            .all(|id| !state.players[1].hand_occupations.contains(id)));
        assert_eq!(state.upcoming.len(), 14);
        assert_eq!(state.players[0].ledger.get(Resource::Food), 2);
    }

    #[test]
    fn test_start_round_reveals_and_replenishes() {
        let mut game = game();
        game.start_round().unwrap();
        let state = game.state();
        assert_eq!(state.round, 1);
        assert_eq!(state.action_spaces.len(), 11);
        assert_eq!(state.space(ActionKind::Forest).unwrap().stock.get(Resource::Wood), 3);
        assert_eq!(state.players[0].actions_remaining, 2);
    }

    #[test]
    fn test_turn_commits_and_advances() {
        let mut game = game();
        let mut source = pick("Forest");
        let outcome = game.play_turn(&mut source).unwrap();
        assert_eq!(outcome, TurnOutcome::Committed { player: 0 });
        let state = game.state();
        assert_eq!(state.players[0].ledger.get(Resource::Wood), 3);
        assert_eq!(state.space(ActionKind::Forest).unwrap().taken_by, Some(0));
        assert_eq!(state.current_player, 1);
        assert_eq!(state.players[0].actions_remaining, 1);
    }

    #[test]
    fn test_abandon_leaves_state_untouched() {
        let mut game = game();
        game.start_round().unwrap();
        let before = game.state().state_hash();
        let mut source = |_: &Observation| -> Option<Decision> { None };
        assert_eq!(game.play_turn(&mut source).unwrap(), TurnOutcome::Abandoned);
        assert_eq!(game.state().state_hash(), before);
    }

    #[test]
    fn test_rule_error_rolls_back_and_costs_an_action() {
        let mut game = game();
        game.start_round().unwrap();
        let board_before = game.state().players[0].board.clone();
        let mut calls = 0;
        let mut source = |obs: &Observation| {
            calls += 1;
            if calls == 1 {
                let index = obs
                    .choice_candidates
                    .iter()
                    .find(|c| c.label.starts_with("Farmland"))?
                    .index;
                return Some(Decision::Pick { index });
            }
            Some(Decision::Space {
                space: Space::new(0, 0),
            })
        };
        let outcome = game.play_turn(&mut source).unwrap();
        assert!(matches!(
            outcome,
            TurnOutcome::RolledBack {
                player: 0,
                error: RuleError::IllegalPlacement(_)
            }
        ));
        let state = game.state();
        assert_eq!(state.players[0].board, board_before);
        assert_eq!(state.players[0].actions_remaining, 1);
        assert!(state.players[0].last_error.is_some());
        assert!(state.space(ActionKind::Farmland).unwrap().is_available());
        assert_eq!(state.current_player, 0);
    }

    #[test]
    fn test_harvest_feeds_and_begs() {
        let mut game = game();
        for player in &mut game.state_mut().players {
            player.ledger = Ledger::new(
                ResourceMap::of(Resource::People, 2).with(Resource::Food, 1),
            );
        }
        game.state_mut().round = 4;
        game.harvest().unwrap();
        let player = &game.state().players[0];
        assert_eq!(player.ledger.get(Resource::Food), 0);
        assert_eq!(player.ledger.begging(), 3);
    }

    #[test]
    fn test_breeding_needs_room() {
        let mut game = game();
        let player = &mut game.state_mut().players[0];
        player.ledger = Ledger::new(
            ResourceMap::of(Resource::People, 1)
                .with(Resource::Food, 2)
                .with(Resource::Sheep, 1)
                .with(Resource::Boar, 2),
        );
        game.harvest().unwrap();
        // Only the house pet slot is free: two boar cannot even stay, so no
        // newborn is added.
        assert_eq!(game.state().players[0].ledger.get(Resource::Boar), 2);

        let player = &mut game.state_mut().players[0];
        player.ledger = Ledger::new(
            ResourceMap::of(Resource::Wood, 6).with(Resource::FencesAvailable, 6),
        );
        player
            .build_pastures(vec![vec![Space::new(0, 1), Space::new(0, 2)]])
            .unwrap();
        player.ledger = Ledger::new(
            ResourceMap::of(Resource::People, 1)
                .with(Resource::Food, 2)
                .with(Resource::Boar, 2),
        );
        game.harvest().unwrap();
        assert_eq!(game.state().players[0].ledger.get(Resource::Boar), 3);
    }
}
