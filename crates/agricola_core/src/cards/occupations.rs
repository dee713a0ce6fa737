//! Occupation cards.

use crate::actions::ActionKind;
use crate::board::HouseMaterial;
use crate::choice::ResourceCandidate;
use crate::error::Result;
use crate::events::{Effect, GameEvent, TriggerContext};
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};
use crate::step::Step;

use super::{bonus_when_taken, schedule_absolute, schedule_relative, CardDef, CardKind, PlayContext};

const WOOD_SPACES: [GameEvent; 3] = [
    GameEvent::Action(ActionKind::Forest),
    GameEvent::Action(ActionKind::Grove),
    GameEvent::Action(ActionKind::Copse),
];

/// Built-in occupations.
#[must_use]
pub fn occupations() -> Vec<CardDef> {
    let occupation = |id| CardDef::new(id, CardKind::Occupation);
    vec![
        occupation("Woodcutter")
            .listens(&WOOD_SPACES)
            .with_trigger(|_| Ok(Effect::Rewrite(woodcutter))),
        occupation("BerryPicker")
            .listens(&WOOD_SPACES)
            .with_trigger(|_| Ok(Effect::Rewrite(berry_picker))),
        occupation("MushroomCollector")
            .listens(&WOOD_SPACES)
            .with_trigger(|_| Ok(Effect::Rewrite(mushroom_collector))),
        occupation("SeasonalWorker")
            .listens(&[GameEvent::Action(ActionKind::DayLaborer)])
            .with_trigger(|_| Ok(Effect::Rewrite(seasonal_worker))),
        occupation("Undergardener")
            .listens(&[GameEvent::Action(ActionKind::DayLaborer)])
            .with_trigger(|_| Ok(Effect::Rewrite(undergardener))),
        occupation("Greengrocer")
            .listens(&[GameEvent::Action(ActionKind::GrainSeeds)])
            .with_trigger(|_| Ok(Effect::Rewrite(greengrocer))),
        occupation("SeedSeller")
            .listens(&[GameEvent::Action(ActionKind::GrainSeeds)])
            .with_on_play(seed_seller_on_play)
            .with_trigger(|_| Ok(Effect::Rewrite(seed_seller))),
        occupation("FieldWatchman")
            .listens(&[GameEvent::Action(ActionKind::GrainSeeds)])
            .with_trigger(|_| Ok(Effect::Rewrite(field_watchman))),
        occupation("Cowhead")
            .listens(&[GameEvent::Action(ActionKind::CattleMarket)])
            .with_trigger(|_| Ok(Effect::Rewrite(cowhead))),
        occupation("Conjurer")
            .min_players(4)
            .listens(&[GameEvent::Action(ActionKind::TravelingPlayers)])
            .with_trigger(|_| Ok(Effect::Rewrite(conjurer))),
        occupation("Conservator").with_on_play(conservator),
        occupation("ReedCollector").with_on_play(reed_collector),
        occupation("WoodCollector").with_on_play(wood_collector),
        occupation("WoodDeliveryman")
            .min_players(3)
            .with_on_play(wood_deliveryman),
        occupation("MasterShepherd").with_on_play(master_shepherd),
        occupation("SheepWhisperer").with_on_play(sheep_whisperer),
        occupation("PigWhisperer").with_on_play(pig_whisperer),
        occupation("CattleWhisperer").with_on_play(cattle_whisperer),
    ]
}

// ============================================================================
// Candidate rewrites
// ============================================================================

fn woodcutter(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Wood, "Woodcutter", &ResourceMap::of(Resource::Wood, 1))
}

fn berry_picker(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Wood, "BerryPicker", &ResourceMap::of(Resource::Food, 1))
}

/// Offer to leave one wood on the space in exchange for two food.
fn mushroom_collector(
    _: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let mut out = candidates.clone();
    for candidate in candidates {
        if candidate.taken.get(Resource::Wood) - candidate.returned.get(Resource::Wood) >= 1 {
            out.push(
                candidate
                    .returning(&ResourceMap::of(Resource::Wood, 1))
                    .gaining(&ResourceMap::of(Resource::Food, 2))
                    .from_card("MushroomCollector"),
            );
        }
    }
    out
}

fn seasonal_worker(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let mut out = candidates.clone();
    for candidate in candidates {
        out.push(
            candidate
                .clone()
                .gaining(&ResourceMap::of(Resource::Grain, 1))
                .from_card("SeasonalWorker"),
        );
        if ctx.round >= 6 {
            out.push(
                candidate
                    .gaining(&ResourceMap::of(Resource::Vegetable, 1))
                    .from_card("SeasonalWorker"),
            );
        }
    }
    out
}

fn undergardener(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Food, "Undergardener", &ResourceMap::of(Resource::Vegetable, 1))
}

fn greengrocer(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Grain, "Greengrocer", &ResourceMap::of(Resource::Vegetable, 1))
}

fn seed_seller(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Grain, "SeedSeller", &ResourceMap::of(Resource::Grain, 1))
}

/// Taking grain seeds also lets the player plow one field.
fn field_watchman(
    _: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    candidates
        .into_iter()
        .map(|candidate| {
            candidate
                .then(Step::Plow { optional: true })
                .from_card("FieldWatchman")
        })
        .collect()
}

fn cowhead(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    bonus_when_taken(c, Resource::Cattle, "Cowhead", &ResourceMap::of(Resource::Cattle, 1))
}

fn conjurer(_: &TriggerContext<'_>, c: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    let bonus = ResourceMap::new()
        .with(Resource::Wood, 1)
        .with(Resource::Grain, 1);
    bonus_when_taken(c, Resource::Food, "Conjurer", &bonus)
}

// ============================================================================
// On-play hooks
// ============================================================================

fn seed_seller_on_play(player: &mut Player, _: &PlayContext) -> Result<Vec<Step>> {
    player.ledger.grant(&ResourceMap::of(Resource::Grain, 1))?;
    Ok(Vec::new())
}

fn conservator(player: &mut Player, _: &PlayContext) -> Result<Vec<Step>> {
    player
        .board
        .house
        .splice(HouseMaterial::Wood, HouseMaterial::Stone);
    Ok(Vec::new())
}

fn reed_collector(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3, 4], &ResourceMap::of(Resource::Reed, 1));
    Ok(Vec::new())
}

fn wood_collector(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3, 4, 5], &ResourceMap::of(Resource::Wood, 1));
    Ok(Vec::new())
}

fn wood_deliveryman(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_absolute(
        player,
        ctx.round,
        &[8, 9, 10, 11, 12, 13, 14],
        &ResourceMap::of(Resource::Wood, 1),
    );
    Ok(Vec::new())
}

fn master_shepherd(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3], &ResourceMap::of(Resource::Sheep, 1));
    Ok(Vec::new())
}

fn sheep_whisperer(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[4, 7, 9, 11], &ResourceMap::of(Resource::Sheep, 1));
    Ok(Vec::new())
}

fn pig_whisperer(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[4, 7, 10], &ResourceMap::of(Resource::Boar, 1));
    Ok(Vec::new())
}

fn cattle_whisperer(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[5, 9], &ResourceMap::of(Resource::Cattle, 1));
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn ctx(player: &Player, round: u8) -> TriggerContext<'_> {
        TriggerContext {
            event: GameEvent::Action(ActionKind::Forest),
            player,
            round,
            players: 2,
        }
    }

    #[test]
    fn test_woodcutter_adds_wood_only_when_wood_taken() {
        let player = Player::new(0, ResourceMap::new(), Board::new(3, 5));
        let out = woodcutter(
            &ctx(&player, 1),
            vec![
                ResourceCandidate::new(ResourceMap::of(Resource::Wood, 3)),
                ResourceCandidate::new(ResourceMap::of(Resource::Food, 2)),
            ],
        );
        assert_eq!(out[0].bonus.get(Resource::Wood), 1);
        assert!(out[1].bonus.is_empty());
    }

    #[test]
    fn test_mushroom_collector_keeps_original() {
        let player = Player::new(0, ResourceMap::new(), Board::new(3, 5));
        let baseline = ResourceCandidate::new(ResourceMap::of(Resource::Wood, 3));
        let out = mushroom_collector(&ctx(&player, 1), vec![baseline.clone()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], baseline);
        assert_eq!(out[1].net().get(Resource::Wood), 2);
        assert_eq!(out[1].net().get(Resource::Food), 2);
        assert_eq!(out[1].returned.get(Resource::Wood), 1);
    }

    #[test]
    fn test_seasonal_worker_adds_vegetable_late() {
        let player = Player::new(0, ResourceMap::new(), Board::new(3, 5));
        let baseline = vec![ResourceCandidate::new(ResourceMap::of(Resource::Food, 2))];
        assert_eq!(seasonal_worker(&ctx(&player, 5), baseline.clone()).len(), 2);
        assert_eq!(seasonal_worker(&ctx(&player, 6), baseline).len(), 3);
    }

    #[test]
    fn test_whisperer_schedules_futures() {
        let mut player = Player::new(0, ResourceMap::new(), Board::new(3, 5));
        pig_whisperer(&mut player, &PlayContext { round: 2, players: 2 }).unwrap();
        assert_eq!(player.futures.get(&6).map(|m| m.get(Resource::Boar)), Some(1));
        assert_eq!(player.futures.get(&12).map(|m| m.get(Resource::Boar)), Some(1));
    }
}
