//! Minor and major improvements.

use crate::choice::ResourceCandidate;
use crate::error::Result;
use crate::events::{Effect, GameEvent, TriggerContext};
use crate::player::Player;
use crate::resources::{Resource, ResourceMap};
use crate::score::weighted_threshold;
use crate::step::Step;

use super::{exchange_variants, schedule_absolute, schedule_relative, CardDef, CardKind, PlayContext};

/// Built-in minor improvements.
#[must_use]
pub fn minor_improvements() -> Vec<CardDef> {
    let minor = |id| CardDef::new(id, CardKind::MinorImprovement);
    vec![
        minor("Field")
            .costing(Resource::Food, 1)
            .with_on_play(|_, _| Ok(vec![Step::Plow { optional: false }])),
        minor("ReedPond")
            .requires_occupations(3)
            .worth(1)
            .with_on_play(reed_pond),
        minor("GoosePond")
            .requires_occupations(3)
            .worth(1)
            .with_on_play(goose_pond),
        minor("DuckPond")
            .requires_occupations(2)
            .worth(1)
            .with_on_play(duck_pond),
        minor("PrivateForest")
            .costing(Resource::Food, 2)
            .with_on_play(private_forest),
        minor("FruitTree")
            .requires_occupations(3)
            .worth(1)
            .with_on_play(fruit_tree),
        minor("DrinkingTrough")
            .costing(Resource::Clay, 1)
            .with_on_play(drinking_trough),
    ]
}

/// Built-in major improvements.
#[must_use]
pub fn major_improvements() -> Vec<CardDef> {
    let major = |id| CardDef::new(id, CardKind::MajorImprovement);
    let cooking = [GameEvent::ResourceTrading, GameEvent::Baking];
    vec![
        major("Fireplace2")
            .costing(Resource::Clay, 2)
            .worth(1)
            .listens(&cooking)
            .with_trigger(fireplace),
        major("Fireplace3")
            .costing(Resource::Clay, 3)
            .worth(1)
            .listens(&cooking)
            .with_trigger(fireplace),
        major("CookingHearth4")
            .costing(Resource::Clay, 4)
            .worth(1)
            .listens(&cooking)
            .with_trigger(cooking_hearth),
        major("CookingHearth5")
            .costing(Resource::Clay, 5)
            .worth(1)
            .listens(&cooking)
            .with_trigger(cooking_hearth),
        major("Well")
            .costing(Resource::Wood, 1)
            .costing(Resource::Stone, 3)
            .worth(4)
            .with_on_play(well),
        major("ClayOven")
            .costing(Resource::Clay, 3)
            .costing(Resource::Stone, 1)
            .worth(2)
            .listens(&[GameEvent::Baking])
            .with_on_play(|_, _| Ok(vec![Step::Bake]))
            .with_trigger(|_| Ok(Effect::Rewrite(clay_oven))),
        major("StoneOven")
            .costing(Resource::Clay, 1)
            .costing(Resource::Stone, 3)
            .worth(3)
            .listens(&[GameEvent::Baking])
            .with_on_play(|_, _| Ok(vec![Step::Bake]))
            .with_trigger(|_| Ok(Effect::Rewrite(stone_oven))),
        major("Joinery")
            .costing(Resource::Wood, 2)
            .costing(Resource::Stone, 2)
            .worth(2)
            .with_bonus_points(|p| craft_points(p.ledger.get(Resource::Wood), &[3, 5, 7])),
        major("Pottery")
            .costing(Resource::Clay, 2)
            .costing(Resource::Stone, 2)
            .worth(2)
            .with_bonus_points(|p| craft_points(p.ledger.get(Resource::Clay), &[3, 5, 7])),
        major("BasketmakersWorkshop")
            .costing(Resource::Reed, 2)
            .costing(Resource::Stone, 2)
            .worth(2)
            .with_bonus_points(|p| craft_points(p.ledger.get(Resource::Reed), &[2, 4, 5])),
    ]
}

fn craft_points(stock: i32, thresholds: &[i32; 3]) -> i32 {
    weighted_threshold(stock, thresholds, &[0, 1, 2, 3])
}

// ============================================================================
// Cooking
// ============================================================================

fn one(resource: Resource) -> ResourceMap {
    ResourceMap::of(resource, 1)
}

fn food(amount: i32) -> ResourceMap {
    ResourceMap::of(Resource::Food, amount)
}

/// Bake `1..=grain` bushels at `rate` food each.
fn bake_any(ctx: &TriggerContext<'_>, rate: i32) -> Vec<(ResourceMap, ResourceMap)> {
    (1..=ctx.player.ledger.get(Resource::Grain))
        .map(|n| (ResourceMap::of(Resource::Grain, n), food(n * rate)))
        .collect()
}

fn fireplace(ctx: &TriggerContext<'_>) -> Result<Effect> {
    Ok(match ctx.event {
        GameEvent::ResourceTrading => Effect::Rewrite(fireplace_trades),
        _ => Effect::Rewrite(fireplace_bakes),
    })
}

fn fireplace_trades(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let rates = [
        (one(Resource::Sheep), food(2)),
        (one(Resource::Boar), food(2)),
        (one(Resource::Cattle), food(3)),
        (one(Resource::Vegetable), food(2)),
    ];
    exchange_variants(ctx, candidates, "Fireplace", &rates)
}

fn fireplace_bakes(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    exchange_variants(ctx, candidates, "Fireplace", &bake_any(ctx, 2))
}

fn cooking_hearth(ctx: &TriggerContext<'_>) -> Result<Effect> {
    Ok(match ctx.event {
        GameEvent::ResourceTrading => Effect::Rewrite(hearth_trades),
        _ => Effect::Rewrite(hearth_bakes),
    })
}

fn hearth_trades(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    let rates = [
        (one(Resource::Sheep), food(2)),
        (one(Resource::Boar), food(3)),
        (one(Resource::Cattle), food(4)),
        (one(Resource::Vegetable), food(3)),
    ];
    exchange_variants(ctx, candidates, "CookingHearth", &rates)
}

fn hearth_bakes(
    ctx: &TriggerContext<'_>,
    candidates: Vec<ResourceCandidate>,
) -> Vec<ResourceCandidate> {
    exchange_variants(ctx, candidates, "CookingHearth", &bake_any(ctx, 3))
}

fn clay_oven(ctx: &TriggerContext<'_>, candidates: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    exchange_variants(ctx, candidates, "ClayOven", &[(one(Resource::Grain), food(5))])
}

fn stone_oven(ctx: &TriggerContext<'_>, candidates: Vec<ResourceCandidate>) -> Vec<ResourceCandidate> {
    let bakes = [
        (one(Resource::Grain), food(4)),
        (ResourceMap::of(Resource::Grain, 2), food(8)),
    ];
    exchange_variants(ctx, candidates, "StoneOven", &bakes)
}

// ============================================================================
// On-play hooks
// ============================================================================

fn reed_pond(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3], &one(Resource::Reed));
    Ok(Vec::new())
}

fn goose_pond(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3, 4], &food(1));
    Ok(Vec::new())
}

fn duck_pond(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3], &food(1));
    Ok(Vec::new())
}

fn private_forest(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_absolute(player, ctx.round, &[2, 4, 6, 8, 10, 12, 14], &one(Resource::Wood));
    Ok(Vec::new())
}

fn fruit_tree(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_absolute(player, ctx.round, &[8, 9, 10, 11, 12, 13, 14], &food(1));
    Ok(Vec::new())
}

fn drinking_trough(player: &mut Player, _: &PlayContext) -> Result<Vec<Step>> {
    player.board.pasture_bonus += 2;
    Ok(Vec::new())
}

fn well(player: &mut Player, ctx: &PlayContext) -> Result<Vec<Step>> {
    schedule_relative(player, ctx.round, &[1, 2, 3, 4, 5], &food(1));
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn cook() -> Player {
        Player::new(
            0,
            ResourceMap::new()
                .with(Resource::Sheep, 1)
                .with(Resource::Grain, 2),
            Board::new(3, 5),
        )
    }

    fn ctx(player: &Player, event: GameEvent) -> TriggerContext<'_> {
        TriggerContext {
            event,
            player,
            round: 3,
            players: 2,
        }
    }

    #[test]
    fn test_fireplace_offers_only_affordable_trades() {
        let player = cook();
        let out = fireplace_trades(
            &ctx(&player, GameEvent::ResourceTrading),
            vec![ResourceCandidate::default()],
        );
        // Skip, plus cooking the single sheep.
        assert_eq!(out.len(), 2);
        assert!(out[0].is_empty());
        assert_eq!(out[1].paid.get(Resource::Sheep), 1);
        assert_eq!(out[1].bonus.get(Resource::Food), 2);
    }

    #[test]
    fn test_fireplace_bakes_every_amount() {
        let player = cook();
        let out = fireplace_bakes(
            &ctx(&player, GameEvent::Baking),
            vec![ResourceCandidate::default()],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].bonus.get(Resource::Food), 4);
    }

    #[test]
    fn test_variants_do_not_stack_across_cards() {
        let player = cook();
        let c = &ctx(&player, GameEvent::Baking);
        let out = stone_oven(c, fireplace_bakes(c, vec![ResourceCandidate::default()]));
        // 1 skip + 2 fireplace + 2 oven.
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_craft_points() {
        assert_eq!(craft_points(2, &[3, 5, 7]), 0);
        assert_eq!(craft_points(5, &[3, 5, 7]), 2);
        assert_eq!(craft_points(9, &[2, 4, 5]), 3);
    }
}
