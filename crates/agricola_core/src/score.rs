//! End-game scoring.
//!
//! Most categories use [`weighted_threshold`]: the score is the entry of a
//! points table indexed by how many thresholds the value reaches.

use serde::{Deserialize, Serialize};

use crate::board::HouseMaterial;
use crate::cards::CardCatalogue;
use crate::error::Result;
use crate::player::Player;
use crate::resources::Resource;

/// `points[n]` where `n` is the number of `thresholds` not above `value`.
///
/// `points` must have one more entry than `thresholds`.
#[must_use]
pub fn weighted_threshold(value: i32, thresholds: &[i32], points: &[i32]) -> i32 {
    let reached = thresholds.iter().filter(|t| **t <= value).count();
    points.get(reached).copied().unwrap_or(0)
}

/// Points for 0, 1, 2, 3 and 4+ thresholds reached.
const POINTS: [i32; 5] = [-1, 1, 2, 3, 4];

/// Scoring categories with their thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Fenced pastures.
    Pastures,
    /// Plowed fields.
    Fields,
    /// Grain in supply and on fields.
    Grain,
    /// Vegetables in supply and on fields.
    Vegetables,
    /// Sheep.
    Sheep,
    /// Wild boar.
    Boar,
    /// Cattle.
    Cattle,
}

impl Category {
    /// Every threshold category.
    pub const ALL: [Self; 7] = [
        Self::Pastures,
        Self::Fields,
        Self::Grain,
        Self::Vegetables,
        Self::Sheep,
        Self::Boar,
        Self::Cattle,
    ];

    /// Values at which the next points bracket starts.
    #[must_use]
    pub const fn thresholds(self) -> [i32; 4] {
        match self {
            Self::Pastures | Self::Vegetables => [1, 2, 3, 4],
            Self::Fields => [1, 3, 4, 5],
            Self::Grain | Self::Sheep => [1, 4, 6, 8],
            Self::Boar => [1, 3, 5, 7],
            Self::Cattle => [1, 2, 4, 6],
        }
    }

    /// The player's value in this category.
    #[must_use]
    pub fn value(self, player: &Player) -> i32 {
        let on_fields = |resource: Resource| -> i32 {
            player
                .board
                .fields()
                .filter(|field| field.crop.map(|crop| crop.resource()) == Some(resource))
                .map(|field| i32::from(field.remaining))
                .sum()
        };
        match self {
            Self::Pastures => player.board.pastures().len() as i32,
            Self::Fields => player.board.fields().count() as i32,
            Self::Grain => player.ledger.get(Resource::Grain) + on_fields(Resource::Grain),
            Self::Vegetables => {
                player.ledger.get(Resource::Vegetable) + on_fields(Resource::Vegetable)
            }
            Self::Sheep => player.ledger.get(Resource::Sheep),
            Self::Boar => player.ledger.get(Resource::Boar),
            Self::Cattle => player.ledger.get(Resource::Cattle),
        }
    }

    /// Points for the player in this category.
    #[must_use]
    pub fn score(self, player: &Player) -> i32 {
        weighted_threshold(self.value(player), &self.thresholds(), &POINTS)
    }
}

/// A player's final score, by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Seat index.
    pub player: usize,
    /// Threshold categories.
    pub categories: i32,
    /// Stables inside pastures, up to four.
    pub fenced_stables: i32,
    /// Penalty for unused spaces.
    pub unused_spaces: i32,
    /// Family members.
    pub family: i32,
    /// Clay and stone rooms.
    pub house: i32,
    /// Played cards.
    pub cards: i32,
    /// Penalty for begging tokens.
    pub begging: i32,
    /// Sum of everything above.
    pub total: i32,
}

/// Score `player`.
pub fn score_player(player: &Player, catalogue: &CardCatalogue) -> Result<ScoreCard> {
    let categories: i32 = Category::ALL.iter().map(|c| c.score(player)).sum();
    let fenced = player.board.stables().len() - player.board.free_stables();
    let fenced_stables = fenced.min(4) as i32;
    let unused_spaces = -(player.board.empty_spaces() as i32);
    let family = 3 * player.people();
    let per_room = match player.board.house.material {
        HouseMaterial::Wood => 0,
        HouseMaterial::Clay => 1,
        HouseMaterial::Stone => 2,
    };
    let house = per_room * player.board.rooms().len() as i32;
    let mut cards = 0;
    for id in player.played_cards() {
        cards += catalogue.get(id)?.victory_points(player);
    }
    let begging = -3 * player.ledger.begging() as i32;
    Ok(ScoreCard {
        player: player.id,
        categories,
        fenced_stables,
        unused_spaces,
        family,
        house,
        cards,
        begging,
        total: categories + fenced_stables + unused_spaces + family + house + cards + begging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Space};
    use crate::resources::ResourceMap;

    #[test]
    fn test_weighted_threshold() {
        let thresholds = [1, 4, 6, 8];
        assert_eq!(weighted_threshold(0, &thresholds, &POINTS), -1);
        assert_eq!(weighted_threshold(1, &thresholds, &POINTS), 1);
        assert_eq!(weighted_threshold(5, &thresholds, &POINTS), 2);
        assert_eq!(weighted_threshold(8, &thresholds, &POINTS), 4);
        assert_eq!(weighted_threshold(99, &thresholds, &POINTS), 4);
    }

    #[test]
    fn test_starting_farm_score() {
        let player = Player::new(
            0,
            ResourceMap::of(Resource::People, 2),
            Board::starting(3, 5, &[Space::new(0, 0), Space::new(1, 0)]),
        );
        let card = score_player(&player, &CardCatalogue::standard()).unwrap();
        assert_eq!(card.categories, -7);
        assert_eq!(card.unused_spaces, -13);
        assert_eq!(card.family, 6);
        assert_eq!(card.total, -14);
    }

    #[test]
    fn test_crops_on_fields_count_as_grain() {
        let mut player = Player::new(
            0,
            ResourceMap::of(Resource::Grain, 1),
            Board::starting(3, 5, &[Space::new(0, 0)]),
        );
        player.plow(Space::new(0, 1)).unwrap();
        player.sow(1, 0).unwrap();
        assert_eq!(Category::Grain.value(&player), 3);
        assert_eq!(Category::Fields.score(&player), 1);
    }

    #[test]
    fn test_begging_penalty() {
        let mut player = Player::new(0, ResourceMap::new(), Board::new(3, 5));
        player.ledger.pay(&ResourceMap::of(Resource::Food, 2)).unwrap();
        let card = score_player(&player, &CardCatalogue::new()).unwrap();
        assert_eq!(card.begging, -6);
    }
}
