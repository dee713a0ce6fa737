//! Resource ledger.
//!
//! Every player owns one [`Ledger`]: a set of non-negative counters plus a
//! begging-token count. All mutation goes through [`Ledger::apply`], which is
//! all-or-nothing.
//!
//! Food is the only resource with a soft failure: when a cost asks for more
//! food than the player holds, the shortfall is recorded as begging tokens
//! and the transaction still commits.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

// ============================================================================
// Resource kinds
// ============================================================================

/// A counter tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Food.
    Food,
    /// Wood.
    Wood,
    /// Clay.
    Clay,
    /// Stone.
    Stone,
    /// Reed.
    Reed,
    /// Grain.
    Grain,
    /// Vegetable.
    Vegetable,
    /// Sheep.
    Sheep,
    /// Wild boar.
    Boar,
    /// Cattle.
    Cattle,
    /// Fence segments still in the player's supply.
    FencesAvailable,
    /// Stables still in the player's supply.
    StablesAvailable,
    /// Family members on the farm.
    People,
    /// Family members not yet born.
    PeopleAvailable,
}

impl Resource {
    /// Every resource, in ledger order.
    pub const ALL: [Self; 14] = [
        Self::Food,
        Self::Wood,
        Self::Clay,
        Self::Stone,
        Self::Reed,
        Self::Grain,
        Self::Vegetable,
        Self::Sheep,
        Self::Boar,
        Self::Cattle,
        Self::FencesAvailable,
        Self::StablesAvailable,
        Self::People,
        Self::PeopleAvailable,
    ];

    /// Animal species, in breeding order.
    pub const ANIMALS: [Self; 3] = [Self::Sheep, Self::Boar, Self::Cattle];

    /// Snake-case name used in messages and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Wood => "wood",
            Self::Clay => "clay",
            Self::Stone => "stone",
            Self::Reed => "reed",
            Self::Grain => "grain",
            Self::Vegetable => "vegetable",
            Self::Sheep => "sheep",
            Self::Boar => "boar",
            Self::Cattle => "cattle",
            Self::FencesAvailable => "fences_available",
            Self::StablesAvailable => "stables_available",
            Self::People => "people",
            Self::PeopleAvailable => "people_available",
        }
    }

    /// Whether this resource is an animal species.
    #[must_use]
    pub const fn is_animal(self) -> bool {
        matches!(self, Self::Sheep | Self::Boar | Self::Cattle)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Resource maps
// ============================================================================

/// Sparse mapping from resource to amount. Zero entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceMap(BTreeMap<Resource, i32>);

impl ResourceMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Map holding a single entry.
    #[must_use]
    pub fn of(resource: Resource, amount: i32) -> Self {
        Self::new().with(resource, amount)
    }

    /// Builder: add `amount` of `resource`.
    #[must_use]
    pub fn with(mut self, resource: Resource, amount: i32) -> Self {
        self.add(resource, amount);
        self
    }

    /// Amount of `resource` (zero when absent).
    #[must_use]
    pub fn get(&self, resource: Resource) -> i32 {
        self.0.get(&resource).copied().unwrap_or(0)
    }

    /// Add `amount` (may be negative) to `resource`.
    pub fn add(&mut self, resource: Resource, amount: i32) {
        let total = self.get(resource) + amount;
        if total == 0 {
            self.0.remove(&resource);
        } else {
            self.0.insert(resource, total);
        }
    }

    /// Overwrite the amount of `resource`.
    pub fn set(&mut self, resource: Resource, amount: i32) {
        if amount == 0 {
            self.0.remove(&resource);
        } else {
            self.0.insert(resource, amount);
        }
    }

    /// Add every entry of `other` to this map.
    pub fn merge(&mut self, other: &Self) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Sum of two maps.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Difference of two maps.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (resource, amount) in other.iter() {
            out.add(resource, -amount);
        }
        out
    }

    /// Every entry multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: i32) -> Self {
        let mut out = Self::new();
        for (resource, amount) in self.iter() {
            out.add(resource, amount * factor);
        }
        out
    }

    /// Whether no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        self.0.iter().map(|(resource, amount)| (*resource, *amount))
    }
}

impl FromIterator<(Resource, i32)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (Resource, i32)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (resource, amount) in iter {
            map.add(resource, amount);
        }
        map
    }
}

impl fmt::Display for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("nothing");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(resource, amount)| format!("{amount:+} {resource}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Receipt {
    /// Begging tokens issued to cover a food shortfall.
    pub begged: u32,
}

/// A player's resource counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ledger {
    counts: ResourceMap,
    begging: u32,
}

impl Ledger {
    /// Create a ledger holding `initial`.
    #[must_use]
    pub fn new(initial: ResourceMap) -> Self {
        Self {
            counts: initial,
            begging: 0,
        }
    }

    /// Current amount of `resource`.
    #[must_use]
    pub fn get(&self, resource: Resource) -> i32 {
        self.counts.get(resource)
    }

    /// All counters.
    #[must_use]
    pub const fn counts(&self) -> &ResourceMap {
        &self.counts
    }

    /// Begging tokens accumulated so far.
    #[must_use]
    pub const fn begging(&self) -> u32 {
        self.begging
    }

    /// Animal counts only.
    #[must_use]
    pub fn animals(&self) -> ResourceMap {
        Resource::ANIMALS
            .iter()
            .map(|&animal| (animal, self.get(animal)))
            .collect()
    }

    /// Whether `cost` can be paid in full without begging.
    #[must_use]
    pub fn can_afford(&self, cost: &ResourceMap) -> bool {
        cost.iter()
            .all(|(resource, amount)| self.get(resource) >= amount)
    }

    /// Apply a transaction.
    ///
    /// `prereq` entries must be held but are not consumed. `cost` entries are
    /// subtracted. `change` entries are added and may be negative. Either all
    /// of it commits or nothing does.
    pub fn apply(
        &mut self,
        cost: &ResourceMap,
        prereq: &ResourceMap,
        change: &ResourceMap,
    ) -> Result<Receipt, RuleError> {
        for (resource, required) in prereq.iter() {
            let available = self.get(resource);
            if available < required {
                return Err(RuleError::InsufficientResources {
                    resource,
                    required,
                    available,
                });
            }
        }

        let mut next = self.counts.clone();
        let mut begged = 0;
        for (resource, required) in cost.iter() {
            let available = next.get(resource);
            if available >= required {
                continue;
            }
            if resource == Resource::Food {
                begged = (required - available) as u32;
                next.set(Resource::Food, required);
            } else {
                return Err(RuleError::InsufficientResources {
                    resource,
                    required,
                    available,
                });
            }
        }

        for (resource, amount) in cost.iter() {
            next.add(resource, -amount);
        }
        next.merge(change);

        if let Some((resource, _)) = next.iter().find(|(_, amount)| *amount < 0) {
            let available = self.get(resource);
            return Err(RuleError::InsufficientResources {
                resource,
                required: available - next.get(resource),
                available,
            });
        }

        self.counts = next;
        self.begging += begged;
        if begged > 0 {
            tracing::debug!(begged, "food shortfall covered by begging");
        }
        Ok(Receipt { begged })
    }

    /// Pay `cost` (with food begging).
    pub fn pay(&mut self, cost: &ResourceMap) -> Result<Receipt, RuleError> {
        self.apply(cost, &ResourceMap::new(), &ResourceMap::new())
    }

    /// Add `change` (entries may be negative).
    pub fn grant(&mut self, change: &ResourceMap) -> Result<Receipt, RuleError> {
        self.apply(&ResourceMap::new(), &ResourceMap::new(), change)
    }
}
