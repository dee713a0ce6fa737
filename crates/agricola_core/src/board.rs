//! Farmyard board model.
//!
//! A fixed-shape grid (3x5 by default) holding four kinds of occupant:
//! rooms, fields, stables and pastures. Placement enforces bounds, overlap
//! and connectivity. Pricing is left to the caller: [`Board::check`] reports
//! how many new fence segments a pasture build needs so the owner can charge
//! for them before committing with [`Board::place`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, RuleError};
use crate::resources::{Resource, ResourceMap};

// ============================================================================
// Spaces and fences
// ============================================================================

/// A grid coordinate. Serialized as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct Space {
    /// Row index, from the top.
    pub row: u8,
    /// Column index, from the left.
    pub col: u8,
}

impl Space {
    /// Create a space.
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Orthogonal neighbours that do not underflow. Bounds are not checked.
    pub fn neighbours(self) -> impl Iterator<Item = Self> {
        let Self { row, col } = self;
        [
            row.checked_sub(1).map(|r| Self::new(r, col)),
            row.checked_add(1).map(|r| Self::new(r, col)),
            col.checked_sub(1).map(|c| Self::new(row, c)),
            col.checked_add(1).map(|c| Self::new(row, c)),
        ]
        .into_iter()
        .flatten()
    }

    /// The four boundary segments of this cell: top, right, bottom, left.
    #[must_use]
    pub fn edges(self) -> [Fence; 4] {
        let (r, c) = (self.row, self.col);
        [
            Fence::new((r, c), (r, c + 1)),
            Fence::new((r, c + 1), (r + 1, c + 1)),
            Fence::new((r + 1, c), (r + 1, c + 1)),
            Fence::new((r, c), (r + 1, c)),
        ]
    }
}

impl From<(u8, u8)> for Space {
    fn from((row, col): (u8, u8)) -> Self {
        Self::new(row, col)
    }
}

impl From<Space> for (u8, u8) {
    fn from(space: Space) -> Self {
        (space.row, space.col)
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A unit boundary segment between two lattice corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fence {
    /// First corner `(row, col)`, the smaller of the two.
    pub from: (u8, u8),
    /// Second corner `(row, col)`.
    pub to: (u8, u8),
}

impl Fence {
    /// Create a segment with corners in canonical order.
    #[must_use]
    pub fn new(a: (u8, u8), b: (u8, u8)) -> Self {
        if a <= b {
            Self { from: a, to: b }
        } else {
            Self { from: b, to: a }
        }
    }
}

/// Boundary segments of a set of cells: edges bordered by exactly one cell.
#[must_use]
pub fn boundary(spaces: &BTreeSet<Space>) -> BTreeSet<Fence> {
    let mut counts: BTreeMap<Fence, u8> = BTreeMap::new();
    for space in spaces {
        for edge in space.edges() {
            *counts.entry(edge).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Whether `spaces` form one orthogonally connected region. Empty sets count
/// as connected.
#[must_use]
pub fn is_connected(spaces: &BTreeSet<Space>) -> bool {
    let Some(&start) = spaces.iter().next() else {
        return true;
    };
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(space) = queue.pop_front() {
        for next in space.neighbours() {
            if spaces.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen.len() == spaces.len()
}

// ============================================================================
// Occupants
// ============================================================================

/// The four kinds of spatial occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantKind {
    /// House room.
    Room,
    /// Plowed field.
    Field,
    /// Stable.
    Stable,
    /// Fenced pasture.
    Pasture,
}

impl fmt::Display for OccupantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Room => "room",
            Self::Field => "field",
            Self::Stable => "stable",
            Self::Pasture => "pasture",
        })
    }
}

/// Something to place on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occupant {
    /// A room on one space.
    Room {
        /// Target space.
        space: Space,
    },
    /// A field on one space.
    Field {
        /// Target space.
        space: Space,
    },
    /// A stable on one space.
    Stable {
        /// Target space.
        space: Space,
    },
    /// One or more pastures built together.
    Pastures {
        /// Each inner list is one pasture.
        groups: Vec<Vec<Space>>,
    },
}

impl Occupant {
    /// Kind of this occupant.
    #[must_use]
    pub const fn kind(&self) -> OccupantKind {
        match self {
            Self::Room { .. } => OccupantKind::Room,
            Self::Field { .. } => OccupantKind::Field,
            Self::Stable { .. } => OccupantKind::Stable,
            Self::Pastures { .. } => OccupantKind::Pasture,
        }
    }
}

/// Crops that can be sown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crop {
    /// Grain, three harvests per sowing.
    Grain,
    /// Vegetable, two harvests per sowing.
    Vegetable,
}

impl Crop {
    /// Harvests yielded by one sowing.
    #[must_use]
    pub const fn initial_yield(self) -> u8 {
        match self {
            Self::Grain => 3,
            Self::Vegetable => 2,
        }
    }

    /// Resource harvested from this crop.
    #[must_use]
    pub const fn resource(self) -> Resource {
        match self {
            Self::Grain => Resource::Grain,
            Self::Vegetable => Resource::Vegetable,
        }
    }
}

/// A plowed field and whatever grows on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Location.
    pub space: Space,
    /// Planted crop, if any.
    pub crop: Option<Crop>,
    /// Harvests left before the field is empty again.
    pub remaining: u8,
}

impl Field {
    const fn empty(space: Space) -> Self {
        Self {
            space,
            crop: None,
            remaining: 0,
        }
    }

    /// Whether nothing grows here.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.crop.is_none()
    }

    /// Take one crop. Returns the crop harvested, if any.
    pub fn harvest(&mut self) -> Option<Crop> {
        let crop = self.crop?;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.crop = None;
        }
        Some(crop)
    }
}

/// A fenced pasture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pasture {
    spaces: BTreeSet<Space>,
}

impl Pasture {
    /// Spaces inside the fence.
    #[must_use]
    pub const fn spaces(&self) -> &BTreeSet<Space> {
        &self.spaces
    }

    /// Number of spaces.
    #[must_use]
    pub fn size(&self) -> usize {
        self.spaces.len()
    }

    /// Fence segments around this pasture.
    #[must_use]
    pub fn fences(&self) -> BTreeSet<Fence> {
        boundary(&self.spaces)
    }
}

// ============================================================================
// House
// ============================================================================

/// House building material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseMaterial {
    /// Wooden hut.
    Wood,
    /// Clay hut.
    Clay,
    /// Stone house.
    Stone,
}

impl HouseMaterial {
    /// Resource used to build and renovate with this material.
    #[must_use]
    pub const fn resource(self) -> Resource {
        match self {
            Self::Wood => Resource::Wood,
            Self::Clay => Resource::Clay,
            Self::Stone => Resource::Stone,
        }
    }
}

impl fmt::Display for HouseMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource().name())
    }
}

/// House material and the upgrades available from each tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct House {
    /// Current material.
    pub material: HouseMaterial,
    progression: BTreeMap<HouseMaterial, Vec<HouseMaterial>>,
}

impl Default for House {
    fn default() -> Self {
        Self {
            material: HouseMaterial::Wood,
            progression: BTreeMap::from([
                (HouseMaterial::Wood, vec![HouseMaterial::Clay]),
                (HouseMaterial::Clay, vec![HouseMaterial::Stone]),
                (HouseMaterial::Stone, Vec::new()),
            ]),
        }
    }
}

impl House {
    /// Materials reachable from the current one.
    #[must_use]
    pub fn upgrades(&self) -> &[HouseMaterial] {
        self.progression
            .get(&self.material)
            .map_or(&[], Vec::as_slice)
    }

    /// Allow upgrading directly from `from` to `to`.
    pub fn splice(&mut self, from: HouseMaterial, to: HouseMaterial) {
        let next = self.progression.entry(from).or_default();
        if !next.contains(&to) {
            next.push(to);
        }
    }
}

// ============================================================================
// Board
// ============================================================================

/// Result of a successful placement check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Placement {
    /// Fence segments the placement adds (pastures only).
    pub new_fences: BTreeSet<Fence>,
}

/// Per-space view used by snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    /// Location.
    pub space: Space,
    /// Main occupant, if any. Stables inside pastures report the pasture.
    pub occupant: Option<OccupantKind>,
    /// Whether a stable stands here.
    pub stable: bool,
    /// Crop growing here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
    /// Harvests left on the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u8>,
}

/// A player's farmyard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    rows: u8,
    cols: u8,
    rooms: BTreeSet<Space>,
    fields: BTreeMap<Space, Field>,
    stables: BTreeSet<Space>,
    pastures: Vec<Pasture>,
    /// House material and upgrade paths.
    pub house: House,
    /// Extra capacity added to every pasture.
    pub pasture_bonus: u32,
}

impl Board {
    /// Empty board of the given shape.
    #[must_use]
    pub fn new(rows: u8, cols: u8) -> Self {
        Self {
            rows,
            cols,
            rooms: BTreeSet::new(),
            fields: BTreeMap::new(),
            stables: BTreeSet::new(),
            pastures: Vec::new(),
            house: House::default(),
            pasture_bonus: 0,
        }
    }

    /// Standard starting farm: two wooden rooms on the left edge.
    #[must_use]
    pub fn starting(rows: u8, cols: u8, rooms: &[Space]) -> Self {
        let mut board = Self::new(rows, cols);
        board.rooms.extend(rooms.iter().copied());
        board
    }

    /// Board shape as `(rows, cols)`.
    #[must_use]
    pub const fn shape(&self) -> (u8, u8) {
        (self.rows, self.cols)
    }

    /// Whether `space` is on the board.
    #[must_use]
    pub const fn in_bounds(&self, space: Space) -> bool {
        space.row < self.rows && space.col < self.cols
    }

    /// Every space, row-major.
    pub fn spaces(&self) -> impl Iterator<Item = Space> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Space::new(row, col)))
    }

    /// Room spaces.
    #[must_use]
    pub const fn rooms(&self) -> &BTreeSet<Space> {
        &self.rooms
    }

    /// Fields.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Stable spaces.
    #[must_use]
    pub const fn stables(&self) -> &BTreeSet<Space> {
        &self.stables
    }

    /// Pastures in build order.
    #[must_use]
    pub fn pastures(&self) -> &[Pasture] {
        &self.pastures
    }

    /// Stables standing outside every pasture.
    #[must_use]
    pub fn free_stables(&self) -> usize {
        self.stables
            .iter()
            .filter(|space| self.pasture_at(**space).is_none())
            .count()
    }

    /// Stables inside `pasture`.
    #[must_use]
    pub fn stables_in(&self, pasture: &Pasture) -> usize {
        pasture
            .spaces
            .iter()
            .filter(|space| self.stables.contains(space))
            .count()
    }

    /// All fence segments on the board.
    #[must_use]
    pub fn fences(&self) -> BTreeSet<Fence> {
        self.pastures.iter().flat_map(Pasture::fences).collect()
    }

    /// Index of the pasture covering `space`.
    #[must_use]
    pub fn pasture_at(&self, space: Space) -> Option<usize> {
        self.pastures
            .iter()
            .position(|pasture| pasture.spaces.contains(&space))
    }

    /// Main occupant of `space`. A stable inside a pasture reports the pasture.
    #[must_use]
    pub fn occupant_at(&self, space: Space) -> Option<OccupantKind> {
        if self.rooms.contains(&space) {
            Some(OccupantKind::Room)
        } else if self.fields.contains_key(&space) {
            Some(OccupantKind::Field)
        } else if self.pasture_at(space).is_some() {
            Some(OccupantKind::Pasture)
        } else if self.stables.contains(&space) {
            Some(OccupantKind::Stable)
        } else {
            None
        }
    }

    /// Spaces holding nothing at all.
    #[must_use]
    pub fn empty_spaces(&self) -> usize {
        self.spaces()
            .filter(|space| self.occupant_at(*space).is_none())
            .count()
    }

    /// Fields with nothing growing.
    #[must_use]
    pub fn empty_fields(&self) -> usize {
        self.fields.values().filter(|field| field.is_empty()).count()
    }

    /// Read-only view of every space, row-major.
    #[must_use]
    pub fn cells(&self) -> Vec<CellView> {
        self.spaces()
            .map(|space| {
                let field = self.fields.get(&space);
                CellView {
                    space,
                    occupant: self.occupant_at(space),
                    stable: self.stables.contains(&space),
                    crop: field.and_then(|f| f.crop),
                    remaining: field.filter(|f| !f.is_empty()).map(|f| f.remaining),
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------------

    fn check_bounds(&self, space: Space) -> Result<(), PlacementError> {
        if self.in_bounds(space) {
            Ok(())
        } else {
            Err(PlacementError::OutOfBounds {
                space,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Whether `kind` may share `space` with what is already there.
    fn check_free(&self, space: Space, kind: OccupantKind) -> Result<(), PlacementError> {
        let existing = match kind {
            // A stable may stand inside a pasture, one per space.
            OccupantKind::Stable => {
                if self.stables.contains(&space) {
                    Some(OccupantKind::Stable)
                } else {
                    self.occupant_at(space)
                        .filter(|occupant| *occupant != OccupantKind::Pasture)
                }
            }
            // A pasture may enclose existing stables.
            OccupantKind::Pasture => self
                .occupant_at(space)
                .filter(|occupant| *occupant != OccupantKind::Stable),
            OccupantKind::Room | OccupantKind::Field => self.occupant_at(space),
        };
        match existing {
            Some(existing) => Err(PlacementError::Overlap { space, existing }),
            None => Ok(()),
        }
    }

    fn check_single(
        &self,
        space: Space,
        kind: OccupantKind,
        group: Option<&BTreeSet<Space>>,
    ) -> Result<(), PlacementError> {
        self.check_bounds(space)?;
        self.check_free(space, kind)?;
        if let Some(group) = group {
            let mut joined = group.clone();
            joined.insert(space);
            if !is_connected(&joined) {
                return Err(PlacementError::Disconnected { kind });
            }
        }
        Ok(())
    }

    /// Validate a placement without changing the board.
    pub fn check(&self, occupant: &Occupant) -> Result<Placement, PlacementError> {
        match occupant {
            Occupant::Room { space } => {
                self.check_single(*space, OccupantKind::Room, Some(&self.rooms))?;
                Ok(Placement::default())
            }
            Occupant::Field { space } => {
                let fields: BTreeSet<Space> = self.fields.keys().copied().collect();
                self.check_single(*space, OccupantKind::Field, Some(&fields))?;
                Ok(Placement::default())
            }
            Occupant::Stable { space } => {
                self.check_single(*space, OccupantKind::Stable, None)?;
                Ok(Placement::default())
            }
            Occupant::Pastures { groups } => self.check_pastures(groups),
        }
    }

    fn check_pastures(&self, groups: &[Vec<Space>]) -> Result<Placement, PlacementError> {
        let kind = OccupantKind::Pasture;
        if groups.is_empty() {
            return Err(PlacementError::Empty { kind });
        }

        let mut claimed: BTreeSet<Space> = BTreeSet::new();
        let mut new_fences = BTreeSet::new();
        for group in groups {
            let spaces: BTreeSet<Space> = group.iter().copied().collect();
            if spaces.is_empty() {
                return Err(PlacementError::Empty { kind });
            }
            for &space in &spaces {
                self.check_bounds(space)?;
                self.check_free(space, kind)?;
                if !claimed.insert(space) {
                    return Err(PlacementError::Overlap {
                        space,
                        existing: kind,
                    });
                }
            }
            if !is_connected(&spaces) {
                return Err(PlacementError::Disconnected { kind });
            }
            new_fences.extend(boundary(&spaces));
        }

        let mut all: BTreeSet<Space> = self
            .pastures
            .iter()
            .flat_map(|pasture| pasture.spaces.iter().copied())
            .collect();
        all.extend(claimed);
        if !is_connected(&all) {
            return Err(PlacementError::Disconnected { kind });
        }

        let existing = self.fences();
        new_fences.retain(|fence| !existing.contains(fence));
        Ok(Placement { new_fences })
    }

    /// Validate and commit a placement.
    pub fn place(&mut self, occupant: Occupant) -> Result<Placement, PlacementError> {
        let placement = self.check(&occupant)?;
        match occupant {
            Occupant::Room { space } => {
                self.rooms.insert(space);
            }
            Occupant::Field { space } => {
                self.fields.insert(space, Field::empty(space));
            }
            Occupant::Stable { space } => {
                self.stables.insert(space);
            }
            Occupant::Pastures { groups } => {
                for group in groups {
                    self.pastures.push(Pasture {
                        spaces: group.into_iter().collect(),
                    });
                }
            }
        }
        Ok(placement)
    }

    /// Spaces where a single-space occupant of `kind` could go right now.
    #[must_use]
    pub fn legal_spaces(&self, kind: OccupantKind) -> Vec<Space> {
        self.spaces()
            .filter(|&space| {
                let occupant = match kind {
                    OccupantKind::Room => Occupant::Room { space },
                    OccupantKind::Field => Occupant::Field { space },
                    OccupantKind::Stable => Occupant::Stable { space },
                    OccupantKind::Pasture => Occupant::Pastures {
                        groups: vec![vec![space]],
                    },
                };
                self.check(&occupant).is_ok()
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    /// Plant `crop` on the empty field at `space`.
    pub fn plant(&mut self, space: Space, crop: Crop) -> Result<(), PlacementError> {
        match self.fields.get_mut(&space) {
            Some(field) if field.is_empty() => {
                field.crop = Some(crop);
                field.remaining = crop.initial_yield();
                Ok(())
            }
            _ => Err(PlacementError::NoEmptyField(space)),
        }
    }

    /// Plant `grain` grain fields then `vegetable` vegetable fields on the
    /// first empty fields in board order.
    pub fn sow(&mut self, grain: u8, vegetable: u8) -> Result<(), PlacementError> {
        let empty: Vec<Space> = self
            .fields
            .values()
            .filter(|field| field.is_empty())
            .map(|field| field.space)
            .collect();
        let requested = usize::from(grain) + usize::from(vegetable);
        if requested > empty.len() {
            return Err(PlacementError::NotEnoughFields {
                requested,
                available: empty.len(),
            });
        }
        let crops = std::iter::repeat(Crop::Grain)
            .take(grain.into())
            .chain(std::iter::repeat(Crop::Vegetable).take(vegetable.into()));
        for (crop, space) in crops.zip(empty) {
            self.plant(space, crop)?;
        }
        Ok(())
    }

    /// Take one crop from the field at `space`.
    pub fn harvest(&mut self, space: Space) -> Option<Crop> {
        self.fields.get_mut(&space).and_then(Field::harvest)
    }

    /// Take one crop from every planted field.
    pub fn harvest_fields(&mut self) -> ResourceMap {
        let mut yielded = ResourceMap::new();
        for field in self.fields.values_mut() {
            if let Some(crop) = field.harvest() {
                yielded.add(crop.resource(), 1);
            }
        }
        yielded
    }

    // ------------------------------------------------------------------------
    // House
    // ------------------------------------------------------------------------

    /// Cost of renovating every room to `material`.
    pub fn renovation_cost(&self, material: HouseMaterial) -> Result<ResourceMap, RuleError> {
        if !self.house.upgrades().contains(&material) {
            return Err(RuleError::ImpossibleAction(format!(
                "cannot renovate a {} house to {material}",
                self.house.material
            )));
        }
        Ok(ResourceMap::new()
            .with(material.resource(), self.rooms.len() as i32)
            .with(Resource::Reed, 1))
    }

    /// Switch the house to `material`. The caller pays [`Self::renovation_cost`].
    pub fn upgrade_house(&mut self, material: HouseMaterial) -> Result<(), RuleError> {
        self.renovation_cost(material)?;
        self.house.material = material;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(row: u8, col: u8) -> Space {
        Space::new(row, col)
    }

    fn farm() -> Board {
        Board::starting(3, 5, &[s(0, 0), s(1, 0)])
    }

    #[test]
    fn test_single_cell_has_four_fences() {
        assert_eq!(boundary(&BTreeSet::from([s(0, 0)])).len(), 4);
        assert_eq!(boundary(&BTreeSet::from([s(0, 0), s(0, 1)])).len(), 6);
    }

    #[test]
    fn test_room_must_touch_existing_rooms() {
        let mut board = farm();
        assert_eq!(
            board.place(Occupant::Room { space: s(0, 3) }),
            Err(PlacementError::Disconnected {
                kind: OccupantKind::Room
            })
        );
        assert!(board.place(Occupant::Room { space: s(2, 0) }).is_ok());
        assert_eq!(board.rooms().len(), 3);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let board = farm();
        assert!(matches!(
            board.check(&Occupant::Stable { space: s(3, 0) }),
            Err(PlacementError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_field_cannot_overlap_room() {
        let board = farm();
        assert_eq!(
            board.check(&Occupant::Field { space: s(0, 0) }),
            Err(PlacementError::Overlap {
                space: s(0, 0),
                existing: OccupantKind::Room
            })
        );
    }

    #[test]
    fn test_stable_inside_pasture_is_allowed() {
        let mut board = farm();
        board
            .place(Occupant::Pastures {
                groups: vec![vec![s(0, 4), s(1, 4)]],
            })
            .unwrap();
        board.place(Occupant::Stable { space: s(0, 4) }).unwrap();
        assert_eq!(board.free_stables(), 0);
        assert_eq!(board.stables_in(&board.pastures()[0]), 1);
        assert!(board.place(Occupant::Stable { space: s(0, 4) }).is_err());
    }

    #[test]
    fn test_pasture_encloses_existing_stable() {
        let mut board = farm();
        board.place(Occupant::Stable { space: s(2, 4) }).unwrap();
        board
            .place(Occupant::Pastures {
                groups: vec![vec![s(2, 4)]],
            })
            .unwrap();
        assert_eq!(board.occupant_at(s(2, 4)), Some(OccupantKind::Pasture));
        assert_eq!(board.free_stables(), 0);
    }

    #[test]
    fn test_adjacent_pasture_reuses_shared_fence() {
        let mut board = farm();
        let first = board
            .place(Occupant::Pastures {
                groups: vec![vec![s(0, 4)]],
            })
            .unwrap();
        assert_eq!(first.new_fences.len(), 4);
        let second = board
            .place(Occupant::Pastures {
                groups: vec![vec![s(1, 4)]],
            })
            .unwrap();
        assert_eq!(second.new_fences.len(), 3);
        assert_eq!(board.fences().len(), 7);
    }

    #[test]
    fn test_pasture_groups_must_be_internally_connected() {
        let board = farm();
        assert_eq!(
            board.check(&Occupant::Pastures {
                groups: vec![vec![s(0, 2), s(0, 4)]],
            }),
            Err(PlacementError::Disconnected {
                kind: OccupantKind::Pasture
            })
        );
    }

    #[test]
    fn test_field_lifecycle() {
        let mut board = farm();
        board.place(Occupant::Field { space: s(0, 1) }).unwrap();
        board.plant(s(0, 1), Crop::Vegetable).unwrap();
        assert!(board.plant(s(0, 1), Crop::Grain).is_err());
        assert_eq!(board.harvest(s(0, 1)), Some(Crop::Vegetable));
        assert_eq!(board.harvest(s(0, 1)), Some(Crop::Vegetable));
        assert_eq!(board.harvest(s(0, 1)), None);
        assert_eq!(board.empty_fields(), 1);
    }

    #[test]
    fn test_sow_needs_enough_fields() {
        let mut board = farm();
        board.place(Occupant::Field { space: s(0, 1) }).unwrap();
        assert!(board.clone().sow(1, 0).is_ok());
        assert!(board.sow(1, 1).is_err());
    }

    #[test]
    fn test_house_progression_and_splice() {
        let mut board = farm();
        assert!(board.renovation_cost(HouseMaterial::Stone).is_err());
        board.house.splice(HouseMaterial::Wood, HouseMaterial::Stone);
        let cost = board.renovation_cost(HouseMaterial::Stone).unwrap();
        assert_eq!(cost.get(Resource::Stone), 2);
        assert_eq!(cost.get(Resource::Reed), 1);
        board.upgrade_house(HouseMaterial::Stone).unwrap();
        assert!(board.house.upgrades().is_empty());
    }

    #[test]
    fn test_space_serializes_as_pair() {
        let encoded = ron::to_string(&s(1, 2)).unwrap();
        assert_eq!(encoded, "(1,2)");
    }
}
