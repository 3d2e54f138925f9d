//! Authoritative tower state management utilities.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use linkwar_core::{Owner, TowerId};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Center of the tower in world units.
    pub(crate) position: Vec2,
    /// Current owner.
    pub(crate) owner: Owner,
    /// Units currently held, never above `max_units`.
    pub(crate) units: u32,
    /// Unit cap of the tower.
    pub(crate) max_units: u32,
    /// Milliseconds accumulated toward the next generated unit.
    generation: f32,
}

/// Result of a hostile carrier striking a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Hit {
    /// The tower lost a unit and kept its owner.
    Depleted {
        /// Units left after the hit.
        units: u32,
    },
    /// The tower had no units left and changed hands.
    Captured {
        /// Owner before the capture.
        previous: Owner,
    },
}

impl Tower {
    fn new(id: TowerId, position: Vec2, owner: Owner, units: u32, max_units: u32) -> Self {
        Self {
            id,
            position,
            owner,
            units: units.min(max_units),
            max_units,
            generation: 0.0,
        }
    }

    /// Accumulates generation time and adds every unit it pays for at once.
    ///
    /// Neutral towers never generate. `period_ms` of `None` disables
    /// generation entirely.
    pub(crate) fn generate(&mut self, dt_ms: f32, period_ms: Option<f32>) {
        if self.owner.is_neutral() {
            return;
        }
        let Some(period) = period_ms else {
            return;
        };

        self.generation += dt_ms;
        if self.generation >= period {
            let batches = (self.generation / period).floor();
            self.units = self
                .units
                .saturating_add(batches as u32)
                .min(self.max_units);
            self.generation -= batches * period;
        }
    }

    /// Spends one unit on an emission. Returns `false` when the tower is empty.
    pub(crate) fn spend(&mut self) -> bool {
        match self.units.checked_sub(1) {
            Some(units) => {
                self.units = units;
                true
            }
            None => false,
        }
    }

    /// Adds one unit below the cap. Returns `false` when the tower is full.
    pub(crate) fn reinforce(&mut self) -> bool {
        if self.units < self.max_units {
            self.units += 1;
            true
        } else {
            false
        }
    }

    /// Applies one hostile unit.
    ///
    /// Dropping below zero hands the tower to `attacker`; a captured tower
    /// always starts at one unit regardless of overkill.
    pub(crate) fn strike(&mut self, attacker: Owner) -> Hit {
        match self.units.checked_sub(1) {
            Some(units) => {
                self.units = units;
                Hit::Depleted { units }
            }
            None => {
                let previous = self.owner;
                self.owner = attacker;
                self.units = 1.min(self.max_units);
                Hit::Captured { previous }
            }
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Registers a tower and returns its freshly allocated identifier.
    pub(crate) fn insert(
        &mut self,
        position: Vec2,
        owner: Owner,
        units: u32,
        max_units: u32,
    ) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, Tower::new(id, position, owner, units, max_units));
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    /// Center of the tower, if it exists.
    pub(crate) fn center(&self, id: TowerId) -> Option<Vec2> {
        self.entries.get(&id).map(|tower| tower.position)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct owners across every tower.
    pub(crate) fn owners(&self) -> BTreeSet<Owner> {
        self.entries.values().map(|tower| tower.owner).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkwar_core::FactionId;

    const BLUE: Owner = Owner::Faction(FactionId::new(0));
    const RED: Owner = Owner::Faction(FactionId::new(1));

    fn tower(owner: Owner, units: u32) -> Tower {
        Tower::new(TowerId::new(0), Vec2::ZERO, owner, units, 60)
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(Vec2::ZERO, BLUE, 5, 60);
        let second = registry.insert(Vec2::ONE, RED, 5, 60);

        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert_eq!(registry.center(second), Some(Vec2::ONE));
        assert_eq!(registry.owners().len(), 2);
    }

    #[test]
    fn starting_units_are_clamped_to_the_cap() {
        let mut registry = TowerRegistry::new();
        let id = registry.insert(Vec2::ZERO, BLUE, 500, 60);
        assert_eq!(registry.get(id).map(|tower| tower.units), Some(60));
    }

    #[test]
    fn large_delta_generates_in_one_batch() {
        let mut tower = tower(BLUE, 0);
        tower.generate(4_500.0, Some(1_000.0));

        assert_eq!(tower.units, 4);
        assert!((tower.generation - 500.0).abs() < 1e-3);
    }

    #[test]
    fn generation_saturates_at_the_cap() {
        let mut tower = tower(BLUE, 59);
        tower.generate(10_000_000.0, Some(1.0));
        assert_eq!(tower.units, 60);
    }

    #[test]
    fn neutral_towers_never_generate() {
        let mut tower = tower(Owner::Neutral, 3);
        tower.generate(60_000.0, Some(1_000.0));

        assert_eq!(tower.units, 3);
        assert_eq!(tower.generation, 0.0);
    }

    #[test]
    fn disabled_generation_keeps_units() {
        let mut tower = tower(BLUE, 3);
        tower.generate(60_000.0, None);
        assert_eq!(tower.units, 3);
    }

    #[test]
    fn empty_tower_cannot_spend() {
        let mut tower = tower(BLUE, 0);
        assert!(!tower.spend());
        assert_eq!(tower.units, 0);
    }

    #[test]
    fn reinforcement_stops_at_the_cap() {
        let mut tower = tower(BLUE, 59);
        assert!(tower.reinforce());
        assert!(!tower.reinforce());
        assert_eq!(tower.units, 60);
    }

    #[test]
    fn strike_below_zero_captures_with_a_single_unit() {
        let mut tower = tower(RED, 1);

        assert_eq!(tower.strike(BLUE), Hit::Depleted { units: 0 });
        assert_eq!(tower.owner, RED);
        assert_eq!(tower.strike(BLUE), Hit::Captured { previous: RED });
        assert_eq!(tower.owner, BLUE);
        assert_eq!(tower.units, 1);
    }
}
