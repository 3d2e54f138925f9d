//! Carrier storage and straight-line integration.

use glam::Vec2;
use linkwar_core::{CarrierId, CarrierSnapshot, Owner, TowerId};

/// Single unit in transit between two towers.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Carrier {
    pub(crate) id: CarrierId,
    pub(crate) position: Vec2,
    /// World units per second, fixed at spawn.
    velocity: Vec2,
    pub(crate) owner: Owner,
    pub(crate) source: TowerId,
    pub(crate) target: TowerId,
    pub(crate) alive: bool,
}

impl Carrier {
    pub(crate) fn integrate(&mut self, dt_secs: f32) {
        self.position += self.velocity * dt_secs;
    }

    /// Reports whether the carrier reached `target_center`.
    ///
    /// A carrier that moved past the center along its heading counts as
    /// arrived even if a large step carried it outside `radius`.
    pub(crate) fn has_arrived(&self, target_center: Vec2, radius: f32) -> bool {
        let to_target = target_center - self.position;
        to_target.length() <= radius || to_target.dot(self.velocity) < 0.0
    }

    pub(crate) fn snapshot(&self) -> CarrierSnapshot {
        CarrierSnapshot {
            id: self.id,
            position: self.position,
            owner: self.owner,
            source: self.source,
            target: self.target,
        }
    }
}

/// Every carrier spawned this match, ordered by identifier.
///
/// Destroyed carriers linger until [`CarrierSet::sweep`] so that arrival
/// resolution can recognise them.
#[derive(Debug, Default)]
pub(crate) struct CarrierSet {
    carriers: Vec<Carrier>,
    next_id: u32,
}

impl CarrierSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Spawns a carrier at `from` heading for `to` at `speed` units per second.
    pub(crate) fn spawn(
        &mut self,
        from: Vec2,
        to: Vec2,
        speed: f32,
        owner: Owner,
        source: TowerId,
        target: TowerId,
    ) -> CarrierId {
        let id = CarrierId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.carriers.push(Carrier {
            id,
            position: from,
            velocity: (to - from).normalize_or_zero() * speed,
            owner,
            source,
            target,
            alive: true,
        });
        id
    }

    pub(crate) fn get(&self, id: CarrierId) -> Option<&Carrier> {
        self.carriers
            .binary_search_by_key(&id, |carrier| carrier.id)
            .ok()
            .map(|index| &self.carriers[index])
    }

    /// Marks a carrier dead. Returns `false` when it was already dead or unknown.
    pub(crate) fn destroy(&mut self, id: CarrierId) -> bool {
        let Ok(index) = self.carriers.binary_search_by_key(&id, |carrier| carrier.id) else {
            return false;
        };
        let carrier = &mut self.carriers[index];
        let was_alive = carrier.alive;
        carrier.alive = false;
        was_alive
    }

    /// Marks every live carrier emitted by `source` dead, returning their ids.
    pub(crate) fn destroy_from(&mut self, source: TowerId) -> Vec<CarrierId> {
        let mut destroyed = Vec::new();
        for carrier in self
            .carriers
            .iter_mut()
            .filter(|carrier| carrier.alive && carrier.source == source)
        {
            carrier.alive = false;
            destroyed.push(carrier.id);
        }
        destroyed
    }

    /// Drops dead carriers.
    pub(crate) fn sweep(&mut self) {
        self.carriers.retain(|carrier| carrier.alive);
    }

    /// Live carriers in identifier order.
    pub(crate) fn live(&self) -> impl Iterator<Item = &Carrier> {
        self.carriers.iter().filter(|carrier| carrier.alive)
    }

    pub(crate) fn live_mut(&mut self) -> impl Iterator<Item = &mut Carrier> {
        self.carriers.iter_mut().filter(|carrier| carrier.alive)
    }
}
