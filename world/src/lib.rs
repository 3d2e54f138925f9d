#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Linkwar.
//!
//! The world owns every tower, link, carrier and obstacle of a match. Nothing
//! outside this crate mutates them: adapters and systems submit
//! [`Command`] values through [`apply`] and observe the resulting [`Event`]
//! stream plus the read-only [`query`] surface.

mod carriers;
mod links;
mod towers;

use glam::Vec2;
use linkwar_core::{
    geometry::segment_intersects_rect, Balance, CarrierId, CarrierSnapshot, Command, Event,
    LinkRejection, LinkRemoval, Owner, Rect, TowerId,
};
use linkwar_system_edge_collision::{Annihilation, EdgeCollision};
use tracing::{debug, info};

use carriers::CarrierSet;
use links::{LinkRegistry, LinkRequest};
use towers::{Hit, TowerRegistry};

/// Represents the authoritative Linkwar world state.
#[derive(Debug)]
pub struct World {
    balance: Balance,
    towers: TowerRegistry,
    links: LinkRegistry,
    carriers: CarrierSet,
    obstacles: Vec<Rect>,
    edge_collision: EdgeCollision,
    carrier_scratch: Vec<CarrierSnapshot>,
    annihilation_scratch: Vec<Annihilation>,
    arrival_scratch: Vec<CarrierId>,
    concluded: bool,
}

impl World {
    /// Creates an empty world governed by the provided balance.
    #[must_use]
    pub fn new(balance: Balance) -> Self {
        Self {
            balance,
            towers: TowerRegistry::new(),
            links: LinkRegistry::new(),
            carriers: CarrierSet::new(),
            obstacles: Vec::new(),
            edge_collision: EdgeCollision::new(),
            carrier_scratch: Vec::new(),
            annihilation_scratch: Vec::new(),
            arrival_scratch: Vec::new(),
            concluded: false,
        }
    }

    fn request_link(&mut self, from: TowerId, to: TowerId, out_events: &mut Vec<Event>) {
        if let Some(reason) = self.link_rejection(from, to) {
            debug!(from = from.get(), to = to.get(), ?reason, "link rejected");
            out_events.push(Event::LinkRejected { from, to, reason });
            return;
        }

        let units = self.towers.get(from).map_or(0, |tower| tower.units);
        let slots = self.balance.max_concurrent_targets(units);
        match self.links.request(from, to, slots) {
            LinkRequest::Unchanged => {}
            LinkRequest::Reactivated => {
                debug!(from = from.get(), to = to.get(), "link reactivated");
                out_events.push(Event::LinkReactivated { from, to });
            }
            LinkRequest::Created { reversed } => {
                if reversed {
                    debug!(from = to.get(), to = from.get(), "link reversed");
                    out_events.push(Event::LinkRemoved {
                        from: to,
                        to: from,
                        reason: LinkRemoval::Reversed,
                    });
                }
                debug!(from = from.get(), to = to.get(), "link created");
                out_events.push(Event::LinkCreated { from, to });
            }
            LinkRequest::AtCapacity => {
                let reason = LinkRejection::AtCapacity;
                debug!(from = from.get(), to = to.get(), ?reason, "link rejected");
                out_events.push(Event::LinkRejected { from, to, reason });
            }
        }
    }

    fn link_rejection(&self, from: TowerId, to: TowerId) -> Option<LinkRejection> {
        if from == to {
            return Some(LinkRejection::SameTower);
        }
        let (Some(a), Some(b)) = (self.towers.center(from), self.towers.center(to)) else {
            return Some(LinkRejection::MissingTower);
        };
        if !is_clear_path(&self.obstacles, a, b) {
            return Some(LinkRejection::Obstructed);
        }
        None
    }

    fn tick(&mut self, dt_ms: f32, out_events: &mut Vec<Event>) {
        self.generate_units(dt_ms);
        self.move_carriers(dt_ms, out_events);
        self.update_links(dt_ms, out_events);
        self.resolve_collisions(out_events);
        self.resolve_arrivals(out_events);
        self.carriers.sweep();
        self.check_conclusion(out_events);
    }

    fn generate_units(&mut self, dt_ms: f32) {
        let period = self.balance.generation_period_ms();
        for tower in self.towers.iter_mut() {
            tower.generate(dt_ms, period);
        }
    }

    fn move_carriers(&mut self, dt_ms: f32, out_events: &mut Vec<Event>) {
        let dt_secs = dt_ms / 1_000.0;
        let arena = self.balance.arena;
        let radius = self.balance.tower_radius;
        let towers = &self.towers;
        for carrier in self.carriers.live_mut() {
            carrier.integrate(dt_secs);
            // An overshoot past the target resolves as an arrival, not a loss.
            let arrived = towers
                .center(carrier.target)
                .is_some_and(|center| carrier.has_arrived(center, radius));
            if !arrived && !arena.contains(carrier.position) {
                carrier.alive = false;
                out_events.push(Event::CarrierLost {
                    carrier: carrier.id,
                });
            }
        }
    }

    fn update_links(&mut self, dt_ms: f32, out_events: &mut Vec<Event>) {
        for link in self.links.iter_mut() {
            if !link.active {
                continue;
            }
            let (Some(a), Some(b)) = (self.towers.center(link.from), self.towers.center(link.to))
            else {
                continue;
            };
            if !is_clear_path(&self.obstacles, a, b) {
                continue;
            }
            let Some(source) = self.towers.get_mut(link.from) else {
                continue;
            };

            let interval = self.balance.emission_interval_ms(source.units);
            if !link.advance(dt_ms, interval, source.units) || !source.spend() {
                continue;
            }

            let owner = source.owner;
            let carrier = self.carriers.spawn(
                a,
                b,
                self.balance.move_speed,
                owner,
                link.from,
                link.to,
            );
            out_events.push(Event::CarrierEmitted {
                carrier,
                from: link.from,
                to: link.to,
                owner,
            });
        }
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        self.carrier_scratch.clear();
        self.carrier_scratch
            .extend(self.carriers.live().map(|carrier| carrier.snapshot()));

        self.annihilation_scratch.clear();
        let towers = &self.towers;
        self.edge_collision.handle(
            &self.carrier_scratch,
            |tower| towers.center(tower),
            self.balance.meeting_distance,
            &mut self.annihilation_scratch,
        );

        for pair in &self.annihilation_scratch {
            let forward = self.carriers.destroy(pair.forward);
            let backward = self.carriers.destroy(pair.backward);
            if forward && backward {
                out_events.push(Event::CarriersAnnihilated {
                    forward: pair.forward,
                    backward: pair.backward,
                });
            }
        }
    }

    fn resolve_arrivals(&mut self, out_events: &mut Vec<Event>) {
        let radius = self.balance.tower_radius;
        self.arrival_scratch.clear();
        for carrier in self.carriers.live() {
            let Some(center) = self.towers.center(carrier.target) else {
                continue;
            };
            if carrier.has_arrived(center, radius) {
                self.arrival_scratch.push(carrier.id);
            }
        }

        let arrived = std::mem::take(&mut self.arrival_scratch);
        for carrier in &arrived {
            self.resolve_arrival(*carrier, out_events);
        }
        self.arrival_scratch = arrived;
    }

    /// Applies an arrived carrier to its target tower.
    ///
    /// Dead or unknown carriers are ignored, so resolving the same carrier
    /// twice changes nothing.
    fn resolve_arrival(&mut self, id: CarrierId, out_events: &mut Vec<Event>) {
        let Some(carrier) = self.carriers.get(id).copied() else {
            return;
        };
        if !carrier.alive || !self.carriers.destroy(id) {
            return;
        }
        let Some(tower) = self.towers.get_mut(carrier.target) else {
            return;
        };

        if tower.owner == carrier.owner {
            if tower.reinforce() {
                out_events.push(Event::TowerReinforced {
                    tower: tower.id,
                    units: tower.units,
                });
            } else {
                self.forward_overflow(id, carrier.target, carrier.owner, out_events);
            }
            return;
        }

        match tower.strike(carrier.owner) {
            Hit::Depleted { units } => out_events.push(Event::TowerAttacked {
                tower: carrier.target,
                units,
            }),
            Hit::Captured { previous } => {
                self.capture(carrier.target, previous, carrier.owner, out_events);
            }
        }
    }

    fn forward_overflow(
        &mut self,
        arrived: CarrierId,
        via: TowerId,
        owner: Owner,
        out_events: &mut Vec<Event>,
    ) {
        let towers = &self.towers;
        let next = self
            .links
            .primary_target(via, |tower| towers.center(tower))
            .and_then(|next| Some((next, towers.center(via)?, towers.center(next)?)))
            .filter(|(_, a, b)| is_clear_path(&self.obstacles, *a, *b));

        match next {
            Some((to, a, b)) => {
                let carrier = self
                    .carriers
                    .spawn(a, b, self.balance.move_speed, owner, via, to);
                out_events.push(Event::CarrierForwarded {
                    arrived,
                    carrier,
                    via,
                    to,
                });
            }
            None => out_events.push(Event::CarrierAbsorbed {
                carrier: arrived,
                tower: via,
            }),
        }
    }

    fn capture(
        &mut self,
        tower: TowerId,
        previous: Owner,
        owner: Owner,
        out_events: &mut Vec<Event>,
    ) {
        info!(tower = tower.get(), ?previous, ?owner, "tower captured");
        out_events.push(Event::TowerCaptured {
            tower,
            previous,
            owner,
        });

        for to in self.links.remove_outgoing(tower) {
            debug!(from = tower.get(), to = to.get(), "link removed after capture");
            out_events.push(Event::LinkRemoved {
                from: tower,
                to,
                reason: LinkRemoval::SourceCaptured,
            });
        }

        let destroyed = self.carriers.destroy_from(tower);
        debug!(
            tower = tower.get(),
            carriers = destroyed.len(),
            "in-flight carriers of captured tower destroyed"
        );
    }

    fn check_conclusion(&mut self, out_events: &mut Vec<Event>) {
        if self.concluded || self.towers.is_empty() {
            return;
        }
        let owners = self.towers.owners();
        if owners.len() != 1 {
            return;
        }
        if let Some(winner) = owners.into_iter().next() {
            info!(?winner, "match concluded");
            self.concluded = true;
            out_events.push(Event::MatchConcluded { winner });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Balance::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::PlaceTower {
            position,
            owner,
            units,
        } => {
            let tower = world
                .towers
                .insert(position, owner, units, world.balance.max_units);
            let units = world.towers.get(tower).map_or(0, |placed| placed.units);
            world.concluded = false;
            out_events.push(Event::TowerPlaced {
                tower,
                owner,
                units,
            });
        }
        Command::PlaceObstacle { rect } => {
            world.obstacles.push(rect);
            out_events.push(Event::ObstaclePlaced { rect });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.tick(dt.as_secs_f32() * 1_000.0, out_events);
        }
        Command::RequestLink { from, to } => world.request_link(from, to, out_events),
        Command::CutLink { from, to } => {
            if world.links.remove(from, to) {
                debug!(from = from.get(), to = to.get(), "link cut");
                out_events.push(Event::LinkRemoved {
                    from,
                    to,
                    reason: LinkRemoval::Cut,
                });
            }
        }
        Command::SuspendLink { from, to } => {
            if world.links.suspend(from, to) {
                debug!(from = from.get(), to = to.get(), "link suspended");
                out_events.push(Event::LinkSuspended { from, to });
            }
        }
    }
}

fn is_clear_path(obstacles: &[Rect], a: Vec2, b: Vec2) -> bool {
    !obstacles
        .iter()
        .any(|rect| segment_intersects_rect(a, b, rect))
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use glam::Vec2;
    use linkwar_core::{
        Balance, CarrierView, FactionId, LinkSnapshot, LinkView, MatchOutcome, Owner, Rect,
        TowerId, TowerSnapshot, TowerView,
    };

    use super::World;

    /// Extra reach granted to pointer hit-testing beyond the tower radius.
    const HIT_SLOP: f32 = 8.0;

    /// Balance the world was created with.
    #[must_use]
    pub fn balance(world: &World) -> &Balance {
        &world.balance
    }

    /// Captures a read-only view of every tower, sorted by identifier.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                position: tower.position,
                owner: tower.owner,
                units: tower.units,
                max_units: tower.max_units,
                attack_slots: world.balance.max_concurrent_targets(tower.units),
                active_targets: world.links.active_outgoing_count(tower.id),
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Captures every registered link in registry order.
    #[must_use]
    pub fn link_view(world: &World) -> LinkView {
        let snapshots = world
            .links
            .iter()
            .filter_map(|link| {
                let source = world.towers.get(link.from)?;
                let to_center = world.towers.center(link.to)?;
                Some(LinkSnapshot {
                    from: link.from,
                    to: link.to,
                    from_center: source.position,
                    to_center,
                    source_owner: source.owner,
                    active: link.active,
                    clear: super::is_clear_path(&world.obstacles, source.position, to_center),
                    flow_phase: link.flow_phase,
                })
            })
            .collect();
        LinkView::from_snapshots(snapshots)
    }

    /// Captures every carrier in flight, sorted by identifier.
    #[must_use]
    pub fn carrier_view(world: &World) -> CarrierView {
        CarrierView::from_snapshots(
            world
                .carriers
                .live()
                .map(|carrier| carrier.snapshot())
                .collect(),
        )
    }

    /// Obstacles in placement order.
    #[must_use]
    pub fn obstacles(world: &World) -> &[Rect] {
        &world.obstacles
    }

    /// Reports whether the straight segment `a→b` avoids every obstacle.
    #[must_use]
    pub fn is_clear_path(world: &World, a: Vec2, b: Vec2) -> bool {
        super::is_clear_path(&world.obstacles, a, b)
    }

    /// Distinct owners across every tower.
    #[must_use]
    pub fn owners(world: &World) -> BTreeSet<Owner> {
        world.towers.owners()
    }

    /// Result of the match from the perspective of `faction`.
    #[must_use]
    pub fn outcome(world: &World, faction: FactionId) -> MatchOutcome {
        let owners = world.towers.owners();
        let mut remaining = owners.iter();
        match (remaining.next(), remaining.next()) {
            (Some(Owner::Faction(winner)), None) if *winner == faction => MatchOutcome::Victory,
            (Some(_), None) => MatchOutcome::Defeat,
            _ => MatchOutcome::InProgress,
        }
    }

    /// Tower nearest to `point` within hit range, if any.
    #[must_use]
    pub fn tower_at(world: &World, point: Vec2) -> Option<TowerId> {
        let reach = world.balance.tower_radius + HIT_SLOP;
        world
            .towers
            .iter()
            .map(|tower| (tower.position.distance(point), tower.id))
            .filter(|(distance, _)| *distance <= reach)
            .min_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0).then(lhs.1.cmp(&rhs.1)))
            .map(|(_, tower)| tower)
    }
}
