#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that pairs opposing carriers travelling along the same edge.
//!
//! Carriers are bucketed by the unordered pair of towers they travel
//! between. Within a bucket the lower tower identifier is the canonical
//! `A` end; carriers leaving `A` travel forward, carriers leaving `B` travel
//! backward. Each carrier is reduced to its clamped progress `t` along
//! `A→B`, and the two fronts are matched with a pair of pointers instead of
//! testing every carrier against every other.

use std::collections::BTreeMap;

use glam::Vec2;
use linkwar_core::{geometry::progress_along, CarrierId, CarrierSnapshot, TowerId};

/// Two carriers that met and must both be destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Annihilation {
    /// Carrier travelling from the lower to the higher tower identifier.
    pub forward: CarrierId,
    /// Carrier travelling from the higher to the lower tower identifier.
    pub backward: CarrierId,
}

/// Edge collision system that reuses per-edge buckets across ticks.
#[derive(Debug, Default)]
pub struct EdgeCollision {
    buckets: BTreeMap<(TowerId, TowerId), EdgeBucket>,
}

impl EdgeCollision {
    /// Creates a new edge collision system with empty buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every meeting pair among `carriers` to `out`.
    ///
    /// `tower_center` resolves tower identifiers to world-space centers;
    /// carriers whose towers cannot be resolved are ignored. Two carriers
    /// meet once the along-edge distance between them is at most
    /// `meeting_distance`. A carrier appears in at most one pair.
    pub fn handle<F>(
        &mut self,
        carriers: &[CarrierSnapshot],
        tower_center: F,
        meeting_distance: f32,
        out: &mut Vec<Annihilation>,
    ) where
        F: Fn(TowerId) -> Option<Vec2>,
    {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }

        for carrier in carriers {
            if carrier.source == carrier.target {
                continue;
            }

            let key = canonical_edge(carrier.source, carrier.target);
            let Some(a) = tower_center(key.0) else {
                continue;
            };
            let Some(b) = tower_center(key.1) else {
                continue;
            };

            let bucket = self.buckets.entry(key).or_default();
            bucket.length = a.distance(b);
            let entry = Progress {
                t: progress_along(carrier.position, a, b),
                id: carrier.id,
            };
            if carrier.source == key.0 {
                bucket.forward.push(entry);
            } else {
                bucket.backward.push(entry);
            }
        }

        for bucket in self.buckets.values_mut() {
            bucket.resolve(meeting_distance, out);
        }

        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }
}

fn canonical_edge(first: TowerId, second: TowerId) -> (TowerId, TowerId) {
    if first <= second {
        (first, second)
    } else {
        (second, first)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Progress {
    t: f32,
    id: CarrierId,
}

#[derive(Debug, Default)]
struct EdgeBucket {
    length: f32,
    forward: Vec<Progress>,
    backward: Vec<Progress>,
}

impl EdgeBucket {
    fn clear(&mut self) {
        self.length = 0.0;
        self.forward.clear();
        self.backward.clear();
    }

    fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.backward.is_empty()
    }

    fn resolve(&mut self, meeting_distance: f32, out: &mut Vec<Annihilation>) {
        if self.forward.is_empty() || self.backward.is_empty() || self.length <= f32::EPSILON {
            return;
        }

        // Front-runners first: forward carriers nearest B, backward nearest A.
        // Each front is scanned from the end it travels toward, so the pair
        // that meets first is resolved first.
        self.forward
            .sort_by(|lhs, rhs| rhs.t.total_cmp(&lhs.t).then(lhs.id.cmp(&rhs.id)));
        self.backward
            .sort_by(|lhs, rhs| lhs.t.total_cmp(&rhs.t).then(lhs.id.cmp(&rhs.id)));

        let mut forward_index = 0;
        let mut backward_index = 0;
        while forward_index < self.forward.len() && backward_index < self.backward.len() {
            let forward = self.forward[forward_index];
            let backward = self.backward[backward_index];
            let gap = (backward.t - forward.t) * self.length;

            if gap.abs() <= meeting_distance {
                out.push(Annihilation {
                    forward: forward.id,
                    backward: backward.id,
                });
                forward_index += 1;
                backward_index += 1;
                continue;
            }

            if gap > 0.0 {
                // Fronts still approaching; every other pair is farther apart.
                break;
            }

            if (forward.t - 0.5).abs() >= (backward.t - 0.5).abs() {
                forward_index += 1;
            } else {
                backward_index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkwar_core::{FactionId, Owner};

    const A: TowerId = TowerId::new(1);
    const B: TowerId = TowerId::new(2);
    const C: TowerId = TowerId::new(3);

    fn center(tower: TowerId) -> Option<Vec2> {
        match tower.get() {
            1 => Some(Vec2::new(0.0, 0.0)),
            2 => Some(Vec2::new(100.0, 0.0)),
            3 => Some(Vec2::new(0.0, 100.0)),
            _ => None,
        }
    }

    fn carrier(id: u32, source: TowerId, target: TowerId, position: Vec2) -> CarrierSnapshot {
        CarrierSnapshot {
            id: CarrierId::new(id),
            position,
            owner: Owner::Faction(FactionId::new(id as u8 % 2)),
            source,
            target,
        }
    }

    fn resolve(carriers: &[CarrierSnapshot]) -> Vec<Annihilation> {
        let mut system = EdgeCollision::new();
        let mut out = Vec::new();
        system.handle(carriers, center, 12.0, &mut out);
        out
    }

    #[test]
    fn carriers_two_units_apart_annihilate() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(49.0, 0.0)),
            carrier(2, B, A, Vec2::new(51.0, 0.0)),
        ]);

        assert_eq!(
            out,
            vec![Annihilation {
                forward: CarrierId::new(1),
                backward: CarrierId::new(2),
            }]
        );
    }

    #[test]
    fn carriers_eighty_units_apart_survive() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(10.0, 0.0)),
            carrier(2, B, A, Vec2::new(90.0, 0.0)),
        ]);

        assert!(out.is_empty());
    }

    #[test]
    fn front_runners_meet_before_followers() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(40.0, 0.0)),
            carrier(2, A, B, Vec2::new(45.0, 0.0)),
            carrier(3, B, A, Vec2::new(50.0, 0.0)),
        ]);

        assert_eq!(
            out,
            vec![Annihilation {
                forward: CarrierId::new(2),
                backward: CarrierId::new(3),
            }]
        );
    }

    #[test]
    fn each_carrier_joins_at_most_one_pair() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(50.0, 0.0)),
            carrier(2, B, A, Vec2::new(52.0, 0.0)),
            carrier(3, B, A, Vec2::new(54.0, 0.0)),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].backward, CarrierId::new(2));
    }

    #[test]
    fn same_direction_traffic_never_collides() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(50.0, 0.0)),
            carrier(2, A, B, Vec2::new(50.0, 0.0)),
        ]);

        assert!(out.is_empty());
    }

    #[test]
    fn carriers_on_different_edges_never_collide() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(5.0, 0.0)),
            carrier(2, C, A, Vec2::new(0.0, 5.0)),
        ]);

        assert!(out.is_empty());
    }

    #[test]
    fn passed_fronts_still_pair_with_nearby_followers() {
        let out = resolve(&[
            carrier(1, A, B, Vec2::new(80.0, 0.0)),
            carrier(2, B, A, Vec2::new(10.0, 0.0)),
            carrier(3, B, A, Vec2::new(85.0, 0.0)),
        ]);

        assert_eq!(
            out,
            vec![Annihilation {
                forward: CarrierId::new(1),
                backward: CarrierId::new(3),
            }]
        );
    }

    #[test]
    fn result_ignores_input_order() {
        let mut carriers = vec![
            carrier(1, A, B, Vec2::new(30.0, 0.0)),
            carrier(2, A, B, Vec2::new(48.0, 0.0)),
            carrier(3, B, A, Vec2::new(55.0, 0.0)),
            carrier(4, B, A, Vec2::new(38.0, 0.0)),
        ];
        let first = resolve(&carriers);
        carriers.reverse();
        let second = resolve(&carriers);

        assert_eq!(first, second);
    }

    #[test]
    fn buckets_are_reused_across_ticks() {
        let mut system = EdgeCollision::new();
        let mut out = Vec::new();
        system.handle(
            &[
                carrier(1, A, B, Vec2::new(49.0, 0.0)),
                carrier(2, B, A, Vec2::new(51.0, 0.0)),
            ],
            center,
            12.0,
            &mut out,
        );
        assert_eq!(out.len(), 1);

        out.clear();
        system.handle(&[carrier(3, A, B, Vec2::new(49.0, 0.0))], center, 12.0, &mut out);
        assert!(out.is_empty());
    }
}
