//! Property-based checks of unit bounds and link-registry shape.

use std::{collections::BTreeSet, time::Duration};

use glam::Vec2;
use linkwar_core::{Balance, Command, FactionId, Owner, TowerId};
use linkwar_world::{self as world, query, World};
use proptest::prelude::*;

const POSITIONS: [(f32, f32); 5] = [
    (120.0, 120.0),
    (880.0, 140.0),
    (500.0, 500.0),
    (160.0, 860.0),
    (840.0, 880.0),
];

#[derive(Clone, Debug)]
enum Step {
    Tick(u64),
    Link(u32, u32),
    Cut(u32, u32),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (1u64..3_000).prop_map(Step::Tick),
        2 => (0u32..5, 0u32..5).prop_map(|(from, to)| Step::Link(from, to)),
        1 => (0u32..5, 0u32..5).prop_map(|(from, to)| Step::Cut(from, to)),
    ]
}

fn seeded_world(units: &[u32], generation_rate: f32) -> World {
    let mut world = World::new(Balance {
        generation_rate,
        ..Balance::default()
    });
    let mut events = Vec::new();
    for (index, (&(x, y), &units)) in POSITIONS.iter().zip(units).enumerate() {
        let owner = match index % 3 {
            0 => Owner::Faction(FactionId::new(0)),
            1 => Owner::Faction(FactionId::new(1)),
            _ => Owner::Neutral,
        };
        world::apply(
            &mut world,
            Command::PlaceTower {
                position: Vec2::new(x, y),
                owner,
                units,
            },
            &mut events,
        );
    }
    world
}

fn command(step: &Step) -> Command {
    match *step {
        Step::Tick(millis) => Command::Tick {
            dt: Duration::from_millis(millis),
        },
        Step::Link(from, to) => Command::RequestLink {
            from: TowerId::new(from),
            to: TowerId::new(to),
        },
        Step::Cut(from, to) => Command::CutLink {
            from: TowerId::new(from),
            to: TowerId::new(to),
        },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Units never leave `0..=max_units` and links never exist in both directions.
    #[test]
    fn towers_stay_within_bounds(
        units in proptest::collection::vec(0u32..=80, 5),
        generation_rate in 0.0f32..4.0,
        steps in proptest::collection::vec(step(), 1..120),
    ) {
        let mut world = seeded_world(&units, generation_rate);
        let mut events = Vec::new();

        for step in &steps {
            events.clear();
            world::apply(&mut world, command(step), &mut events);

            for tower in query::tower_view(&world).iter() {
                prop_assert!(tower.units <= tower.max_units);
            }

            let pairs: BTreeSet<(TowerId, TowerId)> = query::link_view(&world)
                .iter()
                .map(|link| (link.from, link.to))
                .collect();
            for (from, to) in &pairs {
                prop_assert!(from != to);
                prop_assert!(!pairs.contains(&(*to, *from)), "both directions of {from:?}-{to:?}");
            }
            prop_assert_eq!(pairs.len(), query::link_view(&world).iter().count());
        }
    }
}
