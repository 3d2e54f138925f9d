#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that periodically picks attacks on behalf of computer factions.
//!
//! Every decision round each controlled faction draws one of its well-stocked
//! towers at random and requests a link toward the cheapest tower it does not
//! own. Requests travel through [`Command::RequestLink`], so the world applies
//! the same capacity and reverse-cancel policy it applies to the player.

use glam::Vec2;
use linkwar_core::{
    AiBalance, Command, Event, FactionId, Owner, TowerId, TowerSnapshot, TowerView,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Configuration parameters required to construct the AI controller.
#[derive(Clone, Debug)]
pub struct Config {
    factions: Vec<FactionId>,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration controlling `factions` with a seeded source picker.
    #[must_use]
    pub fn new(factions: Vec<FactionId>, rng_seed: u64) -> Self {
        Self { factions, rng_seed }
    }
}

/// AI controller that reuses scratch buffers between decision rounds.
#[derive(Debug)]
pub struct AiController {
    factions: Vec<FactionId>,
    rng: ChaCha8Rng,
    accumulator_ms: f32,
    sources: Vec<SourceCandidate>,
}

impl AiController {
    /// Creates a new controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            factions: config.factions,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            accumulator_ms: 0.0,
            sources: Vec::new(),
        }
    }

    /// Consumes time events and a tower snapshot, emitting link requests.
    ///
    /// At most one decision round runs per call; time beyond one period is
    /// discarded rather than replayed. `is_clear_path` reports whether the
    /// straight segment between two tower centers avoids every obstacle.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        tuning: &AiBalance,
        is_clear_path: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(Vec2, Vec2) -> bool,
    {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.accumulator_ms += dt.as_secs_f32() * 1_000.0;
            }
        }

        if !(tuning.period_ms > 0.0) || self.accumulator_ms < tuning.period_ms {
            return;
        }
        self.accumulator_ms %= tuning.period_ms;

        for index in 0..self.factions.len() {
            let faction = self.factions[index];
            if let Some(command) = self.decide(faction, towers, tuning, &is_clear_path) {
                out.push(command);
            }
        }
    }

    fn decide<F>(
        &mut self,
        faction: FactionId,
        towers: &TowerView,
        tuning: &AiBalance,
        is_clear_path: &F,
    ) -> Option<Command>
    where
        F: Fn(Vec2, Vec2) -> bool,
    {
        let owner = Owner::Faction(faction);
        self.sources.clear();
        self.sources.extend(
            towers
                .iter()
                .filter(|tower| tower.owner == owner && tower.units >= tuning.send_threshold)
                .map(|tower| SourceCandidate {
                    id: tower.id,
                    position: tower.position,
                }),
        );
        if self.sources.is_empty() {
            trace!(faction = faction.get(), "no tower ready to send");
            return None;
        }

        let source = self.sources[self.rng.gen_range(0..self.sources.len())];

        let mut best: Option<TargetCandidate> = None;
        for tower in towers.iter().filter(|tower| tower.owner != owner) {
            let current = TargetCandidate::evaluate(&source, tower, tuning.distance_weight);
            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        let target = best?;
        if !is_clear_path(source.position, target.position) {
            trace!(
                faction = faction.get(),
                from = source.id.get(),
                to = target.id.get(),
                "target obstructed, skipping round"
            );
            return None;
        }

        trace!(
            faction = faction.get(),
            from = source.id.get(),
            to = target.id.get(),
            score = target.score,
            "requesting link"
        );
        Some(Command::RequestLink {
            from: source.id,
            to: target.id,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SourceCandidate {
    id: TowerId,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct TargetCandidate {
    id: TowerId,
    position: Vec2,
    score: f32,
}

impl TargetCandidate {
    fn evaluate(source: &SourceCandidate, tower: &TowerSnapshot, distance_weight: f32) -> Self {
        Self {
            id: tower.id,
            position: tower.position,
            score: source.position.distance(tower.position) * distance_weight + tower.units as f32,
        }
    }

    fn precedes(&self, other: &Self) -> bool {
        if self.score != other.score {
            return self.score < other.score;
        }
        self.id < other.id
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn advanced(millis: u64) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }
    }

    #[test]
    fn backlog_beyond_one_period_is_dropped() {
        let mut ai = AiController::new(Config::new(vec![FactionId::new(1)], 7));
        let tuning = AiBalance::default();
        let mut out = Vec::new();

        ai.handle(
            &[advanced(10_000)],
            &TowerView::default(),
            &tuning,
            |_, _| true,
            &mut out,
        );

        assert!(ai.accumulator_ms < tuning.period_ms);
        assert!((ai.accumulator_ms - 10_000.0 % 1_700.0).abs() < 1e-2);
    }

    #[test]
    fn equal_scores_prefer_the_lower_identifier() {
        let lower = TargetCandidate {
            id: TowerId::new(1),
            position: Vec2::ZERO,
            score: 4.0,
        };
        let higher = TargetCandidate {
            id: TowerId::new(2),
            ..lower
        };

        assert!(lower.precedes(&higher));
        assert!(!higher.precedes(&lower));
    }
}
