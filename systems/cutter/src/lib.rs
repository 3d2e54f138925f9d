#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that severs links crossed by a freehand pointer trail.
//!
//! A gesture starts when the pointer goes down on empty space, records a
//! thinned and bounded trail while the pointer moves, and resolves when the
//! pointer is released. Every active, eligible link crossed by any segment of
//! the trail is cut once.

use std::collections::VecDeque;

use glam::Vec2;
use linkwar_core::{
    geometry::segment_intersection, Command, LinkSnapshot, LinkView, PointerEvent, PointerKind,
    Severable, TowerId,
};

/// What a cut does to a link.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severance {
    /// Removes the link from the registry.
    #[default]
    Remove,
    /// Deactivates the link; a later request revives it.
    Suspend,
}

impl Severance {
    fn command(self, from: TowerId, to: TowerId) -> Command {
        match self {
            Self::Remove => Command::CutLink { from, to },
            Self::Suspend => Command::SuspendLink { from, to },
        }
    }
}

/// Configuration parameters required to construct the trail cutter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Maximum number of trail points kept; the oldest are dropped first.
    pub max_points: usize,
    /// Minimum spacing between consecutive trail points in world units.
    pub min_point_distance: f32,
    /// Effect of a cut on the crossed link.
    pub severance: Severance,
}

impl Config {
    /// Creates a new configuration with explicit trail limits.
    #[must_use]
    pub const fn new(max_points: usize, min_point_distance: f32, severance: Severance) -> Self {
        Self {
            max_points,
            min_point_distance,
            severance,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(20, 8.0, Severance::Remove)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Gesture {
    Idle,
    Tracking,
}

/// Gesture cutter state machine.
#[derive(Debug)]
pub struct TrailCutter {
    config: Config,
    gesture: Gesture,
    trail: VecDeque<Vec2>,
}

impl Default for TrailCutter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl TrailCutter {
    /// Creates an idle cutter using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            trail: VecDeque::with_capacity(config.max_points),
        }
    }

    /// Reports whether a gesture is in progress.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.gesture == Gesture::Tracking
    }

    /// Points recorded for the gesture in progress, oldest first.
    pub fn trail(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.trail.iter().copied()
    }

    /// Feeds one pointer event and emits a command for every link it cuts.
    ///
    /// `can_cut` decides which links the gesture may sever, typically those
    /// whose source belongs to the human player.
    pub fn handle<F>(
        &mut self,
        pointer: &PointerEvent,
        links: &LinkView,
        can_cut: F,
        out: &mut Vec<Command>,
    ) where
        F: Fn(&LinkSnapshot) -> bool,
    {
        let severance = self.config.severance;
        self.track(pointer, links.as_slice(), can_cut, |link| {
            out.push(severance.command(link.from, link.to));
        });
    }

    /// Feeds one pointer event, invoking `on_cut` once per severed link.
    ///
    /// Works over anything [`Severable`], so hosts with their own link
    /// representation can reuse the gesture logic.
    pub fn track<L, P, C>(&mut self, pointer: &PointerEvent, links: &[L], can_cut: P, on_cut: C)
    where
        L: Severable,
        P: Fn(&L) -> bool,
        C: FnMut(&L),
    {
        match pointer.kind {
            PointerKind::Down => {
                if pointer.hits.is_empty() {
                    self.gesture = Gesture::Tracking;
                    self.trail.clear();
                    self.trail.push_back(pointer.position);
                }
            }
            PointerKind::Move => {
                if self.gesture == Gesture::Tracking {
                    self.record(pointer.position);
                }
            }
            PointerKind::Up => {
                if self.gesture == Gesture::Tracking {
                    self.gesture = Gesture::Idle;
                    self.resolve(links, can_cut, on_cut);
                    self.trail.clear();
                }
            }
        }
    }

    fn record(&mut self, point: Vec2) {
        let spaced = self
            .trail
            .back()
            .map_or(true, |last| last.distance(point) >= self.config.min_point_distance);
        if !spaced {
            return;
        }

        self.trail.push_back(point);
        while self.trail.len() > self.config.max_points {
            let _ = self.trail.pop_front();
        }
    }

    fn resolve<L, P, C>(&self, links: &[L], can_cut: P, mut on_cut: C)
    where
        L: Severable,
        P: Fn(&L) -> bool,
        C: FnMut(&L),
    {
        if self.trail.len() < 2 {
            return;
        }

        for link in links {
            if !link.is_active() || !can_cut(link) {
                continue;
            }
            let (from, to) = link.endpoints();
            let crossed = self
                .trail
                .iter()
                .zip(self.trail.iter().skip(1))
                .any(|(a, b)| segment_intersection(*a, *b, from, to).is_some());
            if crossed {
                on_cut(link);
            }
        }
    }
}
