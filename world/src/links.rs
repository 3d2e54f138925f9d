//! Link registry, emission cadence and capacity policy.
//!
//! The registry is the sole authority over which links exist. It keeps at
//! most one link per ordered tower pair, in insertion order, and every
//! creation goes through [`LinkRegistry::request`].

use glam::Vec2;
use linkwar_core::TowerId;

/// Flow animation speed in world units per millisecond.
const FLOW_PHASE_RATE: f32 = 0.12;
/// Wrap-around point of the flow animation phase.
const FLOW_PHASE_WRAP: f32 = 10_000.0;

/// Directed unit flow between two towers.
#[derive(Clone, Debug)]
pub(crate) struct Link {
    pub(crate) from: TowerId,
    pub(crate) to: TowerId,
    /// Milliseconds accumulated toward the next emission.
    accumulator: f32,
    pub(crate) flow_phase: f32,
    pub(crate) active: bool,
}

impl Link {
    fn new(from: TowerId, to: TowerId) -> Self {
        Self {
            from,
            to,
            accumulator: 0.0,
            flow_phase: 0.0,
            active: true,
        }
    }

    /// Advances the emission clock and reports whether a carrier is due.
    ///
    /// Callers skip this entirely while the link is suspended or obstructed,
    /// so blocked time never banks. At most one carrier is due per call no
    /// matter how far the accumulator overshoots the interval.
    pub(crate) fn advance(&mut self, dt_ms: f32, interval_ms: f32, source_units: u32) -> bool {
        self.accumulator += dt_ms;
        self.flow_phase = (self.flow_phase + dt_ms * FLOW_PHASE_RATE) % FLOW_PHASE_WRAP;

        if self.accumulator >= interval_ms && source_units >= 1 {
            self.accumulator -= interval_ms;
            true
        } else {
            false
        }
    }
}

/// Result of a link request that passed the geometric checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LinkRequest {
    /// The link already flows; nothing changed.
    Unchanged,
    /// A suspended link resumed.
    Reactivated,
    /// A new link was registered.
    Created {
        /// Whether the opposite link was removed to make way.
        reversed: bool,
    },
    /// The source already uses every slot its units allow.
    AtCapacity,
}

#[derive(Debug, Default)]
pub(crate) struct LinkRegistry {
    links: Vec<Link>,
}

impl LinkRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn find(&self, from: TowerId, to: TowerId) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| link.from == from && link.to == to)
    }

    fn find_mut(&mut self, from: TowerId, to: TowerId) -> Option<&mut Link> {
        self.links
            .iter_mut()
            .find(|link| link.from == from && link.to == to)
    }

    /// Links in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.links.iter_mut()
    }

    /// Active links leaving `from`, in insertion order.
    pub(crate) fn active_outgoing(&self, from: TowerId) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .filter(move |link| link.active && link.from == from)
    }

    pub(crate) fn active_outgoing_count(&self, from: TowerId) -> usize {
        self.active_outgoing(from).count()
    }

    /// Registers or revives `from→to` when `from` has a free slot.
    ///
    /// `slots` is the number of simultaneous targets the source's units
    /// allow. Creating a link removes the opposite `to→from` link
    /// unconditionally.
    pub(crate) fn request(&mut self, from: TowerId, to: TowerId, slots: usize) -> LinkRequest {
        if self.find(from, to).is_some_and(|link| link.active) {
            return LinkRequest::Unchanged;
        }

        if self.active_outgoing_count(from) >= slots {
            return LinkRequest::AtCapacity;
        }

        if let Some(link) = self.find_mut(from, to) {
            link.active = true;
            return LinkRequest::Reactivated;
        }

        let reversed = self.remove(to, from);
        self.links.push(Link::new(from, to));
        LinkRequest::Created { reversed }
    }

    /// Removes `from→to`. Returns whether a link was removed.
    pub(crate) fn remove(&mut self, from: TowerId, to: TowerId) -> bool {
        let Some(index) = self
            .links
            .iter()
            .position(|link| link.from == from && link.to == to)
        else {
            return false;
        };
        let _ = self.links.remove(index);
        true
    }

    /// Deactivates `from→to`. Returns whether an active link was suspended.
    pub(crate) fn suspend(&mut self, from: TowerId, to: TowerId) -> bool {
        match self.find_mut(from, to) {
            Some(link) if link.active => {
                link.active = false;
                true
            }
            _ => false,
        }
    }

    /// Removes every link leaving `from`, returning their destinations in
    /// insertion order.
    pub(crate) fn remove_outgoing(&mut self, from: TowerId) -> Vec<TowerId> {
        let removed = self
            .links
            .iter()
            .filter(|link| link.from == from)
            .map(|link| link.to)
            .collect();
        self.links.retain(|link| link.from != from);
        removed
    }

    /// Nearest destination among the active links leaving `from`.
    ///
    /// Equal distances keep insertion order.
    pub(crate) fn primary_target<F>(&self, from: TowerId, center: F) -> Option<TowerId>
    where
        F: Fn(TowerId) -> Option<Vec2>,
    {
        let origin = center(from)?;
        let mut best: Option<(f32, TowerId)> = None;
        for link in self.active_outgoing(from) {
            let Some(destination) = center(link.to) else {
                continue;
            };
            let distance = origin.distance(destination);
            if best.map_or(true, |(nearest, _)| distance < nearest) {
                best = Some((distance, link.to));
            }
        }
        best.map(|(_, tower)| tower)
    }
}
