#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Linkwar engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable views, and respond exclusively with new command batches.
//!
//! All positions handed to the engine are assumed to be finite.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod balance;
pub mod geometry;

pub use balance::{AiBalance, Arena, Balance, BalanceError, CapacityTiers};
pub use geometry::Rect;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Places a tower during match setup.
    PlaceTower {
        /// Center of the tower in world units.
        position: Vec2,
        /// Initial owner of the tower.
        owner: Owner,
        /// Initial unit count, clamped to the tower's cap.
        units: u32,
    },
    /// Places a static rectangular obstacle during match setup.
    PlaceObstacle {
        /// Footprint of the obstacle.
        rect: Rect,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a link from one tower to another, subject to capacity policy.
    RequestLink {
        /// Tower that will emit carriers.
        from: TowerId,
        /// Tower that will receive carriers.
        to: TowerId,
    },
    /// Removes a link from the registry.
    CutLink {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
    },
    /// Deactivates a link while keeping it registered.
    SuspendLink {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a tower joined the match.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Owner the tower starts with.
        owner: Owner,
        /// Units the tower starts with.
        units: u32,
    },
    /// Confirms that an obstacle joined the match.
    ObstaclePlaced {
        /// Footprint of the obstacle.
        rect: Rect,
    },
    /// Confirms that a new link was registered.
    LinkCreated {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
    },
    /// Confirms that a suspended link resumed flowing.
    LinkReactivated {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
    },
    /// Confirms that a link stopped flowing but stays registered.
    LinkSuspended {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
    },
    /// Confirms that a link left the registry.
    LinkRemoved {
        /// Source tower of the link.
        from: TowerId,
        /// Destination tower of the link.
        to: TowerId,
        /// Why the link was removed.
        reason: LinkRemoval,
    },
    /// Reports that a link request was declined by policy.
    LinkRejected {
        /// Requested source tower.
        from: TowerId,
        /// Requested destination tower.
        to: TowerId,
        /// Policy that declined the request.
        reason: LinkRejection,
    },
    /// Confirms that a link emitted a carrier.
    CarrierEmitted {
        /// Identifier assigned to the carrier.
        carrier: CarrierId,
        /// Tower the carrier left.
        from: TowerId,
        /// Tower the carrier travels to.
        to: TowerId,
        /// Owner stamped on the carrier.
        owner: Owner,
    },
    /// Reports that a full tower passed an arriving carrier onward.
    CarrierForwarded {
        /// Carrier that arrived at the full tower.
        arrived: CarrierId,
        /// Fresh carrier spawned toward the primary target.
        carrier: CarrierId,
        /// Tower that forwarded the carrier.
        via: TowerId,
        /// Primary target of the forwarding tower.
        to: TowerId,
    },
    /// Reports that a carrier reached a full tower with nowhere to forward.
    CarrierAbsorbed {
        /// Carrier that was absorbed.
        carrier: CarrierId,
        /// Tower that absorbed it.
        tower: TowerId,
    },
    /// Reports that two opposing carriers met on the same edge.
    CarriersAnnihilated {
        /// Carrier travelling toward the higher tower identifier.
        forward: CarrierId,
        /// Carrier travelling toward the lower tower identifier.
        backward: CarrierId,
    },
    /// Reports that a carrier left the arena.
    CarrierLost {
        /// Carrier that left the arena.
        carrier: CarrierId,
    },
    /// Reports that an allied carrier reinforced a tower.
    TowerReinforced {
        /// Tower that gained a unit.
        tower: TowerId,
        /// Units held after reinforcement.
        units: u32,
    },
    /// Reports that a hostile carrier depleted a tower by one unit.
    TowerAttacked {
        /// Tower that lost a unit.
        tower: TowerId,
        /// Units held after the attack.
        units: u32,
    },
    /// Reports that a tower changed hands.
    TowerCaptured {
        /// Tower that was captured.
        tower: TowerId,
        /// Owner before the capture.
        previous: Owner,
        /// Owner after the capture.
        owner: Owner,
    },
    /// Announces that a single owner holds every tower.
    MatchConcluded {
        /// Owner of every tower.
        winner: Owner,
    },
}

/// Reasons a link may leave the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkRemoval {
    /// A gesture severed the link.
    Cut,
    /// A link in the opposite direction superseded it.
    Reversed,
    /// Its source tower was captured.
    SourceCaptured,
}

/// Reasons a link request may be declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkRejection {
    /// Source and destination are the same tower.
    SameTower,
    /// One of the towers does not exist.
    MissingTower,
    /// An obstacle blocks the straight path.
    Obstructed,
    /// The source already uses every link slot its units allow.
    AtCapacity,
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CarrierId(u32);

impl CarrierId {
    /// Creates a new carrier identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a playing faction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(u8);

impl FactionId {
    /// Creates a new faction identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the faction.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Owner of a tower or carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// Unclaimed tower; never generates units.
    Neutral,
    /// Tower held by a playing faction.
    Faction(FactionId),
}

impl Owner {
    /// Reports whether the owner is the neutral placeholder.
    #[must_use]
    pub const fn is_neutral(self) -> bool {
        matches!(self, Self::Neutral)
    }
}

/// Phase of a pointer gesture delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
}

/// Pointer event carrying world-space coordinates and hit-tested towers.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Phase of the gesture.
    pub kind: PointerKind,
    /// Pointer location in world units.
    pub position: Vec2,
    /// Towers under the pointer, as hit-tested by the host.
    pub hits: Vec<TowerId>,
}

impl PointerEvent {
    /// Pointer press at the provided position.
    #[must_use]
    pub fn down(position: Vec2, hits: Vec<TowerId>) -> Self {
        Self {
            kind: PointerKind::Down,
            position,
            hits,
        }
    }

    /// Pointer motion to the provided position.
    #[must_use]
    pub fn moved(position: Vec2) -> Self {
        Self {
            kind: PointerKind::Move,
            position,
            hits: Vec::new(),
        }
    }

    /// Pointer release at the provided position.
    #[must_use]
    pub fn up(position: Vec2) -> Self {
        Self {
            kind: PointerKind::Up,
            position,
            hits: Vec::new(),
        }
    }
}

/// Narrow contract for anything a gesture can sever.
pub trait Severable {
    /// World-space centers of the source and destination.
    fn endpoints(&self) -> (Vec2, Vec2);

    /// Whether the link currently flows.
    fn is_active(&self) -> bool;
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Center of the tower in world units.
    pub position: Vec2,
    /// Current owner.
    pub owner: Owner,
    /// Units currently held.
    pub units: u32,
    /// Unit cap of the tower.
    pub max_units: u32,
    /// Link slots the current units allow.
    pub attack_slots: usize,
    /// Active outgoing links.
    pub active_targets: usize,
}

/// Read-only snapshot describing all towers in the match.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }
}

/// Immutable representation of a registered link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkSnapshot {
    /// Source tower.
    pub from: TowerId,
    /// Destination tower.
    pub to: TowerId,
    /// Center of the source tower.
    pub from_center: Vec2,
    /// Center of the destination tower.
    pub to_center: Vec2,
    /// Current owner of the source tower.
    pub source_owner: Owner,
    /// Whether the link flows.
    pub active: bool,
    /// Whether the straight path is free of obstacles.
    pub clear: bool,
    /// Animation phase of the flow, in world units.
    pub flow_phase: f32,
}

impl Severable for LinkSnapshot {
    fn endpoints(&self) -> (Vec2, Vec2) {
        (self.from_center, self.to_center)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Read-only snapshot of the link registry in insertion order.
#[derive(Clone, Debug, Default)]
pub struct LinkView {
    snapshots: Vec<LinkSnapshot>,
}

impl LinkView {
    /// Creates a new link view, preserving registry order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<LinkSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured links in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &LinkSnapshot> {
        self.snapshots.iter()
    }

    /// Captured links as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[LinkSnapshot] {
        &self.snapshots
    }
}

/// Immutable representation of a carrier in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarrierSnapshot {
    /// Identifier assigned to the carrier.
    pub id: CarrierId,
    /// Current position in world units.
    pub position: Vec2,
    /// Owner stamped at emission.
    pub owner: Owner,
    /// Tower the carrier left.
    pub source: TowerId,
    /// Tower the carrier travels to.
    pub target: TowerId,
}

/// Read-only snapshot of every live carrier.
#[derive(Clone, Debug, Default)]
pub struct CarrierView {
    snapshots: Vec<CarrierSnapshot>,
}

impl CarrierView {
    /// Creates a new carrier view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CarrierSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured carriers in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &CarrierSnapshot> {
        self.snapshots.iter()
    }

    /// Number of carriers in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no carrier is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Result of the match from one faction's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// More than one owner still holds towers.
    InProgress,
    /// The faction holds every tower.
    Victory,
    /// Another owner holds every tower.
    Defeat,
}
