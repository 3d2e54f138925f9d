#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Linkwar adapters.
//!
//! Scenes are plain data derived from the world's immutable views. Backends
//! draw them however they like; nothing here touches simulation state.

use anyhow::Result as AnyResult;
use glam::Vec2;
use linkwar_core::{
    Balance, CarrierView, LinkSnapshot, LinkView, MatchOutcome, Owner, PointerEvent, Rect,
    TowerId, TowerSnapshot, TowerView,
};
use std::time::Duration;
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns the same color with the provided alpha.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

const FACTION_PALETTE: [Color; 3] = [
    Color::from_hex(0x3b_82_f6),
    Color::from_hex(0xef_44_44),
    Color::from_hex(0xf5_9e_0b),
];
const NEUTRAL_COLOR: Color = Color::from_hex(0x94_a3_b8);
const FLOW_DOT_COLOR: Color = NEUTRAL_COLOR.with_alpha(0.55);
const OBSTACLE_FILL: Color = Color::from_hex(0x0f_17_2a).with_alpha(0.12);
const TRAIL_COLOR: Color = Color::from_hex(0xff_44_44).with_alpha(0.9);

/// Fill color for towers and carriers held by `owner`.
///
/// Factions beyond the palette reuse it cyclically.
#[must_use]
pub fn owner_color(owner: Owner) -> Color {
    match owner {
        Owner::Neutral => NEUTRAL_COLOR,
        Owner::Faction(faction) => {
            FACTION_PALETTE[usize::from(faction.get()) % FACTION_PALETTE.len()]
        }
    }
}

/// Spacing and size of the dots animating along active links.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowStyle {
    spacing: f32,
    dot_radius: f32,
}

impl FlowStyle {
    /// Default distance between consecutive flow dots in world units.
    pub const DEFAULT_SPACING: f32 = 18.0;

    /// Creates a flow style, rejecting spacings that would never terminate.
    pub fn new(spacing: f32, dot_radius: f32) -> Result<Self, RenderingError> {
        if !(spacing > 0.0) {
            return Err(RenderingError::InvalidFlowSpacing { spacing });
        }

        Ok(Self {
            spacing,
            dot_radius,
        })
    }

    /// Positions of the flow dots along `from -> to` for the given phase.
    ///
    /// At least two dots are laid out on any non-degenerate link; dots wrap
    /// around the link length as the phase grows.
    #[must_use]
    pub fn dots(&self, from: Vec2, to: Vec2, phase: f32) -> Vec<Vec2> {
        let length = from.distance(to);
        if length <= f32::EPSILON {
            return Vec::new();
        }

        let direction = (to - from) / length;
        let count = ((length / self.spacing).floor() as usize).max(2);
        (0..count)
            .map(|index| {
                let offset = (index as f32 * self.spacing + phase).rem_euclid(length);
                from + direction * offset
            })
            .collect()
    }
}

impl Default for FlowStyle {
    fn default() -> Self {
        Self {
            spacing: Self::DEFAULT_SPACING,
            dot_radius: 3.0,
        }
    }
}

/// A single attack-slot indicator drawn beneath a tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotDot {
    /// Center of the indicator in world units.
    pub position: Vec2,
    /// Whether an active outgoing link occupies the slot.
    pub occupied: bool,
}

/// Tower as it should appear on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerPresentation {
    /// Identifier of the tower.
    pub id: TowerId,
    /// Center of the tower.
    pub position: Vec2,
    /// Body radius.
    pub radius: f32,
    /// Owner-derived fill.
    pub fill: Color,
    /// Unit count label.
    pub label: String,
    /// Attack slot indicators, occupied slots first.
    pub slots: Vec<SlotDot>,
    /// Whether the player has the tower selected.
    pub selected: bool,
}

impl TowerPresentation {
    const SLOT_SPACING: f32 = 9.0;
    const SLOT_OFFSET: f32 = 10.0;

    /// Derives the presentation of one tower snapshot.
    #[must_use]
    pub fn new(tower: &TowerSnapshot, radius: f32, selected: bool) -> Self {
        let drawn = tower.attack_slots.max(tower.active_targets);
        let width = Self::SLOT_SPACING * drawn.saturating_sub(1) as f32;
        let origin = tower.position + Vec2::new(-width / 2.0, radius + Self::SLOT_OFFSET);
        let slots = (0..drawn)
            .map(|index| SlotDot {
                position: origin + Vec2::new(index as f32 * Self::SLOT_SPACING, 0.0),
                occupied: index < tower.active_targets,
            })
            .collect();

        Self {
            id: tower.id,
            position: tower.position,
            radius,
            fill: owner_color(tower.owner),
            label: tower.units.to_string(),
            slots,
            selected,
        }
    }

    /// Radius of the selection ring, when one is drawn.
    #[must_use]
    pub fn selection_ring(&self) -> Option<f32> {
        self.selected.then_some(self.radius + 10.0)
    }
}

/// Link as it should appear on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkPresentation {
    /// Source tower.
    pub from: TowerId,
    /// Destination tower.
    pub to: TowerId,
    /// Flow dots; empty while the link is suspended or obstructed.
    pub dots: Vec<Vec2>,
    /// Radius of every dot.
    pub dot_radius: f32,
    /// Color of every dot.
    pub dot_color: Color,
}

impl LinkPresentation {
    /// Derives the presentation of one link snapshot.
    #[must_use]
    pub fn new(link: &LinkSnapshot, style: &FlowStyle) -> Self {
        let dots = if link.active && link.clear {
            style.dots(link.from_center, link.to_center, link.flow_phase)
        } else {
            Vec::new()
        };

        Self {
            from: link.from,
            to: link.to,
            dots,
            dot_radius: style.dot_radius,
            dot_color: FLOW_DOT_COLOR,
        }
    }
}

/// Carrier as it should appear on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarrierPresentation {
    /// Center of the carrier.
    pub position: Vec2,
    /// Body radius.
    pub radius: f32,
    /// Owner-derived fill.
    pub fill: Color,
}

/// Obstacle as it should appear on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstaclePresentation {
    /// Footprint of the obstacle.
    pub rect: Rect,
    /// Fill color.
    pub fill: Color,
}

/// Cutting gesture trail.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailPresentation {
    /// Polyline points, oldest first.
    pub points: Vec<Vec2>,
    /// Stroke width in world units.
    pub stroke_width: f32,
    /// Stroke color.
    pub color: Color,
}

/// Banner shown once the match is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeBanner {
    /// The player holds every tower.
    Victory,
    /// An opponent holds every tower.
    Defeat,
}

impl OutcomeBanner {
    /// Banner for the provided outcome, if the match is over.
    #[must_use]
    pub const fn from_outcome(outcome: MatchOutcome) -> Option<Self> {
        match outcome {
            MatchOutcome::InProgress => None,
            MatchOutcome::Victory => Some(Self::Victory),
            MatchOutcome::Defeat => Some(Self::Defeat),
        }
    }

    /// Text displayed by the banner.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Victory => "Victory",
            Self::Defeat => "Defeat",
        }
    }
}

/// Player-side state layered over the world views.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    /// Tower selected by the player.
    pub selected: Option<TowerId>,
    /// Points of the gesture in progress.
    pub trail: Vec<Vec2>,
    /// Outcome from the player's perspective.
    pub outcome: MatchOutcome,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            selected: None,
            trail: Vec::new(),
            outcome: MatchOutcome::InProgress,
        }
    }
}

/// Immutable views a scene is derived from.
#[derive(Clone, Copy, Debug)]
pub struct SceneSources<'a> {
    /// Tower snapshots.
    pub towers: &'a TowerView,
    /// Link snapshots in registry order.
    pub links: &'a LinkView,
    /// Carriers in flight.
    pub carriers: &'a CarrierView,
    /// Static obstacles.
    pub obstacles: &'a [Rect],
    /// Balance supplying tower and carrier radii.
    pub balance: &'a Balance,
}

/// Scene description combining towers, links, carriers and player overlays.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Obstacles, drawn first.
    pub obstacles: Vec<ObstaclePresentation>,
    /// Links in registry order.
    pub links: Vec<LinkPresentation>,
    /// Carriers in flight.
    pub carriers: Vec<CarrierPresentation>,
    /// Towers ordered by identifier.
    pub towers: Vec<TowerPresentation>,
    /// Cutting trail, present while a gesture is in progress.
    pub trail: Option<TrailPresentation>,
    /// Outcome banner, present once the match is decided.
    pub banner: Option<OutcomeBanner>,
}

impl Scene {
    /// Derives a scene from world views and the player's overlay.
    #[must_use]
    pub fn compose(sources: SceneSources<'_>, overlay: &Overlay, style: &FlowStyle) -> Self {
        let balance = sources.balance;
        let obstacles = sources
            .obstacles
            .iter()
            .map(|rect| ObstaclePresentation {
                rect: *rect,
                fill: OBSTACLE_FILL,
            })
            .collect();
        let links = sources
            .links
            .iter()
            .map(|link| LinkPresentation::new(link, style))
            .collect();
        let carriers = sources
            .carriers
            .iter()
            .map(|carrier| CarrierPresentation {
                position: carrier.position,
                radius: balance.carrier_radius,
                fill: owner_color(carrier.owner),
            })
            .collect();
        let towers = sources
            .towers
            .iter()
            .map(|tower| {
                TowerPresentation::new(
                    tower,
                    balance.tower_radius,
                    overlay.selected == Some(tower.id),
                )
            })
            .collect();
        let trail = (overlay.trail.len() >= 2).then(|| TrailPresentation {
            points: overlay.trail.clone(),
            stroke_width: 4.0,
            color: TRAIL_COLOR,
        });

        Self {
            obstacles,
            links,
            carriers,
            towers,
            trail,
            banner: OutcomeBanner::from_outcome(overlay.outcome),
        }
    }

    /// Presentation of the provided tower, if it is in the scene.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&TowerPresentation> {
        self.towers.iter().find(|tower| tower.id == id)
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer event captured this frame, already hit-tested against towers.
    pub pointer: Option<PointerEvent>,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Linkwar scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta,
    /// per-frame input captured by the adapter, and may mutate the scene before
    /// it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Flow dots need a positive spacing to be laid out.
    #[error("flow spacing must be positive (received {spacing})")]
    InvalidFlowSpacing {
        /// Provided spacing that failed validation.
        spacing: f32,
    },
}
