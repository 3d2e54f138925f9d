//! Match setup loaded from TOML.

use glam::Vec2;
use linkwar_core::{Command, FactionId, Owner, PointerEvent, Rect};
use serde::Deserialize;
use thiserror::Error;

/// Towers, obstacles and seats of a match, plus optional scripted input.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Faction driven by pointer input.
    #[serde(default = "default_player")]
    pub(crate) player: FactionId,
    /// Factions driven by the AI controller.
    #[serde(default)]
    pub(crate) ai: Vec<FactionId>,
    /// Towers in placement order; identifiers follow this order.
    pub(crate) towers: Vec<TowerSeed>,
    /// Static obstacles.
    #[serde(default)]
    pub(crate) obstacles: Vec<Rect>,
    /// Pointer events replayed at fixed times.
    #[serde(default, rename = "pointer")]
    pub(crate) script: Vec<ScriptedPointer>,
}

/// Initial state of one tower.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerSeed {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) owner: Owner,
    pub(crate) units: u32,
}

/// Pointer event replayed once the match clock reaches `at_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptedPointer {
    pub(crate) at_ms: u64,
    pub(crate) kind: ScriptedKind,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptedKind {
    Down,
    Move,
    Up,
}

impl ScriptedPointer {
    /// Pointer event without hit-test results; the session fills those in.
    pub(crate) fn event(&self) -> PointerEvent {
        let position = Vec2::new(self.x, self.y);
        match self.kind {
            ScriptedKind::Down => PointerEvent::down(position, Vec::new()),
            ScriptedKind::Move => PointerEvent::moved(position),
            ScriptedKind::Up => PointerEvent::up(position),
        }
    }
}

fn default_player() -> FactionId {
    FactionId::new(0)
}

impl Default for Scenario {
    fn default() -> Self {
        let blue = FactionId::new(0);
        let red = FactionId::new(1);
        Self {
            player: blue,
            ai: vec![red],
            towers: vec![
                TowerSeed {
                    x: 320.0,
                    y: 140.0,
                    owner: Owner::Faction(red),
                    units: 25,
                },
                TowerSeed {
                    x: 160.0,
                    y: 340.0,
                    owner: Owner::Neutral,
                    units: 5,
                },
                TowerSeed {
                    x: 450.0,
                    y: 560.0,
                    owner: Owner::Faction(blue),
                    units: 19,
                },
            ],
            obstacles: vec![Rect::new(240.0, 340.0, 340.0, 24.0)],
            script: Vec::new(),
        }
    }
}

impl Scenario {
    /// Parses and validates a scenario.
    pub(crate) fn from_toml_str(source: &str) -> Result<Self, ScenarioError> {
        let mut scenario: Self = toml::from_str(source)?;
        scenario.validate()?;
        scenario.script.sort_by_key(|pointer| pointer.at_ms);
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        if self.towers.is_empty() {
            return Err(ScenarioError::NoTowers);
        }
        if let Some(index) = self
            .towers
            .iter()
            .position(|tower| !(tower.x.is_finite() && tower.y.is_finite()))
        {
            return Err(ScenarioError::NonFinitePosition { index });
        }
        if self.ai.contains(&self.player) {
            return Err(ScenarioError::PlayerSeatedAsAi(self.player.get()));
        }
        Ok(())
    }

    /// Setup commands placing every tower, then every obstacle.
    pub(crate) fn setup_commands(&self) -> Vec<Command> {
        let towers = self.towers.iter().map(|tower| Command::PlaceTower {
            position: Vec2::new(tower.x, tower.y),
            owner: tower.owner,
            units: tower.units,
        });
        let obstacles = self
            .obstacles
            .iter()
            .map(|rect| Command::PlaceObstacle { rect: *rect });
        towers.chain(obstacles).collect()
    }
}

/// Errors raised while loading a scenario file.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The TOML source could not be parsed.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),
    /// A match needs at least one tower.
    #[error("scenario places no towers")]
    NoTowers,
    /// Tower coordinates must be finite.
    #[error("tower #{index} has a non-finite position")]
    NonFinitePosition {
        /// Position of the tower in the scenario file.
        index: usize,
    },
    /// The pointer-driven faction was also listed for the AI.
    #[error("faction {0} is both the player and an AI seat; use --autoplay instead")]
    PlayerSeatedAsAi(u8),
}
