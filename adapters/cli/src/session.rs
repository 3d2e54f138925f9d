//! Frame-by-frame driver wiring the world to its systems.

use std::time::Duration;

use linkwar_core::{Balance, Command, Event, FactionId, Owner, PointerEvent, PointerKind};
use linkwar_rendering::{FlowStyle, FrameInput, Overlay, Scene, SceneSources};
use linkwar_system_ai::{AiController, Config as AiConfig};
use linkwar_system_cutter::TrailCutter;
use linkwar_system_selection::Selection;
use linkwar_world::{self as world, query, World};
use tracing::debug;

use crate::scenario::{Scenario, ScriptedPointer};

/// One running match and the systems acting on it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    player: FactionId,
    selection: Selection,
    cutter: TrailCutter,
    ai: AiController,
    script: Vec<ScriptedPointer>,
    next_scripted: usize,
    elapsed: Duration,
    flow_style: FlowStyle,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    /// Seats the scenario in a fresh world.
    ///
    /// With `autoplay` the AI also plays the pointer-driven faction.
    pub(crate) fn new(balance: Balance, scenario: &Scenario, seed: u64, autoplay: bool) -> Self {
        let mut world = World::new(balance);
        let mut events = Vec::new();
        for command in scenario.setup_commands() {
            world::apply(&mut world, command, &mut events);
        }
        debug!(setup_events = events.len(), "scenario placed");

        let mut seats = scenario.ai.clone();
        if autoplay {
            seats.push(scenario.player);
        }

        Self {
            world,
            player: scenario.player,
            selection: Selection::new(scenario.player),
            cutter: TrailCutter::default(),
            ai: AiController::new(AiConfig::new(seats, seed)),
            script: scenario.script.clone(),
            next_scripted: 0,
            elapsed: Duration::ZERO,
            flow_style: FlowStyle::default(),
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Feeds due pointer input, advances the world by `dt` and lets the AI act.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput) {
        self.elapsed += dt;

        let mut pointers = self.due_pointers();
        pointers.extend(input.pointer);
        for pointer in pointers {
            self.pointer(pointer);
        }

        self.events.clear();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        let towers = query::tower_view(&self.world);
        self.selection
            .handle(&self.events, None, &towers, &mut self.commands);
        let world = &self.world;
        self.ai.handle(
            &self.events,
            &towers,
            &query::balance(world).ai,
            |a, b| query::is_clear_path(world, a, b),
            &mut self.commands,
        );
        self.flush();
    }

    /// Scene reflecting the current world and player overlay.
    pub(crate) fn scene(&self) -> Scene {
        let towers = query::tower_view(&self.world);
        let links = query::link_view(&self.world);
        let carriers = query::carrier_view(&self.world);
        let overlay = Overlay {
            selected: self.selection.selected(),
            trail: self.cutter.trail().collect(),
            outcome: query::outcome(&self.world, self.player),
        };

        Scene::compose(
            SceneSources {
                towers: &towers,
                links: &links,
                carriers: &carriers,
                obstacles: query::obstacles(&self.world),
                balance: query::balance(&self.world),
            },
            &overlay,
            &self.flow_style,
        )
    }

    fn due_pointers(&mut self) -> Vec<PointerEvent> {
        let now = self.elapsed.as_millis();
        let due = self.script[self.next_scripted..]
            .iter()
            .take_while(|pointer| u128::from(pointer.at_ms) <= now)
            .count();
        let start = self.next_scripted;
        self.next_scripted += due;
        self.script[start..self.next_scripted]
            .iter()
            .map(ScriptedPointer::event)
            .collect()
    }

    fn pointer(&mut self, mut pointer: PointerEvent) {
        if pointer.kind == PointerKind::Down && pointer.hits.is_empty() {
            pointer.hits.extend(query::tower_at(&self.world, pointer.position));
        }

        let towers = query::tower_view(&self.world);
        let links = query::link_view(&self.world);
        let player = Owner::Faction(self.player);
        self.selection
            .handle(&[], Some(&pointer), &towers, &mut self.commands);
        self.cutter.handle(
            &pointer,
            &links,
            |link| link.source_owner == player,
            &mut self.commands,
        );
        self.flush();
    }

    fn flush(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use linkwar_core::{MatchOutcome, TowerId};
    use linkwar_rendering::LinkPresentation;

    use super::*;
    use crate::scenario::ScriptedKind;

    const FRAME: Duration = Duration::from_millis(16);

    fn scripted(at_ms: u64, kind: ScriptedKind, x: f32, y: f32) -> ScriptedPointer {
        ScriptedPointer { at_ms, kind, x, y }
    }

    fn player_links(scene: &Scene) -> Vec<(TowerId, TowerId)> {
        scene
            .links
            .iter()
            .filter(|link| link.from == TowerId::new(2))
            .map(|link: &LinkPresentation| (link.from, link.to))
            .collect()
    }

    fn quiet_scenario(script: Vec<ScriptedPointer>) -> Scenario {
        Scenario {
            ai: Vec::new(),
            script,
            ..Scenario::default()
        }
    }

    #[test]
    fn two_clicks_link_the_player_tower() {
        let scenario = quiet_scenario(vec![
            scripted(0, ScriptedKind::Down, 450.0, 560.0),
            scripted(0, ScriptedKind::Down, 160.0, 340.0),
        ]);
        let mut session = Session::new(Balance::default(), &scenario, 0, false);

        session.frame(FRAME, FrameInput::default());

        assert_eq!(
            player_links(&session.scene()),
            vec![(TowerId::new(2), TowerId::new(1))]
        );
    }

    #[test]
    fn a_stroke_across_the_link_cuts_it() {
        let scenario = quiet_scenario(vec![
            scripted(0, ScriptedKind::Down, 450.0, 560.0),
            scripted(0, ScriptedKind::Down, 160.0, 340.0),
            scripted(100, ScriptedKind::Down, 305.0, 400.0),
            scripted(100, ScriptedKind::Move, 305.0, 500.0),
            scripted(100, ScriptedKind::Up, 305.0, 500.0),
        ]);
        let mut session = Session::new(Balance::default(), &scenario, 0, false);

        session.frame(FRAME, FrameInput::default());
        assert_eq!(player_links(&session.scene()).len(), 1);
        for _ in 0..6 {
            session.frame(FRAME, FrameInput::default());
        }

        assert!(player_links(&session.scene()).is_empty());
    }

    #[test]
    fn live_input_is_hit_tested_and_selects() {
        let mut session = Session::new(Balance::default(), &quiet_scenario(Vec::new()), 0, false);

        session.frame(
            FRAME,
            FrameInput {
                pointer: Some(PointerEvent::down(Vec2::new(455.0, 565.0), Vec::new())),
            },
        );

        let scene = session.scene();
        assert!(scene
            .tower(TowerId::new(2))
            .is_some_and(|tower| tower.selected));
        assert_eq!(scene.banner, None);
    }

    #[test]
    fn sole_owner_sees_the_victory_banner() {
        let scenario = Scenario {
            ai: Vec::new(),
            towers: Scenario::default()
                .towers
                .into_iter()
                .map(|mut tower| {
                    tower.owner = Owner::Faction(FactionId::new(0));
                    tower
                })
                .collect(),
            ..Scenario::default()
        };
        let mut session = Session::new(Balance::default(), &scenario, 0, false);

        session.frame(FRAME, FrameInput::default());

        assert_eq!(
            query::outcome(&session.world, FactionId::new(0)),
            MatchOutcome::Victory
        );
        assert!(session.scene().banner.is_some());
    }
}
