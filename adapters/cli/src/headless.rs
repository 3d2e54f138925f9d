//! Rendering backend that steps frames without a window.

use std::time::Duration;

use anyhow::Result as AnyResult;
use linkwar_rendering::{FrameInput, Presentation, RenderingBackend, Scene};
use tracing::info;

/// Backend that advances a fixed number of frames and reports the final scene.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HeadlessBackend {
    frames: u32,
    frame_time: Duration,
}

impl HeadlessBackend {
    /// Creates a backend stepping `frames` frames of `frame_time` each.
    pub(crate) const fn new(frames: u32, frame_time: Duration) -> Self {
        Self { frames, frame_time }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let mut scene = presentation.scene;
        info!(title = %presentation.window_title, frames = self.frames, "headless run started");

        let mut stepped = 0;
        while stepped < self.frames && scene.banner.is_none() {
            update_scene(self.frame_time, FrameInput::default(), &mut scene);
            stepped += 1;
        }

        let simulated = self.frame_time * stepped;
        println!("{}", summary(&scene, simulated));
        Ok(())
    }
}

fn summary(scene: &Scene, simulated: Duration) -> String {
    let mut lines = vec![format!(
        "after {:.1}s: {}",
        simulated.as_secs_f32(),
        scene.banner.map_or("in progress", |banner| banner.text())
    )];
    lines.extend(scene.towers.iter().map(|tower| {
        let occupied = tower.slots.iter().filter(|slot| slot.occupied).count();
        format!(
            "  tower {:>2} at ({:>6.1}, {:>6.1}): {:>3} units, {}/{} links",
            tower.id.get(),
            tower.position.x,
            tower.position.y,
            tower.label,
            occupied,
            tower.slots.len()
        )
    }));
    lines.push(format!(
        "  {} links, {} carriers in flight",
        scene.links.len(),
        scene.carriers.len()
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use linkwar_core::{FactionId, MatchOutcome, Owner, TowerId, TowerSnapshot};
    use linkwar_rendering::{Color, OutcomeBanner, TowerPresentation};
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn stops_once_a_banner_appears() {
        let calls = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&calls);
        let backend = HeadlessBackend::new(100, Duration::from_millis(16));

        backend
            .run(
                Presentation::new("test", Color::from_rgb_u8(0, 0, 0), Scene::default()),
                move |_, _, scene| {
                    counter.set(counter.get() + 1);
                    if counter.get() == 3 {
                        scene.banner = OutcomeBanner::from_outcome(MatchOutcome::Defeat);
                    }
                },
            )
            .expect("headless run");

        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn summary_lists_towers_and_outcome() {
        let tower = TowerSnapshot {
            id: TowerId::new(4),
            position: Vec2::new(10.0, 20.0),
            owner: Owner::Faction(FactionId::new(0)),
            units: 18,
            max_units: 60,
            attack_slots: 2,
            active_targets: 1,
        };
        let scene = Scene {
            towers: vec![TowerPresentation::new(&tower, 26.0, false)],
            banner: Some(OutcomeBanner::Victory),
            ..Scene::default()
        };

        let text = summary(&scene, Duration::from_secs(3));

        assert!(text.starts_with("after 3.0s: Victory"));
        assert!(text.contains("tower  4"));
        assert!(text.contains(" 18 units, 1/2 links"));
    }
}
