#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system translating tower clicks into link requests.
//!
//! The first click on one of the player's towers selects it, a second click on
//! any other tower requests a link from the selection to that tower. Clicking
//! the selected tower again clears the selection.

use linkwar_core::{Command, Event, FactionId, Owner, PointerEvent, PointerKind, TowerId, TowerView};

/// Click-select-click system for the human player.
#[derive(Clone, Debug)]
pub struct Selection {
    player: FactionId,
    selected: Option<TowerId>,
}

impl Selection {
    /// Creates a selection system acting for `player`.
    #[must_use]
    pub const fn new(player: FactionId) -> Self {
        Self {
            player,
            selected: None,
        }
    }

    /// Tower currently selected, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<TowerId> {
        self.selected
    }

    /// Consumes world events and an optional pointer event to emit link requests.
    ///
    /// Only pointer presses that hit a tower are considered; presses on empty
    /// space belong to the cutter and leave the selection untouched.
    pub fn handle(
        &mut self,
        events: &[Event],
        pointer: Option<&PointerEvent>,
        towers: &TowerView,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::TowerCaptured { tower, owner, .. } = event {
                if self.selected == Some(*tower) && *owner != Owner::Faction(self.player) {
                    self.selected = None;
                }
            }
        }

        let Some(pointer) = pointer else {
            return;
        };
        if pointer.kind != PointerKind::Down {
            return;
        }
        let Some(&hit) = pointer.hits.first() else {
            return;
        };

        match self.selected {
            None => {
                let owned = towers
                    .get(hit)
                    .is_some_and(|tower| tower.owner == Owner::Faction(self.player));
                if owned {
                    self.selected = Some(hit);
                }
            }
            Some(selected) if selected == hit => self.selected = None,
            Some(selected) => {
                out.push(Command::RequestLink {
                    from: selected,
                    to: hit,
                });
                self.selected = None;
            }
        }
    }
}
