//! Frame driver that feeds adapter input into the world and mirrors it into scenes.

use std::time::Duration;

use pattern_recall_core::{Command, Event};
use pattern_recall_rendering::{
    CellPresentation, FrameInput, GridLayout, HudPresentation, Overlay, RenderingError, Scene,
    BOARD_RECT, CELL_GAP,
};
use pattern_recall_world::{apply, query, Config, World};

/// Owns the world and the event buffer reused across frames.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    events: Vec<Event>,
}

impl Simulation {
    pub(crate) fn new(seed: u64) -> Self {
        let mut events = Vec::new();
        let world = World::start(Config::new(seed), &mut events);
        Self { world, events }
    }

    /// Builds the scene describing the current world state.
    pub(crate) fn scene(&self) -> Result<Scene, RenderingError> {
        let world = &self.world;
        let layout = GridLayout::fit(query::grid_shape(world), BOARD_RECT, CELL_GAP)?;
        let cells = query::board(world)
            .into_iter()
            .map(|snapshot| CellPresentation {
                cell: snapshot.cell,
                display: snapshot.display,
                picked: snapshot.picked,
            })
            .collect();
        let phase = query::phase(world);

        Ok(Scene::new(
            phase,
            layout,
            cells,
            HudPresentation::from_hud(&query::hud(world)),
            Overlay::for_phase(phase, query::score(world)),
        ))
    }

    /// Applies the frame's input, advances time and refreshes the scene.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        for command in commands_for_input(input) {
            apply(&mut self.world, command, &mut self.events);
        }
        apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        for event in self.events.drain(..) {
            if !matches!(event, Event::TimeAdvanced { .. }) {
                log::trace!("{event:?}");
            }
        }

        match self.scene() {
            Ok(next) => *scene = next,
            Err(error) => log::error!("failed to rebuild scene: {error}"),
        }
    }
}

/// Translates one frame of adapter input into world commands.
pub(crate) fn commands_for_input(input: FrameInput) -> Vec<Command> {
    let mut commands = Vec::with_capacity(3);
    if let Some(cell) = input.pointer_cell {
        commands.push(Command::TogglePick { cell });
    }
    if input.confirm {
        commands.push(Command::Confirm);
    }
    if input.restart {
        commands.push(Command::Restart);
    }
    commands
}
