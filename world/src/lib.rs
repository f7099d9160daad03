#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Pattern Recall.
//!
//! The world owns the level, score and mistake counters together with the
//! active [`Round`]. It is mutated exclusively through [`apply`] and observed
//! through the [`query`] module.

mod round;

use std::time::Duration;

use pattern_recall_core::{
    score_for_perfect_round, Command, Event, InputRejection, Level, RoundPhase, SessionOutcome,
    MISTAKE_LIMIT,
};
use pattern_recall_system_pattern::PatternGenerator;
use pattern_recall_system_reveal::RevealPlanner;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use round::{Round, RoundTransition};

/// Parameters used to construct a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Seed feeding every random draw made by the session.
    pub rng_seed: u64,
}

impl Config {
    /// Creates a configuration with the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Represents the authoritative Pattern Recall session state.
#[derive(Debug)]
pub struct World {
    rng: ChaCha8Rng,
    generator: PatternGenerator,
    planner: RevealPlanner,
    now: Duration,
    level: Level,
    score: u32,
    mistakes: u32,
    round: Round,
    ending: Option<SessionOutcome>,
}

impl World {
    /// Creates a world whose first round starts revealing immediately.
    ///
    /// The opening [`Event::RoundStarted`] is dropped; use [`World::start`] to
    /// observe it.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::start(config, &mut Vec::new())
    }

    /// Creates a world like [`World::new`], reporting the opening round in
    /// `out_events`.
    #[must_use]
    pub fn start(config: Config, out_events: &mut Vec<Event>) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        let generator = PatternGenerator::new();
        let planner = RevealPlanner::new();
        let (round, event) = spawn_round(
            &generator,
            &planner,
            &mut rng,
            Level::FIRST,
            Duration::ZERO,
        );
        out_events.push(event);
        Self {
            rng,
            generator,
            planner,
            now: Duration::ZERO,
            level: Level::FIRST,
            score: 0,
            mistakes: 0,
            round,
            ending: None,
        }
    }

    fn phase(&self) -> RoundPhase {
        self.ending
            .map_or_else(|| self.round.phase(), RoundPhase::from)
    }

    fn start_round(&mut self, out_events: &mut Vec<Event>) {
        let (round, event) = spawn_round(
            &self.generator,
            &self.planner,
            &mut self.rng,
            self.level,
            self.now,
        );
        self.round = round;
        out_events.push(event);
    }

    fn end_session(&mut self, outcome: SessionOutcome, out_events: &mut Vec<Event>) {
        log::info!(
            "session ended with {outcome:?} at level {} with score {}",
            self.level.number(),
            self.score
        );
        self.ending = Some(outcome);
        out_events.push(Event::SessionEnded {
            outcome,
            score: self.score,
        });
    }

    fn resolve_feedback(&mut self, perfect: bool, out_events: &mut Vec<Event>) {
        if self.mistakes >= MISTAKE_LIMIT {
            self.end_session(SessionOutcome::GameOver, out_events);
            return;
        }

        if perfect {
            match self.level.next() {
                Some(next) => {
                    log::debug!("advancing to level {}", next.number());
                    self.level = next;
                    out_events.push(Event::LevelAdvanced { level: next });
                }
                None => {
                    self.end_session(SessionOutcome::Congrats, out_events);
                    return;
                }
            }
        }

        self.start_round(out_events);
    }

    fn advance_timers(&mut self, out_events: &mut Vec<Event>) {
        if self.ending.is_some() {
            return;
        }

        match self.round.advance(self.now) {
            Some(RoundTransition::StepShown { index }) => {
                log::debug!("reveal step {index} shown");
                out_events.push(Event::RevealStepShown { index });
            }
            Some(RoundTransition::InputOpened) => {
                log::debug!("reveal finished, awaiting picks");
                out_events.push(Event::InputOpened);
            }
            Some(RoundTransition::FeedbackElapsed { perfect }) => {
                self.resolve_feedback(perfect, out_events);
            }
            None => {}
        }
    }

    fn reject(&self, reason: InputRejection, out_events: &mut Vec<Event>) {
        log::trace!("ignoring input: {reason:?}");
        out_events.push(Event::InputRejected { reason });
    }

    fn input_round(&mut self) -> Result<&mut Round, InputRejection> {
        match self.ending {
            Some(outcome) => Err(InputRejection::WrongPhase {
                phase: outcome.into(),
            }),
            None => Ok(&mut self.round),
        }
    }

    fn confirm(&mut self, out_events: &mut Vec<Event>) -> Result<(), InputRejection> {
        let now = self.now;
        let round = self.input_round()?;
        let perfect = round.check_answer(now)?;
        let target_count = round.targets().len();

        let gained = if perfect {
            score_for_perfect_round(target_count, self.level)
        } else {
            self.mistakes = self.mistakes.saturating_add(1);
            0
        };
        self.score = self.score.saturating_add(gained);

        log::debug!(
            "answer checked: perfect={perfect} gained={gained} score={} mistakes={}",
            self.score,
            self.mistakes
        );
        out_events.push(Event::AnswerChecked {
            perfect,
            gained,
            score: self.score,
            mistakes: self.mistakes,
        });
        Ok(())
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) -> Result<(), InputRejection> {
        if self.ending.is_none() {
            return Err(InputRejection::WrongPhase {
                phase: self.round.phase(),
            });
        }

        log::info!("restarting session");
        self.ending = None;
        self.level = Level::FIRST;
        self.score = 0;
        self.mistakes = 0;
        out_events.push(Event::SessionReset);
        self.start_round(out_events);
        Ok(())
    }
}

fn spawn_round(
    generator: &PatternGenerator,
    planner: &RevealPlanner,
    rng: &mut ChaCha8Rng,
    level: Level,
    now: Duration,
) -> (Round, Event) {
    let shape = level.shape();
    let pattern = generator.generate(shape, level, rng);
    let plan = planner.plan(shape, &pattern.cells, level, rng);

    log::debug!(
        "round started at level {}: {} {:?} targets, {:?} reveal in {} steps",
        level.number(),
        pattern.cells.len(),
        pattern.mode,
        plan.mode(),
        plan.len()
    );
    let event = Event::RoundStarted {
        level,
        target_count: pattern.cells.len(),
        pattern: pattern.mode,
        reveal: plan.mode(),
    };
    (Round::new(level, shape, pattern.cells, plan, now), event)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::Tick { dt } => {
            world.now = world.now.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_timers(out_events);
            Ok(())
        }
        Command::TogglePick { cell } => world
            .input_round()
            .and_then(|round| round.toggle_pick(cell))
            .map(|picked| out_events.push(Event::PickToggled { cell, picked })),
        Command::Confirm => world.confirm(out_events),
        Command::Restart => world.restart(out_events),
    };

    if let Err(reason) = outcome {
        world.reject(reason, out_events);
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Round, World};
    use pattern_recall_core::{
        Cell, CellDisplay, CellSet, FeedbackMap, GridShape, Hud, Level, RevealPlan, RoundPhase,
    };

    /// Phase of the session, including the terminal phases.
    #[must_use]
    pub fn phase(world: &World) -> RoundPhase {
        world.phase()
    }

    /// Level currently being played.
    #[must_use]
    pub fn level(world: &World) -> Level {
        world.level
    }

    /// Accumulated score of the session.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Number of failed rounds in the session.
    #[must_use]
    pub fn mistakes(world: &World) -> u32 {
        world.mistakes
    }

    /// Remaining lives shown to the player.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        hud(world).lives
    }

    /// Values presented in the heads-up display.
    #[must_use]
    pub fn hud(world: &World) -> Hud {
        Hud::from_counters(world.level, world.score, world.mistakes)
    }

    /// Grid dimensions of the active round.
    #[must_use]
    pub fn grid_shape(world: &World) -> GridShape {
        world.round.shape()
    }

    /// Provides read-only access to the active round.
    #[must_use]
    pub fn round(world: &World) -> &Round {
        &world.round
    }

    /// Target cells of the active round.
    #[must_use]
    pub fn targets(world: &World) -> &CellSet {
        world.round.targets()
    }

    /// Cells picked in the active round.
    #[must_use]
    pub fn picks(world: &World) -> &CellSet {
        world.round.picks()
    }

    /// Verdicts produced by the last answer check of the active round.
    #[must_use]
    pub fn feedback(world: &World) -> &FeedbackMap {
        world.round.feedback()
    }

    /// Reveal plan of the active round.
    #[must_use]
    pub fn reveal_plan(world: &World) -> &RevealPlan {
        world.round.plan()
    }

    /// Cells lit by the reveal step currently shown.
    #[must_use]
    pub fn lit_cells(world: &World) -> CellSet {
        if world.ending.is_some() {
            CellSet::new()
        } else {
            world.round.lit_cells()
        }
    }

    /// Display class of a single cell.
    #[must_use]
    pub fn cell_display(world: &World, cell: Cell) -> CellDisplay {
        if world.ending.is_some() {
            CellDisplay::Idle
        } else {
            world.round.cell_display(cell)
        }
    }

    /// Captures every cell of the grid in row-major order.
    #[must_use]
    pub fn board(world: &World) -> Vec<CellSnapshot> {
        let terminal = world.ending.is_some();
        world
            .round
            .shape()
            .cells()
            .map(|cell| CellSnapshot {
                cell,
                display: cell_display(world, cell),
                picked: !terminal && world.round.shows_pick(cell),
            })
            .collect()
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Immutable description of how a single cell should be drawn.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CellSnapshot {
        /// Cell being described.
        pub cell: Cell,
        /// Display class of the cell.
        pub display: CellDisplay,
        /// Whether the pick overlay is drawn on top of the cell.
        pub picked: bool,
    }
}
