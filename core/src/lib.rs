#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Pattern Recall engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the pure generation systems. Adapters submit
//! [`Command`] values describing player intent and elapsed time, the world
//! executes those commands via its `apply` entry point, and then reports
//! [`Event`] values describing every transition it performed. Systems receive
//! grid shapes and level descriptors from this crate and answer with target
//! sets and reveal plans built from the types declared here.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use thiserror::Error;

/// Title shown in the window caption and the HUD banner.
pub const GAME_TITLE: &str = "Pattern Recognition";

/// Number of failed rounds after which the session ends.
pub const MISTAKE_LIMIT: u32 = 4;

/// Lives displayed to the player before any mistake was made.
pub const STARTING_LIVES: u32 = 3;

/// Time the colored answer overlay stays visible after a submission.
pub const FEEDBACK_DURATION: Duration = Duration::from_millis(1_000);

/// Ordered set of grid cells.
///
/// An ordered container keeps iteration deterministic so seeded sessions
/// replay identically.
pub type CellSet = BTreeSet<Cell>;

/// Per-cell verdict produced when an answer is checked.
pub type FeedbackMap = BTreeMap<Cell, CellFeedback>;

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    row: u32,
    column: u32,
}

impl Cell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}

/// Dimensions of the playing grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    rows: u32,
    columns: u32,
}

impl GridShape {
    /// Creates a new grid shape.
    #[must_use]
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let total = u64::from(self.rows) * u64::from(self.columns);
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.column < self.columns
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| Cell::new(row, column)))
    }

    /// Returns the in-bounds 4-directional neighbours of the cell.
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        let mut out = Vec::with_capacity(4);
        let Cell { row, column } = cell;
        if row + 1 < self.rows {
            out.push(Cell::new(row + 1, column));
        }
        if row > 0 {
            out.push(Cell::new(row - 1, column));
        }
        if column + 1 < self.columns {
            out.push(Cell::new(row, column + 1));
        }
        if column > 0 {
            out.push(Cell::new(row, column - 1));
        }
        out
    }
}

/// Static tuning associated with a single level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelConfig {
    /// Grid dimensions used by every round of the level.
    pub shape: GridShape,
    /// How long the full pattern stays visible in the single-step reveal.
    pub reveal_duration: Duration,
    /// Smallest number of target cells a round may contain.
    pub min_targets: usize,
    /// Largest number of target cells a round may contain before clamping to the grid.
    pub max_targets: usize,
    /// Probability of generating a scattered rather than clustered pattern.
    pub scatter_chance: f64,
}

impl LevelConfig {
    /// Inclusive target-count range after clamping the upper bound to the grid size.
    #[must_use]
    pub fn target_range(&self) -> (usize, usize) {
        let hi = self.max_targets.min(self.shape.cell_count());
        (self.min_targets.min(hi), hi)
    }
}

/// Number of levels in a full session.
pub const LEVEL_COUNT: usize = 5;

const LEVELS: [LevelConfig; LEVEL_COUNT] = [
    LevelConfig {
        shape: GridShape::new(2, 2),
        reveal_duration: Duration::from_millis(2_500),
        min_targets: 2,
        max_targets: 4,
        scatter_chance: 0.2,
    },
    LevelConfig {
        shape: GridShape::new(2, 4),
        reveal_duration: Duration::from_millis(1_800),
        min_targets: 3,
        max_targets: 6,
        scatter_chance: 0.4,
    },
    LevelConfig {
        shape: GridShape::new(3, 4),
        reveal_duration: Duration::from_millis(1_200),
        min_targets: 5,
        max_targets: 8,
        scatter_chance: 0.6,
    },
    LevelConfig {
        shape: GridShape::new(4, 4),
        reveal_duration: Duration::from_millis(800),
        min_targets: 6,
        max_targets: 10,
        scatter_chance: 0.75,
    },
    LevelConfig {
        shape: GridShape::new(4, 5),
        reveal_duration: Duration::from_millis(600),
        min_targets: 8,
        max_targets: 12,
        scatter_chance: 0.9,
    },
];

/// Zero-based index into the fixed level table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    /// The level every session starts on.
    pub const FIRST: Level = Level(0);

    /// The final level; a perfect round here completes the session.
    pub const LAST: Level = Level(LEVEL_COUNT as u8 - 1);

    /// Creates a level from its zero-based index.
    pub fn new(index: usize) -> Result<Self, LevelError> {
        if index < LEVEL_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(LevelError::OutOfRange {
                index,
                count: LEVEL_COUNT,
            })
        }
    }

    /// Iterates over every level in order.
    pub fn all() -> impl Iterator<Item = Level> {
        (0..LEVEL_COUNT as u8).map(Level)
    }

    /// Zero-based index of the level.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// One-based level number presented to players.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.0 as u32 + 1
    }

    /// Reports whether this is the final level.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.0 as usize + 1 == LEVEL_COUNT
    }

    /// Following level, if any.
    #[must_use]
    pub const fn next(&self) -> Option<Level> {
        if self.is_last() {
            None
        } else {
            Some(Level(self.0 + 1))
        }
    }

    /// Static tuning for the level.
    #[must_use]
    pub fn config(&self) -> &'static LevelConfig {
        &LEVELS[self.index()]
    }

    /// Grid dimensions for the level.
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.config().shape
    }
}

/// Errors raised when constructing core descriptors.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    /// The index does not name one of the fixed levels.
    #[error("level index {index} is out of range (expected < {count})")]
    OutOfRange {
        /// Provided index that failed validation.
        index: usize,
        /// Number of levels available.
        count: usize,
    },
}

/// Score awarded for a perfect round with the given target count.
#[must_use]
pub fn score_for_perfect_round(target_count: usize, level: Level) -> u32 {
    let targets = u32::try_from(target_count).unwrap_or(u32::MAX);
    targets.saturating_add(level.number() * 2)
}

/// Strategy used to lay out the target cells of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatternMode {
    /// Cells kept apart so no two targets touch edge to edge.
    Scatter,
    /// Cells grown outward from a seed so they tend to touch.
    Cluster,
}

/// Staging strategy used while revealing the targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealMode {
    /// Every target lit at once.
    Full,
    /// Left and right halves lit one after the other.
    Sides,
    /// One 2×2 block lit at a time.
    Sections4,
    /// One target at a time following a boustrophedon walk.
    Snake,
}

impl RevealMode {
    /// All reveal modes in declaration order.
    pub const ALL: [RevealMode; 4] = [
        RevealMode::Full,
        RevealMode::Sides,
        RevealMode::Sections4,
        RevealMode::Snake,
    ];
}

/// One timed phase of the reveal during which a subset of targets is lit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealStep {
    /// Cells lit during this step.
    pub cells: CellSet,
    /// How long the step stays visible.
    pub duration: Duration,
}

impl RevealStep {
    /// Creates a new reveal step.
    #[must_use]
    pub fn new(cells: CellSet, duration: Duration) -> Self {
        Self { cells, duration }
    }
}

/// Ordered sequence of reveal steps for one round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealPlan {
    mode: RevealMode,
    steps: Vec<RevealStep>,
}

impl RevealPlan {
    /// Creates a plan from its mode and steps.
    #[must_use]
    pub fn new(mode: RevealMode, steps: Vec<RevealStep>) -> Self {
        Self { mode, steps }
    }

    /// Staging strategy that produced the plan.
    #[must_use]
    pub const fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Steps in presentation order.
    #[must_use]
    pub fn steps(&self) -> &[RevealStep] {
        &self.steps
    }

    /// Number of steps in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the plan has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at the provided index, if any.
    #[must_use]
    pub fn step(&self, index: usize) -> Option<&RevealStep> {
        self.steps.get(index)
    }

    /// Union of the cells lit across every step.
    #[must_use]
    pub fn union(&self) -> CellSet {
        self.steps
            .iter()
            .flat_map(|step| step.cells.iter().copied())
            .collect()
    }

    /// Total time needed to play every step.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }
}

/// Lifecycle phase of the current round or session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// Targets are being shown step by step.
    Reveal,
    /// The player is selecting cells.
    Input,
    /// The colored answer overlay is visible.
    Feedback,
    /// The session ended after too many mistakes.
    GameOver,
    /// The session ended after clearing the final level.
    Congrats,
}

impl RoundPhase {
    /// Reports whether the phase ends the session.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver | Self::Congrats)
    }
}

/// Verdict recorded for a single cell during feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellFeedback {
    /// The cell was a target and the player picked it.
    Correct,
    /// The cell was missed or picked without being a target.
    Wrong,
}

/// Display class the renderer uses when drawing a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellDisplay {
    /// Unlit cell.
    #[default]
    Idle,
    /// Target lit by the current reveal step.
    Lit,
    /// Correctly picked target.
    Correct,
    /// Missed target or extra pick.
    Wrong,
}

impl From<CellFeedback> for CellDisplay {
    fn from(feedback: CellFeedback) -> Self {
        match feedback {
            CellFeedback::Correct => Self::Correct,
            CellFeedback::Wrong => Self::Wrong,
        }
    }
}

/// Values shown in the heads-up display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Hud {
    /// One-based level number.
    pub level: u32,
    /// Number of levels in the session.
    pub level_count: u32,
    /// Accumulated score.
    pub score: u32,
    /// Remaining lives, never negative.
    pub lives: u32,
}

impl Hud {
    /// Builds the HUD values from raw session counters.
    #[must_use]
    pub fn from_counters(level: Level, score: u32, mistakes: u32) -> Self {
        Self {
            level: level.number(),
            level_count: LEVEL_COUNT as u32,
            score,
            lives: STARTING_LIVES.saturating_sub(mistakes),
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Toggles the player's selection of a cell.
    TogglePick {
        /// Cell the player pointed at.
        cell: Cell,
    },
    /// Submits the current selection for checking.
    Confirm,
    /// Starts a fresh session after it ended.
    Restart,
}

/// Reasons an input command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputRejection {
    /// The command is not accepted in the current phase.
    WrongPhase {
        /// Phase active when the command arrived.
        phase: RoundPhase,
    },
    /// The cell lies outside the grid.
    OutOfBounds {
        /// Cell supplied with the command.
        cell: Cell,
    },
}

/// Way a session came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// The mistake limit was reached.
    GameOver,
    /// The final level was cleared.
    Congrats,
}

impl From<SessionOutcome> for RoundPhase {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::GameOver => Self::GameOver,
            SessionOutcome::Congrats => Self::Congrats,
        }
    }
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A new round began revealing its targets.
    RoundStarted {
        /// Level the round belongs to.
        level: Level,
        /// Number of target cells in the round.
        target_count: usize,
        /// Strategy used to place the targets.
        pattern: PatternMode,
        /// Strategy used to stage the reveal.
        reveal: RevealMode,
    },
    /// A later reveal step became current.
    RevealStepShown {
        /// Zero-based index of the step now shown.
        index: usize,
    },
    /// The reveal finished and the player may pick cells.
    InputOpened,
    /// A cell was added to or removed from the selection.
    PickToggled {
        /// Cell whose selection changed.
        cell: Cell,
        /// Whether the cell is selected after the toggle.
        picked: bool,
    },
    /// The selection was checked against the targets.
    AnswerChecked {
        /// Whether the selection matched the targets exactly.
        perfect: bool,
        /// Points awarded for the round.
        gained: u32,
        /// Score after the check.
        score: u32,
        /// Mistakes after the check.
        mistakes: u32,
    },
    /// The session moved on to a harder level.
    LevelAdvanced {
        /// Level that became active.
        level: Level,
    },
    /// The session reached a terminal phase.
    SessionEnded {
        /// How the session ended.
        outcome: SessionOutcome,
        /// Final score.
        score: u32,
    },
    /// Counters were cleared after a restart request.
    SessionReset,
    /// An input command was ignored.
    InputRejected {
        /// Why the command was ignored.
        reason: InputRejection,
    },
}
