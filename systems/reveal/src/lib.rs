#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure reveal planning system that stages how a round's targets are shown.
//!
//! Every plan lights each target in exactly one step. The staging mode is
//! drawn uniformly from [`RevealMode::ALL`], and the random source is provided
//! by the caller so the world can replay seeded sessions.

use std::time::Duration;

use pattern_recall_core::{Cell, CellSet, GridShape, Level, RevealMode, RevealPlan, RevealStep};
use rand::{seq::SliceRandom, Rng};

/// Duration of each half shown by the sides mode.
pub const SIDES_STEP: Duration = Duration::from_millis(500);
/// Duration of the single sides step used when no half holds a target.
pub const SIDES_FALLBACK: Duration = Duration::from_millis(800);
/// Duration of each block shown by the sections mode.
pub const SECTIONS_STEP: Duration = Duration::from_millis(300);
/// Duration of the single sections step used when no block holds a target.
pub const SECTIONS_FALLBACK: Duration = Duration::from_millis(700);
/// Duration of each cell shown by the snake mode.
pub const SNAKE_STEP: Duration = Duration::from_millis(300);
/// Duration of the single snake step used when there are no targets.
pub const SNAKE_FALLBACK: Duration = Duration::from_millis(700);

const SECTION_SIZE: u32 = 2;

/// Pure system that turns a target set into a timed reveal plan.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevealPlanner;

impl RevealPlanner {
    /// Creates a new reveal planner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Plans the reveal using a uniformly chosen staging mode.
    pub fn plan<R: Rng>(
        &self,
        shape: GridShape,
        targets: &CellSet,
        level: Level,
        rng: &mut R,
    ) -> RevealPlan {
        let mode = RevealMode::ALL
            .choose(rng)
            .copied()
            .unwrap_or(RevealMode::Full);
        self.plan_with_mode(mode, shape, targets, level, rng)
    }

    /// Plans the reveal with an explicit staging mode.
    pub fn plan_with_mode<R: Rng>(
        &self,
        mode: RevealMode,
        shape: GridShape,
        targets: &CellSet,
        level: Level,
        rng: &mut R,
    ) -> RevealPlan {
        let steps = match mode {
            RevealMode::Full => vec![RevealStep::new(
                targets.clone(),
                level.config().reveal_duration,
            )],
            RevealMode::Sides => sides(shape, targets, rng),
            RevealMode::Sections4 => sections(shape, targets, rng),
            RevealMode::Snake => snake(shape, targets),
        };

        log::trace!(
            "planned {mode:?} reveal with {} steps for {} targets",
            steps.len(),
            targets.len()
        );
        RevealPlan::new(mode, steps)
    }
}

fn sides<R: Rng>(shape: GridShape, targets: &CellSet, rng: &mut R) -> Vec<RevealStep> {
    let split = shape.columns() / 2;
    let (left, right): (CellSet, CellSet) =
        targets.iter().partition(|cell| cell.column() < split);

    let mut steps: Vec<RevealStep> = [left, right]
        .into_iter()
        .filter(|half| !half.is_empty())
        .map(|half| RevealStep::new(half, SIDES_STEP))
        .collect();
    if steps.is_empty() {
        return vec![RevealStep::new(targets.clone(), SIDES_FALLBACK)];
    }
    steps.shuffle(rng);
    steps
}

fn sections<R: Rng>(shape: GridShape, targets: &CellSet, rng: &mut R) -> Vec<RevealStep> {
    let mut blocks: Vec<CellSet> = section_blocks(shape)
        .into_iter()
        .map(|block| block.intersection(targets).copied().collect::<CellSet>())
        .filter(|hits| !hits.is_empty())
        .collect();
    if blocks.is_empty() {
        return vec![RevealStep::new(targets.clone(), SECTIONS_FALLBACK)];
    }
    blocks.shuffle(rng);
    blocks
        .into_iter()
        .map(|block| RevealStep::new(block, SECTIONS_STEP))
        .collect()
}

/// Partitions the grid into 2×2 blocks listed in row-major order.
///
/// Blocks on the bottom or right edge are smaller when the grid has an odd
/// number of rows or columns.
#[must_use]
pub fn section_blocks(shape: GridShape) -> Vec<CellSet> {
    let mut blocks = Vec::new();
    for top in (0..shape.rows()).step_by(SECTION_SIZE as usize) {
        for left in (0..shape.columns()).step_by(SECTION_SIZE as usize) {
            let bottom = (top + SECTION_SIZE).min(shape.rows());
            let right = (left + SECTION_SIZE).min(shape.columns());
            blocks.push(
                (top..bottom)
                    .flat_map(|row| (left..right).map(move |column| Cell::new(row, column)))
                    .collect(),
            );
        }
    }
    blocks
}

fn snake(shape: GridShape, targets: &CellSet) -> Vec<RevealStep> {
    let steps: Vec<RevealStep> = snake_order(shape)
        .filter(|cell| targets.contains(cell))
        .map(|cell| RevealStep::new(CellSet::from([cell]), SNAKE_STEP))
        .collect();
    if steps.is_empty() {
        return vec![RevealStep::new(targets.clone(), SNAKE_FALLBACK)];
    }
    steps
}

/// Walks the grid top to bottom, alternating column direction on each row.
pub fn snake_order(shape: GridShape) -> impl Iterator<Item = Cell> {
    let columns = shape.columns();
    (0..shape.rows()).flat_map(move |row| {
        let forward = row % 2 == 0;
        (0..columns).map(move |step| {
            let column = if forward { step } else { columns - 1 - step };
            Cell::new(row, column)
        })
    })
}
