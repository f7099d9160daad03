#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure pattern generation system that chooses the target cells of a round.
//!
//! Two layouts exist. Cluster patterns grow outward from a random seed cell and
//! tend to form connected blobs, although nothing guarantees contiguity.
//! Scatter patterns keep every pair of targets at a Manhattan distance greater
//! than one, falling back to unconstrained cells when the shuffled traversal
//! cannot place enough spaced targets. The random source is always supplied by
//! the caller so seeded sessions replay identically.

use pattern_recall_core::{Cell, CellSet, GridShape, Level, PatternMode};
use rand::{seq::SliceRandom, Rng};

/// Target cells chosen for a round together with the layout that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPattern {
    /// Layout strategy used to place the targets.
    pub mode: PatternMode,
    /// Chosen target cells.
    pub cells: CellSet,
}

/// Pure system that produces target sets for a level.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternGenerator;

impl PatternGenerator {
    /// Creates a new pattern generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates the targets of a round played on `shape` at `level`.
    pub fn generate<R: Rng>(
        &self,
        shape: GridShape,
        level: Level,
        rng: &mut R,
    ) -> GeneratedPattern {
        let count = self.target_count(shape, level, rng);
        let mode = self.choose_mode(level, rng);
        let cells = match mode {
            PatternMode::Scatter => scatter(shape, count, rng),
            PatternMode::Cluster => cluster(shape, count, rng),
        };

        GeneratedPattern { mode, cells }
    }

    /// Draws the number of targets uniformly from the level's range clamped to the grid.
    pub fn target_count<R: Rng>(&self, shape: GridShape, level: Level, rng: &mut R) -> usize {
        let config = level.config();
        let hi = config.max_targets.min(shape.cell_count());
        let lo = config.min_targets.min(hi);
        rng.gen_range(lo..=hi)
    }

    /// Picks scatter mode with the level's scatter chance, cluster mode otherwise.
    pub fn choose_mode<R: Rng>(&self, level: Level, rng: &mut R) -> PatternMode {
        if rng.gen_bool(level.config().scatter_chance) {
            PatternMode::Scatter
        } else {
            PatternMode::Cluster
        }
    }
}

/// Grows a pattern of `count` cells outward from a random seed cell.
///
/// Each iteration extends from a random already-chosen cell into one of its
/// free 4-neighbours. When that cell is boxed in, a random grid cell is tried
/// instead, which may already be chosen and then changes nothing.
pub fn cluster<R: Rng>(shape: GridShape, count: usize, rng: &mut R) -> CellSet {
    let count = count.min(shape.cell_count());
    let mut chosen = CellSet::new();
    if count == 0 {
        return chosen;
    }

    let start = random_cell(shape, rng);
    let _ = chosen.insert(start);
    let mut order = vec![start];

    while chosen.len() < count {
        let base = order[rng.gen_range(0..order.len())];
        let open: Vec<Cell> = shape
            .neighbors(base)
            .into_iter()
            .filter(|neighbor| !chosen.contains(neighbor))
            .collect();
        let next = match open.choose(rng) {
            Some(&neighbor) => neighbor,
            None => random_cell(shape, rng),
        };
        if chosen.insert(next) {
            order.push(next);
        }
    }

    chosen
}

/// Places `count` cells so that no two touch edge to edge whenever possible.
///
/// Cells are visited in shuffled order and accepted only when their Manhattan
/// distance to every accepted cell exceeds one. If the traversal ends short,
/// the remaining slots are filled with unchosen cells in the same shuffled
/// order regardless of spacing.
pub fn scatter<R: Rng>(shape: GridShape, count: usize, rng: &mut R) -> CellSet {
    let count = count.min(shape.cell_count());
    let mut cells: Vec<Cell> = shape.cells().collect();
    cells.shuffle(rng);

    let mut chosen: Vec<Cell> = Vec::with_capacity(count);
    for &cell in &cells {
        if chosen.len() == count {
            break;
        }
        if chosen
            .iter()
            .all(|accepted| accepted.manhattan_distance(cell) > 1)
        {
            chosen.push(cell);
        }
    }

    if chosen.len() < count {
        log::trace!(
            "scatter placed {} of {count} spaced cells on {}x{}, filling the rest",
            chosen.len(),
            shape.rows(),
            shape.columns()
        );
        for &cell in &cells {
            if chosen.len() == count {
                break;
            }
            if !chosen.contains(&cell) {
                chosen.push(cell);
            }
        }
    }

    chosen.into_iter().collect()
}

fn random_cell<R: Rng>(shape: GridShape, rng: &mut R) -> Cell {
    Cell::new(
        rng.gen_range(0..shape.rows()),
        rng.gen_range(0..shape.columns()),
    )
}
