//! Per-round state machine covering the reveal, input and feedback phases.

use std::time::Duration;

use pattern_recall_core::{
    Cell, CellDisplay, CellFeedback, CellSet, FeedbackMap, GridShape, InputRejection, Level,
    RevealPlan, RoundPhase, FEEDBACK_DURATION,
};

/// Timer-driven transition reported by [`Round::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundTransition {
    /// A later reveal step became current.
    StepShown {
        /// Zero-based index of the step now shown.
        index: usize,
    },
    /// The reveal finished and input opened.
    InputOpened,
    /// The feedback overlay expired.
    FeedbackElapsed {
        /// Whether the checked answer matched the targets exactly.
        perfect: bool,
    },
}

/// State owned by a single round, discarded when the next round starts.
#[derive(Clone, Debug)]
pub struct Round {
    level: Level,
    shape: GridShape,
    targets: CellSet,
    picks: CellSet,
    feedback: FeedbackMap,
    plan: RevealPlan,
    phase: RoundPhase,
    step: usize,
    stamp: Duration,
}

impl Round {
    /// Starts a round in the reveal phase with its first step shown at `now`.
    #[must_use]
    pub fn new(
        level: Level,
        shape: GridShape,
        targets: CellSet,
        plan: RevealPlan,
        now: Duration,
    ) -> Self {
        Self {
            level,
            shape,
            targets,
            picks: CellSet::new(),
            feedback: FeedbackMap::new(),
            plan,
            phase: RoundPhase::Reveal,
            step: 0,
            stamp: now,
        }
    }

    /// Advances the timers of the round to `now`.
    ///
    /// At most one transition happens per call. A reveal step that expires
    /// hands over to the next step stamped at `now`, and expiry of the last
    /// step opens input immediately.
    pub fn advance(&mut self, now: Duration) -> Option<RoundTransition> {
        let elapsed = now.saturating_sub(self.stamp);
        match self.phase {
            RoundPhase::Reveal => {
                let expired = self
                    .plan
                    .step(self.step)
                    .map_or(true, |step| elapsed >= step.duration);
                if !expired {
                    return None;
                }
                if self.step + 1 < self.plan.len() {
                    self.step += 1;
                    self.stamp = now;
                    Some(RoundTransition::StepShown { index: self.step })
                } else {
                    self.phase = RoundPhase::Input;
                    self.stamp = now;
                    Some(RoundTransition::InputOpened)
                }
            }
            RoundPhase::Feedback if elapsed > FEEDBACK_DURATION => {
                Some(RoundTransition::FeedbackElapsed {
                    perfect: !self.has_wrong_feedback(),
                })
            }
            _ => None,
        }
    }

    /// Adds the cell to the picks when absent and removes it otherwise.
    ///
    /// Returns whether the cell is picked after the toggle.
    pub fn toggle_pick(&mut self, cell: Cell) -> Result<bool, InputRejection> {
        self.expect_input()?;
        if !self.shape.contains(cell) {
            return Err(InputRejection::OutOfBounds { cell });
        }

        if self.picks.remove(&cell) {
            Ok(false)
        } else {
            let _ = self.picks.insert(cell);
            Ok(true)
        }
    }

    /// Compares the picks with the targets and enters the feedback phase.
    ///
    /// Returns whether the picks matched the targets exactly.
    pub fn check_answer(&mut self, now: Duration) -> Result<bool, InputRejection> {
        self.expect_input()?;

        let mut feedback = FeedbackMap::new();
        for &cell in self.targets.intersection(&self.picks) {
            let _ = feedback.insert(cell, CellFeedback::Correct);
        }
        for &cell in self.picks.symmetric_difference(&self.targets) {
            let _ = feedback.insert(cell, CellFeedback::Wrong);
        }

        self.feedback = feedback;
        self.phase = RoundPhase::Feedback;
        self.stamp = now;
        Ok(self.picks == self.targets)
    }

    fn expect_input(&self) -> Result<(), InputRejection> {
        if self.phase == RoundPhase::Input {
            Ok(())
        } else {
            Err(InputRejection::WrongPhase { phase: self.phase })
        }
    }

    /// Reports whether the last check marked any cell as wrong.
    #[must_use]
    pub fn has_wrong_feedback(&self) -> bool {
        self.feedback
            .values()
            .any(|verdict| *verdict == CellFeedback::Wrong)
    }

    /// Cells lit by the current reveal step, empty outside the reveal.
    #[must_use]
    pub fn lit_cells(&self) -> CellSet {
        match (self.phase, self.plan.step(self.step)) {
            (RoundPhase::Reveal, Some(step)) => step.cells.clone(),
            _ => CellSet::new(),
        }
    }

    /// Display class of the cell in the current phase.
    #[must_use]
    pub fn cell_display(&self, cell: Cell) -> CellDisplay {
        match self.phase {
            RoundPhase::Reveal => match self.plan.step(self.step) {
                Some(step) if step.cells.contains(&cell) => CellDisplay::Lit,
                _ => CellDisplay::Idle,
            },
            RoundPhase::Feedback => self
                .feedback
                .get(&cell)
                .copied()
                .map_or(CellDisplay::Idle, CellDisplay::from),
            _ => CellDisplay::Idle,
        }
    }

    /// Reports whether the cell is drawn with the pick overlay.
    #[must_use]
    pub fn shows_pick(&self, cell: Cell) -> bool {
        matches!(self.phase, RoundPhase::Input | RoundPhase::Feedback)
            && self.picks.contains(&cell)
    }

    /// Level the round belongs to.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Grid the round is played on.
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Current phase of the round.
    #[must_use]
    pub const fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Cells the player must pick.
    #[must_use]
    pub fn targets(&self) -> &CellSet {
        &self.targets
    }

    /// Cells the player has picked so far.
    #[must_use]
    pub fn picks(&self) -> &CellSet {
        &self.picks
    }

    /// Verdicts recorded by the last answer check.
    #[must_use]
    pub fn feedback(&self) -> &FeedbackMap {
        &self.feedback
    }

    /// Reveal plan staged for the round.
    #[must_use]
    pub fn plan(&self) -> &RevealPlan {
        &self.plan
    }

    /// Index of the reveal step currently shown.
    #[must_use]
    pub const fn current_step(&self) -> usize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pattern_recall_core::{RevealMode, RevealStep};

    const REVEAL: Duration = Duration::from_millis(2_500);

    fn diagonal() -> CellSet {
        CellSet::from([Cell::new(0, 0), Cell::new(1, 1)])
    }

    fn diagonal_round() -> Round {
        let plan = RevealPlan::new(RevealMode::Full, vec![RevealStep::new(diagonal(), REVEAL)]);
        Round::new(
            Level::FIRST,
            GridShape::new(2, 2),
            diagonal(),
            plan,
            Duration::ZERO,
        )
    }

    fn opened_round() -> Round {
        let mut round = diagonal_round();
        assert_eq!(round.advance(REVEAL), Some(RoundTransition::InputOpened));
        round
    }

    #[test]
    fn reveal_lights_targets_until_expiry() {
        let mut round = diagonal_round();
        assert_eq!(round.phase(), RoundPhase::Reveal);
        assert_eq!(round.cell_display(Cell::new(0, 0)), CellDisplay::Lit);
        assert_eq!(round.cell_display(Cell::new(0, 1)), CellDisplay::Idle);
        assert_eq!(round.lit_cells(), diagonal());

        assert_eq!(round.advance(REVEAL - Duration::from_millis(1)), None);
        assert_eq!(round.advance(REVEAL), Some(RoundTransition::InputOpened));
        assert_eq!(round.phase(), RoundPhase::Input);
        assert!(round.lit_cells().is_empty());
    }

    #[test]
    fn multi_step_reveal_advances_one_step_per_call() {
        let step = Duration::from_millis(300);
        let plan = RevealPlan::new(
            RevealMode::Snake,
            vec![
                RevealStep::new(CellSet::from([Cell::new(0, 0)]), step),
                RevealStep::new(CellSet::from([Cell::new(1, 1)]), step),
            ],
        );
        let mut round = Round::new(
            Level::FIRST,
            GridShape::new(2, 2),
            diagonal(),
            plan,
            Duration::ZERO,
        );

        let late = Duration::from_secs(5);
        assert_eq!(
            round.advance(late),
            Some(RoundTransition::StepShown { index: 1 })
        );
        assert_eq!(round.lit_cells(), CellSet::from([Cell::new(1, 1)]));
        assert_eq!(round.advance(late), None);
        assert_eq!(
            round.advance(late + step),
            Some(RoundTransition::InputOpened)
        );
    }

    #[test]
    fn picks_toggle_only_during_input() {
        let mut round = diagonal_round();
        assert_eq!(
            round.toggle_pick(Cell::new(0, 0)),
            Err(InputRejection::WrongPhase {
                phase: RoundPhase::Reveal
            })
        );

        let mut round = opened_round();
        assert_eq!(round.toggle_pick(Cell::new(0, 0)), Ok(true));
        assert!(round.shows_pick(Cell::new(0, 0)));
        assert_eq!(round.toggle_pick(Cell::new(0, 0)), Ok(false));
        assert!(round.picks().is_empty());
    }

    #[test]
    fn out_of_bounds_pick_changes_nothing() {
        let mut round = opened_round();
        let outside = Cell::new(2, 0);
        assert_eq!(
            round.toggle_pick(outside),
            Err(InputRejection::OutOfBounds { cell: outside })
        );
        assert!(round.picks().is_empty());
    }

    #[test]
    fn exact_picks_are_perfect() {
        let mut round = opened_round();
        for cell in diagonal() {
            assert_eq!(round.toggle_pick(cell), Ok(true));
        }

        assert_eq!(round.check_answer(REVEAL), Ok(true));
        assert_eq!(round.phase(), RoundPhase::Feedback);
        assert!(!round.has_wrong_feedback());
        assert!(round
            .feedback()
            .values()
            .all(|verdict| *verdict == CellFeedback::Correct));
    }

    #[test]
    fn missing_pick_is_marked_wrong() {
        let mut round = opened_round();
        assert_eq!(round.toggle_pick(Cell::new(0, 0)), Ok(true));

        assert_eq!(round.check_answer(REVEAL), Ok(false));
        assert_eq!(
            round.feedback().get(&Cell::new(0, 0)),
            Some(&CellFeedback::Correct)
        );
        assert_eq!(
            round.feedback().get(&Cell::new(1, 1)),
            Some(&CellFeedback::Wrong)
        );
        assert_eq!(round.cell_display(Cell::new(1, 1)), CellDisplay::Wrong);
        assert_eq!(round.cell_display(Cell::new(0, 1)), CellDisplay::Idle);
    }

    #[test]
    fn extra_pick_breaks_superset_answer() {
        let mut round = opened_round();
        for cell in [Cell::new(0, 0), Cell::new(1, 1), Cell::new(0, 1)] {
            assert_eq!(round.toggle_pick(cell), Ok(true));
        }

        assert_eq!(round.check_answer(REVEAL), Ok(false));
        assert_eq!(
            round.feedback().get(&Cell::new(0, 1)),
            Some(&CellFeedback::Wrong)
        );
        assert_eq!(round.feedback().len(), 3);
    }

    #[test]
    fn feedback_expires_strictly_after_its_duration() {
        let mut round = opened_round();
        assert_eq!(round.check_answer(REVEAL), Ok(false));
        assert_eq!(
            round.check_answer(REVEAL),
            Err(InputRejection::WrongPhase {
                phase: RoundPhase::Feedback
            })
        );

        assert_eq!(round.advance(REVEAL + FEEDBACK_DURATION), None);
        assert_eq!(
            round.advance(REVEAL + FEEDBACK_DURATION + Duration::from_millis(1)),
            Some(RoundTransition::FeedbackElapsed { perfect: false })
        );
    }
}
