use super::{GenerationContext, Stage, StageId, StageStatus, fraction};
use crate::scheduler::StepBudget;

/// Заполняет карту равнинами построчно.
pub struct InitializeStage {
    budget: StepBudget,
    row: usize,
    height: usize,
}

impl InitializeStage {
    #[must_use]
    pub fn new(budget: StepBudget, height: usize) -> Self {
        Self {
            budget,
            row: 0,
            height,
        }
    }
}

impl Stage for InitializeStage {
    fn id(&self) -> StageId {
        StageId::Initialize
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        while self.row < ctx.height() {
            ctx.grid.reset_row(self.row);
            self.row += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.row, self.height)
    }
}
