//! Болота: жадная заливка вокруг равнины у воды.

use super::growth::fill_greedy;
use super::{GenerationContext, SEED_RETRIES, Stage, StageId, StageStatus, find_cell, fraction};
use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;

/// Ищет старт болота: сначала равнину у мелководья, потом любую равнину.
pub fn find_swamp_seed<R: Rng>(grid: &TerrainGrid, rng: &mut R) -> Option<HexCoord> {
    let (width, height) = (grid.width(), grid.height());
    find_cell(rng, width, height, SEED_RETRIES, |c| {
        grid.get(c) == TerrainKind::Plains && grid.has_neighbor(c, TerrainKind::ShallowWater)
    })
    .or_else(|| {
        find_cell(rng, width, height, SEED_RETRIES, |c| {
            grid.get(c) == TerrainKind::Plains
        })
    })
}

pub struct SwampsStage {
    budget: StepBudget,
    total: usize,
    done: usize,
}

impl SwampsStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        Self {
            budget,
            total: ctx.params.biomes.swamp_count,
            done: 0,
        }
    }
}

impl Stage for SwampsStage {
    fn id(&self) -> StageId {
        StageId::Swamps
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        let swamp_size = ctx.params.biomes.swamp_size;
        while self.done < self.total {
            match find_swamp_seed(&ctx.grid, &mut ctx.rng) {
                Some(seed) => {
                    let swamp = fill_greedy(&mut ctx.grid, seed, TerrainKind::Swamp, swamp_size);
                    tracing::debug!(?seed, size = swamp.len(), "болото залито");
                }
                None => tracing::debug!("болото пропущено: нет свободной равнины"),
            }
            self.done += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
        tracing::info!(swamp = ctx.grid.count(TerrainKind::Swamp), "болота готовы");
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.done, self.total)
    }
}
