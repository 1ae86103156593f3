//! Леса: сначала крупные массивы, потом мелкие рощи, один примитив роста.

use super::growth::{GrowthRule, grow_region};
use super::{GenerationContext, SEED_RETRIES, Stage, StageId, StageStatus, find_cell, fraction};
use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;

/// Стартовая клетка леса: не вода, не горы, и есть куда расти.
#[must_use]
pub fn forest_seed_eligible(grid: &TerrainGrid, coord: HexCoord) -> bool {
    let kind = grid.get(coord);
    !kind.is_water() && kind != TerrainKind::Mountains && kind.is_open_ground()
}

pub struct ForestsStage {
    budget: StepBudget,
    major_total: usize,
    minor_total: usize,
    done: usize,
}

impl ForestsStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        Self {
            budget,
            major_total: ctx.params.biomes.major_forest_count,
            minor_total: ctx.params.biomes.minor_forest_count,
            done: 0,
        }
    }

    fn plant(ctx: &mut GenerationContext, max_size: usize) {
        let (width, height) = (ctx.width(), ctx.height());
        let grid = &ctx.grid;
        let Some(seed) = find_cell(&mut ctx.rng, width, height, SEED_RETRIES, |c| {
            forest_seed_eligible(grid, c)
        }) else {
            tracing::debug!("лес пропущен: не нашлось стартовой клетки");
            return;
        };

        let max_size = max_size.max(1);
        let rule = GrowthRule {
            kind: TerrainKind::Forest,
            target_size: ctx.rng.gen_range((max_size / 2).max(1)..=max_size),
            base_chance: f64::from(ctx.params.biomes.forest_growth_chance),
            noise: None,
        };
        let region = grow_region(&mut ctx.grid, &mut ctx.rng, seed, &rule);
        tracing::debug!(?seed, size = region.len(), target = rule.target_size, "лес вырос");
    }
}

impl Stage for ForestsStage {
    fn id(&self) -> StageId {
        StageId::Forests
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        while self.done < self.major_total + self.minor_total {
            let size = if self.done < self.major_total {
                ctx.params.biomes.major_forest_size
            } else {
                ctx.params.biomes.minor_forest_size
            };
            Self::plant(ctx, size);
            self.done += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
        tracing::info!(forest = ctx.grid.count(TerrainKind::Forest), "леса выращены");
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.done, self.major_total + self.minor_total)
    }
}
