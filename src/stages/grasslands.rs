//! Луга: пятна шума поверх равнин. Леса и пустоши потом растут и по ним.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction, make_noise, sample_unit};
use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::terrain::TerrainKind;
use fastnoise_lite::FastNoiseLite;

const GRASSLAND_NOISE_OFFSET: i32 = 5_000;

pub struct GrasslandsStage {
    budget: StepBudget,
    noise: FastNoiseLite,
    threshold: f32,
    row: usize,
    height: usize,
}

impl GrasslandsStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        let biomes = &ctx.params.biomes;
        Self {
            budget,
            noise: make_noise(
                ctx.noise_seed.wrapping_add(GRASSLAND_NOISE_OFFSET),
                biomes.grassland_frequency,
            ),
            threshold: 1.0 - biomes.grassland_share,
            row: 0,
            height: ctx.height(),
        }
    }
}

impl Stage for GrasslandsStage {
    fn id(&self) -> StageId {
        StageId::Grasslands
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        // При нулевой доле лугов нет, даже там, где шум упирается в 1.0
        if self.threshold >= 1.0 {
            self.row = self.height;
            return StageStatus::Finished;
        }
        while self.row < ctx.height() {
            for col in 0..ctx.width() {
                let coord = HexCoord::new(self.row, col);
                if ctx.grid.get(coord) == TerrainKind::Plains
                    && sample_unit(&self.noise, coord) >= self.threshold
                {
                    ctx.grid.set(coord, TerrainKind::Grasslands);
                }
            }
            self.row += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
        tracing::info!(grasslands = ctx.grid.count(TerrainKind::Grasslands), "луга размечены");
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.row, self.height)
    }
}
