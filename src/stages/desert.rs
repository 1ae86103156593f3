//! Пустыня вдоль второго края, тот же приём "порог + шум", но с одной границей.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction, make_noise, sample_unit};
use crate::hex::{Edge, HexCoord};
use crate::scheduler::StepBudget;
use crate::terrain::TerrainKind;
use fastnoise_lite::FastNoiseLite;
use rand::Rng;

const DESERT_NOISE_OFFSET: i32 = 2_000;

/// Может ли клетка стать пустыней.
///
/// Берег островов и заливов остаётся берегом. Горы и холмы к этому моменту
/// ещё не построены, но проверка остаётся на случай перестановки стадий.
#[must_use]
pub fn accepts_desert(kind: TerrainKind) -> bool {
    !kind.is_water()
        && !matches!(
            kind,
            TerrainKind::Shore | TerrainKind::Mountains | TerrainKind::Hills
        )
}

pub struct DesertStage {
    budget: StepBudget,
    noise: FastNoiseLite,
    edge: Edge,
    band: usize,
    amplitude: f32,
    row: usize,
    height: usize,
}

impl DesertStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &mut GenerationContext) -> Self {
        let others = ctx.sea_border.others();
        let edge = others[ctx.rng.gen_range(0..others.len())];
        let desert = &ctx.params.desert;
        let extent = edge.extent(ctx.width(), ctx.height());
        Self {
            budget,
            noise: make_noise(
                ctx.noise_seed.wrapping_add(DESERT_NOISE_OFFSET),
                desert.noise_frequency,
            ),
            edge,
            band: (desert.desert_percentage * extent as f32).round() as usize,
            amplitude: desert.noise_amplitude,
            row: 0,
            height: ctx.height(),
        }
    }

    #[must_use]
    pub fn edge(&self) -> Edge {
        self.edge
    }
}

impl Stage for DesertStage {
    fn id(&self) -> StageId {
        StageId::Desert
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        if self.band == 0 {
            self.row = self.height;
            return StageStatus::Finished;
        }
        let (width, height) = (ctx.width(), ctx.height());
        let band = self.band as f32;

        while self.row < height {
            for col in 0..width {
                let coord = HexCoord::new(self.row, col);
                let depth = self.edge.depth(coord, width, height) as f32;
                if depth >= band * (1.0 + self.amplitude) {
                    continue;
                }
                let offset = (sample_unit(&self.noise, coord) * 2.0 - 1.0) * self.amplitude * band;
                if depth < band + offset && accepts_desert(ctx.grid.get(coord)) {
                    ctx.grid.set(coord, TerrainKind::Desert);
                }
            }
            self.row += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }

        tracing::info!(border = self.edge.name(), band = self.band, "пустыня размечена");
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.row, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desert_skips_water_shore_and_relief() {
        assert!(accepts_desert(TerrainKind::Plains));
        assert!(accepts_desert(TerrainKind::Grasslands));
        assert!(!accepts_desert(TerrainKind::ShallowWater));
        assert!(!accepts_desert(TerrainKind::DeepWater));
        assert!(!accepts_desert(TerrainKind::Shore));
        assert!(!accepts_desert(TerrainKind::Mountains));
        assert!(!accepts_desert(TerrainKind::Hills));
    }
}
