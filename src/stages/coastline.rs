//! Морская полоса вдоль одного края карты.
//!
//! Шум сдвигает обе границы (глубина/мелководье и мелководье/суша) на одну и
//! ту же величину, поэтому мелководье остаётся примерно одной толщины, а сама
//! береговая линия получается неровной.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction, make_noise, sample_unit};
use crate::config::MapGenerationParams;
use crate::hex::{Edge, HexCoord};
use crate::scheduler::StepBudget;
use crate::terrain::TerrainKind;
use fastnoise_lite::FastNoiseLite;
use rand::Rng;

const COAST_NOISE_OFFSET: i32 = 1_000;

/// Морской край: из конфигурации или случайный из четырёх.
pub fn choose_sea_border<R: Rng>(params: &MapGenerationParams, rng: &mut R) -> Edge {
    params
        .coast
        .sea_border
        .unwrap_or_else(|| Edge::ALL[rng.gen_range(0..Edge::ALL.len())])
}

/// Ширина морской полосы в клетках.
#[must_use]
pub fn water_band_depth(params: &MapGenerationParams, edge: Edge) -> usize {
    let extent = edge.extent(params.width, params.height);
    ((params.coast.water_percentage * extent as f32).round() as usize).min(extent)
}

/// Толщина мелководья в клетках, не меньше одной.
#[must_use]
pub fn shallow_band_width(params: &MapGenerationParams) -> usize {
    let side = params.width.min(params.height) as f32;
    ((params.coast.coast_depth * side).round() as usize).max(1)
}

/// Тип воды для клетки на расстоянии `depth` от края или `None`, если это суша.
///
/// `offset` неотрицателен: шум только отодвигает берег вглубь, полоса
/// `water_depth` всегда остаётся водой.
#[must_use]
pub fn classify_depth(depth: usize, water_depth: usize, shallow_width: usize, offset: f32) -> Option<TerrainKind> {
    if water_depth == 0 {
        return None;
    }
    let shallow_limit = water_depth as f32 + offset;
    let deep_limit = shallow_limit - shallow_width as f32;
    let depth = depth as f32;
    if depth < deep_limit {
        Some(TerrainKind::DeepWater)
    } else if depth < shallow_limit {
        Some(TerrainKind::ShallowWater)
    } else {
        None
    }
}

pub struct CoastlineStage {
    budget: StepBudget,
    noise: FastNoiseLite,
    row: usize,
    height: usize,
    shallow_width: usize,
    amplitude: f32,
}

impl CoastlineStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        let coast = &ctx.params.coast;
        Self {
            budget,
            noise: make_noise(
                ctx.noise_seed.wrapping_add(COAST_NOISE_OFFSET),
                coast.noise_frequency,
            ),
            row: 0,
            height: ctx.height(),
            shallow_width: shallow_band_width(&ctx.params),
            amplitude: coast.noise_amplitude,
        }
    }
}

impl Stage for CoastlineStage {
    fn id(&self) -> StageId {
        StageId::Coastline
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        let (width, height) = (ctx.width(), ctx.height());
        let water_depth = ctx.water_depth;
        let max_reach = water_depth as f32 * (1.0 + self.amplitude);

        while self.row < height {
            for col in 0..width {
                let coord = HexCoord::new(self.row, col);
                let depth = ctx.sea_border.depth(coord, width, height);
                if depth as f32 >= max_reach {
                    continue;
                }
                let offset = sample_unit(&self.noise, coord) * self.amplitude * water_depth as f32;
                if let Some(kind) = classify_depth(depth, water_depth, self.shallow_width, offset) {
                    ctx.grid.set(coord, kind);
                }
            }
            self.row += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }

        tracing::info!(
            border = ctx.sea_border.name(),
            water_depth,
            "береговая линия построена"
        );
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
    fn band_without_offset_is_deep_then_shallow() {
        assert_eq!(classify_depth(0, 4, 2, 0.0), Some(TerrainKind::DeepWater));
        assert_eq!(classify_depth(1, 4, 2, 0.0), Some(TerrainKind::DeepWater));
        assert_eq!(classify_depth(2, 4, 2, 0.0), Some(TerrainKind::ShallowWater));
        assert_eq!(classify_depth(3, 4, 2, 0.0), Some(TerrainKind::ShallowWater));
        assert_eq!(classify_depth(4, 4, 2, 0.0), None);
    }

    #[test]
    fn offset_moves_both_thresholds_together() {
        assert_eq!(classify_depth(2, 4, 2, 1.5), Some(TerrainKind::DeepWater));
        assert_eq!(classify_depth(5, 4, 2, 1.5), Some(TerrainKind::ShallowWater));
        assert_eq!(classify_depth(6, 4, 2, 1.5), None);
    }

    #[test]
    fn zero_water_percentage_paints_nothing() {
        assert_eq!(classify_depth(0, 0, 1, 0.0), None);
    }

    #[test]
    fn forced_border_is_respected() {
        let mut params = MapGenerationParams::default();
        params.coast.sea_border = Some(Edge::East);
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        assert_eq!(choose_sea_border(&params, &mut rng), Edge::East);
    }
}
