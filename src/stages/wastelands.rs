//! Пустоши: крупные в центре карты, мелкие подальше от уже существующих.

use super::growth::{GrowthRule, grow_region};
use super::{GenerationContext, SEED_RETRIES, Stage, StageId, StageStatus, find_cell, fraction, make_noise};
use crate::hex::{HexCoord, cells_within_radius};
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use fastnoise_lite::FastNoiseLite;
use rand::Rng;

const WASTELAND_NOISE_OFFSET: i32 = 7_000;
const WASTELAND_GROWTH_CHANCE: f64 = 0.8;

/// Мелкая пустошь не ставится ближе этого радиуса к существующей.
pub const MINOR_WASTELAND_CLEARANCE: usize = 4;

/// Центральная четверть карты: строки и столбцы от 1/4 до 3/4.
#[must_use]
pub fn in_central_quadrant(coord: HexCoord, width: usize, height: usize) -> bool {
    (height / 4..(3 * height).div_ceil(4)).contains(&coord.row)
        && (width / 4..(3 * width).div_ceil(4)).contains(&coord.col)
}

/// Старт крупной пустоши: равнина или луг в центральной четверти.
pub fn find_major_seed<R: Rng>(grid: &TerrainGrid, rng: &mut R) -> Option<HexCoord> {
    let (width, height) = (grid.width(), grid.height());
    let rows = height / 4..(3 * height).div_ceil(4);
    let cols = width / 4..(3 * width).div_ceil(4);
    for _ in 0..SEED_RETRIES {
        let coord = HexCoord::new(rng.gen_range(rows.clone()), rng.gen_range(cols.clone()));
        if grid.get(coord).is_open_ground() {
            return Some(coord);
        }
    }
    None
}

/// Есть ли пустошь в радиусе `radius`.
#[must_use]
pub fn near_wasteland(grid: &TerrainGrid, coord: HexCoord, radius: usize) -> bool {
    grid.get(coord) == TerrainKind::Wastelands
        || cells_within_radius(coord, radius, grid.width(), grid.height())
            .into_iter()
            .any(|c| grid.get(c) == TerrainKind::Wastelands)
}

/// Старт мелкой пустоши: равнина или луг вдали от всех уже выросших пустошей,
/// включая мелкие этого же прохода.
pub fn find_minor_seed<R: Rng>(grid: &TerrainGrid, rng: &mut R) -> Option<HexCoord> {
    find_cell(rng, grid.width(), grid.height(), SEED_RETRIES, |c| {
        grid.get(c).is_open_ground() && !near_wasteland(grid, c, MINOR_WASTELAND_CLEARANCE)
    })
}

enum Phase {
    Major,
    Minor,
    Done,
}

pub struct WastelandsStage {
    budget: StepBudget,
    noise: FastNoiseLite,
    phase: Phase,
    major_total: usize,
    minor_total: usize,
    done: usize,
}

impl WastelandsStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        let biomes = &ctx.params.biomes;
        Self {
            budget,
            noise: make_noise(
                ctx.noise_seed.wrapping_add(WASTELAND_NOISE_OFFSET),
                biomes.wasteland_noise_frequency,
            ),
            phase: Phase::Major,
            major_total: biomes.major_wasteland_count,
            minor_total: biomes.minor_wasteland_count,
            done: 0,
        }
    }

    fn grow(&self, ctx: &mut GenerationContext, seed: HexCoord, max_size: usize) {
        let max_size = max_size.max(1);
        let rule = GrowthRule {
            kind: TerrainKind::Wastelands,
            target_size: ctx.rng.gen_range((max_size / 2).max(1)..=max_size),
            base_chance: WASTELAND_GROWTH_CHANCE,
            noise: Some(&self.noise),
        };
        let region = grow_region(&mut ctx.grid, &mut ctx.rng, seed, &rule);
        tracing::debug!(?seed, size = region.len(), target = rule.target_size, "пустошь выросла");
    }
}

impl Stage for WastelandsStage {
    fn id(&self) -> StageId {
        StageId::Wastelands
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        loop {
            match self.phase {
                Phase::Major => {
                    if self.done >= self.major_total {
                        self.phase = Phase::Minor;
                        continue;
                    }
                    let size = ctx.params.biomes.major_wasteland_size;
                    match find_major_seed(&ctx.grid, &mut ctx.rng) {
                        Some(seed) => self.grow(ctx, seed, size),
                        None => tracing::debug!("крупная пустошь пропущена: центр занят"),
                    }
                }
                Phase::Minor => {
                    if self.done >= self.major_total + self.minor_total {
                        self.phase = Phase::Done;
                        continue;
                    }
                    let size = ctx.params.biomes.minor_wasteland_size;
                    match find_minor_seed(&ctx.grid, &mut ctx.rng) {
                        Some(seed) => self.grow(ctx, seed, size),
                        None => tracing::debug!("мелкая пустошь пропущена: всё рядом с другими"),
                    }
                }
                Phase::Done => {
                    tracing::info!(
                        wastelands = ctx.grid.count(TerrainKind::Wastelands),
                        "пустоши готовы"
                    );
                    return StageStatus::Finished;
                }
            }
            self.done += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
    }

    fn progress(&self) -> f32 {
        fraction(self.done, self.major_total + self.minor_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn central_quadrant_bounds() {
        assert!(in_central_quadrant(HexCoord::new(5, 5), 20, 20));
        assert!(in_central_quadrant(HexCoord::new(14, 14), 20, 20));
        assert!(!in_central_quadrant(HexCoord::new(4, 10), 20, 20));
        assert!(!in_central_quadrant(HexCoord::new(10, 15), 20, 20));
    }

    #[test]
    fn major_seed_lands_in_the_centre() {
        let grid = TerrainGrid::new(40, 40);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..20 {
            let seed = find_major_seed(&grid, &mut rng).expect("open map");
            assert!(in_central_quadrant(seed, 40, 40), "{seed:?}");
        }
    }

    #[test]
    fn minor_wastelands_keep_clearance_from_each_other() {
        for seed in 0..20 {
            let mut params = crate::config::MapGenerationParams {
                seed: Some(seed),
                width: 20,
                height: 20,
                ..crate::config::MapGenerationParams::default()
            };
            params.biomes.major_wasteland_count = 0;
            params.biomes.minor_wasteland_count = 6;
            params.biomes.minor_wasteland_size = 1;
            let mut ctx = GenerationContext::new(params, seed);

            let mut stage = WastelandsStage::new(StepBudget::unlimited(), &ctx);
            while stage.advance(&mut ctx) == StageStatus::Yielded {}

            let placed: Vec<_> = ctx
                .grid
                .coords()
                .filter(|&c| ctx.grid.get(c) == TerrainKind::Wastelands)
                .collect();
            assert!(!placed.is_empty(), "seed {seed}: open map must get a wasteland");
            for &cell in &placed {
                for near in cells_within_radius(cell, MINOR_WASTELAND_CLEARANCE, 20, 20) {
                    assert_ne!(
                        ctx.grid.get(near),
                        TerrainKind::Wastelands,
                        "seed {seed}: {cell:?} and {near:?} are too close"
                    );
                }
            }
        }
    }

    #[test]
    fn minor_seed_avoids_existing_wasteland() {
        let mut grid = TerrainGrid::new(30, 30);
        grid.set(HexCoord::new(15, 15), TerrainKind::Wastelands);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..20 {
            let seed = find_minor_seed(&grid, &mut rng).expect("open map");
            assert!(!near_wasteland(&grid, seed, MINOR_WASTELAND_CLEARANCE));
        }
    }
}
