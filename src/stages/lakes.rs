//! Озёра: небольшие скопления мелководья вдали от открытого океана.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction, random_cell};
use crate::hex::{HexCoord, cells_within_radius};
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;
use rand::seq::SliceRandom;

/// Минимум подходящих соседей у центра: озеро всегда из 3+ клеток.
pub const MIN_LAKE_NEIGHBORS: usize = 2;

/// Попыток на одно запрошенное озеро.
const ATTEMPTS_PER_LAKE: usize = 20;

/// Клетка может стать частью озера.
#[must_use]
pub fn lake_eligible(grid: &TerrainGrid, coord: HexCoord) -> bool {
    let kind = grid.get(coord);
    !kind.is_water()
        && !matches!(kind, TerrainKind::Mountains | TerrainKind::Hills)
        && !grid.has_neighbor(coord, TerrainKind::DeepWater)
}

/// Пытается разместить озеро вокруг `center`. При неудаче карта не меняется.
pub fn try_place_lake<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    center: HexCoord,
    target_size: usize,
) -> Option<Vec<HexCoord>> {
    if !lake_eligible(grid, center) {
        return None;
    }

    let mut ring: Vec<HexCoord> = cells_within_radius(center, 1, grid.width(), grid.height())
        .into_iter()
        .filter(|&c| lake_eligible(grid, c))
        .collect();
    if ring.len() < MIN_LAKE_NEIGHBORS {
        return None;
    }

    ring.shuffle(rng);
    ring.truncate(target_size.saturating_sub(1).max(MIN_LAKE_NEIGHBORS));

    let mut lake = Vec::with_capacity(ring.len() + 1);
    lake.push(center);
    lake.extend(ring);
    for &cell in &lake {
        grid.set(cell, TerrainKind::ShallowWater);
    }
    Some(lake)
}

pub struct LakesStage {
    budget: StepBudget,
    requested: usize,
    placed: usize,
    attempts: usize,
    max_attempts: usize,
}

impl LakesStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        let requested = ctx.params.hydrology.lakes;
        Self {
            budget,
            requested,
            placed: 0,
            attempts: 0,
            max_attempts: requested * ATTEMPTS_PER_LAKE,
        }
    }
}

impl Stage for LakesStage {
    fn id(&self) -> StageId {
        StageId::Lakes
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        let (width, height) = (ctx.width(), ctx.height());
        let max_size = ctx.params.hydrology.max_lake_size.max(3);

        while self.placed < self.requested && self.attempts < self.max_attempts {
            self.attempts += 1;
            let center = random_cell(&mut ctx.rng, width, height);
            let target = ctx.rng.gen_range(3..=max_size);
            if let Some(lake) = try_place_lake(&mut ctx.grid, &mut ctx.rng, center, target) {
                tracing::debug!(?center, size = lake.len(), "озеро размещено");
                ctx.lake_cells.extend(lake);
                self.placed += 1;
            }
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }

        if self.placed < self.requested {
            tracing::debug!(
                placed = self.placed,
                requested = self.requested,
                "часть озёр пропущена после исчерпания попыток"
            );
        }
        tracing::info!(lakes = self.placed, cells = ctx.lake_cells.len(), "озёра готовы");
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        if self.placed >= self.requested {
            1.0
        } else {
            fraction(self.attempts, self.max_attempts)
                .max(fraction(self.placed, self.requested))
        }
    }
}
