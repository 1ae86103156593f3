//! Берега рек и озёр, в отличие от обычного морского берега.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction};
use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::terrain::TerrainGrid;
use std::collections::BTreeSet;

/// Отмечает сушу, соседствующую с реками и озёрами, в одной строке.
pub fn classify_row(
    grid: &TerrainGrid,
    row: usize,
    river_cells: &BTreeSet<HexCoord>,
    lake_cells: &BTreeSet<HexCoord>,
    river_coast: &mut BTreeSet<HexCoord>,
    lake_coast: &mut BTreeSet<HexCoord>,
) {
    for col in 0..grid.width() {
        let coord = HexCoord::new(row, col);
        if grid.get(coord).is_water() {
            continue;
        }
        for n in grid.neighbors(coord) {
            if river_cells.contains(&n) {
                river_coast.insert(coord);
            }
            if lake_cells.contains(&n) {
                lake_coast.insert(coord);
            }
        }
    }
}

pub struct RiverLakeCoastStage {
    budget: StepBudget,
    row: usize,
    height: usize,
}

impl RiverLakeCoastStage {
    #[must_use]
    pub fn new(budget: StepBudget, height: usize) -> Self {
        Self {
            budget,
            row: 0,
            height,
        }
    }
}

impl Stage for RiverLakeCoastStage {
    fn id(&self) -> StageId {
        StageId::RiverLakeCoasts
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        while self.row < ctx.height() {
            classify_row(
                &ctx.grid,
                self.row,
                &ctx.river_cells,
                &ctx.lake_cells,
                &mut ctx.river_coast_hexes,
                &mut ctx.lake_coast_hexes,
            );
            self.row += 1;
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
        tracing::info!(
            river_coast = ctx.river_coast_hexes.len(),
            lake_coast = ctx.lake_coast_hexes.len(),
            "берега рек и озёр размечены"
        );
        StageStatus::Finished
    }

    fn progress(&self) -> f32 {
        fraction(self.row, self.height)
    }
}
