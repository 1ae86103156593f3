//! Финальный проход: суша у открытого моря становится берегом.
//!
//! Берегом считается только соседство с "морским" мелководьем. Реки, озёра и
//! их берега в расчёт не идут.

use super::{GenerationContext, Stage, StageId, StageStatus};
use crate::hex::HexCoord;
use crate::snapshot::SnapshotPass;
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;
use std::collections::BTreeSet;

/// Множества, которые отличают реки и озёра от моря.
#[derive(Clone, Copy)]
pub struct InlandWater<'a> {
    pub river_cells: &'a BTreeSet<HexCoord>,
    pub lake_cells: &'a BTreeSet<HexCoord>,
    pub river_coast: &'a BTreeSet<HexCoord>,
    pub lake_coast: &'a BTreeSet<HexCoord>,
}

impl InlandWater<'_> {
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        self.river_cells.contains(&coord)
            || self.lake_cells.contains(&coord)
            || self.river_coast.contains(&coord)
            || self.lake_coast.contains(&coord)
    }
}

/// Клетку снимка можно превратить в берег: это суша рядом с морским мелководьем.
#[must_use]
pub fn borders_open_sea(snapshot: &TerrainGrid, coord: HexCoord, inland: InlandWater<'_>) -> bool {
    let kind = snapshot.get(coord);
    if kind.is_water()
        || matches!(
            kind,
            TerrainKind::Mountains | TerrainKind::Hills | TerrainKind::Swamp | TerrainKind::Shore
        )
    {
        return false;
    }
    snapshot
        .neighbors(coord)
        .any(|n| snapshot.get(n) == TerrainKind::ShallowWater && !inland.contains(n))
}

pub struct ShoreStage {
    budget: StepBudget,
    pass: Option<SnapshotPass>,
}

impl ShoreStage {
    #[must_use]
    pub fn new(budget: StepBudget) -> Self {
        Self { budget, pass: None }
    }
}

impl Stage for ShoreStage {
    fn id(&self) -> StageId {
        StageId::Shore
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        let pass = self.pass.get_or_insert_with(|| SnapshotPass::new(&ctx.grid));
        let chance = f64::from(ctx.params.shore.shore_chance);
        let inland = InlandWater {
            river_cells: &ctx.river_cells,
            lake_cells: &ctx.lake_cells,
            river_coast: &ctx.river_coast_hexes,
            lake_coast: &ctx.lake_coast_hexes,
        };
        let rng = &mut ctx.rng;

        let status = pass.run(&mut ctx.grid, &mut self.budget, |snap, coord| {
            (borders_open_sea(snap, coord, inland) && rng.gen_bool(chance)).then_some(TerrainKind::Shore)
        });
        if status == StageStatus::Finished {
            tracing::info!(shore = ctx.grid.count(TerrainKind::Shore), "берег доведён");
        }
        status
    }

    fn progress(&self) -> f32 {
        self.pass.as_ref().map_or(0.0, SnapshotPass::progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> BTreeSet<HexCoord> {
        BTreeSet::new()
    }

    #[test]
    fn river_bank_is_not_sea_coast() {
        let mut grid = TerrainGrid::new(6, 6);
        let river = HexCoord::new(2, 2);
        grid.set(river, TerrainKind::ShallowWater);
        let rivers = BTreeSet::from([river]);
        let none = empty();
        let inland = InlandWater {
            river_cells: &rivers,
            lake_cells: &none,
            river_coast: &none,
            lake_coast: &none,
        };

        for n in grid.neighbors(river).collect::<Vec<_>>() {
            assert!(!borders_open_sea(&grid, n, inland), "{n:?} is a river bank");
        }
    }

    #[test]
    fn sea_coast_is_candidate_unless_relief_or_swamp() {
        let mut grid = TerrainGrid::new(6, 6);
        let sea = HexCoord::new(2, 2);
        grid.set(sea, TerrainKind::ShallowWater);
        let neighbors: Vec<_> = grid.neighbors(sea).collect();
        grid.set(neighbors[0], TerrainKind::Mountains);
        grid.set(neighbors[1], TerrainKind::Swamp);
        let none = empty();
        let inland = InlandWater {
            river_cells: &none,
            lake_cells: &none,
            river_coast: &none,
            lake_coast: &none,
        };

        assert!(!borders_open_sea(&grid, neighbors[0], inland));
        assert!(!borders_open_sea(&grid, neighbors[1], inland));
        assert!(borders_open_sea(&grid, neighbors[2], inland));
        assert!(!borders_open_sea(&grid, sea, inland));
    }
}
