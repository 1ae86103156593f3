// src/snapshot.rs
//! Проход "читаем старое, пишем новое".
//!
//! Если проход и читает окрестности, и переписывает клетки, читать нужно из
//! снимка, снятого до начала прохода: иначе результат зависит от порядка обхода.

use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::stages::StageStatus;
use crate::terrain::{TerrainGrid, TerrainKind};

pub struct SnapshotPass {
    snapshot: TerrainGrid,
    row: usize,
}

impl SnapshotPass {
    #[must_use]
    pub fn new(grid: &TerrainGrid) -> Self {
        Self {
            snapshot: grid.clone(),
            row: 0,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &TerrainGrid {
        &self.snapshot
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.row >= self.snapshot.height()
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        crate::stages::fraction(self.row, self.snapshot.height())
    }

    /// Переписывает строки живой карты, пока не кончится бюджет.
    ///
    /// `rewrite` видит только снимок и возвращает новый тип клетки или `None`.
    pub fn run<F>(&mut self, grid: &mut TerrainGrid, budget: &mut StepBudget, mut rewrite: F) -> StageStatus
    where
        F: FnMut(&TerrainGrid, HexCoord) -> Option<TerrainKind>,
    {
        while self.row < self.snapshot.height() {
            for col in 0..self.snapshot.width() {
                let coord = HexCoord::new(self.row, col);
                if let Some(kind) = rewrite(&self.snapshot, coord) {
                    grid.set(coord, kind);
                }
            }
            self.row += 1;
            if budget.tick() {
                return StageStatus::Yielded;
            }
        }
        StageStatus::Finished
    }
}

/// Весь проход за один вызов, без уступок хосту.
pub fn rewrite_from_snapshot<F>(grid: &mut TerrainGrid, rewrite: F)
where
    F: FnMut(&TerrainGrid, HexCoord) -> Option<TerrainKind>,
{
    let mut pass = SnapshotPass::new(grid);
    pass.run(grid, &mut StepBudget::unlimited(), rewrite);
}
