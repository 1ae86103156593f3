//! Реки: случайное блуждание от подножий гор к морю.
//!
//! Если среди соседей есть шаг, приближающий к морскому краю, выбираем только
//! из таких шагов. Иначе годится любой непосещённый сосед, кроме гор.

use super::{GenerationContext, Stage, StageId, StageStatus, fraction};
use crate::hex::{Edge, HexCoord};
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

const ATTEMPTS_PER_RIVER: usize = 4;

/// Чем закончилось блуждание.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiverEnd {
    /// Дошли до глубокой воды
    Sea,
    /// Влились в существующее мелководье (озеро, другую реку, залив)
    Merged,
    /// Некуда шагнуть
    DeadEnd,
    /// Исчерпан лимит `width + height` шагов
    StepLimit,
}

#[derive(Debug, Clone)]
pub struct RiverWalk {
    pub cells: Vec<HexCoord>,
    pub steps: usize,
    pub end: RiverEnd,
}

/// Кандидаты в истоки: суша (не горы) рядом с горами.
#[must_use]
pub fn river_sources(grid: &TerrainGrid) -> Vec<HexCoord> {
    grid.coords()
        .filter(|&c| {
            let kind = grid.get(c);
            !kind.is_water()
                && kind != TerrainKind::Mountains
                && grid.has_neighbor(c, TerrainKind::Mountains)
        })
        .collect()
}

/// Прокладывает одну реку из `source`. Новые клетки реки добавляются в `river_cells`.
pub fn carve_river<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    source: HexCoord,
    sea_border: Edge,
    river_cells: &mut BTreeSet<HexCoord>,
) -> RiverWalk {
    let (width, height) = (grid.width(), grid.height());
    let max_steps = width + height;
    let mut visited = BTreeSet::new();
    let mut cells = Vec::new();
    let mut current = source;

    for step in 0..max_steps {
        match grid.get(current) {
            TerrainKind::DeepWater => {
                return RiverWalk { cells, steps: step, end: RiverEnd::Sea };
            }
            TerrainKind::ShallowWater if step > 0 => {
                return RiverWalk { cells, steps: step, end: RiverEnd::Merged };
            }
            _ => {}
        }

        grid.set(current, TerrainKind::ShallowWater);
        river_cells.insert(current);
        visited.insert(current);
        cells.push(current);

        let here = sea_border.depth(current, width, height);
        let candidates: Vec<HexCoord> = grid
            .neighbors(current)
            .filter(|n| !visited.contains(n) && grid.get(*n) != TerrainKind::Mountains)
            .collect();
        let forward: Vec<HexCoord> = candidates
            .iter()
            .copied()
            .filter(|&n| sea_border.depth(n, width, height) < here)
            .collect();
        let pool = if forward.is_empty() { &candidates } else { &forward };

        let Some(&next) = pool.choose(rng) else {
            return RiverWalk { cells, steps: step + 1, end: RiverEnd::DeadEnd };
        };
        current = next;
    }

    RiverWalk {
        cells,
        steps: max_steps,
        end: RiverEnd::StepLimit,
    }
}

pub struct RiversStage {
    budget: StepBudget,
    sources: Option<Vec<HexCoord>>,
    requested: usize,
    placed: usize,
    attempts: usize,
    max_attempts: usize,
}

impl RiversStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        let requested = ctx.params.hydrology.rivers;
        Self {
            budget,
            sources: None,
            requested,
            placed: 0,
            attempts: 0,
            max_attempts: requested * ATTEMPTS_PER_RIVER,
        }
    }
}

impl Stage for RiversStage {
    fn id(&self) -> StageId {
        StageId::Rivers
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        let sources = self.sources.get_or_insert_with(|| river_sources(&ctx.grid));
        if sources.is_empty() {
            tracing::debug!("реки пропущены: нет клеток у подножия гор");
            self.attempts = self.max_attempts;
            return StageStatus::Finished;
        }

        while self.placed < self.requested && self.attempts < self.max_attempts {
            self.attempts += 1;
            let Some(&source) = sources.choose(&mut ctx.rng) else {
                break;
            };
            // Исток мог уже оказаться под другой рекой
            if !ctx.grid.get(source).is_water() {
                let walk = carve_river(
                    &mut ctx.grid,
                    &mut ctx.rng,
                    source,
                    ctx.sea_border,
                    &mut ctx.river_cells,
                );
                tracing::debug!(?source, len = walk.cells.len(), end = ?walk.end, "река проложена");
                self.placed += 1;
            }
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }

        tracing::info!(rivers = self.placed, cells = ctx.river_cells.len(), "реки готовы");
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn sources_sit_next_to_mountains() {
        let mut grid = TerrainGrid::new(8, 8);
        grid.set(HexCoord::new(4, 4), TerrainKind::Mountains);
        let sources = river_sources(&grid);
        assert_eq!(sources.len(), 6);
        assert!(!sources.contains(&HexCoord::new(4, 4)));
    }

    #[test]
    fn river_runs_downhill_to_the_sea() {
        let mut grid = TerrainGrid::new(12, 12);
        for col in 0..12 {
            grid.set(HexCoord::new(0, col), TerrainKind::DeepWater);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cells = BTreeSet::new();
        let walk = carve_river(&mut grid, &mut rng, HexCoord::new(10, 6), Edge::North, &mut cells);

        // Каждый шаг приближает к северу, так что за 10 шагов доходим до моря
        assert_eq!(walk.end, RiverEnd::Sea);
        assert_eq!(walk.cells.len(), 10);
        assert_eq!(cells.len(), 10);
        assert!(walk.cells.iter().all(|&c| grid.get(c) == TerrainKind::ShallowWater));
    }

    #[test]
    fn river_stops_at_existing_shallow_water() {
        let mut grid = TerrainGrid::new(12, 12);
        for col in 0..12 {
            grid.set(HexCoord::new(5, col), TerrainKind::ShallowWater);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cells = BTreeSet::new();
        let walk = carve_river(&mut grid, &mut rng, HexCoord::new(9, 3), Edge::North, &mut cells);

        assert_eq!(walk.end, RiverEnd::Merged);
        assert_eq!(walk.cells.len(), 4);
        assert!(cells.iter().all(|c| c.row > 5), "merged water is not a river cell");
    }

    #[test]
    fn river_never_exceeds_step_limit() {
        let mut grid = TerrainGrid::new(10, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cells = BTreeSet::new();
        let walk = carve_river(&mut grid, &mut rng, HexCoord::new(5, 5), Edge::North, &mut cells);
        assert!(walk.steps <= 16);
        assert!(walk.cells.iter().all(|&c| grid.get(c) != TerrainKind::Mountains));
    }
}
