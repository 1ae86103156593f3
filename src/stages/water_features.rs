//! Заливы вглубь суши и острова в морской полосе.

use super::{GenerationContext, SEED_RETRIES, Stage, StageId, StageStatus, find_cell, fraction};
use crate::hex::{Edge, HexCoord};
use crate::scheduler::StepBudget;
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;
use std::collections::VecDeque;

/// После этой доли длины залив рисуется берегом, а не водой.
const FINGER_TIP_START: f32 = 0.75;

/// Рост острова: не больше `target * ISLAND_ITERATION_FACTOR` шагов очереди.
const ISLAND_ITERATION_FACTOR: usize = 6;

/// Прорезает один залив от береговой линии вглубь суши. Возвращает число закрашенных клеток.
pub fn carve_finger<R: Rng>(grid: &mut TerrainGrid, rng: &mut R, edge: Edge, max_length: usize) -> usize {
    let (width, height) = (grid.width(), grid.height());
    let span = edge.span(width, height);
    let extent = edge.extent(width, height);
    let start_along = rng.gen_range(0..span);

    // Первая клетка суши на этой линии: точка береговой линии
    let Some(coast_depth) = (0..extent).find(|&depth| {
        edge.coord_at(start_along, depth, width, height)
            .is_some_and(|c| grid.get(c).is_land())
    }) else {
        return 0;
    };

    let max_length = max_length.max(2);
    let length = rng.gen_range((max_length / 2).max(2)..=max_length);
    let half_width = rng.gen_range(1..=2_i64);
    let mut along = start_along as i64;
    let mut painted = 0;

    for step in 0..length {
        let depth = coast_depth + step;
        if depth >= extent {
            break;
        }
        let taper = 1.0 - step as f32 / length as f32;
        let reach = (half_width as f32 * taper).ceil() as i64;
        let paint_chance = f64::from(0.35 + 0.65 * taper);
        let kind = if step as f32 >= FINGER_TIP_START * length as f32 {
            TerrainKind::Shore
        } else {
            TerrainKind::ShallowWater
        };

        for off in -reach..=reach {
            let a = along + off;
            if a < 0 || a >= span as i64 {
                continue;
            }
            let Some(coord) = edge.coord_at(a as usize, depth, width, height) else {
                continue;
            };
            if grid.get(coord).is_water() {
                continue;
            }
            if rng.gen_bool(paint_chance) {
                grid.set(coord, kind);
                painted += 1;
            }
        }

        // Залив немного петляет
        along = (along + rng.gen_range(-1..=1)).clamp(0, span as i64 - 1);
    }
    painted
}

/// Выращивает остров из водной клетки `start`.
///
/// Остров состоит из клеток `Shore`; глубина вокруг него после роста понижается до
/// мелководья, чтобы остров не касался открытого океана напрямую.
pub fn raise_island<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    start: HexCoord,
    target_size: usize,
    growth_chance: f64,
) -> Vec<HexCoord> {
    if !grid.get(start).is_water() || target_size == 0 {
        return Vec::new();
    }

    let mut island = vec![start];
    grid.set(start, TerrainKind::Shore);
    let mut queue = VecDeque::from([start]);
    let cap = target_size * ISLAND_ITERATION_FACTOR;
    let mut iterations = 0;

    'grow: while let Some(cell) = queue.pop_front() {
        iterations += 1;
        if iterations > cap {
            break;
        }
        for next in grid.neighbors(cell) {
            if island.len() >= target_size {
                break 'grow;
            }
            if grid.get(next).is_water() && rng.gen_bool(growth_chance) {
                grid.set(next, TerrainKind::Shore);
                island.push(next);
                queue.push_back(next);
            }
        }
    }

    for &cell in &island {
        for next in grid.neighbors(cell) {
            if grid.get(next) == TerrainKind::DeepWater {
                grid.set(next, TerrainKind::ShallowWater);
            }
        }
    }
    island
}

enum Phase {
    Fingers,
    Islands,
    Done,
}

pub struct WaterFeaturesStage {
    budget: StepBudget,
    phase: Phase,
    finger_total: usize,
    fingers_done: usize,
    island_total: usize,
    islands_done: usize,
}

impl WaterFeaturesStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &mut GenerationContext) -> Self {
        let wf = &ctx.params.water_features;
        let finger_total = ctx.rng.gen_range(wf.min_fingers..=wf.max_fingers);
        let island_total = ctx.rng.gen_range(wf.min_islands..=wf.max_islands);
        Self {
            budget,
            phase: Phase::Fingers,
            finger_total,
            fingers_done: 0,
            island_total,
            islands_done: 0,
        }
    }

    fn place_island(ctx: &mut GenerationContext) {
        let (width, height) = (ctx.width(), ctx.height());
        let edge = ctx.sea_border;
        let band = ctx.water_depth;
        let grid = &ctx.grid;
        let Some(start) = find_cell(&mut ctx.rng, width, height, SEED_RETRIES, |c| {
            edge.depth(c, width, height) < band && grid.get(c).is_water()
        }) else {
            tracing::debug!("остров пропущен: в морской полосе не нашлось воды");
            return;
        };

        let wf = &ctx.params.water_features;
        let target = ctx
            .rng
            .gen_range(wf.min_island_size.max(1)..=wf.max_island_size.max(1));
        let chance = f64::from(wf.island_growth_chance);
        let island = raise_island(&mut ctx.grid, &mut ctx.rng, start, target, chance);
        tracing::debug!(size = island.len(), target, "остров поднят");
    }
}

impl Stage for WaterFeaturesStage {
    fn id(&self) -> StageId {
        StageId::WaterFeatures
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        loop {
            match self.phase {
                Phase::Fingers => {
                    if self.fingers_done >= self.finger_total {
                        self.phase = Phase::Islands;
                        continue;
                    }
                    let edge = ctx.sea_border;
                    let extent = edge.extent(ctx.width(), ctx.height());
                    let max_length = (ctx.params.water_features.finger_length * extent as f32).round() as usize;
                    carve_finger(&mut ctx.grid, &mut ctx.rng, edge, max_length);
                    self.fingers_done += 1;
                }
                Phase::Islands => {
                    if self.islands_done >= self.island_total {
                        self.phase = Phase::Done;
                        continue;
                    }
                    Self::place_island(ctx);
                    self.islands_done += 1;
                }
                Phase::Done => return StageStatus::Finished,
            }
            if self.budget.tick() {
                return StageStatus::Yielded;
            }
        }
    }

    fn progress(&self) -> f32 {
        fraction(
            self.fingers_done + self.islands_done,
            self.finger_total + self.island_total,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sea_grid() -> TerrainGrid {
        let mut grid = TerrainGrid::new(20, 20);
        for coord in grid.coords().collect::<Vec<_>>() {
            grid.set(coord, TerrainKind::DeepWater);
        }
        grid
    }

    #[test]
    fn island_never_touches_deep_water() {
        let mut grid = sea_grid();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let island = raise_island(&mut grid, &mut rng, HexCoord::new(10, 10), 8, 0.5);

        assert!(!island.is_empty());
        assert!(island.len() <= 8);
        for &cell in &island {
            assert_eq!(grid.get(cell), TerrainKind::Shore);
            assert!(
                !grid.has_neighbor(cell, TerrainKind::DeepWater),
                "{cell:?} borders deep water"
            );
        }
    }

    #[test]
    fn island_on_land_is_rejected() {
        let mut grid = TerrainGrid::new(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(raise_island(&mut grid, &mut rng, HexCoord::new(5, 5), 5, 1.0).is_empty());
        assert_eq!(grid.count(TerrainKind::Plains), 100);
    }

    #[test]
    fn finger_grows_from_coast_into_land() {
        let mut grid = TerrainGrid::new(20, 20);
        for col in 0..20 {
            grid.set(HexCoord::new(0, col), TerrainKind::ShallowWater);
            grid.set(HexCoord::new(1, col), TerrainKind::ShallowWater);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let painted = carve_finger(&mut grid, &mut rng, Edge::North, 8);

        assert!(painted > 0);
        let water_rows: Vec<_> = grid
            .coords()
            .filter(|c| c.row >= 2 && grid.get(*c) == TerrainKind::ShallowWater)
            .map(|c| c.row)
            .collect();
        assert!(water_rows.iter().all(|&r| r < 2 + 8));
        assert!(water_rows.contains(&2), "finger should start at the coastline");
    }
}
