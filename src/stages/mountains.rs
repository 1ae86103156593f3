//! Горные хребты (смещённое случайное блуждание) и холмы вокруг них.

use super::{GenerationContext, SEED_RETRIES, Stage, StageId, StageStatus, find_cell, fraction};
use crate::hex::HexCoord;
use crate::scheduler::StepBudget;
use crate::snapshot::{SnapshotPass, rewrite_from_snapshot};
use crate::terrain::{TerrainGrid, TerrainKind};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

/// Преобладающее направление хребта.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainAxis {
    Rows,
    Cols,
}

/// Вес шага: вперёд по оси охотно, назад почти никогда.
#[must_use]
pub fn direction_weight(axis: ChainAxis, heading: i32, dr: i32, dc: i32) -> f64 {
    let along = match axis {
        ChainAxis::Rows => dr * heading,
        ChainAxis::Cols => dc.signum() * heading,
    };
    match along {
        1 => 4.0,
        0 => 1.0,
        _ => 0.25,
    }
}

/// Хребет не заходит в воду и на берег.
///
/// Берег (`Shore`) здесь только у островов и кончиков заливов внутри морской
/// полосы, и горы на них разорвали бы эту полосу.
#[must_use]
pub fn can_hold_mountain(kind: TerrainKind) -> bool {
    !kind.is_water() && kind != TerrainKind::Shore
}

/// Рисует хребет из `start` длиной до `length` клеток (старт включён).
///
/// Блуждание не возвращается в свои же клетки, но может пройти по горам
/// других хребтов. Если шагнуть некуда, хребет обрывается раньше.
pub fn draw_chain<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    start: HexCoord,
    length: usize,
    axis: ChainAxis,
    heading: i32,
) -> Vec<HexCoord> {
    let (width, height) = (grid.width(), grid.height());
    let mut walked = vec![start];
    grid.set(start, TerrainKind::Mountains);
    let mut current = start;

    while walked.len() < length {
        let candidates: Vec<(HexCoord, f64)> = current
            .neighbor_offsets()
            .iter()
            .filter_map(|&(dr, dc)| {
                let next = current.offset(dr, dc, width, height)?;
                if walked.contains(&next) || !can_hold_mountain(grid.get(next)) {
                    return None;
                }
                Some((next, direction_weight(axis, heading, dr, dc)))
            })
            .collect();

        let Ok(choice) = WeightedIndex::new(candidates.iter().map(|&(_, w)| w)) else {
            break;
        };
        current = candidates[choice.sample(rng)].0;
        grid.set(current, TerrainKind::Mountains);
        walked.push(current);
    }
    walked
}

/// Равнины рядом с горами (по снимку до прохода) становятся холмами с вероятностью `chance`.
pub fn dilate_hills<R: Rng>(grid: &mut TerrainGrid, rng: &mut R, chance: f64) {
    rewrite_from_snapshot(grid, |snap, coord| hill_rewrite(snap, coord, &mut *rng, chance));
}

fn hill_rewrite<R: Rng>(snap: &TerrainGrid, coord: HexCoord, rng: &mut R, chance: f64) -> Option<TerrainKind> {
    (snap.get(coord) == TerrainKind::Plains
        && snap.has_neighbor(coord, TerrainKind::Mountains)
        && rng.gen_bool(chance))
    .then_some(TerrainKind::Hills)
}

/// Максимальная длина хребта для карты.
#[must_use]
pub fn max_chain_length(width: usize, height: usize, multiplier: f32) -> usize {
    ((width.min(height) as f32 * multiplier).round() as usize).max(2)
}

enum Phase {
    Chains,
    Hills(SnapshotPass),
    Done,
}

pub struct MountainsStage {
    budget: StepBudget,
    phase: Phase,
    chains_total: usize,
    chains_done: usize,
}

impl MountainsStage {
    #[must_use]
    pub fn new(budget: StepBudget, ctx: &GenerationContext) -> Self {
        Self {
            budget,
            phase: Phase::Chains,
            chains_total: ctx.params.mountains.mountain_chain_count,
            chains_done: 0,
        }
    }

    fn place_chain(ctx: &mut GenerationContext) {
        let (width, height) = (ctx.width(), ctx.height());
        let grid = &ctx.grid;
        let Some(start) = find_cell(&mut ctx.rng, width, height, SEED_RETRIES, |c| {
            grid.get(c) == TerrainKind::Plains
        }) else {
            tracing::debug!("хребет пропущен: не нашлось равнины для старта");
            return;
        };

        let max_len = max_chain_length(width, height, ctx.params.mountains.chain_length_multiplier);
        let length = ctx.rng.gen_range((max_len / 2).max(1)..=max_len);
        let axis = if ctx.rng.gen_bool(0.5) {
            ChainAxis::Rows
        } else {
            ChainAxis::Cols
        };
        let heading = if ctx.rng.gen_bool(0.5) { 1 } else { -1 };
        let chain = draw_chain(&mut ctx.grid, &mut ctx.rng, start, length, axis, heading);
        tracing::debug!(len = chain.len(), target = length, ?axis, "хребет нарисован");
    }
}

impl Stage for MountainsStage {
    fn id(&self) -> StageId {
        StageId::Mountains
    }

    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus {
        self.budget.reset();
        loop {
            match &mut self.phase {
                Phase::Chains => {
                    if self.chains_done >= self.chains_total {
                        self.phase = Phase::Hills(SnapshotPass::new(&ctx.grid));
                        continue;
                    }
                    Self::place_chain(ctx);
                    self.chains_done += 1;
                    if self.budget.tick() {
                        return StageStatus::Yielded;
                    }
                }
                Phase::Hills(pass) => {
                    let chance = f64::from(ctx.params.mountains.hill_chance);
                    let rng = &mut ctx.rng;
                    let status = pass.run(&mut ctx.grid, &mut self.budget, |snap, coord| {
                        hill_rewrite(snap, coord, &mut *rng, chance)
                    });
                    if status == StageStatus::Yielded {
                        return status;
                    }
                    tracing::info!(
                        chains = self.chains_done,
                        mountains = ctx.grid.count(TerrainKind::Mountains),
                        hills = ctx.grid.count(TerrainKind::Hills),
                        "горы и холмы готовы"
                    );
                    self.phase = Phase::Done;
                }
                Phase::Done => return StageStatus::Finished,
            }
        }
    }

    fn progress(&self) -> f32 {
        match &self.phase {
            Phase::Chains => 0.5 * fraction(self.chains_done, self.chains_total),
            Phase::Hills(pass) => 0.5 + 0.5 * pass.progress(),
            Phase::Done => 1.0,
        }
    }
}
