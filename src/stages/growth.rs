//! Общий примитив роста областей (леса, пустоши) и жадная заливка (болота).

use super::sample_unit;
use crate::hex::HexCoord;
use crate::terrain::{TerrainGrid, TerrainKind};
use fastnoise_lite::FastNoiseLite;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Рост останавливается после `target * ITERATION_FACTOR` шагов очереди.
pub const ITERATION_FACTOR: usize = 3;

const MIN_ACCEPT: f64 = 0.05;

pub struct GrowthRule<'a> {
    pub kind: TerrainKind,
    pub target_size: usize,
    /// Вероятность принять соседа, пока область ещё пуста
    pub base_chance: f64,
    /// Шум дополнительно гасит вероятность в `0.5..=1.0` раз
    pub noise: Option<&'a FastNoiseLite>,
}

/// Вероятность принять соседа падает по мере приближения к целевому размеру.
#[must_use]
pub fn acceptance_chance(base: f64, grown: usize, target: usize) -> f64 {
    if target == 0 {
        return 0.0;
    }
    let left = 1.0 - grown as f64 / target as f64;
    (base * left).clamp(MIN_ACCEPT, 1.0)
}

/// Вероятностный BFS от `seed` по равнинам и лугам.
pub fn grow_region<R: Rng>(
    grid: &mut TerrainGrid,
    rng: &mut R,
    seed: HexCoord,
    rule: &GrowthRule<'_>,
) -> Vec<HexCoord> {
    if rule.target_size == 0 || !grid.get(seed).is_open_ground() {
        return Vec::new();
    }

    let (width, height) = (grid.width(), grid.height());
    grid.set(seed, rule.kind);
    let mut region = vec![seed];
    let mut queue = VecDeque::from([seed]);
    let cap = rule.target_size * ITERATION_FACTOR;
    let mut iterations = 0;
    let mut directions = [0, 1, 2, 3, 4, 5];

    while let Some(cell) = queue.pop_front() {
        if region.len() >= rule.target_size || iterations >= cap {
            break;
        }
        iterations += 1;
        directions.shuffle(rng);

        for &dir in &directions {
            if region.len() >= rule.target_size {
                break;
            }
            let Some(next) = cell.neighbor(dir, width, height) else {
                continue;
            };
            if !grid.get(next).is_open_ground() {
                continue;
            }
            let mut chance = acceptance_chance(rule.base_chance, region.len(), rule.target_size);
            if let Some(noise) = rule.noise {
                chance *= 0.5 + 0.5 * f64::from(sample_unit(noise, next));
            }
            if rng.gen_bool(chance) {
                grid.set(next, rule.kind);
                region.push(next);
                queue.push_back(next);
            }
        }
    }
    region
}

/// Жадная заливка без вероятностей: все подходящие соседи подряд, до `max_size` клеток.
pub fn fill_greedy(grid: &mut TerrainGrid, seed: HexCoord, kind: TerrainKind, max_size: usize) -> Vec<HexCoord> {
    if max_size == 0 || !grid.get(seed).is_open_ground() {
        return Vec::new();
    }

    grid.set(seed, kind);
    let mut filled = vec![seed];
    let mut queue = VecDeque::from([seed]);

    'fill: while let Some(cell) = queue.pop_front() {
        for next in grid.neighbors(cell) {
            if filled.len() >= max_size {
                break 'fill;
            }
            if grid.get(next).is_open_ground() {
                grid.set(next, kind);
                filled.push(next);
                queue.push_back(next);
            }
        }
    }
    filled
}
