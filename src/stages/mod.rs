//! Стадии конвейера генерации.
//!
//! Каждая стадия: возобновляемый автомат: курсор (строка, номер объекта)
//! живёт в самой стадии, а общее состояние прогона в `GenerationContext`.
//! Стадия работает, пока не кончится её собственный `StepBudget`, и
//! возвращает `StageStatus::Yielded`; следующий вызов продолжает с курсора.

pub mod coast_classifier;
pub mod coastline;
pub mod desert;
pub mod forests;
pub mod grasslands;
pub mod growth;
pub mod init;
pub mod lakes;
pub mod mountains;
pub mod rivers;
pub mod shore;
pub mod swamps;
pub mod wastelands;
pub mod water_features;

use crate::config::MapGenerationParams;
use crate::hex::{Edge, HexCoord};
use crate::scheduler::StepBudget;
use crate::terrain::TerrainGrid;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Сколько раз ищем подходящую стартовую клетку, прежде чем сдаться.
pub const SEED_RETRIES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Initialize,
    Coastline,
    WaterFeatures,
    Desert,
    Mountains,
    Lakes,
    Rivers,
    RiverLakeCoasts,
    Grasslands,
    Forests,
    Swamps,
    Wastelands,
    Shore,
}

impl StageId {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StageId::Initialize => "initialize",
            StageId::Coastline => "coastline",
            StageId::WaterFeatures => "water_features",
            StageId::Desert => "desert",
            StageId::Mountains => "mountains",
            StageId::Lakes => "lakes",
            StageId::Rivers => "rivers",
            StageId::RiverLakeCoasts => "river_lake_coasts",
            StageId::Grasslands => "grasslands",
            StageId::Forests => "forests",
            StageId::Swamps => "swamps",
            StageId::Wastelands => "wastelands",
            StageId::Shore => "shore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Бюджет исчерпан, работа продолжится на следующем тике
    Yielded,
    Finished,
}

pub trait Stage {
    fn id(&self) -> StageId;

    /// Продвигает стадию на один срез.
    fn advance(&mut self, ctx: &mut GenerationContext) -> StageStatus;

    /// Доля выполненной работы, `0.0..=1.0`, не убывает.
    fn progress(&self) -> f32;
}

/// Общее состояние одного прогона генерации.
pub struct GenerationContext {
    pub params: MapGenerationParams,
    pub seed: u64,
    pub rng: ChaCha8Rng,
    /// Базовый сид шума, стадии сдвигают его через `wrapping_add`
    pub noise_seed: i32,
    pub grid: TerrainGrid,
    pub sea_border: Edge,
    /// Ширина морской полосы в клетках (без шумового сдвига)
    pub water_depth: usize,
    pub river_cells: BTreeSet<HexCoord>,
    pub lake_cells: BTreeSet<HexCoord>,
    pub river_coast_hexes: BTreeSet<HexCoord>,
    pub lake_coast_hexes: BTreeSet<HexCoord>,
}

impl GenerationContext {
    #[must_use]
    pub fn new(params: MapGenerationParams, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise_seed = rng.next_u32() as i32;
        let sea_border = coastline::choose_sea_border(&params, &mut rng);
        let water_depth = coastline::water_band_depth(&params, sea_border);
        let grid = TerrainGrid::new(params.width, params.height);

        Self {
            params,
            seed,
            rng,
            noise_seed,
            grid,
            sea_border,
            water_depth,
            river_cells: BTreeSet::new(),
            lake_cells: BTreeSet::new(),
            river_coast_hexes: BTreeSet::new(),
            lake_coast_hexes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Клетка принадлежит реке или озеру.
    #[must_use]
    pub fn is_inland_water(&self, coord: HexCoord) -> bool {
        self.river_cells.contains(&coord) || self.lake_cells.contains(&coord)
    }
}

/// Бюджет шага по настройкам прогона.
#[must_use]
pub fn stage_budget(params: &MapGenerationParams) -> StepBudget {
    let budget = StepBudget::new(params.frame_budget_seconds());
    match params.scheduler.max_units_per_slice {
        Some(units) => budget.with_unit_limit(units),
        None => budget,
    }
}

#[must_use]
pub fn make_noise(seed: i32, frequency: f32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(seed));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(frequency));
    noise
}

/// Шум в точке клетки, приведённый к `0.0..=1.0`.
#[must_use]
pub fn sample_unit(noise: &FastNoiseLite, coord: HexCoord) -> f32 {
    ((noise.get_noise_2d(coord.col as f32, coord.row as f32) + 1.0) * 0.5).clamp(0.0, 1.0)
}

pub fn random_cell<R: Rng>(rng: &mut R, width: usize, height: usize) -> HexCoord {
    HexCoord::new(rng.gen_range(0..height), rng.gen_range(0..width))
}

/// Ограниченный перебор случайных клеток: `None`, если за `retries` попыток ничего не подошло.
pub fn find_cell<R: Rng>(
    rng: &mut R,
    width: usize,
    height: usize,
    retries: usize,
    mut accept: impl FnMut(HexCoord) -> bool,
) -> Option<HexCoord> {
    for _ in 0..retries {
        let cell = random_cell(rng, width, height);
        if accept(cell) {
            return Some(cell);
        }
    }
    None
}

/// Доля `done / total`, для пустой работы 1.0.
#[must_use]
pub fn fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        1.0
    } else {
        (done as f32 / total as f32).min(1.0)
    }
}
