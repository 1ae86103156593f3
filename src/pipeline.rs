// src/pipeline.rs
//! Конвейер генерации и его кооперативный драйвер.
//!
//! Хост вызывает `MapGenerator::step()` раз в кадр. Каждый вызов продвигает
//! текущую стадию на один срез её бюджета. Готовая карта доступна только после
//! завершения последней стадии; `regenerate()` выбрасывает текущий прогон и
//! начинает заново с первой стадии.

use crate::config::MapGenerationParams;
use crate::error::{MapGenError, Result};
use crate::hex::{Edge, HexCoord};
use crate::stages::coast_classifier::RiverLakeCoastStage;
use crate::stages::coastline::CoastlineStage;
use crate::stages::desert::DesertStage;
use crate::stages::forests::ForestsStage;
use crate::stages::grasslands::GrasslandsStage;
use crate::stages::init::InitializeStage;
use crate::stages::lakes::LakesStage;
use crate::stages::mountains::MountainsStage;
use crate::stages::rivers::RiversStage;
use crate::stages::shore::ShoreStage;
use crate::stages::swamps::SwampsStage;
use crate::stages::wastelands::WastelandsStage;
use crate::stages::water_features::WaterFeaturesStage;
use crate::stages::{GenerationContext, Stage, StageId, StageStatus, stage_budget};
use crate::terrain::TerrainGrid;
use serde::Serialize;
use std::collections::BTreeSet;

/// Ход генерации: стадия и доля её выполнения. Только для индикации.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationProgress {
    pub stage: StageId,
    pub fraction: f32,
}

impl GenerationProgress {
    #[must_use]
    pub fn stage_name(&self) -> &'static str {
        self.stage.name()
    }
}

/// Результат одного вызова `step()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    InProgress(GenerationProgress),
    Complete,
}

/// Готовая карта и множества, которые нужны внешним потребителям.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedMap {
    pub seed: u64,
    pub sea_border: Edge,
    pub grid: TerrainGrid,
    pub river_cells: BTreeSet<HexCoord>,
    pub lake_cells: BTreeSet<HexCoord>,
    pub river_coast_hexes: BTreeSet<HexCoord>,
    pub lake_coast_hexes: BTreeSet<HexCoord>,
}

impl GeneratedMap {
    fn from_context(ctx: GenerationContext) -> Self {
        Self {
            seed: ctx.seed,
            sea_border: ctx.sea_border,
            grid: ctx.grid,
            river_cells: ctx.river_cells,
            lake_cells: ctx.lake_cells,
            river_coast_hexes: ctx.river_coast_hexes,
            lake_coast_hexes: ctx.lake_coast_hexes,
        }
    }

    #[must_use]
    pub fn is_river_coast(&self, coord: HexCoord) -> bool {
        self.river_coast_hexes.contains(&coord)
    }

    #[must_use]
    pub fn is_lake_coast(&self, coord: HexCoord) -> bool {
        self.lake_coast_hexes.contains(&coord)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_as_json(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Стадии в порядке конвейера.
///
/// Часть стадий тянет случайные числа в конструкторе, поэтому строятся они
/// все сразу, в начале прогона.
#[must_use]
pub fn build_stages(ctx: &mut GenerationContext) -> Vec<Box<dyn Stage>> {
    let budget = || stage_budget(&ctx.params);
    let (b_init, b_coast, b_water, b_desert, b_mount) = (budget(), budget(), budget(), budget(), budget());
    let (b_lakes, b_rivers, b_banks, b_grass) = (budget(), budget(), budget(), budget());
    let (b_forest, b_swamp, b_waste, b_shore) = (budget(), budget(), budget(), budget());

    let height = ctx.height();
    vec![
        Box::new(InitializeStage::new(b_init, height)),
        Box::new(CoastlineStage::new(b_coast, ctx)),
        Box::new(WaterFeaturesStage::new(b_water, ctx)),
        Box::new(DesertStage::new(b_desert, ctx)),
        Box::new(MountainsStage::new(b_mount, ctx)),
        Box::new(LakesStage::new(b_lakes, ctx)),
        Box::new(RiversStage::new(b_rivers, ctx)),
        Box::new(RiverLakeCoastStage::new(b_banks, height)),
        Box::new(GrasslandsStage::new(b_grass, ctx)),
        Box::new(ForestsStage::new(b_forest, ctx)),
        Box::new(SwampsStage::new(b_swamp, ctx)),
        Box::new(WastelandsStage::new(b_waste, ctx)),
        Box::new(ShoreStage::new(b_shore)),
    ]
}

struct GenerationRun {
    ctx: GenerationContext,
    stages: Vec<Box<dyn Stage>>,
    current: usize,
}

impl GenerationRun {
    fn new(params: &MapGenerationParams, seed: u64) -> Self {
        let mut ctx = GenerationContext::new(params.clone(), seed);
        let stages = build_stages(&mut ctx);
        Self {
            ctx,
            stages,
            current: 0,
        }
    }
}

type ProgressCallback = Box<dyn FnMut(&GenerationProgress)>;
type CompleteCallback = Box<dyn FnMut(&GeneratedMap)>;

pub struct MapGenerator {
    params: MapGenerationParams,
    run: Option<GenerationRun>,
    finished: Option<GeneratedMap>,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
}

impl MapGenerator {
    /// Проверяет параметры и сразу начинает первый прогон.
    pub fn new(params: MapGenerationParams) -> Result<Self> {
        params.validate()?;
        let mut generator = Self {
            params,
            run: None,
            finished: None,
            on_progress: None,
            on_complete: None,
        };
        generator.regenerate();
        Ok(generator)
    }

    #[must_use]
    pub fn params(&self) -> &MapGenerationParams {
        &self.params
    }

    pub fn on_progress(&mut self, callback: impl FnMut(&GenerationProgress) + 'static) {
        self.on_progress = Some(Box::new(callback));
    }

    pub fn on_complete(&mut self, callback: impl FnMut(&GeneratedMap) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Новый прогон с сидом из параметров (или случайным, если его там нет).
    pub fn regenerate(&mut self) {
        let seed = self.params.seed.unwrap_or_else(rand::random);
        self.regenerate_with_seed(seed);
    }

    pub fn regenerate_with_seed(&mut self, seed: u64) {
        self.finished = None;
        self.run = Some(GenerationRun::new(&self.params, seed));
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Готовая карта; во время генерации `None`.
    #[must_use]
    pub fn result(&self) -> Option<&GeneratedMap> {
        self.finished.as_ref()
    }

    pub fn take_result(&mut self) -> Option<GeneratedMap> {
        self.finished.take()
    }

    /// Текущий ход генерации.
    #[must_use]
    pub fn progress(&self) -> Option<GenerationProgress> {
        let run = self.run.as_ref()?;
        let stage = run.stages.get(run.current)?;
        Some(GenerationProgress {
            stage: stage.id(),
            fraction: stage.progress(),
        })
    }

    /// Один срез работы. Вызывается хостом раз в кадр.
    pub fn step(&mut self) -> StepOutcome {
        let Some(run) = self.run.as_mut() else {
            return StepOutcome::Complete;
        };

        let Some(stage) = run.stages.get_mut(run.current) else {
            self.complete();
            return StepOutcome::Complete;
        };

        let status = stage.advance(&mut run.ctx);
        let progress = GenerationProgress {
            stage: stage.id(),
            fraction: if status == StageStatus::Finished {
                1.0
            } else {
                stage.progress()
            },
        };
        if let Some(callback) = self.on_progress.as_mut() {
            callback(&progress);
        }

        if status == StageStatus::Finished {
            tracing::info!(stage = progress.stage_name(), "стадия завершена");
            run.current += 1;
            if run.current == run.stages.len() {
                self.complete();
                return StepOutcome::Complete;
            }
        }
        StepOutcome::InProgress(progress)
    }

    /// Прогоняет генерацию до конца без возврата управления.
    pub fn run_to_completion(&mut self) -> Option<&GeneratedMap> {
        while self.step() != StepOutcome::Complete {}
        self.result()
    }

    fn complete(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let map = GeneratedMap::from_context(run.ctx);
        tracing::info!(
            seed = map.seed,
            sea_border = map.sea_border.name(),
            width = map.grid.width(),
            height = map.grid.height(),
            "карта сгенерирована"
        );
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&map);
        }
        self.finished = Some(map);
    }
}

/// Генерирует карту целиком за один вызов.
pub fn generate_map(params: MapGenerationParams) -> Result<GeneratedMap> {
    let mut generator = MapGenerator::new(params)?;
    generator.run_to_completion();
    generator.take_result().ok_or(MapGenError::Unfinished)
}
