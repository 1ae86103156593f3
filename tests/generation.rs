//! Интеграционные тесты конвейера генерации.
//!
//! Проверяют свойства готовой карты, сценарии отдельных стадий и то, что
//! нарезка работы на срезы не влияет на результат.

use hexmapgen::config::{MapGenerationParams, SchedulerSettings};
use hexmapgen::hex::{Edge, HexCoord};
use hexmapgen::pipeline::{GeneratedMap, MapGenerator, StepOutcome, build_stages, generate_map};
use hexmapgen::scheduler::StepBudget;
use hexmapgen::stages::init::InitializeStage;
use hexmapgen::stages::lakes::try_place_lake;
use hexmapgen::stages::mountains::{ChainAxis, draw_chain};
use hexmapgen::stages::{GenerationContext, Stage, StageId, StageStatus};
use hexmapgen::terrain::{TerrainGrid, TerrainKind};
use hexmapgen::MapGenError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

fn params(seed: u64, width: usize, height: usize) -> MapGenerationParams {
    MapGenerationParams {
        seed: Some(seed),
        width,
        height,
        ..MapGenerationParams::default()
    }
}

fn generate(params: MapGenerationParams) -> GeneratedMap {
    generate_map(params).expect("valid parameters")
}

/// Прогоняет стадию до конца, не глядя на бюджет.
fn finish(stage: &mut dyn Stage, ctx: &mut GenerationContext) {
    while stage.advance(ctx) == StageStatus::Yielded {}
}

#[test]
fn test_map_has_requested_dimensions() {
    let map = generate(params(7, 48, 32));

    assert_eq!(map.grid.width(), 48);
    assert_eq!(map.grid.height(), 32);
    assert_eq!(map.grid.cells().len(), 48 * 32);
}

#[test]
fn test_rivers_and_lakes_never_become_mountains() {
    for seed in [1, 2, 3, 4] {
        let map = generate(params(seed, 60, 40));

        for &cell in map.river_cells.iter().chain(&map.lake_cells) {
            let kind = map.grid.get(cell);
            assert_ne!(kind, TerrainKind::Mountains, "seed {seed}: {cell:?}");
            assert_ne!(kind, TerrainKind::Hills, "seed {seed}: {cell:?}");
        }
    }
}

#[test]
fn test_lakes_are_shallow_and_away_from_deep_water() {
    for seed in [11, 12, 13] {
        let map = generate(params(seed, 60, 40));

        for &cell in &map.lake_cells {
            assert_eq!(map.grid.get(cell), TerrainKind::ShallowWater, "seed {seed}: {cell:?}");
            assert!(
                !map.grid.has_neighbor(cell, TerrainKind::DeepWater),
                "seed {seed}: lake cell {cell:?} touches deep water"
            );
        }
        // каждое озеро не меньше 3 клеток, значит и всех клеток не меньше
        assert!(map.lake_cells.is_empty() || map.lake_cells.len() >= 3);
    }
}

#[test]
fn test_coast_sets_are_land() {
    for seed in [21, 22, 23, 24, 25] {
        let map = generate(params(seed, 60, 40));

        for &cell in map.river_coast_hexes.iter().chain(&map.lake_coast_hexes) {
            let kind = map.grid.get(cell);
            assert!(!kind.is_water(), "seed {seed}: coast hex {cell:?} is {kind:?}");
            assert!(!map.river_cells.contains(&cell), "seed {seed}: {cell:?}");
            assert!(!map.lake_cells.contains(&cell), "seed {seed}: {cell:?}");
        }
        for &cell in &map.river_coast_hexes {
            assert!(map.is_river_coast(cell));
        }
        for &cell in &map.lake_coast_hexes {
            assert!(map.is_lake_coast(cell));
        }
    }
}

#[test]
fn test_shore_never_replaces_relief_or_swamp() {
    let mut ctx = GenerationContext::new(params(5, 60, 40), 5);
    let mut stages = build_stages(&mut ctx);
    let mut shore = stages.pop().expect("shore stage is last");
    assert_eq!(shore.id(), StageId::Shore);

    for stage in &mut stages {
        finish(stage.as_mut(), &mut ctx);
    }
    let before = ctx.grid.clone();
    finish(shore.as_mut(), &mut ctx);

    for coord in before.coords() {
        let old = before.get(coord);
        let new = ctx.grid.get(coord);
        if matches!(old, TerrainKind::Mountains | TerrainKind::Hills | TerrainKind::Swamp) || old.is_water() {
            assert_eq!(old, new, "{coord:?} changed from {old:?} to {new:?}");
        } else if old != new {
            assert_eq!(new, TerrainKind::Shore);
        }
    }
}

#[test]
fn test_initialize_is_idempotent() {
    let mut ctx = GenerationContext::new(params(3, 12, 9), 3);
    ctx.grid.set(HexCoord::new(4, 4), TerrainKind::DeepWater);

    let mut first = InitializeStage::new(StepBudget::unlimited(), 9);
    finish(&mut first, &mut ctx);
    let once = ctx.grid.clone();

    let mut second = InitializeStage::new(StepBudget::unlimited(), 9);
    finish(&mut second, &mut ctx);

    assert_eq!(once, ctx.grid);
    assert_eq!(ctx.grid.count(TerrainKind::Plains), 12 * 9);
}

#[test]
fn test_north_sea_keeps_top_rows_wet() {
    for seed in 0..8 {
        let mut p = params(seed, 10, 10);
        p.coast.sea_border = Some(Edge::North);
        p.coast.water_percentage = 0.2;

        let map = generate(p);
        assert_eq!(map.sea_border, Edge::North);
        for row in 0..2 {
            for col in 0..10 {
                let kind = map.grid.get(HexCoord::new(row, col));
                assert!(
                    matches!(
                        kind,
                        TerrainKind::DeepWater | TerrainKind::ShallowWater | TerrainKind::Shore
                    ),
                    "seed {seed}: ({row}, {col}) is {kind:?}"
                );
            }
        }
    }
}

#[test]
fn test_chain_of_five_on_open_plains() {
    let mut grid = TerrainGrid::new(10, 10);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let chain = draw_chain(&mut grid, &mut rng, HexCoord::new(5, 5), 5, ChainAxis::Rows, 1);

    let distinct: BTreeSet<_> = chain.iter().copied().collect();
    assert_eq!(distinct.len(), 5);
    assert_eq!(grid.count(TerrainKind::Mountains), 5);
    assert_eq!(grid.count(TerrainKind::Plains), 95);
    for pair in chain.windows(2) {
        assert!(grid.neighbors(pair[0]).any(|n| n == pair[1]), "chain must be contiguous");
    }
}

#[test]
fn test_lake_needs_two_free_neighbours() {
    let mut grid = TerrainGrid::new(5, 5);
    let center = HexCoord::new(2, 2);
    let neighbors: Vec<_> = grid.neighbors(center).collect();
    for &n in &neighbors[1..] {
        grid.set(n, TerrainKind::Mountains);
    }
    let before = grid.clone();

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    assert!(try_place_lake(&mut grid, &mut rng, center, 6).is_none());
    assert_eq!(grid, before);
}

#[test]
fn test_slice_size_does_not_change_the_map() {
    let coarse = generate(params(99, 50, 36));

    let mut fine_params = params(99, 50, 36);
    fine_params.scheduler = SchedulerSettings {
        frame_budget_ms: 1000.0,
        max_units_per_slice: Some(1),
    };
    let fine = generate(fine_params);

    assert_eq!(coarse.grid, fine.grid);
    assert_eq!(coarse.river_cells, fine.river_cells);
    assert_eq!(coarse.lake_cells, fine.lake_cells);
    assert_eq!(coarse.river_coast_hexes, fine.river_coast_hexes);
    assert_eq!(coarse.lake_coast_hexes, fine.lake_coast_hexes);
}

#[test]
fn test_result_is_hidden_until_complete() {
    let mut p = params(17, 30, 20);
    p.scheduler.max_units_per_slice = Some(1);
    let mut generator = MapGenerator::new(p).expect("valid parameters");

    assert!(matches!(generator.step(), StepOutcome::InProgress(_)));
    assert!(generator.result().is_none());
    assert!(!generator.is_finished());

    generator.run_to_completion();
    assert!(generator.is_finished());
    assert_eq!(generator.step(), StepOutcome::Complete);
}

#[test]
fn test_regenerate_mid_run_restarts_from_scratch() {
    let reference = generate(params(31, 40, 30));

    let mut p = params(31, 40, 30);
    p.scheduler.max_units_per_slice = Some(2);
    let mut generator = MapGenerator::new(p).expect("valid parameters");
    for _ in 0..25 {
        generator.step();
    }
    generator.regenerate();
    assert!(generator.result().is_none());

    let map = generator.run_to_completion().expect("finished run");
    assert_eq!(map.grid, reference.grid);
    assert_eq!(map.seed, 31);
}

#[test]
fn test_regenerate_with_other_seed_changes_map() {
    let mut generator = MapGenerator::new(params(1, 40, 30)).expect("valid parameters");
    let first = generator.run_to_completion().cloned().expect("finished run");

    generator.regenerate_with_seed(2);
    let second = generator.run_to_completion().expect("finished run");

    assert_eq!(second.seed, 2);
    assert_ne!(first.grid, second.grid);
}

#[test]
fn test_progress_walks_stages_in_order() {
    let mut p = params(8, 30, 20);
    p.scheduler.max_units_per_slice = Some(3);
    let mut generator = MapGenerator::new(p).expect("valid parameters");

    let seen = Rc::new(RefCell::new(Vec::new()));
    let completed = Rc::new(RefCell::new(0));
    {
        let seen = Rc::clone(&seen);
        generator.on_progress(move |progress| seen.borrow_mut().push(*progress));
    }
    {
        let completed = Rc::clone(&completed);
        generator.on_complete(move |_| *completed.borrow_mut() += 1);
    }
    generator.run_to_completion();

    let seen = seen.borrow();
    let mut order: Vec<StageId> = Vec::new();
    for progress in seen.iter() {
        assert!((0.0..=1.0).contains(&progress.fraction));
        if order.last() != Some(&progress.stage) {
            order.push(progress.stage);
        }
    }
    assert_eq!(
        order,
        vec![
            StageId::Initialize,
            StageId::Coastline,
            StageId::WaterFeatures,
            StageId::Desert,
            StageId::Mountains,
            StageId::Lakes,
            StageId::Rivers,
            StageId::RiverLakeCoasts,
            StageId::Grasslands,
            StageId::Forests,
            StageId::Swamps,
            StageId::Wastelands,
            StageId::Shore,
        ]
    );

    // внутри стадии доля не убывает
    for pair in seen.windows(2) {
        if pair[0].stage == pair[1].stage {
            assert!(pair[1].fraction >= pair[0].fraction, "{pair:?}");
        }
    }
    assert_eq!(seen.last().map(|p| p.fraction), Some(1.0));
    assert_eq!(*completed.borrow(), 1);
}

#[test]
fn test_invalid_params_are_rejected() {
    let result = MapGenerator::new(params(1, 2, 40));
    assert!(matches!(result, Err(MapGenError::InvalidDimensions { .. })));
}

#[test]
fn test_params_from_toml_file() {
    let path = std::env::temp_dir().join(format!("hexmapgen-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
seed = 4242
width = 24
height = 18

[coast]
sea_border = "West"
water_percentage = 0.25

[hydrology]
lakes = 2
rivers = 3
"#,
    )
    .expect("temp dir is writable");

    let loaded = MapGenerationParams::from_toml_file(&path);
    std::fs::remove_file(&path).ok();
    let loaded = loaded.expect("valid TOML");

    assert_eq!(loaded.seed, Some(4242));
    assert_eq!(loaded.coast.sea_border, Some(Edge::West));
    assert_eq!(loaded.hydrology.rivers, 3);

    let map = generate(loaded);
    assert_eq!(map.sea_border, Edge::West);
    assert_eq!((map.grid.width(), map.grid.height()), (24, 18));
}

#[test]
fn test_map_serializes_to_json() {
    let map = generate(params(77, 12, 10));
    let json = map.to_json().expect("map serializes");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

    assert_eq!(value["seed"], 77);
    assert!(value["grid"].is_object());
    assert!(value["river_cells"].is_array());
}
