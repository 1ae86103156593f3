use clap::Parser;
use hexmapgen::{MapGenerationParams, MapGenerator, StepOutcome};
use std::path::PathBuf;

/// Генератор гексагональных карт для Chronicles of Realms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (без него берутся настройки по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сид генерации, перекрывает значение из конфига
    #[arg(short, long)]
    seed: Option<u64>,

    /// Ширина карты в клетках
    #[arg(long)]
    width: Option<usize>,

    /// Высота карты в клетках
    #[arg(long)]
    height: Option<usize>,

    /// Путь для сохранения превью (по умолчанию: ./terrain.png)
    #[arg(short, long, default_value = "terrain.png")]
    output: PathBuf,

    /// Дополнительно сохранить карту и множества рек/озёр в JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации из {}...", path.display());
            MapGenerationParams::from_toml_file(path)?
        }
        None => MapGenerationParams::default(),
    };
    if cli.seed.is_some() {
        params.seed = cli.seed;
    }
    if let Some(width) = cli.width {
        params.width = width;
    }
    if let Some(height) = cli.height {
        params.height = height;
    }

    println!("Генерация карты (размер: {}×{})...", params.width, params.height);
    let mut generator = MapGenerator::new(params)?;

    let mut current = None;
    let mut slices = 0usize;
    loop {
        slices += 1;
        match generator.step() {
            StepOutcome::InProgress(progress) => {
                if current != Some(progress.stage) {
                    current = Some(progress.stage);
                    println!("  ⏳ {}", progress.stage_name());
                }
            }
            StepOutcome::Complete => break,
        }
    }

    let Some(map) = generator.take_result() else {
        return Err("генерация завершилась без карты".into());
    };
    println!(
        "✅ Готово за {slices} срезов (сид {}, море у края {})",
        map.seed,
        map.sea_border.name()
    );

    println!("\n📊 Состав карты:");
    let total = map.grid.cells().len().max(1);
    for (kind, count) in map.grid.histogram() {
        println!(
            "  {:<14} {:>6} ({:.1}%)",
            kind.name(),
            count,
            count as f64 * 100.0 / total as f64
        );
    }
    println!(
        "  реки: {}, озёра: {}, берега рек: {}, берега озёр: {}",
        map.river_cells.len(),
        map.lake_cells.len(),
        map.river_coast_hexes.len(),
        map.lake_coast_hexes.len()
    );

    println!("\nСохранение превью в {}", cli.output.display());
    map.grid.save_as_png(&cli.output.to_string_lossy())?;

    if let Some(path) = &cli.json {
        println!("Сохранение JSON в {}", path.display());
        map.save_as_json(&path.to_string_lossy())?;
    }

    println!("\nГотово! Карта сохранена.");
    Ok(())
}
