// src/config.rs
//! Конфигурация генерации гексагональной карты
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Размер карты и сид
//! - Бюджет кооперативного шага
//! - Береговую линию, заливы и острова
//! - Пустыню, горные хребты, озёра и реки
//! - Рост лесов, болот и пустошей
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::error::{MapGenError, Result};
use crate::hex::Edge;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Минимальная длина стороны карты.
pub const MIN_MAP_SIDE: usize = 4;

/// Настройки кооперативного планировщика
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerSettings {
    /// Сколько миллисекунд стадия может работать за один тик хоста
    #[serde(default = "default_frame_budget_ms")]
    pub frame_budget_ms: f32,

    /// Вторичный триггер: уступать после стольких единиц работы (строк, объектов)
    #[serde(default)]
    pub max_units_per_slice: Option<usize>,
}

fn default_frame_budget_ms() -> f32 {
    8.0
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            frame_budget_ms: 8.0,
            max_units_per_slice: None,
        }
    }
}

/// Настройки береговой линии
///
/// Море занимает полосу вдоль одного края карты, граница полосы искажается шумом.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoastSettings {
    /// Фиксированный морской край (по умолчанию выбирается случайно)
    #[serde(default)]
    pub sea_border: Option<Edge>,

    /// Доля карты поперёк морского края, занятая водой (0.0..=0.5)
    #[serde(default = "default_water_percentage")]
    pub water_percentage: f32,

    /// Толщина мелководья как доля меньшей стороны карты (0.0..=0.25)
    #[serde(default = "default_coast_depth")]
    pub coast_depth: f32,

    /// Частота шума береговой линии
    #[serde(default = "default_coast_noise_frequency")]
    pub noise_frequency: f32,

    /// Насколько шум сдвигает береговую линию, в долях ширины морской полосы (0.0..=2.0)
    #[serde(default = "default_coast_noise_amplitude")]
    pub noise_amplitude: f32,
}

fn default_water_percentage() -> f32 {
    0.15
}
fn default_coast_depth() -> f32 {
    0.04
}
fn default_coast_noise_frequency() -> f32 {
    0.08
}
fn default_coast_noise_amplitude() -> f32 {
    0.6
}

impl Default for CoastSettings {
    fn default() -> Self {
        Self {
            sea_border: None,
            water_percentage: 0.15,
            coast_depth: 0.04,
            noise_frequency: 0.08,
            noise_amplitude: 0.6,
        }
    }
}

/// Заливы ("пальцы" воды вглубь суши) и острова
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterFeatureSettings {
    #[serde(default = "default_min_fingers")]
    pub min_fingers: usize,

    #[serde(default = "default_max_fingers")]
    pub max_fingers: usize,

    /// Максимальная длина залива как доля размера карты поперёк моря (0.0..=0.6)
    #[serde(default = "default_finger_length")]
    pub finger_length: f32,

    #[serde(default = "default_min_islands")]
    pub min_islands: usize,

    #[serde(default = "default_max_islands")]
    pub max_islands: usize,

    #[serde(default = "default_min_island_size")]
    pub min_island_size: usize,

    #[serde(default = "default_max_island_size")]
    pub max_island_size: usize,

    /// Вероятность присоединить соседнюю водную клетку к острову
    #[serde(default = "default_island_growth_chance")]
    pub island_growth_chance: f32,
}

fn default_min_fingers() -> usize {
    2
}
fn default_max_fingers() -> usize {
    5
}
fn default_finger_length() -> f32 {
    0.2
}
fn default_min_islands() -> usize {
    1
}
fn default_max_islands() -> usize {
    4
}
fn default_min_island_size() -> usize {
    3
}
fn default_max_island_size() -> usize {
    12
}
fn default_island_growth_chance() -> f32 {
    0.5
}

impl Default for WaterFeatureSettings {
    fn default() -> Self {
        Self {
            min_fingers: 2,
            max_fingers: 5,
            finger_length: 0.2,
            min_islands: 1,
            max_islands: 4,
            min_island_size: 3,
            max_island_size: 12,
            island_growth_chance: 0.5,
        }
    }
}

/// Пустыня вдоль второго (не морского) края
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesertSettings {
    /// Доля карты поперёк края пустыни (0.0..=0.5)
    #[serde(default = "default_desert_percentage")]
    pub desert_percentage: f32,

    #[serde(default = "default_desert_noise_frequency")]
    pub noise_frequency: f32,

    /// Сдвиг границы пустыни шумом, в долях ширины полосы (0.0..=2.0)
    #[serde(default = "default_desert_noise_amplitude")]
    pub noise_amplitude: f32,
}

fn default_desert_percentage() -> f32 {
    0.12
}
fn default_desert_noise_frequency() -> f32 {
    0.06
}
fn default_desert_noise_amplitude() -> f32 {
    0.5
}

impl Default for DesertSettings {
    fn default() -> Self {
        Self {
            desert_percentage: 0.12,
            noise_frequency: 0.06,
            noise_amplitude: 0.5,
        }
    }
}

/// Горные хребты и холмы вокруг них
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MountainSettings {
    #[serde(default = "default_mountain_chain_count")]
    pub mountain_chain_count: usize,

    /// Максимальная длина хребта как доля меньшей стороны карты (0.0..=1.0)
    #[serde(default = "default_chain_length_multiplier")]
    pub chain_length_multiplier: f32,

    /// Вероятность превратить равнину рядом с горой в холмы
    #[serde(default = "default_hill_chance")]
    pub hill_chance: f32,
}

fn default_mountain_chain_count() -> usize {
    6
}
fn default_chain_length_multiplier() -> f32 {
    0.35
}
fn default_hill_chance() -> f32 {
    0.8
}

impl Default for MountainSettings {
    fn default() -> Self {
        Self {
            mountain_chain_count: 6,
            chain_length_multiplier: 0.35,
            hill_chance: 0.8,
        }
    }
}

/// Озёра и реки
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydrologySettings {
    #[serde(default = "default_lakes")]
    pub lakes: usize,

    /// Максимальный размер озера в клетках (не меньше 3)
    #[serde(default = "default_max_lake_size")]
    pub max_lake_size: usize,

    #[serde(default = "default_rivers")]
    pub rivers: usize,
}

fn default_lakes() -> usize {
    5
}
fn default_max_lake_size() -> usize {
    6
}
fn default_rivers() -> usize {
    8
}

impl Default for HydrologySettings {
    fn default() -> Self {
        Self {
            lakes: 5,
            max_lake_size: 6,
            rivers: 8,
        }
    }
}

/// Луга, леса, болота и пустоши
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeSettings {
    /// Примерная доля равнин, которые станут лугами (0.0..=1.0)
    #[serde(default = "default_grassland_share")]
    pub grassland_share: f32,

    #[serde(default = "default_grassland_frequency")]
    pub grassland_frequency: f32,

    #[serde(default = "default_major_forest_count")]
    pub major_forest_count: usize,

    #[serde(default = "default_major_forest_size")]
    pub major_forest_size: usize,

    #[serde(default = "default_minor_forest_count")]
    pub minor_forest_count: usize,

    #[serde(default = "default_minor_forest_size")]
    pub minor_forest_size: usize,

    /// Начальная вероятность принять соседа при росте леса
    #[serde(default = "default_forest_growth_chance")]
    pub forest_growth_chance: f32,

    #[serde(default = "default_swamp_count")]
    pub swamp_count: usize,

    #[serde(default = "default_swamp_size")]
    pub swamp_size: usize,

    #[serde(default = "default_major_wasteland_count")]
    pub major_wasteland_count: usize,

    #[serde(default = "default_major_wasteland_size")]
    pub major_wasteland_size: usize,

    #[serde(default = "default_minor_wasteland_count")]
    pub minor_wasteland_count: usize,

    #[serde(default = "default_minor_wasteland_size")]
    pub minor_wasteland_size: usize,

    #[serde(default = "default_wasteland_noise_frequency")]
    pub wasteland_noise_frequency: f32,
}

fn default_grassland_share() -> f32 {
    0.3
}
fn default_grassland_frequency() -> f32 {
    0.05
}
fn default_major_forest_count() -> usize {
    5
}
fn default_major_forest_size() -> usize {
    60
}
fn default_minor_forest_count() -> usize {
    10
}
fn default_minor_forest_size() -> usize {
    15
}
fn default_forest_growth_chance() -> f32 {
    0.85
}
fn default_swamp_count() -> usize {
    4
}
fn default_swamp_size() -> usize {
    8
}
fn default_major_wasteland_count() -> usize {
    1
}
fn default_major_wasteland_size() -> usize {
    40
}
fn default_minor_wasteland_count() -> usize {
    3
}
fn default_minor_wasteland_size() -> usize {
    12
}
fn default_wasteland_noise_frequency() -> f32 {
    0.1
}

impl Default for BiomeSettings {
    fn default() -> Self {
        Self {
            grassland_share: 0.3,
            grassland_frequency: 0.05,
            major_forest_count: 5,
            major_forest_size: 60,
            minor_forest_count: 10,
            minor_forest_size: 15,
            forest_growth_chance: 0.85,
            swamp_count: 4,
            swamp_size: 8,
            major_wasteland_count: 1,
            major_wasteland_size: 40,
            minor_wasteland_count: 3,
            minor_wasteland_size: 12,
            wasteland_noise_frequency: 0.1,
        }
    }
}

/// Финальный проход по морскому берегу
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShoreSettings {
    #[serde(default = "default_shore_chance")]
    pub shore_chance: f32,
}

fn default_shore_chance() -> f32 {
    0.8
}

impl Default for ShoreSettings {
    fn default() -> Self {
        Self { shore_chance: 0.8 }
    }
}

/// Основные параметры генерации карты
///
/// Полная конфигурация для одного прогона. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapGenerationParams {
    /// Сид генератора случайных чисел. Без него каждый прогон даёт новую карту.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Ширина карты в клетках (по умолчанию 120)
    #[serde(default = "default_width")]
    pub width: usize,

    /// Высота карты в клетках (по умолчанию 80)
    #[serde(default = "default_height")]
    pub height: usize,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub coast: CoastSettings,

    #[serde(default)]
    pub water_features: WaterFeatureSettings,

    #[serde(default)]
    pub desert: DesertSettings,

    #[serde(default)]
    pub mountains: MountainSettings,

    #[serde(default)]
    pub hydrology: HydrologySettings,

    #[serde(default)]
    pub biomes: BiomeSettings,

    #[serde(default)]
    pub shore: ShoreSettings,
}

fn default_width() -> usize {
    120
}
fn default_height() -> usize {
    80
}

impl Default for MapGenerationParams {
    fn default() -> Self {
        Self {
            seed: None,
            width: 120,
            height: 80,
            scheduler: SchedulerSettings::default(),
            coast: CoastSettings::default(),
            water_features: WaterFeatureSettings::default(),
            desert: DesertSettings::default(),
            mountains: MountainSettings::default(),
            hydrology: HydrologySettings::default(),
            biomes: BiomeSettings::default(),
            shore: ShoreSettings::default(),
        }
    }
}

impl MapGenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # map.toml
    /// seed = 42
    /// width = 160
    /// height = 100
    ///
    /// [coast]
    /// sea_border = "North"
    /// water_percentage = 0.2
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let params: Self = toml::from_str(contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Проверяет размеры карты и диапазоны всех долей и вероятностей.
    pub fn validate(&self) -> Result<()> {
        if self.width < MIN_MAP_SIDE || self.height < MIN_MAP_SIDE {
            return Err(MapGenError::InvalidDimensions {
                width: self.width,
                height: self.height,
                min: MIN_MAP_SIDE,
            });
        }

        check_range("scheduler.frame_budget_ms", self.scheduler.frame_budget_ms, 0.1, 1000.0)?;

        check_range("coast.water_percentage", self.coast.water_percentage, 0.0, 0.5)?;
        check_range("coast.coast_depth", self.coast.coast_depth, 0.0, 0.25)?;
        check_range("coast.noise_frequency", self.coast.noise_frequency, 0.0, 1.0)?;
        check_range("coast.noise_amplitude", self.coast.noise_amplitude, 0.0, 2.0)?;

        let wf = &self.water_features;
        check_order("water_features.fingers", wf.min_fingers, wf.max_fingers)?;
        check_order("water_features.islands", wf.min_islands, wf.max_islands)?;
        check_order("water_features.island_size", wf.min_island_size.max(1), wf.max_island_size)?;
        check_range("water_features.finger_length", wf.finger_length, 0.0, 0.6)?;
        check_range("water_features.island_growth_chance", wf.island_growth_chance, 0.0, 1.0)?;

        check_range("desert.desert_percentage", self.desert.desert_percentage, 0.0, 0.5)?;
        check_range("desert.noise_frequency", self.desert.noise_frequency, 0.0, 1.0)?;
        check_range("desert.noise_amplitude", self.desert.noise_amplitude, 0.0, 2.0)?;

        check_range("mountains.chain_length_multiplier", self.mountains.chain_length_multiplier, 0.0, 1.0)?;
        check_range("mountains.hill_chance", self.mountains.hill_chance, 0.0, 1.0)?;

        check_order("hydrology.max_lake_size", 3, self.hydrology.max_lake_size)?;

        check_range("biomes.grassland_share", self.biomes.grassland_share, 0.0, 1.0)?;
        check_range("biomes.grassland_frequency", self.biomes.grassland_frequency, 0.0, 1.0)?;
        check_range("biomes.forest_growth_chance", self.biomes.forest_growth_chance, 0.0, 1.0)?;
        check_range("biomes.wasteland_noise_frequency", self.biomes.wasteland_noise_frequency, 0.0, 1.0)?;

        check_range("shore.shore_chance", self.shore.shore_chance, 0.0, 1.0)?;
        Ok(())
    }

    /// Бюджет кадра в секундах.
    #[must_use]
    pub fn frame_budget_seconds(&self) -> f32 {
        self.scheduler.frame_budget_ms / 1000.0
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    // NaN тоже не проходит
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MapGenError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn check_order(name: &'static str, min: usize, max: usize) -> Result<()> {
    if min <= max {
        Ok(())
    } else {
        Err(MapGenError::InvertedRange { name, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        MapGenerationParams::default()
            .validate()
            .expect("default params should validate");
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let params = MapGenerationParams::from_toml_str(
            r#"
            seed = 7
            width = 40

            [coast]
            sea_border = "West"
            water_percentage = 0.25
            "#,
        )
        .expect("valid toml");

        assert_eq!(params.seed, Some(7));
        assert_eq!(params.width, 40);
        assert_eq!(params.height, 80);
        assert_eq!(params.coast.sea_border, Some(Edge::West));
        assert!((params.coast.coast_depth - 0.04).abs() < f32::EPSILON);
        assert_eq!(params.hydrology, HydrologySettings::default());
    }

    #[test]
    fn tiny_map_is_rejected() {
        let params = MapGenerationParams {
            width: 3,
            ..MapGenerationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MapGenError::InvalidDimensions { width: 3, .. })
        ));
    }

    #[test]
    fn probability_above_one_is_rejected() {
        let mut params = MapGenerationParams::default();
        params.shore.shore_chance = 1.5;
        assert!(matches!(
            params.validate(),
            Err(MapGenError::OutOfRange { name: "shore.shore_chance", .. })
        ));
    }

    #[test]
    fn inverted_island_range_is_rejected() {
        let mut params = MapGenerationParams::default();
        params.water_features.min_islands = 5;
        params.water_features.max_islands = 2;
        assert!(matches!(
            params.validate(),
            Err(MapGenError::InvertedRange { name: "water_features.islands", .. })
        ));
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        assert!(matches!(
            MapGenerationParams::from_toml_str("width = \"wide\""),
            Err(MapGenError::Toml(_))
        ));
    }
}
