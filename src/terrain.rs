// src/terrain.rs
use crate::error::Result;
use crate::hex::HexCoord;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerrainKind {
    Plains,
    Grasslands,
    Forest,
    Hills,
    Mountains,
    Desert,
    Swamp,
    Wastelands,
    Shore,
    ShallowWater,
    DeepWater,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 11] = [
        TerrainKind::Plains,
        TerrainKind::Grasslands,
        TerrainKind::Forest,
        TerrainKind::Hills,
        TerrainKind::Mountains,
        TerrainKind::Desert,
        TerrainKind::Swamp,
        TerrainKind::Wastelands,
        TerrainKind::Shore,
        TerrainKind::ShallowWater,
        TerrainKind::DeepWater,
    ];

    /// Вода: только мелководье и глубина. Берег считается сушей.
    #[must_use]
    pub fn is_water(self) -> bool {
        matches!(self, TerrainKind::ShallowWater | TerrainKind::DeepWater)
    }

    #[must_use]
    pub fn is_land(self) -> bool {
        !self.is_water()
    }

    /// Клетки, на которые могут разрастаться леса и пустоши.
    #[must_use]
    pub fn is_open_ground(self) -> bool {
        matches!(self, TerrainKind::Plains | TerrainKind::Grasslands)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TerrainKind::Plains => "plains",
            TerrainKind::Grasslands => "grasslands",
            TerrainKind::Forest => "forest",
            TerrainKind::Hills => "hills",
            TerrainKind::Mountains => "mountains",
            TerrainKind::Desert => "desert",
            TerrainKind::Swamp => "swamp",
            TerrainKind::Wastelands => "wastelands",
            TerrainKind::Shore => "shore",
            TerrainKind::ShallowWater => "shallowWater",
            TerrainKind::DeepWater => "deepWater",
        }
    }

    #[must_use]
    pub fn to_rgb(self) -> [u8; 3] {
        match self {
            TerrainKind::Plains => [170, 200, 110],
            TerrainKind::Grasslands => [120, 190, 80],
            TerrainKind::Forest => [40, 110, 50],
            TerrainKind::Hills => [160, 140, 90],
            TerrainKind::Mountains => [130, 120, 115],
            TerrainKind::Desert => [220, 200, 130],
            TerrainKind::Swamp => [80, 100, 60],
            TerrainKind::Wastelands => [120, 90, 70],
            TerrainKind::Shore => [235, 220, 170],
            TerrainKind::ShallowWater => [70, 140, 200],
            TerrainKind::DeepWater => [0, 64, 128],
        }
    }
}

fn rgba(kind: TerrainKind) -> [u8; 4] {
    let rgb = kind.to_rgb();
    [rgb[0], rgb[1], rgb[2], 255]
}

/// Двумерная карта местности `height × width`, построчно.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    data: Vec<TerrainKind>,
}

impl TerrainGrid {
    /// Новая карта, целиком равнины.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![TerrainKind::Plains; width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cells(&self) -> &[TerrainKind] {
        &self.data
    }

    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        coord.row < self.height && coord.col < self.width
    }

    /// # Panics
    /// Если координата вне карты.
    #[must_use]
    pub fn get(&self, coord: HexCoord) -> TerrainKind {
        self.data[coord.row * self.width + coord.col]
    }

    /// # Panics
    /// Если координата вне карты.
    pub fn set(&mut self, coord: HexCoord, kind: TerrainKind) {
        self.data[coord.row * self.width + coord.col] = kind;
    }

    /// Перезаписывает одну строку равнинами.
    pub fn reset_row(&mut self, row: usize) {
        let start = row * self.width;
        self.data[start..start + self.width].fill(TerrainKind::Plains);
    }

    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + use<> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |row| (0..width).map(move |col| HexCoord::new(row, col)))
    }

    pub fn neighbors(&self, coord: HexCoord) -> impl Iterator<Item = HexCoord> + use<> {
        coord.neighbors(self.width, self.height)
    }

    /// Есть ли среди соседей клетка указанного типа.
    #[must_use]
    pub fn has_neighbor(&self, coord: HexCoord, kind: TerrainKind) -> bool {
        self.neighbors(coord).any(|n| self.get(n) == kind)
    }

    #[must_use]
    pub fn count(&self, kind: TerrainKind) -> usize {
        self.data.iter().filter(|&&k| k == kind).count()
    }

    #[must_use]
    pub fn histogram(&self) -> BTreeMap<TerrainKind, usize> {
        let mut counts = BTreeMap::new();
        for &kind in &self.data {
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }

    #[cfg(feature = "parallel")]
    pub fn to_rgba_image(&self) -> Vec<u8> {
        self.data
            .par_iter()
            .flat_map_iter(|&k| rgba(k))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn to_rgba_image(&self) -> Vec<u8> {
        self.data.iter().flat_map(|&k| rgba(k)).collect()
    }

    pub fn save_as_png(&self, path: &str) -> Result<()> {
        let img: image::ImageBuffer<image::Rgba<u8>, Vec<u8>> = image::ImageBuffer::from_raw(
            self.width as u32,
            self.height as u32,
            self.to_rgba_image(),
        )
        .ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save(path)?;
        Ok(())
    }
}
