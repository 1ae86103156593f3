// src/hex.rs
//! Гексагональная сетка со смещёнными координатами.
//!
//! Соседи клетки зависят от чётности строки: чётные строки сдвинуты влево,
//! нечётные вправо. Любой обход (BFS, случайное блуждание, дилатация) обязан
//! брать таблицу по `row % 2`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Смещения (строка, столбец) для чётных строк: NW, NE, W, E, SW, SE.
pub const EVEN_ROW_NEIGHBORS: [(i32, i32); 6] = [(-1, -1), (-1, 0), (0, -1), (0, 1), (1, -1), (1, 0)];

/// Смещения (строка, столбец) для нечётных строк: NW, NE, W, E, SW, SE.
pub const ODD_ROW_NEIGHBORS: [(i32, i32); 6] = [(-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0), (1, 1)];

/// Координата клетки `(row, col)`. Строка 0 это северный край карты.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub row: usize,
    pub col: usize,
}

impl HexCoord {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Таблица смещений для строки этой клетки.
    #[must_use]
    pub fn neighbor_offsets(self) -> &'static [(i32, i32); 6] {
        if self.row % 2 == 0 {
            &EVEN_ROW_NEIGHBORS
        } else {
            &ODD_ROW_NEIGHBORS
        }
    }

    /// Сдвиг с проверкой границ: `None`, если результат вне карты.
    #[must_use]
    pub fn offset(self, dr: i32, dc: i32, width: usize, height: usize) -> Option<HexCoord> {
        let row = self.row as i64 + i64::from(dr);
        let col = self.col as i64 + i64::from(dc);
        if row < 0 || col < 0 || row >= height as i64 || col >= width as i64 {
            return None;
        }
        Some(HexCoord::new(row as usize, col as usize))
    }

    /// Сосед по направлению `0..6` (индекс в таблице смещений).
    #[must_use]
    pub fn neighbor(self, direction: usize, width: usize, height: usize) -> Option<HexCoord> {
        let (dr, dc) = self.neighbor_offsets()[direction % 6];
        self.offset(dr, dc, width, height)
    }

    /// Все соседи внутри карты (от 2 до 6 штук).
    pub fn neighbors(self, width: usize, height: usize) -> impl Iterator<Item = HexCoord> {
        self.neighbor_offsets()
            .iter()
            .filter_map(move |&(dr, dc)| self.offset(dr, dc, width, height))
    }
}

/// BFS с ограничением радиуса. Центр в результат не входит.
#[must_use]
pub fn cells_within_radius(
    center: HexCoord,
    radius: usize,
    width: usize,
    height: usize,
) -> Vec<HexCoord> {
    let mut found = Vec::new();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(center);
    queue.push_back((center, 0));

    while let Some((cell, dist)) = queue.pop_front() {
        if dist == radius {
            continue;
        }
        for next in cell.neighbors(width, height) {
            if visited.insert(next) {
                found.push(next);
                queue.push_back((next, dist + 1));
            }
        }
    }
    found
}

/// Край карты (для морской и пустынной границы).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    North,
    South,
    East,
    West,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::North, Edge::South, Edge::East, Edge::West];

    /// Расстояние клетки от края (0 для клеток на самом краю).
    #[must_use]
    pub fn depth(self, coord: HexCoord, width: usize, height: usize) -> usize {
        match self {
            Edge::North => coord.row,
            Edge::South => height - 1 - coord.row,
            Edge::West => coord.col,
            Edge::East => width - 1 - coord.col,
        }
    }

    /// Размер карты поперёк края.
    #[must_use]
    pub fn extent(self, width: usize, height: usize) -> usize {
        match self {
            Edge::North | Edge::South => height,
            Edge::East | Edge::West => width,
        }
    }

    /// Длина самого края.
    #[must_use]
    pub fn span(self, width: usize, height: usize) -> usize {
        match self {
            Edge::North | Edge::South => width,
            Edge::East | Edge::West => height,
        }
    }

    /// Положение клетки вдоль края.
    #[must_use]
    pub fn along(self, coord: HexCoord) -> usize {
        match self {
            Edge::North | Edge::South => coord.col,
            Edge::East | Edge::West => coord.row,
        }
    }

    /// Обратное к (`along`, `depth`).
    #[must_use]
    pub fn coord_at(self, along: usize, depth: usize, width: usize, height: usize) -> Option<HexCoord> {
        if along >= self.span(width, height) || depth >= self.extent(width, height) {
            return None;
        }
        Some(match self {
            Edge::North => HexCoord::new(depth, along),
            Edge::South => HexCoord::new(height - 1 - depth, along),
            Edge::West => HexCoord::new(along, depth),
            Edge::East => HexCoord::new(along, width - 1 - depth),
        })
    }

    #[must_use]
    pub fn others(self) -> [Edge; 3] {
        match self {
            Edge::North => [Edge::South, Edge::East, Edge::West],
            Edge::South => [Edge::North, Edge::East, Edge::West],
            Edge::East => [Edge::North, Edge::South, Edge::West],
            Edge::West => [Edge::North, Edge::South, Edge::East],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Edge::North => "north",
            Edge::South => "south",
            Edge::East => "east",
            Edge::West => "west",
        }
    }
}
