// src/error.rs
//! Ошибки конфигурации и экспорта.
//!
//! Сама генерация не падает: неудачные попытки размещения просто пропускаются.

#[derive(Debug, thiserror::Error)]
pub enum MapGenError {
    #[error("invalid map size {width}x{height}: each side must be at least {min}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        min: usize,
    },

    #[error("parameter `{name}` = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("parameter range `{name}` is inverted: min {min} > max {max}")]
    InvertedRange {
        name: &'static str,
        min: usize,
        max: usize,
    },

    #[error("generation stopped before the last stage")]
    Unfinished,

    #[error("config read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapGenError>;
