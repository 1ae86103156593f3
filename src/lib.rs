pub mod config;
pub mod error;
pub mod hex;
pub mod pipeline;
pub mod scheduler;
pub mod snapshot;
pub mod stages;
pub mod terrain;

pub use config::MapGenerationParams;
pub use error::{MapGenError, Result};
pub use hex::{Edge, HexCoord};
pub use pipeline::{GeneratedMap, GenerationProgress, MapGenerator, StepOutcome, generate_map};
pub use scheduler::StepBudget;
pub use stages::StageId;
pub use terrain::{TerrainGrid, TerrainKind};
