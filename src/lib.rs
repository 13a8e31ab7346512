pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{
    memory::MemoryView,
    seed::{load_dataset, DatasetFormat},
};
pub use config::AppConfig;
pub use crate::core::repository::Repository;
pub use domain::model::{Dataset, GenderCount, MinMaxAmount, Penalty, Player, PlayerPenalties};
pub use utils::error::{ClubError, Result};
