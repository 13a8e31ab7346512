pub mod repository;

pub use crate::domain::model::{Dataset, MinMaxAmount, Penalty, Player, PlayerPenalties};
pub use crate::domain::ports::EntityView;
pub use crate::utils::error::Result;
