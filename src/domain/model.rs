use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub player_no: i64,
    pub name: String,
    pub town: String,
    pub sex: char,
    pub year_of_birth: i32,
}

/// A monetary penalty. `player_no` is the owning player's identity; the
/// inverse relation (`Player → penalties`) is resolved by the entity view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Penalty {
    pub payment_no: i64,
    pub player_no: i64,
    pub pen_date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub penalties: Vec<Penalty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxAmount {
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderCount {
    pub gender: char,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPenalties {
    pub player: Player,
    pub penalty_sum: Decimal,
}
