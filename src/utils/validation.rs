use crate::domain::model::Dataset;
use crate::utils::error::{ClubError, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;

pub const SEXES: [char; 2] = ['M', 'F'];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ClubError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ClubError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(ClubError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClubError::ValidationError {
            message: format!("{} cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_positive_id(field_name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(ClubError::ValidationError {
            message: format!("{} must be a positive integer, got {}", field_name, value),
        });
    }
    Ok(())
}

impl Validate for Dataset {
    /// 檢查玩家與罰款的資料完整性
    fn validate(&self) -> Result<()> {
        let mut player_nos = HashSet::new();
        for player in &self.players {
            validate_positive_id("player.player_no", player.player_no)?;
            if !player_nos.insert(player.player_no) {
                return Err(ClubError::ValidationError {
                    message: format!("duplicate player_no {}", player.player_no),
                });
            }
            validate_non_empty_string(&format!("player {} name", player.player_no), &player.name)?;
            if !SEXES.contains(&player.sex) {
                return Err(ClubError::ValidationError {
                    message: format!(
                        "player {} has sex '{}', expected one of M, F",
                        player.player_no, player.sex
                    ),
                });
            }
        }

        let mut payment_nos = HashSet::new();
        for penalty in &self.penalties {
            validate_positive_id("penalty.payment_no", penalty.payment_no)?;
            if !payment_nos.insert(penalty.payment_no) {
                return Err(ClubError::ValidationError {
                    message: format!("duplicate payment_no {}", penalty.payment_no),
                });
            }
            if !player_nos.contains(&penalty.player_no) {
                return Err(ClubError::ValidationError {
                    message: format!(
                        "penalty {} references unknown player {}",
                        penalty.payment_no, penalty.player_no
                    ),
                });
            }
            if penalty.amount < Decimal::ZERO {
                return Err(ClubError::ValidationError {
                    message: format!(
                        "penalty {} has negative amount {}",
                        penalty.payment_no, penalty.amount
                    ),
                });
            }
        }

        Ok(())
    }
}
