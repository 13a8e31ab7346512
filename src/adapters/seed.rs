use crate::domain::model::{Dataset, Penalty, Player};
use crate::utils::error::{ClubError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const PLAYERS_CSV: &str = "players.csv";
pub const PENALTIES_CSV: &str = "penalties.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Toml,
    Csv,
}

impl DatasetFormat {
    pub const NAMES: [&'static str; 2] = ["toml", "csv"];

    /// 目錄視為 CSV，其餘視為 TOML 檔案
    pub fn infer(path: &Path) -> Self {
        if path.is_dir() {
            DatasetFormat::Csv
        } else {
            DatasetFormat::Toml
        }
    }
}

impl FromStr for DatasetFormat {
    type Err = ClubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(DatasetFormat::Toml),
            "csv" => Ok(DatasetFormat::Csv),
            other => Err(ClubError::InvalidConfigValueError {
                field: "dataset.format".to_string(),
                value: other.to_string(),
                reason: format!("Valid formats: {}", Self::NAMES.join(", ")),
            }),
        }
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetFormat::Toml => write!(f, "toml"),
            DatasetFormat::Csv => write!(f, "csv"),
        }
    }
}

pub fn load_dataset<P: AsRef<Path>>(path: P, format: DatasetFormat) -> Result<Dataset> {
    let path = path.as_ref();
    tracing::info!("Loading {} dataset from {}", format, path.display());

    let dataset = match format {
        DatasetFormat::Toml => load_toml(path)?,
        DatasetFormat::Csv => load_csv_dir(path)?,
    };

    tracing::info!(
        "Loaded {} players and {} penalties",
        dataset.players.len(),
        dataset.penalties.len()
    );
    Ok(dataset)
}

/// 從 TOML 檔案載入 `[[players]]` 與 `[[penalties]]`
pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)?;
    dataset_from_toml_str(&content)
}

pub fn dataset_from_toml_str(content: &str) -> Result<Dataset> {
    Ok(toml::from_str(content)?)
}

/// Reads `players.csv` and `penalties.csv` (with headers) from `dir`.
pub fn load_csv_dir<P: AsRef<Path>>(dir: P) -> Result<Dataset> {
    let dir = dir.as_ref();
    let players: Vec<Player> = read_csv(&dir.join(PLAYERS_CSV))?;
    let penalties: Vec<Penalty> = read_csv(&dir.join(PENALTIES_CSV))?;
    Ok(Dataset { players, penalties })
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(ClubError::MissingConfigError {
            field: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}
