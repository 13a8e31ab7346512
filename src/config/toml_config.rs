use crate::adapters::seed::DatasetFormat;
use crate::utils::error::{ClubError, Result};
use crate::utils::validation::{validate_one_of, validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub format: Option<DatasetFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl AppConfig {
    pub fn for_dataset(path: impl Into<String>) -> Self {
        Self {
            dataset: DatasetConfig {
                path: path.into(),
                format: None,
            },
            logging: None,
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${CLUB_DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ClubError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列參數優先於檔案設定
    pub fn with_overrides(
        mut self,
        dataset: Option<String>,
        format: Option<DatasetFormat>,
        json_logs: bool,
    ) -> Self {
        if let Some(path) = dataset {
            self.dataset.path = path;
        }
        if format.is_some() {
            self.dataset.format = format;
        }
        if json_logs {
            self.logging.get_or_insert_with(LoggingConfig::default).json = Some(true);
        }
        self
    }

    pub fn dataset_path(&self) -> PathBuf {
        PathBuf::from(&self.dataset.path)
    }

    /// Explicit format, otherwise inferred from the path (directory → CSV).
    pub fn dataset_format(&self) -> DatasetFormat {
        self.dataset
            .format
            .unwrap_or_else(|| DatasetFormat::infer(&self.dataset_path()))
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_path("dataset.path", &self.dataset.path)?;
        if let Some(level) = self.log_level() {
            validate_one_of("logging.level", level, &LOG_LEVELS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[dataset]
path = "data/tennis_club.toml"
format = "toml"

[logging]
level = "debug"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.dataset.path, "data/tennis_club.toml");
        assert_eq!(config.dataset_format(), DatasetFormat::Toml);
        assert_eq!(config.log_level(), Some("debug"));
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_CLUB_DATA_DIR", "/srv/club");

        let toml_content = r#"
[dataset]
path = "${TEST_CLUB_DATA_DIR}/seed"
format = "csv"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.dataset.path, "/srv/club/seed");
        assert_eq!(config.dataset_format(), DatasetFormat::Csv);

        std::env::remove_var("TEST_CLUB_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::from_toml_str("[dataset]\npath = \"\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            "[dataset]\npath = \"data\"\n[logging]\nlevel = \"loud\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::for_dataset("a.toml").with_overrides(
            Some("seed".to_string()),
            Some(DatasetFormat::Csv),
            true,
        );
        assert_eq!(config.dataset.path, "seed");
        assert_eq!(config.dataset_format(), DatasetFormat::Csv);
        assert!(config.json_logs());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[dataset]\npath = \"data/tennis_club.toml\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.dataset.path, "data/tennis_club.toml");
    }
}
