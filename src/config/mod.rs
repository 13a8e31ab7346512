#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use crate::adapters::seed::DatasetFormat;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "tennis-club")]
#[command(about = "Reporting queries over the tennis club players and penalties")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Dataset TOML file or directory with players.csv/penalties.csv")]
    pub dataset: Option<String>,

    #[arg(long, help = "Dataset format (toml or csv); inferred when omitted")]
    pub format: Option<DatasetFormat>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: cli::Command,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併設定檔與命令列參數
    pub fn resolve(&self) -> crate::Result<AppConfig> {
        let base = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => match &self.dataset {
                Some(dataset) => AppConfig::for_dataset(dataset.clone()),
                None => {
                    return Err(crate::ClubError::MissingConfigError {
                        field: "--dataset or --config".to_string(),
                    })
                }
            },
        };
        Ok(base.with_overrides(self.dataset.clone(), self.format, self.json_logs))
    }
}
