use clap::Parser;
use tennis_club::utils::{logger, validation::Validate};
use tennis_club::{load_dataset, AppConfig, CliConfig, ClubError, MemoryView, Repository};

fn fail(e: &ClubError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e);
    std::process::exit(e.exit_code());
}

async fn run(cli: &CliConfig, config: &AppConfig) -> tennis_club::Result<serde_json::Value> {
    let dataset = load_dataset(config.dataset_path(), config.dataset_format())?;
    let repo = Repository::new(MemoryView::new(dataset)?);
    cli.command.run(&repo).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if config.json_logs() {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting tennis-club CLI");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    match run(&cli, &config).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Err(e) => fail(&e),
    }

    Ok(())
}
