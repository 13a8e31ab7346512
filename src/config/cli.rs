use crate::core::repository::Repository;
use crate::domain::ports::EntityView;
use crate::utils::error::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;

/// One subcommand per catalog operation.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Players living in a town
    PlayersInTown { town: String },

    /// Players living in any of the given towns (comma separated)
    PlayersInTowns {
        #[arg(value_delimiter = ',')]
        towns: Vec<String>,
    },

    /// Players of a gender born before a year (exclusive)
    PlayersByGenderAndAge {
        #[arg(long)]
        female: bool,
        #[arg(long)]
        born_before: i32,
    },

    /// Penalties issued between two dates (inclusive, YYYY-MM-DD)
    PenaltiesInDateRange { start: NaiveDate, end: NaiveDate },

    /// Penalties with an amount greater than or equal to AMOUNT
    PenaltiesFromAmount { amount: Decimal },

    /// Average penalty amount
    AveragePenalty,

    /// Smallest and largest penalty amount
    MinMaxPenalty,

    /// Players with (or, with --without, without) penalties
    PlayersWithPenalties {
        #[arg(long)]
        without: bool,
    },

    /// Towns with at least MIN players
    TownsWithPlayers { min: i64 },

    /// Number of players per gender
    GenderCounts,

    /// Penalty sum for every player
    PenaltySums,
}

impl Command {
    pub async fn run<V: EntityView>(&self, repo: &Repository<V>) -> Result<serde_json::Value> {
        let value = match self {
            Command::PlayersInTown { town } => {
                serde_json::to_value(repo.players_living_in_town(town).await?)?
            }
            Command::PlayersInTowns { towns } => {
                serde_json::to_value(repo.players_living_in_towns(towns).await?)?
            }
            Command::PlayersByGenderAndAge {
                female,
                born_before,
            } => serde_json::to_value(
                repo.players_with_gender_and_age(*female, *born_before)
                    .await?,
            )?,
            Command::PenaltiesInDateRange { start, end } => {
                serde_json::to_value(repo.penalties_in_date_range(*start, *end).await?)?
            }
            Command::PenaltiesFromAmount { amount } => serde_json::to_value(
                repo.penalties_with_amount_higher_equal_than(*amount)
                    .await?,
            )?,
            Command::AveragePenalty => json!({ "average": repo.average_penalty_amount().await? }),
            Command::MinMaxPenalty => serde_json::to_value(repo.min_max_penalty_amount().await?)?,
            Command::PlayersWithPenalties { without } => {
                serde_json::to_value(repo.players_with_penalties(!without).await?)?
            }
            Command::TownsWithPlayers { min } => {
                serde_json::to_value(repo.towns_with_player_number(*min).await?)?
            }
            Command::GenderCounts => {
                // sorted for stable output
                let counts: BTreeMap<String, i64> = repo
                    .player_counts_by_gender()
                    .await?
                    .into_iter()
                    .map(|(gender, count)| (gender.to_string(), count))
                    .collect();
                serde_json::to_value(counts)?
            }
            Command::PenaltySums => {
                serde_json::to_value(repo.penalties_for_all_players().await?)?
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryView;
    use crate::domain::model::{Dataset, Penalty, Player};
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn repo() -> Repository<MemoryView> {
        let dataset = Dataset {
            players: vec![
                Player {
                    player_no: 8,
                    name: "Newcastle".to_string(),
                    town: "Inglewood".to_string(),
                    sex: 'F',
                    year_of_birth: 1962,
                },
                Player {
                    player_no: 44,
                    name: "Baker".to_string(),
                    town: "Inglewood".to_string(),
                    sex: 'M',
                    year_of_birth: 1963,
                },
            ],
            penalties: vec![Penalty {
                payment_no: 6,
                player_no: 8,
                pen_date: NaiveDate::from_ymd_opt(1980, 12, 8).unwrap(),
                amount: Decimal::new(2500, 2),
            }],
        };
        Repository::new(MemoryView::new(dataset).unwrap())
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = TestCli::parse_from(["t", "players-in-towns", "Eltham,Plymouth"]);
        match cli.command {
            Command::PlayersInTowns { towns } => assert_eq!(towns, vec!["Eltham", "Plymouth"]),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = TestCli::parse_from(["t", "penalties-in-date-range", "1981-06-01", "1983-09-10"]);
        assert!(matches!(cli.command, Command::PenaltiesInDateRange { .. }));

        assert!(TestCli::try_parse_from(["t", "penalties-from-amount", "lots"]).is_err());
    }

    #[tokio::test]
    async fn test_run_gender_counts() {
        let value = Command::GenderCounts.run(&repo()).await.unwrap();
        assert_eq!(value, json!({ "F": 1, "M": 1 }));
    }

    #[tokio::test]
    async fn test_run_players_without_penalties() {
        let command = Command::PlayersWithPenalties { without: true };
        let value = command.run(&repo()).await.unwrap();
        let players = value.as_array().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0]["name"], "Baker");
    }
}
