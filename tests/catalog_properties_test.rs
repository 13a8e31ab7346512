use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tennis_club::{
    load_dataset, Dataset, DatasetFormat, MemoryView, Player, Repository,
};

fn seed() -> Dataset {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/tennis_club.toml");
    load_dataset(path, DatasetFormat::Toml).unwrap()
}

fn repo(dataset: Dataset) -> Repository<MemoryView> {
    Repository::new(MemoryView::new(dataset).unwrap())
}

fn player_set(players: &[Player]) -> HashSet<i64> {
    players.iter().map(|p| p.player_no).collect()
}

#[tokio::test]
async fn test_repeated_calls_return_equal_results() {
    let repo = repo(seed());
    let towns = vec!["Stratford".to_string(), "Eltham".to_string()];

    let first = player_set(&repo.players_living_in_towns(&towns).await.unwrap());
    let second = player_set(&repo.players_living_in_towns(&towns).await.unwrap());
    assert_eq!(first, second);

    assert_eq!(
        repo.player_counts_by_gender().await.unwrap(),
        repo.player_counts_by_gender().await.unwrap()
    );
}

#[tokio::test]
async fn test_players_with_and_without_penalties_partition_all_players() {
    let dataset = seed();
    let all: HashSet<i64> = dataset.players.iter().map(|p| p.player_no).collect();
    let repo = repo(dataset);

    let with = repo.players_with_penalties(true).await.unwrap();
    let without = repo.players_with_penalties(false).await.unwrap();

    let with_set = player_set(&with);
    let without_set = player_set(&without);
    assert_eq!(with.len(), with_set.len());
    assert_eq!(without.len(), without_set.len());
    assert!(with_set.is_disjoint(&without_set));
    assert_eq!(&with_set | &without_set, all);
}

#[tokio::test]
async fn test_penalty_sums_cover_every_player_and_conserve_total() {
    let dataset = seed();
    let total: Decimal = dataset.penalties.iter().map(|p| p.amount).sum();
    let player_count = dataset.players.len();
    let repo = repo(dataset);

    let sums = repo.penalties_for_all_players().await.unwrap();
    assert_eq!(sums.len(), player_count);

    let keys: HashSet<i64> = sums.iter().map(|pp| pp.player.player_no).collect();
    assert_eq!(keys.len(), player_count);

    let summed: Decimal = sums.iter().map(|pp| pp.penalty_sum).sum();
    assert_eq!(summed, total);
}

#[tokio::test]
async fn test_town_counts_are_coherent() {
    let dataset = seed();
    let towns: HashSet<String> = dataset.players.iter().map(|p| p.town.clone()).collect();
    let repo = repo(dataset);

    for k in 1..=8 {
        let returned: HashSet<String> = repo
            .towns_with_player_number(k)
            .await
            .unwrap()
            .into_iter()
            .collect();
        for town in &towns {
            let residents = repo.players_living_in_town(town).await.unwrap().len() as i64;
            assert_eq!(returned.contains(town), residents >= k, "town {} k {}", town, k);
        }
    }
}

#[tokio::test]
async fn test_gender_counts_sum_to_player_count() {
    let dataset = seed();
    let player_count = dataset.players.len() as i64;
    let repo = repo(dataset);

    let counts = repo.player_counts_by_gender().await.unwrap();
    assert_eq!(counts.values().sum::<i64>(), player_count);
}

#[tokio::test]
async fn test_every_amount_lies_within_min_max() {
    let dataset = seed();
    let amounts: Vec<Decimal> = dataset.penalties.iter().map(|p| p.amount).collect();
    let repo = repo(dataset);

    let min_max = repo.min_max_penalty_amount().await.unwrap();
    let (min, max) = (min_max.min_amount.unwrap(), min_max.max_amount.unwrap());
    for amount in amounts {
        assert!(min <= amount && amount <= max);
    }
}

#[tokio::test]
async fn test_filters_only_return_matching_entities() {
    let repo = repo(seed());

    for player in repo.players_with_gender_and_age(true, 1965).await.unwrap() {
        assert_eq!(player.sex, 'F');
        assert!(player.year_of_birth < 1965);
    }

    let threshold = Decimal::new(7500, 2);
    for penalty in repo
        .penalties_with_amount_higher_equal_than(threshold)
        .await
        .unwrap()
    {
        assert!(penalty.amount >= threshold);
    }
}

#[tokio::test]
async fn test_empty_dataset_aggregates_are_absent() {
    let repo = repo(Dataset::default());

    assert_eq!(repo.average_penalty_amount().await.unwrap(), None);

    let min_max = repo.min_max_penalty_amount().await.unwrap();
    assert_eq!(min_max.min_amount, None);
    assert_eq!(min_max.max_amount, None);

    assert!(repo.player_counts_by_gender().await.unwrap().is_empty());
    assert!(repo.penalties_for_all_players().await.unwrap().is_empty());
    assert!(repo.towns_with_player_number(0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_players_without_penalties_have_zero_sum() {
    let mut dataset = seed();
    dataset.penalties.clear();
    let repo = repo(dataset);

    let sums = repo.penalties_for_all_players().await.unwrap();
    assert_eq!(sums.len(), 14);
    assert!(sums.iter().all(|pp| pp.penalty_sum == Decimal::ZERO));
    assert_eq!(repo.players_with_penalties(true).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_shared_view_serves_concurrent_callers() {
    let repo = Arc::new(Repository::new(Arc::new(MemoryView::new(seed()).unwrap())));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.penalties_for_all_players().await.map(|s| s.len()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 14);
    }
}
