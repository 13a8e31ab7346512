use crate::domain::model::{GenderCount, MinMaxAmount, Penalty, Player, PlayerPenalties};
use crate::domain::ports::EntityView;
use crate::domain::query::{Attr, Entity, Expr, QueryPlan, TypedQuery};
use crate::utils::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Read-only query catalog over the player and penalty collections.
///
/// Holds no state besides the view handle. Result order is unspecified for
/// every operation; errors from the view are returned unchanged.
pub struct Repository<V: EntityView> {
    view: V,
}

impl<V: EntityView> Repository<V> {
    pub fn new(view: V) -> Self {
        Self { view }
    }

    /// Returns players living in a specified town (exact, case-sensitive).
    pub async fn players_living_in_town(&self, town: &str) -> Result<Vec<Player>> {
        let plan = QueryPlan::from(Entity::Player)
            .filter(Expr::attr(Attr::Town).equals(Expr::param("town")));

        let players = TypedQuery::<Player>::new(plan)
            .bind("town", town)
            .result_list(&self.view)
            .await?;

        tracing::debug!(town, count = players.len(), "players_living_in_town");
        Ok(players)
    }

    /// Returns players living in one of the specified towns. An empty list
    /// matches nobody.
    pub async fn players_living_in_towns(&self, towns: &[String]) -> Result<Vec<Player>> {
        let plan = QueryPlan::from(Entity::Player)
            .filter(Expr::attr(Attr::Town).is_in(Expr::param("towns")));

        let players = TypedQuery::<Player>::new(plan)
            .bind("towns", towns)
            .result_list(&self.view)
            .await?;

        tracing::debug!(?towns, count = players.len(), "players_living_in_towns");
        Ok(players)
    }

    /// Returns players of a gender (`female` → 'F', else 'M') born strictly
    /// before `born_before_year`.
    pub async fn players_with_gender_and_age(
        &self,
        female: bool,
        born_before_year: i32,
    ) -> Result<Vec<Player>> {
        let plan = QueryPlan::from(Entity::Player).filter(
            Expr::attr(Attr::Sex)
                .equals(Expr::param("sex"))
                .and(Expr::attr(Attr::YearOfBirth).lt(Expr::param("year"))),
        );

        let players = TypedQuery::<Player>::new(plan)
            .bind("sex", if female { 'F' } else { 'M' })
            .bind("year", born_before_year)
            .result_list(&self.view)
            .await?;

        tracing::debug!(
            female,
            born_before_year,
            count = players.len(),
            "players_with_gender_and_age"
        );
        Ok(players)
    }

    /// Returns penalties issued between two dates, both inclusive. The
    /// bounds are not reordered; `start > end` matches nothing.
    pub async fn penalties_in_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Penalty>> {
        let plan = QueryPlan::from(Entity::Penalty).filter(
            Expr::attr(Attr::PenDate).between(Expr::param("start"), Expr::param("end")),
        );

        let penalties = TypedQuery::<Penalty>::new(plan)
            .bind("start", start)
            .bind("end", end)
            .result_list(&self.view)
            .await?;

        tracing::debug!(%start, %end, count = penalties.len(), "penalties_in_date_range");
        Ok(penalties)
    }

    pub async fn penalties_with_amount_higher_equal_than(
        &self,
        amount: Decimal,
    ) -> Result<Vec<Penalty>> {
        let plan = QueryPlan::from(Entity::Penalty)
            .filter(Expr::attr(Attr::Amount).ge(Expr::param("amount")));

        let penalties = TypedQuery::<Penalty>::new(plan)
            .bind("amount", amount)
            .result_list(&self.view)
            .await?;

        tracing::debug!(%amount, count = penalties.len(), "penalties_with_amount_higher_equal_than");
        Ok(penalties)
    }

    /// Average over all penalties; `None` when there are none.
    pub async fn average_penalty_amount(&self) -> Result<Option<Decimal>> {
        let plan = QueryPlan::from(Entity::Penalty).select([Expr::attr(Attr::Amount).avg()]);
        let average = TypedQuery::<Option<Decimal>>::new(plan)
            .single_result(&self.view)
            .await?;

        tracing::debug!(?average, "average_penalty_amount");
        Ok(average)
    }

    /// Min and max come from the same aggregate row.
    pub async fn min_max_penalty_amount(&self) -> Result<MinMaxAmount> {
        let plan = QueryPlan::from(Entity::Penalty).select([
            Expr::attr(Attr::Amount).min(),
            Expr::attr(Attr::Amount).max(),
        ]);
        let min_max = TypedQuery::<MinMaxAmount>::new(plan)
            .single_result(&self.view)
            .await?;

        tracing::debug!(?min_max, "min_max_penalty_amount");
        Ok(min_max)
    }

    /// Returns all players who either have or have not received a penalty.
    pub async fn players_with_penalties(&self, has_penalty: bool) -> Result<Vec<Player>> {
        let penalty_count = Expr::entity(Entity::Penalty).count();
        let having = if has_penalty {
            penalty_count.ge(Expr::lit(1i64))
        } else {
            penalty_count.equals(Expr::lit(0i64))
        };

        let plan = QueryPlan::from(Entity::Player)
            .left_join_penalties()
            .group_by(Expr::entity(Entity::Player))
            .having(having)
            .select([Expr::entity(Entity::Player)]);

        let players = TypedQuery::<Player>::new(plan)
            .result_list(&self.view)
            .await?;

        tracing::debug!(has_penalty, count = players.len(), "players_with_penalties");
        Ok(players)
    }

    /// Returns the towns with at least `min_players` resident players.
    pub async fn towns_with_player_number(&self, min_players: i64) -> Result<Vec<String>> {
        let plan = QueryPlan::from(Entity::Player)
            .group_by(Expr::attr(Attr::Town))
            .having(
                Expr::entity(Entity::Player)
                    .count()
                    .ge(Expr::param("min")),
            )
            .select([Expr::attr(Attr::Town)]);

        let towns = TypedQuery::<String>::new(plan)
            .bind("min", min_players)
            .result_list(&self.view)
            .await?;

        tracing::debug!(min_players, ?towns, "towns_with_player_number");
        Ok(towns)
    }

    /// Number of players per gender; only genders present appear as keys.
    pub async fn player_counts_by_gender(&self) -> Result<HashMap<char, i64>> {
        let plan = QueryPlan::from(Entity::Player)
            .group_by(Expr::attr(Attr::Sex))
            .select([
                Expr::attr(Attr::Sex),
                Expr::entity(Entity::Player).count(),
            ]);

        let counts = TypedQuery::<GenderCount>::new(plan)
            .result_stream(&self.view)
            .await?
            .map(|row| row.map(|gc| (gc.gender, gc.count)))
            .collect::<Result<HashMap<_, _>>>()?;

        tracing::debug!(?counts, "player_counts_by_gender");
        Ok(counts)
    }

    /// One record per player; players without penalties get a sum of 0.
    pub async fn penalties_for_all_players(&self) -> Result<Vec<PlayerPenalties>> {
        let plan = QueryPlan::from(Entity::Player)
            .left_join_penalties()
            .group_by(Expr::entity(Entity::Player))
            .select([
                Expr::entity(Entity::Player),
                Expr::attr(Attr::Amount)
                    .coalesce(Expr::lit(Decimal::ZERO))
                    .sum(),
            ]);

        let sums = TypedQuery::<PlayerPenalties>::new(plan)
            .result_list(&self.view)
            .await?;

        tracing::debug!(count = sums.len(), "penalties_for_all_players");
        Ok(sums)
    }
}
