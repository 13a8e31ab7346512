use crate::domain::model::{Dataset, Penalty, Player};
use crate::domain::ports::EntityView;
use crate::domain::query::{AggregateFn, Entity, Expr, Params, QueryPlan, Row, Value};
use crate::utils::error::{ClubError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;

/// In-memory entity view over a validated [`Dataset`].
#[derive(Debug, Clone)]
pub struct MemoryView {
    players: Vec<Player>,
    penalties: Vec<Penalty>,
    // player_no -> indexes into `penalties`
    penalties_by_player: HashMap<i64, Vec<usize>>,
}

/// One joined row. The outer `Option` says whether the entity is in scope
/// for the plan, the inner one whether the outer join produced a null side.
#[derive(Debug, Clone, Copy)]
struct Tuple<'a> {
    player: Option<Option<&'a Player>>,
    penalty: Option<Option<&'a Penalty>>,
}

impl MemoryView {
    pub fn new(dataset: Dataset) -> Result<Self> {
        dataset.validate()?;

        let mut penalties_by_player: HashMap<i64, Vec<usize>> = HashMap::new();
        for (index, penalty) in dataset.penalties.iter().enumerate() {
            penalties_by_player
                .entry(penalty.player_no)
                .or_default()
                .push(index);
        }

        tracing::debug!(
            players = dataset.players.len(),
            penalties = dataset.penalties.len(),
            "Memory view ready"
        );

        Ok(Self {
            players: dataset.players,
            penalties: dataset.penalties,
            penalties_by_player,
        })
    }

    /// The `Player → penalties` relation: every penalty owned by
    /// `player_no`, empty for unknown players.
    pub fn penalties_of(&self, player_no: i64) -> Vec<&Penalty> {
        self.penalties_by_player
            .get(&player_no)
            .map(|indexes| indexes.iter().map(|&i| &self.penalties[i]).collect())
            .unwrap_or_default()
    }

    fn scan(&self, plan: &QueryPlan) -> Result<Vec<Tuple<'_>>> {
        match (plan.root, plan.join_penalties) {
            (Entity::Player, false) => Ok(self
                .players
                .iter()
                .map(|p| Tuple {
                    player: Some(Some(p)),
                    penalty: None,
                })
                .collect()),
            (Entity::Player, true) => {
                let mut tuples = Vec::with_capacity(self.players.len().max(self.penalties.len()));
                for player in &self.players {
                    match self.penalties_by_player.get(&player.player_no) {
                        Some(indexes) if !indexes.is_empty() => {
                            tuples.extend(indexes.iter().map(|&i| Tuple {
                                player: Some(Some(player)),
                                penalty: Some(Some(&self.penalties[i])),
                            }));
                        }
                        _ => tuples.push(Tuple {
                            player: Some(Some(player)),
                            penalty: Some(None),
                        }),
                    }
                }
                Ok(tuples)
            }
            (Entity::Penalty, false) => Ok(self
                .penalties
                .iter()
                .map(|p| Tuple {
                    player: None,
                    penalty: Some(Some(p)),
                })
                .collect()),
            (Entity::Penalty, true) => Err(ClubError::QueryError {
                message: "left join of penalties is only defined from players".to_string(),
            }),
        }
    }
}

fn out_of_scope(entity: Entity) -> ClubError {
    ClubError::QueryError {
        message: format!("{:?} is not part of this query", entity),
    }
}

fn eval(expr: &Expr, tuple: &Tuple<'_>, params: &Params) -> Result<Value> {
    match expr {
        Expr::Attr(attr) => match attr.entity() {
            Entity::Player => match tuple.player {
                Some(Some(p)) => Ok(attr.of_player(p)),
                Some(None) => Ok(Value::Null),
                None => Err(out_of_scope(Entity::Player)),
            },
            Entity::Penalty => match tuple.penalty {
                Some(Some(p)) => Ok(attr.of_penalty(p)),
                Some(None) => Ok(Value::Null),
                None => Err(out_of_scope(Entity::Penalty)),
            },
        },
        Expr::Entity(Entity::Player) => match tuple.player {
            Some(Some(p)) => Ok(Value::Player(p.clone())),
            Some(None) => Ok(Value::Null),
            None => Err(out_of_scope(Entity::Player)),
        },
        Expr::Entity(Entity::Penalty) => match tuple.penalty {
            Some(Some(p)) => Ok(Value::Penalty(p.clone())),
            Some(None) => Ok(Value::Null),
            None => Err(out_of_scope(Entity::Penalty)),
        },
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Param(name) => params.get(name).cloned(),
        Expr::Coalesce(value, fallback) => match eval(value, tuple, params)? {
            Value::Null => eval(fallback, tuple, params),
            other => Ok(other),
        },
        Expr::Aggregate(..) => Err(ClubError::QueryError {
            message: "aggregate used outside of a grouped query".to_string(),
        }),
    }
}

/// Evaluates `expr` once for a whole group. Non-aggregate operands take
/// their value from the first row, which holds for group keys.
fn eval_group(expr: &Expr, group: &[Tuple<'_>], params: &Params) -> Result<Value> {
    match expr {
        Expr::Aggregate(function, inner) => {
            let values = group
                .iter()
                .map(|tuple| eval(inner, tuple, params))
                .collect::<Result<Vec<_>>>()?;
            accumulate(*function, values)
        }
        Expr::Coalesce(value, fallback) => match eval_group(value, group, params)? {
            Value::Null => eval_group(fallback, group, params),
            other => Ok(other),
        },
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Param(name) => params.get(name).cloned(),
        Expr::Attr(_) | Expr::Entity(_) => match group.first() {
            Some(tuple) => eval(expr, tuple, params),
            None => Ok(Value::Null),
        },
    }
}

fn overflow() -> ClubError {
    ClubError::QueryError {
        message: "numeric overflow in aggregate".to_string(),
    }
}

fn add(acc: Value, value: &Value) -> Result<Value> {
    match (&acc, value) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(*b).map(Value::Int).ok_or_else(overflow),
        _ => match (acc.as_decimal(), value.as_decimal()) {
            (Some(a), Some(b)) => a
                .checked_add(b)
                .map(Value::Decimal)
                .ok_or_else(overflow),
            _ => Err(ClubError::type_mismatch("number", value)),
        },
    }
}

/// Folds one aggregate over the group's values. Nulls are skipped; over
/// no values every function except `count` yields null.
fn accumulate(function: AggregateFn, values: Vec<Value>) -> Result<Value> {
    let values: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();

    if function == AggregateFn::Count {
        return Ok(Value::Int(values.len() as i64));
    }

    let mut iter = values.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Value::Null);
    };

    match function {
        AggregateFn::Sum | AggregateFn::Avg => {
            let mut count: i64 = 1;
            let mut total = add(Value::Int(0), &first)?;
            for value in iter {
                total = add(total, &value)?;
                count += 1;
            }
            if function == AggregateFn::Sum {
                return Ok(total);
            }
            let total = total
                .as_decimal()
                .ok_or_else(|| ClubError::type_mismatch("number", &total))?;
            total
                .checked_div(Decimal::from(count))
                .map(Value::Decimal)
                .ok_or_else(overflow)
        }
        AggregateFn::Min | AggregateFn::Max => {
            let wanted = if function == AggregateFn::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = first;
            for value in iter {
                match value.compare(&best) {
                    Some(ordering) if ordering == wanted => best = value,
                    Some(_) => {}
                    None => return Err(ClubError::type_mismatch(best.type_name(), value)),
                }
            }
            Ok(best)
        }
        AggregateFn::Count => unreachable!("count handled above"),
    }
}

#[async_trait]
impl EntityView for MemoryView {
    async fn execute(&self, plan: &QueryPlan, params: &Params) -> Result<Vec<Row>> {
        let mut tuples = Vec::new();
        for tuple in self.scan(plan)? {
            if let Some(filter) = &plan.filter {
                if !filter.test(&|e: &Expr| eval(e, &tuple, params))? {
                    continue;
                }
            }
            tuples.push(tuple);
        }

        if !plan.is_aggregate() {
            let rows = tuples
                .iter()
                .map(|tuple| {
                    plan.select
                        .iter()
                        .map(|e| eval(e, tuple, params))
                        .collect::<Result<Row>>()
                })
                .collect::<Result<Vec<_>>>()?;
            tracing::trace!(root = ?plan.root, rows = rows.len(), "Executed plan");
            return Ok(rows);
        }

        // Without GROUP BY the whole input is one group, even when empty.
        let mut groups: Vec<Vec<Tuple<'_>>> = Vec::new();
        if plan.group_by.is_empty() {
            groups.push(tuples);
        } else {
            let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
            for tuple in tuples {
                let key = plan
                    .group_by
                    .iter()
                    .map(|e| eval(e, &tuple, params))
                    .collect::<Result<Vec<_>>>()?;
                let slot = *index.entry(key).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(tuple);
            }
        }

        let mut rows = Vec::with_capacity(groups.len());
        for group in &groups {
            if let Some(having) = &plan.having {
                if !having.test(&|e: &Expr| eval_group(e, group, params))? {
                    continue;
                }
            }
            rows.push(
                plan.select
                    .iter()
                    .map(|e| eval_group(e, group, params))
                    .collect::<Result<Row>>()?,
            );
        }

        tracing::trace!(
            root = ?plan.root,
            groups = groups.len(),
            rows = rows.len(),
            "Executed aggregate plan"
        );
        Ok(rows)
    }
}
