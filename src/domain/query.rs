//! Typed query builder consumed by [`EntityView`] implementations.
//!
//! A [`QueryPlan`] describes one relational operation over the player and
//! penalty collections: scan, optional left join `Player → penalties`,
//! filter, group-by, having and projection. [`TypedQuery`] pairs a plan with
//! its bound parameters and the result shape rows are converted into.

use crate::domain::model::{GenderCount, MinMaxAmount, Penalty, Player, PlayerPenalties};
use crate::domain::ports::EntityView;
use crate::utils::error::{ClubError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
    Char(char),
    Date(NaiveDate),
    Decimal(Decimal),
    List(Vec<Value>),
    Player(Player),
    Penalty(Penalty),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Text(_) => "text",
            Value::Char(_) => "character",
            Value::Date(_) => "date",
            Value::Decimal(_) => "decimal",
            Value::List(_) => "list",
            Value::Player(_) => "player",
            Value::Penalty(_) => "penalty",
        }
    }

    /// Compares two values the way the query language does: `None` when
    /// either side is null or the types are not comparable. Integers and
    /// decimals compare by numeric value, entities by identity.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (Value::Decimal(a), Value::Int(b)) => Some(a.cmp(&Decimal::from(*b))),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Player(a), Value::Player(b)) => Some(a.player_no.cmp(&b.player_no)),
            (Value::Penalty(a), Value::Penalty(b)) => Some(a.payment_no.cmp(&b.payment_no)),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&[String]> for Value {
    fn from(v: &[String]) -> Self {
        Value::List(v.iter().cloned().map(Value::Text).collect())
    }
}

pub type Row = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Player,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    PlayerNo,
    Name,
    Town,
    Sex,
    YearOfBirth,
    PaymentNo,
    PenDate,
    Amount,
}

impl Attr {
    pub fn entity(self) -> Entity {
        match self {
            Attr::PlayerNo | Attr::Name | Attr::Town | Attr::Sex | Attr::YearOfBirth => {
                Entity::Player
            }
            Attr::PaymentNo | Attr::PenDate | Attr::Amount => Entity::Penalty,
        }
    }

    pub fn of_player(self, player: &Player) -> Value {
        match self {
            Attr::PlayerNo => Value::Int(player.player_no),
            Attr::Name => Value::Text(player.name.clone()),
            Attr::Town => Value::Text(player.town.clone()),
            Attr::Sex => Value::Char(player.sex),
            Attr::YearOfBirth => Value::Int(i64::from(player.year_of_birth)),
            _ => Value::Null,
        }
    }

    pub fn of_penalty(self, penalty: &Penalty) -> Value {
        match self {
            Attr::PaymentNo => Value::Int(penalty.payment_no),
            Attr::PenDate => Value::Date(penalty.pen_date),
            Attr::Amount => Value::Decimal(penalty.amount),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Attr(Attr),
    Entity(Entity),
    Literal(Value),
    Param(String),
    Coalesce(Box<Expr>, Box<Expr>),
    Aggregate(AggregateFn, Box<Expr>),
}

impl Expr {
    pub fn attr(attr: Attr) -> Self {
        Expr::Attr(attr)
    }

    pub fn entity(entity: Entity) -> Self {
        Expr::Entity(entity)
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn param(name: &str) -> Self {
        Expr::Param(name.to_string())
    }

    pub fn coalesce(self, fallback: Expr) -> Self {
        Expr::Coalesce(Box::new(self), Box::new(fallback))
    }

    pub fn count(self) -> Self {
        Expr::Aggregate(AggregateFn::Count, Box::new(self))
    }

    pub fn sum(self) -> Self {
        Expr::Aggregate(AggregateFn::Sum, Box::new(self))
    }

    pub fn avg(self) -> Self {
        Expr::Aggregate(AggregateFn::Avg, Box::new(self))
    }

    pub fn min(self) -> Self {
        Expr::Aggregate(AggregateFn::Min, Box::new(self))
    }

    pub fn max(self) -> Self {
        Expr::Aggregate(AggregateFn::Max, Box::new(self))
    }

    pub fn equals(self, rhs: Expr) -> Predicate {
        Predicate::Eq(self, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Predicate {
        Predicate::Lt(self, rhs)
    }

    pub fn ge(self, rhs: Expr) -> Predicate {
        Predicate::Ge(self, rhs)
    }

    /// Inclusive on both ends.
    pub fn between(self, low: Expr, high: Expr) -> Predicate {
        Predicate::Between(self, low, high)
    }

    pub fn is_in(self, list: Expr) -> Predicate {
        Predicate::In(self, list)
    }

    pub fn is_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate(..) => true,
            Expr::Coalesce(a, b) => a.is_aggregate() || b.is_aggregate(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Expr, Expr),
    Lt(Expr, Expr),
    Ge(Expr, Expr),
    Between(Expr, Expr, Expr),
    In(Expr, Expr),
    And(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    /// Evaluates the predicate with `eval` resolving each operand. Any
    /// comparison involving null is unknown and therefore false.
    pub fn test<F>(&self, eval: &F) -> Result<bool>
    where
        F: Fn(&Expr) -> Result<Value>,
    {
        let ordering = |a: &Expr, b: &Expr| -> Result<Option<Ordering>> {
            Ok(eval(a)?.compare(&eval(b)?))
        };

        match self {
            Predicate::Eq(a, b) => Ok(ordering(a, b)? == Some(Ordering::Equal)),
            Predicate::Lt(a, b) => Ok(ordering(a, b)? == Some(Ordering::Less)),
            Predicate::Ge(a, b) => Ok(matches!(
                ordering(a, b)?,
                Some(Ordering::Greater | Ordering::Equal)
            )),
            Predicate::Between(x, low, high) => {
                let value = eval(x)?;
                let above = matches!(
                    value.compare(&eval(low)?),
                    Some(Ordering::Greater | Ordering::Equal)
                );
                let below = matches!(
                    value.compare(&eval(high)?),
                    Some(Ordering::Less | Ordering::Equal)
                );
                Ok(above && below)
            }
            Predicate::In(x, list) => {
                let value = eval(x)?;
                match eval(list)? {
                    Value::List(items) => Ok(items
                        .iter()
                        .any(|item| value.compare(item) == Some(Ordering::Equal))),
                    other => Err(ClubError::type_mismatch("list", other)),
                }
            }
            Predicate::And(a, b) => Ok(a.test(eval)? && b.test(eval)?),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub root: Entity,
    pub join_penalties: bool,
    pub filter: Option<Predicate>,
    pub group_by: Vec<Expr>,
    pub having: Option<Predicate>,
    pub select: Vec<Expr>,
}

impl QueryPlan {
    pub fn from(root: Entity) -> Self {
        Self {
            root,
            join_penalties: false,
            filter: None,
            group_by: Vec::new(),
            having: None,
            select: vec![Expr::Entity(root)],
        }
    }

    /// `left join player.penalties`; players without penalties yield one
    /// row whose penalty side is null.
    pub fn left_join_penalties(mut self) -> Self {
        self.join_penalties = true;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having = Some(predicate);
        self
    }

    pub fn select<I: IntoIterator<Item = Expr>>(mut self, exprs: I) -> Self {
        self.select = exprs.into_iter().collect();
        self
    }

    pub fn is_aggregate(&self) -> bool {
        !self.group_by.is_empty()
            || self.having.is_some()
            || self.select.iter().any(Expr::is_aggregate)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(HashMap<String, Value>);

impl Params {
    pub fn set(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.0.get(name).ok_or_else(|| ClubError::UnboundParameter {
            name: name.to_string(),
        })
    }
}

/// Converts one result row into a caller-defined shape.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

fn single_column(row: Row) -> Result<Value> {
    let mut columns = row.into_iter();
    match (columns.next(), columns.next()) {
        (Some(value), None) => Ok(value),
        (first, _) => Err(ClubError::type_mismatch("one column", first)),
    }
}

fn two_columns(row: Row) -> Result<(Value, Value)> {
    let mut columns = row.into_iter();
    match (columns.next(), columns.next(), columns.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        (first, second, _) => Err(ClubError::type_mismatch("two columns", (first, second))),
    }
}

fn optional_decimal(value: Value) -> Result<Option<Decimal>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_decimal()
            .map(Some)
            .ok_or_else(|| ClubError::type_mismatch("decimal", other)),
    }
}

impl FromRow for Player {
    fn from_row(row: Row) -> Result<Self> {
        match single_column(row)? {
            Value::Player(player) => Ok(player),
            other => Err(ClubError::type_mismatch("player", other)),
        }
    }
}

impl FromRow for Penalty {
    fn from_row(row: Row) -> Result<Self> {
        match single_column(row)? {
            Value::Penalty(penalty) => Ok(penalty),
            other => Err(ClubError::type_mismatch("penalty", other)),
        }
    }
}

impl FromRow for String {
    fn from_row(row: Row) -> Result<Self> {
        match single_column(row)? {
            Value::Text(text) => Ok(text),
            other => Err(ClubError::type_mismatch("text", other)),
        }
    }
}

impl FromRow for Option<Decimal> {
    fn from_row(row: Row) -> Result<Self> {
        optional_decimal(single_column(row)?)
    }
}

impl FromRow for MinMaxAmount {
    fn from_row(row: Row) -> Result<Self> {
        let (min, max) = two_columns(row)?;
        Ok(MinMaxAmount {
            min_amount: optional_decimal(min)?,
            max_amount: optional_decimal(max)?,
        })
    }
}

impl FromRow for GenderCount {
    fn from_row(row: Row) -> Result<Self> {
        match two_columns(row)? {
            (Value::Char(gender), Value::Int(count)) => Ok(GenderCount { gender, count }),
            other => Err(ClubError::type_mismatch("(character, integer)", other)),
        }
    }
}

impl FromRow for PlayerPenalties {
    fn from_row(row: Row) -> Result<Self> {
        match two_columns(row)? {
            (Value::Player(player), sum) => {
                let penalty_sum = optional_decimal(sum)?
                    .ok_or_else(|| ClubError::type_mismatch("decimal", Value::Null))?;
                Ok(PlayerPenalties {
                    player,
                    penalty_sum,
                })
            }
            other => Err(ClubError::type_mismatch("(player, decimal)", other)),
        }
    }
}

/// A plan plus its parameter bindings, typed by the result shape.
pub struct TypedQuery<T> {
    plan: QueryPlan,
    params: Params,
    _shape: PhantomData<fn() -> T>,
}

impl<T: FromRow> TypedQuery<T> {
    pub fn new(plan: QueryPlan) -> Self {
        Self {
            plan,
            params: Params::default(),
            _shape: PhantomData,
        }
    }

    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.set(name, value.into());
        self
    }

    pub async fn result_list<V: EntityView + ?Sized>(&self, view: &V) -> Result<Vec<T>> {
        view.execute(&self.plan, &self.params)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    /// Exactly one row, otherwise `NoResult` / `NonUniqueResult`.
    pub async fn single_result<V: EntityView + ?Sized>(&self, view: &V) -> Result<T> {
        let mut rows = view.execute(&self.plan, &self.params).await?;
        match rows.len() {
            0 => Err(ClubError::NoResult),
            1 => T::from_row(rows.remove(0)),
            count => Err(ClubError::NonUniqueResult { count }),
        }
    }

    pub async fn result_stream<V: EntityView + ?Sized>(
        &self,
        view: &V,
    ) -> Result<impl Iterator<Item = Result<T>>> {
        let rows = view.execute(&self.plan, &self.params).await?;
        Ok(rows.into_iter().map(T::from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn eval_literal(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            other => Err(ClubError::type_mismatch("literal", other)),
        }
    }

    #[test]
    fn test_decimal_compare_is_scale_independent() {
        let a = Value::Decimal(Decimal::from_str("25.00").unwrap());
        let b = Value::Decimal(Decimal::from(25));
        assert_eq!(a.compare(&b), Some(Ordering::Equal));
        assert_eq!(a.compare(&Value::Int(25)), Some(Ordering::Equal));
        assert_eq!(a, b);
    }

    #[test]
    fn test_null_comparisons_are_unknown() {
        let p = Expr::lit(Value::Null).equals(Expr::lit(Value::Null));
        assert!(!p.test(&eval_literal).unwrap());

        let p = Expr::lit(Value::Null).ge(Expr::lit(0i64));
        assert!(!p.test(&eval_literal).unwrap());
    }

    #[test]
    fn test_between_is_inclusive() {
        let d = |s: &str| Expr::lit(NaiveDate::from_str(s).unwrap());
        let p = d("1983-09-10").between(d("1981-06-01"), d("1983-09-10"));
        assert!(p.test(&eval_literal).unwrap());

        let inverted = d("1982-01-01").between(d("1983-09-10"), d("1981-06-01"));
        assert!(!inverted.test(&eval_literal).unwrap());
    }

    #[test]
    fn test_in_with_empty_list_matches_nothing() {
        let empty: &[String] = &[];
        let p = Expr::lit("Eltham").is_in(Expr::lit(empty));
        assert!(!p.test(&eval_literal).unwrap());

        let towns = vec!["Eltham".to_string(), "Eltham".to_string()];
        let p = Expr::lit("Eltham").is_in(Expr::lit(towns.as_slice()));
        assert!(p.test(&eval_literal).unwrap());
    }

    #[test]
    fn test_in_requires_list_operand() {
        let p = Expr::lit("Eltham").is_in(Expr::lit("Eltham"));
        assert!(matches!(
            p.test(&eval_literal),
            Err(ClubError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_plan_aggregate_detection() {
        let plain = QueryPlan::from(Entity::Player);
        assert!(!plain.is_aggregate());

        let avg = QueryPlan::from(Entity::Penalty).select([Expr::attr(Attr::Amount).avg()]);
        assert!(avg.is_aggregate());

        let grouped = QueryPlan::from(Entity::Player)
            .group_by(Expr::attr(Attr::Town))
            .select([Expr::attr(Attr::Town)]);
        assert!(grouped.is_aggregate());
    }

    #[test]
    fn test_params_report_unbound_names() {
        let params = Params::default();
        match params.get("town") {
            Err(ClubError::UnboundParameter { name }) => assert_eq!(name, "town"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_row_conversion() {
        let row = vec![Value::Null, Value::Decimal(Decimal::from(100))];
        let min_max = MinMaxAmount::from_row(row).unwrap();
        assert_eq!(min_max.min_amount, None);
        assert_eq!(min_max.max_amount, Some(Decimal::from(100)));

        let row = vec![Value::Char('F'), Value::Int(5)];
        let count = GenderCount::from_row(row).unwrap();
        assert_eq!(count.gender, 'F');
        assert_eq!(count.count, 5);

        assert!(String::from_row(vec![Value::Int(1)]).is_err());
        assert!(String::from_row(vec![]).is_err());
    }
}
