use crate::domain::query::{Params, QueryPlan, Row};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to the player and penalty collections.
///
/// Implementations execute a [`QueryPlan`] with its bound [`Params`] and
/// return the projected rows. Failures are reported as-is; callers neither
/// retry nor synthesize partial results. Dropping the returned future
/// abandons the in-flight query.
#[async_trait]
pub trait EntityView: Send + Sync {
    async fn execute(&self, plan: &QueryPlan, params: &Params) -> Result<Vec<Row>>;
}

#[async_trait]
impl<V: EntityView + ?Sized> EntityView for Arc<V> {
    async fn execute(&self, plan: &QueryPlan, params: &Params) -> Result<Vec<Row>> {
        (**self).execute(plan, params).await
    }
}
