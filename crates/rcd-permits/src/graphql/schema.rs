use std::sync::Arc;

use async_graphql::{EmptySubscription, Schema};

use super::context::PortalContext;
use super::mutation::MutationRoot;
use super::query::QueryRoot;
use crate::storage::SqliteStore;
use crate::workflows::applications::{FeeSchedule, NotificationPublisher};

pub type PortalSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(
    store: Arc<SqliteStore>,
    notifications: Arc<dyn NotificationPublisher>,
    fees: FeeSchedule,
) -> PortalSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(PortalContext::new(store, notifications, fees))
        .finish()
}
