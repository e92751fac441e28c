//! Read contracts consumed by the suggestion engine.
//!
//! The engine is a pure read pipeline over four data sources: the
//! occurrence log, the list membership, and the two offline-mined indices.
//! Each source is a trait so the engine can be exercised against canned
//! sequences in tests; production wires the Postgres and snapshot
//! implementations below.
//!
//! All four contracts tolerate unknown identifiers by returning empty
//! results rather than erroring, so an unknown list simply yields zero
//! suggestions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Item, Occurrence},
};

pub mod postgres;
pub mod snapshot;

/// Read access to the append-only occurrence log.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// ADDED occurrences for the list created strictly after `since`,
    /// newest first, truncated to `limit`.
    async fn recent_added(
        &self,
        list_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Occurrence>>;
}

/// The set of items currently on a list, used as the exclusion set.
///
/// Fetched once per suggestion request and treated as fixed for its
/// duration; concurrent list edits are picked up by the next request.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MembershipView: Send + Sync {
    async fn excluded_items(&self, list_id: Uuid) -> AppResult<HashSet<Uuid>>;
}

/// Mined association rules, keyed by their antecedent occurrence.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AssociationIndex: Send + Sync {
    /// Consequent items of rules whose antecedent is `occurrence_id`,
    /// minus `excluded`, ordered by lift descending with ties broken by
    /// item id ascending, truncated to `limit`.
    async fn ranked_consequents(
        &self,
        occurrence_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Item>>;
}

/// Global popularity ranking over the item catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PopularityIndex: Send + Sync {
    /// Items not in `excluded`, ordered by support descending with ties
    /// broken by name ascending, truncated to `limit`.
    async fn top_by_support(&self, excluded: &HashSet<Uuid>, limit: usize)
        -> AppResult<Vec<Item>>;
}
