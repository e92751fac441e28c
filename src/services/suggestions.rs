use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::Item,
    services::{
        clock::Clock,
        sources::{AssociationIndex, EventStore, MembershipView, PopularityIndex},
    },
};

/// Total number of suggestions returned per request.
pub const SUGGESTION_BUDGET: usize = 9;

/// How far back the recency phase looks for add events, in minutes.
pub const RECENCY_WINDOW_MINUTES: i64 = 10;

/// How many recent add events seed the recency phase.
pub const RECENT_EVENT_LIMIT: usize = 3;

/// Ranks candidate items to suggest adding to a list.
///
/// Two signals feed the ranking: association rules mined from the list's
/// recent add events, and a global-popularity fallback that fills whatever
/// budget the rules leave unused. The engine is a stateless read pipeline;
/// every request re-reads its four sources and nothing is cached between
/// calls.
pub struct SuggestionEngine {
    events: Arc<dyn EventStore>,
    membership: Arc<dyn MembershipView>,
    associations: Arc<dyn AssociationIndex>,
    popularity: Arc<dyn PopularityIndex>,
    clock: Arc<dyn Clock>,
}

impl SuggestionEngine {
    pub fn new(
        events: Arc<dyn EventStore>,
        membership: Arc<dyn MembershipView>,
        associations: Arc<dyn AssociationIndex>,
        popularity: Arc<dyn PopularityIndex>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            events,
            membership,
            associations,
            popularity,
            clock,
        }
    }

    /// Ranked suggestions for a list, at most [`SUGGESTION_BUDGET`] entries.
    ///
    /// An unknown or empty list yields an empty or short result, never an
    /// error; "does this list exist" is the caller's question.
    pub async fn suggest(&self, list_id: Uuid) -> AppResult<Vec<Item>> {
        self.suggest_with_budget(list_id, SUGGESTION_BUDGET).await
    }

    pub async fn suggest_with_budget(&self, list_id: Uuid, budget: usize) -> AppResult<Vec<Item>> {
        let excluded = self.membership.excluded_items(list_id).await?;

        let from_rules = self.recency_phase(list_id, &excluded, budget).await?;
        let remaining = budget.saturating_sub(from_rules.len());
        let from_support = self.frequency_phase(&excluded, remaining).await?;

        tracing::debug!(
            list_id = %list_id,
            from_rules = from_rules.len(),
            from_support = from_support.len(),
            "Suggestions computed"
        );

        Ok(merge_phases(from_rules, from_support))
    }

    /// Candidates from rules whose antecedents are the list's recent add
    /// events, most recent event first.
    ///
    /// `remaining` shrinks as candidates are accepted, so a later event can
    /// only fill what earlier ones left. The exclusion set stays the list
    /// membership as of the request; candidates accepted here do not join
    /// it, so an item ranked under two recent events is taken twice.
    async fn recency_phase(
        &self,
        list_id: Uuid,
        excluded: &HashSet<Uuid>,
        budget: usize,
    ) -> AppResult<Vec<Item>> {
        let since = self.clock.now() - Duration::minutes(RECENCY_WINDOW_MINUTES);
        let recents = self
            .events
            .recent_added(list_id, since, RECENT_EVENT_LIMIT)
            .await?;

        let mut picked = Vec::new();
        let mut remaining = budget;

        for occurrence in recents {
            if remaining == 0 {
                break;
            }
            let candidates = self
                .associations
                .ranked_consequents(occurrence.id, excluded, remaining)
                .await?;
            remaining = remaining.saturating_sub(candidates.len());
            picked.extend(candidates);
        }

        Ok(picked)
    }

    /// Fills the leftover budget with the globally most popular items not
    /// already on the list.
    async fn frequency_phase(
        &self,
        excluded: &HashSet<Uuid>,
        remaining: usize,
    ) -> AppResult<Vec<Item>> {
        if remaining == 0 {
            return Ok(Vec::new());
        }
        self.popularity.top_by_support(excluded, remaining).await
    }
}

/// Concatenates the recency-phase picks with the popularity fallback.
///
/// No cross-phase deduplication happens: an item surfaced by the rules can
/// reappear in the fallback. That matches the behavior of the system this
/// one replaces; if product ever wants distinct suggestions, this is the
/// single place to change.
fn merge_phases(mut from_rules: Vec<Item>, from_support: Vec<Item>) -> Vec<Item> {
    from_rules.extend(from_support);
    from_rules
}
