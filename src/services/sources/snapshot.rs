use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{AssociationRule, Item},
    services::sources::{AssociationIndex, PopularityIndex},
};

/// An immutable view of the offline-mined statistics.
///
/// Consequent lists are pre-sorted by lift descending (ties by item id
/// ascending) and the catalog by support descending (ties by name
/// ascending), so serving a lookup is a filter and truncate.
pub struct MiningSnapshot {
    consequents: HashMap<Uuid, Vec<Item>>,
    by_support: Vec<Item>,
}

impl MiningSnapshot {
    pub fn empty() -> Self {
        Self {
            consequents: HashMap::new(),
            by_support: Vec::new(),
        }
    }

    /// Builds a snapshot from raw rules and the item catalog. Rules whose
    /// consequent is missing from the catalog are dropped.
    pub fn build(rules: Vec<AssociationRule>, mut catalog: Vec<Item>) -> Self {
        let by_id: HashMap<Uuid, Item> =
            catalog.iter().map(|item| (item.id, item.clone())).collect();

        let mut grouped: HashMap<Uuid, Vec<(f64, Item)>> = HashMap::new();
        for rule in rules {
            let Some(consequent) = by_id.get(&rule.consequent_id) else {
                tracing::warn!(
                    antecedent_id = %rule.antecedent_id,
                    consequent_id = %rule.consequent_id,
                    "Dropping rule with unknown consequent item"
                );
                continue;
            };
            grouped
                .entry(rule.antecedent_id)
                .or_default()
                .push((rule.lift, consequent.clone()));
        }

        let consequents = grouped
            .into_iter()
            .map(|(antecedent_id, mut ranked)| {
                ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
                let items = ranked.into_iter().map(|(_, item)| item).collect();
                (antecedent_id, items)
            })
            .collect();

        catalog.sort_by(|a, b| b.support.total_cmp(&a.support).then_with(|| a.name.cmp(&b.name)));

        Self {
            consequents,
            by_support: catalog,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.consequents.values().map(Vec::len).sum()
    }

    pub fn item_count(&self) -> usize {
        self.by_support.len()
    }
}

/// Holder for the current [`MiningSnapshot`].
///
/// A refresh builds a complete new snapshot and replaces the shared `Arc`
/// wholesale; in-flight reads keep the snapshot they already cloned. The
/// snapshot may lag the live tables arbitrarily between refreshes.
pub struct MiningIndex {
    snapshot: RwLock<Arc<MiningSnapshot>>,
}

impl MiningIndex {
    pub fn new() -> Self {
        Self::with_snapshot(MiningSnapshot::empty())
    }

    pub fn with_snapshot(snapshot: MiningSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    async fn current(&self) -> Arc<MiningSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// Reloads the mined rules and the item catalog from the database and
    /// swaps in the resulting snapshot.
    pub async fn refresh(&self, pool: &PgPool) -> AppResult<()> {
        let rules = sqlx::query_as::<_, AssociationRule>(
            "SELECT antecedent_id, consequent_id, lift FROM associations",
        )
        .fetch_all(pool)
        .await?;

        let catalog = sqlx::query_as::<_, Item>("SELECT id, name, support FROM items")
            .fetch_all(pool)
            .await?;

        let snapshot = MiningSnapshot::build(rules, catalog);

        tracing::info!(
            rules = snapshot.rule_count(),
            items = snapshot.item_count(),
            "Mining snapshot refreshed"
        );

        *self.snapshot.write().await = Arc::new(snapshot);

        Ok(())
    }
}

impl Default for MiningIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns a background task that periodically reloads the snapshot.
///
/// A failed refresh keeps the previous snapshot and is retried on the next
/// tick.
pub fn spawn_refresher(index: Arc<MiningIndex>, pool: PgPool, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately; the startup refresh already
        // happened, so skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(error) = index.refresh(&pool).await {
                tracing::error!(%error, "Mining snapshot refresh failed");
            }
        }
    });
}

#[async_trait::async_trait]
impl AssociationIndex for MiningIndex {
    async fn ranked_consequents(
        &self,
        occurrence_id: Uuid,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Item>> {
        let snapshot = self.current().await;

        let items = match snapshot.consequents.get(&occurrence_id) {
            Some(ranked) => ranked
                .iter()
                .filter(|item| !excluded.contains(&item.id))
                .take(limit)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(items)
    }
}

#[async_trait::async_trait]
impl PopularityIndex for MiningIndex {
    async fn top_by_support(
        &self,
        excluded: &HashSet<Uuid>,
        limit: usize,
    ) -> AppResult<Vec<Item>> {
        let snapshot = self.current().await;

        Ok(snapshot
            .by_support
            .iter()
            .filter(|item| !excluded.contains(&item.id))
            .take(limit)
            .cloned()
            .collect())
    }
}
