//! End-to-end test of the suggestion pipeline against in-memory sources:
//! the real snapshot index plus canned occurrence and membership data.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use pantry_api::error::AppResult;
use pantry_api::models::{AssociationRule, Item, Occurrence, OccurrenceStatus};
use pantry_api::services::clock::Clock;
use pantry_api::services::sources::snapshot::{MiningIndex, MiningSnapshot};
use pantry_api::services::sources::{EventStore, MembershipView};
use pantry_api::services::suggestions::SuggestionEngine;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Occurrence log over a canned vector, honoring the ordered, windowed,
/// truncated read contract.
struct InMemoryEvents(Vec<Occurrence>);

#[async_trait::async_trait]
impl EventStore for InMemoryEvents {
    async fn recent_added(
        &self,
        list_id: Uuid,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Occurrence>> {
        let mut matching: Vec<Occurrence> = self
            .0
            .iter()
            .filter(|o| {
                o.list_id == list_id
                    && o.status == OccurrenceStatus::Added
                    && o.created_at > since
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

struct InMemoryMembership(HashSet<Uuid>);

#[async_trait::async_trait]
impl MembershipView for InMemoryMembership {
    async fn excluded_items(&self, _list_id: Uuid) -> AppResult<HashSet<Uuid>> {
        Ok(self.0.clone())
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap()
}

fn item(id: u128, name: &str, support: f64) -> Item {
    Item {
        id: Uuid::from_u128(id),
        name: name.to_string(),
        support,
    }
}

fn added(id: u128, list_id: Uuid, item_id: u128, minutes_ago: i64) -> Occurrence {
    Occurrence {
        id: Uuid::from_u128(id),
        list_id,
        item_id: Uuid::from_u128(item_id),
        status: OccurrenceStatus::Added,
        description: String::new(),
        created_at: now() - Duration::minutes(minutes_ago),
    }
}

fn rule(antecedent: u128, consequent: u128, lift: f64) -> AssociationRule {
    AssociationRule {
        antecedent_id: Uuid::from_u128(antecedent),
        consequent_id: Uuid::from_u128(consequent),
        lift,
    }
}

fn catalog() -> Vec<Item> {
    vec![
        item(1, "apples", 4.0),
        item(2, "beans", 6.0),
        item(6, "flour", 0.5),
        item(7, "garlic", 0.4),
        item(8, "honey", 0.3),
        item(9, "ice cream", 10.0),
        item(10, "jam", 7.0),
        item(11, "kale", 6.5),
        item(12, "lemons", 5.0),
        item(13, "milk", 4.5),
        item(14, "noodles", 3.0),
        item(30, "zucchini", 0.1),
    ]
}

fn engine_for(
    occurrences: Vec<Occurrence>,
    rules: Vec<AssociationRule>,
    on_list: HashSet<Uuid>,
) -> SuggestionEngine {
    let mining = Arc::new(MiningIndex::with_snapshot(MiningSnapshot::build(
        rules,
        catalog(),
    )));

    SuggestionEngine::new(
        Arc::new(InMemoryEvents(occurrences)),
        Arc::new(InMemoryMembership(on_list)),
        mining.clone(),
        mining,
        Arc::new(FixedClock(now())),
    )
}

#[tokio::test]
async fn suggestions_combine_rules_and_popularity() {
    let list_id = Uuid::from_u128(100);
    let on_list: HashSet<Uuid> = [Uuid::from_u128(1), Uuid::from_u128(2)].into_iter().collect();

    let occurrences = vec![
        added(51, list_id, 3, 2),
        added(52, list_id, 4, 8),
        // Outside the ten-minute window; its high-lift rule must not fire.
        added(53, list_id, 5, 20),
    ];

    let rules = vec![
        rule(51, 6, 5.0),
        rule(51, 7, 3.0),
        rule(52, 8, 4.0),
        rule(53, 30, 99.0),
    ];

    let engine = engine_for(occurrences, rules, on_list.clone());
    let suggestions = engine.suggest(list_id).await.unwrap();

    let names: Vec<&str> = suggestions.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            // Recency phase: newest event's consequents first, by lift.
            "flour", "garlic", "honey",
            // Popularity fallback for the remaining six slots.
            "ice cream", "jam", "kale", "lemons", "milk", "noodles",
        ]
    );

    assert!(suggestions.iter().all(|i| !on_list.contains(&i.id)));
    assert!(!names.contains(&"zucchini"));
}

#[tokio::test]
async fn list_without_history_gets_pure_popularity_ranking() {
    let list_id = Uuid::from_u128(100);

    let engine = engine_for(vec![], vec![], HashSet::new());
    let suggestions = engine.suggest(list_id).await.unwrap();

    assert_eq!(suggestions.len(), 9);
    // Non-increasing support, names ascending on ties.
    for pair in suggestions.windows(2) {
        assert!(
            pair[0].support > pair[1].support
                || (pair[0].support == pair[1].support && pair[0].name <= pair[1].name)
        );
    }
    assert_eq!(suggestions[0].name, "ice cream");
}

#[tokio::test]
async fn unknown_list_yields_popularity_fallback_not_an_error() {
    let engine = engine_for(vec![], vec![], HashSet::new());

    let suggestions = engine.suggest(Uuid::from_u128(999)).await.unwrap();

    // Nothing on the unknown list, nothing in its history: the catalog's
    // most popular items come back rather than a failure.
    assert_eq!(suggestions.len(), 9);
}
