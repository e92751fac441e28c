use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grocery item known to the system.
///
/// `support` is the item's global popularity score. It is owned and
/// refreshed by the offline mining pipeline; the API only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub support: f64,
}

/// A shopping list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A list entry joined with its item, as returned to clients.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ListItemView {
    pub id: Uuid,
    pub name: String,
    pub support: f64,
    pub description: String,
}

/// Whether an occurrence recorded an item being added or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "occurrence_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Added,
    Dropped,
}

/// One append-only history event: an item added to or dropped from a list.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Occurrence {
    pub id: Uuid,
    pub list_id: Uuid,
    pub item_id: Uuid,
    pub status: OccurrenceStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A mined rule: given that the specific add event `antecedent_id`
/// happened, the consequent item is disproportionately likely to be added
/// next. Written only by the offline mining pipeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssociationRule {
    pub antecedent_id: Uuid,
    pub consequent_id: Uuid,
    pub lift: f64,
}

// ============================================================================
// Request payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemByNameRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub item_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipeItem {
    pub item_id: Uuid,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct AddRecipeItemsRequest {
    pub items: Vec<RecipeItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_status_serde() {
        assert_eq!(
            serde_json::to_string(&OccurrenceStatus::Added).unwrap(),
            r#""added""#
        );
        assert_eq!(
            serde_json::to_string(&OccurrenceStatus::Dropped).unwrap(),
            r#""dropped""#
        );

        let status: OccurrenceStatus = serde_json::from_str(r#""dropped""#).unwrap();
        assert_eq!(status, OccurrenceStatus::Dropped);
    }

    #[test]
    fn test_add_item_request_description_defaults_to_empty() {
        let request: AddItemByNameRequest = serde_json::from_str(r#"{"name": "Milk"}"#).unwrap();
        assert_eq!(request.name, "Milk");
        assert_eq!(request.description, "");
    }

    #[test]
    fn test_recipe_items_request_deserialization() {
        let json = r#"{
            "items": [
                {"item_id": "8f1f9c2e-5d9b-4e9a-93a1-0b6f4adbb001", "description": "200g"},
                {"item_id": "8f1f9c2e-5d9b-4e9a-93a1-0b6f4adbb002"}
            ]
        }"#;

        let request: AddRecipeItemsRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.items.len(), 2);
        assert_eq!(request.items[0].description, "200g");
        assert_eq!(request.items[1].description, "");
    }
}
