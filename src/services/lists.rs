use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Item, ListItemView, Occurrence, OccurrenceStatus, RecipeItem, ShoppingList,
    },
};

/// How many entries the recent-items view returns.
const RECENT_ITEM_LIMIT: i64 = 9;

/// List and item management.
///
/// Every membership change is also recorded as an occurrence in the
/// append-only log; the mining pipeline and the suggestion engine read
/// that log, this service only ever appends to it.
#[derive(Clone)]
pub struct ListService {
    pool: PgPool,
}

impl ListService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_list(&self, name: &str) -> AppResult<ShoppingList> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "List name cannot be empty".to_string(),
            ));
        }

        let list = sqlx::query_as::<_, ShoppingList>(
            "INSERT INTO shopping_lists (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(list_id = %list.id, name = %list.name, "List created");

        Ok(list)
    }

    pub async fn get_list(&self, list_id: Uuid) -> AppResult<Option<ShoppingList>> {
        let list = sqlx::query_as::<_, ShoppingList>(
            "SELECT id, name, created_at FROM shopping_lists WHERE id = $1",
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(list)
    }

    /// The list's entries joined with their items, ordered by item name.
    pub async fn list_items(&self, list_id: Uuid) -> AppResult<Vec<ListItemView>> {
        let items = sqlx::query_as::<_, ListItemView>(
            r#"
            SELECT i.id, i.name, i.support, e.description
            FROM list_entries e
            JOIN items i ON i.id = e.item_id
            WHERE e.list_id = $1
            ORDER BY i.name
            "#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_item(&self, item_id: Uuid) -> AppResult<Option<Item>> {
        let item =
            sqlx::query_as::<_, Item>("SELECT id, name, support FROM items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(item)
    }

    /// Adds an item to the list by name, creating the item if it does not
    /// exist yet. Adding an item already on the list is a no-op.
    pub async fn add_item_by_name(
        &self,
        list_id: Uuid,
        name: &str,
        description: &str,
    ) -> AppResult<Item> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Item name cannot be empty".to_string(),
            ));
        }

        self.ensure_list(list_id).await?;

        // The no-op update makes RETURNING yield the row whether it was
        // inserted or already present.
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, support
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO list_entries (list_id, item_id, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (list_id, item_id) DO NOTHING
            RETURNING item_id
            "#,
        )
        .bind(list_id)
        .bind(item.id)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_some() {
            self.record_occurrence(list_id, item.id, OccurrenceStatus::Added, description)
                .await?;
            tracing::info!(list_id = %list_id, item_id = %item.id, name = %item.name, "Item added to list");
        }

        Ok(item)
    }

    /// Removes an item from the list and records the drop event, carrying
    /// the entry's description into the log.
    pub async fn remove_item(&self, list_id: Uuid, item_id: Uuid) -> AppResult<()> {
        self.ensure_list(list_id).await?;

        let description = sqlx::query_scalar::<_, String>(
            "DELETE FROM list_entries WHERE list_id = $1 AND item_id = $2 RETURNING description",
        )
        .bind(list_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Item is not on the list".to_string()))?;

        self.record_occurrence(list_id, item_id, OccurrenceStatus::Dropped, &description)
            .await?;

        tracing::info!(list_id = %list_id, item_id = %item_id, "Item removed from list");

        Ok(())
    }

    /// Replaces the description of an entry on the list.
    pub async fn set_entry_description(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        description: &str,
    ) -> AppResult<ListItemView> {
        let entry = sqlx::query_as::<_, ListItemView>(
            r#"
            UPDATE list_entries e SET description = $3
            FROM items i
            WHERE e.list_id = $1 AND e.item_id = $2 AND i.id = e.item_id
            RETURNING i.id, i.name, i.support, e.description
            "#,
        )
        .bind(list_id)
        .bind(item_id)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Item is not on the list".to_string()))?;

        Ok(entry)
    }

    /// Items the list interacted with lately and that are not on it now:
    /// the newest occurrence per item, newest first.
    pub async fn recent_items(&self, list_id: Uuid) -> AppResult<Vec<ListItemView>> {
        let items = sqlx::query_as::<_, ListItemView>(
            r#"
            SELECT id, name, support, description FROM (
                SELECT DISTINCT ON (o.item_id)
                    i.id, i.name, i.support, o.description, o.created_at
                FROM occurrences o
                JOIN items i ON i.id = o.item_id
                WHERE o.list_id = $1
                  AND NOT EXISTS (
                      SELECT 1 FROM list_entries e
                      WHERE e.list_id = o.list_id AND e.item_id = o.item_id
                  )
                ORDER BY o.item_id, o.created_at DESC
            ) latest
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(list_id)
        .bind(RECENT_ITEM_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Bulk-adds recipe items to the list. Items already on the list have
    /// their descriptions merged instead of replaced; unknown item ids are
    /// skipped. Returns the number of items processed.
    pub async fn add_recipe_items(
        &self,
        list_id: Uuid,
        recipe_items: Vec<RecipeItem>,
    ) -> AppResult<usize> {
        self.ensure_list(list_id).await?;

        let mut processed = 0;

        for recipe_item in recipe_items {
            let Some(item) = self.get_item(recipe_item.item_id).await? else {
                tracing::warn!(item_id = %recipe_item.item_id, "Skipping unknown recipe item");
                continue;
            };

            let existing = sqlx::query_scalar::<_, String>(
                "SELECT description FROM list_entries WHERE list_id = $1 AND item_id = $2",
            )
            .bind(list_id)
            .bind(item.id)
            .fetch_optional(&self.pool)
            .await?;

            match existing {
                Some(current) => {
                    let merged = merge_descriptions(&recipe_item.description, &current);
                    sqlx::query(
                        "UPDATE list_entries SET description = $3 WHERE list_id = $1 AND item_id = $2",
                    )
                    .bind(list_id)
                    .bind(item.id)
                    .bind(&merged)
                    .execute(&self.pool)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO list_entries (list_id, item_id, description) VALUES ($1, $2, $3)",
                    )
                    .bind(list_id)
                    .bind(item.id)
                    .bind(&recipe_item.description)
                    .execute(&self.pool)
                    .await?;
                }
            }

            self.record_occurrence(list_id, item.id, OccurrenceStatus::Added, "")
                .await?;
            processed += 1;
        }

        tracing::info!(list_id = %list_id, processed, "Recipe items added");

        Ok(processed)
    }

    async fn ensure_list(&self, list_id: Uuid) -> AppResult<ShoppingList> {
        self.get_list(list_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("List {} does not exist", list_id)))
    }

    async fn record_occurrence(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        status: OccurrenceStatus,
        description: &str,
    ) -> AppResult<Occurrence> {
        let occurrence = sqlx::query_as::<_, Occurrence>(
            r#"
            INSERT INTO occurrences (list_id, item_id, status, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, list_id, item_id, status, description, created_at
            "#,
        )
        .bind(list_id)
        .bind(item_id)
        .bind(status)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(occurrence)
    }
}

/// Merges an incoming recipe description with the one already on the list
/// entry. The `...` marker stands for "and previous notes".
pub fn merge_descriptions(incoming: &str, existing: &str) -> String {
    match (incoming.is_empty(), existing.is_empty()) {
        (false, false) => format!("{}, {}", incoming, existing),
        (false, true) => format!("{}, ...", incoming),
        (true, false) => {
            if existing.ends_with("...") {
                existing.to_string()
            } else {
                format!("{}, ...", existing)
            }
        }
        (true, true) => "...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_both_present() {
        assert_eq!(merge_descriptions("200g", "from last week"), "200g, from last week");
    }

    #[test]
    fn test_merge_incoming_only() {
        assert_eq!(merge_descriptions("200g", ""), "200g, ...");
    }

    #[test]
    fn test_merge_existing_only_gains_marker() {
        assert_eq!(merge_descriptions("", "from last week"), "from last week, ...");
    }

    #[test]
    fn test_merge_existing_with_marker_is_unchanged() {
        assert_eq!(merge_descriptions("", "200g, ..."), "200g, ...");
    }

    #[test]
    fn test_merge_neither_present() {
        assert_eq!(merge_descriptions("", ""), "...");
    }
}
