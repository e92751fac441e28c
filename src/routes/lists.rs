use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        AddItemByNameRequest, AddRecipeItemsRequest, CreateListRequest, Item, ListItemView,
        RemoveItemRequest, ShoppingList, UpdateDescriptionRequest,
    },
    routes::AppState,
};

/// Handler for creating a list
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateListRequest>,
) -> AppResult<(StatusCode, Json<ShoppingList>)> {
    let list = state.lists.create_list(&request.name).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// Handler for fetching a list
pub async fn fetch(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShoppingList>> {
    let list = state
        .lists
        .get_list(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("List {} does not exist", id)))?;
    Ok(Json(list))
}

/// Handler for listing the items on a list
pub async fn items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ListItemView>>> {
    let items = state.lists.list_items(id).await?;
    Ok(Json(items))
}

/// Handler for fetching a single item
pub async fn item(
    State(state): State<AppState>,
    Path((_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Item>> {
    let item = state
        .lists
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} does not exist", item_id)))?;
    Ok(Json(item))
}

/// Handler for adding an item to a list by name
pub async fn add_by_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddItemByNameRequest>,
) -> AppResult<Json<Item>> {
    let item = state
        .lists
        .add_item_by_name(id, &request.name, &request.description)
        .await?;
    Ok(Json(item))
}

/// Handler for removing an item from a list
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RemoveItemRequest>,
) -> AppResult<Json<Value>> {
    state.lists.remove_item(id, request.item_id).await?;
    Ok(Json(json!({ "msg": "DONE" })))
}

/// Handler for replacing an entry's description
pub async fn set_description(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> AppResult<Json<ListItemView>> {
    let entry = state
        .lists
        .set_entry_description(id, item_id, &request.description)
        .await?;
    Ok(Json(entry))
}

/// Handler for the recently interacted items of a list
pub async fn recent(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ListItemView>>> {
    let items = state.lists.recent_items(id).await?;
    Ok(Json(items))
}

/// Handler for bulk-adding recipe items
pub async fn add_recipe_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddRecipeItemsRequest>,
) -> AppResult<Json<Value>> {
    let processed = state.lists.add_recipe_items(id, request.items).await?;
    Ok(Json(json!({ "added": processed })))
}
