use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    routes::AppState,
};

/// Handler for the suggested-items endpoint
///
/// The 404 for an unknown list lives here; the engine itself treats an
/// unknown list as one with no history and would just return the
/// popularity fallback.
pub async fn suggested(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Item>>> {
    state
        .lists
        .get_list(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("List {} does not exist", id)))?;

    let items = state.suggestions.suggest(id).await?;

    tracing::info!(list_id = %id, suggestions = items.len(), "Suggestions served");

    Ok(Json(items))
}
