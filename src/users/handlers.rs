use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    errors::ApiError,
    state::AppState,
    users::{dto::UserDetails, services},
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:email", get(get_user_details))
}

#[instrument(skip(state))]
pub async fn get_user_details(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserDetails>, ApiError> {
    let details = services::fetch_user_details_by_email(
        state.users.as_ref(),
        state.subscriptions.as_ref(),
        &email,
    )
    .await?;
    Ok(Json(details))
}
