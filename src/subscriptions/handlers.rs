use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::services::AuthUser,
    errors::ApiError,
    state::AppState,
    subscriptions::{
        dto::{CreateSubscriptionRequest, UpdateSubscriptionRequest},
        repo_types::Subscription,
        services,
    },
};

pub fn subscription_routes() -> Router<AppState> {
    Router::new().route(
        "/users/subscription",
        post(create_subscription).put(update_subscription),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_subscription(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let subscription = services::create_subscription(
        state.users.as_ref(),
        state.subscriptions.as_ref(),
        payload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[instrument(skip(state, payload))]
pub async fn update_subscription(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Json(payload): Json<UpdateSubscriptionRequest>,
) -> Result<Json<Subscription>, ApiError> {
    let subscription = services::update_subscription(
        state.users.as_ref(),
        state.subscriptions.as_ref(),
        payload,
    )
    .await?;
    Ok(Json(subscription))
}
