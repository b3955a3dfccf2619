use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Explicit-window creation. Fields are optional at the wire level so a
/// missing one surfaces as the domain validation error instead of a
/// deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
}

/// Duration-based renewal. The window is computed server-side from `now`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub subscription_type: String,
    pub duration_in_days: Option<i64>,
}
