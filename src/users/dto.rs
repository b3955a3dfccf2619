use serde::Serialize;
use uuid::Uuid;

use crate::subscriptions::repo_types::Subscription;

/// Lookup result for GET /users/:email. The subscription comes from the
/// subscription store (latest record), not from the embedded snapshot, and
/// is an explicit null when the user never subscribed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub subscription: Option<Subscription>,
}
