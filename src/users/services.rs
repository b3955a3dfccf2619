use crate::errors::ApiError;
use crate::store::{CredentialStore, SubscriptionStore};
use crate::users::dto::UserDetails;

/// Look up a user by email together with their most recent subscription
/// record. Read-only and safe to retry.
pub async fn fetch_user_details_by_email(
    users: &dyn CredentialStore,
    subs: &dyn SubscriptionStore,
    email: &str,
) -> Result<UserDetails, ApiError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required.".into()));
    }

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let subscription = subs.find_latest_by_user(user.id).await?;

    Ok(UserDetails {
        id: user.id,
        full_name: user.full_name,
        email: user.email,
        mobile: user.mobile,
        subscription,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::RegisterRequest;
    use crate::auth::services::register_user;
    use crate::store::memory::MemoryStore;
    use crate::subscriptions::dto::UpdateSubscriptionRequest;
    use crate::subscriptions::services::update_subscription;
    use crate::users::repo_types::User;

    async fn registered_user(store: &MemoryStore, email: &str) -> User {
        register_user(
            store,
            RegisterRequest {
                full_name: "Jane Doe".into(),
                email: email.into(),
                password: "hunter2hunter2".into(),
                mobile: "9876543210".into(),
                country: "India".into(),
                state: "Karnataka".into(),
                company_name: "Acme".into(),
                designation: "Business Analyst".into(),
            },
        )
        .await
        .expect("register")
    }

    #[tokio::test]
    async fn lookup_without_subscription_returns_null_not_error() {
        let store = MemoryStore::new();
        let user = registered_user(&store, "jane@example.com").await;

        let details = fetch_user_details_by_email(&store, &store, "jane@example.com")
            .await
            .expect("lookup");
        assert_eq!(details.id, user.id);
        assert_eq!(details.full_name, "Jane Doe");
        assert_eq!(details.mobile, "9876543210");
        assert!(details.subscription.is_none());

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["subscription"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn lookup_is_idempotent() {
        let store = MemoryStore::new();
        registered_user(&store, "jane@example.com").await;

        let first = fetch_user_details_by_email(&store, &store, "jane@example.com")
            .await
            .expect("first lookup");
        let second = fetch_user_details_by_email(&store, &store, "jane@example.com")
            .await
            .expect("second lookup");
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn lookup_returns_latest_subscription_record() {
        let store = MemoryStore::new();
        let user = registered_user(&store, "jane@example.com").await;

        for (kind, days) in [("FreeTrail", 7), ("Organization", 30)] {
            update_subscription(
                &store,
                &store,
                UpdateSubscriptionRequest {
                    user_id: Some(user.id),
                    subscription_type: kind.into(),
                    duration_in_days: Some(days),
                },
            )
            .await
            .expect("update");
        }

        let details = fetch_user_details_by_email(&store, &store, "JANE@example.com")
            .await
            .expect("lookup");
        let sub = details.subscription.expect("has subscription");
        assert_eq!(sub.kind.as_str(), "Organization");
    }

    #[tokio::test]
    async fn lookup_unknown_email_fails_with_user_not_found() {
        let store = MemoryStore::new();
        let err = fetch_user_details_by_email(&store, &store, "ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
    }

    #[tokio::test]
    async fn lookup_empty_email_is_a_validation_error() {
        let store = MemoryStore::new();
        let err = fetch_user_details_by_email(&store, &store, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
