use async_trait::async_trait;
use std::sync::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{CredentialStore, StoreError, SubscriptionStore};
use crate::subscriptions::repo_types::{NewSubscription, Subscription};
use crate::users::repo_types::{NewUser, User};

/// In-memory store backing `AppState::fake()` and the service tests.
/// Appends preserve insertion order, so "latest subscription" is the last
/// matching record rather than a timestamp comparison.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            full_name: new_user.full_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            mobile: new_user.mobile,
            country: new_user.country,
            state: new_user.state,
            company_name: new_user.company_name,
            designation: new_user.designation,
            subscription: None,
            projects: vec![],
            hub_ingests: vec![],
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let mut users = self.users.lock().unwrap();
        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| anyhow::anyhow!("user {} not found", user.id))?;
        stored.subscription = user.subscription.clone();
        stored.projects = user.projects.clone();
        stored.hub_ingests = user.hub_ingests.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn insert(&self, new_subscription: NewSubscription) -> anyhow::Result<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: new_subscription.user_id,
            kind: new_subscription.kind,
            start_date: new_subscription.start_date,
            end_date: new_subscription.end_date,
            status: new_subscription.status,
            created_at: OffsetDateTime::now_utc(),
        };
        subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn find_latest_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        let subscriptions = self.subscriptions.lock().unwrap();
        Ok(subscriptions
            .iter()
            .rev()
            .find(|s| s.user_id == user_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::Designation;

    fn sample_user(email: &str) -> NewUser {
        NewUser {
            full_name: "Sample User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            mobile: "1234567890".into(),
            country: "India".into(),
            state: "Kerala".into(),
            company_name: "Acme".into(),
            designation: Designation::Others,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = MemoryStore::new();
        CredentialStore::insert(&store, sample_user("dup@example.com"))
            .await
            .unwrap();
        let err = CredentialStore::insert(&store, sample_user("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn find_by_email_and_id_round_trip() {
        let store = MemoryStore::new();
        let created = CredentialStore::insert(&store, sample_user("a@example.com"))
            .await
            .unwrap();
        let by_email = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }
}
