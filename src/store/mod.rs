use async_trait::async_trait;
use uuid::Uuid;

use crate::subscriptions::repo_types::{NewSubscription, Subscription};
use crate::users::repo_types::{NewUser, User};

pub mod memory;
pub mod postgres;

/// Store-level failure. Uniqueness violations get their own variant so the
/// service layer can surface them as a duplicate-email error even when two
/// registrations race past the pre-insert check.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for user records. Injected into the services as a trait
/// object so they can be tested against the in-memory implementation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Persist mutable fields of an existing user (subscription snapshot,
    /// projects, hub ingest refs) and bump `updated_at`.
    async fn update(&self, user: &User) -> anyhow::Result<User>;
}

/// Persistence for subscription records. Append-only in this scope; the
/// latest record per user is the current subscription.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn insert(&self, new_subscription: NewSubscription) -> anyhow::Result<Subscription>;
    async fn find_latest_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>>;
}
