use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::{CredentialStore, StoreError, SubscriptionStore};
use crate::subscriptions::repo_types::{NewSubscription, Subscription};
use crate::users::repo_types::{HubIngestRef, NewUser, Project, SubscriptionSnapshot, User};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    )
}

/// Raw row shape; enum-valued columns come back as text and are parsed
/// into the closed sets when converting to the domain type.
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    password_hash: String,
    mobile: String,
    country: String,
    state: String,
    company_name: String,
    designation: String,
    subscription: Option<Json<SubscriptionSnapshot>>,
    projects: Json<Vec<Project>>,
    hub_ingests: Json<Vec<HubIngestRef>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let designation = row
            .designation
            .parse()
            .map_err(|v| anyhow!("unknown designation in users row: {v}"))?;
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            mobile: row.mobile,
            country: row.country,
            state: row.state,
            company_name: row.company_name,
            designation,
            subscription: row.subscription.map(|Json(s)| s),
            projects: row.projects.0,
            hub_ingests: row.hub_ingests.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
    status: String,
    created_at: OffsetDateTime,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = anyhow::Error;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|v| anyhow!("unknown subscription type in subscriptions row: {v}"))?;
        let status = row
            .status
            .parse()
            .map_err(|v| anyhow!("unknown subscription status in subscriptions row: {v}"))?;
        Ok(Subscription {
            id: row.id,
            user_id: row.user_id,
            kind,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, full_name, email, password_hash, mobile, country, state, \
     company_name, designation, subscription, projects, hub_ingests, created_at, updated_at";

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users
                (full_name, email, password_hash, mobile, country, state,
                 company_name, designation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.mobile)
        .bind(&new_user.country)
        .bind(&new_user.state)
        .bind(&new_user.company_name)
        .bind(new_user.designation.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Other(e.into())
            }
        })?;
        User::try_from(row).map_err(StoreError::Other)
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET subscription = $2, projects = $3, hub_ingests = $4, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(user.subscription.as_ref().map(Json))
        .bind(Json(&user.projects))
        .bind(Json(&user.hub_ingests))
        .fetch_one(&self.db)
        .await?;
        User::try_from(row)
    }
}

#[derive(Clone)]
pub struct PgSubscriptionStore {
    db: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn insert(&self, new_subscription: NewSubscription) -> anyhow::Result<Subscription> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (user_id, kind, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, kind, start_date, end_date, status, created_at
            "#,
        )
        .bind(new_subscription.user_id)
        .bind(new_subscription.kind.as_str())
        .bind(new_subscription.start_date)
        .bind(new_subscription.end_date)
        .bind(new_subscription.status.as_str())
        .fetch_one(&self.db)
        .await?;
        Subscription::try_from(row)
    }

    async fn find_latest_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, kind, start_date, end_date, status, created_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Subscription::try_from).transpose()
    }
}
