use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::info;

use crate::errors::ApiError;
use crate::store::{CredentialStore, SubscriptionStore};
use crate::subscriptions::dto::{CreateSubscriptionRequest, UpdateSubscriptionRequest};
use crate::subscriptions::repo_types::{
    NewSubscription, Subscription, SubscriptionStatus, SubscriptionType,
};
use crate::users::repo_types::{SubscriptionSnapshot, User};

const MS_PER_DAY: i64 = 86_400_000;

// Upper bound on a renewal window. Keeps `days * MS_PER_DAY` and the
// resulting end date inside i64 / OffsetDateTime range, so the window
// arithmetic below cannot panic.
const MAX_DURATION_DAYS: i64 = 36_500;

/// The subscription store is the source of truth; after appending a record
/// the owner's embedded snapshot is refreshed to mirror it.
async fn refresh_snapshot(
    users: &dyn CredentialStore,
    mut user: User,
    subscription: &Subscription,
    duration_in_days: Option<i64>,
) -> Result<(), ApiError> {
    user.subscription = Some(SubscriptionSnapshot {
        kind: Some(subscription.kind),
        duration_in_days,
        start_date: Some(subscription.start_date),
        end_date: Some(subscription.end_date),
        status: subscription.status,
    });
    users.update(&user).await?;
    Ok(())
}

/// Create a subscription with an explicit validity window, owner resolved
/// by email.
pub async fn create_subscription(
    users: &dyn CredentialStore,
    subs: &dyn SubscriptionStore,
    req: CreateSubscriptionRequest,
) -> Result<Subscription, ApiError> {
    let email = req.email.trim().to_lowercase();
    let (start_date, end_date) = match (req.start_date, req.end_date) {
        (Some(start), Some(end)) if !email.is_empty() && !req.kind.trim().is_empty() => {
            (start, end)
        }
        _ => {
            return Err(ApiError::Validation(
                "All fields (email, type, startDate, endDate) are required.".into(),
            ))
        }
    };

    let kind: SubscriptionType = req
        .kind
        .parse()
        .map_err(ApiError::InvalidSubscriptionType)?;

    if end_date <= start_date {
        return Err(ApiError::Validation(
            "End date must be after start date.".into(),
        ));
    }

    let user = users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::OwnerNotFound)?;

    let subscription = subs
        .insert(NewSubscription {
            user_id: user.id,
            kind,
            start_date,
            end_date,
            status: SubscriptionStatus::Active,
        })
        .await?;

    refresh_snapshot(users, user, &subscription, None).await?;

    info!(user_id = %subscription.user_id, subscription_id = %subscription.id, "subscription created");
    Ok(subscription)
}

/// Renew a subscription for a fixed number of days starting now. Appends a
/// fresh record rather than mutating an existing one, so the per-user
/// history is preserved.
pub async fn update_subscription(
    users: &dyn CredentialStore,
    subs: &dyn SubscriptionStore,
    req: UpdateSubscriptionRequest,
) -> Result<Subscription, ApiError> {
    let (user_id, duration_in_days) = match (req.user_id, req.duration_in_days) {
        (Some(user_id), Some(duration)) if !req.subscription_type.trim().is_empty() => {
            (user_id, duration)
        }
        _ => {
            return Err(ApiError::Validation(
                "userId, subscriptionType, and durationInDays are required.".into(),
            ))
        }
    };

    if duration_in_days <= 0 {
        return Err(ApiError::Validation(
            "durationInDays must be a positive number.".into(),
        ));
    }

    if duration_in_days > MAX_DURATION_DAYS {
        return Err(ApiError::Validation(format!(
            "durationInDays must not exceed {MAX_DURATION_DAYS}."
        )));
    }

    let kind: SubscriptionType = req
        .subscription_type
        .parse()
        .map_err(ApiError::InvalidSubscriptionType)?;

    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let start_date = OffsetDateTime::now_utc();
    let end_date = start_date + TimeDuration::milliseconds(duration_in_days * MS_PER_DAY);

    let subscription = subs
        .insert(NewSubscription {
            user_id: user.id,
            kind,
            start_date,
            end_date,
            status: SubscriptionStatus::Active,
        })
        .await?;

    refresh_snapshot(users, user, &subscription, Some(duration_in_days)).await?;

    info!(user_id = %subscription.user_id, subscription_id = %subscription.id, days = duration_in_days, "subscription updated");
    Ok(subscription)
}
