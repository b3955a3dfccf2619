use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::subscriptions::repo_types::{SubscriptionStatus, SubscriptionType};

/// Closed set of designations accepted at signup. Versioned constants;
/// extending the set is a data migration decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Designation {
    #[serde(rename = "Software Developer")]
    SoftwareDeveloper,
    #[serde(rename = "Data Analyst")]
    DataAnalyst,
    #[serde(rename = "Product Manager")]
    ProductManager,
    #[serde(rename = "UI/UX Designer")]
    UiUxDesigner,
    #[serde(rename = "System Analyst")]
    SystemAnalyst,
    #[serde(rename = "Project Manager")]
    ProjectManager,
    #[serde(rename = "Business Analyst")]
    BusinessAnalyst,
    Others,
}

impl Designation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Designation::SoftwareDeveloper => "Software Developer",
            Designation::DataAnalyst => "Data Analyst",
            Designation::ProductManager => "Product Manager",
            Designation::UiUxDesigner => "UI/UX Designer",
            Designation::SystemAnalyst => "System Analyst",
            Designation::ProjectManager => "Project Manager",
            Designation::BusinessAnalyst => "Business Analyst",
            Designation::Others => "Others",
        }
    }
}

impl fmt::Display for Designation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Designation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Software Developer" => Ok(Designation::SoftwareDeveloper),
            "Data Analyst" => Ok(Designation::DataAnalyst),
            "Product Manager" => Ok(Designation::ProductManager),
            "UI/UX Designer" => Ok(Designation::UiUxDesigner),
            "System Analyst" => Ok(Designation::SystemAnalyst),
            "Project Manager" => Ok(Designation::ProjectManager),
            "Business Analyst" => Ok(Designation::BusinessAnalyst),
            "Others" => Ok(Designation::Others),
            other => Err(other.to_string()),
        }
    }
}

/// Subscription fields carried directly on the user record. All optional:
/// a user may exist without ever having had a subscription. Distinct from
/// the standalone Subscription records, which hold the full history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSnapshot {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SubscriptionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub status: SubscriptionStatus,
}

impl SubscriptionSnapshot {
    /// End date must be strictly after start date when both are present.
    pub fn is_valid(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => end > start,
            _ => true,
        }
    }
}

/// Project owned by a user. The subscription type here is free-form text,
/// not the closed plan enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_name: String,
    pub organization_name: String,
    pub subscription_type: String,
    pub created_at: OffsetDateTime,
}

/// Weak reference to an externally-owned hub ingest: an identifier plus a
/// denormalized display cache. Never traversed as an owning relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubIngestRef {
    pub hub_ingest_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_type: Option<String>,
}

/// User record. The password is only ever stored as an argon2 hash and the
/// hash never leaves the process in serialized form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub mobile: String,
    pub country: String,
    pub state: String,
    pub company_name: String,
    pub designation: Designation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionSnapshot>,
    pub projects: Vec<Project>,
    pub hub_ingests: Vec<HubIngestRef>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Insert payload for registration; id, timestamps and the empty
/// projects/hub_ingests lists are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile: String,
    pub country: String,
    pub state: String,
    pub company_name: String,
    pub designation: Designation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn user_serialization_omits_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            password_hash: "argon2-secret".into(),
            mobile: "1234567890".into(),
            country: "India".into(),
            state: "Karnataka".into(),
            company_name: "Acme".into(),
            designation: Designation::SoftwareDeveloper,
            subscription: None,
            projects: vec![],
            hub_ingests: vec![],
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2-secret"));
        assert!(json.contains("jane@example.com"));
        assert!(json.contains("fullName"));
    }

    #[test]
    fn designation_round_trips_through_display_strings() {
        for name in [
            "Software Developer",
            "Data Analyst",
            "Product Manager",
            "UI/UX Designer",
            "System Analyst",
            "Project Manager",
            "Business Analyst",
            "Others",
        ] {
            let parsed: Designation = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
        assert!("CTO".parse::<Designation>().is_err());
    }

    #[test]
    fn snapshot_rejects_end_before_start() {
        let now = OffsetDateTime::now_utc();
        let snapshot = SubscriptionSnapshot {
            kind: Some(SubscriptionType::FreeTrail),
            duration_in_days: Some(30),
            start_date: Some(now),
            end_date: Some(now - Duration::days(1)),
            status: SubscriptionStatus::Active,
        };
        assert!(!snapshot.is_valid());

        let open_ended = SubscriptionSnapshot::default();
        assert!(open_ended.is_valid());
    }
}
