//! Service request records created by the confirmation flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a service request.
///
/// Transitions only move forward (`PendingConfirmation → EmailSent →
/// Confirmed`); there is no deletion or cancellation path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "service_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceRequestStatus {
    PendingConfirmation,
    EmailSent,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub company: Option<String>,
    pub website: Option<String>,
    pub project_type: Option<String>,
    pub plan: String,
    pub timeline: Option<String>,
    pub description: Option<String>,
    pub status: ServiceRequestStatus,
    pub created_at: DateTime<Utc>,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Submit payload from the confirmation UI.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub client_name: String,
    #[validate(email(message = "a valid email address is required"))]
    pub client_email: String,
    pub client_phone: Option<String>,
    pub company: Option<String>,
    #[validate(url(message = "website must be a valid URL"))]
    pub website: Option<String>,
    pub project_type: Option<String>,
    #[validate(length(min = 1, message = "plan is required"))]
    pub plan: String,
    pub timeline: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateServiceRequest {
        CreateServiceRequest {
            client_name: "Ada Lovelace".to_string(),
            client_email: "ada@example.com".to_string(),
            client_phone: None,
            company: Some("Analytical Engines Ltd".to_string()),
            website: None,
            project_type: Some("AI Element".to_string()),
            plan: "premium".to_string(),
            timeline: Some("Q3".to_string()),
            description: Some("Full site refresh".to_string()),
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ServiceRequestStatus::PendingConfirmation).unwrap();
        assert_eq!(json, "\"pending_confirmation\"");
        let back: ServiceRequestStatus = serde_json::from_str("\"email_sent\"").unwrap();
        assert_eq!(back, ServiceRequestStatus::EmailSent);
    }

    #[test]
    fn valid_payload_passes_validation() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn missing_email_fails_validation() {
        let mut input = valid_input();
        input.client_email = "not-an-email".to_string();
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_plan_fails_validation() {
        let mut input = valid_input();
        input.plan = String::new();
        assert!(input.validate().is_err());
    }

    #[test]
    fn bad_website_fails_validation() {
        let mut input = valid_input();
        input.website = Some("not a url".to_string());
        assert!(input.validate().is_err());
    }
}
