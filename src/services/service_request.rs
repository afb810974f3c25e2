//! Service request confirmation flow.
//!
//! Status only moves forward (`pending_confirmation → email_sent →
//! confirmed`); there is no deletion or cancellation path. Transitions are
//! validated against the allowed graph before the store is touched.

use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::service_request::{
    CreateServiceRequest, ServiceRequest, ServiceRequestStatus,
};
use crate::store::RecordStore;

/// Receipt returned to the UI after a successful submit.
#[derive(Debug, Serialize)]
pub struct SubmitReceipt {
    pub request_id: Uuid,
}

/// Check whether a status transition is valid per the forward-only graph.
pub fn is_valid_transition(from: ServiceRequestStatus, to: ServiceRequestStatus) -> bool {
    use ServiceRequestStatus::*;
    matches!(
        (from, to),
        (PendingConfirmation, EmailSent)
            | (PendingConfirmation, Confirmed)
            | (EmailSent, Confirmed)
    )
}

/// Insert a new request and advance it to `email_sent`.
///
/// The confirmation email itself is dispatched out of band; stamping
/// `email_sent_at` marks the handoff point.
pub async fn submit(
    store: &dyn RecordStore,
    input: &CreateServiceRequest,
) -> Result<SubmitReceipt, AppError> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let request = store.insert_service_request(input).await?;
    let request = transition(store, request.id, ServiceRequestStatus::EmailSent).await?;

    tracing::info!(request_id = %request.id, plan = %request.plan, "Service request submitted");
    Ok(SubmitReceipt {
        request_id: request.id,
    })
}

/// Transition a request to `confirmed`, stamping the confirmation time.
///
/// Confirming an already-confirmed request is a no-op success, not an error.
pub async fn confirm(store: &dyn RecordStore, id: Uuid) -> Result<ServiceRequest, AppError> {
    let current = store.fetch_service_request(id).await?;
    if current.status == ServiceRequestStatus::Confirmed {
        tracing::debug!(request_id = %id, "Service request already confirmed");
        return Ok(current);
    }

    let confirmed = transition(store, id, ServiceRequestStatus::Confirmed).await?;
    tracing::info!(request_id = %id, "Service request confirmed");
    Ok(confirmed)
}

/// Fetch a single request.
pub async fn get(store: &dyn RecordStore, id: Uuid) -> Result<ServiceRequest, AppError> {
    store.fetch_service_request(id).await
}

/// Validate and apply a status transition.
async fn transition(
    store: &dyn RecordStore,
    id: Uuid,
    to: ServiceRequestStatus,
) -> Result<ServiceRequest, AppError> {
    let current = store.fetch_service_request(id).await?;
    if !is_valid_transition(current.status, to) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot transition from {:?} to {:?}",
            current.status, to
        )));
    }
    store.update_service_request_status(id, to).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRecordStore;
    use ServiceRequestStatus::*;

    fn input() -> CreateServiceRequest {
        CreateServiceRequest {
            client_name: "Grace Hopper".to_string(),
            client_email: "grace@example.com".to_string(),
            client_phone: Some("+1 555 0100".to_string()),
            company: None,
            website: None,
            project_type: Some("Web Design".to_string()),
            plan: "premium".to_string(),
            timeline: None,
            description: Some("New marketing site".to_string()),
        }
    }

    // -- Transition graph --

    #[test]
    fn forward_transitions_are_valid() {
        assert!(is_valid_transition(PendingConfirmation, EmailSent));
        assert!(is_valid_transition(PendingConfirmation, Confirmed));
        assert!(is_valid_transition(EmailSent, Confirmed));
    }

    #[test]
    fn backward_transitions_are_invalid() {
        assert!(!is_valid_transition(EmailSent, PendingConfirmation));
        assert!(!is_valid_transition(Confirmed, EmailSent));
        assert!(!is_valid_transition(Confirmed, PendingConfirmation));
    }

    #[test]
    fn self_transitions_are_invalid() {
        assert!(!is_valid_transition(PendingConfirmation, PendingConfirmation));
        assert!(!is_valid_transition(EmailSent, EmailSent));
        assert!(!is_valid_transition(Confirmed, Confirmed));
    }

    // -- Flow --

    #[tokio::test]
    async fn submit_advances_to_email_sent() {
        let store = MemoryRecordStore::new();
        let receipt = submit(&store, &input()).await.unwrap();

        let request = get(&store, receipt.request_id).await.unwrap();
        assert_eq!(request.status, EmailSent);
        assert!(request.email_sent_at.is_some());
        assert!(request.confirmed_at.is_none());
    }

    #[tokio::test]
    async fn submit_then_confirm_stamps_confirmation_time() {
        let store = MemoryRecordStore::new();
        let receipt = submit(&store, &input()).await.unwrap();

        let confirmed = confirm(&store, receipt.request_id).await.unwrap();
        assert_eq!(confirmed.status, Confirmed);
        assert!(confirmed.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn double_confirm_is_a_no_op_success() {
        let store = MemoryRecordStore::new();
        let receipt = submit(&store, &input()).await.unwrap();

        let first = confirm(&store, receipt.request_id).await.unwrap();
        let second = confirm(&store, receipt.request_id).await.unwrap();
        assert_eq!(second.status, Confirmed);
        assert_eq!(second.confirmed_at, first.confirmed_at);
    }

    #[tokio::test]
    async fn confirm_unknown_id_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = confirm(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn submit_rejects_invalid_payload() {
        let store = MemoryRecordStore::new();
        let mut bad = input();
        bad.client_email = "nope".to_string();
        let err = submit(&store, &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
