//! Contact form handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;

use super::{null_as_empty, require_fields, validation_error, AppJson};
use crate::AppState;
use cybersentry_common::{
    db::models::{ContactMessage, NewContactMessage},
    errors::{ApiResponse, AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 200))]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(email)]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(max = 5000))]
    pub message: String,
}

impl ContactRequest {
    fn check(&self) -> Result<()> {
        require_fields(&[
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ])?;

        let trimmed = ContactRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        };

        trimmed.validate().map_err(|errors| {
            if errors.field_errors().contains_key("email") {
                AppError::InvalidFormat {
                    message: "email is not a valid address".to_string(),
                }
            } else {
                validation_error(errors)
            }
        })
    }
}

/// Store a contact form message
pub async fn submit_contact(
    State(state): State<AppState>,
    AppJson(request): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContactMessage>>)> {
    request.check()?;

    let message = state
        .store
        .create_contact_message(NewContactMessage {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            message: request.message.trim().to_string(),
        })
        .await?;

    metrics::record_contact_message();
    tracing::info!(message_id = %message.id, "Contact message stored");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app, broken_app, post_json, send, BrokenStore};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_contact_stored() {
        let app = app();
        let (status, body) = send(
            &app.router,
            post_json(
                "/api/contact",
                json!({"name": " Asha ", "email": "asha@example.com", "message": "Got a scam call"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Asha");
        assert!(body["data"]["id"].is_string());
        assert!(body["data"]["created_at"].is_string());

        let stored = app.store.contact_messages().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].email, "asha@example.com");
    }

    #[tokio::test]
    async fn test_contact_missing_fields() {
        let app = app();
        let (status, body) = send(&app.router, post_json("/api/contact", json!({"email": " "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["name", "email", "message"]));
        assert!(app.store.contact_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_contact_invalid_email() {
        let app = app();
        let (status, body) = send(
            &app.router,
            post_json("/api/contact", json!({"name": "A", "email": "not-an-email", "message": "m"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FORMAT");
        assert!(app.store.contact_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_contact_message_too_long() {
        let app = app();
        let message = "m".repeat(5001);
        let (status, body) = send(
            &app.router,
            post_json("/api/contact", json!({"name": "A", "email": "a@example.com", "message": message})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(app.store.contact_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_contact_storage_failure_is_500() {
        let router = broken_app(BrokenStore::failing());
        let (status, body) = send(
            &router,
            post_json("/api/contact", json!({"name": "A", "email": "a@example.com", "message": "m"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}
