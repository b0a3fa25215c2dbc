//! Public fraud case handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::{AppQuery, ListQuery};
use crate::AppState;
use cybersentry_common::{
    db::models::FraudReport,
    errors::{ApiResponse, AppError, Result},
};

/// Public fraud reports, newest first
pub async fn list_cases(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FraudReport>>>> {
    let limit = state.config.page_size(query.limit);
    let reports = state.store.list_public_reports(limit).await?;
    Ok(Json(ApiResponse::ok(reports)))
}

/// A public fraud report; private, unknown and unreadable ids are 404
pub async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FraudReport>>> {
    let not_found = || AppError::CaseNotFound { id: id.clone() };

    let case_id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    match state.store.find_public_report(case_id).await {
        Ok(Some(report)) => Ok(Json(ApiResponse::ok(report))),
        Ok(None) => Err(not_found()),
        Err(e) => {
            tracing::error!(case_id = %case_id, error = %e, "Failed to load fraud case");
            Err(not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{app, get, send};
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use cybersentry_common::db::models::FraudReport;
    use uuid::Uuid;

    fn report(title: &str, is_public: bool, hours_ago: i64) -> FraudReport {
        FraudReport {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category: "Investment Scam".to_string(),
            platform: "Telegram".to_string(),
            status: "action_taken".to_string(),
            description: Some("Fake trading group".to_string()),
            is_public,
            created_at: (Utc::now() - Duration::hours(hours_ago)).into(),
        }
    }

    #[tokio::test]
    async fn test_list_only_public_newest_first() {
        let app = app();
        app.store.insert_report(report("older", true, 48)).await;
        app.store.insert_report(report("private", false, 1)).await;
        app.store.insert_report(report("newer", true, 2)).await;

        let (status, body) = send(&app.router, get("/api/cases")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let titles: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["newer", "older"]);

        let (_, body) = send(&app.router, get("/api/cases?limit=1")).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["status"], "action_taken");
    }

    #[tokio::test]
    async fn test_private_case_is_not_found() {
        let app = app();
        let public = report("public", true, 1);
        let private = report("private", false, 1);
        app.store.insert_report(public.clone()).await;
        app.store.insert_report(private.clone()).await;

        let (status, body) = send(&app.router, get(&format!("/api/cases/{}", public.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["platform"], "Telegram");

        let (status, body) = send(&app.router, get(&format!("/api/cases/{}", private.id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "CASE_NOT_FOUND");

        let (status, _) = send(&app.router, get("/api/cases/42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
