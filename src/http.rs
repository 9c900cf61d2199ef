//! JSON HTTP surface over the mapping services.
//!
//! Error bodies are `{"error": "..."}`. Caller errors carry their message;
//! internal failures are logged and answered with a fixed per-route message.
//!
//! Key casing is mixed in one place. `GET /incomplete-mappings` rows carry
//! the employee fields in camelCase (`id`, `teamId`, `cityName`, ...) next to
//! snake_case `report_count` and `mapped_reports`, the names the dashboard
//! client already reads:
//!
//! ```json
//! { "id": "emp-305", "name": "Ava Patel", "teamId": "team-support", ...,
//!   "report_count": 1, "mapped_reports": "APAC Customer Support" }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ServiceError};
use crate::services::mappings::MappingRequest;
use crate::services::{coverage, employees, mappings, reports};
use crate::state::AppState;
use crate::types::{Employee, EmployeeCoverage, Report};

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/reports", get(list_reports))
        .route("/reports/{report_name}/employees", get(report_employees))
        .route("/employees", get(list_employees))
        .route("/incomplete-mappings", get(incomplete_mappings))
        .route("/mappings", post(add_mapping).delete(exclude_mapping))
        .with_state(state)
}

fn api_error(err: ServiceError, fallback: &str) -> ApiFailure {
    if !err.is_caller_error() {
        log::error!("{}: {}", fallback, err);
    }
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::from_service(&err, fallback)))
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    #[serde(default)]
    region: Option<String>,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<Report>>, ApiFailure> {
    state
        .with_db(move |db| reports::list_reports(db, query.region.as_deref()))
        .await
        .map(Json)
        .map_err(|e| api_error(e, "Failed to fetch reports"))
}

async fn report_employees(
    State(state): State<AppState>,
    Path(report_name): Path<String>,
) -> Result<Json<Vec<Employee>>, ApiFailure> {
    state
        .with_db(move |db| reports::resolve_employees(db, &report_name))
        .await
        .map(Json)
        .map_err(|e| api_error(e, "Failed to fetch matching employees"))
}

async fn list_employees(State(state): State<AppState>) -> Result<Json<Vec<Employee>>, ApiFailure> {
    state
        .with_db(|db| employees::list_employees(db))
        .await
        .map(Json)
        .map_err(|e| api_error(e, "Failed to fetch employees"))
}

#[derive(Debug, Deserialize)]
struct CoverageQuery {
    #[serde(default)]
    threshold: Option<usize>,
}

/// One row of the incomplete-mappings listing.
#[derive(Debug, Serialize)]
struct IncompleteMappingItem {
    #[serde(flatten)]
    employee: Employee,
    report_count: usize,
    /// Comma-joined distinct report names, null when there are none.
    mapped_reports: Option<String>,
}

impl From<EmployeeCoverage> for IncompleteMappingItem {
    fn from(c: EmployeeCoverage) -> Self {
        let mapped_reports = if c.mapped_report_names.is_empty() {
            None
        } else {
            Some(c.mapped_report_names.join(","))
        };
        Self {
            employee: c.employee,
            report_count: c.report_count,
            mapped_reports,
        }
    }
}

async fn incomplete_mappings(
    State(state): State<AppState>,
    Query(query): Query<CoverageQuery>,
) -> Result<Json<Vec<IncompleteMappingItem>>, ApiFailure> {
    let threshold = query.threshold.unwrap_or(state.config.coverage_threshold);
    state
        .with_db(move |db| coverage::list_under_covered(db, threshold))
        .await
        .map(|rows| Json(rows.into_iter().map(IncompleteMappingItem::from).collect()))
        .map_err(|e| api_error(e, "Failed to fetch incomplete mappings"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MappingResponse {
    success: bool,
    report_count: usize,
    message: &'static str,
}

fn parse_body(
    body: Result<Json<MappingRequest>, JsonRejection>,
) -> Result<MappingRequest, ApiFailure> {
    body.map(|Json(req)| req).map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: format!("Invalid request body: {}", rejection.body_text()),
            }),
        )
    })
}

async fn add_mapping(
    State(state): State<AppState>,
    body: Result<Json<MappingRequest>, JsonRejection>,
) -> Result<Json<MappingResponse>, ApiFailure> {
    let req = parse_body(body)?;
    let result = state
        .with_db(move |db| mappings::add_mapping_request(db, &req))
        .await
        .map_err(|e| api_error(e, "Failed to add mapping"))?;
    Ok(Json(MappingResponse {
        success: true,
        report_count: result.report_count,
        message: "Mapping added successfully",
    }))
}

async fn exclude_mapping(
    State(state): State<AppState>,
    body: Result<Json<MappingRequest>, JsonRejection>,
) -> Result<Json<MappingResponse>, ApiFailure> {
    let req = parse_body(body)?;
    let result = state
        .with_db(move |db| mappings::exclude_mapping_request(db, &req))
        .await
        .map_err(|e| api_error(e, "Failed to remove mapping"))?;
    Ok(Json(MappingResponse {
        success: true,
        report_count: result.report_count,
        message: "Mapping removed successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::seeded_db;
    use crate::state::Config;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(seeded_db(), Config::default()))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = call(app(), "GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_string()));
    }

    #[tokio::test]
    async fn test_list_reports_shape() {
        let (status, body) = call(app(), "GET", "/reports?region=EMEA", None).await;
        assert_eq!(status, StatusCode::OK);
        let reports = body.as_array().unwrap();
        assert_eq!(reports.len(), 2);
        let london = reports
            .iter()
            .find(|r| r["name"] == "London Team Analysis")
            .unwrap();
        assert_eq!(london["region"], "EMEA");
        assert_eq!(london["supervisors"], json!(["emp-203"]));
        assert_eq!(london["mappings"], json!([{ "type": "cityId", "value": "london" }]));
    }

    #[tokio::test]
    async fn test_report_employees_url_encoded_name() {
        let (status, body) =
            call(app(), "GET", "/reports/London%20Team%20Analysis/employees", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["emp-203", "emp-201"]);
    }

    #[tokio::test]
    async fn test_report_employees_unknown_is_404() {
        let (status, body) = call(app(), "GET", "/reports/Nope/employees", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Nope"));
    }

    #[tokio::test]
    async fn test_report_employees_blank_name_is_400() {
        let (status, _) = call(app(), "GET", "/reports/%20/employees", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_incomplete_mappings_fields() {
        let (status, body) = call(app(), "GET", "/incomplete-mappings", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "emp-305");
        assert_eq!(rows[0]["teamId"], "team-support");
        assert_eq!(rows[0]["report_count"], 1);
        assert_eq!(rows[0]["mapped_reports"], "APAC Customer Support");
        assert_eq!(rows[1]["id"], "emp-102");
    }

    #[tokio::test]
    async fn test_incomplete_mappings_threshold_param() {
        let (_, body) = call(app(), "GET", "/incomplete-mappings?threshold=3", None).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        let (_, body) = call(app(), "GET", "/incomplete-mappings?threshold=1", None).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_mapping_success_then_idempotent() {
        let app = app();
        let req = json!({ "employeeId": "emp-104", "reportName": "New Report", "mappingType": "cityId" });
        let (status, body) = call(app.clone(), "POST", "/mappings", Some(req.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["reportCount"], 4);
        assert_eq!(body["message"], "Mapping added successfully");

        let (_, again) = call(app, "POST", "/mappings", Some(req)).await;
        assert_eq!(again["reportCount"], 4);
    }

    #[tokio::test]
    async fn test_post_mapping_errors() {
        let (status, body) = call(
            app(),
            "POST",
            "/mappings",
            Some(json!({ "employeeId": "emp-104", "reportName": "R" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("mappingType"));

        let (status, _) = call(
            app(),
            "POST",
            "/mappings",
            Some(json!({ "employeeId": "emp-104", "reportName": "R", "mappingType": "planetId" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            app(),
            "POST",
            "/mappings",
            Some(json!({ "employeeId": "emp-999", "reportName": "R", "mappingType": "teamId" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(app(), "POST", "/mappings", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_mapping() {
        let app = app();
        let req = json!({ "employeeId": "emp-203", "reportName": "London Team Analysis", "mappingType": "cityId" });
        let (status, body) = call(app.clone(), "DELETE", "/mappings", Some(req.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reportCount"], 2);

        let (_, employees) =
            call(app, "GET", "/reports/London%20Team%20Analysis/employees", None).await;
        assert!(employees.as_array().unwrap().is_empty());
    }
}
