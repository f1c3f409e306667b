// REST API with Axum - loan approval routes and the central error translator

use crate::approval::LoanApproval;
use crate::config::Environment;
use crate::error::LoanError;
use crate::loans::{Loan, LoanRepository};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub loans: LoanRepository,
    pub environment: Environment,
}

impl AppState {
    pub fn new(loans: LoanRepository, environment: Environment) -> Self {
        Self { loans, environment }
    }
}

// ============================================================================
// Error responses
// ============================================================================

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorBody,
    request_id: String,
}

/// A failed request, ready to be rendered.
///
/// This is the only place where error kinds become HTTP status codes.
#[derive(Debug)]
pub struct ApiError {
    error: LoanError,
    environment: Environment,
    request_id: String,
}

impl ApiError {
    pub fn new(error: LoanError, environment: Environment) -> Self {
        Self {
            error,
            environment,
            request_id: format!("req_{}", uuid::Uuid::new_v4().simple()),
        }
    }

    fn status(&self) -> StatusCode {
        match &self.error {
            LoanError::Validation { .. } | LoanError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            LoanError::NotFound { .. } => StatusCode::NOT_FOUND,
            LoanError::Database { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            LoanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures never show their own text to clients
    fn public_message(&self) -> String {
        if self.status().is_server_error() {
            "An unexpected error occurred".to_string()
        } else {
            self.error.to_string()
        }
    }

    fn details(&self) -> Option<Value> {
        if !self.environment.exposes_details() {
            return None;
        }

        let mut details = json!({ "name": self.error.name() });
        match &self.error {
            LoanError::Validation { field: Some(field), .. } => {
                details["field"] = json!(field);
            }
            LoanError::InvalidJson(parser_message) => {
                details["message"] = json!(parser_message);
            }
            LoanError::Database { .. } | LoanError::Internal(_) => {
                details["message"] = json!(self.error.to_string());
                let causes: Vec<String> =
                    source_chain(&self.error).map(|e| e.to_string()).collect();
                if !causes.is_empty() {
                    details["causes"] = json!(causes);
                }
            }
            _ => {}
        }
        Some(details)
    }
}

fn source_chain<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> impl Iterator<Item = &'a (dyn std::error::Error + 'static)> {
    std::iter::successors(err.source(), |e| e.source())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                request_id = %self.request_id,
                code = self.error.code(),
                error = ?self.error,
                "Request failed"
            );
        } else {
            tracing::warn!(
                request_id = %self.request_id,
                code = self.error.code(),
                error = %self.error,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error.code(),
                message: self.public_message(),
                details: self.details(),
            },
            request_id: self.request_id,
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// POST /loan/approve - Approve or reject a pending loan
async fn approve_loan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Loan>, ApiError> {
    let started = Instant::now();
    let tag = format!("approve_{}", uuid::Uuid::new_v4().simple());
    let fail = |error: LoanError| {
        tracing::warn!(
            request = %tag,
            error = %error,
            duration_ms = started.elapsed().as_millis() as u64,
            "Loan approval failed"
        );
        ApiError::new(error, state.environment)
    };

    let Json(body) = body.map_err(|rejection| fail(LoanError::InvalidJson(rejection.body_text())))?;

    tracing::info!(
        request = %tag,
        loan_id = ?body.get("loanId"),
        approved = ?body.get("approved"),
        approved_by = ?body.get("approvedBy"),
        "Processing loan approval request"
    );

    let approval = LoanApproval::from_json(&body).map_err(&fail)?;
    let loan = state.loans.approve(&approval).map_err(&fail)?;

    tracing::info!(
        request = %tag,
        loan_id = loan.loan_id,
        status = %loan.status,
        approved_by = ?loan.approved_by,
        duration_ms = started.elapsed().as_millis() as u64,
        "Loan approval processed successfully"
    );

    Ok(Json(loan))
}

/// GET /loan/:id - Get a loan by ID
async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Loan>, ApiError> {
    let id = id
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::new(
                LoanError::validation("Loan id must be a positive integer", "id"),
                state.environment,
            )
        })?;

    match state.loans.find_by_id(id) {
        Ok(Some(loan)) => Ok(Json(loan)),
        Ok(None) => Err(ApiError::new(
            LoanError::not_found("Loan", id),
            state.environment,
        )),
        Err(e) => Err(ApiError::new(e, state.environment)),
    }
}

/// Fallback for unknown routes
async fn route_not_found(method: Method, uri: Uri) -> Response {
    let body = ErrorResponse {
        error: ErrorBody {
            code: "NOT_FOUND",
            message: format!("Route {} {} not found", method, uri.path()),
            details: None,
        },
        request_id: format!("req_{}", uuid::Uuid::new_v4().simple()),
    };

    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

// ============================================================================
// Router
// ============================================================================

fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/loan/approve", post(approve_loan))
        .route("/loan/:id", get(get_loan))
}

/// Build the application router. Routes are served at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(loan_routes())
        .nest("/api", loan_routes())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
