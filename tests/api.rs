#![cfg(feature = "server")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bank_loans::api::{router, AppState};
use bank_loans::{setup_database, Environment, LoanRepository};
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

fn seeded_app(environment: Environment) -> Router {
    router(AppState::new(LoanRepository::new(seeded_connection()), environment))
}

/// Loan 2 carries a status the application does not know
fn app_with_unknown_status(environment: Environment) -> Router {
    let conn = seeded_connection();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         UPDATE loans SET status = 'archived' WHERE loan_id = 2;",
    )
    .unwrap();
    router(AppState::new(LoanRepository::new(conn), environment))
}

fn seeded_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO customers (customer_id, first_name, last_name, email, customer_since, status)
         VALUES (1, 'John', 'Doe', 'john.doe@example.com', '2024-01-01', 'active');

         INSERT INTO loans (loan_id, customer_id, loan_amount, interest_rate, term_months, status, application_date)
         VALUES (1, 1, 50000, 5.5, 60, 'pending', '2024-01-15');

         INSERT INTO loans (loan_id, customer_id, loan_amount, interest_rate, term_months, status, application_date)
         VALUES (2, 1, 100000, 4.5, 120, 'pending', '2024-01-16');

         INSERT INTO loans (loan_id, customer_id, loan_amount, interest_rate, term_months, status, application_date, approval_date, approved_by)
         VALUES (3, 1, 25000, 6.0, 36, 'approved', '2024-01-17', '2024-01-18', 'admin@bank.com');",
    )
    .unwrap();
    conn
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(text)
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn approve(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/loan/approve", Some(body.to_string())).await
}

fn assert_validation_error(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn approves_a_pending_loan() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({ "loanId": 1, "approved": true, "approvedBy": "john.doe@bank.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loanId"], 1);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["approvedBy"], "john.doe@bank.com");
    assert!(body["approvalDate"].is_string());
    assert!(body.get("rejectionReason").is_none());
}

#[tokio::test]
async fn rejects_a_pending_loan_with_reason() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({
            "loanId": 2,
            "approved": false,
            "approvedBy": "jane.smith@bank.com",
            "rejectionReason": "Insufficient credit score"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loanId"], 2);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["approvedBy"], "jane.smith@bank.com");
    assert_eq!(body["rejectionReason"], "Insufficient credit score");
    assert!(body["approvalDate"].is_string());
}

#[tokio::test]
async fn missing_or_malformed_fields_are_validation_errors() {
    let app = seeded_app(Environment::Test);

    let cases = [
        json!({ "approved": true, "approvedBy": "test@bank.com" }),
        json!({ "loanId": "not-a-number", "approved": true, "approvedBy": "test@bank.com" }),
        json!({ "loanId": 1, "approvedBy": "test@bank.com" }),
        json!({ "loanId": 1, "approved": "true", "approvedBy": "test@bank.com" }),
        json!({ "loanId": 1, "approved": true }),
        json!({ "loanId": 1, "approved": true, "approvedBy": "" }),
    ];

    for case in cases {
        let (status, body) = approve(&app, case).await;
        assert_validation_error(status, &body);
    }

    // Nothing was written by the failed requests
    let (_, loan) = send(&app, Method::GET, "/loan/1", None).await;
    assert_eq!(loan["status"], "pending");
}

#[tokio::test]
async fn rejection_without_reason_is_refused() {
    let app = seeded_app(Environment::Test);

    for reason in [None, Some("   ")] {
        let mut request = json!({ "loanId": 1, "approved": false, "approvedBy": "test@bank.com" });
        if let Some(reason) = reason {
            request["rejectionReason"] = json!(reason);
        }

        let (status, body) = approve(&app, request).await;
        assert_validation_error(status, &body);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("rejectionReason is required"));
    }
}

#[tokio::test]
async fn unknown_loan_is_not_found() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({ "loanId": 9999, "approved": true, "approvedBy": "test@bank.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Loan with ID 9999 not found");
}

#[tokio::test]
async fn already_decided_loan_cannot_be_approved() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({ "loanId": 3, "approved": true, "approvedBy": "test@bank.com" }),
    )
    .await;

    assert_validation_error(status, &body);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Only pending loans can be approved"));
    assert!(message.contains("'approved'"));
}

#[tokio::test]
async fn second_decision_on_same_loan_fails() {
    let app = seeded_app(Environment::Test);

    let (status, _) = approve(
        &app,
        json!({ "loanId": 1, "approved": true, "approvedBy": "first@bank.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = approve(
        &app,
        json!({
            "loanId": 1,
            "approved": false,
            "approvedBy": "second@bank.com",
            "rejectionReason": "Too late"
        }),
    )
    .await;
    assert_validation_error(status, &body);
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let truncated = Some("{\"loanId\": 1,".to_string());

    let dev = seeded_app(Environment::Development);
    let (status, body) = send(&dev, Method::POST, "/loan/approve", truncated.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_JSON");
    assert_eq!(body["error"]["message"], "Invalid JSON in request body");
    assert!(body["error"]["details"]["message"].is_string());

    let prod = seeded_app(Environment::Production);
    let (status, body) = send(&prod, Method::POST, "/loan/approve", truncated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid JSON in request body");
    assert!(body["error"].get("details").is_none());
}

#[tokio::test]
async fn integral_float_loan_id_is_accepted() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({ "loanId": 1.0, "approved": true, "approvedBy": "john.doe@bank.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loanId"], 1);
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn negative_loan_id_reaches_storage_and_is_not_found() {
    let app = seeded_app(Environment::Test);

    let (status, body) = approve(
        &app,
        json!({ "loanId": -4, "approved": true, "approvedBy": "test@bank.com" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Loan with ID -4 not found");
}

#[tokio::test]
async fn storage_faults_are_server_errors() {
    let request = json!({ "loanId": 2, "approved": true, "approvedBy": "ops@bank.com" });

    let dev = app_with_unknown_status(Environment::Development);
    for (status, body) in [
        send(&dev, Method::GET, "/loan/2", None).await,
        approve(&dev, request.clone()).await,
    ] {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {}", body);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
        assert_eq!(body["error"]["details"]["name"], "DatabaseError");
        assert!(body["error"]["details"]["message"].is_string());
        assert!(!body["error"]["details"]["causes"].as_array().unwrap().is_empty());
    }

    let prod = app_with_unknown_status(Environment::Production);
    for (status, body) in [
        send(&prod, Method::GET, "/loan/2", None).await,
        approve(&prod, request.clone()).await,
    ] {
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
        assert_eq!(body["error"]["message"], "An unexpected error occurred");
        assert!(body["error"].get("details").is_none());
        assert!(body["requestId"].is_string());
    }
}

#[tokio::test]
async fn details_are_hidden_in_production() {
    let dev = seeded_app(Environment::Development);
    let prod = seeded_app(Environment::Production);
    let request = json!({ "loanId": 1, "approved": true, "approvedBy": " " });

    let (_, body) = approve(&dev, request.clone()).await;
    assert_eq!(body["error"]["details"]["name"], "ValidationError");
    assert_eq!(body["error"]["details"]["field"], "approvedBy");
    assert!(body["requestId"].as_str().unwrap().starts_with("req_"));

    let (status, body) = approve(&prod, request).await;
    assert_validation_error(status, &body);
    assert!(body["error"].get("details").is_none());
    assert!(body["requestId"].is_string());
}

#[tokio::test]
async fn loan_lookup_and_api_prefix() {
    let app = seeded_app(Environment::Test);

    let (status, body) = send(&app, Method::GET, "/api/loan/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["approvedBy"], "admin@bank.com");

    let (status, body) = send(&app, Method::GET, "/loan/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&app, Method::GET, "/loan/abc", None).await;
    assert_validation_error(status, &body);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/loan/approve",
        Some(json!({ "loanId": 2, "approved": true, "approvedBy": "ops@bank.com" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = seeded_app(Environment::Test);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/accounts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Route GET /accounts not found");
}
