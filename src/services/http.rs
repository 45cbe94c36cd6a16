use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::{
    bank_accounts::BankAccountRequest, pix_keys::PixKeyRequest,
    transactions::TransactionServiceRequest, Application, ServiceError,
};

pub mod bank_accounts;
pub mod pix_keys;
pub mod transactions;

#[derive(Clone)]
pub struct AppState {
    pub bank_account_channel: mpsc::Sender<BankAccountRequest>,
    pub pix_key_channel: mpsc::Sender<PixKeyRequest>,
    pub transaction_channel: mpsc::Sender<TransactionServiceRequest>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Communication(_, _) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "Not found",
            ServiceError::Validation(_) => "Validation error",
            ServiceError::Conflict(_) => "Conflict",
            ServiceError::Database(_) => "Database error",
            ServiceError::Communication(_, _) => "Internal server error",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        (
            status,
            Json(json!({
                "error": self.kind(),
                "details": self.to_string()
            })),
        )
            .into_response()
    }
}

/// Routes of every registered module plus the health check.
pub fn router(application: &Application) -> Router {
    application
        .registry
        .router()
        .route("/health", get(|| async { "OK" }))
        .with_state(application.state.clone())
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(listen: &str, application: Application) -> Result<(), anyhow::Error> {
    let app = router(&application);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Repositories;
    use crate::services::start_services;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app() -> Router {
        let application = start_services(Repositories::in_memory()).await.unwrap();
        router(&application)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    async fn create_bank(app: &Router, code: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/banks",
            Some(json!({"code": code, "name": "test bank"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        body["id"].as_str().unwrap().to_string()
    }

    async fn create_account(app: &Router, number: &str, balance: i64) -> String {
        let bank_id = create_bank(app, &format!("b-{}", number)).await;
        let (status, body) = call(
            app,
            Method::POST,
            "/bank-accounts",
            Some(json!({
                "bank_id": bank_id,
                "account_number": number,
                "owner_name": "Owner",
                "balance_in_cents": balance
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_check() {
        let app = app().await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bank_endpoints() {
        let app = app().await;
        let bank_id = create_bank(&app, "001").await;

        let (status, bank) = call(&app, Method::GET, &format!("/banks/{}", bank_id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bank["code"], "001");

        let (status, _) = call(
            &app,
            Method::POST,
            "/banks",
            Some(json!({"code": "001", "name": "other bank"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            Method::POST,
            "/banks",
            Some(json!({"code": "002", "name": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &app,
            Method::POST,
            "/bank-accounts",
            Some(json!({
                "bank_id": "missing",
                "account_number": "1111-11",
                "owner_name": "Lucas"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, account) = call(
            &app,
            Method::POST,
            "/bank-accounts",
            Some(json!({
                "bank_id": bank_id,
                "account_number": "1111-11",
                "owner_name": "Lucas"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(account["bank_id"], bank_id.as_str());
        assert_eq!(account["balance_in_cents"], 0);

        let (_, banks) = call(&app, Method::GET, "/banks", None).await;
        assert_eq!(banks.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pix_key_endpoints() {
        let app = app().await;
        let account_id = create_account(&app, "1111-11", 0).await;
        let keys_uri = format!("/bank-accounts/{}/pix-keys", account_id);

        let (status, created) = call(
            &app,
            Method::POST,
            &keys_uri,
            Some(json!({"kind": "email", "key": "j@j.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "active");
        assert_eq!(created["bank_account_id"], account_id.as_str());

        let (status, _) = call(
            &app,
            Method::POST,
            &keys_uri,
            Some(json!({"kind": "email", "key": "j@j.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(
            &app,
            Method::POST,
            &keys_uri,
            Some(json!({"kind": "nome", "key": "j@j.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Validation error");

        let (status, listed) = call(&app, Method::GET, &keys_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, exists) = call(&app, Method::GET, "/pix-keys/exists?kind=email&key=j@j.com", None).await;
        assert_eq!(exists["exists"], true);
        let (_, exists) = call(&app, Method::GET, "/pix-keys/exists?kind=email&key=x@j.com", None).await;
        assert_eq!(exists["exists"], false);

        let (status, found) = call(&app, Method::GET, "/pix-keys/email/j@j.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], created["id"]);

        let (status, cpf) = call(
            &app,
            Method::POST,
            &keys_uri,
            Some(json!({"kind": "cpf", "key": "j@j.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(cpf["key"], "j@j.com");

        let (status, deactivated) = call(
            &app,
            Method::DELETE,
            &format!("/pix-keys/{}", created["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deactivated["status"], "inactive");

        let (status, _) = call(&app, Method::GET, "/bank-accounts/missing/pix-keys", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transaction_endpoints() {
        let app = app().await;
        let from = create_account(&app, "1111-11", 10_000).await;
        let to = create_account(&app, "2222-22", 0).await;
        call(
            &app,
            Method::POST,
            &format!("/bank-accounts/{}/pix-keys", to),
            Some(json!({"kind": "cpf", "key": "529.982.247-25"})),
        )
        .await;

        let (status, registered) = call(
            &app,
            Method::POST,
            &format!("/bank-accounts/{}/transactions", from),
            Some(json!({
                "pix_key_kind": "cpf",
                "pix_key": "52998224725",
                "amount_in_cents": 1500,
                "description": "lunch"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["status"], "pending");
        let id = registered["id"].as_str().unwrap();

        let (status, _) = call(&app, Method::POST, &format!("/transactions/{}/complete", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, confirmed) = call(&app, Method::POST, &format!("/transactions/{}/confirm", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(confirmed["status"], "confirmed");

        let (status, completed) = call(&app, Method::POST, &format!("/transactions/{}/complete", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(completed["status"], "completed");

        let (_, account) = call(&app, Method::GET, &format!("/bank-accounts/{}", to), None).await;
        assert_eq!(account["balance_in_cents"], 1500);

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/transactions/{}/cancel", id),
            Some(json!({"description": "changed my mind"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::GET, "/transactions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
