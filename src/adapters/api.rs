use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{
            id::{InvoiceId, UserId},
            money::Asset,
        },
        services::reconciler::ReconcileOutcome,
    },
    axum::{
        Json, Router,
        extract::{DefaultBodyLimit, Path, State},
        routing::{delete, get, post},
    },
    serde::Deserialize,
    serde_json::{Value, json},
    std::time::Duration,
    tower_http::timeout::TimeoutLayer,
};

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/topups", post(start_top_up))
        .route("/topups/{user_id}", delete(cancel_top_up))
        .route("/topups/{user_id}/amount", post(submit_amount))
        .route("/payments/{invoice_id}/check", post(check_payment))
        .route("/users/{user_id}/balance", get(balance))
        .route("/users/{user_id}/payments", get(payment_history))
        .layer(DefaultBodyLimit::max(16 * 1024))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct StartTopUpBody {
    pub user_id: i64,
    pub asset: String,
    #[serde(default)]
    pub name_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAmountBody {
    /// Raw user input; a comma decimal separator is accepted.
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckPaymentBody {
    pub user_id: i64,
}

#[tracing::instrument(name = "start_top_up", skip_all, fields(user_id = body.user_id))]
async fn start_top_up(
    State(state): State<AppState>,
    Json(body): Json<StartTopUpBody>,
) -> Result<Json<Value>, ApiError> {
    let user_id = UserId::new(body.user_id);
    let asset = Asset::try_from(body.asset.as_str())?;
    state
        .topups
        .register_user(user_id, body.name_tag.as_deref())
        .await?;
    let session_id = state.topups.start_top_up(user_id, asset).await;

    Ok(Json(json!({
        "session_id": session_id,
        "asset": asset,
    })))
}

#[tracing::instrument(name = "submit_amount", skip_all, fields(%user_id))]
async fn submit_amount(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<SubmitAmountBody>,
) -> Result<Json<Value>, ApiError> {
    let invoice = state
        .topups
        .submit_amount(UserId::new(user_id), &body.amount)
        .await?;

    Ok(Json(json!({
        "invoice_id": invoice.invoice_id,
        "asset": invoice.asset,
        "amount": invoice.amount.to_string(),
        "pay_url": invoice.payment_url(),
        "expires_at": invoice.expiration_date,
    })))
}

async fn cancel_top_up(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<Value> {
    let cancelled = state.topups.cancel_top_up(UserId::new(user_id)).await;
    Json(json!({ "cancelled": cancelled }))
}

#[tracing::instrument(name = "check_payment", skip_all, fields(%invoice_id))]
async fn check_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<i64>,
    Json(body): Json<CheckPaymentBody>,
) -> Result<Json<Value>, ApiError> {
    let invoice_id = InvoiceId::new(invoice_id)?;
    let outcome = state
        .topups
        .check_payment(invoice_id, UserId::new(body.user_id))
        .await?;

    let settled_now = matches!(
        outcome,
        ReconcileOutcome::Credited(_) | ReconcileOutcome::Closed(_)
    );
    Ok(Json(json!({
        "invoice_id": invoice_id,
        "status": outcome.status(),
        "settled_now": settled_now,
    })))
}

async fn balance(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let balance = state.topups.balance(UserId::new(user_id)).await?;
    Ok(Json(json!({ "user_id": user_id, "balance": balance })))
}

async fn payment_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let payments = state.topups.payment_history(UserId::new(user_id)).await?;
    Ok(Json(json!({ "user_id": user_id, "payments": payments })))
}
