use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::{Json, Router, extract::State, routing::post};
use chrono::DateTime;
use salesdesk_shared::api::{InvitationEventReq, PurchaseEventReq, WebhookResp};
use salesdesk_shared::domain::{Amount, InvitationStatus};
use tower_http::cors::{Any, CorsLayer};

use super::AppState;
use crate::storage::{PurchaseInsert, StorageError};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type WebhookResult = (StatusCode, Json<WebhookResp>);

/// Externally-facing ingestion endpoints. These speak the provider's
/// `{success, message}` envelope instead of the API error shape, and accept
/// cross-origin calls (the provider's infrastructure sends preflights).
pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(SIGNATURE_HEADER),
        ]);
    Router::new()
        .route("/api/v1/webhooks/purchases", post(webhook_purchases))
        .route("/api/v1/webhooks/invitations", post(webhook_invitations))
        .layer(cors)
}

fn respond(status: StatusCode, success: bool, message: impl Into<String>) -> WebhookResult {
    (
        status,
        Json(WebhookResp {
            success,
            message: message.into(),
        }),
    )
}

fn check_signature(state: &AppState, headers: &HeaderMap) -> Result<(), WebhookResult> {
    let Some(value) = headers.get(SIGNATURE_HEADER) else {
        return Err(respond(
            StatusCode::UNAUTHORIZED,
            false,
            "missing webhook signature",
        ));
    };
    if let Some(secret) = &state.config.webhook_secret {
        let provided = value.to_str().unwrap_or_default();
        if provided != secret {
            return Err(respond(
                StatusCode::UNAUTHORIZED,
                false,
                "invalid webhook signature",
            ));
        }
    }
    Ok(())
}

async fn webhook_purchases(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PurchaseEventReq>,
) -> WebhookResult {
    if let Err(resp) = check_signature(&state, &headers) {
        return resp;
    }
    let Ok(timestamp) = DateTime::parse_from_rfc3339(&body.timestamp) else {
        return respond(StatusCode::BAD_REQUEST, false, "invalid timestamp");
    };
    let at = timestamp.naive_utc();

    if let Some(original) = body.refund_uuid.as_deref() {
        return match state
            .store
            .mark_refunded(original, &body.purchase_uuid, at)
            .await
        {
            Ok(true) => respond(StatusCode::OK, true, "refund recorded"),
            Ok(false) => respond(StatusCode::NOT_FOUND, false, "unknown original purchase"),
            Err(e) => {
                tracing::error!(error=%e, purchase=%body.purchase_uuid, "webhook: refund failed");
                respond(StatusCode::INTERNAL_SERVER_ERROR, false, "internal error")
            }
        };
    }

    let amount_raw = match &body.amount {
        Amount::Text(s) => s.clone(),
        Amount::Number(n) => n.to_string(),
    };
    let rec = PurchaseInsert {
        id: body.purchase_uuid.clone(),
        purchased_at: at,
        amount: amount_raw,
        user_display_name: body.user_display_name.clone(),
        payment_type: body.payment_type.clone(),
        product_name: body.product_name.clone(),
        quantity: body.quantity,
        products: body
            .products
            .unwrap_or_default()
            .into_iter()
            .map(|p| (p.name, p.quantity))
            .collect(),
    };
    match state.store.insert_purchase(rec).await {
        Ok(true) => respond(StatusCode::OK, true, "purchase recorded"),
        Ok(false) => respond(StatusCode::OK, true, "duplicate purchase ignored"),
        Err(e) => {
            tracing::error!(error=%e, purchase=%body.purchase_uuid, "webhook: insert failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, false, "internal error")
        }
    }
}

async fn webhook_invitations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InvitationEventReq>,
) -> WebhookResult {
    if let Err(resp) = check_signature(&state, &headers) {
        return resp;
    }
    let status: InvitationStatus = match body.status.parse() {
        Ok(InvitationStatus::Pending) | Err(_) => {
            return respond(StatusCode::BAD_REQUEST, false, "invalid target status");
        }
        Ok(s) => s,
    };
    match state.store.set_invitation_status(&body.code, status).await {
        Ok(inv) if inv.status == status.as_str() => {
            respond(StatusCode::OK, true, format!("invitation {}", inv.status))
        }
        // The invitation lapsed before the event arrived; the row is now
        // persisted as expired.
        Ok(_) => respond(StatusCode::CONFLICT, false, "invitation expired"),
        Err(StorageError::NotFound(msg)) => respond(StatusCode::NOT_FOUND, false, msg),
        Err(StorageError::Conflict(msg)) => respond(StatusCode::CONFLICT, false, msg),
        Err(e) => {
            tracing::error!(error=%e, code=%body.code, "webhook: invitation update failed");
            respond(StatusCode::INTERNAL_SERVER_ERROR, false, "internal error")
        }
    }
}
