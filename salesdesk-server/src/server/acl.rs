use super::{AppError, AppState, auth::AuthCtx};
use axum::response::Response;
use axum::{
    extract::{OriginalUri, State},
    http::{Method, Request},
    middleware::Next,
};
use salesdesk_shared::auth::Role;

pub async fn enforce_acl(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized());
    };

    let segs = segmented(&path);
    let api_prefix = ["api", "v1"];
    if !segs.as_slice().starts_with(&api_prefix) {
        tracing::warn!(?segs, "ACL: path outside API scope");
        return Err(AppError::forbidden());
    }
    let rest = &segs[api_prefix.len()..];

    let decision = match auth.role() {
        Role::Admin => allow_admin(&method, rest),
        Role::Staff => allow_staff(&method, rest),
    };

    if let Err(err) = decision {
        tracing::warn!(
            method = %method,
            path = %path,
            username = %auth.username(),
            role = ?auth.role(),
            "ACL: no rule matched; denying"
        );
        return Err(err);
    }

    Ok(next.run(req).await)
}

fn allow_admin(method: &Method, rest: &[&str]) -> Result<(), AppError> {
    // Admins hold every staff permission plus management endpoints.
    if allow_staff(method, rest).is_ok() {
        return Ok(());
    }
    match rest {
        ["purchases", "verify"] if *method == Method::POST => Ok(()),
        ["shifts"] if *method == Method::POST => Ok(()),
        ["shifts", id] if *method == Method::DELETE && id.parse::<i32>().is_ok() => Ok(()),
        ["shifts", id, "bookings"] if *method == Method::GET && id.parse::<i32>().is_ok() => Ok(()),
        ["invitations"] if *method == Method::GET || *method == Method::POST => Ok(()),
        ["challenges"] if *method == Method::GET || *method == Method::POST => Ok(()),
        ["settings", _] if *method == Method::PUT => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}

fn allow_staff(method: &Method, rest: &[&str]) -> Result<(), AppError> {
    match rest {
        ["auth", "logout"] if *method == Method::POST => Ok(()),
        ["purchases"] if *method == Method::GET => Ok(()),
        ["stats", "leaderboard"] if *method == Method::GET => Ok(()),
        ["stats", "points"] if *method == Method::GET => Ok(()),
        ["stats", "salary"] if *method == Method::GET => Ok(()),
        ["shifts"] if *method == Method::GET => Ok(()),
        ["shifts", id, "bookings"] if *method == Method::POST && id.parse::<i32>().is_ok() => {
            Ok(())
        }
        ["bookings", id, "cancel"] if *method == Method::POST && id.parse::<i32>().is_ok() => {
            Ok(())
        }
        ["bookings", "weekly-status"] if *method == Method::GET => Ok(()),
        ["challenges", "active"] if *method == Method::GET => Ok(()),
        ["settings", _] if *method == Method::GET => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}

fn segmented(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
