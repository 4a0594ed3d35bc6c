mod acl;
pub mod auth;
mod config;
mod webhook;

use std::collections::HashMap;
use std::sync::Arc;

use crate::server::auth::AuthCtx;
use crate::storage::{StorageError, models};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{Method, StatusCode, header},
    routing::{delete, get, post},
};
use bcrypt::verify;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
pub use config::{AppConfig, DEFAULT_COMMISSION_RATE_PERCENT, UserConfig};
use salesdesk_shared::api;
pub use salesdesk_shared::auth::Role;
use salesdesk_shared::domain::{Amount, ProductLine, Purchase};
use salesdesk_shared::stats::booking::{WeeklySummary, week_range, weekly_summary};
use salesdesk_shared::stats::{commission, leaderboard, mapper, points};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

/// Setting key that gates the booking endpoints.
pub const BOOKING_ENABLED_KEY: &str = "booking_enabled";
/// Default invitation lifetime.
const INVITATION_TTL_HOURS: i64 = 72;

type WeeklyCacheMap = Arc<Mutex<HashMap<String, Arc<Mutex<Option<WeeklySummary>>>>>>;
type WeeklyGuard<'a> = MutexGuard<'a, Option<WeeklySummary>>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
    // Cache of the weekly booking summary per user. None => needs recompute
    weekly_cache: WeeklyCacheMap,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Self {
        Self {
            config,
            store,
            weekly_cache: Default::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    async fn user_mutex(&self, user_id: &str) -> Arc<Mutex<Option<WeeklySummary>>> {
        let mut map = self.weekly_cache.lock().await;
        map.entry(user_id.to_string())
            .or_insert_with(Default::default)
            .clone()
    }

    async fn reset_weekly_status(&self, guard: &mut WeeklyGuard<'_>) {
        guard.take();
    }

    /// Invalidate one user's cached weekly summary without holding its
    /// guard (used when an admin mutates another user's booking).
    async fn invalidate_weekly(&self, user_id: &str) {
        let cell = self.user_mutex(user_id).await;
        cell.lock().await.take();
    }

    /// Shift mutations shift the population of the week itself, so every
    /// cached summary is stale.
    async fn invalidate_all_weekly(&self) {
        let map = self.weekly_cache.lock().await;
        for cell in map.values() {
            cell.lock().await.take();
        }
    }

    async fn weekly_status(
        &self,
        user_id: &str,
        week_start: NaiveDate,
        guard: &mut WeeklyGuard<'_>,
    ) -> Result<WeeklySummary, AppError> {
        if let Some(cached) = guard.as_ref()
            && cached.week_start == week_start
        {
            return Ok(cached.clone());
        }

        // Compute and cache

        let (start, end) = week_range(week_start);
        let shifts = self
            .store
            .list_shifts_between(start, end)
            .await
            .map_err(AppError::storage)?;
        let summary = if shifts.is_empty() {
            // No shifts this week: skip the bookings query entirely.
            weekly_summary(start, 0)
        } else {
            let ids: Vec<i32> = shifts.iter().map(|(s, _)| s.id).collect();
            let total = self
                .store
                .count_confirmed_bookings(user_id, ids)
                .await
                .map_err(AppError::storage)?;
            weekly_summary(start, total)
        };

        **guard = Some(summary.clone());
        Ok(summary)
    }

    /// Config display name first, then a pending invitation's name, then
    /// the raw user id.
    async fn resolve_display_name(&self, user_id: &str) -> String {
        if let Some(user) = self.config.user(user_id) {
            return user.display_name.clone();
        }
        match self.store.pending_display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => user_id.to_string(),
            Err(e) => {
                tracing::warn!(user_id, error=%e, "display name lookup failed");
                user_id.to_string()
            }
        }
    }

    async fn booking_system_enabled(&self) -> Result<bool, AppError> {
        let setting = self
            .store
            .get_setting(BOOKING_ENABLED_KEY)
            .await
            .map_err(AppError::storage)?;
        Ok(setting.map(|s| s.value != "false").unwrap_or(true))
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let private = Router::new()
        .route("/api/v1/auth/logout", post(api_auth_logout))
        .route("/api/v1/purchases", get(api_list_purchases))
        .route("/api/v1/purchases/verify", post(api_verify_payments))
        .route("/api/v1/stats/leaderboard", get(api_leaderboard))
        .route("/api/v1/stats/points", get(api_my_points))
        .route("/api/v1/stats/salary", get(api_salary))
        .route("/api/v1/shifts", get(api_list_shifts).post(api_create_shift))
        .route("/api/v1/shifts/{id}", delete(api_delete_shift))
        .route(
            "/api/v1/shifts/{id}/bookings",
            get(api_list_shift_bookings).post(api_book_shift),
        )
        .route("/api/v1/bookings/{id}/cancel", post(api_cancel_booking))
        .route("/api/v1/bookings/weekly-status", get(api_weekly_status))
        .route(
            "/api/v1/invitations",
            get(api_list_invitations).post(api_create_invitation),
        )
        .route(
            "/api/v1/challenges",
            get(api_list_challenges).post(api_create_challenge),
        )
        .route("/api/v1/challenges/active", get(api_active_challenge))
        .route(
            "/api/v1/settings/{key}",
            get(api_get_setting).put(api_put_setting),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            acl::enforce_acl,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ))
        .layer(middleware::from_fn(set_auth_span_fields));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            username = tracing::field::Empty,
            role = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/auth/login", post(api_auth_login))
        .merge(private)
        .merge(webhook::router())
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured

    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    // Put into request extensions for trace layer & handlers
    req.extensions_mut().insert(ReqId(rid.clone()));
    // Call next
    let mut resp = next.run(req).await;
    // Set header on response
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    // General security headers for all responses
    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    // HSTS is only honored on HTTPS; harmless otherwise
    headers.insert(
        HeaderName::from_static("strict-transport-security"),
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    // Disable caching for API and health endpoints
    if path == "/healthz" || path.starts_with("/api/") || path == "/api" {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
        headers.insert(
            HeaderName::from_static("expires"),
            HeaderValue::from_static("0"),
        );
    }

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        let span = Span::current();
        span.record("username", tracing::field::display(auth.username()));
        span.record("role", tracing::field::debug(auth.role()));
    }
    Ok(next.run(req).await)
}

fn utc(at: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(at, Utc)
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date: {s}")))
}

fn day_start(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

fn day_end(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// Reassemble the domain purchase shape from its storage rows. Line items
/// and the absent-list legacy shape collapse to the same storage layout, so
/// an empty item list maps back to `products: None`.
fn purchase_to_domain(row: models::Purchase, items: Vec<models::PurchaseProduct>) -> Purchase {
    let products = if items.is_empty() {
        None
    } else {
        Some(
            items
                .into_iter()
                .map(|i| ProductLine {
                    name: i.name,
                    quantity: i.quantity,
                })
                .collect(),
        )
    };
    Purchase {
        id: row.id,
        purchased_at: utc(row.purchased_at),
        amount: Amount::Text(row.amount),
        user_display_name: row.user_display_name,
        payment_type: row.payment_type,
        products,
        product_name: row.product_name,
        quantity: row.quantity,
        refunded: row.refunded,
        refund_uuid: row.refund_uuid,
        refund_timestamp: row.refund_timestamp.map(utc),
    }
}

#[derive(Deserialize)]
struct DateRangeOpts {
    from: Option<String>,
    to: Option<String>,
}

impl DateRangeOpts {
    fn parsed(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), AppError> {
        let from = self.from.as_deref().map(parse_date).transpose()?;
        let to = self.to.as_deref().map(parse_date).transpose()?;
        Ok((from, to))
    }
}

async fn api_auth_login(
    State(state): State<AppState>,
    Json(body): Json<api::AuthReq>,
) -> Result<Json<api::AuthResp>, AppError> {
    // Find user in config
    let user = state.config.user(&body.username).ok_or_else(|| {
        tracing::warn!(username=%body.username, "login: unknown username");
        AppError::unauthorized()
    })?;
    if !verify(&body.password, &user.password_hash).map_err(|e| {
        tracing::error!(username=%body.username, error=%e, "login: bcrypt verify failed");
        AppError::internal(e)
    })? {
        tracing::warn!(username=%body.username, "login: invalid password");
        return Err(AppError::unauthorized());
    }
    let token = auth::issue_jwt_for_user(&state, &user.username).await?;
    Ok(Json(api::AuthResp { token }))
}

async fn api_auth_logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete_session(&auth.claims.jti)
        .await
        .map_err(AppError::storage)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_list_purchases(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Query(opts): Query<DateRangeOpts>,
) -> Result<Json<Vec<api::PurchaseDto>>, AppError> {
    let (from, to) = opts.parsed()?;
    let rows = state
        .store
        .list_purchases(from.map(day_start), to.map(day_end))
        .await
        .map_err(AppError::storage)?;
    let items = rows
        .into_iter()
        .map(|(row, items)| {
            let verified = row.verified;
            let p = purchase_to_domain(row, items);
            let rec = mapper::to_sale_record(&p);
            api::PurchaseDto {
                id: p.id,
                timestamp: rec.timestamp.to_rfc3339(),
                amount: rec.amount,
                user_display_name: rec.user_display_name,
                payment_type: rec.payment_type,
                product_name: rec.product_name,
                refunded: p.refunded,
                verified,
            }
        })
        .collect();
    Ok(Json(items))
}

async fn api_verify_payments(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Json(body): Json<api::VerifyPaymentsReq>,
) -> Result<Json<api::VerifyPaymentsResp>, AppError> {
    let updated = state
        .store
        .set_verified(body.purchase_ids)
        .await
        .map_err(AppError::storage)?;
    Ok(Json(api::VerifyPaymentsResp { updated }))
}

fn entry_dto(entry: leaderboard::LeaderboardEntry) -> api::LeaderboardEntryDto {
    api::LeaderboardEntryDto {
        user_display_name: entry.user_display_name,
        value: entry.value,
    }
}

async fn api_leaderboard(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Query(opts): Query<DateRangeOpts>,
) -> Result<Json<api::LeaderboardDto>, AppError> {
    let (from, to) = opts.parsed()?;
    let rows = state
        .store
        .list_purchases(from.map(day_start), to.map(day_end))
        .await
        .map_err(AppError::storage)?;
    let purchases: Vec<Purchase> = rows
        .into_iter()
        .map(|(row, items)| purchase_to_domain(row, items))
        .collect();
    let now = Utc::now();
    let tz = state.config.reporting_tz();
    Ok(Json(api::LeaderboardDto {
        top_seller: entry_dto(leaderboard::top_seller(&purchases)),
        highest_sale: entry_dto(leaderboard::highest_sale(&purchases)),
        top_average_value: entry_dto(leaderboard::top_average_value(&purchases)),
        top_presence: entry_dto(leaderboard::top_presence(&purchases, now, tz)),
    }))
}

async fn api_my_points(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::PointsDto>, AppError> {
    let name = state.resolve_display_name(auth.username()).await;
    let rows = state
        .store
        .list_purchases_for_seller(&name, None)
        .await
        .map_err(AppError::storage)?;
    let purchases: Vec<Purchase> = rows
        .into_iter()
        .map(|(row, items)| purchase_to_domain(row, items))
        .collect();
    Ok(Json(api::PointsDto {
        user_display_name: name,
        total_points: points::total_points(&purchases),
    }))
}

#[derive(Deserialize)]
struct SalaryOpts {
    from: String,
    to: String,
}

async fn api_salary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Query(opts): Query<SalaryOpts>,
) -> Result<Json<api::SalaryDto>, AppError> {
    let from = parse_date(&opts.from)?;
    let to = parse_date(&opts.to)?;
    if to < from {
        return Err(AppError::bad_request("period end before period start"));
    }
    let name = state.resolve_display_name(auth.username()).await;
    let rows = state
        .store
        .list_purchases_for_seller(&name, Some(day_end(to)))
        .await
        .map_err(AppError::storage)?;
    let sales: Vec<_> = rows
        .into_iter()
        .map(|(row, items)| mapper::to_sale_record(&purchase_to_domain(row, items)))
        .collect();

    let period_start = utc(day_start(from));
    let period_end = utc(day_end(to));
    let period_total: f64 = sales
        .iter()
        .filter(|s| s.timestamp >= period_start && s.timestamp <= period_end)
        .map(|s| s.amount)
        .sum();
    let accumulated = commission::accumulated_sales(&sales, &name, period_end);
    let base_rate = state
        .config
        .user(auth.username())
        .map(|u| u.commission_rate())
        .unwrap_or(DEFAULT_COMMISSION_RATE_PERCENT);

    Ok(Json(api::SalaryDto {
        period_start: from.to_string(),
        period_end: to.to_string(),
        period_total,
        accumulated_sales: accumulated,
        base_rate_percent: base_rate,
        commission: commission::commission(period_total, base_rate, accumulated),
    }))
}

fn shift_dto(shift: models::Shift, booked_slots: i64) -> api::ShiftDto {
    api::ShiftDto {
        id: shift.id,
        date: shift.shift_date.to_string(),
        start_time: shift.start_time,
        end_time: shift.end_time,
        available_slots: shift.available_slots,
        booked_slots,
        created_by: shift.created_by,
    }
}

async fn api_list_shifts(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Query(opts): Query<DateRangeOpts>,
) -> Result<Json<Vec<api::ShiftDto>>, AppError> {
    let (from, to) = opts.parsed()?;
    let today = Utc::now().with_timezone(&state.config.reporting_tz()).date_naive();
    let (week_start, week_end) = week_range(today);
    let rows = state
        .store
        .list_shifts_between(from.unwrap_or(week_start), to.unwrap_or(week_end))
        .await
        .map_err(AppError::storage)?;
    Ok(Json(
        rows.into_iter().map(|(s, n)| shift_dto(s, n)).collect(),
    ))
}

async fn api_create_shift(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Json(body): Json<api::CreateShiftReq>,
) -> Result<Json<api::ShiftDto>, AppError> {
    let date = parse_date(&body.date)?;
    let shift = state
        .store
        .create_shift(
            date,
            &body.start_time,
            &body.end_time,
            body.available_slots,
            auth.username(),
        )
        .await
        .map_err(AppError::storage)?;
    state.invalidate_all_weekly().await;
    Ok(Json(shift_dto(shift, 0)))
}

async fn api_delete_shift(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .store
        .delete_shift(id)
        .await
        .map_err(AppError::storage)?;
    if !deleted {
        return Err(AppError::not_found(format!("shift not found: {id}")));
    }
    state.invalidate_all_weekly().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn booking_dto(state: &AppState, booking: models::ShiftBooking) -> api::BookingDto {
    let display = state.resolve_display_name(&booking.user_id).await;
    api::BookingDto {
        id: booking.id,
        shift_id: booking.shift_id,
        user_id: booking.user_id,
        user_display_name: display,
        status: booking.status,
        created_at: utc(booking.created_at).to_rfc3339(),
    }
}

async fn api_list_shift_bookings(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<api::BookingDto>>, AppError> {
    if state
        .store
        .get_shift(id)
        .await
        .map_err(AppError::storage)?
        .is_none()
    {
        return Err(AppError::not_found(format!("shift not found: {id}")));
    }
    let rows = state
        .store
        .list_bookings_for_shift(id)
        .await
        .map_err(AppError::storage)?;
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(booking_dto(&state, row).await);
    }
    Ok(Json(items))
}

async fn api_book_shift(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<i32>,
) -> Result<Json<api::BookingDto>, AppError> {
    if !state.booking_system_enabled().await? {
        return Err(AppError::conflict("booking system is disabled"));
    }
    // Invalidate this user's weekly summary under its lock
    let cell = state.user_mutex(auth.username()).await;
    let mut guard = cell.lock().await;
    state.reset_weekly_status(&mut guard).await;

    let booking = state
        .store
        .create_booking(id, auth.username())
        .await
        .map_err(AppError::storage)?;
    Ok(Json(booking_dto(&state, booking).await))
}

async fn api_cancel_booking(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<i32>,
) -> Result<Json<api::BookingDto>, AppError> {
    // Admins may cancel anyone's booking; staff only their own.
    let owner = match auth.role() {
        Role::Admin => None,
        Role::Staff => Some(auth.username()),
    };
    let booking = state
        .store
        .cancel_booking(id, owner)
        .await
        .map_err(AppError::storage)?;
    state.invalidate_weekly(&booking.user_id).await;
    Ok(Json(booking_dto(&state, booking).await))
}

#[derive(Deserialize)]
struct WeeklyStatusOpts {
    week_start: Option<String>,
}

async fn api_weekly_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Query(opts): Query<WeeklyStatusOpts>,
) -> Result<Json<api::WeeklyStatusDto>, AppError> {
    let day = match opts.week_start.as_deref() {
        Some(s) => parse_date(s)?,
        None => Utc::now().with_timezone(&state.config.reporting_tz()).date_naive(),
    };
    let (week_start, _) = week_range(day);

    let cell = state.user_mutex(auth.username()).await;
    let mut guard = cell.lock().await;
    let summary = state
        .weekly_status(auth.username(), week_start, &mut guard)
        .await?;
    Ok(Json(api::WeeklyStatusDto {
        week_start: summary.week_start.to_string(),
        week_end: summary.week_end.to_string(),
        total_bookings: summary.total_bookings,
        meets_minimum_requirement: summary.meets_minimum_requirement,
    }))
}

fn invitation_dto(inv: models::Invitation) -> api::InvitationDto {
    api::InvitationDto {
        id: inv.id,
        code: inv.code,
        display_name: inv.display_name,
        status: inv.status,
        expires_at: utc(inv.expires_at).to_rfc3339(),
        created_at: utc(inv.created_at).to_rfc3339(),
    }
}

async fn api_list_invitations(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::InvitationDto>>, AppError> {
    let rows = state
        .store
        .list_invitations()
        .await
        .map_err(AppError::storage)?;
    Ok(Json(rows.into_iter().map(invitation_dto).collect()))
}

async fn api_create_invitation(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Json(body): Json<api::CreateInvitationReq>,
) -> Result<Json<api::InvitationDto>, AppError> {
    let hours = body.expires_in_hours.unwrap_or(INVITATION_TTL_HOURS);
    if hours <= 0 {
        return Err(AppError::bad_request("expires_in_hours must be positive"));
    }
    let code = Uuid::new_v4().simple().to_string()[..8].to_string();
    let expires_at = (Utc::now() + Duration::hours(hours)).naive_utc();
    let inv = state
        .store
        .create_invitation(&code, body.display_name.as_deref(), expires_at)
        .await
        .map_err(AppError::storage)?;
    Ok(Json(invitation_dto(inv)))
}

fn challenge_dto(ch: models::Challenge) -> api::ChallengeDto {
    api::ChallengeDto {
        id: ch.id,
        name: ch.name,
        kind: ch.kind,
        starts_on: ch.starts_on.to_string(),
        ends_on: ch.ends_on.to_string(),
        reward_amount: ch.reward_amount,
    }
}

async fn api_list_challenges(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::ChallengeDto>>, AppError> {
    let rows = state
        .store
        .list_challenges()
        .await
        .map_err(AppError::storage)?;
    Ok(Json(rows.into_iter().map(challenge_dto).collect()))
}

async fn api_create_challenge(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Json(body): Json<api::CreateChallengeReq>,
) -> Result<Json<api::ChallengeDto>, AppError> {
    let kind: salesdesk_shared::domain::ChallengeKind = body
        .kind
        .parse()
        .map_err(|e: String| AppError::bad_request(e))?;
    let starts_on = parse_date(&body.starts_on)?;
    let ends_on = parse_date(&body.ends_on)?;
    let ch = state
        .store
        .create_challenge(&body.name, kind.as_str(), starts_on, ends_on, body.reward_amount)
        .await
        .map_err(AppError::storage)?;
    Ok(Json(challenge_dto(ch)))
}

#[derive(Deserialize)]
struct ActiveChallengeOpts {
    kind: String,
    on: Option<String>,
}

async fn api_active_challenge(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Query(opts): Query<ActiveChallengeOpts>,
) -> Result<Json<Option<api::ChallengeDto>>, AppError> {
    let kind: salesdesk_shared::domain::ChallengeKind = opts
        .kind
        .parse()
        .map_err(|e: String| AppError::bad_request(e))?;
    let on = match opts.on.as_deref() {
        Some(s) => parse_date(s)?,
        None => Utc::now().with_timezone(&state.config.reporting_tz()).date_naive(),
    };
    let ch = state
        .store
        .active_challenge(kind.as_str(), on)
        .await
        .map_err(AppError::storage)?;
    Ok(Json(ch.map(challenge_dto)))
}

async fn api_get_setting(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(key): Path<String>,
) -> Result<Json<api::SettingDto>, AppError> {
    let setting = state
        .store
        .get_setting(&key)
        .await
        .map_err(AppError::storage)?
        .ok_or_else(|| AppError::not_found(format!("setting not found: {key}")))?;
    Ok(Json(api::SettingDto {
        key: setting.key,
        value: setting.value,
    }))
}

async fn api_put_setting(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(key): Path<String>,
    Json(body): Json<api::UpdateSettingReq>,
) -> Result<Json<api::SettingDto>, AppError> {
    let setting = state
        .store
        .set_setting(&key, &body.value)
        .await
        .map_err(AppError::storage)?;
    Ok(Json(api::SettingDto {
        key: setting.key,
        value: setting.value,
    }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn unauthorized() -> Self {
        Self::Unauthorized
    }
    fn forbidden() -> Self {
        Self::Forbidden
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }

    fn storage(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(msg) => Self::NotFound(msg),
            StorageError::Conflict(msg) => Self::Conflict(msg),
            StorageError::InvalidInput(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized".into(),
                "unauthorized",
                None,
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".into(), "forbidden", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m, "conflict", None),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        // Log any error responses at ERROR level for troubleshooting
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else {
            tracing::error!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}
