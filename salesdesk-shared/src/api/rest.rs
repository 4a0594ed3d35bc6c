//! Minimal REST client helpers for consumers (dashboards, scripts).
//! Feature-gated by `rest-client` to avoid pulling reqwest into the server.

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(180)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(180))
        .timeout(Duration::from_secs(180))
        .build()
        .expect("failed to build HTTP client")
});

fn mk_client() -> Result<reqwest::Client, RestError> {
    Ok(HTTP_CLIENT.clone())
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

pub async fn login(base: &str, req: &AuthReq) -> Result<AuthResp, RestError> {
    let client = mk_client()?;
    let url = ep::auth_login(base);
    let res = client
        .post(url)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn logout(base: &str, bearer: &str) -> Result<(), RestError> {
    let client = mk_client()?;
    let url = ep::auth_logout(base);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    if res.status().is_success() {
        Ok(())
    } else {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(RestError::Status { status, body })
    }
}

pub async fn list_purchases(
    base: &str,
    bearer: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Vec<PurchaseDto>, RestError> {
    let client = mk_client()?;
    let url = ep::purchases(base);
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(from) = from {
        query.push(("from", from));
    }
    if let Some(to) = to {
        query.push(("to", to));
    }
    let res = client
        .get(url)
        .query(&query)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn leaderboard(base: &str, bearer: &str) -> Result<LeaderboardDto, RestError> {
    let client = mk_client()?;
    let url = ep::stats_leaderboard(base);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn my_points(base: &str, bearer: &str) -> Result<PointsDto, RestError> {
    let client = mk_client()?;
    let url = ep::stats_points(base);
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn salary(
    base: &str,
    bearer: &str,
    from: &str,
    to: &str,
) -> Result<SalaryDto, RestError> {
    let client = mk_client()?;
    let url = ep::stats_salary(base);
    let res = client
        .get(url)
        .query(&[("from", from), ("to", to)])
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_shifts(
    base: &str,
    bearer: &str,
    from: &str,
    to: &str,
) -> Result<Vec<ShiftDto>, RestError> {
    let client = mk_client()?;
    let url = ep::shifts(base);
    let res = client
        .get(url)
        .query(&[("from", from), ("to", to)])
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn book_shift(base: &str, bearer: &str, shift_id: i32) -> Result<BookingDto, RestError> {
    let client = mk_client()?;
    let url = ep::shift_bookings(base, shift_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn cancel_booking(
    base: &str,
    bearer: &str,
    booking_id: i32,
) -> Result<BookingDto, RestError> {
    let client = mk_client()?;
    let url = ep::booking_cancel(base, booking_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn weekly_status(
    base: &str,
    bearer: &str,
    week_start: Option<&str>,
) -> Result<WeeklyStatusDto, RestError> {
    let client = mk_client()?;
    let url = ep::bookings_weekly_status(base);
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(week_start) = week_start {
        query.push(("week_start", week_start));
    }
    let res = client
        .get(url)
        .query(&query)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn active_challenge(
    base: &str,
    bearer: &str,
    kind: &str,
    on: &str,
) -> Result<Option<ChallengeDto>, RestError> {
    let client = mk_client()?;
    let url = ep::challenges_active(base);
    let res = client
        .get(url)
        .query(&[("kind", kind), ("on", on)])
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}
