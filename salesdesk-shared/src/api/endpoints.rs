use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::API_V1_PREFIX;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn auth_login(base: &str) -> String {
    base_join(base, &format!("{}/auth/login", API_V1_PREFIX))
}
pub fn auth_logout(base: &str) -> String {
    base_join(base, &format!("{}/auth/logout", API_V1_PREFIX))
}
pub fn purchases(base: &str) -> String {
    base_join(base, &format!("{}/purchases", API_V1_PREFIX))
}
pub fn purchases_verify(base: &str) -> String {
    base_join(base, &format!("{}/purchases/verify", API_V1_PREFIX))
}
pub fn stats_leaderboard(base: &str) -> String {
    base_join(base, &format!("{}/stats/leaderboard", API_V1_PREFIX))
}
pub fn stats_points(base: &str) -> String {
    base_join(base, &format!("{}/stats/points", API_V1_PREFIX))
}
pub fn stats_salary(base: &str) -> String {
    base_join(base, &format!("{}/stats/salary", API_V1_PREFIX))
}
pub fn shifts(base: &str) -> String {
    base_join(base, &format!("{}/shifts", API_V1_PREFIX))
}
pub fn shift(base: &str, shift_id: i32) -> String {
    base_join(base, &format!("{}/shifts/{}", API_V1_PREFIX, shift_id))
}
pub fn shift_bookings(base: &str, shift_id: i32) -> String {
    base_join(
        base,
        &format!("{}/shifts/{}/bookings", API_V1_PREFIX, shift_id),
    )
}
pub fn booking_cancel(base: &str, booking_id: i32) -> String {
    base_join(
        base,
        &format!("{}/bookings/{}/cancel", API_V1_PREFIX, booking_id),
    )
}
pub fn bookings_weekly_status(base: &str) -> String {
    base_join(base, &format!("{}/bookings/weekly-status", API_V1_PREFIX))
}
pub fn invitations(base: &str) -> String {
    base_join(base, &format!("{}/invitations", API_V1_PREFIX))
}
pub fn challenges(base: &str) -> String {
    base_join(base, &format!("{}/challenges", API_V1_PREFIX))
}
pub fn challenges_active(base: &str) -> String {
    base_join(base, &format!("{}/challenges/active", API_V1_PREFIX))
}
pub fn setting(base: &str, key: &str) -> String {
    base_join(base, &format!("{}/settings/{}", API_V1_PREFIX, enc(key)))
}
pub fn webhook_purchases(base: &str) -> String {
    base_join(base, &format!("{}/webhooks/purchases", API_V1_PREFIX))
}
pub fn webhook_invitations(base: &str) -> String {
    base_join(base, &format!("{}/webhooks/invitations", API_V1_PREFIX))
}
