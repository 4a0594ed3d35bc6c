use serde::{Deserialize, Serialize};

use crate::domain::{Amount, ProductLine};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_V1_PREFIX: &str = "/api/v1";

// Auth
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
}

// Purchases (legacy display shape)
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseDto {
    pub id: String,
    pub timestamp: String, // RFC3339 UTC
    pub amount: f64,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    pub product_name: Option<String>,
    pub refunded: bool,
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentsReq {
    pub purchase_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPaymentsResp {
    pub updated: usize,
}

// Stats
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntryDto {
    pub user_display_name: String,
    pub value: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardDto {
    pub top_seller: LeaderboardEntryDto,
    pub highest_sale: LeaderboardEntryDto,
    pub top_average_value: LeaderboardEntryDto,
    pub top_presence: LeaderboardEntryDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsDto {
    pub user_display_name: String,
    pub total_points: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SalaryDto {
    pub period_start: String, // YYYY-MM-DD
    pub period_end: String,   // YYYY-MM-DD
    pub period_total: f64,
    pub accumulated_sales: f64,
    pub base_rate_percent: f64,
    pub commission: f64,
}

// Shifts & bookings
#[derive(Debug, Serialize, Deserialize)]
pub struct ShiftDto {
    pub id: i32,
    pub date: String, // YYYY-MM-DD
    pub start_time: String,
    pub end_time: String,
    pub available_slots: i32,
    pub booked_slots: i64,
    pub created_by: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateShiftReq {
    pub date: String, // YYYY-MM-DD
    pub start_time: String,
    pub end_time: String,
    pub available_slots: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingDto {
    pub id: i32,
    pub shift_id: i32,
    pub user_id: String,
    pub user_display_name: String,
    pub status: String,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyStatusDto {
    pub week_start: String, // YYYY-MM-DD
    pub week_end: String,   // YYYY-MM-DD
    pub total_bookings: i64,
    pub meets_minimum_requirement: bool,
}

// Invitations
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationDto {
    pub id: i32,
    pub code: String,
    pub display_name: Option<String>,
    pub status: String,
    pub expires_at: String, // RFC3339 UTC
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvitationReq {
    pub display_name: Option<String>,
    pub expires_in_hours: Option<i64>,
}

// Challenges
#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeDto {
    pub id: i32,
    pub name: String,
    pub kind: String,
    pub starts_on: String, // YYYY-MM-DD
    pub ends_on: String,   // YYYY-MM-DD
    pub reward_amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChallengeReq {
    pub name: String,
    pub kind: String,
    pub starts_on: String, // YYYY-MM-DD
    pub ends_on: String,   // YYYY-MM-DD
    pub reward_amount: f64,
}

// Settings
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingDto {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSettingReq {
    pub value: String,
}

// Webhooks
/// Point-of-sale event. A present `refund_uuid` makes this a refund event
/// referencing the original purchase; everything else records a purchase.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseEventReq {
    pub purchase_uuid: String,
    pub timestamp: String, // RFC3339
    pub amount: Amount,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    pub products: Option<Vec<ProductLine>>,
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub refund_uuid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationEventReq {
    pub code: String,
    pub status: String, // "used" | "expired"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResp {
    pub success: bool,
    pub message: String,
}
