use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::storage::schema::{
    app_settings, challenges, invitations, purchase_products, purchases, sessions, shift_bookings,
    shifts,
};

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = purchases)]
pub struct Purchase {
    pub id: String,
    pub purchased_at: NaiveDateTime,
    /// Amount as delivered by the provider (decimal-as-string preserved).
    pub amount: String,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub refunded: bool,
    pub refund_uuid: Option<String>,
    pub refund_timestamp: Option<NaiveDateTime>,
    pub verified: bool,
}

#[derive(Insertable)]
#[diesel(table_name = purchases)]
pub struct NewPurchase<'a> {
    pub id: &'a str,
    pub purchased_at: NaiveDateTime,
    pub amount: &'a str,
    pub user_display_name: Option<&'a str>,
    pub payment_type: Option<&'a str>,
    pub product_name: Option<&'a str>,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = purchase_products)]
#[diesel(belongs_to(Purchase, foreign_key = purchase_id))]
pub struct PurchaseProduct {
    pub id: i32,
    pub purchase_id: String,
    pub name: String,
    pub quantity: Option<f64>,
}

#[derive(Insertable)]
#[diesel(table_name = purchase_products)]
pub struct NewPurchaseProduct<'a> {
    pub purchase_id: &'a str,
    pub name: &'a str,
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = shifts)]
pub struct Shift {
    pub id: i32,
    pub shift_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub available_slots: i32,
    pub created_by: String,
}

#[derive(Insertable)]
#[diesel(table_name = shifts)]
pub struct NewShift<'a> {
    pub shift_date: NaiveDate,
    pub start_time: &'a str,
    pub end_time: &'a str,
    pub available_slots: i32,
    pub created_by: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = shift_bookings)]
#[diesel(belongs_to(Shift, foreign_key = shift_id))]
pub struct ShiftBooking {
    pub id: i32,
    pub shift_id: i32,
    pub user_id: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = shift_bookings)]
pub struct NewShiftBooking<'a> {
    pub shift_id: i32,
    pub user_id: &'a str,
    pub status: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = invitations)]
pub struct Invitation {
    pub id: i32,
    pub code: String,
    pub display_name: Option<String>,
    pub status: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = invitations)]
pub struct NewInvitation<'a> {
    pub code: &'a str,
    pub display_name: Option<&'a str>,
    pub status: &'a str,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = challenges)]
pub struct Challenge {
    pub id: i32,
    pub name: String,
    pub kind: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub reward_amount: f64,
}

#[derive(Insertable)]
#[diesel(table_name = challenges)]
pub struct NewChallenge<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub reward_amount: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = app_settings)]
#[diesel(primary_key(key))]
pub struct AppSetting {
    pub key: String,
    pub value: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = sessions)]
#[diesel(primary_key(jti))]
pub struct Session {
    pub jti: String,
    pub username: String,
    pub issued_at: NaiveDateTime,
    pub last_used_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession<'a> {
    pub jti: &'a str,
    pub username: &'a str,
}
