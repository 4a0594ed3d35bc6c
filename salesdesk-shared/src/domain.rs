use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monetary amount as delivered by the payment provider: a plain number or
/// a decimal-as-string, where a comma decimal separator is tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Non-numeric text coerces to 0 rather than failing.
    pub fn normalize(&self) -> f64 {
        match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

/// A point-of-sale purchase. Immutable once ingested, except for the refund
/// markers and payment verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub purchased_at: DateTime<Utc>,
    pub amount: Amount,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    /// Line items. Rows ingested before line-item support carry the
    /// top-level `product_name`/`quantity` pair instead.
    pub products: Option<Vec<ProductLine>>,
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub refunded: bool,
    pub refund_uuid: Option<String>,
    pub refund_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLine {
    pub name: String,
    pub quantity: Option<f64>,
}

/// Legacy display shape consumed by presentation code; see
/// [`crate::stats::mapper::to_sale_record`]. Absent optional fields stay
/// `None` so a reader can distinguish "unknown" from "empty".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    pub product_name: Option<String>,
}

/// Status of a shift reservation. Only confirmed bookings count toward the
/// weekly minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Used,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Used => "used",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "used" => Ok(InvitationStatus::Used),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(format!("unknown invitation status: {other}")),
        }
    }
}

/// Cadence of a time-boxed sales challenge. At most one challenge of a
/// given kind is considered active per queried date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Daily,
    Weekly,
    Monthly,
}

impl ChallengeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeKind::Daily => "daily",
            ChallengeKind::Weekly => "weekly",
            ChallengeKind::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ChallengeKind::Daily),
            "weekly" => Ok(ChallengeKind::Weekly),
            "monthly" => Ok(ChallengeKind::Monthly),
            other => Err(format!("unknown challenge kind: {other}")),
        }
    }
}
