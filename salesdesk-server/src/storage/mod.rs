pub mod models;
pub mod schema;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    AppSetting, Challenge, Invitation, NewChallenge, NewInvitation, NewPurchase,
    NewPurchaseProduct, NewSession, NewShift, NewShiftBooking, Purchase, PurchaseProduct, Session,
    Shift, ShiftBooking,
};
use salesdesk_shared::domain::{BookingStatus, InvitationStatus};
use tracing::trace;

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with current row state.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Owned purchase payload handed to [`Store::insert_purchase`].
#[derive(Debug, Clone)]
pub struct PurchaseInsert {
    pub id: String,
    pub purchased_at: NaiveDateTime,
    /// Raw amount text as delivered by the provider.
    pub amount: String,
    pub user_display_name: Option<String>,
    pub payment_type: Option<String>,
    pub product_name: Option<String>,
    pub quantity: Option<f64>,
    pub products: Vec<(String, Option<f64>)>,
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Record a purchase and its line items in one transaction. Returns
    /// `false` when the purchase id already exists (webhook redelivery).
    pub async fn insert_purchase(&self, rec: PurchaseInsert) -> Result<bool, StorageError> {
        use schema::{purchase_products, purchases};
        let pool = self.pool.clone();
        trace!(purchase_id = %rec.id, "insert_purchase starting");
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<bool, StorageError> {
                let new_row = NewPurchase {
                    id: &rec.id,
                    purchased_at: rec.purchased_at,
                    amount: &rec.amount,
                    user_display_name: rec.user_display_name.as_deref(),
                    payment_type: rec.payment_type.as_deref(),
                    product_name: rec.product_name.as_deref(),
                    quantity: rec.quantity,
                };
                let inserted = diesel::insert_into(purchases::table)
                    .values(&new_row)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    return Ok(false);
                }
                for (name, quantity) in &rec.products {
                    let item = NewPurchaseProduct {
                        purchase_id: &rec.id,
                        name: name.as_str(),
                        quantity: *quantity,
                    };
                    diesel::insert_into(purchase_products::table)
                        .values(&item)
                        .execute(conn)?;
                }
                Ok(true)
            })
        })
        .await?
    }

    /// Set the refund markers on the original purchase row. Returns `false`
    /// when no such purchase exists.
    pub async fn mark_refunded(
        &self,
        original_id: &str,
        refund_uuid: &str,
        refund_at: NaiveDateTime,
    ) -> Result<bool, StorageError> {
        use schema::purchases::dsl as p;
        let pool = self.pool.clone();
        let original = original_id.to_string();
        let refund = refund_uuid.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let updated = diesel::update(p::purchases.filter(p::id.eq(&original)))
                .set((
                    p::refunded.eq(true),
                    p::refund_uuid.eq(&refund),
                    p::refund_timestamp.eq(refund_at),
                ))
                .execute(&mut conn)?;
            Ok(updated > 0)
        })
        .await?
    }

    pub async fn list_purchases(
        &self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Result<Vec<(Purchase, Vec<PurchaseProduct>)>, StorageError> {
        use schema::purchases::dsl as p;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(
            move || -> Result<Vec<(Purchase, Vec<PurchaseProduct>)>, StorageError> {
                let mut conn = pool.get()?;
                configure_sqlite_conn(&mut conn)?;
                let mut query = p::purchases.into_boxed();
                if let Some(from) = from {
                    query = query.filter(p::purchased_at.ge(from));
                }
                if let Some(to) = to {
                    query = query.filter(p::purchased_at.le(to));
                }
                let rows = query.order(p::purchased_at.desc()).load::<Purchase>(&mut conn)?;
                let items = PurchaseProduct::belonging_to(&rows)
                    .load::<PurchaseProduct>(&mut conn)?
                    .grouped_by(&rows);
                Ok(rows.into_iter().zip(items).collect())
            },
        )
        .await?
    }

    /// All of one seller's purchases up to an optional inclusive bound.
    pub async fn list_purchases_for_seller(
        &self,
        seller: &str,
        until: Option<NaiveDateTime>,
    ) -> Result<Vec<(Purchase, Vec<PurchaseProduct>)>, StorageError> {
        use schema::purchases::dsl as p;
        let pool = self.pool.clone();
        let seller = seller.to_string();
        tokio::task::spawn_blocking(
            move || -> Result<Vec<(Purchase, Vec<PurchaseProduct>)>, StorageError> {
                let mut conn = pool.get()?;
                configure_sqlite_conn(&mut conn)?;
                let mut query = p::purchases
                    .filter(p::user_display_name.eq(&seller))
                    .into_boxed();
                if let Some(until) = until {
                    query = query.filter(p::purchased_at.le(until));
                }
                let rows = query.order(p::purchased_at.asc()).load::<Purchase>(&mut conn)?;
                let items = PurchaseProduct::belonging_to(&rows)
                    .load::<PurchaseProduct>(&mut conn)?
                    .grouped_by(&rows);
                Ok(rows.into_iter().zip(items).collect())
            },
        )
        .await?
    }

    /// Mark payment rows verified. Returns how many rows changed.
    pub async fn set_verified(&self, ids: Vec<String>) -> Result<usize, StorageError> {
        use schema::purchases::dsl as p;
        if ids.is_empty() {
            return Err(StorageError::InvalidInput("no purchase ids".into()));
        }
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<usize, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let updated = diesel::update(p::purchases.filter(p::id.eq_any(&ids)))
                .set(p::verified.eq(true))
                .execute(&mut conn)?;
            Ok(updated)
        })
        .await?
    }

    pub async fn create_shift(
        &self,
        shift_date: NaiveDate,
        start_time: &str,
        end_time: &str,
        available_slots: i32,
        created_by: &str,
    ) -> Result<Shift, StorageError> {
        use schema::shifts;
        if available_slots <= 0 {
            return Err(StorageError::InvalidInput(
                "available_slots must be positive".into(),
            ));
        }
        let pool = self.pool.clone();
        let start = start_time.to_string();
        let end = end_time.to_string();
        let creator = created_by.to_string();
        tokio::task::spawn_blocking(move || -> Result<Shift, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let new_row = NewShift {
                shift_date,
                start_time: &start,
                end_time: &end,
                available_slots,
                created_by: &creator,
            };
            Ok(diesel::insert_into(shifts::table)
                .values(&new_row)
                .get_result::<Shift>(&mut conn)?)
        })
        .await?
    }

    /// Shifts in the inclusive date range, each with its confirmed booking
    /// count.
    pub async fn list_shifts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(Shift, i64)>, StorageError> {
        use diesel::dsl::count_star;
        use schema::shift_bookings::dsl as sb;
        use schema::shifts::dsl as s;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<(Shift, i64)>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let rows = s::shifts
                .filter(s::shift_date.ge(from))
                .filter(s::shift_date.le(to))
                .order((s::shift_date.asc(), s::start_time.asc()))
                .load::<Shift>(&mut conn)?;
            let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
            let counts: Vec<(i32, i64)> = sb::shift_bookings
                .filter(sb::shift_id.eq_any(&ids))
                .filter(sb::status.eq(BookingStatus::Confirmed.as_str()))
                .group_by(sb::shift_id)
                .select((sb::shift_id, count_star()))
                .load::<(i32, i64)>(&mut conn)?;
            let mut map: std::collections::HashMap<i32, i64> = std::collections::HashMap::new();
            for (sid, n) in counts {
                map.insert(sid, n);
            }
            Ok(rows
                .into_iter()
                .map(|r| {
                    let n = map.get(&r.id).copied().unwrap_or(0);
                    (r, n)
                })
                .collect())
        })
        .await?
    }

    pub async fn get_shift(&self, shift_id: i32) -> Result<Option<Shift>, StorageError> {
        use schema::shifts::dsl as s;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Shift>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(s::shifts
                .filter(s::id.eq(shift_id))
                .first::<Shift>(&mut conn)
                .optional()?)
        })
        .await?
    }

    /// Delete a shift and its bookings in one transaction so a failure
    /// never leaves bookings pointing at a missing shift. Returns `false`
    /// when the shift does not exist.
    pub async fn delete_shift(&self, shift_id: i32) -> Result<bool, StorageError> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            use schema::shift_bookings::dsl as sb;
            use schema::shifts::dsl as s;
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<bool, StorageError> {
                diesel::delete(sb::shift_bookings.filter(sb::shift_id.eq(shift_id)))
                    .execute(conn)?;
                let deleted =
                    diesel::delete(s::shifts.filter(s::id.eq(shift_id))).execute(conn)?;
                Ok(deleted > 0)
            })
        })
        .await?
    }

    /// Book a shift for a user. Capacity and duplicate checks run inside
    /// the same transaction as the insert.
    pub async fn create_booking(
        &self,
        shift_id: i32,
        user_id: &str,
    ) -> Result<ShiftBooking, StorageError> {
        use diesel::dsl::count_star;
        let pool = self.pool.clone();
        let user = user_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<ShiftBooking, StorageError> {
            use schema::shift_bookings::dsl as sb;
            use schema::shifts::dsl as s;
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<ShiftBooking, StorageError> {
                let shift: Option<Shift> = s::shifts
                    .filter(s::id.eq(shift_id))
                    .first::<Shift>(conn)
                    .optional()?;
                let Some(shift) = shift else {
                    return Err(StorageError::NotFound(format!(
                        "shift not found: {shift_id}"
                    )));
                };
                let confirmed = BookingStatus::Confirmed.as_str();
                let already: i64 = sb::shift_bookings
                    .filter(sb::shift_id.eq(shift_id))
                    .filter(sb::user_id.eq(&user))
                    .filter(sb::status.eq(confirmed))
                    .count()
                    .get_result(conn)?;
                if already > 0 {
                    return Err(StorageError::Conflict("shift already booked".into()));
                }
                let taken: i64 = sb::shift_bookings
                    .filter(sb::shift_id.eq(shift_id))
                    .filter(sb::status.eq(confirmed))
                    .select(count_star())
                    .get_result(conn)?;
                if taken >= i64::from(shift.available_slots) {
                    return Err(StorageError::Conflict("shift is full".into()));
                }
                let new_row = NewShiftBooking {
                    shift_id,
                    user_id: &user,
                    status: confirmed,
                };
                Ok(diesel::insert_into(sb::shift_bookings)
                    .values(&new_row)
                    .get_result::<ShiftBooking>(conn)?)
            })
        })
        .await?
    }

    /// Cancel a booking. `owner` restricts the cancellation to that user's
    /// own bookings; cancelling an already-cancelled booking is a no-op.
    pub async fn cancel_booking(
        &self,
        booking_id: i32,
        owner: Option<&str>,
    ) -> Result<ShiftBooking, StorageError> {
        use schema::shift_bookings::dsl as sb;
        let pool = self.pool.clone();
        let owner = owner.map(|s| s.to_string());
        tokio::task::spawn_blocking(move || -> Result<ShiftBooking, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<ShiftBooking, StorageError> {
                let booking: Option<ShiftBooking> = sb::shift_bookings
                    .filter(sb::id.eq(booking_id))
                    .first::<ShiftBooking>(conn)
                    .optional()?;
                let Some(booking) = booking else {
                    return Err(StorageError::NotFound(format!(
                        "booking not found: {booking_id}"
                    )));
                };
                if let Some(owner) = &owner
                    && booking.user_id != *owner
                {
                    return Err(StorageError::NotFound(format!(
                        "booking not found: {booking_id}"
                    )));
                }
                if booking.status == BookingStatus::Cancelled.as_str() {
                    return Ok(booking);
                }
                Ok(diesel::update(sb::shift_bookings.filter(sb::id.eq(booking_id)))
                    .set(sb::status.eq(BookingStatus::Cancelled.as_str()))
                    .get_result::<ShiftBooking>(conn)?)
            })
        })
        .await?
    }

    /// Confirmed bookings a user holds against the given shifts.
    pub async fn count_confirmed_bookings(
        &self,
        user_id: &str,
        shift_ids: Vec<i32>,
    ) -> Result<i64, StorageError> {
        use schema::shift_bookings::dsl as sb;
        if shift_ids.is_empty() {
            return Ok(0);
        }
        let pool = self.pool.clone();
        let user = user_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<i64, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(sb::shift_bookings
                .filter(sb::user_id.eq(&user))
                .filter(sb::shift_id.eq_any(&shift_ids))
                .filter(sb::status.eq(BookingStatus::Confirmed.as_str()))
                .count()
                .get_result(&mut conn)?)
        })
        .await?
    }

    pub async fn list_bookings_for_shift(
        &self,
        shift_id: i32,
    ) -> Result<Vec<ShiftBooking>, StorageError> {
        use schema::shift_bookings::dsl as sb;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<ShiftBooking>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(sb::shift_bookings
                .filter(sb::shift_id.eq(shift_id))
                .order(sb::created_at.asc())
                .load::<ShiftBooking>(&mut conn)?)
        })
        .await?
    }

    pub async fn create_invitation(
        &self,
        code: &str,
        display_name: Option<&str>,
        expires_at: NaiveDateTime,
    ) -> Result<Invitation, StorageError> {
        use schema::invitations;
        let pool = self.pool.clone();
        let code = code.to_string();
        let display = display_name.map(|s| s.to_string());
        tokio::task::spawn_blocking(move || -> Result<Invitation, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let new_row = NewInvitation {
                code: &code,
                display_name: display.as_deref(),
                status: InvitationStatus::Pending.as_str(),
                expires_at,
            };
            Ok(diesel::insert_into(invitations::table)
                .values(&new_row)
                .get_result::<Invitation>(&mut conn)?)
        })
        .await?
    }

    /// All invitations, newest first. Pending rows past their expiry are
    /// persisted as expired before the listing.
    pub async fn list_invitations(&self) -> Result<Vec<Invitation>, StorageError> {
        use schema::invitations::dsl as inv;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Invitation>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let now = Utc::now().naive_utc();
            diesel::update(
                inv::invitations
                    .filter(inv::status.eq(InvitationStatus::Pending.as_str()))
                    .filter(inv::expires_at.lt(now)),
            )
            .set(inv::status.eq(InvitationStatus::Expired.as_str()))
            .execute(&mut conn)?;
            Ok(inv::invitations
                .order(inv::created_at.desc())
                .load::<Invitation>(&mut conn)?)
        })
        .await?
    }

    /// Flip a pending invitation to the requested status. A pending
    /// invitation past its expiry is persisted (and returned) as expired
    /// regardless of the requested status; a non-pending invitation is a
    /// conflict.
    pub async fn set_invitation_status(
        &self,
        code: &str,
        status: InvitationStatus,
    ) -> Result<Invitation, StorageError> {
        use schema::invitations::dsl as inv;
        let pool = self.pool.clone();
        let code = code.to_string();
        tokio::task::spawn_blocking(move || -> Result<Invitation, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            conn.immediate_transaction(|conn| -> Result<Invitation, StorageError> {
                let row: Option<Invitation> = inv::invitations
                    .filter(inv::code.eq(&code))
                    .first::<Invitation>(conn)
                    .optional()?;
                let Some(row) = row else {
                    return Err(StorageError::NotFound(format!(
                        "invitation not found: {code}"
                    )));
                };
                if row.status != InvitationStatus::Pending.as_str() {
                    return Err(StorageError::Conflict(format!(
                        "invitation already {}",
                        row.status
                    )));
                }
                let now = Utc::now().naive_utc();
                let target = if row.expires_at < now {
                    InvitationStatus::Expired
                } else {
                    status
                };
                Ok(diesel::update(inv::invitations.filter(inv::code.eq(&code)))
                    .set(inv::status.eq(target.as_str()))
                    .get_result::<Invitation>(conn)?)
            })
        })
        .await?
    }

    /// Display name carried on a pending invitation whose code matches the
    /// user id, used when no config profile exists for a booking's user.
    pub async fn pending_display_name(
        &self,
        user_id: &str,
    ) -> Result<Option<String>, StorageError> {
        use schema::invitations::dsl as inv;
        let pool = self.pool.clone();
        let user = user_id.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<String>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let row: Option<Invitation> = inv::invitations
                .filter(inv::code.eq(&user))
                .filter(inv::status.eq(InvitationStatus::Pending.as_str()))
                .first::<Invitation>(&mut conn)
                .optional()?;
            Ok(row.and_then(|r| r.display_name))
        })
        .await?
    }

    pub async fn create_challenge(
        &self,
        name: &str,
        kind: &str,
        starts_on: NaiveDate,
        ends_on: NaiveDate,
        reward_amount: f64,
    ) -> Result<Challenge, StorageError> {
        use schema::challenges;
        if ends_on < starts_on {
            return Err(StorageError::InvalidInput(
                "ends_on before starts_on".into(),
            ));
        }
        let pool = self.pool.clone();
        let name = name.to_string();
        let kind = kind.to_string();
        tokio::task::spawn_blocking(move || -> Result<Challenge, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let new_row = NewChallenge {
                name: &name,
                kind: &kind,
                starts_on,
                ends_on,
                reward_amount,
            };
            Ok(diesel::insert_into(challenges::table)
                .values(&new_row)
                .get_result::<Challenge>(&mut conn)?)
        })
        .await?
    }

    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, StorageError> {
        use schema::challenges::dsl as c;
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Challenge>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(c::challenges
                .order(c::starts_on.desc())
                .load::<Challenge>(&mut conn)?)
        })
        .await?
    }

    /// The active challenge of a kind on a date. With overlapping windows
    /// the lowest id wins.
    pub async fn active_challenge(
        &self,
        kind: &str,
        on: NaiveDate,
    ) -> Result<Option<Challenge>, StorageError> {
        use schema::challenges::dsl as c;
        let pool = self.pool.clone();
        let kind = kind.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Challenge>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(c::challenges
                .filter(c::kind.eq(&kind))
                .filter(c::starts_on.le(on))
                .filter(c::ends_on.ge(on))
                .order(c::id.asc())
                .first::<Challenge>(&mut conn)
                .optional()?)
        })
        .await?
    }

    pub async fn get_setting(&self, key: &str) -> Result<Option<AppSetting>, StorageError> {
        use schema::app_settings::dsl as st;
        let pool = self.pool.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<AppSetting>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(st::app_settings
                .filter(st::key.eq(&key))
                .first::<AppSetting>(&mut conn)
                .optional()?)
        })
        .await?
    }

    /// Upsert a setting row. Last writer wins; there is no concurrency
    /// check.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<AppSetting, StorageError> {
        use schema::app_settings::dsl as st;
        let pool = self.pool.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || -> Result<AppSetting, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let now = Utc::now().naive_utc();
            diesel::insert_into(st::app_settings)
                .values((st::key.eq(&key), st::value.eq(&value), st::updated_at.eq(now)))
                .on_conflict(st::key)
                .do_update()
                .set((st::value.eq(&value), st::updated_at.eq(now)))
                .execute(&mut conn)?;
            Ok(st::app_settings
                .filter(st::key.eq(&key))
                .first::<AppSetting>(&mut conn)?)
        })
        .await?
    }

    // Session helpers for JWT inactivity windows
    pub async fn create_session(&self, jti_: &str, username_: &str) -> Result<(), StorageError> {
        use schema::sessions;
        let pool = self.pool.clone();
        let j = jti_.to_string();
        let u = username_.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let new = NewSession {
                jti: &j,
                username: &u,
            };
            diesel::insert_into(sessions::table)
                .values(&new)
                .on_conflict_do_nothing()
                .execute(&mut conn)?;
            Ok(())
        })
        .await?
    }

    pub async fn get_session(&self, jti_: &str) -> Result<Option<Session>, StorageError> {
        use schema::sessions::dsl::*;
        let pool = self.pool.clone();
        let j = jti_.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Session>, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            Ok(sessions
                .filter(jti.eq(&j))
                .first::<Session>(&mut conn)
                .optional()?)
        })
        .await?
    }

    pub async fn delete_session(&self, jti_: &str) -> Result<bool, StorageError> {
        use schema::sessions::dsl::*;
        let pool = self.pool.clone();
        let j = jti_.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let deleted = diesel::delete(sessions.filter(jti.eq(&j))).execute(&mut conn)?;
            Ok(deleted > 0)
        })
        .await?
    }

    /// Touch session atomically, but only if it hasn't expired.
    /// Returns `true` if the session was found and updated, `false` otherwise.
    ///
    /// This combines the idle timeout check and the `last_used_at` update into
    /// a single atomic UPDATE, eliminating the race condition between checking
    /// and updating the session.
    pub async fn touch_session_with_cutoff(
        &self,
        jti_: &str,
        cutoff: chrono::NaiveDateTime,
    ) -> Result<bool, StorageError> {
        use schema::sessions::dsl::*;
        let pool = self.pool.clone();
        let j = jti_.to_string();
        tokio::task::spawn_blocking(move || -> Result<bool, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            let now = Utc::now().naive_utc();
            let updated =
                diesel::update(sessions.filter(jti.eq(&j)).filter(last_used_at.ge(cutoff)))
                    .set(last_used_at.eq(now))
                    .execute(&mut conn)?;
            Ok(updated > 0)
        })
        .await?
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    // Ignore the result rows; Diesel's execute is fine for PRAGMAs
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    Ok(())
}
