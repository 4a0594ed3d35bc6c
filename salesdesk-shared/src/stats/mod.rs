//! The domain calculation layer: pure functions over already-fetched
//! collections. Nothing in here performs I/O; ambient inputs ("now", the
//! reporting timezone, the authenticated seller) are explicit parameters.

pub mod booking;
pub mod commission;
pub mod leaderboard;
pub mod mapper;
pub mod points;
