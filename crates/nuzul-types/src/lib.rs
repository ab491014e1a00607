//! Nuzul Types - Canonical domain types for hotel settlement
//!
//! This crate contains all foundational types for the Nuzul settlement engine
//! with zero dependencies on other nuzul crates. It defines:
//!
//! - Identity types (ReservationId, HotelId, AdminId, BatchKey)
//! - SAR/USD money helpers with 2-decimal half-up rounding
//! - The reservation payment slice and its derived fields
//! - Append-only change-log entries and actor/role types
//! - The four canonical payout views shared by queries and aggregation
//! - Settlement batch and reconciliation result types
//! - The settlement error taxonomy
//!
//! # Invariants carried by these types
//!
//! 1. Settlement flags are booleans - a reservation is never partially settled
//! 2. `online_payout_sar` is derived, Online-channel only, never stored
//! 3. Change entries always carry the prior value and are never edited
//! 4. Every error is explicit; writes fail closed

pub mod actor;
pub mod batch;
pub mod changelog;
pub mod error;
pub mod filter;
pub mod identity;
pub mod money;
pub mod reservation;
pub mod summary;

pub use actor::*;
pub use batch::*;
pub use changelog::*;
pub use error::*;
pub use filter::*;
pub use identity::*;
pub use money::*;
pub use reservation::*;
pub use summary::*;

/// Version of the nuzul types schema
pub const TYPES_VERSION: &str = "0.1.0";
