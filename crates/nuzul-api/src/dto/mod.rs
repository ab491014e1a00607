//! Data Transfer Objects
//!
//! Request and response structures for the API. All responses are camelCase;
//! ids travel as their prefixed string forms (`rsv_…`, `hotel_…`, `admin_…`).

pub mod common;
pub mod payouts;

pub use common::*;
pub use payouts::*;
