//! The reservation payment slice
//!
//! The settlement engine owns only the payment-facing slice of a reservation:
//! amounts, channel, settlement flags, and the change log. Booking details
//! (rooms, pricing calendar, guest management) belong to the booking
//! subsystem; the commission formula over its per-night rates is reproduced
//! here so reservations can be admitted straight from a booking record.

use crate::{ChangeEntry, HotelId, ReservationId, Result, SettlementError};
use crate::money::round_money;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the guest paid for the stay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChannel {
    /// Guest paid the platform; platform owes the hotel the payout
    Online,
    /// Guest paid the hotel directly; hotel owes the platform commission
    Offline,
}

impl fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Offline => "offline",
        };
        write!(f, "{s}")
    }
}

/// Payment status, derived from channel and flags - never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Online booking whose payment the platform captured
    Captured,
    /// Offline booking paid at the hotel
    PaidOffline,
    /// Online booking not yet captured (booking subsystem only)
    NotCaptured,
    /// Offline booking not yet paid (booking subsystem only)
    NotPaid,
}

/// Per-night rate pair from the booking subsystem's pricing calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightRate {
    /// Selling price per room-night
    pub price: Decimal,
    /// Hotel's root price per room-night
    pub root_price: Decimal,
}

/// One picked room type with its nightly pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedRoom {
    pub room_count: u32,
    pub pricing_by_day: Vec<NightRate>,
}

/// Platform commission over a booking: sum over nights of
/// `(price - root_price) * room_count`.
pub fn commission_sar(rooms: &[BookedRoom]) -> Decimal {
    let total: Decimal = rooms
        .iter()
        .map(|room| {
            let margin: Decimal = room
                .pricing_by_day
                .iter()
                .map(|night| night.price - night.root_price)
                .sum();
            margin * Decimal::from(room.room_count)
        })
        .sum();
    round_money(total)
}

/// Canonical per-reservation payment state held by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub hotel_id: HotelId,
    pub confirmation_number: String,
    pub customer_name: String,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub total_amount_sar: Decimal,
    pub payment_channel: PaymentChannel,
    /// Precomputed commission (see [`commission_sar`])
    pub commission_sar: Decimal,
    pub commission_paid: bool,
    pub commission_paid_at: Option<DateTime<Utc>>,
    pub money_transferred_to_hotel: bool,
    pub money_transferred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Append-only history of every flag change
    pub change_log: Vec<ChangeEntry>,
}

impl Reservation {
    /// Derive the payment status from channel and flags.
    ///
    /// Reservations enter the ledger only once their booking is finalized, so
    /// ledger records always derive to a paid status; the remaining variants
    /// exist for the booking subsystem's pre-finalized records.
    pub fn payment_status(&self) -> PaymentStatus {
        match self.payment_channel {
            PaymentChannel::Online => PaymentStatus::Captured,
            PaymentChannel::Offline => PaymentStatus::PaidOffline,
        }
    }

    /// Payout owed to the hotel, defined only for the online channel
    pub fn online_payout_sar(&self) -> Option<Decimal> {
        match self.payment_channel {
            PaymentChannel::Online => Some(round_money(self.total_amount_sar - self.commission_sar)),
            PaymentChannel::Offline => None,
        }
    }

    /// Commission owed by the hotel, defined only for the offline channel
    pub fn commission_due_sar(&self) -> Option<Decimal> {
        match self.payment_channel {
            PaymentChannel::Offline => Some(self.commission_sar),
            PaymentChannel::Online => None,
        }
    }
}

/// Commission input when admitting a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionInput {
    /// Already computed by the booking flow
    Precomputed(Decimal),
    /// Compute from the booking record's per-night rates
    FromRooms(Vec<BookedRoom>),
}

/// A finalized booking entering the settlement ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReservation {
    /// Omit to generate a fresh id
    pub id: Option<ReservationId>,
    pub hotel_id: HotelId,
    pub confirmation_number: String,
    pub customer_name: String,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub total_amount_sar: Decimal,
    pub payment_channel: PaymentChannel,
    pub commission: CommissionInput,
}

impl NewReservation {
    /// Resolve the commission amount, validating it against the total
    pub fn resolve_commission_sar(&self) -> Result<Decimal> {
        let commission = match &self.commission {
            CommissionInput::Precomputed(amount) => round_money(*amount),
            CommissionInput::FromRooms(rooms) => commission_sar(rooms),
        };
        if commission < Decimal::ZERO {
            return Err(SettlementError::validation(
                "commission",
                "commission must be non-negative",
            ));
        }
        if commission > self.total_amount_sar {
            return Err(SettlementError::validation(
                "commission",
                "commission exceeds the reservation total",
            ));
        }
        Ok(commission)
    }
}
